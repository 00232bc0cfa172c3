pub mod api;
pub mod client;
pub mod config;
pub mod error;
pub mod http_client;
pub mod model;
pub mod services;
pub mod state;
pub mod telemetry;

pub use client::ShopClient;
pub use config::Config;
pub use error::{CoreResult, ShopError};
