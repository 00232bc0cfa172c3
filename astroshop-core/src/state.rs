//! Process-wide state shared by services and their callers.
//!
//! Every holder here is a cheap `Clone` handle over shared storage and is
//! passed explicitly; nothing lives in a global. Writers always install a
//! complete new value in one step, so readers see either the old value or
//! the new one, never a mix.

use std::fmt;
use std::sync::Arc;

use arc_swap::ArcSwap;
use opentelemetry::Context;
use tokio::sync::watch;
use tracing::info;
use uuid::Uuid;

use crate::api::CartApi;
use crate::error::CoreResult;
use crate::model::ServerCart;

pub const DEFAULT_CURRENCY: &str = "USD";

/// Holds the session id sent with cart and checkout calls.
#[derive(Clone)]
pub struct SessionManager {
    current: Arc<ArcSwap<String>>,
}

impl SessionManager {
    pub fn new() -> Self {
        Self::with_id(new_session_id())
    }

    pub fn with_id(id: impl Into<String>) -> Self {
        Self {
            current: Arc::new(ArcSwap::from_pointee(id.into())),
        }
    }

    pub fn session_id(&self) -> Arc<String> {
        self.current.load_full()
    }

    /// Replace the session id with a freshly generated one and return it.
    pub fn reset(&self) -> Arc<String> {
        let next = Arc::new(new_session_id());
        self.current.store(Arc::clone(&next));
        info!(session_id = %next, "session reset");
        next
    }
}

impl Default for SessionManager {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionManager")
            .field("session_id", &*self.current.load())
            .finish()
    }
}

fn new_session_id() -> String {
    Uuid::new_v4().to_string()
}

/// Currency the user picked for displaying prices.
#[derive(Debug, Clone)]
pub struct CurrencySelection {
    tx: Arc<watch::Sender<String>>,
}

impl CurrencySelection {
    pub fn new(initial: impl Into<String>) -> Self {
        Self {
            tx: Arc::new(watch::Sender::new(initial.into())),
        }
    }

    pub fn current(&self) -> String {
        self.tx.borrow().clone()
    }

    /// Switch currency; returns the previous selection.
    pub fn select(&self, code: impl Into<String>) -> String {
        self.tx.send_replace(code.into())
    }

    pub fn subscribe(&self) -> watch::Receiver<String> {
        self.tx.subscribe()
    }
}

impl Default for CurrencySelection {
    fn default() -> Self {
        Self::new(DEFAULT_CURRENCY)
    }
}

/// Last known cart contents, observable by UI-like consumers.
#[derive(Debug, Clone)]
pub struct CartStore {
    tx: Arc<watch::Sender<ServerCart>>,
}

impl CartStore {
    pub fn new() -> Self {
        Self {
            tx: Arc::new(watch::Sender::new(ServerCart::default())),
        }
    }

    pub fn snapshot(&self) -> ServerCart {
        self.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<ServerCart> {
        self.tx.subscribe()
    }

    pub fn replace(&self, cart: ServerCart) {
        self.tx.send_replace(cart);
    }

    pub fn clear(&self) {
        self.replace(ServerCart::default());
    }

    /// Fetch the cart and publish it. On error the stored cart is left as is.
    pub async fn refresh(&self, api: &dyn CartApi, parent: &Context) -> CoreResult<ServerCart> {
        let cart = api.get_cart(parent).await?;
        self.replace(cart.clone());
        Ok(cart)
    }
}

impl Default for CartStore {
    fn default() -> Self {
        Self::new()
    }
}
