use serde::{Deserialize, Serialize};
use std::{fs, path::Path};

use crate::error::{CoreResult, ShopError};

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct ApiCfg {
    /// Base URL of the shop API, e.g. `http://localhost:8080/api`.
    pub base_url: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct HttpCfg {
    /// TCP connect timeout in milliseconds (default 5000ms)
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
    /// Total request timeout in milliseconds (default 30000ms)
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    /// Optional per-host idle connection pool cap (None = reqwest default)
    #[serde(default)]
    pub pool_max_idle_per_host: Option<usize>,
}

impl Default for HttpCfg {
    fn default() -> Self {
        Self {
            connect_timeout_ms: default_connect_timeout_ms(),
            request_timeout_ms: default_request_timeout_ms(),
            pool_max_idle_per_host: None,
        }
    }
}

fn default_connect_timeout_ms() -> u64 {
    5_000
}
fn default_request_timeout_ms() -> u64 {
    30_000
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct TelemetryCfg {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_service_name")]
    pub service_name: String,
    /// OTLP/HTTP endpoint traces are exported to.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Name of the environment variable that contains the exporter API key.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    /// Classic Honeycomb environments route by dataset; newer ones ignore it.
    #[serde(default)]
    pub dataset: Option<String>,
}

impl Default for TelemetryCfg {
    fn default() -> Self {
        Self {
            enabled: false,
            service_name: default_service_name(),
            endpoint: default_endpoint(),
            api_key_env: default_api_key_env(),
            dataset: None,
        }
    }
}

fn default_service_name() -> String {
    "astroshop".to_string()
}
fn default_endpoint() -> String {
    "https://api.honeycomb.io".to_string()
}
fn default_api_key_env() -> String {
    "HONEYCOMB_API_KEY".to_string()
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Config {
    pub api: ApiCfg,
    /// HTTP client configuration (timeouts, pooling). Missing → defaults.
    #[serde(default)]
    pub http: HttpCfg,
    /// Trace export settings. Missing → telemetry disabled.
    #[serde(default)]
    pub telemetry: TelemetryCfg,
}

impl Config {
    /// Config pointing at `base_url` with every other section defaulted.
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            api: ApiCfg {
                base_url: base_url.into(),
            },
            http: HttpCfg::default(),
            telemetry: TelemetryCfg::default(),
        }
    }

    /// Load a Config from a file path (JSON or TOML by extension). If the
    /// extension is missing or unrecognized, try JSON first, then TOML.
    pub fn from_path<P: AsRef<Path>>(path: P) -> CoreResult<Self> {
        let path = path.as_ref();
        let bytes = fs::read(path).map_err(ShopError::from)?;
        let s = std::str::from_utf8(&bytes).map_err(|e| ShopError::Other(e.into()))?;
        let cfg: Self = match path.extension().and_then(|e| e.to_str()) {
            Some("json") => {
                serde_json::from_str::<Self>(s).map_err(|e| ShopError::Other(e.into()))?
            }
            Some("toml") => toml::from_str::<Self>(s).map_err(|e| ShopError::Other(e.into()))?,
            _ => serde_json::from_str::<Self>(s)
                .map_err(|e| ShopError::Other(e.into()))
                .or_else(|_| toml::from_str::<Self>(s).map_err(|e| ShopError::Other(e.into())))?,
        };
        cfg.validate()?;
        Ok(cfg)
    }

    fn validate(&self) -> CoreResult<()> {
        url::Url::parse(&self.api.base_url).map_err(|e| {
            ShopError::Validation(format!("invalid api.base_url '{}': {e}", self.api.base_url))
        })?;
        Ok(())
    }
}
