use thiserror::Error;

/// Core error type for the shop client.
/// Internally, modules can use `anyhow::Result<T>` for convenience,
/// but public boundaries should expose `CoreResult<T>` with this error.
#[derive(Debug, Error)]
pub enum ShopError {
    /// No response was received (connection refused, timeout, DNS, ...).
    #[error("network error: {0}")]
    Network(#[source] reqwest::Error),

    /// A response arrived but its status was outside [200, 300).
    #[error("unexpected HTTP status {status}: {body}")]
    HttpStatus { status: u16, body: String },

    /// The response body did not match the expected shape.
    #[error("failed to decode response: {0}")]
    Deserialization(#[from] serde_json::Error),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ShopError {
    /// Short, stable name of the variant. Used as the exception type on spans.
    pub fn kind(&self) -> &'static str {
        match self {
            ShopError::Network(_) => "NetworkError",
            ShopError::HttpStatus { .. } => "HttpStatusError",
            ShopError::Deserialization(_) => "DeserializationError",
            ShopError::Validation(_) => "ValidationError",
            ShopError::Io(_) => "IoError",
            ShopError::Other(_) => "Error",
        }
    }

    /// Status code carried by an `HttpStatus` error.
    pub fn status(&self) -> Option<u16> {
        match self {
            ShopError::HttpStatus { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }
}

pub type CoreResult<T> = std::result::Result<T, ShopError>;
