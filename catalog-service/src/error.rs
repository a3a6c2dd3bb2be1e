//! Crate-level error type
//!
//! Request-scoped failures are reported as
//! [`ApiError`](crate::handlers::ApiError); this enum covers
//! everything that can stop the service itself (configuration, sockets,
//! seed files) and wraps the lower layers so `?` works across them.

use thiserror::Error;

use crate::store::StoreError;

/// Result type alias using the crate's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Service error
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(Box<figment::Error>),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed JSON input (seed files)
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Document store error
    #[error("{0}")]
    Store(#[from] StoreError),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Error::Config(Box::new(err))
    }
}
