//! Shared error types.

use thiserror::Error;

/// Errors from the core domain types.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("unsupported backend kind: {0}")]
    UnsupportedBackend(&'static str),

    #[error("config parse error: {0}")]
    ConfigParse(String),

    #[error("config io error: {0}")]
    ConfigIo(String),
}
