//! Error types for the recommendation client.

use thiserror::Error;

/// Result type alias for recommendation operations.
pub type RecommendResult<T> = Result<T, RecommendError>;

/// Errors from remote recommendation calls.
///
/// Transport, remote-reported, and decode failures are distinct: a response
/// that arrives but has an unexpected shape is a `Decode` error, not a
/// `Transport` one.
#[derive(Debug, Error)]
pub enum RecommendError {
    /// The request could not complete (connect, timeout, non-2xx).
    #[error("transport error: {0}")]
    Transport(String),

    /// The service answered with an error in the response envelope.
    #[error("remote error: {0}")]
    Remote(String),

    /// The response arrived but the payload shape was unexpected.
    #[error("decode error: {0}")]
    Decode(String),
}
