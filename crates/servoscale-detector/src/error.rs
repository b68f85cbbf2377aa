//! Detector error types.

use thiserror::Error;

/// Errors that can occur during registry and reconciliation operations.
#[derive(Debug, Error)]
pub enum DetectorError {
    #[error("task already registered: {0}")]
    AlreadyRegistered(String),

    #[error("task configuration error: {0}")]
    Core(#[from] servo_core::CoreError),

    #[error("recommendation error: {0}")]
    Recommend(#[from] servoscale_recommend::RecommendError),

    #[error("metrics sampling error: {0}")]
    Metrics(#[source] anyhow::Error),

    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

pub type DetectorResult<T> = Result<T, DetectorError>;
