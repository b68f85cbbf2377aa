//! servo-core — shared domain types and configuration for servoscale.
//!
//! Defines the task specification model (specs, backend configs,
//! recommendation results, task status) and the `servoscale.toml` parser
//! used by the daemon.

pub mod config;
pub mod error;
pub mod types;

pub use config::ServoConfig;
pub use error::CoreError;
pub use types::{
    AnomalyRecommendResult, BackendConfig, ConfigRecommendResult, DetectTask, GpuSpec, ModelSpec,
    SglangConfig, TaskName, TaskSpec, TaskStatus, VllmConfig,
};
