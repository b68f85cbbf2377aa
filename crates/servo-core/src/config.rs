//! servoscale.toml configuration parser.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::CoreError;
use crate::types::{BackendConfig, ModelSpec, TaskSpec};

/// Top-level daemon configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServoConfig {
    pub detector: DetectorConfig,
    pub recommender: RecommenderConfig,
    pub publisher: PublisherConfig,
    #[serde(default)]
    pub history: HistoryConfig,
    #[serde(default)]
    pub liveness: LivenessConfig,
    /// Tasks registered at daemon startup.
    #[serde(default, rename = "task")]
    pub tasks: Vec<TaskConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectorConfig {
    /// Reconciliation tick interval in seconds.
    pub interval_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommenderConfig {
    /// Base URL of the remote recommendation service.
    pub endpoint: String,
    /// Per-request timeout in seconds.
    #[serde(default = "default_recommender_timeout")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublisherConfig {
    /// Address of the downstream scale executor (host:port).
    pub addr: String,
    /// Connect + write timeout in seconds.
    #[serde(default = "default_publisher_timeout")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct HistoryConfig {
    /// Path of the history database. In-memory when omitted.
    pub path: Option<std::path::PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LivenessConfig {
    /// Probe timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for LivenessConfig {
    fn default() -> Self {
        Self { timeout_secs: 2 }
    }
}

/// One task declared in the config file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskConfig {
    pub name: String,
    pub model: ModelSpec,
    pub endpoint: String,
    #[serde(default = "default_replicas")]
    pub replicas: u32,
    pub backend: BackendConfig,
}

impl TaskConfig {
    /// Build the initial task spec for registration.
    pub fn to_spec(&self) -> TaskSpec {
        TaskSpec {
            name: self.name.clone(),
            model: self.model.clone(),
            endpoint: self.endpoint.clone(),
            replicas: self.replicas,
            backend: self.backend.clone(),
        }
    }
}

fn default_recommender_timeout() -> u64 {
    10
}

fn default_publisher_timeout() -> u64 {
    5
}

fn default_replicas() -> u32 {
    1
}

impl ServoConfig {
    pub fn from_file(path: &Path) -> Result<Self, CoreError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| CoreError::ConfigIo(e.to_string()))?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, CoreError> {
        toml::from_str(content).map_err(|e| CoreError::ConfigParse(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
[detector]
interval_secs = 30

[recommender]
endpoint = "http://127.0.0.1:8181"

[publisher]
addr = "127.0.0.1:5555"

[[task]]
name = "llama-chat"
endpoint = "127.0.0.1:9001"
model = { llm = "llama-3-8b", gpu = { product = "A10", count = 1 } }
backend = { type = "vllm", max_num_seqs = 256, tensor_parallel_size = 1, gpu_memory_utilization = 0.9 }
"#;

    #[test]
    fn parse_sample_config() {
        let config = ServoConfig::from_toml(SAMPLE).unwrap();
        assert_eq!(config.detector.interval_secs, 30);
        assert_eq!(config.recommender.timeout_secs, 10);
        assert_eq!(config.publisher.timeout_secs, 5);
        assert!(config.history.path.is_none());
        assert_eq!(config.tasks.len(), 1);

        let spec = config.tasks[0].to_spec();
        assert_eq!(spec.name, "llama-chat");
        assert_eq!(spec.replicas, 1);
        assert_eq!(spec.backend.kind(), "vllm");
    }

    #[test]
    fn unknown_backend_kind_is_rejected() {
        let bad = SAMPLE.replace("\"vllm\"", "\"triton\"");
        assert!(ServoConfig::from_toml(&bad).is_err());
    }
}
