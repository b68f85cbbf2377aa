//! Domain types for servoscale.
//!
//! These types describe managed inference workloads and the recommendation
//! results exchanged with the remote service. Everything is serializable to
//! JSON: specs are snapshotted onto the command channel and recommendation
//! results are persisted into the history store.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Unique identifier for a managed task.
pub type TaskName = String;

// ── Task specification ─────────────────────────────────────────────

/// Specification for one managed inference-serving workload.
///
/// Owned by the task registry for its registered lifetime and mutated in
/// place when a recommendation is applied. Collaborators only ever see
/// serialized snapshots.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TaskSpec {
    pub name: TaskName,
    /// Declarative model/GPU requirements used for initial sizing.
    pub model: ModelSpec,
    /// Address of the serving workload (host:port), probed for liveness
    /// and runtime metrics.
    pub endpoint: String,
    /// Desired replica count.
    pub replicas: u32,
    /// Backend-specific serving configuration.
    pub backend: BackendConfig,
}

/// Model and GPU requirements declared at deploy time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModelSpec {
    /// Model identifier (e.g. "llama-3-8b").
    pub llm: String,
    pub gpu: GpuSpec,
}

/// GPU resources available to the workload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GpuSpec {
    /// GPU product name (e.g. "A10").
    pub product: String,
    pub count: u32,
}

/// Backend-specific serving configuration.
///
/// Task configs vary by backend kind; vLLM is the only kind the recovery
/// path can tune today. Other kinds parse and serialize but yield
/// [`CoreError::UnsupportedBackend`] from the tuning operations.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BackendConfig {
    Vllm(VllmConfig),
    Sglang(SglangConfig),
}

impl BackendConfig {
    /// Backend kind tag, for diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            BackendConfig::Vllm(_) => "vllm",
            BackendConfig::Sglang(_) => "sglang",
        }
    }
}

/// vLLM engine tunables.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VllmConfig {
    /// Maximum number of concurrently scheduled sequences.
    pub max_num_seqs: u32,
    /// Tensor parallelism degree.
    pub tensor_parallel_size: u32,
    /// Fraction of GPU memory the engine may use (0.0–1.0).
    pub gpu_memory_utilization: f64,
}

/// SGLang engine tunables. Declared but not yet handled by the
/// recommendation protocol.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SglangConfig {
    pub max_running_requests: u32,
    pub tensor_parallel_size: u32,
    pub mem_fraction_static: f64,
}

impl TaskSpec {
    /// The declared model/GPU requirements.
    pub fn model_spec(&self) -> &ModelSpec {
        &self.model
    }

    /// Snapshot the currently active configuration as a recommendation-shaped
    /// value, for history entries and detection requests.
    pub fn recommend_snapshot(&self) -> Result<ConfigRecommendResult, CoreError> {
        match &self.backend {
            BackendConfig::Vllm(cfg) => Ok(ConfigRecommendResult {
                max_num_seqs: cfg.max_num_seqs,
                tensor_parallel_size: cfg.tensor_parallel_size,
                gpu_memory_utilization: cfg.gpu_memory_utilization,
                replicas: self.replicas,
            }),
            other => Err(CoreError::UnsupportedBackend(other.kind())),
        }
    }

    /// Apply a recommendation in place: backend tunables and replica target.
    pub fn apply_recommendation(
        &mut self,
        rec: &ConfigRecommendResult,
    ) -> Result<(), CoreError> {
        match &mut self.backend {
            BackendConfig::Vllm(cfg) => {
                cfg.max_num_seqs = rec.max_num_seqs;
                cfg.tensor_parallel_size = rec.tensor_parallel_size;
                cfg.gpu_memory_utilization = rec.gpu_memory_utilization;
                self.replicas = rec.replicas;
                Ok(())
            }
            other => Err(CoreError::UnsupportedBackend(other.kind())),
        }
    }

    /// Set the replica target directly (used for the deregistration
    /// scale-to-zero command).
    pub fn set_replicas(&mut self, replicas: u32) {
        self.replicas = replicas;
    }
}

// ── Task lifecycle ────────────────────────────────────────────────

/// Lifecycle status of a managed task.
///
/// Re-derived from the liveness probe every tick; a cache of the last
/// observed state, not authoritative truth.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Registered, never yet observed by the reconciliation loop.
    Created,
    /// Last probe found the workload not running.
    Scheduling,
    /// Last probe found the workload running.
    Running,
}

/// Registry record: a task spec plus its last observed status.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DetectTask {
    pub spec: TaskSpec,
    pub status: TaskStatus,
}

// ── Recommendation results ────────────────────────────────────────

/// A configuration proposal from the remote recommendation service.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConfigRecommendResult {
    pub max_num_seqs: u32,
    pub tensor_parallel_size: u32,
    pub gpu_memory_utilization: f64,
    pub replicas: u32,
}

/// One historical anomaly/recovery event.
///
/// `current_config` is the configuration that was active at detection time,
/// captured by value before the recommendation was applied, so history
/// always shows what changed from what.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnomalyRecommendResult {
    /// Unix timestamp in milliseconds.
    pub timestamp: i64,
    pub is_anomaly: bool,
    pub recommend: ConfigRecommendResult,
    pub current_config: ConfigRecommendResult,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vllm_spec() -> TaskSpec {
        TaskSpec {
            name: "llama-chat".to_string(),
            model: ModelSpec {
                llm: "llama-3-8b".to_string(),
                gpu: GpuSpec {
                    product: "A10".to_string(),
                    count: 1,
                },
            },
            endpoint: "127.0.0.1:9001".to_string(),
            replicas: 2,
            backend: BackendConfig::Vllm(VllmConfig {
                max_num_seqs: 256,
                tensor_parallel_size: 1,
                gpu_memory_utilization: 0.9,
            }),
        }
    }

    #[test]
    fn apply_recommendation_updates_backend_and_replicas() {
        let mut spec = vllm_spec();
        let rec = ConfigRecommendResult {
            max_num_seqs: 128,
            tensor_parallel_size: 2,
            gpu_memory_utilization: 0.8,
            replicas: 4,
        };
        spec.apply_recommendation(&rec).unwrap();

        assert_eq!(spec.replicas, 4);
        match &spec.backend {
            BackendConfig::Vllm(cfg) => {
                assert_eq!(cfg.max_num_seqs, 128);
                assert_eq!(cfg.tensor_parallel_size, 2);
            }
            other => panic!("unexpected backend: {}", other.kind()),
        }
    }

    #[test]
    fn snapshot_reflects_current_config() {
        let spec = vllm_spec();
        let snap = spec.recommend_snapshot().unwrap();
        assert_eq!(snap.max_num_seqs, 256);
        assert_eq!(snap.replicas, 2);
    }

    #[test]
    fn sglang_backend_is_unsupported_by_tuning() {
        let mut spec = vllm_spec();
        spec.backend = BackendConfig::Sglang(SglangConfig {
            max_running_requests: 64,
            tensor_parallel_size: 1,
            mem_fraction_static: 0.85,
        });

        assert!(matches!(
            spec.recommend_snapshot(),
            Err(CoreError::UnsupportedBackend("sglang"))
        ));
        let rec = ConfigRecommendResult {
            max_num_seqs: 128,
            tensor_parallel_size: 1,
            gpu_memory_utilization: 0.8,
            replicas: 1,
        };
        assert!(spec.apply_recommendation(&rec).is_err());
    }

    #[test]
    fn backend_config_json_is_tagged() {
        let spec = vllm_spec();
        let json = serde_json::to_value(&spec).unwrap();
        assert_eq!(json["backend"]["type"], "vllm");
        assert_eq!(json["backend"]["max_num_seqs"], 256);

        let back: TaskSpec = serde_json::from_value(json).unwrap();
        assert_eq!(back, spec);
    }
}
