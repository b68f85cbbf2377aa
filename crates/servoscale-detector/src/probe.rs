//! Collaborator traits for workload liveness and runtime metrics.
//!
//! The engine never talks to the orchestration runtime or the serving
//! process directly; the daemon wires concrete probes behind these seams.

use async_trait::async_trait;
use serde_json::Value;

use servo_core::TaskSpec;

/// Answers whether a task's underlying workload is currently running.
#[async_trait]
pub trait LivenessProbe: Send + Sync {
    async fn is_running(&self, spec: &TaskSpec) -> bool;
}

/// Samples a task's current runtime metrics for the detection and
/// recovery requests. The payload is opaque to the engine.
#[async_trait]
pub trait MetricsSource: Send + Sync {
    async fn sample(&self, spec: &TaskSpec) -> anyhow::Result<Value>;
}
