//! servoscale-detector — task registry and reconciliation engine.
//!
//! The core of the autoscaling sidecar:
//!
//! - [`TaskRegistry`] owns the name→record mapping and the
//!   register/deregister lifecycle (initial recommendation, first scale
//!   command, scale-to-zero on removal).
//! - [`DetectEngine`] drives the per-tick protocol: liveness → detect →
//!   recover → apply → publish → record.
//!
//! # Architecture
//!
//! ```text
//! DetectEngine (timer tick)
//!   ├── TaskRegistry (Arc<RwLock<HashMap>>, lock never held across I/O)
//!   ├── LivenessProbe / MetricsSource (daemon-wired probes)
//!   ├── Recommender (remote detect/recover calls)
//!   ├── CommandPublisher (fire-and-forget scale commands)
//!   └── HistoryStore (capped per-task audit trail)
//! ```

pub mod engine;
pub mod error;
pub mod probe;
pub mod registry;

#[cfg(test)]
pub(crate) mod testing;

pub use engine::{DetectEngine, TaskOutcome};
pub use error::{DetectorError, DetectorResult};
pub use probe::{LivenessProbe, MetricsSource};
pub use registry::TaskRegistry;
