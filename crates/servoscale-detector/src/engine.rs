//! DetectEngine — the timer-driven reconciliation loop.
//!
//! Each tick walks the registry and runs the per-task protocol:
//!
//! 1. Liveness probe — not running → status `Scheduling`, skip the rest.
//! 2. Detect — ask the remote service; failure is fail-open (treated as
//!    not anomalous, no retry).
//! 3. Recover — anomalous only; any failure from here on aborts the
//!    task's tick with no mutation, no publish, no history entry.
//! 4. Apply — mutate the task's backend config in place.
//! 5. Publish — emit the scale command for the mutated spec.
//! 6. Record — append a history entry carrying the pre-mutation snapshot.
//!
//! Remote calls run on a spec clone taken under the registry read lock;
//! the write lock is re-acquired only to apply results, so registration
//! and deregistration are never blocked by a slow network round trip.
//! One task's failure never aborts the other tasks in the same tick.

use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use tracing::{debug, info, warn};

use servo_core::{AnomalyRecommendResult, TaskSpec, TaskStatus};
use servoscale_history::HistoryStore;
use servoscale_publish::CommandPublisher;
use servoscale_recommend::{DetectParams, Recommender};

use crate::error::{DetectorError, DetectorResult};
use crate::probe::{LivenessProbe, MetricsSource};
use crate::registry::TaskRegistry;

/// What a tick did for one task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskOutcome {
    /// Workload not running; marked `Scheduling`, detection skipped.
    NotRunning,
    /// Running and not anomalous (or detection failed open).
    Nominal,
    /// Anomaly detected and a recovery configuration applied.
    Recovered,
    /// Task was deregistered between the tick snapshot and apply.
    Deregistered,
}

/// The reconciliation engine.
pub struct DetectEngine {
    registry: Arc<TaskRegistry>,
    recommender: Arc<dyn Recommender>,
    metrics: Arc<dyn MetricsSource>,
    liveness: Arc<dyn LivenessProbe>,
    publisher: Arc<dyn CommandPublisher>,
    history: HistoryStore,
}

impl DetectEngine {
    pub fn new(
        registry: Arc<TaskRegistry>,
        recommender: Arc<dyn Recommender>,
        metrics: Arc<dyn MetricsSource>,
        liveness: Arc<dyn LivenessProbe>,
        publisher: Arc<dyn CommandPublisher>,
        history: HistoryStore,
    ) -> Self {
        Self {
            registry,
            recommender,
            metrics,
            liveness,
            publisher,
            history,
        }
    }

    /// Run one tick over all registered tasks.
    ///
    /// Failures inside a single task's handling are logged and contained
    /// to that task.
    pub async fn tick_once(&self) -> Vec<(String, TaskOutcome)> {
        let specs = self.registry.snapshot_specs().await;
        debug!(tasks = specs.len(), "reconciliation tick");

        let mut outcomes = Vec::with_capacity(specs.len());
        for spec in specs {
            let name = spec.name.clone();
            match self.reconcile(spec).await {
                Ok(outcome) => outcomes.push((name, outcome)),
                Err(e) => {
                    warn!(task = %name, error = %e, "task reconciliation failed");
                }
            }
        }
        outcomes
    }

    /// Run the engine until the shutdown channel flips.
    ///
    /// A single loop awaits each full tick before sleeping again, so ticks
    /// never overlap; a slow tick simply delays the next one.
    pub async fn run(&self, interval: Duration, mut shutdown: tokio::sync::watch::Receiver<bool>) {
        info!(interval_secs = interval.as_secs(), "detect engine started");

        loop {
            tokio::select! {
                _ = tokio::time::sleep(interval) => {
                    self.tick_once().await;
                }
                _ = shutdown.changed() => {
                    info!("detect engine shutting down");
                    break;
                }
            }
        }
    }

    async fn reconcile(&self, spec: TaskSpec) -> DetectorResult<TaskOutcome> {
        let name = spec.name.clone();

        if !self.liveness.is_running(&spec).await {
            self.registry.set_status(&name, TaskStatus::Scheduling).await;
            debug!(task = %name, "workload not running, skipping detection");
            return Ok(TaskOutcome::NotRunning);
        }
        self.registry.set_status(&name, TaskStatus::Running).await;

        // Detection is fail-open: any failure here counts as not anomalous
        // for this tick.
        let anomalous = match self.detect_params(&spec).await {
            Ok(params) => match self.recommender.detect_anomaly(&params).await {
                Ok(anomalous) => anomalous,
                Err(e) => {
                    warn!(task = %name, error = %e, "anomaly detection failed, assuming nominal");
                    false
                }
            },
            Err(e) => {
                warn!(task = %name, error = %e, "metric sampling failed, assuming nominal");
                false
            }
        };
        debug!(task = %name, anomalous, "anomaly detection result");

        if !anomalous {
            return Ok(TaskOutcome::Nominal);
        }

        // Recovery: fetch fresh parameters, then ask for a new
        // configuration. Failures from here abort the task's tick before
        // any mutation.
        let params = self.detect_params(&spec).await?;
        let recovery = self.recommender.recover_from_anomaly(&params).await?;

        let Some((updated, before)) = self.registry.apply_recovery(&name, &recovery).await? else {
            debug!(task = %name, "task deregistered mid-tick, dropping recovery");
            return Ok(TaskOutcome::Deregistered);
        };

        // Publish precedes the history write, so a downstream scale effect
        // always has (or shortly has) a matching audit record.
        if let Err(e) = self.publisher.send(&updated).await {
            warn!(task = %name, error = %e, "recovery scale command publish failed");
        }

        let entry = AnomalyRecommendResult {
            timestamp: epoch_millis(),
            is_anomaly: true,
            recommend: recovery,
            current_config: before,
        };
        if let Err(e) = self.history.append(&name, &entry) {
            warn!(task = %name, error = %e, "history append failed");
        }

        info!(
            task = %name,
            replicas = updated.replicas,
            "recovery configuration applied"
        );
        Ok(TaskOutcome::Recovered)
    }

    /// Assemble the metrics/configuration payload for detection and
    /// recovery requests.
    async fn detect_params(&self, spec: &TaskSpec) -> DetectorResult<DetectParams> {
        let metrics = self
            .metrics
            .sample(spec)
            .await
            .map_err(DetectorError::Metrics)?;
        let configurations = serde_json::to_value(spec.recommend_snapshot()?)?;
        Ok(DetectParams {
            metrics,
            configurations,
        })
    }
}

fn epoch_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as i64
}
