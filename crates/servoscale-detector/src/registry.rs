//! TaskRegistry — owns the name→record mapping for managed tasks.
//!
//! Single source of truth for what is being managed. Registration and
//! deregistration are called from outside the reconciliation loop, so the
//! map lives behind an async `RwLock`; the lock is held only for map
//! reads/writes and never across a remote call.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{info, warn};

use servo_core::{ConfigRecommendResult, DetectTask, TaskSpec, TaskStatus};
use servoscale_publish::CommandPublisher;
use servoscale_recommend::Recommender;

use crate::error::{DetectorError, DetectorResult};

/// Registry of managed tasks.
///
/// A record exists in the map iff the task is currently managed
/// (registered and not yet deregistered).
pub struct TaskRegistry {
    tasks: RwLock<HashMap<String, DetectTask>>,
    recommender: Arc<dyn Recommender>,
    publisher: Arc<dyn CommandPublisher>,
}

impl TaskRegistry {
    pub fn new(recommender: Arc<dyn Recommender>, publisher: Arc<dyn CommandPublisher>) -> Self {
        Self {
            tasks: RwLock::new(HashMap::new()),
            recommender,
            publisher,
        }
    }

    /// Register a task: fetch its initial configuration from the
    /// recommendation service, apply it, publish the first scale command,
    /// and only then insert the record with status `Created`.
    ///
    /// A failed initial recommendation aborts registration entirely; the
    /// task is never added. Re-registering a present name is a no-op that
    /// does not re-run initialization.
    pub async fn register(&self, mut spec: TaskSpec) -> DetectorResult<()> {
        {
            let tasks = self.tasks.read().await;
            if tasks.contains_key(&spec.name) {
                return Err(DetectorError::AlreadyRegistered(spec.name));
            }
        }

        let initial = self
            .recommender
            .recommend_initial_config(spec.model_spec())
            .await?;
        spec.apply_recommendation(&initial)?;

        // Publish before inserting, so the first scale command for a task
        // always precedes its visibility to the reconciliation loop.
        // Delivery stays fire-and-forget.
        if let Err(e) = self.publisher.send(&spec).await {
            warn!(task = %spec.name, error = %e, "initial scale command publish failed");
        }

        let name = spec.name.clone();
        let mut tasks = self.tasks.write().await;
        // Re-check under the write lock; a concurrent register may have won.
        if tasks.contains_key(&name) {
            return Err(DetectorError::AlreadyRegistered(name));
        }
        tasks.insert(
            name.clone(),
            DetectTask {
                spec,
                status: TaskStatus::Created,
            },
        );
        info!(task = %name, "task registered");
        Ok(())
    }

    /// Deregister a task: remove it from the map, then publish a
    /// scale-to-zero command for it.
    ///
    /// Removal happens before the publish, so a deregistered task can never
    /// be reconciled again even if the zero-scale publish fails. An unknown
    /// name is an informational no-op.
    pub async fn deregister(&self, name: &str) {
        let removed = {
            let mut tasks = self.tasks.write().await;
            tasks.remove(name)
        };

        let Some(mut task) = removed else {
            info!(task = %name, "task is not registered, nothing to deregister");
            return;
        };

        task.spec.set_replicas(0);
        if let Err(e) = self.publisher.send(&task.spec).await {
            warn!(task = %name, error = %e, "scale-to-zero publish failed");
        }
        info!(task = %name, "task deregistered");
    }

    /// Snapshot of the current name→record mapping. Iteration order is not
    /// significant.
    pub async fn tasks(&self) -> HashMap<String, DetectTask> {
        self.tasks.read().await.clone()
    }

    /// Snapshot of the registered specs, cloned so remote calls can run
    /// without holding the registry lock.
    pub(crate) async fn snapshot_specs(&self) -> Vec<TaskSpec> {
        self.tasks
            .read()
            .await
            .values()
            .map(|t| t.spec.clone())
            .collect()
    }

    /// Update a task's observed status. No-op if the task is gone.
    pub(crate) async fn set_status(&self, name: &str, status: TaskStatus) {
        let mut tasks = self.tasks.write().await;
        if let Some(task) = tasks.get_mut(name) {
            task.status = status;
        }
    }

    /// Apply a recovery recommendation to a task in place.
    ///
    /// Returns the updated spec and the pre-mutation configuration
    /// snapshot, or `None` if the task was deregistered since the tick
    /// snapshot was taken.
    pub(crate) async fn apply_recovery(
        &self,
        name: &str,
        rec: &ConfigRecommendResult,
    ) -> DetectorResult<Option<(TaskSpec, ConfigRecommendResult)>> {
        let mut tasks = self.tasks.write().await;
        let Some(task) = tasks.get_mut(name) else {
            return Ok(None);
        };
        let before = task.spec.recommend_snapshot()?;
        task.spec.apply_recommendation(rec)?;
        Ok(Some((task.spec.clone(), before)))
    }
}
