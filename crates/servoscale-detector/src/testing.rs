//! Scripted collaborator implementations shared by the registry and
//! engine test suites.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use serde_json::{Value, json};
use tokio::sync::Mutex;

use servo_core::{
    BackendConfig, ConfigRecommendResult, GpuSpec, ModelSpec, TaskSpec, VllmConfig,
};
use servoscale_publish::{CommandPublisher, PublishError, PublishResult};
use servoscale_recommend::{DetectParams, RecommendError, RecommendResult, Recommender};

use crate::probe::{LivenessProbe, MetricsSource};

pub(crate) fn vllm_spec(name: &str, replicas: u32) -> TaskSpec {
    TaskSpec {
        name: name.to_string(),
        model: ModelSpec {
            llm: "llama-3-8b".to_string(),
            gpu: GpuSpec {
                product: "A10".to_string(),
                count: 1,
            },
        },
        endpoint: "127.0.0.1:9001".to_string(),
        replicas,
        backend: BackendConfig::Vllm(VllmConfig {
            max_num_seqs: 256,
            tensor_parallel_size: 1,
            gpu_memory_utilization: 0.9,
        }),
    }
}

pub(crate) fn recommend(replicas: u32) -> ConfigRecommendResult {
    ConfigRecommendResult {
        max_num_seqs: 256,
        tensor_parallel_size: 1,
        gpu_memory_utilization: 0.9,
        replicas,
    }
}

/// Recommender answering from scripted response queues.
///
/// Unscripted initial/recover calls fail with a transport error;
/// unscripted detect calls report not-anomalous.
#[derive(Default)]
pub(crate) struct MockRecommender {
    initial: Mutex<VecDeque<RecommendResult<ConfigRecommendResult>>>,
    detect: Mutex<VecDeque<RecommendResult<bool>>>,
    recover: Mutex<VecDeque<RecommendResult<ConfigRecommendResult>>>,
    initial_calls: AtomicUsize,
    detect_calls: AtomicUsize,
    recover_calls: AtomicUsize,
}

impl MockRecommender {
    pub(crate) async fn script_initial(&self, response: RecommendResult<ConfigRecommendResult>) {
        self.initial.lock().await.push_back(response);
    }

    pub(crate) async fn script_detect(&self, response: RecommendResult<bool>) {
        self.detect.lock().await.push_back(response);
    }

    pub(crate) async fn script_recover(&self, response: RecommendResult<ConfigRecommendResult>) {
        self.recover.lock().await.push_back(response);
    }

    pub(crate) fn initial_calls(&self) -> usize {
        self.initial_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn detect_calls(&self) -> usize {
        self.detect_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn recover_calls(&self) -> usize {
        self.recover_calls.load(Ordering::SeqCst)
    }
}

fn unscripted<T>() -> RecommendResult<T> {
    Err(RecommendError::Transport("unscripted call".to_string()))
}

#[async_trait]
impl Recommender for MockRecommender {
    async fn recommend_initial_config(
        &self,
        _model: &ModelSpec,
    ) -> RecommendResult<ConfigRecommendResult> {
        self.initial_calls.fetch_add(1, Ordering::SeqCst);
        self.initial.lock().await.pop_front().unwrap_or_else(unscripted)
    }

    async fn detect_anomaly(&self, _params: &DetectParams) -> RecommendResult<bool> {
        self.detect_calls.fetch_add(1, Ordering::SeqCst);
        self.detect.lock().await.pop_front().unwrap_or(Ok(false))
    }

    async fn recover_from_anomaly(
        &self,
        _params: &DetectParams,
    ) -> RecommendResult<ConfigRecommendResult> {
        self.recover_calls.fetch_add(1, Ordering::SeqCst);
        self.recover.lock().await.pop_front().unwrap_or_else(unscripted)
    }
}

/// Publisher that records every command it is asked to deliver.
#[derive(Default)]
pub(crate) struct RecordingPublisher {
    commands: Mutex<Vec<TaskSpec>>,
    fail_next: AtomicBool,
}

impl RecordingPublisher {
    pub(crate) async fn sent(&self) -> Vec<TaskSpec> {
        self.commands.lock().await.clone()
    }

    pub(crate) async fn fail_next(&self) {
        self.fail_next.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl CommandPublisher for RecordingPublisher {
    async fn send(&self, spec: &TaskSpec) -> PublishResult<()> {
        if self.fail_next.swap(false, Ordering::SeqCst) {
            return Err(PublishError::Connect("scripted failure".to_string()));
        }
        self.commands.lock().await.push(spec.clone());
        Ok(())
    }
}

/// Liveness probe with a switchable answer.
pub(crate) struct StaticProbe {
    running: AtomicBool,
}

impl StaticProbe {
    pub(crate) fn new(running: bool) -> Self {
        Self {
            running: AtomicBool::new(running),
        }
    }

    pub(crate) fn set_running(&self, running: bool) {
        self.running.store(running, Ordering::SeqCst);
    }
}

#[async_trait]
impl LivenessProbe for StaticProbe {
    async fn is_running(&self, _spec: &TaskSpec) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

/// Metrics source returning a fixed sample, optionally failing.
#[derive(Default)]
pub(crate) struct FixedMetrics {
    fail: AtomicBool,
}

impl FixedMetrics {
    pub(crate) fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl MetricsSource for FixedMetrics {
    async fn sample(&self, _spec: &TaskSpec) -> anyhow::Result<Value> {
        if self.fail.load(Ordering::SeqCst) {
            anyhow::bail!("metrics endpoint unreachable");
        }
        Ok(json!({"pending_requests": 4, "gpu_kv_cache_usage": 0.7}))
    }
}
