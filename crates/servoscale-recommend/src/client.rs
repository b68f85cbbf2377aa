//! HTTP client for the remote recommendation service.
//!
//! Three stateless, idempotent operations: initial config recommendation,
//! anomaly detection, anomaly recovery. Each is a single synchronous JSON
//! POST with no caching, batching, or retry. Responses use a
//! `{result, error}` envelope whose `result` payload is re-decoded into the
//! typed response, so a malformed payload fails independently of the
//! network call.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::Value;
use tracing::debug;

use servo_core::{ConfigRecommendResult, ModelSpec};

use crate::error::{RecommendError, RecommendResult};

const CONFIG_RECOMMEND_PATH: &str = "/api/v1/config/recommend";
const ANOMALY_DETECT_PATH: &str = "/api/v1/anomaly/detect";
const ANOMALY_RECOVER_PATH: &str = "/api/v1/anomaly/recover";

/// Current metrics and configuration for one task, as sent to the
/// detection and recovery operations. Payloads are opaque to this layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectParams {
    pub metrics: Value,
    pub configurations: Value,
}

/// Remote recommendation operations.
///
/// Trait seam so the reconciliation engine can be driven by scripted
/// responses in tests.
#[async_trait]
pub trait Recommender: Send + Sync {
    /// Recommend a starting configuration for a task's declared model/GPU
    /// requirements.
    async fn recommend_initial_config(
        &self,
        model: &ModelSpec,
    ) -> RecommendResult<ConfigRecommendResult>;

    /// Whether the task currently looks anomalous.
    async fn detect_anomaly(&self, params: &DetectParams) -> RecommendResult<bool>;

    /// A configuration proposal intended to resolve a detected anomaly.
    async fn recover_from_anomaly(
        &self,
        params: &DetectParams,
    ) -> RecommendResult<ConfigRecommendResult>;
}

// ── Wire types ────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct ConfigRecommendRequest<'a> {
    llm: &'a str,
    gpu: &'a servo_core::GpuSpec,
}

/// Response envelope shared by all three operations.
#[derive(Debug, Deserialize)]
pub struct Envelope {
    pub result: Option<Value>,
    pub error: Option<String>,
}

impl Envelope {
    /// Unwrap the envelope and decode the result payload.
    pub fn decode<T: DeserializeOwned>(self) -> RecommendResult<T> {
        if let Some(error) = self.error {
            return Err(RecommendError::Remote(error));
        }
        let result = self
            .result
            .ok_or_else(|| RecommendError::Decode("envelope has no result".to_string()))?;
        serde_json::from_value(result).map_err(|e| RecommendError::Decode(e.to_string()))
    }
}

#[derive(Debug, Deserialize)]
struct AnomalyDetectResponse {
    /// Anomaly score from the remote service; strictly positive means
    /// anomalous.
    is_anomaly: i64,
}

// ── HTTP client ───────────────────────────────────────────────────

/// reqwest-backed [`Recommender`] with a bounded per-request timeout.
pub struct HttpRecommender {
    client: reqwest::Client,
    base_url: String,
}

impl HttpRecommender {
    /// Build a client against `base_url` (e.g. `http://127.0.0.1:8181`).
    pub fn new(base_url: &str, timeout: Duration) -> RecommendResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .no_proxy()
            .build()
            .map_err(|e| RecommendError::Transport(e.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn call<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> RecommendResult<T> {
        let url = format!("{}{}", self.base_url, path);
        debug!(%url, "recommendation call");

        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| RecommendError::Transport(e.to_string()))?
            .error_for_status()
            .map_err(|e| RecommendError::Transport(e.to_string()))?;

        let envelope: Envelope = response
            .json()
            .await
            .map_err(|e| RecommendError::Decode(e.to_string()))?;
        envelope.decode()
    }
}

#[async_trait]
impl Recommender for HttpRecommender {
    async fn recommend_initial_config(
        &self,
        model: &ModelSpec,
    ) -> RecommendResult<ConfigRecommendResult> {
        let request = ConfigRecommendRequest {
            llm: &model.llm,
            gpu: &model.gpu,
        };
        self.call(CONFIG_RECOMMEND_PATH, &request).await
    }

    async fn detect_anomaly(&self, params: &DetectParams) -> RecommendResult<bool> {
        let response: AnomalyDetectResponse = self.call(ANOMALY_DETECT_PATH, params).await?;
        Ok(response.is_anomaly > 0)
    }

    async fn recover_from_anomaly(
        &self,
        params: &DetectParams,
    ) -> RecommendResult<ConfigRecommendResult> {
        self.call(ANOMALY_RECOVER_PATH, params).await
    }
}
