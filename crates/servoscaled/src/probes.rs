//! HTTP probes against the managed workload's local endpoint.
//!
//! The serving process exposes `/health` (2xx while live) and `/metrics`
//! (JSON snapshot of engine counters). These probes are the daemon's
//! implementations of the engine's collaborator traits; the engine itself
//! never sees HTTP.

use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use servo_core::TaskSpec;
use servoscale_detector::{LivenessProbe, MetricsSource};

pub struct HttpProbe {
    client: reqwest::Client,
}

impl HttpProbe {
    pub fn new(timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .no_proxy()
            .build()
            .context("building probe http client")?;
        Ok(Self { client })
    }
}

#[async_trait]
impl LivenessProbe for HttpProbe {
    async fn is_running(&self, spec: &TaskSpec) -> bool {
        let url = format!("http://{}/health", spec.endpoint);
        match self.client.get(&url).send().await {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                debug!(task = %spec.name, error = %e, "liveness probe failed");
                false
            }
        }
    }
}

#[async_trait]
impl MetricsSource for HttpProbe {
    async fn sample(&self, spec: &TaskSpec) -> anyhow::Result<Value> {
        let url = format!("http://{}/metrics", spec.endpoint);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .with_context(|| format!("fetching metrics from {url}"))?
            .error_for_status()
            .with_context(|| format!("metrics endpoint {url} returned error status"))?;
        response.json().await.context("decoding metrics payload")
    }
}
