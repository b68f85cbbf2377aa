//! servoscale-publish — fire-and-forget delivery of scale commands.
//!
//! A scale command is one serialized task spec describing the desired
//! configuration and replica count. Delivery is best-effort: no
//! acknowledgment beyond transport-level success, no retry at this layer.
//! Callers log failures and move on. Consumers of the channel are out of
//! scope.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tracing::debug;

use servo_core::TaskSpec;

/// Result type alias for publish operations.
pub type PublishResult<T> = Result<T, PublishError>;

/// Errors from command publication.
#[derive(Debug, Error)]
pub enum PublishError {
    #[error("serialization error: {0}")]
    Serialize(String),

    #[error("connect error: {0}")]
    Connect(String),

    #[error("write error: {0}")]
    Write(String),
}

/// Publish-only channel for scale commands.
#[async_trait]
pub trait CommandPublisher: Send + Sync {
    /// Deliver one scale command, best-effort.
    async fn send(&self, spec: &TaskSpec) -> PublishResult<()>;
}

/// TCP publisher emitting newline-delimited JSON, one command per line.
///
/// Connects per send with a bounded connect/write timeout; a dropped or
/// unreachable executor surfaces as a `Connect`/`Write` error that callers
/// log without retrying.
pub struct TcpCommandPublisher {
    addr: String,
    timeout: Duration,
}

impl TcpCommandPublisher {
    pub fn new(addr: &str, timeout: Duration) -> Self {
        Self {
            addr: addr.to_string(),
            timeout,
        }
    }
}

#[async_trait]
impl CommandPublisher for TcpCommandPublisher {
    async fn send(&self, spec: &TaskSpec) -> PublishResult<()> {
        let mut line =
            serde_json::to_vec(spec).map_err(|e| PublishError::Serialize(e.to_string()))?;
        line.push(b'\n');

        let mut stream = tokio::time::timeout(self.timeout, TcpStream::connect(&self.addr))
            .await
            .map_err(|_| PublishError::Connect(format!("connect to {} timed out", self.addr)))?
            .map_err(|e| PublishError::Connect(e.to_string()))?;

        tokio::time::timeout(self.timeout, async {
            stream.write_all(&line).await?;
            stream.flush().await?;
            stream.shutdown().await
        })
        .await
        .map_err(|_| PublishError::Write(format!("write to {} timed out", self.addr)))?
        .map_err(|e| PublishError::Write(e.to_string()))?;

        debug!(task = %spec.name, replicas = spec.replicas, addr = %self.addr, "scale command published");
        Ok(())
    }
}
