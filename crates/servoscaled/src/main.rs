//! servoscaled — the servoscale daemon.
//!
//! Single binary that assembles the autoscaling sidecar:
//! - History store (redb)
//! - Recommendation service client
//! - Scale command publisher (TCP)
//! - Workload probes (HTTP liveness + metrics)
//! - Task registry + reconciliation engine
//!
//! # Usage
//!
//! ```text
//! servoscaled run --config /etc/servoscale/servoscale.toml
//! ```

mod probes;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tokio::sync::watch;
use tracing::{error, info, warn};

use servo_core::ServoConfig;
use servoscale_detector::{DetectEngine, TaskRegistry};
use servoscale_history::HistoryStore;
use servoscale_publish::TcpCommandPublisher;
use servoscale_recommend::HttpRecommender;

use crate::probes::HttpProbe;

#[derive(Parser)]
#[command(name = "servoscaled", about = "servoscale autoscaling sidecar")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the reconciliation loop.
    Run {
        /// Path to the servoscale.toml configuration file.
        #[arg(long, default_value = "servoscale.toml")]
        config: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,servoscale=debug".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Run { config } => run(config).await,
    }
}

async fn run(config_path: PathBuf) -> anyhow::Result<()> {
    info!(config = ?config_path, "servoscale daemon starting");

    let config = ServoConfig::from_file(&config_path)
        .with_context(|| format!("loading config from {}", config_path.display()))?;

    // ── Initialize subsystems ──────────────────────────────────

    let history = match &config.history.path {
        Some(path) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let store = HistoryStore::open(path)?;
            info!(path = ?path, "history store opened");
            store
        }
        None => {
            info!("using in-memory history store");
            HistoryStore::open_in_memory()?
        }
    };

    let recommender = Arc::new(HttpRecommender::new(
        &config.recommender.endpoint,
        Duration::from_secs(config.recommender.timeout_secs),
    )?);
    info!(endpoint = %config.recommender.endpoint, "recommendation client ready");

    let publisher = Arc::new(TcpCommandPublisher::new(
        &config.publisher.addr,
        Duration::from_secs(config.publisher.timeout_secs),
    ));
    info!(addr = %config.publisher.addr, "command publisher ready");

    let probe = Arc::new(HttpProbe::new(Duration::from_secs(
        config.liveness.timeout_secs,
    ))?);

    let registry = Arc::new(TaskRegistry::new(recommender.clone(), publisher.clone()));

    // Register tasks declared in the config file. A task whose initial
    // recommendation fails is skipped, not fatal.
    for task in &config.tasks {
        if let Err(e) = registry.register(task.to_spec()).await {
            warn!(task = %task.name, error = %e, "startup registration failed");
        }
    }
    info!(tasks = registry.tasks().await.len(), "startup registration complete");

    let engine = DetectEngine::new(
        registry,
        recommender,
        probe.clone(),
        probe,
        publisher,
        history,
    );

    // ── Run until ctrl-c ──────────────────────────────────────

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "failed to listen for shutdown signal");
            return;
        }
        info!("shutdown signal received");
        let _ = shutdown_tx.send(true);
    });

    engine
        .run(
            Duration::from_secs(config.detector.interval_secs),
            shutdown_rx,
        )
        .await;

    info!("servoscale daemon stopped");
    Ok(())
}
