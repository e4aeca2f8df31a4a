//! Lambda pipeline entry point.
//!
//! Thin sequencing over the three layers:
//! - one batch compaction run at startup
//! - the stream committer cycle loop until shutdown
//! - a KPI and metrics snapshot logged on the way out
//!
//! The serving layer is stateless and recomputed per query; the
//! binary composes it once at shutdown so a run's end state is
//! visible in the logs.

use std::time::Duration;

use anyhow::{Context, Result};
use tokio::signal;
use tokio::sync::watch;
use tracing::{error, info};

use batch_layer::BatchCompactor;
use pipeline_core::StoreLayout;
use serving_layer::ViewComposer;
use speed_layer::{run_committer, CommitterConfig, StreamCommitter};
use telemetry::{init_tracing_from_env, metrics};

/// Application configuration.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
struct Config {
    /// Base directory holding the data/ tree
    #[serde(default = "default_base_dir")]
    base_dir: String,

    /// Stream committer cadence in seconds
    #[serde(default = "default_poll_interval_secs")]
    poll_interval_secs: u64,

    /// Skip the startup compaction run
    #[serde(default)]
    skip_batch: bool,
}

fn default_base_dir() -> String {
    ".".to_string()
}

fn default_poll_interval_secs() -> u64 {
    5
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_dir: default_base_dir(),
            poll_interval_secs: default_poll_interval_secs(),
            skip_batch: false,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    // Initialize tracing
    init_tracing_from_env();

    info!("Starting lambda pipeline v{}", env!("CARGO_PKG_VERSION"));

    let config = load_config()?;
    let layout = StoreLayout::from_base_dir(&config.base_dir);
    info!(base_dir = %config.base_dir, "Store layout resolved");

    // Batch layer: one full snapshot rebuild. A failure here is fatal;
    // retry policy belongs to whatever launched us.
    if !config.skip_batch {
        let compactor = BatchCompactor::new(layout.clone());
        compactor.run().context("Batch compaction failed")?;
    }

    // Speed layer: cycle until shutdown.
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let committer = StreamCommitter::new(layout.clone());
    let committer_config = CommitterConfig {
        poll_interval: Duration::from_secs(config.poll_interval_secs),
    };
    let committer_handle = tokio::spawn(run_committer(committer, committer_config, shutdown_rx));

    shutdown_signal().await;
    info!("Shutting down");

    // Cooperative cancellation: the committer finishes its current
    // cycle before observing the flip.
    let _ = shutdown_tx.send(true);
    match committer_handle.await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => error!("Committer exited with error: {}", e),
        Err(e) => error!("Committer task panicked: {}", e),
    }

    // Serving layer: log the end-of-run KPIs over whatever the two
    // writers published.
    match ViewComposer::new(layout).kpis() {
        Ok(kpis) => info!(
            total_sales = kpis.total_sales,
            transaction_count = kpis.transaction_count,
            avg_order_value = kpis.avg_order_value,
            "Final KPI snapshot"
        ),
        Err(e) => error!("KPI snapshot failed: {}", e),
    }

    let snapshot = metrics().snapshot();
    info!(
        compaction_runs = snapshot.compaction_runs,
        commit_cycles = snapshot.commit_cycles,
        partitions_written = snapshot.partitions_written,
        "Shutdown complete"
    );
    Ok(())
}

/// Load configuration from files and environment.
fn load_config() -> Result<Config> {
    let config = config::Config::builder()
        // Start with defaults
        .add_source(config::Config::try_from(&Config::default())?)
        // Load from config file if exists
        .add_source(
            config::File::with_name("config/default")
                .required(false)
                .format(config::FileFormat::Toml),
        )
        // Override with environment variables
        .add_source(
            config::Environment::default()
                .separator("__")
                .prefix("LAMBDA")
                .try_parsing(true),
        )
        .build()
        .context("Failed to build configuration")?;

    let mut config: Config = config
        .try_deserialize()
        .context("Failed to deserialize configuration")?;

    // Legacy override kept for parity with earlier deployments.
    if let Ok(base) = std::env::var("LAMBDA_BASE_DIR") {
        config.base_dir = base;
    }

    Ok(config)
}

/// Graceful shutdown signal handler.
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        }
        _ = terminate => {
            info!("Received terminate signal");
        }
    }
}
