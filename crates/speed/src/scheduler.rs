//! Cycle scheduler for the stream committer.
//!
//! Single-threaded cooperative polling on a fixed wall-clock
//! interval. Cycles never overlap: `run_cycle` completes fully inside
//! one tick, and the cancellation signal is only consulted between
//! cycles, so mid-cycle work is never preempted.

use std::time::Duration;

use tokio::sync::watch;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{error, info};

use pipeline_core::{Error, Result};

use crate::committer::StreamCommitter;

/// Committer scheduling configuration.
#[derive(Debug, Clone)]
pub struct CommitterConfig {
    /// Fixed cycle cadence
    pub poll_interval: Duration,
}

impl Default for CommitterConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(5),
        }
    }
}

/// Run the committer until the shutdown signal flips.
///
/// Cycle errors are logged and the cadence continues; the next cycle
/// is the retry (no internal retry beyond that). A corrupt checkpoint
/// is the exception: re-running cannot fix it, so it propagates.
pub async fn run_committer(
    committer: StreamCommitter,
    config: CommitterConfig,
    mut shutdown: watch::Receiver<bool>,
) -> Result<()> {
    let mut ticker = interval(config.poll_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    info!(
        poll_interval_secs = config.poll_interval.as_secs(),
        "Stream committer started"
    );

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                match committer.run_cycle() {
                    Ok(summary) => {
                        if !summary.is_noop() {
                            info!(
                                committed = summary.committed,
                                failed = summary.failed,
                                "Processed new stream files"
                            );
                        }
                    }
                    Err(e @ Error::CheckpointCorrupt { .. }) => {
                        error!(error = %e, "Checkpoint unusable, stopping committer");
                        return Err(e);
                    }
                    Err(e) => {
                        error!(error = %e, "Commit cycle error");
                    }
                }
            }
            _ = shutdown.changed() => {
                info!("Stream committer stopping");
                return Ok(());
            }
        }
    }
}
