//! Sale Watcher
//!
//! Polls the mint contract so the API can report sale phase and counters.

use crate::contract::{ContractReader, SaleSnapshot};
use crate::state::AppState;
use anyhow::Result;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{error, info, instrument};

/// Watcher configuration
#[derive(Debug, Clone)]
pub struct WatcherConfig {
    /// Polling interval
    pub poll_interval: Duration,
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(12),
        }
    }
}

/// Contract state watcher
pub struct SaleWatcher {
    config: WatcherConfig,
    reader: ContractReader,
    state: AppState,
}

impl SaleWatcher {
    /// Create a new watcher
    pub fn new(config: WatcherConfig, reader: ContractReader, state: AppState) -> Self {
        Self {
            config,
            reader,
            state,
        }
    }

    /// Run the polling loop
    #[instrument(skip(self), fields(contract = %self.reader.contract_address()))]
    pub async fn run(&self) -> Result<()> {
        info!("Starting sale watcher");

        loop {
            if let Err(e) = self.poll_once().await {
                error!(error = %e, "Sale poll failed");
                self.state.set_error(Some(e.to_string()));
            }

            sleep(self.config.poll_interval).await;
        }
    }

    /// Single poll iteration
    async fn poll_once(&self) -> Result<()> {
        let snapshot = self.reader.snapshot().await?;
        self.apply(snapshot);
        Ok(())
    }

    /// Store a snapshot, logging phase changes
    fn apply(&self, snapshot: SaleSnapshot) {
        let previous = self.state.snapshot();

        if previous.as_ref().map(|p| p.sale_state) != Some(snapshot.sale_state) {
            info!(
                sale_state = snapshot.sale_state,
                phase = ?snapshot.phase(),
                "Sale phase changed"
            );
        }
        if previous.as_ref().map(|p| p.total_minted) != Some(snapshot.total_minted) {
            info!(total_minted = snapshot.total_minted, "Mint count updated");
        }

        #[allow(clippy::cast_precision_loss)]
        metrics::gauge!("sale_total_minted").set(snapshot.total_minted as f64);
        metrics::gauge!("sale_state").set(f64::from(snapshot.sale_state));

        self.state.set_snapshot(snapshot);
    }
}
