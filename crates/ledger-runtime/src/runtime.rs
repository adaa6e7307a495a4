//! # Ledger Runtime
//!
//! ## Startup Sequence
//!
//! 1. Build the container (address book, chain mirror, ledger)
//! 2. Spawn the ledger event handler on the shared bus
//! 3. Run until shutdown is signalled

use std::sync::Arc;

use anyhow::Result;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info};
use wallet_ledger::WalletLedgerApi;

use crate::container::{LedgerContainer, RuntimeConfig};
use crate::handlers::LedgerEventHandler;

/// The wallet ledger runtime.
pub struct LedgerRuntime {
    container: Arc<LedgerContainer>,
    shutdown_tx: watch::Sender<bool>,
    shutdown_rx: watch::Receiver<bool>,
}

impl LedgerRuntime {
    /// Create a runtime from configuration.
    pub fn new(config: RuntimeConfig) -> Result<Self> {
        Ok(Self::from_container(LedgerContainer::new(config)?))
    }

    /// Create a runtime around an already wired container.
    pub fn from_container(container: LedgerContainer) -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        Self {
            container: Arc::new(container),
            shutdown_tx,
            shutdown_rx,
        }
    }

    /// Spawn the event handler.
    ///
    /// The handler is subscribed before this returns, so events published
    /// afterwards are not missed.
    pub fn start(&self) -> JoinHandle<()> {
        let container = &self.container;
        let stats = container.ledger.stats();
        info!("===========================================");
        info!("  Wallet Ledger Runtime v{}", env!("CARGO_PKG_VERSION"));
        info!("===========================================");
        info!(
            transactions = stats.transactions,
            entries = stats.entries,
            tip_height = ?stats.tip_height,
            addresses = container.address_book.len(),
            "[ledger-runtime] Ledger ready"
        );

        let handler = LedgerEventHandler::new(
            container.ledger.clone(),
            Arc::clone(&container.chain),
            Arc::clone(&container.event_bus),
            container.config.ledger.default_list_count,
        );
        tokio::spawn(handler.run(self.shutdown_rx.clone()))
    }

    /// Signal handlers to stop and give them time to drain.
    pub async fn shutdown(&self) {
        info!("[ledger-runtime] Initiating graceful shutdown...");
        if let Err(e) = self.shutdown_tx.send(true) {
            error!("[ledger-runtime] Failed to send shutdown signal: {}", e);
        }
        tokio::time::sleep(self.container.config.shutdown_grace).await;
        info!("[ledger-runtime] Shutdown complete");
    }

    pub fn container(&self) -> Arc<LedgerContainer> {
        Arc::clone(&self.container)
    }
}
