//! # Ledger Container
//!
//! Builds the wallet ledger and everything it depends on from a
//! [`RuntimeConfig`].
//!
//! When a snapshot file exists, the chain mirror is marked incomplete before
//! the ledger restores it and anchored at the restored tip afterwards, so a
//! rebuild never runs against a chain that starts mid-way.

pub mod config;

pub use config::{ConfigError, RuntimeConfig};

use std::sync::Arc;

use anyhow::{Context, Result};
use shared_bus::InMemoryEventBus;
use tracing::info;
use wallet_ledger::{
    FileSnapshotStore, LedgerPersistence, NoPersistence, SharedAddressBook, SystemTimeSource,
    WalletLedgerApi, WalletLedgerService,
};

use crate::adapters::{load_address_book, ChainMirror};

/// Initialized services shared by the runtime's handlers.
pub struct LedgerContainer {
    pub config: RuntimeConfig,
    pub event_bus: Arc<InMemoryEventBus>,
    pub chain: Arc<ChainMirror>,
    pub address_book: SharedAddressBook,
    pub ledger: Arc<WalletLedgerService>,
}

impl LedgerContainer {
    /// Wire the ledger with an address book loaded from the configured file.
    pub fn new(config: RuntimeConfig) -> Result<Self> {
        let address_book = match &config.address_book_path {
            Some(path) => load_address_book(path)?,
            None => SharedAddressBook::new(),
        };
        Self::with_address_book(config, address_book)
    }

    /// Wire the ledger around an existing address book.
    pub fn with_address_book(config: RuntimeConfig, address_book: SharedAddressBook) -> Result<Self> {
        let event_bus = Arc::new(InMemoryEventBus::with_capacity(config.bus_capacity));
        let chain = Arc::new(ChainMirror::for_wallet(Arc::new(address_book.clone())));
        let restoring = config
            .ledger
            .snapshot_path
            .as_ref()
            .is_some_and(|path| path.exists());
        if restoring {
            chain.resume_after(None);
        }

        let persistence: Arc<dyn LedgerPersistence> = match &config.ledger.snapshot_path {
            Some(path) => {
                info!(path = %path.display(), "[ledger-runtime] Using snapshot file");
                Arc::new(FileSnapshotStore::new(path))
            }
            None => Arc::new(NoPersistence),
        };

        let ledger = WalletLedgerService::new(
            config.ledger.clone(),
            Arc::new(address_book.clone()),
            chain.clone(),
            persistence,
            Arc::new(SystemTimeSource),
        )
        .context("Failed to start wallet ledger")?;

        if restoring {
            let stats = ledger.stats();
            match (stats.tip_hash, stats.tip_height) {
                (Some(hash), Some(height)) => chain.resume_after(Some((hash, height))),
                _ if stats.transactions == 0 => chain.mark_complete(),
                _ => {}
            }
        }

        Ok(Self {
            config,
            event_bus,
            chain,
            address_book,
            ledger: Arc::new(ledger),
        })
    }
}
