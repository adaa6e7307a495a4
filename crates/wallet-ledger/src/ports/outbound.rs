//! # Outbound Ports (Driven Ports)
//!
//! SPIs the wallet ledger depends on.

use crate::domain::{AddressRecord, ConfirmationTracker, LedgerError, TxRecord};
use serde::{Deserialize, Serialize};
use shared_types::{Address, Block, Transaction, TxId};

/// Address ownership lookups (the wallet's address book).
pub trait OwnershipProvider: Send + Sync {
    /// Owning account and change flag of `address`, if the wallet owns it.
    fn owner_of(&self, address: &Address) -> Option<AddressRecord>;
}

/// Read access to the node's chain state, used when rebuilding.
pub trait ChainStateProvider: Send + Sync {
    /// Best chain, genesis (or the oldest retained block) first.
    fn best_chain(&self) -> Result<Vec<Block>, LedgerError>;

    /// Transactions currently in the memory pool.
    fn mempool_transactions(&self) -> Result<Vec<Transaction>, LedgerError>;
}

/// Current format of [`PersistedLedger`].
pub const PERSISTED_LEDGER_VERSION: u32 = 1;

/// Everything needed to restore the ledger after a restart.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PersistedLedger {
    pub version: u32,
    /// Records in observation order.
    pub records: Vec<TxRecord>,
    pub tracker: ConfirmationTracker,
    pub send_origins: Vec<(TxId, String)>,
    pub halted: Vec<TxId>,
    pub next_sequence: u64,
}

/// Durable storage for ledger state.
pub trait LedgerPersistence: Send + Sync {
    /// Last saved state, or `None` if nothing was saved yet.
    fn load(&self) -> Result<Option<PersistedLedger>, LedgerError>;

    /// Replace the saved state atomically.
    fn save(&self, ledger: &PersistedLedger) -> Result<(), LedgerError>;
}

/// Wall-clock source (for testability).
pub trait TimeSource: Send + Sync {
    /// Seconds since the Unix epoch.
    fn now(&self) -> u64;
}

/// System time source.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemTimeSource;

impl TimeSource for SystemTimeSource {
    fn now(&self) -> u64 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0)
    }
}

/// Mock chain state for testing.
#[cfg(test)]
#[derive(Default)]
pub struct MockChainState {
    pub chain: parking_lot::RwLock<Vec<Block>>,
    pub mempool: parking_lot::RwLock<Vec<Transaction>>,
    pub fail: std::sync::atomic::AtomicBool,
}

#[cfg(test)]
impl MockChainState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_block(&self, block: Block) {
        self.chain.write().push(block);
    }

    pub fn pop_block(&self) -> Option<Block> {
        self.chain.write().pop()
    }

    pub fn set_mempool(&self, txs: Vec<Transaction>) {
        *self.mempool.write() = txs;
    }
}

#[cfg(test)]
impl ChainStateProvider for MockChainState {
    fn best_chain(&self) -> Result<Vec<Block>, LedgerError> {
        if self.fail.load(std::sync::atomic::Ordering::SeqCst) {
            return Err(LedgerError::ChainStateUnavailable("mock offline".into()));
        }
        Ok(self.chain.read().clone())
    }

    fn mempool_transactions(&self) -> Result<Vec<Transaction>, LedgerError> {
        if self.fail.load(std::sync::atomic::Ordering::SeqCst) {
            return Err(LedgerError::ChainStateUnavailable("mock offline".into()));
        }
        Ok(self.mempool.read().clone())
    }
}

/// Mock time source for testing.
#[cfg(test)]
pub struct MockTimeSource {
    time: std::sync::atomic::AtomicU64,
}

#[cfg(test)]
impl MockTimeSource {
    pub fn new(initial: u64) -> Self {
        Self {
            time: std::sync::atomic::AtomicU64::new(initial),
        }
    }

    pub fn advance(&self, secs: u64) {
        self.time
            .fetch_add(secs, std::sync::atomic::Ordering::SeqCst);
    }
}

#[cfg(test)]
impl TimeSource for MockTimeSource {
    fn now(&self) -> u64 {
        self.time.load(std::sync::atomic::Ordering::SeqCst)
    }
}
