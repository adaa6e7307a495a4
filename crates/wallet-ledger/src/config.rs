//! # Wallet Ledger Configuration

use crate::domain::DEFAULT_LIST_COUNT;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Striped txid locks held by the service.
pub const DEFAULT_LOCK_STRIPES: usize = 64;

/// Wallet ledger configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LedgerConfig {
    /// Snapshot file; `None` keeps the ledger in memory only.
    pub snapshot_path: Option<PathBuf>,

    /// Rows returned by `listtransactions` when no count is given.
    pub default_list_count: usize,

    /// Optimistic snapshot reads retried before a reader settles for the
    /// last published snapshot.
    pub max_snapshot_retries: u32,

    /// Number of per-txid lock stripes.
    pub lock_stripes: usize,

    /// Run store/tracker invariant checks after every committed event.
    pub verify_invariants: bool,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            snapshot_path: None,
            default_list_count: DEFAULT_LIST_COUNT,
            max_snapshot_retries: 3,
            lock_stripes: DEFAULT_LOCK_STRIPES,
            verify_invariants: false,
        }
    }
}

impl LedgerConfig {
    /// Create a config for testing (invariants checked on every event).
    pub fn for_testing() -> Self {
        Self {
            snapshot_path: None,
            default_list_count: DEFAULT_LIST_COUNT,
            max_snapshot_retries: 1,
            lock_stripes: 4,
            verify_invariants: true,
        }
    }

    #[must_use]
    pub fn with_snapshot_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.snapshot_path = Some(path.into());
        self
    }
}
