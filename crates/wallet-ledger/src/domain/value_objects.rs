//! # Value Objects
//!
//! Query requests, update summaries and statistics.

use serde::{Deserialize, Serialize};
use shared_types::{BlockHash, TxId};

/// Rows returned by `listtransactions` when no count is given.
pub const DEFAULT_LIST_COUNT: usize = 10;

/// Account filter meaning "every account".
pub const ALL_ACCOUNTS: &str = "*";

/// Parameters of a `listtransactions` query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListRequest {
    /// Restrict to one account; `None` or `"*"` means all accounts.
    pub account: Option<String>,
    /// Maximum rows returned.
    pub count: usize,
    /// Newest rows skipped before counting.
    pub skip: usize,
}

impl ListRequest {
    #[must_use]
    pub fn new(account: Option<String>, count: usize, skip: usize) -> Self {
        Self {
            account,
            count,
            skip,
        }
    }

    /// Every row of every account.
    #[must_use]
    pub fn everything() -> Self {
        Self::new(None, usize::MAX, 0)
    }

    #[must_use]
    pub fn for_account(account: impl Into<String>) -> Self {
        Self {
            account: Some(account.into()),
            ..Self::default()
        }
    }

    /// Account to filter by, if any.
    #[must_use]
    pub fn account_filter(&self) -> Option<&str> {
        self.account.as_deref().filter(|a| *a != ALL_ACCOUNTS)
    }
}

impl Default for ListRequest {
    fn default() -> Self {
        Self::new(None, DEFAULT_LIST_COUNT, 0)
    }
}

/// Summary of what one ledger event changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LedgerUpdate {
    /// Transactions whose rows or confirmation state changed:
    /// `(txid, rows held, confirmations)`.
    pub recorded: Vec<(TxId, usize, u32)>,
    /// Transactions whose rows were removed.
    pub retracted: Vec<TxId>,
    /// Transactions newly halted by this event.
    pub halted: Vec<TxId>,
    /// The ledger was rebuilt from chain state.
    pub reconciled: bool,
}

impl LedgerUpdate {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.recorded.is_empty()
            && self.retracted.is_empty()
            && self.halted.is_empty()
            && !self.reconciled
    }
}

/// Counters reported by `getledgerstats`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerStats {
    pub transactions: usize,
    pub entries: usize,
    pub accounts: usize,
    pub halted_transactions: usize,
    pub tip_height: Option<u64>,
    pub tip_hash: Option<BlockHash>,
    pub snapshot_epoch: u64,
    pub events_processed: u64,
    pub reorgs: u64,
    pub reconciliations: u64,
    pub snapshot_retries: u64,
    pub persistence_failures: u64,
}
