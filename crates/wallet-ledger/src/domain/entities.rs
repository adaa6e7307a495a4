//! # Core Domain Entities
//!
//! Ledger rows, the per-transaction record that owns them, and the read
//! views handed out by queries.

use serde::{Deserialize, Serialize};
use shared_types::{Address, Amount, BlockHash, TxId};
use std::fmt;
use std::str::FromStr;

/// Account label used when none is given.
pub const DEFAULT_ACCOUNT: &str = "";

/// Direction of a ledger row relative to the wallet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// Value leaving the wallet; amount is negative.
    Send,
    /// Value arriving at an owned address; amount is positive.
    Receive,
}

impl Category {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Send => "send",
            Self::Receive => "receive",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "send" => Ok(Self::Send),
            "receive" => Ok(Self::Receive),
            other => Err(format!("unknown category {other:?}")),
        }
    }
}

/// One decomposed row of a transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub txid: TxId,
    pub category: Category,
    pub account: String,
    /// Destination of the row; `None` for non-standard outputs.
    pub address: Option<Address>,
    /// Signed sum of the outputs folded into this row.
    pub amount: Amount,
    /// Index of the first output folded into this row.
    pub vout: u32,
    /// Fee paid (negative), present on send rows when every input is owned.
    pub fee: Option<Amount>,
}

impl LedgerEntry {
    /// Idempotency key: re-appending a row with the same key never duplicates it.
    #[must_use]
    pub fn key(&self) -> EntryKey {
        EntryKey {
            txid: self.txid,
            category: self.category,
            account: self.account.clone(),
            address: self.address,
        }
    }
}

/// Identity of a ledger row within the store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntryKey {
    pub txid: TxId,
    pub category: Category,
    pub account: String,
    pub address: Option<Address>,
}

/// Chain position of a wallet transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TxStatus {
    /// Not in the best chain.
    Unconfirmed,
    /// Included in the best chain.
    Confirmed { block_hash: BlockHash, height: u64 },
}

impl TxStatus {
    #[must_use]
    pub fn is_confirmed(&self) -> bool {
        matches!(self, Self::Confirmed { .. })
    }

    #[must_use]
    pub fn inclusion_height(&self) -> Option<u64> {
        match self {
            Self::Confirmed { height, .. } => Some(*height),
            Self::Unconfirmed => None,
        }
    }

    #[must_use]
    pub fn block_hash(&self) -> Option<BlockHash> {
        match self {
            Self::Confirmed { block_hash, .. } => Some(*block_hash),
            Self::Unconfirmed => None,
        }
    }
}

/// All rows of one wallet transaction plus its shared confirmation state.
///
/// Confirmations live on the record, not on individual rows, so every row
/// of a txid reports the same depth.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxRecord {
    pub txid: TxId,
    /// Rows in decomposition order (sends first, then receives).
    pub entries: Vec<LedgerEntry>,
    pub status: TxStatus,
    /// Currently held by the memory pool.
    pub in_mempool: bool,
    pub confirmations: u32,
    /// Observation order within the ledger; assigned on first append.
    pub sequence: u64,
    /// Wall-clock seconds when first observed.
    pub time_received: u64,
}

impl TxRecord {
    /// Net effect of the transaction on the wallet (sum of all rows).
    pub fn net_amount(&self) -> Result<Amount, shared_types::AmountError> {
        Amount::checked_sum(self.entries.iter().map(|e| e.amount))
    }

    /// Fee reported on the send rows, if any.
    #[must_use]
    pub fn fee(&self) -> Option<Amount> {
        self.entries.iter().find_map(|e| e.fee)
    }

    pub(crate) fn view(&self, index: usize, entry: &LedgerEntry) -> EntryView {
        EntryView {
            txid: entry.txid,
            category: entry.category,
            account: entry.account.clone(),
            address: entry.address,
            amount: entry.amount,
            vout: entry.vout,
            fee: entry.fee,
            confirmations: self.confirmations,
            block_hash: self.status.block_hash(),
            block_height: self.status.inclusion_height(),
            in_mempool: self.in_mempool,
            time_received: self.time_received,
            sequence: self.sequence,
            position: index,
        }
    }

    /// Read views of every row in order.
    #[must_use]
    pub fn views(&self) -> Vec<EntryView> {
        self.entries
            .iter()
            .enumerate()
            .map(|(i, e)| self.view(i, e))
            .collect()
    }
}

/// Read-only view of one ledger row, as returned by `listtransactions`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryView {
    pub txid: TxId,
    pub category: Category,
    pub account: String,
    pub address: Option<Address>,
    pub amount: Amount,
    pub vout: u32,
    pub fee: Option<Amount>,
    pub confirmations: u32,
    pub block_hash: Option<BlockHash>,
    pub block_height: Option<u64>,
    pub in_mempool: bool,
    pub time_received: u64,
    /// Observation order of the owning transaction.
    pub sequence: u64,
    /// Row position within the owning transaction.
    pub position: usize,
}

impl EntryView {
    /// Short label used in diagnostics: `category txid-prefix account`.
    #[must_use]
    pub fn label(&self) -> String {
        format!(
            "{} {} account={:?}",
            self.category,
            hex::encode(&self.txid[..8]),
            self.account
        )
    }
}

/// Read-only view of a whole transaction (`gettransaction`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionView {
    pub txid: TxId,
    pub amount: Amount,
    pub fee: Option<Amount>,
    pub confirmations: u32,
    pub block_hash: Option<BlockHash>,
    pub block_height: Option<u64>,
    pub in_mempool: bool,
    pub time_received: u64,
    pub details: Vec<EntryView>,
}
