//! # IPC Payloads
//!
//! JSON shapes of ledger query results. Field names follow the
//! `listtransactions` / `gettransaction` RPC results; amounts are exact
//! decimal strings and hashes are hex.

use crate::domain::{EntryView, LedgerStats, ListRequest, TransactionView, DEFAULT_LIST_COUNT};
use serde::{Deserialize, Serialize};

/// Parameters of `listtransactions`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListTransactionsParams {
    #[serde(default)]
    pub account: Option<String>,
    #[serde(default)]
    pub count: Option<usize>,
    #[serde(default)]
    pub skip: Option<usize>,
}

impl ListTransactionsParams {
    /// Resolve into a request, using `default_count` when no count is given.
    pub fn into_request(self, default_count: usize) -> ListRequest {
        ListRequest::new(
            self.account,
            self.count.unwrap_or(default_count),
            self.skip.unwrap_or(0),
        )
    }
}

impl Default for ListTransactionsParams {
    fn default() -> Self {
        Self {
            account: None,
            count: Some(DEFAULT_LIST_COUNT),
            skip: None,
        }
    }
}

/// One row of `listtransactions`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryPayload {
    pub account: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    pub category: String,
    pub amount: String,
    pub vout: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fee: Option<String>,
    pub confirmations: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blockhash: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blockheight: Option<u64>,
    pub txid: String,
    pub timereceived: u64,
    pub in_mempool: bool,
}

impl From<&EntryView> for EntryPayload {
    fn from(view: &EntryView) -> Self {
        Self {
            account: view.account.clone(),
            address: view.address.map(hex::encode),
            category: view.category.to_string(),
            amount: view.amount.to_string(),
            vout: view.vout,
            fee: view.fee.map(|f| f.to_string()),
            confirmations: view.confirmations,
            blockhash: view.block_hash.map(hex::encode),
            blockheight: view.block_height,
            txid: hex::encode(view.txid),
            timereceived: view.time_received,
            in_mempool: view.in_mempool,
        }
    }
}

/// Result of `gettransaction`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionPayload {
    pub txid: String,
    pub amount: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fee: Option<String>,
    pub confirmations: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blockhash: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blockheight: Option<u64>,
    pub timereceived: u64,
    pub in_mempool: bool,
    pub details: Vec<EntryPayload>,
}

impl From<&TransactionView> for TransactionPayload {
    fn from(view: &TransactionView) -> Self {
        Self {
            txid: hex::encode(view.txid),
            amount: view.amount.to_string(),
            fee: view.fee.map(|f| f.to_string()),
            confirmations: view.confirmations,
            blockhash: view.block_hash.map(hex::encode),
            blockheight: view.block_height,
            timereceived: view.time_received,
            in_mempool: view.in_mempool,
            details: view.details.iter().map(EntryPayload::from).collect(),
        }
    }
}

/// Result of `getledgerstats`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerStatsPayload {
    pub transactions: usize,
    pub entries: usize,
    pub accounts: usize,
    pub halted_transactions: usize,
    pub tip_height: Option<u64>,
    pub tip_hash: Option<String>,
    pub snapshot_epoch: u64,
    pub events_processed: u64,
    pub reorgs: u64,
    pub reconciliations: u64,
    pub snapshot_retries: u64,
    pub persistence_failures: u64,
}

impl From<&LedgerStats> for LedgerStatsPayload {
    fn from(stats: &LedgerStats) -> Self {
        Self {
            transactions: stats.transactions,
            entries: stats.entries,
            accounts: stats.accounts,
            halted_transactions: stats.halted_transactions,
            tip_height: stats.tip_height,
            tip_hash: stats.tip_hash.map(hex::encode),
            snapshot_epoch: stats.snapshot_epoch,
            events_processed: stats.events_processed,
            reorgs: stats.reorgs,
            reconciliations: stats.reconciliations,
            snapshot_retries: stats.snapshot_retries,
            persistence_failures: stats.persistence_failures,
        }
    }
}
