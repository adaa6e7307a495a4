//! # Inbound Ports (Driving Ports)
//!
//! Public API of the wallet ledger. Chain events come in through the
//! `on_*` methods; queries read the latest committed snapshot.

use crate::domain::{
    EntryField, EntryView, LedgerError, LedgerSnapshot, LedgerStats, LedgerUpdate,
    ListRequest, TransactionView,
};
use shared_types::{Block, Transaction, TxId};
use std::sync::Arc;

/// Primary API for the wallet ledger.
///
/// Every event method is atomic: the snapshot readers observe either
/// reflects the whole event or none of it.
pub trait WalletLedgerApi: Send + Sync {
    /// A block was appended to the best chain.
    ///
    /// Records rows for wallet transactions in the block and refreshes the
    /// confirmation count of every confirmed wallet transaction.
    fn on_block_connected(&self, block: &Block) -> Result<LedgerUpdate, LedgerError>;

    /// The tip block was removed from the best chain.
    ///
    /// Its wallet transactions drop to zero confirmations; those no longer
    /// in the mempool are retracted.
    fn on_block_disconnected(&self, block: &Block) -> Result<LedgerUpdate, LedgerError>;

    /// Replace the top of the chain in one atomic step.
    ///
    /// `disconnected` is ordered tip first; `connected` oldest first.
    fn on_reorg(
        &self,
        disconnected: &[Block],
        connected: &[Block],
    ) -> Result<LedgerUpdate, LedgerError>;

    /// A transaction entered the memory pool.
    fn on_mempool_transaction(&self, tx: &Transaction) -> Result<LedgerUpdate, LedgerError>;

    /// A transaction left the memory pool without being mined.
    fn on_mempool_removed(&self, txid: &TxId) -> Result<LedgerUpdate, LedgerError>;

    /// Attribute the send rows of `txid` to `account`.
    ///
    /// Called by the wallet before broadcasting a transaction it built. If
    /// the transaction is already recorded, its send rows move to `account`.
    fn record_send_origin(&self, txid: TxId, account: &str);

    /// `listtransactions`.
    fn list_transactions(&self, request: &ListRequest) -> Result<Vec<EntryView>, LedgerError>;

    /// Two-phase check: select on `to_match`, require `expected`.
    fn check_transactions(
        &self,
        to_match: &[EntryField],
        expected: &[EntryField],
    ) -> Result<Vec<EntryView>, LedgerError>;

    /// `gettransaction`.
    fn get_transaction(&self, txid: &TxId) -> Result<TransactionView, LedgerError>;

    /// Latest committed snapshot.
    fn snapshot(&self) -> Arc<LedgerSnapshot>;

    /// Rebuild the ledger from the chain-state provider.
    fn reconcile(&self) -> Result<LedgerUpdate, LedgerError>;

    fn stats(&self) -> LedgerStats;
}
