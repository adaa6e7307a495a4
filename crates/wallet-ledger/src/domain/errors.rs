//! # Domain Errors
//!
//! Error types for the Wallet Ledger subsystem.
//!
//! | Error | Raised by | Handling |
//! |-------|-----------|----------|
//! | `NoMatchFound` | query phase 1 | surfaced to caller |
//! | `ExpectationMismatch` | query phase 2 | surfaced with entry and key |
//! | `InconsistentLedgerState` | tracker / invariants | logged, ledger re-derived |
//! | `ReorgRaceDetected` | snapshot read | retried internally |
//! | `WritesHalted` | store | txid blocked until reconcile |

use serde::{Deserialize, Serialize};
use shared_types::{Address, AmountError, BlockHash, TxId};
use thiserror::Error;

/// Errors that can occur in ledger operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    /// Phase 1 of a transaction check selected nothing.
    #[error("No entries matched {criteria}")]
    NoMatchFound { criteria: String },

    /// Phase 2 of a transaction check found a disagreeing entry.
    #[error("Entry {entry} has {key}={actual}, expected {expected}")]
    ExpectationMismatch {
        /// Short description of the offending entry.
        entry: String,
        key: &'static str,
        expected: String,
        actual: String,
    },

    /// Ledger contents no longer agree with the chain view.
    #[error("Inconsistent ledger state: {reason}")]
    InconsistentLedgerState { reason: String },

    /// A snapshot read overlapped a reorganization.
    #[error("Reorg in progress (epoch {epoch})")]
    ReorgRaceDetected { epoch: u64 },

    /// Writes for this transaction are blocked until the ledger is reconciled.
    #[error("Writes halted for transaction {}", hex::encode(txid))]
    WritesHalted { txid: TxId },

    /// Transaction is not recorded in the ledger.
    #[error("Transaction not found: {}", hex::encode(txid))]
    TransactionNotFound { txid: TxId },

    /// Disconnect named a block that was never indexed.
    #[error("Unknown block: {}", hex::encode(block_hash))]
    UnknownBlock { block_hash: BlockHash },

    /// Address already belongs to another account.
    #[error("Address {} already owned by account {existing:?}", hex::encode(address))]
    AddressAlreadyOwned {
        address: Address,
        existing: String,
        requested: String,
    },

    /// Amount arithmetic left the money range.
    #[error("Amount out of range: {0}")]
    AmountOutOfRange(#[from] AmountError),

    /// Transaction cannot be decomposed (e.g. outputs exceed owned inputs).
    #[error("Invalid transaction {}: {reason}", hex::encode(txid))]
    InvalidTransaction { txid: TxId, reason: String },

    /// Malformed query request.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Snapshot persistence failed.
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// Chain state could not be read for re-derivation.
    #[error("Chain state unavailable: {0}")]
    ChainStateUnavailable(String),
}

impl LedgerError {
    /// Errors that halt writes for the transaction they concern.
    #[must_use]
    pub fn halts_transaction(&self) -> bool {
        matches!(
            self,
            Self::AmountOutOfRange(_) | Self::InvalidTransaction { .. }
        )
    }

    /// Errors that require re-deriving the ledger from chain state.
    #[must_use]
    pub fn requires_reconcile(&self) -> bool {
        matches!(self, Self::InconsistentLedgerState { .. })
    }
}

/// Serializable error kind for API payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LedgerErrorKind {
    NoMatchFound,
    ExpectationMismatch,
    InconsistentLedgerState,
    ReorgRaceDetected,
    WritesHalted,
    TransactionNotFound,
    UnknownBlock,
    AddressAlreadyOwned,
    AmountOutOfRange,
    InvalidTransaction,
    InvalidRequest,
    Persistence,
    ChainStateUnavailable,
}

impl From<&LedgerError> for LedgerErrorKind {
    fn from(err: &LedgerError) -> Self {
        match err {
            LedgerError::NoMatchFound { .. } => Self::NoMatchFound,
            LedgerError::ExpectationMismatch { .. } => Self::ExpectationMismatch,
            LedgerError::InconsistentLedgerState { .. } => Self::InconsistentLedgerState,
            LedgerError::ReorgRaceDetected { .. } => Self::ReorgRaceDetected,
            LedgerError::WritesHalted { .. } => Self::WritesHalted,
            LedgerError::TransactionNotFound { .. } => Self::TransactionNotFound,
            LedgerError::UnknownBlock { .. } => Self::UnknownBlock,
            LedgerError::AddressAlreadyOwned { .. } => Self::AddressAlreadyOwned,
            LedgerError::AmountOutOfRange(_) => Self::AmountOutOfRange,
            LedgerError::InvalidTransaction { .. } => Self::InvalidTransaction,
            LedgerError::InvalidRequest(_) => Self::InvalidRequest,
            LedgerError::Persistence(_) => Self::Persistence,
            LedgerError::ChainStateUnavailable(_) => Self::ChainStateUnavailable,
        }
    }
}
