//! # Ledger Events
//!
//! Defines every event that flows through the shared bus: chain and mempool
//! notifications consumed by the wallet ledger, the ledger's own
//! notifications, and API gateway query traffic.

use serde::{Deserialize, Serialize};
use shared_types::entities::{Block, BlockHash, Transaction, TxId};
use shared_types::subsystem_ids;

/// All events that can be published to the event bus.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum BlockchainEvent {
    // =========================================================================
    // CHAIN
    // =========================================================================
    /// A block was connected to the tip of the best chain.
    /// Source: Chain | Target: Wallet Ledger
    BlockConnected(Block),

    /// The tip block was disconnected during a reorganization.
    /// Disconnects arrive tip-first; replacement blocks follow as
    /// `BlockConnected`.
    BlockDisconnected(Block),

    // =========================================================================
    // MEMPOOL
    // =========================================================================
    /// A transaction entered the memory pool.
    MempoolTransactionAdded(Transaction),

    /// A transaction left the memory pool without being mined
    /// (eviction, conflict, expiry).
    MempoolTransactionRemoved {
        txid: TxId,
        reason: String,
    },

    // =========================================================================
    // WALLET LEDGER
    // =========================================================================
    /// Ledger rows for a transaction were created or updated.
    LedgerTransactionRecorded {
        txid: TxId,
        /// Rows now held for the transaction.
        entry_count: usize,
        /// Best-chain depth after the update.
        confirmations: u32,
    },

    /// All ledger rows for a transaction were removed.
    LedgerTransactionRetracted { txid: TxId },

    /// The ledger was rebuilt from chain state.
    LedgerReconciled {
        /// Tip the rebuild was performed against.
        tip_hash: Option<BlockHash>,
        /// Transactions recorded after the rebuild.
        transactions: usize,
    },

    // =========================================================================
    // CRITICAL EVENTS (DLQ)
    // =========================================================================
    /// Critical error requiring operator attention.
    CriticalError {
        /// The subsystem that encountered the error.
        subsystem_id: u8,
        /// Error description.
        error: String,
    },

    // =========================================================================
    // API GATEWAY QUERIES
    // =========================================================================
    /// Query from the API gateway to a subsystem.
    /// The target subsystem responds with `ApiQueryResponse`.
    ApiQuery {
        /// Unique correlation ID to match request/response.
        correlation_id: String,
        /// Target subsystem (e.g., "wallet-ledger").
        target: String,
        /// Query method name (e.g., "listtransactions").
        method: String,
        /// Query parameters as JSON.
        params: serde_json::Value,
    },

    /// Response from a subsystem to an API gateway query.
    ApiQueryResponse {
        /// Correlation ID matching the original query.
        correlation_id: String,
        /// Source subsystem ID.
        source: u8,
        /// Result (Ok data or Err with code/message).
        result: Result<serde_json::Value, ApiQueryError>,
    },
}

/// Error type for API query responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiQueryError {
    /// JSON-RPC error code.
    pub code: i32,
    /// Error message.
    pub message: String,
}

impl BlockchainEvent {
    /// Get the topic for this event (for filtering).
    #[must_use]
    pub fn topic(&self) -> EventTopic {
        match self {
            Self::BlockConnected(_) | Self::BlockDisconnected(_) => EventTopic::Chain,
            Self::MempoolTransactionAdded(_) | Self::MempoolTransactionRemoved { .. } => {
                EventTopic::Mempool
            }
            Self::LedgerTransactionRecorded { .. }
            | Self::LedgerTransactionRetracted { .. }
            | Self::LedgerReconciled { .. } => EventTopic::WalletLedger,
            Self::CriticalError { .. } => EventTopic::DeadLetterQueue,
            Self::ApiQuery { .. } | Self::ApiQueryResponse { .. } => EventTopic::ApiGateway,
        }
    }

    /// Get the originating subsystem ID.
    #[must_use]
    pub fn source_subsystem(&self) -> u8 {
        match self {
            Self::BlockConnected(_) | Self::BlockDisconnected(_) => subsystem_ids::CHAIN,
            Self::MempoolTransactionAdded(_) | Self::MempoolTransactionRemoved { .. } => {
                subsystem_ids::MEMPOOL
            }
            Self::LedgerTransactionRecorded { .. }
            | Self::LedgerTransactionRetracted { .. }
            | Self::LedgerReconciled { .. } => subsystem_ids::WALLET_LEDGER,
            Self::CriticalError { subsystem_id, .. } => *subsystem_id,
            Self::ApiQuery { .. } => subsystem_ids::API_GATEWAY,
            Self::ApiQueryResponse { source, .. } => *source,
        }
    }
}

/// Event topics for subscription filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventTopic {
    /// Best-chain connect/disconnect.
    Chain,
    /// Mempool admission and removal.
    Mempool,
    /// Wallet ledger notifications.
    WalletLedger,
    /// API gateway queries and responses.
    ApiGateway,
    /// Dead Letter Queue for critical errors.
    DeadLetterQueue,
    /// All events (no filtering).
    All,
}

/// Filter for subscribing to specific events.
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    /// Topics to include. Empty means all topics.
    pub topics: Vec<EventTopic>,
    /// Source subsystems to include. Empty means all sources.
    pub source_subsystems: Vec<u8>,
}

impl EventFilter {
    /// Create a filter that accepts all events.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Create a filter for specific topics.
    #[must_use]
    pub fn topics(topics: Vec<EventTopic>) -> Self {
        Self {
            topics,
            source_subsystems: Vec::new(),
        }
    }

    /// Create a filter for events from specific subsystems.
    #[must_use]
    pub fn from_subsystems(subsystems: Vec<u8>) -> Self {
        Self {
            topics: Vec::new(),
            source_subsystems: subsystems,
        }
    }

    /// Check if an event matches this filter.
    #[must_use]
    pub fn matches(&self, event: &BlockchainEvent) -> bool {
        let topic_match = self.topics.is_empty()
            || self.topics.contains(&EventTopic::All)
            || self.topics.contains(&event.topic());

        let source_match = self.source_subsystems.is_empty()
            || self.source_subsystems.contains(&event.source_subsystem());

        topic_match && source_match
    }
}
