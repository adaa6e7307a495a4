//! # Ledger Event Handler
//!
//! Feeds chain and mempool events from the shared bus into the wallet
//! ledger and publishes what changed.
//!
//! ```text
//! Chain / Mempool ──BlockConnected, MempoolTransactionAdded, ...──→ Event Bus
//!                                                                      │
//!                                   ┌──────────────────────────────────┘
//!                                   ▼
//!                        ┌─────────────────────┐
//!                        │ LedgerEventHandler  │── mirror ──→ ChainMirror
//!                        │                     │── apply ───→ WalletLedgerApi
//!                        └─────────────────────┘
//!                                   │
//!                                   ▼
//!         LedgerTransactionRecorded / Retracted / Reconciled,
//!         CriticalError, ApiQueryResponse ──→ Event Bus
//! ```
//!
//! The mirror is updated before the ledger sees an event so a rebuild or a
//! mempool lookup during the event already reflects it.

use std::sync::Arc;

use shared_bus::{
    ApiQueryError, BlockchainEvent, EventFilter, EventPublisher, EventTopic, InMemoryEventBus,
    Subscription,
};
use shared_types::subsystem_ids;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};
use wallet_ledger::{
    handle_api_query, ApiGatewayHandler, LedgerError, LedgerUpdate, WalletLedgerApi,
};

use crate::adapters::ChainMirror;

/// Query target name the handler answers to.
pub const LEDGER_QUERY_TARGET: &str = "wallet-ledger";

/// Applies bus events to the ledger.
pub struct LedgerEventHandler {
    ledger: Arc<dyn WalletLedgerApi>,
    chain: Arc<ChainMirror>,
    api: ApiGatewayHandler,
    bus: Arc<InMemoryEventBus>,
    subscription: Subscription,
}

impl LedgerEventHandler {
    /// Create a handler subscribed to chain, mempool and API gateway topics.
    pub fn new(
        ledger: Arc<dyn WalletLedgerApi>,
        chain: Arc<ChainMirror>,
        bus: Arc<InMemoryEventBus>,
        default_list_count: usize,
    ) -> Self {
        let filter = EventFilter::topics(vec![
            EventTopic::Chain,
            EventTopic::Mempool,
            EventTopic::ApiGateway,
        ]);
        let subscription = bus.subscribe(filter);
        let api = ApiGatewayHandler::with_default_count(Arc::clone(&ledger), default_list_count);
        Self {
            ledger,
            chain,
            api,
            bus,
            subscription,
        }
    }

    /// Run until the bus closes or `shutdown` fires.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        info!("[ledger-runtime] Ledger event handler started");

        loop {
            let event = tokio::select! {
                event = self.subscription.recv() => event,
                _ = shutdown.changed() => {
                    info!("[ledger-runtime] Shutdown signal received");
                    break;
                }
            };

            let Some(event) = event else {
                error!("[ledger-runtime] Event bus closed, shutting down");
                break;
            };

            for outgoing in self.handle_event(event) {
                let receivers = self.bus.publish(outgoing).await;
                debug!(receivers, "[ledger-runtime] Published ledger event");
            }
        }
    }

    /// Apply one event and return the events to publish in response.
    pub fn handle_event(&self, event: BlockchainEvent) -> Vec<BlockchainEvent> {
        match event {
            BlockchainEvent::BlockConnected(block) => {
                self.chain.connect(&block);
                self.apply(|| self.ledger.on_block_connected(&block))
            }
            BlockchainEvent::BlockDisconnected(block) => {
                self.chain.disconnect(&block);
                self.apply(|| self.ledger.on_block_disconnected(&block))
            }
            BlockchainEvent::MempoolTransactionAdded(tx) => {
                self.chain.add_to_mempool(&tx);
                self.apply(|| self.ledger.on_mempool_transaction(&tx))
            }
            BlockchainEvent::MempoolTransactionRemoved { txid, reason } => {
                debug!(
                    txid = %hex::encode(txid),
                    reason = %reason,
                    "[ledger-runtime] Mempool removal"
                );
                self.chain.remove_from_mempool(&txid);
                self.apply(|| self.ledger.on_mempool_removed(&txid))
            }
            BlockchainEvent::ApiQuery {
                correlation_id,
                target,
                method,
                params,
            } if target == LEDGER_QUERY_TARGET => {
                debug!(
                    correlation_id = %correlation_id,
                    method = %method,
                    "[ledger-runtime] API query"
                );
                let result = handle_api_query(&self.api, &method, &params).map_err(|e| {
                    ApiQueryError {
                        code: e.code,
                        message: e.message,
                    }
                });
                vec![BlockchainEvent::ApiQueryResponse {
                    correlation_id,
                    source: subsystem_ids::WALLET_LEDGER,
                    result,
                }]
            }
            _ => Vec::new(),
        }
    }

    /// Run one ledger operation and turn its outcome into bus events.
    ///
    /// `LedgerReconciled` follows a failed event only when the ledger
    /// actually rebuilt; otherwise it kept its previous state.
    fn apply(
        &self,
        op: impl FnOnce() -> Result<LedgerUpdate, LedgerError>,
    ) -> Vec<BlockchainEvent> {
        let rebuilds_before = self.ledger.stats().reconciliations;
        match op() {
            Ok(update) => self.notifications(&update),
            Err(e) if e.requires_reconcile() => {
                let mut events = vec![critical(e.to_string())];
                if self.ledger.stats().reconciliations > rebuilds_before {
                    error!(error = %e, "[ledger-runtime] Ledger state was inconsistent and has been rebuilt");
                    events.push(self.reconciled_event());
                } else {
                    error!(
                        error = %e,
                        "[ledger-runtime] Ledger state was inconsistent and could not be rebuilt, keeping current state"
                    );
                }
                events
            }
            Err(e) => {
                warn!(error = %e, "[ledger-runtime] Ledger rejected event");
                Vec::new()
            }
        }
    }

    fn notifications(&self, update: &LedgerUpdate) -> Vec<BlockchainEvent> {
        let mut events: Vec<BlockchainEvent> = update
            .recorded
            .iter()
            .map(|&(txid, entry_count, confirmations)| {
                BlockchainEvent::LedgerTransactionRecorded {
                    txid,
                    entry_count,
                    confirmations,
                }
            })
            .collect();
        events.extend(
            update
                .retracted
                .iter()
                .map(|&txid| BlockchainEvent::LedgerTransactionRetracted { txid }),
        );
        events.extend(update.halted.iter().map(|txid| {
            critical(format!(
                "writes halted for transaction {}",
                hex::encode(txid)
            ))
        }));
        if update.reconciled {
            events.push(self.reconciled_event());
        }
        events
    }

    fn reconciled_event(&self) -> BlockchainEvent {
        let stats = self.ledger.stats();
        BlockchainEvent::LedgerReconciled {
            tip_hash: stats.tip_hash,
            transactions: stats.transactions,
        }
    }
}

fn critical(error: String) -> BlockchainEvent {
    BlockchainEvent::CriticalError {
        subsystem_id: subsystem_ids::WALLET_LEDGER,
        error,
    }
}
