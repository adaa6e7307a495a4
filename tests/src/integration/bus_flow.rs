//! # Bus Flow Tests
//!
//! Drives a running `LedgerRuntime` purely through the shared bus:
//!
//! ```text
//! test ──BlockConnected / MempoolTransactionAdded / ApiQuery──→ Event Bus
//!                                                                  │
//!                                                          LedgerEventHandler
//!                                                                  │
//! test ←──LedgerTransactionRecorded / Retracted / ApiQueryResponse─┘
//! ```
//!
//! A restarted runtime resumes from its snapshot file and must treat the
//! restored chain exactly like the one it saw before stopping.

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use ledger_runtime::{LedgerContainer, LedgerRuntime, RuntimeConfig};
    use shared_bus::{
        BlockchainEvent, EventFilter, EventPublisher, EventTopic, InMemoryEventBus, Subscription,
    };
    use shared_types::{
        subsystem_ids, Address, Amount, Block, BlockHeader, OutPoint, Transaction, TxInput,
        TxOutput,
    };
    use tokio::time::timeout;
    use wallet_ledger::{LedgerConfig, SharedAddressBook, WalletLedgerApi};

    const WALLET: Address = [0x0a; 20];

    // =========================================================================
    // TEST FIXTURES
    // =========================================================================

    fn payment() -> Transaction {
        Transaction {
            version: 1,
            inputs: vec![TxInput {
                prevout: OutPoint {
                    txid: [0x77; 32],
                    vout: 1,
                },
                address: Some([0xee; 20]),
                value: Amount::from_base_units(30_000_000),
            }],
            outputs: vec![TxOutput {
                address: Some(WALLET),
                value: Amount::from_base_units(25_000_000),
            }],
            lock_time: 0,
            is_coinbase: false,
        }
    }

    fn block(parent: Option<&Block>, transactions: Vec<Transaction>) -> Block {
        Block {
            header: BlockHeader {
                height: parent.map_or(0, |p| p.height() + 1),
                parent_hash: parent.map_or([0; 32], Block::hash),
                timestamp: 1_700_000_000,
                nonce: 0,
            },
            transactions,
        }
    }

    fn start_runtime() -> (LedgerRuntime, Arc<InMemoryEventBus>) {
        start_runtime_with(LedgerConfig::for_testing())
    }

    fn start_runtime_with(ledger: LedgerConfig) -> (LedgerRuntime, Arc<InMemoryEventBus>) {
        let config = RuntimeConfig {
            ledger,
            shutdown_grace: Duration::from_millis(10),
            ..RuntimeConfig::default()
        };
        let book = SharedAddressBook::new();
        book.assign(WALLET, "").unwrap();
        let container = LedgerContainer::with_address_book(config, book).unwrap();
        let bus = Arc::clone(&container.event_bus);
        let runtime = LedgerRuntime::from_container(container);
        runtime.start();
        (runtime, bus)
    }

    async fn next_event(sub: &mut Subscription) -> BlockchainEvent {
        timeout(Duration::from_secs(5), sub.recv())
            .await
            .expect("timeout waiting for event")
            .expect("event bus closed")
    }

    // =========================================================================
    // FLOWS
    // =========================================================================

    #[tokio::test]
    async fn test_payment_lifecycle_over_bus() {
        let (runtime, bus) = start_runtime();
        let mut ledger_events = bus.subscribe(EventFilter::topics(vec![EventTopic::WalletLedger]));
        let tx = payment();
        let txid = tx.txid();

        let genesis = block(None, vec![]);
        bus.publish(BlockchainEvent::BlockConnected(genesis.clone())).await;
        bus.publish(BlockchainEvent::MempoolTransactionAdded(tx.clone())).await;
        match next_event(&mut ledger_events).await {
            BlockchainEvent::LedgerTransactionRecorded {
                txid: recorded,
                entry_count,
                confirmations,
            } => {
                assert_eq!(recorded, txid);
                assert_eq!(entry_count, 1);
                assert_eq!(confirmations, 0);
            }
            other => panic!("Expected LedgerTransactionRecorded, got {:?}", other),
        }

        let mined = block(Some(&genesis), vec![tx.clone()]);
        bus.publish(BlockchainEvent::BlockConnected(mined.clone())).await;
        assert!(matches!(
            next_event(&mut ledger_events).await,
            BlockchainEvent::LedgerTransactionRecorded { confirmations: 1, .. }
        ));

        // The runtime mirror puts the transaction back into its mempool.
        bus.publish(BlockchainEvent::BlockDisconnected(mined)).await;
        assert!(matches!(
            next_event(&mut ledger_events).await,
            BlockchainEvent::LedgerTransactionRecorded { confirmations: 0, .. }
        ));

        bus.publish(BlockchainEvent::MempoolTransactionRemoved {
            txid,
            reason: "replaced".into(),
        })
        .await;
        match next_event(&mut ledger_events).await {
            BlockchainEvent::LedgerTransactionRetracted { txid: retracted } => {
                assert_eq!(retracted, txid)
            }
            other => panic!("Expected LedgerTransactionRetracted, got {:?}", other),
        }

        runtime.shutdown().await;
    }

    #[tokio::test]
    async fn test_listtransactions_query_over_bus() {
        let (runtime, bus) = start_runtime();
        let mut ledger_events = bus.subscribe(EventFilter::topics(vec![EventTopic::WalletLedger]));
        let mut responses = bus.subscribe(EventFilter::from_subsystems(vec![
            subsystem_ids::WALLET_LEDGER,
        ]));

        bus.publish(BlockchainEvent::MempoolTransactionAdded(payment())).await;
        next_event(&mut ledger_events).await;

        bus.publish(BlockchainEvent::ApiQuery {
            correlation_id: "req-1".into(),
            target: "wallet-ledger".into(),
            method: "listtransactions".into(),
            params: serde_json::json!({ "account": "*", "count": 10 }),
        })
        .await;

        let response = loop {
            if let BlockchainEvent::ApiQueryResponse {
                correlation_id,
                result,
                ..
            } = next_event(&mut responses).await
            {
                assert_eq!(correlation_id, "req-1");
                break result;
            }
        };
        let rows = response.expect("query should succeed");
        let rows = rows.as_array().expect("array of entries");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["category"], "receive");
        assert_eq!(rows[0]["amount"], "0.25000000");
        assert_eq!(rows[0]["txid"], hex::encode(payment().txid()));

        runtime.shutdown().await;
    }

    #[tokio::test]
    async fn test_restart_from_snapshot_over_bus() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = LedgerConfig {
            snapshot_path: Some(dir.path().join("ledger.snap")),
            ..LedgerConfig::for_testing()
        };
        let tx = payment();
        let txid = tx.txid();
        let genesis = block(None, vec![]);
        let mined = block(Some(&genesis), vec![tx]);

        {
            let (runtime, bus) = start_runtime_with(ledger.clone());
            let mut ledger_events =
                bus.subscribe(EventFilter::topics(vec![EventTopic::WalletLedger]));
            bus.publish(BlockchainEvent::BlockConnected(genesis.clone())).await;
            bus.publish(BlockchainEvent::BlockConnected(mined.clone())).await;
            assert!(matches!(
                next_event(&mut ledger_events).await,
                BlockchainEvent::LedgerTransactionRecorded { confirmations: 1, .. }
            ));
            runtime.shutdown().await;
        }

        let (runtime, bus) = start_runtime_with(ledger);
        let mut ledger_events = bus.subscribe(EventFilter::topics(vec![EventTopic::WalletLedger]));
        let mut dead_letters =
            bus.subscribe(EventFilter::topics(vec![EventTopic::DeadLetterQueue]));

        // Disconnecting the restored tip returns the payment to the mempool.
        bus.publish(BlockchainEvent::BlockDisconnected(mined)).await;
        match next_event(&mut ledger_events).await {
            BlockchainEvent::LedgerTransactionRecorded {
                txid: recorded,
                confirmations,
                ..
            } => {
                assert_eq!(recorded, txid);
                assert_eq!(confirmations, 0);
            }
            other => panic!("Expected LedgerTransactionRecorded, got {:?}", other),
        }

        // A block from a branch neither run has seen cannot be rebuilt from
        // the mirror; the restored history stays.
        let mut unknown_parent = block(None, vec![]);
        unknown_parent.header.nonce = 9;
        let stray = block(Some(&unknown_parent), vec![]);
        bus.publish(BlockchainEvent::BlockConnected(stray)).await;
        assert!(matches!(
            next_event(&mut dead_letters).await,
            BlockchainEvent::CriticalError { .. }
        ));

        let container = runtime.container();
        let stats = container.ledger.stats();
        assert_eq!(stats.transactions, 1);
        assert_eq!(stats.reconciliations, 0);
        let view = container.ledger.get_transaction(&txid).unwrap();
        assert_eq!(view.confirmations, 0);
        assert!(view.in_mempool);

        runtime.shutdown().await;
    }
}
