//! # Wallet Scenarios
//!
//! `listtransactions` behaviour across several wallets sharing one chain:
//!
//! 1. **Payment between wallets**: send on one side, receive on the other,
//!    confirmations rising together
//! 2. **Send to self**: one send row and one receive row per txid
//! 3. **sendmany**: one send row per destination, receives labelled by
//!    the destination account
//! 4. **Chain and mempool churn**: mempool-then-block, disconnects,
//!    evictions
//! 5. **Durability**: a restarted node answers from its snapshot file

#[cfg(test)]
mod tests {
    use crate::integration::network::{coins, Network, FEE};
    use std::sync::Arc;
    use wallet_ledger::{
        Category, EntryField, FileSnapshotStore, LedgerError, LedgerPersistence, ListRequest,
        NoPersistence, WalletLedgerApi,
    };

    fn funded(nodes: u8) -> Network {
        let network = Network::new(nodes);
        for i in 0..usize::from(nodes) {
            let address = network.node(i).get_new_address("");
            network.fund(address, coins("10"));
        }
        network.generate(1);
        network
    }

    // =========================================================================
    // PAYMENTS
    // =========================================================================

    #[test]
    fn test_payment_between_wallets() {
        let network = funded(2);
        let to = network.node(1).get_new_address("");
        let txid = network.send_to_address(0, to, coins("0.1"));

        network
            .node(0)
            .check(
                &[EntryField::Txid(txid)],
                &[
                    EntryField::Category(Category::Send),
                    EntryField::Amount(coins("-0.1")),
                    EntryField::Confirmations(0),
                ],
            )
            .unwrap();
        network
            .node(1)
            .check(
                &[EntryField::Txid(txid)],
                &[
                    EntryField::Category(Category::Receive),
                    EntryField::Amount(coins("0.1")),
                    EntryField::Confirmations(0),
                ],
            )
            .unwrap();

        network.generate(1);

        for node in 0..2 {
            network
                .node(node)
                .check(&[EntryField::Txid(txid)], &[EntryField::Confirmations(1)])
                .unwrap();
        }
    }

    #[test]
    fn test_send_reports_fee_not_change() {
        let network = funded(2);
        let to = network.node(1).get_new_address("");
        let txid = network.send_to_address(0, to, coins("1.5"));

        let rows = network.node(0).check(&[EntryField::Txid(txid)], &[]).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].fee, Some(-FEE));
        assert_eq!(rows[0].address, Some(to));
        assert_eq!(network.node(0).balance(), coins("8.4999"));
    }

    #[test]
    fn test_send_to_self() {
        let network = funded(1);
        let own = network.node(0).get_new_address("");
        let txid = network.send_to_address(0, own, coins("0.2"));
        network.generate(1);

        let node = network.node(0);
        let sends = node
            .check(
                &[EntryField::Txid(txid), EntryField::Category(Category::Send)],
                &[EntryField::Amount(coins("-0.2")), EntryField::Confirmations(1)],
            )
            .unwrap();
        let receives = node
            .check(
                &[EntryField::Txid(txid), EntryField::Category(Category::Receive)],
                &[EntryField::Amount(coins("0.2")), EntryField::Confirmations(1)],
            )
            .unwrap();
        assert_eq!(sends.len(), 1);
        assert_eq!(receives.len(), 1);
    }

    #[test]
    fn test_sendmany_to_several_accounts() {
        let network = funded(2);
        let node0_default = network.node(0).get_new_address("");
        let node1_default = network.node(1).get_new_address("");
        let node0_from1 = network.node(0).get_new_address("from1");
        let node1_toself = network.node(1).get_new_address("toself");

        let txid = network.send_many(
            1,
            "",
            &[
                (node0_default, coins("0.11")),
                (node1_default, coins("0.22")),
                (node0_from1, coins("0.33")),
                (node1_toself, coins("0.44")),
            ],
        );
        network.generate(1);

        let sender = network.node(1);
        let sends = sender
            .check(
                &[EntryField::Txid(txid), EntryField::Category(Category::Send)],
                &[EntryField::Account(String::new())],
            )
            .unwrap();
        assert_eq!(sends.len(), 4);
        for (address, amount) in [
            (node0_default, "-0.11"),
            (node1_default, "-0.22"),
            (node0_from1, "-0.33"),
            (node1_toself, "-0.44"),
        ] {
            sender
                .check(
                    &[
                        EntryField::Txid(txid),
                        EntryField::Category(Category::Send),
                        EntryField::Address(Some(address)),
                    ],
                    &[EntryField::Amount(coins(amount))],
                )
                .unwrap();
        }

        let receive = |node: usize, account: &str, amount: &str| {
            network
                .node(node)
                .check(
                    &[
                        EntryField::Txid(txid),
                        EntryField::Category(Category::Receive),
                        EntryField::Account(account.to_string()),
                    ],
                    &[EntryField::Amount(coins(amount))],
                )
                .unwrap()
        };
        assert_eq!(receive(0, "", "0.11").len(), 1);
        assert_eq!(receive(0, "from1", "0.33").len(), 1);
        assert_eq!(receive(1, "", "0.22").len(), 1);
        assert_eq!(receive(1, "toself", "0.44").len(), 1);
    }

    #[test]
    fn test_unrelated_wallet_sees_nothing() {
        let network = funded(3);
        let to = network.node(1).get_new_address("");
        let txid = network.send_to_address(0, to, coins("0.5"));

        let err = network.node(2).check(&[EntryField::Txid(txid)], &[]).unwrap_err();
        assert!(matches!(err, LedgerError::NoMatchFound { .. }));
        assert_eq!(network.rows_for(&txid).len(), 2);
    }

    #[test]
    fn test_expectation_mismatch_names_key() {
        let network = funded(2);
        let to = network.node(1).get_new_address("");
        let txid = network.send_to_address(0, to, coins("0.1"));

        let err = network
            .node(1)
            .check(
                &[EntryField::Txid(txid)],
                &[EntryField::Category(Category::Send)],
            )
            .unwrap_err();
        match err {
            LedgerError::ExpectationMismatch { key, .. } => assert_eq!(key, "category"),
            other => panic!("expected mismatch, got {other:?}"),
        }
    }

    // =========================================================================
    // CHAIN AND MEMPOOL CHURN
    // =========================================================================

    #[test]
    fn test_mempool_then_block_never_duplicates() {
        let network = funded(2);
        let to = network.node(1).get_new_address("");
        let txid = network.send_to_address(0, to, coins("0.3"));
        let before = network.node(1).ledger.stats().entries;

        network.generate(3);

        let rows = network.node(1).check(&[EntryField::Txid(txid)], &[]).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].confirmations, 3);
        assert_eq!(network.node(1).ledger.stats().entries, before);
    }

    #[test]
    fn test_confirmations_track_depth() {
        let network = funded(2);
        let to = network.node(1).get_new_address("");
        let txid = network.send_to_address(0, to, coins("0.3"));

        for depth in 1..=5 {
            network.generate(1);
            network
                .node(1)
                .check(&[EntryField::Txid(txid)], &[EntryField::Confirmations(depth)])
                .unwrap();
        }
    }

    #[test]
    fn test_disconnect_with_resurrection_keeps_rows_unconfirmed() {
        let network = funded(2);
        let to = network.node(1).get_new_address("");
        let txid = network.send_to_address(0, to, coins("0.1"));
        network.generate(1);

        network.disconnect_tip(true);

        for node in 0..2 {
            let rows = network
                .node(node)
                .check(&[EntryField::Txid(txid)], &[EntryField::Confirmations(0)])
                .unwrap();
            assert!(rows.iter().all(|r| r.block_hash.is_none()));
        }

        network.generate(1);
        network
            .node(1)
            .check(&[EntryField::Txid(txid)], &[EntryField::Confirmations(1)])
            .unwrap();
    }

    #[test]
    fn test_disconnect_without_mempool_retracts() {
        let network = funded(2);
        let to = network.node(1).get_new_address("");
        let txid = network.send_to_address(0, to, coins("0.1"));
        network.generate(1);

        network.disconnect_tip(false);

        assert!(network.rows_for(&txid).is_empty());
    }

    #[test]
    fn test_eviction_retracts_unconfirmed_payment() {
        let network = funded(2);
        let to = network.node(1).get_new_address("");
        let txid = network.send_to_address(0, to, coins("0.1"));

        network.evict(&txid);

        assert!(network.rows_for(&txid).is_empty());
        let listed = network
            .node(1)
            .ledger
            .list_transactions(&ListRequest::everything())
            .unwrap();
        assert!(listed.iter().all(|r| r.txid != txid));
    }

    #[test]
    fn test_listtransactions_pages_oldest_first() {
        let network = funded(2);
        let mut txids = Vec::new();
        for _ in 0..4 {
            let to = network.node(1).get_new_address("");
            txids.push(network.send_to_address(0, to, coins("0.01")));
        }

        let ledger = &network.node(1).ledger;
        let newest_two = ledger.list_transactions(&ListRequest::new(None, 2, 0)).unwrap();
        assert_eq!(
            newest_two.iter().map(|r| r.txid).collect::<Vec<_>>(),
            txids[2..].to_vec()
        );
        let older_two = ledger.list_transactions(&ListRequest::new(None, 2, 2)).unwrap();
        assert_eq!(
            older_two.iter().map(|r| r.txid).collect::<Vec<_>>(),
            txids[..2].to_vec()
        );
    }

    // =========================================================================
    // DURABILITY
    // =========================================================================

    #[test]
    fn test_restart_restores_from_snapshot_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("node1.snap");
        let backends: Vec<Arc<dyn LedgerPersistence>> = vec![
            Arc::new(NoPersistence),
            Arc::new(FileSnapshotStore::new(&path)),
        ];
        let mut network = Network::with_persistence(backends);
        let funding = network.node(0).get_new_address("");
        network.fund(funding, coins("5"));
        let to = network.node(1).get_new_address("savings");
        let txid = network.send_to_address(0, to, coins("1.25"));
        network.generate(2);

        network.restart(1, Arc::new(FileSnapshotStore::new(&path)));

        network
            .node(1)
            .check(
                &[EntryField::Txid(txid)],
                &[
                    EntryField::Account("savings".into()),
                    EntryField::Amount(coins("1.25")),
                    EntryField::Confirmations(2),
                ],
            )
            .unwrap();

        network.generate(1);
        network
            .node(1)
            .check(&[EntryField::Txid(txid)], &[EntryField::Confirmations(3)])
            .unwrap();
    }
}
