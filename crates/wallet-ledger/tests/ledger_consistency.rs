//! # Consistency Tests for the Wallet Ledger
//!
//! These tests hammer the ledger from several threads and check that
//! readers only ever observe complete, internally consistent snapshots.
//!
//! ## Test Categories
//!
//! 1. **Reorg Atomicity** - readers during repeated chain flips
//! 2. **Parallel Writers** - distinct and duplicate txids from many threads
//! 3. **Snapshot Isolation** - held snapshots never change

use parking_lot::RwLock;
use shared_types::{
    Address, Amount, Block, BlockHeader, OutPoint, Transaction, TxId, TxInput, TxOutput,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use wallet_ledger::{
    ChainStateProvider, EntryField, LedgerConfig, LedgerError, ListRequest, NoPersistence,
    SharedAddressBook, SystemTimeSource, WalletLedgerApi, WalletLedgerService,
};

// =============================================================================
// TEST HELPERS
// =============================================================================

const WALLET: Address = [0x0a; 20];
const OUTSIDER: Address = [0xee; 20];

#[derive(Default)]
struct SimChain {
    blocks: RwLock<Vec<Block>>,
    mempool: RwLock<Vec<Transaction>>,
}

impl ChainStateProvider for SimChain {
    fn best_chain(&self) -> Result<Vec<Block>, LedgerError> {
        Ok(self.blocks.read().clone())
    }

    fn mempool_transactions(&self) -> Result<Vec<Transaction>, LedgerError> {
        Ok(self.mempool.read().clone())
    }
}

fn payment(seed: u32, units: i64) -> Transaction {
    let mut prev = [0u8; 32];
    prev[..4].copy_from_slice(&seed.to_le_bytes());
    Transaction {
        version: 1,
        inputs: vec![TxInput {
            prevout: OutPoint { txid: prev, vout: 0 },
            address: Some(OUTSIDER),
            value: Amount::from_base_units(units * 2),
        }],
        outputs: vec![TxOutput {
            address: Some(WALLET),
            value: Amount::from_base_units(units),
        }],
        lock_time: 0,
        is_coinbase: false,
    }
}

fn block_on(parent: Option<&Block>, nonce: u64, transactions: Vec<Transaction>) -> Block {
    let height = parent.map_or(0, |p| p.height() + 1);
    Block {
        header: BlockHeader {
            height,
            parent_hash: parent.map_or([0; 32], Block::hash),
            timestamp: 1_000 + height,
            nonce,
        },
        transactions,
    }
}

fn make_ledger() -> (Arc<SimChain>, Arc<WalletLedgerService>) {
    let book = SharedAddressBook::new();
    book.assign(WALLET, "").unwrap();
    let chain = Arc::new(SimChain::default());
    let ledger = WalletLedgerService::new(
        LedgerConfig::for_testing(),
        Arc::new(book),
        chain.clone(),
        Arc::new(NoPersistence),
        Arc::new(SystemTimeSource),
    )
    .unwrap();
    (chain, Arc::new(ledger))
}

fn assert_uniform_depth(rows: &[wallet_ledger::EntryView]) {
    let mut depth: HashMap<TxId, u32> = HashMap::new();
    for row in rows {
        let seen = *depth.entry(row.txid).or_insert(row.confirmations);
        assert_eq!(seen, row.confirmations, "rows of one txid disagree on depth");
    }
}

// =============================================================================
// REORG ATOMICITY
// =============================================================================

/// Readers racing a writer that keeps swapping the block including a
/// payment never see the payment missing or half-updated.
#[test]
fn consistency_readers_never_see_reorg_gap() {
    let (chain, ledger) = make_ledger();
    let genesis = block_on(None, 0, vec![]);
    chain.blocks.write().push(genesis.clone());
    ledger.on_block_connected(&genesis).unwrap();

    let tx = payment(1, 10_000);
    let txid = tx.txid();
    let mut current = block_on(Some(&genesis), 0, vec![tx.clone()]);
    chain.blocks.write().push(current.clone());
    ledger.on_block_connected(&current).unwrap();

    let done = Arc::new(AtomicBool::new(false));
    std::thread::scope(|scope| {
        for _ in 0..4 {
            let ledger = ledger.clone();
            let done = done.clone();
            scope.spawn(move || {
                while !done.load(Ordering::SeqCst) {
                    let snapshot = ledger.snapshot();
                    assert_eq!(snapshot.epoch() % 2, 0);
                    let rows: Vec<_> = snapshot.entries().collect();
                    assert!(rows.iter().any(|r| r.txid == txid), "payment vanished");
                    assert_uniform_depth(&rows);
                    ledger
                        .check_transactions(
                            &[EntryField::Txid(txid)],
                            &[EntryField::Confirmations(1)],
                        )
                        .unwrap();
                }
            });
        }

        for nonce in 1..=50 {
            let replacement = block_on(Some(&genesis), nonce, vec![tx.clone()]);
            {
                let mut blocks = chain.blocks.write();
                blocks.pop();
                blocks.push(replacement.clone());
            }
            ledger
                .on_reorg(std::slice::from_ref(&current), std::slice::from_ref(&replacement))
                .unwrap();
            current = replacement;
        }
        done.store(true, Ordering::SeqCst);
    });

    let stats = ledger.stats();
    assert_eq!(stats.reorgs, 50);
    assert_eq!(stats.transactions, 1);
    assert_eq!(stats.reconciliations, 0);
}

/// A deep reorg that drops a payment retracts it exactly once.
#[test]
fn consistency_deep_reorg_retracts_dropped_payment() {
    let (chain, ledger) = make_ledger();
    let genesis = block_on(None, 0, vec![]);
    chain.blocks.write().push(genesis.clone());
    ledger.on_block_connected(&genesis).unwrap();

    let tx = payment(2, 5_000);
    let mut old_branch = vec![block_on(Some(&genesis), 0, vec![tx.clone()])];
    for _ in 0..3 {
        let next = block_on(old_branch.last(), 0, vec![]);
        old_branch.push(next);
    }
    for block in &old_branch {
        chain.blocks.write().push(block.clone());
        ledger.on_block_connected(block).unwrap();
    }
    assert_eq!(ledger.get_transaction(&tx.txid()).unwrap().confirmations, 4);

    let mut new_branch = vec![block_on(Some(&genesis), 7, vec![])];
    for _ in 0..4 {
        let next = block_on(new_branch.last(), 7, vec![]);
        new_branch.push(next);
    }
    {
        let mut blocks = chain.blocks.write();
        blocks.truncate(1);
        blocks.extend(new_branch.iter().cloned());
    }
    let disconnected: Vec<Block> = old_branch.iter().rev().cloned().collect();
    let update = ledger.on_reorg(&disconnected, &new_branch).unwrap();

    assert_eq!(update.retracted, vec![tx.txid()]);
    assert!(ledger.list_transactions(&ListRequest::everything()).unwrap().is_empty());
    assert_eq!(ledger.stats().tip_height, Some(5));
}

// =============================================================================
// PARALLEL WRITERS
// =============================================================================

/// Mempool notifications from many threads on distinct txids all land.
#[test]
fn consistency_parallel_mempool_writers() {
    let (chain, ledger) = make_ledger();
    let genesis = block_on(None, 0, vec![]);
    chain.blocks.write().push(genesis.clone());
    ledger.on_block_connected(&genesis).unwrap();

    std::thread::scope(|scope| {
        for worker in 0..8u32 {
            let ledger = ledger.clone();
            scope.spawn(move || {
                for i in 0..25u32 {
                    let tx = payment(worker * 1_000 + i, 1_000 + i64::from(i));
                    ledger.on_mempool_transaction(&tx).unwrap();
                }
            });
        }
    });

    let stats = ledger.stats();
    assert_eq!(stats.transactions, 200);
    assert_eq!(stats.entries, 200);
    assert_eq!(stats.events_processed, 201);
}

/// The same transaction announced concurrently is recorded once.
#[test]
fn consistency_duplicate_notifications_record_once() {
    let (_chain, ledger) = make_ledger();
    let tx = payment(3, 7_777);

    std::thread::scope(|scope| {
        for _ in 0..8 {
            let ledger = ledger.clone();
            let tx = tx.clone();
            scope.spawn(move || {
                for _ in 0..10 {
                    ledger.on_mempool_transaction(&tx).unwrap();
                }
            });
        }
    });

    let rows = ledger
        .check_transactions(
            &[EntryField::Txid(tx.txid())],
            &[EntryField::Amount(Amount::from_base_units(7_777))],
        )
        .unwrap();
    assert_eq!(rows.len(), 1);
}

// =============================================================================
// SNAPSHOT ISOLATION
// =============================================================================

/// A snapshot taken before a block keeps its old depth.
#[test]
fn consistency_held_snapshot_is_immutable() {
    let (chain, ledger) = make_ledger();
    let genesis = block_on(None, 0, vec![]);
    chain.blocks.write().push(genesis.clone());
    ledger.on_block_connected(&genesis).unwrap();

    let tx = payment(4, 1_234);
    ledger.on_mempool_transaction(&tx).unwrap();
    let before = ledger.snapshot();

    let block = block_on(Some(&genesis), 0, vec![tx.clone()]);
    chain.blocks.write().push(block.clone());
    ledger.on_block_connected(&block).unwrap();

    assert_eq!(before.get_transaction(&tx.txid()).unwrap().confirmations, 0);
    assert_eq!(
        ledger.snapshot().get_transaction(&tx.txid()).unwrap().confirmations,
        1
    );
}
