//! # Wallet Ledger Benchmarks
//!
//! | Path | Operation |
//! |------|-----------|
//! | Write | mempool ingest, block connect over pending rows |
//! | Read | `listtransactions` page, two-phase check by txid |

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use ledger_tests::integration::network::{coins, Network, SharedChain};
use shared_types::{Amount, OutPoint, Transaction, TxInput, TxOutput};
use std::sync::Arc;
use wallet_ledger::{
    EntryField, LedgerConfig, ListRequest, NoPersistence, SharedAddressBook, SystemTimeSource,
    WalletLedgerApi, WalletLedgerService,
};

const WALLET: [u8; 20] = [0x0a; 20];

fn payment(seed: u32) -> Transaction {
    let mut prev = [0u8; 32];
    prev[..4].copy_from_slice(&seed.to_le_bytes());
    Transaction {
        version: 1,
        inputs: vec![TxInput {
            prevout: OutPoint { txid: prev, vout: 0 },
            address: Some([0xee; 20]),
            value: Amount::from_base_units(2_000_000),
        }],
        outputs: vec![TxOutput {
            address: Some(WALLET),
            value: Amount::from_base_units(1_000_000 + i64::from(seed)),
        }],
        lock_time: 0,
        is_coinbase: false,
    }
}

fn ledger() -> WalletLedgerService {
    let book = SharedAddressBook::new();
    book.assign(WALLET, "").unwrap();
    WalletLedgerService::new(
        LedgerConfig::default(),
        Arc::new(book),
        Arc::new(SharedChain::default()),
        Arc::new(NoPersistence),
        Arc::new(SystemTimeSource),
    )
    .unwrap()
}

// ============================================================================
// WRITE PATH
// ============================================================================

fn bench_mempool_ingest(c: &mut Criterion) {
    let mut group = c.benchmark_group("wallet-ledger-ingest");
    for size in [100u32, 1_000] {
        let txs: Vec<Transaction> = (0..size).map(payment).collect();
        group.throughput(Throughput::Elements(u64::from(size)));
        group.bench_with_input(BenchmarkId::new("mempool", size), &txs, |b, txs| {
            b.iter_with_setup(ledger, |ledger| {
                for tx in txs {
                    black_box(ledger.on_mempool_transaction(tx).unwrap());
                }
            })
        });
    }
    group.finish();
}

fn bench_block_confirmation(c: &mut Criterion) {
    c.bench_function("wallet-ledger-confirm-block-500", |b| {
        b.iter_with_setup(
            || {
                let network = Network::new(1);
                let address = network.node(0).get_new_address("");
                for _ in 0..500 {
                    network.fund(address, coins("0.01"));
                }
                network
            },
            |network| black_box(network.generate(1)),
        )
    });
}

// ============================================================================
// READ PATH
// ============================================================================

fn bench_queries(c: &mut Criterion) {
    let ledger = ledger();
    for seed in 0..10_000 {
        ledger.on_mempool_transaction(&payment(seed)).unwrap();
    }
    let lookup = payment(5_000).txid();

    let mut group = c.benchmark_group("wallet-ledger-query");
    group.bench_function("listtransactions-10", |b| {
        b.iter(|| black_box(ledger.list_transactions(&ListRequest::default()).unwrap()))
    });
    group.bench_function("listtransactions-skip-5000", |b| {
        let request = ListRequest::new(None, 10, 5_000);
        b.iter(|| black_box(ledger.list_transactions(&request).unwrap()))
    });
    group.bench_function("check-by-txid", |b| {
        b.iter(|| {
            black_box(
                ledger
                    .check_transactions(&[EntryField::Txid(lookup)], &[EntryField::Confirmations(0)])
                    .unwrap(),
            )
        })
    });
    group.finish();
}

criterion_group!(
    benches,
    bench_mempool_ingest,
    bench_block_confirmation,
    bench_queries
);
criterion_main!(benches);
