//! # Wallet Transaction Activity Ledger
//!
//! **Subsystem ID:** 3
//! **Status:** Production-Ready
//!
//! ## Purpose
//!
//! Records every transaction that touches an address the wallet owns,
//! classifies each as `send` or `receive`, tracks confirmation depth as the
//! best chain grows or reorganizes, and answers `listtransactions`-style
//! queries over a consistent snapshot.
//!
//! ## Data Flow
//!
//! ```text
//! block / mempool event
//!        │
//!        ▼
//!  Entry Decomposer ──owner_of──→ Address Ownership Index
//!        │ rows
//!        ▼
//!   Ledger Store ←──depth── Confirmation Tracker
//!        │ snapshot
//!        ▼
//!   Query Engine (listtransactions, two-phase check, gettransaction)
//! ```
//!
//! ## Domain Invariants
//!
//! | Invariant | Enforcement Location |
//! |-----------|---------------------|
//! | One row per (txid, category, account, address) | `domain/store.rs` - `append()` merge by key |
//! | Rows of one txid share one confirmation count | `domain/entities.rs` - confirmations live on `TxRecord` |
//! | Depth = tip - inclusion + 1, 0 while unconfirmed | `domain/tracker.rs` - `confirmations()` |
//! | Send rows ≤ 0, receive rows ≥ 0 | `domain/invariants.rs` - `check_record()` |
//! | Address owned by exactly one account | `domain/ownership.rs` - `assign()` |
//! | Mempool-then-block never double counts | `domain/store.rs` - idempotent `append()` |
//!
//! ## Event Handling
//!
//! | Event | Method | Effect |
//! |-------|--------|--------|
//! | Block connected | `on_block_connected()` | Record rows, confirm, deepen older txs |
//! | Block disconnected | `on_block_disconnected()` | Revert to 0 confirmations, retract orphans |
//! | Reorg | `on_reorg()` | Disconnect + connect in one atomic step |
//! | Mempool add | `on_mempool_transaction()` | Record rows at 0 confirmations |
//! | Mempool removal | `on_mempool_removed()` | Retract if unconfirmed |
//!
//! ## Error Policy
//!
//! | Error | Handling |
//! |-------|----------|
//! | `NoMatchFound`, `ExpectationMismatch` | Reported to the caller; state untouched |
//! | `InconsistentLedgerState` | Logged, ledger rebuilt from chain state, error returned |
//! | `ReorgRaceDetected` | Retried against a newer snapshot; never returned |
//! | `InvalidTransaction`, `AmountOutOfRange` | Writes for the txid halted until reconcile |
//!
//! ## Module Structure (Hexagonal Architecture)
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                      OUTER LAYER                                │
//! │  adapters/ - address book, snapshot files, API gateway queries  │
//! │  ipc/      - JSON payloads                                      │
//! └─────────────────────────────────────────────────────────────────┘
//!                          ↑ implements ↑
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                      MIDDLE LAYER                               │
//! │  ports/inbound.rs  - WalletLedgerApi trait                      │
//! │  ports/outbound.rs - OwnershipProvider, ChainStateProvider,     │
//! │                      LedgerPersistence, TimeSource              │
//! │  application/      - WalletLedgerService                        │
//! └─────────────────────────────────────────────────────────────────┘
//!                          ↑ uses ↑
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                      INNER LAYER                                │
//! │  domain/ownership.rs  - OwnershipIndex                          │
//! │  domain/decomposer.rs - decompose()                             │
//! │  domain/tracker.rs    - ConfirmationTracker                     │
//! │  domain/store.rs      - LedgerStore                             │
//! │  domain/query.rs      - LedgerSnapshot, EntryField              │
//! │  domain/errors.rs     - LedgerError enum                        │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! let book = SharedAddressBook::new();
//! book.assign(address, "")?;
//! let ledger = WalletLedgerService::new(
//!     LedgerConfig::default(),
//!     Arc::new(book.clone()),
//!     chain_state,
//!     Arc::new(NoPersistence),
//!     Arc::new(SystemTimeSource),
//! )?;
//! ledger.on_mempool_transaction(&tx)?;
//! ledger.check_transactions(
//!     &[EntryField::Txid(txid)],
//!     &[EntryField::Category(Category::Receive), EntryField::Confirmations(0)],
//! )?;
//! ```

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ipc;
pub mod ports;

pub use adapters::*;
pub use application::WalletLedgerService;
pub use config::LedgerConfig;
pub use domain::*;
pub use ports::*;
