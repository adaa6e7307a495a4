//! # Domain Layer - Wallet Ledger
//!
//! Pure ledger logic; no I/O, no locks, no clocks.
//!
//! ## Components
//!
//! - `ownership`: Address Ownership Index (address → account)
//! - `decomposer`: Transaction Entry Decomposer (tx → send/receive rows)
//! - `tracker`: Confirmation Tracker (best-chain depth per txid)
//! - `store`: Ledger Store (append-only rows keyed by txid/category/account/address)
//! - `query`: Query Engine (`listtransactions`, two-phase check, snapshots)
//! - `invariants`: Structural checks over store and tracker
//! - `value_objects`: ListRequest, LedgerUpdate, LedgerStats
//! - `errors`: LedgerError enumeration
//!
//! ## Data Types
//!
//! - Address: `[u8; 20]`
//! - TxId / BlockHash: `[u8; 32]`
//! - Amount: fixed-point `i64` in base units (from shared-types)

pub mod decomposer;
pub mod entities;
pub mod errors;
pub mod invariants;
pub mod ownership;
pub mod query;
pub mod store;
pub mod tracker;
pub mod value_objects;

pub use decomposer::*;
pub use entities::*;
pub use errors::*;
pub use ownership::*;
pub use query::*;
pub use store::*;
pub use tracker::*;
pub use value_objects::*;
