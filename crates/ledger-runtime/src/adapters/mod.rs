//! # Adapters
//!
//! Port implementations the runtime plugs into the wallet ledger.

pub mod address_book_file;
pub mod chain_mirror;

pub use address_book_file::{load_address_book, parse_address_book};
pub use chain_mirror::ChainMirror;
