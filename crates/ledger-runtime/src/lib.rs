//! # Ledger Runtime Library
//!
//! Hosts the wallet ledger on the shared event bus. The `ledger-runtime`
//! binary is a thin wrapper over [`LedgerRuntime`].
//!
//! ## Modules
//!
//! - `container/` - configuration and service wiring
//! - `adapters/` - chain mirror and address book file
//! - `handlers/` - bus event handler driving the ledger

pub mod adapters;
pub mod container;
pub mod handlers;
pub mod runtime;

pub use container::{LedgerContainer, RuntimeConfig};
pub use runtime::LedgerRuntime;
