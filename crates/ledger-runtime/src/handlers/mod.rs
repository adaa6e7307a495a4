//! # Event Handlers
//!
//! Bus handlers that drive the wallet ledger.

pub mod ledger_events;

pub use ledger_events::{LedgerEventHandler, LEDGER_QUERY_TARGET};
