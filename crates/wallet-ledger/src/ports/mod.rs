//! # Ports Layer
//!
//! - **Driving Ports (Inbound)**: `WalletLedgerApi`, consumed by the runtime
//!   event handler and the API adapter.
//! - **Driven Ports (Outbound)**: ownership lookups, chain state,
//!   persistence and time, implemented by adapters.

pub mod inbound;
pub mod outbound;

pub use inbound::*;
pub use outbound::*;
