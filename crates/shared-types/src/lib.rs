//! # Shared Types Crate
//!
//! Chain entities consumed by the wallet ledger and carried on the shared bus.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: Every cross-subsystem type is defined here.
//! - **Exact Money**: Amounts are fixed-point integers in base units
//!   ([`Amount`]); no binary floating point crosses a subsystem boundary.
//! - **Resolved Inputs**: A [`TxInput`] carries the address and value of the
//!   output it spends, so consumers never need a UTXO lookup.

pub mod amount;
pub mod entities;
pub mod errors;

pub use amount::{Amount, COIN, MAX_MONEY};
pub use entities::*;
pub use errors::*;

/// Subsystem identifiers used as event sources on the shared bus.
pub mod subsystem_ids {
    /// Best-chain tracking (block connect/disconnect).
    pub const CHAIN: u8 = 1;
    /// Transaction memory pool.
    pub const MEMPOOL: u8 = 6;
    /// Wallet transaction activity ledger.
    pub const WALLET_LEDGER: u8 = 3;
    /// External API gateway.
    pub const API_GATEWAY: u8 = 16;
}
