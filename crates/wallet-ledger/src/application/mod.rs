//! # Application Layer
//!
//! Orchestrates the domain behind the `WalletLedgerApi` port.

pub mod service;

pub use service::WalletLedgerService;
