//! # Integration Tests
//!
//! - `network` - simulated multi-wallet chain used by the scenarios
//! - `wallet_scenarios` - `listtransactions` behaviour across wallets
//! - `bus_flow` - the runtime driven through the shared bus

pub mod bus_flow;
pub mod network;
pub mod wallet_scenarios;
