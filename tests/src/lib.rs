//! # Wallet Ledger Test Suite
//!
//! ## Structure
//!
//! ```text
//! tests/
//! ├── benches/
//! │   └── ledger_benchmarks.rs   # ingest and query throughput
//! └── src/integration/
//!     ├── network.rs             # simulated wallets on a shared chain
//!     ├── wallet_scenarios.rs    # multi-wallet listtransactions checks
//!     └── bus_flow.rs            # runtime driven through the event bus
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p ledger-tests
//! cargo test -p ledger-tests integration::wallet_scenarios::
//! cargo bench -p ledger-tests
//! ```

pub mod integration;
