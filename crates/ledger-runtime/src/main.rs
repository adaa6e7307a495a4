//! # Wallet Ledger Runtime
//!
//! Entry point for the `ledger-runtime` binary. Configuration comes from
//! `LEDGER_*` environment variables (see `container::config`).

use anyhow::{Context, Result};
use ledger_runtime::{LedgerRuntime, RuntimeConfig};
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() -> Result<()> {
    let config = RuntimeConfig::from_env().context("Invalid LEDGER_* configuration")?;

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::new(&config.log_filter))
        .with_target(true)
        .with_thread_ids(true)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let runtime = LedgerRuntime::new(config)?;
    let handler = runtime.start();

    info!("Ledger is running. Press Ctrl+C to stop.");
    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for Ctrl+C")?;

    runtime.shutdown().await;
    handler.await.context("Ledger event handler panicked")?;
    Ok(())
}
