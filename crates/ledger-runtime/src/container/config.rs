//! # Runtime Configuration
//!
//! Ledger settings plus the runtime's own knobs, overridable from the
//! environment.
//!
//! | Variable | Field |
//! |----------|-------|
//! | `LEDGER_SNAPSHOT_PATH` | `ledger.snapshot_path` |
//! | `LEDGER_ADDRESS_BOOK` | `address_book_path` |
//! | `LEDGER_LIST_COUNT` | `ledger.default_list_count` |
//! | `LEDGER_SNAPSHOT_RETRIES` | `ledger.max_snapshot_retries` |
//! | `LEDGER_LOCK_STRIPES` | `ledger.lock_stripes` |
//! | `LEDGER_VERIFY_INVARIANTS` | `ledger.verify_invariants` |
//! | `LEDGER_BUS_CAPACITY` | `bus_capacity` |
//! | `LEDGER_LOG` | `log_filter` |

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;
use wallet_ledger::LedgerConfig;

/// Complete runtime configuration.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Ledger service configuration.
    pub ledger: LedgerConfig,
    /// JSON address book loaded at startup.
    pub address_book_path: Option<PathBuf>,
    /// Shared bus channel capacity.
    pub bus_capacity: usize,
    /// `tracing` filter directive.
    pub log_filter: String,
    /// Time handlers get to drain after the shutdown signal.
    pub shutdown_grace: Duration,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            ledger: LedgerConfig::default(),
            address_book_path: None,
            bus_capacity: shared_bus::DEFAULT_CHANNEL_CAPACITY,
            log_filter: "info".to_string(),
            shutdown_grace: Duration::from_secs(2),
        }
    }
}

/// Configuration errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value {value:?} for {key}")]
    InvalidValue { key: &'static str, value: String },

    #[error("{key} must be greater than zero")]
    Zero { key: &'static str },
}

impl RuntimeConfig {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration using `lookup` to resolve variables.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(path) = lookup("LEDGER_SNAPSHOT_PATH") {
            config.ledger.snapshot_path = Some(PathBuf::from(path));
        }
        if let Some(path) = lookup("LEDGER_ADDRESS_BOOK") {
            config.address_book_path = Some(PathBuf::from(path));
        }
        if let Some(count) = parse_var(&lookup, "LEDGER_LIST_COUNT")? {
            config.ledger.default_list_count = count;
        }
        if let Some(retries) = parse_var(&lookup, "LEDGER_SNAPSHOT_RETRIES")? {
            config.ledger.max_snapshot_retries = retries;
        }
        if let Some(stripes) = parse_var(&lookup, "LEDGER_LOCK_STRIPES")? {
            config.ledger.lock_stripes = stripes;
        }
        if let Some(verify) = parse_var(&lookup, "LEDGER_VERIFY_INVARIANTS")? {
            config.ledger.verify_invariants = verify;
        }
        if let Some(capacity) = parse_var(&lookup, "LEDGER_BUS_CAPACITY")? {
            config.bus_capacity = capacity;
        }
        if let Some(filter) = lookup("LEDGER_LOG") {
            config.log_filter = filter;
        }

        config.validate()?;
        Ok(config)
    }

    /// Reject settings the runtime cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.ledger.lock_stripes == 0 {
            return Err(ConfigError::Zero {
                key: "LEDGER_LOCK_STRIPES",
            });
        }
        if self.bus_capacity == 0 {
            return Err(ConfigError::Zero {
                key: "LEDGER_BUS_CAPACITY",
            });
        }
        Ok(())
    }
}

fn parse_var<F, T>(lookup: &F, key: &'static str) -> Result<Option<T>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue { key, value }),
    }
}
