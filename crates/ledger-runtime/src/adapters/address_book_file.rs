//! # Address Book File
//!
//! Loads wallet addresses from a JSON file:
//!
//! ```json
//! [
//!   { "address": "0a0a…0a", "account": "" },
//!   { "address": "5a5a…5a", "account": "savings" },
//!   { "address": "cccc…cc", "account": "", "change": true }
//! ]
//! ```

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use shared_types::parse_address;
use tracing::info;
use wallet_ledger::SharedAddressBook;

#[derive(Debug, Deserialize)]
struct AddressEntry {
    address: String,
    #[serde(default)]
    account: String,
    #[serde(default)]
    change: bool,
}

/// Parse an address book from JSON text.
pub fn parse_address_book(json: &str) -> Result<SharedAddressBook> {
    let entries: Vec<AddressEntry> =
        serde_json::from_str(json).context("Address book is not a JSON array of entries")?;

    let book = SharedAddressBook::new();
    for entry in entries {
        let address = parse_address(entry.address.trim_start_matches("0x"))
            .with_context(|| format!("Invalid address {:?}", entry.address))?;
        if entry.change {
            book.assign_change(address, &entry.account)
        } else {
            book.assign(address, &entry.account)
        }
        .with_context(|| format!("Cannot assign {} to {:?}", entry.address, entry.account))?;
    }
    Ok(book)
}

/// Load an address book from `path`.
pub fn load_address_book(path: &Path) -> Result<SharedAddressBook> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read address book {}", path.display()))?;
    let book = parse_address_book(&json)?;
    info!(
        path = %path.display(),
        addresses = book.len(),
        "[ledger-runtime] Address book loaded"
    );
    Ok(book)
}
