//! # Address Ownership Index
//!
//! Maps every wallet address to the account that owns it. An address is
//! assigned exactly once; accounts come into existence on their first
//! address and are never removed.

use crate::domain::errors::LedgerError;
use serde::{Deserialize, Serialize};
use shared_types::Address;
use std::collections::{BTreeMap, HashMap};

/// Ownership facts for one address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressRecord {
    /// Owning account label.
    pub account: String,
    /// Change address: owned but not in the address book.
    pub is_change: bool,
}

/// In-memory address → account index.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OwnershipIndex {
    by_address: HashMap<Address, AddressRecord>,
    by_account: BTreeMap<String, Vec<Address>>,
}

impl OwnershipIndex {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Assign an address-book address to `account`.
    ///
    /// Returns `Ok(false)` if the address already belongs to `account`.
    pub fn assign(&mut self, address: Address, account: &str) -> Result<bool, LedgerError> {
        self.insert(address, account, false)
    }

    /// Assign a change address to `account`.
    pub fn assign_change(&mut self, address: Address, account: &str) -> Result<bool, LedgerError> {
        self.insert(address, account, true)
    }

    fn insert(
        &mut self,
        address: Address,
        account: &str,
        is_change: bool,
    ) -> Result<bool, LedgerError> {
        if let Some(existing) = self.by_address.get(&address) {
            if existing.account == account {
                return Ok(false);
            }
            return Err(LedgerError::AddressAlreadyOwned {
                address,
                existing: existing.account.clone(),
                requested: account.to_string(),
            });
        }

        self.by_address.insert(
            address,
            AddressRecord {
                account: account.to_string(),
                is_change,
            },
        );
        self.by_account
            .entry(account.to_string())
            .or_default()
            .push(address);
        Ok(true)
    }

    /// Owning account of `address`, if the wallet owns it.
    #[must_use]
    pub fn owner_of(&self, address: &Address) -> Option<&str> {
        self.by_address.get(address).map(|r| r.account.as_str())
    }

    #[must_use]
    pub fn record(&self, address: &Address) -> Option<&AddressRecord> {
        self.by_address.get(address)
    }

    #[must_use]
    pub fn is_mine(&self, address: &Address) -> bool {
        self.by_address.contains_key(address)
    }

    /// All known account labels, sorted.
    pub fn accounts(&self) -> impl Iterator<Item = &str> {
        self.by_account.keys().map(String::as_str)
    }

    /// Addresses of `account` in assignment order.
    #[must_use]
    pub fn addresses_of(&self, account: &str) -> &[Address] {
        self.by_account
            .get(account)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.by_address.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_address.is_empty()
    }
}
