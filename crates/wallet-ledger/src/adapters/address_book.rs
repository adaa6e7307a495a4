//! Shared address book backing the ownership port.
//!
//! The wallet assigns addresses through this handle while the ledger reads
//! ownership through [`OwnershipProvider`].

use crate::domain::{AddressRecord, LedgerError, OwnershipIndex};
use crate::ports::outbound::OwnershipProvider;
use parking_lot::RwLock;
use shared_types::Address;
use std::sync::Arc;

/// Cloneable handle to one [`OwnershipIndex`].
#[derive(Clone, Default)]
pub struct SharedAddressBook {
    inner: Arc<RwLock<OwnershipIndex>>,
}

impl SharedAddressBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_index(index: OwnershipIndex) -> Self {
        Self {
            inner: Arc::new(RwLock::new(index)),
        }
    }

    /// Assign a receiving address to `account`.
    pub fn assign(&self, address: Address, account: &str) -> Result<bool, LedgerError> {
        self.inner.write().assign(address, account)
    }

    /// Register a change address owned by `account`.
    pub fn assign_change(&self, address: Address, account: &str) -> Result<bool, LedgerError> {
        self.inner.write().assign_change(address, account)
    }

    pub fn account_of(&self, address: &Address) -> Option<String> {
        self.inner.read().owner_of(address).map(str::to_string)
    }

    pub fn addresses_of(&self, account: &str) -> Vec<Address> {
        self.inner.read().addresses_of(account).to_vec()
    }

    /// Copy of the current index.
    pub fn snapshot(&self) -> OwnershipIndex {
        self.inner.read().clone()
    }

    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }
}

impl OwnershipProvider for SharedAddressBook {
    fn owner_of(&self, address: &Address) -> Option<AddressRecord> {
        self.inner.read().record(address).cloned()
    }
}
