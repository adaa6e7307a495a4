//! # Ledger Store
//!
//! Arena of [`TxRecord`]s ordered by observation sequence, with lookup
//! tables by txid, account and address.
//!
//! Records are held behind `Arc` so cloning the store for a read snapshot
//! copies pointers, not rows. Mutation goes through `Arc::make_mut`, which
//! leaves records shared with older snapshots untouched.

use crate::domain::entities::{Category, EntryView, LedgerEntry, TxRecord, TxStatus};
use crate::domain::errors::LedgerError;
use shared_types::{Address, TxId};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::sync::Arc;

/// What an append did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppendOutcome {
    /// New transaction recorded.
    Inserted { entries: usize },
    /// Existing transaction's rows were replaced.
    Merged {
        added: usize,
        updated: usize,
        removed: usize,
    },
    /// Every row was already present with the same values.
    Unchanged,
}

#[derive(Debug, Clone, Default)]
pub struct LedgerStore {
    records: BTreeMap<u64, Arc<TxRecord>>,
    by_txid: HashMap<TxId, u64>,
    by_account: HashMap<String, BTreeSet<u64>>,
    by_address: HashMap<Address, BTreeSet<u64>>,
    halted: HashSet<TxId>,
    next_sequence: u64,
    entry_count: usize,
}

impl LedgerStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append the rows of one transaction.
    ///
    /// Rows are keyed by (txid, category, account, address). A row whose key
    /// already exists is merged in place; it is never duplicated.
    pub fn append(
        &mut self,
        entries: Vec<LedgerEntry>,
        time_received: u64,
    ) -> Result<AppendOutcome, LedgerError> {
        let Some(first) = entries.first() else {
            return Ok(AppendOutcome::Unchanged);
        };
        let txid = first.txid;

        if entries.iter().any(|e| e.txid != txid) {
            return Err(LedgerError::InconsistentLedgerState {
                reason: "append batch mixes transactions".into(),
            });
        }
        let mut seen = HashSet::with_capacity(entries.len());
        if !entries.iter().all(|e| seen.insert(e.key())) {
            return Err(LedgerError::InconsistentLedgerState {
                reason: format!("duplicate row key in {}", hex::encode(&txid[..8])),
            });
        }
        if self.halted.contains(&txid) {
            return Err(LedgerError::WritesHalted { txid });
        }

        match self.by_txid.get(&txid).copied() {
            Some(sequence) => self.merge(sequence, entries),
            None => {
                let sequence = self.next_sequence;
                let count = entries.len();
                self.insert_record(TxRecord {
                    txid,
                    entries,
                    status: TxStatus::Unconfirmed,
                    in_mempool: false,
                    confirmations: 0,
                    sequence,
                    time_received,
                });
                Ok(AppendOutcome::Inserted { entries: count })
            }
        }
    }

    /// Replace the rows of an existing record with a fresh decomposition.
    ///
    /// Rows absent from `entries` are dropped, so a transaction re-keyed by a
    /// later send attribution never keeps its stale rows.
    fn merge(
        &mut self,
        sequence: u64,
        entries: Vec<LedgerEntry>,
    ) -> Result<AppendOutcome, LedgerError> {
        let Some(slot) = self.records.get_mut(&sequence) else {
            return Err(LedgerError::InconsistentLedgerState {
                reason: format!("txid index points at missing sequence {sequence}"),
            });
        };

        let mut added = 0;
        let mut updated = 0;
        for entry in &entries {
            match slot.entries.iter().find(|e| e.key() == entry.key()) {
                Some(existing) if existing == entry => {}
                Some(_) => updated += 1,
                None => added += 1,
            }
        }
        let removed = slot
            .entries
            .iter()
            .filter(|old| !entries.iter().any(|e| e.key() == old.key()))
            .count();
        if added == 0 && updated == 0 && removed == 0 {
            return Ok(AppendOutcome::Unchanged);
        }

        let previous = std::mem::replace(&mut Arc::make_mut(slot).entries, entries);
        self.unindex_rows(sequence, &previous);
        self.entry_count -= previous.len();

        let Some(record) = self.records.get(&sequence).cloned() else {
            return Err(LedgerError::InconsistentLedgerState {
                reason: format!("record {sequence} vanished during merge"),
            });
        };
        for entry in &record.entries {
            self.index_row(sequence, &entry.account, entry.address.as_ref());
        }
        self.entry_count += record.entries.len();

        Ok(AppendOutcome::Merged {
            added,
            updated,
            removed,
        })
    }

    /// Move every send row of `txid` to `account`.
    ///
    /// Returns whether rows changed. Unknown and halted txids are left alone.
    pub fn relabel_sends(&mut self, txid: &TxId, account: &str) -> Result<bool, LedgerError> {
        let Some(record) = self.get(txid) else {
            return Ok(false);
        };
        if self.halted.contains(txid)
            || record
                .entries
                .iter()
                .all(|e| e.category != Category::Send || e.account == account)
        {
            return Ok(false);
        }
        let entries = record
            .entries
            .iter()
            .cloned()
            .map(|mut e| {
                if e.category == Category::Send {
                    e.account = account.to_string();
                }
                e
            })
            .collect();
        let time_received = record.time_received;
        self.append(entries, time_received)
            .map(|outcome| outcome != AppendOutcome::Unchanged)
    }

    /// Insert a complete record, keeping its sequence number.
    ///
    /// Used on restore and re-derivation. Replaces any record with the same
    /// txid.
    pub fn insert_record(&mut self, record: TxRecord) {
        self.retract(&record.txid);

        let sequence = record.sequence;
        for entry in &record.entries {
            self.index_row(sequence, &entry.account, entry.address.as_ref());
        }
        self.entry_count += record.entries.len();
        self.by_txid.insert(record.txid, sequence);
        self.records.insert(sequence, Arc::new(record));
        self.next_sequence = self.next_sequence.max(sequence + 1);
    }

    fn index_row(&mut self, sequence: u64, account: &str, address: Option<&Address>) {
        self.by_account
            .entry(account.to_string())
            .or_default()
            .insert(sequence);
        if let Some(address) = address {
            self.by_address.entry(*address).or_default().insert(sequence);
        }
    }

    /// Set the confirmation count shared by every row of `txid`.
    ///
    /// Returns whether anything changed.
    pub fn update_confirmations(&mut self, txid: &TxId, n: u32) -> Result<bool, LedgerError> {
        let record = self.record_mut(txid)?;
        if record.confirmations == n {
            return Ok(false);
        }
        Arc::make_mut(record).confirmations = n;
        Ok(true)
    }

    /// Set chain status, mempool flag and confirmations in one step.
    pub fn set_status(
        &mut self,
        txid: &TxId,
        status: TxStatus,
        in_mempool: bool,
        confirmations: u32,
    ) -> Result<bool, LedgerError> {
        let record = self.record_mut(txid)?;
        if record.status == status
            && record.in_mempool == in_mempool
            && record.confirmations == confirmations
        {
            return Ok(false);
        }
        let record = Arc::make_mut(record);
        record.status = status;
        record.in_mempool = in_mempool;
        record.confirmations = confirmations;
        Ok(true)
    }

    fn record_mut(&mut self, txid: &TxId) -> Result<&mut Arc<TxRecord>, LedgerError> {
        let sequence = self
            .by_txid
            .get(txid)
            .copied()
            .ok_or(LedgerError::TransactionNotFound { txid: *txid })?;
        self.records
            .get_mut(&sequence)
            .ok_or_else(|| LedgerError::InconsistentLedgerState {
                reason: format!("txid index points at missing sequence {sequence}"),
            })
    }

    /// Remove every row of `txid`.
    pub fn retract(&mut self, txid: &TxId) -> Option<TxRecord> {
        let sequence = self.by_txid.remove(txid)?;
        let record = self.records.remove(&sequence)?;
        self.unindex_rows(sequence, &record.entries);
        self.entry_count -= record.entries.len();
        Some(Arc::unwrap_or_clone(record))
    }

    fn unindex_rows(&mut self, sequence: u64, entries: &[LedgerEntry]) {
        for entry in entries {
            if let Some(set) = self.by_account.get_mut(&entry.account) {
                set.remove(&sequence);
                if set.is_empty() {
                    self.by_account.remove(&entry.account);
                }
            }
            if let Some(address) = &entry.address {
                if let Some(set) = self.by_address.get_mut(address) {
                    set.remove(&sequence);
                    if set.is_empty() {
                        self.by_address.remove(address);
                    }
                }
            }
        }
    }

    #[must_use]
    pub fn get(&self, txid: &TxId) -> Option<&TxRecord> {
        let sequence = self.by_txid.get(txid)?;
        self.records.get(sequence).map(Arc::as_ref)
    }

    #[must_use]
    pub fn contains(&self, txid: &TxId) -> bool {
        self.by_txid.contains_key(txid)
    }

    /// Records in observation order.
    pub fn records(&self) -> impl DoubleEndedIterator<Item = &TxRecord> {
        self.records.values().map(Arc::as_ref)
    }

    /// Every row in observation order.
    pub fn query(&self) -> impl Iterator<Item = EntryView> + '_ {
        self.records().flat_map(TxRecord::views)
    }

    /// Records with at least one row for `account`, in observation order.
    pub fn records_for_account<'a>(
        &'a self,
        account: &str,
    ) -> impl DoubleEndedIterator<Item = &'a TxRecord> + 'a {
        self.by_account
            .get(account)
            .into_iter()
            .flatten()
            .filter_map(|seq| self.records.get(seq).map(Arc::as_ref))
    }

    /// Records with at least one row for `address`, in observation order.
    pub fn records_for_address<'a>(
        &'a self,
        address: &Address,
    ) -> impl Iterator<Item = &'a TxRecord> + 'a {
        self.by_address
            .get(address)
            .into_iter()
            .flatten()
            .filter_map(|seq| self.records.get(seq).map(Arc::as_ref))
    }

    /// Block further writes for `txid` until [`clear_halts`](Self::clear_halts).
    pub fn halt(&mut self, txid: TxId) -> bool {
        self.halted.insert(txid)
    }

    #[must_use]
    pub fn is_halted(&self, txid: &TxId) -> bool {
        self.halted.contains(txid)
    }

    pub fn halted(&self) -> impl Iterator<Item = &TxId> {
        self.halted.iter()
    }

    pub fn clear_halts(&mut self) -> Vec<TxId> {
        self.halted.drain().collect()
    }

    /// Account labels that have at least one row.
    pub fn accounts(&self) -> impl Iterator<Item = &str> {
        self.by_account.keys().map(String::as_str)
    }

    #[must_use]
    pub fn transaction_count(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn entry_count(&self) -> usize {
        self.entry_count
    }

    #[must_use]
    pub fn next_sequence(&self) -> u64 {
        self.next_sequence
    }

    /// Raise the sequence counter, e.g. after re-deriving into a fresh store.
    pub fn reserve_sequence(&mut self, next: u64) {
        self.next_sequence = self.next_sequence.max(next);
    }
}
