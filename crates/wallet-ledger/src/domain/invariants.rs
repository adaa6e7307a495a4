//! Structural checks run over the store after a committed event.
//!
//! A violation means the ledger no longer reflects the chain and must be
//! rebuilt; every check reports `InconsistentLedgerState`.

use crate::domain::entities::{Category, TxRecord};
use crate::domain::errors::LedgerError;
use crate::domain::store::LedgerStore;
use crate::domain::tracker::ConfirmationTracker;
use std::collections::HashSet;

fn violation(record: &TxRecord, what: &str) -> LedgerError {
    LedgerError::InconsistentLedgerState {
        reason: format!("{} {what}", hex::encode(&record.txid[..8])),
    }
}

/// Row-level invariants of one record.
pub fn check_record(record: &TxRecord) -> Result<(), LedgerError> {
    if record.entries.is_empty() {
        return Err(violation(record, "has no rows"));
    }

    let mut keys = HashSet::with_capacity(record.entries.len());
    let mut send_destinations = HashSet::new();
    for entry in &record.entries {
        if entry.txid != record.txid {
            return Err(violation(record, "holds a row of another transaction"));
        }
        if !keys.insert(entry.key()) {
            return Err(violation(record, "holds two rows with one key"));
        }
        if entry.category == Category::Send && !send_destinations.insert(entry.address) {
            return Err(violation(record, "sends to one address under two accounts"));
        }
        let signed_ok = match entry.category {
            Category::Send => entry.amount.is_negative() || entry.amount.is_zero(),
            Category::Receive => !entry.amount.is_negative(),
        };
        if !signed_ok {
            return Err(violation(record, "has a row with the wrong sign"));
        }
        if !entry.amount.in_money_range() {
            return Err(violation(record, "has a row outside the money range"));
        }
    }

    match (record.status.is_confirmed(), record.confirmations) {
        (true, 0) => Err(violation(record, "is confirmed with zero confirmations")),
        (false, n) if n > 0 => Err(violation(record, "is unconfirmed with confirmations")),
        _ => Ok(()),
    }
}

/// Store-wide invariants, cross-checked against the tracker.
pub fn check_store(
    store: &LedgerStore,
    tracker: &ConfirmationTracker,
) -> Result<(), LedgerError> {
    let mut entries = 0;
    let mut last_sequence = None;
    for record in store.records() {
        check_record(record)?;
        entries += record.entries.len();

        if last_sequence.is_some_and(|prev| prev >= record.sequence) {
            return Err(violation(record, "breaks observation order"));
        }
        last_sequence = Some(record.sequence);

        let expected = tracker.confirmations(&record.txid);
        if record.confirmations != expected {
            return Err(LedgerError::InconsistentLedgerState {
                reason: format!(
                    "{} reports {} confirmations, chain says {}",
                    hex::encode(&record.txid[..8]),
                    record.confirmations,
                    expected
                ),
            });
        }
    }

    if entries != store.entry_count() {
        return Err(LedgerError::InconsistentLedgerState {
            reason: format!(
                "entry count {} disagrees with {} stored rows",
                store.entry_count(),
                entries
            ),
        });
    }
    Ok(())
}
