//! # Query Engine
//!
//! Pure functions over an immutable [`LedgerSnapshot`].
//!
//! ## Two-Phase Check
//!
//! `check_transactions(to_match, expected)`:
//!
//! 1. Select every row on which all `to_match` fields agree.
//! 2. Every selected row must agree on every `expected` field.
//!
//! Selecting nothing is `NoMatchFound`; the first disagreement is
//! `ExpectationMismatch` naming the row and the key.

use crate::domain::entities::{Category, EntryView, TransactionView};
use crate::domain::errors::LedgerError;
use crate::domain::store::LedgerStore;
use crate::domain::value_objects::ListRequest;
use serde::{Deserialize, Serialize};
use shared_types::{Address, Amount, BlockHash, TxId};

/// One `key = value` condition on a ledger row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "key", content = "value", rename_all = "snake_case")]
pub enum EntryField {
    Txid(TxId),
    Category(Category),
    Account(String),
    Amount(Amount),
    Address(Option<Address>),
    Vout(u32),
    Fee(Option<Amount>),
    Confirmations(u32),
    BlockHash(Option<BlockHash>),
}

impl EntryField {
    /// Field name as it appears in `listtransactions` output.
    #[must_use]
    pub fn key(&self) -> &'static str {
        match self {
            Self::Txid(_) => "txid",
            Self::Category(_) => "category",
            Self::Account(_) => "account",
            Self::Amount(_) => "amount",
            Self::Address(_) => "address",
            Self::Vout(_) => "vout",
            Self::Fee(_) => "fee",
            Self::Confirmations(_) => "confirmations",
            Self::BlockHash(_) => "blockhash",
        }
    }

    #[must_use]
    pub fn matches(&self, row: &EntryView) -> bool {
        match self {
            Self::Txid(v) => row.txid == *v,
            Self::Category(v) => row.category == *v,
            Self::Account(v) => row.account == *v,
            Self::Amount(v) => row.amount == *v,
            Self::Address(v) => row.address == *v,
            Self::Vout(v) => row.vout == *v,
            Self::Fee(v) => row.fee == *v,
            Self::Confirmations(v) => row.confirmations == *v,
            Self::BlockHash(v) => row.block_hash == *v,
        }
    }

    /// Rendered expected value.
    #[must_use]
    pub fn value_text(&self) -> String {
        match self {
            Self::Txid(v) => hex::encode(v),
            Self::Category(v) => v.to_string(),
            Self::Account(v) => format!("{v:?}"),
            Self::Amount(v) => v.to_string(),
            Self::Address(v) => optional_hex(v.as_ref()),
            Self::Vout(v) | Self::Confirmations(v) => v.to_string(),
            Self::Fee(v) => v.map_or_else(|| "none".into(), |a| a.to_string()),
            Self::BlockHash(v) => optional_hex(v.as_ref()),
        }
    }

    /// Rendered value of the same key on `row`.
    #[must_use]
    pub fn actual_text(&self, row: &EntryView) -> String {
        let observed = match self {
            Self::Txid(_) => Self::Txid(row.txid),
            Self::Category(_) => Self::Category(row.category),
            Self::Account(_) => Self::Account(row.account.clone()),
            Self::Amount(_) => Self::Amount(row.amount),
            Self::Address(_) => Self::Address(row.address),
            Self::Vout(_) => Self::Vout(row.vout),
            Self::Fee(_) => Self::Fee(row.fee),
            Self::Confirmations(_) => Self::Confirmations(row.confirmations),
            Self::BlockHash(_) => Self::BlockHash(row.block_hash),
        };
        observed.value_text()
    }
}

fn optional_hex<T: AsRef<[u8]>>(value: Option<&T>) -> String {
    value.map_or_else(|| "none".into(), hex::encode)
}

/// Render a field list as `{key=value, ...}` for diagnostics.
#[must_use]
pub fn describe(fields: &[EntryField]) -> String {
    let parts: Vec<String> = fields
        .iter()
        .map(|f| format!("{}={}", f.key(), f.value_text()))
        .collect();
    format!("{{{}}}", parts.join(", "))
}

/// Rows on which every field of `to_match` agrees, in ledger order.
pub fn select<I>(rows: I, to_match: &[EntryField]) -> Vec<EntryView>
where
    I: IntoIterator<Item = EntryView>,
{
    rows.into_iter()
        .filter(|row| to_match.iter().all(|f| f.matches(row)))
        .collect()
}

/// Two-phase check; returns the selected rows on success.
pub fn check_transactions<I>(
    rows: I,
    to_match: &[EntryField],
    expected: &[EntryField],
) -> Result<Vec<EntryView>, LedgerError>
where
    I: IntoIterator<Item = EntryView>,
{
    let selected = select(rows, to_match);
    if selected.is_empty() {
        return Err(LedgerError::NoMatchFound {
            criteria: describe(to_match),
        });
    }

    for row in &selected {
        if let Some(field) = expected.iter().find(|f| !f.matches(row)) {
            return Err(LedgerError::ExpectationMismatch {
                entry: row.label(),
                key: field.key(),
                expected: field.value_text(),
                actual: field.actual_text(row),
            });
        }
    }
    Ok(selected)
}

/// Immutable view of the ledger taken after a committed event.
#[derive(Debug, Clone, Default)]
pub struct LedgerSnapshot {
    store: LedgerStore,
    tip: Option<(BlockHash, u64)>,
    epoch: u64,
}

impl LedgerSnapshot {
    #[must_use]
    pub fn new(store: LedgerStore, tip: Option<(BlockHash, u64)>, epoch: u64) -> Self {
        Self { store, tip, epoch }
    }

    #[must_use]
    pub fn store(&self) -> &LedgerStore {
        &self.store
    }

    #[must_use]
    pub fn tip(&self) -> Option<(BlockHash, u64)> {
        self.tip
    }

    /// Reorg epoch the snapshot was published in.
    #[must_use]
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Every row in observation order.
    pub fn entries(&self) -> impl Iterator<Item = EntryView> + '_ {
        self.store.query()
    }

    /// `listtransactions`: newest `count` rows after skipping the newest
    /// `skip`, returned oldest first.
    #[must_use]
    pub fn list_transactions(&self, request: &ListRequest) -> Vec<EntryView> {
        let newest_first: Box<dyn Iterator<Item = EntryView> + '_> =
            match request.account_filter() {
                Some(account) => Box::new(
                    self.store
                        .records_for_account(account)
                        .rev()
                        .flat_map(|r| r.views().into_iter().rev())
                        .filter(move |row| row.account == account),
                ),
                None => Box::new(
                    self.store
                        .records()
                        .rev()
                        .flat_map(|r| r.views().into_iter().rev()),
                ),
            };

        let mut rows: Vec<EntryView> = newest_first
            .skip(request.skip)
            .take(request.count)
            .collect();
        rows.reverse();
        rows
    }

    pub fn check_transactions(
        &self,
        to_match: &[EntryField],
        expected: &[EntryField],
    ) -> Result<Vec<EntryView>, LedgerError> {
        check_transactions(self.entries(), to_match, expected)
    }

    /// `gettransaction`: every row of one transaction.
    pub fn get_transaction(&self, txid: &TxId) -> Result<TransactionView, LedgerError> {
        let record = self
            .store
            .get(txid)
            .ok_or(LedgerError::TransactionNotFound { txid: *txid })?;
        Ok(TransactionView {
            txid: record.txid,
            amount: record.net_amount()?,
            fee: record.fee(),
            confirmations: record.confirmations,
            block_hash: record.status.block_hash(),
            block_height: record.status.inclusion_height(),
            in_mempool: record.in_mempool,
            time_received: record.time_received,
            details: record.views(),
        })
    }
}
