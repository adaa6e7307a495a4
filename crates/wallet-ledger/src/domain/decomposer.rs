//! # Transaction Entry Decomposer
//!
//! Turns one transaction into the ledger rows it produces for this wallet.
//!
//! ## Rules
//!
//! 1. Every output paying an owned address is credited to the owning
//!    account; outputs to the same (account, address) fold into one
//!    `receive` row.
//! 2. If any input spends an owned address the wallet initiated the
//!    transaction: every non-change output becomes part of a `send` row for
//!    its destination, attributed to the sending account.
//! 3. Change outputs of a wallet-initiated transaction produce no rows.
//! 4. Zero-value outputs still produce rows.
//! 5. Coinbase transactions produce no rows.
//!
//! Sends precede receives; within each group rows follow output order.

use crate::domain::entities::{Category, LedgerEntry, DEFAULT_ACCOUNT};
use crate::domain::errors::LedgerError;
use crate::domain::ownership::AddressRecord;
use shared_types::{Address, Amount, Transaction, TxId};
use std::collections::HashMap;

/// Result of decomposing a transaction.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Decomposition {
    pub entries: Vec<LedgerEntry>,
    /// At least one input spends an owned address.
    pub from_me: bool,
    /// Fee paid, when every input is owned.
    pub fee: Option<Amount>,
}

impl Decomposition {
    /// Whether the transaction touches the wallet at all.
    #[must_use]
    pub fn is_relevant(&self) -> bool {
        !self.entries.is_empty()
    }
}

/// Decompose `tx` into ledger rows.
///
/// `lookup` resolves address ownership; `send_origin` is the account that
/// built the transaction, if the wallet recorded one.
pub fn decompose<F>(
    tx: &Transaction,
    txid: TxId,
    lookup: F,
    send_origin: Option<&str>,
) -> Result<Decomposition, LedgerError>
where
    F: Fn(&Address) -> Option<AddressRecord>,
{
    if tx.is_coinbase {
        return Ok(Decomposition::default());
    }

    let owned_inputs = tx
        .inputs
        .iter()
        .filter(|input| input.address.as_ref().and_then(&lookup).is_some())
        .count();
    let from_me = owned_inputs > 0;

    let fee = if from_me && owned_inputs == tx.inputs.len() {
        let fee = tx.value_in()?.checked_sub(tx.value_out()?)?;
        if fee.is_negative() {
            return Err(LedgerError::InvalidTransaction {
                txid,
                reason: format!("outputs exceed inputs by {}", -fee),
            });
        }
        Some(fee)
    } else {
        None
    };
    let send_account = send_origin.unwrap_or(DEFAULT_ACCOUNT);

    let mut sends = RowAccumulator::default();
    let mut receives = RowAccumulator::default();

    for (vout, output) in tx.outputs.iter().enumerate() {
        let vout = u32::try_from(vout).map_err(|_| LedgerError::InvalidTransaction {
            txid,
            reason: "too many outputs".into(),
        })?;
        let owner = output.address.as_ref().and_then(&lookup);

        if from_me {
            if owner.as_ref().is_some_and(|r| r.is_change) {
                continue;
            }
            sends.add(send_account, output.address, -output.value, vout)?;
        }

        if let Some(record) = owner {
            receives.add(&record.account, output.address, output.value, vout)?;
        }
    }

    let send_fee = fee.map(|f| -f);
    let mut entries = Vec::with_capacity(sends.rows.len() + receives.rows.len());
    entries.extend(sends.finish(txid, Category::Send, send_fee));
    entries.extend(receives.finish(txid, Category::Receive, None));

    Ok(Decomposition {
        entries,
        from_me,
        fee,
    })
}

#[derive(Default)]
struct RowAccumulator {
    rows: Vec<(String, Option<Address>, Amount, u32)>,
    slots: HashMap<(String, Option<Address>), usize>,
}

impl RowAccumulator {
    fn add(
        &mut self,
        account: &str,
        address: Option<Address>,
        amount: Amount,
        vout: u32,
    ) -> Result<(), LedgerError> {
        let key = (account.to_string(), address);
        match self.slots.get(&key) {
            Some(&slot) => {
                let row = &mut self.rows[slot];
                row.2 = row.2.checked_add(amount)?;
            }
            None => {
                self.slots.insert(key, self.rows.len());
                self.rows.push((account.to_string(), address, amount, vout));
            }
        }
        Ok(())
    }

    fn finish(
        self,
        txid: TxId,
        category: Category,
        fee: Option<Amount>,
    ) -> impl Iterator<Item = LedgerEntry> {
        self.rows
            .into_iter()
            .map(move |(account, address, amount, vout)| LedgerEntry {
                txid,
                category,
                account,
                address,
                amount,
                vout,
                fee,
            })
    }
}
