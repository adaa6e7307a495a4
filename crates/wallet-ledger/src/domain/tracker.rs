//! # Confirmation Tracker
//!
//! Follows the best chain and records where each wallet transaction sits in
//! it.
//!
//! ```text
//!                  block connected
//!  Unconfirmed ───────────────────────→ Confirmed(depth = tip - h + 1)
//!      ↑                                     │  new tip: depth + 1
//!      └──────── block disconnected ─────────┘
//! ```
//!
//! Depth is positive when confirmed,
//! `0` while waiting in the mempool, `-1` when the transaction is in neither
//! the chain nor the mempool (a candidate for retraction).

use crate::domain::entities::TxStatus;
use crate::domain::errors::LedgerError;
use serde::{Deserialize, Serialize};
use shared_types::{BlockHash, TxId};
use std::collections::HashMap;

/// Tracker view of one transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackedTx {
    pub status: TxStatus,
    pub in_mempool: bool,
}

/// Best-chain follower for wallet transactions.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfirmationTracker {
    /// Best-chain block hashes, `chain[i]` at height `base_height + i`.
    chain: Vec<BlockHash>,
    base_height: u64,
    heights: HashMap<BlockHash, u64>,
    /// Wallet transactions included in each best-chain block.
    block_txs: HashMap<BlockHash, Vec<TxId>>,
    txs: HashMap<TxId, TrackedTx>,
}

impl ConfirmationTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current tip as `(hash, height)`.
    #[must_use]
    pub fn tip(&self) -> Option<(BlockHash, u64)> {
        let hash = *self.chain.last()?;
        Some((hash, self.base_height + self.chain.len() as u64 - 1))
    }

    #[must_use]
    pub fn tip_height(&self) -> Option<u64> {
        self.tip().map(|(_, h)| h)
    }

    #[must_use]
    pub fn contains_block(&self, hash: &BlockHash) -> bool {
        self.heights.contains_key(hash)
    }

    /// Extend the best chain with a block and confirm `txids` at its height.
    ///
    /// The first block ever connected sets the base height. Every later block
    /// must extend the current tip.
    pub fn connect_block(
        &mut self,
        hash: BlockHash,
        parent_hash: BlockHash,
        height: u64,
        txids: &[TxId],
    ) -> Result<(), LedgerError> {
        if self.heights.contains_key(&hash) {
            return Err(LedgerError::InconsistentLedgerState {
                reason: format!("block {} connected twice", hex::encode(&hash[..8])),
            });
        }
        match self.tip() {
            None => self.base_height = height,
            Some((tip_hash, tip_height)) => {
                if parent_hash != tip_hash || height != tip_height + 1 {
                    return Err(LedgerError::InconsistentLedgerState {
                        reason: format!(
                            "block {} at height {} does not extend tip {} at height {}",
                            hex::encode(&hash[..8]),
                            height,
                            hex::encode(&tip_hash[..8]),
                            tip_height
                        ),
                    });
                }
            }
        }

        self.chain.push(hash);
        self.heights.insert(hash, height);
        for txid in txids {
            self.txs.insert(
                *txid,
                TrackedTx {
                    status: TxStatus::Confirmed {
                        block_hash: hash,
                        height,
                    },
                    in_mempool: false,
                },
            );
        }
        self.block_txs.insert(hash, txids.to_vec());
        Ok(())
    }

    /// Remove the tip block; returns the wallet transactions it confirmed,
    /// which are now unconfirmed.
    pub fn disconnect_block(&mut self, hash: &BlockHash) -> Result<Vec<TxId>, LedgerError> {
        match self.tip() {
            Some((tip_hash, _)) if tip_hash == *hash => {}
            _ if self.heights.contains_key(hash) => {
                return Err(LedgerError::InconsistentLedgerState {
                    reason: format!(
                        "disconnect of non-tip block {}",
                        hex::encode(&hash[..8])
                    ),
                });
            }
            _ => return Err(LedgerError::UnknownBlock { block_hash: *hash }),
        }

        self.chain.pop();
        self.heights.remove(hash);
        let txids = self.block_txs.remove(hash).unwrap_or_default();
        for txid in &txids {
            if let Some(tracked) = self.txs.get_mut(txid) {
                if tracked.status.block_hash() == Some(*hash) {
                    tracked.status = TxStatus::Unconfirmed;
                }
            }
        }
        Ok(txids)
    }

    /// Record that `txid` is in the mempool.
    ///
    /// A transaction already confirmed keeps its status.
    pub fn mark_in_mempool(&mut self, txid: TxId) -> TrackedTx {
        let tracked = self.txs.entry(txid).or_insert(TrackedTx {
            status: TxStatus::Unconfirmed,
            in_mempool: false,
        });
        if !tracked.status.is_confirmed() {
            tracked.in_mempool = true;
        }
        *tracked
    }

    /// Record that `txid` left the mempool.
    pub fn mark_removed_from_mempool(&mut self, txid: &TxId) -> Option<TrackedTx> {
        let tracked = self.txs.get_mut(txid)?;
        tracked.in_mempool = false;
        Some(*tracked)
    }

    /// Stop tracking a retracted transaction.
    pub fn forget(&mut self, txid: &TxId) {
        self.txs.remove(txid);
    }

    #[must_use]
    pub fn get(&self, txid: &TxId) -> Option<TrackedTx> {
        self.txs.get(txid).copied()
    }

    /// Best-chain depth: positive when confirmed, 0 in mempool, -1 otherwise.
    #[must_use]
    pub fn depth(&self, txid: &TxId) -> i64 {
        match self.txs.get(txid) {
            Some(TrackedTx {
                status: TxStatus::Confirmed { height, .. },
                ..
            }) => i64::from(self.confirmations_at(*height)),
            Some(TrackedTx {
                in_mempool: true, ..
            }) => 0,
            _ => -1,
        }
    }

    /// Confirmation count for a transaction (0 unless confirmed).
    #[must_use]
    pub fn confirmations(&self, txid: &TxId) -> u32 {
        match self.txs.get(txid).map(|t| t.status) {
            Some(TxStatus::Confirmed { height, .. }) => self.confirmations_at(height),
            _ => 0,
        }
    }

    fn confirmations_at(&self, height: u64) -> u32 {
        match self.tip_height() {
            Some(tip) if tip >= height => u32::try_from(tip - height + 1).unwrap_or(u32::MAX),
            _ => 0,
        }
    }

    /// Number of blocks on the tracked best chain.
    #[must_use]
    pub fn chain_len(&self) -> usize {
        self.chain.len()
    }

    /// Number of tracked transactions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.txs.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.txs.is_empty()
    }
}
