//! # Chain Mirror
//!
//! Keeps a local copy of the best chain and the mempool, built from the
//! events seen on the shared bus. The ledger consults it when it has to
//! rebuild or decide whether a reverted transaction is still pending.
//!
//! A disconnected block's non-coinbase transactions go back into the
//! mirrored mempool, the same way a node resurrects them.
//!
//! ## Retained state
//!
//! | Item | Kept |
//! |------|------|
//! | Block headers | every block on the mirrored best chain |
//! | Block transactions | only those touching a wallet address (with an ownership filter) |
//! | Mempool | keyed by txid, in arrival order; filtered the same way |
//!
//! ## History
//!
//! A mirror that has seen the chain since the ledger was empty is complete.
//! After a restart from a ledger snapshot it is anchored at the restored tip
//! and everything below that tip is missing, so [`ChainStateProvider::best_chain`]
//! reports the chain as unavailable instead of handing back a fragment that
//! a rebuild would mistake for the whole chain.

use parking_lot::RwLock;
use shared_types::{Block, BlockHash, Transaction, TxId};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};
use wallet_ledger::{ChainStateProvider, LedgerError, OwnershipProvider};

#[derive(Debug, Default)]
struct MirrorState {
    /// Best chain, oldest first, pruned to wallet transactions.
    blocks: Vec<Block>,
    positions: HashMap<BlockHash, usize>,
    mempool: HashMap<TxId, (u64, Transaction)>,
    next_arrival: u64,
    /// Block directly below `blocks[0]` when history is incomplete.
    anchor: Option<(BlockHash, u64)>,
    partial: bool,
}

impl MirrorState {
    fn push(&mut self, block: Block) {
        self.positions.insert(block.hash(), self.blocks.len());
        self.blocks.push(block);
    }

    /// Drop every block above `len`, returning the dropped blocks tip-first.
    fn truncate(&mut self, len: usize) -> Vec<Block> {
        let mut dropped = Vec::new();
        while self.blocks.len() > len {
            if let Some(block) = self.blocks.pop() {
                self.positions.remove(&block.hash());
                dropped.push(block);
            }
        }
        dropped
    }

    fn add_pending(&mut self, txid: TxId, tx: &Transaction) {
        if self.mempool.contains_key(&txid) {
            return;
        }
        let arrival = self.next_arrival;
        self.next_arrival += 1;
        self.mempool.insert(txid, (arrival, tx.clone()));
    }

    fn resurrect(&mut self, block: &Block) {
        for tx in block.transactions.iter().filter(|tx| !tx.is_coinbase) {
            self.add_pending(tx.txid(), tx);
        }
    }
}

/// Best chain and mempool as observed on the bus.
#[derive(Default)]
pub struct ChainMirror {
    state: RwLock<MirrorState>,
    ownership: Option<Arc<dyn OwnershipProvider>>,
}

impl std::fmt::Debug for ChainMirror {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.read();
        f.debug_struct("ChainMirror")
            .field("blocks", &state.blocks.len())
            .field("mempool", &state.mempool.len())
            .field("anchor", &state.anchor.map(|(_, h)| h))
            .field("partial", &state.partial)
            .finish()
    }
}

impl ChainMirror {
    /// Mirror that keeps every transaction.
    pub fn new() -> Self {
        Self::default()
    }

    /// Mirror that keeps only transactions touching an address `ownership`
    /// knows about.
    pub fn for_wallet(ownership: Arc<dyn OwnershipProvider>) -> Self {
        Self {
            state: RwLock::default(),
            ownership: Some(ownership),
        }
    }

    fn is_relevant(&self, tx: &Transaction) -> bool {
        let Some(ownership) = &self.ownership else {
            return true;
        };
        !tx.is_coinbase
            && tx
                .inputs
                .iter()
                .filter_map(|i| i.address.as_ref())
                .chain(tx.outputs.iter().filter_map(|o| o.address.as_ref()))
                .any(|a| ownership.owner_of(a).is_some())
    }

    fn pruned(&self, block: &Block) -> Block {
        Block {
            header: block.header.clone(),
            transactions: block
                .transactions
                .iter()
                .filter(|tx| self.is_relevant(tx))
                .cloned()
                .collect(),
        }
    }

    /// Mark history up to `tip` as held elsewhere.
    ///
    /// Called when the ledger restored a snapshot: the mirror continues from
    /// the restored tip and stops offering a best chain for rebuilds.
    pub fn resume_after(&self, tip: Option<(BlockHash, u64)>) {
        let mut state = self.state.write();
        state.truncate(0);
        state.anchor = tip;
        state.partial = true;
        info!(
            anchor_height = ?tip.map(|(_, h)| h),
            "[ledger-runtime] Chain mirror resumes after restored tip"
        );
    }

    /// Forget that history was incomplete; used when nothing was restored.
    pub fn mark_complete(&self) {
        let mut state = self.state.write();
        state.anchor = None;
        state.partial = false;
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        !self.state.read().partial
    }

    /// Append a block to the mirrored chain and drop its transactions from
    /// the mempool.
    ///
    /// A block whose parent is an older mirrored block replaces everything
    /// above that parent. A block with an unknown parent restarts the mirror
    /// at that block and leaves its history incomplete.
    pub fn connect(&self, block: &Block) {
        let pruned = self.pruned(block);
        let mut state = self.state.write();
        let parent = block.header.parent_hash;

        let extends = match state.blocks.last() {
            Some(tip) => tip.hash() == parent,
            None => state.anchor.map_or(true, |(hash, _)| hash == parent),
        };
        if !extends {
            if let Some(pos) = state.positions.get(&parent).copied() {
                let dropped = state.truncate(pos + 1);
                warn!(
                    height = block.height(),
                    replaced = dropped.len(),
                    "[ledger-runtime] Connected block forks below mirrored tip"
                );
                for old in &dropped {
                    state.resurrect(old);
                }
            } else if state.anchor.is_some_and(|(hash, _)| hash == parent) {
                let dropped = state.truncate(0);
                for old in &dropped {
                    state.resurrect(old);
                }
            } else {
                warn!(
                    height = block.height(),
                    "[ledger-runtime] Connected block has an unknown parent, mirror history is incomplete"
                );
                state.truncate(0);
                state.anchor = block.height().checked_sub(1).map(|h| (parent, h));
                state.partial = true;
            }
        }

        for tx in &block.transactions {
            state.mempool.remove(&tx.txid());
        }
        state.push(pruned);
    }

    /// Remove the tip block and return its transactions to the mempool.
    ///
    /// Transactions are resurrected even when `block` is not the mirrored
    /// tip. Returns whether the mirrored tip moved.
    pub fn disconnect(&self, block: &Block) -> bool {
        let mut state = self.state.write();
        let hash = block.hash();

        let moved = if state.blocks.last().map(Block::hash) == Some(hash) {
            let below = state.blocks.len() - 1;
            state.truncate(below);
            true
        } else if state.blocks.is_empty() && state.anchor.is_some_and(|(h, _)| h == hash) {
            state.anchor = block
                .height()
                .checked_sub(1)
                .map(|h| (block.header.parent_hash, h));
            true
        } else {
            warn!(
                block = %hex::encode(hash),
                "[ledger-runtime] Disconnected block is not the mirrored tip"
            );
            false
        };

        for tx in block.transactions.iter().filter(|tx| !tx.is_coinbase) {
            if self.is_relevant(tx) {
                state.add_pending(tx.txid(), tx);
            }
        }
        moved
    }

    pub fn add_to_mempool(&self, tx: &Transaction) {
        if !self.is_relevant(tx) {
            return;
        }
        self.state.write().add_pending(tx.txid(), tx);
    }

    pub fn remove_from_mempool(&self, txid: &TxId) {
        self.state.write().mempool.remove(txid);
    }

    pub fn height(&self) -> Option<u64> {
        let state = self.state.read();
        state
            .blocks
            .last()
            .map(Block::height)
            .or(state.anchor.map(|(_, h)| h))
    }

    pub fn mempool_len(&self) -> usize {
        self.state.read().mempool.len()
    }
}

impl ChainStateProvider for ChainMirror {
    fn best_chain(&self) -> Result<Vec<Block>, LedgerError> {
        let state = self.state.read();
        if state.partial {
            return Err(LedgerError::ChainStateUnavailable(format!(
                "mirror holds {} blocks above height {:?}; earlier history is not mirrored",
                state.blocks.len(),
                state.anchor.map(|(_, h)| h)
            )));
        }
        Ok(state.blocks.clone())
    }

    fn mempool_transactions(&self) -> Result<Vec<Transaction>, LedgerError> {
        let state = self.state.read();
        let mut pending: Vec<&(u64, Transaction)> = state.mempool.values().collect();
        pending.sort_unstable_by_key(|(arrival, _)| *arrival);
        Ok(pending.into_iter().map(|(_, tx)| tx.clone()).collect())
    }
}
