//! # Wallet Ledger Service
//!
//! Applies chain and mempool events to the ledger and serves queries from
//! published snapshots.
//!
//! ## Write Path
//!
//! 1. Lock the stripes of every txid the event touches (ascending order).
//! 2. Decompose transactions outside the state lock.
//! 3. Take the state lock, mutate store and tracker.
//! 4. Verify invariants (optional), publish a snapshot, persist.
//!
//! ## Read Path
//!
//! Readers clone the published `Arc<LedgerSnapshot>`. Disconnects, reorgs
//! and rebuilds run inside an odd epoch; a reader that sees an odd epoch or
//! a snapshot from an older epoch retries, then falls back to the last
//! published snapshot. Readers never wait on the state lock.

use crate::config::LedgerConfig;
use crate::domain::invariants::check_store;
use crate::domain::{
    decompose, AppendOutcome, ConfirmationTracker, Decomposition, EntryField, EntryView,
    LedgerError, LedgerSnapshot, LedgerStats, LedgerStore, LedgerUpdate, ListRequest,
    TransactionView, TxRecord, TxStatus,
};
use crate::ports::inbound::WalletLedgerApi;
use crate::ports::outbound::{
    ChainStateProvider, LedgerPersistence, OwnershipProvider, PersistedLedger, TimeSource,
    PERSISTED_LEDGER_VERSION,
};
use parking_lot::{Mutex, MutexGuard, RwLock};
use shared_types::{Block, Transaction, TxId};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Mutable ledger state, guarded by one lock.
#[derive(Debug, Clone, Default)]
struct WriteState {
    store: LedgerStore,
    tracker: ConfirmationTracker,
}

#[derive(Debug, Default)]
struct Counters {
    events: AtomicU64,
    reorgs: AtomicU64,
    reconciliations: AtomicU64,
    snapshot_retries: AtomicU64,
    persistence_failures: AtomicU64,
}

type Decomposed = Vec<(TxId, Result<Decomposition, LedgerError>)>;

/// Wallet ledger service.
pub struct WalletLedgerService {
    config: LedgerConfig,
    ownership: Arc<dyn OwnershipProvider>,
    chain_state: Arc<dyn ChainStateProvider>,
    persistence: Arc<dyn LedgerPersistence>,
    clock: Arc<dyn TimeSource>,
    state: Mutex<WriteState>,
    send_origins: RwLock<HashMap<TxId, String>>,
    tx_locks: Vec<Mutex<()>>,
    published: RwLock<Arc<LedgerSnapshot>>,
    /// Odd while a disconnect, reorg or rebuild is in flight.
    epoch: AtomicU64,
    counters: Counters,
}

impl WalletLedgerService {
    /// Create the service, restoring persisted state if there is any.
    pub fn new(
        config: LedgerConfig,
        ownership: Arc<dyn OwnershipProvider>,
        chain_state: Arc<dyn ChainStateProvider>,
        persistence: Arc<dyn LedgerPersistence>,
        clock: Arc<dyn TimeSource>,
    ) -> Result<Self, LedgerError> {
        let stripes = config.lock_stripes.max(1);
        let service = Self {
            config,
            ownership,
            chain_state,
            persistence,
            clock,
            state: Mutex::new(WriteState::default()),
            send_origins: RwLock::new(HashMap::new()),
            tx_locks: (0..stripes).map(|_| Mutex::new(())).collect(),
            published: RwLock::new(Arc::new(LedgerSnapshot::default())),
            epoch: AtomicU64::new(0),
            counters: Counters::default(),
        };

        if let Some(saved) = service.persistence.load()? {
            service.restore(saved)?;
        }
        Ok(service)
    }

    fn restore(&self, saved: PersistedLedger) -> Result<(), LedgerError> {
        if saved.version != PERSISTED_LEDGER_VERSION {
            return Err(LedgerError::Persistence(format!(
                "unsupported snapshot version {}",
                saved.version
            )));
        }

        let mut state = self.state.lock();
        let mut store = LedgerStore::new();
        for record in saved.records {
            store.insert_record(record);
        }
        store.reserve_sequence(saved.next_sequence);
        for txid in saved.halted {
            store.halt(txid);
        }
        state.store = store;
        state.tracker = saved.tracker;
        *self.send_origins.write() = saved.send_origins.into_iter().collect();

        if let Err(e) = check_store(&state.store, &state.tracker) {
            self.recover(&mut state, e);
        }
        info!(
            transactions = state.store.transaction_count(),
            entries = state.store.entry_count(),
            tip_height = ?state.tracker.tip_height(),
            "[wallet-ledger] Restored ledger from snapshot"
        );
        self.publish(&state);
        Ok(())
    }

    // ------------------------------------------------------------------
    // Locking
    // ------------------------------------------------------------------

    fn stripe_of(&self, txid: &TxId) -> usize {
        let mut prefix = [0u8; 8];
        prefix.copy_from_slice(&txid[..8]);
        (u64::from_le_bytes(prefix) % self.tx_locks.len() as u64) as usize
    }

    /// Lock the stripes of `txids` in ascending stripe order.
    fn lock_txids<'a, I>(&self, txids: I) -> Vec<MutexGuard<'_, ()>>
    where
        I: IntoIterator<Item = &'a TxId>,
    {
        let mut stripes: Vec<usize> = txids.into_iter().map(|t| self.stripe_of(t)).collect();
        stripes.sort_unstable();
        stripes.dedup();
        stripes.into_iter().map(|i| self.tx_locks[i].lock()).collect()
    }

    /// Run `f` inside an odd epoch.
    fn with_rewrite<T>(&self, f: impl FnOnce() -> T) -> T {
        self.epoch.fetch_add(1, Ordering::SeqCst);
        let out = f();
        self.epoch.fetch_add(1, Ordering::SeqCst);
        out
    }

    // ------------------------------------------------------------------
    // Decomposition (outside the state lock)
    // ------------------------------------------------------------------

    fn decompose_tx(&self, tx: &Transaction, txid: TxId) -> Result<Decomposition, LedgerError> {
        let origin = self.send_origins.read().get(&txid).cloned();
        decompose(tx, txid, |a| self.ownership.owner_of(a), origin.as_deref())
    }

    fn decompose_block(&self, block: &Block) -> Decomposed {
        block
            .transactions
            .iter()
            .map(|tx| {
                let txid = tx.txid();
                (txid, self.decompose_tx(tx, txid))
            })
            .collect()
    }

    // ------------------------------------------------------------------
    // State mutation (state lock held)
    // ------------------------------------------------------------------

    fn halt(
        &self,
        state: &mut WriteState,
        txid: TxId,
        cause: &LedgerError,
        update: &mut LedgerUpdate,
    ) {
        if state.store.halt(txid) {
            warn!(
                txid = %hex::encode(txid),
                error = %cause,
                "[wallet-ledger] Halting writes for transaction"
            );
            update.halted.push(txid);
        }
    }

    /// Append rows; halted txids are skipped. Returns whether rows changed.
    fn append_rows(
        &self,
        state: &mut WriteState,
        txid: TxId,
        decomposition: Decomposition,
    ) -> Result<bool, LedgerError> {
        match state.store.append(decomposition.entries, self.clock.now()) {
            Ok(outcome) => Ok(outcome != AppendOutcome::Unchanged),
            Err(LedgerError::WritesHalted { .. }) => {
                debug!(txid = %hex::encode(txid), "[wallet-ledger] Skipping halted transaction");
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    fn apply_mempool_rows(
        &self,
        state: &mut WriteState,
        txid: TxId,
        decomposition: Decomposition,
        mut update: LedgerUpdate,
    ) -> Result<LedgerUpdate, LedgerError> {
        self.append_rows(state, txid, decomposition)?;
        self.sync_status(state, &txid)?;
        Self::note_recorded(state, txid, &mut update);
        Ok(update)
    }

    /// Copy the tracker's view of `txid` onto its record.
    fn sync_status(&self, state: &mut WriteState, txid: &TxId) -> Result<bool, LedgerError> {
        if !state.store.contains(txid) {
            return Ok(false);
        }
        let (status, in_mempool) = state
            .tracker
            .get(txid)
            .map_or((TxStatus::Unconfirmed, false), |t| (t.status, t.in_mempool));
        let confirmations = state.tracker.confirmations(txid);
        state.store.set_status(txid, status, in_mempool, confirmations)
    }

    fn note_recorded(state: &WriteState, txid: TxId, update: &mut LedgerUpdate) {
        let Some(record) = state.store.get(&txid) else {
            return;
        };
        let row = (txid, record.entries.len(), record.confirmations);
        match update.recorded.iter_mut().find(|(t, _, _)| *t == txid) {
            Some(existing) => *existing = row,
            None => update.recorded.push(row),
        }
    }

    /// Bring every confirmed record's depth in line with the tip.
    fn refresh_confirmations(state: &mut WriteState) -> Result<(), LedgerError> {
        let confirmed: Vec<TxId> = state
            .store
            .records()
            .filter(|r| r.status.is_confirmed())
            .map(|r| r.txid)
            .collect();
        for txid in confirmed {
            let n = state.tracker.confirmations(&txid);
            state.store.update_confirmations(&txid, n)?;
        }
        Ok(())
    }

    fn connect_locked(
        &self,
        state: &mut WriteState,
        block: &Block,
        decomposed: Decomposed,
        update: &mut LedgerUpdate,
    ) -> Result<(), LedgerError> {
        let mut wallet_txids = Vec::new();
        let mut rows = Vec::new();
        for (txid, result) in decomposed {
            match result {
                Ok(d) if d.is_relevant() => {
                    wallet_txids.push(txid);
                    rows.push((txid, d));
                }
                Ok(_) if state.store.contains(&txid) => wallet_txids.push(txid),
                Ok(_) => {}
                Err(e) if e.halts_transaction() => self.halt(state, txid, &e, update),
                Err(e) => return Err(e),
            }
        }

        let hash = block.hash();
        state.tracker.connect_block(
            hash,
            block.header.parent_hash,
            block.height(),
            &wallet_txids,
        )?;

        for (txid, decomposition) in rows {
            self.append_rows(state, txid, decomposition)?;
        }
        for txid in wallet_txids {
            if self.sync_status(state, &txid)? {
                Self::note_recorded(state, txid, update);
            }
        }
        Self::refresh_confirmations(state)?;

        debug!(
            height = block.height(),
            hash = %hex::encode(&hash[..8]),
            wallet_txs = update.recorded.len(),
            "[wallet-ledger] Block connected"
        );
        Ok(())
    }

    /// Remove the tip block; returns the wallet txids it confirmed.
    fn disconnect_locked(
        &self,
        state: &mut WriteState,
        block: &Block,
        update: &mut LedgerUpdate,
    ) -> Result<Vec<TxId>, LedgerError> {
        let reverted = state.tracker.disconnect_block(&block.hash())?;
        for txid in &reverted {
            if self.sync_status(state, txid)? {
                Self::note_recorded(state, *txid, update);
            }
        }
        Self::refresh_confirmations(state)?;
        Ok(reverted)
    }

    /// Retract reverted transactions that were not re-included and are not
    /// waiting in the mempool; the rest stay at zero confirmations. If the
    /// mempool cannot be read, every reverted transaction is kept with its
    /// mempool flag unset.
    fn settle_reverted(
        &self,
        state: &mut WriteState,
        reverted: Vec<TxId>,
        update: &mut LedgerUpdate,
    ) -> Result<(), LedgerError> {
        let pending: Vec<TxId> = reverted
            .into_iter()
            .filter(|t| state.tracker.get(t).is_some_and(|s| !s.status.is_confirmed()))
            .collect();
        if pending.is_empty() {
            return Ok(());
        }

        let in_mempool: HashSet<TxId> = match self.chain_state.mempool_transactions() {
            Ok(txs) => txs.iter().map(Transaction::txid).collect(),
            Err(e) => {
                warn!(
                    error = %e,
                    pending = pending.len(),
                    "[wallet-ledger] Mempool unavailable, keeping reverted transactions unconfirmed"
                );
                return Ok(());
            }
        };

        for txid in pending {
            if in_mempool.contains(&txid) {
                state.tracker.mark_in_mempool(txid);
                if self.sync_status(state, &txid)? {
                    Self::note_recorded(state, txid, update);
                }
            } else if state.store.retract(&txid).is_some() {
                state.tracker.forget(&txid);
                update.recorded.retain(|(t, _, _)| *t != txid);
                update.retracted.push(txid);
                info!(txid = %hex::encode(txid), "[wallet-ledger] Retracted orphaned transaction");
            } else {
                state.tracker.forget(&txid);
            }
        }
        Ok(())
    }

    /// Rebuild store and tracker from the chain-state provider.
    ///
    /// Surviving transactions keep their observation sequence and receive
    /// time. All halts are cleared.
    fn rebuild(
        &self,
        state: &mut WriteState,
        update: &mut LedgerUpdate,
    ) -> Result<(), LedgerError> {
        let chain = self.chain_state.best_chain()?;
        let mempool = self.chain_state.mempool_transactions()?;

        let mut fresh = WriteState::default();
        fresh.store.reserve_sequence(state.store.next_sequence());
        let now = self.clock.now();

        let place = |fresh: &mut WriteState,
                     tx: &Transaction,
                     update: &mut LedgerUpdate|
              -> Result<Option<TxId>, LedgerError> {
            let txid = tx.txid();
            match self.decompose_tx(tx, txid) {
                Ok(d) if d.is_relevant() => {
                    match state.store.get(&txid) {
                        Some(old) => fresh.store.insert_record(TxRecord {
                            entries: d.entries,
                            ..old.clone()
                        }),
                        None => {
                            fresh.store.append(d.entries, now)?;
                        }
                    }
                    Ok(Some(txid))
                }
                Ok(_) => Ok(None),
                Err(e) if e.halts_transaction() => {
                    self.halt(fresh, txid, &e, update);
                    Ok(None)
                }
                Err(e) => Err(e),
            }
        };

        for block in &chain {
            let mut wallet_txids = Vec::new();
            for tx in &block.transactions {
                if let Some(txid) = place(&mut fresh, tx, update)? {
                    wallet_txids.push(txid);
                }
            }
            fresh.tracker.connect_block(
                block.hash(),
                block.header.parent_hash,
                block.height(),
                &wallet_txids,
            )?;
        }
        for tx in &mempool {
            if let Some(txid) = place(&mut fresh, tx, update)? {
                fresh.tracker.mark_in_mempool(txid);
            }
        }

        let txids: Vec<TxId> = fresh.store.records().map(|r| r.txid).collect();
        for txid in &txids {
            self.sync_status(&mut fresh, txid)?;
        }

        let dropped: Vec<TxId> = state
            .store
            .records()
            .map(|r| r.txid)
            .filter(|t| !fresh.store.contains(t))
            .collect();

        info!(
            transactions = fresh.store.transaction_count(),
            dropped = dropped.len(),
            tip_height = ?fresh.tracker.tip_height(),
            "[wallet-ledger] Ledger rebuilt from chain state"
        );

        *state = fresh;
        update.retracted.extend(dropped);
        update.recorded.clear();
        for txid in txids {
            Self::note_recorded(state, txid, update);
        }
        update.reconciled = true;
        self.counters.reconciliations.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    /// Log an inconsistency and rebuild; returns the original error.
    fn recover(&self, state: &mut WriteState, err: LedgerError) -> LedgerError {
        error!(error = %err, "[wallet-ledger] Inconsistent ledger state, rebuilding");
        let mut update = LedgerUpdate::default();
        if let Err(rebuild_err) = self.with_rewrite(|| self.rebuild(state, &mut update)) {
            error!(error = %rebuild_err, "[wallet-ledger] Rebuild failed, keeping current state");
        }
        err
    }

    /// Verify, publish and persist after an event.
    fn finish(
        &self,
        state: &mut WriteState,
        result: Result<LedgerUpdate, LedgerError>,
    ) -> Result<LedgerUpdate, LedgerError> {
        self.counters.events.fetch_add(1, Ordering::Relaxed);

        let result = result.and_then(|update| {
            if self.config.verify_invariants {
                check_store(&state.store, &state.tracker)?;
            }
            Ok(update)
        });
        let result = match result {
            Err(e) if e.requires_reconcile() => Err(self.recover(state, e)),
            other => other,
        };

        self.publish(state);
        self.persist(state);
        result
    }

    fn publish(&self, state: &WriteState) {
        let snapshot = LedgerSnapshot::new(
            state.store.clone(),
            state.tracker.tip(),
            self.epoch.load(Ordering::SeqCst),
        );
        *self.published.write() = Arc::new(snapshot);
    }

    fn persist(&self, state: &WriteState) {
        let ledger = PersistedLedger {
            version: PERSISTED_LEDGER_VERSION,
            records: state.store.records().cloned().collect(),
            tracker: state.tracker.clone(),
            send_origins: self
                .send_origins
                .read()
                .iter()
                .map(|(t, a)| (*t, a.clone()))
                .collect(),
            halted: state.store.halted().copied().collect(),
            next_sequence: state.store.next_sequence(),
        };
        if let Err(e) = self.persistence.save(&ledger) {
            self.counters
                .persistence_failures
                .fetch_add(1, Ordering::Relaxed);
            warn!(error = %e, "[wallet-ledger] Failed to persist ledger snapshot");
        }
    }

    // ------------------------------------------------------------------
    // Read path
    // ------------------------------------------------------------------

    fn try_snapshot(&self) -> Result<Arc<LedgerSnapshot>, LedgerError> {
        let before = self.epoch.load(Ordering::SeqCst);
        let snapshot = Arc::clone(&self.published.read());
        if before % 2 == 1 || snapshot.epoch() != before {
            return Err(LedgerError::ReorgRaceDetected { epoch: before });
        }
        Ok(snapshot)
    }

    fn read_snapshot(&self) -> Arc<LedgerSnapshot> {
        let mut attempts = 0;
        loop {
            match self.try_snapshot() {
                Ok(snapshot) => return snapshot,
                Err(LedgerError::ReorgRaceDetected { epoch })
                    if attempts < self.config.max_snapshot_retries =>
                {
                    attempts += 1;
                    self.counters.snapshot_retries.fetch_add(1, Ordering::Relaxed);
                    debug!(epoch, attempts, "[wallet-ledger] Snapshot raced a reorg, retrying");
                    std::thread::yield_now();
                }
                Err(_) => return Arc::clone(&self.published.read()),
            }
        }
    }

    /// Block and mempool events applied so far.
    pub fn events_processed(&self) -> u64 {
        self.counters.events.load(Ordering::Relaxed)
    }
}

impl WalletLedgerApi for WalletLedgerService {
    fn on_block_connected(&self, block: &Block) -> Result<LedgerUpdate, LedgerError> {
        let txids: Vec<TxId> = block.transactions.iter().map(Transaction::txid).collect();
        let _guards = self.lock_txids(&txids);
        let decomposed = self.decompose_block(block);

        let mut state = self.state.lock();
        let mut update = LedgerUpdate::default();
        let result = self
            .connect_locked(&mut state, block, decomposed, &mut update)
            .map(|()| update);
        self.finish(&mut state, result)
    }

    fn on_block_disconnected(&self, block: &Block) -> Result<LedgerUpdate, LedgerError> {
        self.on_reorg(std::slice::from_ref(block), &[])
    }

    fn on_reorg(
        &self,
        disconnected: &[Block],
        connected: &[Block],
    ) -> Result<LedgerUpdate, LedgerError> {
        let txids: Vec<TxId> = disconnected
            .iter()
            .chain(connected)
            .flat_map(|b| b.transactions.iter().map(Transaction::txid))
            .collect();
        let _guards = self.lock_txids(&txids);
        let decomposed: Vec<Decomposed> = connected.iter().map(|b| self.decompose_block(b)).collect();

        let mut state = self.state.lock();
        self.counters.reorgs.fetch_add(1, Ordering::Relaxed);
        let mut update = LedgerUpdate::default();

        let result = self.with_rewrite(|| {
            let mut reverted = Vec::new();
            for block in disconnected {
                match self.disconnect_locked(&mut state, block, &mut update) {
                    Ok(txids) => reverted.extend(txids),
                    Err(LedgerError::UnknownBlock { block_hash }) => {
                        warn!(
                            block = %hex::encode(&block_hash[..8]),
                            "[wallet-ledger] Disconnect of unindexed block, rebuilding"
                        );
                        return self.rebuild(&mut state, &mut update);
                    }
                    Err(e) => return Err(e),
                }
            }
            for (block, rows) in connected.iter().zip(decomposed) {
                self.connect_locked(&mut state, block, rows, &mut update)?;
            }
            self.settle_reverted(&mut state, reverted, &mut update)
        });

        if let Some((hash, height)) = state.tracker.tip() {
            info!(
                disconnected = disconnected.len(),
                connected = connected.len(),
                tip_height = height,
                tip = %hex::encode(&hash[..8]),
                retracted = update.retracted.len(),
                "[wallet-ledger] Chain reorganized"
            );
        }
        self.finish(&mut state, result.map(|()| update))
    }

    fn on_mempool_transaction(&self, tx: &Transaction) -> Result<LedgerUpdate, LedgerError> {
        let txid = tx.txid();
        let _guard = self.lock_txids([&txid]);
        let decomposition = self.decompose_tx(tx, txid);

        let mut state = self.state.lock();
        let mut update = LedgerUpdate::default();
        let result = match decomposition {
            Ok(d) if d.is_relevant() => {
                if state.store.is_halted(&txid) {
                    debug!(txid = %hex::encode(txid), "[wallet-ledger] Skipping halted transaction");
                    return Ok(update);
                }
                state.tracker.mark_in_mempool(txid);
                self.apply_mempool_rows(&mut state, txid, d, update)
            }
            Ok(_) => return Ok(update),
            Err(e) if e.halts_transaction() => {
                self.halt(&mut state, txid, &e, &mut update);
                Ok(update)
            }
            Err(e) => Err(e),
        };
        self.finish(&mut state, result)
    }

    fn on_mempool_removed(&self, txid: &TxId) -> Result<LedgerUpdate, LedgerError> {
        let _guard = self.lock_txids([txid]);
        let mut state = self.state.lock();
        let mut update = LedgerUpdate::default();

        let Some(tracked) = state.tracker.mark_removed_from_mempool(txid) else {
            return Ok(update);
        };
        if tracked.status.is_confirmed() {
            if self.sync_status(&mut state, txid)? {
                Self::note_recorded(&state, *txid, &mut update);
            }
        } else {
            state.tracker.forget(txid);
            if state.store.retract(txid).is_some() {
                info!(txid = %hex::encode(txid), "[wallet-ledger] Retracted evicted transaction");
                update.retracted.push(*txid);
            }
        }
        self.finish(&mut state, Ok(update))
    }

    fn record_send_origin(&self, txid: TxId, account: &str) {
        debug!(txid = %hex::encode(txid), account, "[wallet-ledger] Recorded send origin");
        self.send_origins.write().insert(txid, account.to_string());

        let _guard = self.lock_txids([&txid]);
        let mut state = self.state.lock();
        match state.store.relabel_sends(&txid, account) {
            Ok(true) => {
                debug!(txid = %hex::encode(txid), "[wallet-ledger] Re-keyed stored send rows");
                self.publish(&state);
                self.persist(&state);
            }
            Ok(false) => {}
            Err(e) => {
                warn!(txid = %hex::encode(txid), error = %e, "[wallet-ledger] Failed to re-key send rows");
            }
        }
    }

    fn list_transactions(&self, request: &ListRequest) -> Result<Vec<EntryView>, LedgerError> {
        Ok(self.read_snapshot().list_transactions(request))
    }

    fn check_transactions(
        &self,
        to_match: &[EntryField],
        expected: &[EntryField],
    ) -> Result<Vec<EntryView>, LedgerError> {
        self.read_snapshot().check_transactions(to_match, expected)
    }

    fn get_transaction(&self, txid: &TxId) -> Result<TransactionView, LedgerError> {
        self.read_snapshot().get_transaction(txid)
    }

    fn snapshot(&self) -> Arc<LedgerSnapshot> {
        self.read_snapshot()
    }

    fn reconcile(&self) -> Result<LedgerUpdate, LedgerError> {
        let mut state = self.state.lock();
        let mut update = LedgerUpdate::default();
        let result = self.with_rewrite(|| self.rebuild(&mut state, &mut update));
        self.finish(&mut state, result.map(|()| update))
    }

    fn stats(&self) -> LedgerStats {
        let snapshot = self.read_snapshot();
        let store = snapshot.store();
        LedgerStats {
            transactions: store.transaction_count(),
            entries: store.entry_count(),
            accounts: store.accounts().count(),
            halted_transactions: store.halted().count(),
            tip_height: snapshot.tip().map(|(_, h)| h),
            tip_hash: snapshot.tip().map(|(h, _)| h),
            snapshot_epoch: snapshot.epoch(),
            events_processed: self.counters.events.load(Ordering::Relaxed),
            reorgs: self.counters.reorgs.load(Ordering::Relaxed),
            reconciliations: self.counters.reconciliations.load(Ordering::Relaxed),
            snapshot_retries: self.counters.snapshot_retries.load(Ordering::Relaxed),
            persistence_failures: self.counters.persistence_failures.load(Ordering::Relaxed),
        }
    }
}
