//! # Simulated Wallet Network
//!
//! A single best chain and mempool shared by several wallet nodes. Each node
//! owns an address book, a UTXO set and a `WalletLedgerService`; every
//! chain or mempool change is delivered to every node's ledger, the way a
//! node's validation interface notifies its wallet.
//!
//! Fees are fixed at [`FEE`] and change goes to a fresh change address.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use shared_types::{
    Address, Amount, Block, BlockHeader, OutPoint, Transaction, TxId, TxInput, TxOutput,
};
use wallet_ledger::{
    ChainStateProvider, EntryField, EntryView, LedgerConfig, LedgerError, LedgerPersistence,
    NoPersistence, SharedAddressBook, SystemTimeSource, WalletLedgerApi, WalletLedgerService,
};

/// Fee paid by every wallet send.
pub const FEE: Amount = Amount::from_base_units(10_000);

/// Address that funds wallets; owned by nobody.
pub const FAUCET: Address = [0xfa; 20];

/// Parse a decimal coin amount.
pub fn coins(text: &str) -> Amount {
    text.parse().unwrap_or_else(|e| panic!("bad amount {text:?}: {e}"))
}

/// Chain and mempool shared by every node.
#[derive(Default)]
pub struct SharedChain {
    blocks: RwLock<Vec<Block>>,
    mempool: RwLock<Vec<Transaction>>,
}

impl SharedChain {
    pub fn tip(&self) -> Option<Block> {
        self.blocks.read().last().cloned()
    }

    pub fn height(&self) -> Option<u64> {
        self.blocks.read().last().map(Block::height)
    }
}

impl ChainStateProvider for SharedChain {
    fn best_chain(&self) -> Result<Vec<Block>, LedgerError> {
        Ok(self.blocks.read().clone())
    }

    fn mempool_transactions(&self) -> Result<Vec<Transaction>, LedgerError> {
        Ok(self.mempool.read().clone())
    }
}

#[derive(Debug, Clone)]
struct Coin {
    outpoint: OutPoint,
    address: Address,
    value: Amount,
}

/// One wallet node.
pub struct Node {
    pub id: u8,
    pub book: SharedAddressBook,
    pub ledger: Arc<WalletLedgerService>,
    coins: Mutex<Vec<Coin>>,
    next_key: Mutex<u32>,
}

impl Node {
    fn new(
        id: u8,
        chain: Arc<SharedChain>,
        persistence: Arc<dyn LedgerPersistence>,
        book: SharedAddressBook,
    ) -> Result<Self, LedgerError> {
        let ledger = WalletLedgerService::new(
            LedgerConfig::for_testing(),
            Arc::new(book.clone()),
            chain,
            persistence,
            Arc::new(SystemTimeSource),
        )?;
        let next_key = book.len() as u32;
        Ok(Self {
            id,
            book,
            ledger: Arc::new(ledger),
            coins: Mutex::new(Vec::new()),
            next_key: Mutex::new(next_key),
        })
    }

    fn derive_address(&self) -> Address {
        let mut next = self.next_key.lock();
        *next += 1;
        let mut address = [self.id.wrapping_add(1); 20];
        address[16..].copy_from_slice(&next.to_le_bytes());
        address
    }

    /// A fresh receiving address under `account`.
    pub fn get_new_address(&self, account: &str) -> Address {
        let address = self.derive_address();
        self.book
            .assign(address, account)
            .unwrap_or_else(|e| panic!("node {} cannot assign address: {e}", self.id));
        address
    }

    /// A fresh change address for the default account.
    pub fn get_change_address(&self) -> Address {
        let address = self.derive_address();
        self.book
            .assign_change(address, "")
            .unwrap_or_else(|e| panic!("node {} cannot assign change: {e}", self.id));
        address
    }

    /// Spendable balance tracked by the node's wallet.
    pub fn balance(&self) -> Amount {
        Amount::checked_sum(self.coins.lock().iter().map(|c| c.value)).unwrap_or(Amount::ZERO)
    }

    /// Two-phase ledger check against this node.
    pub fn check(
        &self,
        to_match: &[EntryField],
        expected: &[EntryField],
    ) -> Result<Vec<EntryView>, LedgerError> {
        self.ledger.check_transactions(to_match, expected)
    }

    fn observe(&self, tx: &Transaction) {
        let txid = tx.txid();
        let mut coins = self.coins.lock();
        coins.retain(|c| !tx.inputs.iter().any(|i| i.prevout == c.outpoint));
        for (vout, output) in tx.outputs.iter().enumerate() {
            let Some(address) = output.address else {
                continue;
            };
            if self.book.account_of(&address).is_some() {
                coins.push(Coin {
                    outpoint: OutPoint {
                        txid,
                        vout: vout as u32,
                    },
                    address,
                    value: output.value,
                });
            }
        }
    }

    fn select_coins(&self, target: Amount) -> (Vec<Coin>, Amount) {
        let coins = self.coins.lock();
        let mut picked = Vec::new();
        let mut total = Amount::ZERO;
        for coin in coins.iter() {
            if total >= target {
                break;
            }
            total = total.checked_add(coin.value).unwrap_or(total);
            picked.push(coin.clone());
        }
        assert!(
            total >= target,
            "node {} has {} but needs {}",
            self.id,
            total,
            target
        );
        (picked, total)
    }
}

/// Several wallet nodes on one chain.
pub struct Network {
    pub chain: Arc<SharedChain>,
    pub nodes: Vec<Node>,
    faucet_nonce: Mutex<u32>,
}

impl Network {
    /// `count` nodes with in-memory ledgers and a genesis block.
    pub fn new(count: u8) -> Self {
        let backends = (0..count)
            .map(|_| Arc::new(NoPersistence) as Arc<dyn LedgerPersistence>)
            .collect();
        Self::with_persistence(backends)
    }

    /// One node per persistence backend.
    pub fn with_persistence(backends: Vec<Arc<dyn LedgerPersistence>>) -> Self {
        let chain = Arc::new(SharedChain::default());
        let nodes = backends
            .into_iter()
            .enumerate()
            .map(|(id, persistence)| {
                Node::new(id as u8, chain.clone(), persistence, SharedAddressBook::new())
                    .unwrap_or_else(|e| panic!("node {id} failed to start: {e}"))
            })
            .collect();
        let network = Self {
            chain,
            nodes,
            faucet_nonce: Mutex::new(0),
        };
        network.generate(1);
        network
    }

    /// Restart node `index` with a new ledger over the same address book.
    pub fn restart(&mut self, index: usize, persistence: Arc<dyn LedgerPersistence>) {
        let old = &self.nodes[index];
        let coins = old.coins.lock().clone();
        let node = Node::new(old.id, self.chain.clone(), persistence, old.book.clone())
            .unwrap_or_else(|e| panic!("node {index} failed to restart: {e}"));
        *node.coins.lock() = coins;
        self.nodes[index] = node;
    }

    pub fn node(&self, index: usize) -> &Node {
        &self.nodes[index]
    }

    /// Pay `amount` from outside the network to `address`.
    pub fn fund(&self, address: Address, amount: Amount) -> TxId {
        let mut nonce = self.faucet_nonce.lock();
        *nonce += 1;
        let mut prev = [0xfa; 32];
        prev[..4].copy_from_slice(&nonce.to_le_bytes());
        drop(nonce);

        let tx = Transaction {
            version: 1,
            inputs: vec![TxInput {
                prevout: OutPoint { txid: prev, vout: 0 },
                address: Some(FAUCET),
                value: amount,
            }],
            outputs: vec![TxOutput {
                address: Some(address),
                value: amount,
            }],
            lock_time: 0,
            is_coinbase: false,
        };
        self.broadcast(&tx);
        tx.txid()
    }

    /// Announce a transaction to every node.
    pub fn broadcast(&self, tx: &Transaction) {
        let txid = tx.txid();
        {
            let mut mempool = self.chain.mempool.write();
            if !mempool.iter().any(|m| m.txid() == txid) {
                mempool.push(tx.clone());
            }
        }
        for node in &self.nodes {
            node.observe(tx);
            node.ledger
                .on_mempool_transaction(tx)
                .unwrap_or_else(|e| panic!("node {} rejected tx: {e}", node.id));
        }
    }

    /// Send `amount` from node `from` to `address`.
    pub fn send_to_address(&self, from: usize, address: Address, amount: Amount) -> TxId {
        self.send_many(from, "", &[(address, amount)])
    }

    /// Pay several destinations in one transaction from node `from`,
    /// attributing the send to `from_account`.
    pub fn send_many(&self, from: usize, from_account: &str, payments: &[(Address, Amount)]) -> TxId {
        let node = &self.nodes[from];
        let total = Amount::checked_sum(payments.iter().map(|(_, amount)| *amount))
            .and_then(|sum| sum.checked_add(FEE))
            .unwrap_or_else(|e| panic!("bad payment total: {e}"));
        let (picked, available) = node.select_coins(total);

        let mut outputs: Vec<TxOutput> = payments
            .iter()
            .map(|(address, value)| TxOutput {
                address: Some(*address),
                value: *value,
            })
            .collect();
        let change = available
            .checked_sub(total)
            .unwrap_or_else(|e| panic!("bad change: {e}"));
        if !change.is_zero() {
            outputs.push(TxOutput {
                address: Some(node.get_change_address()),
                value: change,
            });
        }

        let tx = Transaction {
            version: 1,
            inputs: picked
                .iter()
                .map(|coin| TxInput {
                    prevout: coin.outpoint,
                    address: Some(coin.address),
                    value: coin.value,
                })
                .collect(),
            outputs,
            lock_time: 0,
            is_coinbase: false,
        };
        let txid = tx.txid();
        node.ledger.record_send_origin(txid, from_account);
        self.broadcast(&tx);
        txid
    }

    /// Mine `count` blocks, the first one carrying the whole mempool.
    pub fn generate(&self, count: usize) -> Vec<Block> {
        let mut mined = Vec::with_capacity(count);
        for _ in 0..count {
            let transactions = std::mem::take(&mut *self.chain.mempool.write());
            let parent = self.chain.tip();
            let height = parent.as_ref().map_or(0, |p| p.height() + 1);
            let block = Block {
                header: BlockHeader {
                    height,
                    parent_hash: parent.as_ref().map_or([0; 32], Block::hash),
                    timestamp: 1_600_000_000 + height * 600,
                    nonce: 0,
                },
                transactions,
            };
            self.chain.blocks.write().push(block.clone());
            for node in &self.nodes {
                node.ledger
                    .on_block_connected(&block)
                    .unwrap_or_else(|e| panic!("node {} rejected block: {e}", node.id));
            }
            mined.push(block);
        }
        mined
    }

    /// Disconnect the tip. With `resurrect`, its transactions return to the
    /// mempool first.
    pub fn disconnect_tip(&self, resurrect: bool) -> Block {
        let block = self
            .chain
            .blocks
            .write()
            .pop()
            .unwrap_or_else(|| panic!("no block to disconnect"));
        if resurrect {
            self.chain
                .mempool
                .write()
                .extend(block.transactions.iter().filter(|tx| !tx.is_coinbase).cloned());
        }
        for node in &self.nodes {
            node.ledger
                .on_block_disconnected(&block)
                .unwrap_or_else(|e| panic!("node {} rejected disconnect: {e}", node.id));
        }
        block
    }

    /// Drop a transaction from the mempool without mining it.
    pub fn evict(&self, txid: &TxId) {
        self.chain.mempool.write().retain(|tx| tx.txid() != *txid);
        for node in &self.nodes {
            node.ledger
                .on_mempool_removed(txid)
                .unwrap_or_else(|e| panic!("node {} rejected eviction: {e}", node.id));
        }
    }

    /// Every node's rows for `txid`, keyed by node index.
    pub fn rows_for(&self, txid: &TxId) -> HashMap<usize, Vec<EntryView>> {
        self.nodes
            .iter()
            .enumerate()
            .filter_map(|(i, node)| {
                node.check(&[EntryField::Txid(*txid)], &[])
                    .ok()
                    .map(|rows| (i, rows))
            })
            .collect()
    }
}
