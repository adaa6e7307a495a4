//! # Core Domain Entities
//!
//! Chain entities as seen by the wallet: blocks on the best chain and
//! transactions whose inputs have been resolved against the outputs they
//! spend.

use crate::amount::Amount;
use crate::errors::{AmountError, IdentifierError};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

// =============================================================================
// IDENTIFIERS
// =============================================================================

/// A 32-byte SHA-256 hash.
pub type Hash = [u8; 32];

/// Transaction identifier.
pub type TxId = Hash;

/// Block identifier.
pub type BlockHash = Hash;

/// A 20-byte destination address.
pub type Address = [u8; 20];

/// Decode a 32-byte hash from 64 hex characters.
pub fn parse_hash(s: &str) -> Result<Hash, IdentifierError> {
    let bytes = hex::decode(s).map_err(|e| IdentifierError::InvalidHex(e.to_string()))?;
    let actual = bytes.len();
    bytes.try_into().map_err(|_| IdentifierError::InvalidLength {
        expected: 32,
        actual,
    })
}

/// Decode a 20-byte address from 40 hex characters.
pub fn parse_address(s: &str) -> Result<Address, IdentifierError> {
    let bytes = hex::decode(s).map_err(|e| IdentifierError::InvalidHex(e.to_string()))?;
    let actual = bytes.len();
    bytes.try_into().map_err(|_| IdentifierError::InvalidLength {
        expected: 20,
        actual,
    })
}

// =============================================================================
// TRANSACTIONS
// =============================================================================

/// Reference to an output of an earlier transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct OutPoint {
    pub txid: TxId,
    pub vout: u32,
}

/// A transaction input, resolved against the output it spends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxInput {
    /// The spent output.
    pub prevout: OutPoint,
    /// Address that owned the spent output (`None` for non-standard scripts).
    pub address: Option<Address>,
    /// Value of the spent output.
    pub value: Amount,
}

/// A transaction output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxOutput {
    /// Destination address (`None` for non-standard scripts).
    pub address: Option<Address>,
    pub value: Amount,
}

/// A transaction as delivered by the chain and mempool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub version: u16,
    pub inputs: Vec<TxInput>,
    pub outputs: Vec<TxOutput>,
    pub lock_time: u32,
    /// Block reward transaction; has no spent inputs.
    pub is_coinbase: bool,
}

impl Transaction {
    /// Compute the transaction id (SHA-256 over the canonical field encoding).
    #[must_use]
    pub fn txid(&self) -> TxId {
        let mut hasher = Sha256::new();
        hasher.update(self.version.to_le_bytes());
        hasher.update([u8::from(self.is_coinbase)]);
        hasher.update((self.inputs.len() as u64).to_le_bytes());
        for input in &self.inputs {
            hasher.update(input.prevout.txid);
            hasher.update(input.prevout.vout.to_le_bytes());
            hash_optional_address(&mut hasher, input.address.as_ref());
            hasher.update(input.value.base_units().to_le_bytes());
        }
        hasher.update((self.outputs.len() as u64).to_le_bytes());
        for output in &self.outputs {
            hash_optional_address(&mut hasher, output.address.as_ref());
            hasher.update(output.value.base_units().to_le_bytes());
        }
        hasher.update(self.lock_time.to_le_bytes());
        hasher.finalize().into()
    }

    /// Total value of all spent outputs.
    pub fn value_in(&self) -> Result<Amount, AmountError> {
        Amount::checked_sum(self.inputs.iter().map(|i| i.value))
    }

    /// Total value of all created outputs.
    pub fn value_out(&self) -> Result<Amount, AmountError> {
        Amount::checked_sum(self.outputs.iter().map(|o| o.value))
    }
}

fn hash_optional_address(hasher: &mut Sha256, address: Option<&Address>) {
    match address {
        Some(addr) => {
            hasher.update([1u8]);
            hasher.update(addr);
        }
        None => hasher.update([0u8]),
    }
}

// =============================================================================
// BLOCKS
// =============================================================================

/// The header of a block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct BlockHeader {
    /// Block height in the chain.
    pub height: u64,
    /// Hash of the parent block.
    pub parent_hash: BlockHash,
    /// Unix timestamp when the block was produced.
    pub timestamp: u64,
    /// Producer nonce; distinguishes competing blocks at one height.
    pub nonce: u64,
}

impl BlockHeader {
    #[must_use]
    pub fn hash(&self) -> BlockHash {
        let mut hasher = Sha256::new();
        hasher.update(self.height.to_le_bytes());
        hasher.update(self.parent_hash);
        hasher.update(self.timestamp.to_le_bytes());
        hasher.update(self.nonce.to_le_bytes());
        hasher.finalize().into()
    }
}

/// A block on (or formerly on) the best chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Block {
    pub header: BlockHeader,
    pub transactions: Vec<Transaction>,
}

impl Block {
    #[must_use]
    pub fn hash(&self) -> BlockHash {
        self.header.hash()
    }

    #[must_use]
    pub fn height(&self) -> u64 {
        self.header.height
    }
}
