//! Facts derived from the chain and persisted by the committer.

use crate::{Point, UtxoId};
use alloy_primitives::B256;
use derive_more::Constructor;

/// A block header reference as stored in the index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Constructor)]
pub struct BlockRef {
    /// Block slot.
    pub slot: u64,
    /// Block hash.
    pub hash: B256,
    /// Block height.
    pub height: u64,
}

impl BlockRef {
    /// Returns the chain point of this block.
    pub const fn point(&self) -> Point {
        Point::new(self.slot, self.hash)
    }
}

impl std::fmt::Display for BlockRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "BlockRef {{ slot: {}, height: {}, hash: {} }}", self.slot, self.height, self.hash)
    }
}

/// A transaction included in a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Constructor)]
pub struct TransactionEntry {
    /// Transaction hash.
    pub tx_hash: B256,
    /// Slot of the including block.
    pub slot: u64,
    /// Position of the transaction within its block.
    pub tx_index: u32,
}

/// The first observed appearance of an address.
#[derive(Debug, Clone, PartialEq, Eq, Constructor)]
pub struct AddressEntry {
    /// Raw address bytes.
    pub address: Vec<u8>,
    /// Slot of the first block the address was seen in.
    pub first_slot: u64,
}

/// A produced transaction output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputEntry {
    /// Output identifier.
    pub utxo_id: UtxoId,
    /// Slot of the producing block.
    pub slot: u64,
    /// Bech32 address text.
    pub address: String,
    /// Payment credential taken from the address.
    pub payment_credential: Vec<u8>,
    /// JSON rendering of the output as received, with any witness datum resolved.
    pub payload: String,
}

/// The consumption of an output at a given slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Constructor)]
pub struct SpendEntry {
    /// The consumed output.
    pub utxo_id: UtxoId,
    /// Slot of the consuming block.
    pub spend_slot: u64,
}

/// The five fact categories committed together by one flush.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FactBatch {
    /// Blocks, in arrival order.
    pub blocks: Vec<BlockRef>,
    /// Transactions, in arrival order.
    pub transactions: Vec<TransactionEntry>,
    /// Address appearances, duplicates included.
    pub addresses: Vec<AddressEntry>,
    /// Produced outputs.
    pub outputs: Vec<OutputEntry>,
    /// Consumed outputs.
    pub spends: Vec<SpendEntry>,
}

impl FactBatch {
    /// Size of the largest of the five collections.
    pub fn largest_len(&self) -> usize {
        [
            self.blocks.len(),
            self.transactions.len(),
            self.addresses.len(),
            self.outputs.len(),
            self.spends.len(),
        ]
        .into_iter()
        .max()
        .unwrap_or_default()
    }

    /// Returns `true` when no facts are held.
    pub fn is_empty(&self) -> bool {
        self.largest_len() == 0
    }

    /// The most recently appended block.
    pub fn latest_block(&self) -> Option<&BlockRef> {
        self.blocks.last()
    }

    /// Drops every held fact.
    pub fn clear(&mut self) {
        self.blocks.clear();
        self.transactions.clear();
        self.addresses.clear();
        self.outputs.clear();
        self.spends.clear();
    }
}
