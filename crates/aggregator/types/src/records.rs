//! Rows returned by index read queries.

use crate::UtxoId;
use alloy_primitives::B256;

/// A stored transaction together with its including block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionRecord {
    /// Transaction hash.
    pub tx_hash: B256,
    /// Slot of the including block.
    pub slot: u64,
    /// Position within the including block.
    pub tx_index: u32,
    /// Height of the including block.
    pub block_height: u64,
    /// Hash of the including block.
    pub block_hash: B256,
}

/// A stored transaction output.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputRecord {
    /// Output identifier.
    pub utxo_id: UtxoId,
    /// Slot of the producing block.
    pub slot: u64,
    /// Slot of the consuming block, `None` while unspent.
    pub spend_slot: Option<u64>,
    /// Bech32 address text.
    pub address: String,
    /// Payment credential taken from the address.
    pub payment_credential: Vec<u8>,
    /// The output as received from the event source.
    pub payload: serde_json::Value,
    /// Position of the producing transaction within its block, when requested.
    pub tx_index: Option<u32>,
}
