//! Block and transaction shapes delivered by the chain-sync event source.

use crate::{HexHash, UtxoId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Ledger era of a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Era {
    /// Pre-Shelley era. Its address format is not indexed.
    Byron,
    /// Shelley era.
    Shelley,
    /// Allegra era.
    Allegra,
    /// Mary era.
    Mary,
    /// Alonzo era.
    Alonzo,
    /// Babbage era.
    Babbage,
    /// Conway era.
    Conway,
    /// Any era introduced after this crate was written.
    #[serde(other)]
    Unknown,
}

impl Era {
    /// Returns `true` for eras whose outputs use the credential-bearing address format.
    pub const fn has_shelley_addresses(&self) -> bool {
        !matches!(self, Self::Byron)
    }
}

/// A block as received from the event source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    /// Ledger era of the block.
    pub era: Era,
    /// Block hash.
    pub id: HexHash,
    /// Block height.
    pub height: u64,
    /// Block slot. Epoch boundary blocks carry none.
    #[serde(default)]
    pub slot: u64,
    /// Transactions in block order.
    #[serde(default)]
    pub transactions: Vec<Transaction>,
}

impl Block {
    /// Returns the references of every output consumed by this block, in block order.
    pub fn spent_references(&self) -> impl Iterator<Item = UtxoId> + '_ {
        self.transactions.iter().flat_map(|tx| tx.inputs.iter().map(OutputReference::utxo_id))
    }
}

/// A transaction as received from the event source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Transaction hash.
    pub id: HexHash,
    /// Outputs consumed by this transaction.
    #[serde(default)]
    pub inputs: Vec<OutputReference>,
    /// Outputs produced by this transaction.
    #[serde(default)]
    pub outputs: Vec<TransactionOutput>,
    /// Datums attached to the witness set, keyed by datum hash.
    #[serde(default)]
    pub datums: BTreeMap<String, String>,
}

/// The transaction part of an [`OutputReference`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionId {
    /// Transaction hash.
    pub id: HexHash,
}

/// A reference to an output of a previous transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputReference {
    /// The producing transaction.
    pub transaction: TransactionId,
    /// Position of the output within the producing transaction.
    pub index: u32,
}

impl OutputReference {
    /// Returns the [`UtxoId`] this reference points at.
    pub const fn utxo_id(&self) -> UtxoId {
        UtxoId::new(self.transaction.id.0, self.index)
    }
}

/// A transaction output as received from the event source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionOutput {
    /// Bech32 (Shelley) or base58 (Byron) address.
    pub address: String,
    /// Lovelace and native assets, kept verbatim.
    pub value: serde_json::Value,
    /// Hash of a datum stored in the witness set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub datum_hash: Option<String>,
    /// Inline datum, or the datum resolved from the witness set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub datum: Option<String>,
    /// Reference script, kept verbatim.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub script: Option<serde_json::Value>,
}
