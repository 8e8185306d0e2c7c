//! Turns chain-sync blocks into index facts.

use crate::{SyncMode, config::RepairConfig};
use alloy_primitives::hex;
use serde_json::{Map, Value, json};
use thiserror::Error;
use tracing::trace;
use utxodex_types::{
    AddressEntry, AddressError, Block, BlockRef, Era, FactBatch, OutputEntry, ShelleyAddress,
    SpendEntry, Transaction, TransactionEntry, TransactionOutput, UtxoId,
};

/// Errors raised while decoding a block. These are never retried.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// An output carries a Shelley prefix but is not a valid Shelley address.
    #[error("invalid address in output {utxo_id}: {source}")]
    Address {
        /// The output holding the address.
        utxo_id: UtxoId,
        /// Why decoding failed.
        source: AddressError,
    },

    /// An output could not be re-encoded as a payload.
    #[error("failed to encode payload of output {utxo_id}: {source}")]
    Payload {
        /// The output being encoded.
        utxo_id: UtxoId,
        /// The encoder error.
        source: serde_json::Error,
    },
}

impl PartialEq for DecodeError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (
                Self::Address { utxo_id: a, source: a_source },
                Self::Address { utxo_id: b, source: b_source },
            ) => a == b && a_source == b_source,
            (
                Self::Payload { utxo_id: a, source: a_source },
                Self::Payload { utxo_id: b, source: b_source },
            ) => a == b && a_source.to_string() == b_source.to_string(),
            _ => false,
        }
    }
}

impl Eq for DecodeError {}

/// Why a block produced no facts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Byron blocks carry no credential-bearing addresses.
    Byron,
    /// The block is already indexed and is not one of the missing heights.
    AlreadyIndexed,
}

/// The facts of one block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedBlock {
    /// The block itself.
    pub block: BlockRef,
    /// Everything derived from the block, the block entry included.
    pub facts: FactBatch,
}

impl DecodedBlock {
    /// Ids of the outputs produced by the block.
    pub fn produced(&self) -> impl Iterator<Item = UtxoId> + '_ {
        self.facts.outputs.iter().map(|output| output.utxo_id)
    }
}

/// Decodes chain-sync blocks into [`FactBatch`]es.
#[derive(Debug, Default, Clone, Copy)]
pub struct BlockDecoder;

impl BlockDecoder {
    /// Returns why `block` must not be indexed, if it must not.
    pub fn skip_reason(
        &self,
        block: &Block,
        mode: &SyncMode,
        repair: &RepairConfig,
    ) -> Option<SkipReason> {
        if matches!(block.era, Era::Byron) {
            return Some(SkipReason::Byron);
        }

        match mode.original_intersect_slot() {
            Some(original) if block.slot <= original && !repair.is_missing(block.height) => {
                Some(SkipReason::AlreadyIndexed)
            }
            _ => None,
        }
    }

    /// Derives the block, transaction, address, output and spend facts of `block`.
    pub fn decode(&self, block: &Block) -> Result<DecodedBlock, DecodeError> {
        let block_ref = BlockRef::new(block.slot, block.id.0, block.height);
        let mut facts = FactBatch::default();
        facts.blocks.push(block_ref);

        for (tx_index, tx) in (0u32..).zip(&block.transactions) {
            facts.transactions.push(TransactionEntry::new(tx.id.0, block.slot, tx_index));

            for (index, output) in (0u32..).zip(&tx.outputs) {
                // Byron addresses keep their position but are not indexed.
                if !ShelleyAddress::is_shelley(&output.address) {
                    continue;
                }
                let utxo_id = UtxoId::new(tx.id.0, index);
                let address = ShelleyAddress::from_bech32(&output.address)
                    .map_err(|source| DecodeError::Address { utxo_id, source })?;

                facts.outputs.push(OutputEntry {
                    utxo_id,
                    slot: block.slot,
                    address: output.address.clone(),
                    payment_credential: address.payment_credential().to_vec(),
                    payload: output_payload(tx, index, output)
                        .map_err(|source| DecodeError::Payload { utxo_id, source })?,
                });
                facts.addresses.push(AddressEntry::new(address.into_bytes(), block.slot));
            }

            facts.spends.extend(tx.inputs.iter().map(|input| SpendEntry {
                utxo_id: input.utxo_id(),
                spend_slot: block.slot,
            }));
        }

        trace!(
            target: "utxodex::decoder",
            block = %block_ref,
            transactions = facts.transactions.len(),
            outputs = facts.outputs.len(),
            spends = facts.spends.len(),
            "Decoded block"
        );
        Ok(DecodedBlock { block: block_ref, facts })
    }
}

/// Encodes the stored payload of an output: the output as received, its reference, and its
/// datum resolved from the witness set when only the hash is inline.
fn output_payload(
    tx: &Transaction,
    index: u32,
    output: &TransactionOutput,
) -> Result<String, serde_json::Error> {
    let mut payload = match serde_json::to_value(output)? {
        Value::Object(map) => map,
        _ => Map::new(),
    };
    payload.insert("transaction".to_string(), json!({ "id": hex::encode(tx.id.0) }));
    payload.insert("index".to_string(), json!(index));

    let datum = output
        .datum
        .as_ref()
        .or_else(|| output.datum_hash.as_ref().and_then(|hash| tx.datums.get(hash)));
    if let Some(datum) = datum {
        payload.insert("datum".to_string(), Value::String(datum.clone()));
    }

    serde_json::to_string(&payload)
}
