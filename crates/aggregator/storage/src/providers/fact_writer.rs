use crate::{CommitOptions, CommitStats, StorageError};
use derive_more::Constructor;
use rusqlite::{Connection, params};
use tracing::trace;
use utxodex_types::{
    AddressEntry, BlockRef, FactBatch, OutputEntry, SpendEntry, TransactionEntry, UtxoId,
};

const INSERT_BLOCK: &str =
    "INSERT INTO block (slot, hash, height) VALUES (?1, ?2, ?3) ON CONFLICT DO NOTHING";
const INSERT_TX: &str =
    "INSERT INTO tx (tx_hash, slot, tx_index) VALUES (?1, ?2, ?3) ON CONFLICT DO NOTHING";
const INSERT_ADDRESS: &str =
    "INSERT INTO address (address, first_slot) VALUES (?1, ?2) ON CONFLICT DO NOTHING";
const INSERT_OUTPUT: &str = "INSERT INTO transaction_output \
     (utxo_id, tx_hash, slot, spend_slot, address, payment_credential, payload) \
     VALUES (?1, ?2, ?3, NULL, ?4, ?5, ?6) ON CONFLICT DO NOTHING";
const UPDATE_SPEND: &str = "UPDATE transaction_output SET spend_slot = ?2 WHERE utxo_id = ?1";
const DELETE_SPENT_BEFORE: &str = "DELETE FROM transaction_output WHERE spend_slot < ?1";

/// Applies a [`FactBatch`] to the index tables.
#[derive(Debug, Constructor)]
pub(crate) struct FactWriter<'conn> {
    conn: &'conn Connection,
}

impl FactWriter<'_> {
    /// Writes all five categories in dependency order, then prunes if requested.
    ///
    /// Outputs must land before spends since a batch may both produce and consume the
    /// same output.
    pub(crate) fn write(
        &self,
        batch: &FactBatch,
        options: CommitOptions,
    ) -> Result<CommitStats, StorageError> {
        let mut stats = CommitStats {
            blocks: self.insert_blocks(&batch.blocks)?,
            transactions: self.insert_transactions(&batch.transactions)?,
            new_addresses: self.insert_addresses(&batch.addresses)?,
            outputs: self.insert_outputs(&batch.outputs)?,
            spent_outputs: self.apply_spends(&batch.spends)?,
            pruned_outputs: 0,
        };

        if let Some(slot) = options.prune_spent_before {
            stats.pruned_outputs = self.delete_spent_before(slot)?;
        }

        trace!(target: "utxodex::storage", ?stats, "Batch written");
        Ok(stats)
    }

    fn insert_blocks(&self, blocks: &[BlockRef]) -> Result<usize, StorageError> {
        let mut stmt = self.conn.prepare_cached(INSERT_BLOCK)?;
        let mut written = 0;
        for block in blocks {
            written += stmt.execute(params![block.slot, block.hash.as_slice(), block.height])?;
        }
        Ok(written)
    }

    fn insert_transactions(&self, txs: &[TransactionEntry]) -> Result<usize, StorageError> {
        let mut stmt = self.conn.prepare_cached(INSERT_TX)?;
        let mut written = 0;
        for tx in txs {
            written += stmt.execute(params![tx.tx_hash.as_slice(), tx.slot, tx.tx_index])?;
        }
        Ok(written)
    }

    fn insert_addresses(&self, addresses: &[AddressEntry]) -> Result<usize, StorageError> {
        let mut stmt = self.conn.prepare_cached(INSERT_ADDRESS)?;
        let mut written = 0;
        for entry in addresses {
            written += stmt.execute(params![entry.address, entry.first_slot])?;
        }
        Ok(written)
    }

    fn insert_outputs(&self, outputs: &[OutputEntry]) -> Result<usize, StorageError> {
        let mut stmt = self.conn.prepare_cached(INSERT_OUTPUT)?;
        let mut written = 0;
        for output in outputs {
            written += stmt.execute(params![
                output.utxo_id.to_string(),
                output.utxo_id.tx_hash.as_slice(),
                output.slot,
                output.address,
                output.payment_credential,
                output.payload,
            ])?;
        }
        Ok(written)
    }

    fn apply_spends(&self, spends: &[SpendEntry]) -> Result<usize, StorageError> {
        let mut stmt = self.conn.prepare_cached(UPDATE_SPEND)?;
        let mut updated = 0;
        for spend in spends {
            updated += stmt.execute(params![spend.utxo_id.to_string(), spend.spend_slot])?;
        }
        Ok(updated)
    }

    pub(crate) fn mark_spent(
        &self,
        utxo_ids: &[UtxoId],
        spend_slot: u64,
    ) -> Result<usize, StorageError> {
        let mut stmt = self.conn.prepare_cached(UPDATE_SPEND)?;
        let mut updated = 0;
        for utxo_id in utxo_ids {
            updated += stmt.execute(params![utxo_id.to_string(), spend_slot])?;
        }
        Ok(updated)
    }

    fn delete_spent_before(&self, slot: u64) -> Result<usize, StorageError> {
        Ok(self.conn.execute(DELETE_SPENT_BEFORE, [slot])?)
    }
}
