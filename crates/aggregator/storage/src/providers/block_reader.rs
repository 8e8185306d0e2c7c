use super::{block_from_row, column_utxo_id};
use crate::StorageError;
use derive_more::Constructor;
use rusqlite::{Connection, OptionalExtension};
use utxodex_types::{BlockRef, UtxoId};
#[cfg(any(test, feature = "test-utils"))]
use {
    super::{column_b256, column_u64},
    utxodex_types::TransactionEntry,
};

/// Block lookups used for resume points and gap repair.
#[derive(Debug, Constructor)]
pub(crate) struct BlockProvider<'conn> {
    conn: &'conn Connection,
}

impl BlockProvider<'_> {
    pub(crate) fn nth_latest(&self, offset: u64) -> Result<Option<BlockRef>, StorageError> {
        let mut stmt = self.conn.prepare_cached(
            "SELECT slot, hash, height FROM block ORDER BY slot DESC LIMIT 1 OFFSET ?1",
        )?;
        Ok(stmt.query_row([offset], block_from_row).optional()?)
    }

    pub(crate) fn latest_below_height(
        &self,
        height: u64,
    ) -> Result<Option<BlockRef>, StorageError> {
        let mut stmt = self.conn.prepare_cached(
            "SELECT slot, hash, height FROM block WHERE height < ?1 ORDER BY slot DESC LIMIT 1",
        )?;
        Ok(stmt.query_row([height], block_from_row).optional()?)
    }

    pub(crate) fn unspent_outputs_at_heights(
        &self,
        heights: &[u64],
    ) -> Result<Vec<UtxoId>, StorageError> {
        let mut stmt = self.conn.prepare_cached(
            "SELECT o.utxo_id FROM transaction_output o \
             JOIN block b ON b.slot = o.slot \
             WHERE b.height = ?1 AND o.spend_slot IS NULL",
        )?;

        let mut utxo_ids = Vec::new();
        for height in heights {
            let rows = stmt.query_map([height], |row| column_utxo_id(row, 0))?;
            for utxo_id in rows {
                utxo_ids.push(utxo_id?);
            }
        }
        Ok(utxo_ids)
    }

    #[cfg(any(test, feature = "test-utils"))]
    pub(crate) fn all_blocks(&self) -> Result<Vec<BlockRef>, StorageError> {
        let mut stmt = self.conn.prepare("SELECT slot, hash, height FROM block ORDER BY slot")?;
        let rows = stmt.query_map([], block_from_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    #[cfg(any(test, feature = "test-utils"))]
    pub(crate) fn all_transactions(&self) -> Result<Vec<TransactionEntry>, StorageError> {
        let mut stmt =
            self.conn.prepare("SELECT tx_hash, slot, tx_index FROM tx ORDER BY slot, tx_index")?;
        let rows = stmt.query_map([], |row| {
            Ok(TransactionEntry::new(column_b256(row, 0)?, column_u64(row, 1)?, row.get(2)?))
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }
}
