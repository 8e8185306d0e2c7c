use super::{column_b256, column_opt_u64, column_u64, column_utxo_id, placeholders};
use crate::{StorageError, UtxoQuery};
use alloy_primitives::B256;
use derive_more::Constructor;
use rusqlite::{
    Connection, OptionalExtension, Row, params_from_iter,
    types::{Type, Value},
};
use utxodex_types::{AddressEntry, OutputRecord, TransactionRecord, UtxoId};

const OUTPUT_COLUMNS: &str =
    "o.utxo_id, o.slot, o.spend_slot, o.address, o.payment_credential, o.payload";

/// The output column matched against the lookup keys.
#[derive(Debug, Clone, Copy)]
pub(crate) enum OutputKey {
    Address,
    UtxoId,
    PaymentCredential,
}

impl OutputKey {
    const fn column(self) -> &'static str {
        match self {
            Self::Address => "o.address",
            Self::UtxoId => "o.utxo_id",
            Self::PaymentCredential => "o.payment_credential",
        }
    }
}

/// Read queries over outputs, transactions and addresses.
#[derive(Debug, Constructor)]
pub(crate) struct OutputProvider<'conn> {
    conn: &'conn Connection,
}

impl OutputProvider<'_> {
    pub(crate) fn get_output(&self, utxo_id: &UtxoId) -> Result<Option<OutputRecord>, StorageError> {
        let sql =
            format!("SELECT {OUTPUT_COLUMNS}, NULL FROM transaction_output o WHERE o.utxo_id = ?1");
        let mut stmt = self.conn.prepare_cached(&sql)?;
        Ok(stmt.query_row([utxo_id.to_string()], output_from_row).optional()?)
    }

    pub(crate) fn transaction_by_hash(
        &self,
        tx_hash: B256,
    ) -> Result<Option<TransactionRecord>, StorageError> {
        let mut stmt = self.conn.prepare_cached(
            "SELECT t.tx_hash, t.slot, t.tx_index, b.height, b.hash FROM tx t \
             JOIN block b ON b.slot = t.slot WHERE t.tx_hash = ?1",
        )?;
        let record = stmt
            .query_row([tx_hash.as_slice()], |row| {
                Ok(TransactionRecord {
                    tx_hash: column_b256(row, 0)?,
                    slot: column_u64(row, 1)?,
                    tx_index: row.get(2)?,
                    block_height: column_u64(row, 3)?,
                    block_hash: column_b256(row, 4)?,
                })
            })
            .optional()?;
        Ok(record)
    }

    /// Unspent outputs whose `key` column matches one of `keys`.
    pub(crate) fn unspent_by(
        &self,
        key: OutputKey,
        keys: Vec<Value>,
        query: &UtxoQuery,
    ) -> Result<Vec<OutputRecord>, StorageError> {
        if keys.is_empty() {
            return Ok(Vec::new());
        }

        let mut sql = format!("SELECT {OUTPUT_COLUMNS}, ");
        if query.include_tx_index {
            sql.push_str("t.tx_index FROM transaction_output o JOIN tx t ON t.tx_hash = o.tx_hash");
        } else {
            sql.push_str("NULL FROM transaction_output o");
        }
        sql.push_str(&format!(
            " WHERE {} IN ({}) AND o.spend_slot IS NULL",
            key.column(),
            placeholders(keys.len())
        ));

        let mut params = keys;
        if let Some(after) = &query.after {
            sql.push_str(" AND o.utxo_id > ?");
            params.push(Value::Text(after.to_string()));
        }
        if query.must_have_datum {
            sql.push_str(" AND json_extract(o.payload, '$.datum') IS NOT NULL");
        }
        if !query.has_one_of_tokens.is_empty() {
            let mut clauses = Vec::with_capacity(query.has_one_of_tokens.len());
            for asset in &query.has_one_of_tokens {
                params.push(Value::Text(asset.json_path()?));
                clauses.push("json_extract(o.payload, ?) IS NOT NULL");
            }
            sql.push_str(&format!(" AND ({})", clauses.join(" OR ")));
        }
        sql.push_str(" ORDER BY o.utxo_id");
        if let Some(limit) = query.limit {
            sql.push_str(" LIMIT ?");
            params.push(Value::Integer(limit.into()));
        }

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(params.iter()), output_from_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    pub(crate) fn addresses_by_stake_credential(
        &self,
        stake_credential: &[u8],
    ) -> Result<Vec<AddressEntry>, StorageError> {
        // Base addresses carry the stake credential right after the header byte and the
        // 28 byte payment credential.
        let mut stmt = self.conn.prepare_cached(
            "SELECT address, first_slot FROM address \
             WHERE length(address) >= 57 AND substr(address, 30, 28) = ?1 \
             ORDER BY first_slot, address",
        )?;
        let rows = stmt.query_map([stake_credential], address_from_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    pub(crate) fn filter_used_addresses(
        &self,
        addresses: &[Vec<u8>],
    ) -> Result<Vec<AddressEntry>, StorageError> {
        if addresses.is_empty() {
            return Ok(Vec::new());
        }
        let sql = format!(
            "SELECT address, first_slot FROM address WHERE address IN ({}) \
             ORDER BY first_slot, address",
            placeholders(addresses.len())
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(addresses.iter()), address_from_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Every output, spent or not, ordered by id.
    #[cfg(any(test, feature = "test-utils"))]
    pub(crate) fn all_outputs(&self) -> Result<Vec<OutputRecord>, StorageError> {
        let sql =
            format!("SELECT {OUTPUT_COLUMNS}, NULL FROM transaction_output o ORDER BY o.utxo_id");
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([], output_from_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    #[cfg(any(test, feature = "test-utils"))]
    pub(crate) fn all_addresses(&self) -> Result<Vec<AddressEntry>, StorageError> {
        let mut stmt =
            self.conn.prepare("SELECT address, first_slot FROM address ORDER BY address")?;
        let rows = stmt.query_map([], address_from_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }
}

fn output_from_row(row: &Row<'_>) -> rusqlite::Result<OutputRecord> {
    let raw: String = row.get(5)?;
    let payload = serde_json::from_str(&raw)
        .map_err(|err| rusqlite::Error::FromSqlConversionFailure(5, Type::Text, Box::new(err)))?;
    Ok(OutputRecord {
        utxo_id: column_utxo_id(row, 0)?,
        slot: column_u64(row, 1)?,
        spend_slot: column_opt_u64(row, 2)?,
        address: row.get(3)?,
        payment_credential: row.get(4)?,
        payload,
        tx_index: row.get(6)?,
    })
}

fn address_from_row(row: &Row<'_>) -> rusqlite::Result<AddressEntry> {
    Ok(AddressEntry { address: row.get(0)?, first_slot: column_u64(row, 1)? })
}
