//! Statement-level access to the index tables.
//!
//! Providers borrow a [`rusqlite::Connection`] (or a transaction dereferencing to one) and
//! never open or commit transactions themselves; [`crate::IndexDb`] owns that.

mod fact_writer;
pub(crate) use fact_writer::FactWriter;

mod rewinder;
pub(crate) use rewinder::Rewinder;

mod block_reader;
pub(crate) use block_reader::BlockProvider;

mod output_reader;
pub(crate) use output_reader::{OutputKey, OutputProvider};

use alloy_primitives::B256;
use rusqlite::{Row, types::Type};
use utxodex_types::{BlockRef, UtxoId};

pub(crate) fn column_u64(row: &Row<'_>, idx: usize) -> rusqlite::Result<u64> {
    let value: i64 = row.get(idx)?;
    u64::try_from(value).map_err(|_| rusqlite::Error::IntegralValueOutOfRange(idx, value))
}

pub(crate) fn column_opt_u64(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<u64>> {
    let value: Option<i64> = row.get(idx)?;
    value
        .map(|v| u64::try_from(v).map_err(|_| rusqlite::Error::IntegralValueOutOfRange(idx, v)))
        .transpose()
}

pub(crate) fn column_b256(row: &Row<'_>, idx: usize) -> rusqlite::Result<B256> {
    let bytes: Vec<u8> = row.get(idx)?;
    B256::try_from(bytes.as_slice())
        .map_err(|err| rusqlite::Error::FromSqlConversionFailure(idx, Type::Blob, Box::new(err)))
}

pub(crate) fn column_utxo_id(row: &Row<'_>, idx: usize) -> rusqlite::Result<UtxoId> {
    let text: String = row.get(idx)?;
    text.parse::<UtxoId>()
        .map_err(|err| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(err)))
}

pub(crate) fn block_from_row(row: &Row<'_>) -> rusqlite::Result<BlockRef> {
    Ok(BlockRef::new(column_u64(row, 0)?, column_b256(row, 1)?, column_u64(row, 2)?))
}

/// `?, ?, ?` with `count` placeholders.
pub(crate) fn placeholders(count: usize) -> String {
    vec!["?"; count].join(", ")
}
