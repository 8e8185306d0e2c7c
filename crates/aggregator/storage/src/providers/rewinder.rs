use crate::{RollbackStats, StorageError};
use derive_more::Constructor;
use rusqlite::Connection;

/// Reverts facts above a slot boundary.
#[derive(Debug, Constructor)]
pub(crate) struct Rewinder<'conn> {
    conn: &'conn Connection,
}

impl Rewinder<'_> {
    pub(crate) fn rollback_to(&self, slot: u64) -> Result<RollbackStats, StorageError> {
        Ok(RollbackStats {
            blocks: self.conn.execute("DELETE FROM block WHERE slot > ?1", [slot])?,
            transactions: self.conn.execute("DELETE FROM tx WHERE slot > ?1", [slot])?,
            addresses: self.conn.execute("DELETE FROM address WHERE first_slot > ?1", [slot])?,
            outputs: self
                .conn
                .execute("DELETE FROM transaction_output WHERE slot > ?1", [slot])?,
            unspent_outputs: self.conn.execute(
                "UPDATE transaction_output SET spend_slot = NULL \
                 WHERE slot <= ?1 AND spend_slot > ?1",
                [slot],
            )?,
        })
    }
}
