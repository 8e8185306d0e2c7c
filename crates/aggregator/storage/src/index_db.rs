//! SQLite-backed implementation of the storage traits.

use crate::{
    CommitOptions, CommitStats, Metrics, RollbackStats, StorageError, UtxoQuery,
    providers::{BlockProvider, FactWriter, OutputKey, OutputProvider, Rewinder},
    traits::{BlockReader, IndexReader, IndexRewinder, IndexWriter},
};
use alloy_primitives::B256;
use metrics::gauge;
use rusqlite::{Connection, OpenFlags, types::Value};
use std::{
    path::{Path, PathBuf},
    sync::{Mutex, MutexGuard},
    time::Duration,
};
use tracing::{debug, warn};
use utxodex_metrics::{MetricsReporter, observe_metrics_for_result};
use utxodex_types::{
    AddressEntry, BlockRef, FactBatch, OutputRecord, TransactionRecord, UtxoId,
};

const TABLES: [&str; 4] = ["block", "tx", "address", "transaction_output"];

/// Handle to the index database.
///
/// The connection is guarded by a mutex so a single handle can be shared between the sync
/// driver and the metrics reporter.
#[derive(Debug)]
pub struct IndexDb {
    path: Option<PathBuf>,
    metrics_enabled: Option<bool>,

    conn: Mutex<Connection>,
}

impl IndexDb {
    /// Creates or opens the index database at `path`, creating parent directories and the
    /// schema as needed.
    pub fn open(path: &Path) -> Result<Self, StorageError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_WRITE |
                OpenFlags::SQLITE_OPEN_CREATE |
                OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        let mode: String =
            conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
        conn.busy_timeout(Duration::from_secs(5))?;

        debug!(target: "utxodex::storage", path = %path.display(), %mode, "Opened index database");
        Self::init(conn, Some(path.to_path_buf()))
    }

    /// Creates a throwaway database living in memory.
    pub fn in_memory() -> Result<Self, StorageError> {
        Self::init(Connection::open_in_memory()?, None)
    }

    fn init(conn: Connection, path: Option<PathBuf>) -> Result<Self, StorageError> {
        conn.execute_batch(include_str!("schema.sql"))?;
        Ok(Self { path, metrics_enabled: None, conn: Mutex::new(conn) })
    }

    /// Enables metrics on the database handle.
    pub fn with_metrics(mut self) -> Self {
        self.metrics_enabled = Some(true);
        Metrics::init();
        self
    }

    /// Location of the database file, `None` for in-memory databases.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, StorageError> {
        self.conn.lock().map_err(|_| StorageError::LockPoisoned)
    }

    fn observe_call<T, E, F: FnOnce() -> Result<T, E>>(
        &self,
        name: &'static str,
        f: F,
    ) -> Result<T, E> {
        if self.metrics_enabled.unwrap_or(false) {
            observe_metrics_for_result!(
                Metrics::STORAGE_REQUESTS_SUCCESS_TOTAL,
                Metrics::STORAGE_REQUESTS_ERROR_TOTAL,
                Metrics::STORAGE_REQUEST_DURATION_SECONDS,
                name,
                f()
            )
        } else {
            f()
        }
    }

    fn unspent_by(
        &self,
        name: &'static str,
        key: OutputKey,
        keys: Vec<Value>,
        query: &UtxoQuery,
    ) -> Result<Vec<OutputRecord>, StorageError> {
        self.observe_call(name, || {
            let conn = self.conn()?;
            OutputProvider::new(&conn).unspent_by(key, keys, query)
        })
    }

    /// Reads every row of the index, for comparing store states in tests.
    #[cfg(any(test, feature = "test-utils"))]
    pub fn snapshot(&self) -> Result<IndexSnapshot, StorageError> {
        let conn = self.conn()?;
        let blocks = BlockProvider::new(&conn);
        let outputs = OutputProvider::new(&conn);
        Ok(IndexSnapshot {
            blocks: blocks.all_blocks()?,
            transactions: blocks.all_transactions()?,
            addresses: outputs.all_addresses()?,
            outputs: outputs.all_outputs()?,
        })
    }
}

/// Full contents of an [`IndexDb`], with every table in key order.
#[cfg(any(test, feature = "test-utils"))]
#[derive(Debug, Clone, PartialEq)]
pub struct IndexSnapshot {
    /// Rows of the `block` table.
    pub blocks: Vec<BlockRef>,
    /// Rows of the `tx` table.
    pub transactions: Vec<utxodex_types::TransactionEntry>,
    /// Rows of the `address` table.
    pub addresses: Vec<AddressEntry>,
    /// Rows of the `transaction_output` table, spent or not.
    pub outputs: Vec<OutputRecord>,
}

impl BlockReader for IndexDb {
    fn latest_block(&self) -> Result<Option<BlockRef>, StorageError> {
        self.observe_call(Metrics::STORAGE_METHOD_LATEST_BLOCK, || {
            BlockProvider::new(&*self.conn()?).nth_latest(0)
        })
    }

    fn nth_latest_block(&self, offset: u64) -> Result<Option<BlockRef>, StorageError> {
        self.observe_call(Metrics::STORAGE_METHOD_NTH_LATEST_BLOCK, || {
            BlockProvider::new(&*self.conn()?).nth_latest(offset)
        })
    }

    fn latest_block_below_height(&self, height: u64) -> Result<Option<BlockRef>, StorageError> {
        self.observe_call(Metrics::STORAGE_METHOD_LATEST_BLOCK_BELOW_HEIGHT, || {
            BlockProvider::new(&*self.conn()?).latest_below_height(height)
        })
    }

    fn unspent_outputs_at_heights(&self, heights: &[u64]) -> Result<Vec<UtxoId>, StorageError> {
        self.observe_call(Metrics::STORAGE_METHOD_UNSPENT_OUTPUTS_AT_HEIGHTS, || {
            BlockProvider::new(&*self.conn()?).unspent_outputs_at_heights(heights)
        })
    }
}

impl IndexReader for IndexDb {
    fn get_output(&self, utxo_id: &UtxoId) -> Result<Option<OutputRecord>, StorageError> {
        self.observe_call(Metrics::STORAGE_METHOD_GET_OUTPUT, || {
            OutputProvider::new(&*self.conn()?).get_output(utxo_id)
        })
    }

    fn transaction_by_hash(
        &self,
        tx_hash: B256,
    ) -> Result<Option<TransactionRecord>, StorageError> {
        self.observe_call(Metrics::STORAGE_METHOD_TRANSACTION_BY_HASH, || {
            OutputProvider::new(&*self.conn()?).transaction_by_hash(tx_hash)
        })
    }

    fn utxos_by_addresses(
        &self,
        addresses: &[String],
        query: &UtxoQuery,
    ) -> Result<Vec<OutputRecord>, StorageError> {
        let keys = addresses.iter().cloned().map(Value::Text).collect();
        self.unspent_by(Metrics::STORAGE_METHOD_UTXOS_BY_ADDRESSES, OutputKey::Address, keys, query)
    }

    fn utxos_by_references(
        &self,
        references: &[UtxoId],
        query: &UtxoQuery,
    ) -> Result<Vec<OutputRecord>, StorageError> {
        let keys = references.iter().map(|id| Value::Text(id.to_string())).collect();
        self.unspent_by(Metrics::STORAGE_METHOD_UTXOS_BY_REFERENCES, OutputKey::UtxoId, keys, query)
    }

    fn utxos_by_payment_credentials(
        &self,
        credentials: &[Vec<u8>],
        query: &UtxoQuery,
    ) -> Result<Vec<OutputRecord>, StorageError> {
        let keys = credentials.iter().cloned().map(Value::Blob).collect();
        self.unspent_by(
            Metrics::STORAGE_METHOD_UTXOS_BY_PAYMENT_CREDENTIALS,
            OutputKey::PaymentCredential,
            keys,
            query,
        )
    }

    fn addresses_by_stake_credential(
        &self,
        stake_credential: &[u8],
    ) -> Result<Vec<AddressEntry>, StorageError> {
        self.observe_call(Metrics::STORAGE_METHOD_ADDRESSES_BY_STAKE_CREDENTIAL, || {
            OutputProvider::new(&*self.conn()?).addresses_by_stake_credential(stake_credential)
        })
    }

    fn filter_used_addresses(
        &self,
        addresses: &[Vec<u8>],
    ) -> Result<Vec<AddressEntry>, StorageError> {
        self.observe_call(Metrics::STORAGE_METHOD_FILTER_USED_ADDRESSES, || {
            OutputProvider::new(&*self.conn()?).filter_used_addresses(addresses)
        })
    }
}

impl IndexWriter for IndexDb {
    fn commit_batch(
        &self,
        batch: &FactBatch,
        options: CommitOptions,
    ) -> Result<CommitStats, StorageError> {
        self.observe_call(Metrics::STORAGE_METHOD_COMMIT_BATCH, || {
            let mut conn = self.conn()?;
            let tx = conn.transaction()?;
            let stats = FactWriter::new(&tx).write(batch, options)?;
            tx.commit()?;
            Ok(stats)
        })
    }

    fn mark_spent(&self, utxo_ids: &[UtxoId], spend_slot: u64) -> Result<usize, StorageError> {
        self.observe_call(Metrics::STORAGE_METHOD_MARK_SPENT, || {
            let mut conn = self.conn()?;
            let tx = conn.transaction()?;
            let updated = FactWriter::new(&tx).mark_spent(utxo_ids, spend_slot)?;
            tx.commit()?;
            Ok(updated)
        })
    }
}

impl IndexRewinder for IndexDb {
    fn rollback_to_slot(&self, slot: u64) -> Result<RollbackStats, StorageError> {
        self.observe_call(Metrics::STORAGE_METHOD_ROLLBACK_TO_SLOT, || {
            let mut conn = self.conn()?;
            let tx = conn.transaction()?;
            let stats = Rewinder::new(&tx).rollback_to(slot)?;
            tx.commit()?;
            Ok(stats)
        })
    }
}

impl MetricsReporter for IndexDb {
    fn report_metrics(&self) {
        let mut metrics = Vec::new();

        let collected = self.conn().and_then(|conn| {
            for table in TABLES {
                let rows: i64 =
                    conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| {
                        row.get(0)
                    })?;
                metrics.push((Metrics::TABLE_ROWS, rows as f64, Some(table)));
            }

            let page_count: i64 = conn.pragma_query_value(None, "page_count", |row| row.get(0))?;
            let page_size: i64 = conn.pragma_query_value(None, "page_size", |row| row.get(0))?;
            metrics.push((Metrics::DATABASE_SIZE_BYTES, (page_count * page_size) as f64, None));
            Ok::<(), StorageError>(())
        });

        if let Err(err) = collected {
            warn!(target: "utxodex::storage", %err, "Failed to collect database metrics");
        }

        for (name, value, table) in metrics {
            match table {
                Some(table) => gauge!(name, "table" => table).set(value),
                None => gauge!(name).set(value),
            }
        }
    }
}
