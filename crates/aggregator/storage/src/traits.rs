use crate::{CommitOptions, CommitStats, RollbackStats, StorageError, UtxoQuery};
use alloy_primitives::B256;
use std::fmt::Debug;
use utxodex_types::{
    AddressEntry, BlockRef, FactBatch, OutputRecord, TransactionRecord, UtxoId,
};

/// Read access to the indexed blocks, used to pick resume points.
pub trait BlockReader: Debug {
    /// Returns the most recently indexed block, if any.
    fn latest_block(&self) -> Result<Option<BlockRef>, StorageError>;

    /// Returns the block `offset` positions behind the most recent one when ordered by
    /// slot, so `offset == 0` is the latest block.
    ///
    /// # Returns
    /// * `Ok(None)` if fewer than `offset + 1` blocks are indexed.
    fn nth_latest_block(&self, offset: u64) -> Result<Option<BlockRef>, StorageError>;

    /// Returns the latest block (by slot) whose height is strictly below `height`.
    fn latest_block_below_height(&self, height: u64) -> Result<Option<BlockRef>, StorageError>;

    /// Returns the ids of unspent outputs produced by the indexed blocks at `heights`.
    fn unspent_outputs_at_heights(&self, heights: &[u64]) -> Result<Vec<UtxoId>, StorageError>;
}

/// Read access used by the query layer.
///
/// All output lookups return unspent outputs only, ordered by utxo id.
pub trait IndexReader: BlockReader {
    /// Fetches a single output regardless of its spend state.
    fn get_output(&self, utxo_id: &UtxoId) -> Result<Option<OutputRecord>, StorageError>;

    /// Looks up a transaction and its including block.
    fn transaction_by_hash(&self, tx_hash: B256)
    -> Result<Option<TransactionRecord>, StorageError>;

    /// Unspent outputs locked by any of the bech32 `addresses`.
    fn utxos_by_addresses(
        &self,
        addresses: &[String],
        query: &UtxoQuery,
    ) -> Result<Vec<OutputRecord>, StorageError>;

    /// Unspent outputs among `references`.
    fn utxos_by_references(
        &self,
        references: &[UtxoId],
        query: &UtxoQuery,
    ) -> Result<Vec<OutputRecord>, StorageError>;

    /// Unspent outputs whose payment credential (key or script hash) is one of `credentials`.
    fn utxos_by_payment_credentials(
        &self,
        credentials: &[Vec<u8>],
        query: &UtxoQuery,
    ) -> Result<Vec<OutputRecord>, StorageError>;

    /// Addresses whose stake credential equals `stake_credential`.
    fn addresses_by_stake_credential(
        &self,
        stake_credential: &[u8],
    ) -> Result<Vec<AddressEntry>, StorageError>;

    /// Returns the subset of `addresses` (raw bytes) that have appeared on chain.
    fn filter_used_addresses(
        &self,
        addresses: &[Vec<u8>],
    ) -> Result<Vec<AddressEntry>, StorageError>;
}

/// Write access used by the aggregator's commit path.
///
/// Implementations must apply each call atomically: either every row change of the call
/// becomes visible or none does.
pub trait IndexWriter: Send + Sync + Debug {
    /// Persists one batch of facts in dependency order.
    ///
    /// Inserts ignore rows that already exist, so committing the same batch twice leaves
    /// the store unchanged after the first commit.
    ///
    /// # Errors
    /// Returns a [`StorageError`] if any statement fails. Nothing is written in that case.
    fn commit_batch(
        &self,
        batch: &FactBatch,
        options: CommitOptions,
    ) -> Result<CommitStats, StorageError>;

    /// Sets the spend slot of already committed outputs.
    ///
    /// # Returns
    /// * The number of outputs updated.
    fn mark_spent(&self, utxo_ids: &[UtxoId], spend_slot: u64) -> Result<usize, StorageError>;
}

/// Reverts indexed facts when the chain rolls back.
pub trait IndexRewinder {
    /// Removes everything produced after `slot` and marks outputs spent after `slot` as
    /// unspent again.
    ///
    /// # Errors
    /// Returns a [`StorageError`] if any statement fails. Nothing is changed in that case.
    fn rollback_to_slot(&self, slot: u64) -> Result<RollbackStats, StorageError>;
}

/// Everything the chain-sync driver needs from storage.
///
/// Any type implementing [`BlockReader`], [`IndexWriter`] and [`IndexRewinder`]
/// automatically implements this trait.
pub trait IndexStore: BlockReader + IndexWriter + IndexRewinder {}

impl<T: BlockReader + IndexWriter + IndexRewinder> IndexStore for T {}
