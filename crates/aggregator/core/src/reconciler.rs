use crate::{Metrics, config::RepairConfig};
use std::{collections::HashSet, sync::Arc};
use tracing::{debug, info};
use utxodex_storage::{BlockReader, IndexWriter, StorageError};
use utxodex_types::{Block, UtxoId};

/// Marks outputs of repaired blocks as spent.
///
/// Blocks replayed at missing heights may produce outputs whose spending transaction was
/// indexed long ago, before the output existed in the index. Every later block is checked
/// against those outputs until the stream catches up.
#[derive(Debug)]
pub struct GapReconciler<S> {
    store: Arc<S>,
    repair: RepairConfig,
    pending: HashSet<UtxoId>,
}

impl<S> GapReconciler<S>
where
    S: BlockReader + IndexWriter,
{
    /// Creates a new [`GapReconciler`] for the heights in `repair`.
    pub fn new(store: Arc<S>, repair: RepairConfig) -> Self {
        Self { store, repair, pending: HashSet::new() }
    }

    /// Returns `true` when there are missing heights to reconcile.
    pub fn is_active(&self) -> bool {
        self.repair.is_enabled()
    }

    /// Number of outputs still waiting for their spend.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Loads the unspent outputs of missing blocks indexed by earlier sessions.
    pub fn initialize(&mut self) -> Result<(), StorageError> {
        let heights: Vec<u64> = self.repair.missing_heights.iter().copied().collect();
        self.pending = self.store.unspent_outputs_at_heights(&heights)?.into_iter().collect();
        info!(
            target: "utxodex::reconciler",
            missing_heights = heights.len(),
            pending = self.pending.len(),
            "Loaded outputs awaiting reconciliation"
        );
        self.update_gauge();
        Ok(())
    }

    /// Starts tracking the outputs of a block decoded at `height` if it is a missing height.
    pub fn track(&mut self, height: u64, produced: impl IntoIterator<Item = UtxoId>) {
        if !self.repair.is_missing(height) {
            return;
        }
        self.pending.extend(produced);
        self.update_gauge();
    }

    /// Marks tracked outputs consumed by `block` as spent at the block's slot.
    ///
    /// # Returns
    /// * The number of outputs updated in the index.
    pub fn reconcile(&mut self, block: &Block) -> Result<usize, StorageError> {
        if self.pending.is_empty() {
            return Ok(0);
        }
        let spent: Vec<UtxoId> =
            block.spent_references().filter(|utxo_id| self.pending.contains(utxo_id)).collect();
        if spent.is_empty() {
            return Ok(0);
        }

        let updated = self.store.mark_spent(&spent, block.slot)?;
        for utxo_id in &spent {
            self.pending.remove(utxo_id);
        }
        debug!(
            target: "utxodex::reconciler",
            slot = block.slot,
            updated,
            pending = self.pending.len(),
            "Reconciled spends of repaired outputs"
        );
        self.update_gauge();
        Ok(updated)
    }

    fn update_gauge(&self) {
        metrics::gauge!(Metrics::SYNC_PENDING_RECONCILIATIONS).set(self.pending.len() as f64);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::B256;
    use std::collections::BTreeSet;
    use utxodex_storage::{CommitOptions, CommitStats};
    use utxodex_types::{
        BlockRef, Era, FactBatch, HexHash, OutputReference, Transaction, TransactionId,
    };

    mockall::mock! {
        #[derive(Debug)]
        pub Store {}

        impl BlockReader for Store {
            fn latest_block(&self) -> Result<Option<BlockRef>, StorageError>;
            fn nth_latest_block(&self, offset: u64) -> Result<Option<BlockRef>, StorageError>;
            fn latest_block_below_height(&self, height: u64) -> Result<Option<BlockRef>, StorageError>;
            fn unspent_outputs_at_heights(&self, heights: &[u64]) -> Result<Vec<UtxoId>, StorageError>;
        }

        impl IndexWriter for Store {
            fn commit_batch(&self, batch: &FactBatch, options: CommitOptions) -> Result<CommitStats, StorageError>;
            fn mark_spent(&self, utxo_ids: &[UtxoId], spend_slot: u64) -> Result<usize, StorageError>;
        }
    }

    fn utxo(n: u8) -> UtxoId {
        UtxoId::new(B256::repeat_byte(n), 0)
    }

    fn spending_block(slot: u64, spent: &[UtxoId]) -> Block {
        Block {
            era: Era::Conway,
            id: HexHash(B256::repeat_byte(0xbb)),
            height: slot / 10,
            slot,
            transactions: vec![Transaction {
                id: HexHash(B256::repeat_byte(0xcc)),
                inputs: spent
                    .iter()
                    .map(|id| OutputReference {
                        transaction: TransactionId { id: HexHash(id.tx_hash) },
                        index: id.index,
                    })
                    .collect(),
                outputs: vec![],
                datums: Default::default(),
            }],
        }
    }

    fn repair(heights: &[u64]) -> RepairConfig {
        RepairConfig {
            missing_heights: heights.iter().copied().collect::<BTreeSet<_>>(),
            continue_from_height: None,
        }
    }

    #[test]
    fn test_initialize_loads_unspent_outputs() {
        let mut store = MockStore::new();
        store
            .expect_unspent_outputs_at_heights()
            .withf(|heights| heights == [7, 9])
            .times(1)
            .returning(|_| Ok(vec![utxo(1), utxo(2)]));

        let mut reconciler = GapReconciler::new(Arc::new(store), repair(&[9, 7]));
        assert!(reconciler.is_active());
        reconciler.initialize().unwrap();
        assert_eq!(reconciler.pending_len(), 2);
    }

    #[test]
    fn test_track_only_missing_heights() {
        let mut reconciler = GapReconciler::new(Arc::new(MockStore::new()), repair(&[7]));
        reconciler.track(6, [utxo(1)]);
        assert_eq!(reconciler.pending_len(), 0);
        reconciler.track(7, [utxo(2), utxo(3)]);
        assert_eq!(reconciler.pending_len(), 2);
    }

    #[test]
    fn test_reconcile_marks_pending_spends() {
        let mut store = MockStore::new();
        store
            .expect_mark_spent()
            .withf(|ids, slot| ids == [utxo(2)] && *slot == 500)
            .times(1)
            .returning(|ids, _| Ok(ids.len()));

        let mut reconciler = GapReconciler::new(Arc::new(store), repair(&[7]));
        reconciler.track(7, [utxo(2), utxo(3)]);

        let block = spending_block(500, &[utxo(2), utxo(4)]);
        assert_eq!(reconciler.reconcile(&block).unwrap(), 1);
        assert_eq!(reconciler.pending_len(), 1);
        // Nothing left to match in the same block.
        assert_eq!(reconciler.reconcile(&block).unwrap(), 0);
    }

    #[test]
    fn test_failed_reconcile_keeps_pending() {
        let mut store = MockStore::new();
        store.expect_mark_spent().times(1).returning(|_, _| Err(StorageError::LockPoisoned));

        let mut reconciler = GapReconciler::new(Arc::new(store), repair(&[7]));
        reconciler.track(7, [utxo(2)]);

        assert!(reconciler.reconcile(&spending_block(500, &[utxo(2)])).is_err());
        assert_eq!(reconciler.pending_len(), 1);
    }
}
