use crate::{FactBuffer, Metrics, PruningPolicy};
use std::sync::Arc;
use tracing::{debug, info, warn};
use utxodex_storage::{CommitOptions, CommitStats, IndexWriter, StorageError};
use utxodex_types::{ChainTip, FactBatch};

/// Summary of one successful flush.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlushReport {
    /// Blocks in the flushed buffer.
    pub blocks: usize,
    /// Transactions in the flushed buffer.
    pub transactions: usize,
    /// Address sightings in the flushed buffer.
    pub addresses: usize,
    /// Outputs in the flushed buffer.
    pub outputs: usize,
    /// Spends in the flushed buffer.
    pub spends: usize,
    /// Addresses stored for the first time.
    pub new_addresses: usize,
    /// Outputs whose spend slot was set.
    pub spent_outputs: usize,
    /// Spent outputs deleted by pruning.
    pub pruned_outputs: usize,
    /// Slot of the last flushed block.
    pub latest_slot: Option<u64>,
    /// Height of the last flushed block.
    pub latest_height: Option<u64>,
    /// Latest flushed height over the tip height.
    pub progress: Option<f64>,
    /// Slots between the tip and the last flushed block.
    pub lag_slots: Option<u64>,
    /// Set when the flush precedes a rollback to this slot.
    pub rollback_to: Option<u64>,
    /// Outputs of repaired blocks still waiting for their spend, while repairing.
    pub pending_reconciliations: Option<usize>,
}

impl FlushReport {
    /// Lag above which the index is considered unhealthy.
    pub const UNHEALTHY_LAG_SLOTS: u64 = 300;

    /// Returns `true` if the index trails the tip by more than [`Self::UNHEALTHY_LAG_SLOTS`].
    pub fn is_lagging(&self) -> bool {
        self.lag_slots.is_some_and(|lag| lag > Self::UNHEALTHY_LAG_SLOTS)
    }

    fn new(
        facts: &FactBatch,
        stats: CommitStats,
        tip: &ChainTip,
        origin_height: u64,
        rollback_to: Option<u64>,
        pending_reconciliations: Option<usize>,
    ) -> Self {
        let latest = facts.latest_block();
        let lag_slots = tip
            .slot()
            .zip(latest)
            .map(|(tip_slot, block)| tip_slot.saturating_sub(block.slot));
        // Before the node reports a tip, progress is measured against the origin block.
        let target_height = tip.height().unwrap_or(origin_height);
        let progress = Some(target_height).filter(|height| *height > 0).map(|tip_height| {
            latest.map_or(1, |block| block.height.max(1)) as f64 / tip_height as f64
        });
        Self {
            blocks: facts.blocks.len(),
            transactions: facts.transactions.len(),
            addresses: facts.addresses.len(),
            outputs: facts.outputs.len(),
            spends: facts.spends.len(),
            new_addresses: stats.new_addresses,
            spent_outputs: stats.spent_outputs,
            pruned_outputs: stats.pruned_outputs,
            latest_slot: latest.map(|block| block.slot),
            latest_height: latest.map(|block| block.height),
            progress,
            lag_slots,
            rollback_to,
            pending_reconciliations,
        }
    }

    fn record(&self, stats: &CommitStats) {
        metrics::counter!(Metrics::SYNC_FLUSHES_TOTAL).increment(1);
        for (category, rows) in [
            (Metrics::CATEGORY_BLOCKS, stats.blocks),
            (Metrics::CATEGORY_TRANSACTIONS, stats.transactions),
            (Metrics::CATEGORY_ADDRESSES, stats.new_addresses),
            (Metrics::CATEGORY_OUTPUTS, stats.outputs),
            (Metrics::CATEGORY_SPENDS, stats.spent_outputs),
        ] {
            metrics::counter!(Metrics::SYNC_ROWS_WRITTEN_TOTAL, "category" => category)
                .increment(rows as u64);
        }
        metrics::counter!(Metrics::SYNC_PRUNED_OUTPUTS_TOTAL)
            .increment(self.pruned_outputs as u64);
        if let (Some(slot), Some(height)) = (self.latest_slot, self.latest_height) {
            metrics::gauge!(Metrics::SYNC_INDEXED_SLOT).set(slot as f64);
            metrics::gauge!(Metrics::SYNC_INDEXED_HEIGHT).set(height as f64);
        }
        if let Some(lag) = self.lag_slots {
            metrics::gauge!(Metrics::SYNC_LAG_SLOTS).set(lag as f64);
        }
    }
}

/// Writes buffered facts to the index in one transaction.
#[derive(Debug)]
pub struct Committer<S> {
    store: Arc<S>,
    pruning: PruningPolicy,
    origin_height: u64,
}

impl<S> Committer<S>
where
    S: IndexWriter,
{
    /// Creates a new [`Committer`].
    pub const fn new(store: Arc<S>, pruning: PruningPolicy) -> Self {
        Self { store, pruning, origin_height: 0 }
    }

    /// Sets the height progress is reported against while the tip is the origin.
    pub const fn with_origin_height(mut self, origin_height: u64) -> Self {
        self.origin_height = origin_height;
        self
    }

    /// Commits everything in `buffer` and clears it.
    ///
    /// `rollback_to` tags a flush forced by a rollback; such a flush does not prune.
    /// `pending_reconciliations` is carried into the report while a gap repair is running.
    ///
    /// # Returns
    /// * `Ok(None)` if the buffer was empty.
    ///
    /// # Errors
    /// Returns the storage error and leaves `buffer` untouched if the commit failed.
    pub fn flush(
        &self,
        buffer: &mut FactBuffer,
        tip: &ChainTip,
        rollback_to: Option<u64>,
        pending_reconciliations: Option<usize>,
    ) -> Result<Option<FlushReport>, StorageError> {
        if buffer.is_empty() {
            return Ok(None);
        }

        let facts = buffer.facts();
        let latest_slot = facts.latest_block().map(|block| block.slot);
        let options = CommitOptions {
            prune_spent_before: self.pruning.prune_spent_before(latest_slot, rollback_to),
        };
        debug!(
            target: "utxodex::committer",
            blocks = facts.blocks.len(),
            ?latest_slot,
            ?rollback_to,
            "Writing buffer to index"
        );

        let stats = self.store.commit_batch(facts, options)?;
        let report = FlushReport::new(
            facts,
            stats,
            tip,
            self.origin_height,
            rollback_to,
            pending_reconciliations,
        );
        report.record(&stats);
        buffer.clear();

        info!(
            target: "utxodex::committer",
            blocks = report.blocks,
            transactions = report.transactions,
            addresses = report.addresses,
            outputs = report.outputs,
            spends = report.spends,
            new_addresses = report.new_addresses,
            spent_outputs = report.spent_outputs,
            pruned_outputs = report.pruned_outputs,
            latest_slot = ?report.latest_slot,
            progress = ?report.progress,
            lag_slots = ?report.lag_slots,
            rollback_to = ?report.rollback_to,
            pending_reconciliations = ?report.pending_reconciliations,
            "Wrote buffer to index"
        );
        Ok(Some(report))
    }

    /// Flushes `buffer` if any category reached `threshold`.
    ///
    /// A failed commit is logged and the buffer is kept for the next attempt.
    pub fn flush_if_ready(
        &self,
        buffer: &mut FactBuffer,
        threshold: usize,
        tip: &ChainTip,
        pending_reconciliations: Option<usize>,
    ) -> Option<FlushReport> {
        if !buffer.should_flush(threshold) {
            return None;
        }
        match self.flush(buffer, tip, None, pending_reconciliations) {
            Ok(report) => report,
            Err(err) => {
                metrics::counter!(Metrics::SYNC_FLUSH_FAILURES_TOTAL).increment(1);
                warn!(target: "utxodex::committer", %err, "Failed to write buffer, keeping it for the next flush");
                None
            }
        }
    }
}
