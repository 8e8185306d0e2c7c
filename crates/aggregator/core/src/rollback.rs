use crate::{Committer, FactBuffer, Metrics, SyncMode};
use std::sync::Arc;
use tracing::{info, warn};
use utxodex_storage::{IndexRewinder, IndexWriter, RollbackStats, StorageError};
use utxodex_types::{ChainPoint, ChainTip};

/// What a rollback did to the index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RollbackOutcome {
    /// Everything after `slot` was reverted.
    Applied {
        /// The slot rolled back to.
        slot: u64,
        /// Rows affected.
        stats: RollbackStats,
    },
    /// The target lies below the range replayed by a repair session.
    Ignored {
        /// The requested slot.
        slot: u64,
    },
}

/// Applies chain rollbacks to the index.
#[derive(Debug)]
pub struct RollbackCoordinator<S> {
    store: Arc<S>,
    origin_slot: u64,
}

impl<S> RollbackCoordinator<S>
where
    S: IndexWriter + IndexRewinder,
{
    /// Creates a new [`RollbackCoordinator`]. The origin sentinel resolves to `origin_slot`.
    pub const fn new(store: Arc<S>, origin_slot: u64) -> Self {
        Self { store, origin_slot }
    }

    /// Handles a backward event.
    ///
    /// Buffered facts are flushed first so the rollback sees every applied block. A failed
    /// flush is returned as is: rolling back past unflushed facts would lose track of them.
    pub fn roll_backward(
        &self,
        point: &ChainPoint,
        tip: &ChainTip,
        mode: &SyncMode,
        buffer: &mut FactBuffer,
        committer: &Committer<S>,
        pending_reconciliations: Option<usize>,
    ) -> Result<RollbackOutcome, StorageError> {
        let slot = point.slot_or(self.origin_slot);
        committer.flush(buffer, tip, Some(slot), pending_reconciliations)?;

        if mode.ignores_rollback_to(slot) {
            warn!(
                target: "utxodex::rollback",
                slot,
                %mode,
                "Ignoring rollback below the repaired range"
            );
            metrics::counter!(Metrics::SYNC_ROLLBACKS_TOTAL, "outcome" => Metrics::OUTCOME_IGNORED)
                .increment(1);
            return Ok(RollbackOutcome::Ignored { slot });
        }

        let stats = self.rewind_to(slot)?;
        metrics::counter!(Metrics::SYNC_ROLLBACKS_TOTAL, "outcome" => Metrics::OUTCOME_APPLIED)
            .increment(1);
        Ok(RollbackOutcome::Applied { slot, stats })
    }

    /// Reverts everything indexed after `slot`.
    pub fn rewind_to(&self, slot: u64) -> Result<RollbackStats, StorageError> {
        let stats = self.store.rollback_to_slot(slot)?;
        info!(
            target: "utxodex::rollback",
            slot,
            blocks = stats.blocks,
            transactions = stats.transactions,
            addresses = stats.addresses,
            outputs = stats.outputs,
            unspent_outputs = stats.unspent_outputs,
            "Rolled back index"
        );
        Ok(stats)
    }
}
