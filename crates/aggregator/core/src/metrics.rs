//! Metrics for the chain-sync pipeline.

/// Container for chain-sync metrics.
#[derive(Debug, Clone)]
pub(crate) struct Metrics;

impl Metrics {
    /// Counter of buffer flushes.
    pub(crate) const SYNC_FLUSHES_TOTAL: &'static str = "utxodex_sync_flushes_total";
    /// Counter of rows written by flushes. Labels: `category`.
    pub(crate) const SYNC_ROWS_WRITTEN_TOTAL: &'static str = "utxodex_sync_rows_written_total";
    /// Counter of spent outputs deleted by pruning.
    pub(crate) const SYNC_PRUNED_OUTPUTS_TOTAL: &'static str = "utxodex_sync_pruned_outputs_total";
    /// Counter of flushes that failed and left the buffer in place.
    pub(crate) const SYNC_FLUSH_FAILURES_TOTAL: &'static str = "utxodex_sync_flush_failures_total";
    /// Counter of rollbacks. Labels: `outcome`.
    pub(crate) const SYNC_ROLLBACKS_TOTAL: &'static str = "utxodex_sync_rollbacks_total";
    /// Counter of restarted sessions.
    pub(crate) const SYNC_SESSION_RESTARTS_TOTAL: &'static str =
        "utxodex_sync_session_restarts_total";

    /// Slot of the latest flushed block.
    pub(crate) const SYNC_INDEXED_SLOT: &'static str = "utxodex_sync_indexed_slot";
    /// Height of the latest flushed block.
    pub(crate) const SYNC_INDEXED_HEIGHT: &'static str = "utxodex_sync_indexed_height";
    /// Slot of the node's tip.
    pub(crate) const SYNC_TIP_SLOT: &'static str = "utxodex_sync_tip_slot";
    /// Height of the node's tip.
    pub(crate) const SYNC_TIP_HEIGHT: &'static str = "utxodex_sync_tip_height";
    /// Slots between the chain tip and the latest indexed block.
    pub(crate) const SYNC_LAG_SLOTS: &'static str = "utxodex_sync_lag_slots";
    /// Outputs of repaired blocks still waiting for their spend.
    pub(crate) const SYNC_PENDING_RECONCILIATIONS: &'static str =
        "utxodex_sync_pending_reconciliations";
    /// Current driver state, one series per state set to 1 when active. Labels: `state`.
    pub(crate) const SYNC_DRIVER_STATE: &'static str = "utxodex_sync_driver_state";

    pub(crate) const CATEGORY_BLOCKS: &'static str = "blocks";
    pub(crate) const CATEGORY_TRANSACTIONS: &'static str = "transactions";
    pub(crate) const CATEGORY_ADDRESSES: &'static str = "addresses";
    pub(crate) const CATEGORY_OUTPUTS: &'static str = "outputs";
    pub(crate) const CATEGORY_SPENDS: &'static str = "spends";

    pub(crate) const OUTCOME_APPLIED: &'static str = "applied";
    pub(crate) const OUTCOME_IGNORED: &'static str = "ignored";

    /// Describes the chain-sync metrics and zeroes the labelled series.
    pub(crate) fn init() {
        Self::describe();
        Self::zero();
    }

    fn describe() {
        metrics::describe_counter!(
            Self::SYNC_FLUSHES_TOTAL,
            metrics::Unit::Count,
            "Total number of buffer flushes"
        );
        metrics::describe_counter!(
            Self::SYNC_ROWS_WRITTEN_TOTAL,
            metrics::Unit::Count,
            "Total number of rows written to the index per category"
        );
        metrics::describe_counter!(
            Self::SYNC_PRUNED_OUTPUTS_TOTAL,
            metrics::Unit::Count,
            "Total number of spent outputs pruned behind the immutability window"
        );
        metrics::describe_counter!(
            Self::SYNC_FLUSH_FAILURES_TOTAL,
            metrics::Unit::Count,
            "Total number of failed buffer flushes"
        );
        metrics::describe_counter!(
            Self::SYNC_ROLLBACKS_TOTAL,
            metrics::Unit::Count,
            "Total number of chain rollbacks handled"
        );
        metrics::describe_counter!(
            Self::SYNC_SESSION_RESTARTS_TOTAL,
            metrics::Unit::Count,
            "Total number of restarted chain-sync sessions"
        );
        metrics::describe_gauge!(Self::SYNC_INDEXED_SLOT, "Slot of the latest indexed block");
        metrics::describe_gauge!(Self::SYNC_INDEXED_HEIGHT, "Height of the latest indexed block");
        metrics::describe_gauge!(Self::SYNC_TIP_SLOT, "Slot of the chain tip");
        metrics::describe_gauge!(Self::SYNC_TIP_HEIGHT, "Height of the chain tip");
        metrics::describe_gauge!(
            Self::SYNC_LAG_SLOTS,
            "Slots the index trails the chain tip by, unhealthy above 300"
        );
        metrics::describe_gauge!(
            Self::SYNC_PENDING_RECONCILIATIONS,
            "Outputs of repaired blocks whose spend has not been seen yet"
        );
        metrics::describe_gauge!(Self::SYNC_DRIVER_STATE, "Current chain-sync driver state");
    }

    fn zero() {
        metrics::counter!(Self::SYNC_FLUSHES_TOTAL).increment(0);
        for category in [
            Self::CATEGORY_BLOCKS,
            Self::CATEGORY_TRANSACTIONS,
            Self::CATEGORY_ADDRESSES,
            Self::CATEGORY_OUTPUTS,
            Self::CATEGORY_SPENDS,
        ] {
            metrics::counter!(Self::SYNC_ROWS_WRITTEN_TOTAL, "category" => category).increment(0);
        }
        metrics::counter!(Self::SYNC_PRUNED_OUTPUTS_TOTAL).increment(0);
        metrics::counter!(Self::SYNC_FLUSH_FAILURES_TOTAL).increment(0);
        for outcome in [Self::OUTCOME_APPLIED, Self::OUTCOME_IGNORED] {
            metrics::counter!(Self::SYNC_ROLLBACKS_TOTAL, "outcome" => outcome).increment(0);
        }
        metrics::counter!(Self::SYNC_SESSION_RESTARTS_TOTAL).increment(0);
        metrics::gauge!(Self::SYNC_PENDING_RECONCILIATIONS).set(0.0);
    }
}
