//! The chain-sync session loop.

use crate::{
    BlockDecoder, CheckpointResolver, Committer, FactBuffer, GapReconciler, Metrics,
    PruningPolicy, RollbackCoordinator, RollbackOutcome, SkipReason, SyncError, SyncMode,
    config::SyncConfig,
    source::{ChainSyncEvent, ChainSyncSource},
};
use derive_more::Display;
use std::{sync::Arc, time::Duration};
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace, warn};
use utxodex_storage::IndexStore;
use utxodex_types::{Block, ChainPoint, ChainTip};

/// Lifecycle state of a [`ChainSyncDriver`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum DriverState {
    /// Resetting in-memory state for a new session.
    #[display("initializing")]
    Initializing,
    /// Picking the resume point.
    #[display("resolving_intersect")]
    ResolvingIntersect,
    /// Normalizing the index to the resume point.
    #[display("rolling_back_to_intersect")]
    RollingBackToIntersect,
    /// Applying events.
    #[display("streaming")]
    Streaming,
    /// Waiting before a new session after losing the source.
    #[display("reconnecting")]
    Reconnecting,
}

impl DriverState {
    const ALL: [Self; 5] = [
        Self::Initializing,
        Self::ResolvingIntersect,
        Self::RollingBackToIntersect,
        Self::Streaming,
        Self::Reconnecting,
    ];
}

/// Streams chain-sync events from a [`ChainSyncSource`] into an [`IndexStore`].
///
/// Events are handled strictly one at a time: the next event is only requested once the
/// previous one, including any commit it triggered, is done.
#[derive(Debug)]
pub struct ChainSyncDriver<S, C> {
    sync: SyncConfig,
    source: Arc<C>,
    cancel_token: CancellationToken,

    decoder: BlockDecoder,
    buffer: FactBuffer,
    committer: Committer<S>,
    rollback: RollbackCoordinator<S>,
    checkpoint: CheckpointResolver<S>,
    reconciler: GapReconciler<S>,

    mode: SyncMode,
    state: DriverState,
    events_in_session: u64,
}

impl<S, C> ChainSyncDriver<S, C>
where
    S: IndexStore,
    C: ChainSyncSource,
{
    /// Creates a new [`ChainSyncDriver`].
    pub fn new(
        sync: SyncConfig,
        store: Arc<S>,
        source: Arc<C>,
        cancel_token: CancellationToken,
    ) -> Self {
        Metrics::init();
        Self {
            buffer: FactBuffer::new(sync.buffer_size),
            committer: Committer::new(store.clone(), PruningPolicy::new(sync.immutability_window))
                .with_origin_height(sync.origin.height),
            rollback: RollbackCoordinator::new(store.clone(), sync.origin.slot()),
            checkpoint: CheckpointResolver::new(store.clone(), sync.intersect_offset, sync.origin),
            reconciler: GapReconciler::new(store, sync.repair.clone()),
            decoder: BlockDecoder,
            mode: SyncMode::Normal,
            state: DriverState::Initializing,
            events_in_session: 0,
            sync,
            source,
            cancel_token,
        }
    }

    /// Current lifecycle state.
    pub const fn state(&self) -> DriverState {
        self.state
    }

    /// Current sync mode.
    pub const fn mode(&self) -> SyncMode {
        self.mode
    }

    /// Runs sessions until cancelled.
    ///
    /// Lost connections and storage failures restart the session after a backoff delay.
    ///
    /// # Errors
    /// Returns the first error a new session cannot recover from.
    pub async fn run(mut self) -> Result<(), SyncError> {
        let mut attempt = 0usize;
        loop {
            let err = match self.run_session().await {
                Ok(()) => {
                    info!(target: "utxodex::driver", "Chain sync stopped");
                    return Ok(());
                }
                Err(err) => err,
            };

            if !err.is_recoverable() {
                error!(target: "utxodex::driver", %err, "Chain sync failed");
                return Err(err);
            }

            if self.events_in_session > 0 {
                attempt = 0;
            }
            attempt += 1;

            self.transition(DriverState::Reconnecting);
            metrics::counter!(Metrics::SYNC_SESSION_RESTARTS_TOTAL).increment(1);
            self.source.reset().await;

            let delay = backoff_delay(attempt);
            warn!(
                target: "utxodex::driver",
                %err,
                ?delay,
                attempt,
                "Chain sync session ended, restarting after delay"
            );
            tokio::select! {
                _ = sleep(delay) => {}
                _ = self.cancel_token.cancelled() => {
                    info!(target: "utxodex::driver", "Chain sync cancelled during backoff");
                    return Ok(());
                }
            }
        }
    }

    /// Runs one session from intersect resolution until cancelled or failed.
    async fn run_session(&mut self) -> Result<(), SyncError> {
        self.transition(DriverState::Initializing);
        self.events_in_session = 0;
        self.buffer.clear();
        self.mode = SyncMode::Normal;
        if self.reconciler.is_active() {
            self.reconciler.initialize()?;
        }

        self.transition(DriverState::ResolvingIntersect);
        let intersect = self.checkpoint.resolve_intersect()?;

        self.transition(DriverState::RollingBackToIntersect);
        let intersect_slot = intersect.slot_or(self.sync.origin.slot());
        self.rollback.rewind_to(intersect_slot)?;

        let start = match self.sync.repair.oldest_missing() {
            Some(oldest_missing) => {
                self.mode = SyncMode::Repairing { original_intersect_slot: intersect_slot };
                let start = self.checkpoint.resolve_intersect_for_repair(
                    oldest_missing,
                    self.sync.repair.continue_from_height,
                )?;
                info!(
                    target: "utxodex::driver",
                    original_intersect_slot = intersect_slot,
                    %start,
                    missing_heights = self.sync.repair.missing_heights.len(),
                    "Starting gap repair"
                );
                start
            }
            None => intersect,
        };

        let intersection = self.source.find_intersection(vec![start]).await?;
        info!(
            target: "utxodex::driver",
            intersection = %intersection.intersection,
            tip = ?intersection.tip,
            mode = %self.mode,
            "Found intersection"
        );

        self.transition(DriverState::Streaming);
        loop {
            let event = tokio::select! {
                biased;
                _ = self.cancel_token.cancelled() => {
                    info!(target: "utxodex::driver", "Chain sync cancelled");
                    return Ok(());
                }
                event = self.source.next_event() => event?,
            };
            self.handle_event(event)?;
            self.events_in_session += 1;
        }
    }

    /// Applies one event to the index.
    pub fn handle_event(&mut self, event: ChainSyncEvent) -> Result<(), SyncError> {
        match event {
            ChainSyncEvent::RollForward { block, tip } => self.roll_forward(&block, &tip),
            ChainSyncEvent::RollBackward { point, tip } => self.roll_backward(&point, &tip),
        }
    }

    fn roll_forward(&mut self, block: &Block, tip: &ChainTip) -> Result<(), SyncError> {
        record_tip(tip);

        if self.mode.observe_slot(block.slot) {
            info!(target: "utxodex::driver", slot = block.slot, "Gap repair caught up, resuming normal sync");
        }

        match self.decoder.skip_reason(block, &self.mode, &self.sync.repair) {
            Some(SkipReason::Byron) => {
                trace!(target: "utxodex::driver", slot = block.slot, "Skipping Byron block");
                return Ok(());
            }
            Some(SkipReason::AlreadyIndexed) => {
                trace!(target: "utxodex::driver", slot = block.slot, height = block.height, "Skipping indexed block");
            }
            None => {
                let decoded = self.decoder.decode(block)?;
                self.reconciler.track(block.height, decoded.produced());
                self.buffer.push(decoded);
            }
        }

        let threshold = self.buffer.threshold(
            block.height,
            tip,
            self.sync.near_tip_distance,
            self.mode.is_repairing(),
        );
        if self.mode.is_repairing() {
            // Repaired outputs must be committed before spends of them are reconciled.
            if self.buffer.should_flush(threshold) {
                let pending = self.pending_reconciliations();
                self.committer.flush(&mut self.buffer, tip, None, pending)?;
            }
        } else {
            let pending = self.pending_reconciliations();
            self.committer.flush_if_ready(&mut self.buffer, threshold, tip, pending);
        }

        if self.reconciler.is_active() {
            self.reconciler.reconcile(block)?;
        }
        Ok(())
    }

    fn roll_backward(&mut self, point: &ChainPoint, tip: &ChainTip) -> Result<(), SyncError> {
        record_tip(tip);
        let pending_reconciliations = self.pending_reconciliations();
        let outcome = self.rollback.roll_backward(
            point,
            tip,
            &self.mode,
            &mut self.buffer,
            &self.committer,
            pending_reconciliations,
        )?;
        if let RollbackOutcome::Applied { slot, .. } = outcome {
            debug!(target: "utxodex::driver", slot, "Applied rollback");
        }
        Ok(())
    }

    fn pending_reconciliations(&self) -> Option<usize> {
        self.reconciler.is_active().then(|| self.reconciler.pending_len())
    }

    fn transition(&mut self, state: DriverState) {
        debug!(target: "utxodex::driver", from = %self.state, to = %state, "Driver state transition");
        self.state = state;
        for candidate in DriverState::ALL {
            let active = if candidate == state { 1.0 } else { 0.0 };
            metrics::gauge!(Metrics::SYNC_DRIVER_STATE, "state" => candidate.to_string())
                .set(active);
        }
    }
}

fn record_tip(tip: &ChainTip) {
    if let (Some(slot), Some(height)) = (tip.slot(), tip.height()) {
        metrics::gauge!(Metrics::SYNC_TIP_SLOT).set(slot as f64);
        metrics::gauge!(Metrics::SYNC_TIP_HEIGHT).set(height as f64);
    }
}

/// Calculates exponential backoff delay with a max cap (30s).
pub fn backoff_delay(attempt: usize) -> Duration {
    let secs = 2u64.saturating_pow(attempt.min(5) as u32);
    Duration::from_secs(secs.min(30))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::RepairConfig,
        source::{Intersection, SourceError},
    };
    use alloy_primitives::B256;
    use async_trait::async_trait;
    use mockall::mock;
    use rstest::rstest;
    use std::collections::BTreeSet;
    use utxodex_storage::IndexDb;
    use utxodex_types::{Era, HexHash, Point, Tip, UtxoId};

    mock! {
        #[derive(Debug)]
        pub Source {}

        #[async_trait]
        impl ChainSyncSource for Source {
            async fn find_intersection(&self, points: Vec<ChainPoint>) -> Result<Intersection, SourceError>;
            async fn next_event(&self) -> Result<ChainSyncEvent, SourceError>;
            async fn reset(&self);
        }
    }

    fn tip(height: u64) -> ChainTip {
        ChainTip::At(Tip { slot: height * 10, id: HexHash(B256::ZERO), height })
    }

    fn block(era: Era, height: u64) -> Block {
        Block {
            era,
            id: HexHash(B256::repeat_byte(height as u8)),
            height,
            slot: height * 10,
            transactions: vec![],
        }
    }

    fn forward(era: Era, height: u64) -> ChainSyncEvent {
        ChainSyncEvent::RollForward { block: Box::new(block(era, height)), tip: tip(1_000) }
    }

    fn driver(
        sync: SyncConfig,
        source: MockSource,
    ) -> (ChainSyncDriver<IndexDb, MockSource>, Arc<IndexDb>) {
        let db = Arc::new(IndexDb::in_memory().unwrap());
        let driver =
            ChainSyncDriver::new(sync, db.clone(), Arc::new(source), CancellationToken::new());
        (driver, db)
    }

    fn indexed_slots(db: &IndexDb) -> Vec<u64> {
        db.snapshot().unwrap().blocks.iter().map(|block| block.slot).collect()
    }

    #[rstest]
    #[case(1, 2)]
    #[case(3, 8)]
    #[case(5, 30)]
    #[case(9, 30)]
    fn test_backoff_delay(#[case] attempt: usize, #[case] secs: u64) {
        assert_eq!(backoff_delay(attempt), Duration::from_secs(secs));
    }

    #[test]
    fn test_byron_blocks_are_skipped() {
        let (mut driver, db) = driver(SyncConfig::default(), MockSource::new());
        driver.handle_event(forward(Era::Byron, 5)).unwrap();
        driver.handle_event(forward(Era::Conway, 999)).unwrap();
        assert_eq!(indexed_slots(&db), vec![9_990]);
    }

    #[test]
    fn test_far_from_tip_blocks_are_buffered() {
        let sync = SyncConfig { buffer_size: 3, ..Default::default() };
        let (mut driver, db) = driver(sync, MockSource::new());

        driver.handle_event(forward(Era::Conway, 1)).unwrap();
        driver.handle_event(forward(Era::Conway, 2)).unwrap();
        assert!(indexed_slots(&db).is_empty());

        driver.handle_event(forward(Era::Conway, 3)).unwrap();
        assert_eq!(indexed_slots(&db), vec![10, 20, 30]);
    }

    #[test]
    fn test_rollback_event_reverts_index() {
        let (mut driver, db) = driver(SyncConfig::default(), MockSource::new());
        for height in 1..=4 {
            driver.handle_event(forward(Era::Conway, height)).unwrap();
        }

        let point = ChainPoint::At(Point::new(20, B256::repeat_byte(2)));
        driver.handle_event(ChainSyncEvent::RollBackward { point, tip: tip(1_000) }).unwrap();
        assert_eq!(indexed_slots(&db), vec![10, 20]);
    }

    #[tokio::test]
    async fn test_session_rewinds_to_intersect_before_streaming() {
        let mut source = MockSource::new();
        source
            .expect_find_intersection()
            .withf(|points| points == &vec![ChainPoint::At(Point::new(20, B256::repeat_byte(2)))])
            .times(1)
            .returning(|points| Ok(Intersection { intersection: points[0], tip: tip(1_000) }));
        source.expect_next_event().times(1).returning(|| Ok(forward(Era::Conway, 3)));
        source
            .expect_next_event()
            .returning(|| Err(SourceError::Params(serde_json::from_str::<()>("{").unwrap_err())));

        let sync = SyncConfig { intersect_offset: 1, buffer_size: 1, ..Default::default() };
        let (mut driver, db) = driver(sync, source);
        for height in 1..=3 {
            driver.handle_event(forward(Era::Conway, height)).unwrap();
        }

        let err = driver.run_session().await.unwrap_err();
        assert!(!err.is_recoverable());
        assert_eq!(driver.state(), DriverState::Streaming);
        // Block 3 was removed by the intersect rollback and streamed again.
        assert_eq!(indexed_slots(&db), vec![10, 20, 30]);
    }

    #[tokio::test]
    async fn test_repair_session_starts_below_oldest_missing_height() {
        let mut source = MockSource::new();
        source
            .expect_find_intersection()
            .withf(|points| points == &vec![ChainPoint::At(Point::new(10, B256::repeat_byte(1)))])
            .times(1)
            .returning(|points| Ok(Intersection { intersection: points[0], tip: tip(1_000) }));
        source.expect_next_event().returning(|| Err(SourceError::Disconnected));

        let sync = SyncConfig {
            intersect_offset: 0,
            buffer_size: 1,
            repair: RepairConfig {
                missing_heights: BTreeSet::from([2]),
                continue_from_height: None,
            },
            ..Default::default()
        };
        let (mut driver, _db) = driver(sync, source);
        for height in [1, 3, 4] {
            driver.handle_event(forward(Era::Conway, height)).unwrap();
        }

        let err = driver.run_session().await.unwrap_err();
        assert!(err.is_recoverable());
        assert_eq!(driver.mode(), SyncMode::Repairing { original_intersect_slot: 40 });
    }

    #[test]
    fn test_pending_reconciliations_reported_only_while_repairing() {
        let (driver_normal, _db) = driver(SyncConfig::default(), MockSource::new());
        assert_eq!(driver_normal.pending_reconciliations(), None);

        let sync = SyncConfig {
            repair: RepairConfig {
                missing_heights: BTreeSet::from([2]),
                continue_from_height: None,
            },
            ..Default::default()
        };
        let (mut driver, _db) = driver(sync, MockSource::new());
        assert_eq!(driver.pending_reconciliations(), Some(0));

        driver.reconciler.track(2, [UtxoId::new(B256::repeat_byte(7), 0)]);
        assert_eq!(driver.pending_reconciliations(), Some(1));
        driver.handle_event(forward(Era::Conway, 3)).unwrap();
        assert_eq!(driver.pending_reconciliations(), Some(1));
    }

    #[tokio::test]
    async fn test_run_stops_on_cancel() {
        let mut source = MockSource::new();
        source
            .expect_find_intersection()
            .returning(|points| Ok(Intersection { intersection: points[0], tip: tip(1_000) }));
        source.expect_next_event().returning(|| Ok(forward(Era::Conway, 1)));

        let db = Arc::new(IndexDb::in_memory().unwrap());
        let cancel_token = CancellationToken::new();
        let driver = ChainSyncDriver::new(
            SyncConfig::default(),
            db,
            Arc::new(source),
            cancel_token.clone(),
        );
        cancel_token.cancel();

        assert!(driver.run().await.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_restarts_after_disconnect() {
        let mut source = MockSource::new();
        let mut seq = mockall::Sequence::new();
        source
            .expect_find_intersection()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Err(SourceError::Disconnected));
        source.expect_reset().times(1).in_sequence(&mut seq).returning(|| ());
        source
            .expect_find_intersection()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|points| Ok(Intersection { intersection: points[0], tip: tip(1_000) }));
        source
            .expect_next_event()
            .returning(|| Err(SourceError::Params(serde_json::from_str::<()>("{").unwrap_err())));

        let (driver, _db) = driver(SyncConfig::default(), source);
        let err = driver.run().await.unwrap_err();
        assert!(matches!(err, SyncError::Source(SourceError::Params(_))));
    }
}
