use crate::config::OriginPoint;
use std::sync::Arc;
use tracing::info;
use utxodex_storage::{BlockReader, StorageError};
use utxodex_types::ChainPoint;

/// Picks the point a session starts streaming from.
#[derive(Debug)]
pub struct CheckpointResolver<S> {
    store: Arc<S>,
    intersect_offset: u64,
    origin: OriginPoint,
}

impl<S> CheckpointResolver<S>
where
    S: BlockReader,
{
    /// Creates a new [`CheckpointResolver`].
    pub const fn new(store: Arc<S>, intersect_offset: u64, origin: OriginPoint) -> Self {
        Self { store, intersect_offset, origin }
    }

    /// Resumes `intersect_offset` blocks behind the latest indexed block, so that a fork
    /// switched while the aggregator was down is replayed. Falls back to the origin point.
    pub fn resolve_intersect(&self) -> Result<ChainPoint, StorageError> {
        let point = self
            .store
            .nth_latest_block(self.intersect_offset)?
            .map_or(self.origin.point, |block| ChainPoint::At(block.point()));
        info!(target: "utxodex::checkpoint", %point, offset = self.intersect_offset, "Resolved intersect");
        Ok(point)
    }

    /// Resumes at the latest indexed block below `continue_from`, or below `oldest_missing`
    /// when no override is given. Falls back to the origin point.
    pub fn resolve_intersect_for_repair(
        &self,
        oldest_missing: u64,
        continue_from: Option<u64>,
    ) -> Result<ChainPoint, StorageError> {
        let below = continue_from.unwrap_or(oldest_missing);
        let point = self
            .store
            .latest_block_below_height(below)?
            .map_or(self.origin.point, |block| ChainPoint::At(block.point()));
        info!(target: "utxodex::checkpoint", %point, below, "Resolved repair intersect");
        Ok(point)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::B256;
    use mockall::{mock, predicate::eq};
    use rstest::rstest;
    use utxodex_types::{BlockRef, Point, UtxoId};

    mock! {
        #[derive(Debug)]
        pub Reader {}

        impl BlockReader for Reader {
            fn latest_block(&self) -> Result<Option<BlockRef>, StorageError>;
            fn nth_latest_block(&self, offset: u64) -> Result<Option<BlockRef>, StorageError>;
            fn latest_block_below_height(&self, height: u64) -> Result<Option<BlockRef>, StorageError>;
            fn unspent_outputs_at_heights(&self, heights: &[u64]) -> Result<Vec<UtxoId>, StorageError>;
        }
    }

    fn block(slot: u64, height: u64) -> BlockRef {
        BlockRef::new(slot, B256::repeat_byte(7), height)
    }

    fn origin() -> OriginPoint {
        OriginPoint::new(ChainPoint::At(Point::new(99, B256::repeat_byte(9))), 5)
    }

    #[test]
    fn test_resolve_intersect_uses_offset() {
        let mut reader = MockReader::new();
        reader.expect_nth_latest_block().with(eq(10)).times(1).returning(|_| Ok(Some(block(500, 50))));

        let resolver = CheckpointResolver::new(Arc::new(reader), 10, origin());
        assert_eq!(resolver.resolve_intersect().unwrap(), ChainPoint::At(block(500, 50).point()));
    }

    #[test]
    fn test_resolve_intersect_falls_back_to_origin() {
        let mut reader = MockReader::new();
        reader.expect_nth_latest_block().returning(|_| Ok(None));

        let resolver = CheckpointResolver::new(Arc::new(reader), 10, origin());
        assert_eq!(resolver.resolve_intersect().unwrap(), origin().point);
    }

    #[rstest]
    #[case(120, None, 120)]
    #[case(120, Some(90), 90)]
    fn test_repair_intersect_height(
        #[case] oldest: u64,
        #[case] continue_from: Option<u64>,
        #[case] expected_below: u64,
    ) {
        let mut reader = MockReader::new();
        reader
            .expect_latest_block_below_height()
            .with(eq(expected_below))
            .times(1)
            .returning(|height| Ok(Some(block(height * 10 - 10, height - 1))));

        let resolver = CheckpointResolver::new(Arc::new(reader), 10, origin());
        let point = resolver.resolve_intersect_for_repair(oldest, continue_from).unwrap();
        assert_eq!(point.slot_or(0), expected_below * 10 - 10);
    }

    #[test]
    fn test_repair_intersect_falls_back_to_origin() {
        let mut reader = MockReader::new();
        reader.expect_latest_block_below_height().returning(|_| Ok(None));

        let resolver = CheckpointResolver::new(Arc::new(reader), 10, OriginPoint::GENESIS);
        assert_eq!(resolver.resolve_intersect_for_repair(3, None).unwrap(), ChainPoint::Origin);
    }

    #[test]
    fn test_storage_error_is_returned() {
        let mut reader = MockReader::new();
        reader.expect_nth_latest_block().returning(|_| Err(StorageError::LockPoisoned));

        let resolver = CheckpointResolver::new(Arc::new(reader), 10, origin());
        assert_eq!(resolver.resolve_intersect().unwrap_err(), StorageError::LockPoisoned);
    }
}
