/// Decides which spent outputs are old enough to delete.
///
/// An output spent more than `immutability_window` slots before the latest flushed block
/// can no longer be revived by a rollback, so its row is dead weight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PruningPolicy {
    immutability_window: u64,
}

impl PruningPolicy {
    /// Creates a policy keeping spends of the last `immutability_window` slots.
    pub const fn new(immutability_window: u64) -> Self {
        Self { immutability_window }
    }

    /// Returns the slot before which spent outputs are deleted by a flush ending at
    /// `latest_slot`.
    ///
    /// Flushes preceding a rollback never prune.
    pub const fn prune_spent_before(
        &self,
        latest_slot: Option<u64>,
        rollback_to: Option<u64>,
    ) -> Option<u64> {
        match (latest_slot, rollback_to) {
            (Some(slot), None) => slot.checked_sub(self.immutability_window),
            _ => None,
        }
    }
}
