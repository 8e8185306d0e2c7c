use derive_more::Display;

/// Whether the driver is replaying known gaps or following the chain normally.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Display)]
pub enum SyncMode {
    /// Every block is indexed.
    #[default]
    #[display("normal")]
    Normal,
    /// Only blocks at missing heights are indexed until the stream passes the slot the
    /// session would have resumed from without repair.
    #[display("repairing")]
    Repairing {
        /// Slot of the normal resume point.
        original_intersect_slot: u64,
    },
}

impl SyncMode {
    /// Returns `true` in [`SyncMode::Repairing`].
    pub const fn is_repairing(&self) -> bool {
        matches!(self, Self::Repairing { .. })
    }

    /// The normal resume slot while repairing.
    pub const fn original_intersect_slot(&self) -> Option<u64> {
        match self {
            Self::Repairing { original_intersect_slot } => Some(*original_intersect_slot),
            Self::Normal => None,
        }
    }

    /// Switches back to [`SyncMode::Normal`] once `slot` is past the normal resume slot.
    ///
    /// Returns `true` if the mode changed.
    pub const fn observe_slot(&mut self, slot: u64) -> bool {
        match self {
            Self::Repairing { original_intersect_slot } if slot > *original_intersect_slot => {
                *self = Self::Normal;
                true
            }
            _ => false,
        }
    }

    /// Returns `true` if a rollback to `slot` must leave the index untouched.
    ///
    /// History below the normal resume slot is outside the replayed range and was not
    /// reindexed by this session.
    pub const fn ignores_rollback_to(&self, slot: u64) -> bool {
        match self {
            Self::Repairing { original_intersect_slot } => slot < *original_intersect_slot,
            Self::Normal => false,
        }
    }
}
