use crate::{decoder::DecodeError, source::SourceError};
use thiserror::Error;
use utxodex_storage::StorageError;

/// Errors that end a chain-sync session.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SyncError {
    /// The index storage failed outside of a buffered flush.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// The event source failed.
    #[error(transparent)]
    Source(#[from] SourceError),

    /// A block could not be turned into facts.
    #[error(transparent)]
    Decode(#[from] DecodeError),
}

impl SyncError {
    /// Returns `true` if a fresh session may succeed where this one failed.
    ///
    /// Storage errors qualify because every session starts by rolling the index back to a
    /// consistent point. Decode errors and protocol failures would repeat on replay.
    pub const fn is_recoverable(&self) -> bool {
        match self {
            Self::Storage(_) => true,
            Self::Source(err) => err.is_disconnect(),
            Self::Decode(_) => false,
        }
    }
}
