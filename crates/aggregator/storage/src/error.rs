use thiserror::Error;

/// Errors that may occur while interacting with the index storage.
///
/// This enum is used across all implementations of the storage traits.
#[derive(Debug, Error)]
pub enum StorageError {
    /// An error reported by SQLite.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// An I/O error while preparing the data directory.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Another thread panicked while holding the connection.
    #[error("lock poisoned")]
    LockPoisoned,

    /// A token filter does not name a hex policy id and asset name.
    #[error("invalid token filter: {0}")]
    InvalidTokenFilter(String),
}

impl PartialEq for StorageError {
    fn eq(&self, other: &Self) -> bool {
        use StorageError::*;
        match (self, other) {
            (Database(a), Database(b)) => a.to_string() == b.to_string(),
            (Io(a), Io(b)) => a.kind() == b.kind(),
            (LockPoisoned, LockPoisoned) => true,
            (InvalidTokenFilter(a), InvalidTokenFilter(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for StorageError {}
