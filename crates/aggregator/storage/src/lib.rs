//! Persistent storage for the UTxO index.
//!
//! The index is a single SQLite database holding four tables:
//! - `block`: every applied block keyed by slot
//! - `tx`: transactions with their position inside the block
//! - `address`: raw address bytes with the slot they first appeared at
//! - `transaction_output`: outputs with their spend slot and the original JSON payload
//!
//! Writes go through [`IndexWriter`] and [`IndexRewinder`], each call running in a single
//! SQLite transaction. Reads used by the sync driver live in [`BlockReader`]; the wider
//! query surface lives in [`IndexReader`].

mod error;
pub use error::StorageError;

mod models;
pub use models::{AssetId, CommitOptions, CommitStats, RollbackStats, UtxoQuery};

mod traits;
pub use traits::{BlockReader, IndexReader, IndexRewinder, IndexStore, IndexWriter};

mod providers;

mod index_db;
pub use index_db::IndexDb;
#[cfg(any(test, feature = "test-utils"))]
pub use index_db::IndexSnapshot;

mod metrics;
pub(crate) use metrics::Metrics;
