//! Chain-sync aggregation pipeline of the utxodex UTxO index.
//!
//! A [`ChainSyncDriver`] pulls events from a [`source::ChainSyncSource`] one at a time and
//! keeps an [`utxodex_storage::IndexStore`] in step with the chain: forward blocks are decoded
//! into facts and buffered, buffers are committed in a single transaction, and rollbacks revert
//! every fact derived from the abandoned chain suffix.

pub mod config;
pub mod source;

mod error;
pub use error::SyncError;

mod mode;
pub use mode::SyncMode;

mod decoder;
pub use decoder::{BlockDecoder, DecodeError, DecodedBlock, SkipReason};

mod buffer;
pub use buffer::FactBuffer;

mod pruning;
pub use pruning::PruningPolicy;

mod committer;
pub use committer::{Committer, FlushReport};

mod rollback;
pub use rollback::{RollbackCoordinator, RollbackOutcome};

mod checkpoint;
pub use checkpoint::CheckpointResolver;

mod reconciler;
pub use reconciler::GapReconciler;

mod driver;
pub use driver::{ChainSyncDriver, DriverState, backoff_delay};

mod metrics;
pub(crate) use metrics::Metrics;
