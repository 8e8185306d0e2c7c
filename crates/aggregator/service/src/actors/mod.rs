//! [AggregatorActor] services for the aggregator.
//!
//! [AggregatorActor]: super::AggregatorActor

mod traits;
pub use traits::AggregatorActor;

mod metric;
pub use metric::MetricWorker;

mod sync;
pub use sync::SyncActor;
