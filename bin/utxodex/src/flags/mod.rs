//! Command line flags of the aggregator.

mod aggregator;
pub use aggregator::AggregatorArgs;
