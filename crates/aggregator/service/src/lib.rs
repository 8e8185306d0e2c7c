//! This crate provides the runnable service layer of the utxodex aggregator.
//! It wires the chain-sync driver to the index database and the event source.

mod service;
pub use service::Service;

mod actors;
pub use actors::{AggregatorActor, MetricWorker, SyncActor};
