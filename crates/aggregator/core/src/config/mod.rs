//! Configuration for the chain-sync aggregator.

mod core_config;
pub use core_config::{Config, RepairConfig, SyncConfig};

mod network;
pub use network::{Network, NetworkParseError, OriginPoint};
