use super::{Network, OriginPoint};
use std::{collections::BTreeSet, path::PathBuf};

/// Configuration for the aggregator service.
#[derive(Debug, Clone)]
pub struct Config {
    /// Websocket URL of the Ogmios chain-sync endpoint.
    pub ogmios_url: String,

    /// Directory holding the index database.
    pub datadir: PathBuf,

    /// The network being indexed.
    pub network: Network,

    /// Streaming, buffering and repair settings.
    pub sync: SyncConfig,
}

impl Config {
    /// File name of the index database inside [`Config::datadir`].
    pub const DB_FILE_NAME: &'static str = "utxodex.sqlite";

    /// Full path of the index database.
    pub fn db_path(&self) -> PathBuf {
        self.datadir.join(Self::DB_FILE_NAME)
    }
}

/// Settings of the chain-sync driver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncConfig {
    /// Spent outputs older than this many slots behind the latest flushed block are pruned.
    pub immutability_window: u64,

    /// Blocks within this many heights of the chain tip are flushed one by one.
    pub near_tip_distance: u64,

    /// Number of buffered facts of any single kind that triggers a flush far from the tip.
    pub buffer_size: usize,

    /// How many blocks behind the latest indexed block streaming resumes from.
    pub intersect_offset: u64,

    /// Where streaming starts when the index is empty.
    pub origin: OriginPoint,

    /// Gap repair settings.
    pub repair: RepairConfig,
}

impl SyncConfig {
    /// Default immutability window, two days of slots.
    pub const DEFAULT_IMMUTABILITY_WINDOW: u64 = 172_800;
    /// Default near-tip distance.
    pub const DEFAULT_NEAR_TIP_DISTANCE: u64 = 10;
    /// Default buffer size.
    pub const DEFAULT_BUFFER_SIZE: usize = 1_000;
    /// Default intersect offset.
    pub const DEFAULT_INTERSECT_OFFSET: u64 = 10;

    /// Default settings starting from the origin of `network`.
    pub fn for_network(network: Network) -> Self {
        Self {
            immutability_window: Self::DEFAULT_IMMUTABILITY_WINDOW,
            near_tip_distance: Self::DEFAULT_NEAR_TIP_DISTANCE,
            buffer_size: Self::DEFAULT_BUFFER_SIZE,
            intersect_offset: Self::DEFAULT_INTERSECT_OFFSET,
            origin: network.origin(),
            repair: RepairConfig::default(),
        }
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self::for_network(Network::default())
    }
}

/// Block heights known to be missing from the index, and where to replay them from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepairConfig {
    /// Heights of blocks that were never indexed.
    pub missing_heights: BTreeSet<u64>,

    /// Overrides the height replay starts below, to resume an interrupted repair.
    pub continue_from_height: Option<u64>,
}

impl RepairConfig {
    /// Returns `true` when there is anything to repair.
    pub fn is_enabled(&self) -> bool {
        !self.missing_heights.is_empty()
    }

    /// The lowest missing height.
    pub fn oldest_missing(&self) -> Option<u64> {
        self.missing_heights.first().copied()
    }

    /// Returns `true` if `height` is one of the missing heights.
    pub fn is_missing(&self, height: u64) -> bool {
        self.missing_heights.contains(&height)
    }
}
