use anyhow::{Context as _, Result};
use clap::Args;
use std::{collections::BTreeSet, path::PathBuf};
use utxodex_core::config::{Config, Network, RepairConfig, SyncConfig};

/// Aggregator configuration arguments.
#[derive(Args, Debug, Clone)]
pub struct AggregatorArgs {
    /// Websocket URL of the Ogmios endpoint.
    #[arg(long = "ogmios.url", env = "OGMIOS_URL", default_value = "ws://localhost:1337")]
    pub ogmios_url: String,

    /// Directory to store the index database in.
    #[arg(long, env = "DATADIR")]
    pub datadir: PathBuf,

    /// Network to index: mainnet, preprod or preview.
    #[arg(long, env = "NETWORK", default_value = "mainnet")]
    pub network: Network,

    /// Spent outputs further than this many slots behind the latest block are pruned.
    #[arg(
        long = "sync.immutability-window",
        default_value_t = SyncConfig::DEFAULT_IMMUTABILITY_WINDOW
    )]
    pub immutability_window: u64,

    /// Blocks this close to the chain tip are committed one at a time.
    #[arg(long = "sync.near-tip-distance", default_value_t = SyncConfig::DEFAULT_NEAR_TIP_DISTANCE)]
    pub near_tip_distance: u64,

    /// Buffered rows of any one kind that trigger a commit while catching up.
    #[arg(long = "sync.buffer-size", default_value_t = SyncConfig::DEFAULT_BUFFER_SIZE)]
    pub buffer_size: usize,

    /// Number of blocks behind the latest indexed one to resume streaming from.
    #[arg(long = "sync.intersect-offset", default_value_t = SyncConfig::DEFAULT_INTERSECT_OFFSET)]
    pub intersect_offset: u64,

    /// Comma separated heights of blocks missing from the index, replayed on startup.
    #[arg(
        long = "repair.missing-heights",
        env = "FIXUP_MISSING_BLOCKS",
        value_delimiter = ',',
        value_parser = parse_height
    )]
    pub missing_heights: Vec<u64>,

    /// Resume an interrupted repair from below this height instead of the oldest missing one.
    #[arg(long = "repair.continue-from-height", env = "FIXUP_CONTINUE_FROM_HEIGHT")]
    pub continue_from_height: Option<u64>,
}

fn parse_height(s: &str) -> Result<u64, String> {
    s.trim().parse().map_err(|err| format!("invalid block height '{s}': {err}"))
}

impl AggregatorArgs {
    /// Builds the aggregator [`Config`] from the parsed flags.
    pub fn init_config(&self) -> Result<Config> {
        let datadir = if self.datadir.is_relative() {
            std::env::current_dir()
                .context("Failed to resolve the working directory")?
                .join(&self.datadir)
        } else {
            self.datadir.clone()
        };

        let missing_heights: BTreeSet<u64> = self.missing_heights.iter().copied().collect();
        if let (Some(continue_from), Some(oldest)) =
            (self.continue_from_height, missing_heights.first())
        {
            if continue_from < *oldest {
                tracing::warn!(
                    target: "utxodex",
                    continue_from,
                    oldest_missing = *oldest,
                    "Repair continues from below the oldest missing height, replaying extra history"
                );
            }
        }

        Ok(Config {
            ogmios_url: self.ogmios_url.clone(),
            datadir,
            network: self.network,
            sync: SyncConfig {
                immutability_window: self.immutability_window,
                near_tip_distance: self.near_tip_distance,
                buffer_size: self.buffer_size,
                intersect_offset: self.intersect_offset,
                origin: self.network.origin(),
                repair: RepairConfig {
                    missing_heights,
                    continue_from_height: self.continue_from_height,
                },
            },
        })
    }
}
