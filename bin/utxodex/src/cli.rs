//! Contains the utxodex CLI.

use crate::{flags::AggregatorArgs, metrics::VersionInfo, version};
use anyhow::Result;
use clap::Parser;
use tracing::{error, info};
use utxodex_cli::{LogArgs, LogConfig, MetricsArgs, cli_styles};
use utxodex_service::Service;

/// Indexes Cardano blocks, transactions and UTxOs from an Ogmios chain-sync stream.
#[derive(Parser, Debug)]
#[command(name = "utxodex", version = version::CARGO_PKG_VERSION, styles = cli_styles())]
pub struct Cli {
    /// Global args
    #[command(flatten)]
    pub global: LogArgs,

    /// Prometheus metrics args
    #[command(flatten)]
    pub metrics: MetricsArgs,

    /// Aggregator args
    #[command(flatten)]
    pub aggregator: AggregatorArgs,
}

impl Cli {
    /// Runs the CLI.
    pub fn run(self) -> Result<()> {
        self.metrics.init_metrics()?;
        if self.metrics.enabled {
            VersionInfo::from_build().register_version_metrics();
        }

        self.init_logs(&self.global)?;

        let config = self.aggregator.init_config()?;
        info!(
            target: "utxodex",
            network = %config.network,
            datadir = %config.datadir.display(),
            ogmios = %config.ogmios_url,
            "Starting utxodex"
        );

        Self::run_until_ctrl_c(async move {
            let mut service = Service::new(config);

            let res = tokio::select! {
                res = service.run() => res,
                _ = tokio::signal::ctrl_c() => {
                    info!(target: "utxodex", "Ctrl+C received, initiating service shutdown...");
                    Ok(())
                }
            };
            if let Err(err) = &res {
                error!(target: "utxodex", %err, "Error running aggregator service");
            }

            service.shutdown().await?;
            res?;
            info!(target: "utxodex", "Aggregator service shut down gracefully.");
            Ok(())
        })
    }

    /// Run until ctrl-c is pressed.
    pub fn run_until_ctrl_c<F>(fut: F) -> Result<()>
    where
        F: std::future::Future<Output = Result<()>>,
    {
        let rt = Self::tokio_runtime().map_err(|e| anyhow::anyhow!(e))?;
        rt.block_on(fut)
    }

    /// Creates a new default tokio multi-thread [`Runtime`](tokio::runtime::Runtime) with all
    /// features enabled
    pub fn tokio_runtime() -> Result<tokio::runtime::Runtime, std::io::Error> {
        tokio::runtime::Builder::new_multi_thread().enable_all().build()
    }

    /// Installs the tracing subscriber.
    pub fn init_logs(&self, args: &LogArgs) -> Result<()> {
        let filter = tracing_subscriber::EnvFilter::from_default_env();
        LogConfig::new(args.clone()).init_tracing_subscriber(Some(filter))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_full_command_line() {
        let cli = Cli::try_parse_from([
            "utxodex",
            "-v",
            "--metrics.enabled",
            "--datadir",
            "/data",
            "--network",
            "preview",
        ])
        .unwrap();

        assert_eq!(cli.global.verbosity, 1);
        assert!(cli.metrics.enabled);
        assert_eq!(cli.aggregator.datadir.to_str(), Some("/data"));
    }
}
