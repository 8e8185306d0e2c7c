//! Prometheus exporter flags.

use clap::Args;
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};
use std::{
    net::{IpAddr, Ipv4Addr, SocketAddr},
    thread,
    time::Duration,
};

/// Interval between two samples of the process metrics.
const PROCESS_COLLECT_INTERVAL: Duration = Duration::from_secs(15);

/// Errors raised while installing the metrics exporter.
#[derive(Debug, thiserror::Error)]
pub enum MetricsError {
    /// The Prometheus recorder or its listener could not be installed.
    #[error("failed to install prometheus exporter: {0}")]
    Exporter(#[from] BuildError),

    /// The process collector thread could not be started.
    #[error("failed to spawn process metrics collector: {0}")]
    Collector(#[from] std::io::Error),
}

/// Configuration for the Prometheus metrics endpoint.
#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct MetricsArgs {
    /// Serve Prometheus metrics over HTTP.
    #[arg(long = "metrics.enabled", env = "METRICS_ENABLED", default_value_t = false)]
    pub enabled: bool,

    /// Address the metrics endpoint listens on.
    #[arg(long = "metrics.addr", env = "METRICS_ADDR", default_value = "0.0.0.0")]
    pub addr: IpAddr,

    /// Port the metrics endpoint listens on.
    #[arg(long = "metrics.port", env = "METRICS_PORT", default_value_t = 9090)]
    pub port: u16,
}

impl Default for MetricsArgs {
    fn default() -> Self {
        Self { enabled: false, addr: IpAddr::V4(Ipv4Addr::UNSPECIFIED), port: 9090 }
    }
}

impl MetricsArgs {
    /// Socket the metrics endpoint binds to.
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.addr, self.port)
    }

    /// Installs the Prometheus recorder and starts sampling process metrics.
    ///
    /// Does nothing unless `--metrics.enabled` is set. Must run before any metric is recorded.
    pub fn init_metrics(&self) -> Result<(), MetricsError> {
        if !self.enabled {
            return Ok(());
        }

        PrometheusBuilder::new().with_http_listener(self.socket_addr()).install()?;

        let collector = metrics_process::Collector::default();
        collector.describe();
        thread::Builder::new().name("process-metrics".to_string()).spawn(move || {
            loop {
                collector.collect();
                thread::sleep(PROCESS_COLLECT_INTERVAL);
            }
        })?;

        tracing::info!(
            target: "utxodex::metrics",
            addr = %self.socket_addr(),
            "Serving Prometheus metrics"
        );
        Ok(())
    }
}
