//! [tracing_subscriber] setup.

use crate::{FileLogConfig, LogConfig, LogRotation};
use serde::{Deserialize, Serialize};
use std::io;
use tracing_subscriber::{
    EnvFilter, Layer, Registry,
    fmt::MakeWriter,
    layer::SubscriberExt,
    util::{SubscriberInitExt, TryInitError},
};

/// Prefix of the log file names.
const LOG_FILE_NAME: &str = "utxodex.log";

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// The format of the logs.
#[derive(
    Default, Debug, Clone, Copy, PartialEq, Eq, Hash, clap::ValueEnum, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[clap(rename_all = "lowercase")]
pub enum LogFormat {
    /// Full format (default).
    #[default]
    Full,
    /// JSON format.
    Json,
    /// Pretty format.
    Pretty,
    /// Compact format.
    Compact,
}

impl LogFormat {
    fn layer<W>(self, writer: W) -> BoxedLayer
    where
        W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
    {
        let layer = tracing_subscriber::fmt::layer().with_writer(writer);
        match self {
            Self::Full => layer.boxed(),
            Self::Json => layer.json().boxed(),
            Self::Pretty => layer.pretty().boxed(),
            Self::Compact => layer.compact().boxed(),
        }
    }
}

impl FileLogConfig {
    fn layer(&self) -> BoxedLayer {
        let dir = self.directory_path.clone();
        let appender = match self.rotation {
            LogRotation::Minutely => tracing_appender::rolling::minutely(dir, LOG_FILE_NAME),
            LogRotation::Hourly => tracing_appender::rolling::hourly(dir, LOG_FILE_NAME),
            LogRotation::Daily => tracing_appender::rolling::daily(dir, LOG_FILE_NAME),
            LogRotation::Never => tracing_appender::rolling::never(dir, LOG_FILE_NAME),
        };
        self.format.layer(appender)
    }
}

impl LogConfig {
    /// Installs the global subscriber.
    ///
    /// `env_filter` defaults to `RUST_LOG`; [`LogConfig::global_level`] is added on top of it.
    ///
    /// # Errors
    /// Fails if a global subscriber is already set.
    pub fn init_tracing_subscriber(
        &self,
        env_filter: Option<EnvFilter>,
    ) -> Result<(), TryInitError> {
        let layers: Vec<BoxedLayer> = self
            .stdout_logs
            .map(|stdout| stdout.format.layer(io::stdout))
            .into_iter()
            .chain(self.file_logs.as_ref().map(FileLogConfig::layer))
            .collect();

        let env_filter = env_filter
            .unwrap_or_else(EnvFilter::from_default_env)
            .add_directive(self.global_level.into());

        tracing_subscriber::registry().with(layers).with(env_filter).try_init()
    }
}

/// Installs the default subscriber for tests. Later calls are no-ops.
pub fn init_test_tracing() {
    let _ = LogConfig::default().init_tracing_subscriber(None);
}
