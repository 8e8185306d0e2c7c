//! Log flags and the configuration they resolve to.

use crate::LogFormat;
use clap::{ArgAction, Args, ValueEnum};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::level_filters::LevelFilter;

/// Logging flags shared by every binary.
#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct LogArgs {
    /// Raises the log level: unset is `info`, `-v` is `debug`, `-vv` and above is `trace`.
    #[arg(short = 'v', long = "verbosity", action = ArgAction::Count, global = true)]
    pub verbosity: u8,

    /// Disables logging to stdout.
    #[arg(long = "logs.stdout.quiet", env = "LOGS_STDOUT_QUIET", default_value_t = false)]
    pub stdout_quiet: bool,

    /// Format of the stdout logs.
    #[arg(long = "logs.stdout.format", env = "LOGS_STDOUT_FORMAT", default_value = "full")]
    pub stdout_format: LogFormat,

    /// Directory to write log files to. File logging is off when unset.
    #[arg(long = "logs.file.directory", env = "LOGS_FILE_DIRECTORY")]
    pub file_directory: Option<PathBuf>,

    /// Format of the file logs.
    #[arg(long = "logs.file.format", env = "LOGS_FILE_FORMAT", default_value = "full")]
    pub file_format: LogFormat,

    /// How often a new log file is started.
    #[arg(long = "logs.file.rotation", env = "LOGS_FILE_ROTATION", default_value = "never")]
    pub file_rotation: LogRotation,
}

impl Default for LogArgs {
    fn default() -> Self {
        Self {
            verbosity: 0,
            stdout_quiet: false,
            stdout_format: LogFormat::Full,
            file_directory: None,
            file_format: LogFormat::Full,
            file_rotation: LogRotation::Never,
        }
    }
}

impl LogArgs {
    /// Level enabled for every target unless `RUST_LOG` says otherwise.
    pub const fn level(&self) -> LevelFilter {
        match self.verbosity {
            0 => LevelFilter::INFO,
            1 => LevelFilter::DEBUG,
            _ => LevelFilter::TRACE,
        }
    }
}

/// Rotation period of log files.
#[derive(
    Default, Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[clap(rename_all = "lowercase")]
pub enum LogRotation {
    /// A new file every minute.
    Minutely,
    /// A new file every hour.
    Hourly,
    /// A new file every day.
    Daily,
    /// A single file.
    #[default]
    Never,
}

/// Stdout log output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StdoutLogConfig {
    /// Line format.
    pub format: LogFormat,
}

/// Log file output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileLogConfig {
    /// Directory holding the log files.
    pub directory_path: PathBuf,
    /// Line format.
    pub format: LogFormat,
    /// Rotation period.
    pub rotation: LogRotation,
}

/// Resolved logging setup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    /// Level applied on top of the environment filter.
    pub global_level: LevelFilter,
    /// Stdout output, if enabled.
    pub stdout_logs: Option<StdoutLogConfig>,
    /// File output, if enabled.
    pub file_logs: Option<FileLogConfig>,
}

impl LogConfig {
    /// Resolves the parsed flags.
    pub fn new(args: LogArgs) -> Self {
        let global_level = args.level();
        let stdout_logs =
            (!args.stdout_quiet).then_some(StdoutLogConfig { format: args.stdout_format });
        let file_logs = args.file_directory.map(|directory_path| FileLogConfig {
            directory_path,
            format: args.file_format,
            rotation: args.file_rotation,
        });
        Self { global_level, stdout_logs, file_logs }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self::new(LogArgs::default())
    }
}
