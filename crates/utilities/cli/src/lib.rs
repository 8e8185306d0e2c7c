//! Command line building blocks shared by the utxodex binaries: log and metrics flags, the
//! tracing subscriber setup and the help styling.

mod logs;
pub use logs::{FileLogConfig, LogArgs, LogConfig, LogRotation, StdoutLogConfig};

mod subscriber;
pub use subscriber::{LogFormat, init_test_tracing};

mod metrics;
pub use metrics::{MetricsArgs, MetricsError};

mod styles;
pub use styles::cli_styles;
