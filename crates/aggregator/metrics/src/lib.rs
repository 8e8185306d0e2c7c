//! Metric helpers shared by the utxodex crates.
//!
//! The macros expand to `metrics::counter!` and `metrics::histogram!` calls, so every
//! crate using them must depend on `metrics` directly.

mod macros;

mod reporter;
pub use reporter::MetricsReporter;
