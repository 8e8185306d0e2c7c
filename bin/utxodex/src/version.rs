//! Version information for utxodex.

/// The latest version from Cargo.toml.
pub(crate) const CARGO_PKG_VERSION: &str = env!("CARGO_PKG_VERSION");

/// The package name from Cargo.toml.
pub(crate) const CARGO_PKG_NAME: &str = env!("CARGO_PKG_NAME");
