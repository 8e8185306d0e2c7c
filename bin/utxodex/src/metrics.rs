//! [`VersionInfo`] metrics

use metrics::gauge;

/// Build information exposed as a constant prometheus gauge.
#[derive(Debug, Clone)]
pub struct VersionInfo {
    /// The name of the application.
    pub name: &'static str,
    /// The version of the application.
    pub version: &'static str,
}

impl VersionInfo {
    /// Reads the version constants embedded at compile time.
    pub const fn from_build() -> Self {
        Self { name: crate::version::CARGO_PKG_NAME, version: crate::version::CARGO_PKG_VERSION }
    }

    /// Sets `utxodex_info` to 1, labelled with the build information.
    pub fn register_version_metrics(&self) {
        let labels: [(&str, &str); 2] = [("name", self.name), ("version", self.version)];
        gauge!("utxodex_info", &labels).set(1);
    }
}
