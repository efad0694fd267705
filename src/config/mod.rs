//! Configuration schema and loading.
//!
//! Every section is optional; a missing file means all defaults. Command-line
//! flags are layered on top by the binary.

mod general;
mod loading;
mod mpd;
mod mpris;
mod paths;
mod sync;

#[cfg(test)]
mod tests;

pub use general::{GeneralConfig, LogLevel};
pub use mpd::{DEFAULT_PORT, Endpoint, MpdConfig, MpdEnvironment, Network};
pub use mpris::MprisConfig;
pub use paths::ConfigPaths;
pub use sync::SyncConfig;

use serde::{Deserialize, Serialize};

/// Main configuration structure.
///
/// Represents the complete configuration schema that can be loaded
/// from TOML files. All fields have sensible defaults.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    /// General application settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Daemon connection.
    #[serde(default)]
    pub mpd: MpdConfig,

    /// Bus presence.
    #[serde(default)]
    pub mpris: MprisConfig,

    /// Synchronization tuning.
    #[serde(default)]
    pub sync: SyncConfig,
}
