use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::services::mpris::Thresholds;

/// Tuning of the state synchronization loop.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SyncConfig {
    /// Seconds between keepalive pings, overridden by `MPD_TIMEOUT`
    pub keepalive_secs: u64,

    /// Position jumps above this many milliseconds are reported as seeks
    pub seek_trigger_ms: u64,

    /// Volume changes below this fraction of full scale are ignored
    pub volume_dead_band: f64,

    /// Advance the position locally once a second while playing
    pub position_interpolation: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            keepalive_secs: 25,
            seek_trigger_ms: 2000,
            volume_dead_band: 0.005,
            position_interpolation: true,
        }
    }
}

impl SyncConfig {
    /// Change detection limits for the synchronizer
    pub fn thresholds(&self) -> Thresholds {
        Thresholds {
            volume_dead_band: self.volume_dead_band.max(0.0),
            seek_trigger: Duration::from_millis(self.seek_trigger_ms),
        }
    }

    /// Configured keepalive period, at least one second
    pub fn keepalive(&self) -> Duration {
        Duration::from_secs(self.keepalive_secs.max(1))
    }
}
