use serde::{Deserialize, Serialize};

use crate::{AppError, Result, services::mpris};

/// How the bridge presents itself on the session bus.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MprisConfig {
    /// Suffix of `org.mpris.MediaPlayer2.mpd.<name>`
    #[serde(default)]
    pub instance_name: String,

    /// Claim plain `org.mpris.MediaPlayer2.mpd`
    #[serde(default)]
    pub no_instance: bool,

    /// Fetch cover art from MPD and serve it as `mpris:artUrl`
    #[serde(default = "default_album_art")]
    pub album_art: bool,
}

impl Default for MprisConfig {
    fn default() -> Self {
        Self {
            instance_name: String::new(),
            no_instance: false,
            album_art: default_album_art(),
        }
    }
}

fn default_album_art() -> bool {
    true
}

impl MprisConfig {
    /// Well-known bus name to claim.
    ///
    /// # Errors
    /// Returns error if both `no_instance` and `instance_name` are set
    pub fn bus_name(&self) -> Result<String> {
        if self.no_instance && !self.instance_name.is_empty() {
            return Err(AppError::validation(
                "mpris",
                "no_instance cannot be combined with instance_name",
            ));
        }

        let name = Some(self.instance_name.as_str()).filter(|name| !name.is_empty());
        Ok(mpris::bus_name(self.no_instance, name))
    }
}
