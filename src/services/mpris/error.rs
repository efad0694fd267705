use zbus::fdo;

use crate::services::mpd::{MpdError, ParseError};

/// Errors raised while bridging MPD onto MPRIS
#[derive(thiserror::Error, Debug)]
pub enum MprisError {
    /// MPD rejected or failed a request
    #[error("MPD request failed: {0}")]
    Remote(#[from] MpdError),

    /// A response record could not be parsed
    #[error("Failed to parse MPD state: {0}")]
    Parse(#[from] ParseError),

    /// MPD reported a playback state outside `play`/`pause`/`stop`
    #[error("Unknown playback status: {0}")]
    UnknownPlaybackState(String),

    /// The property cannot be written through this bridge
    #[error("Not implemented: {0}")]
    NotImplemented(&'static str),

    /// A caller supplied a value the bridge cannot map
    #[error("Invalid value: {0}")]
    InvalidValue(String),

    /// The connection to MPD is gone; the process is shutting down
    #[error("Connection to MPD is severed: {0}")]
    ConnectionLost(String),

    /// D-Bus registration or signal emission failed
    #[error("D-Bus operation failed: {0}")]
    Dbus(#[from] zbus::Error),
}

impl MprisError {
    /// Whether this error means the MPD connection is unusable
    pub fn is_fatal(&self) -> bool {
        match self {
            Self::Remote(e) => e.is_fatal(),
            Self::ConnectionLost(_) => true,
            _ => false,
        }
    }
}

impl From<MprisError> for fdo::Error {
    fn from(err: MprisError) -> Self {
        match err {
            MprisError::NotImplemented(_) => fdo::Error::NotSupported(err.to_string()),
            MprisError::InvalidValue(_) => fdo::Error::InvalidArgs(err.to_string()),
            _ => fdo::Error::Failed(err.to_string()),
        }
    }
}
