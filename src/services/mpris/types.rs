use std::{fmt, str::FromStr, time::Duration};

use crate::services::mpd::Track;

use super::MprisError;

/// Object path prefix of every queue entry
pub const TRACK_ID_PREFIX: &str = "/org/mpd/Tracks/";

/// Object path meaning "no track"
pub const NO_TRACK: &str = "/org/mpris/MediaPlayer2/TrackList/NoTrack";

/// Queue id of a song, exposed on the bus as an object path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TrackId(i64);

impl TrackId {
    /// The "no track" sentinel
    pub const NONE: Self = Self(-1);

    /// Wrap an MPD queue id; negative ids collapse to [`TrackId::NONE`]
    pub fn new(id: i64) -> Self {
        if id < 0 { Self::NONE } else { Self(id) }
    }

    /// MPD queue id, `-1` for no track
    pub fn id(&self) -> i64 {
        self.0
    }

    /// Whether this is the "no track" sentinel
    pub fn is_none(&self) -> bool {
        self.0 < 0
    }

    /// D-Bus object path form
    pub fn object_path(&self) -> String {
        if self.is_none() {
            NO_TRACK.to_string()
        } else {
            format!("{TRACK_ID_PREFIX}{}", self.0)
        }
    }

    /// Parse the D-Bus object path form
    ///
    /// # Errors
    /// Returns [`MprisError::InvalidValue`] for paths this bridge never hands out.
    pub fn from_object_path(path: &str) -> Result<Self, MprisError> {
        if path == NO_TRACK {
            return Ok(Self::NONE);
        }
        path.strip_prefix(TRACK_ID_PREFIX)
            .and_then(|id| id.parse::<i64>().ok())
            .filter(|id| *id >= 0)
            .map(Self)
            .ok_or_else(|| MprisError::InvalidValue(format!("unknown track id `{path}`")))
    }
}

impl From<&Track> for TrackId {
    fn from(track: &Track) -> Self {
        Self::new(track.id)
    }
}

impl fmt::Display for TrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.object_path())
    }
}

/// Current playback state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackStatus {
    /// A track is playing
    Playing,
    /// A track is paused
    Paused,
    /// Nothing is playing
    #[default]
    Stopped,
}

impl PlaybackStatus {
    /// Map MPD's `state` field.
    ///
    /// # Errors
    /// The set of MPD states is closed; anything else is an [`MprisError::Parse`]-class failure.
    pub fn from_mpd(state: &str) -> Result<Self, MprisError> {
        match state {
            "play" => Ok(Self::Playing),
            "pause" => Ok(Self::Paused),
            "stop" => Ok(Self::Stopped),
            other => Err(MprisError::UnknownPlaybackState(other.to_string())),
        }
    }

    /// MPRIS name
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Playing => "Playing",
            Self::Paused => "Paused",
            Self::Stopped => "Stopped",
        }
    }

    /// Whether a position is meaningful, i.e. a track is loaded
    pub fn is_active(&self) -> bool {
        !matches!(self, Self::Stopped)
    }
}

/// Repeat behaviour, derived from MPD's `repeat` and `single` flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoopStatus {
    /// Stop at the end of the queue
    #[default]
    None,
    /// Repeat the current track
    Track,
    /// Repeat the whole queue
    Playlist,
}

impl LoopStatus {
    /// Derive from MPD's flags
    pub fn from_flags(repeat: bool, single: bool) -> Self {
        match (repeat, single) {
            (false, _) => Self::None,
            (true, false) => Self::Playlist,
            (true, true) => Self::Track,
        }
    }

    /// MPD `(repeat, single)` flags reproducing this mode
    pub fn flags(&self) -> (bool, bool) {
        match self {
            Self::None => (false, false),
            Self::Playlist => (true, false),
            Self::Track => (true, true),
        }
    }

    /// MPRIS name
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "None",
            Self::Track => "Track",
            Self::Playlist => "Playlist",
        }
    }
}

impl FromStr for LoopStatus {
    type Err = MprisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "None" => Ok(Self::None),
            "Track" => Ok(Self::Track),
            "Playlist" => Ok(Self::Playlist),
            other => Err(MprisError::InvalidValue(format!("invalid loop status `{other}`"))),
        }
    }
}

/// Typed snapshot of the player, rebuilt on every synchronization tick
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PlayerState {
    /// Playing, paused or stopped
    pub playback_status: PlaybackStatus,
    /// Repeat behaviour
    pub loop_status: LoopStatus,
    /// Random playback
    pub shuffle: bool,
    /// Volume in `[0, 1]`
    pub volume: f64,
    /// Elapsed time in the current track
    pub position: Duration,
    /// Whether the current track can be seeked
    pub seekable: bool,
    /// The current track, or the "no track" placeholder
    pub current_track: Track,
}

impl PlayerState {
    /// Empty state before the first synchronization
    pub fn empty() -> Self {
        Self {
            current_track: Track::none(),
            ..Self::default()
        }
    }
}

/// Convert a duration to MPRIS microseconds
pub fn to_micros(duration: Duration) -> i64 {
    i64::try_from(duration.as_micros()).unwrap_or(i64::MAX)
}

/// Convert MPRIS microseconds to a duration, clamping negatives to zero
pub fn from_micros(micros: i64) -> Duration {
    Duration::from_micros(u64::try_from(micros).unwrap_or(0))
}
