//! Typed access to the MPD daemon.
//!
//! The synchronization core only ever sees the [`Remote`] trait; the
//! line-protocol adapter in [`client`] is one implementation of it.

/// Line-protocol client implementing [`Remote`]
pub mod client;
/// MPD error types
pub mod error;
/// Attribute map field parser
pub mod parse;
/// Response framing for the MPD line protocol
mod protocol;
/// Song records
pub mod song;
/// Status records
pub mod status;

use std::{collections::HashMap, fmt, time::Duration};

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

pub use client::{Address, MpdClient};
pub use error::MpdError;
pub use parse::{AttrParser, ParseError, Requirement};
pub use song::{PlaylistEntry, Track};
pub use status::Status;

/// Untyped `key: value` record as returned by MPD
pub type Attrs = HashMap<String, String>;

/// Idle subsystems the bridge reacts to.
///
/// Database and stored-playlist events are deliberately not subscribed.
pub const WATCHED_SUBSYSTEMS: &[Subsystem] = &[
    Subsystem::Playlist,
    Subsystem::Player,
    Subsystem::Mixer,
    Subsystem::Options,
];

/// MPD idle subsystem
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Subsystem {
    /// The queue has been modified
    Playlist,
    /// Playback was started, stopped or seeked, or the song tags changed
    Player,
    /// The volume changed
    Mixer,
    /// Repeat, random, single, consume or crossfade changed
    Options,
    /// Any subsystem this crate does not care about
    Other,
}

impl Subsystem {
    /// Name used on the wire
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Playlist => "playlist",
            Self::Player => "player",
            Self::Mixer => "mixer",
            Self::Options => "options",
            Self::Other => "other",
        }
    }
}

impl From<&str> for Subsystem {
    fn from(name: &str) -> Self {
        match name {
            "playlist" => Self::Playlist,
            "player" => Self::Player,
            "mixer" => Self::Mixer,
            "options" => Self::Options,
            _ => Self::Other,
        }
    }
}

/// Result of waiting for a change
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WaitOutcome {
    /// MPD reported changes in these subsystems
    Changed(Vec<Subsystem>),
    /// The wait was cancelled before anything changed
    Cancelled,
}

/// Playback command sent to MPD
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Start or resume playback
    Play,
    /// Start playback at a queue position
    PlayPos(usize),
    /// Start playback of a queue id
    PlayId(i64),
    /// Pause (`true`) or resume (`false`)
    Pause(bool),
    /// Stop playback
    Stop,
    /// Skip to the next song
    Next,
    /// Go back to the previous song
    Previous,
    /// Seek within the song with the given queue id
    SeekId {
        /// Queue id of the song
        id: i64,
        /// Absolute target position
        position: Duration,
    },
    /// Set the mixer volume in percent
    SetVolume(u8),
    /// Toggle random playback
    Random(bool),
    /// Toggle repeat mode
    Repeat(bool),
    /// Toggle single mode
    Single(bool),
    /// Add a URI to the queue at the given position
    AddId {
        /// URI or library path
        uri: String,
        /// Target queue position
        position: usize,
    },
    /// Remove the song with the given queue id
    DeleteId(i64),
}

impl Command {
    /// Command name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Play | Self::PlayPos(_) => "play",
            Self::PlayId(_) => "playid",
            Self::Pause(_) => "pause",
            Self::Stop => "stop",
            Self::Next => "next",
            Self::Previous => "previous",
            Self::SeekId { .. } => "seekid",
            Self::SetVolume(_) => "setvol",
            Self::Random(_) => "random",
            Self::Repeat(_) => "repeat",
            Self::Single(_) => "single",
            Self::AddId { .. } => "addid",
            Self::DeleteId(_) => "deleteid",
        }
    }

    /// Command arguments, unquoted
    pub fn args(&self) -> Vec<String> {
        fn flag(on: bool) -> String {
            String::from(if on { "1" } else { "0" })
        }

        match self {
            Self::Play | Self::Stop | Self::Next | Self::Previous => Vec::new(),
            Self::PlayPos(pos) => vec![pos.to_string()],
            Self::PlayId(id) | Self::DeleteId(id) => vec![id.to_string()],
            Self::Pause(on) | Self::Random(on) | Self::Repeat(on) | Self::Single(on) => {
                vec![flag(*on)]
            }
            Self::SeekId { id, position } => {
                vec![id.to_string(), format!("{:.3}", position.as_secs_f64())]
            }
            Self::SetVolume(volume) => vec![volume.to_string()],
            Self::AddId { uri, position } => vec![uri.clone(), position.to_string()],
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())?;
        for arg in self.args() {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// Request/response access to a connected MPD daemon.
///
/// Implementations must be safe to call concurrently; the bridge issues
/// commands from D-Bus handlers while a background task waits for changes.
#[async_trait]
pub trait Remote: Send + Sync {
    /// Human readable address, used for the player identity
    fn address(&self) -> String;

    /// `status`
    async fn status(&self) -> Result<Attrs, MpdError>;

    /// `currentsong`; an empty map when nothing is selected
    async fn current_song(&self) -> Result<Attrs, MpdError>;

    /// `plchanges`: queue slots whose content changed since `version`
    async fn playlist_changes(&self, version: u32) -> Result<Vec<Attrs>, MpdError>;

    /// `playlistinfo` for the whole queue
    async fn playlist_info(&self) -> Result<Vec<Attrs>, MpdError>;

    /// Issue a playback command
    async fn issue(&self, command: Command) -> Result<(), MpdError>;

    /// `ping`
    async fn ping(&self) -> Result<(), MpdError>;

    /// Block until one of `subsystems` changes or `cancel` fires
    async fn wait_for_change(
        &self,
        subsystems: &[Subsystem],
        cancel: &CancellationToken,
    ) -> Result<WaitOutcome, MpdError>;

    /// Raw cover art bytes for a song path
    async fn album_art(&self, path: &str) -> Result<Vec<u8>, MpdError>;
}
