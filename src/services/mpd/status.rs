use std::time::Duration;

use super::{
    Attrs,
    parse::{AttrParser, ParseError, Requirement},
};

/// MPD's answer to the `status` command
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Status {
    /// Mixer volume in percent, `-1` when MPD has no mixer
    pub volume: f64,
    /// Repeat mode flag
    pub repeat: bool,
    /// Random playback flag
    pub random: bool,
    /// Single mode flag
    pub single: bool,
    /// Consume mode flag
    pub consume: bool,
    /// Raw player state (`play`, `pause` or `stop`)
    pub state: String,
    /// Playlist id of the current song, `-1` when there is none
    pub song_id: i64,
    /// Elapsed time of the current song
    pub elapsed: Duration,
    /// Whether MPD reported an elapsed time at all
    pub seekable: bool,
    /// Version of the queue, bumped on every modification
    pub playlist_version: u32,
    /// Number of entries in the queue
    pub playlist_length: usize,
}

impl Status {
    /// Parse a `status` response
    ///
    /// # Errors
    /// Returns a [`ParseError`] if a mandatory field is missing or malformed.
    pub fn from_attrs(attrs: &Attrs) -> Result<Self, ParseError> {
        let mut p = AttrParser::new(attrs);

        let volume = p.float("volume", Requirement::Optional);
        let repeat = p.bool("repeat", Requirement::Required);
        let random = p.bool("random", Requirement::Required);
        let single = p.bool("single", Requirement::Optional);
        let consume = p.bool("consume", Requirement::Optional);
        let state = p.string("state", Requirement::Required);
        let playlist_version = p.uint("playlist", Requirement::Required) as u32;
        let playlist_length = p.uint("playlistlength", Requirement::Required) as usize;

        let song_id = if p.has("songid") {
            p.int("songid", Requirement::Required)
        } else {
            -1
        };

        let seekable = p.has("elapsed");
        let elapsed = p.duration("elapsed", Requirement::Optional);

        p.finish()?;

        Ok(Self {
            volume,
            repeat,
            random,
            single,
            consume,
            state,
            song_id,
            elapsed,
            seekable,
            playlist_version,
            playlist_length,
        })
    }
}
