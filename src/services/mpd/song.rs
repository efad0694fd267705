use std::time::Duration;

use super::{
    Attrs,
    parse::{AttrParser, ParseError, Requirement},
};

/// A song in MPD's queue
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Track {
    /// Queue id of the song, `-1` for "no track"
    pub id: i64,
    /// Path relative to the music directory, or a stream URL
    pub path: String,
    /// Title tag
    pub title: String,
    /// Artist tag
    pub artist: String,
    /// Album tag
    pub album: String,
    /// Album artist tag
    pub album_artist: String,
    /// Genre tag
    pub genre: String,
    /// Date tag, in whatever format the file uses
    pub date: String,
    /// Track number, `0` when unknown
    pub track_number: i64,
    /// Song length, `None` for streams and unknown lengths
    pub duration: Option<Duration>,
}

impl Track {
    /// The "no track selected" placeholder
    pub fn none() -> Self {
        Self {
            id: -1,
            ..Self::default()
        }
    }

    /// Whether this is the "no track" placeholder
    pub fn is_none(&self) -> bool {
        self.id == -1
    }

    /// Change-detection equality: same queue id and same file
    pub fn same_as(&self, other: &Track) -> bool {
        self.id == other.id && self.path == other.path
    }

    /// Parse a song record from `currentsong`, `playlistinfo` or `plchanges`
    ///
    /// A record without an `Id` (e.g. an empty `currentsong` answer) is the
    /// "no track" placeholder.
    ///
    /// # Errors
    /// Returns a [`ParseError`] if the id or file path is malformed.
    pub fn from_attrs(attrs: &Attrs) -> Result<Self, ParseError> {
        if !attrs.contains_key("Id") {
            return Ok(Self::none());
        }

        let mut p = AttrParser::new(attrs);

        let id = p.int("Id", Requirement::Required);
        let path = p.string("file", Requirement::Required);
        let title = p.string("Title", Requirement::Optional);
        let artist = p.string("Artist", Requirement::Optional);
        let album = p.string("Album", Requirement::Optional);
        let album_artist = p.string("AlbumArtist", Requirement::Optional);
        let genre = p.string("Genre", Requirement::Optional);
        let date = p.string("Date", Requirement::Optional);

        let duration = if p.has("duration") {
            Some(p.duration("duration", Requirement::Optional))
        } else if p.has("Time") {
            Some(Duration::from_secs(p.uint("Time", Requirement::Optional)))
        } else {
            None
        };

        p.finish()?;

        Ok(Self {
            id,
            path,
            title,
            artist,
            album,
            album_artist,
            genre,
            date,
            track_number: track_number(attrs),
            duration,
        })
    }
}

/// `Track` tags come as `3` or `3/12`; anything unreadable is `0`.
fn track_number(attrs: &Attrs) -> i64 {
    attrs
        .get("Track")
        .and_then(|raw| raw.split('/').next())
        .and_then(|n| n.trim().parse().ok())
        .unwrap_or(0)
}

/// A queue slot reported by `plchanges` or `playlistinfo`
#[derive(Debug, Clone, PartialEq)]
pub struct PlaylistEntry {
    /// Zero-based position in the queue
    pub position: usize,
    /// Song now occupying the slot
    pub track: Track,
}

impl PlaylistEntry {
    /// Parse a queue record, which must carry a `Pos` field
    ///
    /// # Errors
    /// Returns a [`ParseError`] if the position or the song is malformed.
    pub fn from_attrs(attrs: &Attrs) -> Result<Self, ParseError> {
        let mut p = AttrParser::new(attrs);
        let position = p.uint("Pos", Requirement::Required) as usize;
        p.finish()?;

        Ok(Self {
            position,
            track: Track::from_attrs(attrs)?,
        })
    }
}
