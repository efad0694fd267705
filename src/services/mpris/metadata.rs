use std::collections::BTreeMap;

use crate::services::mpd::Track;

use super::types::{TrackId, to_micros};

/// A single metadata entry
#[derive(Debug, Clone, PartialEq)]
pub enum MetadataValue {
    /// Plain string
    Text(String),
    /// List of strings (artists, genres)
    TextList(Vec<String>),
    /// Signed integer (lengths, track numbers)
    Int(i64),
    /// Track identifier, exposed as an object path
    Track(TrackId),
}

/// MPRIS metadata map for one track
///
/// Keys follow the MPRIS/xesam naming. Empty tags are left out entirely
/// rather than sent as empty strings.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Metadata(BTreeMap<String, MetadataValue>);

impl Metadata {
    /// Build the map for a track, with an optional cover art URI
    pub fn from_track(track: &Track, art_url: Option<&str>) -> Self {
        let mut map = Self::default();
        map.insert("mpris:trackid", MetadataValue::Track(TrackId::from(track)));

        if track.is_none() {
            return map;
        }

        if let Some(duration) = track.duration {
            map.insert("mpris:length", MetadataValue::Int(to_micros(duration)));
        }

        map.text("xesam:album", &track.album);
        map.text("xesam:title", &track.title);
        map.text("xesam:url", &track.path);
        map.text("xesam:contentCreated", &track.date);
        map.list("xesam:albumArtist", &track.album_artist);
        map.list("xesam:artist", &track.artist);
        map.list("xesam:genre", &track.genre);

        if let Some(url) = art_url {
            map.insert("mpris:artUrl", MetadataValue::Text(url.to_string()));
        }

        if track.track_number != 0 {
            map.insert("xesam:trackNumber", MetadataValue::Int(track.track_number));
        }

        map
    }

    /// Look up a key
    pub fn get(&self, key: &str) -> Option<&MetadataValue> {
        self.0.get(key)
    }

    /// Track id carried by the map
    pub fn track_id(&self) -> TrackId {
        match self.0.get("mpris:trackid") {
            Some(MetadataValue::Track(id)) => *id,
            _ => TrackId::NONE,
        }
    }

    /// Iterate over all entries in key order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &MetadataValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the map is empty
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn insert(&mut self, key: &str, value: MetadataValue) {
        self.0.insert(key.to_string(), value);
    }

    fn text(&mut self, key: &str, value: &str) {
        if !value.is_empty() {
            self.insert(key, MetadataValue::Text(value.to_string()));
        }
    }

    fn list(&mut self, key: &str, value: &str) {
        if !value.is_empty() {
            self.insert(key, MetadataValue::TextList(vec![value.to_string()]));
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn no_track_only_has_track_id() {
        let meta = Metadata::from_track(&Track::none(), Some("file:///tmp/x"));

        assert_eq!(meta.len(), 1);
        assert_eq!(meta.track_id(), TrackId::NONE);
    }

    #[test]
    fn skips_empty_tags() {
        let track = Track {
            id: 4,
            path: "a/b.flac".to_string(),
            title: "Song".to_string(),
            artist: "Band".to_string(),
            duration: Some(Duration::from_secs(3)),
            ..Track::default()
        };
        let meta = Metadata::from_track(&track, None);

        assert_eq!(meta.track_id(), TrackId::new(4));
        assert_eq!(
            meta.get("xesam:title"),
            Some(&MetadataValue::Text("Song".to_string()))
        );
        assert_eq!(
            meta.get("xesam:artist"),
            Some(&MetadataValue::TextList(vec!["Band".to_string()]))
        );
        assert_eq!(meta.get("mpris:length"), Some(&MetadataValue::Int(3_000_000)));
        assert!(meta.get("xesam:album").is_none());
        assert!(meta.get("xesam:trackNumber").is_none());
        assert!(meta.get("mpris:artUrl").is_none());
    }

    #[test]
    fn includes_art_and_track_number() {
        let track = Track {
            id: 1,
            path: "x.mp3".to_string(),
            track_number: 7,
            ..Track::default()
        };
        let meta = Metadata::from_track(&track, Some("file:///cache/albumart_1"));

        assert_eq!(meta.get("xesam:trackNumber"), Some(&MetadataValue::Int(7)));
        assert_eq!(
            meta.get("mpris:artUrl"),
            Some(&MetadataValue::Text("file:///cache/albumart_1".to_string()))
        );
        assert!(meta.get("mpris:length").is_none());
    }
}
