//! Reconstruction of queue edits from MPD's positional change lists.
//!
//! `plchanges` reports "slot N now holds song X" for every slot that changed
//! since a queue version. MPRIS wants semantic `TrackAdded`/`TrackRemoved`
//! events instead, so [`TrackList::plan`] walks the change list against the
//! local copy and guesses the smallest insert/remove script that explains it.
//! Ambiguous batches are resolved by trying a removal first and falling back
//! to an insertion.

use crate::services::mpd::{PlaylistEntry, Track};

use super::types::TrackId;

/// One step of a queue edit script
#[derive(Debug, Clone, PartialEq)]
pub enum TrackListEdit {
    /// The track left the queue
    Removed(TrackId),
    /// The track was inserted after another one ([`TrackId::NONE`] for the head)
    Added {
        /// Inserted track
        track: Track,
        /// Predecessor in the new queue
        after: TrackId,
    },
}

/// Outcome of reconciling a change list
#[derive(Debug, Clone, PartialEq)]
pub enum Plan {
    /// Edits to announce, in order, and the resulting queue
    Incremental {
        /// Removals first, then insertions left to right
        edits: Vec<TrackListEdit>,
        /// Queue after the edits
        tracks: Vec<Track>,
    },
    /// The delta is not worth it; fetch and announce the full queue instead
    Replace,
}

/// Local copy of MPD's queue
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrackList {
    tracks: Vec<Track>,
    version: u32,
}

impl TrackList {
    /// Queue at a known version
    pub fn new(tracks: Vec<Track>, version: u32) -> Self {
        Self { tracks, version }
    }

    /// Queue version the local copy reflects
    pub fn version(&self) -> u32 {
        self.version
    }

    /// Whether the local copy already reflects `version`
    pub fn is_current(&self, version: u32) -> bool {
        self.version == version
    }

    /// Tracks in queue order
    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    /// Track ids in queue order
    pub fn ids(&self) -> Vec<TrackId> {
        self.tracks.iter().map(TrackId::from).collect()
    }

    /// Look up a track by id
    pub fn get(&self, id: TrackId) -> Option<&Track> {
        self.tracks.iter().find(|t| TrackId::from(*t) == id)
    }

    /// Queue position of a track
    pub fn position_of(&self, id: TrackId) -> Option<usize> {
        self.tracks.iter().position(|t| TrackId::from(t) == id)
    }

    /// Work out the edit script turning the local queue into the one described
    /// by `changes` and `new_len`.
    ///
    /// Returns [`Plan::Replace`] when the change list is at least as long as
    /// the new queue, or when it cannot be applied positionally.
    pub fn plan(&self, mut changes: Vec<PlaylistEntry>, new_len: usize) -> Plan {
        if changes.len() >= new_len {
            return Plan::Replace;
        }

        changes.sort_by_key(|c| c.position);
        let old = &self.tracks;

        let mut offset: isize = 0;
        let mut removed = Vec::new();
        let mut inserted = Vec::new();

        for change in &changes {
            let ptr = change.position as isize + offset;
            let id = change.track.id;

            if at(old, ptr).is_some_and(|t| t.id == id) {
                continue;
            }
            if let (Some(current), Some(next)) = (at(old, ptr), at(old, ptr + 1)) {
                if next.id == id {
                    removed.push(TrackId::from(current));
                    offset += 1;
                    continue;
                }
            }
            inserted.push(change.position);
            offset -= 1;
        }

        let mut tracks = old.clone();
        for change in changes {
            match change.position.cmp(&tracks.len()) {
                std::cmp::Ordering::Less => tracks[change.position] = change.track,
                std::cmp::Ordering::Equal => tracks.push(change.track),
                std::cmp::Ordering::Greater => return Plan::Replace,
            }
        }
        tracks.truncate(new_len);
        if tracks.len() != new_len {
            return Plan::Replace;
        }

        let keep = usize::try_from(new_len as isize + offset).unwrap_or(0);
        let mut edits: Vec<TrackListEdit> = old
            .iter()
            .skip(keep)
            .map(|t| TrackListEdit::Removed(TrackId::from(t)))
            .collect();
        edits.extend(removed.into_iter().map(TrackListEdit::Removed));

        for position in inserted {
            let Some(track) = tracks.get(position) else {
                return Plan::Replace;
            };
            let after = match position.checked_sub(1) {
                Some(prev) => TrackId::from(&tracks[prev]),
                None => TrackId::NONE,
            };
            edits.push(TrackListEdit::Added {
                track: track.clone(),
                after,
            });
        }

        Plan::Incremental { edits, tracks }
    }

    /// Adopt a new queue and version
    pub fn replace(&mut self, tracks: Vec<Track>, version: u32) {
        self.tracks = tracks;
        self.version = version;
    }
}

fn at(tracks: &[Track], ptr: isize) -> Option<&Track> {
    usize::try_from(ptr).ok().and_then(|i| tracks.get(i))
}
