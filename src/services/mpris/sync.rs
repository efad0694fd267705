use std::{sync::Arc, time::Duration};

use tokio::sync::{Mutex, MutexGuard};
use tracing::{debug, instrument};

use crate::services::mpd::{PlaylistEntry, Remote, Status, Track};

use super::{
    MprisError,
    art::ArtCache,
    events::{Interface, Notification, NotificationSender, PropertyValue},
    metadata::Metadata,
    tracklist::{Plan, TrackList, TrackListEdit},
    types::{LoopStatus, PlaybackStatus, PlayerState, TrackId, to_micros},
};

/// Limits separating noise from real changes
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    /// Volume differences (on the `[0, 1]` scale) below this are ignored
    pub volume_dead_band: f64,
    /// Position jumps larger than this are reported as seeks
    pub seek_trigger: Duration,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            volume_dead_band: 0.005,
            seek_trigger: Duration::from_secs(2),
        }
    }
}

/// Everything the bridge last told its subscribers
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SyncState {
    /// Player snapshot
    pub player: PlayerState,
    /// Metadata of `player.current_track`
    pub metadata: Metadata,
    /// Local copy of the queue
    pub tracklist: TrackList,
}

/// What a tick did that callers may need to know about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TickReport {
    /// A `Seeked` signal went out
    pub seeked: bool,
    /// Number of notifications sent
    pub notifications: usize,
}

enum QueueUpdate {
    Edits {
        edits: Vec<TrackListEdit>,
        tracks: Vec<Track>,
    },
    Replace(Vec<Track>),
}

/// Keeps the MPRIS view of MPD in step with the daemon.
///
/// A tick fetches the full remote state, diffs it against the stored snapshot
/// and sends the minimal set of notifications. Nothing is sent and nothing is
/// stored unless every fetch of the tick succeeded.
pub struct Synchronizer {
    remote: Arc<dyn Remote>,
    state: Mutex<SyncState>,
    notifications: NotificationSender,
    art: Option<Arc<ArtCache>>,
    thresholds: Thresholds,
}

impl Synchronizer {
    /// Create a synchronizer with an empty snapshot
    pub fn new(
        remote: Arc<dyn Remote>,
        notifications: NotificationSender,
        art: Option<Arc<ArtCache>>,
        thresholds: Thresholds,
    ) -> Self {
        let state = SyncState {
            player: PlayerState::empty(),
            metadata: Metadata::from_track(&Track::none(), None),
            tracklist: TrackList::default(),
        };

        Self {
            remote,
            state: Mutex::new(state),
            notifications,
            art,
            thresholds,
        }
    }

    /// The daemon this synchronizer mirrors
    pub fn remote(&self) -> &Arc<dyn Remote> {
        &self.remote
    }

    /// Channel notifications are sent on
    pub fn notifications(&self) -> &NotificationSender {
        &self.notifications
    }

    /// Load the initial state without notifying anyone
    ///
    /// # Errors
    /// Returns an error if MPD cannot be queried or answers with malformed records.
    #[instrument(skip(self))]
    pub async fn initialize(&self) -> Result<(), MprisError> {
        let mut state = self.state.lock().await;

        let status = Status::from_attrs(&self.remote.status().await?)?;
        let track = Track::from_attrs(&self.remote.current_song().await?)?;
        let tracks = self.fetch_playlist().await?;
        let player = self.player_state(&status, track)?;

        let art_url = self.fetch_art(&player.current_track).await;
        state.metadata = Metadata::from_track(&player.current_track, art_url.as_deref());
        state.player = player;
        state.tracklist = TrackList::new(tracks, status.playlist_version);

        debug!(
            status = state.player.playback_status.as_str(),
            tracks = state.tracklist.tracks().len(),
            "Initial state loaded"
        );
        Ok(())
    }

    /// Lock the snapshot, for callers that need to modify it before a tick
    pub async fn lock(&self) -> MutexGuard<'_, SyncState> {
        self.state.lock().await
    }

    /// Copy of the current snapshot
    pub async fn snapshot(&self) -> SyncState {
        self.state.lock().await.clone()
    }

    /// Read part of the snapshot without copying all of it
    pub async fn read<R>(&self, f: impl FnOnce(&SyncState) -> R) -> R {
        let state = self.state.lock().await;
        f(&state)
    }

    /// Run one tick
    ///
    /// # Errors
    /// See [`Synchronizer::refresh`].
    pub async fn tick(&self) -> Result<TickReport, MprisError> {
        let mut state = self.state.lock().await;
        self.refresh(&mut state).await
    }

    /// Run one tick against an already locked snapshot
    ///
    /// # Errors
    /// Returns an error if any fetch fails or a record cannot be parsed; the
    /// snapshot is left untouched and nothing is sent in that case.
    pub async fn refresh(&self, state: &mut SyncState) -> Result<TickReport, MprisError> {
        let status = Status::from_attrs(&self.remote.status().await?)?;
        let track = Track::from_attrs(&self.remote.current_song().await?)?;
        let mut next = self.player_state(&status, track)?;
        let queue = self.reconcile_queue(&state.tracklist, &status).await?;

        let prev = &state.player;
        let mut pending = Vec::new();
        let mut report = TickReport::default();

        if next.playback_status != prev.playback_status {
            pending.push(Notification::player(
                "PlaybackStatus",
                PropertyValue::Text(next.playback_status.as_str().to_string()),
            ));
        }
        if next.loop_status != prev.loop_status {
            pending.push(Notification::player(
                "LoopStatus",
                PropertyValue::Text(next.loop_status.as_str().to_string()),
            ));
        }
        if next.shuffle != prev.shuffle {
            pending.push(Notification::player(
                "Shuffle",
                PropertyValue::Bool(next.shuffle),
            ));
        }
        if (next.volume - prev.volume).abs() < self.thresholds.volume_dead_band {
            next.volume = prev.volume;
        } else {
            pending.push(Notification::player(
                "Volume",
                PropertyValue::Double(next.volume),
            ));
        }
        if next.seekable != prev.seekable {
            pending.push(Notification::player(
                "CanSeek",
                PropertyValue::Bool(next.seekable),
            ));
        }

        let track_changed = !next.current_track.same_as(&prev.current_track);
        let metadata = if track_changed {
            let art_url = self.fetch_art(&next.current_track).await;
            let metadata = Metadata::from_track(&next.current_track, art_url.as_deref());
            pending.push(Notification::player(
                "Metadata",
                PropertyValue::Metadata(metadata.clone()),
            ));
            metadata
        } else {
            state.metadata.clone()
        };

        let jump = next.position.abs_diff(prev.position);
        if !track_changed
            && next.playback_status.is_active()
            && jump > self.thresholds.seek_trigger
        {
            debug!(
                from = to_micros(prev.position),
                to = to_micros(next.position),
                "Position jumped"
            );
            pending.push(Notification::Seeked(next.position));
            report.seeked = true;
        } else if next.position != prev.position {
            pending.push(Notification::player(
                "Position",
                PropertyValue::Micros(to_micros(next.position)),
            ));
        }

        if let Some(update) = &queue {
            self.queue_notifications(update, TrackId::from(&next.current_track), &mut pending);
        }

        state.player = next;
        state.metadata = metadata;
        match queue {
            Some(QueueUpdate::Edits { tracks, .. } | QueueUpdate::Replace(tracks)) => {
                state.tracklist.replace(tracks, status.playlist_version);
            }
            None => {}
        }

        report.notifications = pending.len();
        for notification in pending {
            if let Err(unsent) = self.notifications.send(notification) {
                debug!("No subscribers, dropped {:?}", unsent.0);
            }
        }

        Ok(report)
    }

    /// Advance the estimated position while playing.
    ///
    /// Skipped when a tick or command holds the snapshot. Returns whether the
    /// position moved.
    pub fn advance_position(&self, step: Duration) -> bool {
        let Ok(mut state) = self.state.try_lock() else {
            return false;
        };
        let player = &mut state.player;
        if player.playback_status != PlaybackStatus::Playing {
            return false;
        }

        let mut position = player.position.saturating_add(step);
        if let Some(duration) = player.current_track.duration {
            position = position.min(duration);
        }
        let moved = position != player.position;
        player.position = position;
        moved
    }

    /// Metadata for a queued track, using whatever art is already cached
    pub fn metadata_for(&self, track: &Track) -> Metadata {
        let art_url = self
            .art
            .as_ref()
            .and_then(|art| art.location_for(TrackId::from(track)));
        Metadata::from_track(track, art_url.as_deref())
    }

    fn player_state(&self, status: &Status, track: Track) -> Result<PlayerState, MprisError> {
        Ok(PlayerState {
            playback_status: PlaybackStatus::from_mpd(&status.state)?,
            loop_status: LoopStatus::from_flags(status.repeat, status.single),
            shuffle: status.random,
            volume: (status.volume / 100.0).clamp(0.0, 1.0),
            position: status.elapsed,
            seekable: status.seekable,
            current_track: track,
        })
    }

    async fn fetch_art(&self, track: &Track) -> Option<String> {
        let art = self.art.as_ref()?;
        art.fetch(TrackId::from(track), &track.path).await
    }

    async fn fetch_playlist(&self) -> Result<Vec<Track>, MprisError> {
        let records = self.remote.playlist_info().await?;
        records
            .iter()
            .map(Track::from_attrs)
            .collect::<Result<Vec<_>, _>>()
            .map_err(MprisError::from)
    }

    async fn reconcile_queue(
        &self,
        tracklist: &TrackList,
        status: &Status,
    ) -> Result<Option<QueueUpdate>, MprisError> {
        if tracklist.is_current(status.playlist_version) {
            return Ok(None);
        }

        let changes = self
            .remote
            .playlist_changes(tracklist.version())
            .await?
            .iter()
            .map(PlaylistEntry::from_attrs)
            .collect::<Result<Vec<_>, _>>()?;

        debug!(
            from = tracklist.version(),
            to = status.playlist_version,
            changes = changes.len(),
            length = status.playlist_length,
            "Queue changed"
        );

        match tracklist.plan(changes, status.playlist_length) {
            Plan::Incremental { edits, tracks } => Ok(Some(QueueUpdate::Edits { edits, tracks })),
            Plan::Replace => Ok(Some(QueueUpdate::Replace(self.fetch_playlist().await?))),
        }
    }

    fn queue_notifications(
        &self,
        update: &QueueUpdate,
        current: TrackId,
        pending: &mut Vec<Notification>,
    ) {
        let tracks = match update {
            QueueUpdate::Edits { edits, tracks } => {
                for edit in edits {
                    pending.push(match edit {
                        TrackListEdit::Removed(id) => Notification::TrackRemoved(*id),
                        TrackListEdit::Added { track, after } => Notification::TrackAdded {
                            metadata: self.metadata_for(track),
                            after: *after,
                        },
                    });
                }
                tracks
            }
            QueueUpdate::Replace(tracks) => {
                pending.push(Notification::TrackListReplaced {
                    tracks: tracks.iter().map(TrackId::from).collect(),
                    current,
                });
                tracks
            }
        };

        pending.push(Notification::PropertyChanged {
            interface: Interface::TrackList,
            name: "Tracks",
            value: PropertyValue::Tracks(tracks.iter().map(TrackId::from).collect()),
        });
    }
}
