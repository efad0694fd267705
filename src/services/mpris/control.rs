use std::sync::Arc;

use tokio::sync::MutexGuard;
use tracing::{debug, info};

use crate::services::mpd::{Command, Status};

use super::{
    MprisError,
    events::Notification,
    metadata::Metadata,
    monitoring::Shutdown,
    sync::{SyncState, Synchronizer, TickReport},
    types::{LoopStatus, TrackId, from_micros, to_micros},
};

/// Playback and queue control on behalf of D-Bus callers.
///
/// Every operation holds the snapshot lock from the moment it starts until
/// its resynchronization finished, so callers observe the effect of their own
/// command when the call returns.
pub struct Dispatcher {
    sync: Arc<Synchronizer>,
    shutdown: Shutdown,
}

impl Dispatcher {
    /// Create a dispatcher over a synchronizer
    pub fn new(sync: Arc<Synchronizer>, shutdown: Shutdown) -> Self {
        Self { sync, shutdown }
    }

    /// The synchronizer commands resync through
    pub fn synchronizer(&self) -> &Arc<Synchronizer> {
        &self.sync
    }

    /// Skip to the next track
    ///
    /// # Errors
    /// Returns error if MPD rejects the command or the resync fails
    pub async fn next(&self) -> Result<(), MprisError> {
        self.perform(Command::Next).await
    }

    /// Go back to the previous track
    ///
    /// # Errors
    /// Returns error if MPD rejects the command or the resync fails
    pub async fn previous(&self) -> Result<(), MprisError> {
        self.perform(Command::Previous).await
    }

    /// Start or resume playback
    ///
    /// # Errors
    /// Returns error if MPD rejects the command or the resync fails
    pub async fn play(&self) -> Result<(), MprisError> {
        self.perform(Command::Play).await
    }

    /// Pause playback
    ///
    /// # Errors
    /// Returns error if MPD rejects the command or the resync fails
    pub async fn pause(&self) -> Result<(), MprisError> {
        self.perform(Command::Pause(true)).await
    }

    /// Stop playback
    ///
    /// # Errors
    /// Returns error if MPD rejects the command or the resync fails
    pub async fn stop(&self) -> Result<(), MprisError> {
        self.perform(Command::Stop).await
    }

    /// Pause when playing, play otherwise
    ///
    /// # Errors
    /// Returns error if MPD cannot be queried, rejects the command or the resync fails
    pub async fn play_pause(&self) -> Result<(), MprisError> {
        let mut state = self.sync.lock().await;
        let status = self.fetch_status().await?;

        let command = if status.state == "play" {
            Command::Pause(true)
        } else {
            Command::Play
        };

        self.issue(command).await?;
        self.resync(&mut state).await?;
        Ok(())
    }

    /// Seek relative to the current position, `offset` in microseconds.
    ///
    /// Seeking past the end of a track of known length skips to the next one;
    /// seeking before the start lands at zero. A no-op when the current track
    /// cannot be seeked.
    ///
    /// # Errors
    /// Returns error if MPD cannot be queried, rejects the command or the resync fails
    pub async fn seek(&self, offset: i64) -> Result<(), MprisError> {
        let mut state = self.sync.lock().await;
        let status = self.fetch_status().await?;
        if !status.seekable {
            debug!("Ignoring seek, current track is not seekable");
            return Ok(());
        }

        let target = to_micros(status.elapsed).saturating_add(offset);
        let duration = state.player.current_track.duration;

        let command = match duration {
            Some(length) if target > to_micros(length) => Command::Next,
            _ => Command::SeekId {
                id: status.song_id,
                position: from_micros(target),
            },
        };

        self.issue(command).await?;
        self.resync(&mut state).await?;
        Ok(())
    }

    /// Jump to an absolute position within the given track.
    ///
    /// Ignored unless `track` is the current track and the position lies
    /// within it. Exactly one `Seeked` signal follows a successful jump.
    ///
    /// # Errors
    /// Returns error if MPD rejects the command or the resync fails
    pub async fn set_position(&self, track: TrackId, position: i64) -> Result<(), MprisError> {
        let mut state = self.sync.lock().await;
        let player = &state.player;

        let current = TrackId::from(&player.current_track);
        if track.is_none() || track != current {
            debug!(%track, %current, "Ignoring SetPosition for a track that is not current");
            return Ok(());
        }
        if !player.seekable || position < 0 {
            return Ok(());
        }
        let target = from_micros(position);
        if player.current_track.duration.is_some_and(|length| target > length) {
            debug!(position, "Ignoring SetPosition past the end of the track");
            return Ok(());
        }

        self.issue(Command::SeekId {
            id: track.id(),
            position: target,
        })
        .await?;

        let report = self.resync(&mut state).await?;
        if !report.seeked {
            if self
                .sync
                .notifications()
                .send(Notification::Seeked(target))
                .is_err()
            {
                debug!("No subscribers for Seeked");
            }
        }
        Ok(())
    }

    /// Set the volume from the MPRIS `[0, 1]` scale
    ///
    /// # Errors
    /// Returns error if the value is not a number, MPD rejects it or the resync fails
    pub async fn set_volume(&self, volume: f64) -> Result<(), MprisError> {
        if volume.is_nan() {
            return Err(MprisError::InvalidValue("volume is not a number".to_string()));
        }
        let percent = (volume * 100.0).round().clamp(0.0, 100.0) as u8;

        let mut state = self.sync.lock().await;
        self.issue(Command::SetVolume(percent)).await?;
        state.player.volume = f64::from(percent) / 100.0;
        self.resync(&mut state).await?;
        Ok(())
    }

    /// Set the repeat behaviour
    ///
    /// # Errors
    /// Returns error if MPD rejects either flag or the resync fails
    pub async fn set_loop_status(&self, status: LoopStatus) -> Result<(), MprisError> {
        let (repeat, single) = status.flags();

        let mut state = self.sync.lock().await;
        self.issue(Command::Single(single)).await?;
        self.issue(Command::Repeat(repeat)).await?;
        state.player.loop_status = status;
        self.resync(&mut state).await?;
        Ok(())
    }

    /// Toggle random playback
    ///
    /// # Errors
    /// Returns error if MPD rejects the command or the resync fails
    pub async fn set_shuffle(&self, shuffle: bool) -> Result<(), MprisError> {
        let mut state = self.sync.lock().await;
        self.issue(Command::Random(shuffle)).await?;
        state.player.shuffle = shuffle;
        self.resync(&mut state).await?;
        Ok(())
    }

    /// Metadata for the given queue entries, skipping unknown ids
    pub async fn tracks_metadata(&self, ids: &[TrackId]) -> Vec<Metadata> {
        let state = self.sync.lock().await;
        ids.iter()
            .filter_map(|id| state.tracklist.get(*id))
            .map(|track| self.sync.metadata_for(track))
            .collect()
    }

    /// Play the given queue entry
    ///
    /// # Errors
    /// Returns error if the id is the "no track" sentinel, MPD rejects it or the resync fails
    pub async fn go_to(&self, track: TrackId) -> Result<(), MprisError> {
        if track.is_none() {
            return Err(MprisError::InvalidValue("cannot go to NoTrack".to_string()));
        }
        self.perform(Command::PlayId(track.id())).await
    }

    /// Remove the given queue entry
    ///
    /// # Errors
    /// Returns error if the id is the "no track" sentinel, MPD rejects it or the resync fails
    pub async fn remove_track(&self, track: TrackId) -> Result<(), MprisError> {
        if track.is_none() {
            return Err(MprisError::InvalidValue("cannot remove NoTrack".to_string()));
        }
        self.perform(Command::DeleteId(track.id())).await
    }

    /// Insert a URI after a queue entry ([`TrackId::NONE`] for the head)
    ///
    /// # Errors
    /// Returns error if `after` is not queued, MPD rejects the URI or the resync fails
    pub async fn add_track(
        &self,
        uri: &str,
        after: TrackId,
        set_as_current: bool,
    ) -> Result<(), MprisError> {
        let mut state = self.sync.lock().await;

        let position = if after.is_none() {
            0
        } else {
            state
                .tracklist
                .position_of(after)
                .map(|pos| pos + 1)
                .ok_or_else(|| MprisError::InvalidValue(format!("{after} is not queued")))?
        };

        self.issue(Command::AddId {
            uri: uri.to_string(),
            position,
        })
        .await?;
        if set_as_current {
            self.issue(Command::PlayPos(position)).await?;
        }
        self.resync(&mut state).await?;
        Ok(())
    }

    async fn perform(&self, command: Command) -> Result<(), MprisError> {
        let mut state = self.sync.lock().await;
        self.issue(command).await?;
        self.resync(&mut state).await?;
        Ok(())
    }

    async fn issue(&self, command: Command) -> Result<(), MprisError> {
        info!(%command, "Sending command to MPD");
        self.sync
            .remote()
            .issue(command)
            .await
            .map_err(|e| self.escalate(e.into()))
    }

    async fn fetch_status(&self) -> Result<Status, MprisError> {
        let attrs = self
            .sync
            .remote()
            .status()
            .await
            .map_err(|e| self.escalate(e.into()))?;
        Ok(Status::from_attrs(&attrs)?)
    }

    async fn resync(
        &self,
        state: &mut MutexGuard<'_, SyncState>,
    ) -> Result<TickReport, MprisError> {
        self.sync
            .refresh(state)
            .await
            .map_err(|e| self.escalate(e))
    }

    fn escalate(&self, err: MprisError) -> MprisError {
        if err.is_fatal() {
            self.shutdown.sever(err.to_string());
        }
        err
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::sync::broadcast;
    use zbus::fdo;

    use super::*;
    use crate::services::{
        mpd::MpdError,
        mpris::{
            events,
            sync::Thresholds,
            testing::{MockRemote, apply, playing_at, song},
            types::PlaybackStatus,
        },
    };

    async fn setup(
        remote: &Arc<MockRemote>,
    ) -> (Dispatcher, broadcast::Receiver<Notification>) {
        let (tx, rx) = events::channel();
        let sync = Arc::new(Synchronizer::new(
            remote.clone(),
            tx,
            None,
            Thresholds::default(),
        ));
        sync.initialize().await.unwrap();
        (Dispatcher::new(sync, Shutdown::new()), rx)
    }

    fn playing_remote(elapsed: f64) -> Arc<MockRemote> {
        let remote = Arc::new(MockRemote::new());
        apply(&remote, &playing_at(elapsed));
        remote.set_current(song(1, 0, "a.flac"));
        remote
    }

    fn seeks(rx: &mut broadcast::Receiver<Notification>) -> Vec<Duration> {
        let mut out = Vec::new();
        while let Ok(n) = rx.try_recv() {
            if let Notification::Seeked(position) = n {
                out.push(position);
            }
        }
        out
    }

    #[tokio::test]
    async fn toggle_while_paused_plays() {
        let remote = playing_remote(3.0);
        remote.set_status(&[("state", "pause")]);
        let (dispatcher, _rx) = setup(&remote).await;
        let fetches = remote.calls("current_song");

        dispatcher.play_pause().await.unwrap();

        assert_eq!(remote.commands(), vec![Command::Play]);
        assert_eq!(remote.calls("current_song"), fetches + 1);
        let state = dispatcher.synchronizer().snapshot().await;
        assert_eq!(state.player.playback_status, PlaybackStatus::Playing);
    }

    #[tokio::test]
    async fn toggle_while_playing_pauses() {
        let remote = playing_remote(3.0);
        let (dispatcher, _rx) = setup(&remote).await;

        dispatcher.play_pause().await.unwrap();

        assert_eq!(remote.commands(), vec![Command::Pause(true)]);
    }

    #[tokio::test]
    async fn seek_before_start_clamps_to_zero() {
        let remote = playing_remote(5.0);
        let (dispatcher, _rx) = setup(&remote).await;

        dispatcher.seek(-10_000_000).await.unwrap();

        assert_eq!(
            remote.commands(),
            vec![Command::SeekId {
                id: 1,
                position: Duration::ZERO
            }]
        );
    }

    #[tokio::test]
    async fn seek_past_end_skips_to_next() {
        let remote = playing_remote(5.0);
        let (dispatcher, _rx) = setup(&remote).await;

        dispatcher.seek(100_000_000).await.unwrap();

        assert_eq!(remote.commands(), vec![Command::Next]);
    }

    #[tokio::test]
    async fn seek_without_elapsed_is_a_no_op() {
        let remote = playing_remote(5.0);
        remote.remove_status("elapsed");
        let (dispatcher, _rx) = setup(&remote).await;

        dispatcher.seek(1_000_000).await.unwrap();

        assert!(remote.commands().is_empty());
    }

    #[tokio::test]
    async fn set_position_ignores_other_tracks() {
        let remote = playing_remote(5.0);
        let (dispatcher, _rx) = setup(&remote).await;

        dispatcher
            .set_position(TrackId::new(9), 1_000_000)
            .await
            .unwrap();
        dispatcher
            .set_position(TrackId::new(1), 90_000_000)
            .await
            .unwrap();

        assert!(remote.commands().is_empty());
    }

    #[tokio::test]
    async fn set_position_announces_exactly_one_seek() {
        let remote = playing_remote(10.0);
        let (dispatcher, mut rx) = setup(&remote).await;

        dispatcher
            .set_position(TrackId::new(1), 40_000_000)
            .await
            .unwrap();
        assert_eq!(seeks(&mut rx), vec![Duration::from_secs(40)]);

        dispatcher
            .set_position(TrackId::new(1), 41_000_000)
            .await
            .unwrap();
        assert_eq!(seeks(&mut rx), vec![Duration::from_secs(41)]);
    }

    #[tokio::test]
    async fn set_position_without_subscribers_succeeds() {
        let remote = playing_remote(10.0);
        let (dispatcher, rx) = setup(&remote).await;
        drop(rx);

        dispatcher
            .set_position(TrackId::new(1), 11_000_000)
            .await
            .unwrap();

        assert_eq!(
            remote.commands(),
            vec![Command::SeekId {
                id: 1,
                position: Duration::from_secs(11)
            }]
        );
    }

    #[tokio::test]
    async fn volume_write_rounds_and_does_not_echo() {
        let remote = Arc::new(MockRemote::new());
        let (dispatcher, mut rx) = setup(&remote).await;

        dispatcher.set_volume(0.523).await.unwrap();
        dispatcher.set_volume(1.7).await.unwrap();

        assert_eq!(
            remote.commands(),
            vec![Command::SetVolume(52), Command::SetVolume(100)]
        );
        assert!(rx.try_recv().is_err());
        assert!(dispatcher.set_volume(f64::NAN).await.is_err());
    }

    #[tokio::test]
    async fn loop_write_sends_single_then_repeat() {
        let remote = Arc::new(MockRemote::new());
        let (dispatcher, mut rx) = setup(&remote).await;

        dispatcher.set_loop_status(LoopStatus::Track).await.unwrap();
        dispatcher.set_shuffle(true).await.unwrap();

        assert_eq!(
            remote.commands(),
            vec![
                Command::Single(true),
                Command::Repeat(true),
                Command::Random(true)
            ]
        );
        assert!(rx.try_recv().is_err());
        let state = dispatcher.synchronizer().snapshot().await;
        assert_eq!(state.player.loop_status, LoopStatus::Track);
        assert!(state.player.shuffle);
    }

    #[tokio::test]
    async fn rejected_command_fails_without_severing() {
        let remote = Arc::new(MockRemote::new());
        remote.reject_commands(true);
        let (dispatcher, _rx) = setup(&remote).await;

        let err = dispatcher.next().await.unwrap_err();

        assert!(matches!(err, MprisError::Remote(MpdError::Ack { .. })));
        assert!(!dispatcher.shutdown.is_triggered());
        assert!(matches!(fdo::Error::from(err), fdo::Error::Failed(_)));
    }

    #[tokio::test]
    async fn lost_connection_severs() {
        let remote = Arc::new(MockRemote::new());
        let (dispatcher, _rx) = setup(&remote).await;
        remote.sever();

        assert!(dispatcher.play().await.is_err());

        assert!(dispatcher.shutdown.is_triggered());
        assert!(dispatcher.shutdown.reason().is_some());
    }

    #[tokio::test]
    async fn queue_operations() {
        let remote = Arc::new(MockRemote::new());
        remote.set_playlist(vec![song(4, 0, "a"), song(5, 1, "b")]);
        remote.set_status(&[("playlistlength", "2")]);
        let (dispatcher, _rx) = setup(&remote).await;

        dispatcher
            .add_track("c.flac", TrackId::new(4), true)
            .await
            .unwrap();
        dispatcher.go_to(TrackId::new(5)).await.unwrap();
        dispatcher.remove_track(TrackId::new(4)).await.unwrap();

        assert_eq!(
            remote.commands(),
            vec![
                Command::AddId {
                    uri: "c.flac".to_string(),
                    position: 1
                },
                Command::PlayPos(1),
                Command::PlayId(5),
                Command::DeleteId(4),
            ]
        );
        assert!(
            dispatcher
                .add_track("d.flac", TrackId::new(99), false)
                .await
                .is_err()
        );
    }

    #[tokio::test]
    async fn tracks_metadata_keeps_request_order() {
        let remote = Arc::new(MockRemote::new());
        remote.set_playlist(vec![song(4, 0, "a"), song(5, 1, "b")]);
        remote.set_status(&[("playlistlength", "2")]);
        let (dispatcher, _rx) = setup(&remote).await;

        let metadata = dispatcher
            .tracks_metadata(&[TrackId::new(5), TrackId::new(8), TrackId::new(4)])
            .await;

        let ids: Vec<_> = metadata.iter().map(Metadata::track_id).collect();
        assert_eq!(ids, vec![TrackId::new(5), TrackId::new(4)]);
    }
}
