//! In-memory MPD stand-in for unit tests.

use std::{collections::HashMap, sync::Mutex, time::Duration};

use async_trait::async_trait;
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;

use crate::services::mpd::{Attrs, Command, MpdError, Remote, Subsystem, WaitOutcome};

#[derive(Default)]
struct State {
    status: Attrs,
    current: Attrs,
    playlist: Vec<Attrs>,
    changes: Vec<Attrs>,
    commands: Vec<Command>,
    art: HashMap<String, Vec<u8>>,
    calls: HashMap<&'static str, usize>,
    reject_commands: bool,
    fail_status: bool,
    severed: bool,
    stalled: bool,
}

/// Scriptable [`Remote`] that applies commands to its own status map
pub(crate) struct MockRemote {
    state: Mutex<State>,
    changed: Notify,
}

pub(crate) fn attrs(pairs: &[(&str, &str)]) -> Attrs {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

/// Queue record for a song
pub(crate) fn song(id: i64, pos: usize, file: &str) -> Attrs {
    attrs(&[
        ("file", file),
        ("Id", &id.to_string()),
        ("Pos", &pos.to_string()),
        ("Title", &format!("Song {id}")),
        ("duration", "60.000"),
    ])
}

impl MockRemote {
    pub(crate) fn new() -> Self {
        let state = State {
            status: attrs(&[
                ("volume", "50"),
                ("repeat", "0"),
                ("random", "0"),
                ("single", "0"),
                ("consume", "0"),
                ("playlist", "1"),
                ("playlistlength", "0"),
                ("state", "stop"),
            ]),
            ..State::default()
        };

        Self {
            state: Mutex::new(state),
            changed: Notify::new(),
        }
    }

    pub(crate) fn set_status(&self, pairs: &[(&str, &str)]) {
        let mut state = self.state.lock().unwrap();
        for (k, v) in pairs {
            state.status.insert(k.to_string(), v.to_string());
        }
    }

    pub(crate) fn remove_status(&self, key: &str) {
        self.state.lock().unwrap().status.remove(key);
    }

    pub(crate) fn set_current(&self, current: Attrs) {
        self.state.lock().unwrap().current = current;
    }

    pub(crate) fn set_playlist(&self, playlist: Vec<Attrs>) {
        self.state.lock().unwrap().playlist = playlist;
    }

    pub(crate) fn set_changes(&self, changes: Vec<Attrs>) {
        self.state.lock().unwrap().changes = changes;
    }

    pub(crate) fn set_art(&self, path: &str, bytes: Vec<u8>) {
        self.state
            .lock()
            .unwrap()
            .art
            .insert(path.to_string(), bytes);
    }

    pub(crate) fn reject_commands(&self, reject: bool) {
        self.state.lock().unwrap().reject_commands = reject;
    }

    pub(crate) fn fail_status(&self, fail: bool) {
        self.state.lock().unwrap().fail_status = fail;
    }

    pub(crate) fn sever(&self) {
        self.state.lock().unwrap().severed = true;
    }

    /// Make `status` and `ping` hang forever, like a daemon that stopped answering
    pub(crate) fn stall(&self) {
        self.state.lock().unwrap().stalled = true;
    }

    async fn hang_if_stalled(&self, name: &'static str) -> Result<(), MpdError> {
        let stalled = self.enter(name)?.stalled;
        if stalled {
            std::future::pending::<()>().await;
        }
        Ok(())
    }

    pub(crate) fn commands(&self) -> Vec<Command> {
        self.state.lock().unwrap().commands.clone()
    }

    pub(crate) fn calls(&self, name: &str) -> usize {
        self.state
            .lock()
            .unwrap()
            .calls
            .get(name)
            .copied()
            .unwrap_or(0)
    }

    pub(crate) fn art_requests(&self) -> usize {
        self.calls("album_art")
    }

    pub(crate) fn notify_change(&self) {
        self.changed.notify_one();
    }

    fn enter(&self, name: &'static str) -> Result<std::sync::MutexGuard<'_, State>, MpdError> {
        let mut state = self.state.lock().unwrap();
        *state.calls.entry(name).or_default() += 1;
        if state.severed {
            return Err(MpdError::Closed);
        }
        Ok(state)
    }
}

fn flag(on: bool) -> String {
    String::from(if on { "1" } else { "0" })
}

#[async_trait]
impl Remote for MockRemote {
    fn address(&self) -> String {
        "mock:6600".to_string()
    }

    async fn status(&self) -> Result<Attrs, MpdError> {
        self.hang_if_stalled("status_started").await?;
        let state = self.enter("status")?;
        if state.fail_status {
            return Err(MpdError::Ack {
                code: 5,
                command: "status".to_string(),
                message: "scripted failure".to_string(),
            });
        }
        Ok(state.status.clone())
    }

    async fn current_song(&self) -> Result<Attrs, MpdError> {
        Ok(self.enter("current_song")?.current.clone())
    }

    async fn playlist_changes(&self, _version: u32) -> Result<Vec<Attrs>, MpdError> {
        Ok(self.enter("playlist_changes")?.changes.clone())
    }

    async fn playlist_info(&self) -> Result<Vec<Attrs>, MpdError> {
        Ok(self.enter("playlist_info")?.playlist.clone())
    }

    async fn issue(&self, command: Command) -> Result<(), MpdError> {
        let mut state = self.enter("issue")?;
        if state.reject_commands {
            return Err(MpdError::Ack {
                code: 2,
                command: command.name().to_string(),
                message: "scripted rejection".to_string(),
            });
        }

        let status = &mut state.status;
        match &command {
            Command::Play | Command::PlayPos(_) | Command::PlayId(_) | Command::Pause(false) => {
                status.insert("state".to_string(), "play".to_string());
            }
            Command::Pause(true) => {
                status.insert("state".to_string(), "pause".to_string());
            }
            Command::Stop => {
                status.insert("state".to_string(), "stop".to_string());
            }
            Command::SeekId { position, .. } => {
                status.insert(
                    "elapsed".to_string(),
                    format!("{:.3}", position.as_secs_f64()),
                );
            }
            Command::SetVolume(volume) => {
                status.insert("volume".to_string(), volume.to_string());
            }
            Command::Random(on) => {
                status.insert("random".to_string(), flag(*on));
            }
            Command::Repeat(on) => {
                status.insert("repeat".to_string(), flag(*on));
            }
            Command::Single(on) => {
                status.insert("single".to_string(), flag(*on));
            }
            Command::Next
            | Command::Previous
            | Command::AddId { .. }
            | Command::DeleteId(_) => {}
        }

        state.commands.push(command);
        Ok(())
    }

    async fn ping(&self) -> Result<(), MpdError> {
        self.hang_if_stalled("ping_started").await?;
        self.enter("ping")?;
        Ok(())
    }

    async fn wait_for_change(
        &self,
        _subsystems: &[Subsystem],
        cancel: &CancellationToken,
    ) -> Result<WaitOutcome, MpdError> {
        drop(self.enter("wait_for_change")?);
        tokio::select! {
            () = cancel.cancelled() => Ok(WaitOutcome::Cancelled),
            () = self.changed.notified() => {
                drop(self.enter("wait_for_change_return")?);
                Ok(WaitOutcome::Changed(vec![Subsystem::Player]))
            }
        }
    }

    async fn album_art(&self, path: &str) -> Result<Vec<u8>, MpdError> {
        let state = self.enter("album_art")?;
        match state.art.get(path) {
            Some(bytes) => Ok(bytes.clone()),
            None => Err(MpdError::Ack {
                code: 50,
                command: "albumart".to_string(),
                message: "No file exists".to_string(),
            }),
        }
    }
}

/// Status pairs for a track that is playing at `elapsed` seconds
pub(crate) fn playing_at(elapsed: f64) -> Vec<(&'static str, String)> {
    vec![
        ("state", "play".to_string()),
        ("songid", "1".to_string()),
        ("elapsed", format!("{elapsed:.3}")),
    ]
}

/// Apply owned pairs produced by [`playing_at`]
pub(crate) fn apply(remote: &MockRemote, pairs: &[(&'static str, String)]) {
    let borrowed: Vec<(&str, &str)> = pairs.iter().map(|(k, v)| (*k, v.as_str())).collect();
    remote.set_status(&borrowed);
}

/// Polls until the condition holds or a second passes
pub(crate) async fn eventually<F: Fn() -> bool>(condition: F) -> bool {
    for _ in 0..100 {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    condition()
}
