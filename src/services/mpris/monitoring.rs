use std::{
    env,
    sync::{Arc, OnceLock},
    time::Duration,
};

use chrono::{DateTime, Utc};
use futures::Stream;
use tokio::{sync::watch, task::JoinHandle};
use tokio_stream::wrappers::WatchStream;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

use crate::services::mpd::{WATCHED_SUBSYSTEMS, WaitOutcome};

use super::sync::Synchronizer;

/// Environment variable overriding the keepalive period, in seconds
pub const KEEPALIVE_ENV: &str = "MPD_TIMEOUT";

const POSITION_STEP: Duration = Duration::from_secs(1);

/// Process-wide stop switch.
///
/// Cloning shares the token. The first [`Shutdown::sever`] reason wins.
#[derive(Debug, Clone, Default)]
pub struct Shutdown {
    token: CancellationToken,
    reason: Arc<OnceLock<String>>,
}

impl Shutdown {
    /// A fresh, untriggered switch
    pub fn new() -> Self {
        Self::default()
    }

    /// Token every background task selects on
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Stop because the MPD connection is gone
    pub fn sever(&self, reason: impl Into<String>) {
        let reason = reason.into();
        if self.reason.set(reason.clone()).is_ok() {
            error!("Connection to MPD severed: {reason}");
        }
        self.token.cancel();
    }

    /// Stop on request, without recording a failure
    pub fn stop(&self) {
        self.token.cancel();
    }

    /// Why the connection was severed, if it was
    pub fn reason(&self) -> Option<&str> {
        self.reason.get().map(String::as_str)
    }

    /// Whether anything triggered the switch
    pub fn is_triggered(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Resolves once the switch is triggered
    pub async fn triggered(&self) {
        self.token.cancelled().await;
    }
}

/// Liveness of the MPD connection as seen by the keepalive probe
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectionState {
    /// The last probe succeeded
    pub alive: bool,
    /// When the last probe ran, if any has
    pub last_probe: Option<DateTime<Utc>>,
}

impl Default for ConnectionState {
    fn default() -> Self {
        Self {
            alive: true,
            last_probe: None,
        }
    }
}

/// Keepalive period: `MPD_TIMEOUT` seconds when set and valid, else the fallback
pub fn keepalive_interval(fallback: Duration) -> Duration {
    keepalive_from(env::var(KEEPALIVE_ENV).ok().as_deref(), fallback)
}

fn keepalive_from(value: Option<&str>, fallback: Duration) -> Duration {
    value
        .and_then(|v| v.trim().parse::<u64>().ok())
        .filter(|secs| *secs > 0)
        .map(Duration::from_secs)
        .unwrap_or(fallback)
}

/// Drives the synchronizer from MPD's change notifications.
///
/// Runs up to three tasks: the idle loop, the keepalive probe and the
/// position clock. All of them exit when the shutdown switch trips.
pub struct ConnectionWatcher {
    sync: Arc<Synchronizer>,
    shutdown: Shutdown,
    keepalive: Duration,
    interpolate: bool,
    state: watch::Sender<ConnectionState>,
}

impl ConnectionWatcher {
    /// Create a watcher; nothing runs until [`ConnectionWatcher::start`]
    pub fn new(
        sync: Arc<Synchronizer>,
        shutdown: Shutdown,
        keepalive: Duration,
        interpolate: bool,
    ) -> Self {
        Self {
            sync,
            shutdown,
            keepalive,
            interpolate,
            state: watch::Sender::new(ConnectionState::default()),
        }
    }

    /// Current liveness
    pub fn connection_state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    /// Liveness updates, starting with the current value
    pub fn watch_connection(&self) -> impl Stream<Item = ConnectionState> + Send + use<> {
        WatchStream::new(self.state.subscribe())
    }

    /// Spawn the background tasks
    #[instrument(skip(self), fields(keepalive = ?self.keepalive))]
    pub fn start(self: Arc<Self>) -> Vec<JoinHandle<()>> {
        info!("Watching MPD for changes");

        let mut handles = vec![
            tokio::spawn(Arc::clone(&self).idle_loop()),
            tokio::spawn(Arc::clone(&self).keepalive_loop()),
        ];
        if self.interpolate {
            handles.push(tokio::spawn(Arc::clone(&self).position_clock()));
        }
        handles
    }

    async fn idle_loop(self: Arc<Self>) {
        let token = self.shutdown.token().clone();
        let remote = Arc::clone(self.sync.remote());

        loop {
            match remote.wait_for_change(WATCHED_SUBSYSTEMS, &token).await {
                Ok(WaitOutcome::Cancelled) => return,
                Ok(WaitOutcome::Changed(subsystems)) => {
                    if token.is_cancelled() {
                        return;
                    }
                    debug!(?subsystems, "MPD reported changes");
                    let result = tokio::select! {
                        () = token.cancelled() => return,
                        result = self.sync.tick() => result,
                    };
                    if let Err(e) = result {
                        if e.is_fatal() {
                            self.shutdown.sever(format!("synchronization failed: {e}"));
                            return;
                        }
                        warn!("Synchronization failed: {e}");
                    }
                }
                Err(e) => {
                    if !token.is_cancelled() {
                        self.shutdown.sever(format!("waiting for changes failed: {e}"));
                    }
                    return;
                }
            }
        }
    }

    async fn keepalive_loop(self: Arc<Self>) {
        let token = self.shutdown.token().clone();
        let remote = Arc::clone(self.sync.remote());
        let mut ticker = tokio::time::interval(self.keepalive);
        ticker.tick().await;

        loop {
            tokio::select! {
                () = token.cancelled() => return,
                _ = ticker.tick() => {}
            }

            let result = tokio::select! {
                () = token.cancelled() => return,
                result = remote.ping() => result,
            };
            self.state.send_replace(ConnectionState {
                alive: result.is_ok(),
                last_probe: Some(Utc::now()),
            });

            if let Err(e) = result {
                if !token.is_cancelled() {
                    self.shutdown.sever(format!("keepalive failed: {e}"));
                }
                return;
            }
        }
    }

    async fn position_clock(self: Arc<Self>) {
        let token = self.shutdown.token().clone();
        let mut ticker = tokio::time::interval(POSITION_STEP);
        ticker.tick().await;

        loop {
            tokio::select! {
                () = token.cancelled() => return,
                _ = ticker.tick() => {
                    self.sync.advance_position(POSITION_STEP);
                }
            }
        }
    }
}
