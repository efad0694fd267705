use tokio::sync::broadcast::{self, error::RecvError};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use zbus::{Connection, object_server::InterfaceRef};

use super::{
    OBJECT_PATH, player::PlayerInterface, tracklist::TrackListInterface, values,
};
use crate::services::mpris::{
    MprisError,
    events::{Interface, Notification},
    properties::{EmitPolicy, PropertyTable},
    types::to_micros,
};

/// Turns notifications into D-Bus signals on the served object
pub struct Publisher {
    player: InterfaceRef<PlayerInterface>,
    tracklist: InterfaceRef<TrackListInterface>,
    tracklist_table: PropertyTable,
}

impl Publisher {
    /// Look up the served interfaces on `connection`
    ///
    /// # Errors
    /// Returns error if the interfaces are not served at the MPRIS object path
    pub async fn new(connection: &Connection) -> Result<Self, MprisError> {
        let server = connection.object_server();
        Ok(Self {
            player: server.interface(OBJECT_PATH).await?,
            tracklist: server.interface(OBJECT_PATH).await?,
            tracklist_table: PropertyTable::track_list(),
        })
    }

    /// Forward notifications until cancelled or the channel closes
    pub async fn run(
        self,
        mut notifications: broadcast::Receiver<Notification>,
        cancel: CancellationToken,
    ) {
        loop {
            let notification = tokio::select! {
                () = cancel.cancelled() => return,
                received = notifications.recv() => received,
            };

            match notification {
                Ok(notification) => {
                    if let Err(e) = self.publish(&notification).await {
                        warn!("Cannot emit {notification:?}: {e}");
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!("Dropped {skipped} notifications");
                }
                Err(RecvError::Closed) => return,
            }
        }
    }

    async fn publish(&self, notification: &Notification) -> Result<(), MprisError> {
        match notification {
            Notification::PropertyChanged {
                interface: Interface::Player,
                name,
                ..
            } => self.player_changed(name).await,
            Notification::PropertyChanged {
                interface: Interface::TrackList,
                name,
                ..
            } => self.tracklist_changed(name).await,
            Notification::PropertyChanged {
                interface: Interface::Root,
                name,
                ..
            } => {
                debug!("Root property {name} never changes");
                Ok(())
            }
            Notification::Seeked(position) => {
                PlayerInterface::seeked(self.player.signal_emitter(), to_micros(*position))
                    .await?;
                Ok(())
            }
            Notification::TrackAdded { metadata, after } => {
                TrackListInterface::track_added(
                    self.tracklist.signal_emitter(),
                    values::metadata_map(metadata)?,
                    values::track_path(*after)?,
                )
                .await?;
                Ok(())
            }
            Notification::TrackRemoved(id) => {
                TrackListInterface::track_removed(
                    self.tracklist.signal_emitter(),
                    values::track_path(*id)?,
                )
                .await?;
                Ok(())
            }
            Notification::TrackListReplaced { tracks, current } => {
                TrackListInterface::track_list_replaced(
                    self.tracklist.signal_emitter(),
                    values::track_paths(tracks)?,
                    values::track_path(*current)?,
                )
                .await?;
                Ok(())
            }
        }
    }

    async fn player_changed(&self, name: &str) -> Result<(), MprisError> {
        let iface = self.player.get().await;
        let emitter = self.player.signal_emitter();
        match property_signal(iface.table(), name) {
            Some(PropertySignal::PlaybackStatus) => iface.playback_status_changed(emitter).await?,
            Some(PropertySignal::LoopStatus) => iface.loop_status_changed(emitter).await?,
            Some(PropertySignal::Shuffle) => iface.shuffle_changed(emitter).await?,
            Some(PropertySignal::Metadata) => iface.metadata_changed(emitter).await?,
            Some(PropertySignal::Volume) => iface.volume_changed(emitter).await?,
            Some(PropertySignal::CanSeek) => iface.can_seek_changed(emitter).await?,
            Some(PropertySignal::TracksInvalidated) | None => {
                debug!("No change signal for Player.{name}");
            }
        }
        Ok(())
    }

    async fn tracklist_changed(&self, name: &str) -> Result<(), MprisError> {
        match property_signal(&self.tracklist_table, name) {
            Some(PropertySignal::TracksInvalidated) => {
                let iface = self.tracklist.get().await;
                iface
                    .tracks_invalidate(self.tracklist.signal_emitter())
                    .await?;
            }
            _ => debug!("No change signal for TrackList.{name}"),
        }
        Ok(())
    }
}

/// `PropertiesChanged` emission a property change maps to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PropertySignal {
    PlaybackStatus,
    LoopStatus,
    Shuffle,
    Metadata,
    Volume,
    CanSeek,
    TracksInvalidated,
}

/// Which emission, if any, announces `name` under the table's emit policy
fn property_signal(table: &PropertyTable, name: &str) -> Option<PropertySignal> {
    let policy = table.emit_policy(name);
    match (table.interface(), name, policy) {
        (_, _, EmitPolicy::False) => None,
        (Interface::Player, "PlaybackStatus", EmitPolicy::True) => {
            Some(PropertySignal::PlaybackStatus)
        }
        (Interface::Player, "LoopStatus", EmitPolicy::True) => Some(PropertySignal::LoopStatus),
        (Interface::Player, "Shuffle", EmitPolicy::True) => Some(PropertySignal::Shuffle),
        (Interface::Player, "Metadata", EmitPolicy::True) => Some(PropertySignal::Metadata),
        (Interface::Player, "Volume", EmitPolicy::True) => Some(PropertySignal::Volume),
        (Interface::Player, "CanSeek", EmitPolicy::True) => Some(PropertySignal::CanSeek),
        (Interface::TrackList, "Tracks", EmitPolicy::Invalidates) => {
            Some(PropertySignal::TracksInvalidated)
        }
        _ => None,
    }
}
