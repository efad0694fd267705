use std::sync::Arc;

use zbus::{
    fdo, interface,
    object_server::SignalEmitter,
    zvariant::{ObjectPath, OwnedObjectPath},
};

use super::values::{self, MetadataMap};
use crate::services::mpris::{control::Dispatcher, types::TrackId};

/// `org.mpris.MediaPlayer2.TrackList`, mirroring MPD's queue
pub struct TrackListInterface {
    dispatcher: Arc<Dispatcher>,
}

impl TrackListInterface {
    /// Track list interface over the dispatcher's queue
    pub fn new(dispatcher: Arc<Dispatcher>) -> Self {
        Self { dispatcher }
    }
}

#[interface(name = "org.mpris.MediaPlayer2.TrackList")]
impl TrackListInterface {
    async fn get_tracks_metadata(
        &self,
        track_ids: Vec<OwnedObjectPath>,
    ) -> fdo::Result<Vec<MetadataMap>> {
        let ids = track_ids
            .iter()
            .map(|path| values::track_id(path))
            .collect::<Result<Vec<TrackId>, _>>()?;

        let metadata = self.dispatcher.tracks_metadata(&ids).await;
        Ok(metadata
            .iter()
            .map(values::metadata_map)
            .collect::<Result<Vec<_>, _>>()?)
    }

    async fn add_track(
        &self,
        uri: String,
        after_track: ObjectPath<'_>,
        set_as_current: bool,
    ) -> fdo::Result<()> {
        let after = values::track_id(&after_track)?;
        Ok(self
            .dispatcher
            .add_track(&uri, after, set_as_current)
            .await?)
    }

    async fn remove_track(&self, track_id: ObjectPath<'_>) -> fdo::Result<()> {
        let track = values::track_id(&track_id)?;
        Ok(self.dispatcher.remove_track(track).await?)
    }

    async fn go_to(&self, track_id: ObjectPath<'_>) -> fdo::Result<()> {
        let track = values::track_id(&track_id)?;
        Ok(self.dispatcher.go_to(track).await?)
    }

    #[zbus(signal)]
    pub async fn track_list_replaced(
        emitter: &SignalEmitter<'_>,
        tracks: Vec<OwnedObjectPath>,
        current_track: OwnedObjectPath,
    ) -> zbus::Result<()>;

    #[zbus(signal)]
    pub async fn track_added(
        emitter: &SignalEmitter<'_>,
        metadata: MetadataMap,
        after_track: OwnedObjectPath,
    ) -> zbus::Result<()>;

    #[zbus(signal)]
    pub async fn track_removed(
        emitter: &SignalEmitter<'_>,
        track_id: OwnedObjectPath,
    ) -> zbus::Result<()>;

    #[zbus(property(emits_changed_signal = "invalidates"))]
    async fn tracks(&self) -> fdo::Result<Vec<OwnedObjectPath>> {
        let ids = self
            .dispatcher
            .synchronizer()
            .read(|s| s.tracklist.ids())
            .await;
        Ok(values::track_paths(&ids)?)
    }

    #[zbus(property)]
    async fn can_edit_tracks(&self) -> bool {
        true
    }
}
