use std::sync::Arc;

use zbus::{
    fdo, interface,
    object_server::SignalEmitter,
    zvariant::ObjectPath,
};

use super::values::{self, MetadataMap};
use crate::services::mpris::{
    MprisError,
    control::Dispatcher,
    events::PropertyValue,
    properties::PropertyTable,
    sync::Synchronizer,
    types::to_micros,
};

/// `org.mpris.MediaPlayer2.Player`
pub struct PlayerInterface {
    dispatcher: Arc<Dispatcher>,
    table: PropertyTable,
}

impl PlayerInterface {
    /// Player interface driving `dispatcher`
    pub fn new(dispatcher: Arc<Dispatcher>) -> Self {
        Self {
            table: PropertyTable::player(Arc::clone(&dispatcher)),
            dispatcher,
        }
    }

    /// Property table backing the writable properties
    pub fn table(&self) -> &PropertyTable {
        &self.table
    }

    fn sync(&self) -> &Synchronizer {
        self.dispatcher.synchronizer()
    }
}

#[interface(name = "org.mpris.MediaPlayer2.Player")]
impl PlayerInterface {
    async fn next(&self) -> fdo::Result<()> {
        Ok(self.dispatcher.next().await?)
    }

    async fn previous(&self) -> fdo::Result<()> {
        Ok(self.dispatcher.previous().await?)
    }

    async fn pause(&self) -> fdo::Result<()> {
        Ok(self.dispatcher.pause().await?)
    }

    async fn play_pause(&self) -> fdo::Result<()> {
        Ok(self.dispatcher.play_pause().await?)
    }

    async fn stop(&self) -> fdo::Result<()> {
        Ok(self.dispatcher.stop().await?)
    }

    async fn play(&self) -> fdo::Result<()> {
        Ok(self.dispatcher.play().await?)
    }

    async fn seek(&self, offset: i64) -> fdo::Result<()> {
        Ok(self.dispatcher.seek(offset).await?)
    }

    async fn set_position(&self, track_id: ObjectPath<'_>, position: i64) -> fdo::Result<()> {
        let track = values::track_id(&track_id)?;
        Ok(self.dispatcher.set_position(track, position).await?)
    }

    async fn open_uri(&self, _uri: String) -> fdo::Result<()> {
        Err(MprisError::NotImplemented("OpenUri").into())
    }

    #[zbus(signal)]
    pub async fn seeked(emitter: &SignalEmitter<'_>, position: i64) -> zbus::Result<()>;

    #[zbus(property)]
    async fn playback_status(&self) -> String {
        self.sync()
            .read(|s| s.player.playback_status.as_str().to_string())
            .await
    }

    #[zbus(property)]
    async fn loop_status(&self) -> String {
        self.sync()
            .read(|s| s.player.loop_status.as_str().to_string())
            .await
    }

    #[zbus(property)]
    async fn set_loop_status(&mut self, status: String) -> fdo::Result<()> {
        Ok(self
            .table
            .write("LoopStatus", PropertyValue::Text(status))
            .await?)
    }

    #[zbus(property)]
    async fn rate(&self) -> f64 {
        1.0
    }

    #[zbus(property)]
    async fn set_rate(&mut self, rate: f64) -> fdo::Result<()> {
        Ok(self.table.write("Rate", PropertyValue::Double(rate)).await?)
    }

    #[zbus(property)]
    async fn shuffle(&self) -> bool {
        self.sync().read(|s| s.player.shuffle).await
    }

    #[zbus(property)]
    async fn set_shuffle(&mut self, shuffle: bool) -> fdo::Result<()> {
        Ok(self
            .table
            .write("Shuffle", PropertyValue::Bool(shuffle))
            .await?)
    }

    #[zbus(property)]
    async fn metadata(&self) -> fdo::Result<MetadataMap> {
        let metadata = self.sync().read(|s| s.metadata.clone()).await;
        Ok(values::metadata_map(&metadata)?)
    }

    #[zbus(property)]
    async fn volume(&self) -> f64 {
        self.sync().read(|s| s.player.volume).await
    }

    #[zbus(property)]
    async fn set_volume(&mut self, volume: f64) -> fdo::Result<()> {
        Ok(self
            .table
            .write("Volume", PropertyValue::Double(volume))
            .await?)
    }

    #[zbus(property(emits_changed_signal = "false"))]
    async fn position(&self) -> i64 {
        self.sync().read(|s| to_micros(s.player.position)).await
    }

    #[zbus(property)]
    async fn minimum_rate(&self) -> f64 {
        1.0
    }

    #[zbus(property)]
    async fn maximum_rate(&self) -> f64 {
        1.0
    }

    #[zbus(property)]
    async fn can_go_next(&self) -> bool {
        true
    }

    #[zbus(property)]
    async fn can_go_previous(&self) -> bool {
        true
    }

    #[zbus(property)]
    async fn can_play(&self) -> bool {
        true
    }

    #[zbus(property)]
    async fn can_pause(&self) -> bool {
        true
    }

    #[zbus(property)]
    async fn can_seek(&self) -> bool {
        self.sync().read(|s| s.player.seekable).await
    }

    #[zbus(property(emits_changed_signal = "false"))]
    async fn can_control(&self) -> bool {
        true
    }
}
