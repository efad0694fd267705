//! Property tables for the three MPRIS interfaces.
//!
//! Each table lists a property's access flags and how changes are announced on
//! the bus. Writable properties carry the handler that applies a write.

use std::sync::Arc;

use async_trait::async_trait;
use bitflags::bitflags;

use super::{
    MprisError,
    control::Dispatcher,
    events::{Interface, PropertyValue},
};

bitflags! {
    /// Property access flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Access: u8 {
        /// The property can be read.
        const READ = 0x01;
        /// The property can be written.
        const WRITE = 0x02;
    }
}

/// How a property change is announced through `PropertiesChanged`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmitPolicy {
    /// The new value is sent
    True,
    /// Only the name is sent; clients re-read the value
    Invalidates,
    /// Nothing is sent
    False,
}

/// Applies a write to a property
#[async_trait]
pub trait PropertyWrite: Send + Sync {
    /// Handle a new value from a client
    ///
    /// # Errors
    /// Returns error if the value has the wrong type or cannot be applied
    async fn on_write(&self, value: PropertyValue) -> Result<(), MprisError>;
}

/// One property of an interface
pub struct PropertyDescriptor {
    /// MPRIS property name
    pub name: &'static str,
    /// Access flags
    pub access: Access,
    /// Change announcement policy
    pub emit: EmitPolicy,
    writer: Option<Arc<dyn PropertyWrite>>,
}

impl PropertyDescriptor {
    fn read(name: &'static str) -> Self {
        Self {
            name,
            access: Access::READ,
            emit: EmitPolicy::True,
            writer: None,
        }
    }

    fn quiet(mut self, emit: EmitPolicy) -> Self {
        self.emit = emit;
        self
    }

    fn writable(mut self, writer: Arc<dyn PropertyWrite>) -> Self {
        self.access |= Access::WRITE;
        self.writer = Some(writer);
        self
    }
}

/// Properties of one interface
pub struct PropertyTable {
    interface: Interface,
    properties: Vec<PropertyDescriptor>,
}

impl PropertyTable {
    /// `org.mpris.MediaPlayer2`
    pub fn root() -> Self {
        Self {
            interface: Interface::Root,
            properties: vec![
                PropertyDescriptor::read("CanQuit"),
                PropertyDescriptor::read("CanRaise"),
                PropertyDescriptor::read("HasTrackList"),
                PropertyDescriptor::read("Identity"),
                PropertyDescriptor::read("SupportedUriSchemes"),
                PropertyDescriptor::read("SupportedMimeTypes"),
            ],
        }
    }

    /// `org.mpris.MediaPlayer2.Player`, with writes going through `dispatcher`
    pub fn player(dispatcher: Arc<Dispatcher>) -> Self {
        let loop_status = Arc::new(LoopStatusWrite(Arc::clone(&dispatcher)));
        let shuffle = Arc::new(ShuffleWrite(Arc::clone(&dispatcher)));
        let volume = Arc::new(VolumeWrite(dispatcher));

        Self {
            interface: Interface::Player,
            properties: vec![
                PropertyDescriptor::read("PlaybackStatus"),
                PropertyDescriptor::read("LoopStatus").writable(loop_status),
                PropertyDescriptor::read("Rate").writable(Arc::new(NotImplemented("Rate"))),
                PropertyDescriptor::read("Shuffle").writable(shuffle),
                PropertyDescriptor::read("Metadata"),
                PropertyDescriptor::read("Volume").writable(volume),
                PropertyDescriptor::read("Position").quiet(EmitPolicy::False),
                PropertyDescriptor::read("MinimumRate"),
                PropertyDescriptor::read("MaximumRate"),
                PropertyDescriptor::read("CanGoNext"),
                PropertyDescriptor::read("CanGoPrevious"),
                PropertyDescriptor::read("CanPlay"),
                PropertyDescriptor::read("CanPause"),
                PropertyDescriptor::read("CanSeek"),
                PropertyDescriptor::read("CanControl").quiet(EmitPolicy::False),
            ],
        }
    }

    /// `org.mpris.MediaPlayer2.TrackList`
    pub fn track_list() -> Self {
        Self {
            interface: Interface::TrackList,
            properties: vec![
                PropertyDescriptor::read("Tracks").quiet(EmitPolicy::Invalidates),
                PropertyDescriptor::read("CanEditTracks"),
            ],
        }
    }

    /// Interface this table describes
    pub fn interface(&self) -> Interface {
        self.interface
    }

    /// Look up a property
    pub fn get(&self, name: &str) -> Option<&PropertyDescriptor> {
        self.properties.iter().find(|p| p.name == name)
    }

    /// All properties in declaration order
    pub fn iter(&self) -> impl Iterator<Item = &PropertyDescriptor> {
        self.properties.iter()
    }

    /// Announcement policy of a property; unknown names are never announced
    pub fn emit_policy(&self, name: &str) -> EmitPolicy {
        self.get(name).map_or(EmitPolicy::False, |p| p.emit)
    }

    /// Apply a client write
    ///
    /// # Errors
    /// Returns error if the property is unknown or read-only, or its handler fails
    pub async fn write(&self, name: &str, value: PropertyValue) -> Result<(), MprisError> {
        let property = self.get(name).ok_or_else(|| {
            MprisError::InvalidValue(format!("{} has no property {name}", self.interface))
        })?;

        match &property.writer {
            Some(writer) if property.access.contains(Access::WRITE) => {
                writer.on_write(value).await
            }
            _ => Err(MprisError::InvalidValue(format!("{name} is read-only"))),
        }
    }
}

struct LoopStatusWrite(Arc<Dispatcher>);

#[async_trait]
impl PropertyWrite for LoopStatusWrite {
    async fn on_write(&self, value: PropertyValue) -> Result<(), MprisError> {
        match value {
            PropertyValue::Text(status) => self.0.set_loop_status(status.parse()?).await,
            other => Err(mismatch("LoopStatus", &other)),
        }
    }
}

struct ShuffleWrite(Arc<Dispatcher>);

#[async_trait]
impl PropertyWrite for ShuffleWrite {
    async fn on_write(&self, value: PropertyValue) -> Result<(), MprisError> {
        match value {
            PropertyValue::Bool(shuffle) => self.0.set_shuffle(shuffle).await,
            other => Err(mismatch("Shuffle", &other)),
        }
    }
}

struct VolumeWrite(Arc<Dispatcher>);

#[async_trait]
impl PropertyWrite for VolumeWrite {
    async fn on_write(&self, value: PropertyValue) -> Result<(), MprisError> {
        match value {
            PropertyValue::Double(volume) => self.0.set_volume(volume).await,
            other => Err(mismatch("Volume", &other)),
        }
    }
}

struct NotImplemented(&'static str);

#[async_trait]
impl PropertyWrite for NotImplemented {
    async fn on_write(&self, _value: PropertyValue) -> Result<(), MprisError> {
        Err(MprisError::NotImplemented(self.0))
    }
}

fn mismatch(name: &str, value: &PropertyValue) -> MprisError {
    MprisError::InvalidValue(format!("unexpected value for {name}: {value:?}"))
}
