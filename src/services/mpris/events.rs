use std::{fmt, time::Duration};

use tokio::sync::broadcast;

use super::{metadata::Metadata, types::TrackId};

/// MPRIS interface a property belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Interface {
    /// `org.mpris.MediaPlayer2`
    Root,
    /// `org.mpris.MediaPlayer2.Player`
    Player,
    /// `org.mpris.MediaPlayer2.TrackList`
    TrackList,
}

impl Interface {
    /// D-Bus interface name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Root => "org.mpris.MediaPlayer2",
            Self::Player => "org.mpris.MediaPlayer2.Player",
            Self::TrackList => "org.mpris.MediaPlayer2.TrackList",
        }
    }
}

impl fmt::Display for Interface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Value carried by a property change or a property write
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    /// Boolean property
    Bool(bool),
    /// Floating point property (volume, rate)
    Double(f64),
    /// String property (playback and loop status)
    Text(String),
    /// Time in microseconds
    Micros(i64),
    /// Track metadata map
    Metadata(Metadata),
    /// Ordered track ids
    Tracks(Vec<TrackId>),
}

/// Something the IPC side has to tell its subscribers about
#[derive(Debug, Clone, PartialEq)]
pub enum Notification {
    /// A property took a new value
    PropertyChanged {
        /// Owning interface
        interface: Interface,
        /// MPRIS property name
        name: &'static str,
        /// The new value
        value: PropertyValue,
    },

    /// Playback position jumped
    Seeked(Duration),

    /// A track was inserted into the queue
    TrackAdded {
        /// Metadata of the new track
        metadata: Metadata,
        /// Track it was inserted after, [`TrackId::NONE`] for the head
        after: TrackId,
    },

    /// A track left the queue
    TrackRemoved(TrackId),

    /// The queue was replaced wholesale
    TrackListReplaced {
        /// New queue order
        tracks: Vec<TrackId>,
        /// Current track
        current: TrackId,
    },
}

impl Notification {
    /// Shorthand for a player property change
    pub fn player(name: &'static str, value: PropertyValue) -> Self {
        Self::PropertyChanged {
            interface: Interface::Player,
            name,
            value,
        }
    }

    /// Property name if this is a property change
    pub fn property_name(&self) -> Option<&'static str> {
        match self {
            Self::PropertyChanged { name, .. } => Some(*name),
            _ => None,
        }
    }
}

/// Sending half of the notification channel
pub type NotificationSender = broadcast::Sender<Notification>;

/// Create the notification channel
pub fn channel() -> (NotificationSender, broadcast::Receiver<Notification>) {
    broadcast::channel(1024)
}
