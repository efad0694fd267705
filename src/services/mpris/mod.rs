//! MPD published as an MPRIS media player.
//!
//! The [`sync::Synchronizer`] mirrors MPD's state and turns differences into
//! [`events::Notification`]s, the [`control::Dispatcher`] applies client
//! requests, and [`server`] exposes both on the session bus.

/// Cover art cache
pub mod art;
/// Client requests
pub mod control;
/// MPRIS error types
pub mod error;
/// Notifications for the bus side
pub mod events;
/// Wiring of one bridge instance
pub mod instance;
/// Track metadata maps
pub mod metadata;
/// Connection watching and shutdown
pub mod monitoring;
/// Per-interface property tables
pub mod properties;
/// D-Bus interfaces
pub mod server;
/// State synchronization
pub mod sync;
/// Queue diffing
pub mod tracklist;
/// Core MPRIS types
pub mod types;

#[cfg(test)]
pub(crate) mod testing;

pub use control::Dispatcher;
pub use error::MprisError;
pub use events::{Interface, Notification, PropertyValue};
pub use instance::{Instance, InstanceOptions, bus_name};
pub use metadata::{Metadata, MetadataValue};
pub use monitoring::{ConnectionState, ConnectionWatcher, Shutdown};
pub use sync::{SyncState, Synchronizer, Thresholds, TickReport};
pub use types::{LoopStatus, PlaybackStatus, PlayerState, TrackId};
