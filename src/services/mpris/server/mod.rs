//! The MPRIS object as seen on the session bus.

/// Notification to signal forwarding
pub mod publisher;
/// `org.mpris.MediaPlayer2.Player`
pub mod player;
/// `org.mpris.MediaPlayer2`
pub mod root;
/// `org.mpris.MediaPlayer2.TrackList`
pub mod tracklist;
/// Conversions to D-Bus values
pub mod values;

use std::sync::Arc;

use tracing::{info, instrument};
use zbus::Connection;

pub use player::PlayerInterface;
pub use publisher::Publisher;
pub use root::RootInterface;
pub use tracklist::TrackListInterface;

use super::{MprisError, control::Dispatcher};

/// Object path every MPRIS player is served at
pub const OBJECT_PATH: &str = "/org/mpris/MediaPlayer2";

/// Well-known name prefix of MPRIS players
pub const BUS_NAME_PREFIX: &str = "org.mpris.MediaPlayer2";

/// Connect to the session bus, serve the three interfaces and claim `bus_name`
///
/// # Errors
/// Returns error if the session bus is unreachable or the name is taken
#[instrument(skip(dispatcher))]
pub async fn serve(
    bus_name: &str,
    address: &str,
    dispatcher: Arc<Dispatcher>,
) -> Result<Connection, MprisError> {
    let connection = zbus::connection::Builder::session()?
        .name(bus_name)?
        .serve_at(OBJECT_PATH, RootInterface::new(address))?
        .serve_at(OBJECT_PATH, PlayerInterface::new(Arc::clone(&dispatcher)))?
        .serve_at(OBJECT_PATH, TrackListInterface::new(dispatcher))?
        .build()
        .await?;

    info!("Serving MPRIS as {bus_name}");
    Ok(connection)
}
