use tracing::debug;
use zbus::interface;

/// `org.mpris.MediaPlayer2`
///
/// MPD has no window to raise and is not ours to quit, so both methods are
/// accepted and do nothing.
pub struct RootInterface {
    identity: String,
}

impl RootInterface {
    /// Root interface for the daemon at `address`
    pub fn new(address: &str) -> Self {
        Self {
            identity: format!("MPD on {address}"),
        }
    }
}

#[interface(name = "org.mpris.MediaPlayer2")]
impl RootInterface {
    async fn raise(&self) {
        debug!("Ignoring Raise");
    }

    async fn quit(&self) {
        debug!("Ignoring Quit");
    }

    #[zbus(property)]
    async fn can_quit(&self) -> bool {
        false
    }

    #[zbus(property)]
    async fn can_raise(&self) -> bool {
        false
    }

    #[zbus(property)]
    async fn has_track_list(&self) -> bool {
        true
    }

    #[zbus(property)]
    async fn identity(&self) -> String {
        self.identity.clone()
    }

    #[zbus(property)]
    async fn supported_uri_schemes(&self) -> Vec<String> {
        Vec::new()
    }

    #[zbus(property)]
    async fn supported_mime_types(&self) -> Vec<String> {
        Vec::new()
    }
}
