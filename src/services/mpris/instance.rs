use std::{path::PathBuf, process, sync::Arc, time::Duration};

use tracing::{info, instrument, warn};

use crate::services::mpd::Remote;

use super::{
    MprisError,
    art::ArtCache,
    control::Dispatcher,
    events,
    monitoring::{ConnectionWatcher, Shutdown},
    server::{self, BUS_NAME_PREFIX, Publisher},
    sync::{Synchronizer, Thresholds},
};

/// Bus name for this bridge.
///
/// `instance_name` wins when given; `no_instance` drops the suffix; otherwise
/// the process id keeps concurrent bridges apart.
pub fn bus_name(no_instance: bool, instance_name: Option<&str>) -> String {
    match instance_name.filter(|name| !name.is_empty()) {
        Some(name) => format!("{BUS_NAME_PREFIX}.mpd.{name}"),
        None if no_instance => format!("{BUS_NAME_PREFIX}.mpd"),
        None => format!("{BUS_NAME_PREFIX}.mpd.instance{}", process::id()),
    }
}

/// Settings for one bridge instance
#[derive(Debug, Clone)]
pub struct InstanceOptions {
    /// Well-known name to claim on the session bus
    pub bus_name: String,
    /// Change detection limits
    pub thresholds: Thresholds,
    /// Keepalive period
    pub keepalive: Duration,
    /// Advance the position locally between ticks
    pub interpolate: bool,
    /// Cover art cache directory, `None` to disable art
    pub art_dir: Option<PathBuf>,
}

impl Default for InstanceOptions {
    fn default() -> Self {
        Self {
            bus_name: bus_name(false, None),
            thresholds: Thresholds::default(),
            keepalive: Duration::from_secs(25),
            interpolate: true,
            art_dir: Some(ArtCache::default_dir()),
        }
    }
}

/// One MPD daemon published as one MPRIS player
pub struct Instance {
    remote: Arc<dyn Remote>,
    options: InstanceOptions,
    shutdown: Shutdown,
}

impl Instance {
    /// Bridge `remote`; `shutdown` stops it
    pub fn new(remote: Arc<dyn Remote>, options: InstanceOptions, shutdown: Shutdown) -> Self {
        Self {
            remote,
            options,
            shutdown,
        }
    }

    /// Well-known name the instance claims
    pub fn name(&self) -> &str {
        &self.options.bus_name
    }

    /// Serve until the shutdown switch trips
    ///
    /// # Errors
    /// Returns error if the initial state cannot be loaded, the bus name cannot
    /// be claimed, or the MPD connection was lost while serving
    #[instrument(skip(self), fields(name = %self.options.bus_name))]
    pub async fn run(self) -> Result<(), MprisError> {
        let art = self.art_cache();
        let (tx, rx) = events::channel();

        let sync = Arc::new(Synchronizer::new(
            Arc::clone(&self.remote),
            tx,
            art.clone(),
            self.options.thresholds,
        ));
        sync.initialize().await?;

        let dispatcher = Arc::new(Dispatcher::new(Arc::clone(&sync), self.shutdown.clone()));
        let connection = server::serve(
            &self.options.bus_name,
            &self.remote.address(),
            dispatcher,
        )
        .await?;

        let publisher = Publisher::new(&connection).await?;
        let publishing = tokio::spawn(publisher.run(rx, self.shutdown.token().clone()));

        let watcher = Arc::new(ConnectionWatcher::new(
            sync,
            self.shutdown.clone(),
            self.options.keepalive,
            self.options.interpolate,
        ));
        let mut tasks = watcher.start();
        tasks.push(publishing);

        self.shutdown.triggered().await;
        info!("Shutting down");

        for task in tasks {
            if let Err(e) = task.await {
                warn!("Background task ended abnormally: {e}");
            }
        }
        drop(connection);

        if let Some(art) = art {
            if let Err(e) = art.clear() {
                warn!("Cannot remove art cache {}: {e}", art.dir().display());
            }
        }

        match self.shutdown.reason() {
            Some(reason) => Err(MprisError::ConnectionLost(reason.to_string())),
            None => Ok(()),
        }
    }

    fn art_cache(&self) -> Option<Arc<ArtCache>> {
        let dir = self.options.art_dir.clone()?;
        match ArtCache::create(dir, Arc::clone(&self.remote)) {
            Ok(cache) => Some(Arc::new(cache)),
            Err(e) => {
                warn!("Album art disabled, cannot prepare cache directory: {e}");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bus_name_variants() {
        assert_eq!(
            bus_name(false, Some("desk")),
            "org.mpris.MediaPlayer2.mpd.desk"
        );
        assert_eq!(bus_name(true, None), "org.mpris.MediaPlayer2.mpd");
        assert_eq!(
            bus_name(false, None),
            format!("org.mpris.MediaPlayer2.mpd.instance{}", process::id())
        );
        assert_eq!(bus_name(false, Some("")), bus_name(false, None));
    }
}
