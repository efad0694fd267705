use std::{
    collections::HashSet,
    env, io,
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};

use tracing::{debug, info, warn};

use crate::services::mpd::Remote;

use super::types::TrackId;

/// On-disk cache of cover art, keyed by queue id.
///
/// The directory is wiped when the cache is created and again on
/// [`ArtCache::clear`], so nothing survives between runs.
pub struct ArtCache {
    dir: PathBuf,
    remote: Arc<dyn Remote>,
    missing: Mutex<HashSet<TrackId>>,
}

impl ArtCache {
    /// Default cache location under the system temp directory
    pub fn default_dir() -> PathBuf {
        env::temp_dir().join("mpd_mpris")
    }

    /// Create the cache, removing whatever a previous run left behind
    ///
    /// # Errors
    /// Returns an I/O error if the directory cannot be cleaned or created.
    pub fn create(dir: PathBuf, remote: Arc<dyn Remote>) -> io::Result<Self> {
        if dir.exists() {
            info!("Cleaning previously existing art cache at {}", dir.display());
            std::fs::remove_dir_all(&dir)?;
        }
        std::fs::create_dir_all(&dir)?;

        Ok(Self {
            dir,
            remote,
            missing: Mutex::new(HashSet::new()),
        })
    }

    /// Cache directory
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// URI of the cached art for a track, if it has been fetched already
    pub fn location_for(&self, id: TrackId) -> Option<String> {
        let path = self.path_for(id);
        path.is_file().then(|| uri(&path))
    }

    /// URI of the art for a track, fetching it from MPD on first use
    ///
    /// Failures are logged and remembered so the same track is not asked for twice.
    pub async fn fetch(&self, id: TrackId, song_path: &str) -> Option<String> {
        if id.is_none() || song_path.is_empty() {
            return None;
        }
        if let Some(location) = self.location_for(id) {
            return Some(location);
        }
        if self.is_missing(id) {
            return None;
        }

        let bytes = match self.remote.album_art(song_path).await {
            Ok(bytes) if !bytes.is_empty() => bytes,
            Ok(_) => {
                debug!("No artwork for '{song_path}'");
                self.mark_missing(id);
                return None;
            }
            Err(e) => {
                warn!("Error getting artwork for '{song_path}': {e}");
                self.mark_missing(id);
                return None;
            }
        };

        let path = self.path_for(id);
        if let Err(e) = tokio::fs::write(&path, &bytes).await {
            warn!("Cannot write artwork for '{song_path}' to {}: {e}", path.display());
            return None;
        }

        Some(uri(&path))
    }

    /// Remove the cache directory
    ///
    /// # Errors
    /// Returns an I/O error if the directory exists but cannot be removed.
    pub fn clear(&self) -> io::Result<()> {
        if self.dir.exists() {
            std::fs::remove_dir_all(&self.dir)?;
        }
        Ok(())
    }

    fn path_for(&self, id: TrackId) -> PathBuf {
        self.dir.join(format!("albumart_{}", id.id()))
    }

    fn is_missing(&self, id: TrackId) -> bool {
        self.missing
            .lock()
            .map(|missing| missing.contains(&id))
            .unwrap_or(false)
    }

    fn mark_missing(&self, id: TrackId) {
        if let Ok(mut missing) = self.missing.lock() {
            missing.insert(id);
        }
    }
}

fn uri(path: &Path) -> String {
    format!("file://{}", path.display())
}
