use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::{debug, error, instrument, warn};

use crate::services::media::{host::ThumbnailSource, state::PLACEHOLDER_COVER};

/// Reads session artwork and persists it as the current cover file
#[derive(Debug, Clone)]
pub struct CoverStore {
    path: PathBuf,
    capacity: usize,
}

impl CoverStore {
    /// Store writing to `path`, reading at most `capacity` bytes per cover.
    pub fn new(path: PathBuf, capacity: usize) -> Self {
        Self { path, capacity }
    }

    /// Where the cover is persisted.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the cover bytes, or the placeholder when there are none.
    ///
    /// Never fails: a missing reference, a read error or an empty payload
    /// all yield the placeholder image.
    #[instrument(skip_all, fields(capacity = self.capacity))]
    pub async fn load(&self, thumbnail: Option<Box<dyn ThumbnailSource>>) -> Vec<u8> {
        let Some(thumbnail) = thumbnail else {
            warn!("Session has no thumbnail, using placeholder");
            return PLACEHOLDER_COVER.to_vec();
        };

        match thumbnail.read(self.capacity).await {
            Ok(bytes) if bytes.is_empty() => {
                warn!("Thumbnail stream was empty, using placeholder");
                PLACEHOLDER_COVER.to_vec()
            }
            Ok(mut bytes) => {
                bytes.truncate(self.capacity);
                debug!(len = bytes.len(), "Read thumbnail");
                bytes
            }
            Err(error) => {
                error!(%error, "Failed to read thumbnail, using placeholder");
                PLACEHOLDER_COVER.to_vec()
            }
        }
    }

    /// Write `bytes` to the cover file. Failures are logged only.
    #[instrument(skip_all, fields(path = %self.path.display()))]
    pub async fn persist(&self, bytes: &[u8]) {
        if let Some(parent) = self.path.parent() {
            if let Err(error) = fs::create_dir_all(parent).await {
                error!(%error, "Failed to create cover directory");
                return;
            }
        }

        if let Err(error) = fs::write(&self.path, bytes).await {
            error!(%error, "Failed to write cover file");
        }
    }
}
