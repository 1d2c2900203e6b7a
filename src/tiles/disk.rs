//! Per-tile payload files on local disk.

use crate::core::config::CacheConfig;
use crate::core::geo::TileCoord;
use crate::plugins::registry::LayerSet;
use crate::Result;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Raw tile payloads stored as `{root}/{zoom}/{layers}_{x}_{y}`.
#[derive(Debug, Clone)]
pub struct DiskCache {
    root: PathBuf,
}

impl DiskCache {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn from_config(config: &CacheConfig) -> Self {
        Self::new(config.directory.clone())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn zoom_directory(&self, zoom: u8) -> PathBuf {
        self.root.join(zoom.to_string())
    }

    /// Location of the payload for `coord` fetched with `layers`.
    pub fn path_for(&self, coord: TileCoord, layers: &LayerSet) -> PathBuf {
        self.zoom_directory(coord.z)
            .join(format!("{}_{}_{}", layers.file_stem(), coord.x, coord.y))
    }

    /// Reads a cached payload. A missing file is `Ok(None)`.
    pub async fn read(&self, coord: TileCoord, layers: &LayerSet) -> Result<Option<Vec<u8>>> {
        let path = self.path_for(coord, layers);
        match tokio::fs::read(&path).await {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Writes a payload atomically: the data goes to a temp file that is
    /// renamed over the final path, so readers never see a partial file.
    ///
    /// Each write uses its own temp file, so overlapping writes of the same
    /// key both succeed and the last rename wins.
    pub async fn write(&self, coord: TileCoord, layers: &LayerSet, data: &[u8]) -> Result<()> {
        let path = self.path_for(coord, layers);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let temp_path = Self::temp_path_for(&path);
        let written = match tokio::fs::write(&temp_path, data).await {
            Ok(()) => tokio::fs::rename(&temp_path, &path).await,
            Err(e) => Err(e),
        };
        if let Err(e) = written {
            let _ = tokio::fs::remove_file(&temp_path).await;
            return Err(e.into());
        }
        Ok(())
    }

    fn temp_path_for(path: &Path) -> PathBuf {
        let seq = TEMP_COUNTER.fetch_add(1, Ordering::Relaxed);
        path.with_extension(format!("{}-{}.tmp", std::process::id(), seq))
    }

    pub async fn contains(&self, coord: TileCoord, layers: &LayerSet) -> bool {
        tokio::fs::metadata(self.path_for(coord, layers))
            .await
            .map(|m| m.is_file())
            .unwrap_or(false)
    }
}
