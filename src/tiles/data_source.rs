use crate::core::config::PipelineOptions;
use crate::core::geo::TileCoord;
use crate::plugins::registry::LayerSet;
use crate::prelude::{Arc, CancellationToken};
use crate::tiles::disk::DiskCache;
use crate::tiles::loader::{HttpFetcher, TileFetcher};
use crate::tiles::source::{MapzenSource, TileSource};
use crate::{MapError, Result};

/// Loads raw tile payloads, disk first and network second.
///
/// Successful downloads are persisted before they are returned; failed ones
/// leave the disk untouched.
#[derive(Clone)]
pub struct TileDataSource {
    source: Arc<dyn TileSource>,
    fetcher: Arc<dyn TileFetcher>,
    disk: DiskCache,
    layers: LayerSet,
}

impl TileDataSource {
    pub fn new(
        source: Arc<dyn TileSource>,
        fetcher: Arc<dyn TileFetcher>,
        disk: DiskCache,
        layers: LayerSet,
    ) -> Self {
        Self {
            source,
            fetcher,
            disk,
            layers,
        }
    }

    /// Mapzen source over HTTP, caching under the configured directory.
    pub fn from_options(options: &PipelineOptions, layers: LayerSet) -> Self {
        Self::new(
            Arc::new(MapzenSource::from_config(&options.source)),
            Arc::new(HttpFetcher::from_config(&options.loading)),
            DiskCache::from_config(&options.cache),
            layers,
        )
    }

    pub fn layers(&self) -> &LayerSet {
        &self.layers
    }

    pub fn disk(&self) -> &DiskCache {
        &self.disk
    }

    pub fn url(&self, coord: TileCoord) -> String {
        self.source.url(coord, &self.layers)
    }

    /// Payload for `coord`. Returns [`MapError::Cancelled`] as soon as
    /// `cancel` fires while the download is in flight.
    pub async fn fetch(&self, coord: TileCoord, cancel: &CancellationToken) -> Result<Vec<u8>> {
        if cancel.is_cancelled() {
            return Err(MapError::Cancelled);
        }

        if let Some(data) = self.disk.read(coord, &self.layers).await? {
            log::debug!("disk cache hit for tile {} ({} bytes)", coord, data.len());
            return Ok(data);
        }

        let url = self.url(coord);
        let data = tokio::select! {
            _ = cancel.cancelled() => return Err(MapError::Cancelled),
            result = self.fetcher.fetch(&url) => result,
        };
        let data = match data {
            Ok(data) => data,
            Err(e) => {
                log::warn!("failed to fetch tile {}: {}", coord, e);
                return Err(e);
            }
        };

        self.disk.write(coord, &self.layers, &data).await?;
        Ok(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingFetcher {
        calls: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl TileFetcher for CountingFetcher {
        async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(MapError::Http {
                    status: 503,
                    url: url.to_string(),
                })
            } else {
                Ok(url.as_bytes().to_vec())
            }
        }
    }

    struct StalledFetcher;

    #[async_trait]
    impl TileFetcher for StalledFetcher {
        async fn fetch(&self, _url: &str) -> Result<Vec<u8>> {
            futures::future::pending::<()>().await;
            Ok(Vec::new())
        }
    }

    fn data_source(dir: &std::path::Path, fetcher: Arc<dyn TileFetcher>) -> TileDataSource {
        TileDataSource::new(
            Arc::new(MapzenSource::new("http://tiles.test", "k")),
            fetcher,
            DiskCache::new(dir),
            LayerSet::from_tags(["roads"]),
        )
    }

    #[tokio::test]
    async fn test_second_fetch_reads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = Arc::new(CountingFetcher {
            calls: AtomicUsize::new(0),
            fail: false,
        });
        let source = data_source(dir.path(), fetcher.clone());
        let coord = TileCoord::new(38742, 24829, 16);
        let cancel = CancellationToken::new();

        let first = source.fetch(coord, &cancel).await.unwrap();
        let second = source.fetch(coord, &cancel).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(first, b"http://tiles.test/roads/16/38742/24829.json?api_key=k".to_vec());
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failed_fetch_is_not_persisted() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = Arc::new(CountingFetcher {
            calls: AtomicUsize::new(0),
            fail: true,
        });
        let source = data_source(dir.path(), fetcher.clone());
        let coord = TileCoord::new(10, 20, 16);
        let cancel = CancellationToken::new();

        assert!(matches!(
            source.fetch(coord, &cancel).await,
            Err(MapError::Http { status: 503, .. })
        ));
        assert!(!source.disk().contains(coord, source.layers()).await);

        // the next attempt goes back to the network
        let _ = source.fetch(coord, &cancel).await;
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_cancel_interrupts_download() {
        let dir = tempfile::tempdir().unwrap();
        let source = data_source(dir.path(), Arc::new(StalledFetcher));
        let cancel = CancellationToken::new();

        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
            trigger.cancel();
        });

        let result = source.fetch(TileCoord::new(1, 1, 1), &cancel).await;
        assert!(matches!(result, Err(MapError::Cancelled)));
    }
}
