use crate::core::config::TileLoadingConfig;
use crate::{MapError, Result};
use async_trait::async_trait;
use once_cell::sync::Lazy;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;

/// Shared async HTTP client with a custom User-Agent so that public tile
/// servers don't reject the request. Building the client once avoids the cost
/// of TLS and connection pool setup for every tile.
pub(crate) static HTTP_CLIENT: Lazy<Client> = Lazy::new(|| {
    Client::builder()
        .user_agent(concat!("vectile/", env!("CARGO_PKG_VERSION")))
        .build()
        .expect("failed to build reqwest client")
});

/// Network side of the tile data source.
#[async_trait]
pub trait TileFetcher: Send + Sync {
    /// Downloads the body at `url`. Non-success responses are errors.
    async fn fetch(&self, url: &str) -> Result<Vec<u8>>;
}

/// Fetches tiles over HTTP, limiting how many requests are in flight at once.
#[derive(Clone)]
pub struct HttpFetcher {
    timeout: Duration,
    permits: Arc<Semaphore>,
}

impl HttpFetcher {
    pub fn new(timeout: Duration, max_concurrent_requests: usize) -> Self {
        Self {
            timeout,
            permits: Arc::new(Semaphore::new(max_concurrent_requests.max(1))),
        }
    }

    pub fn from_config(config: &TileLoadingConfig) -> Self {
        Self::new(config.request_timeout(), config.max_concurrent_requests)
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::from_config(&TileLoadingConfig::default())
    }
}

#[async_trait]
impl TileFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| MapError::Cancelled)?;

        log::debug!("GET {}", url);
        let resp = HTTP_CLIENT.get(url).timeout(self.timeout).send().await?;
        let status = resp.status();
        if !status.is_success() {
            log::warn!("tile request {} returned HTTP {}", url, status);
            return Err(MapError::Http {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        let bytes = resp.bytes().await?;
        log::info!("downloaded {} ({} bytes)", url, bytes.len());
        Ok(bytes.to_vec())
    }
}
