//! Configuration system for the tile content pipeline
//!
//! This module provides a hierarchical configuration system that allows users
//! to configure the tile source, the caches and the loading behaviour through
//! presets, custom values, or a JSON file.

use crate::core::constants::{DEFAULT_RANGE, DEFAULT_ZOOM, MAX_RANGE, MAX_ZOOM};
use crate::{MapError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq)]
pub enum PipelineProfile {
    Balanced,
    LowResource,
    HighPerformance,
    Custom(PipelineOptions),
}

impl PipelineProfile {
    pub fn resolve(&self) -> PipelineOptions {
        match self {
            Self::Balanced => PipelineOptions {
                source: SourceConfig::default(),
                cache: CacheConfig {
                    directory: PathBuf::from("CachedTileData"),
                    eviction: EvictionPolicy::Lru { capacity: 1024 },
                },
                loading: TileLoadingConfig {
                    zoom: DEFAULT_ZOOM,
                    range: Some(DEFAULT_RANGE),
                    request_timeout_ms: 10_000,
                    max_concurrent_requests: 6,
                },
            },
            Self::LowResource => PipelineOptions {
                source: SourceConfig::default(),
                cache: CacheConfig {
                    directory: PathBuf::from("CachedTileData"),
                    eviction: EvictionPolicy::Lru { capacity: 128 },
                },
                loading: TileLoadingConfig {
                    zoom: DEFAULT_ZOOM,
                    range: Some(1),
                    request_timeout_ms: 20_000,
                    max_concurrent_requests: 2,
                },
            },
            Self::HighPerformance => PipelineOptions {
                source: SourceConfig::default(),
                cache: CacheConfig {
                    directory: PathBuf::from("CachedTileData"),
                    eviction: EvictionPolicy::Lru { capacity: 8192 },
                },
                loading: TileLoadingConfig {
                    zoom: DEFAULT_ZOOM,
                    range: None,
                    request_timeout_ms: 5_000,
                    max_concurrent_requests: 32,
                },
            },
            Self::Custom(options) => options.clone(),
        }
    }
}

impl Default for PipelineProfile {
    fn default() -> Self {
        Self::Balanced
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineOptions {
    pub source: SourceConfig,
    pub cache: CacheConfig,
    pub loading: TileLoadingConfig,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        PipelineProfile::default().resolve()
    }
}

impl PipelineOptions {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let options: Self = serde_json::from_str(json)?;
        options.validate()?;
        Ok(options)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn validate(&self) -> Result<()> {
        if self.loading.zoom > MAX_ZOOM {
            return Err(MapError::Config(format!(
                "zoom {} is above the maximum of {}",
                self.loading.zoom, MAX_ZOOM
            )));
        }
        if self.loading.max_concurrent_requests == 0 {
            return Err(MapError::Config(
                "max_concurrent_requests must be at least 1".to_string(),
            ));
        }
        if let Some(range) = self.loading.range {
            if range > MAX_RANGE {
                return Err(MapError::Config(format!(
                    "range {} is above the maximum of {}",
                    range, MAX_RANGE
                )));
            }
        }
        if let EvictionPolicy::Lru { capacity } = self.cache.eviction {
            if capacity == 0 {
                return Err(MapError::Config("LRU capacity must be at least 1".to_string()));
            }
            // a selection that cannot fit would evict its own tiles
            if let Some(block) = self.loading.tiles_per_update() {
                if block > capacity {
                    return Err(MapError::Config(format!(
                        "range block of {} tiles does not fit the LRU capacity of {}",
                        block, capacity
                    )));
                }
            }
        }
        if self.source.base_url.is_empty() {
            return Err(MapError::Config("tile source base_url is empty".to_string()));
        }
        Ok(())
    }
}

/// Where vector tiles are downloaded from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    pub base_url: String,
    pub api_key: String,
    pub format: String,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            base_url: "http://tile.mapzen.com/mapzen/vector/v1".to_string(),
            api_key: String::new(),
            format: "json".to_string(),
        }
    }
}

/// How many tiles the in-memory store keeps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum EvictionPolicy {
    /// Tiles accumulate for the whole session.
    Unbounded,
    /// Least-recently-used tiles are dropped beyond `capacity`.
    Lru { capacity: usize },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Root of the on-disk payload cache; one sub-directory per zoom level.
    pub directory: PathBuf,
    pub eviction: EvictionPolicy,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("CachedTileData"),
            eviction: EvictionPolicy::Lru { capacity: 1024 },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TileLoadingConfig {
    pub zoom: u8,
    /// Half-width of the square block around the center tile. `None` selects
    /// tiles from the viewport rectangle instead.
    pub range: Option<u32>,
    pub request_timeout_ms: u64,
    pub max_concurrent_requests: usize,
}

impl TileLoadingConfig {
    pub fn request_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.request_timeout_ms)
    }

    /// Tiles requested per viewport update in range mode. `None` in viewport
    /// mode or when the block size overflows.
    pub fn tiles_per_update(&self) -> Option<usize> {
        let side = usize::try_from(self.range?)
            .ok()?
            .checked_mul(2)?
            .checked_add(1)?;
        side.checked_mul(side)
    }
}

impl Default for TileLoadingConfig {
    fn default() -> Self {
        Self {
            zoom: DEFAULT_ZOOM,
            range: Some(DEFAULT_RANGE),
            request_timeout_ms: 10_000,
            max_concurrent_requests: 6,
        }
    }
}
