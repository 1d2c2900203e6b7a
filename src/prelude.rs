//! Prelude module for common vectile types and traits
//!
//! This module re-exports the most commonly used types, traits, and functions
//! for easy importing with `use vectile::prelude::*;`

pub use crate::core::{
    config::{CacheConfig, EvictionPolicy, PipelineOptions, PipelineProfile, SourceConfig, TileLoadingConfig},
    geo::{LatLng, MercatorPoint, PixelPoint, TileBounds, TileCoord},
    overlay::{Overlay, OverlayKind},
    viewport::Viewport,
};

pub use crate::data::geojson::{GeoJsonFeature, GeoJsonGeometry, VectorTileDocument};

pub use crate::plugins::{
    BasePlugin, FnPlugin, GeoJsonParsePlugin, LayerPlugin, LayerSet, PluginContext,
    PluginRegistry, PluginRun, PluginScheduler, PluginStatus, PluginTrait, VectorDataPlugin,
};

pub use crate::tiles::{
    DiskCache, EvictionHook, HttpFetcher, MapzenSource, SelectionMode, Tile, TileConsumer,
    TileDataSource, TileEvent, TileFetcher, TileManager, TileSelector, TileSource, TileState,
    TileStore,
};

pub use crate::runtime::{spawn, AsyncHandle};

pub use crate::{Error as MapError, Result};

pub use std::{
    sync::Arc,
    time::{Duration, Instant},
};

pub use fxhash::{FxHashMap as HashMap, FxHashSet as HashSet, FxHasher};

pub use futures::Future;
pub use std::pin::Pin;

pub use tokio_util::sync::CancellationToken;
