//! # vectile
//!
//! Loads slippy-map tiles and their per-tile vector content on demand.
//!
//! The crate computes which Web-Mercator tiles a viewport needs, reserves
//! them in a shared tile store, and runs a set of dependency-ordered
//! processing plugins (fetch, parse, per-layer extraction, ...) for each tile
//! on the async runtime. Finished and failed tiles are reported back to the
//! consumer thread through a channel.

pub mod core;
pub mod data;
pub mod plugins;
pub mod prelude;
pub mod runtime;
pub mod tiles;
pub use crate::core::constants;

// Re-export public API
pub use crate::core::{
    config::{PipelineOptions, PipelineProfile},
    geo::{LatLng, MercatorPoint, PixelPoint, TileBounds, TileCoord},
    overlay::{Overlay, OverlayKind},
    viewport::Viewport,
};

pub use tiles::{
    cache::TileStore,
    data_source::TileDataSource,
    manager::{TileConsumer, TileEvent, TileManager},
    selector::TileSelector,
    tile::{Tile, TileState},
};

pub use plugins::{
    base::{PluginContext, PluginTrait},
    registry::PluginRegistry,
    scheduler::{PluginRun, PluginScheduler, PluginStatus},
};

pub use data::geojson::VectorTileDocument;

/// Result type used throughout the library
pub type Result<T> = std::result::Result<T, MapError>;

/// Common error types
#[derive(Debug, thiserror::Error)]
pub enum MapError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("HTTP {status} for {url}")]
    Http { status: u16, url: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Plugin error: {0}")]
    Plugin(String),

    #[error("Tile {0} has no payload")]
    MissingPayload(TileCoord),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Plugin '{0}' registered twice")]
    DuplicatePlugin(String),

    #[error("Plugin '{plugin}' depends on unknown plugin '{dependency}'")]
    MissingDependency { plugin: String, dependency: String },

    #[error("Plugin dependency cycle: {}", .0.join(" -> "))]
    DependencyCycle(Vec<String>),

    #[error("Tile {0} is already reserved")]
    TileReserved(TileCoord),

    #[error("Tile {coord} cannot move from {from:?} to {to:?}")]
    InvalidTransition {
        coord: TileCoord,
        from: TileState,
        to: TileState,
    },

    #[error("Operation cancelled")]
    Cancelled,
}

impl MapError {
    /// Registration-time errors that must stop initialization.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            MapError::Config(_)
                | MapError::DuplicatePlugin(_)
                | MapError::MissingDependency { .. }
                | MapError::DependencyCycle(_)
        )
    }
}

/// Error type alias for convenience
pub type Error = MapError;
