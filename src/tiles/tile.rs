//! The per-tile record that flows through the pipeline.

use crate::core::geo::{MercatorPoint, TileBounds, TileCoord};
use crate::data::geojson::VectorTileDocument;
use crate::prelude::{Arc, HashMap};
use crate::{MapError, Result};
use serde::{Deserialize, Serialize};
use std::sync::{Mutex, RwLock};

/// Lifecycle of a tile. Only ever moves forward:
/// `Pending -> Loading -> Ready | Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TileState {
    Pending,
    Loading,
    Ready,
    Failed,
}

impl TileState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, TileState::Ready | TileState::Failed)
    }

    pub fn can_advance_to(&self, next: TileState) -> bool {
        matches!(
            (self, next),
            (TileState::Pending, TileState::Loading)
                | (TileState::Loading, TileState::Ready)
                | (TileState::Loading, TileState::Failed)
        )
    }
}

/// One map cell and everything the plugins produced for it.
///
/// Plugins publish their results through the setters while the tile is
/// `Loading`; once the tile is `Ready` or `Failed` it is read-only.
#[derive(Debug)]
pub struct Tile {
    coord: TileCoord,
    bounds: TileBounds,
    state: Mutex<TileState>,
    raw_payload: RwLock<Option<Arc<Vec<u8>>>>,
    parsed_data: RwLock<Option<Arc<VectorTileDocument>>>,
    outputs: RwLock<HashMap<String, Arc<serde_json::Value>>>,
    error: RwLock<Option<Arc<MapError>>>,
}

impl Tile {
    pub fn new(coord: TileCoord) -> Self {
        Self {
            coord,
            bounds: coord.bounds(),
            state: Mutex::new(TileState::Pending),
            raw_payload: RwLock::new(None),
            parsed_data: RwLock::new(None),
            outputs: RwLock::new(HashMap::default()),
            error: RwLock::new(None),
        }
    }

    pub fn coord(&self) -> TileCoord {
        self.coord
    }

    pub fn bounds(&self) -> TileBounds {
        self.bounds
    }

    /// Mercator center of the tile
    pub fn center(&self) -> MercatorPoint {
        self.bounds.center()
    }

    /// Position of the tile center relative to a reference point (usually the
    /// map center), used to lay tiles out around the origin.
    pub fn offset_from(&self, reference: &MercatorPoint) -> MercatorPoint {
        self.center().subtract(reference)
    }

    pub fn state(&self) -> TileState {
        *self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn is_ready(&self) -> bool {
        self.state() == TileState::Ready
    }

    /// Moves the tile forward in its lifecycle, rejecting regressions.
    pub fn advance(&self, next: TileState) -> Result<()> {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        if !state.can_advance_to(next) {
            return Err(MapError::InvalidTransition {
                coord: self.coord,
                from: *state,
                to: next,
            });
        }
        *state = next;
        Ok(())
    }

    /// Marks the tile failed and remembers why.
    ///
    /// The error is stored before the state changes, so a `Failed` tile
    /// always has one.
    pub fn fail(&self, error: Arc<MapError>) -> Result<()> {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        if !state.can_advance_to(TileState::Failed) {
            return Err(MapError::InvalidTransition {
                coord: self.coord,
                from: *state,
                to: TileState::Failed,
            });
        }
        *self.error.write().unwrap_or_else(|e| e.into_inner()) = Some(error);
        *state = TileState::Failed;
        Ok(())
    }

    pub fn error(&self) -> Option<Arc<MapError>> {
        self.error.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn ensure_loading(&self) -> Result<()> {
        match self.state() {
            TileState::Loading => Ok(()),
            other => Err(MapError::Plugin(format!(
                "tile {} is {:?}; content can only be published while loading",
                self.coord, other
            ))),
        }
    }

    pub fn raw_payload(&self) -> Option<Arc<Vec<u8>>> {
        self.raw_payload
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn set_raw_payload(&self, payload: Vec<u8>) -> Result<()> {
        self.ensure_loading()?;
        *self.raw_payload.write().unwrap_or_else(|e| e.into_inner()) = Some(Arc::new(payload));
        Ok(())
    }

    pub fn parsed_data(&self) -> Option<Arc<VectorTileDocument>> {
        self.parsed_data
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn set_parsed_data(&self, document: VectorTileDocument) -> Result<()> {
        self.ensure_loading()?;
        *self.parsed_data.write().unwrap_or_else(|e| e.into_inner()) = Some(Arc::new(document));
        Ok(())
    }

    /// Output published by the plugin called `name`.
    pub fn output(&self, name: &str) -> Option<Arc<serde_json::Value>> {
        self.outputs
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(name)
            .cloned()
    }

    pub fn set_output(&self, name: &str, value: serde_json::Value) -> Result<()> {
        self.ensure_loading()?;
        self.outputs
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(name.to_string(), Arc::new(value));
        Ok(())
    }

    pub fn output_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .outputs
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .keys()
            .cloned()
            .collect();
        names.sort();
        names
    }
}
