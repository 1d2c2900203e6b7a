use crate::core::constants::MAX_RANGE;
use crate::core::geo::{pixels_to_tile, tiles_per_side, TileCoord};
use crate::core::viewport::Viewport;
use crate::tiles::cache::TileStore;
use serde::{Deserialize, Serialize};

/// How the set of required tiles is derived from a viewport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SelectionMode {
    /// Square block of `2r + 1` tiles per side around the center tile.
    Range(u32),
    /// Every tile touched by the viewport's pixel rectangle.
    Viewport,
}

/// Computes which tiles cover a viewport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileSelector {
    mode: SelectionMode,
}

impl TileSelector {
    pub fn new(mode: SelectionMode) -> Self {
        Self { mode }
    }

    pub fn range(range: u32) -> Self {
        Self::new(SelectionMode::Range(range))
    }

    pub fn viewport() -> Self {
        Self::new(SelectionMode::Viewport)
    }

    pub fn mode(&self) -> SelectionMode {
        self.mode
    }

    /// Tiles required for `viewport`, row by row from the north-west.
    ///
    /// Coordinates that would fall outside the world grid are skipped.
    pub fn select(&self, viewport: &Viewport) -> Vec<TileCoord> {
        match self.mode {
            SelectionMode::Range(range) => Self::select_range(viewport.center_tile(), range),
            SelectionMode::Viewport => {
                let (top_left, bottom_right) = viewport.pixel_bounds();
                let min = pixels_to_tile(top_left, viewport.zoom);
                let max = pixels_to_tile(bottom_right, viewport.zoom);
                let mut coords = Vec::with_capacity(
                    ((max.x - min.x + 1) * (max.y - min.y + 1)) as usize,
                );
                for y in min.y..=max.y {
                    for x in min.x..=max.x {
                        coords.push(TileCoord::new(x, y, min.z));
                    }
                }
                coords
            }
        }
    }

    /// Block around `center`, clipped to the world grid. Ranges above
    /// [`MAX_RANGE`] are treated as `MAX_RANGE`.
    fn select_range(center: TileCoord, range: u32) -> Vec<TileCoord> {
        let r = range.min(MAX_RANGE) as i64;
        let last = tiles_per_side(center.z) as i64 - 1;
        let (x0, x1) = ((center.x as i64 - r).max(0), (center.x as i64 + r).min(last));
        let (y0, y1) = ((center.y as i64 - r).max(0), (center.y as i64 + r).min(last));
        if !center.is_valid() || x0 > x1 || y0 > y1 {
            return Vec::new();
        }

        let mut coords = Vec::with_capacity(((x1 - x0 + 1) * (y1 - y0 + 1)) as usize);
        for y in y0..=y1 {
            for x in x0..=x1 {
                coords.push(TileCoord::new(x as u32, y as u32, center.z));
            }
        }
        coords
    }

    /// Required tiles the store does not own yet.
    pub fn missing(&self, viewport: &Viewport, store: &TileStore) -> Vec<TileCoord> {
        store.missing(&self.select(viewport))
    }
}

impl Default for TileSelector {
    fn default() -> Self {
        Self::range(crate::core::constants::DEFAULT_RANGE)
    }
}
