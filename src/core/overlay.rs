//! Point / line / polygon overlays drawn on top of the map.
//!
//! The editing surface owns these; the pipeline only needs to move their
//! vertices between geographic, mercator and pixel space so that hit-testing
//! and dragging work against the same projection the tiles use.

use crate::core::geo::{LatLng, MercatorPoint, PixelPoint};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OverlayKind {
    Point,
    LineString,
    Polygon,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Overlay {
    pub kind: OverlayKind,
    pub points: Vec<LatLng>,
}

impl Overlay {
    pub fn new(kind: OverlayKind, points: Vec<LatLng>) -> Self {
        Self { kind, points }
    }

    /// Whether the overlay has enough vertices for its kind.
    pub fn is_complete(&self) -> bool {
        match self.kind {
            OverlayKind::Point => self.points.len() == 1,
            OverlayKind::LineString => self.points.len() >= 2,
            OverlayKind::Polygon => self.points.len() >= 3,
        }
    }

    pub fn to_meters(&self) -> Vec<MercatorPoint> {
        self.points.iter().map(LatLng::to_meters).collect()
    }

    pub fn to_pixels(&self, zoom: u8) -> Vec<PixelPoint> {
        self.points
            .iter()
            .map(|p| p.to_meters().to_pixels(zoom))
            .collect()
    }

    /// Rebuilds an overlay from pixel vertices, e.g. after the user dragged them.
    pub fn from_pixels(kind: OverlayKind, pixels: &[PixelPoint], zoom: u8) -> Self {
        let points = pixels
            .iter()
            .map(|p| p.to_meters(zoom).to_lat_lng())
            .collect();
        Self::new(kind, points)
    }

    /// Index of the first vertex within `tolerance` pixels of `pixel`.
    pub fn hit_vertex(&self, pixel: PixelPoint, zoom: u8, tolerance: f64) -> Option<usize> {
        self.to_pixels(zoom).iter().position(|p| {
            let dx = p.x - pixel.x;
            let dy = p.y - pixel.y;
            (dx * dx + dy * dy).sqrt() <= tolerance
        })
    }

    /// Moves vertex `index` to the geographic location under `pixel`.
    pub fn move_vertex(&mut self, index: usize, pixel: PixelPoint, zoom: u8) -> bool {
        match self.points.get_mut(index) {
            Some(point) => {
                *point = pixel.to_meters(zoom).to_lat_lng();
                true
            }
            None => false,
        }
    }

    /// Converts to a `geo-types` geometry (x = longitude, y = latitude).
    /// Returns `None` when the overlay is incomplete.
    pub fn to_geometry(&self) -> Option<geo_types::Geometry<f64>> {
        if !self.is_complete() {
            return None;
        }
        let coords: Vec<geo_types::Coord<f64>> = self
            .points
            .iter()
            .map(|p| geo_types::Coord { x: p.lng, y: p.lat })
            .collect();

        let geometry = match self.kind {
            OverlayKind::Point => geo_types::Geometry::Point(geo_types::Point(coords[0])),
            OverlayKind::LineString => {
                geo_types::Geometry::LineString(geo_types::LineString::new(coords))
            }
            // Polygon::new closes the exterior ring itself.
            OverlayKind::Polygon => geo_types::Geometry::Polygon(geo_types::Polygon::new(
                geo_types::LineString::new(coords),
                Vec::new(),
            )),
        };
        Some(geometry)
    }
}
