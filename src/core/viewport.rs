use crate::core::constants::{MAX_ZOOM, MIN_ZOOM};
use crate::core::geo::{LatLng, MercatorPoint, PixelPoint, TileCoord};
use serde::{Deserialize, Serialize};

/// The current view of the map: center, integer zoom, and screen dimensions.
///
/// Pushed into the pipeline whenever the user pans or zooms.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    /// The center of the map view in geographical coordinates
    pub center: LatLng,
    /// The current zoom level
    pub zoom: u8,
    /// The size of the viewport in pixels
    pub size: PixelPoint,
}

impl Viewport {
    /// Creates a new viewport, clamping zoom to the supported range
    pub fn new(center: LatLng, zoom: u8, size: PixelPoint) -> Self {
        Self {
            center,
            zoom: zoom.clamp(MIN_ZOOM, MAX_ZOOM),
            size,
        }
    }

    pub fn set_center(&mut self, center: LatLng) {
        self.center = center;
    }

    pub fn set_zoom(&mut self, zoom: u8) {
        self.zoom = zoom.clamp(MIN_ZOOM, MAX_ZOOM);
    }

    pub fn set_size(&mut self, size: PixelPoint) {
        self.size = size;
    }

    /// Moves the center by a screen-space delta (positive `dy` moves south).
    pub fn pan_by(&mut self, dx: f64, dy: f64) {
        let moved = self.center_pixels().offset(dx, dy);
        self.center = moved.to_meters(self.zoom).to_lat_lng();
    }

    pub fn center_meters(&self) -> MercatorPoint {
        self.center.to_meters()
    }

    pub fn center_pixels(&self) -> PixelPoint {
        self.center_meters().to_pixels(self.zoom)
    }

    pub fn center_tile(&self) -> TileCoord {
        self.center_meters().to_tile(self.zoom)
    }

    /// World-pixel corners of the visible rectangle: (top-left, bottom-right).
    pub fn pixel_bounds(&self) -> (PixelPoint, PixelPoint) {
        let center = self.center_pixels();
        let half_w = self.size.x / 2.0;
        let half_h = self.size.y / 2.0;
        (
            center.offset(-half_w, -half_h),
            center.offset(half_w, half_h),
        )
    }

    /// Converts a container (screen) point to geographic coordinates.
    pub fn container_point_to_lat_lng(&self, point: PixelPoint) -> LatLng {
        let (top_left, _) = self.pixel_bounds();
        top_left
            .offset(point.x, point.y)
            .to_meters(self.zoom)
            .to_lat_lng()
    }

    /// Converts geographic coordinates to a container (screen) point.
    pub fn lat_lng_to_container_point(&self, lat_lng: &LatLng) -> PixelPoint {
        let (top_left, _) = self.pixel_bounds();
        let world = lat_lng.to_meters().to_pixels(self.zoom);
        PixelPoint::new(world.x - top_left.x, world.y - top_left.y)
    }
}

impl Default for Viewport {
    fn default() -> Self {
        let (lat, lng) = crate::core::constants::DEFAULT_CENTER;
        Self::new(
            LatLng::new(lat, lng),
            crate::core::constants::DEFAULT_ZOOM,
            PixelPoint::new(800.0, 600.0),
        )
    }
}
