//! Spherical Web-Mercator projection (EPSG:3857) and XYZ tile addressing.
//!
//! Three coordinate spaces are involved:
//!
//! * [`LatLng`]: geographic degrees.
//! * [`MercatorPoint`]: projected meters, origin at (0°, 0°), y growing north.
//! * [`PixelPoint`]: world pixels at a zoom level, origin at the north-west
//!   corner of the world, y growing south (the XYZ convention used by tile
//!   servers).
//!
//! Every conversion is pure. Out-of-range latitudes are clamped to the
//! Mercator square instead of being reported as errors.

use crate::core::constants::{
    INITIAL_RESOLUTION, MAX_LATITUDE, MAX_ZOOM, ORIGIN_SHIFT, TILE_SIZE,
};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Represents a geographical coordinate with latitude and longitude
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    /// Creates a new LatLng coordinate
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Validates that the coordinates are within valid ranges
    pub fn is_valid(&self) -> bool {
        self.lat >= -90.0 && self.lat <= 90.0 && self.lng >= -180.0 && self.lng <= 180.0
    }

    /// Clamps latitude to the range the Mercator projection can represent
    pub fn clamp_lat(lat: f64) -> f64 {
        lat.clamp(-MAX_LATITUDE, MAX_LATITUDE)
    }

    /// Converts to Web Mercator meters
    pub fn to_meters(&self) -> MercatorPoint {
        lat_lon_to_meters(self.lat, self.lng)
    }

    /// Converts directly to the tile containing this coordinate
    pub fn to_tile(&self, zoom: u8) -> TileCoord {
        meters_to_tile(self.to_meters(), zoom)
    }
}

impl Default for LatLng {
    fn default() -> Self {
        Self::new(0.0, 0.0)
    }
}

/// A point in projected Web-Mercator meters
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct MercatorPoint {
    pub x: f64,
    pub y: f64,
}

impl MercatorPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn to_lat_lng(&self) -> LatLng {
        meters_to_lat_lon(*self)
    }

    pub fn to_pixels(&self, zoom: u8) -> PixelPoint {
        meters_to_pixels(*self, zoom)
    }

    pub fn to_tile(&self, zoom: u8) -> TileCoord {
        meters_to_tile(*self, zoom)
    }

    pub fn subtract(&self, other: &MercatorPoint) -> MercatorPoint {
        MercatorPoint::new(self.x - other.x, self.y - other.y)
    }

    pub fn distance_to(&self, other: &MercatorPoint) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// A point in world pixel space at some zoom level
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PixelPoint {
    pub x: f64,
    pub y: f64,
}

impl PixelPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn to_meters(&self, zoom: u8) -> MercatorPoint {
        pixels_to_meters(*self, zoom)
    }

    pub fn to_tile(&self, zoom: u8) -> TileCoord {
        pixels_to_tile(*self, zoom)
    }

    pub fn offset(&self, dx: f64, dy: f64) -> PixelPoint {
        PixelPoint::new(self.x + dx, self.y + dy)
    }
}

/// Represents a tile coordinate in the slippy map tile system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TileCoord {
    pub x: u32,
    pub y: u32,
    pub z: u8,
}

impl TileCoord {
    pub fn new(x: u32, y: u32, z: u8) -> Self {
        Self { x, y, z }
    }

    /// Builds a coordinate from signed indices, rejecting anything outside
    /// the `2^z x 2^z` grid of the zoom level.
    pub fn checked(x: i64, y: i64, z: u8) -> Option<Self> {
        let max = tiles_per_side(z) as i64;
        if x < 0 || y < 0 || x >= max || y >= max || z > MAX_ZOOM {
            return None;
        }
        Some(Self::new(x as u32, y as u32, z))
    }

    /// Checks if the tile is valid for its zoom level
    pub fn is_valid(&self) -> bool {
        let max = tiles_per_side(self.z);
        self.z <= MAX_ZOOM && self.x < max && self.y < max
    }

    /// Mercator position of the tile's north-west corner
    pub fn to_meters(&self) -> MercatorPoint {
        tile_to_meters(*self)
    }

    /// Mercator rectangle covered by the tile
    pub fn bounds(&self) -> TileBounds {
        tile_bounds(*self)
    }
}

impl std::fmt::Display for TileCoord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}/{}", self.z, self.x, self.y)
    }
}

/// Mercator rectangle covered by a tile: south-west corner plus size.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TileBounds {
    pub min: MercatorPoint,
    pub width: f64,
    pub height: f64,
}

impl TileBounds {
    /// North-east corner
    pub fn max(&self) -> MercatorPoint {
        MercatorPoint::new(self.min.x + self.width, self.min.y + self.height)
    }

    pub fn center(&self) -> MercatorPoint {
        MercatorPoint::new(
            self.min.x + self.width / 2.0,
            self.min.y + self.height / 2.0,
        )
    }

    pub fn contains(&self, point: &MercatorPoint) -> bool {
        let max = self.max();
        point.x >= self.min.x && point.x < max.x && point.y >= self.min.y && point.y < max.y
    }
}

/// Number of tiles along one side of the world at `zoom`.
pub fn tiles_per_side(zoom: u8) -> u32 {
    1_u32 << zoom.min(MAX_ZOOM)
}

/// Meters per pixel at `zoom`; halves with every zoom level.
pub fn resolution(zoom: u8) -> f64 {
    INITIAL_RESOLUTION / 2_f64.powi(zoom.min(MAX_ZOOM) as i32)
}

/// Spherical Web-Mercator forward projection.
pub fn lat_lon_to_meters(lat: f64, lon: f64) -> MercatorPoint {
    let lat = LatLng::clamp_lat(lat);
    let x = lon * ORIGIN_SHIFT / 180.0;
    let y = (PI / 4.0 + lat.to_radians() / 2.0).tan().ln() / PI * ORIGIN_SHIFT;
    MercatorPoint::new(x, y)
}

/// Inverse of [`lat_lon_to_meters`].
pub fn meters_to_lat_lon(point: MercatorPoint) -> LatLng {
    let lng = point.x / ORIGIN_SHIFT * 180.0;
    let lat = (2.0 * (point.y / ORIGIN_SHIFT * PI).exp().atan() - PI / 2.0).to_degrees();
    LatLng::new(lat, lng)
}

pub fn meters_to_pixels(point: MercatorPoint, zoom: u8) -> PixelPoint {
    let res = resolution(zoom);
    PixelPoint::new(
        (point.x + ORIGIN_SHIFT) / res,
        (ORIGIN_SHIFT - point.y) / res,
    )
}

pub fn pixels_to_meters(point: PixelPoint, zoom: u8) -> MercatorPoint {
    let res = resolution(zoom);
    MercatorPoint::new(point.x * res - ORIGIN_SHIFT, ORIGIN_SHIFT - point.y * res)
}

/// Tile containing the pixel. Pixels outside the world snap to the edge tile.
pub fn pixels_to_tile(point: PixelPoint, zoom: u8) -> TileCoord {
    let zoom = zoom.min(MAX_ZOOM);
    let max = tiles_per_side(zoom) as f64 - 1.0;
    let tile = TILE_SIZE as f64;
    let x = (point.x / tile).floor().clamp(0.0, max);
    let y = (point.y / tile).floor().clamp(0.0, max);
    TileCoord::new(x as u32, y as u32, zoom)
}

pub fn meters_to_tile(point: MercatorPoint, zoom: u8) -> TileCoord {
    pixels_to_tile(meters_to_pixels(point, zoom), zoom)
}

/// Mercator position of the tile's north-west corner.
pub fn tile_to_meters(coord: TileCoord) -> MercatorPoint {
    let tile = TILE_SIZE as f64;
    pixels_to_meters(
        PixelPoint::new(coord.x as f64 * tile, coord.y as f64 * tile),
        coord.z,
    )
}

pub fn tile_bounds(coord: TileCoord) -> TileBounds {
    let tile = TILE_SIZE as f64;
    let north_west = tile_to_meters(coord);
    let south_east = pixels_to_meters(
        PixelPoint::new((coord.x as f64 + 1.0) * tile, (coord.y as f64 + 1.0) * tile),
        coord.z,
    );

    TileBounds {
        min: MercatorPoint::new(north_west.x, south_east.y),
        width: south_east.x - north_west.x,
        height: north_west.y - south_east.y,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-7;

    #[test]
    fn test_lat_lng_meters_round_trip() {
        for &(lat, lng) in &[
            (0.0, 0.0),
            (39.921864, 32.818442),
            (-33.8688, 151.2093),
            (85.0, -179.9),
            (-85.0, 179.9),
        ] {
            let back = LatLng::new(lat, lng).to_meters().to_lat_lng();
            assert!((back.lat - lat).abs() < EPSILON, "lat {} -> {}", lat, back.lat);
            assert!((back.lng - lng).abs() < EPSILON, "lng {} -> {}", lng, back.lng);
        }
    }

    #[test]
    fn test_pixels_meters_round_trip() {
        let meters = lat_lon_to_meters(39.921864, 32.818442);
        for zoom in [0, 5, 16, 19] {
            let back = meters.to_pixels(zoom).to_meters(zoom);
            assert!((back.x - meters.x).abs() < 1e-6);
            assert!((back.y - meters.y).abs() < 1e-6);
        }
    }

    #[test]
    fn test_latitude_is_clamped() {
        let pole = lat_lon_to_meters(90.0, 0.0);
        let edge = lat_lon_to_meters(MAX_LATITUDE, 0.0);
        assert!(pole.y.is_finite());
        assert!((pole.y - edge.y).abs() < 1e-6);
        assert!((edge.y - ORIGIN_SHIFT).abs() < 1e-3);
    }

    #[test]
    fn test_known_tile_for_ankara() {
        let tile = LatLng::new(39.921864, 32.818442).to_tile(16);
        assert_eq!(tile, TileCoord::new(38742, 24829, 16));
    }

    #[test]
    fn test_resolution_halves_per_zoom() {
        for zoom in 0..MAX_ZOOM {
            let ratio = resolution(zoom) / resolution(zoom + 1);
            assert!((ratio - 2.0).abs() < 1e-12);
        }
    }

    #[test]
    fn test_tile_index_doubles_with_zoom() {
        let meters = lat_lon_to_meters(48.8566, 2.3522);
        for zoom in 1..MAX_ZOOM {
            let low = meters.to_tile(zoom);
            let high = meters.to_tile(zoom + 1);
            assert!(high.x == low.x * 2 || high.x == low.x * 2 + 1);
            assert!(high.y == low.y * 2 || high.y == low.y * 2 + 1);
        }
    }

    #[test]
    fn test_tile_bounds_contain_their_points() {
        let meters = lat_lon_to_meters(39.921864, 32.818442);
        let tile = meters.to_tile(16);
        let bounds = tile.bounds();

        assert!(bounds.contains(&meters));
        assert!(bounds.width > 0.0 && bounds.height > 0.0);
        assert!((bounds.width - resolution(16) * TILE_SIZE as f64).abs() < 1e-6);
        assert_eq!(bounds.center().to_tile(16), tile);
    }

    #[test]
    fn test_world_tile_at_zoom_zero() {
        let bounds = TileCoord::new(0, 0, 0).bounds();
        assert!((bounds.min.x + ORIGIN_SHIFT).abs() < 1e-6);
        assert!((bounds.min.y + ORIGIN_SHIFT).abs() < 1e-6);
        assert!((bounds.width - 2.0 * ORIGIN_SHIFT).abs() < 1e-6);
    }

    #[test]
    fn test_out_of_world_pixels_snap_to_edge() {
        let tile = pixels_to_tile(PixelPoint::new(-10.0, 1e12), 3);
        assert_eq!(tile, TileCoord::new(0, 7, 3));
    }

    #[test]
    fn test_checked_rejects_outside_grid() {
        assert!(TileCoord::checked(-1, 0, 2).is_none());
        assert!(TileCoord::checked(4, 0, 2).is_none());
        assert_eq!(TileCoord::checked(3, 3, 2), Some(TileCoord::new(3, 3, 2)));
    }
}
