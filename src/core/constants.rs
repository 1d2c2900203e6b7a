//! Core constants of the spherical Web-Mercator tiling scheme.
//! Keeping them in a single place makes it easier to tweak engine-wide magic numbers.

/// Default square tile size in pixels.
pub const TILE_SIZE: u32 = 256;

/// Equatorial radius of the WGS84 ellipsoid, used as the sphere radius (meters).
pub const EARTH_RADIUS: f64 = 6_378_137.0;

/// Half the circumference of the projected world (meters).
/// Mercator x and y both live in `[-ORIGIN_SHIFT, ORIGIN_SHIFT]`.
pub const ORIGIN_SHIFT: f64 = std::f64::consts::PI * EARTH_RADIUS;

/// Meters per pixel at zoom 0.
pub const INITIAL_RESOLUTION: f64 = 2.0 * ORIGIN_SHIFT / TILE_SIZE as f64;

/// Latitude at which the Mercator square ends (degrees).
pub const MAX_LATITUDE: f64 = 85.051_128_779_806_59;

/// Lowest supported zoom level.
pub const MIN_ZOOM: u8 = 0;

/// Highest supported zoom level.
pub const MAX_ZOOM: u8 = 19;

/// Default map center used when nothing else is configured (Ankara).
pub const DEFAULT_CENTER: (f64, f64) = (39.921864, 32.818442);

/// Default zoom level.
pub const DEFAULT_ZOOM: u8 = 16;

/// Default half-width of the tile block loaded around the center tile.
pub const DEFAULT_RANGE: u32 = 3;

/// Largest accepted range; a 65x65 block of tiles.
pub const MAX_RANGE: u32 = 32;
