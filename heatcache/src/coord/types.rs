//! Coordinate type definitions

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Web Mercator valid latitude range
pub const MIN_LAT: f64 = -85.05112878;
pub const MAX_LAT: f64 = 85.05112878;

/// Valid longitude range
pub const MIN_LON: f64 = -180.0;
pub const MAX_LON: f64 = 180.0;

/// A geographic position in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

impl fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, {}", self.latitude, self.longitude)
    }
}

impl FromStr for GeoPoint {
    type Err = CoordError;

    /// Parses the `"lat, lon"` form used in config files and CLI flags.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || CoordError::InvalidPoint(s.to_string());

        let (lat, lon) = s.split_once(',').ok_or_else(invalid)?;
        let latitude: f64 = lat.trim().parse().map_err(|_| invalid())?;
        let longitude: f64 = lon.trim().parse().map_err(|_| invalid())?;

        if !(MIN_LAT..=MAX_LAT).contains(&latitude) {
            return Err(CoordError::InvalidLatitude(latitude));
        }
        if !(MIN_LON..=MAX_LON).contains(&longitude) {
            return Err(CoordError::InvalidLongitude(longitude));
        }

        Ok(Self::new(latitude, longitude))
    }
}

/// Tile coordinates in the slippy map scheme.
///
/// `x` grows eastwards and `y` southwards; both are in `[0, 2^z)` for a
/// valid tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Tile {
    pub x: u32,
    pub y: u32,
    pub z: u8,
}

impl Tile {
    pub const fn new(x: u32, y: u32, z: u8) -> Self {
        Self { x, y, z }
    }

    /// Returns the tile containing `point` at `zoom`.
    #[inline]
    pub fn from_geo(point: GeoPoint, zoom: u8) -> Self {
        let (x, y) = super::geo_to_tile(point, zoom);
        Self::new(x, y, zoom)
    }

    /// Whether `x` and `y` are inside the grid for this zoom.
    pub fn is_valid(&self) -> bool {
        if self.z >= 32 {
            return false;
        }
        let n = 1u64 << self.z;
        (self.x as u64) < n && (self.y as u64) < n
    }
}

impl fmt::Display for Tile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Tile({}, {}, {})", self.x, self.y, self.z)
    }
}

/// Inclusive rectangle of tile indices at one zoom level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileBounds {
    pub zoom: u8,
    pub x_min: u32,
    pub x_max: u32,
    pub y_min: u32,
    pub y_max: u32,
}

impl TileBounds {
    /// Computes the bounds covering the box spanned by two arbitrary corners.
    pub fn for_area(corner_a: GeoPoint, corner_b: GeoPoint, zoom: u8) -> Self {
        let (apex, vertex) = normalize_corners(corner_a, corner_b);
        Self::from_normalized(apex, vertex, zoom)
    }

    pub(super) fn from_normalized(apex: GeoPoint, vertex: GeoPoint, zoom: u8) -> Self {
        let (x_min, y_min) = super::geo_to_tile(apex, zoom);
        let (x_max, y_max) = super::geo_to_tile(vertex, zoom);
        Self {
            zoom,
            x_min,
            x_max,
            y_min,
            y_max,
        }
    }

    /// Number of tiles inside the rectangle.
    pub fn tile_count(&self) -> u64 {
        let width = (self.x_max - self.x_min) as u64 + 1;
        let height = (self.y_max - self.y_min) as u64 + 1;
        width * height
    }

    pub fn contains(&self, tile: &Tile) -> bool {
        tile.z == self.zoom
            && (self.x_min..=self.x_max).contains(&tile.x)
            && (self.y_min..=self.y_max).contains(&tile.y)
    }
}

/// Orders two corners into (north-west apex, south-east vertex).
pub(super) fn normalize_corners(a: GeoPoint, b: GeoPoint) -> (GeoPoint, GeoPoint) {
    let apex = GeoPoint::new(a.latitude.max(b.latitude), a.longitude.min(b.longitude));
    let vertex = GeoPoint::new(a.latitude.min(b.latitude), a.longitude.max(b.longitude));
    (apex, vertex)
}

/// Errors that can occur when reading coordinates from user input.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoordError {
    /// Latitude is outside the Web Mercator range
    #[error("Invalid latitude: {0} (must be between -85.05112878 and 85.05112878)")]
    InvalidLatitude(f64),

    /// Longitude is outside -180..=180
    #[error("Invalid longitude: {0} (must be between -180 and 180)")]
    InvalidLongitude(f64),

    /// Text is not of the form "lat, lon"
    #[error("Invalid point '{0}': expected \"latitude, longitude\"")]
    InvalidPoint(String),
}
