//! Coordinate conversion module
//!
//! Converts geographic coordinates (latitude/longitude) to Web Mercator
//! slippy map tiles and enumerates every tile covering a bounding box.

mod types;

pub use types::{CoordError, GeoPoint, Tile, TileBounds, MAX_LAT, MAX_LON, MIN_LAT, MIN_LON};

use std::f64::consts::PI;
use std::ops::RangeInclusive;

/// Converts a geographic point to the tile index containing it.
///
/// The latitude must lie within the Web Mercator range
/// ([`MIN_LAT`]..=[`MAX_LAT`]); outside it the projection is undefined and
/// the result is meaningless. Callers parsing user input get that check
/// from [`GeoPoint`]'s `FromStr`.
///
/// # Returns
///
/// `(x, y)` at `zoom`, both in `[0, 2^zoom)`. Points on the east edge
/// (longitude 180) or the south edge ([`MIN_LAT`]) belong to the last
/// column or row.
#[inline]
pub fn geo_to_tile(point: GeoPoint, zoom: u8) -> (u32, u32) {
    let n = 2.0_f64.powi(zoom as i32);
    let last = (n as u64 - 1) as u32;

    let x = ((point.longitude + 180.0) / 360.0 * n) as u32;

    let lat_rad = point.latitude.to_radians();
    let y = ((1.0 - lat_rad.tan().asinh() / PI) / 2.0 * n) as u32;

    (x.min(last), y.min(last))
}

/// Converts a tile back to the geographic position of its north-west corner.
#[inline]
pub fn tile_to_geo(tile: &Tile) -> GeoPoint {
    let n = 2.0_f64.powi(tile.z as i32);

    let lon = tile.x as f64 / n * 360.0 - 180.0;

    let y = tile.y as f64 / n;
    let lat = (PI * (1.0 - 2.0 * y)).sinh().atan().to_degrees();

    GeoPoint::new(lat, lon)
}

/// Enumerates every tile covering the box spanned by two corners.
///
/// The corners may be given in any order. For each zoom in `zooms` the tiles
/// are yielded row by row (y ascending), west to east within a row.
pub fn enumerate_area(corner_a: GeoPoint, corner_b: GeoPoint, zooms: RangeInclusive<u8>) -> TileArea {
    let (apex, vertex) = types::normalize_corners(corner_a, corner_b);
    TileArea::new(apex, vertex, zooms)
}

/// Lazy iterator over the tiles of an area across a zoom range.
///
/// Holds only the current zoom's bounds and a cursor, so arbitrarily large
/// areas can be walked. Cloning yields an independent iterator from the
/// same position.
#[derive(Debug, Clone)]
pub struct TileArea {
    apex: GeoPoint,
    vertex: GeoPoint,
    zooms: RangeInclusive<u8>,
    next_zoom: u8,
    zooms_exhausted: bool,
    cursor: Option<Cursor>,
}

#[derive(Debug, Clone, Copy)]
struct Cursor {
    bounds: TileBounds,
    x: u32,
    y: u32,
}

impl TileArea {
    fn new(apex: GeoPoint, vertex: GeoPoint, zooms: RangeInclusive<u8>) -> Self {
        Self {
            apex,
            vertex,
            next_zoom: *zooms.start(),
            zooms_exhausted: zooms.is_empty(),
            zooms,
            cursor: None,
        }
    }

    /// Total number of tiles in the area across the whole zoom range.
    ///
    /// Computed from the bounds, without walking the tiles.
    pub fn total_tiles(&self) -> u64 {
        self.bounds().map(|bounds| bounds.tile_count()).sum()
    }

    /// Bounds of the area at each zoom level.
    pub fn bounds(&self) -> impl Iterator<Item = TileBounds> + '_ {
        self.zooms
            .clone()
            .map(|z| TileBounds::from_normalized(self.apex, self.vertex, z))
    }

    fn advance_zoom(&mut self) -> bool {
        if self.zooms_exhausted {
            return false;
        }

        let zoom = self.next_zoom;
        if zoom == *self.zooms.end() {
            self.zooms_exhausted = true;
        } else {
            self.next_zoom += 1;
        }

        let bounds = TileBounds::from_normalized(self.apex, self.vertex, zoom);
        self.cursor = Some(Cursor {
            bounds,
            x: bounds.x_min,
            y: bounds.y_min,
        });
        true
    }
}

impl Iterator for TileArea {
    type Item = Tile;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(cursor) = self.cursor.as_mut() {
                if cursor.y <= cursor.bounds.y_max {
                    let tile = Tile::new(cursor.x, cursor.y, cursor.bounds.zoom);
                    if cursor.x >= cursor.bounds.x_max {
                        cursor.x = cursor.bounds.x_min;
                        cursor.y += 1;
                    } else {
                        cursor.x += 1;
                    }
                    return Some(tile);
                }
                self.cursor = None;
            }

            if !self.advance_zoom() {
                return None;
            }
        }
    }
}
