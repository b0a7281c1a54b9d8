//! Tile command - show which tile covers a position.

use clap::Args;

use heatcache::cache::TileCache;
use heatcache::config::MAX_SUPPORTED_ZOOM;
use heatcache::coord::{tile_to_geo, GeoPoint, Tile, MAX_LAT, MAX_LON, MIN_LAT, MIN_LON};

use crate::error::CliError;
use crate::runner::GlobalOptions;

/// Arguments for `heatcache tile`.
#[derive(Debug, Clone, Args)]
pub struct TileArgs {
    /// Latitude in decimal degrees
    #[arg(long, allow_hyphen_values = true)]
    pub lat: f64,

    /// Longitude in decimal degrees
    #[arg(long, allow_hyphen_values = true)]
    pub lon: f64,

    /// Zoom level
    #[arg(long)]
    pub zoom: u8,
}

impl TileArgs {
    /// Checks the position and zoom and returns the covering tile.
    pub fn tile(&self) -> Result<Tile, CliError> {
        if !(MIN_LAT..=MAX_LAT).contains(&self.lat) {
            return Err(CliError::InvalidArgument(format!(
                "latitude {} is outside {} to {}",
                self.lat, MIN_LAT, MAX_LAT
            )));
        }
        if !(MIN_LON..=MAX_LON).contains(&self.lon) {
            return Err(CliError::InvalidArgument(format!(
                "longitude {} is outside {} to {}",
                self.lon, MIN_LON, MAX_LON
            )));
        }
        if self.zoom > MAX_SUPPORTED_ZOOM {
            return Err(CliError::InvalidArgument(format!(
                "zoom must be at most {}",
                MAX_SUPPORTED_ZOOM
            )));
        }
        Ok(Tile::from_geo(GeoPoint::new(self.lat, self.lon), self.zoom))
    }
}

/// Run the tile command.
pub fn run(options: &GlobalOptions, args: TileArgs) -> Result<(), CliError> {
    let tile = args.tile()?;
    let config = options.load_config()?;
    let cache = TileCache::new(&config.cache.directory);
    let corner = tile_to_geo(&tile);

    println!("Location: {}, {}", args.lat, args.lon);
    println!("Tile:     z={} x={} y={}", tile.z, tile.x, tile.y);
    println!("Corner:   {:.6}, {:.6} (north-west)", corner.latitude, corner.longitude);
    println!("Path:     {}", cache.tile_path(&tile).display());
    println!(
        "Cached:   {}",
        if cache.exists(&tile) { "yes" } else { "no" }
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(lat: f64, lon: f64, zoom: u8) -> TileArgs {
        TileArgs { lat, lon, zoom }
    }

    #[test]
    fn test_tile_for_position() {
        assert_eq!(args(46.90946, 30.19284, 9).tile().unwrap(), Tile::new(298, 180, 9));
        assert_eq!(args(0.0, 0.0, 0).tile().unwrap(), Tile::new(0, 0, 0));
    }

    #[test]
    fn test_grid_edges_map_to_last_tile() {
        assert_eq!(args(10.0, 180.0, 9).tile().unwrap(), Tile::new(511, 241, 9));
        let south = args(MIN_LAT, -180.0, 9).tile().unwrap();
        assert_eq!(south, Tile::new(0, 511, 9));
        assert!(south.is_valid());
    }

    #[test]
    fn test_out_of_range_rejected() {
        assert!(args(89.0, 0.0, 9).tile().is_err());
        assert!(args(0.0, 181.0, 9).tile().is_err());
        assert!(args(0.0, 0.0, 23).tile().is_err());
    }
}
