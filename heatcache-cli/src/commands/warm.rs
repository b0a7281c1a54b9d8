//! Warm command - fill the cache for an area.

use std::time::Duration;

use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{error, info};

use heatcache::config::{ConfigFile, MAX_SUPPORTED_ZOOM};
use heatcache::coord::{enumerate_area, GeoPoint, Tile};
use heatcache::fetch::{BatchFetcher, FetchError, FetchOutcome, FetchSummary, TileFetcher};
use heatcache::provider::AsyncHttpClient;
use heatcache::warmer::{CacheWarmer, WarmupReport};

use crate::error::CliError;
use crate::runner::{CliRunner, GlobalOptions};

const PROGRESS_TEMPLATE: &str =
    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} tiles ({eta})";

/// Arguments for `heatcache warm`. Unset values come from `[area]` and
/// `[download]`.
#[derive(Debug, Clone, Default, Args)]
pub struct WarmArgs {
    /// First corner as "lat, lon"
    #[arg(long, allow_hyphen_values = true)]
    pub apex: Option<GeoPoint>,

    /// Opposite corner as "lat, lon"
    #[arg(long, allow_hyphen_values = true)]
    pub vertex: Option<GeoPoint>,

    /// Lowest zoom level to cache
    #[arg(long)]
    pub min_zoom: Option<u8>,

    /// Highest zoom level to cache
    #[arg(long)]
    pub max_zoom: Option<u8>,

    /// Most tiles to fetch in this run (0 for no limit)
    #[arg(long)]
    pub max_tiles: Option<usize>,

    /// Maximum parallel requests
    #[arg(long)]
    pub concurrency: Option<usize>,
}

impl WarmArgs {
    /// Applies the flags given on the command line to `config`.
    pub fn apply_to(&self, config: &mut ConfigFile) -> Result<(), CliError> {
        let area = &mut config.area;
        if let Some(apex) = self.apex {
            area.apex = apex;
        }
        if let Some(vertex) = self.vertex {
            area.vertex = vertex;
        }
        if let Some(min_zoom) = self.min_zoom {
            area.min_zoom = min_zoom;
        }
        if let Some(max_zoom) = self.max_zoom {
            area.max_zoom = max_zoom;
        }
        if let Some(max_tiles) = self.max_tiles {
            area.max_tiles = (max_tiles > 0).then_some(max_tiles);
        }
        if let Some(concurrency) = self.concurrency {
            if concurrency == 0 {
                return Err(CliError::InvalidArgument(
                    "--concurrency must be at least 1".to_string(),
                ));
            }
            config.download.concurrency = concurrency;
        }

        let area = &config.area;
        if area.max_zoom > MAX_SUPPORTED_ZOOM {
            return Err(CliError::InvalidArgument(format!(
                "--max-zoom must be at most {}",
                MAX_SUPPORTED_ZOOM
            )));
        }
        if area.min_zoom > area.max_zoom {
            return Err(CliError::InvalidArgument(format!(
                "min zoom {} is above max zoom {}",
                area.min_zoom, area.max_zoom
            )));
        }
        Ok(())
    }
}

/// Forwards batches to a [`TileFetcher`] while driving a progress bar.
struct ProgressFetcher<C: AsyncHttpClient> {
    inner: TileFetcher<C>,
    bar: ProgressBar,
}

impl<C: AsyncHttpClient> ProgressFetcher<C> {
    fn new(fetcher: TileFetcher<C>) -> Self {
        let style = ProgressStyle::with_template(PROGRESS_TEMPLATE)
            .map(|style| style.progress_chars("=> "))
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        let bar = ProgressBar::new(0).with_style(style);

        let tick = bar.clone();
        let inner = fetcher.with_progress(std::sync::Arc::new(
            move |_tile: &Tile, _outcome: FetchOutcome| tick.inc(1),
        ));

        Self { inner, bar }
    }
}

impl<C: AsyncHttpClient> BatchFetcher for ProgressFetcher<C> {
    async fn fetch_all(&self, tiles: Vec<Tile>) -> Result<FetchSummary, FetchError> {
        self.bar.set_length(tiles.len() as u64);
        self.bar.enable_steady_tick(Duration::from_millis(200));

        let result = self.inner.fetch_all(tiles).await;

        self.bar.finish_and_clear();
        result
    }
}

/// Run the warm command.
pub fn run(options: &GlobalOptions, args: WarmArgs) -> Result<(), CliError> {
    let mut runner = CliRunner::new(options)?;
    args.apply_to(runner.config_mut())?;
    runner.log_startup("warm");

    let area = runner.config().area.clone();
    let zooms = area.min_zoom..=area.max_zoom;
    let region = enumerate_area(area.apex, area.vertex, zooms.clone());

    println!("Area: {} to {}", area.apex, area.vertex);
    for bounds in region.bounds() {
        println!(
            "  Zoom {:>2}: x {}..={}, y {}..={} ({} tiles)",
            bounds.zoom,
            bounds.x_min,
            bounds.x_max,
            bounds.y_min,
            bounds.y_max,
            bounds.tile_count()
        );
    }
    println!("Region size: {} tiles", region.total_tiles());
    match area.max_tiles {
        Some(max) => println!("Fetching at most {} tiles this run", max),
        None => println!("No limit on tiles fetched"),
    }
    println!("Cache: {}", runner.config().cache.directory.display());
    println!();

    let cache = runner.cache();
    let fetcher = ProgressFetcher::new(runner.create_fetcher(cache.clone())?);
    let warmer = CacheWarmer::new(cache, fetcher);

    let report = runner.runtime()?.block_on(warmer.warm_up(
        area.apex,
        area.vertex,
        zooms,
        area.max_tiles,
    ));
    let report = report.inspect_err(|e| {
        error!(error = %e, auth_failure = e.is_auth_failure(), "Warm-up failed");
    })?;

    print_report(&report);
    Ok(())
}

fn print_report(report: &WarmupReport) {
    info!(
        considered = report.considered,
        already_cached = report.already_cached,
        scheduled = report.scheduled,
        "Warm-up complete"
    );

    println!("Checked:  {} tiles", report.considered);
    println!("Cached:   {} already present", report.already_cached);
    match &report.fetched {
        Some(summary) => {
            println!("Fetched:  {}", summary);
            if summary.unresolved > 0 {
                println!();
                println!(
                    "{} tiles could not be fetched; run again to retry them.",
                    summary.unresolved
                );
            }
        }
        None => println!("Fetched:  nothing to load"),
    }
    println!("Spent {:.2} seconds", report.elapsed.as_secs_f64());
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        warm: WarmArgs,
    }

    fn parse(args: &[&str]) -> WarmArgs {
        let argv = std::iter::once("heatcache").chain(args.iter().copied());
        TestCli::parse_from(argv).warm
    }

    #[test]
    fn test_defaults_leave_config_alone() {
        let mut config = ConfigFile::default();
        parse(&[]).apply_to(&mut config).unwrap();
        assert_eq!(config, ConfigFile::default());
    }

    #[test]
    fn test_flags_override_config() {
        let mut config = ConfigFile::default();
        let args = parse(&[
            "--apex",
            "-33.5, 151.0",
            "--vertex",
            "-34.0, 151.5",
            "--min-zoom",
            "9",
            "--max-zoom",
            "12",
            "--max-tiles",
            "50",
            "--concurrency",
            "4",
        ]);
        args.apply_to(&mut config).unwrap();

        assert_eq!(config.area.apex, GeoPoint::new(-33.5, 151.0));
        assert_eq!(config.area.vertex, GeoPoint::new(-34.0, 151.5));
        assert_eq!((config.area.min_zoom, config.area.max_zoom), (9, 12));
        assert_eq!(config.area.max_tiles, Some(50));
        assert_eq!(config.download.concurrency, 4);
    }

    #[test]
    fn test_zero_max_tiles_removes_limit() {
        let mut config = ConfigFile::default();
        parse(&["--max-tiles", "0"]).apply_to(&mut config).unwrap();
        assert_eq!(config.area.max_tiles, None);
    }

    #[test]
    fn test_invalid_zoom_range() {
        let mut config = ConfigFile::default();
        let err = parse(&["--min-zoom", "12", "--max-zoom", "10"])
            .apply_to(&mut config)
            .unwrap_err();
        assert!(matches!(err, CliError::InvalidArgument(_)));

        let mut config = ConfigFile::default();
        let err = parse(&["--max-zoom", "30"]).apply_to(&mut config).unwrap_err();
        assert!(matches!(err, CliError::InvalidArgument(_)));
    }

    #[test]
    fn test_zero_concurrency_rejected() {
        let mut config = ConfigFile::default();
        let err = parse(&["--concurrency", "0"]).apply_to(&mut config).unwrap_err();
        assert!(matches!(err, CliError::InvalidArgument(_)));
    }

    #[test]
    fn test_bad_point_rejected_by_parser() {
        let result = TestCli::try_parse_from(["heatcache", "--apex", "46.9"]);
        assert!(result.is_err());
    }
}
