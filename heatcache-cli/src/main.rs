//! heatcache CLI - Command-line interface
//!
//! Warms and serves a local cache of Strava heatmap tiles.

mod commands;
mod error;
mod runner;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use commands::cache::CacheAction;
use commands::init::InitArgs;
use commands::serve::ServeArgs;
use commands::tile::TileArgs;
use commands::warm::WarmArgs;
use error::CliError;
use runner::GlobalOptions;

#[derive(Parser)]
#[command(name = "heatcache")]
#[command(version = heatcache::VERSION)]
#[command(about = "Warm and serve a local cache of Strava heatmap tiles", long_about = None)]
struct Cli {
    /// Config file [default: ~/.heatcache/config.ini]
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Log at debug level, also on the terminal
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch every uncached tile of the configured area
    Warm(WarmArgs),

    /// Serve cached tiles over HTTP
    Serve(ServeArgs),

    /// Show the tile covering a position and its cache path
    Tile(TileArgs),

    /// Inspect the tile cache
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },

    /// Write a default config file
    Init(InitArgs),
}

fn main() {
    let cli = Cli::parse();
    let options = GlobalOptions {
        config: cli.config,
        debug: cli.debug,
    };

    let result: Result<(), CliError> = match cli.command {
        Commands::Warm(args) => commands::warm::run(&options, args),
        Commands::Serve(args) => commands::serve::run(&options, args),
        Commands::Tile(args) => commands::tile::run(&options, args),
        Commands::Cache { action } => commands::cache::run(&options, action),
        Commands::Init(args) => commands::init::run(&options, args),
    };

    if let Err(e) = result {
        e.exit();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::parse_from(["heatcache", "warm", "--config", "/tmp/h.ini", "--debug"]);
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/h.ini")));
        assert!(cli.debug);
        assert!(matches!(cli.command, Commands::Warm(_)));
    }

    #[test]
    fn test_cache_stats() {
        let cli = Cli::parse_from(["heatcache", "cache", "stats"]);
        assert!(matches!(
            cli.command,
            Commands::Cache {
                action: CacheAction::Stats
            }
        ));
    }

    #[test]
    fn test_tile_negative_coordinates() {
        let cli = Cli::parse_from([
            "heatcache", "tile", "--lat", "-33.86", "--lon", "-70.65", "--zoom", "10",
        ]);
        let Commands::Tile(args) = cli.command else {
            panic!("expected tile command");
        };
        assert_eq!(args.lat, -33.86);
        assert_eq!(args.lon, -70.65);
        assert_eq!(args.zoom, 10);
    }
}
