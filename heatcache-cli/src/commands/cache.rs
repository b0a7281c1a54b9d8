//! Cache management CLI commands.

use clap::Subcommand;

use heatcache::cache::TileCache;

use crate::error::CliError;
use crate::runner::GlobalOptions;

/// Cache action subcommands.
#[derive(Debug, Subcommand)]
pub enum CacheAction {
    /// Show tile count and total size of the cache
    Stats,
}

/// Run a cache subcommand.
pub fn run(options: &GlobalOptions, action: CacheAction) -> Result<(), CliError> {
    let config = options.load_config()?;
    let cache = TileCache::new(&config.cache.directory);

    match action {
        CacheAction::Stats => {
            println!("Tile cache: {}", cache.root().display());

            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .map_err(CliError::Runtime)?;
            let stats = runtime.block_on(cache.stats())?;

            println!("  {}", stats);
            Ok(())
        }
    }
}
