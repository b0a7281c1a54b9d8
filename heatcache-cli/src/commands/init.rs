//! Init command - write a default configuration file.

use clap::Args;

use heatcache::config::ConfigFile;

use crate::error::CliError;
use crate::runner::{resolve_config_path, GlobalOptions};

/// Arguments for `heatcache init`.
#[derive(Debug, Clone, Default, Args)]
pub struct InitArgs {
    /// Replace an existing config file
    #[arg(long)]
    pub force: bool,
}

/// Run the init command.
pub fn run(options: &GlobalOptions, args: InitArgs) -> Result<(), CliError> {
    let path = resolve_config_path(options.config.as_deref());
    if path.exists() && !args.force {
        return Err(CliError::ConfigExists(path));
    }

    ConfigFile::default().save_to(&path)?;

    println!("Configuration file: {}", path.display());
    println!();
    println!("Edit this file to set the area and the CloudFront credentials.");
    println!("CLI arguments override config file values when specified.");
    Ok(())
}
