//! Serve command - answer tile requests from the cache.

use std::net::SocketAddr;
use std::sync::Arc;

use clap::Args;

use heatcache::config::ServerSettings;
use heatcache::provider::ReqwestClient;
use heatcache::server::{serve, ServerConfig, ServerState};

use crate::error::CliError;
use crate::runner::{CliRunner, GlobalOptions};

/// Arguments for `heatcache serve`.
#[derive(Debug, Clone, Default, Args)]
pub struct ServeArgs {
    /// Address to listen on [default: from [server] bind]
    #[arg(long)]
    pub bind: Option<SocketAddr>,

    /// Fetch tiles missing from the cache instead of answering 404
    #[arg(long)]
    pub fetch_on_miss: bool,
}

impl ServeArgs {
    pub fn apply_to(&self, settings: &mut ServerSettings) {
        if let Some(bind) = self.bind {
            settings.bind = bind;
        }
        if self.fetch_on_miss {
            settings.fetch_on_miss = true;
        }
    }
}

/// Run the serve command.
pub fn run(options: &GlobalOptions, args: ServeArgs) -> Result<(), CliError> {
    let mut runner = CliRunner::new(options)?;
    args.apply_to(&mut runner.config_mut().server);
    runner.log_startup("serve");

    let settings = runner.config().server.clone();
    let cache = runner.cache();
    let server_config = ServerConfig {
        min_zoom: settings.min_zoom,
        max_zoom: settings.max_zoom,
    };

    let mut state = ServerState::<ReqwestClient>::new(cache.clone(), server_config);
    if settings.fetch_on_miss {
        state = state.with_fetcher(Arc::new(runner.create_fetcher(cache.clone())?));
    }

    println!("Serving {} on http://{}", cache.root().display(), settings.bind);
    println!(
        "Zoom {} to {}{}",
        settings.min_zoom,
        settings.max_zoom,
        if settings.fetch_on_miss {
            ", fetching missing tiles"
        } else {
            ""
        }
    );
    println!("Press Ctrl+C to stop");

    runner
        .runtime()?
        .block_on(serve(settings.bind, Arc::new(state)))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use heatcache::config::ConfigFile;

    #[test]
    fn test_flags_override_settings() {
        let mut settings = ConfigFile::default().server;
        let args = ServeArgs {
            bind: Some("0.0.0.0:9000".parse::<SocketAddr>().unwrap()),
            fetch_on_miss: true,
        };
        args.apply_to(&mut settings);

        assert_eq!(settings.bind, "0.0.0.0:9000".parse::<SocketAddr>().unwrap());
        assert!(settings.fetch_on_miss);
    }

    #[test]
    fn test_absent_flags_keep_settings() {
        let mut settings = ConfigFile::default().server;
        settings.fetch_on_miss = true;
        let before = settings.clone();

        ServeArgs::default().apply_to(&mut settings);
        assert_eq!(settings, before);
    }
}
