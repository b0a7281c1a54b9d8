//! User configuration
//!
//! Settings live in `~/.heatcache/config.ini`, one `[section]` per concern.
//! Credentials, the area and the cache directory can also come from the
//! environment (or a `.env` file), which takes precedence over the file.
//!
//! # Example
//!
//! ```ignore
//! use heatcache::config::ConfigFile;
//!
//! let config = ConfigFile::load_resolved(None)?;
//! let fetch_config = config.fetch_config();
//! ```

mod defaults;
mod env;
mod file;
mod parser;
mod settings;
mod writer;

pub use defaults::*;
pub use env::{
    apply_env_overrides, ENV_AREA_APEX, ENV_AREA_VERTEX, ENV_CACHE_DIR, ENV_KEY_PAIR_ID,
    ENV_POLICY, ENV_SIGNATURE,
};
pub use file::{config_directory, config_file_path, ConfigFileError};
pub use settings::*;
