//! INI parsing logic for converting `Ini` → `ConfigFile`.
//!
//! This is the single place where INI key names are mapped to struct fields.

use std::path::PathBuf;
use std::str::FromStr;

use ini::Ini;

use super::defaults::MAX_SUPPORTED_ZOOM;
use super::file::ConfigFileError;
use super::settings::ConfigFile;
use crate::coord::GeoPoint;

/// Parse an `Ini` object into a `ConfigFile`.
///
/// Starts from `ConfigFile::default()` and overlays any values found in the INI.
pub(super) fn parse_ini(ini: &Ini) -> Result<ConfigFile, ConfigFileError> {
    let mut config = ConfigFile::default();

    // [provider] section
    if let Some(section) = ini.section(Some("provider")) {
        if let Some(v) = non_empty(section.get("activity")) {
            config.provider.activity = v.to_lowercase();
        }
        if let Some(v) = non_empty(section.get("color")) {
            config.provider.color = v.to_lowercase();
        }
        if let Some(v) = section.get("free_max_zoom") {
            config.provider.free_max_zoom = parse_zoom("provider", "free_max_zoom", v)?;
        }
        if let Some(v) = section.get("tile_size") {
            config.provider.tile_size = parse_number(
                "provider",
                "tile_size",
                v,
                "must be a positive integer (pixels)",
            )?;
        }
        if let Some(v) = non_empty(section.get("version")) {
            config.provider.version = v.to_string();
        }
    }

    // [auth] section
    if let Some(section) = ini.section(Some("auth")) {
        if let Some(v) = non_empty(section.get("key_pair_id")) {
            config.auth.key_pair_id = Some(v.to_string());
        }
        if let Some(v) = non_empty(section.get("signature")) {
            config.auth.signature = Some(v.to_string());
        }
        if let Some(v) = non_empty(section.get("policy")) {
            config.auth.policy = Some(v.to_string());
        }
    }

    // [area] section
    if let Some(section) = ini.section(Some("area")) {
        if let Some(v) = section.get("apex") {
            config.area.apex = parse_point("area", "apex", v)?;
        }
        if let Some(v) = section.get("vertex") {
            config.area.vertex = parse_point("area", "vertex", v)?;
        }
        if let Some(v) = section.get("min_zoom") {
            config.area.min_zoom = parse_zoom("area", "min_zoom", v)?;
        }
        if let Some(v) = section.get("max_zoom") {
            config.area.max_zoom = parse_zoom("area", "max_zoom", v)?;
        }
        if let Some(v) = section.get("max_tiles") {
            let v = v.trim();
            let max: usize = if v.is_empty() {
                0
            } else {
                parse_number("area", "max_tiles", v, "must be a non-negative integer (0 = no cap)")?
            };
            config.area.max_tiles = (max > 0).then_some(max);
        }
    }

    // [cache] section
    if let Some(section) = ini.section(Some("cache")) {
        if let Some(v) = non_empty(section.get("directory")) {
            config.cache.directory = expand_tilde(v);
        }
    }

    // [download] section
    if let Some(section) = ini.section(Some("download")) {
        if let Some(v) = section.get("concurrency") {
            let concurrency: usize =
                parse_number("download", "concurrency", v, "must be a positive integer")?;
            if concurrency == 0 {
                return Err(invalid("download", "concurrency", v, "must be at least 1"));
            }
            config.download.concurrency = concurrency;
        }
        if let Some(v) = section.get("timeout") {
            config.download.timeout = parse_number(
                "download",
                "timeout",
                v,
                "must be a positive integer (seconds)",
            )?;
        }
        if let Some(v) = section.get("max_retries") {
            config.download.max_retries = parse_number(
                "download",
                "max_retries",
                v,
                "must be a non-negative integer",
            )?;
        }
        if let Some(v) = section.get("retry_base_delay_ms") {
            config.download.retry_base_delay_ms = parse_number(
                "download",
                "retry_base_delay_ms",
                v,
                "must be a positive integer (milliseconds)",
            )?;
        }
    }

    // [server] section
    if let Some(section) = ini.section(Some("server")) {
        if let Some(v) = section.get("bind") {
            config.server.bind = parse_number(
                "server",
                "bind",
                v,
                "expected an address like '127.0.0.1:8080'",
            )?;
        }
        if let Some(v) = section.get("min_zoom") {
            config.server.min_zoom = parse_zoom("server", "min_zoom", v)?;
        }
        if let Some(v) = section.get("max_zoom") {
            config.server.max_zoom = parse_zoom("server", "max_zoom", v)?;
        }
        if let Some(v) = section.get("fetch_on_miss") {
            config.server.fetch_on_miss = parse_bool("server", "fetch_on_miss", v)?;
        }
    }

    // [logging] section
    if let Some(section) = ini.section(Some("logging")) {
        if let Some(v) = non_empty(section.get("file")) {
            config.logging.file = expand_tilde(v);
        }
    }

    Ok(config)
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

pub(super) fn invalid(section: &str, key: &str, value: &str, reason: &str) -> ConfigFileError {
    ConfigFileError::InvalidValue {
        section: section.to_string(),
        key: key.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

fn parse_number<T: FromStr>(
    section: &str,
    key: &str,
    value: &str,
    reason: &str,
) -> Result<T, ConfigFileError> {
    value
        .trim()
        .parse()
        .map_err(|_| invalid(section, key, value, reason))
}

fn parse_zoom(section: &str, key: &str, value: &str) -> Result<u8, ConfigFileError> {
    let reason = "must be an integer between 0 and 22";
    let zoom: u8 = parse_number(section, key, value, reason)?;
    if zoom > MAX_SUPPORTED_ZOOM {
        return Err(invalid(section, key, value, reason));
    }
    Ok(zoom)
}

pub(super) fn parse_point(section: &str, key: &str, value: &str) -> Result<GeoPoint, ConfigFileError> {
    value
        .parse()
        .map_err(|e: crate::coord::CoordError| invalid(section, key, value, &e.to_string()))
}

fn parse_bool(section: &str, key: &str, value: &str) -> Result<bool, ConfigFileError> {
    match value.trim().to_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Ok(true),
        "false" | "no" | "off" | "0" => Ok(false),
        _ => Err(invalid(section, key, value, "must be 'true' or 'false'")),
    }
}

pub(super) fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}
