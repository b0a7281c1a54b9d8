//! Environment variable overrides.
//!
//! Applied after the INI file, so a `.env` file or the process environment
//! can carry credentials that should not live in `config.ini`.

use super::parser::{expand_tilde, invalid, parse_point};
use super::settings::ConfigFile;
use super::file::ConfigFileError;

pub const ENV_KEY_PAIR_ID: &str = "CLOUD_FRONT__KEY_PAIR_ID";
pub const ENV_SIGNATURE: &str = "CLOUD_FRONT__SIGNATURE";
pub const ENV_POLICY: &str = "CLOUD_FRONT__POLICY";
pub const ENV_AREA_APEX: &str = "AREA__APEX";
pub const ENV_AREA_VERTEX: &str = "AREA__VERTEX";
pub const ENV_CACHE_DIR: &str = "CACHE_DIR";

/// Overlays environment values onto `config`.
///
/// `lookup` returns the value of a variable; empty values are ignored.
pub fn apply_env_overrides<F>(config: &mut ConfigFile, lookup: F) -> Result<(), ConfigFileError>
where
    F: Fn(&str) -> Option<String>,
{
    let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

    if let Some(v) = get(ENV_KEY_PAIR_ID) {
        config.auth.key_pair_id = Some(v.trim().to_string());
    }
    if let Some(v) = get(ENV_SIGNATURE) {
        config.auth.signature = Some(v.trim().to_string());
    }
    if let Some(v) = get(ENV_POLICY) {
        config.auth.policy = Some(v.trim().to_string());
    }
    if let Some(v) = get(ENV_AREA_APEX) {
        config.area.apex = parse_point("env", ENV_AREA_APEX, &v)?;
    }
    if let Some(v) = get(ENV_AREA_VERTEX) {
        config.area.vertex = parse_point("env", ENV_AREA_VERTEX, &v)?;
    }
    if let Some(v) = get(ENV_CACHE_DIR) {
        config.cache.directory = expand_tilde(v.trim());
    }

    Ok(())
}

/// Checks constraints spanning several keys.
pub(super) fn validate(config: &ConfigFile) -> Result<(), ConfigFileError> {
    if config.area.min_zoom > config.area.max_zoom {
        return Err(invalid(
            "area",
            "min_zoom",
            &config.area.min_zoom.to_string(),
            "must not exceed max_zoom",
        ));
    }
    if config.server.min_zoom > config.server.max_zoom {
        return Err(invalid(
            "server",
            "min_zoom",
            &config.server.min_zoom.to_string(),
            "must not exceed max_zoom",
        ));
    }

    let auth = &config.auth;
    let set = [&auth.key_pair_id, &auth.signature, &auth.policy]
        .iter()
        .filter(|v| v.is_some())
        .count();
    if set != 0 && set != 3 {
        let missing = [
            ("key_pair_id", &auth.key_pair_id),
            ("signature", &auth.signature),
            ("policy", &auth.policy),
        ]
        .into_iter()
        .find(|(_, v)| v.is_none())
        .map(|(k, _)| k)
        .unwrap_or("key_pair_id");
        return Err(invalid(
            "auth",
            missing,
            "",
            "key_pair_id, signature and policy must be set together",
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coord::GeoPoint;
    use std::collections::HashMap;
    use std::path::PathBuf;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_overrides_applied() {
        let mut config = ConfigFile::default();
        apply_env_overrides(
            &mut config,
            env(&[
                (ENV_KEY_PAIR_ID, "APKA"),
                (ENV_SIGNATURE, "sig"),
                (ENV_POLICY, "pol"),
                (ENV_AREA_APEX, "50.0, 14.0"),
                (ENV_AREA_VERTEX, "49.5, 14.5"),
                (ENV_CACHE_DIR, "/tmp/heat"),
            ]),
        )
        .unwrap();

        assert_eq!(config.auth.key_pair_id.as_deref(), Some("APKA"));
        assert_eq!(config.auth.policy.as_deref(), Some("pol"));
        assert_eq!(config.area.apex, GeoPoint::new(50.0, 14.0));
        assert_eq!(config.area.vertex, GeoPoint::new(49.5, 14.5));
        assert_eq!(config.cache.directory, PathBuf::from("/tmp/heat"));
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_empty_env_ignored() {
        let mut config = ConfigFile::default();
        apply_env_overrides(&mut config, env(&[(ENV_SIGNATURE, "  ")])).unwrap();
        assert_eq!(config.auth.signature, None);
    }

    #[test]
    fn test_invalid_env_point() {
        let mut config = ConfigFile::default();
        let err = apply_env_overrides(&mut config, env(&[(ENV_AREA_APEX, "north")])).unwrap_err();
        assert!(err.to_string().contains(ENV_AREA_APEX));
    }

    #[test]
    fn test_partial_auth_rejected() {
        let mut config = ConfigFile::default();
        config.auth.key_pair_id = Some("APKA".to_string());
        config.auth.policy = Some("pol".to_string());

        let err = validate(&config).unwrap_err();
        assert!(err.to_string().contains("auth.signature"));
    }

    #[test]
    fn test_inverted_zoom_range_rejected() {
        let mut config = ConfigFile::default();
        config.area.min_zoom = 12;
        config.area.max_zoom = 9;
        assert!(validate(&config).is_err());
    }
}
