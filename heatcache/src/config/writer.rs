//! INI serialization logic for converting `ConfigFile` → INI string.

use std::path::Path;

use super::settings::ConfigFile;

/// Convert a `ConfigFile` to a commented INI string for saving.
pub(super) fn to_config_string(config: &ConfigFile) -> String {
    let key_pair_id = config.auth.key_pair_id.as_deref().unwrap_or("");
    let signature = config.auth.signature.as_deref().unwrap_or("");
    let policy = config.auth.policy.as_deref().unwrap_or("");
    let max_tiles = config.area.max_tiles.unwrap_or(0);
    let fetch_on_miss = if config.server.fetch_on_miss {
        "true"
    } else {
        "false"
    };

    format!(
        r#"[provider]
; Heatmap layer: ride, run, water, winter or all
activity = {}
; Colour scheme: bluered, hot, blue, purple or gray
color = {}
; Zoom levels up to this one are fetched without credentials
free_max_zoom = {}
tile_size = {}
version = {}

[auth]
; CloudFront cookie values from a logged-in strava.com session
; (CloudFront-Key-Pair-Id, CloudFront-Signature, CloudFront-Policy).
; Required for zoom levels above free_max_zoom.
; Environment: CLOUD_FRONT__KEY_PAIR_ID, CLOUD_FRONT__SIGNATURE, CLOUD_FRONT__POLICY
key_pair_id = {}
signature = {}
policy = {}

[area]
; Opposite corners as "latitude, longitude", in any order
; Environment: AREA__APEX, AREA__VERTEX
apex = {}
vertex = {}
min_zoom = {}
max_zoom = {}
; Maximum tiles fetched per run (0 = no cap)
max_tiles = {}

[cache]
; Tiles are stored as <directory>/<z>/<x>/<y>.png
; Environment: CACHE_DIR
directory = {}

[download]
; Maximum concurrent requests
concurrency = {}
; Request timeout in seconds
timeout = {}
; Retries after a connection failure or timeout
max_retries = {}
retry_base_delay_ms = {}

[server]
bind = {}
min_zoom = {}
max_zoom = {}
; Fetch tiles missing from the cache on request instead of answering 404
fetch_on_miss = {}

[logging]
file = {}
"#,
        config.provider.activity,
        config.provider.color,
        config.provider.free_max_zoom,
        config.provider.tile_size,
        config.provider.version,
        key_pair_id,
        signature,
        policy,
        config.area.apex,
        config.area.vertex,
        config.area.min_zoom,
        config.area.max_zoom,
        max_tiles,
        path_to_string(&config.cache.directory),
        config.download.concurrency,
        config.download.timeout,
        config.download.max_retries,
        config.download.retry_base_delay_ms,
        config.server.bind,
        config.server.min_zoom,
        config.server.max_zoom,
        fetch_on_miss,
        path_to_string(&config.logging.file),
    )
}

fn path_to_string(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}
