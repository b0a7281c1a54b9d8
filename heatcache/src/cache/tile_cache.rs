//! Filesystem tile store.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use tracing::{debug, trace};

use super::types::{CacheError, CacheStats};
use crate::coord::Tile;

/// Extension of cached tile files.
const TILE_EXTENSION: &str = "png";

/// Suffix of files being written; never counted as tiles.
const PARTIAL_SUFFIX: &str = "part";

/// Tile store rooted at a directory, laid out as `{root}/{z}/{x}/{y}.png`.
///
/// Presence of a file is the whole cache state: there is no index and no
/// expiry. Writes go to a temporary sibling and are renamed into place, so
/// readers never observe a half-written tile.
#[derive(Debug, Clone)]
pub struct TileCache {
    root: PathBuf,
}

impl TileCache {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the file holding a tile.
    pub fn tile_path(&self, tile: &Tile) -> PathBuf {
        self.root
            .join(tile.z.to_string())
            .join(tile.x.to_string())
            .join(format!("{}.{}", tile.y, TILE_EXTENSION))
    }

    /// Whether the tile is cached.
    ///
    /// A plain `stat`; cheap enough to call for every candidate tile of an
    /// area, so it is not async.
    pub fn exists(&self, tile: &Tile) -> bool {
        self.tile_path(tile).is_file()
    }

    /// Reads the cached bytes of a tile.
    pub async fn read(&self, tile: &Tile) -> Result<Vec<u8>, CacheError> {
        let path = self.tile_path(tile);
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(CacheError::NotFound(*tile)),
            Err(e) => Err(CacheError::io(path, e)),
        }
    }

    /// Stores the bytes of a tile, replacing any previous entry.
    ///
    /// Missing parent directories are created.
    pub async fn write(&self, tile: &Tile, bytes: &[u8]) -> Result<(), CacheError> {
        let path = self.tile_path(tile);

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| CacheError::io(parent, e))?;
        }

        let partial = path.with_extension(format!(
            "{}.{:08x}.{}",
            TILE_EXTENSION,
            rand::random::<u32>(),
            PARTIAL_SUFFIX
        ));
        tokio::fs::write(&partial, bytes)
            .await
            .map_err(|e| CacheError::io(&partial, e))?;

        if let Err(e) = tokio::fs::rename(&partial, &path).await {
            let _ = tokio::fs::remove_file(&partial).await;
            return Err(CacheError::io(&path, e));
        }

        trace!(tile = %tile, bytes = bytes.len(), "Tile cached");
        Ok(())
    }

    /// Counts cached tile files and their total size.
    ///
    /// Walks the whole directory tree on the blocking pool. A missing root
    /// is an empty cache.
    pub async fn stats(&self) -> Result<CacheStats, CacheError> {
        let root = self.root.clone();
        self.blocking(move || {
            let mut stats = CacheStats::default();
            walk(&root, &mut |path: &Path, metadata: &std::fs::Metadata| {
                if has_extension(path, TILE_EXTENSION) {
                    stats.files += 1;
                    stats.bytes += metadata.len();
                }
                Ok(())
            })?;
            Ok(stats)
        })
        .await
    }

    /// Deletes partial files left by writes that were cut off, such as
    /// in-flight fetches dropped when a batch aborts.
    ///
    /// Only files last modified more than `max_age` ago are removed, so a
    /// write still running in another process is left alone. Returns the
    /// number of files deleted.
    pub async fn remove_stale_partials(&self, max_age: Duration) -> Result<u64, CacheError> {
        let root = self.root.clone();
        self.blocking(move || {
            let now = SystemTime::now();
            let mut removed = 0;
            walk(&root, &mut |path: &Path, metadata: &std::fs::Metadata| {
                if !has_extension(path, PARTIAL_SUFFIX) {
                    return Ok(());
                }
                let age = metadata
                    .modified()
                    .ok()
                    .and_then(|modified| now.duration_since(modified).ok())
                    .unwrap_or_default();
                if age < max_age {
                    return Ok(());
                }
                match std::fs::remove_file(path) {
                    Ok(()) => {
                        debug!(path = %path.display(), "Removed stale partial file");
                        removed += 1;
                        Ok(())
                    }
                    Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
                    Err(e) => Err(CacheError::io(path, e)),
                }
            })?;
            Ok(removed)
        })
        .await
    }

    async fn blocking<T, F>(&self, f: F) -> Result<T, CacheError>
    where
        T: Send + 'static,
        F: FnOnce() -> Result<T, CacheError> + Send + 'static,
    {
        tokio::task::spawn_blocking(f)
            .await
            .map_err(|e| CacheError::io(&self.root, std::io::Error::other(e.to_string())))?
    }
}

fn has_extension(path: &Path, extension: &str) -> bool {
    path.extension().and_then(|e| e.to_str()) == Some(extension)
}

/// Calls `visit` for every regular file below `dir`.
fn walk<F>(dir: &Path, visit: &mut F) -> Result<(), CacheError>
where
    F: FnMut(&Path, &std::fs::Metadata) -> Result<(), CacheError>,
{
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(CacheError::io(dir, e)),
    };

    for entry in entries {
        let entry = entry.map_err(|e| CacheError::io(dir, e))?;
        let path = entry.path();
        let file_type = entry.file_type().map_err(|e| CacheError::io(&path, e))?;

        if file_type.is_dir() {
            walk(&path, visit)?;
        } else if file_type.is_file() {
            let metadata = entry.metadata().map_err(|e| CacheError::io(&path, e))?;
            visit(&path, &metadata)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use tempfile::TempDir;

    fn cache() -> (TempDir, TileCache) {
        let dir = TempDir::new().unwrap();
        let cache = TileCache::new(dir.path());
        (dir, cache)
    }

    #[test]
    fn test_tile_path_layout() {
        let cache = TileCache::new("/var/cache/heatmap");
        assert_eq!(
            cache.tile_path(&Tile::new(298, 180, 9)),
            PathBuf::from("/var/cache/heatmap/9/298/180.png")
        );
    }

    #[test]
    fn test_tile_path_injective() {
        let cache = TileCache::new("/c");
        let tiles = [
            Tile::new(1, 11, 1),
            Tile::new(11, 1, 1),
            Tile::new(1, 1, 11),
            Tile::new(11, 1, 11),
            Tile::new(1, 11, 11),
        ];
        let paths: HashSet<PathBuf> = tiles.iter().map(|t| cache.tile_path(t)).collect();
        assert_eq!(paths.len(), tiles.len());
    }

    #[tokio::test]
    async fn test_write_then_read() {
        let (_dir, cache) = cache();
        let tile = Tile::new(298, 180, 9);

        assert!(!cache.exists(&tile));
        cache.write(&tile, b"png bytes").await.unwrap();

        assert!(cache.exists(&tile));
        assert_eq!(cache.read(&tile).await.unwrap(), b"png bytes");
    }

    #[tokio::test]
    async fn test_write_replaces() {
        let (_dir, cache) = cache();
        let tile = Tile::new(1, 2, 3);

        cache.write(&tile, b"old").await.unwrap();
        cache.write(&tile, b"new").await.unwrap();
        assert_eq!(cache.read(&tile).await.unwrap(), b"new");
    }

    #[tokio::test]
    async fn test_read_missing_is_not_found() {
        let (_dir, cache) = cache();
        let tile = Tile::new(1, 2, 3);
        assert!(matches!(
            cache.read(&tile).await,
            Err(CacheError::NotFound(t)) if t == tile
        ));
    }

    #[tokio::test]
    async fn test_write_leaves_no_partial_files() {
        let (dir, cache) = cache();
        let tile = Tile::new(5, 6, 7);
        cache.write(&tile, b"data").await.unwrap();

        let names: Vec<String> = std::fs::read_dir(dir.path().join("7").join("5"))
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["6.png".to_string()]);
    }

    #[tokio::test]
    async fn test_write_fails_when_root_is_a_file() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("not-a-dir");
        std::fs::write(&root, b"").unwrap();

        let cache = TileCache::new(&root);
        let result = cache.write(&Tile::new(0, 0, 0), b"x").await;
        assert!(matches!(result, Err(CacheError::Io { .. })));
    }

    #[tokio::test]
    async fn test_concurrent_writes_distinct_tiles() {
        let (_dir, cache) = cache();
        let tiles: Vec<Tile> = (0..32).map(|i| Tile::new(i, i % 4, 10)).collect();

        let writes = tiles.iter().map(|t| {
            let cache = cache.clone();
            let t = *t;
            async move { cache.write(&t, &t.x.to_le_bytes()).await }
        });
        for result in futures::future::join_all(writes).await {
            result.unwrap();
        }

        for tile in &tiles {
            assert_eq!(cache.read(tile).await.unwrap(), tile.x.to_le_bytes());
        }
    }

    #[tokio::test]
    async fn test_stats() {
        let (dir, cache) = cache();
        assert_eq!(cache.stats().await.unwrap(), CacheStats::default());

        cache.write(&Tile::new(0, 0, 1), &[0; 10]).await.unwrap();
        cache.write(&Tile::new(1, 0, 1), &[0; 20]).await.unwrap();
        cache.write(&Tile::new(3, 3, 2), &[0; 5]).await.unwrap();
        std::fs::write(dir.path().join("README"), b"ignored").unwrap();

        let stats = cache.stats().await.unwrap();
        assert_eq!(stats.files, 3);
        assert_eq!(stats.bytes, 35);
    }

    #[tokio::test]
    async fn test_stats_missing_root() {
        let dir = TempDir::new().unwrap();
        let cache = TileCache::new(dir.path().join("absent"));
        assert_eq!(cache.stats().await.unwrap(), CacheStats::default());
    }

    #[tokio::test]
    async fn test_stats_ignores_partial_files() {
        let (dir, cache) = cache();
        cache.write(&Tile::new(0, 0, 1), &[0; 10]).await.unwrap();
        std::fs::write(dir.path().join("1").join("0").join("1.png.0badf00d.part"), [0; 7]).unwrap();

        let stats = cache.stats().await.unwrap();
        assert_eq!(stats.files, 1);
        assert_eq!(stats.bytes, 10);
    }

    #[tokio::test]
    async fn test_remove_stale_partials() {
        let (dir, cache) = cache();
        let tile = Tile::new(2, 3, 4);
        cache.write(&tile, b"tile").await.unwrap();

        let tile_dir = dir.path().join("4").join("2");
        let stale = tile_dir.join("5.png.deadbeef.part");
        let fresh = tile_dir.join("6.png.feedface.part");
        std::fs::write(&stale, b"cut off").unwrap();
        std::fs::write(&fresh, b"in flight").unwrap();
        let hour_ago = SystemTime::now() - Duration::from_secs(3600);
        filetime::set_file_mtime(&stale, filetime::FileTime::from_system_time(hour_ago)).unwrap();

        let removed = cache
            .remove_stale_partials(Duration::from_secs(600))
            .await
            .unwrap();

        assert_eq!(removed, 1);
        assert!(!stale.exists());
        assert!(fresh.exists());
        assert!(cache.exists(&tile));
    }

    #[tokio::test]
    async fn test_remove_stale_partials_missing_root() {
        let dir = TempDir::new().unwrap();
        let cache = TileCache::new(dir.path().join("absent"));
        assert_eq!(cache.remove_stale_partials(Duration::ZERO).await.unwrap(), 0);
    }
}
