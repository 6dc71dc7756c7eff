//! File-system backed robots.txt cache storage.

use std::path::PathBuf;
use std::time::SystemTime;

use async_trait::async_trait;
use thiserror::Error;
use tracing::debug;

/// Storage failure behind the robots cache.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("robots cache I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Cache storage seam for robots.txt bodies, keyed by domain.
///
/// The checker only ever talks to this trait, so tests can swap in a double
/// without touching the disk.
#[async_trait]
pub trait RobotsStore: Send + Sync {
    /// Whether a cache entry exists for `domain`, fresh or not.
    async fn exists(&self, domain: &str) -> StoreResult<bool>;

    /// Last write time of the entry, `None` if absent.
    async fn modified(&self, domain: &str) -> StoreResult<Option<SystemTime>>;

    /// Read the cached body.
    async fn read(&self, domain: &str) -> StoreResult<String>;

    /// Write the body, creating or overwriting the entry. Returns true if an
    /// entry was overwritten.
    async fn write(&self, domain: &str, body: &str) -> StoreResult<bool>;
}

/// On-disk store: one plain UTF-8 file per domain at
/// `{cache_dir}/{domain}_robots.txt`, no wrapping metadata.
#[derive(Debug, Clone)]
pub struct DiskStore {
    cache_dir: PathBuf,
}

impl DiskStore {
    pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
        }
    }

    /// Deterministic cache path for a domain.
    pub fn cache_path(&self, domain: &str) -> PathBuf {
        self.cache_dir.join(format!("{domain}_robots.txt"))
    }
}

#[async_trait]
impl RobotsStore for DiskStore {
    async fn exists(&self, domain: &str) -> StoreResult<bool> {
        Ok(tokio::fs::try_exists(self.cache_path(domain)).await?)
    }

    async fn modified(&self, domain: &str) -> StoreResult<Option<SystemTime>> {
        match tokio::fs::metadata(self.cache_path(domain)).await {
            Ok(meta) => Ok(Some(meta.modified()?)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    async fn read(&self, domain: &str) -> StoreResult<String> {
        Ok(tokio::fs::read_to_string(self.cache_path(domain)).await?)
    }

    async fn write(&self, domain: &str, body: &str) -> StoreResult<bool> {
        tokio::fs::create_dir_all(&self.cache_dir).await?;
        let path = self.cache_path(domain);
        let existed = tokio::fs::try_exists(&path).await?;
        tokio::fs::write(&path, body).await?;
        debug!(domain, path = %path.display(), "wrote robots.txt cache file");
        Ok(existed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_cache_path_convention() {
        let store = DiskStore::new("/var/cache/robots");
        assert_eq!(
            store.cache_path("example.com"),
            PathBuf::from("/var/cache/robots/example.com_robots.txt")
        );
    }

    #[tokio::test]
    async fn test_write_read_round_trip() {
        let dir = tempdir().unwrap();
        let store = DiskStore::new(dir.path());

        let overwrote = store
            .write("example.com", "User-agent: *\nDisallow: /private/\n")
            .await
            .unwrap();
        assert!(!overwrote);
        assert!(store.exists("example.com").await.unwrap());
        assert!(store.modified("example.com").await.unwrap().is_some());

        let body = store.read("example.com").await.unwrap();
        assert!(body.contains("Disallow: /private/"));

        // Second write reports the overwrite.
        let overwrote = store.write("example.com", "User-agent: *\n").await.unwrap();
        assert!(overwrote);
    }

    #[tokio::test]
    async fn test_absent_entry() {
        let dir = tempdir().unwrap();
        let store = DiskStore::new(dir.path());

        assert!(!store.exists("example.com").await.unwrap());
        assert!(store.modified("example.com").await.unwrap().is_none());
        assert!(store.read("example.com").await.is_err());
    }
}
