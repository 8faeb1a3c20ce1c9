//! Object URLs for downloaded binaries.
//!
//! A fetched PDF is materialized as a `blob:genex/<ulid>` URL, handed to a
//! [`BlobSink`], then revoked after a fixed grace period whether or not the
//! consumer is done with it.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};
use ulid::Ulid;

use crate::error::ServiceResult;

pub const DOWNLOAD_GRACE: Duration = Duration::from_millis(100);
pub const PREVIEW_GRACE: Duration = Duration::from_secs(60);

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ObjectUrl(String);

impl ObjectUrl {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ObjectUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Default)]
pub struct BlobRegistry {
    blobs: Arc<Mutex<HashMap<ObjectUrl, Arc<[u8]>>>>,
}

impl BlobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<ObjectUrl, Arc<[u8]>>> {
        // the map holds plain data, a panic elsewhere cannot leave it half-updated
        self.blobs.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn create_object_url(&self, bytes: Vec<u8>) -> ObjectUrl {
        let url = ObjectUrl(format!("blob:genex/{}", Ulid::new()));
        debug!(url = %url, bytes = bytes.len(), "Created object URL");
        self.lock().insert(url.clone(), Arc::from(bytes));
        url
    }

    pub fn resolve(&self, url: &ObjectUrl) -> Option<Arc<[u8]>> {
        self.lock().get(url).cloned()
    }

    pub fn is_live(&self, url: &ObjectUrl) -> bool {
        self.lock().contains_key(url)
    }

    pub fn live_count(&self) -> usize {
        self.lock().len()
    }

    /// Returns false when the URL was already revoked.
    pub fn revoke(&self, url: &ObjectUrl) -> bool {
        let removed = self.lock().remove(url).is_some();
        if removed {
            debug!(url = %url, "Revoked object URL");
        }
        removed
    }

    /// Revoke `url` once `grace` has elapsed.
    pub fn revoke_after(&self, url: ObjectUrl, grace: Duration) -> JoinHandle<()> {
        let registry = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep(grace).await;
            registry.revoke(&url);
        })
    }
}

/// Where materialized blobs end up.
pub trait BlobSink: Send + Sync {
    /// Persist a downloaded file as `filename`.
    fn save(&self, url: &ObjectUrl, blob: &[u8], filename: &str) -> ServiceResult<PathBuf>;
    /// Make a preview available to a viewer.
    fn open(&self, url: &ObjectUrl, blob: &[u8], filename: &str) -> ServiceResult<PathBuf>;
}

/// Writes downloads into one directory and previews into another.
pub struct FsSink {
    download_dir: PathBuf,
    preview_dir: PathBuf,
}

impl FsSink {
    pub fn new(download_dir: impl Into<PathBuf>, preview_dir: impl Into<PathBuf>) -> Self {
        Self {
            download_dir: download_dir.into(),
            preview_dir: preview_dir.into(),
        }
    }

    /// Downloads go to the user's download folder, previews to the cache.
    pub fn from_platform_dirs(download_dir: Option<PathBuf>) -> Self {
        let download_dir = download_dir
            .or_else(dirs::download_dir)
            .unwrap_or_else(|| PathBuf::from("."));
        let preview_dir = dirs::cache_dir()
            .unwrap_or_else(std::env::temp_dir)
            .join("genex")
            .join("previews");
        Self::new(download_dir, preview_dir)
    }

    pub fn download_dir(&self) -> &Path {
        &self.download_dir
    }

    fn write(dir: &Path, filename: &str, blob: &[u8]) -> ServiceResult<PathBuf> {
        std::fs::create_dir_all(dir)?;
        let path = dir.join(sanitize_filename(filename));
        std::fs::write(&path, blob)?;
        Ok(path)
    }
}

impl BlobSink for FsSink {
    fn save(&self, url: &ObjectUrl, blob: &[u8], filename: &str) -> ServiceResult<PathBuf> {
        let path = Self::write(&self.download_dir, filename, blob)?;
        info!(url = %url, path = %path.display(), "Saved download");
        Ok(path)
    }

    fn open(&self, url: &ObjectUrl, blob: &[u8], filename: &str) -> ServiceResult<PathBuf> {
        // previews of the same sheet must not overwrite one another
        let name = format!("{}-{}", Ulid::new(), sanitize_filename(filename));
        let path = Self::write(&self.preview_dir, &name, blob)?;
        info!(url = %url, path = %path.display(), "Preview ready");
        Ok(path)
    }
}

/// Keep only the final path component; fall back to `download.pdf`.
pub fn sanitize_filename(filename: &str) -> String {
    let name = filename
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .trim();
    if name.is_empty() || name == "." || name == ".." {
        "download.pdf".to_string()
    } else {
        name.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn urls_are_unique_and_resolvable() {
        let registry = BlobRegistry::new();
        let a = registry.create_object_url(b"%PDF-a".to_vec());
        let b = registry.create_object_url(b"%PDF-b".to_vec());
        assert_ne!(a, b);
        assert!(a.as_str().starts_with("blob:genex/"));
        assert_eq!(registry.resolve(&a).as_deref(), Some(&b"%PDF-a"[..]));
        assert_eq!(registry.live_count(), 2);

        assert!(registry.revoke(&a));
        assert!(!registry.revoke(&a));
        assert!(registry.resolve(&a).is_none());
        assert!(registry.is_live(&b));
    }

    #[tokio::test(start_paused = true)]
    async fn preview_url_lives_for_its_grace_window() {
        let registry = BlobRegistry::new();
        let url = registry.create_object_url(b"%PDF".to_vec());
        let handle = registry.revoke_after(url.clone(), PREVIEW_GRACE);

        tokio::time::sleep(PREVIEW_GRACE - Duration::from_secs(1)).await;
        assert!(registry.is_live(&url));

        tokio::time::sleep(Duration::from_secs(2)).await;
        handle.await.unwrap();
        assert!(!registry.is_live(&url));
    }

    #[tokio::test(start_paused = true)]
    async fn download_url_is_revoked_after_100ms() {
        let registry = BlobRegistry::new();
        let url = registry.create_object_url(b"%PDF".to_vec());
        let handle = registry.revoke_after(url.clone(), DOWNLOAD_GRACE);

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(registry.is_live(&url));
        handle.await.unwrap();
        assert!(!registry.is_live(&url));
        assert_eq!(registry.live_count(), 0);
    }

    #[test]
    fn sanitize_strips_directories() {
        assert_eq!(sanitize_filename("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_filename("C:\\temp\\Exercices.pdf"), "Exercices.pdf");
        assert_eq!(sanitize_filename(""), "download.pdf");
        assert_eq!(sanitize_filename("dir/"), "download.pdf");
    }

    #[test]
    fn fs_sink_writes_downloads_and_previews_apart() {
        let dir = tempfile::tempdir().unwrap();
        let sink = FsSink::new(dir.path().join("dl"), dir.path().join("preview"));
        let registry = BlobRegistry::new();
        let url = registry.create_object_url(b"%PDF".to_vec());

        let saved = sink.save(&url, b"%PDF", "Exercices.pdf").unwrap();
        assert_eq!(saved, dir.path().join("dl").join("Exercices.pdf"));
        assert_eq!(std::fs::read(&saved).unwrap(), b"%PDF");

        let first = sink.open(&url, b"%PDF", "preview.pdf").unwrap();
        let second = sink.open(&url, b"%PDF", "preview.pdf").unwrap();
        assert_ne!(first, second);
        assert!(first.starts_with(dir.path().join("preview")));
    }
}
