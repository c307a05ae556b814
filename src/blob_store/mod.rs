/// Blob Storage System
///
/// Stores uploaded card images and hands back a URL the client can resolve.
/// Two interchangeable backends: local disk (served under `/images`) and a
/// remote image host.

pub mod disk;
pub mod remote;

pub use disk::{DiskBlobBackend, STATIC_PREFIX};
pub use remote::RemoteBlobBackend;

use crate::{config::BlobstoreConfig, error::LandingResult};
use async_trait::async_trait;
use chrono::Utc;
use std::path::Path;
use std::sync::Arc;
use uuid::Uuid;

/// Outcome of a blob delete
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlobRemoval {
    /// The underlying file was removed
    Removed,
    /// Nothing to remove (already absent, or the backend cannot delete)
    NoOp,
}

/// Blob storage backend trait
///
/// Implementations persist the bytes somewhere publicly resolvable and
/// return the URL that should be recorded on the card.
#[async_trait]
pub trait BlobBackend: Send + Sync {
    /// Store a blob and return its URL
    async fn store(&self, data: Vec<u8>, original_name: &str) -> LandingResult<String>;

    /// Delete the blob behind a URL previously returned by `store`
    async fn delete(&self, url: &str) -> LandingResult<BlobRemoval>;

    /// Whether this backend owns (and can remove) the blob behind `url`
    fn owns(&self, url: &str) -> bool;

    /// Backend name for logging
    fn name(&self) -> &'static str;
}

/// Build the configured backend
pub fn create_backend(config: &BlobstoreConfig) -> LandingResult<Arc<dyn BlobBackend>> {
    let backend: Arc<dyn BlobBackend> = match config {
        BlobstoreConfig::Disk { location } => Arc::new(DiskBlobBackend::new(location.clone())),
        BlobstoreConfig::Remote {
            upload_url,
            api_key,
            tmp_location,
        } => Arc::new(RemoteBlobBackend::new(
            upload_url.clone(),
            api_key.clone(),
            tmp_location.clone(),
        )?),
    };

    tracing::info!("Blob storage backend: {}", backend.name());

    Ok(backend)
}

/// Remove staging files left behind by an interrupted process
///
/// Only safe before the server accepts requests, when no upload is in flight.
pub async fn sweep_staging_files(dir: &Path, prefix: &str) -> LandingResult<u64> {
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
        Err(e) => return Err(e.into()),
    };

    let mut deleted_count = 0;

    while let Some(entry) = entries.next_entry().await? {
        if !entry.file_name().to_string_lossy().starts_with(prefix) {
            continue;
        }

        match tokio::fs::remove_file(entry.path()).await {
            Ok(()) => deleted_count += 1,
            Err(e) => {
                tracing::warn!("Failed to delete staging file {}: {}", entry.path().display(), e)
            }
        }
    }

    if deleted_count > 0 {
        tracing::info!("Cleaned up {} orphaned staging files in {}", deleted_count, dir.display());
    }

    Ok(deleted_count)
}

/// Generate a collision-resistant file name that keeps the upload's extension
///
/// Format: `{unix_millis}-{8 hex chars}{.ext}`. Extensions that are not short
/// and alphanumeric are dropped.
pub fn generate_filename(original_name: &str) -> String {
    let ext = Path::new(original_name)
        .extension()
        .and_then(|e| e.to_str())
        .filter(|e| !e.is_empty() && e.len() <= 8 && e.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(|e| format!(".{}", e.to_ascii_lowercase()))
        .unwrap_or_default();

    let suffix = Uuid::new_v4().simple().to_string();

    format!("{}-{}{}", Utc::now().timestamp_millis(), &suffix[..8], ext)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_generate_filename_keeps_extension() {
        let name = generate_filename("Kaaba Photo.JPG");
        assert!(name.ends_with(".jpg"));
        assert!(!name.contains(' '));
    }

    #[test]
    fn test_generate_filename_drops_suspicious_extension() {
        assert!(!generate_filename("x.p/ng").contains('/'));
        assert!(!generate_filename("noext").contains('.'));
        assert!(!generate_filename("a.verylongextension").contains('.'));
    }

    #[test]
    fn test_generate_filename_is_unique() {
        let names: HashSet<String> = (0..200).map(|_| generate_filename("a.png")).collect();
        assert_eq!(names.len(), 200);
    }

    #[tokio::test]
    async fn test_sweep_staging_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(".upload-abc"), b"half").unwrap();
        std::fs::write(dir.path().join(".upload-def"), b"half").unwrap();
        std::fs::write(dir.path().join("1-abcd1234.png"), b"kept").unwrap();

        let deleted = sweep_staging_files(dir.path(), disk::STAGING_PREFIX).await.unwrap();

        assert_eq!(deleted, 2);
        assert!(dir.path().join("1-abcd1234.png").exists());
        assert_eq!(
            sweep_staging_files(&dir.path().join("missing"), disk::STAGING_PREFIX)
                .await
                .unwrap(),
            0
        );
    }

    #[test]
    fn test_create_disk_backend() {
        let dir = tempfile::tempdir().unwrap();
        let backend = create_backend(&BlobstoreConfig::Disk {
            location: dir.path().to_path_buf(),
        })
        .unwrap();
        assert_eq!(backend.name(), "disk");
        assert!(backend.owns("/images/1-abc.png"));
    }
}
