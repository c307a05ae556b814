/// Disk-based blob storage backend
use crate::{
    blob_store::{generate_filename, BlobBackend, BlobRemoval},
    error::{LandingError, LandingResult},
};
use async_trait::async_trait;
use std::io::Write;
use std::path::PathBuf;
use tokio::fs;

/// URL prefix the upload directory is mounted under
pub const STATIC_PREFIX: &str = "/images";

/// Name prefix of in-progress writes
pub const STAGING_PREFIX: &str = ".upload-";

/// Disk storage backend
///
/// Writes each upload as a flat file in `base_path`; the router serves that
/// directory read-only at [`STATIC_PREFIX`].
#[derive(Clone)]
pub struct DiskBlobBackend {
    base_path: PathBuf,
}

impl DiskBlobBackend {
    /// Create a new disk storage backend
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    /// Public URL for a stored file name
    fn url_for(filename: &str) -> String {
        format!("{}/{}", STATIC_PREFIX, filename)
    }

    /// Map a URL back to a file under `base_path`
    ///
    /// Only plain file names directly below the prefix resolve; anything with
    /// a separator or a dot segment does not.
    fn resolve(&self, url: &str) -> Option<PathBuf> {
        let name = url.strip_prefix(STATIC_PREFIX)?.strip_prefix('/')?;

        let plain = !name.is_empty()
            && name != "."
            && name != ".."
            && !name.contains(['/', '\\', '\0']);

        plain.then(|| self.base_path.join(name))
    }
}

#[async_trait]
impl BlobBackend for DiskBlobBackend {
    async fn store(&self, data: Vec<u8>, original_name: &str) -> LandingResult<String> {
        let filename = generate_filename(original_name);
        let dir = self.base_path.clone();
        let target = dir.join(&filename);
        let size = data.len();

        // Runs to completion even if the request is dropped; the staged file
        // only becomes visible once fully written.
        tokio::task::spawn_blocking(move || -> std::io::Result<()> {
            std::fs::create_dir_all(&dir)?;
            let mut staged = tempfile::Builder::new()
                .prefix(STAGING_PREFIX)
                .tempfile_in(&dir)?;
            staged.write_all(&data)?;
            staged.as_file().sync_all()?;
            staged.persist_noclobber(&target).map_err(|e| e.error)?;
            Ok(())
        })
        .await
        .map_err(|e| LandingError::Internal(format!("Blob write task failed: {}", e)))?
        .map_err(|e| LandingError::UploadFailed(format!("Failed to write blob {}: {}", filename, e)))?;

        tracing::info!("Stored blob {} ({} bytes) on disk", filename, size);

        Ok(Self::url_for(&filename))
    }

    async fn delete(&self, url: &str) -> LandingResult<BlobRemoval> {
        let Some(blob_path) = self.resolve(url) else {
            tracing::warn!("Blob URL {} is not under {}, nothing to remove", url, STATIC_PREFIX);
            return Ok(BlobRemoval::NoOp);
        };

        match fs::remove_file(&blob_path).await {
            Ok(()) => {
                tracing::info!("Removed blob {}", blob_path.display());
                Ok(BlobRemoval::Removed)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!("Blob {} already absent", blob_path.display());
                Ok(BlobRemoval::NoOp)
            }
            Err(e) => Err(LandingError::BlobStorage(format!(
                "Failed to delete blob {}: {}",
                blob_path.display(),
                e
            ))),
        }
    }

    fn owns(&self, url: &str) -> bool {
        self.resolve(url).is_some()
    }

    fn name(&self) -> &'static str {
        "disk"
    }
}
