/// Remote image host backend
///
/// Forwards uploads to an imgbb-compatible API: the image goes up as a
/// base64 form field and the hosted URL comes back in `data.url`. The host
/// offers no delete, so removal is always a no-op.
use crate::{
    blob_store::{BlobBackend, BlobRemoval},
    error::{LandingError, LandingResult},
};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64_STANDARD, Engine};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::NamedTempFile;
use tokio::fs;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Name prefix of staged uploads
pub const STAGING_PREFIX: &str = "upload-";

/// Upload response body
#[derive(Debug, Deserialize)]
struct UploadResponse {
    #[serde(default)]
    success: Option<bool>,
    data: Option<UploadData>,
}

#[derive(Debug, Deserialize)]
struct UploadData {
    url: String,
}

pub struct RemoteBlobBackend {
    client: reqwest::Client,
    upload_url: String,
    api_key: String,
    tmp_location: PathBuf,
}

impl RemoteBlobBackend {
    pub fn new(upload_url: String, api_key: String, tmp_location: PathBuf) -> LandingResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| LandingError::Internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            upload_url,
            api_key,
            tmp_location,
        })
    }

    /// Write the upload to a temp file that is deleted when the guard drops
    async fn stage(&self, data: Vec<u8>) -> LandingResult<NamedTempFile> {
        fs::create_dir_all(&self.tmp_location).await?;

        let staged = tempfile::Builder::new()
            .prefix(STAGING_PREFIX)
            .tempfile_in(&self.tmp_location)?;
        fs::write(staged.path(), data).await?;

        Ok(staged)
    }

    /// Post the encoded image and pull the hosted URL out of the response
    async fn upload(&self, encoded: String, original_name: &str) -> LandingResult<String> {
        let mut form = vec![("image", encoded)];
        if let Some(stem) = Path::new(original_name).file_stem().and_then(|s| s.to_str()) {
            form.push(("name", stem.to_string()));
        }

        let response = self
            .client
            .post(&self.upload_url)
            .query(&[("key", self.api_key.as_str())])
            .form(&form)
            .send()
            .await
            .map_err(|e| {
                // The request URL carries the API key
                LandingError::UploadFailed(format!("Image host unreachable: {}", e.without_url()))
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LandingError::UploadFailed(format!(
                "Image host returned {}: {}",
                status,
                body.chars().take(200).collect::<String>()
            )));
        }

        let body: UploadResponse = response.json().await.map_err(|e| {
            LandingError::UploadFailed(format!("Malformed image host response: {}", e))
        })?;

        if body.success == Some(false) {
            return Err(LandingError::UploadFailed(
                "Image host reported failure".to_string(),
            ));
        }

        body.data
            .map(|d| d.url)
            .filter(|url| !url.is_empty())
            .ok_or_else(|| LandingError::UploadFailed("Image host response has no URL".to_string()))
    }
}

#[async_trait]
impl BlobBackend for RemoteBlobBackend {
    async fn store(&self, data: Vec<u8>, original_name: &str) -> LandingResult<String> {
        let staged = self
            .stage(data)
            .await
            .map_err(|e| LandingError::UploadFailed(format!("Failed to stage upload: {}", e)))?;

        let encoded = BASE64_STANDARD.encode(fs::read(staged.path()).await?);
        let result = self.upload(encoded, original_name).await;

        // Staged copy goes away whatever the host said
        drop(staged);

        match &result {
            Ok(url) => tracing::info!("Uploaded {} to image host: {}", original_name, url),
            Err(e) => tracing::warn!("Image host upload of {} failed: {}", original_name, e),
        }

        result
    }

    async fn delete(&self, url: &str) -> LandingResult<BlobRemoval> {
        tracing::info!("Image host has no delete API, leaving {} in place", url);
        Ok(BlobRemoval::NoOp)
    }

    fn owns(&self, _url: &str) -> bool {
        false
    }

    fn name(&self) -> &'static str {
        "remote"
    }
}
