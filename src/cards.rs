/// Card ingestion workflow
///
/// Creating a card moves through
/// `Received -> Validated -> BlobStored -> RecordPersisted`; any step may end
/// the submission instead (rejected input, failed upload, failed insert).
/// Deleting a card removes its locally owned image on a best-effort basis
/// and then the record.
use crate::{
    blob_store::BlobBackend,
    db::documents::{Collection, DeleteResult, Document, DocumentStore},
    error::{LandingError, LandingResult},
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Text fields of a card. Missing fields default to empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardFields {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub header: String,
    #[serde(default)]
    pub sub_header: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub short_description: Option<String>,
}

/// A persisted card
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Card {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(flatten)]
    pub fields: CardFields,
    pub image_url: String,
}

/// Stored shape of a card (everything but the id)
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CardRecord<'a> {
    #[serde(flatten)]
    fields: &'a CardFields,
    image_url: &'a str,
}

/// One uploaded image part
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub file_name: String,
    pub content_type: Option<String>,
    pub data: Vec<u8>,
}

/// Raw card submission as received from the client
#[derive(Debug, Clone, Default)]
pub struct CardSubmission {
    pub fields: CardFields,
    pub images: Vec<ImageUpload>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestionStage {
    Received,
    Validated,
    BlobStored,
    RecordPersisted,
}

impl fmt::Display for IngestionStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            IngestionStage::Received => "received",
            IngestionStage::Validated => "validated",
            IngestionStage::BlobStored => "blob_stored",
            IngestionStage::RecordPersisted => "record_persisted",
        };
        f.write_str(name)
    }
}

/// Check a submission and pull out its single image
///
/// `title` and `header` are not enforced.
pub fn validate(submission: CardSubmission) -> LandingResult<(CardFields, ImageUpload)> {
    let CardSubmission { fields, mut images } = submission;

    if images.len() > 1 {
        return Err(LandingError::Validation(
            "Only one image may be uploaded".to_string(),
        ));
    }

    match images.pop() {
        Some(image) if !image.data.is_empty() => Ok((fields, image)),
        _ => Err(LandingError::Validation("No image uploaded".to_string())),
    }
}

/// Card operations over a document store and a blob backend
#[derive(Clone)]
pub struct CardService {
    documents: Arc<dyn DocumentStore>,
    blobs: Arc<dyn BlobBackend>,
}

impl CardService {
    pub fn new(documents: Arc<dyn DocumentStore>, blobs: Arc<dyn BlobBackend>) -> Self {
        Self { documents, blobs }
    }

    /// Run a submission through the ingestion workflow
    pub async fn create(&self, submission: CardSubmission) -> LandingResult<Card> {
        let title = submission.fields.title.clone();
        tracing::debug!(stage = %IngestionStage::Received, title = %title, "card ingestion");

        let (fields, image) = validate(submission).map_err(|e| {
            tracing::debug!(title = %title, "card rejected: {}", e);
            e
        })?;
        tracing::debug!(
            stage = %IngestionStage::Validated,
            title = %title,
            bytes = image.data.len(),
            content_type = image.content_type.as_deref().unwrap_or("unknown"),
            "card ingestion"
        );

        let image_url = self
            .blobs
            .store(image.data, &image.file_name)
            .await
            .map_err(|e| match e {
                LandingError::UploadFailed(_) => e,
                other => LandingError::UploadFailed(other.to_string()),
            })?;
        tracing::debug!(stage = %IngestionStage::BlobStored, title = %title, url = %image_url, "card ingestion");

        let record = card_document(&fields, &image_url)?;

        // A failed insert leaves the stored image orphaned; it is logged, not reclaimed.
        let inserted = match self.documents.insert_one(Collection::Card, record).await {
            Ok(result) if result.acknowledged => result,
            Ok(_) => {
                tracing::error!("Card insert not acknowledged, blob {} is orphaned", image_url);
                return Err(LandingError::PersistenceFailed(
                    "Card insert was not acknowledged".to_string(),
                ));
            }
            Err(e) => {
                tracing::error!("Card insert failed, blob {} is orphaned: {}", image_url, e);
                return Err(LandingError::PersistenceFailed(
                    "Card insert failed".to_string(),
                ));
            }
        };
        tracing::debug!(
            stage = %IngestionStage::RecordPersisted,
            title = %title,
            id = %inserted.inserted_id,
            "card ingestion"
        );

        Ok(Card {
            id: inserted.inserted_id,
            fields,
            image_url,
        })
    }

    /// Delete a card and, when locally owned, its image
    ///
    /// A missing id deletes nothing and reports a zero count.
    pub async fn delete(&self, id: &str) -> LandingResult<DeleteResult> {
        if let Some(card) = self.documents.find_one(Collection::Card, id).await? {
            match card.get("imageUrl").and_then(Value::as_str) {
                Some(url) if self.blobs.owns(url) => match self.blobs.delete(url).await {
                    Ok(removal) => tracing::debug!("Card {} image {}: {:?}", id, url, removal),
                    Err(e) => tracing::warn!("Failed to remove image {} of card {}: {}", url, id, e),
                },
                Some(url) => {
                    tracing::info!("Card {} image {} is not locally owned, leaving it", id, url)
                }
                None => tracing::debug!("Card {} has no image", id),
            }
        }

        self.documents.delete_one(Collection::Card, id).await
    }
}

fn card_document(fields: &CardFields, image_url: &str) -> LandingResult<Document> {
    let record = CardRecord { fields, image_url };

    match serde_json::to_value(record) {
        Ok(Value::Object(document)) => Ok(document),
        Ok(_) => Err(LandingError::Internal("Card did not encode as an object".to_string())),
        Err(e) => Err(LandingError::Internal(format!("Failed to encode card: {}", e))),
    }
}
