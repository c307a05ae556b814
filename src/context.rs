/// Application context and dependency injection
use crate::{
    blob_store::{self, BlobBackend},
    cards::CardService,
    config::{BlobstoreConfig, ServerConfig},
    db::{self, DocumentStore, SqliteDocumentStore},
    error::LandingResult,
};
use sqlx::SqlitePool;
use std::path::Path;
use std::sync::Arc;

/// Application context holding all shared services
#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<ServerConfig>,
    pub db: SqlitePool,
    pub documents: Arc<dyn DocumentStore>,
    pub blob_store: Arc<dyn BlobBackend>,
}

impl AppContext {
    /// Create a new application context from configuration
    pub async fn new(config: ServerConfig) -> LandingResult<Self> {
        // Validate configuration
        config.validate()?;

        // Create upload directories if they don't exist
        Self::ensure_directories(&config).await?;

        let db = db::create_pool(&config.storage.database_path, db::DatabaseOptions::default())
            .await?;
        db::run_migrations(&db).await?;
        db::test_connection(&db).await?;

        tracing::info!(
            "Connected to document database at {}",
            config.storage.database_path.display()
        );

        let documents = Arc::new(SqliteDocumentStore::new(db.clone()));
        let blob_store = blob_store::create_backend(&config.storage.blobstore)?;

        Ok(Self::from_parts(config, db, documents, blob_store))
    }

    /// Assemble a context from already-built services
    pub fn from_parts(
        config: ServerConfig,
        db: SqlitePool,
        documents: Arc<dyn DocumentStore>,
        blob_store: Arc<dyn BlobBackend>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            db,
            documents,
            blob_store,
        }
    }

    /// Card workflow over this context's stores
    pub fn cards(&self) -> CardService {
        CardService::new(self.documents.clone(), self.blob_store.clone())
    }

    /// Directory served under `/images`, when blobs live on disk
    pub fn static_dir(&self) -> Option<&Path> {
        match &self.config.storage.blobstore {
            BlobstoreConfig::Disk { location } => Some(location.as_path()),
            BlobstoreConfig::Remote { .. } => None,
        }
    }

    /// Release the database pool
    pub async fn shutdown(&self) {
        self.db.close().await;
        tracing::info!("Database pool closed");
    }

    /// Ensure required directories exist and hold no stale staging files
    async fn ensure_directories(config: &ServerConfig) -> LandingResult<()> {
        let (dir, staging_prefix) = match &config.storage.blobstore {
            BlobstoreConfig::Disk { location } => (location, blob_store::disk::STAGING_PREFIX),
            BlobstoreConfig::Remote { tmp_location, .. } => {
                (tmp_location, blob_store::remote::STAGING_PREFIX)
            }
        };

        tokio::fs::create_dir_all(dir).await?;
        blob_store::sweep_staging_files(dir, staging_prefix).await?;

        Ok(())
    }
}
