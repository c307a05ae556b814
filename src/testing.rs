/// Test doubles shared by unit tests
use crate::{
    blob_store::{BlobBackend, BlobRemoval},
    config::test_config,
    context::AppContext,
    db::{
        documents::{Collection, DeleteResult, Document, DocumentStore, InsertResult},
        memory_pool, SqliteDocumentStore,
    },
    error::{LandingError, LandingResult},
};
use async_trait::async_trait;
use sqlx::SqlitePool;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// How a [`FaultyStore`] misbehaves on insert
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreFault {
    FailInserts,
    Unacknowledged,
}

/// SQLite store whose inserts misbehave
pub struct FaultyStore {
    inner: SqliteDocumentStore,
    fault: StoreFault,
}

impl FaultyStore {
    pub fn new(pool: SqlitePool, fault: StoreFault) -> Self {
        Self {
            inner: SqliteDocumentStore::new(pool),
            fault,
        }
    }
}

#[async_trait]
impl DocumentStore for FaultyStore {
    async fn list_all(&self, collection: Collection) -> LandingResult<Vec<Document>> {
        self.inner.list_all(collection).await
    }

    async fn find_one(&self, collection: Collection, id: &str) -> LandingResult<Option<Document>> {
        self.inner.find_one(collection, id).await
    }

    async fn insert_one(
        &self,
        _collection: Collection,
        _document: Document,
    ) -> LandingResult<InsertResult> {
        match self.fault {
            StoreFault::FailInserts => Err(LandingError::Database(sqlx::Error::PoolClosed)),
            StoreFault::Unacknowledged => Ok(InsertResult {
                acknowledged: false,
                inserted_id: uuid::Uuid::new_v4().to_string(),
            }),
        }
    }

    async fn delete_one(&self, collection: Collection, id: &str) -> LandingResult<DeleteResult> {
        self.inner.delete_one(collection, id).await
    }
}

/// Remote-style backend that hands out absolute URLs and counts calls
#[derive(Default)]
pub struct HostedBlobs {
    uploads: AtomicUsize,
    deletes: AtomicUsize,
}

impl HostedBlobs {
    pub fn upload_calls(&self) -> usize {
        self.uploads.load(Ordering::SeqCst)
    }

    pub fn delete_calls(&self) -> usize {
        self.deletes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BlobBackend for HostedBlobs {
    async fn store(&self, _data: Vec<u8>, original_name: &str) -> LandingResult<String> {
        let n = self.uploads.fetch_add(1, Ordering::SeqCst);
        Ok(format!("https://img.example.test/{}/{}", n, original_name))
    }

    async fn delete(&self, _url: &str) -> LandingResult<BlobRemoval> {
        self.deletes.fetch_add(1, Ordering::SeqCst);
        Ok(BlobRemoval::NoOp)
    }

    fn owns(&self, _url: &str) -> bool {
        false
    }

    fn name(&self) -> &'static str {
        "hosted-test"
    }
}

/// Backend whose uploads always fail
pub struct BrokenBlobs;

#[async_trait]
impl BlobBackend for BrokenBlobs {
    async fn store(&self, _data: Vec<u8>, _original_name: &str) -> LandingResult<String> {
        Err(LandingError::BlobStorage("disk full".to_string()))
    }

    async fn delete(&self, _url: &str) -> LandingResult<BlobRemoval> {
        Ok(BlobRemoval::NoOp)
    }

    fn owns(&self, _url: &str) -> bool {
        false
    }

    fn name(&self) -> &'static str {
        "broken-test"
    }
}

/// Context over an in-memory database with disk blobs in `dir`
pub async fn test_context(dir: &Path) -> AppContext {
    let pool = memory_pool().await;
    let documents = Arc::new(SqliteDocumentStore::new(pool.clone()));
    let blobs = Arc::new(crate::blob_store::DiskBlobBackend::new(dir.to_path_buf()));
    AppContext::from_parts(test_config(dir.to_path_buf()), pool, documents, blobs)
}

/// Context with a custom document store and blob backend
pub async fn context_with(
    dir: &Path,
    documents: Arc<dyn DocumentStore>,
    blobs: Arc<dyn BlobBackend>,
) -> AppContext {
    AppContext::from_parts(test_config(dir.to_path_buf()), memory_pool().await, documents, blobs)
}
