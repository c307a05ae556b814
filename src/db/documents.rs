/// Generic document store
///
/// Every collection (booking, news, video, card) is a bag of free-form JSON
/// objects keyed by a store-generated id.
use crate::error::{LandingError, LandingResult};
use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sqlx::{Row, SqlitePool};
use std::fmt;
use uuid::Uuid;

/// A stored JSON object
pub type Document = Map<String, Value>;

/// Key under which the identity is exposed on the wire
pub const ID_FIELD: &str = "_id";

/// The closed set of collections
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Collection {
    Booking,
    News,
    Video,
    Card,
}

impl Collection {
    pub const ALL: [Collection; 4] = [
        Collection::Booking,
        Collection::News,
        Collection::Video,
        Collection::Card,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Collection::Booking => "booking",
            Collection::News => "news",
            Collection::Video => "video",
            Collection::Card => "card",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of an insert
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsertResult {
    pub acknowledged: bool,
    pub inserted_id: String,
}

/// Result of a delete; `deleted_count` is 0 or 1
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteResult {
    pub acknowledged: bool,
    pub deleted_count: u64,
}

/// Parse a client-supplied identifier
pub fn parse_id(id: &str) -> LandingResult<Uuid> {
    Uuid::parse_str(id).map_err(|_| LandingError::InvalidIdentifier(id.to_string()))
}

/// Document persistence backend
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// All documents of a collection in insertion order
    async fn list_all(&self, collection: Collection) -> LandingResult<Vec<Document>>;

    /// Look up one document by id
    async fn find_one(&self, collection: Collection, id: &str) -> LandingResult<Option<Document>>;

    /// Insert a document; any client-supplied `_id` is discarded
    async fn insert_one(&self, collection: Collection, document: Document)
        -> LandingResult<InsertResult>;

    /// Delete one document by id. A missing id deletes nothing and is not an error.
    async fn delete_one(&self, collection: Collection, id: &str) -> LandingResult<DeleteResult>;
}

/// SQLite-backed document store
#[derive(Clone)]
pub struct SqliteDocumentStore {
    db: SqlitePool,
}

impl SqliteDocumentStore {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    fn decode(id: String, body: &str) -> LandingResult<Document> {
        let mut document: Document = serde_json::from_str(body)
            .map_err(|e| LandingError::Internal(format!("Corrupt document {}: {}", id, e)))?;
        document.insert(ID_FIELD.to_string(), Value::String(id));
        Ok(document)
    }
}

#[async_trait]
impl DocumentStore for SqliteDocumentStore {
    async fn list_all(&self, collection: Collection) -> LandingResult<Vec<Document>> {
        let rows = sqlx::query(
            r#"
            SELECT id, body
            FROM documents
            WHERE collection = ?1
            ORDER BY rowid ASC
            "#,
        )
        .bind(collection.as_str())
        .fetch_all(&self.db)
        .await?;

        let mut documents = Vec::with_capacity(rows.len());
        for row in rows {
            let body: String = row.try_get("body")?;
            documents.push(Self::decode(row.try_get("id")?, &body)?);
        }

        Ok(documents)
    }

    async fn find_one(&self, collection: Collection, id: &str) -> LandingResult<Option<Document>> {
        let id = parse_id(id)?;

        let result = sqlx::query("SELECT id, body FROM documents WHERE collection = ?1 AND id = ?2")
            .bind(collection.as_str())
            .bind(id.to_string())
            .fetch_optional(&self.db)
            .await?;

        match result {
            Some(row) => {
                let body: String = row.try_get("body")?;
                Ok(Some(Self::decode(row.try_get("id")?, &body)?))
            }
            None => Ok(None),
        }
    }

    async fn insert_one(
        &self,
        collection: Collection,
        mut document: Document,
    ) -> LandingResult<InsertResult> {
        document.remove(ID_FIELD);

        let id = Uuid::new_v4().to_string();
        let body = serde_json::to_string(&document)
            .map_err(|e| LandingError::Internal(format!("Failed to encode document: {}", e)))?;

        let result = sqlx::query(
            r#"
            INSERT INTO documents (id, collection, body, created_at)
            VALUES (?1, ?2, ?3, ?4)
            "#,
        )
        .bind(&id)
        .bind(collection.as_str())
        .bind(body)
        .bind(Utc::now())
        .execute(&self.db)
        .await?;

        tracing::debug!("Inserted {} into {}", id, collection);

        Ok(InsertResult {
            acknowledged: result.rows_affected() == 1,
            inserted_id: id,
        })
    }

    async fn delete_one(&self, collection: Collection, id: &str) -> LandingResult<DeleteResult> {
        let id = parse_id(id)?;

        let result = sqlx::query("DELETE FROM documents WHERE collection = ?1 AND id = ?2")
            .bind(collection.as_str())
            .bind(id.to_string())
            .execute(&self.db)
            .await?;

        Ok(DeleteResult {
            acknowledged: true,
            deleted_count: result.rows_affected(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::memory_pool;
    use serde_json::json;

    fn doc(value: Value) -> Document {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn test_list_empty_collection() {
        let store = SqliteDocumentStore::new(memory_pool().await);
        for collection in Collection::ALL {
            assert!(store.list_all(collection).await.unwrap().is_empty());
        }
    }

    #[tokio::test]
    async fn test_insert_then_list() {
        let store = SqliteDocumentStore::new(memory_pool().await);

        let result = store
            .insert_one(Collection::News, doc(json!({"headline": "Hajj 2025", "views": 3})))
            .await
            .unwrap();
        assert!(result.acknowledged);

        let listed = store.list_all(Collection::News).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0]["headline"], "Hajj 2025");
        assert_eq!(listed[0]["views"], 3);
        assert_eq!(listed[0][ID_FIELD], result.inserted_id);
    }

    #[tokio::test]
    async fn test_client_supplied_id_is_ignored() {
        let store = SqliteDocumentStore::new(memory_pool().await);

        let result = store
            .insert_one(Collection::Booking, doc(json!({"_id": "mine", "name": "A"})))
            .await
            .unwrap();
        assert_ne!(result.inserted_id, "mine");

        let found = store
            .find_one(Collection::Booking, &result.inserted_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found[ID_FIELD], result.inserted_id);
    }

    #[tokio::test]
    async fn test_collections_are_isolated() {
        let store = SqliteDocumentStore::new(memory_pool().await);

        let result = store
            .insert_one(Collection::Video, doc(json!({"url": "https://v.test/1"})))
            .await
            .unwrap();

        assert!(store.list_all(Collection::News).await.unwrap().is_empty());
        assert!(store
            .find_one(Collection::News, &result.inserted_id)
            .await
            .unwrap()
            .is_none());

        let deleted = store
            .delete_one(Collection::News, &result.inserted_id)
            .await
            .unwrap();
        assert_eq!(deleted.deleted_count, 0);
        assert_eq!(store.list_all(Collection::Video).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_delete_existing_and_missing() {
        let store = SqliteDocumentStore::new(memory_pool().await);

        let result = store
            .insert_one(Collection::Booking, doc(json!({"name": "B"})))
            .await
            .unwrap();

        let deleted = store
            .delete_one(Collection::Booking, &result.inserted_id)
            .await
            .unwrap();
        assert_eq!(deleted.deleted_count, 1);

        let again = store
            .delete_one(Collection::Booking, &result.inserted_id)
            .await
            .unwrap();
        assert!(again.acknowledged);
        assert_eq!(again.deleted_count, 0);
    }

    #[tokio::test]
    async fn test_malformed_id_is_rejected() {
        let store = SqliteDocumentStore::new(memory_pool().await);

        let err = store.delete_one(Collection::Card, "not-an-id").await.unwrap_err();
        assert!(matches!(err, LandingError::InvalidIdentifier(_)));

        let err = store.find_one(Collection::Card, "../etc").await.unwrap_err();
        assert!(matches!(err, LandingError::InvalidIdentifier(_)));
    }

    #[tokio::test]
    async fn test_list_preserves_insertion_order() {
        let store = SqliteDocumentStore::new(memory_pool().await);

        for n in 0..5 {
            store
                .insert_one(Collection::News, doc(json!({ "n": n })))
                .await
                .unwrap();
        }

        let order: Vec<i64> = store
            .list_all(Collection::News)
            .await
            .unwrap()
            .iter()
            .map(|d| d["n"].as_i64().unwrap())
            .collect();
        assert_eq!(order, vec![0, 1, 2, 3, 4]);
    }
}
