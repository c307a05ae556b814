/// Generic per-collection CRUD routes
///
/// `GET /{collection}`, `POST /{collection}` and `DELETE /{collection}/:id`
/// for every collection, with the card collection's create and delete
/// routed through the ingestion workflow.
use crate::{
    api::card,
    context::AppContext,
    db::documents::{Collection, DeleteResult, Document, InsertResult},
    error::{LandingError, LandingResult},
};
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    routing::{delete, get, post, MethodRouter},
    Json, Router,
};
use serde_json::{json, Value};

/// Build the routes for one collection
pub fn routes(collection: Collection) -> Router<AppContext> {
    let create: MethodRouter<AppContext> = match collection {
        Collection::Card => post(card::create_card),
        Collection::Video => post(
            move |State(ctx): State<AppContext>, payload: Result<Json<Value>, JsonRejection>| {
                insert_acknowledged(ctx, collection, payload)
            },
        ),
        _ => post(
            move |State(ctx): State<AppContext>, payload: Result<Json<Value>, JsonRejection>| {
                insert_document(ctx, collection, payload)
            },
        ),
    };

    let remove: MethodRouter<AppContext> = match collection {
        Collection::Card => delete(card::delete_card),
        _ => delete(move |State(ctx): State<AppContext>, Path(id): Path<String>| {
            delete_document(ctx, collection, id)
        }),
    };

    let list = get(move |State(ctx): State<AppContext>| list_documents(ctx, collection));

    Router::new()
        .route(&format!("/{}", collection), list.merge(create))
        .route(&format!("/{}/:id", collection), remove)
}

/// List every document of a collection
async fn list_documents(ctx: AppContext, collection: Collection) -> LandingResult<Json<Vec<Document>>> {
    let documents = ctx.documents.list_all(collection).await?;
    Ok(Json(documents))
}

/// Insert a JSON object and return the store's insert result
async fn insert_document(
    ctx: AppContext,
    collection: Collection,
    payload: Result<Json<Value>, JsonRejection>,
) -> LandingResult<(StatusCode, Json<InsertResult>)> {
    let document = into_document(payload)?;
    let result = ctx.documents.insert_one(collection, document).await?;

    tracing::info!("Added {} to {}", result.inserted_id, collection);

    Ok((StatusCode::CREATED, Json(result)))
}

/// Insert a JSON object, failing with 400 when the store does not acknowledge it
async fn insert_acknowledged(
    ctx: AppContext,
    collection: Collection,
    payload: Result<Json<Value>, JsonRejection>,
) -> LandingResult<(StatusCode, Json<Value>)> {
    let document = into_document(payload)?;
    let result = ctx.documents.insert_one(collection, document).await?;

    if !result.acknowledged {
        return Err(LandingError::NotAcknowledged(format!(
            "Failed to add {}",
            collection
        )));
    }

    tracing::info!("Added {} to {}", result.inserted_id, collection);

    Ok((
        StatusCode::CREATED,
        Json(json!({ "insertedId": result.inserted_id })),
    ))
}

/// Delete one document; a missing id reports a zero count
async fn delete_document(
    ctx: AppContext,
    collection: Collection,
    id: String,
) -> LandingResult<Json<DeleteResult>> {
    let result = ctx.documents.delete_one(collection, &id).await?;

    tracing::info!("Deleted {} from {} (count {})", id, collection, result.deleted_count);

    Ok(Json(result))
}

/// Accept only JSON objects as documents
fn into_document(payload: Result<Json<Value>, JsonRejection>) -> LandingResult<Document> {
    let Json(value) = payload.map_err(|e| LandingError::Validation(e.body_text()))?;

    match value {
        Value::Object(document) => Ok(document),
        _ => Err(LandingError::Validation(
            "Request body must be a JSON object".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_into_document_rejects_non_objects() {
        assert!(into_document(Ok(Json(json!([1, 2])))).is_err());
        assert!(into_document(Ok(Json(json!("text")))).is_err());
        assert!(into_document(Ok(Json(Value::Null))).is_err());

        let document = into_document(Ok(Json(json!({"name": "A"})))).unwrap();
        assert_eq!(document["name"], "A");
    }

    #[test]
    fn test_routes_created() {
        for collection in Collection::ALL {
            let _router = routes(collection);
        }
    }
}
