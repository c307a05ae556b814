/// Health endpoints
///
/// `/` answers with the plain-text banner the landing page front end pings;
/// `/health` is a readiness probe that also checks the database.
use crate::context::AppContext;
use axum::{extract::State, http::StatusCode, response::Json, routing::get, Router};

/// Text returned by the root route
pub const HEALTH_TEXT: &str = "Landing Page is running";

/// Build health check routes
pub fn routes() -> Router<AppContext> {
    Router::new()
        .route("/", get(root))
        .route("/health", get(readiness_probe))
}

/// Root route
pub async fn root() -> &'static str {
    HEALTH_TEXT
}

/// Readiness probe
///
/// Returns 200 when the database answers, 503 otherwise.
pub async fn readiness_probe(
    State(ctx): State<AppContext>,
) -> Result<Json<serde_json::Value>, StatusCode> {
    if let Err(e) = crate::db::test_connection(&ctx.db).await {
        tracing::warn!(error = %e, "readiness_probe_failed: database check failed");
        return Err(StatusCode::SERVICE_UNAVAILABLE);
    }

    Ok(Json(serde_json::json!({
        "status": "ready",
        "version": env!("CARGO_PKG_VERSION"),
        "blobstore": ctx.blob_store.name(),
    })))
}
