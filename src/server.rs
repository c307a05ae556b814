/// HTTP server setup and routing
use crate::{
    blob_store::STATIC_PREFIX,
    config::CorsConfig,
    context::AppContext,
    error::{LandingError, LandingResult},
};
use axum::{
    extract::{DefaultBodyLimit, Request},
    http::{header, HeaderValue, Method, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Json, Response},
    Router,
};
use serde_json::json;
use std::any::Any;
use tower::Layer;
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::{AllowOrigin, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};
use tracing::info;

/// Build the main application router
pub fn build_router(ctx: AppContext) -> Router {
    with_layers(ctx, crate::api::routes())
}

/// Mount static images and wrap `routes` in the service-wide layers
fn with_layers(ctx: AppContext, routes: Router<AppContext>) -> Router {
    let cors = cors_layer(&ctx.config.cors);
    let upload_limit = ctx.config.service.upload_limit;

    let mut router = routes;

    // Uploaded images are only served locally when they live on disk
    if let Some(dir) = ctx.static_dir() {
        let images = middleware::from_fn(hide_dot_files).layer(ServeDir::new(dir));
        router = router.nest_service(STATIC_PREFIX, images);
    }

    router
        .fallback(not_found)
        .with_state(ctx)
        .layer(DefaultBodyLimit::max(upload_limit))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .layer(CatchPanicLayer::custom(handle_panic))
}

/// 404 for dot-prefixed names, which covers in-progress staging writes
async fn hide_dot_files(request: Request, next: Next) -> Response {
    let hidden = request.uri().path().split('/').any(|segment| {
        let segment = segment.to_ascii_lowercase();
        segment.starts_with('.') || segment.starts_with("%2e")
    });

    if hidden {
        return StatusCode::NOT_FOUND.into_response();
    }

    next.run(request).await
}

/// CORS allow-list with credentials
fn cors_layer(config: &CorsConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::ACCEPT])
        .allow_credentials(true)
}

/// 404 handler
async fn not_found() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "error": "NotFound",
            "message": "Endpoint not found"
        })),
    )
}

/// Last-resort handler for panics escaping a route
fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic".to_string()
    };

    tracing::error!("Handler panicked: {}", detail);

    LandingError::Internal(detail).into_response()
}

/// Start the HTTP server
pub async fn serve(ctx: AppContext) -> LandingResult<()> {
    let addr = ctx.config.bind_address();

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| LandingError::Internal(format!("Failed to bind to {}: {}", addr, e)))?;

    info!("Landing Page is running on {}", addr);
    info!("   Blob storage: {}", ctx.blob_store.name());

    let app = build_router(ctx.clone());

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| LandingError::Internal(format!("Server error: {}", e)))?;

    ctx.shutdown().await;

    Ok(())
}

/// Resolve on Ctrl-C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
