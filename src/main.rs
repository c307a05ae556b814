/// Landing Page content service
///
/// Serves the booking, news, video and card collections behind the landing
/// page, with image uploads for cards stored on disk or on a remote image
/// host.

mod api;
mod blob_store;
mod cards;
mod config;
mod context;
mod db;
mod error;
mod server;
#[cfg(test)]
mod testing;

use config::ServerConfig;
use context::AppContext;
use error::LandingResult;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> LandingResult<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "landing_server=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = ServerConfig::from_env()?;
    tracing::debug!("Log level: {}", config.logging.level);

    // Create application context
    let ctx = AppContext::new(config).await?;

    // Start server
    server::serve(ctx).await?;

    Ok(())
}
