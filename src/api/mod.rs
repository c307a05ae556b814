/// API routes and handlers
pub mod card;
pub mod collections;
pub mod health;

use crate::{context::AppContext, db::Collection};
use axum::Router;

/// Build API routes
pub fn routes() -> Router<AppContext> {
    Collection::ALL
        .into_iter()
        .fold(Router::new().merge(health::routes()), |router, collection| {
            router.merge(collections::routes(collection))
        })
}
