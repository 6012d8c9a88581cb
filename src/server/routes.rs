use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;

use super::{handlers, AppState};

/// CORS is permissive only in debug mode; a production instance exposed
/// beyond localhost has no reason to accept cross-origin requests since
/// there's no browser-based third-party client for this API.
pub fn create_router(state: AppState, debug: bool) -> Router {
    let cors = if debug {
        CorsLayer::permissive()
    } else {
        CorsLayer::new()
    };

    Router::new()
        .route("/health", get(handlers::health))
        .route("/links", get(handlers::list_links).post(handlers::add_link))
        .route("/links/:id", get(handlers::get_link).delete(handlers::remove_link))
        .route("/links/:id/hide", post(handlers::hide_link))
        .route("/search", get(handlers::hybrid_search))
        .route("/search/text", get(handlers::text_search))
        .route("/search/vector", get(handlers::vector_search))
        .route("/crawl", post(handlers::crawl_one))
        .route("/db/status", get(handlers::database_status))
        .layer(cors)
        .with_state(state)
}
