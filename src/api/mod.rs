//! API module
//!
//! Contains HTTP request handlers and the route table

pub mod chat;
pub mod health;
pub mod listings;

use crate::services::images::UPLOADS_PREFIX;
use crate::state::AppState;
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::services::ServeDir;

/// Build the application routes
///
/// Uploaded images are served read-only under `/uploads`.
pub fn router(state: AppState) -> Router {
    let images = state.listings.images();
    let upload_dir = images.dir().to_path_buf();
    let body_limit = images.body_limit();

    Router::new()
        // Health check and hello world
        .route("/", get(health::hello_world))
        .route("/api/health", get(health::health_check))
        // Listings API
        .route(
            "/api/listings",
            get(listings::list_listings).post(listings::create_listing),
        )
        .route("/api/listings/search", get(listings::search_listings))
        .route(
            "/api/listings/:id",
            get(listings::get_listing)
                .put(listings::update_listing)
                .delete(listings::delete_listing),
        )
        // Chat proxy
        .route("/api/chat", post(chat::chat))
        // Static images
        .nest_service(&format!("/{}", UPLOADS_PREFIX), ServeDir::new(upload_dir))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}
