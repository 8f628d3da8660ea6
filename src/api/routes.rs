use axum::{
    routing::{delete, get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;

use super::handlers::{
    create_link, delete_link, get_link, health_check, link_analytics, list_links, update_link,
    AppState,
};
use crate::service::LinkService;

pub fn create_api_router(service: LinkService) -> Router {
    let state = Arc::new(AppState { service });

    Router::new()
        .route("/health", get(health_check))
        .route("/api/links", post(create_link))
        .route("/api/links", get(list_links))
        .route("/api/links/{id}", get(get_link))
        .route("/api/links/{id}", put(update_link))
        .route("/api/links/{id}", delete(delete_link))
        .route("/api/links/{id}/analytics", get(link_analytics))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
