use axum::{routing::get, Router};
use std::sync::Arc;

use super::handlers::{health_check, not_found, redirect, RedirectState};
use super::resolver::RedirectResolver;

pub fn create_redirect_router(resolver: RedirectResolver) -> Router {
    let state = Arc::new(RedirectState { resolver });

    Router::new()
        .route("/", get(health_check))
        .route("/not-found", get(not_found))
        .route("/{id}", get(redirect))
        .with_state(state)
}
