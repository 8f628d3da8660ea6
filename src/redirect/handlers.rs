use axum::{
    extract::{Path, State},
    http::{header::HeaderMap, StatusCode},
    response::{IntoResponse, Redirect},
};
use std::sync::Arc;

use super::resolver::{RedirectResolver, Resolution};
use crate::scan::RequestContext;

pub struct RedirectState {
    pub resolver: RedirectResolver,
}

/// Resolve a short id and redirect to its destination.
///
/// Destinations are mutable, so the redirect is a 307 — clients must not
/// cache the mapping. An unknown id routes to the not-found page; a store
/// failure is a 500 the caller may retry, distinct from not-found.
pub async fn redirect(
    State(state): State<Arc<RedirectState>>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> impl IntoResponse {
    let ctx = RequestContext::from_headers(&headers);

    match state.resolver.resolve(&id, ctx).await {
        Ok(Resolution::Found { destination }) => Redirect::temporary(&destination).into_response(),
        Ok(Resolution::NotFound) => Redirect::temporary("/not-found").into_response(),
        Err(err) => {
            tracing::error!(%id, error = %err, "link lookup failed");
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response()
        }
    }
}

/// Terminal page for unknown short ids.
pub async fn not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, "Short link not found")
}

/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}
