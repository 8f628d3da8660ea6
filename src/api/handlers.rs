use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::auth::{caller_from_headers, CallerIdentity};
use crate::models::{CreateLinkRequest, ScanEvent, ShortLink, UpdateLinkRequest};
use crate::service::{LinkError, LinkService};

pub struct AppState {
    pub service: LinkService,
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Serialize)]
pub struct LinkResponse {
    #[serde(flatten)]
    pub link: ShortLink,
    pub short_url: String,
}

#[derive(Serialize)]
pub struct AnalyticsResponse {
    #[serde(flatten)]
    pub link: ShortLink,
    pub short_url: String,
    pub scans: Vec<ScanEvent>,
}

#[derive(Deserialize)]
pub struct ListQuery {
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
    #[serde(default)]
    pub include_archived: bool,
    /// Admin-only: list links across all owners.
    #[serde(default)]
    pub all: bool,
}

#[derive(Deserialize)]
pub struct AnalyticsQuery {
    #[serde(default = "default_scan_limit")]
    pub limit: i64,
}

fn default_limit() -> i64 {
    50
}

fn default_scan_limit() -> i64 {
    500
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
}

fn map_error(err: LinkError) -> ApiError {
    let status = match &err {
        LinkError::NotFound => StatusCode::NOT_FOUND,
        LinkError::AlreadyExists => StatusCode::CONFLICT,
        LinkError::Forbidden => StatusCode::FORBIDDEN,
        LinkError::Validation(_) => StatusCode::BAD_REQUEST,
        LinkError::GenerationExhausted | LinkError::Render(_) | LinkError::Store(_) => {
            tracing::error!(error = %err, "link operation failed");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    error(status, err.to_string())
}

fn caller(headers: &HeaderMap) -> Result<CallerIdentity, ApiError> {
    caller_from_headers(headers)
        .ok_or_else(|| error(StatusCode::UNAUTHORIZED, "missing caller identity"))
}

/// Create a new short link, optionally with a custom path.
pub async fn create_link(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(payload): Json<CreateLinkRequest>,
) -> Result<(StatusCode, Json<LinkResponse>), ApiError> {
    let caller = caller(&headers)?;

    let link = state
        .service
        .create(
            &caller.user_id,
            &payload.destination_url,
            payload.custom_path.as_deref(),
        )
        .await
        .map_err(map_error)?;

    let short_url = state.service.short_url(&link.id);
    Ok((StatusCode::CREATED, Json(LinkResponse { link, short_url })))
}

/// Fetch a single link.
pub async fn get_link(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<LinkResponse>, ApiError> {
    let caller = caller(&headers)?;

    let link = state
        .service
        .get(&caller.user_id, &id)
        .await
        .map_err(map_error)?;

    let short_url = state.service.short_url(&link.id);
    Ok(Json(LinkResponse { link, short_url }))
}

/// Update destination URL and/or archived flag.
pub async fn update_link(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(payload): Json<UpdateLinkRequest>,
) -> Result<Json<LinkResponse>, ApiError> {
    let caller = caller(&headers)?;

    let link = state
        .service
        .update(&caller.user_id, &id, payload.destination_url, payload.archived)
        .await
        .map_err(map_error)?;

    let short_url = state.service.short_url(&link.id);
    Ok(Json(LinkResponse { link, short_url }))
}

/// Delete a link and its scan history.
pub async fn delete_link(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let caller = caller(&headers)?;

    state
        .service
        .delete(&caller.user_id, &id)
        .await
        .map_err(map_error)?;

    Ok(StatusCode::NO_CONTENT)
}

/// List the caller's links (or every owner's, for admins with `all=true`).
pub async fn list_links(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<LinkResponse>>, ApiError> {
    let caller = caller(&headers)?;
    let limit = query.limit.clamp(1, 500);

    let links = state
        .service
        .list(
            &caller.user_id,
            query.all,
            query.include_archived,
            limit,
            query.offset.max(0),
        )
        .await
        .map_err(map_error)?;

    let response = links
        .into_iter()
        .map(|link| {
            let short_url = state.service.short_url(&link.id);
            LinkResponse { link, short_url }
        })
        .collect();

    Ok(Json(response))
}

/// A link plus its recorded scans, newest first.
pub async fn link_analytics(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Query(query): Query<AnalyticsQuery>,
) -> Result<Json<AnalyticsResponse>, ApiError> {
    let caller = caller(&headers)?;
    let limit = query.limit.clamp(1, 1000);

    let (link, scans) = state
        .service
        .analytics(&caller.user_id, &id, limit)
        .await
        .map_err(map_error)?;

    let short_url = state.service.short_url(&link.id);
    Ok(Json(AnalyticsResponse {
        link,
        short_url,
        scans,
    }))
}

/// Health check endpoint
pub async fn health_check() -> (StatusCode, &'static str) {
    (StatusCode::OK, "OK")
}
