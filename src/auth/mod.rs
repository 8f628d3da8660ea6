//! Identity collaborator.
//!
//! Token verification and session management belong to an upstream auth
//! layer; by the time a request reaches this service the caller is an opaque
//! user id in the `x-user-id` header. The only identity question answered
//! here is "is this id an admin", backed by the store's admins table.

use anyhow::Result;
use async_trait::async_trait;
use axum::http::HeaderMap;
use std::sync::Arc;

use crate::storage::LinkStore;

pub const USER_ID_HEADER: &str = "x-user-id";

/// The authenticated caller, as asserted by the upstream auth layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerIdentity {
    pub user_id: String,
}

/// Extract the opaque caller id; `None` means the request is unauthenticated.
pub fn caller_from_headers(headers: &HeaderMap) -> Option<CallerIdentity> {
    headers
        .get(USER_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(|user_id| CallerIdentity {
            user_id: user_id.to_string(),
        })
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Whether the given opaque user id carries the admin role.
    async fn is_admin(&self, user_id: &str) -> Result<bool>;
}

/// Identity provider backed by the link store's admins table.
pub struct StoreIdentity {
    links: Arc<dyn LinkStore>,
}

impl StoreIdentity {
    pub fn new(links: Arc<dyn LinkStore>) -> Self {
        Self { links }
    }
}

#[async_trait]
impl IdentityProvider for StoreIdentity {
    async fn is_admin(&self, user_id: &str) -> Result<bool> {
        self.links.is_admin(user_id).await
    }
}
