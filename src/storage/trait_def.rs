use crate::models::{LinkPatch, NewLink, NewScan, ScanEvent, ShortLink};
use anyhow::Result;
use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("short id already exists")]
    Conflict,
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Durable mapping from short id to destination URL and metadata.
///
/// `create` must be atomic create-if-absent: a duplicate id fails with
/// `StorageError::Conflict` regardless of any earlier existence probe. Reads
/// distinguish "absent" (`Ok(None)`) from a transient store failure (`Err`).
#[async_trait]
pub trait LinkStore: Send + Sync {
    /// Initialize the storage (create tables, etc.)
    async fn init(&self) -> Result<()>;

    /// Insert a new link; fails with `Conflict` if the id is taken.
    async fn create(&self, link: &NewLink<'_>) -> StorageResult<ShortLink>;

    /// Fetch a link by short id.
    async fn get(&self, id: &str) -> Result<Option<ShortLink>>;

    /// Apply a partial update; returns the updated row, or `None` if the id
    /// does not exist. Only destination/archived/image fields mutate.
    async fn update(&self, id: &str, patch: &LinkPatch) -> Result<Option<ShortLink>>;

    /// Delete a link and all of its scan events; returns whether a row
    /// existed.
    async fn delete(&self, id: &str) -> Result<bool>;

    /// List links, newest first. `owner` of `None` lists across all owners
    /// (admin callers only — authorization is the caller's job). Archived
    /// links are excluded unless `include_archived` is set.
    async fn list(
        &self,
        owner: Option<&str>,
        include_archived: bool,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<ShortLink>>;

    /// Whether the given opaque user id has been promoted to admin.
    async fn is_admin(&self, user_id: &str) -> Result<bool>;

    /// Promote a user to admin (idempotent).
    async fn promote_admin(&self, user_id: &str) -> Result<()>;

    /// Demote a user from admin; returns whether they were one.
    async fn demote_admin(&self, user_id: &str) -> Result<bool>;

    /// List all promoted admins.
    async fn list_admins(&self) -> Result<Vec<String>>;
}

/// Append-only scan event log, subordinate to `LinkStore`.
#[async_trait]
pub trait ScanStore: Send + Sync {
    /// Persist one scan event.
    async fn insert(&self, scan: &NewScan) -> Result<()>;

    /// List scan events for a link, newest first.
    async fn list_by_link(&self, link_id: &str, limit: i64) -> Result<Vec<ScanEvent>>;
}
