use crate::models::{LinkPatch, NewLink, ShortLink};
use crate::storage::{LinkStore, StorageResult};
use anyhow::Result;
use async_trait::async_trait;
use moka::future::Cache;
use std::sync::Arc;
use std::time::Duration;

/// Read-caching wrapper over a `LinkStore`.
///
/// Negative lookups are cached too (`None` entries), so hot misses do not hit
/// the database on every request. Any mutation of a link invalidates or
/// replaces its cache entry; `archived` and `destination_url` changes must
/// never serve stale.
pub struct CachedStorage {
    inner: Arc<dyn LinkStore>,
    read_cache: Cache<String, Option<ShortLink>>,
}

impl CachedStorage {
    pub fn new(inner: Arc<dyn LinkStore>, max_cache_entries: u64) -> Self {
        let read_cache = Cache::builder()
            .max_capacity(max_cache_entries)
            .time_to_live(Duration::from_secs(300))
            .build();

        Self { inner, read_cache }
    }
}

#[async_trait]
impl LinkStore for CachedStorage {
    async fn init(&self) -> Result<()> {
        self.inner.init().await
    }

    async fn create(&self, link: &NewLink<'_>) -> StorageResult<ShortLink> {
        let created = self.inner.create(link).await?;

        // A negative entry may exist from a lookup that raced the create.
        self.read_cache
            .insert(created.id.clone(), Some(created.clone()))
            .await;

        Ok(created)
    }

    async fn get(&self, id: &str) -> Result<Option<ShortLink>> {
        if let Some(cached) = self.read_cache.get(id).await {
            return Ok(cached);
        }

        let result = self.inner.get(id).await?;

        self.read_cache
            .insert(id.to_string(), result.clone())
            .await;

        Ok(result)
    }

    async fn update(&self, id: &str, patch: &LinkPatch) -> Result<Option<ShortLink>> {
        let updated = self.inner.update(id, patch).await?;

        match &updated {
            Some(link) => {
                self.read_cache
                    .insert(id.to_string(), Some(link.clone()))
                    .await;
            }
            None => self.read_cache.invalidate(id).await,
        }

        Ok(updated)
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        let deleted = self.inner.delete(id).await?;
        self.read_cache.invalidate(id).await;
        Ok(deleted)
    }

    async fn list(
        &self,
        owner: Option<&str>,
        include_archived: bool,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<ShortLink>> {
        self.inner.list(owner, include_archived, limit, offset).await
    }

    async fn is_admin(&self, user_id: &str) -> Result<bool> {
        self.inner.is_admin(user_id).await
    }

    async fn promote_admin(&self, user_id: &str) -> Result<()> {
        self.inner.promote_admin(user_id).await
    }

    async fn demote_admin(&self, user_id: &str) -> Result<bool> {
        self.inner.demote_admin(user_id).await
    }

    async fn list_admins(&self) -> Result<Vec<String>> {
        self.inner.list_admins().await
    }
}
