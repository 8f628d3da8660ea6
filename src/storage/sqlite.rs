use crate::models::{LinkPatch, NewLink, NewScan, ScanEvent, ShortLink};
use crate::storage::{LinkStore, ScanStore, StorageError, StorageResult};
use anyhow::Result;
use async_trait::async_trait;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use std::sync::Arc;

pub struct SqliteStorage {
    pool: Arc<SqlitePool>,
}

impl SqliteStorage {
    pub async fn new(database_url: &str, max_connections: u32) -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        Ok(Self {
            pool: Arc::new(pool),
        })
    }
}

#[async_trait]
impl LinkStore for SqliteStorage {
    async fn init(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS links (
                id TEXT PRIMARY KEY,
                destination_url TEXT NOT NULL,
                owner_id TEXT NOT NULL,
                archived INTEGER NOT NULL DEFAULT 0,
                image_ref TEXT,
                created_at INTEGER NOT NULL,
                updated_at INTEGER NOT NULL
            )
            "#,
        )
        .execute(self.pool.as_ref())
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_links_owner ON links(owner_id)")
            .execute(self.pool.as_ref())
            .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS scans (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                link_id TEXT NOT NULL REFERENCES links(id) ON DELETE CASCADE,
                timestamp INTEGER NOT NULL,
                ip TEXT NOT NULL,
                user_agent TEXT NOT NULL,
                country TEXT,
                region TEXT,
                city TEXT,
                source TEXT,
                medium TEXT,
                device TEXT,
                browser TEXT,
                scan_type TEXT
            )
            "#,
        )
        .execute(self.pool.as_ref())
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_scans_link ON scans(link_id, timestamp)")
            .execute(self.pool.as_ref())
            .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS admins (
                user_id TEXT PRIMARY KEY,
                promoted_at INTEGER NOT NULL
            )
            "#,
        )
        .execute(self.pool.as_ref())
        .await?;

        Ok(())
    }

    async fn create(&self, link: &NewLink<'_>) -> StorageResult<ShortLink> {
        let now = chrono::Utc::now().timestamp();

        let result = sqlx::query(
            r#"
            INSERT INTO links (id, destination_url, owner_id, archived, created_at, updated_at)
            VALUES (?, ?, ?, 0, ?, ?)
            ON CONFLICT(id) DO NOTHING
            "#,
        )
        .bind(link.id)
        .bind(link.destination_url)
        .bind(link.owner_id)
        .bind(now)
        .bind(now)
        .execute(self.pool.as_ref())
        .await
        .map_err(|e| StorageError::Other(e.into()))?;

        if result.rows_affected() == 0 {
            return Err(StorageError::Conflict);
        }

        let row = sqlx::query_as::<_, ShortLink>(
            r#"
            SELECT id, destination_url, owner_id, archived, image_ref, created_at, updated_at
            FROM links
            WHERE id = ?
            "#,
        )
        .bind(link.id)
        .fetch_one(self.pool.as_ref())
        .await
        .map_err(|e| StorageError::Other(e.into()))?;

        Ok(row)
    }

    async fn get(&self, id: &str) -> Result<Option<ShortLink>> {
        let row = sqlx::query_as::<_, ShortLink>(
            r#"
            SELECT id, destination_url, owner_id, archived, image_ref, created_at, updated_at
            FROM links
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(row)
    }

    async fn update(&self, id: &str, patch: &LinkPatch) -> Result<Option<ShortLink>> {
        let now = chrono::Utc::now().timestamp();

        let result = sqlx::query(
            r#"
            UPDATE links
            SET destination_url = COALESCE(?, destination_url),
                archived = COALESCE(?, archived),
                image_ref = COALESCE(?, image_ref),
                updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(patch.destination_url.as_deref())
        .bind(patch.archived)
        .bind(patch.image_ref.as_deref())
        .bind(now)
        .bind(id)
        .execute(self.pool.as_ref())
        .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }

        self.get(id).await
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        // Explicit transactional cascade; not every SQLite connection has
        // foreign_keys enabled.
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM scans WHERE link_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query("DELETE FROM links WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(result.rows_affected() > 0)
    }

    async fn list(
        &self,
        owner: Option<&str>,
        include_archived: bool,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<ShortLink>> {
        let rows = match owner {
            Some(owner_id) => {
                sqlx::query_as::<_, ShortLink>(
                    r#"
                    SELECT id, destination_url, owner_id, archived, image_ref, created_at, updated_at
                    FROM links
                    WHERE owner_id = ? AND (archived = 0 OR ?)
                    ORDER BY created_at DESC
                    LIMIT ? OFFSET ?
                    "#,
                )
                .bind(owner_id)
                .bind(include_archived)
                .bind(limit)
                .bind(offset)
                .fetch_all(self.pool.as_ref())
                .await?
            }
            None => {
                sqlx::query_as::<_, ShortLink>(
                    r#"
                    SELECT id, destination_url, owner_id, archived, image_ref, created_at, updated_at
                    FROM links
                    WHERE archived = 0 OR ?
                    ORDER BY created_at DESC
                    LIMIT ? OFFSET ?
                    "#,
                )
                .bind(include_archived)
                .bind(limit)
                .bind(offset)
                .fetch_all(self.pool.as_ref())
                .await?
            }
        };

        Ok(rows)
    }

    async fn is_admin(&self, user_id: &str) -> Result<bool> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM admins WHERE user_id = ?")
            .bind(user_id)
            .fetch_one(self.pool.as_ref())
            .await?;

        Ok(count > 0)
    }

    async fn promote_admin(&self, user_id: &str) -> Result<()> {
        let now = chrono::Utc::now().timestamp();

        sqlx::query(
            r#"
            INSERT INTO admins (user_id, promoted_at)
            VALUES (?, ?)
            ON CONFLICT (user_id) DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(now)
        .execute(self.pool.as_ref())
        .await?;

        Ok(())
    }

    async fn demote_admin(&self, user_id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM admins WHERE user_id = ?")
            .bind(user_id)
            .execute(self.pool.as_ref())
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_admins(&self) -> Result<Vec<String>> {
        let admins =
            sqlx::query_scalar::<_, String>("SELECT user_id FROM admins ORDER BY promoted_at DESC")
                .fetch_all(self.pool.as_ref())
                .await?;

        Ok(admins)
    }
}

#[async_trait]
impl ScanStore for SqliteStorage {
    async fn insert(&self, scan: &NewScan) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO scans (
                link_id, timestamp, ip, user_agent,
                country, region, city,
                source, medium, device, browser, scan_type
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&scan.link_id)
        .bind(scan.timestamp)
        .bind(&scan.ip)
        .bind(&scan.user_agent)
        .bind(scan.country.as_deref())
        .bind(scan.region.as_deref())
        .bind(scan.city.as_deref())
        .bind(scan.source.as_deref())
        .bind(scan.medium.as_deref())
        .bind(scan.device.as_deref())
        .bind(scan.browser.as_deref())
        .bind(scan.scan_type.as_deref())
        .execute(self.pool.as_ref())
        .await?;

        Ok(())
    }

    async fn list_by_link(&self, link_id: &str, limit: i64) -> Result<Vec<ScanEvent>> {
        let rows = sqlx::query_as::<_, ScanEvent>(
            r#"
            SELECT id, link_id, timestamp, ip, user_agent,
                   country, region, city,
                   source, medium, device, browser, scan_type
            FROM scans
            WHERE link_id = ?
            ORDER BY timestamp DESC, id DESC
            LIMIT ?
            "#,
        )
        .bind(link_id)
        .bind(limit)
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(rows)
    }
}
