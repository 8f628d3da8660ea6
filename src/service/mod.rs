//! Link lifecycle service.
//!
//! Owns validation, short-id assignment, QR artifact attachment, and the
//! owner/admin authorization rule shared by update, delete, and analytics
//! reads. Storage and identity are injected; nothing here reaches for
//! ambient globals.

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info};

use crate::auth::IdentityProvider;
use crate::models::{LinkPatch, NewLink, ScanEvent, ShortLink};
use crate::qr::QrRenderer;
use crate::shortid::{
    self, CandidateSource, TimeSeededSource, ValidationError, MAX_GENERATION_ATTEMPTS,
};
use crate::storage::{LinkStore, ScanStore, StorageError};

#[derive(Debug, Error)]
pub enum LinkError {
    #[error("link not found")]
    NotFound,
    #[error("short id already in use")]
    AlreadyExists,
    #[error("caller is neither owner nor admin")]
    Forbidden,
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("could not generate a unique short id after {MAX_GENERATION_ATTEMPTS} attempts")]
    GenerationExhausted,
    #[error("failed to render QR image")]
    Render(#[source] anyhow::Error),
    #[error(transparent)]
    Store(anyhow::Error),
}

impl From<StorageError> for LinkError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Conflict => LinkError::AlreadyExists,
            StorageError::Other(e) => LinkError::Store(e),
        }
    }
}

impl From<anyhow::Error> for LinkError {
    fn from(err: anyhow::Error) -> Self {
        LinkError::Store(err)
    }
}

pub struct LinkService {
    links: Arc<dyn LinkStore>,
    scans: Arc<dyn ScanStore>,
    identity: Arc<dyn IdentityProvider>,
    qr: Arc<dyn QrRenderer>,
    ids: Box<dyn CandidateSource>,
    base_url: String,
}

impl LinkService {
    pub fn new(
        links: Arc<dyn LinkStore>,
        scans: Arc<dyn ScanStore>,
        identity: Arc<dyn IdentityProvider>,
        qr: Arc<dyn QrRenderer>,
        base_url: String,
    ) -> Self {
        Self {
            links,
            scans,
            identity,
            qr,
            ids: Box::new(TimeSeededSource),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Replace the candidate source (tests force collisions through this).
    pub fn with_candidate_source(mut self, ids: Box<dyn CandidateSource>) -> Self {
        self.ids = ids;
        self
    }

    /// The externally advertised URL for a short id.
    pub fn short_url(&self, id: &str) -> String {
        format!("{}/{}", self.base_url, id)
    }

    /// Create a link for `owner_id`, with either a validated custom path or a
    /// generated id, then attach the rendered QR artifact.
    pub async fn create(
        &self,
        owner_id: &str,
        destination_url: &str,
        custom_path: Option<&str>,
    ) -> Result<ShortLink, LinkError> {
        shortid::validate_destination(destination_url)?;

        let link = match custom_path {
            Some(path) => {
                shortid::validate_custom_path(path)?;
                self.links
                    .create(&NewLink {
                        id: path,
                        destination_url,
                        owner_id,
                    })
                    .await?
            }
            None => self.create_with_generated_id(destination_url, owner_id).await?,
        };

        info!(id = %link.id, owner = %owner_id, "created short link");

        // The id is claimed; render the QR artifact against the public URL
        // and attach it.
        let image_ref = self
            .qr
            .render(&self.short_url(&link.id))
            .map_err(LinkError::Render)?;

        let updated = self
            .links
            .update(
                &link.id,
                &LinkPatch {
                    image_ref: Some(image_ref),
                    ..Default::default()
                },
            )
            .await?;

        // The row was inserted moments ago; treat a vanished row as a store
        // inconsistency rather than NotFound.
        updated.ok_or_else(|| {
            LinkError::Store(anyhow::anyhow!("link {} disappeared during creation", link.id))
        })
    }

    /// Generated ids share a namespace with custom paths, so collisions are
    /// possible and the store's unique constraint is the arbiter: the
    /// existence probe only skips obviously-taken candidates cheaply, and a
    /// concurrent insert between probe and create surfaces as `Conflict`,
    /// which counts as a failed attempt.
    async fn create_with_generated_id(
        &self,
        destination_url: &str,
        owner_id: &str,
    ) -> Result<ShortLink, LinkError> {
        for attempt in 1..=MAX_GENERATION_ATTEMPTS {
            let candidate = self.ids.candidate();

            if self.links.get(&candidate).await?.is_some() {
                debug!(%candidate, attempt, "generated id already taken, retrying");
                continue;
            }

            match self
                .links
                .create(&NewLink {
                    id: &candidate,
                    destination_url,
                    owner_id,
                })
                .await
            {
                Ok(link) => return Ok(link),
                Err(StorageError::Conflict) => {
                    debug!(%candidate, attempt, "lost creation race, retrying");
                    continue;
                }
                Err(StorageError::Other(e)) => return Err(LinkError::Store(e)),
            }
        }

        Err(LinkError::GenerationExhausted)
    }

    /// Fetch a link the caller may see (owner or admin).
    pub async fn get(&self, caller: &str, id: &str) -> Result<ShortLink, LinkError> {
        let link = self.links.get(id).await?.ok_or(LinkError::NotFound)?;
        self.authorize(caller, &link).await?;
        Ok(link)
    }

    /// Update destination and/or archived flag; owner or admin only.
    pub async fn update(
        &self,
        caller: &str,
        id: &str,
        destination_url: Option<String>,
        archived: Option<bool>,
    ) -> Result<ShortLink, LinkError> {
        let link = self.links.get(id).await?.ok_or(LinkError::NotFound)?;
        self.authorize(caller, &link).await?;

        if let Some(url) = &destination_url {
            shortid::validate_destination(url)?;
        }

        let patch = LinkPatch {
            destination_url,
            archived,
            image_ref: None,
        };
        if patch.is_empty() {
            return Ok(link);
        }

        self.links
            .update(id, &patch)
            .await?
            .ok_or(LinkError::NotFound)
    }

    /// Delete a link and its scan history; owner or admin only.
    pub async fn delete(&self, caller: &str, id: &str) -> Result<(), LinkError> {
        let link = self.links.get(id).await?.ok_or(LinkError::NotFound)?;
        self.authorize(caller, &link).await?;

        if self.links.delete(id).await? {
            info!(%id, "deleted short link");
            Ok(())
        } else {
            Err(LinkError::NotFound)
        }
    }

    /// List the caller's links; admins may list across all owners.
    pub async fn list(
        &self,
        caller: &str,
        all_owners: bool,
        include_archived: bool,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<ShortLink>, LinkError> {
        let owner = if all_owners {
            if !self.identity.is_admin(caller).await? {
                return Err(LinkError::Forbidden);
            }
            None
        } else {
            Some(caller)
        };

        Ok(self
            .links
            .list(owner, include_archived, limit, offset)
            .await?)
    }

    /// The link plus its scan history, newest first; owner or admin only.
    pub async fn analytics(
        &self,
        caller: &str,
        id: &str,
        limit: i64,
    ) -> Result<(ShortLink, Vec<ScanEvent>), LinkError> {
        let link = self.get(caller, id).await?;
        let scans = self.scans.list_by_link(id, limit).await?;
        Ok((link, scans))
    }

    async fn authorize(&self, caller: &str, link: &ShortLink) -> Result<(), LinkError> {
        if link.owner_id == caller || self.identity.is_admin(caller).await? {
            Ok(())
        } else {
            Err(LinkError::Forbidden)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::qr::SvgQrRenderer;
    use crate::storage::SqliteStorage;

    struct FixedSource(String);

    impl CandidateSource for FixedSource {
        fn candidate(&self) -> String {
            self.0.clone()
        }
    }

    async fn service() -> LinkService {
        let storage = Arc::new(SqliteStorage::new("sqlite::memory:", 5).await.unwrap());
        storage.init().await.unwrap();
        let links: Arc<dyn LinkStore> = storage.clone();
        let scans: Arc<dyn ScanStore> = storage;
        let identity = Arc::new(crate::auth::StoreIdentity::new(links.clone()));
        LinkService::new(
            links,
            scans,
            identity,
            Arc::new(SvgQrRenderer::default()),
            "https://sho.rt".to_string(),
        )
    }

    #[tokio::test]
    async fn create_and_lookup_round_trip() {
        let svc = service().await;
        let link = svc
            .create("user-1", "https://example.com", None)
            .await
            .unwrap();

        assert_eq!(link.destination_url, "https://example.com");
        assert_eq!(link.id.len(), crate::shortid::GENERATED_LEN);
        assert_eq!(svc.short_url(&link.id), format!("https://sho.rt/{}", link.id));

        let fetched = svc.get("user-1", &link.id).await.unwrap();
        assert_eq!(fetched.destination_url, "https://example.com");
        assert!(fetched.image_ref.is_some());
    }

    #[tokio::test]
    async fn custom_path_round_trip_and_conflict() {
        let svc = service().await;
        let link = svc
            .create("user-1", "https://example.com", Some("mylink"))
            .await
            .unwrap();
        assert_eq!(link.id, "mylink");

        let err = svc
            .create("user-2", "https://example.org", Some("mylink"))
            .await
            .unwrap_err();
        assert!(matches!(err, LinkError::AlreadyExists));
    }

    #[tokio::test]
    async fn reserved_custom_path_is_rejected_before_any_write() {
        let svc = service().await;
        for path in ["admin", "Admin", "ADMIN"] {
            let err = svc
                .create("user-1", "https://example.com", Some(path))
                .await
                .unwrap_err();
            assert!(matches!(
                err,
                LinkError::Validation(ValidationError::ReservedWord(_))
            ));
        }
        // Nothing got created under any casing.
        assert!(matches!(
            svc.get("user-1", "admin").await.unwrap_err(),
            LinkError::NotFound
        ));
    }

    #[tokio::test]
    async fn malformed_destination_is_rejected() {
        let svc = service().await;
        for destination in ["example.com", "ftp://example.com", ""] {
            assert!(matches!(
                svc.create("user-1", destination, None).await.unwrap_err(),
                LinkError::Validation(_)
            ));
        }
    }

    #[tokio::test]
    async fn generation_exhaustion_after_bounded_attempts() {
        let svc = service()
            .await
            .with_candidate_source(Box::new(FixedSource("stuck1".to_string())));

        // First create claims the only candidate the source will ever emit.
        svc.create("user-1", "https://example.com", None)
            .await
            .unwrap();

        let err = svc
            .create("user-1", "https://example.org", None)
            .await
            .unwrap_err();
        assert!(matches!(err, LinkError::GenerationExhausted));
    }

    #[tokio::test]
    async fn non_owner_cannot_mutate() {
        let svc = service().await;
        let link = svc
            .create("user-1", "https://example.com", Some("owned1"))
            .await
            .unwrap();

        assert!(matches!(
            svc.update("user-2", &link.id, Some("https://evil.example".into()), None)
                .await
                .unwrap_err(),
            LinkError::Forbidden
        ));
        assert!(matches!(
            svc.delete("user-2", &link.id).await.unwrap_err(),
            LinkError::Forbidden
        ));
    }

    #[tokio::test]
    async fn admin_can_mutate_any_link() {
        let svc = service().await;
        let link = svc
            .create("user-1", "https://example.com", Some("owned2"))
            .await
            .unwrap();

        svc.links.promote_admin("root").await.unwrap();

        let updated = svc
            .update("root", &link.id, None, Some(true))
            .await
            .unwrap();
        assert!(updated.archived);

        svc.delete("root", &link.id).await.unwrap();
        assert!(matches!(
            svc.get("user-1", &link.id).await.unwrap_err(),
            LinkError::NotFound
        ));
    }

    #[tokio::test]
    async fn archived_links_are_hidden_from_default_listing() {
        let svc = service().await;
        svc.create("user-1", "https://example.com/a", Some("keep01"))
            .await
            .unwrap();
        let archived = svc
            .create("user-1", "https://example.com/b", Some("hide01"))
            .await
            .unwrap();
        svc.update("user-1", &archived.id, None, Some(true))
            .await
            .unwrap();

        let visible = svc.list("user-1", false, false, 50, 0).await.unwrap();
        assert_eq!(
            visible.iter().map(|l| l.id.as_str()).collect::<Vec<_>>(),
            vec!["keep01"]
        );

        let all = svc.list("user-1", false, true, 50, 0).await.unwrap();
        assert_eq!(all.len(), 2);
    }

    #[tokio::test]
    async fn cross_owner_listing_requires_admin() {
        let svc = service().await;
        svc.create("user-1", "https://example.com", Some("mine01"))
            .await
            .unwrap();
        svc.create("user-2", "https://example.org", Some("their1"))
            .await
            .unwrap();

        assert!(matches!(
            svc.list("user-1", true, false, 50, 0).await.unwrap_err(),
            LinkError::Forbidden
        ));

        svc.links.promote_admin("root").await.unwrap();
        let all = svc.list("root", true, false, 50, 0).await.unwrap();
        assert_eq!(all.len(), 2);
    }
}
