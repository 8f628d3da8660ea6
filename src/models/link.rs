use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A short link row. The `id` is the short identifier itself, whether
/// system-generated or a user-chosen custom path.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ShortLink {
    pub id: String,
    pub destination_url: String,
    pub owner_id: String,
    pub archived: bool,
    /// Opaque reference to the rendered QR artifact (a data URL).
    pub image_ref: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Fields for inserting a new link. `id` has already been validated or
/// generated by the caller.
#[derive(Debug, Clone)]
pub struct NewLink<'a> {
    pub id: &'a str,
    pub destination_url: &'a str,
    pub owner_id: &'a str,
}

/// Partial update applied to an existing link. Only these three fields are
/// mutable; `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default)]
pub struct LinkPatch {
    pub destination_url: Option<String>,
    pub archived: Option<bool>,
    pub image_ref: Option<String>,
}

impl LinkPatch {
    pub fn is_empty(&self) -> bool {
        self.destination_url.is_none() && self.archived.is_none() && self.image_ref.is_none()
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateLinkRequest {
    pub destination_url: String,
    pub custom_path: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateLinkRequest {
    pub destination_url: Option<String>,
    pub archived: Option<bool>,
}
