use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// One recorded resolution of a short link, with derived context.
///
/// `ip` and `user_agent` are `"unknown"` rather than NULL when the request
/// carried no usable value; the geo and classification columns are NULL when
/// the data genuinely was not available.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ScanEvent {
    pub id: i64,
    pub link_id: String,
    pub timestamp: i64,
    pub ip: String,
    pub user_agent: String,
    pub country: Option<String>,
    pub region: Option<String>,
    pub city: Option<String>,
    pub source: Option<String>,
    pub medium: Option<String>,
    pub device: Option<String>,
    pub browser: Option<String>,
    /// QR-scan vs plain-click classification. Nullable and currently never
    /// populated; no authoritative detection rule exists.
    pub scan_type: Option<String>,
}

/// A scan event ready for insertion; the store assigns `id`.
#[derive(Debug, Clone)]
pub struct NewScan {
    pub link_id: String,
    pub timestamp: i64,
    pub ip: String,
    pub user_agent: String,
    pub country: Option<String>,
    pub region: Option<String>,
    pub city: Option<String>,
    pub source: Option<String>,
    pub medium: Option<String>,
    pub device: Option<String>,
    pub browser: Option<String>,
    pub scan_type: Option<String>,
}
