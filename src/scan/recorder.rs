//! Best-effort scan persistence.
//!
//! Recording is telemetry, not a precondition for serving the redirect: the
//! store write runs under a timeout, and every failure mode ends in a log
//! line rather than an error the redirect path could see.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tracing::warn;

use crate::models::NewScan;
use crate::scan::agent::parse_agent;
use crate::scan::classifier::classify;
use crate::scan::context::RequestContext;
use crate::scan::geoip::GeoIpService;
use crate::storage::ScanStore;

#[derive(Debug, Error)]
pub enum RecordError {
    #[error("scan write timed out after {0:?}")]
    Timeout(Duration),
    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

pub struct ScanRecorder {
    scans: Arc<dyn ScanStore>,
    geoip: Option<Arc<GeoIpService>>,
    write_timeout: Duration,
}

impl ScanRecorder {
    pub fn new(
        scans: Arc<dyn ScanStore>,
        geoip: Option<Arc<GeoIpService>>,
        write_timeout: Duration,
    ) -> Self {
        Self {
            scans,
            geoip,
            write_timeout,
        }
    }

    /// Build and persist one scan event for `link_id`.
    ///
    /// The error is informational only; callers spawn this and log, they do
    /// not gate the redirect on it.
    pub async fn record(&self, link_id: &str, ctx: &RequestContext) -> Result<(), RecordError> {
        let scan = self.build(link_id, ctx);

        match tokio::time::timeout(self.write_timeout, self.scans.insert(&scan)).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(err)) => Err(RecordError::Store(err)),
            Err(_) => Err(RecordError::Timeout(self.write_timeout)),
        }
    }

    /// Spawn `record` as an independent task and swallow its outcome, logging
    /// failures. This is the fire-and-forget entry the resolver uses.
    pub fn record_detached(self: &Arc<Self>, link_id: String, ctx: RequestContext) {
        let recorder = Arc::clone(self);
        tokio::spawn(async move {
            if let Err(err) = recorder.record(&link_id, &ctx).await {
                warn!(link_id = %link_id, error = %err, "failed to record scan");
            }
        });
    }

    fn build(&self, link_id: &str, ctx: &RequestContext) -> NewScan {
        let traffic = classify(ctx.referrer.as_deref(), &ctx.user_agent);
        let agent = parse_agent(&ctx.user_agent);

        let mut country = ctx.country.clone();
        let mut region = ctx.region.clone();
        let mut city = ctx.city.clone();

        // Edge headers win; the local database only fills the gap.
        if country.is_none() {
            if let Some(geoip) = &self.geoip {
                if let Ok(ip) = ctx.ip.parse() {
                    let location = geoip.lookup(ip);
                    country = location.country;
                    region = region.or(location.region);
                    city = city.or(location.city);
                }
            }
        }

        NewScan {
            link_id: link_id.to_string(),
            timestamp: chrono::Utc::now().timestamp(),
            ip: ctx.ip.clone(),
            user_agent: ctx.user_agent.clone(),
            country,
            region,
            city,
            source: Some(traffic.source),
            medium: Some(traffic.medium.as_str().to_string()),
            device: agent.device,
            browser: agent.browser,
            scan_type: None,
        }
    }
}
