//! Short-id resolution orchestrator.

use std::sync::Arc;

use anyhow::Result;

use crate::scan::{RequestContext, ScanRecorder};
use crate::storage::LinkStore;

/// Terminal outcome of a resolution. A transient store failure is an `Err`
/// from [`RedirectResolver::resolve`], never `NotFound` — callers must not
/// reinterpret one as the other.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Found { destination: String },
    NotFound,
}

pub struct RedirectResolver {
    links: Arc<dyn LinkStore>,
    recorder: Arc<ScanRecorder>,
}

impl RedirectResolver {
    pub fn new(links: Arc<dyn LinkStore>, recorder: Arc<ScanRecorder>) -> Self {
        Self { links, recorder }
    }

    /// Resolve a short id to its destination, recording the scan as an
    /// independent task. The redirect decision never waits on, or fails
    /// because of, the scan write.
    ///
    /// Archived links still resolve; archiving only hides a link from
    /// listings.
    pub async fn resolve(&self, id: &str, ctx: RequestContext) -> Result<Resolution> {
        match self.links.get(id).await? {
            Some(link) => {
                self.recorder.record_detached(link.id, ctx);
                Ok(Resolution::Found {
                    destination: link.destination_url,
                })
            }
            None => Ok(Resolution::NotFound),
        }
    }
}
