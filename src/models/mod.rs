pub mod link;
pub mod scan;

pub use link::{CreateLinkRequest, LinkPatch, NewLink, ShortLink, UpdateLinkRequest};
pub use scan::{NewScan, ScanEvent};
