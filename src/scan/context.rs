//! Request context extraction from transport headers.
//!
//! Extraction never fails: missing or unreadable headers degrade to
//! `"unknown"` (ip, user agent) or `None` (geo, referrer). Absence is kept
//! distinct from empty string so downstream storage records NULL, not `""`.

use axum::http::HeaderMap;

/// Derived request metadata carried into scan recording.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    pub ip: String,
    pub user_agent: String,
    pub referrer: Option<String>,
    pub country: Option<String>,
    pub region: Option<String>,
    pub city: Option<String>,
}

const UNKNOWN: &str = "unknown";

impl RequestContext {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        Self {
            ip: extract_ip(headers),
            user_agent: header_str(headers, "user-agent")
                .unwrap_or(UNKNOWN)
                .to_string(),
            referrer: header_str(headers, "referer").map(str::to_string),
            country: header_str(headers, "x-vercel-ip-country").map(str::to_string),
            region: header_str(headers, "x-vercel-ip-region").map(str::to_string),
            // The edge network percent-encodes city names ("S%C3%A3o%20Paulo").
            city: header_str(headers, "x-vercel-ip-city").map(decode_component),
        }
    }
}

/// First entry of `x-forwarded-for`, then `x-real-ip`, then `"unknown"`.
fn extract_ip(headers: &HeaderMap) -> String {
    header_str(headers, "x-forwarded-for")
        .and_then(|v| v.split(',').next())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .or_else(|| header_str(headers, "x-real-ip").map(str::to_string))
        .unwrap_or_else(|| UNKNOWN.to_string())
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

fn decode_component(value: &str) -> String {
    match urlencoding::decode(value) {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => value.to_string(),
    }
}
