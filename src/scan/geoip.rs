//! Local GeoIP fallback using a MaxMind City MMDB.
//!
//! Geography normally arrives in edge-provided headers; this service fills in
//! country/region/city from the extracted client IP when those headers are
//! absent and an MMDB path is configured.

use anyhow::{Context, Result};
use maxminddb::{geoip2, Mmap, Reader};
use std::net::IpAddr;
use std::sync::Arc;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GeoLocation {
    pub country: Option<String>,
    pub region: Option<String>,
    pub city: Option<String>,
}

pub struct GeoIpService {
    reader: Arc<Reader<Mmap>>,
}

impl GeoIpService {
    pub fn new(city_path: &str) -> Result<Self> {
        let reader = unsafe { Reader::open_mmap(city_path) }
            .with_context(|| format!("Failed to open GeoIP City database at {city_path}"))?;
        Ok(Self {
            reader: Arc::new(reader),
        })
    }

    /// Lookup country/region/city for an IP. Lookup misses degrade to an
    /// empty location, never an error; telemetry must not fail recording.
    pub fn lookup(&self, ip: IpAddr) -> GeoLocation {
        let mut location = GeoLocation::default();

        if let Ok(result) = self.reader.lookup(ip) {
            if let Ok(Some(city)) = result.decode::<geoip2::City>() {
                location.country = city.country.iso_code.map(|s| s.to_string());
                if let Some(subdivision) = city.subdivisions.first() {
                    location.region = subdivision.iso_code.map(|s| s.to_string());
                }
                location.city = city.city.names.english.map(|s| s.to_string());
            }
        }

        location
    }
}

impl Clone for GeoIpService {
    fn clone(&self) -> Self {
        Self {
            reader: self.reader.clone(),
        }
    }
}
