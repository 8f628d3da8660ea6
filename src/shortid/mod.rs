//! Short identifier generation and custom-path validation.
//!
//! Generated ids are 6 characters from a 62-character alphabet, with two of
//! the characters taken from the tail of the base-36 current timestamp and
//! spliced in at random positions. The time seed keeps candidates created in
//! the same instant from clustering in the random space; uniqueness is still
//! enforced by the store's unique constraint, not here.

use rand::seq::IndexedRandom;
use rand::RngExt;
use thiserror::Error;
use url::Url;

const ALPHABET: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";

/// Length of a generated short id.
pub const GENERATED_LEN: usize = 6;

/// Number of timestamp-derived characters spliced into each candidate.
const TIME_SEED_LEN: usize = 2;

/// Maximum create attempts before giving up on a unique generated id.
pub const MAX_GENERATION_ATTEMPTS: u32 = 10;

/// Path segments that collide with application routes and are therefore
/// rejected as custom ids, case-insensitively.
const RESERVED_WORDS: &[&str] = &[
    "api",
    "admin",
    "auth",
    "login",
    "logout",
    "dashboard",
    "analytics",
    "generate",
    "qr",
    "qr-codes",
    "r",
    "privacy",
    "terms",
    "not-found",
    "health",
    "static",
    "assets",
];

const CUSTOM_MIN_LEN: usize = 3;
const CUSTOM_MAX_LEN: usize = 32;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("destination URL cannot be empty")]
    EmptyUrl,
    #[error("destination URL must use http:// or https://")]
    UnsupportedScheme,
    #[error("destination URL is not a valid absolute URL")]
    MalformedUrl,
    #[error("custom path must be {CUSTOM_MIN_LEN}-{CUSTOM_MAX_LEN} characters of [A-Za-z0-9_-]")]
    InvalidCustomPath,
    #[error("custom path '{0}' is reserved")]
    ReservedWord(String),
}

/// Validate a destination URL: absolute, http or https only.
pub fn validate_destination(url: &str) -> Result<(), ValidationError> {
    let url = url.trim();
    if url.is_empty() {
        return Err(ValidationError::EmptyUrl);
    }
    let parsed = Url::parse(url).map_err(|_| ValidationError::MalformedUrl)?;
    match parsed.scheme() {
        "http" | "https" => Ok(()),
        _ => Err(ValidationError::UnsupportedScheme),
    }
}

/// Validate a user-supplied custom path against the allowed character set and
/// the reserved-word blocklist.
pub fn validate_custom_path(path: &str) -> Result<(), ValidationError> {
    if path.len() < CUSTOM_MIN_LEN
        || path.len() > CUSTOM_MAX_LEN
        || !path
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-')
    {
        return Err(ValidationError::InvalidCustomPath);
    }
    let lowered = path.to_ascii_lowercase();
    if RESERVED_WORDS.contains(&lowered.as_str()) {
        return Err(ValidationError::ReservedWord(path.to_string()));
    }
    Ok(())
}

/// Source of short-id candidates. The production source is time-seeded and
/// random; tests substitute a fixed source to force collisions.
pub trait CandidateSource: Send + Sync {
    fn candidate(&self) -> String;
}

/// Time-seeded random candidate source.
pub struct TimeSeededSource;

impl CandidateSource for TimeSeededSource {
    fn candidate(&self) -> String {
        let mut rng = rand::rng();

        let mut chars: Vec<u8> = (0..GENERATED_LEN - TIME_SEED_LEN)
            .map(|_| *ALPHABET.choose(&mut rng).expect("alphabet is non-empty"))
            .collect();

        // Last two base-36 digits of the current timestamp, spliced in at
        // random positions.
        for digit in time_seed(chrono::Utc::now().timestamp()) {
            let pos = rng.random_range(0..=chars.len());
            chars.insert(pos, digit);
        }

        String::from_utf8(chars).expect("candidate is ASCII")
    }
}

fn time_seed(timestamp: i64) -> [u8; TIME_SEED_LEN] {
    let mut n = timestamp.unsigned_abs();
    let mut seed = [b'0'; TIME_SEED_LEN];
    for slot in seed.iter_mut().rev() {
        let digit = (n % 36) as u8;
        *slot = if digit < 10 {
            b'0' + digit
        } else {
            b'a' + (digit - 10)
        };
        n /= 36;
    }
    seed
}
