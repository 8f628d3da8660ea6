//! Traffic source classification.
//!
//! Pure function over (referrer, user agent); total — every input pair maps
//! to some `{source, medium}`, including malformed referrers. Rules are
//! strictly ordered, first match wins.

use serde::Serialize;
use url::Url;

/// Where a scan came from: a platform/engine/hostname plus its category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Traffic {
    pub source: String,
    pub medium: Medium,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Medium {
    None,
    InApp,
    Social,
    Organic,
    Referral,
    Unknown,
}

impl Medium {
    pub fn as_str(&self) -> &'static str {
        match self {
            Medium::None => "none",
            Medium::InApp => "inapp",
            Medium::Social => "social",
            Medium::Organic => "organic",
            Medium::Referral => "referral",
            Medium::Unknown => "unknown",
        }
    }
}

impl Traffic {
    fn new(source: &str, medium: Medium) -> Self {
        Self {
            source: source.to_string(),
            medium,
        }
    }
}

/// In-app browser signatures: case-insensitive UA substring -> platform.
const IN_APP_TOKENS: &[(&str, &str)] = &[
    ("fban", "facebook"),
    ("fbav", "facebook"),
    ("fb_iab", "facebook"),
    ("instagram", "instagram"),
    ("twitter", "twitter"),
    ("linkedin", "linkedin"),
    ("whatsapp", "whatsapp"),
    ("snapchat", "snapchat"),
    ("musical_ly", "tiktok"),
    ("bytedancewebview", "tiktok"),
    ("micromessenger", "wechat"),
];

/// Social platform referrer domains.
const SOCIAL_DOMAINS: &[(&str, &str)] = &[
    ("facebook.com", "facebook"),
    ("fb.com", "facebook"),
    ("fb.me", "facebook"),
    ("instagram.com", "instagram"),
    ("twitter.com", "twitter"),
    ("x.com", "twitter"),
    ("t.co", "twitter"),
    ("linkedin.com", "linkedin"),
    ("lnkd.in", "linkedin"),
    ("tiktok.com", "tiktok"),
    ("pinterest.com", "pinterest"),
    ("pin.it", "pinterest"),
    ("reddit.com", "reddit"),
    ("youtube.com", "youtube"),
    ("youtu.be", "youtube"),
    ("whatsapp.com", "whatsapp"),
    ("wa.me", "whatsapp"),
];

/// Search engine referrer domains. Google is matched on the "google" label to
/// cover country TLDs.
const SEARCH_DOMAINS: &[(&str, &str)] = &[
    ("bing.com", "bing"),
    ("yahoo.com", "yahoo"),
    ("duckduckgo.com", "duckduckgo"),
];

/// Classify scan provenance from the referrer URL and user agent.
pub fn classify(referrer: Option<&str>, user_agent: &str) -> Traffic {
    let Some(referrer) = referrer.map(str::trim).filter(|r| !r.is_empty()) else {
        return Traffic::new("direct", Medium::None);
    };

    // In-app browsers rewrite or strip referrers, so the UA signature wins
    // over whatever the referrer says.
    let ua = user_agent.to_ascii_lowercase();
    for (token, platform) in IN_APP_TOKENS {
        if ua.contains(token) {
            return Traffic::new(platform, Medium::InApp);
        }
    }

    let Some(host) = referrer_host(referrer) else {
        return Traffic::new("invalid", Medium::Unknown);
    };

    for (domain, platform) in SOCIAL_DOMAINS {
        if host_matches(&host, domain) {
            return Traffic::new(platform, Medium::Social);
        }
    }

    if host.split('.').any(|label| label == "google") {
        return Traffic::new("google", Medium::Organic);
    }
    for (domain, engine) in SEARCH_DOMAINS {
        if host_matches(&host, domain) {
            return Traffic::new(engine, Medium::Organic);
        }
    }

    Traffic::new(&host, Medium::Referral)
}

fn referrer_host(referrer: &str) -> Option<String> {
    let url = Url::parse(referrer).ok()?;
    url.host_str().map(|h| h.to_ascii_lowercase())
}

fn host_matches(host: &str, domain: &str) -> bool {
    host == domain || host.strip_suffix(domain).is_some_and(|rest| rest.ends_with('.'))
}

#[cfg(test)]
mod tests {
    use super::*;

    const DESKTOP_UA: &str =
        "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 Chrome/120.0 Safari/537.36";
    const FB_APP_UA: &str =
        "Mozilla/5.0 (iPhone; CPU iPhone OS 17_0 like Mac OS X) [FBAN/FBIOS;FBAV/440.0.0]";

    #[test]
    fn no_referrer_is_direct() {
        assert_eq!(
            classify(None, DESKTOP_UA),
            Traffic::new("direct", Medium::None)
        );
        assert_eq!(
            classify(Some(""), DESKTOP_UA),
            Traffic::new("direct", Medium::None)
        );
    }

    #[test]
    fn in_app_browser_wins_over_social_referrer() {
        assert_eq!(
            classify(Some("https://facebook.com/x"), FB_APP_UA),
            Traffic::new("facebook", Medium::InApp)
        );
    }

    #[test]
    fn in_app_tokens_are_case_insensitive() {
        assert_eq!(
            classify(Some("https://example.com"), "something Instagram 300.0"),
            Traffic::new("instagram", Medium::InApp)
        );
        assert_eq!(
            classify(Some("https://example.com"), "WHATSAPP/2.23.20"),
            Traffic::new("whatsapp", Medium::InApp)
        );
    }

    #[test]
    fn social_domains_classify_as_social() {
        for (referrer, platform) in [
            ("https://www.facebook.com/profile", "facebook"),
            ("https://fb.com/x", "facebook"),
            ("https://instagram.com/p/abc", "instagram"),
            ("https://t.co/xyz", "twitter"),
            ("https://x.com/status/1", "twitter"),
            ("https://www.linkedin.com/feed", "linkedin"),
            ("https://lnkd.in/abc", "linkedin"),
            ("https://www.tiktok.com/@user", "tiktok"),
            ("https://pin.it/abc", "pinterest"),
        ] {
            assert_eq!(
                classify(Some(referrer), DESKTOP_UA),
                Traffic::new(platform, Medium::Social),
                "{referrer}"
            );
        }
    }

    #[test]
    fn search_engines_classify_as_organic() {
        for (referrer, engine) in [
            ("https://www.google.com/search?q=x", "google"),
            ("https://google.co.uk/search?q=x", "google"),
            ("https://www.bing.com/search?q=x", "bing"),
            ("https://search.yahoo.com/search?p=x", "yahoo"),
            ("https://duckduckgo.com/?q=x", "duckduckgo"),
        ] {
            assert_eq!(
                classify(Some(referrer), DESKTOP_UA),
                Traffic::new(engine, Medium::Organic),
                "{referrer}"
            );
        }
    }

    #[test]
    fn unknown_hosts_are_referral_with_hostname_source() {
        assert_eq!(
            classify(Some("https://blog.example.org/post/1"), DESKTOP_UA),
            Traffic::new("blog.example.org", Medium::Referral)
        );
    }

    #[test]
    fn malformed_referrer_is_invalid_not_a_panic() {
        assert_eq!(
            classify(Some("not a url"), DESKTOP_UA),
            Traffic::new("invalid", Medium::Unknown)
        );
        assert_eq!(
            classify(Some("http://"), DESKTOP_UA),
            Traffic::new("invalid", Medium::Unknown)
        );
    }

    #[test]
    fn suffix_matching_requires_a_label_boundary() {
        // notfacebook.com must not classify as facebook.
        assert_eq!(
            classify(Some("https://notfacebook.com/x"), DESKTOP_UA),
            Traffic::new("notfacebook.com", Medium::Referral)
        );
        // but a genuine subdomain does.
        assert_eq!(
            classify(Some("https://m.facebook.com/x"), DESKTOP_UA),
            Traffic::new("facebook", Medium::Social)
        );
    }

    #[test]
    fn classifier_is_total() {
        for referrer in [
            None,
            Some("https://facebook.com"),
            Some("://"),
            Some("mailto:someone@example.com"),
            Some("ftp://weird.example.com/file"),
            Some("   "),
        ] {
            for ua in ["", "unknown", FB_APP_UA, DESKTOP_UA] {
                // Must produce a value for every pair, never panic.
                let _ = classify(referrer, ua);
            }
        }
    }
}
