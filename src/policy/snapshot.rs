// src/policy/snapshot.rs
// =============================================================================
// The resolved policy a rewrite pass runs against.
//
// A Policy is a plain value. Whoever embeds the rewriter builds one per
// request (from a file, a database, CLI flags...) and passes it by
// reference into every transform() call of that request. The engine only
// ever reads it.
//
// Policy::default() is the conservative fallback used when no policy can be
// resolved: no exclusions, no blocklist, not geo-exempt.
// =============================================================================

use serde::{Deserialize, Serialize};
use url::Url;

// Social networks recognised when `social_block_enabled` or `social_exempt`
// is set. Subdomains match too (m.facebook.com, www.linkedin.com).
pub const DEFAULT_SOCIAL_DOMAINS: [&str; 14] = [
    "facebook.com",
    "instagram.com",
    "twitter.com",
    "x.com",
    "linkedin.com",
    "youtube.com",
    "tiktok.com",
    "pinterest.com",
    "reddit.com",
    "vk.com",
    "ok.ru",
    "t.me",
    "telegram.me",
    "wa.me",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Policy {
    /// Canonical host of the site; bare host or full URL accepted
    pub site_host: String,
    /// Links equal to or containing one of these are never nofollowed
    pub exclusion_patterns: Vec<String>,
    /// Links equal to or containing one of these are always nofollowed
    pub blocklist_patterns: Vec<String>,
    /// Force nofollow on social-network links, even for geo-exempt visitors
    pub social_block_enabled: bool,
    /// Leave social-network links alone (ignored when blocking is enabled)
    pub social_exempt: bool,
    /// Domains considered social networks
    pub social_domains: Vec<String>,
    /// Leave market.yandex.ru links alone
    pub yandex_market_excluded: bool,
    /// The current visitor's country is exempt from nofollow
    pub geo_exempt: bool,
}

impl Default for Policy {
    fn default() -> Self {
        Self {
            site_host: String::new(),
            exclusion_patterns: Vec::new(),
            blocklist_patterns: Vec::new(),
            social_block_enabled: false,
            social_exempt: false,
            social_domains: DEFAULT_SOCIAL_DOMAINS.iter().map(|d| d.to_string()).collect(),
            yandex_market_excluded: false,
            geo_exempt: false,
        }
    }
}

impl Policy {
    // Bare, lower-cased (and IDNA-encoded) host of `site_host`.
    //
    // Accepts "example.com", "Example.com:8080", "//example.com" or
    // "https://example.com/blog/". Returns None when empty or unparseable,
    // in which case no link counts as internal by host.
    pub fn normalized_site_host(&self) -> Option<String> {
        let raw = self.site_host.trim();
        if raw.is_empty() {
            return None;
        }

        let candidate = if raw.contains("://") {
            raw.to_string()
        } else if raw.starts_with("//") {
            format!("http:{raw}")
        } else {
            format!("http://{raw}")
        };

        Url::parse(&candidate)
            .ok()?
            .host_str()
            .filter(|host| !host.is_empty())
            .map(str::to_ascii_lowercase)
    }
}
