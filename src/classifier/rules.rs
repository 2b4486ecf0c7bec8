// src/classifier/rules.rs
// =============================================================================
// This module decides, for one href, whether the link gets rel="nofollow".
//
// The checks run in a fixed order and the first one that matches wins:
//
//   1. relative / fragment / non-HTTP scheme      -> NotExternal
//   2. anything not starting with http or //      -> NotExternal
//   3. no host, or our own host                   -> NotExternal
//   4. blocklist pattern                          -> BlockedByList
//   5. exclusion pattern                          -> Excluded
//   6. Yandex ad redirect (yandex.ru/clck)        -> Excluded
//   7. Yandex Market, when configured             -> Excluded
//   8. social network (block / exempt / neither)  -> Nofollow / SocialExempt
//   9. geo-exempt visitor                         -> GeoExempt
//  10. everything else                            -> Nofollow
//
// The blocklist sits above every exemption so it can force nofollow even on
// links that are also excluded or viewed from an exempt country.
//
// Rust concepts:
// - Borrowing: a Classifier holds &Policy, it never copies the lists
// - Url: parses the host out of absolute and protocol-relative links
// =============================================================================

use url::Url;

use crate::classifier::verdict::Verdict;
use crate::policy::Policy;

// Schemes that never point at a crawlable page
const NON_WEB_SCHEMES: [&str; 5] = ["mailto:", "tel:", "javascript:", "data:", "ftp:"];

// Yandex Direct click redirects; always left alone
const YANDEX_CLICK_PATTERN: &str = "yandex.ru/clck";

// Only excluded when `yandex_market_excluded` is set
const YANDEX_MARKET_PATTERN: &str = "market.yandex.ru";

// Classifies a single href against a policy.
//
// Convenience wrapper; when classifying many links against the same policy,
// build one Classifier and reuse it so the site host is only resolved once.
pub fn classify(href: &str, policy: &Policy) -> Verdict {
    Classifier::new(policy).classify(href)
}

// A policy plus its resolved site host, valid for one rewrite pass.
#[derive(Debug, Clone)]
pub struct Classifier<'p> {
    policy: &'p Policy,
    site_host: Option<String>,
    social_domains: Vec<String>,
}

impl<'p> Classifier<'p> {
    pub fn new(policy: &'p Policy) -> Self {
        let social_domains = policy
            .social_domains
            .iter()
            .map(|d| d.trim().trim_start_matches("www.").to_ascii_lowercase())
            .filter(|d| !d.is_empty())
            .collect();

        Self {
            policy,
            site_host: policy.normalized_site_host(),
            social_domains,
        }
    }

    pub fn site_host(&self) -> Option<&str> {
        self.site_host.as_deref()
    }

    pub fn classify(&self, href: &str) -> Verdict {
        let href = href.trim();

        // Steps 1-3: is this an off-site web link at all?
        if is_local_reference(href) {
            return Verdict::NotExternal;
        }

        let Some(host) = link_host(href) else {
            return Verdict::NotExternal;
        };
        if self.site_host.as_deref() == Some(host.as_str()) {
            return Verdict::NotExternal;
        }

        // Step 4 before every exemption
        if matches_any(href, &self.policy.blocklist_patterns) {
            return Verdict::BlockedByList;
        }
        if matches_any(href, &self.policy.exclusion_patterns) {
            return Verdict::Excluded;
        }
        if href.contains(YANDEX_CLICK_PATTERN) {
            return Verdict::Excluded;
        }
        if self.policy.yandex_market_excluded && href.contains(YANDEX_MARKET_PATTERN) {
            return Verdict::Excluded;
        }

        // Neither flag set: social links fall through like any other
        if self.is_social(&host) {
            if self.policy.social_block_enabled {
                return Verdict::Nofollow;
            }
            if self.policy.social_exempt {
                return Verdict::SocialExempt;
            }
        }

        if self.policy.geo_exempt {
            return Verdict::GeoExempt;
        }

        Verdict::Nofollow
    }

    // Host equal to a listed domain or any subdomain of it.
    fn is_social(&self, host: &str) -> bool {
        self.social_domains.iter().any(|domain| {
            host == domain
                || host
                    .strip_suffix(domain.as_str())
                    .is_some_and(|prefix| prefix.ends_with('.'))
        })
    }
}

// Steps 1 and 2: anything that cannot be an off-site web link.
fn is_local_reference(href: &str) -> bool {
    if href.is_empty() || href.starts_with('#') {
        return true;
    }
    if href.starts_with('/') && !href.starts_with("//") {
        return true;
    }
    if NON_WEB_SCHEMES.iter().any(|scheme| starts_with_ignore_case(href, scheme)) {
        return true;
    }
    !(starts_with_ignore_case(href, "http") || href.starts_with("//"))
}

// Lower-cased host of an absolute or protocol-relative http(s) link.
fn link_host(href: &str) -> Option<String> {
    // Url needs a scheme; borrow one for protocol-relative links
    let parsed = if href.starts_with("//") {
        Url::parse(&format!("http:{href}"))
    } else {
        Url::parse(href)
    }
    .ok()?;

    if !matches!(parsed.scheme(), "http" | "https") {
        return None;
    }

    parsed
        .host_str()
        .filter(|host| !host.is_empty())
        .map(str::to_ascii_lowercase)
}

// Equality or substring; blank patterns never match.
fn matches_any(href: &str, patterns: &[String]) -> bool {
    patterns
        .iter()
        .map(|p| p.trim())
        .filter(|p| !p.is_empty())
        .any(|p| href == p || href.contains(p))
}

fn starts_with_ignore_case(s: &str, prefix: &str) -> bool {
    s.get(..prefix.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. Why does Classifier have a lifetime 'p?
//    - It stores &'p Policy instead of a copy of the pattern lists
//    - The compiler makes sure the Policy outlives every Classifier built
//      from it
//
// 2. What does host_str() return for "https://EXAMPLE.com/x"?
//    - "example.com": the url crate lower-cases hosts and converts
//      unicode domains to their punycode (xn--) form
//    - So a unicode domain and its xn-- spelling compare equal
//
// 3. What is is_some_and?
//    - Option::is_some_and(f) is true when the option is Some and f
//      returns true for the value inside
//    - Shorter than matching on Some(..) just to test it
// -----------------------------------------------------------------------------
