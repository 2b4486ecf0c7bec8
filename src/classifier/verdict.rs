// src/classifier/verdict.rs
// =============================================================================
// The possible outcomes of classifying one link, and the record we hand to
// statistics sinks after a tag has been processed.
//
// Rust concepts:
// - Enums: a Verdict is exactly one of several cases
// - Serde derives: verdicts show up in `--json` output and stats files
// =============================================================================

use serde::Serialize;

// Represents what should happen to a link.
//
// Only BlockedByList and Nofollow lead to a rewrite; every other verdict
// leaves the tag exactly as written. The ordering is declaration order,
// which is also the order stats tables are printed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    /// Relative, fragment-only, non-HTTP, or pointing at our own host
    NotExternal,
    /// Matched a blocklist pattern; nofollowed no matter what else matches
    BlockedByList,
    /// Matched an exclusion pattern or a built-in Yandex exclusion
    Excluded,
    /// The current visitor's country is exempt
    GeoExempt,
    /// Social-network link left alone by configuration
    SocialExempt,
    /// Ordinary external link
    Nofollow,
}

impl Verdict {
    pub const ALL: [Verdict; 6] = [
        Verdict::NotExternal,
        Verdict::BlockedByList,
        Verdict::Excluded,
        Verdict::GeoExempt,
        Verdict::SocialExempt,
        Verdict::Nofollow,
    ];

    // True when the tag must end up carrying rel="nofollow"
    pub fn requires_nofollow(self) -> bool {
        matches!(self, Verdict::BlockedByList | Verdict::Nofollow)
    }

    pub fn label(self) -> &'static str {
        match self {
            Verdict::NotExternal => "not external",
            Verdict::BlockedByList => "blocklisted",
            Verdict::Excluded => "excluded",
            Verdict::GeoExempt => "geo exempt",
            Verdict::SocialExempt => "social exempt",
            Verdict::Nofollow => "nofollow",
        }
    }
}

// Represents the result of processing a single anchor tag
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassificationOutcome {
    /// The decoded href that was classified
    pub href: String,
    /// What the classifier decided
    pub verdict: Verdict,
    /// Whether the tag text actually changed (false for already-nofollowed)
    pub changed: bool,
}
