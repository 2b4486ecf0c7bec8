// src/policy/mod.rs
// =============================================================================
// This module holds the policy a rewrite pass runs against and the code
// that resolves it from a settings file and CLI flags.
//
// Submodules:
// - snapshot: the Policy value type and its defaults
// - load: settings file parsing, fallback to defaults, CLI overrides
// =============================================================================

mod load;
mod snapshot;

pub use load::{PolicyOverrides, Settings};
pub use snapshot::{Policy, DEFAULT_SOCIAL_DOMAINS};
