// src/classifier/mod.rs
// =============================================================================
// This module contains all link classification logic.
//
// Submodules:
// - rules: the ordered checks that turn an href into a Verdict
// - verdict: the Verdict enum and the per-tag outcome record
//
// This file (mod.rs) is the module root - it re-exports the public API so
// callers can write `classifier::classify()`.
// =============================================================================

mod rules;
mod verdict;

pub use rules::{classify, Classifier};
pub use verdict::{ClassificationOutcome, Verdict};
