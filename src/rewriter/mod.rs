// src/rewriter/mod.rs
// =============================================================================
// This module contains the HTML side of the engine.
//
// Submodules:
// - scanner: finds anchor open-tags and their attributes
// - rel: parses and rewrites the rel attribute
// - transform: the string-in, string-out entry points
// =============================================================================

mod rel;
mod scanner;
mod transform;

pub use rel::{add_nofollow, RelAttribute, NOFOLLOW};
pub use scanner::{scan, AnchorTag, Attribute, Scanner};
pub use transform::{rewrite, transform, transform_with_sink};
