// src/geo/mod.rs
// =============================================================================
// This module resolves the per-visitor geo exemption.
//
// It sits outside the rewriting engine: the engine only consumes the
// resulting boolean through Policy::geo_exempt.
// =============================================================================

mod lookup;

pub use lookup::{GeoLookup, GeoSettings};
