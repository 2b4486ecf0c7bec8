// src/error.rs
// =============================================================================
// Typed errors for the library half of the crate.
//
// The CLI (main.rs) uses anyhow like any application would; the library
// exposes these enums instead so embedders can match on them.
//
// None of these ever escape `transform()`: scan errors make it fail closed,
// sink errors are logged and dropped. Only policy loading hands them back.
// =============================================================================

use std::path::PathBuf;
use thiserror::Error;

// Internal failure of the tag scanner or of the splicing step.
//
// Seeing one of these means the engine produced offsets it should never
// produce; `transform()` reacts by returning the input untouched.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScanError {
    #[error("tag at byte {start} overlaps previous tag ending at byte {previous_end}")]
    Overlap { start: usize, previous_end: usize },

    #[error("span {start}..{end} is outside the input (length {len})")]
    OutOfBounds { start: usize, end: usize, len: usize },

    #[error("span {start}..{end} does not fall on character boundaries")]
    NotCharBoundary { start: usize, end: usize },

    #[error("rewriting engine panicked: {0}")]
    Panicked(String),
}

// Failure to resolve a policy snapshot.
#[derive(Error, Debug)]
pub enum PolicyError {
    #[error("could not read policy file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid policy JSON: {0}")]
    Parse(#[from] serde_json::Error),
}

// Failure reported by a statistics sink. Never affects rewriting.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("statistics sink rejected outcome: {0}")]
pub struct SinkError(pub String);
