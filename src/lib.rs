// src/lib.rs
// =============================================================================
// nofollow-guard: adds rel="nofollow" to external links in HTML.
//
// The library is the embeddable core. Give it a chunk of HTML and a Policy,
// get the same HTML back with off-site anchor tags marked nofollow:
//
//   let policy = Policy { site_host: "example.com".into(), ..Policy::default() };
//   let html = transform(r#"<a href="https://ext.com">x</a>"#, &policy);
//   assert_eq!(html, r#"<a href="https://ext.com" rel="nofollow">x</a>"#);
//
// Modules:
// - rewriter: finds anchor tags and rewrites their rel attribute
// - classifier: decides which links need nofollow
// - policy: the configuration snapshot and how to load it
// - stats: optional per-link outcome reporting
// - geo: resolves per-visitor geo exemption over HTTP
// - error: typed errors
// =============================================================================

pub mod classifier;
pub mod error;
pub mod geo;
pub mod policy;
pub mod rewriter;
pub mod stats;

pub use classifier::{classify, ClassificationOutcome, Classifier, Verdict};
pub use error::{PolicyError, ScanError, SinkError};
pub use policy::{Policy, PolicyOverrides, Settings};
pub use rewriter::{rewrite, scan, transform, transform_with_sink, AnchorTag};
pub use stats::{NullSink, OutcomeSink, Stats};
