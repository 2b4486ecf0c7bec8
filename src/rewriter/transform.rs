// src/rewriter/transform.rs
// =============================================================================
// This module ties scanning, classification and rel rewriting together.
//
// How it works:
// 1. Resolve the site host once (Classifier::new)
// 2. Walk the anchor tags the scanner finds, in document order
// 3. Classify each href and rewrite the tag if it needs nofollow
// 4. Copy everything between tags through untouched
//
// transform() is total: it always returns a string. If the engine fails in
// any way (a ScanError, or even a panic) the caller gets the ORIGINAL input
// back, never a half-rewritten document.
//
// Rust concepts:
// - catch_unwind: turns a panic into a Result we can inspect
// - Cow<str>: unchanged tags are never copied into a new allocation
// =============================================================================

use std::any::Any;
use std::borrow::Cow;
use std::panic::{self, AssertUnwindSafe};

use crate::classifier::{ClassificationOutcome, Classifier, Verdict};
use crate::error::ScanError;
use crate::policy::Policy;
use crate::rewriter::rel;
use crate::rewriter::scanner::{scan, AnchorTag};
use crate::stats::{NullSink, OutcomeSink};

// Adds rel="nofollow" to the external links of `html`.
//
// Example:
//   html   = <a href="https://ext.com">text</a>
//   policy = site_host "example.com"
//   result = <a href="https://ext.com" rel="nofollow">text</a>
pub fn transform(html: &str, policy: &Policy) -> String {
    transform_with_sink(html, policy, &mut NullSink)
}

// Same as transform(), reporting one outcome per classified tag to `sink`.
//
// Outcomes are only reported once the whole document has been rewritten,
// so a pass that fails closed reports nothing.
pub fn transform_with_sink(html: &str, policy: &Policy, sink: &mut dyn OutcomeSink) -> String {
    if html.is_empty() {
        return String::new();
    }
    fail_closed(html, sink, || rewrite_document(html, policy))
}

// Runs one rewrite pass and only trusts its result if it finished cleanly.
// Any error or panic gives back `html` untouched and reports nothing.
fn fail_closed<F>(html: &str, sink: &mut dyn OutcomeSink, pass: F) -> String
where
    F: FnOnce() -> Result<(String, Vec<ClassificationOutcome>), ScanError>,
{
    let attempt = panic::catch_unwind(AssertUnwindSafe(pass));
    let (output, outcomes) = match attempt {
        Ok(Ok(done)) => done,
        Ok(Err(e)) => {
            log::warn!("link rewriting aborted, returning input unchanged: {e}");
            return html.to_string();
        }
        Err(payload) => {
            let e = ScanError::Panicked(panic_message(payload.as_ref()));
            log::warn!("link rewriting aborted, returning input unchanged: {e}");
            return html.to_string();
        }
    };

    // The pass succeeded; only now do outcomes leave the engine
    report(sink, &outcomes);
    output
}

// Rewrites a single tag for a given verdict.
//
// Tags that do not need nofollow, or already carry it, come back borrowed
// and byte-identical.
pub fn rewrite<'a>(tag: &AnchorTag<'a>, verdict: Verdict) -> Cow<'a, str> {
    if verdict.requires_nofollow() {
        rel::add_nofollow(tag)
    } else {
        Cow::Borrowed(tag.raw_text)
    }
}

fn rewrite_document(
    html: &str,
    policy: &Policy,
) -> Result<(String, Vec<ClassificationOutcome>), ScanError> {
    let classifier = Classifier::new(policy);
    let mut output = String::with_capacity(html.len() + html.len() / 16);
    let mut outcomes = Vec::new();
    let mut cursor = 0;

    for tag in scan(html) {
        // A scanner self-check failure aborts the whole pass
        let tag = tag?;
        let href = tag.href();
        let verdict = classifier.classify(&href);
        let replacement = rewrite(&tag, verdict);
        // Already-nofollowed and exempt tags come back byte-identical
        let changed = replacement != tag.raw_text;

        log::debug!("{} -> {:?} (changed: {})", href, verdict, changed);
        outcomes.push(ClassificationOutcome {
            href: href.into_owned(),
            verdict,
            changed,
        });

        if !changed {
            continue;
        }

        // Copy the untouched text since the last splice, then the new tag
        let between = html.get(cursor..tag.span.start).ok_or(ScanError::OutOfBounds {
            start: cursor,
            end: tag.span.start,
            len: html.len(),
        })?;
        output.push_str(between);
        output.push_str(&replacement);
        cursor = tag.span.end;
    }

    // Whatever follows the last rewritten tag
    let rest = html.get(cursor..).ok_or(ScanError::OutOfBounds {
        start: cursor,
        end: html.len(),
        len: html.len(),
    })?;
    output.push_str(rest);

    Ok((output, outcomes))
}

// Hands outcomes to the sink; nothing it does can affect the output.
fn report(sink: &mut dyn OutcomeSink, outcomes: &[ClassificationOutcome]) {
    let delivered = panic::catch_unwind(AssertUnwindSafe(|| {
        for outcome in outcomes {
            if let Err(e) = sink.record(outcome) {
                log::warn!("{e}");
            }
        }
    }));
    if delivered.is_err() {
        log::warn!("statistics sink panicked; outcomes dropped");
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. What does catch_unwind do?
//    - A panic normally unwinds the stack until the thread dies
//    - catch_unwind stops it and gives us the panic payload as an Err
//    - A bug in the scanner then costs one page its rewrite, not the process
//
// 2. Why AssertUnwindSafe?
//    - The closure borrows html and policy, which the compiler can't prove
//      are safe to observe after a panic
//    - The pass only builds fresh values, so nothing is left half-updated
//
// 3. Why keep a cursor?
//    - Only changed tags are spliced into the output
//    - Everything between them is copied with one push_str per gap
// -----------------------------------------------------------------------------
