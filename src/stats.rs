// src/stats.rs
// =============================================================================
// Usage statistics, kept out of the rewriting engine.
//
// The engine reports one ClassificationOutcome per classified tag to an
// OutcomeSink the caller passes in. The caller owns the sink and decides
// how long it lives (one page, one process...). If several threads share a
// sink, synchronizing it is the caller's job.
//
// A sink that fails never changes the rewritten HTML: the engine logs the
// error and carries on.
// =============================================================================

use std::collections::BTreeMap;

use serde::Serialize;

use crate::classifier::{ClassificationOutcome, Verdict};
use crate::error::SinkError;

// Receives one outcome per classified anchor tag
pub trait OutcomeSink {
    fn record(&mut self, outcome: &ClassificationOutcome) -> Result<(), SinkError>;
}

// Discards everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl OutcomeSink for NullSink {
    fn record(&mut self, _outcome: &ClassificationOutcome) -> Result<(), SinkError> {
        Ok(())
    }
}

// Any closure taking an outcome works as a sink
impl<F> OutcomeSink for F
where
    F: FnMut(&ClassificationOutcome) -> Result<(), SinkError>,
{
    fn record(&mut self, outcome: &ClassificationOutcome) -> Result<(), SinkError> {
        self(outcome)
    }
}

// Counters accumulated across any number of transform calls.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Stats {
    /// Anchor tags classified
    pub links_seen: u64,
    /// Tags whose text was actually modified
    pub links_rewritten: u64,
    /// Tag count per verdict; serializes with the snake_case verdict names
    pub by_verdict: BTreeMap<Verdict, u64>,
}

impl Stats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self, verdict: Verdict) -> u64 {
        self.by_verdict.get(&verdict).copied().unwrap_or(0)
    }

    // Adds another Stats into this one (e.g. one per file, summed at the end)
    pub fn merge(&mut self, other: &Stats) {
        self.links_seen += other.links_seen;
        self.links_rewritten += other.links_rewritten;
        for (verdict, count) in &other.by_verdict {
            *self.by_verdict.entry(*verdict).or_insert(0) += count;
        }
    }
}

impl OutcomeSink for Stats {
    fn record(&mut self, outcome: &ClassificationOutcome) -> Result<(), SinkError> {
        self.links_seen += 1;
        if outcome.changed {
            self.links_rewritten += 1;
        }
        *self.by_verdict.entry(outcome.verdict).or_insert(0) += 1;
        Ok(())
    }
}
