use crate::join::{JoinAlgorithm, JoinKey};
use rdf_weave_common::Side;
use std::fmt::Debug;
use std::sync::{Mutex, PoisonError};
use tracing::debug;

/// The counters of a single join execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct JoinMetrics {
    /// Rows pulled from the left input.
    pub left_rows: u64,
    /// Rows pulled from the right input.
    pub right_rows: u64,
    /// Rows produced by the join.
    pub results: u64,
    /// Number of detected sortedness violations.
    pub unsorted_violations: u64,
    /// Rows a merge join pulled that leave a key variable unbound.
    pub unbound_key_rows: u64,
    /// The largest number of rows the join held in memory at once.
    ///
    /// For a merge join, this is the size of the largest buffered key cluster plus its results.
    /// For a hash join, this includes the entire build side.
    pub peak_buffered_rows: usize,
}

/// The summary of a finished join that is sent to a [JoinTraceSink].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinTrace {
    pub algorithm: JoinAlgorithm,
    pub key: Option<JoinKey>,
    pub metrics: JoinMetrics,
}

/// Receives instrumentation from join operators.
///
/// The sink is write-only. A join reports its [JoinTrace] exactly once, when its inputs are
/// closed.
pub trait JoinTraceSink: Send + Sync + Debug {
    /// Records the summary of a finished join.
    fn record(&self, trace: &JoinTrace);

    /// Called whenever a merge join detects that row number `row` (1-based) of the input on
    /// `side` sorts before its predecessor.
    fn unsorted_input(&self, _side: Side, _row: u64) {}
}

/// Discards all instrumentation.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopTraceSink;

impl JoinTraceSink for NoopTraceSink {
    fn record(&self, _trace: &JoinTrace) {}
}

/// Emits join summaries as `debug` events.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingTraceSink;

impl JoinTraceSink for TracingTraceSink {
    fn record(&self, trace: &JoinTrace) {
        let key = trace
            .key
            .as_ref()
            .map_or_else(|| String::from("-"), ToString::to_string);
        debug!(
            algorithm = %trace.algorithm,
            key,
            left_rows = trace.metrics.left_rows,
            right_rows = trace.metrics.right_rows,
            results = trace.metrics.results,
            unsorted_violations = trace.metrics.unsorted_violations,
            unbound_key_rows = trace.metrics.unbound_key_rows,
            peak_buffered_rows = trace.metrics.peak_buffered_rows,
            "Join finished"
        );
    }
}

/// Keeps all instrumentation in memory. Useful for explaining queries and for tests.
#[derive(Debug, Default)]
pub struct CollectingTraceSink {
    traces: Mutex<Vec<JoinTrace>>,
    violations: Mutex<Vec<(Side, u64)>>,
}

impl CollectingTraceSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the summaries of all finished joins in the order they finished.
    pub fn traces(&self) -> Vec<JoinTrace> {
        self.traces
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Returns all reported sortedness violations.
    pub fn violations(&self) -> Vec<(Side, u64)> {
        self.violations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl JoinTraceSink for CollectingTraceSink {
    fn record(&self, trace: &JoinTrace) {
        self.traces
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(trace.clone());
    }

    fn unsorted_input(&self, side: Side, row: u64) {
        self.violations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((side, row));
    }
}
