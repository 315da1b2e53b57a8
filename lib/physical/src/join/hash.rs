use crate::join::{
    JoinAlgorithm, JoinInputs, JoinKey, JoinMetrics, JoinTrace, JoinTraceSink, RowMerger,
};
use crate::{Row, RowStream};
use rdf_weave_common::ExecutionResult;
use rdf_weave_model::{TermId, Variable};
use rustc_hash::FxHashMap;
use std::sync::Arc;
use tracing::warn;

/// The build side of a hash join.
///
/// Rows are kept in insertion order. Rows binding all shared variables are indexed by their
/// projection onto the shared variables. Rows missing one of them are compatible with every probe
/// row on that variable and are kept separately.
#[derive(Default)]
struct HashTable {
    rows: Vec<Row>,
    buckets: FxHashMap<Vec<TermId>, Vec<usize>>,
    unkeyed: Vec<usize>,
}

impl HashTable {
    fn insert(&mut self, shared: &[Variable], row: Row) {
        let index = self.rows.len();
        match project(shared, &row) {
            Some(key) => self.buckets.entry(key).or_default().push(index),
            None => self.unkeyed.push(index),
        }
        self.rows.push(row);
    }

    fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Merges `probe` with every compatible build row, in build order.
    fn probe(&self, shared: &[Variable], probe: &Row, merger: &impl RowMerger) -> Vec<Row> {
        let merge = |index: usize| merger.merge(&self.rows[index], probe);
        match project(shared, probe) {
            Some(key) => {
                let bucket = self.buckets.get(&key).map_or(&[][..], Vec::as_slice);
                itertools::merge(bucket.iter().copied(), self.unkeyed.iter().copied())
                    .filter_map(merge)
                    .collect()
            }
            None => (0..self.rows.len()).filter_map(merge).collect(),
        }
    }
}

fn project(shared: &[Variable], row: &Row) -> Option<Vec<TermId>> {
    shared.iter().map(|variable| row.get(variable)).collect()
}

enum HashState {
    /// Neither input has been read yet.
    Build,
    /// The right input is probed against the hash table.
    Probe,
    Exhausted,
}

/// A hash join that builds a table over the left input and probes it with the right input.
///
/// The join does not depend on the order of its inputs. Rows are joined on all variables shared
/// by both inputs. If there are none, the result is the cartesian product.
///
/// The first pull reads one row from each input before the rest of the left input is
/// materialized. If the left input is empty, the right input is never read. If the right input
/// is empty, the left input is not read past its first row.
pub struct HashJoinStream<M> {
    shared: Vec<Variable>,
    key: Option<JoinKey>,
    merger: M,
    trace: Arc<dyn JoinTraceSink>,
    inputs: JoinInputs,
    table: HashTable,
    batch: std::vec::IntoIter<Row>,
    state: HashState,
    metrics: JoinMetrics,
}

impl<M: RowMerger> HashJoinStream<M> {
    /// Creates a new [HashJoinStream] joining on the `shared` variables.
    ///
    /// `key` is only used for instrumentation.
    pub fn new(
        shared: Vec<Variable>,
        key: Option<JoinKey>,
        left: Box<dyn RowStream>,
        right: Box<dyn RowStream>,
        merger: M,
        trace: Arc<dyn JoinTraceSink>,
    ) -> Self {
        Self {
            shared,
            key,
            merger,
            trace,
            inputs: JoinInputs::new(left, right),
            table: HashTable::default(),
            batch: Vec::new().into_iter(),
            state: HashState::Build,
            metrics: JoinMetrics::default(),
        }
    }

    /// Returns the counters collected so far.
    pub fn metrics(&self) -> JoinMetrics {
        self.metrics
    }

    fn step(&mut self) -> ExecutionResult<Option<Row>> {
        loop {
            if let Some(row) = self.batch.next() {
                self.metrics.results += 1;
                return Ok(Some(row));
            }

            match self.state {
                HashState::Build => {
                    let Some(first) = self.inputs.left.next().transpose()? else {
                        self.state = HashState::Exhausted;
                        continue;
                    };
                    self.metrics.left_rows += 1;
                    let Some(probe) = self.inputs.right.next().transpose()? else {
                        self.state = HashState::Exhausted;
                        continue;
                    };
                    self.metrics.right_rows += 1;

                    self.table.insert(&self.shared, first);
                    for row in self.inputs.left.by_ref() {
                        self.metrics.left_rows += 1;
                        self.table.insert(&self.shared, row?);
                    }
                    self.state = HashState::Probe;
                    self.probe(&probe);
                }
                HashState::Probe => match self.inputs.right.next().transpose()? {
                    Some(probe) => {
                        self.metrics.right_rows += 1;
                        self.probe(&probe);
                    }
                    None => self.state = HashState::Exhausted,
                },
                HashState::Exhausted => return Ok(None),
            }
        }
    }

    /// Replaces the pending batch with the results for the right row `probe`.
    fn probe(&mut self, probe: &Row) {
        let batch = self.table.probe(&self.shared, probe, &self.merger);
        self.metrics.peak_buffered_rows = self
            .metrics
            .peak_buffered_rows
            .max(self.table.rows.len() + batch.len());
        self.batch = batch.into_iter();
    }

    fn close_inputs(&mut self) -> ExecutionResult<()> {
        if self.inputs.is_closed() {
            return Ok(());
        }
        self.state = HashState::Exhausted;
        self.table = HashTable::default();
        self.batch = Vec::new().into_iter();
        let result = self.inputs.close();
        self.trace.record(&JoinTrace {
            algorithm: JoinAlgorithm::Hash,
            key: self.key.clone(),
            metrics: self.metrics,
        });
        result
    }
}

impl<M: RowMerger> Iterator for HashJoinStream<M> {
    type Item = ExecutionResult<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.step() {
            Ok(Some(row)) => Some(Ok(row)),
            Ok(None) => self.close_inputs().err().map(Err),
            Err(error) => {
                if let Err(close_error) = self.close_inputs() {
                    warn!(error = %close_error, "Failed to close hash join inputs after an error");
                }
                Some(Err(error))
            }
        }
    }
}

impl<M: RowMerger> RowStream for HashJoinStream<M> {
    fn close(&mut self) -> ExecutionResult<()> {
        self.close_inputs()
    }
}

impl<M> Drop for HashJoinStream<M> {
    fn drop(&mut self) {
        if !self.inputs.is_closed() {
            self.inputs.close_on_drop();
        }
    }
}
