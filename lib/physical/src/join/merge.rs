use crate::join::{
    JoinAlgorithm, JoinConfig, JoinInputs, JoinKey, JoinMetrics, JoinTrace, JoinTraceSink,
    RowMerger, SortednessPolicy,
};
use crate::{Row, RowOrder, RowStream};
use rdf_weave_common::{ExecutionError, ExecutionResult, Side};
use std::cmp::Ordering;
use std::sync::Arc;
use tracing::warn;

enum MergeState {
    /// No row has been pulled yet.
    Start,
    /// Both cursors point to a row. The next cluster is searched for.
    AdvancingCursors,
    /// The results of the last key cluster are being emitted.
    EmittingCluster(std::vec::IntoIter<Row>),
    /// At least one input is exhausted, or the join failed.
    Exhausted,
}

/// The current position in one of the inputs.
#[derive(Default)]
struct Cursor {
    current: Option<Row>,
    rows_read: u64,
}

/// A streaming merge join over two inputs that are sorted on the join key.
///
/// The join holds at most one key cluster in memory: the run of left rows that share a key value
/// and the results of merging them with the matching right rows. Results are computed on demand.
///
/// Once exhausted, failed, closed or dropped, both inputs are closed exactly once.
pub struct MergeJoinStream<O, M> {
    key: JoinKey,
    order: O,
    merger: M,
    config: JoinConfig,
    trace: Arc<dyn JoinTraceSink>,
    inputs: JoinInputs,
    left: Cursor,
    right: Cursor,
    state: MergeState,
    metrics: JoinMetrics,
}

impl<O: RowOrder, M: RowMerger> MergeJoinStream<O, M> {
    /// Creates a new [MergeJoinStream]. Only the [JoinDispatcher](crate::join::JoinDispatcher)
    /// builds merge joins, after checking that the key is covered by both operands.
    ///
    /// The key must not be empty. An empty key makes every pair of rows a single cluster, which is
    /// a cartesian product that should be computed by a hash join.
    pub(crate) fn new(
        key: JoinKey,
        left: Box<dyn RowStream>,
        right: Box<dyn RowStream>,
        order: O,
        merger: M,
        config: JoinConfig,
        trace: Arc<dyn JoinTraceSink>,
    ) -> Self {
        debug_assert!(!key.is_empty(), "Merge join requires a non-empty key");
        Self {
            key,
            order,
            merger,
            config,
            trace,
            inputs: JoinInputs::new(left, right),
            left: Cursor::default(),
            right: Cursor::default(),
            state: MergeState::Start,
            metrics: JoinMetrics::default(),
        }
    }

    /// Returns the counters collected so far.
    pub fn metrics(&self) -> JoinMetrics {
        JoinMetrics {
            left_rows: self.left.rows_read,
            right_rows: self.right.rows_read,
            ..self.metrics
        }
    }

    fn step(&mut self) -> ExecutionResult<Option<Row>> {
        loop {
            match &mut self.state {
                MergeState::Start => {
                    // An empty left input makes pulling from the right input unnecessary.
                    self.pull(Side::Left)?;
                    if self.left.current.is_none() {
                        self.state = MergeState::Exhausted;
                        continue;
                    }
                    self.pull(Side::Right)?;
                    self.state = MergeState::AdvancingCursors;
                }
                MergeState::AdvancingCursors => {
                    let (Some(left), Some(right)) = (&self.left.current, &self.right.current)
                    else {
                        self.state = MergeState::Exhausted;
                        continue;
                    };
                    match self.order.compare(&self.key, left, right) {
                        Ordering::Less => self.pull(Side::Left)?,
                        Ordering::Greater => self.pull(Side::Right)?,
                        Ordering::Equal => {
                            let cluster = self.join_cluster()?;
                            self.state = MergeState::EmittingCluster(cluster.into_iter());
                        }
                    }
                }
                MergeState::EmittingCluster(results) => match results.next() {
                    Some(row) => {
                        self.metrics.results += 1;
                        return Ok(Some(row));
                    }
                    None => self.state = MergeState::AdvancingCursors,
                },
                MergeState::Exhausted => return Ok(None),
            }
        }
    }

    /// Collects the run of left rows sharing the current key value and merges it with every
    /// matching right row. Afterward, both cursors point past the cluster.
    fn join_cluster(&mut self) -> ExecutionResult<Vec<Row>> {
        let Some(first) = self.left.current.clone() else {
            return Ok(Vec::new());
        };

        let mut run = vec![first.clone()];
        loop {
            self.pull(Side::Left)?;
            match &self.left.current {
                Some(row) if self.order.compare(&self.key, row, &first) == Ordering::Equal => {
                    run.push(row.clone());
                }
                _ => break,
            }
        }

        let mut results = Vec::new();
        while let Some(right) = &self.right.current {
            if self.order.compare(&self.key, right, &first) != Ordering::Equal {
                break;
            }
            results.extend(run.iter().filter_map(|left| self.merger.merge(left, right)));
            self.pull(Side::Right)?;
        }

        self.metrics.peak_buffered_rows = self
            .metrics
            .peak_buffered_rows
            .max(run.len() + results.len());
        Ok(results)
    }

    /// Advances the cursor of `side` by one row.
    ///
    /// Rows that leave a key variable unbound are always reported. Ordering violations are only
    /// detected if [JoinConfig::check_sorted] is set.
    fn pull(&mut self, side: Side) -> ExecutionResult<()> {
        let next = self.inputs.get_mut(side).next().transpose()?;
        let cursor = match side {
            Side::Left => &mut self.left,
            Side::Right => &mut self.right,
        };
        let Some(next) = next else {
            cursor.current = None;
            return Ok(());
        };
        cursor.rows_read += 1;

        if let Some(variable) = self.key.iter().find(|variable| !next.contains(variable)) {
            let row = cursor.rows_read;
            self.metrics.unbound_key_rows += 1;
            match self.config.sortedness {
                SortednessPolicy::Fail => {
                    return Err(ExecutionError::UnboundJoinKey {
                        side,
                        row,
                        variable: variable.clone(),
                    });
                }
                SortednessPolicy::Warn => warn!(
                    %side,
                    row,
                    %variable,
                    "Merge join input leaves a key variable unbound, results may be incomplete"
                ),
            }
        }

        if self.config.check_sorted {
            if let Some(previous) = &cursor.current {
                if self.order.compare(&self.key, &next, previous) == Ordering::Less {
                    let row = cursor.rows_read;
                    self.metrics.unsorted_violations += 1;
                    self.trace.unsorted_input(side, row);
                    match self.config.sortedness {
                        SortednessPolicy::Fail => {
                            return Err(ExecutionError::UnsortedInput { side, row });
                        }
                        SortednessPolicy::Warn => warn!(
                            %side,
                            row,
                            key = %self.key,
                            "Merge join input is not sorted on the join key, results may be incomplete"
                        ),
                    }
                }
            }
        }

        cursor.current = Some(next);
        Ok(())
    }

    /// Closes both inputs and reports the metrics to the trace sink. Does nothing if the inputs
    /// are already closed.
    fn close_inputs(&mut self) -> ExecutionResult<()> {
        if self.inputs.is_closed() {
            return Ok(());
        }
        self.state = MergeState::Exhausted;
        self.left.current = None;
        self.right.current = None;
        let result = self.inputs.close();
        self.trace.record(&JoinTrace {
            algorithm: JoinAlgorithm::Merge,
            key: Some(self.key.clone()),
            metrics: self.metrics(),
        });
        result
    }
}

impl<O: RowOrder, M: RowMerger> Iterator for MergeJoinStream<O, M> {
    type Item = ExecutionResult<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.step() {
            Ok(Some(row)) => Some(Ok(row)),
            Ok(None) => self.close_inputs().err().map(Err),
            Err(error) => {
                if let Err(close_error) = self.close_inputs() {
                    warn!(error = %close_error, "Failed to close merge join inputs after an error");
                }
                Some(Err(error))
            }
        }
    }
}

impl<O: RowOrder, M: RowMerger> RowStream for MergeJoinStream<O, M> {
    fn close(&mut self) -> ExecutionResult<()> {
        self.close_inputs()
    }
}

impl<O, M> Drop for MergeJoinStream<O, M> {
    fn drop(&mut self) {
        if !self.inputs.is_closed() {
            self.inputs.close_on_drop();
        }
    }
}
