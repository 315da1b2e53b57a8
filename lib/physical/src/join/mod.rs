//! Joins two [RowList]s.
//!
//! The [JoinDispatcher] inspects the join key and the variable sets of both operands. If the key
//! is covered by both operands, it executes a streaming [MergeJoinStream] that relies on both
//! inputs being sorted on the key. Otherwise, it falls back to a [HashJoinStream] that tolerates
//! arbitrary input orders.

mod hash;
mod merge;
mod merger;
mod trace;

use crate::{RowList, RowOrder, RowStream, VariableSet};
use rdf_weave_common::{ExecutionError, ExecutionResult, Side};
use rdf_weave_model::Variable;
use std::fmt::{Display, Formatter};
use std::sync::Arc;
use tracing::{debug, warn};

pub use hash::HashJoinStream;
pub use merge::MergeJoinStream;
pub use merger::{CompatibleMerge, RowMerger};
pub use trace::{
    CollectingTraceSink, JoinMetrics, JoinTrace, JoinTraceSink, NoopTraceSink, TracingTraceSink,
};

/// The ordered sequence of variables two operands are joined on.
///
/// The key never contains a variable twice. An empty key denotes a cartesian product.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct JoinKey(Vec<Variable>);

impl JoinKey {
    /// Creates a new [JoinKey]. Duplicate variables are removed, keeping the first occurrence.
    pub fn new(variables: impl IntoIterator<Item = Variable>) -> Self {
        let mut result: Vec<Variable> = Vec::new();
        for variable in variables {
            if !result.contains(&variable) {
                result.push(variable);
            }
        }
        Self(result)
    }

    /// Creates a key that contains all variables shared by `left` and `right`, sorted by name.
    pub fn shared(left: &VariableSet, right: &VariableSet) -> Self {
        Self(left.intersection(right))
    }

    pub fn variables(&self) -> &[Variable] {
        &self.0
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Variable> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns whether this key can drive a merge join over operands binding `left` and `right`.
    ///
    /// An empty key is never covered.
    pub fn is_covered_by(&self, left: &VariableSet, right: &VariableSet) -> bool {
        !self.is_empty() && left.contains_all(&self.0) && right.contains_all(&self.0)
    }
}

impl<'a> IntoIterator for &'a JoinKey {
    type Item = &'a Variable;
    type IntoIter = std::slice::Iter<'a, Variable>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl Display for JoinKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "(")?;
        for (i, variable) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{variable}")?;
        }
        write!(f, ")")
    }
}

/// What a merge join does if it detects that one of its inputs is not sorted on the join key, or
/// that a row leaves a key variable unbound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortednessPolicy {
    /// Yield an [ExecutionError::UnsortedInput] or [ExecutionError::UnboundJoinKey] and stop.
    #[default]
    Fail,
    /// Log a warning and continue. Results may be incomplete.
    Warn,
}

/// Configures the join operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JoinConfig {
    /// Whether merge joins verify that their inputs are sorted on the join key.
    pub check_sorted: bool,
    /// What happens if a merge join input turns out to be unsorted.
    pub sortedness: SortednessPolicy,
}

impl JoinConfig {
    #[must_use]
    pub fn with_check_sorted(mut self, check_sorted: bool) -> Self {
        self.check_sorted = check_sorted;
        self
    }

    #[must_use]
    pub fn with_sortedness(mut self, sortedness: SortednessPolicy) -> Self {
        self.sortedness = sortedness;
        self
    }
}

impl Default for JoinConfig {
    fn default() -> Self {
        Self {
            check_sorted: cfg!(debug_assertions),
            sortedness: SortednessPolicy::default(),
        }
    }
}

/// The physical join algorithms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JoinAlgorithm {
    Merge,
    Hash,
}

impl Display for JoinAlgorithm {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            JoinAlgorithm::Merge => write!(f, "merge join"),
            JoinAlgorithm::Hash => write!(f, "hash join"),
        }
    }
}

/// Chooses and executes a join algorithm for two [RowList]s.
#[derive(Debug, Clone)]
pub struct JoinDispatcher {
    config: JoinConfig,
    trace: Arc<dyn JoinTraceSink>,
}

impl JoinDispatcher {
    /// Creates a new [JoinDispatcher] that reports join summaries to the log.
    pub fn new(config: JoinConfig) -> Self {
        Self {
            config,
            trace: Arc::new(TracingTraceSink),
        }
    }

    /// Replaces the sink that receives the counters of every executed join.
    #[must_use]
    pub fn with_trace_sink(mut self, trace: Arc<dyn JoinTraceSink>) -> Self {
        self.trace = trace;
        self
    }

    pub fn config(&self) -> &JoinConfig {
        &self.config
    }

    /// Returns the algorithm [Self::join] would use for the given key and operand variables.
    pub fn choose_algorithm(
        &self,
        key: Option<&JoinKey>,
        left: &VariableSet,
        right: &VariableSet,
    ) -> JoinAlgorithm {
        match key {
            Some(key) if key.is_covered_by(left, right) => JoinAlgorithm::Merge,
            _ => JoinAlgorithm::Hash,
        }
    }

    /// Joins `left` and `right`.
    ///
    /// If `key` is covered by both operands, both operands must be sorted on `key` according to
    /// `order` and every row must bind every key variable. A row that leaves a key variable
    /// unbound is handled according to [JoinConfig::sortedness]. Otherwise, the rows are joined on
    /// all shared variables with a hash join and `order` is not used. Rows are combined with
    /// `merger`.
    ///
    /// The result is lazy. No rows are pulled from the inputs before the first result is
    /// requested.
    pub fn join<O, M>(
        &self,
        key: Option<&JoinKey>,
        left: RowList,
        right: RowList,
        order: O,
        merger: M,
    ) -> RowList
    where
        O: RowOrder + 'static,
        M: RowMerger + 'static,
    {
        let variables = left.variables().union(right.variables());
        let algorithm = self.choose_algorithm(key, left.variables(), right.variables());
        match (algorithm, key) {
            (JoinAlgorithm::Merge, Some(key)) => {
                debug!(%key, "Executing merge join");
                let stream = MergeJoinStream::new(
                    key.clone(),
                    left.into_stream(),
                    right.into_stream(),
                    order,
                    merger,
                    self.config,
                    Arc::clone(&self.trace),
                );
                RowList::from_stream(variables, stream)
            }
            _ => {
                let shared = left.variables().intersection(right.variables());
                debug!(shared = shared.len(), "Join key is not covered, executing hash join");
                let stream = HashJoinStream::new(
                    shared,
                    key.cloned(),
                    left.into_stream(),
                    right.into_stream(),
                    merger,
                    Arc::clone(&self.trace),
                );
                RowList::from_stream(variables, stream)
            }
        }
    }
}

impl Default for JoinDispatcher {
    fn default() -> Self {
        Self::new(JoinConfig::default())
    }
}

/// Joins `left` and `right` with a default [JoinDispatcher].
///
/// See [JoinDispatcher::join].
pub fn join<O, M>(
    key: Option<&JoinKey>,
    left: RowList,
    right: RowList,
    order: O,
    merger: M,
) -> RowList
where
    O: RowOrder + 'static,
    M: RowMerger + 'static,
{
    JoinDispatcher::default().join(key, left, right, order, merger)
}

/// The two input streams of a join operator.
///
/// Closing is idempotent. Both inputs are closed even if closing the left input fails.
struct JoinInputs {
    left: Box<dyn RowStream>,
    right: Box<dyn RowStream>,
    closed: bool,
}

impl JoinInputs {
    fn new(left: Box<dyn RowStream>, right: Box<dyn RowStream>) -> Self {
        Self {
            left,
            right,
            closed: false,
        }
    }

    fn get_mut(&mut self, side: Side) -> &mut dyn RowStream {
        match side {
            Side::Left => self.left.as_mut(),
            Side::Right => self.right.as_mut(),
        }
    }

    fn is_closed(&self) -> bool {
        self.closed
    }

    /// Closes the left, then the right input. Returns the first error, logs the second.
    fn close(&mut self) -> ExecutionResult<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;

        let left = self.left.close().map_err(|source| ExecutionError::Close {
            side: Side::Left,
            source: Box::new(source),
        });
        let right = self.right.close().map_err(|source| ExecutionError::Close {
            side: Side::Right,
            source: Box::new(source),
        });

        match (left, right) {
            (Ok(()), Ok(())) => Ok(()),
            (Err(error), Ok(())) | (Ok(()), Err(error)) => Err(error),
            (Err(error), Err(second)) => {
                warn!(error = %second, "Failed to close the right join input");
                Err(error)
            }
        }
    }

    /// Closes the inputs while the join is being dropped.
    fn close_on_drop(&mut self) {
        if let Err(error) = self.close() {
            warn!(%error, "Failed to close join inputs on drop");
        }
    }
}
