//! Evaluation of basic graph patterns.

use crate::error::EngineError;
use rdf_weave_logical::{
    BasicPattern, ReorderExplanation, ReorderSelector, ReorderTransformation,
};
use rdf_weave_model::{Term, Variable};
use rdf_weave_physical::join::{
    CompatibleMerge, JoinConfig, JoinDispatcher, JoinKey, JoinTraceSink,
};
use rdf_weave_physical::{Row, RowList, TermIdOrder, VariableSet};
use rdf_weave_storage::PatternSource;
use std::fmt::{Debug, Formatter};
use std::sync::Arc;
use tracing::debug;

/// Options for a [BgpEngine].
#[derive(Debug, Clone, Default)]
pub struct EngineOptions {
    /// Selects the transformation that orders the patterns.
    pub reorder: ReorderSelector,
    /// Configures the merge join.
    pub join: JoinConfig,
    /// Sort inputs that are not sorted on their shared variables instead of falling back to a hash
    /// join.
    pub sort_unsorted_inputs: bool,
}

impl EngineOptions {
    #[must_use]
    pub fn with_reorder(mut self, reorder: ReorderSelector) -> Self {
        self.reorder = reorder;
        self
    }

    #[must_use]
    pub fn with_join(mut self, join: JoinConfig) -> Self {
        self.join = join;
        self
    }

    #[must_use]
    pub fn with_sort_unsorted_inputs(mut self, sort_unsorted_inputs: bool) -> Self {
        self.sort_unsorted_inputs = sort_unsorted_inputs;
        self
    }
}

/// Evaluates basic graph patterns against a [PatternSource].
///
/// The engine first reorders the patterns, then evaluates them one by one and joins each result
/// into the result of the previous patterns (a left-deep join tree). The join key of two results
/// is the longest common prefix of their sort orders that only consists of shared variables. If
/// there is such a key, the results are combined with a merge join. Otherwise, they are either
/// sorted on all shared variables (see [EngineOptions::sort_unsorted_inputs]) or combined with a
/// hash join.
///
/// An engine is immutable and can be shared between threads. Every call to [Self::execute]
/// produces an independent result.
#[derive(Clone)]
pub struct BgpEngine {
    source: Arc<dyn PatternSource>,
    reorder: Arc<dyn ReorderTransformation>,
    dispatcher: JoinDispatcher,
    sort_unsorted_inputs: bool,
}

impl BgpEngine {
    /// Creates a new [BgpEngine].
    ///
    /// # Errors
    ///
    /// Returns an error if the reorderer selected in `options` cannot be created, for example
    /// because its statistics file is missing.
    pub fn new(
        source: Arc<dyn PatternSource>,
        options: EngineOptions,
    ) -> Result<Self, EngineError> {
        let reorder = options.reorder.build()?;
        Ok(Self::with_reorder(source, reorder, options))
    }

    /// Creates a new [BgpEngine] that uses an existing `reorder` transformation.
    ///
    /// The [EngineOptions::reorder] field of `options` is ignored.
    pub fn with_reorder(
        source: Arc<dyn PatternSource>,
        reorder: Arc<dyn ReorderTransformation>,
        options: EngineOptions,
    ) -> Self {
        debug!(reorder = reorder.name(), "Creating BGP engine");
        Self {
            source,
            reorder,
            dispatcher: JoinDispatcher::new(options.join),
            sort_unsorted_inputs: options.sort_unsorted_inputs,
        }
    }

    /// Replaces the sink that receives the counters of every join.
    #[must_use]
    pub fn with_trace_sink(mut self, trace: Arc<dyn JoinTraceSink>) -> Self {
        self.dispatcher = self.dispatcher.with_trace_sink(trace);
        self
    }

    pub fn source(&self) -> &Arc<dyn PatternSource> {
        &self.source
    }

    pub fn reorder(&self) -> &Arc<dyn ReorderTransformation> {
        &self.reorder
    }

    /// Returns the order in which [Self::execute] evaluates the patterns of `bgp`.
    pub fn explain(&self, bgp: &BasicPattern) -> ReorderExplanation {
        self.reorder.explain(bgp)
    }

    /// Evaluates `bgp`.
    ///
    /// The result is lazy apart from inputs that had to be sorted. An empty pattern has exactly
    /// one solution that binds no variable.
    pub fn execute(&self, bgp: &BasicPattern) -> Result<RowList, EngineError> {
        let ordered = self.reorder.reorder(bgp);
        debug!(reorder = self.reorder.name(), patterns = ordered.len(), "Executing BGP");

        let mut patterns = ordered.iter();
        let Some(first) = patterns.next() else {
            return Ok(RowList::materialized(VariableSet::new(), vec![Row::empty()])
                .with_sort_order(Vec::new()));
        };

        let mut result = self.source.evaluate(first)?;
        for pattern in patterns {
            let right = self.source.evaluate(pattern)?;
            result = self.join(result, right)?;
        }
        Ok(result)
    }

    /// Decodes the bindings of `row` for `variables`. Unbound variables yield `None`.
    pub fn decode_row(
        &self,
        row: &Row,
        variables: &[Variable],
    ) -> Result<Vec<Option<Term>>, EngineError> {
        row.project(variables)
            .into_iter()
            .map(|id| {
                id.map(|id| self.source.decode_term(id))
                    .transpose()
                    .map_err(EngineError::from)
            })
            .collect()
    }

    fn join(&self, left: RowList, right: RowList) -> Result<RowList, EngineError> {
        let sorted_key = sorted_join_key(&left, &right);
        if let Some(key) = sorted_key {
            return Ok(self.merge_join(&key, left, right));
        }

        let shared = left.variables().intersection(right.variables());
        if self.sort_unsorted_inputs && !shared.is_empty() {
            let key = JoinKey::new(shared);
            debug!(%key, "Sorting join inputs");
            let left = left.sort_on(&key)?;
            let right = right.sort_on(&key)?;
            return Ok(self.merge_join(&key, left, right));
        }

        Ok(self
            .dispatcher
            .join(None, left, right, TermIdOrder, CompatibleMerge))
    }

    fn merge_join(&self, key: &JoinKey, left: RowList, right: RowList) -> RowList {
        self.dispatcher
            .join(Some(key), left, right, TermIdOrder, CompatibleMerge)
            .with_sort_order(key.variables().to_vec())
    }
}

/// Returns the longest common prefix of the sort orders of `left` and `right` that consists of
/// shared variables.
///
/// Both inputs are sorted on this key, hence they can be merge joined. Shared variables that are
/// not part of the key are checked when the rows are merged.
fn sorted_join_key(left: &RowList, right: &RowList) -> Option<JoinKey> {
    let left_order = left.sort_order()?;
    let right_order = right.sort_order()?;
    let key = left_order
        .iter()
        .zip(right_order)
        .take_while(|(lhs, rhs)| {
            lhs == rhs && left.variables().contains(lhs) && right.variables().contains(rhs)
        })
        .map(|(variable, _)| variable.clone())
        .collect::<Vec<_>>();
    (!key.is_empty()).then(|| JoinKey::new(key))
}

impl Debug for BgpEngine {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BgpEngine")
            .field("source", &self.source)
            .field("reorder", &self.reorder.name())
            .field("dispatcher", &self.dispatcher)
            .field("sort_unsorted_inputs", &self.sort_unsorted_inputs)
            .finish()
    }
}
