use crate::bgp::BasicPattern;
use crate::reorder::{greedy_reorder, ReorderExplanation, ReorderTransformation};
use crate::shape::PatternShape;

/// Reorders patterns with a static heuristic that does not need statistics.
///
/// Patterns with more bound slots are cheaper. Bound subjects are more selective than bound
/// objects, which are more selective than bound predicates. See [fixed_weight].
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedReorder;

impl ReorderTransformation for FixedReorder {
    fn name(&self) -> &str {
        "fixed"
    }

    fn explain(&self, pattern: &BasicPattern) -> ReorderExplanation {
        greedy_reorder(self.name(), pattern, fixed_weight)
    }
}

/// Estimates the cardinality of a pattern shape from the bound slots only.
///
/// The graph slot is ignored.
pub fn fixed_weight(shape: &PatternShape) -> f64 {
    let subject = shape.subject().is_bound();
    let predicate = shape.predicate().is_bound();
    let object = shape.object().is_bound();

    match (subject, predicate, object) {
        (true, true, true) => 1.0,
        (true, false, true) => 2.0,
        (true, true, false) => 10.0,
        (true, false, false) => 100.0,
        (false, true, true) => 10_000.0,
        (false, false, true) => 100_000.0,
        (false, true, false) => 1_000_000.0,
        (false, false, false) => 1_000_000_000.0,
    }
}
