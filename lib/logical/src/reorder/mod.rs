//! Reordering of basic graph patterns.
//!
//! A [ReorderTransformation] permutes the atomic patterns of a [BasicPattern] such that cheap and
//! selective patterns are evaluated first. No pattern is ever added, removed, or altered.
//!
//! The [FixedReorder] and [WeightedReorder] both use the same greedy algorithm. They only differ
//! in how they assign weights to pattern shapes:
//! 1. Start with an empty set of bound variables.
//! 2. Compute the effective shape of every remaining pattern, treating variables that are already
//!    bound as bound slots.
//! 3. Pick the pattern with the lowest weight. Ties are broken by the original position.
//! 4. Add the variables of the picked pattern to the bound variables and repeat.

mod fixed;
mod selector;
mod weighted;

use crate::bgp::{AtomicPattern, BasicPattern};
use crate::shape::PatternShape;
use rdf_weave_model::Variable;
use std::collections::BTreeSet;
use std::fmt::{Debug, Display, Formatter};
use tracing::debug;

pub use fixed::{fixed_weight, FixedReorder};
pub use selector::ReorderSelector;
pub use weighted::WeightedReorder;

/// Computes the execution order of the patterns of a [BasicPattern].
///
/// Implementations are immutable and can be shared between concurrent queries.
pub trait ReorderTransformation: Send + Sync + Debug {
    /// A short name for logs and explanations.
    fn name(&self) -> &str;

    /// Reorders `pattern` and explains the chosen order.
    fn explain(&self, pattern: &BasicPattern) -> ReorderExplanation;

    /// Reorders `pattern`.
    fn reorder(&self, pattern: &BasicPattern) -> BasicPattern {
        self.explain(pattern).into_pattern()
    }
}

/// Keeps the order of the patterns as written.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityReorder;

impl ReorderTransformation for IdentityReorder {
    fn name(&self) -> &str {
        "none"
    }

    fn explain(&self, pattern: &BasicPattern) -> ReorderExplanation {
        ReorderExplanation {
            transformation: self.name().to_owned(),
            steps: pattern
                .iter()
                .enumerate()
                .map(|(position, pattern)| ReorderStep {
                    position,
                    pattern: pattern.clone(),
                    weight: None,
                })
                .collect(),
        }
    }

    fn reorder(&self, pattern: &BasicPattern) -> BasicPattern {
        pattern.clone()
    }
}

/// A single pick of a reorderer.
#[derive(Debug, Clone, PartialEq)]
pub struct ReorderStep {
    /// The position of the pattern in the input.
    pub position: usize,
    pub pattern: AtomicPattern,
    /// The weight of the effective shape at the time the pattern was picked.
    pub weight: Option<f64>,
}

/// The result of a [ReorderTransformation] together with the weights that led to it.
#[derive(Debug, Clone, PartialEq)]
pub struct ReorderExplanation {
    transformation: String,
    steps: Vec<ReorderStep>,
}

impl ReorderExplanation {
    /// The name of the transformation that produced this order.
    pub fn transformation(&self) -> &str {
        &self.transformation
    }

    pub fn steps(&self) -> &[ReorderStep] {
        &self.steps
    }

    /// Returns, for each output position, the position of the pattern in the input.
    pub fn permutation(&self) -> Vec<usize> {
        self.steps.iter().map(|step| step.position).collect()
    }

    pub fn into_pattern(self) -> BasicPattern {
        self.steps.into_iter().map(|step| step.pattern).collect()
    }
}

impl Display for ReorderExplanation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Reorder ({})", self.transformation)?;
        for (index, step) in self.steps.iter().enumerate() {
            write!(f, "\n  {index}: #{} {}", step.position, step.pattern)?;
            if let Some(weight) = step.weight {
                write!(f, " [weight={weight}]")?;
            }
        }
        Ok(())
    }
}

/// Greedily picks the cheapest remaining pattern according to `weight`.
fn greedy_reorder(
    transformation: &str,
    pattern: &BasicPattern,
    weight: impl Fn(&PatternShape) -> f64,
) -> ReorderExplanation {
    let mut remaining = pattern.iter().enumerate().collect::<Vec<_>>();
    let mut bound: BTreeSet<Variable> = BTreeSet::new();
    let mut steps = Vec::with_capacity(remaining.len());

    while !remaining.is_empty() {
        // `min_by` returns the first of several equal minima, i.e. the earliest input position.
        let best = remaining
            .iter()
            .enumerate()
            .map(|(index, (_, pattern))| {
                (index, weight(&PatternShape::effective(pattern, &bound)))
            })
            .min_by(|(_, lhs), (_, rhs)| lhs.total_cmp(rhs));
        let Some((index, cost)) = best else {
            break;
        };

        let (position, pattern) = remaining.remove(index);
        bound.extend(pattern.variables().cloned());
        steps.push(ReorderStep {
            position,
            pattern: pattern.clone(),
            weight: Some(cost),
        });
    }

    let explanation = ReorderExplanation {
        transformation: transformation.to_owned(),
        steps,
    };
    debug!(
        transformation,
        permutation = ?explanation.permutation(),
        "Reordered basic graph pattern"
    );
    explanation
}
