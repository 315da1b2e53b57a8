//! Pattern statistics for the weighted reorderer.
//!
//! A [StatsTable] maps [PatternShape]s to non-negative weights. Lower weights mean fewer
//! matching quads. The table is loaded once, then only read, and can be shared between concurrent
//! queries behind an [Arc](std::sync::Arc).
//!
//! # File Format
//!
//! Statistics files are line oriented. `#` starts a comment and blank lines are ignored.
//!
//! ```text
//! # Collected over 1200 quads.
//! count 1200
//! # Shorthand for `VAR <http://xmlns.com/foaf/0.1/knows> VAR 300`
//! <http://xmlns.com/foaf/0.1/knows> 300
//! TERM <http://xmlns.com/foaf/0.1/knows> VAR 3
//! VAR <http://www.w3.org/1999/02/22-rdf-syntax-ns#type> TERM 150
//! # Quad shapes have an additional graph slot.
//! <http://example.com/graph> VAR <http://xmlns.com/foaf/0.1/knows> VAR 50
//! # The weight of bound shapes that are not listed.
//! other 5000
//! ```
//!
//! Each slot is `VAR` or `ANY` (unbound), `TERM` (bound to some term), or an IRI (bound to that
//! term, only meaningful for the predicate and graph).

mod collector;
mod parser;

use crate::shape::{PatternShape, SlotShape};
use crate::ReorderError;
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use std::str::FromStr;
use tracing::debug;

pub use collector::StatsCollector;

/// The weight of shapes with at least one bound slot that are not listed in the table.
///
/// If the table records a bound shape with a higher weight, the default is lifted above it. This
/// makes the reorderer prefer listed shapes over unknown ones.
pub const DEFAULT_WEIGHT: f64 = 1_000_000.0;

/// The weight of fully unbound shapes that are not listed, if the table does not know the total
/// number of quads.
pub const UNBOUND_WEIGHT: f64 = 1_000_000_000_000.0;

/// Weights for pattern shapes.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StatsTable {
    count: Option<u64>,
    weights: BTreeMap<PatternShape, f64>,
    other: Option<f64>,
    max_bound_weight: Option<f64>,
}

impl StatsTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads a statistics file.
    ///
    /// # Errors
    ///
    /// Returns [ReorderError::MissingStatistics] if the file does not exist and
    /// [ReorderError::Parse] if it is malformed.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ReorderError> {
        let path = path.as_ref();
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(error) if error.kind() == ErrorKind::NotFound => {
                return Err(ReorderError::MissingStatistics {
                    path: path.to_path_buf(),
                });
            }
            Err(error) => return Err(error.into()),
        };
        let table = content.parse::<StatsTable>()?;
        debug!(
            path = %path.display(),
            entries = table.len(),
            "Loaded pattern statistics"
        );
        Ok(table)
    }

    /// Returns the number of quads the statistics were collected over, if known.
    pub fn count(&self) -> Option<u64> {
        self.count
    }

    pub fn set_count(&mut self, count: u64) {
        self.count = Some(count);
    }

    /// Returns the explicitly configured weight of unlisted bound shapes.
    pub fn other(&self) -> Option<f64> {
        self.other
    }

    pub fn set_other(&mut self, weight: f64) {
        self.other = Some(weight);
    }

    /// Records the weight of `shape`, returning the previous weight.
    pub fn insert(&mut self, shape: PatternShape, weight: f64) -> Option<f64> {
        let bound = shape.has_bound_slot();
        let previous = self.weights.insert(shape, weight);
        if !bound {
            return previous;
        }
        let lowered_max = previous
            .zip(self.max_bound_weight)
            .is_some_and(|(previous, max)| previous == max && weight < previous);
        self.max_bound_weight = if lowered_max {
            self.weights
                .iter()
                .filter(|(shape, _)| shape.has_bound_slot())
                .map(|(_, weight)| *weight)
                .max_by(f64::total_cmp)
        } else {
            Some(self.max_bound_weight.map_or(weight, |max| max.max(weight)))
        };
        previous
    }

    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    /// Iterates over all recorded shapes in a deterministic order.
    pub fn iter(&self) -> impl Iterator<Item = (&PatternShape, f64)> {
        self.weights.iter().map(|(shape, weight)| (shape, *weight))
    }

    /// Looks up the recorded weight of `shape`.
    ///
    /// The exact shape is tried first, then the shape without IRIs. For quad shapes, the same is
    /// repeated for the triple shape without the graph.
    pub fn lookup(&self, shape: &PatternShape) -> Option<f64> {
        let exact = self
            .weights
            .get(shape)
            .or_else(|| self.weights.get(&shape.generalized()));
        match (exact, shape.graph()) {
            (Some(weight), _) => Some(*weight),
            (None, Some(_)) => self.lookup(&shape.without_graph()),
            (None, None) => None,
        }
    }

    /// Returns the weight of `shape`, falling back to [Self::default_weight] or
    /// [Self::unbound_weight] for unlisted shapes.
    ///
    /// An unlisted bound shape never weighs more than the closest listed shape with the same
    /// predicate that leaves its subject or object unbound.
    pub fn weight(&self, shape: &PatternShape) -> f64 {
        match self.lookup(shape) {
            Some(weight) => weight,
            None if shape.has_bound_slot() => {
                let default = self.default_weight();
                self.relaxed_weight(shape)
                    .map_or(default, |relaxed| relaxed.min(default))
            }
            None => self.unbound_weight(),
        }
    }

    /// Looks up the shapes obtained by unbinding the subject or the object of `shape`. If none is
    /// listed, both are unbound at once.
    fn relaxed_weight(&self, shape: &PatternShape) -> Option<f64> {
        let subject = shape.subject().is_bound();
        let object = shape.object().is_bound();
        let nearest = [
            subject.then(|| shape.with_subject(SlotShape::Unbound)),
            object.then(|| shape.with_object(SlotShape::Unbound)),
        ]
        .into_iter()
        .flatten()
        .filter_map(|relaxed| self.lookup(&relaxed))
        .min_by(f64::total_cmp);
        if nearest.is_some() || !(subject && object) {
            return nearest;
        }
        self.lookup(
            &shape
                .with_subject(SlotShape::Unbound)
                .with_object(SlotShape::Unbound),
        )
    }

    /// The weight of unlisted shapes with at least one bound slot.
    pub fn default_weight(&self) -> f64 {
        if let Some(other) = self.other {
            return other;
        }
        match self.max_bound_weight {
            Some(max) if max >= DEFAULT_WEIGHT => max + 1.0,
            _ => DEFAULT_WEIGHT,
        }
    }

    /// The weight of unlisted fully unbound shapes. Always greater than [Self::default_weight].
    #[allow(
        clippy::cast_precision_loss,
        reason = "Weights are estimates, precision loss is acceptable"
    )]
    pub fn unbound_weight(&self) -> f64 {
        let unbound = self.count.map_or(UNBOUND_WEIGHT, |count| count as f64);
        let default = self.default_weight();
        if unbound > default {
            unbound
        } else {
            default + 1.0
        }
    }
}

impl FromStr for StatsTable {
    type Err = ReorderError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        parser::parse_stats(input)
    }
}

impl Display for StatsTable {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "# Pattern statistics")?;
        if let Some(count) = self.count {
            writeln!(f, "count {count}")?;
        }
        for (shape, weight) in &self.weights {
            match (shape.graph(), shape.subject(), shape.predicate(), shape.object()) {
                (None, SlotShape::Unbound, SlotShape::Named(predicate), SlotShape::Unbound) => {
                    writeln!(f, "{predicate} {weight}")?;
                }
                _ => writeln!(f, "{shape} {weight}")?,
            }
        }
        if let Some(other) = self.other {
            writeln!(f, "other {other}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rdf_weave_model::NamedNode;

    fn knows() -> SlotShape {
        SlotShape::Named(NamedNode::new_unchecked("http://example.com/knows"))
    }

    #[test]
    fn lookup_falls_back_to_generic_shape() {
        let mut table = StatsTable::new();
        table.insert(
            PatternShape::triple(SlotShape::Bound, SlotShape::Bound, SlotShape::Unbound),
            7.0,
        );

        let shape = PatternShape::triple(SlotShape::Bound, knows(), SlotShape::Unbound);
        assert_eq!(table.lookup(&shape), Some(7.0));

        let quad = PatternShape::quad(
            SlotShape::Unbound,
            SlotShape::Bound,
            knows(),
            SlotShape::Unbound,
        );
        assert_eq!(table.lookup(&quad), Some(7.0));
    }

    #[test]
    fn default_weight_is_lifted_above_recorded_weights() {
        let mut table = StatsTable::new();
        table.insert(
            PatternShape::triple(SlotShape::Unbound, knows(), SlotShape::Unbound),
            5_000_000.0,
        );

        let unknown = PatternShape::triple(SlotShape::Bound, SlotShape::Unbound, SlotShape::Unbound);
        let unbound =
            PatternShape::triple(SlotShape::Unbound, SlotShape::Unbound, SlotShape::Unbound);
        assert!(table.weight(&unknown) > 5_000_000.0);
        assert!(table.weight(&unbound) > table.weight(&unknown));
    }

    #[test]
    fn unlisted_shape_is_capped_by_less_bound_shape() {
        let table = format!(
            "{} 10\n{} 2000000",
            PatternShape::triple(SlotShape::Unbound, knows(), SlotShape::Bound),
            PatternShape::triple(SlotShape::Unbound, SlotShape::Unbound, SlotShape::Bound),
        )
        .parse::<StatsTable>()
        .unwrap();

        let bound = PatternShape::triple(SlotShape::Bound, knows(), SlotShape::Bound);
        assert!((table.weight(&bound) - 10.0).abs() < f64::EPSILON);

        // Only the lifted default applies if no less bound shape is listed.
        let other = PatternShape::triple(
            SlotShape::Bound,
            SlotShape::Named(NamedNode::new_unchecked("http://example.com/name")),
            SlotShape::Bound,
        );
        assert!((table.weight(&other) - 2_000_001.0).abs() < f64::EPSILON);
    }

    #[test]
    fn fully_relaxed_shape_caps_when_nothing_closer_is_listed() {
        let mut table = StatsTable::new();
        table.insert(
            PatternShape::triple(SlotShape::Unbound, knows(), SlotShape::Unbound),
            300.0,
        );

        let bound = PatternShape::triple(SlotShape::Bound, knows(), SlotShape::Bound);
        assert!((table.weight(&bound) - 300.0).abs() < f64::EPSILON);
    }

    #[test]
    fn max_bound_weight_follows_overrides() {
        let mut table = StatsTable::new();
        let knows_object = PatternShape::triple(SlotShape::Unbound, knows(), SlotShape::Bound);
        let knows_subject = PatternShape::triple(SlotShape::Bound, knows(), SlotShape::Unbound);
        table.insert(knows_object.clone(), 3_000_000.0);
        table.insert(knows_subject, 2_000_000.0);
        assert!((table.default_weight() - 3_000_001.0).abs() < f64::EPSILON);

        assert_eq!(table.insert(knows_object, 5.0), Some(3_000_000.0));
        assert!((table.default_weight() - 2_000_001.0).abs() < f64::EPSILON);
    }

    #[test]
    fn large_tables_load_quickly() {
        let content = (0..50_000)
            .map(|i| format!("TERM <http://example.com/p{i}> VAR {}", 1_000_000 + i))
            .collect::<Vec<_>>()
            .join("\n");

        let start = std::time::Instant::now();
        let table = content.parse::<StatsTable>().unwrap();

        assert_eq!(table.len(), 50_000);
        assert!((table.default_weight() - 1_050_000.0).abs() < f64::EPSILON);
        assert!(start.elapsed() < std::time::Duration::from_secs(10));
    }

    #[test]
    fn unbound_weight_uses_count() {
        let mut table = StatsTable::new();
        table.set_count(2_000_000);
        assert!((table.unbound_weight() - 2_000_000.0).abs() < f64::EPSILON);

        table.set_count(10);
        assert!(table.unbound_weight() > table.default_weight());
    }

    #[test]
    fn other_overrides_default_weight() {
        let mut table = StatsTable::new();
        table.set_other(42.0);
        let unknown = PatternShape::triple(SlotShape::Bound, SlotShape::Unbound, SlotShape::Unbound);
        assert!((table.weight(&unknown) - 42.0).abs() < f64::EPSILON);
    }

    #[test]
    fn missing_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stats.opt");

        let error = StatsTable::load(&path).unwrap_err();
        assert!(matches!(error, ReorderError::MissingStatistics { path: p } if p == path));
    }
}
