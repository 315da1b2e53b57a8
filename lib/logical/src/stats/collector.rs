use crate::shape::{PatternShape, SlotShape};
use crate::stats::StatsTable;
use rdf_weave_model::{NamedNode, QuadRef, Subject, Term};
use rustc_hash::{FxHashMap, FxHashSet};

#[derive(Debug, Default)]
struct PredicateStats {
    count: u64,
    subjects: FxHashSet<Subject>,
    objects: FxHashSet<Term>,
}

/// Collects a [StatsTable] from a stream of quads.
///
/// For every predicate `p`, the resulting table contains
/// - `<p> n`: the number of quads with predicate `p`,
/// - `TERM <p> VAR`: the average number of quads per subject,
/// - `VAR <p> TERM`: the average number of quads per object.
///
/// Additionally, it contains the total count and generic shapes for patterns with an unbound
/// predicate. Graph names are ignored.
#[derive(Debug, Default)]
pub struct StatsCollector {
    count: u64,
    subjects: FxHashSet<Subject>,
    objects: FxHashSet<Term>,
    predicates: FxHashMap<NamedNode, PredicateStats>,
}

impl StatsCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a single quad.
    pub fn add(&mut self, quad: QuadRef<'_>) {
        self.count += 1;
        let subject = quad.subject.into_owned();
        let object = quad.object.into_owned();

        let stats = self
            .predicates
            .entry(quad.predicate.into_owned())
            .or_default();
        stats.count += 1;
        stats.subjects.insert(subject.clone());
        stats.objects.insert(object.clone());

        self.subjects.insert(subject);
        self.objects.insert(object);
    }

    /// Returns the number of quads added so far.
    pub fn count(&self) -> u64 {
        self.count
    }

    /// Builds the statistics table.
    pub fn finish(self) -> StatsTable {
        let mut table = StatsTable::new();
        table.set_count(self.count);
        if self.count == 0 {
            return table;
        }

        let count = self.count;
        table.insert(
            PatternShape::triple(SlotShape::Bound, SlotShape::Unbound, SlotShape::Unbound),
            average(count, self.subjects.len()),
        );
        table.insert(
            PatternShape::triple(SlotShape::Unbound, SlotShape::Unbound, SlotShape::Bound),
            average(count, self.objects.len()),
        );
        table.insert(
            PatternShape::triple(SlotShape::Bound, SlotShape::Bound, SlotShape::Bound),
            1.0,
        );

        for (predicate, stats) in self.predicates {
            let named = SlotShape::Named(predicate);
            table.insert(
                PatternShape::triple(SlotShape::Unbound, named.clone(), SlotShape::Unbound),
                average(stats.count, 1),
            );
            table.insert(
                PatternShape::triple(SlotShape::Bound, named.clone(), SlotShape::Unbound),
                average(stats.count, stats.subjects.len()),
            );
            table.insert(
                PatternShape::triple(SlotShape::Unbound, named, SlotShape::Bound),
                average(stats.count, stats.objects.len()),
            );
        }
        table
    }
}

#[allow(
    clippy::cast_precision_loss,
    reason = "Weights are estimates, precision loss is acceptable"
)]
fn average(count: u64, distinct: usize) -> f64 {
    count as f64 / distinct.max(1) as f64
}
