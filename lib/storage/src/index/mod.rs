//! Sorted quad indexes.
//!
//! A quad index represents a particular sorting of the quad components graph name, subject,
//! predicate, and object. For example, the [IndexComponents::GSPO] index represents that exact
//! ordering while the [IndexComponents::GPOS] has the predicate as the second component. A scan
//! of an index returns its quads in lexicographic order of the index components. Different
//! patterns are therefore better served by different indexes, which is what [IndexPermutations]
//! takes care of.

mod components;
mod permutations;

pub use components::*;
pub use permutations::*;

use rdf_weave_model::TermId;
use std::collections::BTreeSet;
use std::ops::Bound;

/// Represents a quad with encoded terms in GSPO order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EncodedQuad<T> {
    /// The graph name.
    pub graph_name: T,
    /// The subject.
    pub subject: T,
    /// The predicate.
    pub predicate: T,
    /// The object.
    pub object: T,
}

impl<T: Clone> EncodedQuad<T> {
    /// Returns the term at `component`.
    pub fn get(&self, component: IndexComponent) -> T {
        match component {
            IndexComponent::GraphName => self.graph_name.clone(),
            IndexComponent::Subject => self.subject.clone(),
            IndexComponent::Predicate => self.predicate.clone(),
            IndexComponent::Object => self.object.clone(),
        }
    }

    /// Applies `f` to every term.
    pub fn map<U>(&self, f: impl Fn(&T) -> U) -> EncodedQuad<U> {
        EncodedQuad {
            graph_name: f(&self.graph_name),
            subject: f(&self.subject),
            predicate: f(&self.predicate),
            object: f(&self.object),
        }
    }

    /// Creates a new [IndexQuad] for an index with the given `components`.
    pub fn for_index(&self, components: IndexComponents) -> IndexQuad<T> {
        IndexQuad(components.inner().map(|component| self.get(component)))
    }
}

/// A quad whose terms are ordered for some index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IndexQuad<T>(pub [T; 4]);

impl<T: Copy> IndexQuad<T> {
    /// Restores the GSPO order of a quad that has been ordered for `components`.
    pub fn to_encoded(&self, components: IndexComponents) -> EncodedQuad<T> {
        let mut gspo = self.0;
        for (component, term) in components.inner().iter().zip(self.0) {
            gspo[component.gspo_index()] = term;
        }
        let [graph_name, subject, predicate, object] = gspo;
        EncodedQuad {
            graph_name,
            subject,
            predicate,
            object,
        }
    }
}

/// A single quad index with a given ordering.
///
/// The quads are kept in a [BTreeSet], hence a scan for a prefix of the index components is a
/// range scan.
#[derive(Debug, Clone)]
pub struct QuadIndex {
    components: IndexComponents,
    quads: BTreeSet<IndexQuad<TermId>>,
}

impl QuadIndex {
    /// Creates a new empty [QuadIndex].
    pub fn new(components: IndexComponents) -> Self {
        Self {
            components,
            quads: BTreeSet::new(),
        }
    }

    /// Returns the components of the index.
    pub fn components(&self) -> IndexComponents {
        self.components
    }

    /// Returns the total number of quads.
    pub fn len(&self) -> usize {
        self.quads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.quads.is_empty()
    }

    /// Inserts `quad`. Returns whether the quad was not yet present.
    pub fn insert(&mut self, quad: &EncodedQuad<TermId>) -> bool {
        self.quads.insert(quad.for_index(self.components))
    }

    /// Removes `quad`. Returns whether the quad was present.
    pub fn remove(&mut self, quad: &EncodedQuad<TermId>) -> bool {
        self.quads.remove(&quad.for_index(self.components))
    }

    pub fn contains(&self, quad: &EncodedQuad<TermId>) -> bool {
        self.quads.contains(&quad.for_index(self.components))
    }

    /// Computes the "scan score" for the given `pattern`.
    ///
    /// The score is the number of leading index components that `pattern` binds. The higher the
    /// score, the smaller the range that has to be scanned.
    pub fn compute_scan_score(&self, pattern: &EncodedQuad<Option<TermId>>) -> usize {
        pattern
            .for_index(self.components)
            .0
            .iter()
            .take_while(|term| term.is_some())
            .count()
    }

    /// Returns the first quad that starts with `prefix` and is greater than `after`.
    ///
    /// Repeatedly calling this method with the previous result enumerates the range of `prefix`
    /// in index order without holding a borrow of the index between calls.
    pub fn next_in_range(
        &self,
        prefix: &[TermId],
        after: Option<&IndexQuad<TermId>>,
    ) -> Option<&IndexQuad<TermId>> {
        let upper = Self::pad(prefix, TermId::MAX);
        let lower = match after {
            Some(after) => Bound::Excluded(*after),
            None => Bound::Included(Self::pad(prefix, TermId::MIN)),
        };
        self.quads.range((lower, Bound::Included(upper))).next()
    }

    fn pad(prefix: &[TermId], fill: TermId) -> IndexQuad<TermId> {
        let mut terms = [fill; 4];
        for (slot, term) in terms.iter_mut().zip(prefix) {
            *slot = *term;
        }
        IndexQuad(terms)
    }
}
