use crate::index::{EncodedQuad, IndexComponents, QuadIndex};
use rdf_weave_model::TermId;
use std::sync::Arc;

/// Represents a set of multiple indexes, each of which indexes a different ordering of the quad
/// components (e.g., GSPO, GPOS). This is necessary as different patterns require different index
/// structures.
///
/// For example, the pattern `<S> <P> ?o` can be best served by a GSPO index. The scan would then
/// look up `<S>` and `<P>` and enumerate the entries binding `?o`. However, the pattern
/// `?s <P> <O>` cannot be efficiently evaluated with a GSPO index. For this pattern, the store
/// should use a GPOS index.
///
/// Each index is shared behind an [Arc]. Running scans keep their index alive, while updates clone
/// an index that is still being scanned. Scans therefore see the state at the time they started.
#[derive(Debug, Clone)]
pub struct IndexPermutations {
    primary: Arc<QuadIndex>,
    secondary: Vec<Arc<QuadIndex>>,
}

impl IndexPermutations {
    /// Creates a new [IndexPermutations].
    ///
    /// The `primary` index wins ties when choosing an index for a scan. Duplicate permutations are
    /// ignored.
    pub fn new(
        primary: IndexComponents,
        secondary: impl IntoIterator<Item = IndexComponents>,
    ) -> Self {
        let mut seen = vec![primary];
        let mut indexes = Vec::new();
        for components in secondary {
            if !seen.contains(&components) {
                seen.push(components);
                indexes.push(Arc::new(QuadIndex::new(components)));
            }
        }

        Self {
            primary: Arc::new(QuadIndex::new(primary)),
            secondary: indexes,
        }
    }

    /// Returns the orderings of all maintained indexes, the primary index first.
    pub fn components(&self) -> Vec<IndexComponents> {
        self.iter().map(|index| index.components()).collect()
    }

    /// Finds an index with the given `components`.
    pub fn find_index(&self, components: IndexComponents) -> Option<&Arc<QuadIndex>> {
        self.iter().find(|index| index.components() == components)
    }

    /// Chooses the index for scanning the given `pattern`.
    ///
    /// `pattern` holds the bound terms in GSPO order. The index with the highest scan score wins.
    /// On equality, the index that comes first is chosen.
    pub fn choose_index(&self, pattern: &EncodedQuad<Option<TermId>>) -> &Arc<QuadIndex> {
        let mut best = &self.primary;
        let mut best_score = best.compute_scan_score(pattern);
        for index in &self.secondary {
            let score = index.compute_scan_score(pattern);
            if score > best_score {
                best = index;
                best_score = score;
            }
        }
        best
    }

    pub fn len(&self) -> usize {
        self.primary.len()
    }

    pub fn is_empty(&self) -> bool {
        self.primary.is_empty()
    }

    pub fn contains(&self, quad: &EncodedQuad<TermId>) -> bool {
        self.primary.contains(quad)
    }

    /// Inserts `quad` into all indexes. Returns whether the quad was not yet present.
    pub fn insert(&mut self, quad: &EncodedQuad<TermId>) -> bool {
        if self.contains(quad) {
            return false;
        }
        for index in self.iter_mut() {
            Arc::make_mut(index).insert(quad);
        }
        true
    }

    /// Removes `quad` from all indexes. Returns whether the quad was present.
    pub fn remove(&mut self, quad: &EncodedQuad<TermId>) -> bool {
        if !self.contains(quad) {
            return false;
        }
        for index in self.iter_mut() {
            Arc::make_mut(index).remove(quad);
        }
        true
    }

    fn iter(&self) -> impl Iterator<Item = &Arc<QuadIndex>> {
        std::iter::once(&self.primary).chain(self.secondary.iter())
    }

    fn iter_mut(&mut self) -> impl Iterator<Item = &mut Arc<QuadIndex>> {
        std::iter::once(&mut self.primary).chain(self.secondary.iter_mut())
    }
}

impl Default for IndexPermutations {
    fn default() -> Self {
        Self::new(
            IndexComponents::GSPO,
            [IndexComponents::GPOS, IndexComponents::GOSP],
        )
    }
}
