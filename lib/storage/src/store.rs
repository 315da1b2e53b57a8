use crate::index::{
    EncodedQuad, IndexComponent, IndexComponents, IndexPermutations, IndexQuad, QuadIndex,
};
use crate::{PatternSource, TermIdMapping};
use rdf_weave_common::error::StorageError;
use rdf_weave_common::ExecutionResult;
use rdf_weave_logical::{AtomicPattern, PatternSlot};
use rdf_weave_model::{GraphNameRef, Quad, QuadRef, Term, TermId, Variable};
use rdf_weave_physical::{Row, RowList, RowStream, VariableSet};
use std::fmt::{Debug, Formatter};
use std::sync::Arc;
use tracing::debug;

/// An in-memory quad store that keeps multiple sorted permutations of its quads.
///
/// Evaluating a pattern scans the permutation with the longest bound prefix. The rows of a scan
/// are therefore sorted by the pattern's variables in the order in which they appear in the chosen
/// permutation. The returned [RowList] carries this order.
///
/// Scans are lazy and work on a snapshot: inserting quads while a scan is running does not affect
/// the scan.
#[derive(Debug, Clone, Default)]
pub struct MemQuadStore {
    mapping: Arc<TermIdMapping>,
    indexes: IndexPermutations,
}

impl MemQuadStore {
    /// Creates an empty store with the GSPO, GPOS, and GOSP permutations.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty store that maintains the given `indexes`.
    pub fn with_indexes(indexes: IndexPermutations) -> Self {
        Self {
            mapping: Arc::new(TermIdMapping::new()),
            indexes,
        }
    }

    /// Returns the term dictionary of this store.
    pub fn mapping(&self) -> &Arc<TermIdMapping> {
        &self.mapping
    }

    /// Returns the orderings of the maintained permutations.
    pub fn index_components(&self) -> Vec<IndexComponents> {
        self.indexes.components()
    }

    pub fn len(&self) -> usize {
        self.indexes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indexes.is_empty()
    }

    /// Inserts `quad`. Returns whether the quad was not yet present.
    ///
    /// # Errors
    ///
    /// Returns an error if the term dictionary cannot issue ids for the new terms of `quad`.
    pub fn insert<'a>(&mut self, quad: impl Into<QuadRef<'a>>) -> Result<bool, StorageError> {
        let quad = self.mapping.encode_quad(quad.into())?;
        Ok(self.indexes.insert(&quad))
    }

    /// Inserts all `quads`. Returns the number of quads that were not yet present.
    ///
    /// Quads before a failing quad stay inserted.
    pub fn extend(
        &mut self,
        quads: impl IntoIterator<Item = Quad>,
    ) -> Result<usize, StorageError> {
        let mut inserted = 0;
        for quad in quads {
            if self.insert(&quad)? {
                inserted += 1;
            }
        }
        Ok(inserted)
    }

    /// Removes `quad`. Returns whether the quad was present.
    ///
    /// The terms of the quad stay in the dictionary.
    pub fn remove<'a>(&mut self, quad: impl Into<QuadRef<'a>>) -> bool {
        match self.try_encode_quad(quad.into()) {
            Some(quad) => self.indexes.remove(&quad),
            None => false,
        }
    }

    pub fn contains<'a>(&self, quad: impl Into<QuadRef<'a>>) -> bool {
        self.try_encode_quad(quad.into())
            .is_some_and(|quad| self.indexes.contains(&quad))
    }

    /// Creates a lazy scan over the solutions of `pattern`.
    pub fn scan(&self, pattern: &AtomicPattern) -> PatternScan {
        let Some(slots) = self.encode_pattern(pattern) else {
            debug!(%pattern, "Pattern contains a term that is not stored");
            // An empty result is sorted on any order.
            let mut sort_order = Vec::new();
            for variable in pattern.variables() {
                if !sort_order.contains(variable) {
                    sort_order.push(variable.clone());
                }
            }
            return PatternScan {
                state: None,
                sort_order,
            };
        };

        let bound = slots.map(ScanSlot::bound);
        let index = self.indexes.choose_index(&bound);
        let components = index.components();
        let prefix_len = index.compute_scan_score(&bound);
        debug!(%pattern, index = %components, prefix_len, "Scanning quad index");

        let IndexQuad(slots) = slots.for_index(components);
        let prefix = slots[..prefix_len]
            .iter()
            .filter_map(ScanSlot::bound)
            .collect();
        let graph_position = components.position(IndexComponent::GraphName);

        let mut sort_order = Vec::new();
        for slot in &slots {
            if let ScanSlot::Variable(variable) = slot {
                if !sort_order.contains(variable) {
                    sort_order.push(variable.clone());
                }
            }
        }

        PatternScan {
            state: Some(ScanState {
                index: Arc::clone(index),
                prefix,
                named_graphs_only: slots[graph_position].bound().is_none(),
                graph_position,
                slots,
                last: None,
            }),
            sort_order,
        }
    }

    fn try_encode_quad(&self, quad: QuadRef<'_>) -> Option<EncodedQuad<TermId>> {
        let graph_name = match quad.graph_name {
            GraphNameRef::DefaultGraph => TermId::DEFAULT_GRAPH,
            GraphNameRef::NamedNode(nn) => self.mapping.try_get_term_id(nn)?,
            GraphNameRef::BlankNode(bnode) => self.mapping.try_get_term_id(bnode)?,
        };
        Some(EncodedQuad {
            graph_name,
            subject: self.mapping.try_get_term_id(quad.subject)?,
            predicate: self.mapping.try_get_term_id(quad.predicate)?,
            object: self.mapping.try_get_term_id(quad.object)?,
        })
    }

    /// Encodes the slots of `pattern`. Returns `None` if a bound term has never been stored.
    fn encode_pattern(&self, pattern: &AtomicPattern) -> Option<EncodedQuad<ScanSlot>> {
        let graph_name = match pattern.graph() {
            None => ScanSlot::Bound(TermId::DEFAULT_GRAPH),
            Some(slot) => self.encode_slot(slot)?,
        };
        Some(EncodedQuad {
            graph_name,
            subject: self.encode_slot(pattern.subject())?,
            predicate: self.encode_slot(pattern.predicate())?,
            object: self.encode_slot(pattern.object())?,
        })
    }

    fn encode_slot(&self, slot: &PatternSlot) -> Option<ScanSlot> {
        match slot {
            PatternSlot::Term(term) => self.mapping.try_get_term_id(term).map(ScanSlot::Bound),
            PatternSlot::Variable(variable) => Some(ScanSlot::Variable(variable.clone())),
        }
    }
}

impl PatternSource for MemQuadStore {
    fn evaluate(&self, pattern: &AtomicPattern) -> Result<RowList, StorageError> {
        let variables = pattern.variables().cloned().collect::<VariableSet>();
        let scan = self.scan(pattern);
        let sort_order = scan.sort_order().to_vec();
        Ok(RowList::from_stream(variables, scan).with_sort_order(sort_order))
    }

    fn decode_term(&self, term_id: TermId) -> Result<Term, StorageError> {
        self.mapping.decode_term(term_id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum ScanSlot {
    Bound(TermId),
    Variable(Variable),
}

impl ScanSlot {
    fn bound(&self) -> Option<TermId> {
        match self {
            ScanSlot::Bound(term_id) => Some(*term_id),
            ScanSlot::Variable(_) => None,
        }
    }
}

/// A lazy scan over the quads of a [QuadIndex] that match a pattern.
///
/// The scan keeps the scanned index alive but does not borrow it. Each call to
/// [Iterator::next] seeks to the first quad after the previously returned one.
pub struct PatternScan {
    state: Option<ScanState>,
    sort_order: Vec<Variable>,
}

struct ScanState {
    index: Arc<QuadIndex>,
    /// The bound terms that form a prefix of the index order.
    prefix: Vec<TermId>,
    /// The pattern slots, in index order.
    slots: [ScanSlot; 4],
    graph_position: usize,
    /// Set if the graph slot is a variable, which never binds the default graph.
    named_graphs_only: bool,
    last: Option<IndexQuad<TermId>>,
}

impl PatternScan {
    /// Returns the variables by which the rows of this scan are sorted.
    pub fn sort_order(&self) -> &[Variable] {
        &self.sort_order
    }
}

impl ScanState {
    fn to_row(&self, quad: &IndexQuad<TermId>) -> Option<Row> {
        if self.named_graphs_only && quad.0[self.graph_position].is_default_graph() {
            return None;
        }

        let mut bindings = Vec::with_capacity(4);
        for (slot, term_id) in self.slots.iter().zip(quad.0) {
            match slot {
                ScanSlot::Bound(bound) if *bound != term_id => return None,
                ScanSlot::Bound(_) => {}
                ScanSlot::Variable(variable) => bindings.push((variable.clone(), term_id)),
            }
        }

        // Fails if a repeated variable matched different terms.
        Row::try_new(bindings).ok()
    }
}

impl Iterator for PatternScan {
    type Item = ExecutionResult<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let state = self.state.as_mut()?;
            let Some(quad) = state
                .index
                .next_in_range(&state.prefix, state.last.as_ref())
                .copied()
            else {
                self.state = None;
                return None;
            };
            state.last = Some(quad);

            if let Some(row) = state.to_row(&quad) {
                return Some(Ok(row));
            }
        }
    }
}

impl RowStream for PatternScan {
    fn close(&mut self) -> ExecutionResult<()> {
        self.state = None;
        Ok(())
    }
}

impl Debug for PatternScan {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let index = self
            .state
            .as_ref()
            .map(|state| state.index.components().to_string());
        f.debug_struct("PatternScan")
            .field("index", &index)
            .field("sort_order", &self.sort_order)
            .finish()
    }
}
