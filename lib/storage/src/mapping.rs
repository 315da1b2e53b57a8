use crate::index::EncodedQuad;
use dashmap::mapref::entry::Entry;
use dashmap::{DashMap, DashSet};
use rdf_weave_common::error::StorageError;
use rdf_weave_model::{
    BlankNode, GraphNameRef, Literal, NamedNode, QuadRef, Term, TermId, TermRef,
};
use rustc_hash::FxHasher;
use std::hash::BuildHasherDefault;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

/// The interned representation of a term inside the [TermIdMapping].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum EncodedTerm {
    NamedNode(Arc<str>),
    BlankNode(Arc<str>),
    TypedLiteral(Arc<str>, Arc<str>),
    LangString(Arc<str>, Arc<str>),
}

impl EncodedTerm {
    fn to_term(&self) -> Term {
        match self {
            EncodedTerm::NamedNode(iri) => NamedNode::new_unchecked(iri.as_ref()).into(),
            EncodedTerm::BlankNode(id) => BlankNode::new_unchecked(id.as_ref()).into(),
            EncodedTerm::TypedLiteral(value, datatype) => Literal::new_typed_literal(
                value.as_ref(),
                NamedNode::new_unchecked(datatype.as_ref()),
            )
            .into(),
            EncodedTerm::LangString(value, language) => {
                Literal::new_language_tagged_literal_unchecked(
                    value.as_ref(),
                    language.as_ref(),
                )
                .into()
            }
        }
    }
}

/// Maintains a bidirectional mapping between RDF terms and [TermId]s.
///
/// The mapping happens on two levels: first, all strings are interned, second, the encoded term
/// that refers to the interned strings is mapped to a [TermId].
///
/// # Term Ids
///
/// Ids are allocated from a counter in the order in which terms are first seen. The counter starts
/// at `1` as `0` is reserved for [TermId::DEFAULT_GRAPH]. Once issued, an id never changes, so the
/// mapping can be shared between concurrent readers and writers. The counter never wraps around.
/// Once it is exhausted, encoding a new term fails with [StorageError::TermIdsExhausted].
#[derive(Debug)]
pub struct TermIdMapping {
    /// Contains the next free term id.
    next_id: AtomicU32,
    /// A set for interning strings.
    str_interning: DashSet<Arc<str>>,
    id2term: DashMap<TermId, EncodedTerm, BuildHasherDefault<FxHasher>>,
    term2id: DashMap<EncodedTerm, TermId, BuildHasherDefault<FxHasher>>,
}

impl Default for TermIdMapping {
    fn default() -> Self {
        Self::new()
    }
}

impl TermIdMapping {
    /// Creates a new empty [TermIdMapping].
    pub fn new() -> Self {
        Self {
            next_id: AtomicU32::new(1), // Start at 1 to account for Default Graph.
            str_interning: DashSet::new(),
            id2term: DashMap::with_hasher(BuildHasherDefault::default()),
            term2id: DashMap::with_hasher(BuildHasherDefault::default()),
        }
    }

    /// Returns the number of terms in the mapping.
    pub fn len(&self) -> usize {
        self.id2term.len()
    }

    pub fn is_empty(&self) -> bool {
        self.id2term.is_empty()
    }

    /// Returns the id of `term`, allocating a new one if the term has not been seen before.
    ///
    /// # Errors
    ///
    /// Returns [StorageError::TermIdsExhausted] if a new id is required but none is left.
    pub fn encode_term<'term>(
        &self,
        term: impl Into<TermRef<'term>>,
    ) -> Result<TermId, StorageError> {
        let term = self.obtain_encoded_term(term.into());
        self.obtain_term_id(term)
    }

    /// Returns the id of `graph_name`, allocating a new one if necessary.
    ///
    /// The default graph is always encoded as [TermId::DEFAULT_GRAPH].
    pub fn encode_graph_name(
        &self,
        graph_name: GraphNameRef<'_>,
    ) -> Result<TermId, StorageError> {
        match graph_name {
            GraphNameRef::NamedNode(nn) => self.encode_term(nn),
            GraphNameRef::BlankNode(bnode) => self.encode_term(bnode),
            GraphNameRef::DefaultGraph => Ok(TermId::DEFAULT_GRAPH),
        }
    }

    /// Encodes the entire `quad`.
    pub fn encode_quad(&self, quad: QuadRef<'_>) -> Result<EncodedQuad<TermId>, StorageError> {
        Ok(EncodedQuad {
            graph_name: self.encode_graph_name(quad.graph_name)?,
            subject: self.encode_term(quad.subject)?,
            predicate: self.encode_term(quad.predicate)?,
            object: self.encode_term(quad.object)?,
        })
    }

    /// Returns the id of `term` without allocating one.
    ///
    /// Returns `None` if the term has never been encoded. No stored quad can contain such a term.
    pub fn try_get_term_id<'term>(&self, term: impl Into<TermRef<'term>>) -> Option<TermId> {
        self.try_get_encoded_term(term.into())
            .and_then(|term| self.term2id.get(&term).map(|entry| *entry))
    }

    /// Decodes the given `term_id`.
    ///
    /// # Errors
    ///
    /// Returns an error if the id was not issued by this mapping or refers to the default graph.
    pub fn decode_term(&self, term_id: TermId) -> Result<Term, StorageError> {
        self.id2term
            .get(&term_id)
            .map(|entry| entry.value().to_term())
            .ok_or(StorageError::UnknownTermId(term_id))
    }

    fn try_get_encoded_term(&self, term: TermRef<'_>) -> Option<EncodedTerm> {
        match term {
            TermRef::NamedNode(nn) => self
                .str_interning
                .get(nn.as_str())
                .map(|value| EncodedTerm::NamedNode(value.clone())),
            TermRef::BlankNode(bnode) => self
                .str_interning
                .get(bnode.as_str())
                .map(|value| EncodedTerm::BlankNode(value.clone())),
            TermRef::Literal(lit) => {
                let value = self.str_interning.get(lit.value())?.clone();
                if let Some(language) = lit.language() {
                    let language = self.str_interning.get(language)?.clone();
                    Some(EncodedTerm::LangString(value, language))
                } else {
                    let datatype = self.str_interning.get(lit.datatype().as_str())?.clone();
                    Some(EncodedTerm::TypedLiteral(value, datatype))
                }
            }
        }
    }

    fn obtain_encoded_term(&self, term: TermRef<'_>) -> EncodedTerm {
        match term {
            TermRef::NamedNode(nn) => EncodedTerm::NamedNode(self.intern_str(nn.as_str())),
            TermRef::BlankNode(bnode) => {
                EncodedTerm::BlankNode(self.intern_str(bnode.as_str()))
            }
            TermRef::Literal(lit) => {
                let value = self.intern_str(lit.value());
                if let Some(language) = lit.language() {
                    EncodedTerm::LangString(value, self.intern_str(language))
                } else {
                    EncodedTerm::TypedLiteral(value, self.intern_str(lit.datatype().as_str()))
                }
            }
        }
    }

    fn obtain_term_id(&self, encoded_term: EncodedTerm) -> Result<TermId, StorageError> {
        if let Some(entry) = self.term2id.get(&encoded_term) {
            return Ok(*entry);
        }

        // The entry keeps the shard locked, so two writers cannot allocate ids for the same term.
        match self.term2id.entry(encoded_term.clone()) {
            Entry::Occupied(entry) => Ok(*entry.get()),
            Entry::Vacant(entry) => {
                let term_id = self.allocate_id()?;
                self.id2term.insert(term_id, encoded_term);
                Ok(*entry.insert(term_id))
            }
        }
    }

    fn allocate_id(&self) -> Result<TermId, StorageError> {
        self.next_id
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |id| id.checked_add(1))
            .map(TermId::new)
            .map_err(|_| StorageError::TermIdsExhausted)
    }

    fn intern_str(&self, value: &str) -> Arc<str> {
        if let Some(entry) = self.str_interning.get(value) {
            return entry.clone();
        }

        let result = Arc::<str>::from(value);
        self.str_interning.insert(Arc::clone(&result));
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rdf_weave_model::{GraphName, Quad};

    impl TermIdMapping {
        fn with_next_id(next_id: u32) -> Self {
            Self {
                next_id: AtomicU32::new(next_id),
                ..Self::new()
            }
        }
    }

    #[test]
    fn exhausted_ids_are_an_error() {
        let mapping = TermIdMapping::with_next_id(u32::MAX - 1);
        let a = NamedNode::new_unchecked("http://example.com/a");
        let b = NamedNode::new_unchecked("http://example.com/b");

        let id = mapping.encode_term(&a).unwrap();
        assert_eq!(id, TermId::new(u32::MAX - 1));
        assert!(matches!(
            mapping.encode_term(&b),
            Err(StorageError::TermIdsExhausted)
        ));
        // Known terms are still encoded, and no id was reused.
        assert_eq!(mapping.encode_term(&a).unwrap(), id);
        assert_eq!(mapping.try_get_term_id(&b), None);
        assert_eq!(mapping.len(), 1);
    }

    #[test]
    fn encode_term_is_stable() {
        let mapping = TermIdMapping::new();
        let alice = NamedNode::new_unchecked("http://example.com/alice");

        let first = mapping.encode_term(&alice).unwrap();
        let second = mapping.encode_term(&alice).unwrap();

        assert_eq!(first, second);
        assert_eq!(first, TermId::new(1));
        assert_eq!(mapping.len(), 1);
    }

    #[test]
    fn ids_follow_first_occurrence() {
        let mapping = TermIdMapping::new();
        let a = mapping
            .encode_term(&NamedNode::new_unchecked("http://example.com/a"))
            .unwrap();
        let b = mapping.encode_term(&Literal::new_simple_literal("b")).unwrap();
        let c = mapping.encode_term(&BlankNode::new_unchecked("c")).unwrap();

        assert!(a < b);
        assert!(b < c);
    }

    #[test]
    fn default_graph_has_reserved_id() {
        let mapping = TermIdMapping::new();
        assert_eq!(
            mapping.encode_graph_name(GraphNameRef::DefaultGraph).unwrap(),
            TermId::DEFAULT_GRAPH
        );
        assert!(mapping.is_empty());
    }

    #[test]
    fn decode_round_trips_all_term_kinds() {
        let mapping = TermIdMapping::new();
        let terms: Vec<Term> = vec![
            NamedNode::new_unchecked("http://example.com/a").into(),
            BlankNode::new_unchecked("b1").into(),
            Literal::new_simple_literal("plain").into(),
            Literal::new_language_tagged_literal_unchecked("hallo", "de").into(),
            Literal::new_typed_literal(
                "42",
                NamedNode::new_unchecked("http://www.w3.org/2001/XMLSchema#integer"),
            )
            .into(),
        ];

        for term in terms {
            let id = mapping.encode_term(&term).unwrap();
            assert_eq!(mapping.decode_term(id).unwrap(), term);
        }
    }

    #[test]
    fn literals_with_same_lexical_form_differ() {
        let mapping = TermIdMapping::new();
        let simple = mapping.encode_term(&Literal::new_simple_literal("1")).unwrap();
        let tagged = mapping
            .encode_term(&Literal::new_language_tagged_literal_unchecked("1", "en"))
            .unwrap();
        let iri = mapping.encode_term(&NamedNode::new_unchecked("1")).unwrap();

        assert_ne!(simple, tagged);
        assert_ne!(simple, iri);
    }

    #[test]
    fn lookup_does_not_allocate() {
        let mapping = TermIdMapping::new();
        let unknown = NamedNode::new_unchecked("http://example.com/unknown");

        assert_eq!(mapping.try_get_term_id(&unknown), None);
        assert!(mapping.is_empty());

        let id = mapping.encode_term(&unknown).unwrap();
        assert_eq!(mapping.try_get_term_id(&unknown), Some(id));
    }

    #[test]
    fn decode_unknown_id_fails() {
        let mapping = TermIdMapping::new();
        let result = mapping.decode_term(TermId::new(17));
        assert!(matches!(result, Err(StorageError::UnknownTermId(id)) if id == TermId::new(17)));
        assert!(mapping.decode_term(TermId::DEFAULT_GRAPH).is_err());
    }

    #[test]
    fn encode_quad_uses_default_graph_id() {
        let mapping = TermIdMapping::new();
        let quad = Quad::new(
            NamedNode::new_unchecked("http://example.com/s"),
            NamedNode::new_unchecked("http://example.com/p"),
            NamedNode::new_unchecked("http://example.com/s"),
            GraphName::DefaultGraph,
        );

        let encoded = mapping.encode_quad(quad.as_ref()).unwrap();

        assert_eq!(encoded.graph_name, TermId::DEFAULT_GRAPH);
        assert_eq!(encoded.subject, encoded.object);
        assert_ne!(encoded.subject, encoded.predicate);
    }

    #[test]
    fn concurrent_encoding_issues_one_id_per_term() {
        let mapping = Arc::new(TermIdMapping::new());
        let handles = (0..4)
            .map(|_| {
                let mapping = Arc::clone(&mapping);
                std::thread::spawn(move || {
                    (0..100)
                        .map(|i| {
                            let term = NamedNode::new_unchecked(format!("http://example.com/{i}"));
                            mapping.encode_term(&term).unwrap()
                        })
                        .collect::<Vec<_>>()
                })
            })
            .collect::<Vec<_>>();

        let results = handles
            .into_iter()
            .map(|handle| handle.join().unwrap())
            .collect::<Vec<_>>();

        assert!(results.windows(2).all(|pair| pair[0] == pair[1]));
        assert_eq!(mapping.len(), 100);
    }
}
