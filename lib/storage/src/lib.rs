#![doc(test(attr(deny(warnings))))]

//! Storage for RDF Weave.
//!
//! The storage layer owns the term dictionary ([TermIdMapping]) and provides the leaves of a query
//! plan: given an [AtomicPattern](rdf_weave_logical::AtomicPattern), a [PatternSource] produces
//! the matching bindings as a [RowList](rdf_weave_physical::RowList). The bundled
//! [MemQuadStore] keeps several sorted permutations of its quads so that most scans produce rows
//! that are already sorted and can be fed into a merge join.

mod index;
mod mapping;
mod source;
mod store;

pub use index::{
    EncodedQuad, IndexComponent, IndexComponents, IndexComponentsCreationError,
    IndexPermutations, IndexQuad, QuadIndex,
};
pub use mapping::TermIdMapping;
pub use source::PatternSource;
pub use store::{MemQuadStore, PatternScan};
