//! The data model shared by all RDF Weave crates.
//!
//! The RDF term model itself is provided by Oxigraph's `oxrdf` and `spargebra` crates and is only
//! re-exported here. The only type defined in this crate is [TermId], the compact handle that
//! bindings carry instead of full RDF terms.

mod term_id;

pub use term_id::{InvalidTermIdError, TermId};

// Re-export some oxrdf types.
pub use oxiri::Iri;
pub use oxrdf::vocab;
pub use oxrdf::{
    BlankNode, BlankNodeRef, GraphName, GraphNameRef, IriParseError, Literal, LiteralRef,
    NamedNode, NamedNodeRef, NamedOrBlankNode, Quad, QuadRef, Subject, Term, TermRef, Triple,
    Variable, VariableNameParseError, VariableRef,
};

// Re-export the query and pattern types of spargebra.
pub use spargebra::algebra::GraphPattern;
pub use spargebra::term::{GraphNamePattern, NamedNodePattern, TermPattern, TriplePattern};
pub use spargebra::{Query, SparqlSyntaxError};
