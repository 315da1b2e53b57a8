use rdf_weave_common::error::StorageError;
use rdf_weave_logical::AtomicPattern;
use rdf_weave_model::{Term, TermId};
use rdf_weave_physical::RowList;
use std::fmt::Debug;

/// Produces the bindings of single patterns and decodes the ids that appear in them.
///
/// A source is shared by all queries that run against it. Evaluating a pattern must therefore not
/// require exclusive access.
pub trait PatternSource: Debug + Send + Sync {
    /// Evaluates `pattern` and returns all of its solutions.
    ///
    /// Triple patterns (patterns without a graph slot) only match the default graph. A variable in
    /// the graph slot only matches named graphs. A pattern that binds the same variable in
    /// multiple slots only returns rows where all of these slots hold the same term.
    ///
    /// The returned [RowList] should advertise its sort order if the source knows it, as this
    /// allows the caller to use merge joins.
    fn evaluate(&self, pattern: &AtomicPattern) -> Result<RowList, StorageError>;

    /// Decodes `term_id` into the term it identifies.
    fn decode_term(&self, term_id: TermId) -> Result<Term, StorageError>;
}
