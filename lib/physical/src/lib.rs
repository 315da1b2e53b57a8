#![doc(test(attr(deny(warnings))))]

//! Contains the binding streams and join operators of RDF Weave.
//!
//! A [Row] binds variables to [TermId](rdf_weave_model::TermId)s, a [RowList] is a
//! variable-tagged sequence of rows, and the [JoinDispatcher](join::JoinDispatcher) combines two
//! row lists either with a streaming merge join or with a hash join.

pub mod join;
mod order;
mod row;
mod row_list;
mod variables;

pub use order::{RowOrder, TermIdOrder};
pub use row::{ConflictingBindingError, Row};
pub use row_list::{RowList, RowStream, VecRowStream};
pub use variables::VariableSet;
