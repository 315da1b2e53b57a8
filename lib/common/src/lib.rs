//! Types shared between the logical and the physical layer of RDF Weave.

pub mod error;

pub use error::{ExecutionError, Side, StorageError};

/// The result of pulling rows from a binding stream.
pub type ExecutionResult<T> = Result<T, ExecutionError>;
