use oxrdfio::RdfParseError;
use rdf_weave_common::{ExecutionError, StorageError};
use rdf_weave_logical::ReorderError;
use rdf_weave_model::IriParseError;
use std::io;

/// An error raised while setting up or executing a basic graph pattern.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum EngineError {
    /// The reorderer could not be created.
    #[error(transparent)]
    Reorder(#[from] ReorderError),
    /// Producing or joining the rows failed.
    #[error(transparent)]
    Execution(#[from] ExecutionError),
    /// A pattern could not be evaluated or a term could not be decoded.
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// An error raised while loading a file into a [`MemQuadStore`](rdf_weave_storage::MemQuadStore).
#[derive(Debug, thiserror::Error)]
pub enum LoaderError {
    /// An error raised while reading the file.
    #[error(transparent)]
    Parsing(#[from] RdfParseError),
    /// The base IRI is invalid.
    #[error("Invalid base IRI '{iri}': {error}")]
    InvalidBaseIri {
        /// The IRI itself.
        iri: String,
        /// The parsing error.
        #[source]
        error: IriParseError,
    },
    /// The quads could not be stored.
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl From<LoaderError> for io::Error {
    #[inline]
    fn from(error: LoaderError) -> Self {
        match error {
            LoaderError::Parsing(error) => error.into(),
            LoaderError::InvalidBaseIri { .. } => {
                Self::new(io::ErrorKind::InvalidInput, error.to_string())
            }
            LoaderError::Storage(error) => error.into(),
        }
    }
}
