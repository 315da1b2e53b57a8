use std::error::Error;
use std::io;

/// Identifies one of the two operands of a binary operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Left,
    Right,
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::Left => f.write_str("left"),
            Side::Right => f.write_str("right"),
        }
    }
}

/// An error raised while producing or consuming a stream of bindings.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ExecutionError {
    /// A merge join detected that one of its inputs is not sorted on the join key.
    #[error("The {side} input of the merge join is not sorted on the join key (row {row})")]
    UnsortedInput {
        /// The input that violated the ordering.
        side: Side,
        /// The 1-based position of the offending row within its input.
        row: u64,
    },
    /// A merge join pulled a row that leaves one of the join key variables unbound.
    #[error("The {side} input of the merge join leaves the key variable {variable} unbound (row {row})")]
    UnboundJoinKey {
        /// The input that produced the row.
        side: Side,
        /// The 1-based position of the offending row within its input.
        row: u64,
        /// The first key variable the row does not bind.
        variable: rdf_weave_model::Variable,
    },
    /// Releasing the resources of a stream failed.
    #[error("Closing the {side} input failed: {source}")]
    Close {
        /// The input whose close failed.
        side: Side,
        #[source]
        source: Box<ExecutionError>,
    },
    /// An error from the storage layer that produces the bindings.
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// An error related to storage operations (reads, writes...).
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum StorageError {
    /// Error from the OS I/O layer.
    #[error(transparent)]
    Io(#[from] io::Error),
    /// A term id that the dictionary does not know.
    #[error("Unknown term id {0}")]
    UnknownTermId(rdf_weave_model::TermId),
    /// The term dictionary has issued every available term id.
    #[error("The term dictionary has no term ids left")]
    TermIdsExhausted,
    #[error("{0}")]
    Other(#[source] Box<dyn Error + Send + Sync + 'static>),
}

impl StorageError {
    /// Builds an error from a printable error message.
    #[inline]
    pub fn msg(msg: impl Into<String>) -> Self {
        Self::Other(msg.into().into())
    }
}

impl From<StorageError> for io::Error {
    #[inline]
    fn from(error: StorageError) -> Self {
        match error {
            StorageError::Io(error) => error,
            StorageError::UnknownTermId(_) => Self::new(io::ErrorKind::InvalidData, error),
            StorageError::TermIdsExhausted => Self::new(io::ErrorKind::OutOfMemory, error),
            StorageError::Other(error) => Self::other(error),
        }
    }
}
