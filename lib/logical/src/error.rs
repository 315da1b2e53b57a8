use std::io;
use std::path::PathBuf;

/// An error raised while setting up a pattern reorderer.
///
/// These errors occur before any query runs. They are never swallowed, except when discovering
/// the optimizer of a database directory (see
/// [ReorderSelector::discover](crate::reorder::ReorderSelector::discover)).
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ReorderError {
    /// A statistics file was requested but does not exist.
    #[error("The statistics file {} does not exist", path.display())]
    MissingStatistics {
        /// The path that was looked up.
        path: PathBuf,
    },
    /// Reading a statistics file failed.
    #[error(transparent)]
    Io(#[from] io::Error),
    /// A statistics file is malformed.
    #[error("Invalid statistics on line {line}: {message}")]
    Parse {
        /// The 1-based line number.
        line: usize,
        message: String,
    },
}
