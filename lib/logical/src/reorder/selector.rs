use crate::reorder::{FixedReorder, IdentityReorder, ReorderTransformation, WeightedReorder};
use crate::ReorderError;
use std::convert::Infallible;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, warn};

/// Selects a [ReorderTransformation].
///
/// A selector is usually parsed from a key: `none` selects the identity, `fixed` selects the
/// static heuristic, and any other key is interpreted as the path of a statistics file.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ReorderSelector {
    /// Keep the patterns in the order they are written.
    Identity,
    /// Use the static heuristic.
    #[default]
    Fixed,
    /// Use the statistics file at this path. The file must exist.
    Weighted(PathBuf),
    /// Discover the transformation from the marker files in this database directory.
    Discover(PathBuf),
}

impl ReorderSelector {
    /// The key that selects [ReorderSelector::Identity].
    pub const NONE_KEY: &'static str = "none";
    /// The key that selects [ReorderSelector::Fixed].
    pub const FIXED_KEY: &'static str = "fixed";

    /// Marker file that disables reordering for a database directory.
    pub const NONE_FILE: &'static str = "none.opt";
    /// Statistics file of a database directory.
    pub const STATS_FILE: &'static str = "stats.opt";
    /// Marker file that selects the static heuristic for a database directory.
    pub const FIXED_FILE: &'static str = "fixed.opt";

    pub fn from_key(key: &str) -> Self {
        match key {
            Self::NONE_KEY => ReorderSelector::Identity,
            Self::FIXED_KEY => ReorderSelector::Fixed,
            path => ReorderSelector::Weighted(PathBuf::from(path)),
        }
    }

    /// Creates the selected transformation.
    ///
    /// # Errors
    ///
    /// A [ReorderSelector::Weighted] selector fails if its statistics file is missing or
    /// malformed. This happens before any query runs.
    pub fn build(&self) -> Result<Arc<dyn ReorderTransformation>, ReorderError> {
        let reorder: Arc<dyn ReorderTransformation> = match self {
            ReorderSelector::Identity => Arc::new(IdentityReorder),
            ReorderSelector::Fixed => Arc::new(FixedReorder),
            ReorderSelector::Weighted(path) => {
                let reorder = WeightedReorder::load(path)?;
                debug!(path = %path.display(), "Statistics-based BGP optimizer");
                Arc::new(reorder)
            }
            ReorderSelector::Discover(dir) => Self::discover(dir),
        };
        Ok(reorder)
    }

    /// Chooses the transformation of a database directory.
    ///
    /// - If `stats.opt` exists and can be loaded, the weighted reorderer is used. A malformed
    ///   statistics file is logged and ignored.
    /// - Otherwise, if `fixed.opt` exists, the static heuristic is used.
    /// - `none.opt` disables reordering and takes precedence over both files.
    /// - Without any of these files, the static heuristic is used.
    pub fn discover(dir: &Path) -> Arc<dyn ReorderTransformation> {
        let mut reorder: Option<Arc<dyn ReorderTransformation>> = None;

        let stats = dir.join(Self::STATS_FILE);
        if stats.exists() {
            match WeightedReorder::load(&stats) {
                Ok(weighted) => {
                    debug!(path = %stats.display(), "Statistics-based BGP optimizer");
                    reorder = Some(Arc::new(weighted));
                }
                Err(error) => warn!(path = %stats.display(), %error, "Error in stats file"),
            }
        }

        if reorder.is_none() && dir.join(Self::FIXED_FILE).exists() {
            debug!("Fixed pattern BGP optimizer");
            reorder = Some(Arc::new(FixedReorder));
        }

        if dir.join(Self::NONE_FILE).exists() {
            debug!("Optimizer explicitly turned off");
            reorder = Some(Arc::new(IdentityReorder));
        }

        match reorder {
            Some(reorder) => reorder,
            None => Arc::new(FixedReorder),
        }
    }
}

impl FromStr for ReorderSelector {
    type Err = Infallible;

    fn from_str(key: &str) -> Result<Self, Self::Err> {
        Ok(Self::from_key(key))
    }
}

impl Display for ReorderSelector {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ReorderSelector::Identity => f.write_str(Self::NONE_KEY),
            ReorderSelector::Fixed => f.write_str(Self::FIXED_KEY),
            ReorderSelector::Weighted(path) => write!(f, "{}", path.display()),
            ReorderSelector::Discover(dir) => write!(f, "discover({})", dir.display()),
        }
    }
}
