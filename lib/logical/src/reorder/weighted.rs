use crate::bgp::BasicPattern;
use crate::reorder::{greedy_reorder, ReorderExplanation, ReorderTransformation};
use crate::stats::StatsTable;
use crate::ReorderError;
use std::path::Path;
use std::sync::Arc;

/// Reorders patterns with the weights of a [StatsTable].
#[derive(Debug, Clone)]
pub struct WeightedReorder {
    stats: Arc<StatsTable>,
}

impl WeightedReorder {
    pub fn new(stats: Arc<StatsTable>) -> Self {
        Self { stats }
    }

    /// Loads the statistics from `path`.
    ///
    /// # Errors
    ///
    /// Fails if the file does not exist or is malformed.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ReorderError> {
        Ok(Self::new(Arc::new(StatsTable::load(path)?)))
    }

    pub fn stats(&self) -> &Arc<StatsTable> {
        &self.stats
    }
}

impl ReorderTransformation for WeightedReorder {
    fn name(&self) -> &str {
        "weighted"
    }

    fn explain(&self, pattern: &BasicPattern) -> ReorderExplanation {
        greedy_reorder(self.name(), pattern, |shape| self.stats.weight(shape))
    }
}
