use std::collections::HashSet;
use std::fmt::{Display, Formatter};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Duplicate indexed component given.")]
pub struct IndexComponentsCreationError;

/// Represents what part of a quad is indexed at a given position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum IndexComponent {
    /// The graph name
    GraphName,
    /// The subject
    Subject,
    /// The predicate
    Predicate,
    /// The object
    Object,
}

impl IndexComponent {
    /// Returns the position of the component in a GSPO quad.
    pub fn gspo_index(self) -> usize {
        match self {
            IndexComponent::GraphName => 0,
            IndexComponent::Subject => 1,
            IndexComponent::Predicate => 2,
            IndexComponent::Object => 3,
        }
    }
}

impl Display for IndexComponent {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            IndexComponent::GraphName => write!(f, "G"),
            IndexComponent::Subject => write!(f, "S"),
            IndexComponent::Predicate => write!(f, "P"),
            IndexComponent::Object => write!(f, "O"),
        }
    }
}

/// The sort order of a quad index, given as a list of *disjunct* index components.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IndexComponents([IndexComponent; 4]);

impl IndexComponents {
    /// A GSPO index.
    pub const GSPO: IndexComponents = IndexComponents([
        IndexComponent::GraphName,
        IndexComponent::Subject,
        IndexComponent::Predicate,
        IndexComponent::Object,
    ]);

    /// A GPOS index.
    pub const GPOS: IndexComponents = IndexComponents([
        IndexComponent::GraphName,
        IndexComponent::Predicate,
        IndexComponent::Object,
        IndexComponent::Subject,
    ]);

    /// A GOSP index.
    pub const GOSP: IndexComponents = IndexComponents([
        IndexComponent::GraphName,
        IndexComponent::Object,
        IndexComponent::Subject,
        IndexComponent::Predicate,
    ]);

    /// Tries to create a new [IndexComponents].
    ///
    /// Returns an error if an [IndexComponent] appears more than once.
    pub fn try_new(
        components: [IndexComponent; 4],
    ) -> Result<Self, IndexComponentsCreationError> {
        let distinct = components.iter().collect::<HashSet<_>>();
        if distinct.len() != components.len() {
            return Err(IndexComponentsCreationError);
        }

        Ok(IndexComponents(components))
    }

    /// Returns a reference to the inner array.
    pub fn inner(&self) -> &[IndexComponent; 4] {
        &self.0
    }

    /// Returns the position of `component` within this index.
    pub fn position(&self, component: IndexComponent) -> usize {
        self.0
            .iter()
            .position(|candidate| *candidate == component)
            .unwrap_or(component.gspo_index())
    }
}

impl Display for IndexComponents {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for component in self.0.iter() {
            write!(f, "{component}")?;
        }
        Ok(())
    }
}
