use std::fmt::{Debug, Display, Formatter};
use thiserror::Error;

/// An opaque handle that identifies an RDF term within a single term dictionary.
///
/// Bindings never carry decoded terms. Two bindings can be compared for equality (and ordered) by
/// only looking at their ids, as long as both ids were issued by the same dictionary. The order of
/// ids is the allocation order and carries no meaning beyond being a total order.
///
/// # Default Graph
///
/// The id `0` ([TermId::DEFAULT_GRAPH]) is reserved for the default graph. Dictionaries start
/// allocating ids for real terms at `1`.
#[derive(Hash, PartialEq, Eq, Clone, Copy, PartialOrd, Ord)]
pub struct TermId(u32);

impl TermId {
    pub const SIZE: usize = 4;
    pub const DEFAULT_GRAPH: TermId = TermId(0);
    pub const MIN: TermId = TermId(0);
    pub const MAX: TermId = TermId(u32::MAX);

    /// Creates a new [TermId] from the raw `value`.
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    pub const fn as_u32(self) -> u32 {
        self.0
    }

    /// Returns whether this id refers to the default graph.
    pub const fn is_default_graph(self) -> bool {
        self.0 == Self::DEFAULT_GRAPH.0
    }

    /// Returns the next id, if there is one.
    pub fn next(self) -> Option<TermId> {
        self.0.checked_add(1).map(TermId)
    }

    pub const fn to_be_bytes(self) -> [u8; TermId::SIZE] {
        self.0.to_be_bytes()
    }
}

impl From<u32> for TermId {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

impl Debug for TermId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl Display for TermId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Error)]
#[error("Invalid term id size.")]
pub struct InvalidTermIdError;

impl TryFrom<&[u8]> for TermId {
    type Error = InvalidTermIdError;

    fn try_from(value: &[u8]) -> Result<Self, Self::Error> {
        TryInto::<[u8; TermId::SIZE]>::try_into(value)
            .map(u32::from_be_bytes)
            .map(Self)
            .map_err(|_| InvalidTermIdError)
    }
}
