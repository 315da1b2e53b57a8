use crate::join::JoinKey;
use crate::Row;
use std::cmp::Ordering;

/// A total order over rows, restricted to the variables of a [JoinKey].
///
/// Implementations must be consistent with a lexicographic order over the values of the key
/// variables: the first key variable decides, then the second, and so on. Rows that agree on all
/// key variables compare as [Ordering::Equal], regardless of any other binding.
///
/// Closures with the signature `Fn(&JoinKey, &Row, &Row) -> Ordering` implement this trait.
pub trait RowOrder {
    /// Compares `lhs` and `rhs` on the variables of `key`.
    fn compare(&self, key: &JoinKey, lhs: &Row, rhs: &Row) -> Ordering;
}

impl<F> RowOrder for F
where
    F: Fn(&JoinKey, &Row, &Row) -> Ordering,
{
    fn compare(&self, key: &JoinKey, lhs: &Row, rhs: &Row) -> Ordering {
        self(key, lhs, rhs)
    }
}

/// Orders rows by the [TermId](rdf_weave_model::TermId)s bound to the key variables.
///
/// An unbound variable sorts before any bound one. This is the order in which the storage layer
/// emits the results of an index scan.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TermIdOrder;

impl RowOrder for TermIdOrder {
    fn compare(&self, key: &JoinKey, lhs: &Row, rhs: &Row) -> Ordering {
        key.iter()
            .map(|variable| lhs.get(variable).cmp(&rhs.get(variable)))
            .find(|ordering| ordering.is_ne())
            .unwrap_or(Ordering::Equal)
    }
}
