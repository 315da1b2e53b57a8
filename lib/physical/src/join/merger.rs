use crate::Row;

/// Combines a left and a right row into a result row.
///
/// Returning [None] means that the two rows are incompatible. This is a regular join miss and not
/// an error. Closures with the signature `Fn(&Row, &Row) -> Option<Row>` implement this trait.
pub trait RowMerger {
    fn merge(&self, left: &Row, right: &Row) -> Option<Row>;
}

impl<F> RowMerger for F
where
    F: Fn(&Row, &Row) -> Option<Row>,
{
    fn merge(&self, left: &Row, right: &Row) -> Option<Row> {
        self(left, right)
    }
}

/// Merges rows that agree on every shared variable into the union of their bindings.
#[derive(Debug, Clone, Copy, Default)]
pub struct CompatibleMerge;

impl RowMerger for CompatibleMerge {
    fn merge(&self, left: &Row, right: &Row) -> Option<Row> {
        left.merge(right)
    }
}
