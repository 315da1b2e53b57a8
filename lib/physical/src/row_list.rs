use crate::join::JoinKey;
use crate::{Row, RowOrder, TermIdOrder, VariableSet};
use rdf_weave_common::ExecutionResult;
use rdf_weave_model::Variable;
use std::fmt::{Debug, Formatter};

/// A single-pass producer of rows.
///
/// Pulling the next row may block on the storage layer. Once the consumer is done (either because
/// the stream is exhausted or because it stops early), it must call [RowStream::close] exactly
/// once. Operators that own streams guarantee this, even if they are dropped mid-iteration.
pub trait RowStream: Iterator<Item = ExecutionResult<Row>> {
    /// Releases all resources held by this stream.
    ///
    /// The default implementation does nothing, which is correct for streams that only hold
    /// memory.
    fn close(&mut self) -> ExecutionResult<()> {
        Ok(())
    }
}

impl<S: RowStream + ?Sized> RowStream for Box<S> {
    fn close(&mut self) -> ExecutionResult<()> {
        (**self).close()
    }
}

/// A [RowStream] over rows that are already in memory.
#[derive(Debug)]
pub struct VecRowStream(std::vec::IntoIter<Row>);

impl VecRowStream {
    pub fn new(rows: Vec<Row>) -> Self {
        Self(rows.into_iter())
    }
}

impl Iterator for VecRowStream {
    type Item = ExecutionResult<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        self.0.next().map(Ok)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.0.size_hint()
    }
}

impl RowStream for VecRowStream {}

enum RowSource {
    Materialized(Vec<Row>),
    Stream(Box<dyn RowStream>),
}

/// A sequence of rows, tagged with the variables the rows may bind.
///
/// A row list is either *materialized* (the rows are in memory and can be inspected) or backed by
/// a single-pass [RowStream]. Consuming a row list moves it, so a stream can never be iterated
/// twice. Use [RowList::materialize] to explicitly collect a stream.
///
/// # Sort Order
///
/// A row list may advertise that its rows are sorted by a sequence of variables under the
/// [TermIdOrder]. The join dispatcher itself never inspects this tag (the ordering of merge join
/// inputs is a precondition of the caller), but callers use it to decide whether both operands of
/// a join are sorted on the join key.
pub struct RowList {
    variables: VariableSet,
    sort_order: Option<Vec<Variable>>,
    source: RowSource,
}

impl RowList {
    /// Creates a materialized row list.
    pub fn materialized(variables: VariableSet, rows: Vec<Row>) -> Self {
        Self {
            variables,
            sort_order: None,
            source: RowSource::Materialized(rows),
        }
    }

    /// Creates a row list that is backed by a single-pass `stream`.
    pub fn from_stream(variables: VariableSet, stream: impl RowStream + 'static) -> Self {
        Self {
            variables,
            sort_order: None,
            source: RowSource::Stream(Box::new(stream)),
        }
    }

    /// Creates an empty row list.
    pub fn empty(variables: VariableSet) -> Self {
        Self::materialized(variables, Vec::new())
    }

    /// Tags this row list as sorted by `sort_order` under the [TermIdOrder].
    #[must_use]
    pub fn with_sort_order(mut self, sort_order: Vec<Variable>) -> Self {
        self.sort_order = Some(sort_order);
        self
    }

    /// Returns the variables the rows may bind.
    pub fn variables(&self) -> &VariableSet {
        &self.variables
    }

    /// Returns the advertised sort order, if any.
    pub fn sort_order(&self) -> Option<&[Variable]> {
        self.sort_order.as_deref()
    }

    /// Returns whether the rows are advertised to be sorted on `key`, i.e., whether the key is a
    /// prefix of the sort order.
    pub fn is_sorted_on(&self, key: &JoinKey) -> bool {
        self.sort_order
            .as_deref()
            .is_some_and(|order| order.starts_with(key.variables()))
    }

    pub fn is_materialized(&self) -> bool {
        matches!(self.source, RowSource::Materialized(_))
    }

    /// Returns the rows if this list is materialized.
    pub fn rows(&self) -> Option<&[Row]> {
        match &self.source {
            RowSource::Materialized(rows) => Some(rows),
            RowSource::Stream(_) => None,
        }
    }

    /// Consumes the row list and returns a stream over its rows.
    pub fn into_stream(self) -> Box<dyn RowStream> {
        match self.source {
            RowSource::Materialized(rows) => Box::new(VecRowStream::new(rows)),
            RowSource::Stream(stream) => stream,
        }
    }

    /// Pulls all rows into memory.
    ///
    /// The underlying stream is closed after it has been drained, and also if pulling a row fails.
    pub fn materialize(self) -> ExecutionResult<RowList> {
        let variables = self.variables.clone();
        let sort_order = self.sort_order.clone();
        let rows = self.into_rows()?;
        Ok(RowList {
            variables,
            sort_order,
            source: RowSource::Materialized(rows),
        })
    }

    /// Materializes the row list and returns its rows.
    pub fn into_rows(self) -> ExecutionResult<Vec<Row>> {
        match self.source {
            RowSource::Materialized(rows) => Ok(rows),
            RowSource::Stream(mut stream) => {
                let rows = stream.by_ref().collect::<ExecutionResult<Vec<_>>>();
                let closed = stream.close();
                let rows = rows?;
                closed?;
                Ok(rows)
            }
        }
    }

    /// Materializes the row list and sorts it on `key` with the [TermIdOrder].
    ///
    /// The sort is stable. The result advertises `key` as its sort order.
    pub fn sort_on(self, key: &JoinKey) -> ExecutionResult<RowList> {
        let variables = self.variables.clone();
        let mut rows = self.into_rows()?;
        rows.sort_by(|lhs, rhs| TermIdOrder.compare(key, lhs, rhs));
        Ok(RowList::materialized(variables, rows).with_sort_order(key.variables().to_vec()))
    }
}

impl Debug for RowList {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let mut debug = f.debug_struct("RowList");
        debug
            .field("variables", &self.variables)
            .field("sort_order", &self.sort_order);
        match &self.source {
            RowSource::Materialized(rows) => debug.field("rows", rows),
            RowSource::Stream(_) => debug.field("rows", &"<stream>"),
        };
        debug.finish()
    }
}
