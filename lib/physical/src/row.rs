use rdf_weave_model::{TermId, Variable};
use std::cmp::Ordering;
use std::fmt::{Debug, Formatter};
use std::sync::Arc;
use thiserror::Error;

/// An immutable set of variable bindings.
///
/// A row maps each of its variables to exactly one [TermId]. Looking up a variable that the row
/// does not bind returns `None`; an unbound variable is not an error.
///
/// The bindings are stored sorted by variable and shared behind an [Arc]. Cloning a row is cheap,
/// which matters for joins that buffer rows.
#[derive(Clone, Default, PartialEq, Eq, Hash)]
pub struct Row {
    bindings: Arc<[(Variable, TermId)]>,
}

/// Returned when a row would bind the same variable to two different terms.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("The variable {variable} is bound to both {first} and {second}.")]
pub struct ConflictingBindingError {
    pub variable: Variable,
    pub first: TermId,
    pub second: TermId,
}

impl Row {
    /// Creates a row without any binding.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Creates a new row from the given `bindings`.
    ///
    /// Binding the same variable twice to the same term is allowed and collapses into a single
    /// binding.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is bound to two different terms.
    pub fn try_new(
        bindings: impl IntoIterator<Item = (Variable, TermId)>,
    ) -> Result<Self, ConflictingBindingError> {
        let mut bindings = bindings.into_iter().collect::<Vec<_>>();
        bindings.sort_by(|(lhs, _), (rhs, _)| lhs.cmp(rhs));

        for pair in bindings.windows(2) {
            let [(lhs_var, lhs_id), (rhs_var, rhs_id)] = pair else {
                continue;
            };
            if lhs_var == rhs_var && lhs_id != rhs_id {
                return Err(ConflictingBindingError {
                    variable: lhs_var.clone(),
                    first: *lhs_id,
                    second: *rhs_id,
                });
            }
        }
        bindings.dedup_by(|lhs, rhs| lhs.0 == rhs.0);

        Ok(Self {
            bindings: bindings.into(),
        })
    }

    /// Returns the term bound to `variable`, if any.
    pub fn get(&self, variable: &Variable) -> Option<TermId> {
        self.bindings
            .binary_search_by(|(candidate, _)| candidate.cmp(variable))
            .ok()
            .map(|idx| self.bindings[idx].1)
    }

    /// Returns whether `variable` is bound in this row.
    pub fn contains(&self, variable: &Variable) -> bool {
        self.get(variable).is_some()
    }

    /// Returns the number of bound variables.
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Iterates over the bindings, ordered by variable.
    pub fn iter(&self) -> impl Iterator<Item = (&Variable, TermId)> {
        self.bindings.iter().map(|(variable, id)| (variable, *id))
    }

    /// Iterates over the bound variables, ordered by variable.
    pub fn variables(&self) -> impl Iterator<Item = &Variable> {
        self.bindings.iter().map(|(variable, _)| variable)
    }

    /// Projects the row onto `variables`. Unbound variables are projected to `None`.
    pub fn project(&self, variables: &[Variable]) -> Vec<Option<TermId>> {
        variables.iter().map(|variable| self.get(variable)).collect()
    }

    /// Merges this row with `other`.
    ///
    /// Two rows are compatible if every variable bound in both rows is bound to the same term. The
    /// result of merging two compatible rows binds the union of their variables. Returns `None` if
    /// the rows are not compatible.
    pub fn merge(&self, other: &Row) -> Option<Row> {
        if other.is_empty() {
            return Some(self.clone());
        }
        if self.is_empty() {
            return Some(other.clone());
        }

        let (lhs, rhs) = (&*self.bindings, &*other.bindings);
        let mut result = Vec::with_capacity(lhs.len() + rhs.len());
        let (mut i, mut j) = (0, 0);
        while i < lhs.len() && j < rhs.len() {
            let (lhs_var, lhs_id) = &lhs[i];
            let (rhs_var, rhs_id) = &rhs[j];
            match lhs_var.cmp(rhs_var) {
                Ordering::Less => {
                    result.push(lhs[i].clone());
                    i += 1;
                }
                Ordering::Greater => {
                    result.push(rhs[j].clone());
                    j += 1;
                }
                Ordering::Equal => {
                    if lhs_id != rhs_id {
                        return None;
                    }
                    result.push(lhs[i].clone());
                    i += 1;
                    j += 1;
                }
            }
        }
        result.extend_from_slice(&lhs[i..]);
        result.extend_from_slice(&rhs[j..]);

        Some(Row {
            bindings: result.into(),
        })
    }
}

impl Debug for Row {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_map()
            .entries(self.bindings.iter().map(|(var, id)| (var.as_str(), id)))
            .finish()
    }
}
