use rdf_weave_model::Variable;
use std::collections::BTreeSet;
use std::fmt::{Display, Formatter};

/// The set of variables a [RowList](crate::RowList) may bind.
///
/// The set is ordered by variable name so that iterating it is deterministic. The order in which
/// the variables were inserted is irrelevant.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct VariableSet(BTreeSet<Variable>);

impl VariableSet {
    /// Creates an empty [VariableSet].
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `variable` to the set. Returns whether it was not already part of the set.
    pub fn insert(&mut self, variable: Variable) -> bool {
        self.0.insert(variable)
    }

    pub fn contains(&self, variable: &Variable) -> bool {
        self.0.contains(variable)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Variable> {
        self.0.iter()
    }

    /// Returns whether every variable in `variables` is part of this set.
    pub fn contains_all<'a>(&self, variables: impl IntoIterator<Item = &'a Variable>) -> bool {
        variables.into_iter().all(|v| self.0.contains(v))
    }

    /// Returns the variables that are part of both sets, ordered by name.
    pub fn intersection(&self, other: &VariableSet) -> Vec<Variable> {
        self.0.intersection(&other.0).cloned().collect()
    }

    /// Returns a new set containing the variables of both sets.
    pub fn union(&self, other: &VariableSet) -> VariableSet {
        VariableSet(self.0.union(&other.0).cloned().collect())
    }

    /// Returns whether the two sets share no variable.
    pub fn is_disjoint(&self, other: &VariableSet) -> bool {
        self.0.is_disjoint(&other.0)
    }
}

impl FromIterator<Variable> for VariableSet {
    fn from_iter<T: IntoIterator<Item = Variable>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl Extend<Variable> for VariableSet {
    fn extend<T: IntoIterator<Item = Variable>>(&mut self, iter: T) {
        self.0.extend(iter);
    }
}

impl<'a> IntoIterator for &'a VariableSet {
    type Item = &'a Variable;
    type IntoIter = std::collections::btree_set::Iter<'a, Variable>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl Display for VariableSet {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str("[")?;
        for (i, variable) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{variable}")?;
        }
        f.write_str("]")
    }
}
