//! Basic graph patterns.

mod sparql;

use rdf_weave_model::{Literal, NamedNode, Term, Variable};
use std::collections::BTreeSet;
use std::fmt::{Display, Formatter};

pub use sparql::collect_basic_patterns;

/// A single position of an [AtomicPattern]. Either bound to a term or a variable.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PatternSlot {
    /// The position must match this term.
    Term(Term),
    /// The position binds the variable.
    Variable(Variable),
}

impl PatternSlot {
    pub fn is_variable(&self) -> bool {
        matches!(self, PatternSlot::Variable(_))
    }

    pub fn as_variable(&self) -> Option<&Variable> {
        match self {
            PatternSlot::Variable(variable) => Some(variable),
            PatternSlot::Term(_) => None,
        }
    }

    pub fn as_term(&self) -> Option<&Term> {
        match self {
            PatternSlot::Term(term) => Some(term),
            PatternSlot::Variable(_) => None,
        }
    }
}

impl Display for PatternSlot {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            PatternSlot::Term(term) => term.fmt(f),
            PatternSlot::Variable(variable) => variable.fmt(f),
        }
    }
}

impl From<Variable> for PatternSlot {
    fn from(variable: Variable) -> Self {
        PatternSlot::Variable(variable)
    }
}

impl From<Term> for PatternSlot {
    fn from(term: Term) -> Self {
        PatternSlot::Term(term)
    }
}

impl From<NamedNode> for PatternSlot {
    fn from(node: NamedNode) -> Self {
        PatternSlot::Term(node.into())
    }
}

impl From<Literal> for PatternSlot {
    fn from(literal: Literal) -> Self {
        PatternSlot::Term(literal.into())
    }
}

/// A triple pattern (arity 3) or a quad pattern (arity 4).
///
/// Quad patterns carry an additional graph slot. A triple pattern matches the default graph.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AtomicPattern {
    graph: Option<PatternSlot>,
    subject: PatternSlot,
    predicate: PatternSlot,
    object: PatternSlot,
}

impl AtomicPattern {
    /// Creates a triple pattern.
    pub fn triple(
        subject: impl Into<PatternSlot>,
        predicate: impl Into<PatternSlot>,
        object: impl Into<PatternSlot>,
    ) -> Self {
        Self {
            graph: None,
            subject: subject.into(),
            predicate: predicate.into(),
            object: object.into(),
        }
    }

    /// Creates a quad pattern.
    pub fn quad(
        graph: impl Into<PatternSlot>,
        subject: impl Into<PatternSlot>,
        predicate: impl Into<PatternSlot>,
        object: impl Into<PatternSlot>,
    ) -> Self {
        Self {
            graph: Some(graph.into()),
            subject: subject.into(),
            predicate: predicate.into(),
            object: object.into(),
        }
    }

    /// Returns the graph slot. Only quad patterns have one.
    pub fn graph(&self) -> Option<&PatternSlot> {
        self.graph.as_ref()
    }

    pub fn subject(&self) -> &PatternSlot {
        &self.subject
    }

    pub fn predicate(&self) -> &PatternSlot {
        &self.predicate
    }

    pub fn object(&self) -> &PatternSlot {
        &self.object
    }

    /// Returns 3 for triple patterns and 4 for quad patterns.
    pub fn arity(&self) -> usize {
        if self.graph.is_some() {
            4
        } else {
            3
        }
    }

    /// Iterates over all slots. The graph slot, if any, comes first.
    pub fn slots(&self) -> impl Iterator<Item = &PatternSlot> {
        self.graph
            .iter()
            .chain([&self.subject, &self.predicate, &self.object])
    }

    /// Iterates over the variables of this pattern in slot order. A variable that occurs in
    /// multiple slots is returned multiple times.
    pub fn variables(&self) -> impl Iterator<Item = &Variable> {
        self.slots().filter_map(PatternSlot::as_variable)
    }
}

impl Display for AtomicPattern {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "(")?;
        for (i, slot) in self.slots().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{slot}")?;
        }
        write!(f, ")")
    }
}

/// An ordered sequence of [AtomicPattern]s that are joined together.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct BasicPattern(Vec<AtomicPattern>);

impl BasicPattern {
    pub fn new(patterns: Vec<AtomicPattern>) -> Self {
        Self(patterns)
    }

    pub fn patterns(&self) -> &[AtomicPattern] {
        &self.0
    }

    pub fn iter(&self) -> std::slice::Iter<'_, AtomicPattern> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns all variables of the pattern, sorted and without duplicates.
    pub fn variables(&self) -> BTreeSet<&Variable> {
        self.0.iter().flat_map(AtomicPattern::variables).collect()
    }

    pub fn into_patterns(self) -> Vec<AtomicPattern> {
        self.0
    }
}

impl FromIterator<AtomicPattern> for BasicPattern {
    fn from_iter<T: IntoIterator<Item = AtomicPattern>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for BasicPattern {
    type Item = AtomicPattern;
    type IntoIter = std::vec::IntoIter<AtomicPattern>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a BasicPattern {
    type Item = &'a AtomicPattern;
    type IntoIter = std::slice::Iter<'a, AtomicPattern>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl Display for BasicPattern {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for (i, pattern) in self.0.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{pattern}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quad_pattern_lists_graph_first() {
        let pattern = AtomicPattern::quad(
            Variable::new_unchecked("g"),
            Variable::new_unchecked("s"),
            NamedNode::new_unchecked("http://example.com/p"),
            Variable::new_unchecked("s"),
        );

        assert_eq!(pattern.arity(), 4);
        assert_eq!(
            pattern.variables().map(Variable::as_str).collect::<Vec<_>>(),
            vec!["g", "s", "s"]
        );
        assert_eq!(pattern.to_string(), "(?g ?s <http://example.com/p> ?s)");
    }

    #[test]
    fn basic_pattern_variables_are_unique() {
        let bgp = [
            AtomicPattern::triple(
                Variable::new_unchecked("x"),
                NamedNode::new_unchecked("http://example.com/knows"),
                Variable::new_unchecked("y"),
            ),
            AtomicPattern::triple(
                Variable::new_unchecked("y"),
                NamedNode::new_unchecked("http://example.com/knows"),
                Literal::new_simple_literal("Alice"),
            ),
        ]
        .into_iter()
        .collect::<BasicPattern>();

        let variables = bgp.variables();
        assert_eq!(variables.len(), 2);
        assert_eq!(bgp.patterns()[1].arity(), 3);
    }
}
