use crate::bgp::{AtomicPattern, PatternSlot};
use rdf_weave_model::{NamedNode, Term, Variable};
use std::collections::BTreeSet;
use std::fmt::{Display, Formatter};

/// Describes how a single slot of a pattern is constrained.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SlotShape {
    /// A variable that is not bound yet. Written as `VAR` or `ANY`.
    Unbound,
    /// A slot bound to some term. Written as `TERM`.
    Bound,
    /// A slot bound to this IRI. Only used for predicates and graphs.
    Named(NamedNode),
}

impl SlotShape {
    pub fn is_bound(&self) -> bool {
        !matches!(self, SlotShape::Unbound)
    }

    /// Forgets which IRI a slot is bound to.
    #[must_use]
    pub fn generalized(&self) -> Self {
        match self {
            SlotShape::Unbound => SlotShape::Unbound,
            SlotShape::Bound | SlotShape::Named(_) => SlotShape::Bound,
        }
    }
}

impl Display for SlotShape {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            SlotShape::Unbound => f.write_str("VAR"),
            SlotShape::Bound => f.write_str("TERM"),
            SlotShape::Named(node) => node.fmt(f),
        }
    }
}

/// The shape of an [AtomicPattern]: which slots are bound, and to which predicate and graph.
///
/// Shapes are the keys of the [StatsTable](crate::stats::StatsTable).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PatternShape {
    graph: Option<SlotShape>,
    subject: SlotShape,
    predicate: SlotShape,
    object: SlotShape,
}

impl PatternShape {
    pub fn triple(subject: SlotShape, predicate: SlotShape, object: SlotShape) -> Self {
        Self {
            graph: None,
            subject,
            predicate,
            object,
        }
    }

    pub fn quad(
        graph: SlotShape,
        subject: SlotShape,
        predicate: SlotShape,
        object: SlotShape,
    ) -> Self {
        Self {
            graph: Some(graph),
            subject,
            predicate,
            object,
        }
    }

    /// Returns the shape of `pattern` as written.
    pub fn of(pattern: &AtomicPattern) -> Self {
        Self::effective(pattern, &BTreeSet::new())
    }

    /// Returns the shape of `pattern` if all variables in `bound` were already bound.
    ///
    /// This is used for costing only. The pattern itself is not changed.
    pub fn effective(pattern: &AtomicPattern, bound: &BTreeSet<Variable>) -> Self {
        let slot = |slot: &PatternSlot, named: bool| match slot {
            PatternSlot::Variable(variable) if bound.contains(variable) => SlotShape::Bound,
            PatternSlot::Variable(_) => SlotShape::Unbound,
            PatternSlot::Term(Term::NamedNode(node)) if named => SlotShape::Named(node.clone()),
            PatternSlot::Term(_) => SlotShape::Bound,
        };
        Self {
            graph: pattern.graph().map(|graph| slot(graph, true)),
            subject: slot(pattern.subject(), false),
            predicate: slot(pattern.predicate(), true),
            object: slot(pattern.object(), false),
        }
    }

    pub fn graph(&self) -> Option<&SlotShape> {
        self.graph.as_ref()
    }

    pub fn subject(&self) -> &SlotShape {
        &self.subject
    }

    pub fn predicate(&self) -> &SlotShape {
        &self.predicate
    }

    pub fn object(&self) -> &SlotShape {
        &self.object
    }

    /// Returns whether at least one slot is bound.
    pub fn has_bound_slot(&self) -> bool {
        self.graph.as_ref().is_some_and(SlotShape::is_bound)
            || self.subject.is_bound()
            || self.predicate.is_bound()
            || self.object.is_bound()
    }

    /// Returns the same shape with all IRIs replaced by [SlotShape::Bound].
    #[must_use]
    pub fn generalized(&self) -> Self {
        Self {
            graph: self.graph.as_ref().map(SlotShape::generalized),
            subject: self.subject.generalized(),
            predicate: self.predicate.generalized(),
            object: self.object.generalized(),
        }
    }

    #[must_use]
    pub fn with_subject(&self, subject: SlotShape) -> Self {
        Self {
            subject,
            ..self.clone()
        }
    }

    #[must_use]
    pub fn with_object(&self, object: SlotShape) -> Self {
        Self {
            object,
            ..self.clone()
        }
    }

    /// Returns the triple shape obtained by dropping the graph slot.
    #[must_use]
    pub fn without_graph(&self) -> Self {
        Self {
            graph: None,
            ..self.clone()
        }
    }
}

impl Display for PatternShape {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if let Some(graph) = &self.graph {
            write!(f, "{graph} ")?;
        }
        write!(f, "{} {} {}", self.subject, self.predicate, self.object)
    }
}
