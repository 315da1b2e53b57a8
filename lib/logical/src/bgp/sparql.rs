use crate::bgp::{AtomicPattern, BasicPattern, PatternSlot};
use rdf_weave_model::{
    GraphPattern, NamedNodePattern, Query, Term, TermPattern, TriplePattern, Variable,
};

impl AtomicPattern {
    /// Creates an [AtomicPattern] from a SPARQL triple pattern.
    ///
    /// If `graph` is given, the result is a quad pattern. Blank nodes act as variables.
    pub fn from_triple_pattern(graph: Option<&NamedNodePattern>, pattern: &TriplePattern) -> Self {
        let subject = term_pattern_slot(&pattern.subject);
        let predicate = named_node_pattern_slot(&pattern.predicate);
        let object = term_pattern_slot(&pattern.object);
        match graph {
            None => Self::triple(subject, predicate, object),
            Some(graph) => Self::quad(named_node_pattern_slot(graph), subject, predicate, object),
        }
    }
}

fn term_pattern_slot(pattern: &TermPattern) -> PatternSlot {
    match pattern {
        TermPattern::NamedNode(node) => PatternSlot::Term(Term::from(node.clone())),
        TermPattern::Literal(literal) => PatternSlot::Term(Term::from(literal.clone())),
        TermPattern::BlankNode(bnode) => {
            PatternSlot::Variable(Variable::new_unchecked(format!("_:{}", bnode.as_str())))
        }
        TermPattern::Variable(variable) => PatternSlot::Variable(variable.clone()),
    }
}

fn named_node_pattern_slot(pattern: &NamedNodePattern) -> PatternSlot {
    match pattern {
        NamedNodePattern::NamedNode(node) => PatternSlot::Term(Term::from(node.clone())),
        NamedNodePattern::Variable(variable) => PatternSlot::Variable(variable.clone()),
    }
}

/// Collects all basic graph patterns of `query` in the order they appear.
///
/// Triple patterns inside a `GRAPH` clause become quad patterns. Property paths are not part of
/// a basic graph pattern and are skipped.
pub fn collect_basic_patterns(query: &Query) -> Vec<BasicPattern> {
    let pattern = match query {
        Query::Select { pattern, .. }
        | Query::Construct { pattern, .. }
        | Query::Describe { pattern, .. }
        | Query::Ask { pattern, .. } => pattern,
    };
    let mut result = Vec::new();
    collect_from_graph_pattern(pattern, None, &mut result);
    result
}

fn collect_from_graph_pattern(
    pattern: &GraphPattern,
    graph: Option<&NamedNodePattern>,
    result: &mut Vec<BasicPattern>,
) {
    match pattern {
        GraphPattern::Bgp { patterns } => {
            if !patterns.is_empty() {
                result.push(
                    patterns
                        .iter()
                        .map(|pattern| AtomicPattern::from_triple_pattern(graph, pattern))
                        .collect(),
                );
            }
        }
        GraphPattern::Graph { name, inner } => {
            collect_from_graph_pattern(inner, Some(name), result);
        }
        GraphPattern::Join { left, right }
        | GraphPattern::LeftJoin { left, right, .. }
        | GraphPattern::Union { left, right }
        | GraphPattern::Minus { left, right } => {
            collect_from_graph_pattern(left, graph, result);
            collect_from_graph_pattern(right, graph, result);
        }
        GraphPattern::Filter { inner, .. }
        | GraphPattern::Extend { inner, .. }
        | GraphPattern::OrderBy { inner, .. }
        | GraphPattern::Project { inner, .. }
        | GraphPattern::Distinct { inner }
        | GraphPattern::Reduced { inner }
        | GraphPattern::Slice { inner, .. }
        | GraphPattern::Group { inner, .. }
        | GraphPattern::Service { inner, .. } => {
            collect_from_graph_pattern(inner, graph, result);
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rdf_weave_model::{BlankNode, NamedNode};

    fn parse(query: &str) -> Query {
        Query::parse(query, None).unwrap()
    }

    #[test]
    fn collects_patterns_of_nested_groups() {
        let query = parse(
            "SELECT * WHERE {
                ?s <http://example.com/p> ?o .
                OPTIONAL { ?o <http://example.com/q> ?z }
                GRAPH ?g { ?s <http://example.com/r> \"x\" }
            }",
        );

        let bgps = collect_basic_patterns(&query);
        let rendered = bgps
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("\n");
        insta::assert_snapshot!(rendered, @r#"
        (?s <http://example.com/p> ?o)
        (?o <http://example.com/q> ?z)
        (?g ?s <http://example.com/r> "x")
        "#);
    }

    #[test]
    fn blank_nodes_become_variables() {
        let pattern = TriplePattern {
            subject: TermPattern::BlankNode(BlankNode::new_unchecked("b1")),
            predicate: NamedNodePattern::NamedNode(NamedNode::new_unchecked("http://example.com/p")),
            object: TermPattern::Variable(Variable::new_unchecked("o")),
        };

        let atomic = AtomicPattern::from_triple_pattern(None, &pattern);

        assert_eq!(
            atomic.subject(),
            &PatternSlot::Variable(Variable::new_unchecked("_:b1"))
        );
        assert_eq!(atomic.arity(), 3);
    }
}
