use rdf_weave_logical::reorder::{FixedReorder, IdentityReorder, WeightedReorder};
use rdf_weave_logical::{AtomicPattern, BasicPattern, ReorderTransformation, StatsTable};
use rdf_weave_model::{NamedNode, Variable};
use std::collections::HashMap;
use std::sync::Arc;

const EX: &str = "http://example.com/";

#[test]
fn cheaper_independent_pattern_is_evaluated_first() {
    let stats = stats(&format!(
        "<{EX}knows> 1000
         VAR <{EX}type> TERM 10"
    ));
    let bgp = bgp(vec![
        triple("?x", "knows", "?y"),
        triple("?y", "type", "Person"),
    ]);

    let reordered = WeightedReorder::new(stats).reorder(&bgp);

    assert_eq!(
        reordered,
        BasicPattern::new(vec![
            triple("?y", "type", "Person"),
            triple("?x", "knows", "?y"),
        ])
    );
}

#[test]
fn cheaper_pattern_binds_variables_for_the_rest() {
    let stats = stats(&format!(
        "<{EX}knows> 5
         VAR <{EX}type> TERM 10"
    ));
    let bgp = bgp(vec![
        triple("?x", "knows", "?y"),
        triple("?y", "type", "Person"),
    ]);

    let explanation = WeightedReorder::new(stats).explain(&bgp);

    assert_eq!(explanation.permutation(), vec![0, 1]);
    // Once ?y is bound, the type pattern is fully bound. It is not listed, so it is estimated by
    // the listed shape with an unbound subject.
    insta::assert_snapshot!(explanation, @r#"
    Reorder (weighted)
      0: #0 (?x <http://example.com/knows> ?y) [weight=5]
      1: #1 (?y <http://example.com/type> <http://example.com/Person>) [weight=10]
    "#);
}

#[test]
fn unlisted_bound_patterns_are_estimated_from_listed_shapes() {
    let stats = stats(&format!(
        "<{EX}knows> 100000
         VAR <{EX}type> TERM 10
         VAR <{EX}name> VAR 500000"
    ));
    let bgp = bgp(vec![
        triple("?y", "name", "?n"),
        triple("?y", "type", "Person"),
        triple("?x", "knows", "?y"),
    ]);

    let explanation = WeightedReorder::new(stats).explain(&bgp);

    // Once ?y is bound, neither remaining shape is listed. Both are estimated by the listed shape
    // that leaves ?y unbound instead of sharing the default weight.
    assert_eq!(explanation.permutation(), vec![1, 2, 0]);
}

#[test]
fn effective_shapes_change_after_each_pick() {
    let stats = stats(&format!(
        "<{EX}knows> 100
         <{EX}name> 1000
         TERM <{EX}name> VAR 1
         <{EX}age> 500"
    ));
    let bgp = bgp(vec![
        triple("?z", "age", "?a"),
        triple("?y", "name", "?n"),
        triple("?x", "knows", "?y"),
    ]);

    let explanation = WeightedReorder::new(stats).explain(&bgp);

    // Without taking ?y into account, the age pattern would be picked second.
    assert_eq!(explanation.permutation(), vec![2, 1, 0]);
}

#[test]
fn unknown_bound_shapes_are_preferred_over_unbound_shapes() {
    let stats = stats(&format!("<{EX}knows> 100"));
    let bgp = bgp(vec![triple("?s", "?p", "?o"), triple("?s", "label", "x")]);

    let explanation = WeightedReorder::new(stats).explain(&bgp);

    assert_eq!(explanation.permutation(), vec![1, 0]);
}

#[test]
fn reordering_is_a_permutation() {
    let reorderers: Vec<Box<dyn ReorderTransformation>> = vec![
        Box::new(IdentityReorder),
        Box::new(FixedReorder),
        Box::new(WeightedReorder::new(stats(&format!(
            "<{EX}p0> 10
             TERM <{EX}p1> VAR 2
             VAR <{EX}p2> TERM 3"
        )))),
    ];
    let variables = ["?a", "?b", "?c"];
    let predicates = ["p0", "p1", "p2"];

    for size in 0..6 {
        let patterns = (0..size)
            .map(|i| {
                triple(
                    variables[i % 3],
                    predicates[(i * 2) % 3],
                    if i % 2 == 0 { variables[(i + 1) % 3] } else { "lit" },
                )
            })
            // Duplicates must be preserved as well.
            .chain((size > 3).then(|| triple("?a", "p0", "?b")))
            .collect::<Vec<_>>();
        let bgp = BasicPattern::new(patterns);

        for reorderer in &reorderers {
            let reordered = reorderer.reorder(&bgp);
            assert_eq!(
                multiset(&reordered),
                multiset(&bgp),
                "{} changed the patterns",
                reorderer.name()
            );
            assert_eq!(reorderer.reorder(&bgp), reordered, "{} is not deterministic", reorderer.name());
        }
    }
}

#[test]
fn equal_weights_keep_input_order() {
    let stats = stats(&format!("<{EX}p> 10\n<{EX}q> 10"));
    let bgp = bgp(vec![triple("?a", "q", "?b"), triple("?c", "p", "?d")]);

    let reorder = WeightedReorder::new(stats);
    for _ in 0..10 {
        assert_eq!(reorder.explain(&bgp).permutation(), vec![0, 1]);
    }
}

#[test]
fn stats_are_shared_between_threads() {
    let reorder = Arc::new(WeightedReorder::new(stats(&format!("<{EX}knows> 5"))));
    let bgp = bgp(vec![
        triple("?x", "knows", "?y"),
        triple("?y", "type", "Person"),
    ]);
    let expected = reorder.reorder(&bgp);

    let handles = (0..4)
        .map(|_| {
            let reorder = Arc::clone(&reorder);
            let bgp = bgp.clone();
            std::thread::spawn(move || reorder.reorder(&bgp))
        })
        .collect::<Vec<_>>();
    for handle in handles {
        assert_eq!(handle.join().unwrap(), expected);
    }
}

fn stats(content: &str) -> Arc<StatsTable> {
    Arc::new(content.parse().unwrap())
}

fn bgp(patterns: Vec<AtomicPattern>) -> BasicPattern {
    BasicPattern::new(patterns)
}

/// Creates a triple pattern. Variables start with `?`, everything else is an IRI in the example
/// namespace.
fn triple(subject: &str, predicate: &str, object: &str) -> AtomicPattern {
    AtomicPattern::triple(slot(subject), slot(predicate), slot(object))
}

fn slot(value: &str) -> rdf_weave_logical::PatternSlot {
    match value.strip_prefix('?') {
        Some(name) => Variable::new_unchecked(name).into(),
        None => NamedNode::new_unchecked(format!("{EX}{value}")).into(),
    }
}

fn multiset(bgp: &BasicPattern) -> HashMap<&AtomicPattern, usize> {
    let mut result = HashMap::new();
    for pattern in bgp {
        *result.entry(pattern).or_default() += 1;
    }
    result
}
