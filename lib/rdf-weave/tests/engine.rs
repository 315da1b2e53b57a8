use insta::assert_snapshot;
use rdf_weave::engine::{BgpEngine, EngineOptions};
use rdf_weave::error::EngineError;
use rdf_weave::io::{load_from_reader, RdfFormat};
use rdf_weave::logical::{AtomicPattern, BasicPattern, ReorderError, ReorderSelector};
use rdf_weave::model::vocab::rdf;
use rdf_weave::model::{NamedNode, Term, Variable};
use rdf_weave::physical::join::{CollectingTraceSink, JoinAlgorithm, JoinKey};
use rdf_weave::physical::RowList;
use rdf_weave::storage::MemQuadStore;
use std::io::Write;
use std::sync::Arc;

const DATA: &str = r#"
@prefix ex: <http://example.com/> .

ex:alice a ex:Person ; ex:livesIn ex:paris ; ex:knows ex:bob .
ex:bob a ex:Person ; ex:livesIn ex:berlin ; ex:knows ex:carol ; ex:likes ex:alice .
ex:carol a ex:Person ; ex:livesIn ex:paris ; ex:knows ex:alice .
ex:dave a ex:Robot ; ex:livesIn ex:paris .
"#;

#[test]
fn sorted_scans_are_merge_joined() {
    let trace = Arc::new(CollectingTraceSink::new());
    let engine = engine(EngineOptions::default()).with_trace_sink(trace.clone());

    let result = engine.execute(&people_in_paris()).unwrap();

    assert_eq!(result.sort_order(), Some([var("p")].as_slice()));
    assert_snapshot!(render(&engine, result), @r"
    ?p=<http://example.com/alice>
    ?p=<http://example.com/carol>
    ");
    let traces = trace.traces();
    assert_eq!(traces.len(), 1);
    assert_eq!(traces[0].algorithm, JoinAlgorithm::Merge);
    assert_eq!(traces[0].key, Some(JoinKey::new([var("p")])));
}

#[test]
fn unsorted_scans_are_hash_joined() {
    let trace = Arc::new(CollectingTraceSink::new());
    let engine = engine(EngineOptions::default()).with_trace_sink(trace.clone());

    let result = engine.execute(&friends_of_friends()).unwrap();

    assert_eq!(result.sort_order(), None);
    assert_snapshot!(render(&engine, result), @r"
    ?x=<http://example.com/alice> ?y=<http://example.com/bob> ?z=<http://example.com/carol>
    ?x=<http://example.com/bob> ?y=<http://example.com/carol> ?z=<http://example.com/alice>
    ?x=<http://example.com/carol> ?y=<http://example.com/alice> ?z=<http://example.com/bob>
    ");
    assert_eq!(trace.traces()[0].algorithm, JoinAlgorithm::Hash);
}

#[test]
fn unsorted_scans_can_be_sorted_for_merge_join() {
    let trace = Arc::new(CollectingTraceSink::new());
    let options = EngineOptions::default().with_sort_unsorted_inputs(true);
    let engine = engine(options).with_trace_sink(trace.clone());

    let result = engine.execute(&friends_of_friends()).unwrap();

    assert_eq!(result.sort_order(), Some([var("y")].as_slice()));
    assert_eq!(result.into_rows().unwrap().len(), 3);
    let traces = trace.traces();
    assert_eq!(traces[0].algorithm, JoinAlgorithm::Merge);
    assert_eq!(traces[0].metrics.unsorted_violations, 0);
}

#[test]
fn results_do_not_depend_on_options() {
    let bgps = [people_in_paris(), friends_of_friends(), friends_in_paris()];
    let option_sets = [
        EngineOptions::default(),
        EngineOptions::default().with_reorder(ReorderSelector::Identity),
        EngineOptions::default().with_sort_unsorted_inputs(true),
        EngineOptions::default()
            .with_reorder(ReorderSelector::Identity)
            .with_sort_unsorted_inputs(true),
    ];

    for bgp in &bgps {
        let expected = {
            let engine = engine(option_sets[0].clone());
            render(&engine, engine.execute(bgp).unwrap())
        };
        for options in &option_sets[1..] {
            let engine = engine(options.clone());
            assert_eq!(render(&engine, engine.execute(bgp).unwrap()), expected);
        }
    }
}

#[test]
fn merge_join_checks_shared_variables_outside_the_key() {
    let trace = Arc::new(CollectingTraceSink::new());
    let options = EngineOptions::default().with_reorder(ReorderSelector::Identity);
    let engine = engine(options).with_trace_sink(trace.clone());
    let bgp = BasicPattern::new(vec![
        AtomicPattern::triple(var("x"), ex("knows"), var("y")),
        AtomicPattern::triple(var("y"), var("p"), var("x")),
    ]);

    let result = engine.execute(&bgp).unwrap();

    // Both scans are sorted by ?y first, only ?y is used as the merge key.
    assert_snapshot!(
        render(&engine, result),
        @"?p=<http://example.com/likes> ?x=<http://example.com/alice> ?y=<http://example.com/bob>"
    );
    assert_eq!(trace.traces()[0].key, Some(JoinKey::new([var("y")])));
}

#[test]
fn empty_bgp_has_one_empty_solution() {
    let engine = engine(EngineOptions::default());

    let rows = engine
        .execute(&BasicPattern::new(Vec::new()))
        .unwrap()
        .into_rows()
        .unwrap();

    assert_eq!(rows.len(), 1);
    assert!(rows[0].is_empty());
}

#[test]
fn unknown_terms_yield_no_solution() {
    let engine = engine(EngineOptions::default());
    let bgp = BasicPattern::new(vec![
        AtomicPattern::triple(var("p"), rdf::TYPE.into_owned(), ex("Alien")),
        AtomicPattern::triple(var("p"), ex("livesIn"), var("city")),
    ]);

    let rows = engine.execute(&bgp).unwrap().into_rows().unwrap();

    assert!(rows.is_empty());
}

#[test]
fn missing_statistics_abort_setup() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("stats.opt");
    let options = EngineOptions::default().with_reorder(ReorderSelector::Weighted(path.clone()));

    let result = BgpEngine::new(Arc::new(MemQuadStore::new()), options);

    match result {
        Err(EngineError::Reorder(ReorderError::MissingStatistics { path: missing })) => {
            assert_eq!(missing, path);
        }
        other => panic!("unexpected result: {other:?}"),
    }
}

#[test]
fn statistics_drive_the_pattern_order() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        "VAR <http://www.w3.org/1999/02/22-rdf-syntax-ns#type> TERM 50\n\
         VAR <http://example.com/livesIn> TERM 2"
    )
    .unwrap();
    let options = EngineOptions::default()
        .with_reorder(ReorderSelector::Weighted(file.path().to_path_buf()));
    let engine = engine(options);

    let explanation = engine.explain(&people_in_paris());

    assert_eq!(explanation.permutation(), vec![1, 0]);
    assert_snapshot!(explanation, @r"
    Reorder (weighted)
      0: #1 (?p <http://example.com/livesIn> <http://example.com/paris>) [weight=2]
      1: #0 (?p <http://www.w3.org/1999/02/22-rdf-syntax-ns#type> <http://example.com/Person>) [weight=50]
    ");
    let rows = engine.execute(&people_in_paris()).unwrap().into_rows().unwrap();
    assert_eq!(rows.len(), 2);
}

#[test]
fn decode_row_leaves_unbound_variables_empty() {
    let engine = engine(EngineOptions::default());
    let rows = engine.execute(&people_in_paris()).unwrap().into_rows().unwrap();

    let decoded = engine.decode_row(&rows[0], &[var("p"), var("q")]).unwrap();

    assert_eq!(decoded, vec![Some(Term::from(ex("alice"))), None]);
}

#[test]
fn engine_is_shared_between_threads() {
    let engine = Arc::new(engine(EngineOptions::default()));

    let handles = (0..4)
        .map(|_| {
            let engine = Arc::clone(&engine);
            std::thread::spawn(move || {
                engine
                    .execute(&friends_of_friends())
                    .unwrap()
                    .into_rows()
                    .unwrap()
                    .len()
            })
        })
        .collect::<Vec<_>>();

    for handle in handles {
        assert_eq!(handle.join().unwrap(), 3);
    }
}

fn engine(options: EngineOptions) -> BgpEngine {
    let mut store = MemQuadStore::new();
    load_from_reader(&mut store, RdfFormat::Turtle, DATA.as_bytes()).unwrap();
    BgpEngine::new(Arc::new(store), options).unwrap()
}

fn people_in_paris() -> BasicPattern {
    BasicPattern::new(vec![
        AtomicPattern::triple(var("p"), rdf::TYPE.into_owned(), ex("Person")),
        AtomicPattern::triple(var("p"), ex("livesIn"), ex("paris")),
    ])
}

fn friends_of_friends() -> BasicPattern {
    BasicPattern::new(vec![
        AtomicPattern::triple(var("x"), ex("knows"), var("y")),
        AtomicPattern::triple(var("y"), ex("knows"), var("z")),
    ])
}

/// People that know somebody who lives in Paris and who also live in Paris.
fn friends_in_paris() -> BasicPattern {
    BasicPattern::new(vec![
        AtomicPattern::triple(var("x"), ex("knows"), var("y")),
        AtomicPattern::triple(var("y"), ex("livesIn"), ex("paris")),
        AtomicPattern::triple(var("x"), ex("livesIn"), ex("paris")),
    ])
}

/// Renders the decoded rows, one line per row, sorted.
fn render(engine: &BgpEngine, result: RowList) -> String {
    let variables = result.variables().iter().cloned().collect::<Vec<_>>();
    let mut lines = result
        .into_rows()
        .unwrap()
        .iter()
        .map(|row| {
            engine
                .decode_row(row, &variables)
                .unwrap()
                .into_iter()
                .zip(&variables)
                .filter_map(|(term, variable)| term.map(|term| format!("{variable}={term}")))
                .collect::<Vec<_>>()
                .join(" ")
        })
        .collect::<Vec<_>>();
    lines.sort();
    lines.join("\n")
}

fn ex(name: &str) -> NamedNode {
    NamedNode::new_unchecked(format!("http://example.com/{name}"))
}

fn var(name: &str) -> Variable {
    Variable::new_unchecked(name)
}
