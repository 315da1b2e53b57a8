#![allow(clippy::unwrap_used)]

use codspeed_criterion_compat::{criterion_group, criterion_main, BenchmarkId, Criterion};
use rdf_weave_model::{TermId, Variable};
use rdf_weave_physical::join::{CompatibleMerge, JoinDispatcher, JoinKey, NoopTraceSink};
use rdf_weave_physical::{Row, RowList, TermIdOrder};
use std::sync::Arc;

fn join_subjects(c: &mut Criterion) {
    let dispatcher = JoinDispatcher::default().with_trace_sink(Arc::new(NoopTraceSink));
    let key = JoinKey::new([Variable::new_unchecked("s")]);

    let mut group = c.benchmark_group("join");
    for size in [1_000, 10_000] {
        let left = generate_rows(size, "p");
        let right = generate_rows(size, "o");

        group.bench_with_input(BenchmarkId::new("merge", size), &size, |b, _| {
            b.iter(|| {
                let result = dispatcher.join(
                    Some(&key),
                    sorted_list(&left, "p"),
                    sorted_list(&right, "o"),
                    TermIdOrder,
                    CompatibleMerge,
                );
                result.into_rows().unwrap()
            });
        });
        group.bench_with_input(BenchmarkId::new("hash", size), &size, |b, _| {
            b.iter(|| {
                let result = dispatcher.join(
                    None,
                    sorted_list(&left, "p"),
                    sorted_list(&right, "o"),
                    TermIdOrder,
                    CompatibleMerge,
                );
                result.into_rows().unwrap()
            });
        });
    }
    group.finish();
}

criterion_group!(join, join_subjects);
criterion_main!(join);

fn sorted_list(rows: &[Row], other: &str) -> RowList {
    let variables = [Variable::new_unchecked("s"), Variable::new_unchecked(other)]
        .into_iter()
        .collect();
    RowList::materialized(variables, rows.to_vec())
        .with_sort_order(vec![Variable::new_unchecked("s")])
}

/// Two rows per subject, sorted by subject.
fn generate_rows(count: u32, other: &str) -> Vec<Row> {
    (0..count)
        .map(|i| {
            Row::try_new([
                (Variable::new_unchecked("s"), TermId::new(i / 2 + 1)),
                (Variable::new_unchecked(other), TermId::new(i + 1)),
            ])
            .unwrap()
        })
        .collect()
}
