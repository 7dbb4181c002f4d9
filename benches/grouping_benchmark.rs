//! Grouping Benchmarks
//!
//! Benchmarks for id assignment and full view materialization.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use grouprs::{assign_ids, DataFrame, DropPolicy, GroupKey, GroupedView, GroupingConfig, KeyVector};

/// Create a DataFrame with a categorical key, an integer key and a string key
fn create_frame(rows: usize) -> DataFrame {
    let levels: Vec<String> = (0..16).map(|i| format!("cat_{:02}", i)).collect();
    let cats: Vec<String> = (0..rows).map(|i| levels[(i * 7) % 16].clone()).collect();
    let ints: Vec<i64> = (0..rows).map(|i| ((i * 31) % 1000) as i64).collect();
    let strs: Vec<String> = (0..rows).map(|i| format!("s{}", (i * 17) % 50)).collect();

    DataFrame::new()
        .with_column("cat", KeyVector::categorical(cats, levels).unwrap())
        .unwrap()
        .with_column("int", KeyVector::from_i64(ints))
        .unwrap()
        .with_column("str", KeyVector::from_strs(strs))
        .unwrap()
}

fn bench_assign_ids(c: &mut Criterion) {
    let mut group = c.benchmark_group("assign_ids");

    for rows in [1_000usize, 100_000] {
        let df = create_frame(rows);
        let cat = df.get_column("cat").unwrap();
        let int = df.get_column("int").unwrap();

        group.bench_with_input(BenchmarkId::new("observed", rows), &rows, |b, &rows| {
            b.iter(|| {
                std::hint::black_box(
                    assign_ids(&[("cat", cat), ("int", int)], rows, DropPolicy::ObservedOnly)
                        .unwrap(),
                )
            });
        });

        group.bench_with_input(BenchmarkId::new("cross_product", rows), &rows, |b, &rows| {
            b.iter(|| {
                std::hint::black_box(
                    assign_ids(&[("cat", cat)], rows, DropPolicy::FullCrossProduct).unwrap(),
                )
            });
        });
    }

    group.finish();
}

fn bench_materialize(c: &mut Criterion) {
    let mut group = c.benchmark_group("materialize");
    let df = create_frame(100_000);
    let keys = vec![
        GroupKey::column("cat"),
        GroupKey::column("int"),
        GroupKey::column("str"),
    ];

    for (name, threshold) in [("sequential", usize::MAX), ("parallel", 1)] {
        let config = GroupingConfig::new().with_parallel_threshold(threshold);
        group.bench_function(name, |b| {
            b.iter(|| {
                let mut view =
                    GroupedView::build_with_config(&df, keys.clone(), config.clone()).unwrap();
                std::hint::black_box(view.group_count().unwrap())
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_assign_ids, bench_materialize);

criterion_main!(benches);
