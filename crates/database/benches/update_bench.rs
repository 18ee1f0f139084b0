//! Benchmarks for index maintenance and view queries.
//!
//! Run with: cargo bench -p docview-database

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use docview_core::{Properties, Sequence, Value};
use docview_database::{Database, DatabaseConfig, Emitter, View, ViewDefinition};
use docview_query::{QueryOptions, Sum};
use docview_storage::{properties, MemoryRevisionLog};
use std::sync::Arc;

fn populate(size: usize) -> (Arc<MemoryRevisionLog>, Vec<Sequence>) {
    let log = Arc::new(MemoryRevisionLog::new());
    let seqs = (0..size)
        .map(|i| {
            let doc = format!("order-{:06}", i);
            log.put(&doc, "1-a", properties([("customer", Value::from(format!("c{}", i % 50))), ("total", Value::from(i as i64))]))
        })
        .collect();
    (log, seqs)
}

fn orders(db: &Database) -> View {
    db.define_view(
        "orders",
        "1",
        ViewDefinition::new(|doc: &Properties, emit: &mut Emitter| {
            if let (Some(customer), Some(total)) = (doc.get("customer"), doc.get("total")) {
                emit.emit(vec![customer.clone(), total.clone()], total.clone());
            }
        })
        .with_reduce(Sum),
    )
    .unwrap()
}

fn full_build_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("index_full_build");

    for size in [100, 1000, 10000].iter() {
        let (log, _) = populate(*size);
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| {
                let db = Database::new(log.clone(), DatabaseConfig::default());
                let view = orders(&db);
                black_box(view.update_index().unwrap())
            });
        });
    }

    group.finish();
}

fn incremental_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("index_incremental");

    for size in [1000, 10000].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &size| {
            b.iter_with_setup(
                || {
                    let (log, seqs) = populate(size);
                    let db = Database::new(log.clone(), DatabaseConfig::default());
                    let view = orders(&db);
                    view.update_index().unwrap();
                    // Touch one document in ten.
                    for (i, seq) in seqs.iter().enumerate().step_by(10) {
                        log.retire(*seq);
                        log.append(
                            &format!("order-{:06}", i),
                            "2-a",
                            *seq,
                            false,
                            properties([("customer", Value::from("moved")), ("total", Value::from(1))]),
                        );
                    }
                    view
                },
                |view| black_box(view.update_index().unwrap()),
            );
        });
    }

    group.finish();
}

fn query_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("view_query");
    let (log, _) = populate(10000);
    let db = Database::new(log, DatabaseConfig::default());
    let view = orders(&db);
    view.update_index().unwrap();

    group.bench_function("range", |b| {
        let options = QueryOptions::new()
            .start_key(vec![Value::from("c1")])
            .end_key(vec![Value::from("c1")])
            .prefix_match_level(1);
        b.iter(|| black_box(view.query(&options).unwrap()));
    });
    group.bench_function("group_level_1", |b| {
        let options = QueryOptions::new().group_level(1);
        b.iter(|| black_box(view.query(&options).unwrap()));
    });

    group.finish();
}

criterion_group!(benches, full_build_benchmark, incremental_benchmark, query_benchmark);
criterion_main!(benches);
