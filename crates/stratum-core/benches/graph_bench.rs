//! # Graph Benchmarks
//!
//! Performance benchmarks for the reference graph index and record store.
//!
//! Run with: `cargo bench -p stratum-core`

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use std::hint::black_box;
use stratum_core::{
    Entity, GraphIndex, MemoryStore, Mutation, Note, Query, RecordStore, Relationship,
};

/// Entities `e0..size` chained by relationships of weight 10.
fn linear_graph(size: usize) -> GraphIndex {
    let index = GraphIndex::new();
    for i in 0..size {
        let _ = index.apply(Mutation::PutEntity(Entity::new(format!("e{}", i), "n", "k")));
        if i > 0 {
            let mut rel =
                Relationship::new(format!("r{}", i), format!("e{}", i - 1), format!("e{}", i), "next");
            rel.weight = 10;
            let _ = index.apply(Mutation::PutRelationship(rel));
        }
    }
    index
}

fn bench_projection(c: &mut Criterion) {
    let mut group = c.benchmark_group("projection");

    for size in [100, 1000, 10000].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &size| {
            b.iter(|| black_box(linear_graph(size)));
        });
    }

    group.finish();
}

fn bench_traversal(c: &mut Criterion) {
    let mut group = c.benchmark_group("traversal");

    for size in [100, 1000].iter() {
        let index = linear_graph(*size);
        let query = Query::Traverse {
            start: "e0".to_string(),
            depth: stratum_core::primitives::MAX_TRAVERSAL_DEPTH,
        };
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| black_box(index.query(&query)));
        });
    }

    group.finish();
}

fn bench_strongest_path(c: &mut Criterion) {
    let mut group = c.benchmark_group("strongest_path");

    for size in [10, 50, 100].iter() {
        let index = linear_graph(*size);
        let query = Query::Path {
            from: "e0".to_string(),
            to: format!("e{}", size - 1),
        };
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| black_box(index.query(&query)));
        });
    }

    group.finish();
}

fn bench_export(c: &mut Criterion) {
    let mut group = c.benchmark_group("export_database");

    for size in [100, 1000, 10000].iter() {
        let store = MemoryStore::new();
        for i in 0..*size {
            let _ = store.upsert(Note::new(format!("n{}", i), "title", "content").into());
        }
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| black_box(store.export_database()));
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_projection,
    bench_traversal,
    bench_strongest_path,
    bench_export
);
criterion_main!(benches);
