//! Performance benchmarks for memory operations

use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use selfhub::storage::{EntityStore, InMemoryStore, SqliteStore};
use selfhub::types::*;
use selfhub::MemoryHub;

const CATEGORIES: &[DataCategory] = &[
    DataCategory::Personal,
    DataCategory::Code,
    DataCategory::Learning,
    DataCategory::Tasks,
];

fn backends() -> Vec<(&'static str, MemoryHub)> {
    vec![
        ("memory", MemoryHub::new(Arc::new(InMemoryStore::new()))),
        (
            "sqlite",
            MemoryHub::new(Arc::new(SqliteStore::in_memory().unwrap())),
        ),
    ]
}

fn populate(hub: &MemoryHub, count: usize) -> Vec<MemoryId> {
    (0..count)
        .map(|i| {
            hub.store_memory(CreateMemoryInput {
                content: format!("Memory content number {} about rust and sqlite", i),
                category: Some(CATEGORIES[i % CATEGORIES.len()]),
                metadata: MetadataPatch {
                    tags: Some(vec![format!("tag{}", i % 10)]),
                    importance: Some((i % 5 + 1) as i64),
                    ..Default::default()
                },
                ..Default::default()
            })
            .unwrap()
            .id
        })
        .collect()
}

fn bench_memory_store(c: &mut Criterion) {
    let mut group = c.benchmark_group("memory_store");
    group.throughput(Throughput::Elements(1));

    for (name, hub) in backends() {
        group.bench_function(name, |b| {
            b.iter(|| {
                hub.store_memory(CreateMemoryInput {
                    content: "Test content for benchmarking purposes".to_string(),
                    metadata: MetadataPatch {
                        tags: Some(vec!["benchmark".to_string()]),
                        ..Default::default()
                    },
                    ..Default::default()
                })
                .unwrap()
            })
        });
    }

    group.finish();
}

fn bench_memory_retrieve(c: &mut Criterion) {
    let mut group = c.benchmark_group("memory_retrieve");
    group.throughput(Throughput::Elements(1));

    for (name, hub) in backends() {
        let ids = populate(&hub, 1000);
        group.bench_function(name, |b| {
            let mut i = 0;
            b.iter(|| {
                let id = &ids[i % ids.len()];
                i += 1;
                hub.retrieve_memory(black_box(id)).unwrap()
            })
        });
    }

    group.finish();
}

fn bench_memory_list(c: &mut Criterion) {
    let mut group = c.benchmark_group("memory_list");

    for (name, hub) in backends() {
        populate(&hub, 1000);
        for limit in [10usize, 50, 100] {
            group.bench_with_input(BenchmarkId::new(name, limit), &limit, |b, &limit| {
                b.iter(|| {
                    hub.list_memories(ListMemoriesInput {
                        category: Some(DataCategory::Code),
                        limit: Some(limit),
                        sort_by: Some(SortField::Importance),
                        ..Default::default()
                    })
                    .unwrap()
                })
            });
        }
    }

    group.finish();
}

fn bench_memory_search(c: &mut Criterion) {
    let mut group = c.benchmark_group("memory_search");

    for (name, hub) in backends() {
        populate(&hub, 1000);
        for query in ["rust", "number 42", "missing"] {
            group.bench_with_input(BenchmarkId::new(name, query), &query, |b, &query| {
                b.iter(|| {
                    hub.search_memories(SearchMemoriesInput {
                        query: black_box(query).to_string(),
                        ..Default::default()
                    })
                    .unwrap()
                })
            });
        }
    }

    group.finish();
}

fn bench_stats(c: &mut Criterion) {
    let mut group = c.benchmark_group("stats");

    for (name, hub) in backends() {
        populate(&hub, 1000);
        group.bench_function(name, |b| b.iter(|| hub.store().stats().unwrap()));
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_memory_store,
    bench_memory_retrieve,
    bench_memory_list,
    bench_memory_search,
    bench_stats
);
criterion_main!(benches);
