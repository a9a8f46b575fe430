use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use serde_json::json;

use follow_resolver::{CanonicalId, EntityMatcher, InMemoryRegistry};

const SIZES: [usize; 3] = [100, 1_000, 10_000];

fn id_for(i: usize) -> CanonicalId {
    CanonicalId::parse(&format!("{i:032x}"))
}

/// Registry where every entry is keyed the way the viewer keys player markers.
fn keyed_registry(size: usize) -> InMemoryRegistry {
    InMemoryRegistry::from_entries(
        (0..size).map(|i| (format!("bm-player-{}", id_for(i)), json!({ "name": format!("player{i}") }))),
    )
}

/// Registry whose keys carry no identifier, forcing the field scan.
fn field_registry(size: usize) -> InMemoryRegistry {
    InMemoryRegistry::from_entries((0..size).map(|i| {
        (
            format!("markers/{i}"),
            json!({ "data": { "name": format!("player{i}"), "uuid": id_for(i).to_display() } }),
        )
    }))
}

fn bench_find_by_identifier(c: &mut Criterion) {
    let mut group = c.benchmark_group("matcher/find_by_identifier");

    for size in SIZES {
        group.throughput(Throughput::Elements(size as u64));
        let last = id_for(size - 1);

        let keyed = EntityMatcher::new(Arc::new(keyed_registry(size)), "bm-player");
        group.bench_with_input(BenchmarkId::new("direct_key", size), &last, |b, id| {
            b.iter(|| black_box(keyed.find_by_identifier(black_box(id))));
        });

        // Wrong namespace: direct probes miss, every key gets scanned.
        let scanned = EntityMatcher::new(Arc::new(keyed_registry(size)), "other");
        group.bench_with_input(BenchmarkId::new("key_scan", size), &last, |b, id| {
            b.iter(|| black_box(scanned.find_by_identifier(black_box(id))));
        });

        let fields = EntityMatcher::new(Arc::new(field_registry(size)), "bm-player");
        group.bench_with_input(BenchmarkId::new("field_scan", size), &last, |b, id| {
            b.iter(|| black_box(fields.find_by_identifier(black_box(id))));
        });

        let missing = CanonicalId::parse("ffffffffffffffffffffffffffffffff");
        group.bench_with_input(BenchmarkId::new("miss", size), &missing, |b, id| {
            b.iter(|| black_box(keyed.find_by_identifier(black_box(id))));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_find_by_identifier);
criterion_main!(benches);
