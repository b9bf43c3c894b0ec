use criterion::{Criterion, criterion_group, criterion_main};
use jlog::inspect::cleanup::clean;
use jlog::{Inspector, Limits, inspect};
use std::collections::BTreeMap;
use std::hint::black_box;

fn bench_inspect_primitives(c: &mut Criterion) {
    c.bench_function("inspect::str", |b| {
        b.iter(|| inspect(black_box(&"request handled")));
    });
    c.bench_function("inspect::u64", |b| {
        b.iter(|| inspect(black_box(&1299_u64)));
    });
}

fn bench_inspect_containers(c: &mut Criterion) {
    let mut group = c.benchmark_group("inspect::containers");

    let small: Vec<u32> = (0..10).collect();
    group.bench_function("vec_10", |b| {
        b.iter(|| inspect(black_box(&small)));
    });

    let truncated: Vec<u32> = (0..10_000).collect();
    group.bench_function("vec_10000_truncated", |b| {
        b.iter(|| inspect(black_box(&truncated)));
    });

    let map: BTreeMap<String, Vec<f64>> = (0..50)
        .map(|i| (format!("series-{i}"), vec![f64::from(i); 8]))
        .collect();
    group.bench_function("map_50_of_vec", |b| {
        b.iter(|| inspect(black_box(&map)));
    });

    group.finish();
}

fn bench_inspect_json(c: &mut Criterion) {
    let value = serde_json::json!({
        "user": {"id": 42, "roles": ["admin", "billing"]},
        "items": [{"sku": "a-1", "qty": 2}, {"sku": "b-7", "qty": 1}],
        "total": 1299
    });
    let limits = Limits::default();

    c.bench_function("Inspector::inspect(json)", |b| {
        b.iter(|| Inspector::new(limits).inspect(black_box(&value)));
    });
}

fn bench_cleanup(c: &mut Criterion) {
    let values = inspect(&vec![1.0, f64::NAN, f64::INFINITY, 2.5]);

    c.bench_function("cleanup::clean", |b| {
        b.iter(|| clean(black_box(&values)));
    });
}

criterion_group!(
    benches,
    bench_inspect_primitives,
    bench_inspect_containers,
    bench_inspect_json,
    bench_cleanup,
);

criterion_main!(benches);
