//! Benchmarks for the write/notify path and scoped resolution.
//!
//! Run with: cargo bench --bench service_bench

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion};

use cascade_core::{Path, Route, Scope, Service};

fn leaf(route: &str, id: u32) -> Path {
    Route::new(route).unwrap().bind(Scope::Leaf, id).unwrap()
}

fn bench_write_no_subscribers(c: &mut Criterion) {
    let service = Service::new();
    let path = leaf("bench/write/plain", 1);

    c.bench_function("write_no_subscribers", |b| {
        b.iter(|| {
            service.write(black_box(&path), black_box(42)).unwrap();
        });
    });
}

fn bench_write_with_bubbling(c: &mut Criterion) {
    let service = Service::new();
    for prefix in ["bench", "bench/write", "bench/write/deep"] {
        for _ in 0..8 {
            service.subscribe_fn(prefix, |_| Ok(())).unwrap();
        }
    }
    let path = leaf("bench/write/deep", 1);

    c.bench_function("write_24_subscribers_3_levels", |b| {
        b.iter(|| {
            service.write(black_box(&path), black_box(42)).unwrap();
        });
    });
}

fn bench_scoped_get_leaf_hit(c: &mut Criterion) {
    let service = Service::new();
    service.write(&leaf("bench/read/key", 7), 19.99).unwrap();
    let scoped = service.scoped(3, 7);

    c.bench_function("scoped_get_leaf_hit", |b| {
        b.iter(|| scoped.get_float(black_box("bench/read/key")).unwrap());
    });
}

fn bench_scoped_get_default_fallback(c: &mut Criterion) {
    let service = Service::new();
    let route = Route::new("bench/read/fallback").unwrap();
    service.write(&Path::new(route), 19.99).unwrap();
    let scoped = service.scoped(3, 7);

    c.bench_function("scoped_get_default_fallback", |b| {
        b.iter(|| scoped.get_float(black_box("bench/read/fallback")).unwrap());
    });
}

criterion_group!(
    benches,
    bench_write_no_subscribers,
    bench_write_with_bubbling,
    bench_scoped_get_leaf_hit,
    bench_scoped_get_default_fallback
);
criterion_main!(benches);
