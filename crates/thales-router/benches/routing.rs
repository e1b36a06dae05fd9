//! Lookup benchmarks.
//!
//! Run with: `cargo bench -p thales-router`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use http::Method;
use thales_router::Router;

fn build(count: usize) -> Router<usize> {
    let mut router = Router::new();
    for i in 0..count {
        router
            .insert(&Method::GET, &format!("/api/v1/res{i}"), i)
            .expect("static route");
        router
            .insert(&Method::GET, &format!("/api/v1/res{i}/{{id}}"), i)
            .expect("param route");
        router
            .insert(&Method::GET, &format!("/api/v1/org/{{org}}/res{i}/{{id}}"), i)
            .expect("nested route");
    }
    router
}

fn bench_lookup(c: &mut Criterion) {
    let router = build(50);
    let mut group = c.benchmark_group("lookup");
    for path in ["/api/v1/res25", "/api/v1/res25/991", "/api/v1/org/acme/res25/991", "/missing"] {
        group.bench_with_input(BenchmarkId::from_parameter(path), path, |b, p| {
            b.iter(|| black_box(router.lookup(&Method::GET, p)));
        });
    }
    group.finish();
}

fn bench_scaling(c: &mut Criterion) {
    let mut group = c.benchmark_group("scaling");
    for count in [10, 100, 500] {
        let router = build(count);
        let path = format!("/api/v1/res{}/42", count / 2);
        group.bench_with_input(BenchmarkId::from_parameter(count), &path, |b, p| {
            b.iter(|| black_box(router.lookup(&Method::GET, p)));
        });
    }
    group.finish();
}

criterion_group!(benches, bench_lookup, bench_scaling);
criterion_main!(benches);
