//! Route resolution benchmarks.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use http::Method;

use gatehouse_core::response::ResponseSchema;
use gatehouse_core::schema::value;
use gatehouse_core::{Contract, RouteDefinition};
use gatehouse_router::RouteTable;

fn definition() -> RouteDefinition {
    RouteDefinition::builder(ResponseSchema::new(value::any())).build()
}

fn build_table(route_count: usize) -> RouteTable {
    let mut builder = Contract::builder("bench");
    for i in 0..route_count {
        builder = builder
            .route(format!("/api/v1/resource{i}"), Method::GET, definition())
            .route(
                format!("/api/v1/resource{i}/{{id}}"),
                Method::GET,
                definition(),
            );
    }
    RouteTable::compile(&builder.build()).expect("bench contract compiles")
}

fn bench_resolve(c: &mut Criterion) {
    let table = build_table(50);

    c.bench_function("resolve_static_early", |b| {
        b.iter(|| table.resolve(black_box(&Method::GET), black_box("/api/v1/resource0")));
    });

    c.bench_function("resolve_param_late", |b| {
        b.iter(|| table.resolve(black_box(&Method::GET), black_box("/api/v1/resource49/123")));
    });

    c.bench_function("resolve_not_found", |b| {
        b.iter(|| table.resolve(black_box(&Method::GET), black_box("/api/v2/missing")));
    });
}

criterion_group!(benches, bench_resolve);
criterion_main!(benches);
