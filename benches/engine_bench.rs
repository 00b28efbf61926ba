//! Criterion benchmarks over the in-memory engine. Run locally with
//! `cargo bench --bench engine_bench` — not in CI.

use criterion::{criterion_group, criterion_main, Criterion};
use vitrine::{RawProduct, Services, Settings};

fn seeded(count: usize) -> Services {
    let services = Services::from_settings(Settings::default()).expect("startup");
    let rows: Vec<RawProduct> = (0..count)
        .map(|i| RawProduct {
            id: format!("p-{i}"),
            name: Some(format!("Product {i}")),
            categories: Some(["Chairs", "Tables", "Sofas", "Lighting"][i % 4].into()),
            price: Some(format!("{}", 40 + (i * 37) % 2000)),
            description: Some("benchmark catalog item".into()),
            ..Default::default()
        })
        .collect();
    services.catalog.ingest(rows).expect("ingest");
    services
}

fn bench_recommend(c: &mut Criterion) {
    let services = seeded(1000);
    c.bench_function("recommend_top5_of_1k", |b| {
        b.iter(|| {
            services
                .engine
                .recommend("mid-century walnut chair", Some(5), None, None, None)
                .expect("recommend")
        })
    });

    c.bench_function("recommend_filtered_top5_of_1k", |b| {
        b.iter(|| {
            services
                .engine
                .recommend(
                    "mid-century walnut chair",
                    Some(5),
                    Some("Chairs"),
                    Some(100.0),
                    Some(900.0),
                )
                .expect("recommend")
        })
    });
}

fn bench_trending_and_metrics(c: &mut Criterion) {
    let services = seeded(1000);
    c.bench_function("trending_top10_of_1k", |b| {
        b.iter(|| services.engine.trending(Some(10)).expect("trending"))
    });

    c.bench_function("analytics_metrics_1k", |b| {
        b.iter(|| services.analytics.metrics().expect("metrics"))
    });
}

fn bench_ingest(c: &mut Criterion) {
    c.bench_function("ingest_100", |b| {
        b.iter_with_setup(
            || {
                let services = Services::from_settings(Settings::default()).expect("startup");
                let rows: Vec<RawProduct> = (0..100)
                    .map(|i| RawProduct {
                        id: format!("p-{i}"),
                        name: Some(format!("Product {i}")),
                        categories: Some("Chairs".into()),
                        price: Some("$199".into()),
                        ..Default::default()
                    })
                    .collect();
                (services, rows)
            },
            |(services, rows)| services.catalog.ingest(rows).expect("ingest"),
        )
    });
}

criterion_group!(
    benches,
    bench_recommend,
    bench_trending_and_metrics,
    bench_ingest
);
criterion_main!(benches);
