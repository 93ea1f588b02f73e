//! Benchmarks for metrics kernels.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use dca_core::types::{PricePoint, PriceSeries};
use dca_metrics::{simd, CorrelationConfig, CorrelationMatrix, MetricsEngine};
use std::collections::BTreeMap;

const DAY: i64 = 86_400_000;

fn generate_test_data(size: usize, phase: f64) -> Vec<f64> {
    (0..size)
        .map(|i| 100.0 + (i as f64 * 0.1 + phase).sin() * 10.0)
        .collect()
}

fn generate_series(symbol: &str, size: usize, phase: f64) -> PriceSeries {
    let points = generate_test_data(size, phase)
        .into_iter()
        .enumerate()
        .map(|(i, close)| PricePoint::new(i as i64 * DAY, close, 1_000.0))
        .collect();
    PriceSeries::from_points(symbol, points).expect("monotonic timestamps")
}

fn scalar_returns(data: &[f64]) -> Vec<f64> {
    data.windows(2).map(|w| w[1] / w[0] - 1.0).collect()
}

fn benchmark_returns(c: &mut Criterion) {
    let mut group = c.benchmark_group("Returns");

    for size in [180, 1000, 10000].iter() {
        let data = generate_test_data(*size, 0.0);

        group.bench_with_input(BenchmarkId::new("standard", size), &data, |b, data| {
            b.iter(|| scalar_returns(black_box(data)))
        });

        group.bench_with_input(BenchmarkId::new("simd", size), &data, |b, data| {
            b.iter(|| simd::returns_simd(black_box(data)))
        });
    }

    group.finish();
}

fn benchmark_asset_metrics(c: &mut Criterion) {
    let engine = MetricsEngine::default();
    let series = generate_series("BTC", 180, 0.0);

    c.bench_function("asset_metrics_180d", |b| {
        b.iter(|| engine.compute(black_box(&series), None))
    });
}

fn benchmark_correlation(c: &mut Criterion) {
    let mut group = c.benchmark_group("Correlation");

    for assets in [5, 20, 50].iter() {
        let histories: BTreeMap<String, PriceSeries> = (0..*assets)
            .map(|i| {
                let symbol = format!("ASSET{i:02}");
                let series = generate_series(&symbol, 180, i as f64 * 0.3);
                (symbol, series)
            })
            .collect();

        group.bench_with_input(BenchmarkId::new("matrix", assets), &histories, |b, h| {
            b.iter(|| CorrelationMatrix::from_histories(black_box(h), &CorrelationConfig::default()))
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    benchmark_returns,
    benchmark_asset_metrics,
    benchmark_correlation
);
criterion_main!(benches);
