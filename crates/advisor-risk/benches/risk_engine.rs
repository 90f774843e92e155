//! Benchmarks for risk snapshot computation.

use advisor_core::types::{Portfolio, Position};
use advisor_risk::{PriceHistory, RiskConfig, RiskEngine};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rust_decimal::Decimal;

fn generate_closes(size: usize, phase: f64) -> Vec<f64> {
    (0..size)
        .map(|i| 100.0 + (i as f64 * 0.1 + phase).sin() * 10.0)
        .collect()
}

fn build_case(positions: usize, lookback: usize) -> (Portfolio, PriceHistory) {
    let mut portfolio = Portfolio::new("bench", "bench", Decimal::from(1_000_000));
    let mut history = PriceHistory::new(lookback);

    for i in 0..positions {
        let ticker = format!("T{i:03}");
        portfolio = portfolio.with_position(
            Position::new(&ticker, Decimal::from(10 + i as i64), Decimal::from(100))
                .with_sector(format!("S{}", i % 7)),
        );
        history.insert_closes(&ticker, &generate_closes(lookback + 1, i as f64));
    }
    history.set_benchmark_closes(&generate_closes(lookback + 1, 0.5));

    (portfolio, history)
}

fn benchmark_assess(c: &mut Criterion) {
    let mut group = c.benchmark_group("RiskEngine::assess");
    let engine = RiskEngine::new(RiskConfig::default());

    for positions in [5, 50, 500].iter() {
        let (portfolio, history) = build_case(*positions, 60);

        group.bench_with_input(
            BenchmarkId::new("positions", positions),
            &(portfolio, history),
            |b, (portfolio, history)| b.iter(|| engine.assess(black_box(portfolio), black_box(history))),
        );
    }

    group.finish();
}

criterion_group!(benches, benchmark_assess);
criterion_main!(benches);
