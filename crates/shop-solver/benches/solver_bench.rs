use criterion::{black_box, criterion_group, criterion_main, Criterion};
use shop_solver::{solve, Model, Rel, SolveLimits};

/// A procurement-shaped model: eight SKUs, capacity and budget rows, and a
/// lower/upper band per color channel.
fn procurement_model() -> Model {
    let volumes = [500.0, 500.0, 1000.0, 2500.0, 500.0, 1000.0, 2500.0, 10000.0];
    let prices = [100.0, 120.0, 250.0, 500.0, 110.0, 260.0, 520.0, 1800.0];
    let channel_of = [0usize, 1, 1, 2, 2, 3, 3, 0];

    let mut m = Model::new();
    for (&v, &_p) in volumes.iter().zip(&prices) {
        m.add_var(v, 30.0);
    }
    let cap_terms: Vec<(usize, f64)> = volumes.iter().copied().enumerate().collect();
    m.add_constraint(cap_terms, Rel::Le, 40_000.0);
    let cost_terms: Vec<(usize, f64)> = prices.iter().copied().enumerate().collect();
    m.add_constraint(cost_terms, Rel::Le, 9_000.0);
    for ch in 0..4 {
        let terms: Vec<(usize, f64)> = volumes
            .iter()
            .enumerate()
            .filter(|&(i, _)| channel_of[i] == ch)
            .map(|(i, &v)| (i, v))
            .collect();
        m.add_constraint(terms.clone(), Rel::Ge, 4_500.0);
        m.add_constraint(terms, Rel::Le, 11_000.0);
    }
    m
}

fn bench_solve(c: &mut Criterion) {
    let model = procurement_model();
    let limits = SolveLimits::default();
    c.bench_function("procurement solve 8 skus", |b| {
        b.iter(|| {
            let _ = black_box(solve(&model, &limits));
        })
    });
}

criterion_group!(benches, bench_solve);
criterion_main!(benches);
