use criterion::{black_box, criterion_group, criterion_main, Criterion};
use coexnet_stats::correlation::CorrelationMatrix;
use coexnet_stats::normalization::tpm;

fn random_f64(n: usize, seed: u64) -> Vec<f64> {
    let mut state = seed;
    (0..n)
        .map(|_| {
            state = state.wrapping_mul(6364136223846793005).wrapping_add(1);
            (state >> 11) as f64 / (1u64 << 53) as f64
        })
        .collect()
}

fn bench_tpm(c: &mut Criterion) {
    let mut group = c.benchmark_group("tpm");

    // 20k genes × 100 samples, counts scaled into a plausible range
    let counts: Vec<f64> = random_f64(20_000 * 100, 7)
        .into_iter()
        .map(|v| (v * 1000.0).floor())
        .collect();
    let lengths: Vec<f64> = random_f64(20_000, 11).into_iter().map(|v| 0.2 + v * 10.0).collect();

    group.bench_function("20k_x100", |b| {
        b.iter(|| tpm(black_box(&counts), 20_000, 100, black_box(&lengths)))
    });

    group.finish();
}

fn bench_correlation_matrix(c: &mut Criterion) {
    let mut group = c.benchmark_group("correlation");

    // 500 genes × 200 samples → 500×500 correlation matrix
    let vars: Vec<Vec<f64>> = (0..500).map(|i| random_f64(200, 42 + i)).collect();
    let refs: Vec<&[f64]> = vars.iter().map(|v| v.as_slice()).collect();

    group.bench_function("500x200_matrix", |b| {
        b.iter(|| CorrelationMatrix::from_rows(black_box(&refs)))
    });

    group.finish();
}

criterion_group!(benches, bench_tpm, bench_correlation_matrix);
criterion_main!(benches);
