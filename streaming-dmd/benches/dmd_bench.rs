use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use streaming_dmd::signals::{collect_pairs, pairs};
use streaming_dmd::*;

const DT: f64 = 0.01;

fn bench_batch(c: &mut Criterion) {
    let mut group = c.benchmark_group("batch_dmd");

    for &(n_states, n_snaps) in &[(50, 101), (200, 201), (1000, 301)] {
        let (x, y) = collect_pairs(Oscillator::new(n_states, DT, 0).snapshots(n_snaps, 0.0)).unwrap();
        let config = DmdConfig::default();

        group.bench_function(format!("{n_states}x{n_snaps}"), |b| {
            b.iter(|| dmd(black_box(&x), black_box(&y), black_box(&config)).unwrap())
        });
    }

    group.finish();
}

fn bench_streaming_update(c: &mut Criterion) {
    let mut group = c.benchmark_group("streaming_update");

    for &(n_states, max_rank) in &[(200, 0), (200, 4), (1000, 0)] {
        let snaps: Vec<Vec<f64>> = Oscillator::new(n_states, DT, 0).snapshots(101, 1e-4).collect();
        let warm: Vec<(Vec<f64>, Vec<f64>)> = pairs(snaps).collect();
        let (x, y) = warm[warm.len() - 1].clone();

        group.bench_function(format!("{n_states}_rank{max_rank}"), |b| {
            b.iter_batched(
                || {
                    let mut sdmd = StreamingDmd::new(StreamingConfig::with_max_rank(max_rank));
                    for (xk, yk) in &warm[..warm.len() - 1] {
                        sdmd.update(xk, yk).unwrap();
                    }
                    sdmd
                },
                |mut sdmd| {
                    sdmd.update(black_box(&x), black_box(&y)).unwrap();
                    sdmd
                },
                BatchSize::SmallInput,
            )
        });
    }

    group.finish();
}

fn bench_compute_modes(c: &mut Criterion) {
    let mut sdmd = StreamingDmd::new(StreamingConfig::with_max_rank(16));
    for (x, y) in pairs(Oscillator::new(500, DT, 0).snapshots(201, 1e-4)) {
        sdmd.update(&x, &y).unwrap();
    }

    c.bench_function("compute_modes_500_rank16", |b| {
        b.iter(|| black_box(&sdmd).compute_modes().unwrap())
    });
}

criterion_group!(
    benches,
    bench_batch,
    bench_streaming_update,
    bench_compute_modes
);
criterion_main!(benches);
