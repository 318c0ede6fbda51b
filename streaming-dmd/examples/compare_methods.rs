//! Batch vs streaming DMD on the same noisy two-frequency data.
//!
//! Run with `RUST_LOG=debug` to see rank and basis diagnostics.

use streaming_dmd::signals::{collect_pairs, pairs};
use streaming_dmd::{
    compare_spectra, dmd, sort_eigenvalues, DmdConfig, Oscillator, RankSelection,
    StreamingConfig, StreamingDmd, C64,
};

const N_STATES: usize = 4000;
const N_SNAPS: usize = 501;
const DT: f64 = 0.01;
const NOISE_COV: f64 = 0.0;
const MAX_RANK: usize = 0;
const SEED: u64 = 0;

fn print_spectrum(label: &str, eigenvalues: &[C64]) {
    println!("{label} ({} eigenvalues):", eigenvalues.len());
    for ev in eigenvalues {
        println!("  {:+.10} {:+.10}i   |λ|={:.10}", ev.re, ev.im, ev.norm());
    }
}

fn main() {
    env_logger::init();

    // Standard DMD needs every snapshot in memory
    let (x, y) = collect_pairs(Oscillator::new(N_STATES, DT, SEED).snapshots(N_SNAPS, NOISE_COV))
        .unwrap();
    let mut config = DmdConfig::default();
    if MAX_RANK > 0 {
        config.rank = RankSelection::Fixed(MAX_RANK);
    }
    let batch = dmd(&x, &y, &config).unwrap();

    // Streaming DMD sees one pair at a time
    let mut sdmd = StreamingDmd::new(StreamingConfig::with_max_rank(MAX_RANK));
    for (xk, yk) in pairs(Oscillator::new(N_STATES, DT, SEED).snapshots(N_SNAPS, NOISE_COV)) {
        sdmd.update(&xk, &yk).unwrap();
    }
    let streaming = sdmd.compute_modes().unwrap();

    let mut batch_evals = batch.eigenvalues.clone();
    let mut streaming_evals = streaming.eigenvalues.clone();
    sort_eigenvalues(&mut batch_evals);
    sort_eigenvalues(&mut streaming_evals);

    print_spectrum("Standard DMD", &batch_evals);
    println!();
    print_spectrum("Streaming DMD", &streaming_evals);

    let cmp = compare_spectra(&batch_evals, &streaming_evals, 1e-6);
    println!(
        "\nSpectra agree: {} (max difference {:.3e})",
        cmp.all_close, cmp.max_difference
    );
}
