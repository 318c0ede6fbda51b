//! Frequency / normalized mode power of a rank-capped streaming DMD.

use streaming_dmd::signals::pairs;
use streaming_dmd::{dmd_spectrum, dmd_stability, Oscillator, StreamingConfig, StreamingDmd};

fn main() {
    env_logger::init();

    let dt = 0.01;
    let source = Oscillator::new(4000, dt, 0);
    let (f1, f2) = source.frequencies();

    let mut sdmd = StreamingDmd::new(StreamingConfig::with_max_rank(10));
    for (x, y) in pairs(source.snapshots(501, 1e-4)) {
        sdmd.update(&x, &y).unwrap();
    }
    let result = sdmd.compute_modes().unwrap();

    println!("Processed {} pairs, basis rank {}", sdmd.count(), sdmd.rank_x());
    println!("True frequencies: {f1} and {f2}\n");

    let mut spec = dmd_spectrum(&result, dt);
    spec.sort_by(|a, b| a.frequency.total_cmp(&b.frequency));
    println!("{:>10}  {:>10}  {:>10}", "frequency", "power", "|λ|");
    for m in &spec {
        let bar = "#".repeat((m.power * 40.0).round() as usize);
        println!(
            "{:>10.4}  {:>10.6}  {:>10.6}  {bar}",
            m.frequency, m.power, m.magnitude
        );
    }

    let stab = dmd_stability(&result, 1e-6);
    println!("\nSpectral radius: {:.6}", stab.spectral_radius);
}
