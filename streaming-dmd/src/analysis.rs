use crate::types::{DmdResult, ModeInfo, SpectrumComparison, Stability, StabilityResult, C64};

/// Distance from the unit circle within which [`dmd_spectrum`] classifies
/// an eigenvalue as neutral.
pub const DEFAULT_STABILITY_TOL: f64 = 1e-6;

/// Analyze the DMD eigenvalue spectrum.
///
/// Returns per-mode information: magnitude, phase, frequency, growth rate,
/// stability classification (with [`DEFAULT_STABILITY_TOL`]) and normalized
/// mode power ‖φ‖·|λ|.
pub fn dmd_spectrum(result: &DmdResult, dt: f64) -> Vec<ModeInfo> {
    let powers = mode_powers(result);
    let mut info = Vec::with_capacity(result.rank);

    for (i, &power) in powers.iter().enumerate() {
        let lambda = result.eigenvalues[i];
        let mag = lambda.norm();
        let phase = lambda.arg();

        info.push(ModeInfo {
            index: i,
            eigenvalue: lambda,
            magnitude: mag,
            phase,
            frequency: phase.abs() / (2.0 * std::f64::consts::PI * dt),
            growth_rate: mag.ln() / dt,
            stability: classify_eigenvalue(mag, DEFAULT_STABILITY_TOL),
            power,
        });
    }

    info
}

/// Mode power ‖φⱼ‖·|λⱼ|, scaled so the largest is 1.
pub fn mode_powers(result: &DmdResult) -> Vec<f64> {
    let raw: Vec<f64> = (0..result.rank)
        .map(|j| result.mode_norm(j) * result.eigenvalues[j].norm())
        .collect();
    let max = raw.iter().copied().fold(0.0_f64, f64::max);
    if max > 0.0 {
        raw.iter().map(|p| p / max).collect()
    } else {
        raw
    }
}

/// Analyze system stability.
pub fn dmd_stability(result: &DmdResult, tol: f64) -> StabilityResult {
    let mode_stability: Vec<Stability> = result
        .eigenvalues
        .iter()
        .map(|lambda| classify_eigenvalue(lambda.norm(), tol))
        .collect();

    let spectral_radius = result
        .eigenvalues
        .iter()
        .map(|lambda| lambda.norm())
        .fold(0.0_f64, f64::max);

    StabilityResult {
        is_stable: !mode_stability.contains(&Stability::Growing),
        is_marginal: mode_stability.contains(&Stability::Neutral),
        spectral_radius,
        mode_stability,
    }
}

/// Indices of the `n` modes with the largest power, strongest first.
pub fn dmd_dominant_modes(result: &DmdResult, n: usize) -> Vec<usize> {
    let mut scored: Vec<(usize, f64)> = mode_powers(result).into_iter().enumerate().collect();
    scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    scored.iter().take(n).map(|(i, _)| *i).collect()
}

/// Sort eigenvalues by ascending real part, then ascending imaginary part.
pub fn sort_eigenvalues(eigenvalues: &mut [C64]) {
    eigenvalues.sort_by(|a, b| {
        a.re.partial_cmp(&b.re)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.im.partial_cmp(&b.im).unwrap_or(std::cmp::Ordering::Equal))
    });
}

/// Compare two spectra after canonical sorting.
///
/// Pairs are close when |λ - μ| ≤ `rel_tol` · max(1, |μ|).
pub fn compare_spectra(left: &[C64], right: &[C64], rel_tol: f64) -> SpectrumComparison {
    let mut left = left.to_vec();
    let mut right = right.to_vec();
    sort_eigenvalues(&mut left);
    sort_eigenvalues(&mut right);

    if left.len() != right.len() {
        return SpectrumComparison {
            left,
            right,
            max_difference: f64::INFINITY,
            all_close: false,
        };
    }

    let mut max_difference = 0.0_f64;
    let mut all_close = true;
    for (l, r) in left.iter().zip(&right) {
        let diff = (*l - *r).norm();
        max_difference = max_difference.max(diff);
        if diff > rel_tol * r.norm().max(1.0) {
            all_close = false;
        }
    }

    SpectrumComparison {
        left,
        right,
        max_difference,
        all_close,
    }
}

fn classify_eigenvalue(magnitude: f64, tol: f64) -> Stability {
    if magnitude < 1.0 - tol {
        Stability::Decaying
    } else if magnitude > 1.0 + tol {
        Stability::Growing
    } else {
        Stability::Neutral
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dmd::dmd_snapshots;
    use crate::types::DmdConfig;
    use faer::Mat;
    use std::f64::consts::PI;

    fn assert_near(a: f64, b: f64, eps: f64) {
        assert!(
            (a - b).abs() < eps,
            "expected {a} ≈ {b} (diff = {})",
            (a - b).abs()
        );
    }

    fn make_oscillatory_data(n_time: usize) -> Mat<f64> {
        let dt = 0.1;
        let mut x = Mat::<f64>::zeros(2, n_time);
        for t in 0..n_time {
            let time = t as f64 * dt;
            x[(0, t)] = (2.0 * PI * 0.5 * time).cos();
            x[(1, t)] = (2.0 * PI * 0.5 * time).sin();
        }
        x
    }

    fn make_decaying_data(n_time: usize) -> Mat<f64> {
        let dt = 0.1;
        let decay = 0.05;
        let mut x = Mat::<f64>::zeros(2, n_time);
        for t in 0..n_time {
            let time = t as f64 * dt;
            let envelope = (-decay * time).exp();
            x[(0, t)] = envelope * (2.0 * PI * 0.5 * time).cos();
            x[(1, t)] = envelope * (2.0 * PI * 0.5 * time).sin();
        }
        x
    }

    #[test]
    fn test_spectrum() {
        let x = make_oscillatory_data(200);
        let result = dmd_snapshots(&x, &DmdConfig::default()).unwrap();
        let spec = dmd_spectrum(&result, 0.1);

        assert_eq!(spec.len(), result.rank);
        for mode in &spec {
            assert_near(mode.magnitude, 1.0, 1e-8);
            assert_near(mode.frequency, 0.5, 1e-8);
            assert_eq!(mode.stability, Stability::Neutral);
        }
        let max_power = spec.iter().map(|m| m.power).fold(0.0_f64, f64::max);
        assert_near(max_power, 1.0, 1e-12);
    }

    #[test]
    fn test_spectrum_stability_matches_default_tolerance() {
        let x = make_decaying_data(200);
        let result = dmd_snapshots(&x, &DmdConfig::default()).unwrap();
        let spec = dmd_spectrum(&result, 0.1);
        let stab = dmd_stability(&result, DEFAULT_STABILITY_TOL);

        let from_spectrum: Vec<Stability> = spec.iter().map(|m| m.stability).collect();
        assert_eq!(from_spectrum, stab.mode_stability);
    }

    #[test]
    fn test_stability_stable() {
        let x = make_decaying_data(200);
        let result = dmd_snapshots(&x, &DmdConfig::default()).unwrap();
        let stab = dmd_stability(&result, 1e-6);

        assert!(stab.is_stable);
        assert!(!stab.is_marginal);
        assert!(stab
            .mode_stability
            .iter()
            .all(|s| *s == Stability::Decaying));
        assert_near(stab.spectral_radius, (-0.05_f64 * 0.1).exp(), 1e-8);
    }

    #[test]
    fn test_stability_neutral() {
        let x = make_oscillatory_data(200);
        let result = dmd_snapshots(&x, &DmdConfig::default()).unwrap();
        let stab = dmd_stability(&result, 1e-6);

        assert!(stab.is_stable);
        assert!(stab.is_marginal);
        assert_near(stab.spectral_radius, 1.0, 1e-8);
    }

    #[test]
    fn test_dominant_modes() {
        let x = make_oscillatory_data(50);
        let result = dmd_snapshots(&x, &DmdConfig::default()).unwrap();
        let top = dmd_dominant_modes(&result, 5);
        assert_eq!(top.len(), result.rank);
        assert_eq!(dmd_dominant_modes(&result, 1).len(), 1);
    }

    #[test]
    fn test_sort_eigenvalues() {
        let mut evals = vec![
            C64::new(0.5, 0.1),
            C64::new(-1.0, 0.0),
            C64::new(0.5, -0.1),
        ];
        sort_eigenvalues(&mut evals);
        assert_eq!(evals[0], C64::new(-1.0, 0.0));
        assert_eq!(evals[1], C64::new(0.5, -0.1));
        assert_eq!(evals[2], C64::new(0.5, 0.1));
    }

    #[test]
    fn test_compare_spectra_reordered() {
        let a = [C64::new(0.9, 0.2), C64::new(0.9, -0.2)];
        let b = [C64::new(0.9, -0.2), C64::new(0.9, 0.2 + 1e-9)];
        let cmp = compare_spectra(&a, &b, 1e-6);
        assert!(cmp.all_close);
        assert!(cmp.max_difference < 1e-8);
    }

    #[test]
    fn test_compare_spectra_count_mismatch() {
        let a = [C64::new(1.0, 0.0)];
        let b = [C64::new(1.0, 0.0), C64::new(0.5, 0.0)];
        let cmp = compare_spectra(&a, &b, 1e-6);
        assert!(!cmp.all_close);
        assert!(cmp.max_difference.is_infinite());
    }
}
