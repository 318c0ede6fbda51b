use faer::Mat;

use crate::types::{DmdError, DmdResult, C64};
use crate::utils::complex_solve;

/// Mode amplitudes b solving Φ b ≈ x₀ in the least-squares sense.
pub fn dmd_amplitudes(result: &DmdResult, x0: &[f64]) -> Result<Vec<C64>, DmdError> {
    let n_vars = result.n_vars();
    if x0.len() != n_vars {
        return Err(DmdError::DimensionMismatch {
            expected: n_vars,
            actual: x0.len(),
        });
    }
    let rank = result.rank;
    let modes = &result.modes;

    // Normal equations: (Φᴴ Φ) b = Φᴴ x₀
    let mut gram = vec![vec![C64::zero(); rank]; rank];
    let mut rhs = vec![C64::zero(); rank];

    for i in 0..rank {
        for j in 0..rank {
            let mut val = C64::zero();
            for k in 0..n_vars {
                val += modes[k][i].conj() * modes[k][j];
            }
            gram[i][j] = val;
        }
        let mut val = C64::zero();
        for k in 0..n_vars {
            val += modes[k][i].conj() * C64::new(x0[k], 0.0);
        }
        rhs[i] = val;
    }

    complex_solve(&gram, &rhs)
}

/// Predict future states using DMD mode evolution.
///
/// x(k) = Σᵢ φᵢ · bᵢ · λᵢᵏ
///
/// # Arguments
/// * `result` - DMD result (batch or streaming).
/// * `x0` - Initial condition the amplitudes are fitted to.
/// * `n_ahead` - Number of future time steps to predict.
///
/// # Returns
/// Matrix (n_states × n_ahead); column k holds the state k+1 steps after `x0`.
pub fn predict_modes(
    result: &DmdResult,
    x0: &[f64],
    n_ahead: usize,
) -> Result<Mat<f64>, DmdError> {
    if n_ahead == 0 {
        return Err(DmdError::InvalidInput(
            "n_ahead must be positive".to_string(),
        ));
    }

    let amplitudes = dmd_amplitudes(result, x0)?;
    let n_vars = result.n_vars();
    let mut pred = Mat::<f64>::zeros(n_vars, n_ahead);

    for k in 0..n_ahead {
        let weights: Vec<C64> = (0..result.rank)
            .map(|j| amplitudes[j] * result.eigenvalues[j].powf((k + 1) as f64))
            .collect();
        for i in 0..n_vars {
            let mut val = C64::zero();
            for (j, w) in weights.iter().enumerate() {
                val += result.modes[i][j] * *w;
            }
            pred[(i, k)] = val.re;
        }
    }

    Ok(pred)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dmd::dmd_snapshots;
    use crate::streaming::{StreamingConfig, StreamingDmd};
    use crate::types::DmdConfig;
    use std::f64::consts::PI;

    fn assert_near(a: f64, b: f64, eps: f64) {
        assert!(
            (a - b).abs() < eps,
            "expected {a} ≈ {b} (diff = {})",
            (a - b).abs()
        );
    }

    fn signal(t: usize) -> [f64; 3] {
        let w = 2.0 * PI * 0.05;
        let t = t as f64;
        [(w * t).cos(), (w * t).sin(), 0.5 * (w * t).cos() - (w * t).sin()]
    }

    fn make_data(n_time: usize) -> Mat<f64> {
        let mut x = Mat::<f64>::zeros(3, n_time);
        for t in 0..n_time {
            let s = signal(t);
            for i in 0..3 {
                x[(i, t)] = s[i];
            }
        }
        x
    }

    #[test]
    fn test_amplitudes_reconstruct_initial_state() {
        let result = dmd_snapshots(&make_data(40), &DmdConfig::default()).unwrap();
        let x0 = signal(0);
        let b = dmd_amplitudes(&result, &x0).unwrap();

        for i in 0..3 {
            let mut val = C64::zero();
            for j in 0..result.rank {
                val += result.modes[i][j] * b[j];
            }
            assert_near(val.re, x0[i], 1e-8);
            assert_near(val.im, 0.0, 1e-8);
        }
    }

    #[test]
    fn test_predict_batch() {
        let result = dmd_snapshots(&make_data(40), &DmdConfig::default()).unwrap();
        let pred = predict_modes(&result, &signal(39), 10).unwrap();

        assert_eq!(pred.nrows(), 3);
        assert_eq!(pred.ncols(), 10);
        for k in 0..10 {
            let truth = signal(40 + k);
            for i in 0..3 {
                assert_near(pred[(i, k)], truth[i], 1e-6);
            }
        }
    }

    #[test]
    fn test_predict_streaming() {
        let mut sdmd = StreamingDmd::new(StreamingConfig::default());
        for t in 0..30 {
            sdmd.update(&signal(t), &signal(t + 1)).unwrap();
        }
        let result = sdmd.compute_modes().unwrap();
        let pred = predict_modes(&result, &signal(30), 5).unwrap();

        for k in 0..5 {
            let truth = signal(31 + k);
            for i in 0..3 {
                assert_near(pred[(i, k)], truth[i], 1e-6);
            }
        }
    }

    #[test]
    fn test_predict_zero_steps() {
        let result = dmd_snapshots(&make_data(20), &DmdConfig::default()).unwrap();
        assert!(predict_modes(&result, &signal(0), 0).is_err());
    }

    #[test]
    fn test_amplitudes_wrong_length() {
        let result = dmd_snapshots(&make_data(20), &DmdConfig::default()).unwrap();
        assert!(matches!(
            dmd_amplitudes(&result, &[1.0, 2.0]),
            Err(DmdError::DimensionMismatch {
                expected: 3,
                actual: 2
            })
        ));
    }
}
