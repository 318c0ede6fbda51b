//! Synthetic snapshot sources.
//!
//! [`Oscillator`] is a linear system with two characteristic frequencies
//! embedded in a high-dimensional state through four random spatial
//! patterns. It is rank 4, so DMD should recover exactly two
//! complex-conjugate eigenvalue pairs.

use faer::Mat;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;

use crate::types::DmdError;

/// Two-frequency oscillator with random spatial structure.
///
/// Snapshot k is
/// `v1 cos(2π f1 dt k) + v2 cos(2π f2 dt k) + v3 sin(2π f1 dt k) + v4 sin(2π f2 dt k)`.
#[derive(Debug, Clone)]
pub struct Oscillator {
    n_states: usize,
    dt: f64,
    f1: f64,
    f2: f64,
    patterns: [Vec<f64>; 4],
    rng: StdRng,
}

impl Oscillator {
    /// Draw the spatial patterns from a standard normal with the given seed.
    /// Frequencies default to 5.2 and 1.0 (cycles per unit time).
    pub fn new(n_states: usize, dt: f64, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut draw = || -> Vec<f64> {
            (0..n_states)
                .map(|_| rng.sample::<f64, _>(StandardNormal))
                .collect()
        };
        let patterns = [draw(), draw(), draw(), draw()];
        Self {
            n_states,
            dt,
            f1: 5.2,
            f2: 1.0,
            patterns,
            rng,
        }
    }

    /// Replace the two characteristic frequencies.
    pub fn with_frequencies(mut self, f1: f64, f2: f64) -> Self {
        self.f1 = f1;
        self.f2 = f2;
        self
    }

    /// Snapshot dimension.
    pub fn n_states(&self) -> usize {
        self.n_states
    }

    /// Time step between snapshots.
    pub fn dt(&self) -> f64 {
        self.dt
    }

    /// The two characteristic frequencies (f1, f2).
    pub fn frequencies(&self) -> (f64, f64) {
        (self.f1, self.f2)
    }

    /// Noise-free snapshot at step k.
    pub fn state(&self, k: usize) -> Vec<f64> {
        let t = self.dt * k as f64;
        let (w1, w2) = (
            2.0 * std::f64::consts::PI * self.f1 * t,
            2.0 * std::f64::consts::PI * self.f2 * t,
        );
        let coeffs = [w1.cos(), w2.cos(), w1.sin(), w2.sin()];
        let [v1, v2, v3, v4] = &self.patterns;
        (0..self.n_states)
            .map(|i| {
                coeffs[0] * v1[i] + coeffs[1] * v2[i] + coeffs[2] * v3[i] + coeffs[3] * v4[i]
            })
            .collect()
    }

    /// Lazy sequence of `n_snaps` snapshots with additive Gaussian noise of
    /// variance `noise_cov`. Noise is drawn from the same random stream as
    /// the patterns, so a seed fixes the whole sequence.
    pub fn snapshots(self, n_snaps: usize, noise_cov: f64) -> Snapshots {
        Snapshots {
            oscillator: self,
            k: 0,
            n_snaps,
            noise_std: noise_cov.max(0.0).sqrt(),
        }
    }
}

/// Finite, single-pass snapshot iterator produced by [`Oscillator::snapshots`].
#[derive(Debug)]
pub struct Snapshots {
    oscillator: Oscillator,
    k: usize,
    n_snaps: usize,
    noise_std: f64,
}

impl Iterator for Snapshots {
    type Item = Vec<f64>;

    fn next(&mut self) -> Option<Vec<f64>> {
        if self.k >= self.n_snaps {
            return None;
        }
        let mut x = self.oscillator.state(self.k);
        if self.noise_std > 0.0 {
            let rng = &mut self.oscillator.rng;
            for v in x.iter_mut() {
                *v += self.noise_std * rng.sample::<f64, _>(StandardNormal);
            }
        }
        self.k += 1;
        Some(x)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = self.n_snaps - self.k;
        (left, Some(left))
    }
}

impl ExactSizeIterator for Snapshots {}

/// Adapter yielding consecutive pairs (x_k, x_{k+1}).
#[derive(Debug)]
pub struct Pairs<I: Iterator<Item = Vec<f64>>> {
    inner: I,
    prev: Option<Vec<f64>>,
}

impl<I: Iterator<Item = Vec<f64>>> Iterator for Pairs<I> {
    type Item = (Vec<f64>, Vec<f64>);

    fn next(&mut self) -> Option<Self::Item> {
        let x = match self.prev.take() {
            Some(x) => x,
            None => self.inner.next()?,
        };
        let y = self.inner.next()?;
        self.prev = Some(y.clone());
        Some((x, y))
    }
}

/// Turn a snapshot sequence into a sequence of consecutive pairs.
pub fn pairs<I>(snapshots: I) -> Pairs<I::IntoIter>
where
    I: IntoIterator<Item = Vec<f64>>,
{
    Pairs {
        inner: snapshots.into_iter(),
        prev: None,
    }
}

/// Materialize a snapshot sequence as time-aligned matrices X, Y
/// (n_states × (n_snaps - 1)) for batch DMD.
pub fn collect_pairs<I>(snapshots: I) -> Result<(Mat<f64>, Mat<f64>), DmdError>
where
    I: IntoIterator<Item = Vec<f64>>,
{
    let all: Vec<Vec<f64>> = snapshots.into_iter().collect();
    if all.len() < 2 {
        return Err(DmdError::InvalidInput(format!(
            "need at least 2 snapshots, got {}",
            all.len()
        )));
    }
    let n = all[0].len();
    if let Some(bad) = all.iter().find(|s| s.len() != n) {
        return Err(DmdError::DimensionMismatch {
            expected: n,
            actual: bad.len(),
        });
    }

    let m = all.len() - 1;
    let mut x = Mat::<f64>::zeros(n, m);
    let mut y = Mat::<f64>::zeros(n, m);
    for k in 0..m {
        for i in 0..n {
            x[(i, k)] = all[k][i];
            y[(i, k)] = all[k + 1][i];
        }
    }
    Ok((x, y))
}
