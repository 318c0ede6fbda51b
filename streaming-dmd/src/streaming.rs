//! Streaming DMD: bounded-memory, one-pair-at-a-time updates.
//!
//! [`StreamingDmd`] keeps orthonormal bases `Qx`, `Qy` for the observed
//! x- and y-snapshots together with three small accumulators expressed in
//! those bases:
//!
//! - `Gx = Σ x̃ x̃ᵀ` with x̃ = Qxᵀ x
//! - `Gy = Σ ỹ ỹᵀ` with ỹ = Qyᵀ y
//! - `A  = Σ ỹ x̃ᵀ`
//!
//! The reduced operator is `K = Qxᵀ Qy A Gx⁺`, whose eigenvalues approximate
//! the DMD eigenvalues; modes are `Φ = Qx W`.
//!
//! Each update either grows a basis by one column (when the new snapshot
//! has a significant component outside it) or, once `max_rank` is
//! exceeded, rotates it onto the dominant directions of its accumulator.
//! These are the only two structural changes and both happen inside
//! [`StreamingDmd::update`].
//!
//! Reference: Hemati, Williams & Rowley (2014), *Phys. Fluids*, 26, 111701.

use faer::Mat;

use crate::types::{DmdError, DmdResult};
use crate::utils::{
    column_from_slice, column_norm, eigen_split, lift_modes, pinv_counted, validate_matrix,
    validate_vector,
};

/// Upper bound on Gram-Schmidt passes once the residual stops shrinking
/// fast enough; a larger `n_gram` still takes precedence.
pub const MAX_GRAM_PASSES: usize = 10;

/// Configuration for streaming DMD.
#[derive(Debug, Clone)]
pub struct StreamingConfig {
    /// Maximum basis size. 0 for unbounded.
    pub max_rank: usize,
    /// A basis grows when ‖residual‖ / ‖snapshot‖ exceeds this.
    pub epsilon: f64,
    /// Minimum number of classical Gram-Schmidt passes per snapshot. At
    /// least one pass is made, and more while the residual keeps shrinking.
    pub n_gram: usize,
}

impl Default for StreamingConfig {
    fn default() -> Self {
        Self {
            max_rank: 0,
            epsilon: 1e-10,
            n_gram: 5,
        }
    }
}

impl StreamingConfig {
    /// Default configuration with the given rank cap.
    pub fn with_max_rank(max_rank: usize) -> Self {
        Self {
            max_rank,
            ..Default::default()
        }
    }
}

/// Incrementally updated DMD model.
///
/// `update` takes `&mut self` and must be fed pairs in temporal order;
/// `compute_matrix` and `compute_modes` are read-only and may be called
/// any number of times between updates.
///
/// # Example
///
/// ```
/// use streaming_dmd::{StreamingConfig, StreamingDmd};
///
/// let mut sdmd = StreamingDmd::new(StreamingConfig::default());
/// let theta = 0.1_f64;
/// let mut x = vec![1.0, 0.0];
/// for _ in 0..20 {
///     let y = vec![
///         theta.cos() * x[0] - theta.sin() * x[1],
///         theta.sin() * x[0] + theta.cos() * x[1],
///     ];
///     sdmd.update(&x, &y).unwrap();
///     x = y;
/// }
///
/// let result = sdmd.compute_modes().unwrap();
/// assert_eq!(result.rank, 2);
/// ```
#[derive(Debug, Clone)]
pub struct StreamingDmd {
    config: StreamingConfig,
    /// Snapshot dimension, fixed by the first update.
    n_states: Option<usize>,
    /// Number of pairs processed.
    count: usize,
    /// Orthonormal basis for x-snapshots (n_states × rx).
    qx: Mat<f64>,
    /// Orthonormal basis for y-snapshots (n_states × ry).
    qy: Mat<f64>,
    /// Σ x̃ x̃ᵀ (rx × rx).
    gx: Mat<f64>,
    /// Σ ỹ ỹᵀ (ry × ry).
    gy: Mat<f64>,
    /// Σ ỹ x̃ᵀ (ry × rx).
    a: Mat<f64>,
}

impl StreamingDmd {
    /// Create an empty model. The snapshot dimension is taken from the
    /// first call to [`update`](Self::update).
    pub fn new(config: StreamingConfig) -> Self {
        Self {
            config,
            n_states: None,
            count: 0,
            qx: Mat::<f64>::zeros(0, 0),
            qy: Mat::<f64>::zeros(0, 0),
            gx: Mat::<f64>::zeros(0, 0),
            gy: Mat::<f64>::zeros(0, 0),
            a: Mat::<f64>::zeros(0, 0),
        }
    }

    /// Process one snapshot pair (x, y) with y the successor of x.
    ///
    /// On error the model is left exactly as it was.
    pub fn update(&mut self, x: &[f64], y: &[f64]) -> Result<(), DmdError> {
        self.check_dimensions(x.len(), y.len())?;
        validate_vector(x)?;
        validate_vector(y)?;

        let n = x.len();
        if self.n_states.is_none() {
            self.qx = Mat::<f64>::zeros(n, 0);
            self.qy = Mat::<f64>::zeros(n, 0);
        }

        let x = column_from_slice(x);
        let y = column_from_slice(y);
        let max_rank = self.config.max_rank;

        // Basis extension tests
        let ex = self.extension(&self.qx, &x);
        let ey = self.extension(&self.qy, &y);

        let rx = self.qx.ncols() + usize::from(ex.is_some());
        let ry = self.qy.ncols() + usize::from(ey.is_some());

        // Zero-padded accumulators for the grown bases, then the rank-1
        // update with this pair's coordinates in those bases
        let x_tilde = coordinates(&self.qx, ex.as_ref(), &x);
        let y_tilde = coordinates(&self.qy, ey.as_ref(), &y);
        let mut gx = pad(&self.gx, rx, rx);
        let mut gy = pad(&self.gy, ry, ry);
        let mut a = pad(&self.a, ry, rx);
        add_outer(&mut a, &y_tilde, &x_tilde);
        add_outer(&mut gx, &x_tilde, &x_tilde);
        add_outer(&mut gy, &y_tilde, &y_tilde);

        // Compression rotations; the only fallible step, so it runs before
        // any state is touched
        let rotate_x = if max_rank > 0 && rx > max_rank {
            Some(dominant_directions(&gx, max_rank)?)
        } else {
            None
        };
        let rotate_y = if max_rank > 0 && ry > max_rank {
            Some(dominant_directions(&gy, max_rank)?)
        } else {
            None
        };

        self.n_states = Some(n);

        if let Some(e) = ex {
            self.qx = append_column(&self.qx, &e);
            log::debug!("x basis grew to rank {rx} at pair {}", self.count + 1);
        }
        if let Some(e) = ey {
            self.qy = append_column(&self.qy, &e);
            log::debug!("y basis grew to rank {ry} at pair {}", self.count + 1);
        }

        if let Some((p, s)) = rotate_x {
            self.qx = &self.qx * &p;
            a = &a * &p;
            gx = diagonal(&s);
            log::debug!("x basis compressed from rank {rx} to {max_rank}");
        }
        if let Some((p, s)) = rotate_y {
            self.qy = &self.qy * &p;
            a = p.transpose() * &a;
            gy = diagonal(&s);
            log::debug!("y basis compressed from rank {ry} to {max_rank}");
        }

        self.gx = gx;
        self.gy = gy;
        self.a = a;
        self.count += 1;

        log::trace!(
            "pair {}: rank_x = {}, rank_y = {}",
            self.count,
            self.qx.ncols(),
            self.qy.ncols()
        );
        Ok(())
    }

    /// Process every column pair of `x` and `y` in order.
    ///
    /// Shapes and values are validated up front, so a bad matrix leaves the
    /// model untouched.
    pub fn update_many(&mut self, x: &Mat<f64>, y: &Mat<f64>) -> Result<(), DmdError> {
        if x.ncols() != y.ncols() {
            return Err(DmdError::DimensionMismatch {
                expected: x.ncols(),
                actual: y.ncols(),
            });
        }
        self.check_dimensions(x.nrows(), y.nrows())?;
        validate_matrix(x, 1, 0)?;
        validate_matrix(y, 1, 0)?;

        let n = x.nrows();
        for j in 0..x.ncols() {
            let xj: Vec<f64> = (0..n).map(|i| x[(i, j)]).collect();
            let yj: Vec<f64> = (0..n).map(|i| y[(i, j)]).collect();
            self.update(&xj, &yj)?;
        }
        Ok(())
    }

    /// Reduced operator K = Qxᵀ Qy A Gx⁺ (rx × rx).
    ///
    /// Near-singular `Gx` is handled with a truncated pseudo-inverse.
    pub fn compute_matrix(&self) -> Result<Mat<f64>, DmdError> {
        if self.count == 0 {
            return Err(DmdError::EmptyState);
        }
        let rx = self.qx.ncols();
        if rx == 0 || self.qy.ncols() == 0 {
            return Ok(Mat::<f64>::zeros(rx, rx));
        }

        let (gx_pinv, dropped) = pinv_counted(&self.gx, None)?;
        if dropped > 0 {
            log::warn!(
                "Gx is numerically singular: dropped {dropped} of {rx} directions in pseudo-inverse"
            );
        }

        let qxt_qy = self.qx.transpose() * &self.qy;
        let k = &qxt_qy * &self.a;
        Ok(&k * &gx_pinv)
    }

    /// Approximate DMD modes and eigenvalues from the current state.
    pub fn compute_modes(&self) -> Result<DmdResult, DmdError> {
        let n_states = self.n_states.ok_or(DmdError::EmptyState)?;
        let k = self.compute_matrix()?;
        let rank = k.nrows();
        if rank == 0 {
            return Ok(DmdResult::empty(n_states));
        }

        let (eigenvalues, w_re, w_im) = eigen_split(&k)?;
        let modes = lift_modes(&self.qx, &w_re, &w_im);

        Ok(DmdResult {
            modes,
            eigenvalues,
            rank,
            a_tilde: k,
            n_states,
        })
    }

    /// Number of pairs processed so far.
    pub fn count(&self) -> usize {
        self.count
    }

    /// Current size of the x basis.
    pub fn rank_x(&self) -> usize {
        self.qx.ncols()
    }

    /// Current size of the y basis.
    pub fn rank_y(&self) -> usize {
        self.qy.ncols()
    }

    /// Snapshot dimension, once established.
    pub fn n_states(&self) -> Option<usize> {
        self.n_states
    }

    /// Configuration this model was built with.
    pub fn config(&self) -> &StreamingConfig {
        &self.config
    }

    /// Orthonormal basis for the x-snapshots (n_states × rank_x).
    pub fn basis_x(&self) -> &Mat<f64> {
        &self.qx
    }

    /// Orthonormal basis for the y-snapshots (n_states × rank_y).
    pub fn basis_y(&self) -> &Mat<f64> {
        &self.qy
    }

    /// Accumulator Σ x̃ x̃ᵀ in the current x basis.
    pub fn gram_x(&self) -> &Mat<f64> {
        &self.gx
    }

    /// Accumulator Σ ỹ ỹᵀ in the current y basis.
    pub fn gram_y(&self) -> &Mat<f64> {
        &self.gy
    }

    /// Cross accumulator Σ ỹ x̃ᵀ.
    pub fn cross(&self) -> &Mat<f64> {
        &self.a
    }

    fn check_dimensions(&self, nx: usize, ny: usize) -> Result<(), DmdError> {
        let expected = self.n_states.unwrap_or(nx);
        if nx != expected {
            return Err(DmdError::DimensionMismatch {
                expected,
                actual: nx,
            });
        }
        if ny != expected {
            return Err(DmdError::DimensionMismatch {
                expected,
                actual: ny,
            });
        }
        Ok(())
    }

    /// Normalized residual of `v` against `q`, if it is large enough to
    /// extend the basis.
    ///
    /// Runs the configured number of classical Gram-Schmidt passes, then
    /// keeps re-orthogonalizing while a pass still shrinks the residual by
    /// more than 1/√2, up to [`MAX_GRAM_PASSES`]. A basis that already spans
    /// the whole state space never grows.
    fn extension(&self, q: &Mat<f64>, v: &Mat<f64>) -> Option<Mat<f64>> {
        if q.ncols() >= q.nrows() {
            return None;
        }
        let v_norm = column_norm(v, 0);
        if v_norm == 0.0 {
            return None;
        }

        let mut e = v.clone();
        let mut e_norm = v_norm;
        if q.ncols() > 0 {
            let mut pass = 0;
            loop {
                let d = q.transpose() * &e;
                let proj = q * &d;
                e = &e - &proj;
                let next = column_norm(&e, 0);
                let shrank = next < std::f64::consts::FRAC_1_SQRT_2 * e_norm;
                e_norm = next;
                pass += 1;

                if pass >= self.config.n_gram && (!shrank || pass >= MAX_GRAM_PASSES) {
                    break;
                }
            }
        }

        if e_norm / v_norm > self.config.epsilon {
            for i in 0..e.nrows() {
                e[(i, 0)] /= e_norm;
            }
            Some(e)
        } else {
            None
        }
    }
}

/// Copy `m` into the top-left corner of a zero matrix of the given size.
fn pad(m: &Mat<f64>, nrows: usize, ncols: usize) -> Mat<f64> {
    let mut out = Mat::<f64>::zeros(nrows, ncols);
    for j in 0..m.ncols().min(ncols) {
        for i in 0..m.nrows().min(nrows) {
            out[(i, j)] = m[(i, j)];
        }
    }
    out
}

fn append_column(q: &Mat<f64>, col: &Mat<f64>) -> Mat<f64> {
    let r = q.ncols();
    let mut out = pad(q, q.nrows(), r + 1);
    for i in 0..q.nrows() {
        out[(i, r)] = col[(i, 0)];
    }
    out
}

fn diagonal(values: &[f64]) -> Mat<f64> {
    let r = values.len();
    let mut out = Mat::<f64>::zeros(r, r);
    for (i, &v) in values.iter().enumerate() {
        out[(i, i)] = v;
    }
    out
}

/// Coordinates of `v` in the basis `q`, extended by `extension` when the
/// basis is about to grow.
fn coordinates(q: &Mat<f64>, extension: Option<&Mat<f64>>, v: &Mat<f64>) -> Mat<f64> {
    let r = q.ncols();
    let mut c = Mat::<f64>::zeros(r + usize::from(extension.is_some()), 1);
    if r > 0 {
        let proj = q.transpose() * v;
        for i in 0..r {
            c[(i, 0)] = proj[(i, 0)];
        }
    }
    if let Some(e) = extension {
        c[(r, 0)] = (0..v.nrows()).map(|i| e[(i, 0)] * v[(i, 0)]).sum();
    }
    c
}

/// m += u vᵀ for column vectors u, v.
fn add_outer(m: &mut Mat<f64>, u: &Mat<f64>, v: &Mat<f64>) {
    for j in 0..m.ncols() {
        for i in 0..m.nrows() {
            m[(i, j)] += u[(i, 0)] * v[(j, 0)];
        }
    }
}

/// Leading `r` singular directions of a symmetric positive semi-definite
/// accumulator, together with the retained singular values.
fn dominant_directions(g: &Mat<f64>, r: usize) -> Result<(Mat<f64>, Vec<f64>), DmdError> {
    let svd = g.svd().map_err(|e| DmdError::SvdFailed(format!("{e:?}")))?;
    let s_col = svd.S().column_vector();
    let p = svd.U().subcols(0, r).to_owned();
    let s: Vec<f64> = (0..r).map(|i| s_col[i]).collect();
    Ok((p, s))
}
