use faer::Mat;

use crate::types::{DmdError, RankSelection, C64};

/// Validate that a matrix meets minimum dimension requirements and contains no NaN/Inf.
pub fn validate_matrix(x: &Mat<f64>, min_rows: usize, min_cols: usize) -> Result<(), DmdError> {
    let (rows, cols) = (x.nrows(), x.ncols());
    if rows < min_rows {
        return Err(DmdError::InvalidInput(format!(
            "matrix has {rows} rows, need at least {min_rows}"
        )));
    }
    if cols < min_cols {
        return Err(DmdError::InvalidInput(format!(
            "matrix has {cols} columns, need at least {min_cols}"
        )));
    }
    for j in 0..cols {
        for i in 0..rows {
            if !x[(i, j)].is_finite() {
                return Err(DmdError::InvalidInput(
                    "matrix contains NaN or Inf values".to_string(),
                ));
            }
        }
    }
    Ok(())
}

/// Validate a single snapshot vector.
pub fn validate_vector(x: &[f64]) -> Result<(), DmdError> {
    if x.is_empty() {
        return Err(DmdError::InvalidInput("snapshot is empty".to_string()));
    }
    if x.iter().any(|v| !v.is_finite()) {
        return Err(DmdError::InvalidInput(
            "snapshot contains NaN or Inf values".to_string(),
        ));
    }
    Ok(())
}

/// Determine truncation rank from singular values sorted in decreasing order.
///
/// Returns 0 when every singular value is zero.
pub fn determine_rank(singular_values: &[f64], selection: RankSelection) -> usize {
    let n = singular_values.len();
    if n == 0 {
        return 0;
    }
    let max_sv = singular_values[0];
    if max_sv <= 0.0 {
        return 0;
    }

    match selection {
        RankSelection::Fixed(r) => {
            let usable = singular_values
                .iter()
                .take_while(|&&s| s > max_sv * f64::EPSILON)
                .count();
            r.min(usable)
        }
        RankSelection::Tolerance(tol) => singular_values
            .iter()
            .take_while(|&&s| s > tol * max_sv)
            .count(),
        RankSelection::Energy(threshold) => {
            let total: f64 = singular_values.iter().map(|s| s * s).sum();
            let mut cumulative = 0.0;
            for (i, &s) in singular_values.iter().enumerate() {
                cumulative += s * s;
                if cumulative / total >= threshold {
                    return i + 1;
                }
            }
            n
        }
    }
}

/// Compute the Moore-Penrose pseudo-inverse via SVD.
pub fn pinv(a: &Mat<f64>, tol: Option<f64>) -> Result<Mat<f64>, DmdError> {
    pinv_counted(a, tol).map(|(inv, _)| inv)
}

/// Pseudo-inverse plus the number of singular values discarded as
/// numerically zero.
pub fn pinv_counted(a: &Mat<f64>, tol: Option<f64>) -> Result<(Mat<f64>, usize), DmdError> {
    let m = a.nrows();
    let n = a.ncols();
    if m == 0 || n == 0 {
        return Ok((Mat::<f64>::zeros(n, m), 0));
    }

    let svd = a.svd().map_err(|e| DmdError::SvdFailed(format!("{e:?}")))?;
    let u = svd.U();
    let s_col = svd.S().column_vector();
    let v = svd.V();

    let k = s_col.nrows();
    let max_sv = (0..k).map(|i| s_col[i].abs()).fold(0.0_f64, f64::max);

    let tol = tol.unwrap_or_else(|| {
        let max_dim = m.max(n) as f64;
        max_sv * max_dim * f64::EPSILON
    });

    // pinv(A) = V S_inv U^T
    let mut result = Mat::<f64>::zeros(n, m);
    let mut dropped = 0;

    for idx in 0..k {
        let si = s_col[idx];
        if si.abs() > tol {
            let si_inv = 1.0 / si;
            for j in 0..n {
                for i in 0..m {
                    result[(j, i)] += v[(j, idx)] * si_inv * u[(i, idx)];
                }
            }
        } else {
            dropped += 1;
        }
    }

    Ok((result, dropped))
}

/// Eigendecomposition of a small real square matrix.
///
/// Returns the eigenvalues and the real/imaginary parts of the eigenvector
/// matrix W (columns are eigenvectors).
pub fn eigen_split(a: &Mat<f64>) -> Result<(Vec<C64>, Mat<f64>, Mat<f64>), DmdError> {
    let r = a.nrows();
    if r == 0 {
        return Ok((Vec::new(), Mat::<f64>::zeros(0, 0), Mat::<f64>::zeros(0, 0)));
    }

    let eigen = a
        .as_ref()
        .eigen()
        .map_err(|e| DmdError::EigenFailed(format!("{e:?}")))?;

    let eigenvalues_diag = eigen.S().column_vector();
    let eigenvectors = eigen.U();

    let mut eigenvalues = Vec::with_capacity(r);
    let mut w_re = Mat::<f64>::zeros(r, r);
    let mut w_im = Mat::<f64>::zeros(r, r);

    for j in 0..r {
        let ev = eigenvalues_diag[j];
        eigenvalues.push(C64::new(ev.re, ev.im));
        for i in 0..r {
            let v = eigenvectors[(i, j)];
            w_re[(i, j)] = v.re;
            w_im[(i, j)] = v.im;
        }
    }

    Ok((eigenvalues, w_re, w_im))
}

/// Lift reduced eigenvectors into state space: Φ = B W, packed row-major.
pub fn lift_modes(basis: &Mat<f64>, w_re: &Mat<f64>, w_im: &Mat<f64>) -> Vec<Vec<C64>> {
    let n_vars = basis.nrows();
    let rank = w_re.ncols();
    if rank == 0 {
        return vec![Vec::new(); n_vars];
    }

    let modes_re = basis * w_re;
    let modes_im = basis * w_im;

    let mut modes = vec![vec![C64::zero(); rank]; n_vars];
    for i in 0..n_vars {
        for j in 0..rank {
            modes[i][j] = C64::new(modes_re[(i, j)], modes_im[(i, j)]);
        }
    }
    modes
}

/// Solve a complex linear system Ax = b using Gaussian elimination.
pub fn complex_solve(a: &[Vec<C64>], b: &[C64]) -> Result<Vec<C64>, DmdError> {
    let n = b.len();
    let mut aug: Vec<Vec<C64>> = a
        .iter()
        .enumerate()
        .map(|(i, row)| {
            let mut new_row = row.clone();
            new_row.push(b[i]);
            new_row
        })
        .collect();

    for col in 0..n {
        // Partial pivoting
        let mut max_norm = aug[col][col].norm();
        let mut max_row = col;
        for row in (col + 1)..n {
            let norm = aug[row][col].norm();
            if norm > max_norm {
                max_norm = norm;
                max_row = row;
            }
        }
        if max_norm < 1e-14 {
            return Err(DmdError::SolveFailed("singular matrix".into()));
        }
        aug.swap(col, max_row);

        let pivot = aug[col][col];
        for row in (col + 1)..n {
            let factor = aug[row][col] / pivot;
            for j in col..=n {
                let sub = factor * aug[col][j];
                aug[row][j] = aug[row][j] - sub;
            }
        }
    }

    let mut x = vec![C64::zero(); n];
    for i in (0..n).rev() {
        let mut sum = aug[i][n];
        for j in (i + 1)..n {
            sum = sum - aug[i][j] * x[j];
        }
        x[i] = sum / aug[i][i];
    }

    Ok(x)
}

/// Copy a slice into an n × 1 column matrix.
pub fn column_from_slice(x: &[f64]) -> Mat<f64> {
    let mut col = Mat::<f64>::zeros(x.len(), 1);
    for (i, &v) in x.iter().enumerate() {
        col[(i, 0)] = v;
    }
    col
}

/// Euclidean norm of column j.
pub fn column_norm(m: &Mat<f64>, j: usize) -> f64 {
    (0..m.nrows())
        .map(|i| m[(i, j)] * m[(i, j)])
        .sum::<f64>()
        .sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_near(a: f64, b: f64, eps: f64) {
        assert!(
            (a - b).abs() < eps,
            "expected {a} ≈ {b} (diff = {})",
            (a - b).abs()
        );
    }

    #[test]
    fn test_validate_matrix_ok() {
        let m = Mat::<f64>::identity(3, 3);
        assert!(validate_matrix(&m, 1, 1).is_ok());
    }

    #[test]
    fn test_validate_matrix_nan() {
        let mut m = Mat::<f64>::zeros(2, 2);
        m[(0, 0)] = 1.0;
        m[(0, 1)] = f64::NAN;
        assert!(validate_matrix(&m, 1, 1).is_err());
    }

    #[test]
    fn test_validate_vector() {
        assert!(validate_vector(&[1.0, 2.0]).is_ok());
        assert!(validate_vector(&[]).is_err());
        assert!(validate_vector(&[1.0, f64::INFINITY]).is_err());
    }

    #[test]
    fn test_determine_rank_tolerance() {
        let s = vec![10.0, 5.0, 1e-8, 1e-14];
        assert_eq!(determine_rank(&s, RankSelection::Tolerance(1e-10)), 3);
        assert_eq!(determine_rank(&s, RankSelection::Tolerance(1e-6)), 2);
    }

    #[test]
    fn test_determine_rank_drops_value_at_cutoff() {
        // Kept values must lie strictly above tol * σ_max
        let s = vec![8.0, 4.0, 2.0, 1.0];
        assert_eq!(determine_rank(&s, RankSelection::Tolerance(0.25)), 2);
        assert_eq!(determine_rank(&s, RankSelection::Tolerance(0.2)), 3);
    }

    #[test]
    fn test_determine_rank_explicit() {
        let s = vec![10.0, 5.0, 1.0, 0.1];
        assert_eq!(determine_rank(&s, RankSelection::Fixed(2)), 2);
        assert_eq!(determine_rank(&s, RankSelection::Fixed(10)), 4);
    }

    #[test]
    fn test_determine_rank_fixed_skips_zero_values() {
        let s = vec![3.0, 0.0, 0.0];
        assert_eq!(determine_rank(&s, RankSelection::Fixed(3)), 1);
    }

    #[test]
    fn test_determine_rank_energy() {
        let s = vec![10.0, 5.0, 1.0, 0.1];
        let total: f64 = s.iter().map(|x| x * x).sum();
        let r = determine_rank(&s, RankSelection::Energy(0.99));
        let captured: f64 = s.iter().take(r).map(|x| x * x).sum();
        assert!(captured / total >= 0.99);
    }

    #[test]
    fn test_determine_rank_all_zero() {
        let s = vec![0.0, 0.0];
        assert_eq!(determine_rank(&s, RankSelection::Tolerance(1e-10)), 0);
        assert_eq!(determine_rank(&s, RankSelection::Fixed(2)), 0);
    }

    #[test]
    fn test_pinv_identity() {
        let m = Mat::<f64>::identity(3, 3);
        let m_inv = pinv(&m, None).unwrap();
        for i in 0..3 {
            for j in 0..3 {
                let expected = if i == j { 1.0 } else { 0.0 };
                assert_near(m_inv[(i, j)], expected, 1e-10);
            }
        }
    }

    #[test]
    fn test_pinv_counts_dropped_directions() {
        let mut m = Mat::<f64>::zeros(2, 2);
        m[(0, 0)] = 2.0;
        let (m_inv, dropped) = pinv_counted(&m, None).unwrap();
        assert_eq!(dropped, 1);
        assert_near(m_inv[(0, 0)], 0.5, 1e-12);
        assert_near(m_inv[(1, 1)], 0.0, 1e-12);
    }

    #[test]
    fn test_eigen_split_rotation() {
        // Rotation by θ has eigenvalues e^{±iθ}
        let theta = 0.3_f64;
        let mut a = Mat::<f64>::zeros(2, 2);
        a[(0, 0)] = theta.cos();
        a[(0, 1)] = -theta.sin();
        a[(1, 0)] = theta.sin();
        a[(1, 1)] = theta.cos();

        let (evals, _, _) = eigen_split(&a).unwrap();
        assert_eq!(evals.len(), 2);
        for ev in &evals {
            assert_near(ev.norm(), 1.0, 1e-12);
            assert_near(ev.arg().abs(), theta, 1e-12);
        }
    }

    #[test]
    fn test_complex_solve() {
        let a = vec![
            vec![C64::new(2.0, 0.0), C64::new(0.0, 1.0)],
            vec![C64::new(0.0, -1.0), C64::new(3.0, 0.0)],
        ];
        let x_true = [C64::new(1.0, -1.0), C64::new(0.5, 2.0)];
        let b: Vec<C64> = (0..2)
            .map(|i| a[i][0] * x_true[0] + a[i][1] * x_true[1])
            .collect();
        let x = complex_solve(&a, &b).unwrap();
        for i in 0..2 {
            assert_near(x[i].re, x_true[i].re, 1e-12);
            assert_near(x[i].im, x_true[i].im, 1e-12);
        }
    }

    #[test]
    fn test_column_helpers() {
        let col = column_from_slice(&[3.0, 4.0]);
        assert_eq!(col.nrows(), 2);
        assert_near(column_norm(&col, 0), 5.0, 1e-12);
    }
}
