use faer::Mat;

use crate::types::{DmdConfig, DmdError, DmdResult};
use crate::utils::{determine_rank, eigen_split, lift_modes, validate_matrix};

/// Perform batch Dynamic Mode Decomposition on time-aligned snapshot matrices.
///
/// # Arguments
/// * `x` - Snapshots (n_states × m), columns are time-ordered.
/// * `y` - Successors (n_states × m), `y[:, k]` follows `x[:, k]`.
/// * `config` - Rank selection and mode convention.
///
/// # Algorithm
/// 1. Truncated SVD: X ≈ U Σ Vᵀ
/// 2. Reduced operator: Ã = Uᵀ Y V Σ⁻¹
/// 3. Eigendecomposition: Ã W = W Λ
/// 4. DMD modes: Φ = Y V Σ⁻¹ W (exact) or Φ = U W (projected)
///
/// All-zero `x` yields a result with no modes.
pub fn dmd(x: &Mat<f64>, y: &Mat<f64>, config: &DmdConfig) -> Result<DmdResult, DmdError> {
    if x.nrows() != y.nrows() {
        return Err(DmdError::DimensionMismatch {
            expected: x.nrows(),
            actual: y.nrows(),
        });
    }
    if x.ncols() != y.ncols() {
        return Err(DmdError::DimensionMismatch {
            expected: x.ncols(),
            actual: y.ncols(),
        });
    }
    validate_matrix(x, 1, 1)?;
    validate_matrix(y, 1, 1)?;

    let n_vars = x.nrows();

    let svd = x
        .thin_svd()
        .map_err(|e| DmdError::SvdFailed(format!("{e:?}")))?;
    let u_full = svd.U();
    let v_full = svd.V();
    let s_col = svd.S().column_vector();

    let n_sv = s_col.nrows();
    let s_vals: Vec<f64> = (0..n_sv).map(|i| s_col[i]).collect();

    let rank = determine_rank(&s_vals, config.rank);
    if rank == 0 {
        return Ok(DmdResult::empty(n_vars));
    }

    let u = u_full.subcols(0, rank).to_owned();
    let v = v_full.subcols(0, rank).to_owned();
    let s: Vec<f64> = s_vals[..rank].to_vec();

    // Y V Σ⁻¹ (n_states × r), shared by Ã and the exact modes
    let y_v = y * &v;
    let mut y_v_sinv = Mat::<f64>::zeros(n_vars, rank);
    for i in 0..n_vars {
        for j in 0..rank {
            y_v_sinv[(i, j)] = y_v[(i, j)] / s[j];
        }
    }

    // Ã = Uᵀ Y V Σ⁻¹
    let a_tilde = u.transpose() * &y_v_sinv;

    let (eigenvalues, w_re, w_im) = eigen_split(&a_tilde)?;

    let modes = if config.exact {
        lift_modes(&y_v_sinv, &w_re, &w_im)
    } else {
        lift_modes(&u, &w_re, &w_im)
    };

    log::debug!("batch DMD: {n_vars} states, {} pairs, rank {rank}", x.ncols());

    Ok(DmdResult {
        modes,
        eigenvalues,
        rank,
        a_tilde,
        n_states: n_vars,
    })
}

/// Batch DMD on a single time-ordered data matrix.
///
/// Splits `data` into X = data[:, 0..n-1] and Y = data[:, 1..n].
pub fn dmd_snapshots(data: &Mat<f64>, config: &DmdConfig) -> Result<DmdResult, DmdError> {
    validate_matrix(data, 1, 2)?;
    let n_time = data.ncols();
    let x = data.subcols(0, n_time - 1).to_owned();
    let y = data.subcols(1, n_time - 1).to_owned();
    dmd(&x, &y, config)
}

/// Left singular vectors of `x` kept under `config`, i.e. the basis U the
/// batch reduced operator is expressed in.
pub fn dmd_basis(x: &Mat<f64>, config: &DmdConfig) -> Result<Mat<f64>, DmdError> {
    validate_matrix(x, 1, 1)?;
    let svd = x
        .thin_svd()
        .map_err(|e| DmdError::SvdFailed(format!("{e:?}")))?;
    let s_col = svd.S().column_vector();
    let s_vals: Vec<f64> = (0..s_col.nrows()).map(|i| s_col[i]).collect();
    let rank = determine_rank(&s_vals, config.rank);
    Ok(svd.U().subcols(0, rank).to_owned())
}
