// ============================================================
// Layer 5 — Dense Linear Algebra for the GP
// ============================================================
// Square matrices are row-major &[f64] of length n * n.
//
// The GP only ever needs:
//   - a Cholesky factor K = L Lᵀ of its kernel matrix
//   - forward / backward substitution against L
//
// Kernel matrices are PSD in theory but can lose definiteness
// numerically when points are close together, so the factor
// retries with growing diagonal jitter.

use anyhow::{bail, Result};

/// Jitter added to the diagonal on successive Cholesky retries
const JITTER_SCHEDULE: [f64; 3] = [1e-6, 1e-5, 1e-4];

/// Lower-triangular Cholesky factor of `a` (n × n, row-major).
/// Returns None if `a` is not numerically positive definite.
pub fn cholesky(a: &[f64], n: usize) -> Option<Vec<f64>> {
    debug_assert_eq!(a.len(), n * n);
    let mut l = vec![0.0; n * n];

    for i in 0..n {
        for j in 0..=i {
            let mut sum = a[i * n + j];
            for k in 0..j {
                sum -= l[i * n + k] * l[j * n + k];
            }
            if i == j {
                if !(sum > 0.0) || !sum.is_finite() {
                    return None;
                }
                l[i * n + i] = sum.sqrt();
            } else {
                l[i * n + j] = sum / l[j * n + j];
            }
        }
    }
    Some(l)
}

/// Cholesky that retries with jitter on the diagonal.
pub fn cholesky_with_jitter(a: &[f64], n: usize) -> Result<Vec<f64>> {
    if let Some(l) = cholesky(a, n) {
        return Ok(l);
    }

    let mut jittered = a.to_vec();
    let mut applied  = 0.0;
    for jitter in JITTER_SCHEDULE {
        for i in 0..n {
            jittered[i * n + i] += jitter - applied;
        }
        applied = jitter;
        if let Some(l) = cholesky(&jittered, n) {
            tracing::debug!("Cholesky succeeded with jitter {:e}", jitter);
            return Ok(l);
        }
    }
    bail!("kernel matrix is not positive definite even with jitter {:e}", applied)
}

/// Solve L x = b for lower-triangular L.
pub fn solve_lower(l: &[f64], n: usize, b: &[f64]) -> Vec<f64> {
    let mut x = vec![0.0; n];
    for i in 0..n {
        let mut sum = b[i];
        for k in 0..i {
            sum -= l[i * n + k] * x[k];
        }
        x[i] = sum / l[i * n + i];
    }
    x
}

/// Solve Lᵀ x = b for lower-triangular L.
pub fn solve_upper_transposed(l: &[f64], n: usize, b: &[f64]) -> Vec<f64> {
    let mut x = vec![0.0; n];
    for i in (0..n).rev() {
        let mut sum = b[i];
        for k in i + 1..n {
            sum -= l[k * n + i] * x[k];
        }
        x[i] = sum / l[i * n + i];
    }
    x
}

/// Solve (L Lᵀ) x = b.
pub fn cholesky_solve(l: &[f64], n: usize, b: &[f64]) -> Vec<f64> {
    let y = solve_lower(l, n, b);
    solve_upper_transposed(l, n, &y)
}

/// (L Lᵀ)⁻¹ as a dense row-major matrix.
pub fn cholesky_inverse(l: &[f64], n: usize) -> Vec<f64> {
    let mut inv = vec![0.0; n * n];
    let mut e   = vec![0.0; n];
    for col in 0..n {
        e.iter_mut().for_each(|v| *v = 0.0);
        e[col] = 1.0;
        let x = cholesky_solve(l, n, &e);
        for row in 0..n {
            inv[row * n + col] = x[row];
        }
    }
    inv
}
