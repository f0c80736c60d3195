//! Dense linear solve for the global boundary-condition system.
//!
//! LU factorization with partial pivoting, specialized to `f64`. The
//! systems assembled here have one row per unknown well strength plus one
//! for the reference constant, so a dense direct solve is the right tool.

use ndarray::{Array1, Array2};

use crate::error::AemError;

const PIVOT_TOL: f64 = 1e-30;

/// Solve `A·x = b` by LU factorization with partial pivoting.
pub fn lu_solve(a: &Array2<f64>, b: &Array1<f64>) -> Result<Array1<f64>, AemError> {
    let n = a.nrows();
    assert_eq!(a.ncols(), n, "system matrix must be square");
    assert_eq!(b.len(), n, "right-hand side length must match");

    let mut lu = a.clone();
    let mut x = b.clone();

    for k in 0..n {
        // Find pivot
        let mut max_val = lu[[k, k]].abs();
        let mut max_row = k;
        for i in (k + 1)..n {
            let val = lu[[i, k]].abs();
            if val > max_val {
                max_val = val;
                max_row = i;
            }
        }
        if max_val < PIVOT_TOL {
            return Err(AemError::SingularMatrix(k));
        }
        if max_row != k {
            for j in 0..n {
                lu.swap([k, j], [max_row, j]);
            }
            x.swap(k, max_row);
        }

        // Eliminate below the pivot
        let pivot = lu[[k, k]];
        for i in (k + 1)..n {
            let factor = lu[[i, k]] / pivot;
            lu[[i, k]] = factor;
            for j in (k + 1)..n {
                lu[[i, j]] -= factor * lu[[k, j]];
            }
            x[i] -= factor * x[k];
        }
    }

    // Back substitution
    for i in (0..n).rev() {
        for j in (i + 1)..n {
            let u_ij = lu[[i, j]];
            x[i] -= u_ij * x[j];
        }
        x[i] /= lu[[i, i]];
    }

    Ok(x)
}
