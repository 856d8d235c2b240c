//! Dense symmetric solvers shared by the optimizers

use ndarray::{Array1, Array2, ArrayView1, ArrayView2};

/// Cholesky factor of a symmetric positive-definite matrix
///
/// Returns None on a non-positive pivot. Callers treat that as singular
/// curvature and report it; the factorization is never repaired.
fn cholesky(a: ArrayView2<f64>) -> Option<Array2<f64>> {
    let n = a.nrows();
    let mut l = Array2::<f64>::zeros((n, n));

    for i in 0..n {
        for j in 0..=i {
            let mut sum = a[[i, j]];
            for k in 0..j {
                sum -= l[[i, k]] * l[[j, k]];
            }
            if i == j {
                if !(sum > 0.0) || !sum.is_finite() {
                    return None;
                }
                l[[i, j]] = sum.sqrt();
            } else {
                l[[i, j]] = sum / l[[j, j]];
            }
        }
    }

    Some(l)
}

/// Forward then back substitution against a Cholesky factor
fn substitute(l: &Array2<f64>, b: ArrayView1<f64>) -> Array1<f64> {
    let n = b.len();

    let mut y = Array1::zeros(n);
    for i in 0..n {
        let mut sum = b[i];
        for j in 0..i {
            sum -= l[[i, j]] * y[j];
        }
        y[i] = sum / l[[i, i]];
    }

    let mut x = Array1::zeros(n);
    for i in (0..n).rev() {
        let mut sum = y[i];
        for j in (i + 1)..n {
            sum -= l[[j, i]] * x[j];
        }
        x[i] = sum / l[[i, i]];
    }

    x
}

/// Solve `A x = b` for symmetric positive-definite A
pub(crate) fn solve_sympd(a: ArrayView2<f64>, b: ArrayView1<f64>) -> Option<Array1<f64>> {
    let l = cholesky(a)?;
    Some(substitute(&l, b))
}

/// Inverse of a symmetric positive-definite matrix
///
/// Factors once and substitutes against each unit vector.
pub(crate) fn inverse_sympd(a: ArrayView2<f64>) -> Option<Array2<f64>> {
    let n = a.nrows();
    let l = cholesky(a)?;

    let mut inv = Array2::zeros((n, n));
    let mut e = Array1::zeros(n);
    for c in 0..n {
        e[c] = 1.0;
        let col = substitute(&l, e.view());
        inv.column_mut(c).assign(&col);
        e[c] = 0.0;
    }

    Some(inv)
}
