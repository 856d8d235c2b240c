//! Score vector and expected Fisher information
//!
//! Both weightings divide by the variance function, which the mean clamp
//! keeps strictly positive for every supported family. A zero-over-zero
//! weight can still arise from a flat link derivative; those entries drop
//! out of the sums rather than poisoning them.

use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Zip};

/// Gradient of the negative log-likelihood kernel with respect to the
/// coefficients: `-X' (w .* (y - mu))` with `w = deriv / var`
pub fn score(
    x: ArrayView2<f64>,
    y: ArrayView1<f64>,
    mu: ArrayView1<f64>,
    deriv: ArrayView1<f64>,
    var: ArrayView1<f64>,
) -> Array1<f64> {
    let weighted_resid = Zip::from(y)
        .and(mu)
        .and(deriv)
        .and(var)
        .map_collect(|&yi, &mi, &di, &vi| {
            let w = di / vi;
            if w.is_nan() {
                0.0
            } else {
                w * (yi - mi)
            }
        });

    let p = x.ncols();
    let mut g = Array1::zeros(p);
    for j in 0..p {
        g[j] = -x.column(j).dot(&weighted_resid);
    }
    g
}

/// Expected information `X' W X` with `w = deriv^2 / var`
///
/// Only the upper triangle is computed; the lower is mirrored.
pub fn fisher_information(
    x: ArrayView2<f64>,
    deriv: ArrayView1<f64>,
    var: ArrayView1<f64>,
) -> Array2<f64> {
    let w = Zip::from(deriv).and(var).map_collect(|&di, &vi| {
        let w = di * di / vi;
        if w.is_nan() {
            0.0
        } else {
            w
        }
    });

    let p = x.ncols();
    let mut info = Array2::zeros((p, p));
    for i in 0..p {
        let weighted_col = &x.column(i) * &w;
        info[[i, i]] = weighted_col.dot(&x.column(i));
        for j in (i + 1)..p {
            let entry = weighted_col.dot(&x.column(j));
            info[[i, j]] = entry;
            info[[j, i]] = entry;
        }
    }
    info
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_score_zero_at_least_squares_solution() {
        // gaussian identity: deriv = 1, var = 1, so the score is -X'(y - X beta)
        let x = array![[1.0, 0.0], [1.0, 1.0], [1.0, 2.0], [1.0, 3.0]];
        let y = array![1.0, 3.0, 5.0, 7.0];
        // y = 1 + 2 * x1 exactly
        let mu = array![1.0, 3.0, 5.0, 7.0];
        let ones = Array1::ones(4);
        let g = score(x.view(), y.view(), mu.view(), ones.view(), ones.view());
        assert!(g[0].abs() < 1e-12);
        assert!(g[1].abs() < 1e-12);
    }

    #[test]
    fn test_score_direction() {
        // underestimated mean pulls coefficients up, so the gradient of the
        // minimized objective must be negative
        let x = array![[1.0], [1.0]];
        let y = array![2.0, 2.0];
        let mu = array![1.0, 1.0];
        let ones = Array1::ones(2);
        let g = score(x.view(), y.view(), mu.view(), ones.view(), ones.view());
        assert!(g[0] < 0.0);
        assert!((g[0] + 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_information_identity_weights() {
        let x = array![[1.0, 2.0], [1.0, 0.5], [1.0, -1.0]];
        let ones = Array1::ones(3);
        let info = fisher_information(x.view(), ones.view(), ones.view());
        let xtx = x.t().dot(&x);
        for i in 0..2 {
            for j in 0..2 {
                assert!((info[[i, j]] - xtx[[i, j]]).abs() < 1e-12);
            }
        }
    }

    #[test]
    fn test_nan_weights_dropped() {
        let x = array![[1.0], [1.0]];
        let y = array![1.0, 5.0];
        let mu = array![1.0, 2.0];
        let deriv = array![0.0, 1.0];
        let var = array![0.0, 1.0];

        // first observation is 0/0 and must contribute nothing
        let g = score(x.view(), y.view(), mu.view(), deriv.view(), var.view());
        assert!((g[0] + 3.0).abs() < 1e-12);

        let info = fisher_information(x.view(), deriv.view(), var.view());
        assert!((info[[0, 0]] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_information_symmetry() {
        let x = array![
            [1.0, 0.3, -0.2],
            [1.0, 1.1, 0.4],
            [1.0, -0.7, 2.0],
            [1.0, 0.0, 1.5]
        ];
        let deriv = array![0.5, 0.8, 0.3, 1.2];
        let var = array![1.1, 0.9, 2.0, 0.7];
        let info = fisher_information(x.view(), deriv.view(), var.view());
        for i in 0..3 {
            for j in 0..3 {
                assert!((info[[i, j]] - info[[j, i]]).abs() < 1e-15);
            }
        }
    }
}
