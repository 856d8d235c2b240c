//! Warm-start coefficients from least squares on a transformed response

use ndarray::{Array1, ArrayView2};
use statrs::distribution::{ContinuousCDF, Normal};

use super::linalg::solve_sympd;
use crate::data::GlmData;
use crate::family::{Distribution, Family, Link};

/// Tail clamp for probability and log transforms
const RESPONSE_EPS: f64 = 1e-4;
/// Smallest magnitude fed to the reciprocal transform
const RECIP_FLOOR: f64 = 1e-2;

/// Seed `beta` by solving `X'X b = X'(z - offset)` where `z` is the
/// response pushed through the link.
///
/// Returns false for the gaussian identity family, which needs no seeding:
/// its first Newton step already lands on the least squares solution. Every
/// other pairing returns true, telling the caller its precomputed `X'X` no
/// longer stands in for the information matrix. When the normal-equations
/// solve fails, `beta` keeps the caller's values.
pub(super) fn warm_start(
    data: &GlmData,
    family: &Family,
    xtx: ArrayView2<f64>,
    beta: &mut Array1<f64>,
) -> bool {
    let z: Array1<f64> = match family.link() {
        Link::Log => data.y().mapv(|v| v.max(RESPONSE_EPS).ln()),
        Link::Inverse => data.y().mapv(|v| {
            let floored = if v.abs() < RECIP_FLOOR {
                v.signum() * RECIP_FLOOR
            } else {
                v
            };
            1.0 / floored
        }),
        Link::Sqrt => data.y().mapv(f64::sqrt),
        Link::Logit => data.y().mapv(|v| {
            let c = v.clamp(RESPONSE_EPS, 1.0 - RESPONSE_EPS);
            (c / (1.0 - c)).ln()
        }),
        Link::Probit => {
            let normal = Normal::new(0.0, 1.0).unwrap();
            let lo = normal.inverse_cdf(RESPONSE_EPS);
            let hi = normal.inverse_cdf(1.0 - RESPONSE_EPS);
            data.y().mapv(|v| if v == 0.0 { lo } else { hi })
        }
        Link::Cloglog => data.y().mapv(|v| {
            let c = v.clamp(RESPONSE_EPS, 1.0 - RESPONSE_EPS);
            (-(1.0 - c).ln()).ln()
        }),
        Link::Identity => {
            if family.distribution() == Distribution::Gaussian {
                return false;
            }
            data.y().to_owned()
        }
    };

    let rhs = data.x().t().dot(&(z - &data.offset()));
    if let Some(solved) = solve_sympd(xtx, rhs.view()) {
        *beta = solved;
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn xtx_of(data: &GlmData) -> ndarray::Array2<f64> {
        data.x().t().dot(&data.x())
    }

    #[test]
    fn test_gaussian_identity_is_left_alone() {
        let data = GlmData::new(array![[1.0], [1.0]], array![3.0, 5.0]).unwrap();
        let family = Family::new(Distribution::Gaussian, Link::Identity).unwrap();
        let mut beta = array![7.0];
        let applied = warm_start(&data, &family, xtx_of(&data).view(), &mut beta);
        assert!(!applied);
        assert_eq!(beta, array![7.0]);
    }

    #[test]
    fn test_poisson_identity_runs_raw_least_squares() {
        let data = GlmData::new(array![[1.0], [1.0], [1.0]], array![2.0, 4.0, 9.0]).unwrap();
        let family = Family::new(Distribution::Poisson, Link::Identity).unwrap();
        let mut beta = array![0.0];
        let applied = warm_start(&data, &family, xtx_of(&data).view(), &mut beta);
        assert!(applied);
        assert!((beta[0] - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_logit_seed_tracks_class_trend() {
        let x = array![[1.0, -1.0], [1.0, -0.5], [1.0, 0.5], [1.0, 1.0]];
        let y = array![0.0, 0.0, 1.0, 1.0];
        let data = GlmData::new(x, y).unwrap();
        let family = Family::new(Distribution::Binomial, Link::Logit).unwrap();
        let mut beta = array![0.0, 0.0];
        assert!(warm_start(&data, &family, xtx_of(&data).view(), &mut beta));
        assert!(beta[1] > 0.0);
        assert!(beta[0].abs() < 1e-10);
    }

    #[test]
    fn test_probit_seed_uses_tail_quantiles() {
        let data = GlmData::new(
            array![[1.0], [1.0], [1.0], [1.0]],
            array![0.0, 0.0, 0.0, 1.0],
        )
        .unwrap();
        let family = Family::new(Distribution::Binomial, Link::Probit).unwrap();
        let mut beta = array![0.0];
        assert!(warm_start(&data, &family, xtx_of(&data).view(), &mut beta));

        let normal = Normal::new(0.0, 1.0).unwrap();
        let expected = (3.0 * normal.inverse_cdf(1e-4) + normal.inverse_cdf(1.0 - 1e-4)) / 4.0;
        assert!((beta[0] - expected).abs() < 1e-10);
    }

    #[test]
    fn test_reciprocal_floor_preserves_sign() {
        let data = GlmData::new(array![[1.0], [1.0]], array![0.001, 2.0]).unwrap();
        let family = Family::new(Distribution::Gamma, Link::Inverse).unwrap();
        let mut beta = array![0.0];
        assert!(warm_start(&data, &family, xtx_of(&data).view(), &mut beta));
        // z = (1/0.01, 1/2) so the intercept is their mean
        assert!((beta[0] - 50.25).abs() < 1e-10);
    }

    #[test]
    fn test_singular_normal_equations_keep_caller_beta() {
        let x = array![[1.0, 1.0], [1.0, 1.0], [1.0, 1.0]];
        let y = array![1.0, 2.0, 3.0];
        let data = GlmData::new(x, y).unwrap();
        let family = Family::new(Distribution::Poisson, Link::Log).unwrap();
        let mut beta = array![0.25, -0.75];
        let applied = warm_start(&data, &family, xtx_of(&data).view(), &mut beta);
        assert!(applied);
        assert_eq!(beta, array![0.25, -0.75]);
    }
}
