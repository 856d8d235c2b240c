//! GLM families: response distributions paired with link functions

mod distribution;
mod link;

pub use distribution::{Distribution, MEAN_EPS};
pub use link::Link;

use ndarray::{Array1, ArrayView1};

use crate::error::{GlmSelectError, Result};

/// A validated (distribution, link) pair
///
/// Construction rejects combinations whose link range cannot cover the
/// distribution's mean domain, so every downstream computation may assume a
/// coherent pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Family {
    distribution: Distribution,
    link: Link,
}

impl Family {
    pub fn new(distribution: Distribution, link: Link) -> Result<Self> {
        if !distribution.supports(link) {
            return Err(GlmSelectError::InvalidFamily {
                reason: format!(
                    "{} does not support the {} link",
                    distribution.name(),
                    link.name()
                ),
            });
        }
        Ok(Self { distribution, link })
    }

    /// Parse a family from its textual names, failing fast on unknown or
    /// incompatible pairs
    pub fn parse(distribution: &str, link: &str) -> Result<Self> {
        Self::new(distribution.parse()?, link.parse()?)
    }

    pub fn distribution(&self) -> Distribution {
        self.distribution
    }

    pub fn link(&self) -> Link {
        self.link
    }

    /// Fitted means from the linear predictor, clamped into the
    /// distribution's open domain
    pub fn mean(&self, eta: ArrayView1<f64>) -> Array1<f64> {
        let mut mu = self.link.mean(eta);
        mu.mapv_inplace(|v| self.distribution.clamp_mean(v));
        mu
    }

    /// dmu/deta at the current iterate
    pub fn mean_derivative(&self, mu: ArrayView1<f64>, eta: ArrayView1<f64>) -> Array1<f64> {
        self.link.mean_derivative(mu, eta)
    }

    /// Variance function at the current means
    pub fn variance(&self, mu: ArrayView1<f64>) -> Array1<f64> {
        mu.mapv(|m| self.distribution.variance(m))
    }

    /// Objective minimized by the optimizers (negative log-likelihood kernel)
    pub fn neg_log_likelihood(&self, y: ArrayView1<f64>, mu: ArrayView1<f64>) -> f64 {
        self.distribution.neg_log_likelihood(y, mu)
    }

    /// Saturated-model log-likelihood for deviance computation
    pub fn saturated_log_likelihood(&self, y: ArrayView1<f64>) -> f64 {
        self.distribution.saturated_log_likelihood(y)
    }

    pub fn has_dispersion(&self) -> bool {
        self.distribution.has_dispersion()
    }
}

impl std::fmt::Display for Family {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}({})", self.distribution.name(), self.link.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_incompatible_pairs_rejected() {
        assert!(Family::new(Distribution::Binomial, Link::Log).is_err());
        assert!(Family::new(Distribution::Binomial, Link::Identity).is_err());
        assert!(Family::new(Distribution::Poisson, Link::Logit).is_err());
        assert!(Family::new(Distribution::Gaussian, Link::Cloglog).is_err());

        assert!(Family::new(Distribution::Binomial, Link::Logit).is_ok());
        assert!(Family::new(Distribution::Poisson, Link::Log).is_ok());
        assert!(Family::new(Distribution::Gamma, Link::Inverse).is_ok());
    }

    #[test]
    fn test_parse_fails_fast() {
        assert!(Family::parse("binomial", "logit").is_ok());
        assert!(Family::parse("binomial", "log").is_err());
        assert!(Family::parse("negbin", "log").is_err());
    }

    #[test]
    fn test_mean_is_clamped() {
        let family = Family::new(Distribution::Binomial, Link::Logit).unwrap();
        // Extreme linear predictors saturate the logistic; the clamp keeps
        // the means strictly inside (0, 1)
        let eta = array![-80.0, 0.0, 80.0];
        let mu = family.mean(eta.view());
        assert!(mu[0] > 0.0);
        assert!((mu[1] - 0.5).abs() < 1e-12);
        assert!(mu[2] < 1.0);
    }

    #[test]
    fn test_display() {
        let family = Family::new(Distribution::Poisson, Link::Log).unwrap();
        assert_eq!(family.to_string(), "poisson(log)");
    }
}
