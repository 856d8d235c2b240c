//! Response distributions: domains, variance functions, likelihood kernels

use std::str::FromStr;

use ndarray::ArrayView1;

use crate::error::GlmSelectError;
use crate::family::Link;

/// Floor applied to fitted means (and exact-zero variances) to keep them
/// strictly inside the open domain, matching the single-precision machine
/// epsilon used by the reference implementations of these families
pub const MEAN_EPS: f64 = f32::EPSILON as f64;

/// Response distribution of a GLM
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Distribution {
    Gaussian,
    Binomial,
    Poisson,
    Gamma,
}

impl Distribution {
    /// Clamp a fitted mean into the distribution's valid open interval
    ///
    /// Binomial means live in (eps, 1-eps), poisson and gamma means in
    /// (eps, inf); gaussian means are unrestricted. Keeping means interior
    /// protects every log and division downstream.
    pub fn clamp_mean(&self, mu: f64) -> f64 {
        match self {
            Distribution::Binomial => {
                if mu <= 0.0 {
                    MEAN_EPS
                } else if mu >= 1.0 {
                    1.0 - MEAN_EPS
                } else {
                    mu
                }
            }
            Distribution::Poisson | Distribution::Gamma => {
                if mu <= 0.0 {
                    MEAN_EPS
                } else {
                    mu
                }
            }
            Distribution::Gaussian => mu,
        }
    }

    /// Variance function evaluated at a (clamped) mean; exact zeros floored
    pub fn variance(&self, mu: f64) -> f64 {
        let v = match self {
            Distribution::Poisson => mu,
            Distribution::Binomial => mu * (1.0 - mu),
            Distribution::Gamma => mu * mu,
            Distribution::Gaussian => 1.0,
        };
        if v == 0.0 {
            MEAN_EPS
        } else {
            v
        }
    }

    /// Negative log-likelihood kernel summed over observations
    ///
    /// This is the objective the optimizers minimize; the reported
    /// log-likelihood is its negation. Constant terms not depending on the
    /// mean are dropped.
    pub fn neg_log_likelihood(&self, y: ArrayView1<f64>, mu: ArrayView1<f64>) -> f64 {
        match self {
            Distribution::Poisson => y
                .iter()
                .zip(mu.iter())
                .map(|(&yi, &mi)| -yi * mi.ln() + mi)
                .sum(),
            Distribution::Binomial => y
                .iter()
                .zip(mu.iter())
                .map(|(&yi, &mi)| {
                    let theta = mi / (1.0 - mi);
                    -yi * theta.ln() + theta.ln_1p()
                })
                .sum(),
            Distribution::Gamma => y
                .iter()
                .zip(mu.iter())
                .map(|(&yi, &mi)| yi / mi + mi.ln())
                .sum(),
            Distribution::Gaussian => y
                .iter()
                .zip(mu.iter())
                .map(|(&yi, &mi)| (yi - mi) * (yi - mi) / 2.0)
                .sum(),
        }
    }

    /// Log-likelihood of the saturated model (mean fixed at the response)
    ///
    /// Under the same kernel as [`Self::neg_log_likelihood`], negated back to
    /// the log-likelihood scale. Zero poisson responses contribute nothing;
    /// the binomial kernel is identically zero at saturation.
    pub fn saturated_log_likelihood(&self, y: ArrayView1<f64>) -> f64 {
        match self {
            Distribution::Poisson => y
                .iter()
                .filter(|&&yi| yi != 0.0)
                .map(|&yi| yi * (yi.ln() - 1.0))
                .sum(),
            Distribution::Binomial => 0.0,
            Distribution::Gamma => y.iter().map(|&yi| -1.0 - yi.ln()).sum(),
            Distribution::Gaussian => 0.0,
        }
    }

    /// Whether the family estimates a dispersion parameter
    ///
    /// Gaussian and gamma fits carry one; it counts as an extra parameter in
    /// the information criteria.
    pub fn has_dispersion(&self) -> bool {
        matches!(self, Distribution::Gaussian | Distribution::Gamma)
    }

    /// Link used when the caller does not pick one
    pub fn canonical_link(&self) -> Link {
        match self {
            Distribution::Gaussian => Link::Identity,
            Distribution::Binomial => Link::Logit,
            Distribution::Poisson | Distribution::Gamma => Link::Log,
        }
    }

    /// Links whose range is compatible with this distribution's mean domain
    pub fn supports(&self, link: Link) -> bool {
        match self {
            Distribution::Gaussian | Distribution::Gamma => matches!(
                link,
                Link::Identity | Link::Log | Link::Inverse | Link::Sqrt
            ),
            Distribution::Binomial => {
                matches!(link, Link::Logit | Link::Probit | Link::Cloglog)
            }
            Distribution::Poisson => {
                matches!(link, Link::Identity | Link::Log | Link::Sqrt)
            }
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Distribution::Gaussian => "gaussian",
            Distribution::Binomial => "binomial",
            Distribution::Poisson => "poisson",
            Distribution::Gamma => "gamma",
        }
    }
}

impl FromStr for Distribution {
    type Err = GlmSelectError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "gaussian" => Ok(Distribution::Gaussian),
            "binomial" => Ok(Distribution::Binomial),
            "poisson" => Ok(Distribution::Poisson),
            "gamma" => Ok(Distribution::Gamma),
            other => Err(GlmSelectError::InvalidFamily {
                reason: format!("Unknown distribution '{}'", other),
            }),
        }
    }
}

impl std::fmt::Display for Distribution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
