//! Link functions mapping the linear predictor to the mean scale

use std::str::FromStr;

use ndarray::{Array1, ArrayView1};
use statrs::distribution::{Continuous, ContinuousCDF, Normal};

use crate::error::GlmSelectError;

/// Link function for a GLM
///
/// The inverse transform produces the fitted mean from the linear predictor;
/// the derivative is dmu/deta, the weight ingredient for score and
/// information computations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Link {
    Identity,
    Log,
    Logit,
    Probit,
    Cloglog,
    Inverse,
    Sqrt,
}

impl Link {
    /// Apply the inverse link to a vector of linear predictors
    ///
    /// Domain clamping is the distribution's job, not the link's; this
    /// returns the raw transform.
    pub fn mean(&self, eta: ArrayView1<f64>) -> Array1<f64> {
        match self {
            Link::Identity => eta.to_owned(),
            Link::Log => eta.mapv(f64::exp),
            Link::Logit => eta.mapv(|e| 1.0 / (1.0 + (-e).exp())),
            Link::Probit => {
                let normal = Normal::new(0.0, 1.0).unwrap();
                eta.mapv(|e| normal.cdf(e))
            }
            Link::Cloglog => eta.mapv(|e| 1.0 - (-e.exp()).exp()),
            Link::Inverse => eta.mapv(|e| 1.0 / e),
            Link::Sqrt => eta.mapv(|e| e * e),
        }
    }

    /// Derivative of the mean with respect to the linear predictor
    ///
    /// Expressed through the (already clamped) mean wherever possible; the
    /// probit derivative is the normal density of the raw linear predictor.
    pub fn mean_derivative(&self, mu: ArrayView1<f64>, eta: ArrayView1<f64>) -> Array1<f64> {
        match self {
            Link::Identity => Array1::ones(mu.len()),
            Link::Log => mu.to_owned(),
            Link::Logit => mu.mapv(|m| m * (1.0 - m)),
            Link::Probit => {
                let normal = Normal::new(0.0, 1.0).unwrap();
                eta.mapv(|e| normal.pdf(e))
            }
            Link::Cloglog => mu.mapv(|m| -(1.0 - m) * (1.0 - m).ln()),
            Link::Inverse => mu.mapv(|m| -(m * m)),
            Link::Sqrt => mu.mapv(|m| 2.0 * m.sqrt()),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Link::Identity => "identity",
            Link::Log => "log",
            Link::Logit => "logit",
            Link::Probit => "probit",
            Link::Cloglog => "cloglog",
            Link::Inverse => "inverse",
            Link::Sqrt => "sqrt",
        }
    }
}

impl FromStr for Link {
    type Err = GlmSelectError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "identity" => Ok(Link::Identity),
            "log" => Ok(Link::Log),
            "logit" => Ok(Link::Logit),
            "probit" => Ok(Link::Probit),
            "cloglog" => Ok(Link::Cloglog),
            "inverse" => Ok(Link::Inverse),
            "sqrt" => Ok(Link::Sqrt),
            other => Err(GlmSelectError::InvalidFamily {
                reason: format!("Unknown link '{}'", other),
            }),
        }
    }
}

impl std::fmt::Display for Link {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
