//! Selection criteria and their analytic lower bounds

use serde::Serialize;

use crate::error::{GlmSelectError, Result};

/// Information criterion minimized by the search
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SelectionMetric {
    Aic,
    Aicc,
    Bic,
}

impl SelectionMetric {
    pub fn name(&self) -> &'static str {
        match self {
            SelectionMetric::Aic => "AIC",
            SelectionMetric::Aicc => "AICc",
            SelectionMetric::Bic => "BIC",
        }
    }

    /// Criterion value for a fitted model.
    ///
    /// `n_cols` is the number of fitted coefficients; `dispersion` adds one
    /// parameter for families with a free scale.
    pub fn value(&self, log_lik: f64, n_cols: usize, n_obs: usize, dispersion: bool) -> f64 {
        let k = (n_cols + dispersion as usize) as f64;
        let n = n_obs as f64;
        match self {
            SelectionMetric::Aic => -2.0 * log_lik + 2.0 * k,
            SelectionMetric::Aicc => {
                -2.0 * log_lik + 2.0 * k + (2.0 * k + 2.0 * k * k) / (n - k - 1.0)
            }
            SelectionMetric::Bic => -2.0 * log_lik + n.ln() * k,
        }
    }

    /// Lower bound on the criterion over every model in a subtree: the
    /// subtree's upper-model log-likelihood evaluated at its smallest
    /// reachable column count.
    pub fn bound(
        &self,
        upper_log_lik: f64,
        min_cols: usize,
        n_obs: usize,
        dispersion: bool,
    ) -> f64 {
        self.value(upper_log_lik, min_cols, n_obs, dispersion)
    }

    /// Shift a bound for a child node whose minimum size grew by
    /// `added_cols` columns to `min_cols` total.
    ///
    /// Valid whenever the child shares the parent's upper model; it is also
    /// used as a cheap pre-check before refitting a tighter upper model.
    /// The small-sample correction is evaluated at the raw column counts,
    /// which for dispersion families understates the shift slightly and
    /// keeps the bound conservative.
    pub fn shift_bound(&self, bound: f64, added_cols: usize, min_cols: usize, n_obs: usize) -> f64 {
        let c = added_cols as f64;
        let n = n_obs as f64;
        match self {
            SelectionMetric::Aic => bound + 2.0 * c,
            SelectionMetric::Aicc => {
                let new_k = min_cols as f64;
                let old_k = new_k - c;
                bound + 2.0 * c - (2.0 * old_k + 2.0 * old_k * old_k) / (n - old_k - 1.0)
                    + (2.0 * new_k + 2.0 * new_k * new_k) / (n - new_k - 1.0)
            }
            SelectionMetric::Bic => bound + n.ln() * c,
        }
    }
}

impl std::str::FromStr for SelectionMetric {
    type Err = GlmSelectError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "aic" => Ok(SelectionMetric::Aic),
            "aicc" => Ok(SelectionMetric::Aicc),
            "bic" => Ok(SelectionMetric::Bic),
            other => Err(GlmSelectError::InvalidInput {
                reason: format!("unknown metric '{}', expected AIC, AICc, or BIC", other),
            }),
        }
    }
}

impl std::fmt::Display for SelectionMetric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}
