//! Profile-metric confidence bounds
//!
//! For a chosen coefficient the profile fixes its value, folds the fixed
//! term into the offset, refits every other coefficient, and reads off the
//! information criterion at the full model's parameter count. The interval
//! endpoints are the two values where that profile crosses a caller goal,
//! typically the fitted metric plus a chi-square quantile. Endpoints are
//! located by doubling outward from the estimate in standard-error units
//! until the goal is crossed, then bisecting back.

use ndarray::{Array1, Array2};
use rayon::prelude::*;
use serde::Serialize;

use crate::data::GlmData;
use crate::error::{GlmSelectError, Result};
use crate::family::Family;
use crate::glm::{fit, FitControl, FitResult};
use crate::search::SelectionMetric;

/// Tuning for the interval search
#[derive(Debug, Clone)]
pub struct IntervalControl {
    /// Refit settings for each profiled model
    pub fit: FitControl,
    pub metric: SelectionMetric,
    /// Doubling steps allowed while hunting for a bracket
    pub expansions: u32,
    /// Bisection stops once the bracket narrows to this many standard errors
    pub tol: f64,
}

impl Default for IntervalControl {
    fn default() -> Self {
        IntervalControl {
            fit: FitControl::default(),
            metric: SelectionMetric::Aic,
            expansions: 10,
            tol: 1e-8,
        }
    }
}

/// Interval for one coefficient
///
/// A side is NaN when the profile never reaches the goal within the
/// expansion budget; a flat likelihood direction shows up this way.
#[derive(Debug, Clone, Serialize)]
pub struct MetricBound {
    pub column: usize,
    pub estimate: f64,
    pub lower: f64,
    pub upper: f64,
}

struct Profiler<'a> {
    data: &'a GlmData,
    family: &'a Family,
    refit: FitControl,
    metric: SelectionMetric,
    dispersion: bool,
    mle: &'a [f64],
}

impl Profiler<'_> {
    /// Criterion value with column `j` pinned at `value` and the rest
    /// refitted, counted at the full model's size
    fn profile(&self, j: usize, value: f64) -> Result<f64> {
        let n = self.data.n_obs();
        let p = self.data.n_cols();
        let mut offset = self.data.offset().to_owned();
        offset.scaled_add(value, &self.data.x().column(j));

        let log_lik = if p == 1 {
            // nothing left to refit; the pinned term is the whole predictor
            let mu = self.family.mean(offset.view());
            Some(-self.family.neg_log_likelihood(self.data.y(), mu.view()))
        } else {
            let cols: Vec<usize> = (0..p).filter(|&c| c != j).collect();
            let mut x = Array2::zeros((n, cols.len()));
            for (k, &c) in cols.iter().enumerate() {
                x.column_mut(k).assign(&self.data.x().column(c));
            }
            let init: Array1<f64> = cols.iter().map(|&c| self.mle[c]).collect();
            let sub = GlmData::with_offset(x, self.data.y().to_owned(), offset)?;
            let refitted = fit(&sub, self.family, Some(&init), &self.refit)?;
            (refitted.status.is_usable() && refitted.log_lik.is_finite())
                .then_some(refitted.log_lik)
        };

        Ok(match log_lik {
            Some(ll) if ll.is_finite() => self.metric.value(ll, p, n, self.dispersion),
            _ => f64::INFINITY,
        })
    }

    /// One endpoint: walk outward along `sign` until the profile crosses
    /// `goal`, then bisect the crossing down to `tol` standard errors
    fn bound(
        &self,
        j: usize,
        estimate: f64,
        se: f64,
        goal: f64,
        sign: f64,
        expansions: u32,
        tol: f64,
    ) -> Result<f64> {
        let mut inner = estimate;
        let mut outer = f64::NAN;
        let mut step = se;
        for _ in 0..expansions {
            let candidate = estimate + sign * step;
            if self.profile(j, candidate)? >= goal {
                outer = candidate;
                break;
            }
            inner = candidate;
            step *= 2.0;
        }
        if !outer.is_finite() {
            return Ok(f64::NAN);
        }

        let width = tol * se;
        for _ in 0..200 {
            if (outer - inner).abs() <= width {
                break;
            }
            let mid = 0.5 * (inner + outer);
            if self.profile(j, mid)? >= goal {
                outer = mid;
            } else {
                inner = mid;
            }
        }
        Ok(0.5 * (inner + outer))
    }
}

/// Profile-likelihood-style interval for each requested coefficient.
///
/// `fitted` must be the model fitted on `data` whose coefficients are being
/// profiled; its standard errors scale the bracket hunt and its
/// coefficients warm-start every refit. `goal` is the criterion value the
/// interval endpoints sit on.
pub fn metric_interval(
    data: &GlmData,
    family: &Family,
    fitted: &FitResult,
    columns: &[usize],
    goal: f64,
    control: &IntervalControl,
) -> Result<Vec<MetricBound>> {
    let p = data.n_cols();
    if fitted.coefficients.len() != p {
        return Err(GlmSelectError::DimensionMismatch {
            expected: format!("{} fitted coefficients", p),
            got: format!("{}", fitted.coefficients.len()),
        });
    }
    let se = fitted.standard_errors.as_ref().ok_or_else(|| {
        GlmSelectError::InvalidInput {
            reason: "no standard errors; the information matrix was singular at the fit"
                .to_string(),
        }
    })?;
    if let Some(&bad) = columns.iter().find(|&&j| j >= p) {
        return Err(GlmSelectError::InvalidInput {
            reason: format!("column {} out of range for {} columns", bad, p),
        });
    }
    if !goal.is_finite() {
        return Err(GlmSelectError::InvalidInput {
            reason: "interval goal must be finite".to_string(),
        });
    }

    let mut refit = control.fit.clone();
    refit.warm_start = false;
    let profiler = Profiler {
        data,
        family,
        refit,
        metric: control.metric,
        dispersion: family.has_dispersion(),
        mle: &fitted.coefficients,
    };

    columns
        .par_iter()
        .map(|&j| {
            let estimate = fitted.coefficients[j];
            let scale = if se[j].is_finite() && se[j] > 0.0 {
                se[j]
            } else {
                1.0
            };
            let lower = profiler.bound(j, estimate, scale, goal, -1.0, control.expansions, control.tol)?;
            let upper = profiler.bound(j, estimate, scale, goal, 1.0, control.expansions, control.tol)?;
            Ok(MetricBound {
                column: j,
                estimate,
                lower,
                upper,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::family::{Distribution, Link};
    use ndarray::{Array1, Array2};

    fn gaussian_data() -> (GlmData, Family) {
        let n = 30;
        let mut x = Array2::ones((n, 2));
        let mut y = Array1::zeros(n);
        for i in 0..n {
            let t = i as f64 / 10.0 - 1.5;
            x[[i, 1]] = t;
            y[i] = 1.0 + 2.0 * t + 0.1 * ((i * 7) % 5) as f64 - 0.2;
        }
        let data = GlmData::new(x, y).unwrap();
        let family = Family::new(Distribution::Gaussian, Link::Identity).unwrap();
        (data, family)
    }

    fn profile_by_hand(
        data: &GlmData,
        family: &Family,
        j: usize,
        value: f64,
        metric: SelectionMetric,
    ) -> f64 {
        let zeros = vec![0.0; data.n_cols()];
        let refit = FitControl {
            warm_start: false,
            ..FitControl::default()
        };
        let profiler = Profiler {
            data,
            family,
            refit,
            metric,
            dispersion: family.has_dispersion(),
            mle: &zeros,
        };
        profiler.profile(j, value).unwrap()
    }

    #[test]
    fn test_endpoints_sit_on_goal() {
        let (data, family) = gaussian_data();
        let fitted = fit(&data, &family, None, &FitControl::default()).unwrap();
        let metric = SelectionMetric::Aic;
        let base = metric.value(fitted.log_lik, data.n_cols(), data.n_obs(), true);
        let goal = base + 4.0;

        let bounds =
            metric_interval(&data, &family, &fitted, &[0, 1], goal, &IntervalControl::default())
                .unwrap();
        assert_eq!(bounds.len(), 2);

        for b in &bounds {
            assert!(b.lower < b.estimate);
            assert!(b.estimate < b.upper);
            for v in [b.lower, b.upper] {
                let at = profile_by_hand(&data, &family, b.column, v, metric);
                assert!((at - goal).abs() < 1e-4, "profile {} vs goal {}", at, goal);
            }
        }
    }

    #[test]
    fn test_gaussian_interval_nearly_symmetric() {
        let (data, family) = gaussian_data();
        let fitted = fit(&data, &family, None, &FitControl::default()).unwrap();
        let metric = SelectionMetric::Aic;
        let base = metric.value(fitted.log_lik, data.n_cols(), data.n_obs(), true);

        let bounds = metric_interval(
            &data,
            &family,
            &fitted,
            &[1],
            base + 4.0,
            &IntervalControl::default(),
        )
        .unwrap();
        let b = &bounds[0];
        // quadratic profile for the identity-link gaussian
        let down = b.estimate - b.lower;
        let up = b.upper - b.estimate;
        assert!((down - up).abs() < 1e-4 * down.max(up));
    }

    #[test]
    fn test_unreachable_goal_gives_nan() {
        let (data, family) = gaussian_data();
        let fitted = fit(&data, &family, None, &FitControl::default()).unwrap();
        let metric = SelectionMetric::Aic;
        let base = metric.value(fitted.log_lik, data.n_cols(), data.n_obs(), true);

        let control = IntervalControl {
            expansions: 1,
            ..IntervalControl::default()
        };
        let bounds =
            metric_interval(&data, &family, &fitted, &[1], base + 1e9, &control).unwrap();
        assert!(bounds[0].lower.is_nan());
        assert!(bounds[0].upper.is_nan());
    }

    #[test]
    fn test_logistic_interval_contains_truth() {
        let n = 60;
        let mut x = Array2::ones((n, 2));
        let mut y = Array1::zeros(n);
        for i in 0..n {
            let t = (i as f64 / 10.0) - 3.0;
            x[[i, 1]] = t;
            let p = 1.0 / (1.0 + (-(0.4 * t)).exp());
            y[i] = if ((i * 11) % 17) as f64 / 17.0 < p { 1.0 } else { 0.0 };
        }
        let data = GlmData::new(x, y).unwrap();
        let family = Family::new(Distribution::Binomial, Link::Logit).unwrap();
        let fitted = fit(&data, &family, None, &FitControl::default()).unwrap();
        let metric = SelectionMetric::Aic;
        let base = metric.value(fitted.log_lik, data.n_cols(), data.n_obs(), false);

        let control = IntervalControl {
            metric: SelectionMetric::Aic,
            ..IntervalControl::default()
        };
        let bounds = metric_interval(&data, &family, &fitted, &[1], base + 4.0, &control).unwrap();
        let b = &bounds[0];
        assert!(b.lower.is_finite() && b.upper.is_finite());
        assert!(b.lower < b.estimate && b.estimate < b.upper);
    }

    #[test]
    fn test_structural_checks() {
        let (data, family) = gaussian_data();
        let fitted = fit(&data, &family, None, &FitControl::default()).unwrap();
        let base_goal = 100.0;

        assert!(matches!(
            metric_interval(&data, &family, &fitted, &[7], base_goal, &IntervalControl::default()),
            Err(GlmSelectError::InvalidInput { .. })
        ));
        assert!(matches!(
            metric_interval(
                &data,
                &family,
                &fitted,
                &[0],
                f64::NAN,
                &IntervalControl::default()
            ),
            Err(GlmSelectError::InvalidInput { .. })
        ));

        let mut broken = fitted.clone();
        broken.standard_errors = None;
        assert!(metric_interval(&data, &family, &broken, &[0], base_goal, &IntervalControl::default()).is_err());
    }
}
