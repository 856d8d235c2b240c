//! Interchangeable optimizers for GLM coefficient estimation
//!
//! All three minimize the negative log-likelihood kernel over the model
//! columns. They share one iteration contract: evaluate a search direction,
//! delegate acceptance to the line search, then either keep going, stop on
//! stalled progress, or report a numerical failure. The iteration state is
//! owned by a single [`IterState`] that the line search replaces wholesale
//! on acceptance, so a failed step can never leave half-updated quantities
//! behind.

use ndarray::{Array1, Array2, Axis};
use serde::Serialize;

use super::init::warm_start;
use super::line_search::line_search;
use super::linalg::{inverse_sympd, solve_sympd};
use super::score::{fisher_information, score};
use crate::data::GlmData;
use crate::error::{GlmSelectError, Result};
use crate::family::Family;

/// Optimization algorithm selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FitMethod {
    /// Newton steps against the expected information, rebuilt every
    /// iteration
    Fisher,
    /// Dense quasi-Newton with a rank-two inverse-curvature update
    Bfgs,
    /// Limited-memory quasi-Newton over a bounded history of update pairs
    Lbfgs,
}

impl FitMethod {
    pub fn name(&self) -> &'static str {
        match self {
            FitMethod::Fisher => "fisher",
            FitMethod::Bfgs => "bfgs",
            FitMethod::Lbfgs => "lbfgs",
        }
    }
}

impl std::str::FromStr for FitMethod {
    type Err = GlmSelectError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "fisher" => Ok(FitMethod::Fisher),
            "bfgs" => Ok(FitMethod::Bfgs),
            "lbfgs" => Ok(FitMethod::Lbfgs),
            other => Err(GlmSelectError::InvalidInput {
                reason: format!("unknown fit method '{}', expected fisher, bfgs, or lbfgs", other),
            }),
        }
    }
}

impl std::fmt::Display for FitMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Outcome of one optimizer run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FitStatus {
    /// Gradient tolerance met, or progress stalled at a finite iterate
    Converged { iterations: usize },
    /// Iteration budget exhausted; coefficients hold the last iterate
    MaxIterations,
    /// The curvature matrix could not be factored
    SingularCurvature,
    /// Non-finite objective, NaN coefficients, or a failed line search
    NumericalFailure,
}

impl FitStatus {
    /// Compact status code: the iteration count on success, -1 for an
    /// exhausted budget, -2 for any numerical failure
    pub fn code(&self) -> i64 {
        match self {
            FitStatus::Converged { iterations } => *iterations as i64,
            FitStatus::MaxIterations => -1,
            FitStatus::SingularCurvature | FitStatus::NumericalFailure => -2,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, FitStatus::Converged { .. })
    }

    /// Whether the fitted likelihood is meaningful for model comparison.
    /// An exhausted budget still yields a usable (if loose) fit; numerical
    /// failures do not.
    pub fn is_usable(&self) -> bool {
        matches!(self, FitStatus::Converged { .. } | FitStatus::MaxIterations)
    }
}

/// Tuning knobs for a single fit
#[derive(Debug, Clone)]
pub struct FitControl {
    pub method: FitMethod,
    /// Convergence tolerance on the gradient norm and on progress tests
    pub tol: f64,
    /// Iteration budget
    pub maxit: usize,
    /// Update pairs retained by L-BFGS
    pub history: usize,
    /// Seed coefficients by least squares on the link-transformed response
    pub warm_start: bool,
}

impl FitControl {
    /// Defaults matched to the optimizer: Fisher scoring needs few steps,
    /// the gradient methods get a larger budget
    pub fn for_method(method: FitMethod) -> Self {
        let maxit = match method {
            FitMethod::Fisher => 50,
            FitMethod::Bfgs | FitMethod::Lbfgs => 200,
        };
        FitControl {
            method,
            tol: 1e-6,
            maxit,
            history: 10,
            warm_start: true,
        }
    }
}

impl Default for FitControl {
    fn default() -> Self {
        FitControl::for_method(FitMethod::Fisher)
    }
}

/// One fitted model
#[derive(Debug, Clone, Serialize)]
pub struct FitResult {
    pub coefficients: Vec<f64>,
    /// Square roots of the inverse-information diagonal; None when the
    /// information matrix is singular at the final iterate
    pub standard_errors: Option<Vec<f64>>,
    pub log_lik: f64,
    pub deviance: f64,
    pub status: FitStatus,
}

impl FitResult {
    pub fn converged(&self) -> bool {
        self.status.is_success()
    }
}

/// Everything derived from the current coefficients, kept consistent as a
/// unit: the line search builds a fresh one at the trial point and swaps it
/// in only on acceptance.
#[derive(Debug, Clone)]
pub(super) struct IterState {
    pub beta: Array1<f64>,
    pub mu: Array1<f64>,
    pub deriv: Array1<f64>,
    pub var: Array1<f64>,
    pub score: Array1<f64>,
    pub value: f64,
}

impl IterState {
    /// Full evaluation at `beta`
    pub(super) fn at(data: &GlmData, family: &Family, beta: Array1<f64>) -> Self {
        let eta = data.x().dot(&beta) + &data.offset();
        let mu = family.mean(eta.view());
        let deriv = family.mean_derivative(mu.view(), eta.view());
        let var = family.variance(mu.view());
        let score = score(data.x(), data.y(), mu.view(), deriv.view(), var.view());
        let value = family.neg_log_likelihood(data.y(), mu.view());
        IterState {
            beta,
            mu,
            deriv,
            var,
            score,
            value,
        }
    }

    fn grad_norm(&self) -> f64 {
        self.score.dot(&self.score).sqrt()
    }
}

/// Post-line-search progress test shared by the optimizers.
///
/// Returns None while the iteration is making progress. A stalled iteration
/// ends the fit: as a success when the iterate is finite, as a numerical
/// failure when the objective blew up, the coefficients went NaN, or the
/// line search found no acceptable step.
fn check_progress(
    state: &IterState,
    direction: &Array1<f64>,
    alpha: f64,
    f0: f64,
    tol: f64,
    completed: usize,
) -> Option<FitStatus> {
    let f1 = state.value;
    let stalled = (f1 - f0).abs() < tol
        || direction.iter().all(|&d| (alpha * d).abs() < tol)
        || alpha == 0.0;
    if !stalled {
        return None;
    }
    if !f1.is_finite() || state.beta.iter().any(|b| b.is_nan()) || alpha == 0.0 {
        Some(FitStatus::NumericalFailure)
    } else {
        Some(FitStatus::Converged {
            iterations: completed + 1,
        })
    }
}

fn outer(a: &Array1<f64>, b: &Array1<f64>) -> Array2<f64> {
    let a2 = a.view().insert_axis(Axis(1));
    let b2 = b.view().insert_axis(Axis(0));
    a2.dot(&b2)
}

/// Newton iteration against the expected information
fn fisher_scoring(
    data: &GlmData,
    family: &Family,
    state: &mut IterState,
    initial_info: Option<&Array2<f64>>,
    tol: f64,
    maxit: usize,
) -> FitStatus {
    let mut info = match initial_info {
        Some(m) => m.clone(),
        None => fisher_information(data.x(), state.deriv.view(), state.var.view()),
    };

    let mut k = 0;
    while state.grad_norm() > tol {
        if k >= maxit {
            return FitStatus::MaxIterations;
        }

        let direction = match solve_sympd(info.view(), state.score.view()) {
            Some(q) => -q,
            None => return FitStatus::SingularCurvature,
        };
        let slope = -state.score.dot(&direction);
        let f0 = state.value;

        let alpha = line_search(data, family, state, &direction, slope);
        if let Some(status) = check_progress(state, &direction, alpha, f0, tol, k) {
            return status;
        }

        info = fisher_information(data.x(), state.deriv.view(), state.var.view());
        k += 1;
    }

    FitStatus::Converged { iterations: k }
}

/// Dense BFGS on the inverse curvature
fn bfgs(
    data: &GlmData,
    family: &Family,
    state: &mut IterState,
    initial_info: Option<&Array2<f64>>,
    tol: f64,
    maxit: usize,
) -> FitStatus {
    let p_len = state.beta.len();
    let seed = match initial_info {
        Some(m) => inverse_sympd(m.view()),
        None => {
            let info = fisher_information(data.x(), state.deriv.view(), state.var.view());
            inverse_sympd(info.view())
        }
    };
    let mut h_inv = match seed {
        Some(h) => h,
        None => return FitStatus::SingularCurvature,
    };

    let mut k = 0;
    while state.grad_norm() > tol {
        if k >= maxit {
            return FitStatus::MaxIterations;
        }

        let g0 = state.score.clone();
        let f0 = state.value;
        let direction = -h_inv.dot(&state.score);
        let slope = -state.score.dot(&direction);

        let alpha = line_search(data, family, state, &direction, slope);
        if let Some(status) = check_progress(state, &direction, alpha, f0, tol, k) {
            return status;
        }

        let s = &direction * alpha;
        let y = &state.score - &g0;
        let rho = 1.0 / s.dot(&y);
        let a = Array2::eye(p_len) - &(outer(&s, &y) * rho);
        h_inv = a.dot(&h_inv).dot(&a.t()) + &(outer(&s, &s) * rho);
        k += 1;
    }

    FitStatus::Converged { iterations: k }
}

/// Fixed-capacity ring of (s, y) update pairs with explicit valid count
struct UpdateHistory {
    s: Vec<Array1<f64>>,
    y: Vec<Array1<f64>>,
    head: usize,
    len: usize,
}

impl UpdateHistory {
    fn new(capacity: usize, p_len: usize) -> Self {
        UpdateHistory {
            s: vec![Array1::zeros(p_len); capacity],
            y: vec![Array1::zeros(p_len); capacity],
            head: 0,
            len: 0,
        }
    }

    fn push(&mut self, s: Array1<f64>, y: Array1<f64>) {
        let cap = self.s.len();
        self.s[self.head] = s;
        self.y[self.head] = y;
        self.head = (self.head + 1) % cap;
        self.len = (self.len + 1).min(cap);
    }

    /// Two-loop recursion producing `H g` with the stored pairs applied
    /// around the fixed seed `h0`. First pass walks newest to oldest, the
    /// second replays oldest to newest.
    fn two_loop(&self, g: &Array1<f64>, h0: &Array2<f64>) -> Array1<f64> {
        let cap = self.s.len();
        let head = self.head;
        let slot = |i: usize| (head + cap - 1 - i) % cap;

        let mut q = g.clone();
        let mut alphas = vec![0.0; self.len];
        for i in 0..self.len {
            let j = slot(i);
            let a = self.s[j].dot(&q) / self.y[j].dot(&self.s[j]);
            alphas[i] = a;
            q.scaled_add(-a, &self.y[j]);
        }

        let mut r = h0.dot(&q);
        for i in (0..self.len).rev() {
            let j = slot(i);
            let b = self.y[j].dot(&r) / self.y[j].dot(&self.s[j]);
            r.scaled_add(alphas[i] - b, &self.s[j]);
        }
        r
    }
}

/// Limited-memory BFGS seeded by the inverse of the initial information
fn lbfgs(
    data: &GlmData,
    family: &Family,
    state: &mut IterState,
    initial_info: Option<&Array2<f64>>,
    tol: f64,
    maxit: usize,
    history: usize,
) -> FitStatus {
    let p_len = state.beta.len();
    let seed = match initial_info {
        Some(m) => inverse_sympd(m.view()),
        None => {
            let info = fisher_information(data.x(), state.deriv.view(), state.var.view());
            inverse_sympd(info.view())
        }
    };
    let h0 = match seed {
        Some(h) => h,
        None => return FitStatus::SingularCurvature,
    };

    let capacity = history.min(p_len).max(1);
    let mut pairs = UpdateHistory::new(capacity, p_len);

    let mut k = 0;
    while state.grad_norm() > tol {
        if k >= maxit {
            return FitStatus::MaxIterations;
        }

        let g0 = state.score.clone();
        let f0 = state.value;
        let direction = -pairs.two_loop(&state.score, &h0);
        let slope = -state.score.dot(&direction);

        let alpha = line_search(data, family, state, &direction, slope);
        if let Some(status) = check_progress(state, &direction, alpha, f0, tol, k) {
            return status;
        }

        pairs.push(&direction * alpha, &state.score - &g0);
        k += 1;
    }

    FitStatus::Converged { iterations: k }
}

/// Fit one GLM on the given design.
///
/// Numerical trouble is reported through the result's status, not as an
/// error; `Err` is reserved for structural misuse such as an `init` vector
/// of the wrong length.
pub fn fit(
    data: &GlmData,
    family: &Family,
    init: Option<&Array1<f64>>,
    control: &FitControl,
) -> Result<FitResult> {
    let p_len = data.n_cols();
    let mut beta = match init {
        Some(b) if b.len() != p_len => {
            return Err(GlmSelectError::DimensionMismatch {
                expected: format!("{} initial coefficients", p_len),
                got: format!("{}", b.len()),
            })
        }
        Some(b) => b.clone(),
        None => Array1::zeros(p_len),
    };

    let xtx = data.x().t().dot(&data.x());
    let mut use_xtx = true;
    if control.warm_start && warm_start(data, family, xtx.view(), &mut beta) {
        use_xtx = false;
    }

    let mut state = IterState::at(data, family, beta);
    let initial_info = if use_xtx { Some(&xtx) } else { None };

    let status = match control.method {
        FitMethod::Fisher => fisher_scoring(
            data,
            family,
            &mut state,
            initial_info,
            control.tol,
            control.maxit,
        ),
        FitMethod::Bfgs => bfgs(
            data,
            family,
            &mut state,
            initial_info,
            control.tol,
            control.maxit,
        ),
        FitMethod::Lbfgs => lbfgs(
            data,
            family,
            &mut state,
            initial_info,
            control.tol,
            control.maxit,
            control.history,
        ),
    };

    let log_lik = -state.value;
    let deviance = 2.0 * (family.saturated_log_likelihood(data.y()) - log_lik);
    let final_info = fisher_information(data.x(), state.deriv.view(), state.var.view());
    let standard_errors = inverse_sympd(final_info.view())
        .map(|inv| (0..p_len).map(|j| inv[[j, j]].sqrt()).collect());

    Ok(FitResult {
        coefficients: state.beta.to_vec(),
        standard_errors,
        log_lik,
        deviance,
        status,
    })
}
