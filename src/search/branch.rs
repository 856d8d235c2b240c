//! Parallel branch and bound over variable subsets
//!
//! Nodes are (mask, remaining-tail) pairs: a node owns the model given by
//! its mask, and its subtree holds every model reachable by adding tail
//! variables. Each subset is fitted exactly once, as the lower model of
//! the node that introduces it. Bounds come from the subtree's upper
//! model: the first child shares the parent's upper model and shifts the
//! parent bound, later children check the shifted bound cheaply before
//! refitting their own upper model for a tighter one.
//!
//! Workers race only on the kept-models list and the progress meter, both
//! behind mutexes. Admission is ordered by (metric, mask), so the final
//! list does not depend on scheduling.

use std::sync::{Mutex, MutexGuard};

use rayon::prelude::*;

use crate::data::GlmData;
use crate::error::{GlmSelectError, Result};
use crate::family::Family;
use crate::glm::{fit, FitControl};
use crate::search::context::{evaluate_subset, BestModels, Progress, ScoredModel};
use crate::search::metric::SelectionMetric;
use crate::search::model::{count_models, CandidateSet, ModelMask};

/// Knobs for the exhaustive search
#[derive(Debug, Clone)]
pub struct SearchOptions {
    pub metric: SelectionMetric,
    /// How many models to keep
    pub num_best: usize,
    /// Discard models more than this above the best metric found
    pub cutoff: f64,
    /// Cap on included free variables per model, beyond the mandatory set
    pub max_free: Option<usize>,
    /// Emit progress lines through the logger
    pub progress: bool,
}

impl Default for SearchOptions {
    fn default() -> Self {
        SearchOptions {
            metric: SelectionMetric::Aic,
            num_best: 1,
            cutoff: f64::INFINITY,
            max_free: None,
            progress: false,
        }
    }
}

/// Ranked outcome of a subset search
#[derive(Debug)]
pub struct SelectionResult {
    /// Kept models, ascending by (metric, mask)
    pub models: Vec<ScoredModel>,
    /// Candidates accounted for, fitted or pruned
    pub models_checked: f64,
}

impl SelectionResult {
    pub fn best(&self) -> Option<&ScoredModel> {
        self.models.first()
    }
}

/// A worker panic unwinds through rayon and poisons these locks on the way
/// out; recovering the guard here keeps the unwind path quiet.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

struct SearchShared<'a> {
    data: &'a GlmData,
    family: &'a Family,
    candidates: &'a CandidateSet,
    control: &'a FitControl,
    metric: SelectionMetric,
    dispersion: bool,
    max_free: usize,
    best: Mutex<BestModels>,
    progress: Mutex<Progress>,
}

impl SearchShared<'_> {
    fn evaluate(&self, mask: &ModelMask) -> Result<ScoredModel> {
        evaluate_subset(
            self.data,
            self.family,
            self.candidates,
            self.control,
            self.metric,
            self.dispersion,
            mask,
        )
    }

    /// Log-likelihood of a subtree's upper model, None when that fit is
    /// unusable (which disables pruning below it)
    fn upper_log_lik(&self, upper: &ModelMask) -> Result<Option<f64>> {
        let sub = self.candidates.design_for(self.data, upper);
        let fitted = fit(&sub, self.family, None, self.control)?;
        Ok((fitted.status.is_usable() && fitted.log_lik.is_finite()).then_some(fitted.log_lik))
    }

    fn threshold(&self) -> f64 {
        lock(&self.best).prune_threshold()
    }
}

/// Expand the children of one node in parallel.
///
/// `bound` is a valid lower bound for every model in the node's subtree;
/// `used_free` counts the free variables already in `mask` and is strictly
/// below the budget when this is called.
fn descend(
    shared: &SearchShared<'_>,
    mask: &ModelMask,
    tail: &[usize],
    bound: f64,
    used_free: usize,
) -> Result<()> {
    let n_obs = shared.data.n_obs();
    tail.par_iter().enumerate().try_for_each(|(i, &var)| {
        let child_mask = mask.with(var);
        let child_cols = shared.candidates.cols_in(&child_mask);
        let added = shared.candidates.var_cols(var).len();
        let naive = shared.metric.shift_bound(bound, added, child_cols, n_obs);

        let rest = &tail[i + 1..];
        let budget = shared.max_free - used_free - 1;
        let subtree = count_models(rest.len(), budget);

        if naive > shared.threshold() {
            lock(&shared.progress).advance(subtree);
            return Ok(());
        }

        if shared.candidates.admissible(&child_mask) {
            let scored = shared.evaluate(&child_mask)?;
            lock(&shared.best).offer(scored);
        }
        lock(&shared.progress).advance(1.0);

        if rest.is_empty() || budget == 0 {
            return Ok(());
        }

        let child_bound = if i == 0 {
            naive
        } else {
            let mut upper = child_mask.clone();
            for &v in rest {
                upper.set(v, true);
            }
            match shared.upper_log_lik(&upper)? {
                Some(ll) => shared.metric.bound(ll, child_cols, n_obs, shared.dispersion),
                None => f64::NEG_INFINITY,
            }
        };

        if child_bound > shared.threshold() {
            lock(&shared.progress).advance(subtree - 1.0);
            return Ok(());
        }
        descend(shared, &child_mask, rest, child_bound, used_free + 1)
    })
}

/// Exhaustively search the subset lattice for the models minimizing the
/// selection criterion.
///
/// The mandatory variables are present in every candidate; hierarchy
/// violations are skipped without cutting the branch, since adding a
/// missing companion deeper down can repair them. Thread count follows
/// the ambient rayon pool.
pub fn select_best_subset(
    data: &GlmData,
    family: &Family,
    candidates: &CandidateSet,
    control: &FitControl,
    options: &SearchOptions,
) -> Result<SelectionResult> {
    if candidates.n_cols() != data.n_cols() {
        return Err(GlmSelectError::DimensionMismatch {
            expected: format!("{} candidate columns", data.n_cols()),
            got: format!("{}", candidates.n_cols()),
        });
    }
    if options.num_best == 0 {
        return Err(GlmSelectError::InvalidInput {
            reason: "num_best must be at least 1".to_string(),
        });
    }
    if !(options.cutoff >= 0.0) {
        return Err(GlmSelectError::InvalidInput {
            reason: "cutoff must be nonnegative".to_string(),
        });
    }

    let free = candidates.free_vars();
    let max_free = options.max_free.unwrap_or(free.len()).min(free.len());
    let total = count_models(free.len(), max_free);
    let dispersion = family.has_dispersion();

    let shared = SearchShared {
        data,
        family,
        candidates,
        control,
        metric: options.metric,
        dispersion,
        max_free,
        best: Mutex::new(BestModels::new(options.num_best, options.cutoff)),
        progress: Mutex::new(Progress::new(total, options.progress)),
    };

    let root = candidates.mandatory_mask();
    if candidates.admissible(&root) {
        let scored = shared.evaluate(&root)?;
        lock(&shared.best).offer(scored);
    }
    lock(&shared.progress).advance(1.0);

    if !free.is_empty() && max_free > 0 {
        let root_cols = candidates.cols_in(&root);
        let root_bound = match shared.upper_log_lik(&candidates.full_mask())? {
            Some(ll) => options.metric.bound(ll, root_cols, data.n_obs(), dispersion),
            None => f64::NEG_INFINITY,
        };
        if root_bound > shared.threshold() {
            lock(&shared.progress).advance(total - 1.0);
        } else {
            descend(&shared, &root, &free, root_bound, 0)?;
        }
    }

    let mut progress = shared
        .progress
        .into_inner()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    progress.finish();
    let best = shared
        .best
        .into_inner()
        .unwrap_or_else(|poisoned| poisoned.into_inner());

    Ok(SelectionResult {
        models: best.into_ranked(),
        models_checked: progress.checked(),
    })
}
