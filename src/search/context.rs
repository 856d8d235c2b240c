//! Shared state mutated by search workers
//!
//! The kept-models list and the progress meter are the only values the
//! workers write concurrently; each sits behind its own mutex in the
//! driver. Ranking is by (metric, mask) so the outcome of a search never
//! depends on which worker reported first.

use crate::data::GlmData;
use crate::error::Result;
use crate::family::Family;
use crate::glm::{fit, FitControl, FitResult};
use crate::search::metric::SelectionMetric;
use crate::search::model::{CandidateSet, ModelMask};

/// One fitted candidate and its criterion value
#[derive(Debug, Clone)]
pub struct ScoredModel {
    pub mask: ModelMask,
    pub fit: FitResult,
    pub metric: f64,
}

/// Fit one masked subset and score it under the criterion.
///
/// Fits that end in numerical failure score infinite, which keeps them out
/// of every kept list and every greedy move.
pub(crate) fn evaluate_subset(
    data: &GlmData,
    family: &Family,
    candidates: &CandidateSet,
    control: &FitControl,
    metric: SelectionMetric,
    dispersion: bool,
    mask: &ModelMask,
) -> Result<ScoredModel> {
    let sub = candidates.design_for(data, mask);
    let fitted = fit(&sub, family, None, control)?;
    let value = if fitted.status.is_usable() && fitted.log_lik.is_finite() {
        metric.value(fitted.log_lik, sub.n_cols(), sub.n_obs(), dispersion)
    } else {
        f64::INFINITY
    };
    Ok(ScoredModel {
        mask: mask.clone(),
        fit: fitted,
        metric: value,
    })
}

fn ranks_before(a: &ScoredModel, b: &ScoredModel) -> bool {
    a.metric < b.metric || (a.metric == b.metric && a.mask < b.mask)
}

/// Bounded collection of the best models seen so far, ascending by
/// (metric, mask).
///
/// Models with a non-finite metric are never admitted, so a failed fit
/// cannot crowd out a real one. Each mask is offered at most once by the
/// searches, so no deduplication happens here.
#[derive(Debug)]
pub struct BestModels {
    entries: Vec<ScoredModel>,
    capacity: usize,
    cutoff: f64,
}

impl BestModels {
    /// Keep up to `capacity` models, discarding any whose metric ends up
    /// more than `cutoff` above the best.
    pub fn new(capacity: usize, cutoff: f64) -> Self {
        BestModels {
            entries: Vec::new(),
            capacity: capacity.max(1),
            cutoff,
        }
    }

    pub fn best_metric(&self) -> f64 {
        self.entries.first().map_or(f64::INFINITY, |e| e.metric)
    }

    pub fn entries(&self) -> &[ScoredModel] {
        &self.entries
    }

    /// A subtree whose bound exceeds this cannot contribute a kept model.
    ///
    /// Strictly-greater comparison on the caller's side: a bound exactly at
    /// the threshold is still explored, so ties are settled by the mask
    /// ordering rather than by scheduling.
    pub fn prune_threshold(&self) -> f64 {
        let worst_when_full = if self.entries.len() < self.capacity {
            f64::INFINITY
        } else {
            self.entries[self.entries.len() - 1].metric
        };
        worst_when_full.min(self.best_metric() + self.cutoff)
    }

    pub fn offer(&mut self, candidate: ScoredModel) {
        if !candidate.metric.is_finite() {
            return;
        }
        let pos = self
            .entries
            .iter()
            .position(|e| ranks_before(&candidate, e))
            .unwrap_or(self.entries.len());
        self.entries.insert(pos, candidate);
        self.entries.truncate(self.capacity);
    }

    /// Final ranked list with the cutoff applied against the winning metric
    pub fn into_ranked(self) -> Vec<ScoredModel> {
        let limit = self.best_metric() + self.cutoff;
        self.entries
            .into_iter()
            .filter(|e| e.metric <= limit)
            .collect()
    }
}

/// Percent-of-models-checked meter with a self-coarsening print step, so
/// early progress is chatty and later progress is not
pub(crate) struct Progress {
    checked: f64,
    total: f64,
    last_print: f64,
    step: f64,
    enabled: bool,
}

impl Progress {
    pub(crate) fn new(total: f64, enabled: bool) -> Self {
        Progress {
            checked: 0.0,
            total: total.max(1.0),
            last_print: -1e-10,
            step: 1e-10,
            enabled,
        }
    }

    /// Count `models` candidates as checked, fitted or pruned
    pub(crate) fn advance(&mut self, models: f64) {
        self.checked += models;
        if !self.enabled {
            return;
        }
        let percent = 100.0 * self.checked / self.total;
        if percent - self.last_print >= self.step {
            log::info!("Checked {}% of all possible models", percent);
            while self.step <= percent - self.last_print && self.step <= 1.0 {
                self.step *= 10.0;
            }
            self.last_print = percent;
        }
    }

    pub(crate) fn finish(&mut self) {
        if self.enabled {
            let percent = 100.0 * self.checked / self.total;
            log::info!("Checked {}% of all possible models", percent);
            log::info!("Found best model");
        }
    }

    pub(crate) fn checked(&self) -> f64 {
        self.checked
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::glm::{FitResult, FitStatus};

    fn scored(metric: f64, mask_bits: &[bool]) -> ScoredModel {
        let mut mask = ModelMask::empty(mask_bits.len());
        for (i, &on) in mask_bits.iter().enumerate() {
            mask.set(i, on);
        }
        ScoredModel {
            mask,
            fit: FitResult {
                coefficients: vec![0.0],
                standard_errors: None,
                log_lik: 0.0,
                deviance: 0.0,
                status: FitStatus::Converged { iterations: 1 },
            },
            metric,
        }
    }

    #[test]
    fn test_keeps_best_k_sorted() {
        let mut best = BestModels::new(2, f64::INFINITY);
        best.offer(scored(5.0, &[true, false]));
        best.offer(scored(3.0, &[false, true]));
        best.offer(scored(4.0, &[true, true]));

        let metrics: Vec<f64> = best.entries().iter().map(|e| e.metric).collect();
        assert_eq!(metrics, vec![3.0, 4.0]);
    }

    #[test]
    fn test_tie_broken_by_mask() {
        let mut best = BestModels::new(1, f64::INFINITY);
        best.offer(scored(3.0, &[false, true]));
        best.offer(scored(3.0, &[true, false]));
        // [false, true] precedes [true, false] lexicographically
        assert_eq!(best.entries()[0].mask.vars().collect::<Vec<_>>(), vec![1]);

        let mut reversed = BestModels::new(1, f64::INFINITY);
        reversed.offer(scored(3.0, &[true, false]));
        reversed.offer(scored(3.0, &[false, true]));
        assert_eq!(
            reversed.entries()[0].mask.vars().collect::<Vec<_>>(),
            vec![1]
        );
    }

    #[test]
    fn test_non_finite_metric_rejected() {
        let mut best = BestModels::new(2, f64::INFINITY);
        best.offer(scored(f64::INFINITY, &[true]));
        best.offer(scored(f64::NAN, &[true]));
        assert!(best.entries().is_empty());
        assert_eq!(best.prune_threshold(), f64::INFINITY);
    }

    #[test]
    fn test_prune_threshold_tracks_fill_and_cutoff() {
        let mut best = BestModels::new(2, f64::INFINITY);
        assert_eq!(best.prune_threshold(), f64::INFINITY);

        best.offer(scored(10.0, &[true, false]));
        assert_eq!(best.prune_threshold(), f64::INFINITY);

        best.offer(scored(12.0, &[false, true]));
        assert_eq!(best.prune_threshold(), 12.0);

        let mut tight = BestModels::new(5, 1.5);
        tight.offer(scored(10.0, &[true, false]));
        assert_eq!(tight.prune_threshold(), 11.5);
    }

    #[test]
    fn test_ranked_output_applies_cutoff() {
        let mut best = BestModels::new(5, 1.0);
        best.offer(scored(10.0, &[true, false, false]));
        best.offer(scored(10.8, &[false, true, false]));
        best.offer(scored(12.0, &[false, false, true]));

        let ranked = best.into_ranked();
        let metrics: Vec<f64> = ranked.iter().map(|e| e.metric).collect();
        assert_eq!(metrics, vec![10.0, 10.8]);
    }

    #[test]
    fn test_progress_counts_without_printing() {
        let mut progress = Progress::new(100.0, false);
        progress.advance(1.0);
        progress.advance(24.0);
        assert_eq!(progress.checked(), 25.0);
        progress.finish();
    }
}
