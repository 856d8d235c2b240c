//! Greedy stepwise selection
//!
//! Instead of exploring the whole lattice, a stepwise walk fits every
//! single-variable move from the current model, takes the best one while
//! it strictly improves the criterion, and stops otherwise. Neighbor fits
//! run in parallel; ties are settled by the mask ordering so the walk is
//! reproducible.

use rayon::prelude::*;

use crate::data::GlmData;
use crate::error::{GlmSelectError, Result};
use crate::family::Family;
use crate::glm::FitControl;
use crate::search::context::{evaluate_subset, ScoredModel};
use crate::search::metric::SelectionMetric;
use crate::search::model::{CandidateSet, ModelMask};

/// Direction of the greedy walk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepDirection {
    /// Start from the mandatory set, only add variables
    Forward,
    /// Start from the full model, only remove variables
    Backward,
    /// Start from the mandatory set, add or remove whichever helps most
    Switch,
}

impl StepDirection {
    pub fn name(&self) -> &'static str {
        match self {
            StepDirection::Forward => "forward",
            StepDirection::Backward => "backward",
            StepDirection::Switch => "switch",
        }
    }
}

impl std::str::FromStr for StepDirection {
    type Err = GlmSelectError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "forward" => Ok(StepDirection::Forward),
            "backward" => Ok(StepDirection::Backward),
            "switch" => Ok(StepDirection::Switch),
            other => Err(GlmSelectError::InvalidInput {
                reason: format!(
                    "unknown direction '{}', expected forward, backward, or switch",
                    other
                ),
            }),
        }
    }
}

impl std::fmt::Display for StepDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[derive(Debug, Clone)]
pub struct StepwiseOptions {
    pub direction: StepDirection,
    pub metric: SelectionMetric,
    /// Cap on moves taken; the walk usually stops earlier on its own
    pub max_steps: usize,
}

impl Default for StepwiseOptions {
    fn default() -> Self {
        StepwiseOptions {
            direction: StepDirection::Forward,
            metric: SelectionMetric::Aic,
            max_steps: usize::MAX,
        }
    }
}

/// What one step did to the model
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepAction {
    Start,
    Add,
    Remove,
}

impl std::fmt::Display for StepAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            StepAction::Start => "start",
            StepAction::Add => "add",
            StepAction::Remove => "remove",
        };
        write!(f, "{}", name)
    }
}

/// One point on the walk
#[derive(Debug, Clone)]
pub struct StepRecord {
    pub mask: ModelMask,
    pub metric: f64,
    pub action: StepAction,
    /// Variable moved by this step; None for the starting model
    pub var: Option<usize>,
}

#[derive(Debug)]
pub struct StepwiseResult {
    /// The walk from the start model to the final one, in order
    pub path: Vec<StepRecord>,
    pub final_model: ScoredModel,
}

fn legal_moves(
    candidates: &CandidateSet,
    mask: &ModelMask,
    direction: StepDirection,
) -> Vec<(StepAction, usize, ModelMask)> {
    let mut moves = Vec::new();
    let adds = matches!(direction, StepDirection::Forward | StepDirection::Switch);
    let removes = matches!(direction, StepDirection::Backward | StepDirection::Switch);

    for var in candidates.free_vars() {
        if !mask.contains(var) {
            if adds && candidates.can_add(mask, var) {
                moves.push((StepAction::Add, var, mask.with(var)));
            }
        } else if removes && candidates.can_remove(mask, var) {
            moves.push((StepAction::Remove, var, mask.without(var)));
        }
    }
    moves
}

/// Walk the model space greedily, one variable at a time.
///
/// Every step fits all legal single-variable moves in parallel and takes
/// the best strict improvement; the path records the start model and each
/// accepted move.
pub fn stepwise(
    data: &GlmData,
    family: &Family,
    candidates: &CandidateSet,
    control: &FitControl,
    options: &StepwiseOptions,
) -> Result<StepwiseResult> {
    if candidates.n_cols() != data.n_cols() {
        return Err(GlmSelectError::DimensionMismatch {
            expected: format!("{} candidate columns", data.n_cols()),
            got: format!("{}", candidates.n_cols()),
        });
    }

    let start_mask = match options.direction {
        StepDirection::Forward | StepDirection::Switch => candidates.mandatory_mask(),
        StepDirection::Backward => candidates.full_mask(),
    };
    if !candidates.admissible(&start_mask) {
        return Err(GlmSelectError::InvalidCandidateSet {
            reason: "mandatory set violates the variable hierarchy".to_string(),
        });
    }

    let dispersion = family.has_dispersion();
    let mut current = evaluate_subset(
        data,
        family,
        candidates,
        control,
        options.metric,
        dispersion,
        &start_mask,
    )?;
    let mut path = vec![StepRecord {
        mask: current.mask.clone(),
        metric: current.metric,
        action: StepAction::Start,
        var: None,
    }];

    for step in 0..options.max_steps {
        let moves = legal_moves(candidates, &current.mask, options.direction);
        if moves.is_empty() {
            break;
        }

        let scored: Vec<(StepAction, usize, ScoredModel)> = moves
            .into_par_iter()
            .map(|(action, var, mask)| {
                evaluate_subset(data, family, candidates, control, options.metric, dispersion, &mask)
                    .map(|s| (action, var, s))
            })
            .collect::<Result<Vec<_>>>()?;

        let best = scored.into_iter().min_by(|a, b| {
            a.2.metric
                .partial_cmp(&b.2.metric)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.2.mask.cmp(&b.2.mask))
        });
        let (action, var, scored_move) = match best {
            Some(m) => m,
            None => break,
        };

        if scored_move.metric >= current.metric {
            break;
        }
        log::debug!(
            "step {}: {} variable {}, {} = {:.4}",
            step + 1,
            action,
            var,
            options.metric.name(),
            scored_move.metric
        );
        current = scored_move;
        path.push(StepRecord {
            mask: current.mask.clone(),
            metric: current.metric,
            action,
            var: Some(var),
        });
    }

    Ok(StepwiseResult {
        path,
        final_model: current,
    })
}
