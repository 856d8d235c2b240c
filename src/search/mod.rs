//! Best-subset and stepwise model selection
//!
//! The search space is the lattice of admissible variable subsets over a
//! [`CandidateSet`]. [`select_best_subset`] walks it exhaustively with
//! branch-and-bound pruning and returns the top models under an
//! information criterion; [`stepwise`] trades optimality for speed with a
//! greedy single-move walk.

mod branch;
mod context;
mod metric;
mod model;
mod stepwise;

pub use branch::{select_best_subset, SearchOptions, SelectionResult};
pub use context::{BestModels, ScoredModel};
pub use metric::SelectionMetric;
pub use model::{CandidateSet, ModelMask};
pub use stepwise::{
    stepwise, StepAction, StepDirection, StepRecord, StepwiseOptions, StepwiseResult,
};
