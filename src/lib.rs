//! glmselect: GLM fitting and exact best-subset model selection
//!
//! This crate fits generalized linear models (gaussian, binomial, poisson,
//! and gamma responses under the usual link functions) and searches the
//! space of predictor subsets for the models with the best AIC, AICc, or
//! BIC. The search is a parallel branch and bound that prunes with metric
//! lower bounds, so it ranks subsets exactly without fitting all of them.
//!
//! # Example
//!
//! ```ignore
//! use glmselect::prelude::*;
//!
//! // Load a delimited table and assemble the design
//! let table = read_table("data.tsv")?;
//! let design = build_design(&table, "y", None, true, &[])?;
//!
//! // Rank every admissible subset by AIC, keeping the ten best
//! let family = Family::parse("gaussian", "identity")?;
//! let options = SearchOptions {
//!     num_best: 10,
//!     ..SearchOptions::default()
//! };
//! let result = select_best_subset(
//!     &design.data,
//!     &family,
//!     &design.candidates,
//!     &FitControl::default(),
//!     &options,
//! )?;
//! ```

pub mod cli;
pub mod confidence;
pub mod data;
pub mod error;
pub mod family;
pub mod glm;
pub mod io;
pub mod search;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::confidence::{metric_interval, IntervalControl, MetricBound};
    pub use crate::data::GlmData;
    pub use crate::error::{GlmSelectError, Result};
    pub use crate::family::{Distribution, Family, Link};
    pub use crate::glm::{fit, FitControl, FitMethod, FitResult, FitStatus};
    pub use crate::io::{
        build_design, read_table, write_fit, write_intervals, write_json, write_selection,
        write_stepwise, DesignTable, FitReport, IntervalReport, NumericTable, SearchReport,
        StepwiseReport,
    };
    pub use crate::search::{
        select_best_subset, stepwise, CandidateSet, ModelMask, ScoredModel, SearchOptions,
        SelectionMetric, SelectionResult, StepDirection, StepwiseOptions, StepwiseResult,
    };
}

use prelude::*;

/// Search every admissible subset for the best models by one metric, with
/// default fit settings
pub fn run_selection(
    data: &GlmData,
    family: &Family,
    candidates: &CandidateSet,
    metric: SelectionMetric,
    num_best: usize,
) -> Result<SelectionResult> {
    let control = FitControl::default();
    let options = SearchOptions {
        metric,
        num_best,
        ..SearchOptions::default()
    };
    select_best_subset(data, family, candidates, &control, &options)
}

/// Greedy stepwise selection with default fit settings
pub fn run_stepwise(
    data: &GlmData,
    family: &Family,
    candidates: &CandidateSet,
    direction: StepDirection,
    metric: SelectionMetric,
) -> Result<StepwiseResult> {
    let control = FitControl::default();
    let options = StepwiseOptions {
        direction,
        metric,
        ..StepwiseOptions::default()
    };
    stepwise(data, family, candidates, &control, &options)
}
