//! Candidate variables, inclusion masks, and model counting
//!
//! A variable is a group of design columns selected or dropped as a unit,
//! so a factor expanded into several indicator columns moves through the
//! search together. Masks are over variables, not columns.

use crate::data::GlmData;
use crate::error::{GlmSelectError, Result};

/// Inclusion flags for every candidate variable
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ModelMask(Vec<bool>);

impl ModelMask {
    pub fn empty(n_vars: usize) -> Self {
        ModelMask(vec![false; n_vars])
    }

    pub fn n_vars(&self) -> usize {
        self.0.len()
    }

    pub fn contains(&self, var: usize) -> bool {
        self.0[var]
    }

    pub fn count(&self) -> usize {
        self.0.iter().filter(|&&on| on).count()
    }

    pub fn set(&mut self, var: usize, on: bool) {
        self.0[var] = on;
    }

    /// Copy with one variable switched on
    pub fn with(&self, var: usize) -> Self {
        let mut next = self.clone();
        next.0[var] = true;
        next
    }

    /// Copy with one variable switched off
    pub fn without(&self, var: usize) -> Self {
        let mut next = self.clone();
        next.0[var] = false;
        next
    }

    /// Indices of the included variables, ascending
    pub fn vars(&self) -> impl Iterator<Item = usize> + '_ {
        self.0
            .iter()
            .enumerate()
            .filter_map(|(i, &on)| on.then_some(i))
    }
}

/// The searchable variable structure over a design matrix
#[derive(Debug, Clone)]
pub struct CandidateSet {
    /// Variable id of each design column
    column_vars: Vec<usize>,
    /// Columns of each variable, in design order
    var_columns: Vec<Vec<usize>>,
    /// Variables forced into every model
    mandatory: Vec<bool>,
    /// For each variable, the variables that must accompany it
    parents: Vec<Vec<usize>>,
}

impl CandidateSet {
    /// Group `n_cols` design columns into variables.
    ///
    /// `column_vars[c]` names the variable that owns column `c`; ids must
    /// cover `0..n_vars` with no gaps. `mandatory_vars` lists variables
    /// present in every candidate model.
    pub fn new(column_vars: Vec<usize>, n_vars: usize, mandatory_vars: &[usize]) -> Result<Self> {
        if column_vars.is_empty() {
            return Err(GlmSelectError::InvalidCandidateSet {
                reason: "no design columns".to_string(),
            });
        }
        let mut var_columns = vec![Vec::new(); n_vars];
        for (col, &var) in column_vars.iter().enumerate() {
            if var >= n_vars {
                return Err(GlmSelectError::InvalidCandidateSet {
                    reason: format!("column {} names variable {} of {}", col, var, n_vars),
                });
            }
            var_columns[var].push(col);
        }
        for (var, cols) in var_columns.iter().enumerate() {
            if cols.is_empty() {
                return Err(GlmSelectError::InvalidCandidateSet {
                    reason: format!("variable {} owns no columns", var),
                });
            }
        }

        let mut mandatory = vec![false; n_vars];
        for &var in mandatory_vars {
            if var >= n_vars {
                return Err(GlmSelectError::InvalidCandidateSet {
                    reason: format!("mandatory variable {} of {}", var, n_vars),
                });
            }
            mandatory[var] = true;
        }

        Ok(CandidateSet {
            column_vars,
            var_columns,
            mandatory,
            parents: vec![Vec::new(); n_vars],
        })
    }

    /// One variable per design column with the given mandatory set
    pub fn per_column(n_cols: usize, mandatory_vars: &[usize]) -> Result<Self> {
        CandidateSet::new((0..n_cols).collect(), n_cols, mandatory_vars)
    }

    /// Require `parent` in every model that contains `child`
    pub fn add_dependency(&mut self, child: usize, parent: usize) -> Result<()> {
        let n_vars = self.n_vars();
        if child >= n_vars || parent >= n_vars {
            return Err(GlmSelectError::InvalidCandidateSet {
                reason: format!("dependency {} -> {} of {}", child, parent, n_vars),
            });
        }
        if child == parent {
            return Err(GlmSelectError::InvalidCandidateSet {
                reason: format!("variable {} depends on itself", child),
            });
        }
        if !self.parents[child].contains(&parent) {
            self.parents[child].push(parent);
        }
        Ok(())
    }

    pub fn n_vars(&self) -> usize {
        self.var_columns.len()
    }

    pub fn n_cols(&self) -> usize {
        self.column_vars.len()
    }

    pub fn is_mandatory(&self, var: usize) -> bool {
        self.mandatory[var]
    }

    /// Columns owned by one variable
    pub fn var_cols(&self, var: usize) -> &[usize] {
        &self.var_columns[var]
    }

    /// Variables open to the search, ascending
    pub fn free_vars(&self) -> Vec<usize> {
        (0..self.n_vars()).filter(|&v| !self.mandatory[v]).collect()
    }

    pub fn mandatory_mask(&self) -> ModelMask {
        let mut mask = ModelMask::empty(self.n_vars());
        for (var, &keep) in self.mandatory.iter().enumerate() {
            if keep {
                mask.set(var, true);
            }
        }
        mask
    }

    pub fn full_mask(&self) -> ModelMask {
        let mut mask = ModelMask::empty(self.n_vars());
        for var in 0..self.n_vars() {
            mask.set(var, true);
        }
        mask
    }

    /// Design columns of a masked model, in design order
    pub fn columns_for(&self, mask: &ModelMask) -> Vec<usize> {
        self.column_vars
            .iter()
            .enumerate()
            .filter_map(|(col, &var)| mask.contains(var).then_some(col))
            .collect()
    }

    /// Column count of a masked model
    pub fn cols_in(&self, mask: &ModelMask) -> usize {
        mask.vars().map(|v| self.var_columns[v].len()).sum()
    }

    /// Whether every included variable has its required companions included
    pub fn admissible(&self, mask: &ModelMask) -> bool {
        mask.vars()
            .all(|v| self.parents[v].iter().all(|&p| mask.contains(p)))
    }

    /// Whether `mask` plus `var` keeps the hierarchy intact
    pub fn can_add(&self, mask: &ModelMask, var: usize) -> bool {
        self.parents[var].iter().all(|&p| mask.contains(p))
    }

    /// Whether `var` can leave `mask` without orphaning a dependent
    pub fn can_remove(&self, mask: &ModelMask, var: usize) -> bool {
        !mask
            .vars()
            .any(|v| v != var && self.parents[v].contains(&var))
    }

    /// Sub-design restricted to the masked columns
    pub fn design_for(&self, data: &GlmData, mask: &ModelMask) -> GlmData {
        data.select_columns(&self.columns_for(mask))
    }
}

/// Number of models over `free_vars` selectable variables with at most
/// `max_free` of them included.
///
/// Counted in floating point: the total is only used for progress
/// reporting and overflows 64-bit integers long before the search itself
/// becomes feasible.
pub(crate) fn count_models(free_vars: usize, max_free: usize) -> f64 {
    let v = free_vars as f64;
    if max_free >= free_vars {
        2f64.powi(free_vars as i32)
    } else {
        let mut total = 1.0;
        let mut running = 1.0;
        for i in 1..=max_free {
            running *= (v - i as f64 + 1.0) / i as f64;
            total += running.round();
        }
        total
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn grouped_set() -> CandidateSet {
        // intercept col 0 (mandatory), x1 cols 1-2, x2 col 3
        CandidateSet::new(vec![0, 1, 1, 2], 3, &[0]).unwrap()
    }

    #[test]
    fn test_grouping_and_columns() {
        let set = grouped_set();
        assert_eq!(set.n_vars(), 3);
        assert_eq!(set.var_cols(1), &[1, 2]);
        assert_eq!(set.free_vars(), vec![1, 2]);

        let mask = set.mandatory_mask().with(2);
        assert_eq!(set.columns_for(&mask), vec![0, 3]);
        assert_eq!(set.cols_in(&mask), 2);

        let full = set.full_mask();
        assert_eq!(set.columns_for(&full), vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_validation() {
        assert!(CandidateSet::new(vec![], 0, &[]).is_err());
        // column names variable out of range
        assert!(CandidateSet::new(vec![0, 3], 2, &[]).is_err());
        // variable 1 owns no columns
        assert!(CandidateSet::new(vec![0, 0], 2, &[]).is_err());
        // mandatory id out of range
        assert!(CandidateSet::new(vec![0, 1], 2, &[2]).is_err());
    }

    #[test]
    fn test_hierarchy() {
        let mut set = grouped_set();
        set.add_dependency(2, 1).unwrap();
        assert!(set.add_dependency(2, 2).is_err());
        assert!(set.add_dependency(2, 9).is_err());

        let base = set.mandatory_mask();
        assert!(set.admissible(&base));
        assert!(!set.admissible(&base.with(2)));
        assert!(set.admissible(&base.with(1).with(2)));

        assert!(set.can_add(&base, 1));
        assert!(!set.can_add(&base, 2));
        assert!(set.can_add(&base.with(1), 2));

        let both = base.with(1).with(2);
        assert!(!set.can_remove(&both, 1));
        assert!(set.can_remove(&both, 2));
    }

    #[test]
    fn test_mask_ordering_is_lexicographic() {
        let a = ModelMask(vec![false, true, true]);
        let b = ModelMask(vec![true, false, false]);
        assert!(a < b);
        assert_eq!(a.count(), 2);
        assert_eq!(b.vars().collect::<Vec<_>>(), vec![0]);
    }

    #[test]
    fn test_design_restriction() {
        let set = grouped_set();
        let x = array![[1.0, 2.0, 3.0, 4.0], [1.0, 5.0, 6.0, 7.0]];
        let y = array![1.0, 2.0];
        let data = GlmData::new(x, y).unwrap();

        let sub = set.design_for(&data, &set.mandatory_mask().with(2));
        assert_eq!(sub.n_cols(), 2);
        assert_eq!(sub.x()[[0, 1]], 4.0);
        assert_eq!(sub.x()[[1, 0]], 1.0);
    }

    #[test]
    fn test_model_counts() {
        // no size limit: full power set of the free variables
        assert_eq!(count_models(4, 4), 16.0);
        assert_eq!(count_models(4, 9), 16.0);
        // limited: 1 + C(4,1) + C(4,2) = 11
        assert_eq!(count_models(4, 2), 11.0);
        assert_eq!(count_models(0, 0), 1.0);
    }
}
