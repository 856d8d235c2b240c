//! Shared regression data: design matrix, response, and offset

use ndarray::{Array1, Array2, ArrayView1, ArrayView2};

use crate::error::{GlmSelectError, Result};

/// Immutable (design, response, offset) bundle shared read-only by every fit
///
/// Rows are observations, columns are predictors. The offset enters the
/// linear predictor additively and defaults to zero.
#[derive(Debug, Clone)]
pub struct GlmData {
    x: Array2<f64>,
    y: Array1<f64>,
    offset: Array1<f64>,
}

impl GlmData {
    /// Create a dataset with an explicit offset
    pub fn with_offset(x: Array2<f64>, y: Array1<f64>, offset: Array1<f64>) -> Result<Self> {
        let n = x.nrows();

        if n == 0 || x.ncols() == 0 {
            return Err(GlmSelectError::EmptyData {
                reason: "Design matrix has no rows or no columns".to_string(),
            });
        }

        if y.len() != n {
            return Err(GlmSelectError::DimensionMismatch {
                expected: format!("response of length {}", n),
                got: format!("length {}", y.len()),
            });
        }

        if offset.len() != n {
            return Err(GlmSelectError::DimensionMismatch {
                expected: format!("offset of length {}", n),
                got: format!("length {}", offset.len()),
            });
        }

        if x.iter().any(|v| !v.is_finite()) || y.iter().any(|v| !v.is_finite()) {
            return Err(GlmSelectError::InvalidInput {
                reason: "Design matrix and response must be finite".to_string(),
            });
        }

        Ok(Self { x, y, offset })
    }

    /// Create a dataset with a zero offset
    pub fn new(x: Array2<f64>, y: Array1<f64>) -> Result<Self> {
        let n = x.nrows();
        Self::with_offset(x, y, Array1::zeros(n))
    }

    /// Number of observations
    pub fn n_obs(&self) -> usize {
        self.x.nrows()
    }

    /// Number of predictor columns
    pub fn n_cols(&self) -> usize {
        self.x.ncols()
    }

    /// Design matrix view
    pub fn x(&self) -> ArrayView2<'_, f64> {
        self.x.view()
    }

    /// Response view
    pub fn y(&self) -> ArrayView1<'_, f64> {
        self.y.view()
    }

    /// Offset view
    pub fn offset(&self) -> ArrayView1<'_, f64> {
        self.offset.view()
    }

    /// New dataset restricted to the given design columns, sharing y and offset
    pub fn select_columns(&self, cols: &[usize]) -> Self {
        let mut x = Array2::zeros((self.n_obs(), cols.len()));
        for (k, &j) in cols.iter().enumerate() {
            x.column_mut(k).assign(&self.x.column(j));
        }
        Self {
            x,
            y: self.y.clone(),
            offset: self.offset.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_dimension_checks() {
        let x = array![[1.0, 0.5], [1.0, 1.5], [1.0, 2.5]];
        let y = array![0.0, 1.0];
        assert!(GlmData::new(x, y).is_err());

        let x = array![[1.0, 0.5], [1.0, 1.5], [1.0, 2.5]];
        let y = array![0.0, 1.0, 1.0];
        let data = GlmData::new(x, y).unwrap();
        assert_eq!(data.n_obs(), 3);
        assert_eq!(data.n_cols(), 2);
        assert_eq!(data.offset().len(), 3);
    }

    #[test]
    fn test_non_finite_rejected() {
        let x = array![[1.0, f64::NAN], [1.0, 1.5]];
        let y = array![0.0, 1.0];
        assert!(GlmData::new(x, y).is_err());
    }

    #[test]
    fn test_select_columns() {
        let x = array![[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]];
        let y = array![1.0, 2.0];
        let data = GlmData::new(x, y).unwrap();

        let sub = data.select_columns(&[0, 2]);
        assert_eq!(sub.n_cols(), 2);
        assert_eq!(sub.x()[[0, 1]], 3.0);
        assert_eq!(sub.x()[[1, 0]], 4.0);
    }
}
