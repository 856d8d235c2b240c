//! Named result structures for output
//!
//! The fitting and search layers speak in column indices and masks; these
//! reports translate everything back to variable names for files and the
//! terminal. All of them serialize to JSON as-is.

use serde::Serialize;

use crate::confidence::MetricBound;
use crate::family::Family;
use crate::glm::{FitMethod, FitResult};
use crate::search::{ScoredModel, SelectionMetric, SelectionResult, StepDirection, StepwiseResult};

/// One fitted coefficient by name
#[derive(Debug, Clone, Serialize)]
pub struct CoefficientReport {
    pub term: String,
    pub estimate: f64,
    /// None when the information matrix was singular at the optimum
    pub std_error: Option<f64>,
}

/// A single fitted model with named terms
#[derive(Debug, Clone, Serialize)]
pub struct FitReport {
    pub family: String,
    pub method: String,
    pub status_code: i64,
    pub converged: bool,
    pub log_lik: f64,
    pub deviance: f64,
    pub coefficients: Vec<CoefficientReport>,
}

impl FitReport {
    pub fn new(fit: &FitResult, names: &[String], family: &Family, method: FitMethod) -> Self {
        let coefficients = names
            .iter()
            .zip(fit.coefficients.iter())
            .enumerate()
            .map(|(j, (term, &estimate))| CoefficientReport {
                term: term.clone(),
                estimate,
                std_error: fit.standard_errors.as_ref().map(|se| se[j]),
            })
            .collect();
        FitReport {
            family: family.to_string(),
            method: method.name().to_string(),
            status_code: fit.status.code(),
            converged: fit.converged(),
            log_lik: fit.log_lik,
            deviance: fit.deviance,
            coefficients,
        }
    }
}

impl std::fmt::Display for FitReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "{} fit by {}", self.family, self.method)?;
        writeln!(f, "{:<16} {:>12} {:>12}", "term", "estimate", "std_error")?;
        for c in &self.coefficients {
            match c.std_error {
                Some(se) => writeln!(f, "{:<16} {:>12.6} {:>12.6}", c.term, c.estimate, se)?,
                None => writeln!(f, "{:<16} {:>12.6} {:>12}", c.term, c.estimate, "NA")?,
            }
        }
        writeln!(
            f,
            "log-likelihood: {:.4}, deviance: {:.4}",
            self.log_lik, self.deviance
        )?;
        if !self.converged {
            writeln!(f, "warning: fit did not converge (status {})", self.status_code)?;
        }
        Ok(())
    }
}

/// One candidate model from a search, named
#[derive(Debug, Clone, Serialize)]
pub struct ModelReport {
    pub variables: Vec<String>,
    pub metric: f64,
    pub log_lik: f64,
    pub status_code: i64,
}

impl ModelReport {
    pub fn new(scored: &ScoredModel, names: &[String]) -> Self {
        ModelReport {
            variables: scored.mask.vars().map(|v| names[v].clone()).collect(),
            metric: scored.metric,
            log_lik: scored.fit.log_lik,
            status_code: scored.fit.status.code(),
        }
    }
}

/// Ranked outcome of a best-subset search
#[derive(Debug, Clone, Serialize)]
pub struct SearchReport {
    pub metric: String,
    pub models_checked: f64,
    pub models: Vec<ModelReport>,
}

impl SearchReport {
    pub fn new(result: &SelectionResult, metric: SelectionMetric, names: &[String]) -> Self {
        SearchReport {
            metric: metric.name().to_string(),
            models_checked: result.models_checked,
            models: result
                .models
                .iter()
                .map(|m| ModelReport::new(m, names))
                .collect(),
        }
    }
}

impl std::fmt::Display for SearchReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Best models by {}", self.metric)?;
        writeln!(f, "=================")?;
        for (rank, model) in self.models.iter().enumerate() {
            writeln!(
                f,
                "{:>3}. {} = {:.4}  [{}]",
                rank + 1,
                self.metric,
                model.metric,
                model.variables.join(" + "),
            )?;
        }
        writeln!(f, "Models checked: {}", self.models_checked)?;
        Ok(())
    }
}

/// One accepted move on a stepwise walk
#[derive(Debug, Clone, Serialize)]
pub struct StepReport {
    pub action: String,
    pub variable: Option<String>,
    pub metric: f64,
}

/// A stepwise walk and where it ended up
#[derive(Debug, Clone, Serialize)]
pub struct StepwiseReport {
    pub direction: String,
    pub metric: String,
    pub path: Vec<StepReport>,
    pub best: ModelReport,
}

impl StepwiseReport {
    pub fn new(
        result: &StepwiseResult,
        direction: StepDirection,
        metric: SelectionMetric,
        names: &[String],
    ) -> Self {
        StepwiseReport {
            direction: direction.name().to_string(),
            metric: metric.name().to_string(),
            path: result
                .path
                .iter()
                .map(|r| StepReport {
                    action: r.action.to_string(),
                    variable: r.var.map(|v| names[v].clone()),
                    metric: r.metric,
                })
                .collect(),
            best: ModelReport::new(&result.final_model, names),
        }
    }
}

impl std::fmt::Display for StepwiseReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "{} stepwise by {}", self.direction, self.metric)?;
        writeln!(f, "=================")?;
        for (step, record) in self.path.iter().enumerate() {
            writeln!(
                f,
                "{:>3}. {} {}  {} = {:.4}",
                step,
                record.action,
                record.variable.as_deref().unwrap_or("-"),
                self.metric,
                record.metric,
            )?;
        }
        writeln!(f, "Final model: [{}]", self.best.variables.join(" + "))?;
        Ok(())
    }
}

/// Confidence bound for one term
#[derive(Debug, Clone, Serialize)]
pub struct TermInterval {
    pub term: String,
    pub estimate: f64,
    pub lower: f64,
    pub upper: f64,
}

/// Profile-metric intervals for a fitted model
#[derive(Debug, Clone, Serialize)]
pub struct IntervalReport {
    pub metric: String,
    pub goal: f64,
    pub terms: Vec<TermInterval>,
}

impl IntervalReport {
    pub fn new(
        bounds: &[MetricBound],
        metric: SelectionMetric,
        goal: f64,
        names: &[String],
    ) -> Self {
        IntervalReport {
            metric: metric.name().to_string(),
            goal,
            terms: bounds
                .iter()
                .map(|b| TermInterval {
                    term: names[b.column].clone(),
                    estimate: b.estimate,
                    lower: b.lower,
                    upper: b.upper,
                })
                .collect(),
        }
    }
}

impl std::fmt::Display for IntervalReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Profile {} intervals at goal {:.4}", self.metric, self.goal)?;
        writeln!(f, "{:<16} {:>12} {:>12} {:>12}", "term", "estimate", "lower", "upper")?;
        for t in &self.terms {
            writeln!(
                f,
                "{:<16} {:>12.6} {:>12.6} {:>12.6}",
                t.term, t.estimate, t.lower, t.upper
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::glm::FitStatus;
    use crate::search::ModelMask;

    fn scored(mask: ModelMask, metric: f64) -> ScoredModel {
        ScoredModel {
            mask,
            fit: FitResult {
                coefficients: vec![0.5, -1.0],
                standard_errors: Some(vec![0.1, 0.2]),
                log_lik: -8.0,
                deviance: 1.5,
                status: FitStatus::Converged { iterations: 3 },
            },
            metric,
        }
    }

    #[test]
    fn test_model_report_names_variables() {
        let names = vec!["(Intercept)".to_string(), "a".to_string(), "b".to_string()];
        let mask = ModelMask::empty(3).with(0).with(2);
        let report = ModelReport::new(&scored(mask, 21.0), &names);
        assert_eq!(report.variables, vec!["(Intercept)", "b"]);
        assert_eq!(report.metric, 21.0);
        assert_eq!(report.status_code, 3);
    }

    #[test]
    fn test_search_report_display() {
        let names = vec!["(Intercept)".to_string(), "a".to_string()];
        let result = SelectionResult {
            models: vec![scored(ModelMask::empty(2).with(0).with(1), 19.5)],
            models_checked: 2.0,
        };
        let report = SearchReport::new(&result, SelectionMetric::Bic, &names);
        let text = report.to_string();
        assert!(text.contains("Best models by BIC"));
        assert!(text.contains("(Intercept) + a"));
        assert!(text.contains("Models checked: 2"));
    }

    #[test]
    fn test_fit_report_flags_non_convergence() {
        let names = vec!["x".to_string()];
        let fit = FitResult {
            coefficients: vec![2.0],
            standard_errors: None,
            log_lik: -4.0,
            deviance: 0.5,
            status: FitStatus::MaxIterations,
        };
        let family = Family::parse("poisson", "log").unwrap();
        let report = FitReport::new(&fit, &names, &family, FitMethod::Lbfgs);
        assert!(!report.converged);
        assert_eq!(report.status_code, -1);
        assert!(report.coefficients[0].std_error.is_none());
        assert!(report.to_string().contains("did not converge"));
    }
}
