//! Delimited-table reading and result writing
//!
//! Input is a rectangular numeric table with a header row, tab or comma
//! delimited. One column is the response, optionally one is an offset, and
//! every remaining column becomes a candidate predictor.

use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::path::Path;

use ndarray::{Array1, Array2};
use serde::Serialize;

use crate::data::GlmData;
use crate::error::{GlmSelectError, Result};
use crate::io::report::{FitReport, IntervalReport, SearchReport, StepwiseReport};
use crate::search::CandidateSet;

/// Strip surrounding quotes from a string
fn strip_quotes(s: &str) -> String {
    let s = s.trim();
    if (s.starts_with('"') && s.ends_with('"')) || (s.starts_with('\'') && s.ends_with('\'')) {
        s[1..s.len() - 1].to_string()
    } else {
        s.to_string()
    }
}

/// A parsed numeric table, column-major
#[derive(Debug, Clone)]
pub struct NumericTable {
    pub names: Vec<String>,
    pub columns: Vec<Vec<f64>>,
}

impl NumericTable {
    pub fn n_rows(&self) -> usize {
        self.columns.first().map_or(0, |c| c.len())
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }
}

/// Modeling inputs assembled from a table: design matrix, candidate set,
/// and the variable names aligned with candidate ids
#[derive(Debug)]
pub struct DesignTable {
    pub data: GlmData,
    pub candidates: CandidateSet,
    pub names: Vec<String>,
}

/// Read a delimited numeric table with a header row.
///
/// Expected format: first row is column names; the delimiter is a tab when
/// the header contains one, otherwise a comma.
pub fn read_table<P: AsRef<Path>>(path: P) -> Result<NumericTable> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);
    let mut lines = reader.lines();

    let header_line = lines.next().ok_or_else(|| GlmSelectError::EmptyData {
        reason: "Empty data file".to_string(),
    })??;

    // Detect delimiter
    let delimiter = if header_line.contains('\t') { '\t' } else { ',' };

    let names: Vec<String> = header_line
        .split(delimiter)
        .map(|s| strip_quotes(s.trim()))
        .collect();
    for (i, name) in names.iter().enumerate() {
        if names[..i].contains(name) {
            return Err(GlmSelectError::InvalidInput {
                reason: format!("Duplicate column name: {}", name),
            });
        }
    }

    let mut columns: Vec<Vec<f64>> = vec![Vec::new(); names.len()];
    for line in lines {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        let fields: Vec<&str> = line.split(delimiter).collect();
        if fields.len() != names.len() {
            return Err(GlmSelectError::InvalidInput {
                reason: format!("Row has {} columns, expected {}", fields.len(), names.len()),
            });
        }

        for (j, field) in fields.iter().enumerate() {
            let text = strip_quotes(field.trim());
            let value = text
                .parse::<f64>()
                .map_err(|_| GlmSelectError::InvalidInput {
                    reason: format!("Invalid numeric value '{}' in column {}", text, names[j]),
                })?;
            columns[j].push(value);
        }
    }

    if columns.first().map_or(true, |c| c.is_empty()) {
        return Err(GlmSelectError::EmptyData {
            reason: "No data rows found".to_string(),
        });
    }

    Ok(NumericTable { names, columns })
}

/// Assemble modeling inputs from a parsed table.
///
/// `response` and the optional `offset` are looked up by column name; all
/// other columns become one candidate variable each, in file order. With
/// `intercept` a leading ones column is added as variable 0 and forced into
/// every model, as are the variables named in `keep`.
pub fn build_design(
    table: &NumericTable,
    response: &str,
    offset: Option<&str>,
    intercept: bool,
    keep: &[String],
) -> Result<DesignTable> {
    let n = table.n_rows();
    let y_idx = table
        .column_index(response)
        .ok_or_else(|| GlmSelectError::InvalidInput {
            reason: format!("No response column named '{}'", response),
        })?;
    let offset_idx = match offset {
        Some(name) => Some(table.column_index(name).ok_or_else(|| {
            GlmSelectError::InvalidInput {
                reason: format!("No offset column named '{}'", name),
            }
        })?),
        None => None,
    };

    let predictor_idx: Vec<usize> = (0..table.names.len())
        .filter(|&j| j != y_idx && Some(j) != offset_idx)
        .collect();
    if predictor_idx.is_empty() && !intercept {
        return Err(GlmSelectError::InvalidInput {
            reason: "No predictor columns left after response and offset".to_string(),
        });
    }

    let lead = intercept as usize;
    let p = predictor_idx.len() + lead;
    let mut x = Array2::zeros((n, p));
    let mut names = Vec::with_capacity(p);
    if intercept {
        x.column_mut(0).fill(1.0);
        names.push("(Intercept)".to_string());
    }
    for (k, &j) in predictor_idx.iter().enumerate() {
        for (i, &v) in table.columns[j].iter().enumerate() {
            x[[i, k + lead]] = v;
        }
        names.push(table.names[j].clone());
    }

    let y = Array1::from(table.columns[y_idx].clone());
    let data = match offset_idx {
        Some(j) => GlmData::with_offset(x, y, Array1::from(table.columns[j].clone()))?,
        None => GlmData::new(x, y)?,
    };

    let mut mandatory: Vec<usize> = if intercept { vec![0] } else { Vec::new() };
    for name in keep {
        let var = names
            .iter()
            .position(|n| n == name)
            .ok_or_else(|| GlmSelectError::InvalidInput {
                reason: format!("Unknown variable '{}' in keep list", name),
            })?;
        mandatory.push(var);
    }
    let candidates = CandidateSet::new((0..p).collect(), p, &mandatory)?;

    Ok(DesignTable {
        data,
        candidates,
        names,
    })
}

/// Write fitted coefficients to a TSV file
pub fn write_fit<P: AsRef<Path>>(path: P, report: &FitReport) -> Result<()> {
    let mut file = File::create(path)?;

    writeln!(file, "term\testimate\tstd_error")?;
    for c in &report.coefficients {
        match c.std_error {
            Some(se) => writeln!(file, "{}\t{:.6}\t{:.6}", c.term, c.estimate, se)?,
            None => writeln!(file, "{}\t{:.6}\tNA", c.term, c.estimate)?,
        }
    }

    Ok(())
}

/// Write ranked search results to a TSV file
pub fn write_selection<P: AsRef<Path>>(path: P, report: &SearchReport) -> Result<()> {
    let mut file = File::create(path)?;

    writeln!(file, "rank\t{}\tlog_lik\tvariables", report.metric)?;
    for (rank, model) in report.models.iter().enumerate() {
        writeln!(
            file,
            "{}\t{:.6}\t{:.6}\t{}",
            rank + 1,
            model.metric,
            model.log_lik,
            model.variables.join(" + "),
        )?;
    }

    Ok(())
}

/// Write a stepwise path to a TSV file
pub fn write_stepwise<P: AsRef<Path>>(path: P, report: &StepwiseReport) -> Result<()> {
    let mut file = File::create(path)?;

    writeln!(file, "step\taction\tvariable\t{}", report.metric)?;
    for (step, record) in report.path.iter().enumerate() {
        writeln!(
            file,
            "{}\t{}\t{}\t{:.6}",
            step,
            record.action,
            record.variable.as_deref().unwrap_or("NA"),
            record.metric,
        )?;
    }

    Ok(())
}

/// Write confidence bounds to a TSV file
pub fn write_intervals<P: AsRef<Path>>(path: P, report: &IntervalReport) -> Result<()> {
    let mut file = File::create(path)?;

    writeln!(file, "term\testimate\tlower\tupper")?;
    for term in &report.terms {
        writeln!(
            file,
            "{}\t{:.6}\t{:.6}\t{:.6}",
            term.term, term.estimate, term.lower, term.upper,
        )?;
    }

    Ok(())
}

/// Write any report as pretty-printed JSON
pub fn write_json<P: AsRef<Path>, T: Serialize>(path: P, value: &T) -> Result<()> {
    let file = File::create(path)?;
    serde_json::to_writer_pretty(file, value)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_read_tab_table() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "y\tx1\tx2").unwrap();
        writeln!(file, "1.0\t0.5\t2").unwrap();
        writeln!(file, "0.0\t1.5\t3").unwrap();
        writeln!(file, "1.0\t2.5\t4").unwrap();

        let table = read_table(file.path()).unwrap();
        assert_eq!(table.names, vec!["y", "x1", "x2"]);
        assert_eq!(table.n_rows(), 3);
        assert_eq!(table.columns[1][2], 2.5);
    }

    #[test]
    fn test_read_comma_table_with_quotes() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "\"y\",\"dose\"").unwrap();
        writeln!(file, "3.5,0.1").unwrap();
        writeln!(file, "4.5,0.2").unwrap();

        let table = read_table(file.path()).unwrap();
        assert_eq!(table.names, vec!["y", "dose"]);
        assert_eq!(table.columns[0], vec![3.5, 4.5]);
    }

    #[test]
    fn test_bad_rows_rejected() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "y\tx1").unwrap();
        writeln!(file, "1.0\t0.5\t9.9").unwrap();
        assert!(read_table(file.path()).is_err());

        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "y\tx1").unwrap();
        writeln!(file, "1.0\tabc").unwrap();
        assert!(read_table(file.path()).is_err());

        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "y\ty").unwrap();
        assert!(read_table(file.path()).is_err());
    }

    #[test]
    fn test_build_design() {
        let table = NumericTable {
            names: vec!["x1".into(), "y".into(), "off".into(), "x2".into()],
            columns: vec![
                vec![0.5, 1.5, 2.5],
                vec![1.0, 0.0, 1.0],
                vec![0.1, 0.1, 0.1],
                vec![2.0, 3.0, 4.0],
            ],
        };

        let design =
            build_design(&table, "y", Some("off"), true, &["x2".to_string()]).unwrap();
        assert_eq!(design.names, vec!["(Intercept)", "x1", "x2"]);
        assert_eq!(design.data.n_obs(), 3);
        assert_eq!(design.data.n_cols(), 3);
        assert_eq!(design.data.x()[[1, 0]], 1.0);
        assert_eq!(design.data.x()[[1, 1]], 1.5);
        assert_eq!(design.data.offset()[0], 0.1);
        assert!(design.candidates.is_mandatory(0));
        assert!(design.candidates.is_mandatory(2));
        assert!(!design.candidates.is_mandatory(1));

        assert!(build_design(&table, "z", None, true, &[]).is_err());
        assert!(build_design(&table, "y", Some("z"), true, &[]).is_err());
        assert!(build_design(&table, "y", None, true, &["nope".to_string()]).is_err());
    }

    #[test]
    fn test_write_fit_table() {
        use crate::io::report::CoefficientReport;

        let report = FitReport {
            family: "gaussian(identity)".to_string(),
            method: "fisher".to_string(),
            status_code: 2,
            converged: true,
            log_lik: -12.5,
            deviance: 3.25,
            coefficients: vec![
                CoefficientReport {
                    term: "(Intercept)".to_string(),
                    estimate: 1.234567,
                    std_error: Some(0.5),
                },
                CoefficientReport {
                    term: "x1".to_string(),
                    estimate: -2.0,
                    std_error: None,
                },
            ],
        };

        let file = NamedTempFile::new().unwrap();
        write_fit(file.path(), &report).unwrap();

        let written = std::fs::read_to_string(file.path()).unwrap();
        let lines: Vec<&str> = written.lines().collect();
        assert_eq!(lines[0], "term\testimate\tstd_error");
        assert_eq!(lines[1], "(Intercept)\t1.234567\t0.500000");
        assert_eq!(lines[2], "x1\t-2.000000\tNA");
    }

    #[test]
    fn test_write_json_round_trip() {
        use crate::io::report::{IntervalReport, TermInterval};

        let report = IntervalReport {
            metric: "AIC".to_string(),
            goal: 52.5,
            terms: vec![TermInterval {
                term: "x1".to_string(),
                estimate: 1.0,
                lower: 0.25,
                upper: f64::NAN,
            }],
        };

        let file = NamedTempFile::new().unwrap();
        write_json(file.path(), &report).unwrap();

        let written = std::fs::read_to_string(file.path()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&written).unwrap();
        assert_eq!(value["metric"], "AIC");
        assert_eq!(value["terms"][0]["lower"], 0.25);
        // non-finite floats serialize as null
        assert!(value["terms"][0]["upper"].is_null());
    }
}
