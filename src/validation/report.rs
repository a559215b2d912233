//! Combined validation report over an extraction run.

use crate::types::variable::ClimateVariable;
use crate::validation::checks::{
    check_missing, check_temporal_coverage, check_value_ranges, CoveragePolicy, CoverageReport,
    MissingReport, RangeReport,
};
use crate::validation::error::ValidationError;
use log::{info, warn};
use polars::prelude::DataFrame;
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};

/// All checks for one variable's table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VariableReport {
    pub variable: ClimateVariable,
    pub rows: usize,
    pub missing: MissingReport,
    pub coverage: CoverageReport,
    pub ranges: RangeReport,
}

/// Validation results across every extracted variable.
///
/// Validation is advisory. A report full of warnings still accompanies
/// full output, it never blocks the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationReport {
    pub variables: Vec<VariableReport>,
}

impl ValidationReport {
    /// True when no check found anything to flag.
    pub fn is_clean(&self) -> bool {
        self.variables.iter().all(|v| {
            v.missing.missing_cells == 0
                && v.coverage.incomplete_points.is_empty()
                && v.ranges.out_of_range == 0
        })
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Validation report")?;
        writeln!(f, "=================")?;
        for v in &self.variables {
            writeln!(f)?;
            writeln!(f, "{} ({} rows)", v.variable, v.rows)?;
            writeln!(
                f,
                "  missing: {}/{} cells ({:.2}%)",
                v.missing.missing_cells,
                v.missing.total_cells,
                v.missing.missing_fraction * 100.0
            )?;
            writeln!(
                f,
                "  coverage: {}/{} points below {} expected months",
                v.coverage.incomplete_points.len(),
                v.coverage.total_points,
                v.coverage.expected_months
            )?;
            match (v.ranges.observed_min, v.ranges.observed_max) {
                (Some(min), Some(max)) => writeln!(
                    f,
                    "  range: observed [{min:.2}, {max:.2}], plausible [{:.2}, {:.2}], {} out of range",
                    v.ranges.lower_bound, v.ranges.upper_bound, v.ranges.out_of_range
                )?,
                _ => writeln!(f, "  range: no values")?,
            }
        }
        Ok(())
    }
}

/// Runs every check over each extracted table.
pub fn validate_extraction(
    tables: &[(ClimateVariable, DataFrame)],
    policy: CoveragePolicy,
) -> Result<ValidationReport, ValidationError> {
    let mut variables = Vec::with_capacity(tables.len());
    for (variable, df) in tables {
        let report = VariableReport {
            variable: *variable,
            rows: df.height(),
            missing: check_missing(df)?,
            coverage: check_temporal_coverage(df, policy)?,
            ranges: check_value_ranges(df, *variable)?,
        };
        if report.ranges.out_of_range > 0 {
            warn!(
                "{}: {} values outside plausible range [{}, {}]",
                variable, report.ranges.out_of_range, report.ranges.lower_bound,
                report.ranges.upper_bound
            );
        }
        variables.push(report);
    }

    let report = ValidationReport { variables };
    info!(
        "Validated {} variable tables, clean: {}",
        report.variables.len(),
        report.is_clean()
    );
    Ok(report)
}

/// Writes the report next to the outputs, both as readable text and as
/// JSON. Returns the paths written.
pub async fn save_validation_report(
    report: &ValidationReport,
    directory: &Path,
    stem: &str,
) -> Result<Vec<PathBuf>, ValidationError> {
    let text_path = directory.join(format!("{stem}.txt"));
    let json_path = directory.join(format!("{stem}.json"));

    let text = report.to_string();
    let json = serde_json::to_string_pretty(report)?;

    tokio::fs::write(&text_path, text)
        .await
        .map_err(|e| ValidationError::Io(text_path.clone(), e))?;
    tokio::fs::write(&json_path, json)
        .await
        .map_err(|e| ValidationError::Io(json_path.clone(), e))?;

    Ok(vec![text_path, json_path])
}
