//! Individual data quality checks over extracted tables.
//!
//! Checks are advisory. They describe the data, they never reject it.

use crate::transform::merge::KEY_COLUMNS;
use crate::types::variable::ClimateVariable;
use crate::validation::error::ValidationError;
use polars::prelude::*;
use serde::Serialize;
use std::collections::HashMap;

/// How many months of data a complete point is expected to carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CoveragePolicy {
    /// Twelve months for every year between the earliest and latest year
    /// anywhere in the table.
    #[default]
    YearSpan,
    /// The month count most points actually have. Robust when the source
    /// itself has a ragged edge at the end of the record.
    MostCommon,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnMissing {
    pub column: String,
    pub missing: usize,
    pub fraction: f64,
}

/// Null counts per value column of a table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MissingReport {
    pub total_cells: usize,
    pub missing_cells: usize,
    pub missing_fraction: f64,
    pub by_column: Vec<ColumnMissing>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PointCoverage {
    pub point_id: String,
    pub months_present: usize,
    pub fraction: f64,
}

/// Months present per point, against an expected month count.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CoverageReport {
    pub expected_months: usize,
    pub incomplete_points: Vec<PointCoverage>,
    pub total_points: usize,
}

/// Observed value span of a variable against its plausible range.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RangeReport {
    pub variable: ClimateVariable,
    pub lower_bound: f64,
    pub upper_bound: f64,
    pub observed_min: Option<f64>,
    pub observed_max: Option<f64>,
    pub out_of_range: usize,
}

fn value_columns(df: &DataFrame) -> Vec<String> {
    df.get_column_names_str()
        .iter()
        .filter(|name| !KEY_COLUMNS.contains(name))
        .map(|name| name.to_string())
        .collect()
}

/// Counts nulls in every value column.
pub fn check_missing(df: &DataFrame) -> Result<MissingReport, ValidationError> {
    let columns = value_columns(df);
    let mut by_column = Vec::with_capacity(columns.len());
    let mut missing_cells = 0;
    let rows = df.height();

    for name in columns {
        let nulls = df.column(&name)?.null_count();
        missing_cells += nulls;
        by_column.push(ColumnMissing {
            column: name,
            missing: nulls,
            fraction: if rows == 0 { 0.0 } else { nulls as f64 / rows as f64 },
        });
    }

    let total_cells = rows * by_column.len();
    Ok(MissingReport {
        total_cells,
        missing_cells,
        missing_fraction: if total_cells == 0 {
            0.0
        } else {
            missing_cells as f64 / total_cells as f64
        },
        by_column,
    })
}

/// Counts distinct months per point and flags points below the expected
/// count for the chosen policy.
pub fn check_temporal_coverage(
    df: &DataFrame,
    policy: CoveragePolicy,
) -> Result<CoverageReport, ValidationError> {
    if df.height() == 0 {
        return Ok(CoverageReport {
            expected_months: 0,
            incomplete_points: Vec::new(),
            total_points: 0,
        });
    }

    let per_point = df
        .clone()
        .lazy()
        .group_by([col("point_id")])
        .agg([(col("year").cast(DataType::Int64) * lit(100i64)
            + col("month").cast(DataType::Int64))
        .n_unique()
        .alias("months_present")])
        .sort(["point_id"], SortMultipleOptions::default())
        .collect()?;

    let ids = per_point.column("point_id")?.str()?;
    let counts = per_point.column("months_present")?.u32()?;

    let expected = match policy {
        CoveragePolicy::YearSpan => {
            let year = df.column("year")?.i32()?;
            let min_year = year.min().unwrap_or(0);
            let max_year = year.max().unwrap_or(0);
            ((max_year - min_year + 1).max(0) as usize) * 12
        }
        CoveragePolicy::MostCommon => {
            let mut freq: HashMap<u32, usize> = HashMap::new();
            for count in counts.into_no_null_iter() {
                *freq.entry(count).or_insert(0) += 1;
            }
            freq.into_iter()
                .max_by_key(|(count, n)| (*n, *count))
                .map(|(count, _)| count as usize)
                .unwrap_or(0)
        }
    };

    let mut incomplete = Vec::new();
    for (id, count) in ids.into_no_null_iter().zip(counts.into_no_null_iter()) {
        let count = count as usize;
        if count < expected {
            incomplete.push(PointCoverage {
                point_id: id.to_string(),
                months_present: count,
                fraction: if expected == 0 {
                    0.0
                } else {
                    count as f64 / expected as f64
                },
            });
        }
    }

    Ok(CoverageReport {
        expected_months: expected,
        incomplete_points: incomplete,
        total_points: per_point.height(),
    })
}

/// Compares the observed span of a variable's column with its plausible
/// physical range.
pub fn check_value_ranges(
    df: &DataFrame,
    variable: ClimateVariable,
) -> Result<RangeReport, ValidationError> {
    let (lower, upper) = variable.plausible_range();
    let column = df
        .column(variable.name())
        .map_err(|_| ValidationError::MissingColumn {
            variable,
            column: variable.name().to_string(),
        })?
        .f64()?;

    let mut out_of_range = 0;
    for value in column.into_no_null_iter() {
        if value < lower || value > upper {
            out_of_range += 1;
        }
    }

    Ok(RangeReport {
        variable,
        lower_bound: lower,
        upper_bound: upper,
        observed_min: column.min(),
        observed_max: column.max(),
        out_of_range,
    })
}
