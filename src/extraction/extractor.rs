//! Pulls monthly series for every indexed point out of a grid source.
//!
//! A source is opened once per variable and read many times. Two read
//! strategies are offered: one read per point, or a single bounding-box
//! read covering every indexed cell. Both walk the index in ascending
//! point-id order and produce identical frames; the batched strategy just
//! trades memory for far fewer reads against remote sources.

use crate::extraction::error::ExtractionError;
use crate::grid::source::GridSource;
use crate::spatial_index::SpatialIndex;
use crate::types::time::YearRange;
use crate::types::variable::ClimateVariable;
use log::debug;
use polars::prelude::*;

/// How cell series are read from the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExtractionStrategy {
    /// One read per indexed point.
    #[default]
    PerPoint,
    /// One read covering the bounding box of all indexed cells.
    Batched,
}

/// Result of extracting a single variable.
#[derive(Debug)]
pub struct VariableOutcome {
    pub variable: ClimateVariable,
    pub result: Result<DataFrame, ExtractionError>,
}

/// Outcomes of an extraction run over several variables.
#[derive(Debug, Default)]
pub struct ExtractionRun {
    pub outcomes: Vec<VariableOutcome>,
}

impl ExtractionRun {
    pub fn successes(&self) -> impl Iterator<Item = (ClimateVariable, &DataFrame)> {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().ok().map(|df| (o.variable, df)))
    }

    pub fn failures(&self) -> impl Iterator<Item = (ClimateVariable, &ExtractionError)> {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().err().map(|e| (o.variable, e)))
    }

    /// Successfully extracted tables, cloned out for downstream merging.
    pub fn tables(&self) -> Vec<(ClimateVariable, DataFrame)> {
        self.successes().map(|(v, df)| (v, df.clone())).collect()
    }
}

/// Extracts one variable's monthly series for every indexed point.
///
/// The resulting frame has one row per point and month in the requested
/// year window, columns `point_id`, `year`, `month` and the variable name.
/// Rows are ordered by point id, then time. Cells the source screens out
/// (fill values, non-finite reads) become nulls.
pub fn extract_variable<S: GridSource>(
    source: &S,
    variable: ClimateVariable,
    index: &SpatialIndex,
    years: YearRange,
    strategy: ExtractionStrategy,
) -> Result<DataFrame, ExtractionError> {
    let time = source.time_axis();
    let window = time.year_window(years);
    let stamps = &time.stamps()[window.clone()];
    let n_months = stamps.len();

    let series = match strategy {
        ExtractionStrategy::PerPoint => {
            let mut all = Vec::with_capacity(index.len());
            for (id, cell) in index.iter() {
                let values = source.read_series(*cell, window.clone())?;
                if values.len() != n_months {
                    return Err(ExtractionError::SeriesLength {
                        variable,
                        point_id: id.clone(),
                        expected: n_months,
                        found: values.len(),
                    });
                }
                all.push(values);
            }
            all
        }
        ExtractionStrategy::Batched => {
            let cells: Vec<_> = index.iter().map(|(_, cell)| *cell).collect();
            let all = source.read_series_batch(&cells, window.clone())?;
            if all.len() != index.len() {
                return Err(ExtractionError::BatchLength {
                    variable,
                    expected: index.len(),
                    found: all.len(),
                });
            }
            for ((id, _), values) in index.iter().zip(&all) {
                if values.len() != n_months {
                    return Err(ExtractionError::SeriesLength {
                        variable,
                        point_id: id.clone(),
                        expected: n_months,
                        found: values.len(),
                    });
                }
            }
            all
        }
    };

    let n_rows = index.len() * n_months;
    let mut ids = Vec::with_capacity(n_rows);
    let mut year_col = Vec::with_capacity(n_rows);
    let mut month_col = Vec::with_capacity(n_rows);
    let mut value_col: Vec<Option<f64>> = Vec::with_capacity(n_rows);

    for ((id, _), values) in index.iter().zip(series) {
        for (stamp, value) in stamps.iter().zip(values) {
            ids.push(id.clone());
            year_col.push(stamp.year);
            month_col.push(stamp.month as i32);
            value_col.push(value);
        }
    }

    debug!(
        "Extracted {} for {} points over {} months",
        variable,
        index.len(),
        n_months
    );

    let df = df!(
        "point_id" => ids,
        "year" => year_col,
        "month" => month_col,
        variable.name() => value_col,
    )?;
    Ok(df)
}
