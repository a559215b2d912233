//! In-memory grid source, for locally materialized data and tests.

use crate::grid::error::GridSourceError;
use crate::grid::source::{GridCell, GridProvider, GridSource};
use crate::types::time::TimeAxis;
use crate::types::variable::ClimateVariable;
use std::collections::HashMap;
use std::ops::Range;

/// A grid source holding all values in memory, shaped (time, lat, lon).
#[derive(Debug, Clone)]
pub struct MemoryGridSource {
    latitudes: Vec<f64>,
    longitudes: Vec<f64>,
    time: TimeAxis,
    values: Vec<Option<f64>>,
}

impl MemoryGridSource {
    /// Builds a source from a flat value buffer in (time, lat, lon) row-major
    /// order. Fails if the buffer size does not match the axes.
    pub fn new(
        latitudes: Vec<f64>,
        longitudes: Vec<f64>,
        time: TimeAxis,
        values: Vec<Option<f64>>,
    ) -> Result<Self, GridSourceError> {
        let expected = time.len() * latitudes.len() * longitudes.len();
        if values.len() != expected {
            return Err(GridSourceError::ShapeMismatch {
                expected,
                found: values.len(),
            });
        }
        Ok(Self {
            latitudes,
            longitudes,
            time,
            values,
        })
    }

    /// Builds a source by evaluating `value` at every (time, row, col).
    pub fn from_fn(
        latitudes: Vec<f64>,
        longitudes: Vec<f64>,
        time: TimeAxis,
        value: impl Fn(usize, usize, usize) -> Option<f64>,
    ) -> Self {
        let (n_rows, n_cols) = (latitudes.len(), longitudes.len());
        let mut values = Vec::with_capacity(time.len() * n_rows * n_cols);
        for t in 0..time.len() {
            for row in 0..n_rows {
                for col in 0..n_cols {
                    values.push(value(t, row, col));
                }
            }
        }
        Self {
            latitudes,
            longitudes,
            time,
            values,
        }
    }

    fn flat_index(&self, t: usize, cell: GridCell) -> usize {
        (t * self.latitudes.len() + cell.row) * self.longitudes.len() + cell.col
    }
}

impl GridSource for MemoryGridSource {
    fn latitudes(&self) -> &[f64] {
        &self.latitudes
    }

    fn longitudes(&self) -> &[f64] {
        &self.longitudes
    }

    fn time_axis(&self) -> &TimeAxis {
        &self.time
    }

    fn read_series(
        &self,
        cell: GridCell,
        window: Range<usize>,
    ) -> Result<Vec<Option<f64>>, GridSourceError> {
        if cell.row >= self.latitudes.len() || cell.col >= self.longitudes.len() {
            return Err(GridSourceError::CellOutOfBounds {
                cell,
                rows: self.latitudes.len(),
                cols: self.longitudes.len(),
            });
        }
        Ok(window.map(|t| self.values[self.flat_index(t, cell)]).collect())
    }

    /// Copies one bounding block covering all cells, then picks each cell's
    /// series out of the block, the same access pattern a block-storage
    /// source uses for a hyperslab read.
    fn read_series_batch(
        &self,
        cells: &[GridCell],
        window: Range<usize>,
    ) -> Result<Vec<Vec<Option<f64>>>, GridSourceError> {
        if cells.is_empty() {
            return Ok(vec![]);
        }
        for &cell in cells {
            if cell.row >= self.latitudes.len() || cell.col >= self.longitudes.len() {
                return Err(GridSourceError::CellOutOfBounds {
                    cell,
                    rows: self.latitudes.len(),
                    cols: self.longitudes.len(),
                });
            }
        }

        let row_min = cells.iter().map(|c| c.row).min().unwrap_or(0);
        let row_max = cells.iter().map(|c| c.row).max().unwrap_or(0);
        let col_min = cells.iter().map(|c| c.col).min().unwrap_or(0);
        let col_max = cells.iter().map(|c| c.col).max().unwrap_or(0);
        let (n_rows, n_cols) = (row_max - row_min + 1, col_max - col_min + 1);

        let mut block = Vec::with_capacity(window.len() * n_rows * n_cols);
        for t in window.clone() {
            for row in row_min..=row_max {
                for col in col_min..=col_max {
                    block.push(self.values[self.flat_index(t, GridCell { row, col })]);
                }
            }
        }

        let n_time = window.len();
        let series = cells
            .iter()
            .map(|cell| {
                (0..n_time)
                    .map(|t| {
                        let flat =
                            (t * n_rows + (cell.row - row_min)) * n_cols + (cell.col - col_min);
                        block[flat]
                    })
                    .collect()
            })
            .collect();
        Ok(series)
    }
}

/// A [`GridProvider`] over pre-built in-memory sources, one per variable.
#[derive(Debug, Default)]
pub struct MemoryProvider {
    sources: HashMap<ClimateVariable, MemoryGridSource>,
}

impl MemoryProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, variable: ClimateVariable, source: MemoryGridSource) {
        self.sources.insert(variable, source);
    }
}

impl GridProvider for MemoryProvider {
    type Source = MemoryGridSource;

    fn open(&self, variable: ClimateVariable) -> Result<Self::Source, GridSourceError> {
        self.sources
            .get(&variable)
            .cloned()
            .ok_or(GridSourceError::SourceUnavailable { variable })
    }
}
