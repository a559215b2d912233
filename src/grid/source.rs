//! The read interface over a gridded climate source: coordinate axes, the
//! shared time axis, and indexed per-cell reads across time.

use crate::grid::error::GridSourceError;
use crate::types::time::TimeAxis;
use crate::types::variable::ClimateVariable;
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// A cell on a regular lat/lon grid: `row` indexes the latitude axis,
/// `col` the longitude axis.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct GridCell {
    pub row: usize,
    pub col: usize,
}

/// The coordinate mesh of a gridded source: ordered latitude values and
/// ordered longitude values. Immutable once read from a source.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    latitudes: Vec<f64>,
    longitudes: Vec<f64>,
}

impl Grid {
    pub fn new(latitudes: Vec<f64>, longitudes: Vec<f64>) -> Self {
        Self {
            latitudes,
            longitudes,
        }
    }

    pub fn latitudes(&self) -> &[f64] {
        &self.latitudes
    }

    pub fn longitudes(&self) -> &[f64] {
        &self.longitudes
    }

    pub fn n_rows(&self) -> usize {
        self.latitudes.len()
    }

    pub fn n_cols(&self) -> usize {
        self.longitudes.len()
    }
}

/// An opened grid source for one climate variable.
///
/// Implementations expose the coordinate axes, the monthly time axis, and
/// indexed read access to the variable's values at a cell across a time
/// window. Missing data surfaces as `None`. Sources close whatever handle
/// they hold on drop, so holding one in a scope guarantees release on every
/// exit path.
pub trait GridSource {
    fn latitudes(&self) -> &[f64];

    fn longitudes(&self) -> &[f64];

    fn time_axis(&self) -> &TimeAxis;

    /// Reads the full time series at `cell`, restricted to `window` on the
    /// time axis. The result has exactly `window.len()` entries.
    fn read_series(
        &self,
        cell: GridCell,
        window: Range<usize>,
    ) -> Result<Vec<Option<f64>>, GridSourceError>;

    /// Reads the series for several cells in one call. The default issues
    /// one indexed read per cell; implementations backed by block storage
    /// may override this with a single bounding read. Results must match
    /// [`GridSource::read_series`] value for value, in `cells` order.
    fn read_series_batch(
        &self,
        cells: &[GridCell],
        window: Range<usize>,
    ) -> Result<Vec<Vec<Option<f64>>>, GridSourceError> {
        cells
            .iter()
            .map(|&cell| self.read_series(cell, window.clone()))
            .collect()
    }

    /// The coordinate mesh, copied out of the source so it outlives the
    /// open handle.
    fn grid(&self) -> Grid {
        Grid::new(self.latitudes().to_vec(), self.longitudes().to_vec())
    }
}

/// Opens a [`GridSource`] for a given variable. The extractor opens one
/// source per variable per run, drains it for all indexed points, and drops
/// it before moving on.
pub trait GridProvider {
    type Source: GridSource;

    fn open(&self, variable: ClimateVariable) -> Result<Self::Source, GridSourceError>;
}
