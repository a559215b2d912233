//! NetCDF-backed grid source. Compiled only with the `netcdf` cargo feature,
//! which requires libnetcdf on the build host.

use crate::grid::error::GridSourceError;
use crate::grid::source::{GridCell, GridSource};
use crate::types::time::TimeAxis;
use crate::types::variable::ClimateVariable;
use log::info;
use std::ops::Range;
use std::path::{Path, PathBuf};

/// A grid source reading one TerraClimate variable from an opened NetCDF
/// file. Coordinate axes and the time axis are read eagerly at open time;
/// value reads go through the open handle. The handle is released on drop.
pub struct NetcdfGridSource {
    file: netcdf::File,
    path: PathBuf,
    variable: ClimateVariable,
    latitudes: Vec<f64>,
    longitudes: Vec<f64>,
    time: TimeAxis,
    fill_value: Option<f64>,
}

impl NetcdfGridSource {
    /// Opens `path` and reads the `lat`, `lon` and `time` axes. The file is
    /// opened exactly once; every subsequent read is an indexed access on
    /// the already open handle.
    pub fn open(path: &Path, variable: ClimateVariable) -> Result<Self, GridSourceError> {
        let file = netcdf::open(path)
            .map_err(|e| GridSourceError::NetcdfOpen(path.to_path_buf(), e))?;

        let latitudes = read_axis(&file, "lat", path)?;
        let longitudes = read_axis(&file, "lon", path)?;
        let days = read_axis(&file, "time", path)?;
        let time = TimeAxis::from_days_since_1900(&days)?;

        let data_var =
            file.variable(variable.name())
                .ok_or_else(|| GridSourceError::MissingVariable {
                    variable: variable.name().to_string(),
                    path: path.to_path_buf(),
                })?;
        let fill_value = data_var
            .attribute("_FillValue")
            .and_then(|attr| attr.value().ok())
            .and_then(attribute_to_f64);
        drop(data_var);

        info!(
            "Opened {} grid: {} lats x {} lons x {} time points",
            variable,
            latitudes.len(),
            longitudes.len(),
            time.len()
        );

        Ok(Self {
            file,
            path: path.to_path_buf(),
            variable,
            latitudes,
            longitudes,
            time,
            fill_value,
        })
    }

    fn data_variable(&self) -> Result<netcdf::Variable<'_>, GridSourceError> {
        self.file
            .variable(self.variable.name())
            .ok_or_else(|| GridSourceError::MissingVariable {
                variable: self.variable.name().to_string(),
                path: self.path.clone(),
            })
    }

    fn check_bounds(&self, cell: GridCell) -> Result<(), GridSourceError> {
        if cell.row >= self.latitudes.len() || cell.col >= self.longitudes.len() {
            return Err(GridSourceError::CellOutOfBounds {
                cell,
                rows: self.latitudes.len(),
                cols: self.longitudes.len(),
            });
        }
        Ok(())
    }

    fn screen(&self, value: f64) -> Option<f64> {
        if !value.is_finite() {
            return None;
        }
        if let Some(fill) = self.fill_value {
            if value == fill {
                return None;
            }
        }
        Some(value)
    }
}

impl GridSource for NetcdfGridSource {
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
        self.check_bounds(cell)?;
        let var = self.data_variable()?;
        let values = var
            .get_values::<f64, _>((window, cell.row..cell.row + 1, cell.col..cell.col + 1))
            .map_err(|e| GridSourceError::NetcdfRead {
                variable: self.variable.name().to_string(),
                source: e,
            })?;
        Ok(values.into_iter().map(|v| self.screen(v)).collect())
    }

    /// One bounding hyperslab read covering all cells, then per-cell picks
    /// out of the block. Trades memory for a single round trip to the file.
    fn read_series_batch(
        &self,
        cells: &[GridCell],
        window: Range<usize>,
    ) -> Result<Vec<Vec<Option<f64>>>, GridSourceError> {
        if cells.is_empty() {
            return Ok(vec![]);
        }
        for &cell in cells {
            self.check_bounds(cell)?;
        }

        let row_min = cells.iter().map(|c| c.row).min().unwrap_or(0);
        let row_max = cells.iter().map(|c| c.row).max().unwrap_or(0);
        let col_min = cells.iter().map(|c| c.col).min().unwrap_or(0);
        let col_max = cells.iter().map(|c| c.col).max().unwrap_or(0);
        let (n_rows, n_cols) = (row_max - row_min + 1, col_max - col_min + 1);

        let var = self.data_variable()?;
        let block = var
            .get_values::<f64, _>((
                window.clone(),
                row_min..row_max + 1,
                col_min..col_max + 1,
            ))
            .map_err(|e| GridSourceError::NetcdfRead {
                variable: self.variable.name().to_string(),
                source: e,
            })?;

        let n_time = window.len();
        let series = cells
            .iter()
            .map(|cell| {
                (0..n_time)
                    .map(|t| {
                        let flat =
                            (t * n_rows + (cell.row - row_min)) * n_cols + (cell.col - col_min);
                        self.screen(block[flat])
                    })
                    .collect()
            })
            .collect();
        Ok(series)
    }
}

fn read_axis(
    file: &netcdf::File,
    name: &str,
    path: &Path,
) -> Result<Vec<f64>, GridSourceError> {
    let var = file
        .variable(name)
        .ok_or_else(|| GridSourceError::MissingCoordinate {
            name: name.to_string(),
            path: path.to_path_buf(),
        })?;
    var.get_values::<f64, _>(..)
        .map_err(|e| GridSourceError::NetcdfRead {
            variable: name.to_string(),
            source: e,
        })
}

fn attribute_to_f64(value: netcdf::AttributeValue) -> Option<f64> {
    match value {
        netcdf::AttributeValue::Double(v) => Some(v),
        netcdf::AttributeValue::Float(v) => Some(v as f64),
        netcdf::AttributeValue::Int(v) => Some(v as f64),
        netcdf::AttributeValue::Short(v) => Some(v as f64),
        _ => None,
    }
}
