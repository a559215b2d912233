use crate::grid::source::GridCell;
use crate::types::variable::ClimateVariable;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GridSourceError {
    #[error("Network request failed for {0}")]
    NetworkRequest(String, #[source] reqwest::Error),

    #[error("HTTP request failed for {url} with status {status}")]
    HttpStatus {
        url: String,
        status: reqwest::StatusCode,
        #[source]
        source: reqwest::Error,
    },

    // Covers errors during download stream processing and file writes
    #[error("Grid download failed")]
    DownloadIo(#[from] std::io::Error),

    #[error("Response from {url} is not a NetCDF payload")]
    UnrecognizedPayload { url: String },

    #[error("No grid source available for variable '{variable}'")]
    SourceUnavailable { variable: ClimateVariable },

    #[error("Variable '{variable}' not found in grid file {path:?}")]
    MissingVariable { variable: String, path: PathBuf },

    #[error("Coordinate axis '{name}' not found in grid file {path:?}")]
    MissingCoordinate { name: String, path: PathBuf },

    #[error("Cannot decode time coordinate value {value}")]
    TimeDecode { value: f64 },

    #[error("Cell ({row}, {col}) out of bounds for a {rows} x {cols} grid", row = .cell.row, col = .cell.col)]
    CellOutOfBounds {
        cell: GridCell,
        rows: usize,
        cols: usize,
    },

    #[error("Grid value buffer has {found} values, expected {expected}")]
    ShapeMismatch { expected: usize, found: usize },

    #[cfg(feature = "netcdf")]
    #[error("Failed to open NetCDF file {0:?}")]
    NetcdfOpen(PathBuf, #[source] netcdf::Error),

    #[cfg(feature = "netcdf")]
    #[error("Failed to read '{variable}' from NetCDF file")]
    NetcdfRead {
        variable: String,
        #[source]
        source: netcdf::Error,
    },
}
