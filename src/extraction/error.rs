use crate::grid::error::GridSourceError;
use crate::types::variable::ClimateVariable;
use polars::error::PolarsError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error(transparent)]
    Grid(#[from] GridSourceError),

    #[error(transparent)]
    Frame(#[from] PolarsError),

    #[error("Series for {variable} at point '{point_id}' has {found} values, expected {expected}")]
    SeriesLength {
        variable: ClimateVariable,
        point_id: String,
        expected: usize,
        found: usize,
    },

    #[error("Batched read for {variable} returned {found} series, expected {expected}")]
    BatchLength {
        variable: ClimateVariable,
        expected: usize,
        found: usize,
    },
}
