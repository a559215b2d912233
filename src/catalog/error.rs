use polars::error::PolarsError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Failed to read point catalog {0:?}")]
    Read(PathBuf, #[source] PolarsError),

    #[error("Point catalog {path:?} has columns [{found}], expected at least id, latitude and longitude")]
    MissingColumns { path: PathBuf, found: String },

    #[error("Failed processing catalog DataFrame: {0}")]
    Frame(#[from] PolarsError),

    #[error("Duplicate point id '{0}' in catalog")]
    DuplicateId(String),

    #[error("Point '{id}' has out-of-range coordinates ({latitude}, {longitude})")]
    CoordinateOutOfRange {
        id: String,
        latitude: f64,
        longitude: f64,
    },

    #[error("Background task failed to complete")]
    TaskJoin(#[from] tokio::task::JoinError),
}
