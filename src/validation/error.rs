use crate::types::variable::ClimateVariable;
use polars::error::PolarsError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error(transparent)]
    Frame(#[from] PolarsError),

    #[error("Table for {variable} is missing column '{column}'")]
    MissingColumn {
        variable: ClimateVariable,
        column: String,
    },

    #[error("Failed to serialize validation report: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to write validation report to {0:?}: {1}")]
    Io(PathBuf, #[source] std::io::Error),
}
