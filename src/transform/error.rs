use polars::error::PolarsError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransformError {
    #[error("No extracted tables to merge")]
    NoTables,

    #[error("Unknown aggregation '{0}', expected summary, annual, seasonal or monthly")]
    UnknownAggregation(String),

    #[error(transparent)]
    Frame(#[from] PolarsError),
}
