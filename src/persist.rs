//! Writes output frames to disk as Parquet and/or CSV.

use polars::prelude::*;
use std::fmt;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;
use tokio::task;

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("Unknown output format '{0}', expected parquet, csv or both")]
    UnknownFormat(String),

    #[error("Failed to create output file {0:?}: {1}")]
    Create(PathBuf, #[source] std::io::Error),

    #[error(transparent)]
    Frame(#[from] PolarsError),

    #[error(transparent)]
    TaskJoin(#[from] tokio::task::JoinError),
}

/// On-disk format for output tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Parquet,
    Csv,
    /// Writes both a Parquet and a CSV file per table.
    Both,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OutputFormat::Parquet => "parquet",
            OutputFormat::Csv => "csv",
            OutputFormat::Both => "both",
        };
        f.write_str(name)
    }
}

impl FromStr for OutputFormat {
    type Err = PersistError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "parquet" => Ok(OutputFormat::Parquet),
            "csv" => Ok(OutputFormat::Csv),
            "both" => Ok(OutputFormat::Both),
            other => Err(PersistError::UnknownFormat(other.to_string())),
        }
    }
}

/// Writes a frame under `directory` as `{stem}.parquet` and/or
/// `{stem}.csv`. Returns the paths written.
pub async fn save_dataframe(
    df: DataFrame,
    directory: &Path,
    stem: &str,
    format: OutputFormat,
) -> Result<Vec<PathBuf>, PersistError> {
    let directory = directory.to_path_buf();
    let stem = stem.to_string();

    task::spawn_blocking(move || {
        let mut df = df;
        let mut written = Vec::new();

        if matches!(format, OutputFormat::Parquet | OutputFormat::Both) {
            let path = directory.join(format!("{stem}.parquet"));
            let file = File::create(&path).map_err(|e| PersistError::Create(path.clone(), e))?;
            ParquetWriter::new(file)
                .with_compression(ParquetCompression::Snappy)
                .finish(&mut df)?;
            written.push(path);
        }
        if matches!(format, OutputFormat::Csv | OutputFormat::Both) {
            let path = directory.join(format!("{stem}.csv"));
            let file = File::create(&path).map_err(|e| PersistError::Create(path.clone(), e))?;
            CsvWriter::new(file).finish(&mut df)?;
            written.push(path);
        }

        Ok(written)
    })
    .await?
}
