use crate::catalog::error::CatalogError;
use crate::extraction::error::ExtractionError;
use crate::grid::error::GridSourceError;
use crate::persist::PersistError;
use crate::spatial_index::error::SpatialIndexError;
use crate::transform::error::TransformError;
use crate::validation::error::ValidationError;
use std::path::PathBuf;
use thiserror::Error;

/// Top-level error for every client operation.
#[derive(Debug, Error)]
pub enum TerraClimError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    SpatialIndex(#[from] SpatialIndexError),

    #[error(transparent)]
    GridSource(#[from] GridSourceError),

    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    #[error(transparent)]
    Transform(#[from] TransformError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Persist(#[from] PersistError),

    #[error("Failed to create cache directory {0:?}: {1}")]
    CacheDirCreation(PathBuf, #[source] std::io::Error),

    #[error("Failed to resolve a cache directory: {0}")]
    CacheDirResolution(#[source] std::io::Error),

    #[error("All {attempted} variables failed to extract")]
    NoVariablesExtracted { attempted: usize },
}
