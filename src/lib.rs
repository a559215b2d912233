mod catalog;
mod error;
mod extraction;
mod grid;
mod persist;
mod spatial_index;
mod terraclim;
mod transform;
mod types;
mod utils;
mod validation;

pub use error::TerraClimError;
pub use terraclim::*;

pub use catalog::error::CatalogError;
pub use catalog::loader::*;
pub use catalog::point::*;

pub use types::time::*;
pub use types::variable::*;

pub use grid::download::*;
pub use grid::error::GridSourceError;
pub use grid::memory::*;
#[cfg(feature = "netcdf")]
pub use grid::netcdf_source::*;
pub use grid::source::*;

pub use spatial_index::builder::*;
pub use spatial_index::cache::*;
pub use spatial_index::error::SpatialIndexError;
pub use spatial_index::SpatialIndex;

pub use extraction::error::ExtractionError;
pub use extraction::extractor::*;

pub use transform::aggregate::*;
pub use transform::derived::*;
pub use transform::error::TransformError;
pub use transform::merge::*;

pub use validation::checks::*;
pub use validation::error::ValidationError;
pub use validation::report::*;

pub use persist::*;
