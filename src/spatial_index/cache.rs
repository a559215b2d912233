//! Persisted form of the spatial index.
//!
//! The artifact is versioned and keyed by a fingerprint of the catalog, the
//! grid axes and the tolerance, so a cache built against different inputs is
//! detected as stale and rebuilt instead of silently reused. The failure
//! list is stored alongside the mapping, so a cache hit reproduces the full
//! build outcome.

use crate::catalog::point::PointCatalog;
use crate::grid::source::Grid;
use crate::spatial_index::builder::{IndexBuildOutcome, IndexFailure};
use crate::spatial_index::error::SpatialIndexError;
use crate::spatial_index::SpatialIndex;
use bincode::config::{Configuration, Fixint, LittleEndian};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};
use tokio::task;

const CACHE_FILE_NAME: &str = "spatial_index.bin";
const CACHE_FORMAT_VERSION: u32 = 1;
const BINCODE_CONFIG: Configuration<LittleEndian, Fixint> =
    bincode::config::standard().with_fixed_int_encoding();

#[derive(Debug, Serialize, Deserialize)]
struct CachedIndex {
    version: u32,
    fingerprint: u64,
    index: SpatialIndex,
    failures: Vec<IndexFailure>,
}

/// Fingerprint of the inputs an index was built from. Coordinates are
/// hashed by bit pattern, so any change to the catalog, the grid axes or
/// the tolerance produces a different key.
pub fn index_fingerprint(catalog: &PointCatalog, grid: &Grid, tolerance: f64) -> u64 {
    let mut hasher = DefaultHasher::new();
    for point in catalog.points() {
        point.id.hash(&mut hasher);
        point.latitude.to_bits().hash(&mut hasher);
        point.longitude.to_bits().hash(&mut hasher);
    }
    for value in grid.latitudes() {
        value.to_bits().hash(&mut hasher);
    }
    for value in grid.longitudes() {
        value.to_bits().hash(&mut hasher);
    }
    tolerance.to_bits().hash(&mut hasher);
    hasher.finish()
}

/// Reads and writes the persisted spatial index in a cache directory.
pub struct IndexCache {
    path: PathBuf,
}

impl IndexCache {
    pub fn new(cache_dir: &Path) -> Self {
        Self {
            path: cache_dir.join(CACHE_FILE_NAME),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the cached build outcome, or `None` if no cache exists or the
    /// cached artifact was built from different inputs.
    pub async fn load(
        &self,
        fingerprint: u64,
    ) -> Result<Option<IndexBuildOutcome>, SpatialIndexError> {
        if tokio::fs::metadata(&self.path).await.is_err() {
            return Ok(None);
        }
        let path = self.path.clone();
        let cached = task::spawn_blocking(move || read_cached(&path)).await??;

        if cached.version != CACHE_FORMAT_VERSION {
            warn!(
                "Index cache at {:?} has format version {}, expected {}; rebuilding",
                self.path, cached.version, CACHE_FORMAT_VERSION
            );
            return Ok(None);
        }
        if cached.fingerprint != fingerprint {
            warn!(
                "Index cache at {:?} is stale (catalog, grid or tolerance changed); rebuilding",
                self.path
            );
            return Ok(None);
        }

        info!(
            "Loaded spatial index for {} points from cache {:?}",
            cached.index.len(),
            self.path
        );
        Ok(Some(IndexBuildOutcome {
            index: cached.index,
            failures: cached.failures,
        }))
    }

    /// Persists a build outcome under the given fingerprint.
    pub async fn store(
        &self,
        outcome: &IndexBuildOutcome,
        fingerprint: u64,
    ) -> Result<(), SpatialIndexError> {
        let record = CachedIndex {
            version: CACHE_FORMAT_VERSION,
            fingerprint,
            index: outcome.index.clone(),
            failures: outcome.failures.clone(),
        };
        let bytes = task::spawn_blocking(move || {
            bincode::serde::encode_to_vec(record, BINCODE_CONFIG)
                .map_err(|e| SpatialIndexError::CacheEncode(Box::new(e)))
        })
        .await??;

        tokio::fs::write(&self.path, &bytes)
            .await
            .map_err(|e| SpatialIndexError::CacheWrite(self.path.clone(), e))?;
        info!(
            "Wrote spatial index cache ({} bytes) to {:?}",
            bytes.len(),
            self.path
        );
        Ok(())
    }
}

fn read_cached(path: &Path) -> Result<CachedIndex, SpatialIndexError> {
    let bytes = std::fs::read(path)
        .map_err(|e| SpatialIndexError::CacheRead(path.to_path_buf(), e))?;
    let (cached, _) = bincode::serde::decode_from_slice::<CachedIndex, _>(&bytes, BINCODE_CONFIG)
        .map_err(|e| SpatialIndexError::CacheDecode(path.to_path_buf(), Box::from(e)))?;
    Ok(cached)
}
