//! Loads the point catalog from a delimited file and cleans invalid rows.

use crate::catalog::error::CatalogError;
use crate::catalog::point::{Point, PointCatalog};
use log::{info, warn};
use polars::prelude::*;
use std::path::{Path, PathBuf};
use tokio::task;

/// Column names the loader expects. Files with other headers are accepted
/// only by positional fallback, which is logged rather than silently
/// applied.
pub const EXPECTED_COLUMNS: [&str; 3] = ["point_id", "latitude", "longitude"];

/// Reads a catalog CSV into a validated [`PointCatalog`].
///
/// Rows with missing or out-of-range coordinates are dropped (and counted);
/// duplicate ids fail the load. If the expected columns are absent and the
/// file has at least three columns, the first three are renamed
/// positionally to id, latitude, longitude.
pub async fn load_catalog(path: &Path) -> Result<PointCatalog, CatalogError> {
    let path = path.to_path_buf();
    task::spawn_blocking(move || load_catalog_blocking(&path)).await?
}

fn load_catalog_blocking(path: &PathBuf) -> Result<PointCatalog, CatalogError> {
    let mut df = CsvReadOptions::default()
        .with_has_header(true)
        .try_into_reader_with_file_path(Some(path.clone()))
        .map_err(|e| CatalogError::Read(path.clone(), e))?
        .finish()
        .map_err(|e| CatalogError::Read(path.clone(), e))?;

    let names: Vec<String> = df
        .get_column_names_str()
        .iter()
        .map(|s| s.to_string())
        .collect();
    let has_expected = EXPECTED_COLUMNS
        .iter()
        .all(|c| names.iter().any(|n| n == c));

    if !has_expected {
        if df.width() < EXPECTED_COLUMNS.len() {
            return Err(CatalogError::MissingColumns {
                path: path.clone(),
                found: names.join(", "),
            });
        }
        // Positional fallback: first column is the id, then latitude, then
        // longitude. Never applied silently.
        warn!(
            "Catalog columns [{}] do not match {:?}; renaming the first three positionally",
            names.join(", "),
            EXPECTED_COLUMNS
        );
        let mut renamed = names.clone();
        for (i, expected) in EXPECTED_COLUMNS.iter().enumerate() {
            renamed[i] = expected.to_string();
        }
        df.set_column_names(renamed)?;
    }

    let raw_height = df.height();
    let df = df
        .lazy()
        .select([
            col("point_id").cast(DataType::String),
            col("latitude").cast(DataType::Float64),
            col("longitude").cast(DataType::Float64),
        ])
        .filter(
            col("point_id")
                .is_not_null()
                .and(col("latitude").is_not_null())
                .and(col("longitude").is_not_null()),
        )
        .collect()?;

    let dropped = raw_height - df.height();
    if dropped > 0 {
        warn!(
            "Dropped {} catalog rows with a missing id or coordinates",
            dropped
        );
    }

    let ids = df.column("point_id")?.str()?;
    let latitudes = df.column("latitude")?.f64()?;
    let longitudes = df.column("longitude")?.f64()?;

    let mut points = Vec::with_capacity(df.height());
    let mut out_of_range = 0usize;
    for ((id, latitude), longitude) in ids.into_iter().zip(latitudes).zip(longitudes) {
        let (Some(id), Some(latitude), Some(longitude)) = (id, latitude, longitude) else {
            continue;
        };
        let point = Point {
            id: id.to_string(),
            latitude,
            longitude,
        };
        if point.coordinates_in_range() {
            points.push(point);
        } else {
            warn!(
                "Dropping point '{}' with out-of-range coordinates ({}, {})",
                point.id, point.latitude, point.longitude
            );
            out_of_range += 1;
        }
    }
    if out_of_range > 0 {
        warn!("Dropped {} catalog rows with out-of-range coordinates", out_of_range);
    }

    let catalog = PointCatalog::new(points)?;
    info!("Loaded {} points from {:?}", catalog.len(), path);
    Ok(catalog)
}
