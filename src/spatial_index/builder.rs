//! Nearest-cell matching of catalog points onto a reference grid.
//!
//! Each axis is matched independently: the nearest grid latitude and the
//! nearest grid longitude are found separately, which on a regular grid
//! with resolution well below the tolerance is equivalent to the nearest
//! cell and an order of magnitude cheaper than a 2D search.

use crate::catalog::point::PointCatalog;
use crate::grid::source::{Grid, GridCell};
use crate::spatial_index::SpatialIndex;
use log::{info, warn};
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Default per-axis matching tolerance in degrees: 1/48, half a
/// TerraClimate cell (the grid resolution is 1/24 degree).
pub const DEFAULT_TOLERANCE: f64 = 1.0 / 48.0;

/// A point the builder could not place on the grid: no candidate cell
/// within tolerance on at least one axis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexFailure {
    pub point_id: String,
    pub latitude: f64,
    pub longitude: f64,
}

/// The result of an index build: the mapping plus the failure list. Failed
/// points are absent from the index but never dropped from this list.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexBuildOutcome {
    pub index: SpatialIndex,
    pub failures: Vec<IndexFailure>,
}

/// Builds the spatial index for every catalog point in one O(P * (Glat +
/// Glon)) pass over the grid axes.
pub fn build_index(catalog: &PointCatalog, grid: &Grid, tolerance: f64) -> IndexBuildOutcome {
    let mut entries = BTreeMap::new();
    let mut failures = Vec::new();

    for point in catalog.points() {
        let row = nearest_within(grid.latitudes(), point.latitude, tolerance);
        let col = nearest_within(grid.longitudes(), point.longitude, tolerance);
        match (row, col) {
            (Some(row), Some(col)) => {
                entries.insert(point.id.clone(), GridCell { row, col });
            }
            _ => {
                warn!(
                    "No grid cell within {} deg of point '{}' at ({}, {})",
                    tolerance, point.id, point.latitude, point.longitude
                );
                failures.push(IndexFailure {
                    point_id: point.id.clone(),
                    latitude: point.latitude,
                    longitude: point.longitude,
                });
            }
        }
    }

    info!(
        "Indexed {} of {} points ({} failures)",
        entries.len(),
        catalog.len(),
        failures.len()
    );

    IndexBuildOutcome {
        index: SpatialIndex::from_entries(entries),
        failures,
    }
}

/// The index of the axis value nearest to `target`, among values within
/// `tolerance`. Ties resolve to the first minimal index in axis order; this
/// is a contract, not an accident of iteration.
fn nearest_within(axis: &[f64], target: f64, tolerance: f64) -> Option<usize> {
    axis.iter()
        .enumerate()
        .filter(|(_, value)| (*value - target).abs() < tolerance)
        .min_by_key(|(_, value)| OrderedFloat((*value - target).abs()))
        .map(|(i, _)| i)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::point::Point;

    fn axis(start: f64, step: f64, n: usize) -> Vec<f64> {
        (0..n).map(|i| start + step * i as f64).collect()
    }

    fn catalog(points: &[(&str, f64, f64)]) -> PointCatalog {
        PointCatalog::new(
            points
                .iter()
                .map(|(id, latitude, longitude)| Point {
                    id: id.to_string(),
                    latitude: *latitude,
                    longitude: *longitude,
                })
                .collect(),
        )
        .unwrap()
    }

    // A 1/24-degree grid patch like TerraClimate's, centered near (48, 9).
    fn test_grid() -> Grid {
        Grid::new(axis(47.0, 1.0 / 24.0, 48), axis(8.0, 1.0 / 24.0, 48))
    }

    #[test]
    fn matched_cell_is_within_tolerance_on_both_axes() {
        let grid = test_grid();
        let catalog = catalog(&[("a", 47.51, 8.49), ("b", 47.0, 8.0)]);
        let outcome = build_index(&catalog, &grid, DEFAULT_TOLERANCE);
        assert!(outcome.failures.is_empty());
        for point in catalog.points() {
            let cell = outcome.index.cell(&point.id).unwrap();
            let cell_lat = grid.latitudes()[cell.row];
            let cell_lon = grid.longitudes()[cell.col];
            assert!((cell_lat - point.latitude).abs() < DEFAULT_TOLERANCE);
            assert!((cell_lon - point.longitude).abs() < DEFAULT_TOLERANCE);
        }
    }

    #[test]
    fn matched_cell_is_axis_minimal() {
        let grid = test_grid();
        let point = ("a", 47.26, 8.74);
        let outcome = build_index(&catalog(&[point]), &grid, DEFAULT_TOLERANCE);
        let cell = outcome.index.cell("a").unwrap();
        for (row, lat) in grid.latitudes().iter().enumerate() {
            assert!(
                (grid.latitudes()[cell.row] - point.1).abs() <= (lat - point.1).abs()
                    || row == cell.row
            );
        }
        for (col, lon) in grid.longitudes().iter().enumerate() {
            assert!(
                (grid.longitudes()[cell.col] - point.2).abs() <= (lon - point.2).abs()
                    || col == cell.col
            );
        }
    }

    #[test]
    fn point_outside_tolerance_fails_and_is_recorded() {
        let grid = test_grid();
        // Well inside the grid for latitude, far off it for longitude.
        let outcome = build_index(&catalog(&[("far", 47.5, 30.0)]), &grid, DEFAULT_TOLERANCE);
        assert!(outcome.index.is_empty());
        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.failures[0].point_id, "far");
        assert_eq!(outcome.failures[0].longitude, 30.0);
    }

    #[test]
    fn failing_one_axis_fails_the_point() {
        let grid = test_grid();
        let outcome = build_index(&catalog(&[("a", 60.0, 8.5)]), &grid, DEFAULT_TOLERANCE);
        assert!(!outcome.index.contains("a"));
        assert_eq!(outcome.failures.len(), 1);
    }

    #[test]
    fn rebuild_is_idempotent() {
        let grid = test_grid();
        let catalog = catalog(&[("a", 47.1, 8.2), ("b", 47.9, 9.3), ("far", 0.0, 0.0)]);
        let first = build_index(&catalog, &grid, DEFAULT_TOLERANCE);
        let second = build_index(&catalog, &grid, DEFAULT_TOLERANCE);
        assert_eq!(first.index, second.index);
        assert_eq!(first.failures, second.failures);
    }

    #[test]
    fn equidistant_tie_resolves_to_first_index() {
        // Target exactly between axis values 1.0 and 2.0.
        let grid = Grid::new(vec![1.0, 2.0], vec![1.0, 2.0]);
        let outcome = build_index(&catalog(&[("mid", 1.5, 1.5)]), &grid, 1.0);
        let cell = outcome.index.cell("mid").unwrap();
        assert_eq!(cell, GridCell { row: 0, col: 0 });
    }
}
