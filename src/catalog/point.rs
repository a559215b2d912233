//! Geolocated sample points and the validated catalog they form.

use crate::catalog::error::CatalogError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A geolocated sample with a unique identifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub id: String,
    /// Degrees, in [-90, 90].
    pub latitude: f64,
    /// Degrees, in [-180, 180].
    pub longitude: f64,
}

impl Point {
    pub fn coordinates_in_range(&self) -> bool {
        (-90.0..=90.0).contains(&self.latitude) && (-180.0..=180.0).contains(&self.longitude)
    }
}

/// A validated set of sample points. Ids are unique and every coordinate is
/// within range; cleaning of raw input happens in the loader, this
/// constructor rejects what remains invalid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointCatalog {
    points: Vec<Point>,
}

impl PointCatalog {
    pub fn new(points: Vec<Point>) -> Result<Self, CatalogError> {
        let mut seen = BTreeSet::new();
        for point in &points {
            if !seen.insert(point.id.as_str()) {
                return Err(CatalogError::DuplicateId(point.id.clone()));
            }
            if !point.coordinates_in_range() {
                return Err(CatalogError::CoordinateOutOfRange {
                    id: point.id.clone(),
                    latitude: point.latitude,
                    longitude: point.longitude,
                });
            }
        }
        Ok(Self { points })
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(id: &str, latitude: f64, longitude: f64) -> Point {
        Point {
            id: id.to_string(),
            latitude,
            longitude,
        }
    }

    #[test]
    fn accepts_unique_in_range_points() {
        let catalog =
            PointCatalog::new(vec![point("a", 52.0, 13.4), point("b", -33.8, 151.2)]).unwrap();
        assert_eq!(catalog.len(), 2);
    }

    #[test]
    fn rejects_duplicate_ids() {
        let err =
            PointCatalog::new(vec![point("a", 1.0, 2.0), point("a", 3.0, 4.0)]).unwrap_err();
        assert!(matches!(err, CatalogError::DuplicateId(id) if id == "a"));
    }

    #[test]
    fn rejects_out_of_range_coordinates() {
        let err = PointCatalog::new(vec![point("a", 91.0, 0.0)]).unwrap_err();
        assert!(matches!(err, CatalogError::CoordinateOutOfRange { .. }));
    }
}
