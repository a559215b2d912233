pub mod builder;
pub mod cache;
pub mod error;

use crate::grid::source::GridCell;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The mapping from point id to grid cell, computed once per catalog + grid
/// and reused across every variable sharing that grid.
///
/// Construction goes through [`builder::build_index`] (or the cache); the
/// mapping is read-only afterward. Iteration order is ascending by point id,
/// which both extraction strategies rely on for identical row order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpatialIndex {
    entries: BTreeMap<String, GridCell>,
}

impl SpatialIndex {
    pub(crate) fn from_entries(entries: BTreeMap<String, GridCell>) -> Self {
        Self { entries }
    }

    /// The cell assigned to a point, if the point was indexed.
    pub fn cell(&self, point_id: &str) -> Option<GridCell> {
        self.entries.get(point_id).copied()
    }

    pub fn contains(&self, point_id: &str) -> bool {
        self.entries.contains_key(point_id)
    }

    /// Entries in ascending point-id order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &GridCell)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
