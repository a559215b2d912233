//! The shared monthly time axis of a gridded source, plus the year-range
//! filter applied before extraction.

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::ops::Range;

use crate::grid::error::GridSourceError;

/// One month on the time axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeStamp {
    pub year: i32,
    /// 1-based month.
    pub month: u32,
}

/// An inclusive year range with optional bounds. `None` on either side means
/// unbounded on that side.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearRange {
    pub start: Option<i32>,
    pub end: Option<i32>,
}

impl YearRange {
    pub fn new(start: Option<i32>, end: Option<i32>) -> Self {
        Self { start, end }
    }
}

/// The ordered sequence of monthly time stamps of a grid source.
///
/// All variables of a source share the same axis; it is read once per
/// extraction and truncated to the requested year range before any point
/// data is touched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeAxis {
    stamps: Vec<TimeStamp>,
}

impl TimeAxis {
    pub fn new(stamps: Vec<TimeStamp>) -> Self {
        Self { stamps }
    }

    /// A contiguous monthly axis starting at January of `start_year`.
    pub fn monthly(start_year: i32, months: usize) -> Self {
        let stamps = (0..months)
            .map(|i| TimeStamp {
                year: start_year + (i / 12) as i32,
                month: (i % 12) as u32 + 1,
            })
            .collect();
        Self { stamps }
    }

    /// Decodes a CF-style time coordinate with units "days since 1900-01-01",
    /// the encoding used by the TerraClimate aggregated files.
    pub fn from_days_since_1900(days: &[f64]) -> Result<Self, GridSourceError> {
        let base = NaiveDate::from_ymd_opt(1900, 1, 1).expect("valid base date");
        let stamps = days
            .iter()
            .map(|&value| {
                if !value.is_finite() {
                    return Err(GridSourceError::TimeDecode { value });
                }
                base.checked_add_signed(Duration::days(value.round() as i64))
                    .map(|date| TimeStamp {
                        year: date.year(),
                        month: date.month(),
                    })
                    .ok_or(GridSourceError::TimeDecode { value })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { stamps })
    }

    pub fn stamps(&self) -> &[TimeStamp] {
        &self.stamps
    }

    pub fn len(&self) -> usize {
        self.stamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stamps.is_empty()
    }

    /// The index window covering `years` on this axis. Assumes the axis is
    /// sorted ascending by (year, month), which holds for all TerraClimate
    /// sources.
    pub fn year_window(&self, years: YearRange) -> Range<usize> {
        let lo = match years.start {
            Some(year) => self.stamps.partition_point(|t| t.year < year),
            None => 0,
        };
        let hi = match years.end {
            Some(year) => self.stamps.partition_point(|t| t.year <= year),
            None => self.stamps.len(),
        };
        lo..hi.max(lo)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn monthly_axis_wraps_years() {
        let axis = TimeAxis::monthly(1999, 14);
        assert_eq!(axis.len(), 14);
        assert_eq!(axis.stamps()[0], TimeStamp { year: 1999, month: 1 });
        assert_eq!(axis.stamps()[11], TimeStamp { year: 1999, month: 12 });
        assert_eq!(axis.stamps()[12], TimeStamp { year: 2000, month: 1 });
    }

    #[test]
    fn decodes_days_since_1900() {
        // 1900-01-01, 1900-02-15, 1958-01-01 (21184 days after the base).
        let axis = TimeAxis::from_days_since_1900(&[0.0, 45.0, 21184.0]).unwrap();
        assert_eq!(axis.stamps()[0], TimeStamp { year: 1900, month: 1 });
        assert_eq!(axis.stamps()[1], TimeStamp { year: 1900, month: 2 });
        assert_eq!(axis.stamps()[2], TimeStamp { year: 1958, month: 1 });
    }

    #[test]
    fn non_finite_time_value_is_an_error() {
        assert!(TimeAxis::from_days_since_1900(&[f64::NAN]).is_err());
    }

    #[test]
    fn year_window_truncates_both_ends() {
        let axis = TimeAxis::monthly(2000, 48); // 2000..=2003
        assert_eq!(axis.year_window(YearRange::default()), 0..48);
        assert_eq!(axis.year_window(YearRange::new(Some(2001), None)), 12..48);
        assert_eq!(axis.year_window(YearRange::new(None, Some(2001))), 0..24);
        assert_eq!(
            axis.year_window(YearRange::new(Some(2001), Some(2002))),
            12..36
        );
        // A range outside the axis yields an empty window.
        assert!(axis.year_window(YearRange::new(Some(2050), None)).is_empty());
    }
}
