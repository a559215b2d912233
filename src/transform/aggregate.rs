//! Aggregation of the wide monthly frame into coarser summaries.

use crate::transform::error::TransformError;
use log::debug;
use polars::prelude::*;
use std::fmt;
use std::str::FromStr;

/// Granularity of an aggregated output table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Aggregation {
    /// One row per point over the whole record.
    Summary,
    /// One row per point and year.
    Annual,
    /// One row per point, year and meteorological season.
    Seasonal,
    /// No aggregation, one row per point, year and month.
    Monthly,
}

impl Aggregation {
    pub const ALL: [Aggregation; 4] = [
        Aggregation::Summary,
        Aggregation::Annual,
        Aggregation::Seasonal,
        Aggregation::Monthly,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Aggregation::Summary => "summary",
            Aggregation::Annual => "annual",
            Aggregation::Seasonal => "seasonal",
            Aggregation::Monthly => "monthly",
        }
    }
}

impl fmt::Display for Aggregation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Aggregation {
    type Err = TransformError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "summary" => Ok(Aggregation::Summary),
            "annual" => Ok(Aggregation::Annual),
            "seasonal" => Ok(Aggregation::Seasonal),
            "monthly" => Ok(Aggregation::Monthly),
            other => Err(TransformError::UnknownAggregation(other.to_string())),
        }
    }
}

/// Maps the `month` column onto meteorological seasons. December rolls
/// into the following winter.
fn season_expr() -> Expr {
    when(col("month").eq(lit(12)).or(col("month").lt_eq(lit(2))))
        .then(lit("Winter"))
        .when(col("month").lt_eq(lit(5)))
        .then(lit("Spring"))
        .when(col("month").lt_eq(lit(8)))
        .then(lit("Summer"))
        .otherwise(lit("Fall"))
        .alias("season")
}

/// Columns that carry values rather than keys.
fn value_columns(df: &DataFrame) -> Vec<String> {
    df.get_column_names_str()
        .iter()
        .filter(|name| !matches!(**name, "point_id" | "year" | "month" | "season"))
        .map(|name| name.to_string())
        .collect()
}

/// Mean, std, min, max and median per value column, each aliased
/// `{column}_{stat}`.
fn stat_exprs(value_columns: &[String]) -> Vec<Expr> {
    let mut exprs = Vec::with_capacity(value_columns.len() * 5);
    for name in value_columns {
        exprs.push(col(name).mean().alias(format!("{name}_mean")));
        exprs.push(col(name).std(1).alias(format!("{name}_std")));
        exprs.push(col(name).min().alias(format!("{name}_min")));
        exprs.push(col(name).max().alias(format!("{name}_max")));
        exprs.push(col(name).median().alias(format!("{name}_median")));
    }
    exprs
}

/// Aggregates the wide monthly frame to the requested granularity.
///
/// Every value column is reduced with mean, std (sample), min, max and
/// median. Nulls are skipped by each statistic, so a point with gaps still
/// aggregates over the months it has. `Monthly` leaves rows as they are.
/// Output is sorted by its group keys.
pub fn aggregate(df: &DataFrame, aggregation: Aggregation) -> Result<DataFrame, TransformError> {
    let lazy = df.clone().lazy();
    if aggregation == Aggregation::Monthly {
        let df = lazy
            .sort(["point_id", "year", "month"], SortMultipleOptions::default())
            .collect()?;
        return Ok(df);
    }

    let values = value_columns(df);
    let stats = stat_exprs(&values);
    debug!("Aggregating {} value columns to {aggregation}", values.len());

    let (grouped, keys): (LazyFrame, &[&str]) = match aggregation {
        Aggregation::Summary => (lazy.group_by([col("point_id")]).agg(stats), &["point_id"]),
        Aggregation::Annual => (
            lazy.group_by([col("point_id"), col("year")]).agg(stats),
            &["point_id", "year"],
        ),
        Aggregation::Seasonal => (
            lazy.with_column(season_expr())
                .group_by([col("point_id"), col("year"), col("season")])
                .agg(stats),
            &["point_id", "year", "season"],
        ),
        Aggregation::Monthly => unreachable!("handled above"),
    };

    let df = grouped
        .sort(keys.to_vec(), SortMultipleOptions::default())
        .collect()?;
    Ok(df)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame() -> DataFrame {
        df!(
            "point_id" => ["a", "a", "a", "a"],
            "year" => [2000i32, 2000, 2001, 2001],
            "month" => [1i32, 7, 1, 7],
            "ppt" => [1.0, 2.0, 3.0, 4.0],
        )
        .unwrap()
    }

    fn single(df: &DataFrame, name: &str) -> f64 {
        df.column(name).unwrap().f64().unwrap().get(0).unwrap()
    }

    #[test]
    fn summary_reduces_to_one_row_per_point() {
        let out = aggregate(&frame(), Aggregation::Summary).unwrap();

        assert_eq!(out.height(), 1);
        assert_eq!(single(&out, "ppt_mean"), 2.5);
        assert_eq!(single(&out, "ppt_min"), 1.0);
        assert_eq!(single(&out, "ppt_max"), 4.0);
        assert_eq!(single(&out, "ppt_median"), 2.5);
        // Sample std of [1, 2, 3, 4].
        assert!((single(&out, "ppt_std") - (5.0f64 / 3.0).sqrt()).abs() < 1e-12);
    }

    #[test]
    fn annual_groups_by_year() {
        let out = aggregate(&frame(), Aggregation::Annual).unwrap();

        assert_eq!(out.height(), 2);
        let means = out.column("ppt_mean").unwrap().f64().unwrap();
        assert_eq!(means.get(0), Some(1.5));
        assert_eq!(means.get(1), Some(3.5));
    }

    #[test]
    fn seasonal_maps_months_to_seasons() {
        let df = df!(
            "point_id" => ["a", "a", "a", "a", "a"],
            "year" => [2000i32, 2000, 2000, 2000, 2000],
            "month" => [1i32, 4, 7, 10, 12],
            "ppt" => [1.0, 2.0, 3.0, 4.0, 5.0],
        )
        .unwrap();

        let out = aggregate(&df, Aggregation::Seasonal).unwrap();
        assert_eq!(out.height(), 4);
        let seasons = out.column("season").unwrap().str().unwrap();
        let names: Vec<_> = seasons.into_no_null_iter().collect();
        assert_eq!(names, &["Fall", "Spring", "Summer", "Winter"]);

        // December and January both land in winter.
        let means = out.column("ppt_mean").unwrap().f64().unwrap();
        assert_eq!(means.get(3), Some(3.0));
    }

    #[test]
    fn seasonal_keeps_years_apart() {
        let df = df!(
            "point_id" => ["a", "a"],
            "year" => [2000i32, 2001],
            "month" => [7i32, 7],
            "ppt" => [1.0, 3.0],
        )
        .unwrap();

        let out = aggregate(&df, Aggregation::Seasonal).unwrap();
        assert_eq!(out.height(), 2);
        let years = out.column("year").unwrap().i32().unwrap();
        assert_eq!(years.get(0), Some(2000));
        assert_eq!(years.get(1), Some(2001));
    }

    #[test]
    fn monthly_is_a_sorted_passthrough() {
        let out = aggregate(&frame(), Aggregation::Monthly).unwrap();

        assert_eq!(out.height(), 4);
        assert_eq!(
            out.get_column_names_str(),
            &["point_id", "year", "month", "ppt"]
        );
        let ppt = out.column("ppt").unwrap().f64().unwrap();
        assert_eq!(ppt.get(0), Some(1.0));
    }

    #[test]
    fn nulls_are_skipped_by_statistics() {
        let df = df!(
            "point_id" => ["a", "a", "a"],
            "year" => [2000i32, 2000, 2000],
            "month" => [1i32, 2, 3],
            "ppt" => [Some(2.0), None, Some(4.0)],
        )
        .unwrap();

        let out = aggregate(&df, Aggregation::Summary).unwrap();
        assert_eq!(single(&out, "ppt_mean"), 3.0);
    }

    #[test]
    fn aggregation_parses_case_insensitively() {
        assert_eq!("Annual".parse::<Aggregation>().unwrap(), Aggregation::Annual);
        assert!(matches!(
            "decadal".parse::<Aggregation>(),
            Err(TransformError::UnknownAggregation(_))
        ));
    }
}
