//! Merges per-variable extraction tables into one wide frame.

use crate::transform::error::TransformError;
use crate::types::variable::ClimateVariable;
use log::debug;
use polars::prelude::*;

/// Key columns every extraction table carries.
pub const KEY_COLUMNS: [&str; 3] = ["point_id", "year", "month"];

/// Joins per-variable tables into a single wide frame keyed by point and
/// month. The join is a full outer join, so a row present in any input
/// survives with nulls for the variables that lack it. Output is sorted by
/// point id, year, month.
pub fn merge_wide(tables: &[(ClimateVariable, DataFrame)]) -> Result<DataFrame, TransformError> {
    let mut iter = tables.iter();
    let (first_var, first) = iter.next().ok_or(TransformError::NoTables)?;
    debug!("Merging {} variable tables, starting from {first_var}", tables.len());

    let mut merged = first.clone().lazy();
    for (_, table) in iter {
        merged = merged.join(
            table.clone().lazy(),
            KEY_COLUMNS.map(col),
            KEY_COLUMNS.map(col),
            JoinArgs::new(JoinType::Full).with_coalesce(JoinCoalesce::CoalesceColumns),
        );
    }

    let df = merged
        .sort(KEY_COLUMNS, SortMultipleOptions::default())
        .collect()?;
    Ok(df)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merges_on_point_and_month_keys() {
        let ppt = df!(
            "point_id" => ["a", "a"],
            "year" => [2000i32, 2000],
            "month" => [1i32, 2],
            "ppt" => [50.0, 60.0],
        )
        .unwrap();
        let tmax = df!(
            "point_id" => ["a", "a"],
            "year" => [2000i32, 2000],
            "month" => [1i32, 2],
            "tmax" => [10.0, 12.0],
        )
        .unwrap();

        let wide = merge_wide(&[
            (ClimateVariable::Ppt, ppt),
            (ClimateVariable::Tmax, tmax),
        ])
        .unwrap();

        assert_eq!(wide.height(), 2);
        assert_eq!(
            wide.get_column_names_str(),
            &["point_id", "year", "month", "ppt", "tmax"]
        );
        let tmax = wide.column("tmax").unwrap().f64().unwrap();
        assert_eq!(tmax.get(0), Some(10.0));
    }

    #[test]
    fn outer_join_keeps_the_key_union() {
        let ppt = df!(
            "point_id" => ["a"],
            "year" => [2000i32],
            "month" => [1i32],
            "ppt" => [50.0],
        )
        .unwrap();
        let tmax = df!(
            "point_id" => ["b"],
            "year" => [2000i32],
            "month" => [1i32],
            "tmax" => [12.0],
        )
        .unwrap();

        let wide = merge_wide(&[
            (ClimateVariable::Ppt, ppt),
            (ClimateVariable::Tmax, tmax),
        ])
        .unwrap();

        assert_eq!(wide.height(), 2);
        let ids = wide.column("point_id").unwrap().str().unwrap();
        assert_eq!(ids.get(0), Some("a"));
        assert_eq!(ids.get(1), Some("b"));
        assert!(wide.column("ppt").unwrap().f64().unwrap().get(1).is_none());
        assert!(wide.column("tmax").unwrap().f64().unwrap().get(0).is_none());
    }

    #[test]
    fn no_tables_is_an_error() {
        assert!(matches!(merge_wide(&[]), Err(TransformError::NoTables)));
    }

    #[test]
    fn single_table_passes_through_sorted() {
        let ppt = df!(
            "point_id" => ["b", "a"],
            "year" => [2000i32, 2000],
            "month" => [1i32, 1],
            "ppt" => [1.0, 2.0],
        )
        .unwrap();

        let wide = merge_wide(&[(ClimateVariable::Ppt, ppt)]).unwrap();
        let ids = wide.column("point_id").unwrap().str().unwrap();
        assert_eq!(ids.get(0), Some("a"));
    }
}
