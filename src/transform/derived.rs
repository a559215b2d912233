//! Derived climate indices computed from the merged wide frame.

use crate::transform::error::TransformError;
use polars::prelude::*;

/// Offset that keeps the aridity denominator away from zero in dry months.
const PRECIP_EPSILON: f64 = 0.1;

/// Adds derived index columns where their source columns are present.
///
/// Each index is only computed when all of its inputs exist in the frame;
/// variables that failed to extract simply leave their indices out.
///
/// * `aridity_index` = pet / (ppt + 0.1)
/// * `water_balance` = ppt - aet
/// * `temp_range` = tmax - tmin
/// * `moisture_availability` = soil - def
pub fn add_derived_indices(df: DataFrame) -> Result<DataFrame, TransformError> {
    let columns: Vec<String> = df
        .get_column_names_str()
        .iter()
        .map(|s| s.to_string())
        .collect();
    let has = |name: &str| columns.iter().any(|c| c == name);

    let mut exprs = Vec::new();
    if has("pet") && has("ppt") {
        exprs.push((col("pet") / (col("ppt") + lit(PRECIP_EPSILON))).alias("aridity_index"));
    }
    if has("ppt") && has("aet") {
        exprs.push((col("ppt") - col("aet")).alias("water_balance"));
    }
    if has("tmax") && has("tmin") {
        exprs.push((col("tmax") - col("tmin")).alias("temp_range"));
    }
    if has("soil") && has("def") {
        exprs.push((col("soil") - col("def")).alias("moisture_availability"));
    }

    if exprs.is_empty() {
        return Ok(df);
    }
    let df = df.lazy().with_columns(exprs).collect()?;
    Ok(df)
}
