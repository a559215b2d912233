//! The main entry point for extracting TerraClimate data.
//!
//! [`TerraClim`] ties the pipeline stages together: loading a point
//! catalog, matching points to grid cells, extracting monthly series per
//! variable, and handing the resulting tables to the transform and
//! validation layers. It manages a cache directory for the spatial index
//! and downloaded grid files.

use crate::catalog::loader::load_catalog;
use crate::catalog::point::PointCatalog;
use crate::error::TerraClimError;
use crate::extraction::extractor::{
    extract_variable, ExtractionRun, ExtractionStrategy, VariableOutcome,
};
use crate::grid::source::{Grid, GridProvider};
use crate::spatial_index::builder::{build_index, IndexBuildOutcome, DEFAULT_TOLERANCE};
use crate::spatial_index::cache::{index_fingerprint, IndexCache};
use crate::types::time::YearRange;
use crate::types::variable::ClimateVariable;
use crate::utils::{ensure_cache_dir_exists, get_cache_dir};
use crate::validation::checks::CoveragePolicy;
use crate::validation::report::{save_validation_report, validate_extraction, ValidationReport};
use bon::bon;
use log::{info, warn};
use polars::prelude::DataFrame;
use std::path::{Path, PathBuf};

/// URL template for the TerraClimate aggregated NetCDF files, served as
/// plain HTTP downloads. `{var}` is replaced with the dataset variable
/// name.
///
/// The same datasets are also exposed under `/thredds/dodsC/` (OPeNDAP),
/// but that endpoint only answers DAP protocol requests and cannot be
/// fetched as a file; templates passed to
/// [`TerraClim::set_url_template`] must point at a downloadable resource.
pub const TERRACLIMATE_URL_TEMPLATE: &str =
    "http://thredds.northwestknowledge.net:8080/thredds/fileServer/agg_terraclimate_{var}_1958_CurrentYear_GLOBE.nc";

/// The main client for extracting TerraClimate point series.
///
/// Create one with [`TerraClim::new()`] for the default cache directory or
/// [`TerraClim::with_cache_folder()`] to control where the spatial index
/// and downloaded grids are cached.
///
/// # Examples
///
/// ```rust
/// # use terraclim::{TerraClim, TerraClimError};
/// # async fn run() -> Result<(), TerraClimError> {
/// let client = TerraClim::new().await?;
/// let catalog = client
///     .load_catalog()
///     .path("points.csv".into())
///     .call()
///     .await?;
/// # Ok(())
/// # }
/// ```
pub struct TerraClim {
    cache_dir: PathBuf,
    url_template: String,
}

#[bon]
impl TerraClim {
    /// Creates a client with a specific cache directory, creating it if
    /// needed.
    pub async fn with_cache_folder(cache_folder: PathBuf) -> Result<Self, TerraClimError> {
        ensure_cache_dir_exists(&cache_folder)
            .await
            .map_err(|e| TerraClimError::CacheDirCreation(cache_folder.clone(), e))?;
        Ok(Self {
            cache_dir: cache_folder,
            url_template: TERRACLIMATE_URL_TEMPLATE.to_string(),
        })
    }

    /// Creates a client using the platform default cache directory.
    pub async fn new() -> Result<Self, TerraClimError> {
        let cache_folder = get_cache_dir().map_err(TerraClimError::CacheDirResolution)?;
        Self::with_cache_folder(cache_folder).await
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    pub fn url_template(&self) -> &str {
        &self.url_template
    }

    /// Overrides the remote URL template, for mirrors or test servers.
    /// The template must contain a `{var}` placeholder.
    pub fn set_url_template(&mut self, template: impl Into<String>) {
        self.url_template = template.into();
    }

    /// Loads a point catalog from a CSV file.
    ///
    /// # Arguments
    ///
    /// * `.path(PathBuf)`: **Required.** Path to the catalog CSV.
    #[builder]
    pub async fn load_catalog(&self, path: PathBuf) -> Result<PointCatalog, TerraClimError> {
        Ok(load_catalog(&path).await?)
    }

    /// Matches every catalog point to its nearest grid cell, reusing the
    /// cached index when the catalog, grid and tolerance are unchanged.
    ///
    /// # Arguments
    ///
    /// * `.catalog(&PointCatalog)`: **Required.** The points to match.
    /// * `.grid(&Grid)`: **Required.** The grid axes to match against.
    /// * `.tolerance(f64)`: Optional. Maximum per-axis distance in degrees.
    ///   Defaults to half the TerraClimate cell size.
    /// * `.rebuild(bool)`: Optional. Skips the cache and rebuilds from
    ///   scratch. Defaults to `false`.
    #[builder]
    pub async fn spatial_index(
        &self,
        catalog: &PointCatalog,
        grid: &Grid,
        tolerance: Option<f64>,
        rebuild: Option<bool>,
    ) -> Result<IndexBuildOutcome, TerraClimError> {
        let tolerance = tolerance.unwrap_or(DEFAULT_TOLERANCE);
        let rebuild = rebuild.unwrap_or(false);

        let fingerprint = index_fingerprint(catalog, grid, tolerance);
        let cache = IndexCache::new(&self.cache_dir);

        if !rebuild {
            if let Some(outcome) = cache.load(fingerprint).await? {
                return Ok(outcome);
            }
        }

        let outcome = build_index(catalog, grid, tolerance);
        cache.store(&outcome, fingerprint).await?;
        Ok(outcome)
    }

    /// Extracts every requested variable through a grid provider.
    ///
    /// Each variable's source is opened once, read for every indexed
    /// point, and dropped before the next variable is opened. A variable
    /// that fails to open or read is recorded in the run and the others
    /// continue; the call only errors when every variable failed.
    ///
    /// # Arguments
    ///
    /// * `.provider(&impl GridProvider)`: **Required.** Opens one source
    ///   per variable.
    /// * `.index(&SpatialIndex)`: **Required.** Point to cell mapping.
    /// * `.variables(&[ClimateVariable])`: **Required.** Variables to
    ///   extract, in order.
    /// * `.year_range(YearRange)`: Optional. Restricts the time window.
    ///   Defaults to the full record.
    /// * `.strategy(ExtractionStrategy)`: Optional. Per-point or batched
    ///   reads. Defaults to per-point.
    #[builder]
    pub async fn extract_all<P: GridProvider>(
        &self,
        provider: &P,
        index: &crate::spatial_index::SpatialIndex,
        variables: &[ClimateVariable],
        year_range: Option<YearRange>,
        strategy: Option<ExtractionStrategy>,
    ) -> Result<ExtractionRun, TerraClimError> {
        let years = year_range.unwrap_or_default();
        let strategy = strategy.unwrap_or_default();

        let mut run = ExtractionRun::default();
        for &variable in variables {
            let result = provider
                .open(variable)
                .map_err(Into::into)
                .and_then(|source| {
                    extract_variable(&source, variable, index, years, strategy)
                });
            match &result {
                Ok(df) => info!("Extracted {variable}: {} rows", df.height()),
                Err(e) => warn!("Skipping {variable}: {e}"),
            }
            run.outcomes.push(VariableOutcome { variable, result });
        }

        if !variables.is_empty() && run.successes().next().is_none() {
            return Err(TerraClimError::NoVariablesExtracted {
                attempted: variables.len(),
            });
        }
        Ok(run)
    }

    /// Runs every validation check on extracted tables. Advisory, the
    /// report never blocks downstream transformation.
    ///
    /// # Arguments
    ///
    /// * `.tables(&[(ClimateVariable, DataFrame)])`: **Required.** The
    ///   extracted per-variable tables.
    /// * `.policy(CoveragePolicy)`: Optional. How the expected number of
    ///   months per point is derived. Defaults to the year span.
    #[builder]
    pub fn validate(
        &self,
        tables: &[(ClimateVariable, DataFrame)],
        policy: Option<CoveragePolicy>,
    ) -> Result<ValidationReport, TerraClimError> {
        Ok(validate_extraction(tables, policy.unwrap_or_default())?)
    }

    /// Writes a validation report as text and JSON under `directory`.
    ///
    /// # Arguments
    ///
    /// * `.report(&ValidationReport)`: **Required.**
    /// * `.directory(PathBuf)`: **Required.** Output directory.
    /// * `.stem(String)`: Optional. File name stem. Defaults to
    ///   `validation_report`.
    #[builder]
    pub async fn save_report(
        &self,
        report: &ValidationReport,
        directory: PathBuf,
        stem: Option<String>,
    ) -> Result<Vec<PathBuf>, TerraClimError> {
        let stem = stem.as_deref().unwrap_or("validation_report");
        Ok(save_validation_report(report, &directory, stem).await?)
    }

    /// Reads the grid axes of one remote variable, downloading its file
    /// into the cache first if needed.
    #[cfg(feature = "netcdf")]
    pub async fn remote_grid(&self, variable: ClimateVariable) -> Result<Grid, TerraClimError> {
        use crate::grid::download::GridDownloader;
        use crate::grid::netcdf_source::NetcdfGridSource;
        use crate::grid::source::GridSource;

        let downloader = GridDownloader::new(&self.cache_dir, &self.url_template);
        let path = downloader.ensure_local(variable).await?;
        let source = NetcdfGridSource::open(&path, variable)?;
        Ok(source.grid())
    }

    /// Extracts variables from the remote TerraClimate dataset, caching
    /// downloaded NetCDF files under the client's cache directory.
    ///
    /// Behaves like [`TerraClim::extract_all`]: failing variables are
    /// recorded and skipped, and the call only errors when all fail.
    #[cfg(feature = "netcdf")]
    #[builder]
    pub async fn extract_remote(
        &self,
        index: &crate::spatial_index::SpatialIndex,
        variables: &[ClimateVariable],
        year_range: Option<YearRange>,
        strategy: Option<ExtractionStrategy>,
    ) -> Result<ExtractionRun, TerraClimError> {
        use crate::grid::download::GridDownloader;
        use crate::grid::netcdf_source::NetcdfGridSource;

        let years = year_range.unwrap_or_default();
        let strategy = strategy.unwrap_or_default();
        let downloader = GridDownloader::new(&self.cache_dir, &self.url_template);

        let mut run = ExtractionRun::default();
        for &variable in variables {
            let result = match downloader.ensure_local(variable).await {
                Ok(path) => NetcdfGridSource::open(&path, variable)
                    .map_err(Into::into)
                    .and_then(|source| {
                        extract_variable(&source, variable, index, years, strategy)
                    }),
                Err(e) => Err(e.into()),
            };
            match &result {
                Ok(df) => info!("Extracted {variable}: {} rows", df.height()),
                Err(e) => warn!("Skipping {variable}: {e}"),
            }
            run.outcomes.push(VariableOutcome { variable, result });
        }

        if !variables.is_empty() && run.successes().next().is_none() {
            return Err(TerraClimError::NoVariablesExtracted {
                attempted: variables.len(),
            });
        }
        Ok(run)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::memory::{MemoryGridSource, MemoryProvider};
    use crate::transform::derived::add_derived_indices;
    use crate::transform::merge::merge_wide;
    use crate::types::time::TimeAxis;

    fn grid() -> Grid {
        let latitudes = (0..48).map(|i| 46.0 + i as f64 / 24.0).collect();
        let longitudes = (0..48).map(|i| 7.0 + i as f64 / 24.0).collect();
        Grid::new(latitudes, longitudes)
    }

    fn catalog() -> PointCatalog {
        PointCatalog::new(vec![
            crate::catalog::point::Point {
                id: "near".to_string(),
                latitude: 46.51,
                longitude: 7.51,
            },
            crate::catalog::point::Point {
                id: "far".to_string(),
                latitude: 10.0,
                longitude: 100.0,
            },
        ])
        .unwrap()
    }

    fn provider(months: usize) -> MemoryProvider {
        let mut provider = MemoryProvider::new();
        for variable in [
            ClimateVariable::Ppt,
            ClimateVariable::Tmax,
            ClimateVariable::Tmin,
        ] {
            provider.insert(
                variable,
                MemoryGridSource::from_fn(
                    grid().latitudes().to_vec(),
                    grid().longitudes().to_vec(),
                    TimeAxis::monthly(2000, months),
                    |t, _, _| Some(t as f64),
                ),
            );
        }
        provider
    }

    #[tokio::test]
    async fn pipeline_runs_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        let client = TerraClim::with_cache_folder(dir.path().to_path_buf())
            .await
            .unwrap();

        let catalog = catalog();
        let outcome = client
            .spatial_index()
            .catalog(&catalog)
            .grid(&grid())
            .call()
            .await
            .unwrap();

        // The distant point cannot match within tolerance.
        assert_eq!(outcome.index.len(), 1);
        assert!(outcome.index.contains("near"));
        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.failures[0].point_id, "far");

        let run = client
            .extract_all()
            .provider(&provider(24))
            .index(&outcome.index)
            .variables(&[
                ClimateVariable::Ppt,
                ClimateVariable::Tmax,
                ClimateVariable::Tmin,
            ])
            .call()
            .await
            .unwrap();

        let tables = run.tables();
        assert_eq!(tables.len(), 3);
        assert_eq!(tables[0].1.height(), 24);

        let wide = merge_wide(&tables).unwrap();
        let wide = add_derived_indices(wide).unwrap();
        assert!(wide.column("temp_range").is_ok());

        let report = client.validate().tables(&tables).call().unwrap();
        assert!(report.is_clean());

        let written = client
            .save_report()
            .report(&report)
            .directory(dir.path().to_path_buf())
            .call()
            .await
            .unwrap();
        assert_eq!(written.len(), 2);
        assert!(written.iter().all(|p| p.exists()));
    }

    #[tokio::test]
    async fn spatial_index_round_trips_through_the_cache() {
        let dir = tempfile::tempdir().unwrap();
        let client = TerraClim::with_cache_folder(dir.path().to_path_buf())
            .await
            .unwrap();
        let catalog = catalog();

        let first = client
            .spatial_index()
            .catalog(&catalog)
            .grid(&grid())
            .call()
            .await
            .unwrap();
        let second = client
            .spatial_index()
            .catalog(&catalog)
            .grid(&grid())
            .call()
            .await
            .unwrap();

        assert_eq!(first.index, second.index);
        assert_eq!(first.failures, second.failures);

        let rebuilt = client
            .spatial_index()
            .catalog(&catalog)
            .grid(&grid())
            .rebuild(true)
            .call()
            .await
            .unwrap();
        assert_eq!(first.index, rebuilt.index);
    }

    #[tokio::test]
    async fn extraction_continues_past_failing_variables() {
        let dir = tempfile::tempdir().unwrap();
        let client = TerraClim::with_cache_folder(dir.path().to_path_buf())
            .await
            .unwrap();

        let catalog = catalog();
        let outcome = client
            .spatial_index()
            .catalog(&catalog)
            .grid(&grid())
            .call()
            .await
            .unwrap();

        // The provider has no soil source, so that variable fails.
        let run = client
            .extract_all()
            .provider(&provider(12))
            .index(&outcome.index)
            .variables(&[ClimateVariable::Ppt, ClimateVariable::Soil])
            .call()
            .await
            .unwrap();

        assert_eq!(run.successes().count(), 1);
        assert_eq!(run.failures().count(), 1);
        assert_eq!(run.failures().next().unwrap().0, ClimateVariable::Soil);
    }

    #[tokio::test]
    async fn all_variables_failing_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let client = TerraClim::with_cache_folder(dir.path().to_path_buf())
            .await
            .unwrap();

        let catalog = catalog();
        let outcome = client
            .spatial_index()
            .catalog(&catalog)
            .grid(&grid())
            .call()
            .await
            .unwrap();

        let err = client
            .extract_all()
            .provider(&MemoryProvider::new())
            .index(&outcome.index)
            .variables(&[ClimateVariable::Ppt, ClimateVariable::Tmax])
            .call()
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            TerraClimError::NoVariablesExtracted { attempted: 2 }
        ));
    }
}
