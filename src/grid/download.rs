//! Streaming download of per-variable grid files into the cache directory.

use crate::grid::error::GridSourceError;
use crate::types::variable::ClimateVariable;
use futures_util::TryStreamExt;
use log::{info, warn};
use reqwest::Client;
use std::io;
use std::path::{Path, PathBuf};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio_util::io::StreamReader;

/// Fetches a variable's grid file from a templated URL into the cache
/// directory, once. Subsequent calls for the same variable hit the cached
/// copy.
pub struct GridDownloader {
    cache_dir: PathBuf,
    url_template: String,
    client: Client,
}

impl GridDownloader {
    /// `url_template` must contain a `{var}` placeholder which is replaced
    /// by the variable's dataset name.
    pub fn new(cache_dir: &Path, url_template: &str) -> Self {
        Self {
            cache_dir: cache_dir.to_path_buf(),
            url_template: url_template.to_string(),
            client: Client::new(),
        }
    }

    /// The cache path for a variable's grid file.
    pub fn local_path(&self, variable: ClimateVariable) -> PathBuf {
        self.cache_dir
            .join(format!("terraclimate-{}.nc", variable.name()))
    }

    pub fn variable_url(&self, variable: ClimateVariable) -> String {
        self.url_template.replace("{var}", variable.name())
    }

    /// Returns the local path of the variable's grid file, downloading it
    /// first if it is not cached yet. The download streams to a `.part`
    /// file, is checked for a NetCDF signature, and renames on success, so
    /// a cached file is always a complete NetCDF payload. A cached file
    /// that fails the signature check (a DAP or HTML error response from an
    /// earlier run) is discarded and fetched again.
    pub async fn ensure_local(
        &self,
        variable: ClimateVariable,
    ) -> Result<PathBuf, GridSourceError> {
        let path = self.local_path(variable);
        if tokio::fs::metadata(&path).await.is_ok() {
            if file_is_netcdf(&path).await? {
                info!("Cache hit for {} grid file at {:?}", variable, path);
                return Ok(path);
            }
            warn!(
                "Cached file {:?} is not a NetCDF payload; discarding and re-downloading",
                path
            );
            tokio::fs::remove_file(&path).await?;
        }

        let url = self.variable_url(variable);
        warn!("Cache miss for {} grid file. Downloading {}", variable, url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| GridSourceError::NetworkRequest(url.clone(), e))?;
        let response = match response.error_for_status() {
            Ok(resp) => resp,
            Err(e) => {
                return Err(if let Some(status) = e.status() {
                    GridSourceError::HttpStatus {
                        url,
                        status,
                        source: e,
                    }
                } else {
                    GridSourceError::NetworkRequest(url, e)
                });
            }
        };

        tokio::fs::create_dir_all(&self.cache_dir).await?;

        let stream = response
            .bytes_stream()
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e));
        let mut reader = StreamReader::new(stream);

        let part_path = path.with_extension("nc.part");
        let mut file = tokio::fs::File::create(&part_path).await?;
        let bytes = tokio::io::copy(&mut reader, &mut file).await?;
        file.flush().await?;
        drop(file);

        // Endpoints like OPeNDAP answer a GET with a protocol or HTML
        // response; caching one would poison every later run.
        if !file_is_netcdf(&part_path).await? {
            tokio::fs::remove_file(&part_path).await?;
            return Err(GridSourceError::UnrecognizedPayload { url });
        }
        tokio::fs::rename(&part_path, &path).await?;

        info!(
            "Downloaded {} bytes for {} to {:?}",
            bytes, variable, path
        );
        Ok(path)
    }
}

/// NetCDF magic numbers: classic (CDF-1, CDF-2, CDF-5) and the HDF5
/// signature carried by NetCDF-4 files.
fn looks_like_netcdf(header: &[u8]) -> bool {
    header.starts_with(b"CDF\x01")
        || header.starts_with(b"CDF\x02")
        || header.starts_with(b"CDF\x05")
        || header.starts_with(b"\x89HDF\r\n\x1a\n")
}

async fn file_is_netcdf(path: &Path) -> Result<bool, GridSourceError> {
    let mut file = tokio::fs::File::open(path).await?;
    let mut header = [0u8; 8];
    let read = file.read(&mut header).await?;
    Ok(looks_like_netcdf(&header[..read]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_template_substitution() {
        let downloader = GridDownloader::new(
            Path::new("/tmp/cache"),
            "http://example.org/agg_terraclimate_{var}_1958_CurrentYear_GLOBE.nc",
        );
        assert_eq!(
            downloader.variable_url(ClimateVariable::Tmax),
            "http://example.org/agg_terraclimate_tmax_1958_CurrentYear_GLOBE.nc"
        );
        assert_eq!(
            downloader.variable_url(ClimateVariable::Pdsi),
            "http://example.org/agg_terraclimate_PDSI_1958_CurrentYear_GLOBE.nc"
        );
    }

    #[tokio::test]
    async fn ensure_local_returns_cached_file_without_network() {
        let dir = tempfile::tempdir().unwrap();
        let downloader = GridDownloader::new(dir.path(), "http://invalid.invalid/{var}.nc");
        let path = downloader.local_path(ClimateVariable::Ppt);
        tokio::fs::write(&path, b"CDF\x01 fake grid payload")
            .await
            .unwrap();

        let resolved = downloader.ensure_local(ClimateVariable::Ppt).await.unwrap();
        assert_eq!(resolved, path);
    }

    #[tokio::test]
    async fn cached_non_netcdf_payload_is_discarded() {
        let dir = tempfile::tempdir().unwrap();
        let downloader = GridDownloader::new(dir.path(), "http://invalid.invalid/{var}.nc");
        let path = downloader.local_path(ClimateVariable::Ppt);
        tokio::fs::write(&path, b"<html>Error 400: DAP endpoint</html>")
            .await
            .unwrap();

        // The poisoned cache entry is rejected, so the downloader goes back
        // to the network and fails on the unresolvable host.
        let err = downloader.ensure_local(ClimateVariable::Ppt).await.unwrap_err();
        assert!(matches!(err, GridSourceError::NetworkRequest(..)));
        assert!(!path.exists());
    }

    #[test]
    fn netcdf_signatures_are_recognized() {
        assert!(looks_like_netcdf(b"CDF\x01rest"));
        assert!(looks_like_netcdf(b"CDF\x02rest"));
        assert!(looks_like_netcdf(b"CDF\x05rest"));
        assert!(looks_like_netcdf(b"\x89HDF\r\n\x1a\nrest"));
        assert!(!looks_like_netcdf(b"<html><head>"));
        assert!(!looks_like_netcdf(b"Dataset {"));
        assert!(!looks_like_netcdf(b""));
        assert!(!looks_like_netcdf(b"CD"));
    }
}
