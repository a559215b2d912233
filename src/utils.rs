use std::io;
use std::path::{Path, PathBuf};

const CACHE_DIR_NAME: &str = "terraclim_cache";

/// Default cache directory, under the platform cache location.
pub fn get_cache_dir() -> io::Result<PathBuf> {
    let dir = dirs::cache_dir().ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::NotFound,
            "Could not determine a cache directory for this platform",
        )
    })?;
    Ok(dir.join(CACHE_DIR_NAME))
}

pub async fn ensure_cache_dir_exists(cache_dir: &Path) -> io::Result<()> {
    tokio::fs::create_dir_all(cache_dir).await
}
