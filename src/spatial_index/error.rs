use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SpatialIndexError {
    #[error("Failed to read index cache file {0:?}")]
    CacheRead(PathBuf, #[source] std::io::Error),

    #[error("Failed to write index cache file {0:?}")]
    CacheWrite(PathBuf, #[source] std::io::Error),

    #[error("Failed to decode index cache data from {0:?}")]
    CacheDecode(PathBuf, #[source] Box<bincode::error::DecodeError>),

    #[error("Failed to encode index cache data")]
    CacheEncode(#[source] Box<bincode::error::EncodeError>),

    #[error("Background task failed to complete")]
    TaskJoin(#[from] tokio::task::JoinError),
}
