pub mod download;
pub mod error;
pub mod memory;
#[cfg(feature = "netcdf")]
pub mod netcdf_source;
pub mod source;
