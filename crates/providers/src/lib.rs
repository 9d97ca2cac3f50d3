//! # Terravista Providers
//!
//! External data acquisition behind capability traits. The pipeline
//! driver injects concrete providers into the stages that need them;
//! nothing in the workspace reaches for ambient global state.
//!
//! All fetches are blocking, one-shot calls with no retry policy; a
//! network failure surfaces immediately and aborts the run.

pub mod assets;
pub mod boundary;
pub mod elevation;

pub use assets::AssetCache;
pub use boundary::{GiscoBoundaries, ResolutionTier};
pub use elevation::TerrainTiles;

use std::path::PathBuf;
use terravista_core::raster::Raster;
use terravista_core::Boundary;
use thiserror::Error;

/// Errors raised by external data providers
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("no boundary found for region '{0}'")]
    BoundaryNotFound(String),

    #[error("failed to fetch external asset: {0}")]
    AssetFetch(String),

    #[error("failed to decode fetched data: {0}")]
    Decode(String),

    #[error(transparent)]
    Core(#[from] terravista_core::Error),
}

impl From<reqwest::Error> for ProviderError {
    fn from(e: reqwest::Error) -> Self {
        ProviderError::AssetFetch(e.to_string())
    }
}

/// Result type alias for provider operations
pub type Result<T> = std::result::Result<T, ProviderError>;

/// Resolves a region identifier to its boundary geometry.
pub trait BoundaryProvider {
    /// Fetch the boundary for `region` at the given resolution tier.
    fn resolve(&self, region: &str, tier: ResolutionTier) -> Result<Boundary>;
}

/// Supplies an elevation raster for a geographic extent.
pub trait ElevationProvider {
    /// Fetch a DEM covering `bounds` = (min_lon, min_lat, max_lon,
    /// max_lat) at the given zoom level, in WGS84.
    fn fetch(&self, bounds: (f64, f64, f64, f64), zoom: u8) -> Result<Raster<f32>>;
}

/// Downloads opaque assets (e.g. environment lighting) to local files.
pub trait AssetFetcher {
    /// Fetch `url`, returning the path of the local copy.
    fn fetch(&self, url: &str) -> Result<PathBuf>;
}
