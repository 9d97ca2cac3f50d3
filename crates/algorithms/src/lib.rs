//! # Terravista Algorithms
//!
//! Raster processing stages for the terrain-visualization pipeline:
//!
//! - **clip**: crop a categorical raster to a region boundary and mask
//!   cells outside the polygon
//! - **aggregate**: majority-vote block aggregation of category codes
//! - **warp**: nearest-neighbor reprojection and grid resampling
//! - **hillshade**: shaded relief from a DEM
//!
//! Every function consumes immutable inputs and returns a fresh raster.

pub mod aggregate;
pub mod clip;
pub mod hillshade;
pub mod warp;

pub use aggregate::aggregate_majority;
pub use clip::clip_to_boundary;
pub use hillshade::{hillshade, HillshadeParams};
pub use warp::{reproject, resample_to_grid};

use thiserror::Error;

/// Errors raised by the raster processing stages
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Core(#[from] terravista_core::Error),

    #[error("boundary does not intersect the raster extent")]
    EmptyIntersection,

    #[error("grid mismatch: {0}")]
    GridMismatch(String),

    #[error("invalid parameter: {name} = {value} ({reason})")]
    InvalidParameter {
        name: &'static str,
        value: String,
        reason: String,
    },
}

/// Result type alias for algorithm stages
pub type Result<T> = std::result::Result<T, Error>;
