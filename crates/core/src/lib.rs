//! # Terravista Core
//!
//! Core types and I/O for the terravista terrain-visualization pipeline.
//!
//! This crate provides:
//! - `Raster<T>`: generic georeferenced raster grid
//! - `GeoTransform`: affine transformation for georeferencing
//! - `Crs` and `Projection`: coordinate reference systems and the
//!   equal-area working projection
//! - `Boundary`: region boundary geometry
//! - GeoTIFF I/O with embedded-palette support

pub mod crs;
pub mod error;
pub mod io;
pub mod raster;
pub mod vector;

pub use crs::{Crs, Projection};
pub use error::{Error, Result};
pub use raster::{GeoTransform, Raster, RasterElement};
pub use vector::Boundary;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::crs::{Crs, Projection};
    pub use crate::error::{Error, Result};
    pub use crate::raster::{GeoTransform, Raster, RasterElement};
    pub use crate::vector::Boundary;
}
