//! # Terravista Scene
//!
//! Terrain scene assembly:
//!
//! - [`align`]: the Elevation Aligner, which puts a color raster and a DEM
//!   onto one grid in the working equal-area CRS
//! - [`compose`]: derives the shading layer and assembles a [`Scene`]
//! - [`Renderer`]: the seam to the actual renderer; the built-in
//!   [`ReliefRenderer`] is a deterministic software implementation,
//!   photorealistic renderers plug in behind the same trait

mod align;
mod compose;
mod relief;

pub use align::{align, AlignedPair};
pub use compose::{compose, CameraParams, RenderParams, Scene};
pub use relief::ReliefRenderer;

use image::RgbaImage;
use thiserror::Error;

/// Errors raised during alignment, composition or rendering
#[derive(Error, Debug)]
pub enum Error {
    #[error("render failure: {0}")]
    RenderFailure(String),

    #[error("aligned pair invariant broken: {0}")]
    Misaligned(String),

    #[error(transparent)]
    Algorithm(#[from] terravista_algorithms::Error),

    #[error(transparent)]
    Colormap(#[from] terravista_colormap::Error),

    #[error(transparent)]
    Core(#[from] terravista_core::Error),
}

/// Result type alias for scene operations
pub type Result<T> = std::result::Result<T, Error>;

/// The renderer seam.
///
/// The pipeline's contract: the scene provides a height matrix and a
/// registered texture of identical pixel dimensions plus lighting and
/// camera parameters; what the renderer does with them is its own
/// business. A render call blocks until the image is done.
pub trait Renderer {
    fn render(&self, scene: &Scene) -> Result<RgbaImage>;
}
