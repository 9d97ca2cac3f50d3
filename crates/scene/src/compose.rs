//! Scene composition
//!
//! Derives the shaded relief layer from the height matrix alone, drapes
//! the color raster over it as a full-opacity texture and packages both
//! with the camera/lighting parameters for the renderer.

use crate::{AlignedPair, Error, Result};
use image::RgbaImage;
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use terravista_algorithms::{hillshade, HillshadeParams};

/// Camera parameters handed to the renderer.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CameraParams {
    /// Viewing azimuth in degrees (0 = from the north, clockwise)
    pub azimuth: f64,
    /// Viewing altitude above the horizon in degrees
    pub altitude: f64,
    /// Zoom factor (1.0 frames the full extent)
    pub zoom: f64,
}

impl Default for CameraParams {
    fn default() -> Self {
        Self {
            azimuth: 0.0,
            altitude: 40.0,
            zoom: 0.6,
        }
    }
}

/// Render parameters for scene composition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderParams {
    /// Vertical exaggeration applied to the height field
    pub exaggeration: f64,
    /// Shadow strength in [0, 1]; 0 disables shading entirely
    pub shadow_intensity: f64,
    /// Sun azimuth in degrees (0 = North, clockwise)
    pub sun_azimuth: f64,
    /// Sun altitude above the horizon in degrees
    pub sun_altitude: f64,
    /// Camera placement
    pub camera: CameraParams,
    /// Integer upscale of the output relative to the elevation grid
    pub output_scale: u32,
}

impl Default for RenderParams {
    fn default() -> Self {
        Self {
            exaggeration: 1.5,
            shadow_intensity: 0.8,
            sun_azimuth: 315.0,
            sun_altitude: 45.0,
            camera: CameraParams::default(),
            output_scale: 1,
        }
    }
}

/// A composed scene: height matrix, registered texture, derived shading
/// and the parameters the renderer needs. Consumed opaquely through the
/// [`Renderer`](crate::Renderer) trait.
pub struct Scene {
    /// Height matrix (row-major, metres)
    pub heights: Array2<f32>,
    /// Color texture, one pixel per height cell, full opacity over valid
    /// cells and transparent elsewhere
    pub texture: RgbaImage,
    /// Shading layer in [0, 1], derived from the heights alone
    pub shade: Array2<f32>,
    /// Render parameters
    pub params: RenderParams,
    /// Environment lighting asset for photorealistic renderers
    pub environment: Option<PathBuf>,
}

impl Scene {
    /// Grid dimensions as (rows, cols)
    pub fn shape(&self) -> (usize, usize) {
        self.heights.dim()
    }

    /// Output pixel dimensions (width, height), derived from the
    /// elevation grid's column/row counts and the output scale
    pub fn output_dimensions(&self) -> (u32, u32) {
        let (rows, cols) = self.shape();
        let scale = self.params.output_scale.max(1);
        (cols as u32 * scale, rows as u32 * scale)
    }
}

/// Compose a scene from an aligned pair.
///
/// The shading layer depends only on the height matrix; the texture is
/// draped on top at full opacity. `environment` is passed through to the
/// renderer untouched.
pub fn compose(
    pair: &AlignedPair,
    params: RenderParams,
    environment: Option<PathBuf>,
) -> Result<Scene> {
    let shade_raster = hillshade(
        pair.elevation(),
        HillshadeParams {
            azimuth: params.sun_azimuth,
            altitude: params.sun_altitude,
            z_factor: params.exaggeration,
        },
    )?;

    let texture = pair.color().to_image();
    let heights = pair.elevation().data().clone();
    let shade = shade_raster.into_array();

    let (rows, cols) = heights.dim();
    if texture.dimensions() != (cols as u32, rows as u32) {
        return Err(Error::Misaligned(format!(
            "texture is {:?} but the height matrix is {}x{}",
            texture.dimensions(),
            cols,
            rows
        )));
    }

    Ok(Scene {
        heights,
        texture,
        shade,
        params,
        environment,
    })
}
