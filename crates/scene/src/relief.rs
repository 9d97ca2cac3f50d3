//! Built-in software relief renderer
//!
//! A deterministic, dependency-free renderer: the color texture
//! modulated by the shading layer, scaled to the configured output
//! dimensions. It ignores the camera azimuth/altitude (top-down
//! orthographic view) and the environment asset; photorealistic
//! renderers behind the same [`Renderer`] trait honor both.

use crate::{Error, Renderer, Result, Scene};
use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};
use tracing::debug;

/// Software relief renderer.
#[derive(Debug, Clone, Default)]
pub struct ReliefRenderer {
    /// Ambient light floor in [0, 1]; keeps full shadow from going black
    pub ambient: f32,
}

impl ReliefRenderer {
    pub fn new() -> Self {
        Self { ambient: 0.25 }
    }
}

impl Renderer for ReliefRenderer {
    fn render(&self, scene: &Scene) -> Result<RgbaImage> {
        let (rows, cols) = scene.shape();
        if rows == 0 || cols == 0 {
            return Err(Error::RenderFailure("empty height matrix".into()));
        }
        if scene.texture.dimensions() != (cols as u32, rows as u32) {
            return Err(Error::RenderFailure(format!(
                "texture {:?} does not match the {cols}x{rows} height matrix",
                scene.texture.dimensions()
            )));
        }

        let shadow = scene.params.shadow_intensity.clamp(0.0, 1.0) as f32;
        let ambient = self.ambient.clamp(0.0, 1.0);

        let mut base = RgbaImage::new(cols as u32, rows as u32);
        for row in 0..rows {
            for col in 0..cols {
                let texel = scene.texture.get_pixel(col as u32, row as u32);
                if texel.0[3] == 0 {
                    base.put_pixel(col as u32, row as u32, Rgba([0, 0, 0, 0]));
                    continue;
                }

                // shadow_intensity blends between flat color and the
                // hillshade; ambient keeps the darkest cells readable
                let s = scene.shade[(row, col)];
                let lit = 1.0 - shadow * (1.0 - s);
                let light = (ambient + (1.0 - ambient) * lit).clamp(0.0, 1.0);

                let [r, g, b, a] = texel.0;
                base.put_pixel(
                    col as u32,
                    row as u32,
                    Rgba([
                        (r as f32 * light).round() as u8,
                        (g as f32 * light).round() as u8,
                        (b as f32 * light).round() as u8,
                        a,
                    ]),
                );
            }
        }

        let (out_w, out_h) = scene.output_dimensions();
        debug!(out_w, out_h, "relief render");
        if (out_w, out_h) == base.dimensions() {
            Ok(base)
        } else {
            Ok(imageops::resize(&base, out_w, out_h, FilterType::CatmullRom))
        }
    }
}
