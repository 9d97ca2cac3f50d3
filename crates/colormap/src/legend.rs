//! Legend drawing and final compositing
//!
//! The legend is drawn on its own transparent canvas from the curated
//! color table, then scaled to a fraction of the rendered scene's width
//! and overlaid at a fixed corner offset. Compositing never resizes the
//! scene itself.

use crate::table::ColorTable;
use crate::{Error, Result};
use ab_glyph::{FontVec, PxScale};
use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_text_mut};
use imageproc::rect::Rect;
use std::path::PathBuf;

/// Parameters for legend drawing
#[derive(Debug, Clone)]
pub struct LegendParams {
    /// Swatch edge length in pixels
    pub swatch_size: u32,
    /// Padding around and between rows, in pixels
    pub padding: u32,
    /// Gap between swatch and label, in pixels
    pub gap: u32,
    /// Label font size in pixels
    pub font_size: f32,
    /// Whether to draw labels (requires `font_path`)
    pub labels: bool,
    /// TTF/OTF font file for labels
    pub font_path: Option<PathBuf>,
    /// Label color
    pub text_color: Rgba<u8>,
}

impl Default for LegendParams {
    fn default() -> Self {
        Self {
            swatch_size: 48,
            padding: 16,
            gap: 20,
            font_size: 40.0,
            labels: true,
            font_path: None,
            text_color: Rgba([30, 30, 30, 255]),
        }
    }
}

/// Draw a legend (swatches + labels) for the table onto a transparent
/// canvas.
///
/// With `labels` enabled a font file is required; a missing font is a
/// hard error rather than a silently label-less legend.
pub fn draw_legend(table: &ColorTable, params: &LegendParams) -> Result<RgbaImage> {
    if table.is_empty() {
        return Err(Error::EmptyTable);
    }

    let font = if params.labels {
        let path = params
            .font_path
            .as_ref()
            .ok_or_else(|| Error::LegendFont("no font path configured".into()))?;
        let data = std::fs::read(path)
            .map_err(|e| Error::LegendFont(format!("{}: {e}", path.display())))?;
        Some(
            FontVec::try_from_vec(data)
                .map_err(|e| Error::LegendFont(format!("{}: {e}", path.display()))),
        )
        .transpose()?
    } else {
        None
    };

    let n = table.len() as u32;
    let row_height = params.swatch_size + params.padding;
    let height = params.padding + n * row_height;

    let label_width = if params.labels {
        let longest = table
            .entries()
            .iter()
            .map(|e| e.label.len())
            .max()
            .unwrap_or(0) as f32;
        params.gap + (longest * params.font_size * 0.6).ceil() as u32
    } else {
        0
    };
    let width = params.padding * 2 + params.swatch_size + label_width;

    let mut canvas = RgbaImage::from_pixel(width, height, Rgba([0, 0, 0, 0]));

    for (i, entry) in table.entries().iter().enumerate() {
        let y = params.padding + i as u32 * row_height;

        let rect = Rect::at(params.padding as i32, y as i32)
            .of_size(params.swatch_size, params.swatch_size);
        let c = entry.color;
        draw_filled_rect_mut(&mut canvas, rect, Rgba([c.r, c.g, c.b, 255]));

        if let Some(font) = &font {
            let text_x = (params.padding + params.swatch_size + params.gap) as i32;
            let text_y = y as i32 + ((params.swatch_size as f32 - params.font_size) / 2.0) as i32;
            draw_text_mut(
                &mut canvas,
                params.text_color,
                text_x,
                text_y,
                PxScale::from(params.font_size),
                font,
                entry.label,
            );
        }
    }

    Ok(canvas)
}

/// Overlay the legend onto the rendered scene.
///
/// The legend is scaled to `width_fraction` of the scene width
/// (preserving its aspect ratio) and anchored to the bottom-left corner
/// with `margin` pixels of inset. The returned image always has the
/// scene's dimensions.
pub fn composite_legend(
    scene: &RgbaImage,
    legend: &RgbaImage,
    width_fraction: f32,
    margin: u32,
) -> RgbaImage {
    let mut out = scene.clone();

    let (scene_w, scene_h) = scene.dimensions();
    let (legend_w, legend_h) = legend.dimensions();
    if legend_w == 0 || legend_h == 0 || scene_w == 0 || scene_h == 0 {
        return out;
    }

    let target_w = ((scene_w as f32 * width_fraction.clamp(0.01, 1.0)).round() as u32).max(1);
    let scale = target_w as f32 / legend_w as f32;
    let target_h = ((legend_h as f32 * scale).round() as u32).max(1);

    let scaled = imageops::resize(legend, target_w, target_h, FilterType::Triangle);

    let x = margin.min(scene_w.saturating_sub(target_w)) as i64;
    let y = scene_h.saturating_sub(target_h + margin) as i64;
    imageops::overlay(&mut out, &scaled, x, y);

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::{ClassDef, PaletteOverride};

    fn swatch_only() -> LegendParams {
        LegendParams {
            labels: false,
            swatch_size: 10,
            padding: 5,
            ..Default::default()
        }
    }

    fn table() -> ColorTable {
        let mut palette = vec![[0u8, 0, 0, 255]; 16];
        palette[2] = [53, 130, 33, 255];
        palette[5] = [255, 219, 92, 255];
        ColorTable::from_palette(
            &palette,
            &[
                ClassDef::new(crate::table::LandCoverClass::Water, 1),
                ClassDef::new(crate::table::LandCoverClass::Trees, 2),
                ClassDef::new(crate::table::LandCoverClass::Crops, 5),
            ],
            PaletteOverride::default(),
        )
        .unwrap()
    }

    #[test]
    fn legend_geometry_follows_table() {
        let legend = draw_legend(&table(), &swatch_only()).unwrap();
        // 3 rows of 10px swatches with 5px padding
        assert_eq!(legend.height(), 5 + 3 * 15);
        assert_eq!(legend.width(), 5 * 2 + 10);
    }

    #[test]
    fn swatches_carry_entry_colors() {
        let t = table();
        let legend = draw_legend(&t, &swatch_only()).unwrap();

        // center of the second swatch (Trees)
        let p = legend.get_pixel(10, 5 + 15 + 5);
        assert_eq!(p.0, [53, 130, 33, 255]);

        // background stays transparent
        assert_eq!(legend.get_pixel(0, 0).0[3], 0);
    }

    #[test]
    fn labels_without_font_fail() {
        let params = LegendParams {
            labels: true,
            font_path: None,
            ..Default::default()
        };
        assert!(matches!(
            draw_legend(&table(), &params),
            Err(Error::LegendFont(_))
        ));
    }

    #[test]
    fn composite_preserves_scene_dimensions() {
        let scene = RgbaImage::from_pixel(400, 300, Rgba([10, 10, 10, 255]));
        let legend = draw_legend(&table(), &swatch_only()).unwrap();

        let out = composite_legend(&scene, &legend, 0.2, 16);
        assert_eq!(out.dimensions(), (400, 300));
    }

    #[test]
    fn legend_lands_in_the_bottom_left() {
        let scene = RgbaImage::from_pixel(400, 300, Rgba([10, 10, 10, 255]));
        let legend = draw_legend(&table(), &swatch_only()).unwrap();

        let out = composite_legend(&scene, &legend, 0.25, 10);

        // somewhere in the bottom-left quadrant a pixel changed
        let mut changed = false;
        for y in 150..300 {
            for x in 0..200 {
                if out.get_pixel(x, y) != scene.get_pixel(x, y) {
                    changed = true;
                }
            }
        }
        assert!(changed, "legend must modify the bottom-left quadrant");

        // and the top-right quadrant is untouched
        for y in 0..100 {
            for x in 300..400 {
                assert_eq!(out.get_pixel(x, y), scene.get_pixel(x, y));
            }
        }
    }
}
