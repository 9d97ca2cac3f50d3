//! Boundary preview rendering
//!
//! Draws the region outline onto a transparent canvas for a quick
//! visual sanity check of the resolved geometry.

use anyhow::{Context, Result};
use image::{Rgba, RgbaImage};
use imageproc::drawing::draw_line_segment_mut;
use std::path::PathBuf;
use terravista_core::Boundary;

const OUTLINE: Rgba<u8> = Rgba([40, 70, 110, 255]);

/// Render the boundary outline into a square canvas of `size` pixels
/// (aspect preserved, content centered) and save it as a PNG.
pub fn save_boundary_preview(boundary: &Boundary, size: u32, path: PathBuf) -> Result<()> {
    let (min_x, min_y, max_x, max_y) = boundary.bounds().context("empty boundary")?;
    let span_x = (max_x - min_x).max(f64::EPSILON);
    let span_y = (max_y - min_y).max(f64::EPSILON);
    let scale = (size as f64 * 0.94) / span_x.max(span_y);

    let content_w = span_x * scale;
    let content_h = span_y * scale;
    let off_x = (size as f64 - content_w) / 2.0;
    let off_y = (size as f64 - content_h) / 2.0;

    let to_px = |x: f64, y: f64| -> (f32, f32) {
        (
            (off_x + (x - min_x) * scale) as f32,
            (off_y + (max_y - y) * scale) as f32,
        )
    };

    let mut canvas = RgbaImage::from_pixel(size, size, Rgba([0, 0, 0, 0]));

    for polygon in &boundary.geometry().0 {
        for ring in std::iter::once(polygon.exterior()).chain(polygon.interiors().iter()) {
            for segment in ring.0.windows(2) {
                let a = to_px(segment[0].x, segment[0].y);
                let b = to_px(segment[1].x, segment[1].y);
                draw_line_segment_mut(&mut canvas, a, b, OUTLINE);
            }
        }
    }

    canvas
        .save(&path)
        .with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo_types::{LineString, Polygon};
    use terravista_core::Crs;

    #[test]
    fn preview_draws_the_outline() {
        let boundary = Boundary::from_polygon(
            Polygon::new(
                LineString::from(vec![
                    (1.0, 42.0),
                    (2.0, 42.0),
                    (2.0, 43.0),
                    (1.0, 43.0),
                    (1.0, 42.0),
                ]),
                vec![],
            ),
            Crs::wgs84(),
        );

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("boundary.png");
        save_boundary_preview(&boundary, 256, path.clone()).unwrap();

        let img = image::open(&path).unwrap().to_rgba8();
        assert_eq!(img.dimensions(), (256, 256));
        let drawn = img.pixels().filter(|p| p.0[3] != 0).count();
        assert!(drawn > 100, "outline must be visible, got {drawn} pixels");
    }
}
