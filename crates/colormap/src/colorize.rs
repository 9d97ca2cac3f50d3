//! Categorical raster colorization
//!
//! Substitutes category codes with their table colors, producing a
//! three-band color raster plus a validity mask. Codes outside the
//! curated table are dropped, not defaulted to black; the pipeline
//! deliberately visualizes only the classes it cares about.

use crate::table::{ColorTable, Rgb};
use crate::Result;
use image::{Rgba, RgbaImage};
use terravista_algorithms::warp;
use terravista_core::crs::Crs;
use terravista_core::raster::{GeoTransform, Raster, RasterElement};
use tracing::warn;

/// A color raster: r/g/b bands plus a validity mask, all sharing one
/// grid. Read-only after creation; resampling or reprojecting yields a
/// new value.
#[derive(Debug, Clone)]
pub struct ColorRaster {
    r: Raster<u8>,
    g: Raster<u8>,
    b: Raster<u8>,
    mask: Raster<u8>,
}

impl ColorRaster {
    /// Grid dimensions as (rows, cols)
    pub fn shape(&self) -> (usize, usize) {
        self.mask.shape()
    }

    /// The shared geotransform
    pub fn transform(&self) -> &GeoTransform {
        self.mask.transform()
    }

    /// The shared CRS
    pub fn crs(&self) -> Option<&Crs> {
        self.mask.crs()
    }

    /// Whether the cell holds a color
    pub fn is_valid(&self, row: usize, col: usize) -> bool {
        self.mask.get(row, col).map(|v| v == 1).unwrap_or(false)
    }

    /// Color at (row, col), if the cell is valid
    pub fn color_at(&self, row: usize, col: usize) -> Option<Rgb> {
        if !self.is_valid(row, col) {
            return None;
        }
        Some(Rgb::new(
            self.r.get(row, col).ok()?,
            self.g.get(row, col).ok()?,
            self.b.get(row, col).ok()?,
        ))
    }

    /// The set of distinct colors present among valid cells
    pub fn distinct_colors(&self) -> Vec<Rgb> {
        let (rows, cols) = self.shape();
        let mut seen: Vec<Rgb> = Vec::new();
        for row in 0..rows {
            for col in 0..cols {
                if let Some(c) = self.color_at(row, col) {
                    if !seen.contains(&c) {
                        seen.push(c);
                    }
                }
            }
        }
        seen
    }

    /// Number of valid cells
    pub fn valid_count(&self) -> usize {
        self.mask.data().iter().filter(|&&v| v == 1).count()
    }

    /// Resample this color raster onto `template`'s grid by nearest
    /// neighbor. All four bands go through the same kernel, so they stay
    /// registered and no color is ever interpolated into existence.
    pub fn resample_onto<U: RasterElement>(&self, template: &Raster<U>) -> Result<ColorRaster> {
        Ok(ColorRaster {
            r: warp::resample_to_grid(&self.r, template)?,
            g: warp::resample_to_grid(&self.g, template)?,
            b: warp::resample_to_grid(&self.b, template)?,
            mask: warp::resample_to_grid(&self.mask, template)?,
        })
    }

    /// Reproject this color raster into `target_crs` (nearest neighbor).
    pub fn reproject(&self, target_crs: &Crs) -> Result<ColorRaster> {
        Ok(ColorRaster {
            r: warp::reproject(&self.r, target_crs)?,
            g: warp::reproject(&self.g, target_crs)?,
            b: warp::reproject(&self.b, target_crs)?,
            mask: warp::reproject(&self.mask, target_crs)?,
        })
    }

    /// Flatten to an RGBA image; invalid cells become transparent
    pub fn to_image(&self) -> RgbaImage {
        let (rows, cols) = self.shape();
        let mut img = RgbaImage::new(cols as u32, rows as u32);
        for row in 0..rows {
            for col in 0..cols {
                let pixel = match self.color_at(row, col) {
                    Some(c) => Rgba([c.r, c.g, c.b, 255]),
                    None => Rgba([0, 0, 0, 0]),
                };
                img.put_pixel(col as u32, row as u32, pixel);
            }
        }
        img
    }
}

/// Replace every surviving cell's category code with its table color.
///
/// Nodata cells and codes absent from the table become invalid cells;
/// each distinct dropped code is logged once at warn level. Dropping is
/// the documented policy: the source product defines more categories
/// than the visualization curates.
pub fn colorize(raster: &Raster<u8>, table: &ColorTable) -> Result<ColorRaster> {
    let (rows, cols) = raster.shape();

    // none of the bands carries a nodata sentinel; validity lives in the
    // mask alone (1 = colored, anything else = dropped)
    let mut r_band = raster.with_same_meta::<u8>(rows, cols);
    let mut g_band = raster.with_same_meta::<u8>(rows, cols);
    let mut b_band = raster.with_same_meta::<u8>(rows, cols);
    let mut mask = raster.with_same_meta::<u8>(rows, cols);

    let mut dropped: Vec<u8> = Vec::new();

    for row in 0..rows {
        for col in 0..cols {
            let code = unsafe { raster.get_unchecked(row, col) };
            if raster.is_nodata(code) {
                continue;
            }

            match table.get(code) {
                Some(color) => {
                    // bands share dimensions with the source; writes
                    // cannot fail
                    let _ = r_band.set(row, col, color.r);
                    let _ = g_band.set(row, col, color.g);
                    let _ = b_band.set(row, col, color.b);
                    let _ = mask.set(row, col, 1);
                }
                None => {
                    if !dropped.contains(&code) {
                        dropped.push(code);
                    }
                }
            }
        }
    }

    for code in dropped {
        warn!(code, "dropping category without a curated color");
    }

    Ok(ColorRaster {
        r: r_band,
        g: g_band,
        b: b_band,
        mask,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::{ClassDef, ColorTable, PaletteOverride, WATER_BLUE};
    use terravista_core::GeoTransform;

    fn eight_class_palette() -> Vec<[u8; 4]> {
        // codes {2,3,5,6,8,9,10,11} hold the curated colors; water at
        // code 2 is pure black in the palette and gets the override
        let mut palette = vec![[0, 0, 0, 255]; 16];
        palette[3] = [53, 130, 33, 255];
        palette[5] = [135, 209, 158, 255];
        palette[6] = [255, 219, 92, 255];
        palette[8] = [237, 2, 42, 255];
        palette[9] = [237, 233, 228, 255];
        palette[10] = [242, 250, 255, 255];
        palette[11] = [200, 200, 130, 255];
        palette
    }

    fn eight_class_table() -> ColorTable {
        use crate::table::LandCoverClass::*;
        let classes = vec![
            ClassDef::new(Water, 2),
            ClassDef::new(Trees, 3),
            ClassDef::new(FloodedVegetation, 5),
            ClassDef::new(Crops, 6),
            ClassDef::new(BuiltArea, 8),
            ClassDef::new(BareGround, 9),
            ClassDef::new(SnowIce, 10),
            ClassDef::new(Rangeland, 11),
        ];
        ColorTable::from_palette(&eight_class_palette(), &classes, PaletteOverride::default())
            .unwrap()
    }

    fn categorical_raster(values: Vec<u8>, rows: usize, cols: usize) -> Raster<u8> {
        let mut r = Raster::from_vec(values, rows, cols).unwrap();
        r.set_transform(GeoTransform::new(0.0, rows as f64, 1.0, -1.0));
        r
    }

    #[test]
    fn mapped_codes_get_their_colors() {
        let raster = categorical_raster(vec![2, 3, 3, 2], 2, 2);
        let color = colorize(&raster, &eight_class_table()).unwrap();

        assert_eq!(color.color_at(0, 0), Some(WATER_BLUE));
        assert_eq!(color.color_at(0, 1), Some(Rgb::new(53, 130, 33)));
        assert_eq!(color.valid_count(), 4);
    }

    #[test]
    fn unmapped_codes_are_dropped_not_blacked() {
        // code 7 is not curated
        let raster = categorical_raster(vec![2, 7, 7, 3], 2, 2);
        let color = colorize(&raster, &eight_class_table()).unwrap();

        assert!(color.color_at(0, 1).is_none());
        assert!(color.color_at(1, 0).is_none());
        assert_eq!(color.valid_count(), 2);
        assert!(!color.distinct_colors().contains(&Rgb::new(0, 0, 0)));
    }

    #[test]
    fn nodata_cells_are_invalid() {
        let mut raster = categorical_raster(vec![2, 255, 3, 255], 2, 2);
        raster.set_nodata(Some(255));

        let color = colorize(&raster, &eight_class_table()).unwrap();
        assert_eq!(color.valid_count(), 2);
        assert!(color.color_at(0, 1).is_none());
    }

    #[test]
    fn only_curated_colors_survive_end_to_end() {
        // every curated code plus strays: output must hold exactly the
        // eight curated colors, none of them black
        let mut values = vec![2u8, 3, 5, 6, 8, 9, 10, 11];
        values.extend_from_slice(&[0, 1, 4, 7, 12, 13, 14, 15]);
        let raster = categorical_raster(values, 4, 4);

        let table = eight_class_table();
        let color = colorize(&raster, &table).unwrap();

        let colors = color.distinct_colors();
        assert_eq!(colors.len(), 8);
        for entry in table.entries() {
            assert!(colors.contains(&entry.color), "missing {}", entry.label);
        }
        assert!(!colors.contains(&Rgb::new(0, 0, 0)));
        assert_eq!(color.valid_count(), 8);
    }

    #[test]
    fn resampling_never_invents_colors() {
        let raster = categorical_raster(vec![2, 3, 6, 11], 2, 2);
        let color = colorize(&raster, &eight_class_table()).unwrap();

        // resample onto a 3x finer grid covering the same extent
        let mut template: Raster<f32> = Raster::new(6, 6);
        template.set_transform(GeoTransform::new(0.0, 2.0, 1.0 / 3.0, -1.0 / 3.0));

        let fine = color.resample_onto(&template).unwrap();
        assert_eq!(fine.shape(), (6, 6));

        let coarse_colors = color.distinct_colors();
        for c in fine.distinct_colors() {
            assert!(coarse_colors.contains(&c), "invented color {:?}", c);
        }
    }

    #[test]
    fn preview_image_matches_grid() {
        let raster = categorical_raster(vec![2, 0, 3, 2], 2, 2);
        let color = colorize(&raster, &eight_class_table()).unwrap();

        let img = color.to_image();
        assert_eq!(img.dimensions(), (2, 2));
        assert_eq!(img.get_pixel(0, 0).0[3], 255);
        assert_eq!(img.get_pixel(1, 0).0[3], 0, "dropped cell is transparent");
    }
}
