//! Elevation alignment
//!
//! Brings the color raster and the DEM onto one grid: the color raster
//! is resampled onto the DEM's grid (nearest neighbor, categorical
//! colors never blend), then both are reprojected into the working
//! equal-area CRS. Alignment happens exactly once; everything downstream
//! consumes the [`AlignedPair`] as-is.

use crate::{Error, Result};
use terravista_algorithms::warp;
use terravista_colormap::ColorRaster;
use terravista_core::raster::Raster;
use terravista_core::Crs;
use tracing::debug;

/// A color raster and an elevation raster sharing one grid: identical
/// dimensions, transform and CRS. The precondition for scene
/// composition.
#[derive(Debug, Clone)]
pub struct AlignedPair {
    color: ColorRaster,
    elevation: Raster<f32>,
}

impl AlignedPair {
    /// Pair up a color raster and a DEM, enforcing the shared-grid
    /// invariant.
    pub fn new(color: ColorRaster, elevation: Raster<f32>) -> Result<Self> {
        if color.shape() != elevation.shape() {
            return Err(Error::Misaligned(format!(
                "color grid is {:?} but elevation grid is {:?}",
                color.shape(),
                elevation.shape()
            )));
        }
        if color.transform() != elevation.transform() {
            return Err(Error::Misaligned(
                "color and elevation transforms differ".into(),
            ));
        }
        if let (Some(a), Some(b)) = (color.crs(), elevation.crs()) {
            if !a.is_equivalent(b) {
                return Err(Error::Misaligned(format!(
                    "color raster is in {a} but elevation is in {b}"
                )));
            }
        }
        Ok(Self { color, elevation })
    }

    /// The aligned color raster
    pub fn color(&self) -> &ColorRaster {
        &self.color
    }

    /// The aligned elevation raster
    pub fn elevation(&self) -> &Raster<f32> {
        &self.elevation
    }

    /// Shared grid dimensions as (rows, cols)
    pub fn shape(&self) -> (usize, usize) {
        self.elevation.shape()
    }
}

/// Align a color raster with a DEM in the working CRS.
///
/// Both inputs must live in the same geographic CRS. The output pair
/// shares the DEM's pixel dimensions; reprojection preserves them.
pub fn align(
    color: &ColorRaster,
    elevation: &Raster<f32>,
    working_crs: &Crs,
) -> Result<AlignedPair> {
    debug!(shape = ?elevation.shape(), "resampling colors onto the elevation grid");
    let color_on_dem = color.resample_onto(elevation)?;

    debug!(crs = %working_crs, "reprojecting the aligned pair");
    let elevation_projected = warp::reproject(elevation, working_crs)?;
    let color_projected = color_on_dem.reproject(working_crs)?;

    AlignedPair::new(color_projected, elevation_projected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use terravista_colormap::{colorize, ClassDef, ColorTable, LandCoverClass, PaletteOverride};
    use terravista_core::GeoTransform;

    fn color_raster(rows: usize, cols: usize) -> ColorRaster {
        let mut palette = vec![[0u8, 0, 0, 255]; 4];
        palette[2] = [53, 130, 33, 255];
        let table = ColorTable::from_palette(
            &palette,
            &[
                ClassDef::new(LandCoverClass::Water, 1),
                ClassDef::new(LandCoverClass::Trees, 2),
            ],
            PaletteOverride::default(),
        )
        .unwrap();

        let data: Vec<u8> = (0..rows * cols).map(|i| 1 + (i % 2) as u8).collect();
        let mut categorical = Raster::from_vec(data, rows, cols).unwrap();
        categorical.set_transform(GeoTransform::new(
            7.0,
            47.0,
            1.0 / cols as f64,
            -1.0 / rows as f64,
        ));
        categorical.set_crs(Some(Crs::wgs84()));

        colorize(&categorical, &table).unwrap()
    }

    fn dem(rows: usize, cols: usize) -> Raster<f32> {
        let data: Vec<f32> = (0..rows * cols).map(|i| 400.0 + i as f32).collect();
        let mut dem = Raster::from_vec(data, rows, cols).unwrap();
        dem.set_transform(GeoTransform::new(
            7.0,
            47.0,
            1.0 / cols as f64,
            -1.0 / rows as f64,
        ));
        dem.set_crs(Some(Crs::wgs84()));
        dem.set_nodata(Some(f32::NAN));
        dem
    }

    #[test]
    fn alignment_yields_the_dem_grid_twice() {
        // color at 12x12, DEM at 30x40: the pair comes out at 30x40
        let color = color_raster(12, 12);
        let elevation = dem(30, 40);

        let pair = align(&color, &elevation, &Crs::laea(46.5, 7.5)).unwrap();
        assert_eq!(pair.shape(), (30, 40));
        assert_eq!(pair.color().shape(), (30, 40));
        assert_eq!(pair.color().transform(), pair.elevation().transform());
        assert!(pair
            .color()
            .crs()
            .unwrap()
            .is_equivalent(pair.elevation().crs().unwrap()));
    }

    #[test]
    fn aligned_colors_come_from_the_source_set() {
        let color = color_raster(8, 8);
        let source_colors = color.distinct_colors();
        let elevation = dem(20, 20);

        let pair = align(&color, &elevation, &Crs::laea(46.5, 7.5)).unwrap();
        for c in pair.color().distinct_colors() {
            assert!(source_colors.contains(&c), "invented color {c:?}");
        }
    }

    #[test]
    fn mismatched_pair_is_rejected() {
        let color = color_raster(8, 8);
        let elevation = dem(10, 10);
        assert!(matches!(
            AlignedPair::new(color, elevation),
            Err(Error::Misaligned(_))
        ));
    }
}
