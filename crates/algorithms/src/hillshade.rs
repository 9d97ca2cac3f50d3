//! Hillshade (shaded relief) calculation
//!
//! Produces the shading layer for scene composition from a DEM alone;
//! the color texture never influences the shading.

use crate::Result;
use ndarray::Array2;
use rayon::prelude::*;
use std::f64::consts::PI;
use terravista_core::raster::Raster;
use terravista_core::RasterElement;

/// Parameters for hillshade calculation
#[derive(Debug, Clone)]
pub struct HillshadeParams {
    /// Sun azimuth in degrees (0 = North, clockwise)
    pub azimuth: f64,
    /// Sun altitude in degrees above horizon (0-90)
    pub altitude: f64,
    /// Vertical exaggeration applied to the height gradients
    pub z_factor: f64,
}

impl Default for HillshadeParams {
    fn default() -> Self {
        Self {
            azimuth: 315.0, // NW illumination (standard)
            altitude: 45.0,
            z_factor: 1.0,
        }
    }
}

/// Calculate a normalized hillshade ([0, 1]) from a DEM.
///
/// Horn's method over the 3x3 neighborhood. Edge cells and cells whose
/// neighborhood touches nodata shade to 0; the scene composer leaves
/// those cells untextured anyway.
pub fn hillshade(dem: &Raster<f32>, params: HillshadeParams) -> Result<Raster<f32>> {
    let (rows, cols) = dem.shape();
    let cell_size = dem.cell_size();
    let nodata = dem.nodata();

    let azimuth_rad = (360.0 - params.azimuth + 90.0).to_radians();
    let zenith_rad = (90.0 - params.altitude).to_radians();
    let cos_zenith = zenith_rad.cos();
    let sin_zenith = zenith_rad.sin();

    let eight_cell_size = 8.0 * cell_size;
    let z = params.z_factor;

    let output_data: Vec<f32> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            let mut row_data = vec![0.0f32; cols];

            for col in 0..cols {
                let e = unsafe { dem.get_unchecked(row, col) };
                if e.is_nodata(nodata) {
                    continue;
                }

                if row == 0 || row == rows - 1 || col == 0 || col == cols - 1 {
                    continue;
                }

                let a = unsafe { dem.get_unchecked(row - 1, col - 1) } as f64;
                let b = unsafe { dem.get_unchecked(row - 1, col) } as f64;
                let c = unsafe { dem.get_unchecked(row - 1, col + 1) } as f64;
                let d = unsafe { dem.get_unchecked(row, col - 1) } as f64;
                let f = unsafe { dem.get_unchecked(row, col + 1) } as f64;
                let g = unsafe { dem.get_unchecked(row + 1, col - 1) } as f64;
                let h = unsafe { dem.get_unchecked(row + 1, col) } as f64;
                let i = unsafe { dem.get_unchecked(row + 1, col + 1) } as f64;

                if [a, b, c, d, f, g, h, i].iter().any(|v| v.is_nan()) {
                    continue;
                }

                // Horn's method, gradients scaled by the exaggeration
                let dz_dx = z * ((c + 2.0 * f + i) - (a + 2.0 * d + g)) / eight_cell_size;
                let dz_dy = z * ((g + 2.0 * h + i) - (a + 2.0 * b + c)) / eight_cell_size;

                let slope_rad = (dz_dx * dz_dx + dz_dy * dz_dy).sqrt().atan();

                let aspect_rad = if dz_dx.abs() < 1e-10 && dz_dy.abs() < 1e-10 {
                    0.0 // flat
                } else {
                    let aspect = (-dz_dy).atan2(-dz_dx);
                    if aspect < 0.0 {
                        2.0 * PI + aspect
                    } else {
                        aspect
                    }
                };

                let shade = cos_zenith * slope_rad.cos()
                    + sin_zenith * slope_rad.sin() * (azimuth_rad - aspect_rad).cos();

                row_data[col] = shade.clamp(0.0, 1.0) as f32;
            }

            row_data
        })
        .collect();

    let mut output = dem.with_same_meta::<f32>(rows, cols);
    output.set_nodata(Some(0.0));
    *output.data_mut() = Array2::from_shape_vec((rows, cols), output_data)
        .map_err(|e| terravista_core::Error::Other(e.to_string()))?;

    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use terravista_core::GeoTransform;

    fn ramp_dem() -> Raster<f32> {
        let mut dem = Raster::new(10, 10);
        dem.set_transform(GeoTransform::new(0.0, 10.0, 1.0, -1.0));

        for row in 0..10 {
            for col in 0..10 {
                dem.set(row, col, (row + col) as f32 * 10.0).unwrap();
            }
        }
        dem
    }

    #[test]
    fn shade_stays_in_unit_range() {
        let dem = ramp_dem();
        let result = hillshade(&dem, HillshadeParams::default()).unwrap();

        for row in 0..result.rows() {
            for col in 0..result.cols() {
                let val = result.get(row, col).unwrap();
                assert!(
                    (0.0..=1.0).contains(&val),
                    "hillshade value {val} out of range at ({row}, {col})"
                );
            }
        }
    }

    #[test]
    fn flat_surface_shades_to_cos_zenith() {
        let mut dem: Raster<f32> = Raster::filled(10, 10, 100.0);
        dem.set_transform(GeoTransform::new(0.0, 10.0, 1.0, -1.0));

        let result = hillshade(&dem, HillshadeParams::default()).unwrap();
        let val = result.get(5, 5).unwrap();

        // flat surface at 45 degrees altitude: cos(45 deg) ~ 0.707
        assert!(
            (val - 0.707).abs() < 0.01,
            "expected ~0.707 for flat surface, got {val}"
        );
    }

    #[test]
    fn exaggeration_steepens_shadows() {
        let dem = ramp_dem();

        let flat = hillshade(
            &dem,
            HillshadeParams {
                z_factor: 1.0,
                ..Default::default()
            },
        )
        .unwrap();
        let steep = hillshade(
            &dem,
            HillshadeParams {
                z_factor: 3.0,
                ..Default::default()
            },
        )
        .unwrap();

        // the ramp faces away from the NW sun; more exaggeration darkens it
        assert!(steep.get(5, 5).unwrap() < flat.get(5, 5).unwrap());
    }

    #[test]
    fn nodata_cells_shade_to_zero() {
        let mut dem = ramp_dem();
        dem.set(4, 4, f32::NAN).unwrap();
        dem.set_nodata(Some(f32::NAN));

        let result = hillshade(&dem, HillshadeParams::default()).unwrap();
        assert_eq!(result.get(4, 4).unwrap(), 0.0);
        // neighbors touching the hole shade to zero as well
        assert_eq!(result.get(4, 5).unwrap(), 0.0);
    }
}
