//! Nearest-neighbor reprojection and grid resampling
//!
//! Both kernels copy the value of the closest source cell; categorical
//! codes and colors never blend across cell boundaries. Reprojecting a
//! raster to its own CRS is an exact pass-through.

use crate::{Error, Result};
use ndarray::Array2;
use rayon::prelude::*;
use terravista_core::crs::{Crs, Projection};
use terravista_core::raster::{GeoTransform, Raster, RasterElement};

/// Reproject a raster into `target_crs`, preserving its pixel dimensions.
///
/// The target grid is the axis-aligned envelope of the source outline
/// projected into the target plane, sampled along all four edges so the
/// curved image of the grid is fully covered. Cells whose centers map
/// outside the source become nodata.
pub fn reproject<T>(raster: &Raster<T>, target_crs: &Crs) -> Result<Raster<T>>
where
    T: RasterElement,
{
    let source_crs = match raster.crs() {
        Some(crs) => crs,
        None => {
            return Err(Error::GridMismatch(
                "cannot reproject a raster without a CRS".into(),
            ))
        }
    };

    if source_crs.is_equivalent(target_crs) {
        return Ok(raster.clone());
    }

    let from = Projection::from_crs(source_crs).map_err(Error::Core)?;
    let to = Projection::from_crs(target_crs).map_err(Error::Core)?;

    let (rows, cols) = raster.shape();
    let gt = raster.transform();

    // envelope of the projected grid outline
    let mut min_x = f64::MAX;
    let mut min_y = f64::MAX;
    let mut max_x = f64::MIN;
    let mut max_y = f64::MIN;

    let steps = 32usize;
    let mut visit = |col: f64, row: f64| {
        let x = gt.origin_x + col * gt.pixel_width + row * gt.row_rotation;
        let y = gt.origin_y + col * gt.col_rotation + row * gt.pixel_height;
        let (lon, lat) = from.inverse(x, y);
        let (tx, ty) = to.forward(lon, lat);
        if tx.is_finite() && ty.is_finite() {
            min_x = min_x.min(tx);
            min_y = min_y.min(ty);
            max_x = max_x.max(tx);
            max_y = max_y.max(ty);
        }
    };

    for i in 0..=steps {
        let fc = cols as f64 * i as f64 / steps as f64;
        let fr = rows as f64 * i as f64 / steps as f64;
        visit(fc, 0.0);
        visit(fc, rows as f64);
        visit(0.0, fr);
        visit(cols as f64, fr);
    }

    if min_x >= max_x || min_y >= max_y {
        return Err(Error::GridMismatch(
            "projected raster outline collapsed to a point".into(),
        ));
    }

    let out_transform = GeoTransform::for_bounds(
        (min_x, min_y, max_x, max_y),
        (max_x - min_x) / cols as f64,
        (max_y - min_y) / rows as f64,
    );

    let fill = raster.nodata().unwrap_or_else(T::default_nodata);

    let data: Vec<T> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            let mut row_data = vec![fill; cols];
            for (col, slot) in row_data.iter_mut().enumerate() {
                let (tx, ty) = out_transform.pixel_to_geo(col, row);
                let (lon, lat) = to.inverse(tx, ty);
                let (sx, sy) = from.forward(lon, lat);
                if let Some(v) = sample_nearest(raster, sx, sy) {
                    *slot = v;
                }
            }
            row_data
        })
        .collect();

    let mut output = raster.with_same_meta::<T>(rows, cols);
    output.set_transform(out_transform);
    output.set_crs(Some(target_crs.clone()));
    output.set_nodata(Some(fill));
    *output.data_mut() = Array2::from_shape_vec((rows, cols), data)
        .map_err(|e| terravista_core::Error::Other(e.to_string()))?;

    Ok(output)
}

/// Resample `source` onto `template`'s grid by nearest neighbor.
///
/// Both rasters must live in the same CRS; the output carries the
/// template's dimensions, transform and CRS with the source's values.
/// Fails with `GridMismatch` when the CRSs differ or when not a single
/// template cell lands on the source.
pub fn resample_to_grid<T, U>(source: &Raster<T>, template: &Raster<U>) -> Result<Raster<T>>
where
    T: RasterElement,
    U: RasterElement,
{
    if let (Some(a), Some(b)) = (source.crs(), template.crs()) {
        if !a.is_equivalent(b) {
            return Err(Error::GridMismatch(format!(
                "source is in {} but target grid is in {}",
                a, b
            )));
        }
    }

    let (rows, cols) = template.shape();
    let fill = source.nodata().unwrap_or_else(T::default_nodata);
    let template_gt = *template.transform();

    let row_results: Vec<(Vec<T>, usize)> = (0..rows)
        .into_par_iter()
        .map(|row| {
            let mut row_data = vec![fill; cols];
            let mut copied = 0usize;
            for (col, slot) in row_data.iter_mut().enumerate() {
                let (x, y) = template_gt.pixel_to_geo(col, row);
                if let Some(v) = sample_nearest(source, x, y) {
                    *slot = v;
                    copied += 1;
                }
            }
            (row_data, copied)
        })
        .collect();

    let copied: usize = row_results.iter().map(|(_, c)| *c).sum();
    if copied == 0 {
        return Err(Error::GridMismatch(
            "no 1:1 cell correspondence between source and target grid".into(),
        ));
    }

    let data: Vec<T> = row_results.into_iter().flat_map(|(d, _)| d).collect();

    let mut output = template.with_same_meta::<T>(rows, cols);
    output.set_nodata(Some(fill));
    *output.data_mut() = Array2::from_shape_vec((rows, cols), data)
        .map_err(|e| terravista_core::Error::Other(e.to_string()))?;

    Ok(output)
}

/// Value of the source cell containing map point (x, y), skipping nodata
fn sample_nearest<T: RasterElement>(raster: &Raster<T>, x: f64, y: f64) -> Option<T> {
    let (col, row) = raster.geo_to_pixel(x, y);
    if !col.is_finite() || !row.is_finite() || col < 0.0 || row < 0.0 {
        return None;
    }
    let (col, row) = (col.floor() as usize, row.floor() as usize);
    if row >= raster.rows() || col >= raster.cols() {
        return None;
    }
    let v = unsafe { raster.get_unchecked(row, col) };
    if raster.is_nodata(v) {
        None
    } else {
        Some(v)
    }
}
