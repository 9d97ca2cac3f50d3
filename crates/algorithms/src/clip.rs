//! Clip a categorical raster to a region boundary
//!
//! Crops to the boundary's bounding extent, then masks cells whose
//! centers fall outside the polygon to nodata. The boundary is projected
//! into the raster's CRS first; the large source raster is never warped
//! here.

use crate::{Error, Result};
use ndarray::Array2;
use rayon::prelude::*;
use terravista_core::raster::Raster;
use terravista_core::Boundary;

/// Crop `raster` to `boundary` and mask cells outside the polygon.
///
/// `nodata` is the sentinel written to masked cells (and recorded on the
/// output raster). Returns `EmptyIntersection` when the boundary's
/// bounding box misses the raster extent, or when no cell center lies
/// inside the polygon.
pub fn clip_to_boundary(
    raster: &Raster<u8>,
    boundary: &Boundary,
    nodata: u8,
) -> Result<Raster<u8>> {
    let boundary = match raster.crs() {
        Some(crs) => boundary.projected(crs)?,
        // no CRS on the raster: trust that the caller resolved the
        // boundary in the raster's coordinate space
        None => boundary.clone(),
    };

    let (bmin_x, bmin_y, bmax_x, bmax_y) = boundary.bounds()?;
    let (rmin_x, rmin_y, rmax_x, rmax_y) = raster.bounds();

    if bmax_x <= rmin_x || bmin_x >= rmax_x || bmax_y <= rmin_y || bmin_y >= rmax_y {
        return Err(Error::EmptyIntersection);
    }

    // pixel window of the intersected bounding box
    let gt = raster.transform();
    let (c0, r0) = gt.geo_to_pixel(bmin_x.max(rmin_x), bmax_y.min(rmax_y));
    let (c1, r1) = gt.geo_to_pixel(bmax_x.min(rmax_x), bmin_y.max(rmin_y));

    let col_start = c0.floor().max(0.0) as usize;
    let row_start = r0.floor().max(0.0) as usize;
    let col_end = (c1.ceil() as usize).min(raster.cols());
    let row_end = (r1.ceil() as usize).min(raster.rows());

    if col_start >= col_end || row_start >= row_end {
        return Err(Error::EmptyIntersection);
    }

    let rows = row_end - row_start;
    let cols = col_end - col_start;

    let (origin_x, origin_y) = gt.pixel_to_geo_corner(col_start, row_start);
    let mut out_transform = *gt;
    out_transform.origin_x = origin_x;
    out_transform.origin_y = origin_y;

    let src_nodata = raster.nodata();

    let data: Vec<u8> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            let mut row_data = vec![nodata; cols];
            let src_row = row_start + row;

            for col in 0..cols {
                let src_col = col_start + col;
                let value = unsafe { raster.get_unchecked(src_row, src_col) };
                if matches!(src_nodata, Some(nd) if value == nd) {
                    continue;
                }
                let (x, y) = out_transform.pixel_to_geo(col, row);
                if boundary.contains_point(x, y) {
                    row_data[col] = value;
                }
            }

            row_data
        })
        .collect();

    let valid = data.iter().filter(|&&v| v != nodata).count();
    if valid == 0 {
        return Err(Error::EmptyIntersection);
    }

    let mut output = raster.with_same_meta::<u8>(rows, cols);
    output.set_transform(out_transform);
    output.set_nodata(Some(nodata));
    *output.data_mut() = Array2::from_shape_vec((rows, cols), data)
        .map_err(|e| terravista_core::Error::Other(e.to_string()))?;

    Ok(output)
}
