//! Majority-vote block aggregation of categorical rasters
//!
//! Coarsens a category-code grid by an integer factor `k`, replacing each
//! `k x k` block with its most frequent code. Ties break toward the
//! lowest code value; this is a deliberate, documented policy so repeated
//! runs are bit-identical.

use crate::{Error, Result};
use ndarray::Array2;
use rayon::prelude::*;
use terravista_core::raster::Raster;

/// Aggregate a categorical raster by majority vote over `k x k` blocks.
///
/// - `k == 1` is a pass-through (the input is cloned).
/// - Partial blocks along the right/bottom edges vote over the cells they
///   actually cover.
/// - Nodata cells do not vote; a block that is entirely nodata stays
///   nodata.
/// - Ties break to the lowest code value.
pub fn aggregate_majority(raster: &Raster<u8>, k: usize) -> Result<Raster<u8>> {
    if k == 0 {
        return Err(Error::InvalidParameter {
            name: "k",
            value: "0".into(),
            reason: "aggregation factor must be >= 1".into(),
        });
    }
    if k == 1 {
        return Ok(raster.clone());
    }

    let (rows, cols) = raster.shape();
    let out_rows = rows.div_ceil(k);
    let out_cols = cols.div_ceil(k);
    let nodata = raster.nodata();
    let fill = nodata.unwrap_or(u8::MAX);

    let data: Vec<u8> = (0..out_rows)
        .into_par_iter()
        .flat_map(|out_row| {
            let mut row_data = vec![fill; out_cols];
            let mut counts = [0u32; 256];

            for (out_col, slot) in row_data.iter_mut().enumerate() {
                counts.fill(0);

                let r0 = out_row * k;
                let c0 = out_col * k;
                let r1 = (r0 + k).min(rows);
                let c1 = (c0 + k).min(cols);

                for r in r0..r1 {
                    for c in c0..c1 {
                        let v = unsafe { raster.get_unchecked(r, c) };
                        if matches!(nodata, Some(nd) if v == nd) {
                            continue;
                        }
                        counts[v as usize] += 1;
                    }
                }

                // lowest code wins ties because the scan is ascending
                let mut best: Option<(u8, u32)> = None;
                for (code, &n) in counts.iter().enumerate() {
                    if n > 0 && best.is_none_or(|(_, bn)| n > bn) {
                        best = Some((code as u8, n));
                    }
                }

                if let Some((code, _)) = best {
                    *slot = code;
                }
            }

            row_data
        })
        .collect();

    let mut output = raster.with_same_meta::<u8>(out_rows, out_cols);
    output.set_transform(raster.transform().coarsened(k));
    output.set_nodata(Some(fill));
    *output.data_mut() = Array2::from_shape_vec((out_rows, out_cols), data)
        .map_err(|e| terravista_core::Error::Other(e.to_string()))?;

    Ok(output)
}
