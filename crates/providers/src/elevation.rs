//! Elevation provider (Terrarium-encoded slippy-map tiles)
//!
//! Fetches 256x256 PNG elevation tiles, decodes the Terrarium height
//! packing `(r * 256 + g + b / 256) - 32768`, and warps the tile mosaic
//! onto a geographic grid covering the requested bounds. Tiles are
//! cached on disk so reruns do not re-download.

use crate::{ElevationProvider, ProviderError, Result};
use ndarray::Array2;
use std::f64::consts::PI;
use std::path::PathBuf;
use std::time::Duration;
use terravista_core::raster::{GeoTransform, Raster};
use terravista_core::Crs;
use tracing::{debug, info};

const TILE_SIZE: usize = 256;
const DEFAULT_BASE_URL: &str = "https://s3.amazonaws.com/elevation-tiles-prod/terrarium";
const MAX_TILES: usize = 128;

/// HTTP elevation provider for Terrarium tile pyramids.
pub struct TerrainTiles {
    base_url: String,
    client: reqwest::blocking::Client,
    cache_dir: Option<PathBuf>,
}

impl TerrainTiles {
    /// Provider against the default public tile pyramid
    pub fn new() -> Result<Self> {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    /// Provider against a custom tile endpoint
    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()?;
        Ok(Self {
            base_url: base_url.into(),
            client,
            cache_dir: None,
        })
    }

    /// Cache downloaded tiles under `dir`
    pub fn with_cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = Some(dir.into());
        self
    }

    /// Tile URL for (zoom, x, y)
    pub fn url_for(&self, zoom: u8, x: u32, y: u32) -> String {
        format!("{}/{}/{}/{}.png", self.base_url, zoom, x, y)
    }

    fn fetch_tile(&self, zoom: u8, x: u32, y: u32) -> Result<Vec<u8>> {
        if let Some(dir) = &self.cache_dir {
            let path = dir.join(format!("terrarium_{zoom}_{x}_{y}.png"));
            if path.is_file() {
                debug!(?path, "elevation tile cache hit");
                return Ok(std::fs::read(&path).map_err(terravista_core::Error::Io)?);
            }
        }

        let url = self.url_for(zoom, x, y);
        debug!(url, "fetching elevation tile");
        let response = self.client.get(&url).send()?;
        if !response.status().is_success() {
            return Err(ProviderError::AssetFetch(format!(
                "HTTP {} fetching {url}",
                response.status()
            )));
        }
        let bytes = response.bytes()?.to_vec();

        if let Some(dir) = &self.cache_dir {
            std::fs::create_dir_all(dir).map_err(terravista_core::Error::Io)?;
            let path = dir.join(format!("terrarium_{zoom}_{x}_{y}.png"));
            std::fs::write(&path, &bytes).map_err(terravista_core::Error::Io)?;
        }

        Ok(bytes)
    }
}

impl ElevationProvider for TerrainTiles {
    fn fetch(&self, bounds: (f64, f64, f64, f64), zoom: u8) -> Result<Raster<f32>> {
        let (min_lon, min_lat, max_lon, max_lat) = bounds;
        if !(min_lon < max_lon && min_lat < max_lat) {
            return Err(ProviderError::Decode(format!(
                "degenerate bounds {bounds:?}"
            )));
        }
        if zoom > 15 {
            return Err(ProviderError::Decode(format!(
                "zoom {zoom} exceeds the tile pyramid's maximum of 15"
            )));
        }

        let (x0, y0) = tile_index(min_lon, max_lat, zoom);
        let (x1, y1) = tile_index(max_lon, min_lat, zoom);
        let n_tiles = ((x1 - x0 + 1) * (y1 - y0 + 1)) as usize;
        if n_tiles > MAX_TILES {
            return Err(ProviderError::Decode(format!(
                "{n_tiles} tiles at zoom {zoom} exceed the {MAX_TILES}-tile budget; lower the zoom"
            )));
        }
        info!(zoom, n_tiles, "assembling elevation mosaic");

        // mosaic of raw tile pixels, in global tile-pixel space
        let mosaic_rows = (y1 - y0 + 1) as usize * TILE_SIZE;
        let mosaic_cols = (x1 - x0 + 1) as usize * TILE_SIZE;
        let mut mosaic = Array2::<f32>::from_elem((mosaic_rows, mosaic_cols), f32::NAN);

        for ty in y0..=y1 {
            for tx in x0..=x1 {
                let bytes = self.fetch_tile(zoom, tx, ty)?;
                let img = image::load_from_memory(&bytes)
                    .map_err(|e| ProviderError::Decode(format!("tile {zoom}/{tx}/{ty}: {e}")))?
                    .to_rgb8();
                if img.dimensions() != (TILE_SIZE as u32, TILE_SIZE as u32) {
                    return Err(ProviderError::Decode(format!(
                        "tile {zoom}/{tx}/{ty} is {}x{}, expected {TILE_SIZE}x{TILE_SIZE}",
                        img.width(),
                        img.height()
                    )));
                }

                let row_off = (ty - y0) as usize * TILE_SIZE;
                let col_off = (tx - x0) as usize * TILE_SIZE;
                for (px, py, pixel) in img.enumerate_pixels() {
                    let [r, g, b] = pixel.0;
                    mosaic[(row_off + py as usize, col_off + px as usize)] =
                        terrarium_decode(r, g, b);
                }
            }
        }

        // geographic target grid sized to the mosaic's pixel density
        let cols = (pixel_x(max_lon, zoom) - pixel_x(min_lon, zoom)).ceil().max(1.0) as usize;
        let rows = (pixel_y(min_lat, zoom) - pixel_y(max_lat, zoom)).ceil().max(1.0) as usize;

        let transform = GeoTransform::for_bounds(
            (min_lon, min_lat, max_lon, max_lat),
            (max_lon - min_lon) / cols as f64,
            (max_lat - min_lat) / rows as f64,
        );

        let origin_px = (x0 as f64) * TILE_SIZE as f64;
        let origin_py = (y0 as f64) * TILE_SIZE as f64;

        let mut data = Vec::with_capacity(rows * cols);
        for row in 0..rows {
            for col in 0..cols {
                let (lon, lat) = transform.pixel_to_geo(col, row);
                let fx = pixel_x(lon, zoom) - origin_px;
                let fy = pixel_y(lat, zoom) - origin_py;
                let (mc, mr) = (fx.floor() as isize, fy.floor() as isize);
                if mr < 0 || mc < 0 || mr as usize >= mosaic_rows || mc as usize >= mosaic_cols {
                    data.push(f32::NAN);
                } else {
                    data.push(mosaic[(mr as usize, mc as usize)]);
                }
            }
        }

        let mut dem = Raster::from_vec(data, rows, cols)?;
        dem.set_transform(transform);
        dem.set_crs(Some(Crs::wgs84()));
        dem.set_nodata(Some(f32::NAN));
        Ok(dem)
    }
}

/// Decode a Terrarium-packed height, in metres
pub fn terrarium_decode(r: u8, g: u8, b: u8) -> f32 {
    (r as f32 * 256.0 + g as f32 + b as f32 / 256.0) - 32768.0
}

/// Slippy tile index containing (lon, lat) at `zoom`
pub fn tile_index(lon: f64, lat: f64, zoom: u8) -> (u32, u32) {
    let n = f64::from(1u32 << zoom);
    let x = ((lon + 180.0) / 360.0 * n).floor();
    let lat_rad = lat.to_radians();
    let y = ((1.0 - (lat_rad.tan() + 1.0 / lat_rad.cos()).ln() / PI) / 2.0 * n).floor();

    let max = (1u32 << zoom) - 1;
    (
        (x.max(0.0) as u32).min(max),
        (y.max(0.0) as u32).min(max),
    )
}

/// Global pixel column of `lon` at `zoom` (256 px tiles)
fn pixel_x(lon: f64, zoom: u8) -> f64 {
    let n = f64::from(1u32 << zoom) * TILE_SIZE as f64;
    (lon + 180.0) / 360.0 * n
}

/// Global pixel row of `lat` at `zoom` (256 px tiles)
fn pixel_y(lat: f64, zoom: u8) -> f64 {
    let n = f64::from(1u32 << zoom) * TILE_SIZE as f64;
    let lat_rad = lat.to_radians();
    (1.0 - (lat_rad.tan() + 1.0 / lat_rad.cos()).ln() / PI) / 2.0 * n
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn terrarium_zero_elevation() {
        // sea level encodes as (128, 0, 0)
        assert_relative_eq!(terrarium_decode(128, 0, 0), 0.0);
    }

    #[test]
    fn terrarium_known_heights() {
        // 32768 + 1000 = 33768 = 131 * 256 + 232
        assert_relative_eq!(terrarium_decode(131, 232, 0), 1000.0);
        // fractional part rides in the blue channel
        assert_relative_eq!(terrarium_decode(128, 0, 128), 0.5);
        // depths go negative
        assert!(terrarium_decode(127, 0, 0) < 0.0);
    }

    #[test]
    fn tile_index_world_corners() {
        assert_eq!(tile_index(-179.9, 85.0, 0), (0, 0));
        assert_eq!(tile_index(0.1, -0.1, 1), (1, 1));
        assert_eq!(tile_index(-0.1, 0.1, 1), (0, 0));
    }

    #[test]
    fn tile_index_is_clamped() {
        let (x, y) = tile_index(179.999, -89.9, 3);
        assert!(x <= 7 && y <= 7);
    }

    #[test]
    fn pixel_and_tile_indices_agree() {
        let (lon, lat, zoom) = (8.54, 47.37, 10);
        let (tx, ty) = tile_index(lon, lat, zoom);
        assert_eq!((pixel_x(lon, zoom) / 256.0).floor() as u32, tx);
        assert_eq!((pixel_y(lat, zoom) / 256.0).floor() as u32, ty);
    }

    #[test]
    fn url_formatting() {
        let tiles = TerrainTiles::with_base_url("https://tiles.example.org/terrarium").unwrap();
        assert_eq!(
            tiles.url_for(10, 536, 358),
            "https://tiles.example.org/terrarium/10/536/358.png"
        );
    }
}
