//! Native GeoTIFF reading/writing (without GDAL dependency)
//!
//! Uses the `tiff` crate for basic TIFF I/O: single-band grids, the
//! GeoTIFF transform tags, an optional embedded palette (ColorMap) and
//! the GDAL nodata tag. For full GeoTIFF support (projections, advanced
//! types, compression options), enable the `gdal` feature.

use crate::error::{Error, Result};
use crate::io::PaletteEntry;
use crate::raster::{GeoTransform, Raster, RasterElement};
use std::any::TypeId;
use std::fs::File;
use std::path::Path;
use tiff::decoder::{Decoder, DecodingResult};
use tiff::encoder::colortype::{Gray32Float, Gray8};
use tiff::encoder::TiffEncoder;
use tiff::tags::Tag;

// GeoTIFF / GDAL private tags
const MODEL_PIXEL_SCALE: u16 = 33550;
const MODEL_TIEPOINT: u16 = 33922;
const GEO_KEY_DIRECTORY: u16 = 34735;
const GDAL_NODATA: u16 = 42113;
const COLOR_MAP: u16 = 320;

/// Options for writing GeoTIFF files
#[derive(Debug, Clone, Default)]
pub struct GeoTiffOptions {
    /// Compression (not supported by the native writer)
    pub compression: String,
    /// Tile size (native writer always uses strips)
    pub tile_size: usize,
}

/// Read a single band of a GeoTIFF file into a Raster
///
/// Native reader with limited GeoTIFF metadata support; the CRS is not
/// recovered (the pipeline treats such rasters as geographic unless told
/// otherwise).
pub fn read_geotiff<T, P>(path: P, band: Option<usize>) -> Result<Raster<T>>
where
    T: RasterElement,
    P: AsRef<Path>,
{
    if band.unwrap_or(1) != 1 {
        return Err(Error::UnsupportedDataType(
            "native reader only supports band 1".into(),
        ));
    }

    let file = File::open(path.as_ref())
        .map_err(|e| Error::RasterLoad(format!("{}: {e}", path.as_ref().display())))?;

    let mut decoder = Decoder::new(file)
        .map_err(|e| Error::RasterLoad(format!("TIFF decode error: {e}")))?;

    let (width, height) = decoder
        .dimensions()
        .map_err(|e| Error::RasterLoad(format!("cannot read dimensions: {e}")))?;

    let rows = height as usize;
    let cols = width as usize;

    let result = decoder
        .read_image()
        .map_err(|e| Error::RasterLoad(format!("cannot read image data: {e}")))?;

    let data: Vec<T> = match result {
        DecodingResult::U8(buf) => cast_buffer(&buf),
        DecodingResult::U16(buf) => cast_buffer(&buf),
        DecodingResult::U32(buf) => cast_buffer(&buf),
        DecodingResult::I8(buf) => cast_buffer(&buf),
        DecodingResult::I16(buf) => cast_buffer(&buf),
        DecodingResult::I32(buf) => cast_buffer(&buf),
        DecodingResult::F32(buf) => cast_buffer(&buf),
        DecodingResult::F64(buf) => cast_buffer(&buf),
        _ => {
            return Err(Error::UnsupportedDataType(
                "unsupported TIFF pixel format".to_string(),
            ))
        }
    };

    if data.len() != rows * cols {
        return Err(Error::InvalidDimensions {
            width: cols,
            height: rows,
        });
    }

    let mut raster = Raster::from_vec(data, rows, cols)?;

    if let Ok(transform) = read_geotransform(&mut decoder) {
        raster.set_transform(transform);
    }

    if let Ok(text) = decoder.get_tag_ascii_string(Tag::Unknown(GDAL_NODATA)) {
        if let Ok(nd) = text.trim().trim_end_matches('\0').parse::<f64>() {
            raster.set_nodata(num_traits::cast(nd));
        }
    }

    Ok(raster)
}

/// Read the embedded palette (TIFF ColorMap tag) of a palettized file.
///
/// Returns `Ok(None)` when no ColorMap is present. ColorMap stores
/// 16-bit reds, greens and blues in three consecutive runs; they are
/// scaled down to 8-bit RGBA with opaque alpha.
pub fn read_palette<P>(path: P, band: Option<usize>) -> Result<Option<Vec<PaletteEntry>>>
where
    P: AsRef<Path>,
{
    if band.unwrap_or(1) != 1 {
        return Err(Error::UnsupportedDataType(
            "native reader only supports band 1".into(),
        ));
    }

    let file = File::open(path.as_ref())
        .map_err(|e| Error::RasterLoad(format!("{}: {e}", path.as_ref().display())))?;
    let mut decoder = Decoder::new(file)
        .map_err(|e| Error::RasterLoad(format!("TIFF decode error: {e}")))?;

    let Ok(map) = decoder.get_tag_u16_vec(Tag::Unknown(COLOR_MAP)) else {
        return Ok(None);
    };

    if map.len() % 3 != 0 {
        return Err(Error::Other(format!(
            "malformed ColorMap tag of length {}",
            map.len()
        )));
    }

    let n = map.len() / 3;
    let mut entries = Vec::with_capacity(n);
    for i in 0..n {
        entries.push([
            (map[i] >> 8) as u8,
            (map[n + i] >> 8) as u8,
            (map[2 * n + i] >> 8) as u8,
            255,
        ]);
    }

    Ok(Some(entries))
}

fn cast_buffer<S, T>(buf: &[S]) -> Vec<T>
where
    S: Copy + num_traits::NumCast,
    T: RasterElement,
{
    buf.iter()
        .map(|&v| num_traits::cast(v).unwrap_or(T::default_nodata()))
        .collect()
}

/// Attempt to read the geotransform from GeoTIFF tags
fn read_geotransform<R: std::io::Read + std::io::Seek>(
    decoder: &mut Decoder<R>,
) -> Result<GeoTransform> {
    let scale = decoder
        .get_tag_f64_vec(Tag::Unknown(MODEL_PIXEL_SCALE))
        .map_err(|_| Error::Other("no pixel scale tag".into()))?;

    let tiepoint = decoder
        .get_tag_f64_vec(Tag::Unknown(MODEL_TIEPOINT))
        .map_err(|_| Error::Other("no tiepoint tag".into()))?;

    if scale.len() >= 2 && tiepoint.len() >= 6 {
        // tiepoint: [I, J, K, X, Y, Z]; scale: [ScaleX, ScaleY, ScaleZ]
        let origin_x = tiepoint[3] - tiepoint[0] * scale[0];
        let origin_y = tiepoint[4] + tiepoint[1] * scale[1];

        return Ok(GeoTransform::new(origin_x, origin_y, scale[0], -scale[1]));
    }

    Err(Error::Other("cannot determine geotransform".into()))
}

/// Write a Raster to a GeoTIFF file
///
/// `u8` rasters are written as 8-bit grayscale (category codes survive
/// byte-exact); every other element type is written as 32-bit float.
pub fn write_geotiff<T, P>(
    raster: &Raster<T>,
    path: P,
    _options: Option<GeoTiffOptions>,
) -> Result<()>
where
    T: RasterElement,
    P: AsRef<Path>,
{
    let file = File::create(path.as_ref())?;
    let mut encoder = TiffEncoder::new(file)
        .map_err(|e| Error::Other(format!("TIFF encoder error: {e}")))?;

    let (rows, cols) = raster.shape();

    if TypeId::of::<T>() == TypeId::of::<u8>() {
        let data: Vec<u8> = raster
            .data()
            .iter()
            .map(|&v| num_traits::cast(v).unwrap_or(0u8))
            .collect();
        let mut image = encoder
            .new_image::<Gray8>(cols as u32, rows as u32)
            .map_err(|e| Error::Other(format!("cannot create TIFF image: {e}")))?;
        write_geo_tags(&mut image, raster)?;
        image
            .write_data(&data)
            .map_err(|e| Error::Other(format!("cannot write image data: {e}")))?;
    } else {
        let data: Vec<f32> = raster
            .data()
            .iter()
            .map(|&v| num_traits::cast(v).unwrap_or(f32::NAN))
            .collect();
        let mut image = encoder
            .new_image::<Gray32Float>(cols as u32, rows as u32)
            .map_err(|e| Error::Other(format!("cannot create TIFF image: {e}")))?;
        write_geo_tags(&mut image, raster)?;
        image
            .write_data(&data)
            .map_err(|e| Error::Other(format!("cannot write image data: {e}")))?;
    }

    Ok(())
}

fn write_geo_tags<W, C, K, T>(
    image: &mut tiff::encoder::ImageEncoder<W, C, K>,
    raster: &Raster<T>,
) -> Result<()>
where
    W: std::io::Write + std::io::Seek,
    C: tiff::encoder::colortype::ColorType,
    K: tiff::encoder::TiffKind,
    T: RasterElement,
{
    let gt = raster.transform();

    let scale = [gt.pixel_width, gt.pixel_height.abs(), 0.0];
    image
        .encoder()
        .write_tag(Tag::Unknown(MODEL_PIXEL_SCALE), &scale[..])
        .map_err(|e| Error::Other(format!("cannot write scale tag: {e}")))?;

    let tiepoint = [0.0, 0.0, 0.0, gt.origin_x, gt.origin_y, 0.0];
    image
        .encoder()
        .write_tag(Tag::Unknown(MODEL_TIEPOINT), &tiepoint[..])
        .map_err(|e| Error::Other(format!("cannot write tiepoint tag: {e}")))?;

    // Minimal GeoKeyDirectory: GTModelTypeGeoKey=2 (Geographic),
    // GTRasterTypeGeoKey=1 (RasterPixelIsArea)
    let geokeys: [u16; 12] = [
        1, 1, 0, 2, //
        1024, 0, 1, 2, //
        1025, 0, 1, 1, //
    ];
    image
        .encoder()
        .write_tag(Tag::Unknown(GEO_KEY_DIRECTORY), &geokeys[..])
        .map_err(|e| Error::Other(format!("cannot write geokey tag: {e}")))?;

    if let Some(nodata) = raster.nodata().and_then(|v| v.to_f64()) {
        image
            .encoder()
            .write_tag(Tag::Unknown(GDAL_NODATA), format!("{nodata}").as_str())
            .map_err(|e| Error::Other(format!("cannot write nodata tag: {e}")))?;
    }

    Ok(())
}
