//! I/O operations for reading and writing geospatial data

#[cfg(feature = "gdal")]
mod gdal_io;
#[cfg(not(feature = "gdal"))]
mod native;

#[cfg(feature = "gdal")]
pub use gdal_io::{read_geotiff, read_palette, write_geotiff, GeoTiffOptions};

#[cfg(not(feature = "gdal"))]
pub use native::{read_geotiff, read_palette, write_geotiff, GeoTiffOptions};

use crate::error::Result;
use crate::raster::{Raster, RasterElement};
use std::any::TypeId;
use std::io::Write;
use std::path::Path;

/// An RGBA palette entry from an embedded color table, indexed by
/// category code.
pub type PaletteEntry = [u8; 4];

/// Write a VRT sidecar that lazily references a raster file.
///
/// The VRT addresses the whole raster as a single `SimpleSource`, so
/// downstream GDAL-based tools can mosaic or re-read it without copying
/// the data.
pub fn write_vrt<T, P, Q>(raster: &Raster<T>, raster_path: P, vrt_path: Q) -> Result<()>
where
    T: RasterElement,
    P: AsRef<Path>,
    Q: AsRef<Path>,
{
    let (rows, cols) = raster.shape();
    let gt = raster.transform().to_gdal();

    let source_name = raster_path
        .as_ref()
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| raster_path.as_ref().display().to_string());

    let mut xml = String::new();
    xml.push_str(&format!(
        "<VRTDataset rasterXSize=\"{cols}\" rasterYSize=\"{rows}\">\n"
    ));
    if let Some(crs) = raster.crs() {
        if let Some(epsg) = crs.epsg() {
            xml.push_str(&format!("  <SRS>EPSG:{epsg}</SRS>\n"));
        } else if let Some(proj) = crs.proj() {
            xml.push_str(&format!("  <SRS>{proj}</SRS>\n"));
        }
    }
    xml.push_str(&format!(
        "  <GeoTransform>{}, {}, {}, {}, {}, {}</GeoTransform>\n",
        gt[0], gt[1], gt[2], gt[3], gt[4], gt[5]
    ));
    xml.push_str(&format!(
        "  <VRTRasterBand dataType=\"{}\" band=\"1\">\n",
        vrt_data_type::<T>()
    ));
    if let Some(nodata) = raster.nodata().and_then(|v| v.to_f64()) {
        xml.push_str(&format!("    <NoDataValue>{nodata}</NoDataValue>\n"));
    }
    xml.push_str("    <SimpleSource>\n");
    xml.push_str(&format!(
        "      <SourceFilename relativeToVRT=\"1\">{source_name}</SourceFilename>\n"
    ));
    xml.push_str("      <SourceBand>1</SourceBand>\n");
    xml.push_str(&format!(
        "      <SrcRect xOff=\"0\" yOff=\"0\" xSize=\"{cols}\" ySize=\"{rows}\"/>\n"
    ));
    xml.push_str(&format!(
        "      <DstRect xOff=\"0\" yOff=\"0\" xSize=\"{cols}\" ySize=\"{rows}\"/>\n"
    ));
    xml.push_str("    </SimpleSource>\n");
    xml.push_str("  </VRTRasterBand>\n");
    xml.push_str("</VRTDataset>\n");

    let mut file = std::fs::File::create(vrt_path.as_ref())?;
    file.write_all(xml.as_bytes())?;
    Ok(())
}

fn vrt_data_type<T: RasterElement>() -> &'static str {
    let id = TypeId::of::<T>();
    if id == TypeId::of::<u8>() {
        "Byte"
    } else if id == TypeId::of::<u16>() {
        "UInt16"
    } else if id == TypeId::of::<u32>() {
        "UInt32"
    } else if id == TypeId::of::<i16>() {
        "Int16"
    } else if id == TypeId::of::<i32>() {
        "Int32"
    } else if id == TypeId::of::<f32>() {
        "Float32"
    } else {
        "Float64"
    }
}
