//! End-to-end pipeline test over synthetic data: clip -> aggregate ->
//! colorize -> align -> compose -> render -> composite.

use geo_types::{LineString, Polygon};
use terravista_algorithms::{aggregate_majority, clip_to_boundary, reproject};
use terravista_colormap::{
    colorize, composite_legend, draw_legend, ClassDef, ColorTable, LandCoverClass, LegendParams,
    PaletteOverride, Rgb, WATER_BLUE,
};
use terravista_core::raster::Raster;
use terravista_core::{Boundary, Crs, GeoTransform};
use terravista_scene::{align, compose, ReliefRenderer, RenderParams, Renderer};

/// Palette where codes {2,3,5,6,8,9,10,11} carry the curated colors;
/// the water entry (code 2) is pure black, as in the real source.
fn palette() -> Vec<[u8; 4]> {
    let mut palette = vec![[0u8, 0, 0, 255]; 16];
    palette[3] = [53, 130, 33, 255]; // trees
    palette[5] = [135, 209, 158, 255]; // flooded vegetation
    palette[6] = [255, 219, 92, 255]; // crops
    palette[8] = [237, 2, 42, 255]; // built area
    palette[9] = [237, 233, 228, 255]; // bare ground
    palette[10] = [242, 250, 255, 255]; // snow/ice
    palette[11] = [200, 200, 130, 255]; // rangeland
    palette
}

fn classes() -> Vec<ClassDef> {
    use LandCoverClass::*;
    vec![
        ClassDef::new(Water, 2),
        ClassDef::new(Trees, 3),
        ClassDef::new(FloodedVegetation, 5),
        ClassDef::new(Crops, 6),
        ClassDef::new(BuiltArea, 8),
        ClassDef::new(BareGround, 9),
        ClassDef::new(SnowIce, 10),
        ClassDef::new(Rangeland, 11),
    ]
}

/// 60x60 categorical raster over (7..8.2E, 46..47.2N) cycling through
/// the eight curated codes in 3x3 patches, plus stray codes 0 and 7.
fn land_cover() -> Raster<u8> {
    let codes = [2u8, 3, 5, 6, 8, 9, 10, 11];
    let mut values = Vec::with_capacity(60 * 60);
    for row in 0..60 {
        for col in 0..60 {
            if (row + col) % 17 == 0 {
                // stray, non-curated codes sprinkled in
                values.push(if row % 2 == 0 { 0 } else { 7 });
            } else {
                values.push(codes[((row / 3) * 20 + (col / 3)) % 8]);
            }
        }
    }
    let mut raster = Raster::from_vec(values, 60, 60).unwrap();
    raster.set_transform(GeoTransform::new(7.0, 47.2, 0.02, -0.02));
    raster.set_crs(Some(Crs::wgs84()));
    raster
}

/// A boundary fully containing the raster extent.
fn containing_boundary() -> Boundary {
    Boundary::from_polygon(
        Polygon::new(
            LineString::from(vec![
                (6.5, 45.5),
                (9.0, 45.5),
                (9.0, 47.5),
                (6.5, 47.5),
                (6.5, 45.5),
            ]),
            vec![],
        ),
        Crs::wgs84(),
    )
}

/// Synthetic DEM on a different native grid than the land cover.
fn dem() -> Raster<f32> {
    let (rows, cols) = (48, 52);
    let mut heights = Vec::with_capacity(rows * cols);
    for row in 0..rows {
        for col in 0..cols {
            let ridge = ((col as f32 / cols as f32) * std::f32::consts::PI).sin();
            heights.push(400.0 + 1200.0 * ridge + row as f32);
        }
    }
    let mut dem = Raster::from_vec(heights, rows, cols).unwrap();
    dem.set_transform(GeoTransform::new(
        7.0,
        47.2,
        1.2 / cols as f64,
        -1.2 / rows as f64,
    ));
    dem.set_crs(Some(Crs::wgs84()));
    dem.set_nodata(Some(f32::NAN));
    dem
}

#[test]
fn colorizer_yields_exactly_the_eight_curated_colors() {
    let table =
        ColorTable::from_palette(&palette(), &classes(), PaletteOverride::default()).unwrap();

    let clipped = clip_to_boundary(&land_cover(), &containing_boundary(), u8::MAX).unwrap();
    let aggregated = aggregate_majority(&clipped, 3).unwrap();
    let geographic = reproject(&aggregated, &Crs::wgs84()).unwrap();
    let color = colorize(&geographic, &table).unwrap();

    let colors = color.distinct_colors();
    assert_eq!(colors.len(), 8, "got {colors:?}");
    assert!(colors.contains(&WATER_BLUE));
    assert!(!colors.contains(&Rgb::new(0, 0, 0)), "black must not appear");
    for entry in table.entries() {
        assert!(colors.contains(&entry.color), "missing {}", entry.label);
    }
}

#[test]
fn alignment_produces_twin_grids_on_the_dem_shape() {
    let table =
        ColorTable::from_palette(&palette(), &classes(), PaletteOverride::default()).unwrap();
    let color = colorize(&land_cover(), &table).unwrap();
    let dem = dem();
    let (dem_rows, dem_cols) = dem.shape();

    let pair = align(&color, &dem, &Crs::laea(46.6, 7.6)).unwrap();

    assert_eq!(pair.elevation().shape(), (dem_rows, dem_cols));
    assert_eq!(pair.color().shape(), (dem_rows, dem_cols));
    assert_eq!(pair.color().transform(), pair.elevation().transform());
}

#[test]
fn full_pipeline_renders_and_composites() {
    let table =
        ColorTable::from_palette(&palette(), &classes(), PaletteOverride::default()).unwrap();

    let clipped = clip_to_boundary(&land_cover(), &containing_boundary(), u8::MAX).unwrap();
    let aggregated = aggregate_majority(&clipped, 2).unwrap();
    let color = colorize(&aggregated, &table).unwrap();

    let pair = align(&color, &dem(), &Crs::laea(46.6, 7.6)).unwrap();
    let scene = compose(&pair, RenderParams::default(), None).unwrap();
    let rendered = ReliefRenderer::new().render(&scene).unwrap();

    assert_eq!(rendered.dimensions(), scene.output_dimensions());

    // rendered colors only darken curated colors; no color appears over
    // transparent cells
    let legend = draw_legend(
        &table,
        &LegendParams {
            labels: false,
            ..Default::default()
        },
    )
    .unwrap();

    let final_image = composite_legend(&rendered, &legend, 0.2, 16);
    assert_eq!(
        final_image.dimensions(),
        rendered.dimensions(),
        "legend overlay must never resize the scene"
    );
}
