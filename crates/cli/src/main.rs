//! Terravista CLI - land-cover 3D terrain visualization

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::time::Instant;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use terravista_algorithms::{aggregate_majority, clip_to_boundary, reproject};
use terravista_colormap::{
    colorize, composite_legend, draw_legend, ClassDef, ColorTable, LegendParams, PaletteOverride,
};
use terravista_core::io::{read_geotiff, read_palette, write_geotiff, write_vrt};
use terravista_core::raster::Raster;
use terravista_core::Crs;
use terravista_providers::{
    AssetCache, AssetFetcher, BoundaryProvider, ElevationProvider, GiscoBoundaries,
    ResolutionTier, TerrainTiles,
};
use terravista_scene::{align, compose, CameraParams, ReliefRenderer, RenderParams, Renderer};

mod preview;

// ─── CLI structure ──────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "terravista")]
#[command(author, version, about = "Land-cover 3D terrain visualization", long_about = None)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show information about a raster file
    Info {
        /// Input raster file
        input: PathBuf,
    },
    /// Run the full pipeline: clip, aggregate, colorize, align, render,
    /// composite
    Render(RenderArgs),
}

#[derive(clap::Args)]
struct RenderArgs {
    /// Input categorical land-cover raster (single band, embedded
    /// palette)
    #[arg(long)]
    landcover: PathBuf,

    /// Region identifier (country ISO code)
    #[arg(long)]
    region: String,

    /// Boundary resolution tier: 01m, 03m, 10m, 20m, 60m
    #[arg(long, default_value = "01m")]
    tier: String,

    /// Aggregation factor (k x k majority vote; 1 = no aggregation)
    #[arg(short = 'k', long, default_value = "10")]
    aggregate: usize,

    /// Elevation tile zoom level
    #[arg(long, default_value = "10")]
    zoom: u8,

    /// Projection center latitude (defaults to the boundary centroid)
    #[arg(long)]
    center_lat: Option<f64>,

    /// Projection center longitude (defaults to the boundary centroid)
    #[arg(long)]
    center_lon: Option<f64>,

    /// Vertical exaggeration
    #[arg(long, default_value = "1.5")]
    exaggeration: f64,

    /// Shadow intensity (0 disables shading)
    #[arg(long, default_value = "0.8")]
    shadow: f64,

    /// Sun azimuth in degrees (0 = North, clockwise)
    #[arg(long, default_value = "315")]
    sun_azimuth: f64,

    /// Sun altitude in degrees above the horizon
    #[arg(long, default_value = "45")]
    sun_altitude: f64,

    /// Camera azimuth in degrees
    #[arg(long, default_value = "0")]
    camera_azimuth: f64,

    /// Camera altitude in degrees
    #[arg(long, default_value = "40")]
    camera_altitude: f64,

    /// Camera zoom factor
    #[arg(long, default_value = "0.6")]
    camera_zoom: f64,

    /// Integer output upscale relative to the elevation grid
    #[arg(long, default_value = "1")]
    output_scale: u32,

    /// Environment lighting asset URL (passed to the renderer)
    #[arg(long)]
    environment_url: Option<String>,

    /// TTF/OTF font for legend labels
    #[arg(long)]
    font: Option<PathBuf>,

    /// Draw the legend without labels (no font needed)
    #[arg(long)]
    no_labels: bool,

    /// Legend width as a fraction of the scene width
    #[arg(long, default_value = "0.22")]
    legend_fraction: f32,

    /// Legend corner inset in pixels
    #[arg(long, default_value = "24")]
    legend_margin: u32,

    /// Keep pure-black palette entries instead of remapping them to
    /// water blue
    #[arg(long)]
    keep_black: bool,

    /// Output directory for all artifacts
    #[arg(short, long, default_value = "out")]
    out_dir: PathBuf,
}

// ─── Helpers ────────────────────────────────────────────────────────────

fn setup_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");
}

fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap(),
    );
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

fn stage<T>(msg: &str, f: impl FnOnce() -> Result<T>) -> Result<T> {
    let pb = spinner(msg);
    let start = Instant::now();
    let result = f();
    pb.finish_and_clear();
    if result.is_ok() {
        info!("{} ({:.2?})", msg, start.elapsed());
    }
    result
}

// ─── Main ───────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    match cli.command {
        Commands::Info { input } => run_info(&input),
        Commands::Render(args) => run_render(&args),
    }
}

fn run_info(input: &PathBuf) -> Result<()> {
    let raster: Raster<f64> =
        read_geotiff(input, None).context("Failed to read raster")?;
    let (rows, cols) = raster.shape();
    let bounds = raster.bounds();
    let stats = raster.statistics();

    println!("File: {}", input.display());
    println!("Dimensions: {} x {} ({} cells)", cols, rows, raster.len());
    println!("Cell size: {}", raster.cell_size());
    println!(
        "Bounds: ({:.6}, {:.6}) - ({:.6}, {:.6})",
        bounds.0, bounds.1, bounds.2, bounds.3
    );
    if let Some(crs) = raster.crs() {
        println!("CRS: {}", crs);
    }
    if let Some(nodata) = raster.nodata() {
        println!("NoData: {}", nodata);
    }
    println!("\nStatistics:");
    if let Some(min) = stats.min {
        println!("  Min: {:.4}", min);
    }
    if let Some(max) = stats.max {
        println!("  Max: {:.4}", max);
    }
    if let Some(mean) = stats.mean {
        println!("  Mean: {:.4}", mean);
    }
    println!(
        "  Valid cells: {} ({:.1}%)",
        stats.valid_count,
        100.0 * stats.valid_count as f64 / raster.len() as f64
    );

    Ok(())
}

fn run_render(args: &RenderArgs) -> Result<()> {
    let start = Instant::now();
    std::fs::create_dir_all(&args.out_dir)
        .with_context(|| format!("Failed to create {}", args.out_dir.display()))?;
    let out = |name: &str| args.out_dir.join(name);

    let tier: ResolutionTier = args
        .tier
        .parse()
        .map_err(|e: String| anyhow::anyhow!(e))
        .context("Invalid --tier")?;

    // ── Stage 1: boundary ───────────────────────────────────────────
    let boundaries = GiscoBoundaries::new().context("Failed to build boundary provider")?;
    let boundary = stage("Resolving region boundary", || {
        Ok(boundaries.resolve(&args.region, tier)?)
    })
    .with_context(|| format!("Failed to resolve boundary for '{}'", args.region))?;

    preview::save_boundary_preview(&boundary, 1024, out("boundary.png"))
        .context("Failed to write boundary preview")?;

    // ── Stage 2: clip + aggregate ───────────────────────────────────
    let source: Raster<u8> = stage("Reading land-cover raster", || {
        Ok(read_geotiff(&args.landcover, None)?)
    })
    .with_context(|| format!("Failed to load {}", args.landcover.display()))?;
    info!(
        "Land cover: {} x {} in {}",
        source.cols(),
        source.rows(),
        source
            .crs()
            .map(|c| c.to_string())
            .unwrap_or_else(|| "unknown CRS".into())
    );

    let palette = read_palette(&args.landcover, None)
        .context("Failed to read embedded palette")?
        .context("The land-cover raster carries no embedded color table")?;

    let clipped = stage("Clipping to the boundary", || {
        Ok(clip_to_boundary(&source, &boundary, u8::MAX)?)
    })
    .context("Failed to clip the land-cover raster")?;
    drop(source);

    let aggregated = stage("Aggregating by majority vote", || {
        Ok(aggregate_majority(&clipped, args.aggregate)?)
    })
    .context("Failed to aggregate")?;
    info!(
        "Aggregated {} x {} -> {} x {} (k = {})",
        clipped.cols(),
        clipped.rows(),
        aggregated.cols(),
        aggregated.rows(),
        args.aggregate
    );
    drop(clipped);

    let geographic = stage("Reprojecting to the working CRS", || {
        Ok(reproject(&aggregated, &Crs::wgs84())?)
    })
    .context("Failed to reproject the aggregated raster")?;

    write_geotiff(&geographic, out("landcover_clipped.tif"), None)
        .context("Failed to write the clipped raster")?;
    write_vrt(
        &geographic,
        out("landcover_clipped.tif"),
        out("landcover_clipped.vrt"),
    )
    .context("Failed to write the VRT sidecar")?;

    // ── Stage 3: color table + colorization ─────────────────────────
    let policy = if args.keep_black {
        PaletteOverride::KeepBlack
    } else {
        PaletteOverride::default()
    };
    let table = ColorTable::from_palette(&palette, &ClassDef::curated_defaults(), policy)
        .context("Palette validation failed")?;
    for entry in table.entries() {
        info!("  {:<20} code {:>3}  {}", entry.label, entry.code, entry.color.to_hex());
    }

    let color = stage("Colorizing", || Ok(colorize(&geographic, &table)?))
        .context("Failed to colorize")?;
    color
        .to_image()
        .save(out("landcover_preview.png"))
        .context("Failed to write the land-cover preview")?;

    // ── Stage 4: elevation + alignment ──────────────────────────────
    let cache = args.out_dir.join("cache");
    let tiles = TerrainTiles::new()
        .context("Failed to build elevation provider")?
        .with_cache_dir(&cache);

    let bounds = geographic.bounds();
    let dem = stage("Fetching elevation", || {
        Ok(tiles.fetch(bounds, args.zoom)?)
    })
    .context("Failed to fetch elevation")?;
    info!("Elevation grid: {} x {}", dem.cols(), dem.rows());

    let (center_lon, center_lat) = match (args.center_lon, args.center_lat) {
        (Some(lon), Some(lat)) => (lon, lat),
        _ => boundary
            .projected(&Crs::wgs84())?
            .centroid()
            .context("Failed to find the boundary centroid")?,
    };
    let working_crs = Crs::laea(center_lat, center_lon);
    info!("Working projection: {}", working_crs);

    let pair = stage("Aligning color and elevation", || {
        Ok(align(&color, &dem, &working_crs)?)
    })
    .context("Failed to align the color raster with the DEM")?;

    // ── Stage 5: scene + render ─────────────────────────────────────
    let environment = match &args.environment_url {
        Some(url) => {
            let assets = AssetCache::new(&cache).context("Failed to build asset cache")?;
            Some(
                stage("Fetching environment lighting", || Ok(assets.fetch(url)?))
                    .context("Failed to fetch the environment asset")?,
            )
        }
        None => None,
    };

    let params = RenderParams {
        exaggeration: args.exaggeration,
        shadow_intensity: args.shadow,
        sun_azimuth: args.sun_azimuth,
        sun_altitude: args.sun_altitude,
        camera: CameraParams {
            azimuth: args.camera_azimuth,
            altitude: args.camera_altitude,
            zoom: args.camera_zoom,
        },
        output_scale: args.output_scale,
    };

    let scene = stage("Composing the scene", || {
        Ok(compose(&pair, params, environment)?)
    })
    .context("Failed to compose the scene")?;

    let rendered = stage("Rendering", || Ok(ReliefRenderer::new().render(&scene)?))
        .context("Render failed")?;
    rendered
        .save(out("render.png"))
        .context("Failed to write the rendered scene")?;

    // ── Stage 6: legend + final composite ───────────────────────────
    if args.no_labels && args.font.is_some() {
        warn!("--font is ignored with --no-labels");
    }
    let legend_params = LegendParams {
        labels: !args.no_labels,
        font_path: args.font.clone(),
        ..Default::default()
    };
    let legend = draw_legend(&table, &legend_params).context("Failed to draw the legend")?;
    legend
        .save(out("legend.png"))
        .context("Failed to write the legend")?;

    let final_image = composite_legend(&rendered, &legend, args.legend_fraction, args.legend_margin);
    final_image
        .save(out("final.png"))
        .context("Failed to write the final composite")?;

    println!("Final composite saved to: {}", out("final.png").display());
    println!("  Total time: {:.2?}", start.elapsed());

    Ok(())
}
