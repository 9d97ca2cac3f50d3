//! # Terravista Colormap
//!
//! Category-to-color mapping for land-cover rasters:
//!
//! - [`ColorTable`]: ordered code → RGB mapping built from a raster's
//!   embedded palette, with the black-entry disambiguation policy
//! - [`colorize`]: categorical raster → [`ColorRaster`]
//! - [`legend`]: legend drawing and final image compositing

mod colorize;
mod legend;
mod table;

pub use colorize::{colorize, ColorRaster};
pub use legend::{composite_legend, draw_legend, LegendParams};
pub use table::{
    CategoryColor, ClassDef, ColorTable, LandCoverClass, PaletteOverride, Rgb, WATER_BLUE,
};

use thiserror::Error;

/// Errors raised while building color tables or drawing legends
#[derive(Error, Debug)]
pub enum Error {
    #[error("palette has no entry for {label} (code {code}, palette holds {palette_len} entries)")]
    MissingPaletteEntry {
        label: &'static str,
        code: u8,
        palette_len: usize,
    },

    #[error("duplicate category code {0} in class mapping")]
    DuplicateCode(u8),

    #[error("empty color table")]
    EmptyTable,

    #[error("legend font unavailable: {0}")]
    LegendFont(String),

    #[error(transparent)]
    Core(#[from] terravista_core::Error),

    #[error(transparent)]
    Algorithm(#[from] terravista_algorithms::Error),
}

/// Result type alias for colormap operations
pub type Result<T> = std::result::Result<T, Error>;
