//! Coordinate Reference System handling

mod laea;
mod utm;

pub use laea::Laea;
pub use utm::UtmZone;

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Coordinate Reference System representation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Crs {
    /// WKT representation
    wkt: Option<String>,
    /// EPSG code if known
    epsg: Option<u32>,
    /// PROJ string if available
    proj: Option<String>,
}

impl Crs {
    /// Create a CRS from an EPSG code
    pub fn from_epsg(code: u32) -> Self {
        Self {
            wkt: None,
            epsg: Some(code),
            proj: None,
        }
    }

    /// Create a CRS from a WKT string
    pub fn from_wkt(wkt: impl Into<String>) -> Self {
        Self {
            wkt: Some(wkt.into()),
            epsg: None,
            proj: None,
        }
    }

    /// Create a CRS from a PROJ string
    pub fn from_proj(proj: impl Into<String>) -> Self {
        Self {
            wkt: None,
            epsg: None,
            proj: Some(proj.into()),
        }
    }

    /// WGS84 geographic CRS (EPSG:4326)
    pub fn wgs84() -> Self {
        Self::from_epsg(4326)
    }

    /// Lambert azimuthal equal-area centered on (`lat_0`, `lon_0`),
    /// the pipeline's working projection for terrain composition
    pub fn laea(lat_0: f64, lon_0: f64) -> Self {
        Self::from_proj(format!(
            "+proj=laea +lat_0={lat_0} +lon_0={lon_0} +x_0=0 +y_0=0 +datum=WGS84 +units=m +no_defs"
        ))
    }

    /// Get EPSG code if known
    pub fn epsg(&self) -> Option<u32> {
        self.epsg
    }

    /// Get WKT representation
    pub fn wkt(&self) -> Option<&str> {
        self.wkt.as_deref()
    }

    /// Get PROJ string
    pub fn proj(&self) -> Option<&str> {
        self.proj.as_deref()
    }

    /// Whether this CRS is geographic WGS84 (degrees)
    pub fn is_geographic(&self) -> bool {
        self.epsg == Some(4326)
            || self
                .proj
                .as_deref()
                .is_some_and(|p| p.contains("+proj=longlat"))
    }

    /// Check if two CRS are equivalent
    pub fn is_equivalent(&self, other: &Crs) -> bool {
        if let (Some(a), Some(b)) = (self.epsg, other.epsg) {
            return a == b;
        }
        if let (Some(a), Some(b)) = (&self.wkt, &other.wkt) {
            return a == b;
        }
        if let (Some(a), Some(b)) = (&self.proj, &other.proj) {
            return a == b;
        }
        false
    }

    /// A short string identifier for this CRS
    pub fn identifier(&self) -> String {
        if let Some(code) = self.epsg {
            return format!("EPSG:{}", code);
        }
        if let Some(proj) = &self.proj {
            return proj.clone();
        }
        if let Some(wkt) = &self.wkt {
            return format!("WKT:{}", &wkt[..wkt.len().min(50)]);
        }
        "Unknown".to_string()
    }
}

impl fmt::Display for Crs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.identifier())
    }
}

impl Default for Crs {
    fn default() -> Self {
        Self::wgs84()
    }
}

/// A projection engine for the CRSs the pipeline can transform between.
///
/// `forward` maps WGS84 (lon, lat) degrees into the CRS's map plane;
/// `inverse` maps back. `Geographic` is the identity in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Projection {
    /// WGS84 geographic coordinates (identity)
    Geographic,
    /// UTM transverse Mercator (EPSG 326xx / 327xx)
    Utm(UtmZone),
    /// Lambert azimuthal equal-area centered on a reference point
    Laea(Laea),
}

impl Projection {
    /// Build the projection engine for a CRS.
    ///
    /// Supported: EPSG:4326, UTM EPSG codes (326xx/327xx) and
    /// `+proj=laea` PROJ strings, the CRSs this pipeline warps between.
    /// Anything else is `Error::UnsupportedCrs`.
    pub fn from_crs(crs: &Crs) -> Result<Self> {
        if crs.is_geographic() {
            return Ok(Projection::Geographic);
        }
        if let Some(zone) = crs.epsg().and_then(UtmZone::from_epsg) {
            return Ok(Projection::Utm(zone));
        }
        if let Some(proj) = crs.proj() {
            if proj.contains("+proj=laea") {
                let lat_0 = parse_proj_param(proj, "lat_0")?;
                let lon_0 = parse_proj_param(proj, "lon_0")?;
                return Ok(Projection::Laea(Laea::new(lat_0, lon_0)));
            }
        }
        Err(Error::UnsupportedCrs(crs.identifier()))
    }

    /// WGS84 (lon, lat) degrees -> map plane coordinates
    pub fn forward(&self, lon: f64, lat: f64) -> (f64, f64) {
        match self {
            Projection::Geographic => (lon, lat),
            Projection::Utm(zone) => zone.forward(lon, lat),
            Projection::Laea(laea) => laea.forward(lon, lat),
        }
    }

    /// Map plane coordinates -> WGS84 (lon, lat) degrees
    pub fn inverse(&self, x: f64, y: f64) -> (f64, f64) {
        match self {
            Projection::Geographic => (x, y),
            Projection::Utm(zone) => zone.inverse(x, y),
            Projection::Laea(laea) => laea.inverse(x, y),
        }
    }
}

fn parse_proj_param(proj: &str, name: &str) -> Result<f64> {
    let key = format!("+{name}=");
    proj.split_whitespace()
        .find_map(|tok| tok.strip_prefix(key.as_str()))
        .and_then(|v| v.parse::<f64>().ok())
        .ok_or_else(|| Error::UnsupportedCrs(format!("missing {name} in '{proj}'")))
}
