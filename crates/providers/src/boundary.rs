//! Country boundary provider (GISCO-style GeoJSON distribution)
//!
//! Fetches a single country's region geometry by ISO code and scale
//! tier from a GeoJSON distribution service and returns it as a
//! [`Boundary`] in WGS84.

use crate::{BoundaryProvider, ProviderError, Result};
use geo_types::{Geometry, MultiPolygon};
use geojson::GeoJson;
use std::time::Duration;
use terravista_core::{Boundary, Crs};
use tracing::debug;

/// Boundary resolution tiers offered by the distribution service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionTier {
    /// 1:1 million (most detailed)
    Scale1M,
    /// 1:3 million
    Scale3M,
    /// 1:10 million
    Scale10M,
    /// 1:20 million
    Scale20M,
    /// 1:60 million (coarsest)
    Scale60M,
}

impl ResolutionTier {
    /// Scale token used in distribution file names
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Scale1M => "01m",
            Self::Scale3M => "03m",
            Self::Scale10M => "10m",
            Self::Scale20M => "20m",
            Self::Scale60M => "60m",
        }
    }
}

impl std::str::FromStr for ResolutionTier {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "01m" | "1m" => Ok(Self::Scale1M),
            "03m" | "3m" => Ok(Self::Scale3M),
            "10m" => Ok(Self::Scale10M),
            "20m" => Ok(Self::Scale20M),
            "60m" => Ok(Self::Scale60M),
            other => Err(format!("unknown resolution tier '{other}'")),
        }
    }
}

const DEFAULT_BASE_URL: &str =
    "https://gisco-services.ec.europa.eu/distribution/v2/countries/distribution";

/// HTTP boundary provider for per-country GeoJSON files.
pub struct GiscoBoundaries {
    base_url: String,
    client: reqwest::blocking::Client,
}

impl GiscoBoundaries {
    /// Provider against the default distribution service
    pub fn new() -> Result<Self> {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    /// Provider against a custom base URL (mirrors, tests)
    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()?;
        Ok(Self {
            base_url: base_url.into(),
            client,
        })
    }

    /// Distribution URL for a region/tier pair
    pub fn url_for(&self, region: &str, tier: ResolutionTier) -> String {
        format!(
            "{}/{}-region-{}.geojson",
            self.base_url,
            region.to_uppercase(),
            tier.as_str()
        )
    }
}

impl BoundaryProvider for GiscoBoundaries {
    fn resolve(&self, region: &str, tier: ResolutionTier) -> Result<Boundary> {
        let url = self.url_for(region, tier);
        debug!(url, "fetching boundary");

        let response = self.client.get(&url).send()?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(ProviderError::BoundaryNotFound(region.to_string()));
        }
        if !response.status().is_success() {
            return Err(ProviderError::AssetFetch(format!(
                "HTTP {} fetching {url}",
                response.status()
            )));
        }

        let body = response.text()?;
        parse_boundary(&body, region)
    }
}

/// Parse a GeoJSON document into a boundary, collecting every polygon it
/// carries. The distribution files are served in WGS84.
pub fn parse_boundary(geojson_text: &str, region: &str) -> Result<Boundary> {
    let parsed: GeoJson = geojson_text
        .parse()
        .map_err(|e| ProviderError::Decode(format!("invalid GeoJSON: {e}")))?;

    let mut polygons = Vec::new();
    match parsed {
        GeoJson::FeatureCollection(fc) => {
            for feature in fc.features {
                if let Some(geometry) = feature.geometry {
                    collect_polygons(geometry, &mut polygons)?;
                }
            }
        }
        GeoJson::Feature(feature) => {
            if let Some(geometry) = feature.geometry {
                collect_polygons(geometry, &mut polygons)?;
            }
        }
        GeoJson::Geometry(geometry) => collect_polygons(geometry, &mut polygons)?,
    }

    if polygons.is_empty() {
        return Err(ProviderError::BoundaryNotFound(region.to_string()));
    }

    Ok(Boundary::new(MultiPolygon(polygons), Crs::wgs84()))
}

fn collect_polygons(
    geometry: geojson::Geometry,
    polygons: &mut Vec<geo_types::Polygon<f64>>,
) -> Result<()> {
    let geometry: Geometry<f64> = geometry
        .value
        .try_into()
        .map_err(|e| ProviderError::Decode(format!("unsupported geometry: {e}")))?;

    match geometry {
        Geometry::Polygon(p) => polygons.push(p),
        Geometry::MultiPolygon(mp) => polygons.extend(mp.0),
        // points/lines in the document are not boundary material
        _ => {}
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIXTURE: &str = r#"{
        "type": "FeatureCollection",
        "features": [{
            "type": "Feature",
            "properties": {"CNTR_ID": "AD"},
            "geometry": {
                "type": "Polygon",
                "coordinates": [[[1.4, 42.4], [1.8, 42.4], [1.8, 42.7], [1.4, 42.7], [1.4, 42.4]]]
            }
        }]
    }"#;

    #[test]
    fn url_formatting() {
        let provider = GiscoBoundaries::with_base_url("https://example.org/dist").unwrap();
        assert_eq!(
            provider.url_for("ad", ResolutionTier::Scale1M),
            "https://example.org/dist/AD-region-01m.geojson"
        );
        assert_eq!(
            provider.url_for("CH", ResolutionTier::Scale10M),
            "https://example.org/dist/CH-region-10m.geojson"
        );
    }

    #[test]
    fn tier_parsing() {
        assert_eq!("01m".parse::<ResolutionTier>(), Ok(ResolutionTier::Scale1M));
        assert_eq!("10M".parse::<ResolutionTier>(), Ok(ResolutionTier::Scale10M));
        assert!("5m".parse::<ResolutionTier>().is_err());
    }

    #[test]
    fn parses_feature_collection() {
        let boundary = parse_boundary(FIXTURE, "AD").unwrap();
        let (min_x, min_y, max_x, max_y) = boundary.bounds().unwrap();
        assert_eq!((min_x, min_y, max_x, max_y), (1.4, 42.4, 1.8, 42.7));
        assert!(boundary.contains_point(1.6, 42.5));
    }

    #[test]
    fn document_without_polygons_is_not_found() {
        let doc = r#"{"type": "Feature", "properties": {},
            "geometry": {"type": "Point", "coordinates": [1.0, 2.0]}}"#;
        assert!(matches!(
            parse_boundary(doc, "XX"),
            Err(ProviderError::BoundaryNotFound(_))
        ));
    }

    #[test]
    fn garbage_is_a_decode_error() {
        assert!(matches!(
            parse_boundary("not json", "XX"),
            Err(ProviderError::Decode(_))
        ));
    }
}
