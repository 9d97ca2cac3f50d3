//! Region boundary geometry

use crate::crs::{Crs, Projection};
use crate::error::{Error, Result};
use geo::algorithm::{BoundingRect, Centroid, Contains, MapCoords};
use geo_types::{Coord, Geometry, MultiPolygon, Point, Polygon};

/// A region boundary: a multipolygon with an associated CRS.
///
/// Boundaries are immutable once resolved; projecting one yields a new
/// value. Raster clipping always brings the boundary into the raster's
/// CRS, never the other way around.
#[derive(Debug, Clone)]
pub struct Boundary {
    geometry: MultiPolygon<f64>,
    crs: Crs,
}

impl Boundary {
    /// Create a boundary from a multipolygon
    pub fn new(geometry: MultiPolygon<f64>, crs: Crs) -> Self {
        Self { geometry, crs }
    }

    /// Create a boundary from a single polygon
    pub fn from_polygon(polygon: Polygon<f64>, crs: Crs) -> Self {
        Self {
            geometry: MultiPolygon(vec![polygon]),
            crs,
        }
    }

    /// Create a boundary from any polygonal `geo` geometry
    pub fn from_geometry(geometry: Geometry<f64>, crs: Crs) -> Result<Self> {
        match geometry {
            Geometry::Polygon(p) => Ok(Self::from_polygon(p, crs)),
            Geometry::MultiPolygon(mp) => Ok(Self::new(mp, crs)),
            other => Err(Error::Other(format!(
                "boundary must be polygonal, got {:?}",
                geometry_kind(&other)
            ))),
        }
    }

    /// The boundary geometry
    pub fn geometry(&self) -> &MultiPolygon<f64> {
        &self.geometry
    }

    /// The boundary CRS
    pub fn crs(&self) -> &Crs {
        &self.crs
    }

    /// Bounding box (min_x, min_y, max_x, max_y)
    pub fn bounds(&self) -> Result<(f64, f64, f64, f64)> {
        let rect = self
            .geometry
            .bounding_rect()
            .ok_or_else(|| Error::Other("empty boundary geometry".into()))?;
        Ok((rect.min().x, rect.min().y, rect.max().x, rect.max().y))
    }

    /// Whether the boundary contains the point (x, y), in the boundary's CRS
    pub fn contains_point(&self, x: f64, y: f64) -> bool {
        self.geometry.contains(&Point::new(x, y))
    }

    /// Centroid (x, y) in the boundary's CRS
    pub fn centroid(&self) -> Result<(f64, f64)> {
        let c = self
            .geometry
            .centroid()
            .ok_or_else(|| Error::Other("empty boundary geometry".into()))?;
        Ok((c.x(), c.y()))
    }

    /// Project the boundary into another CRS, returning a new boundary.
    ///
    /// Both CRSs must be expressible as a [`Projection`]; vertices go
    /// through WGS84 as the common intermediate.
    pub fn projected(&self, target: &Crs) -> Result<Boundary> {
        if self.crs.is_equivalent(target) {
            return Ok(self.clone());
        }

        let from = Projection::from_crs(&self.crs)?;
        let to = Projection::from_crs(target)?;

        let geometry = self.geometry.map_coords(|Coord { x, y }| {
            let (lon, lat) = from.inverse(x, y);
            let (x2, y2) = to.forward(lon, lat);
            Coord { x: x2, y: y2 }
        });

        Ok(Boundary {
            geometry,
            crs: target.clone(),
        })
    }
}

fn geometry_kind(geometry: &Geometry<f64>) -> &'static str {
    match geometry {
        Geometry::Point(_) => "Point",
        Geometry::Line(_) => "Line",
        Geometry::LineString(_) => "LineString",
        Geometry::Polygon(_) => "Polygon",
        Geometry::MultiPoint(_) => "MultiPoint",
        Geometry::MultiLineString(_) => "MultiLineString",
        Geometry::MultiPolygon(_) => "MultiPolygon",
        Geometry::GeometryCollection(_) => "GeometryCollection",
        Geometry::Rect(_) => "Rect",
        Geometry::Triangle(_) => "Triangle",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo_types::LineString;

    fn square(min: f64, max: f64) -> Polygon<f64> {
        Polygon::new(
            LineString::from(vec![
                (min, min),
                (max, min),
                (max, max),
                (min, max),
                (min, min),
            ]),
            vec![],
        )
    }

    #[test]
    fn bounds_and_containment() {
        let b = Boundary::from_polygon(square(0.0, 10.0), Crs::wgs84());
        assert_eq!(b.bounds().unwrap(), (0.0, 0.0, 10.0, 10.0));
        assert!(b.contains_point(5.0, 5.0));
        assert!(!b.contains_point(15.0, 5.0));
    }

    #[test]
    fn non_polygonal_geometry_is_rejected() {
        let g = Geometry::Point(Point::new(1.0, 2.0));
        assert!(Boundary::from_geometry(g, Crs::wgs84()).is_err());
    }

    #[test]
    fn projection_to_same_crs_is_identity() {
        let b = Boundary::from_polygon(square(0.0, 1.0), Crs::wgs84());
        let p = b.projected(&Crs::wgs84()).unwrap();
        assert_eq!(p.bounds().unwrap(), b.bounds().unwrap());
    }

    #[test]
    fn projection_to_laea_centers_the_centroid() {
        let b = Boundary::from_polygon(square(7.9, 8.1), Crs::wgs84());
        let (cx, cy) = b.centroid().unwrap();
        let laea = Crs::laea(cy, cx);

        let p = b.projected(&laea).unwrap();
        let (pcx, pcy) = p.centroid().unwrap();
        // centroid of the projected square sits at the projection origin
        assert!(pcx.abs() < 50.0, "centroid x {pcx}");
        assert!(pcy.abs() < 50.0, "centroid y {pcy}");
    }
}
