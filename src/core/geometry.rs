//! Footprint geometry: validation of geodetic polygons, projection onto an
//! equal-area plane centred on the AOI, and the area/intersection/union
//! primitives the coverage analysis is built on.
//!
//! All areas are square metres on a spherical Earth. The Lambert cylindrical
//! equal-area projection is exact for areas everywhere, so coverage fractions do
//! not depend on where the AOI sits.
use geo::{Area, BooleanOps, Centroid, Coord, MapCoords, MultiPolygon};
use thiserror::Error;

/// Mean Earth radius (IUGG), metres.
pub const EARTH_RADIUS_M: f64 = 6_371_008.8;

/// Errors raised for invalid or degenerate geometries
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeometryError {
    #[error("Geometry is empty")]
    Empty,
    #[error("Unsupported geometry type: {0}")]
    UnsupportedType(String),
    #[error("Malformed coordinates: {0}")]
    Malformed(String),
    #[error("Non-finite coordinate in geometry")]
    NonFinite,
    #[error("Coordinate out of geodetic range: ({lon}, {lat})")]
    OutOfRange { lon: f64, lat: f64 },
    #[error("Degenerate ring with {0} distinct vertices")]
    DegenerateRing(usize),
    #[error("Geometry has zero area")]
    ZeroArea,
}

/// Lambert cylindrical equal-area projection with its standard parallel and
/// central meridian at a chosen origin (normally the AOI centroid).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EqualAreaProjection {
    lon0: f64,
    cos_phi0: f64,
}

impl EqualAreaProjection {
    /// Origin given in degrees
    pub fn new(lon0_deg: f64, lat0_deg: f64) -> Self {
        // Keep the standard parallel away from the poles so x/y stay bounded.
        let lat0 = lat0_deg.clamp(-85.0, 85.0).to_radians();
        Self {
            lon0: lon0_deg.to_radians(),
            cos_phi0: lat0.cos(),
        }
    }

    pub fn centered_on(geodetic: &MultiPolygon<f64>) -> Self {
        match geodetic.centroid() {
            Some(c) => Self::new(c.x(), c.y()),
            None => Self::new(0.0, 0.0),
        }
    }

    pub fn forward(&self, c: Coord<f64>) -> Coord<f64> {
        let mut dlon = c.x.to_radians() - self.lon0;
        if dlon > std::f64::consts::PI {
            dlon -= 2.0 * std::f64::consts::PI;
        } else if dlon < -std::f64::consts::PI {
            dlon += 2.0 * std::f64::consts::PI;
        }
        Coord {
            x: EARTH_RADIUS_M * dlon * self.cos_phi0,
            y: EARTH_RADIUS_M * c.y.to_radians().sin() / self.cos_phi0,
        }
    }

    pub fn project(&self, geodetic: &MultiPolygon<f64>) -> MultiPolygon<f64> {
        geodetic.map_coords(|c| self.forward(c))
    }
}

/// Check that a lon/lat multipolygon is usable for area arithmetic.
pub fn validate_geodetic(geom: &MultiPolygon<f64>) -> Result<(), GeometryError> {
    if geom.0.is_empty() {
        return Err(GeometryError::Empty);
    }
    for polygon in geom.iter() {
        for ring in std::iter::once(polygon.exterior()).chain(polygon.interiors()) {
            for c in ring.coords() {
                if !c.x.is_finite() || !c.y.is_finite() {
                    return Err(GeometryError::NonFinite);
                }
                if !(-180.0..=180.0).contains(&c.x) || !(-90.0..=90.0).contains(&c.y) {
                    return Err(GeometryError::OutOfRange { lon: c.x, lat: c.y });
                }
            }
        }
        let mut distinct: Vec<Coord<f64>> = Vec::new();
        for c in polygon.exterior().coords() {
            if !distinct.contains(c) {
                distinct.push(*c);
            }
        }
        if distinct.len() < 3 {
            return Err(GeometryError::DegenerateRing(distinct.len()));
        }
    }
    Ok(())
}

/// Union of all parts. Empty input gives an empty multipolygon.
pub fn union_all<'a, I>(parts: I) -> MultiPolygon<f64>
where
    I: IntoIterator<Item = &'a MultiPolygon<f64>>,
{
    let mut iter = parts.into_iter();
    let Some(first) = iter.next() else {
        return MultiPolygon::new(Vec::new());
    };
    iter.fold(first.clone(), |acc, next| acc.union(next))
}

pub fn union_area<'a, I>(parts: I) -> f64
where
    I: IntoIterator<Item = &'a MultiPolygon<f64>>,
{
    union_all(parts).unsigned_area()
}

/// The fixed target region of a run, held in equal-area coordinates.
#[derive(Debug, Clone)]
pub struct AreaOfInterest {
    projection: EqualAreaProjection,
    geometry: MultiPolygon<f64>,
    area: f64,
}

impl AreaOfInterest {
    /// Build from a lon/lat (EPSG:4326) geometry.
    pub fn from_geodetic(geodetic: MultiPolygon<f64>) -> Result<Self, GeometryError> {
        validate_geodetic(&geodetic)?;
        let projection = EqualAreaProjection::centered_on(&geodetic);
        let geometry = projection.project(&geodetic);
        let area = geometry.unsigned_area();
        if !(area > 0.0) || !area.is_finite() {
            return Err(GeometryError::ZeroArea);
        }
        Ok(Self {
            projection,
            geometry,
            area,
        })
    }

    /// AOI area in m²
    pub fn area(&self) -> f64 {
        self.area
    }

    pub fn projection(&self) -> EqualAreaProjection {
        self.projection
    }

    pub fn geometry(&self) -> &MultiPolygon<f64> {
        &self.geometry
    }

    /// Validate, project and clip a geodetic footprint to the AOI.
    pub fn clip(&self, footprint: &MultiPolygon<f64>) -> Result<MultiPolygon<f64>, GeometryError> {
        validate_geodetic(footprint)?;
        let projected = self.projection.project(footprint);
        let area = projected.unsigned_area();
        if !(area > 0.0) {
            return Err(GeometryError::ZeroArea);
        }
        if !area.is_finite() {
            return Err(GeometryError::NonFinite);
        }
        Ok(self.geometry.intersection(&projected))
    }

    /// Area of `clipped` relative to the AOI
    pub fn fraction_of(&self, clipped_area: f64) -> f64 {
        clipped_area / self.area
    }
}
