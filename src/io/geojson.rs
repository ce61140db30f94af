//! GeoJSON geometry decoding and AOI loading.
use std::fs;
use std::path::Path;

use geo::{Coord, LineString, MultiPolygon, Polygon};
use serde_json::Value;

use crate::core::geometry::GeometryError;
use crate::io::catalog::CatalogError;

fn ring_from_value(ring: &Value) -> Result<LineString<f64>, GeometryError> {
    let points = ring
        .as_array()
        .ok_or_else(|| GeometryError::Malformed("ring is not an array".to_string()))?;
    let mut coords = Vec::with_capacity(points.len());
    for p in points {
        let pair = p
            .as_array()
            .filter(|a| a.len() >= 2)
            .ok_or_else(|| GeometryError::Malformed(format!("bad position {p}")))?;
        let x = pair[0]
            .as_f64()
            .ok_or_else(|| GeometryError::Malformed(format!("bad position {p}")))?;
        let y = pair[1]
            .as_f64()
            .ok_or_else(|| GeometryError::Malformed(format!("bad position {p}")))?;
        coords.push(Coord { x, y });
    }
    // LineString::new does not close rings; Polygon::new does.
    Ok(LineString::new(coords))
}

fn polygon_from_value(rings: &Value) -> Result<Polygon<f64>, GeometryError> {
    let rings = rings
        .as_array()
        .ok_or_else(|| GeometryError::Malformed("polygon is not an array of rings".to_string()))?;
    let mut iter = rings.iter();
    let exterior = iter.next().ok_or(GeometryError::Empty)?;
    let exterior = ring_from_value(exterior)?;
    let interiors = iter.map(ring_from_value).collect::<Result<Vec<_>, _>>()?;
    Ok(Polygon::new(exterior, interiors))
}

/// Decode a GeoJSON `Polygon` or `MultiPolygon` geometry object.
pub fn geometry_from_value(geometry: &Value) -> Result<MultiPolygon<f64>, GeometryError> {
    let kind = geometry
        .get("type")
        .and_then(Value::as_str)
        .ok_or_else(|| GeometryError::Malformed("missing geometry type".to_string()))?;
    let coordinates = geometry
        .get("coordinates")
        .ok_or_else(|| GeometryError::Malformed("missing coordinates".to_string()))?;
    match kind {
        "Polygon" => Ok(MultiPolygon::new(vec![polygon_from_value(coordinates)?])),
        "MultiPolygon" => {
            let polygons = coordinates
                .as_array()
                .ok_or_else(|| GeometryError::Malformed("multipolygon is not an array".to_string()))?
                .iter()
                .map(polygon_from_value)
                .collect::<Result<Vec<_>, _>>()?;
            Ok(MultiPolygon::new(polygons))
        }
        other => Err(GeometryError::UnsupportedType(other.to_string())),
    }
}

/// Extract the AOI geometry from a `Feature`, the first feature of a
/// `FeatureCollection`, or a bare geometry object.
pub fn aoi_geometry_from_value(obj: &Value) -> Result<MultiPolygon<f64>, CatalogError> {
    let geometry = match obj.get("type").and_then(Value::as_str) {
        Some("Feature") => obj
            .get("geometry")
            .filter(|g| !g.is_null())
            .ok_or_else(|| CatalogError::Format("AOI Feature has no geometry".to_string()))?,
        Some("FeatureCollection") => obj
            .get("features")
            .and_then(Value::as_array)
            .and_then(|f| f.first())
            .and_then(|f| f.get("geometry"))
            .filter(|g| !g.is_null())
            .ok_or_else(|| {
                CatalogError::Format("AOI FeatureCollection has no usable first feature".to_string())
            })?,
        Some(_) if obj.get("coordinates").is_some() => obj,
        other => {
            return Err(CatalogError::Format(format!(
                "Unsupported GeoJSON type: {}",
                other.unwrap_or("<missing>")
            )));
        }
    };
    Ok(geometry_from_value(geometry)?)
}

/// Load an AOI (EPSG:4326) from a GeoJSON file.
pub fn load_aoi_geometry(path: &Path) -> Result<MultiPolygon<f64>, CatalogError> {
    if !path.exists() {
        return Err(CatalogError::NotFound(path.to_path_buf()));
    }
    let text = fs::read_to_string(path)?;
    let obj: Value = serde_json::from_str(&text)?;
    aoi_geometry_from_value(&obj)
}
