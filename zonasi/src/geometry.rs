//! Conversion et validation des géométries GeoJSON
//!
//! La validation se fait sur la représentation GeoJSON, avant conversion en
//! types `geo` : `geo::Polygon::new` referme silencieusement les anneaux et
//! la conversion suppose des positions d'au moins deux coordonnées.

use geo::{BoundingRect, Geometry, Rect};
use geojson::{PolygonType, Position, Value};

use crate::types::PlanningFeature;
use crate::ZonasiError;

/// Convertit la géométrie brute d'une feature en géométrie `geo` validée
pub fn feature_geometry(feature: &PlanningFeature) -> Result<Geometry<f64>, ZonasiError> {
    let id = feature.id();

    if feature.geometry.is_null() {
        return Err(ZonasiError::invalid_geometry(id, "missing geometry"));
    }

    let parsed = geojson::Geometry::from_json_value(feature.geometry.clone())
        .map_err(|e| ZonasiError::invalid_geometry(id, e.to_string()))?;

    validate_value(&parsed.value).map_err(|reason| ZonasiError::invalid_geometry(id, reason))?;

    Geometry::<f64>::try_from(parsed).map_err(|e| ZonasiError::invalid_geometry(id, e.to_string()))
}

/// Vérifie la structure d'une géométrie GeoJSON
fn validate_value(value: &Value) -> Result<(), String> {
    match value {
        Value::Point(position) => validate_position(position),
        Value::MultiPoint(points) => {
            if points.is_empty() {
                return Err("empty MultiPoint".to_string());
            }
            points.iter().try_for_each(|p| validate_position(p))
        }
        Value::LineString(line) => validate_line(line),
        Value::MultiLineString(lines) => {
            if lines.is_empty() {
                return Err("empty MultiLineString".to_string());
            }
            lines.iter().try_for_each(|l| validate_line(l))
        }
        Value::Polygon(rings) => validate_polygon(rings),
        Value::MultiPolygon(polygons) => {
            if polygons.is_empty() {
                return Err("empty MultiPolygon".to_string());
            }
            polygons.iter().try_for_each(validate_polygon)
        }
        Value::GeometryCollection(_) => Err("GeometryCollection is not supported".to_string()),
    }
}

fn validate_line(line: &[Position]) -> Result<(), String> {
    if line.len() < 2 {
        return Err(format!("LineString needs at least 2 positions, got {}", line.len()));
    }
    line.iter().try_for_each(|p| validate_position(p))
}

fn validate_polygon(rings: &PolygonType) -> Result<(), String> {
    if rings.is_empty() {
        return Err("Polygon without rings".to_string());
    }

    for ring in rings {
        if ring.len() < 4 {
            return Err(format!("ring needs at least 4 positions, got {}", ring.len()));
        }
        ring.iter().try_for_each(|p| validate_position(p))?;

        let first = &ring[0];
        let last = &ring[ring.len() - 1];
        if first[0] != last[0] || first[1] != last[1] {
            return Err("ring is not closed".to_string());
        }
    }

    Ok(())
}

/// Position `[lng, lat]` finie et dans les bornes WGS84
fn validate_position(position: &[f64]) -> Result<(), String> {
    if position.len() < 2 {
        return Err(format!("position needs 2 coordinates, got {}", position.len()));
    }

    let (lng, lat) = (position[0], position[1]);
    if !lng.is_finite() || !lat.is_finite() {
        return Err("non-finite coordinate".to_string());
    }
    if !(-180.0..=180.0).contains(&lng) || !(-90.0..=90.0).contains(&lat) {
        return Err(format!(
            "coordinate [{lng}, {lat}] out of range (expected [lng, lat] order)"
        ));
    }

    Ok(())
}

/// Emprise englobant toutes les géométries
pub fn combined_bounds<'a, I>(geometries: I) -> Option<Rect<f64>>
where
    I: IntoIterator<Item = &'a Geometry<f64>>,
{
    geometries
        .into_iter()
        .filter_map(|g| g.bounding_rect())
        .reduce(|a, b| {
            Rect::new(
                geo::coord! { x: a.min().x.min(b.min().x), y: a.min().y.min(b.min().y) },
                geo::coord! { x: a.max().x.max(b.max().x), y: a.max().y.max(b.max().y) },
            )
        })
}

/// Une emprise est exploitable si elle a une étendue non nulle
pub fn has_extent(bounds: &Rect<f64>) -> bool {
    bounds.width() > 0.0 || bounds.height() > 0.0
}
