//! District boundary extraction from GeoJSON.

use geo::{BoundingRect, Coord};
use geojson::FeatureCollection;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::geometry::{point_in_polygon, Ring};
use crate::models::GeoPoint;

/// A named district with a single simple boundary
#[derive(Debug, Clone, PartialEq)]
pub struct District {
    pub name: String,
    pub boundary: Ring,
}

impl District {
    pub fn new(name: &str, boundary: Ring) -> Self {
        Self {
            name: name.to_string(),
            boundary,
        }
    }

    pub fn contains(&self, point: GeoPoint) -> bool {
        point_in_polygon(point, &self.boundary)
    }

    /// Get the bounding box of this boundary
    pub fn bbox(&self) -> Option<(f64, f64, f64, f64)> {
        self.boundary
            .to_polygon()
            .bounding_rect()
            .map(|rect| (rect.min().x, rect.min().y, rect.max().x, rect.max().y))
    }
}

/// Districts in source order plus the number of features that were unusable
#[derive(Debug, Clone, Default)]
pub struct DistrictSource {
    pub districts: Vec<District>,
    pub skipped: usize,
}

/// Extract districts from a feature collection, keeping source order.
///
/// Only `Polygon` geometries are supported; holes are ignored. Features with
/// another geometry type, no name, or fewer than three vertices are skipped.
pub fn extract_districts(collection: &FeatureCollection, name_property: &str) -> DistrictSource {
    info!("Extracting district boundaries...");

    let mut source = DistrictSource::default();

    for (index, feature) in collection.features.iter().enumerate() {
        let name = match feature.property(name_property) {
            Some(Value::String(name)) => name.clone(),
            Some(Value::Null) | None => {
                warn!(
                    "District feature {} has no '{}' property, skipping",
                    index, name_property
                );
                source.skipped += 1;
                continue;
            }
            Some(other) => other.to_string(),
        };

        let rings = match feature.geometry.as_ref().map(|g| &g.value) {
            Some(geojson::Value::Polygon(rings)) => rings,
            Some(other) => {
                warn!(
                    "District '{}' has unsupported geometry {}, skipping",
                    name,
                    geometry_kind(other)
                );
                source.skipped += 1;
                continue;
            }
            None => {
                warn!("District '{}' has no geometry, skipping", name);
                source.skipped += 1;
                continue;
            }
        };

        if rings.len() > 1 {
            debug!("Ignoring {} holes in district '{}'", rings.len() - 1, name);
        }

        let exterior: Vec<Coord<f64>> = rings
            .first()
            .map(|ring| {
                ring.iter()
                    .filter(|position| position.len() >= 2)
                    .map(|position| Coord {
                        x: position[0],
                        y: position[1],
                    })
                    .collect()
            })
            .unwrap_or_default();

        match Ring::from_coords(exterior) {
            Ok(boundary) => source.districts.push(District::new(&name, boundary)),
            Err(e) => {
                warn!("District '{}' has an invalid boundary: {}", name, e);
                source.skipped += 1;
            }
        }
    }

    info!(
        "Found {} districts ({} skipped)",
        source.districts.len(),
        source.skipped
    );

    source
}

fn geometry_kind(value: &geojson::Value) -> &'static str {
    match value {
        geojson::Value::Point(_) => "Point",
        geojson::Value::MultiPoint(_) => "MultiPoint",
        geojson::Value::LineString(_) => "LineString",
        geojson::Value::MultiLineString(_) => "MultiLineString",
        geojson::Value::Polygon(_) => "Polygon",
        geojson::Value::MultiPolygon(_) => "MultiPolygon",
        geojson::Value::GeometryCollection(_) => "GeometryCollection",
    }
}
