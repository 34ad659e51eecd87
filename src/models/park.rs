//! Park outlines as delivered by the map collector.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::borrow::Cow;

use super::poi::{value_text, GeoPoint};
use crate::geometry::{polygon_centroid, GeometryError};

/// A park: like a POI, but located by an outline instead of a point.
///
/// `coordinates` is either a list of rings or a single flat ring of
/// `[lon, lat]` pairs; see [`crate::geometry::RingShape`]. Other fields
/// are kept as received.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Park(Map<String, Value>);

impl Park {
    pub fn new(name: &str, outline: Value) -> Self {
        let mut fields = Map::new();
        fields.insert("name".to_string(), Value::from(name));
        fields.insert("coordinates".to_string(), outline);
        Self(fields)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn name(&self) -> Option<Cow<'_, str>> {
        self.get("name").and_then(value_text)
    }

    /// Raw outline as received
    pub fn coordinates(&self) -> Option<&Value> {
        self.get("coordinates")
    }

    /// Planar centroid of the outline, used as the park's point location
    pub fn centroid(&self) -> Result<GeoPoint, GeometryError> {
        match self.coordinates() {
            Some(outline) => polygon_centroid(outline),
            None => Err(GeometryError::Unrecognized),
        }
    }

    /// Name, falling back to a positional label
    pub fn display_name(&self, index: usize) -> String {
        self.name()
            .map(Cow::into_owned)
            .unwrap_or_else(|| format!("Парк {}", index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_missing_outline_is_invalid() {
        let park: Park = serde_json::from_value(json!({"name": "Сквер"})).unwrap();
        assert_eq!(park.centroid().unwrap_err(), GeometryError::Unrecognized);
    }

    #[test]
    fn test_centroid_from_nested_outline() {
        let park = Park::new("Парк", json!([[[0, 0], [4, 0], [4, 2], [0, 2]]]));
        let c = park.centroid().unwrap();
        assert!((c.lon - 2.0).abs() < 1e-12);
        assert!((c.lat - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_loosely_typed_fields_load() {
        let park: Park = serde_json::from_value(json!({
            "name": 17,
            "address": ["ул. Исаковского"],
            "coordinates": "нет"
        }))
        .unwrap();
        assert_eq!(park.display_name(3), "17");
        assert_eq!(park.centroid().unwrap_err(), GeometryError::Unrecognized);

        let unnamed: Park = serde_json::from_value(json!({"name": null})).unwrap();
        assert_eq!(unnamed.display_name(3), "Парк 3");
    }
}
