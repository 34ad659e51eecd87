//! Target locations (rental listings) and their nearest-POI enrichment.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::borrow::Cow;
use std::collections::BTreeMap;

use super::poi::{coordinate_value, value_text, GeoPoint};

/// Summary of one nearby POI
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NearestObject {
    pub name: String,
    pub address: String,
    /// `[[lon, lat]]`, wrapped for polyline/point consumers
    pub coordinates: [[f64; 2]; 1],
    /// Meters, one decimal
    pub distance: f64,
}

/// `nearest_objects` block attached to a listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NearestObjects {
    pub coordinates: GeoPoint,

    /// Output field name -> nearest POIs, ascending by distance
    #[serde(flatten)]
    pub by_field: BTreeMap<String, Vec<NearestObject>>,
}

/// A rental listing, kept exactly as received apart from `nearest_objects`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Listing(Map<String, Value>);

impl Listing {
    pub fn new(id: i64, point: GeoPoint) -> Self {
        let mut fields = Map::new();
        fields.insert("id".to_string(), Value::from(id));
        fields.insert("latitude".to_string(), Value::from(point.lat));
        fields.insert("longitude".to_string(), Value::from(point.lon));
        Self(fields)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn set(&mut self, key: &str, value: Value) {
        self.0.insert(key.to_string(), value);
    }

    pub fn id(&self) -> Option<Cow<'_, str>> {
        self.get("id").and_then(value_text)
    }

    pub fn point(&self) -> Option<GeoPoint> {
        let lat = coordinate_value(self.get("latitude")?)?;
        let lon = coordinate_value(self.get("longitude")?)?;
        Some(GeoPoint::new(lon, lat))
    }

    pub fn nearest_objects(&self) -> Option<&Value> {
        self.get("nearest_objects")
    }

    /// Replace the `nearest_objects` block
    pub fn set_nearest_objects(&mut self, nearest: &NearestObjects) -> serde_json::Result<()> {
        let value = serde_json::to_value(nearest)?;
        self.set("nearest_objects", value);
        Ok(())
    }
}
