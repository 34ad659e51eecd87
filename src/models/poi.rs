//! POI records as delivered by the catalog collector.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::borrow::Cow;

/// Geographic point (lat/lon)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    pub fn new(lon: f64, lat: f64) -> Self {
        Self { lat, lon }
    }

    /// Exact bit pattern of the pair, used as the duplicate key.
    pub fn bits(&self) -> (u64, u64) {
        (self.lon.to_bits(), self.lat.to_bits())
    }
}

/// Convert a loosely typed coordinate component to a finite number.
///
/// Accepts JSON numbers and numeric strings. Anything else, including
/// `NaN`/`inf` spelled as strings, is rejected.
pub fn coordinate_value(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    number.is_finite().then_some(number)
}

/// Parse a `{lon, lat}` object. Returns `None` unless both components are usable.
pub fn parse_lon_lat(value: &Value) -> Option<GeoPoint> {
    let object = value.as_object()?;
    let lon = coordinate_value(object.get("lon")?)?;
    let lat = coordinate_value(object.get("lat")?)?;
    Some(GeoPoint::new(lon, lat))
}

/// Text form of a loosely typed field: strings as is, other scalars
/// and structures as JSON, `null` as absent.
pub fn value_text(value: &Value) -> Option<Cow<'_, str>> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(Cow::Borrowed(s.as_str())),
        other => Some(Cow::Owned(other.to_string())),
    }
}

/// A point of interest (school, clinic, park centroid, ...).
///
/// The record is kept exactly as received: fields are read through
/// accessors and never coerced, so any record, however its fields are
/// typed, loads and is written back unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Poi(Map<String, Value>);

impl Poi {
    /// Create a POI with a category and a valid point
    pub fn new(name: &str, category: &str, point: GeoPoint) -> Self {
        let mut fields = Map::new();
        fields.insert("name".to_string(), Value::from(name));
        fields.insert("category".to_string(), Value::from(category));
        fields.insert(
            "coordinates".to_string(),
            serde_json::json!({ "lon": point.lon, "lat": point.lat }),
        );
        Self(fields)
    }

    pub fn from_fields(fields: Map<String, Value>) -> Self {
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

    pub fn name(&self) -> Option<Cow<'_, str>> {
        self.get("name").and_then(value_text)
    }

    pub fn address(&self) -> Option<Cow<'_, str>> {
        self.get("address").and_then(value_text)
    }

    /// Category label used for matching. Only string labels match.
    pub fn category(&self) -> Option<&str> {
        self.get("category").and_then(Value::as_str)
    }

    /// Category key used in district statistics
    pub fn category_or_default(&self) -> Cow<'_, str> {
        self.get("category")
            .and_then(value_text)
            .unwrap_or(Cow::Borrowed("без категории"))
    }

    /// Raw coordinates as received
    pub fn coordinates(&self) -> Option<&Value> {
        self.get("coordinates")
    }

    /// The usable point of this record, or `None` for an invalid coordinate
    pub fn point(&self) -> Option<GeoPoint> {
        self.coordinates().and_then(parse_lon_lat)
    }

    /// Human-readable label for logs
    pub fn label(&self) -> String {
        match (self.id(), self.name()) {
            (Some(id), Some(name)) => format!("{} ({})", name, id),
            (Some(id), None) => id.into_owned(),
            (None, Some(name)) => name.into_owned(),
            (None, None) => "Без названия".to_string(),
        }
    }
}
