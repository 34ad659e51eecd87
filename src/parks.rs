//! Convert park outlines into point POIs located at their centroid.

use serde_json::{json, Map, Value};
use tracing::{info, warn};

use crate::config::ParkConfig;
use crate::models::{Park, Poi};

/// Parks converted to POIs, plus how many were dropped
#[derive(Debug, Clone, PartialEq)]
pub struct ConvertedParks {
    pub pois: Vec<Poi>,
    pub skipped: usize,
}

/// Turn every park with a usable outline into a POI.
///
/// Ids are `park_1`, `park_2`, ... over the converted parks only.
pub fn parks_to_pois(parks: &[Park], config: &ParkConfig) -> ConvertedParks {
    let mut pois = Vec::with_capacity(parks.len());
    let mut skipped = 0;

    for (i, park) in parks.iter().enumerate() {
        let centroid = match park.centroid() {
            Ok(centroid) => centroid,
            Err(e) => {
                warn!("Skipping park {}: {}", park.display_name(i), e);
                skipped += 1;
                continue;
            }
        };

        let mut fields = Map::new();
        fields.insert(
            "id".to_string(),
            Value::from(format!("park_{}", pois.len() + 1)),
        );
        fields.insert(
            "name".to_string(),
            park.get("name").cloned().unwrap_or_else(|| Value::from("Парк")),
        );
        fields.insert(
            "address".to_string(),
            park.get("address").cloned().unwrap_or(Value::Null),
        );
        fields.insert("district".to_string(), Value::Null);
        fields.insert(
            "coordinates".to_string(),
            json!({ "lon": centroid.lon, "lat": centroid.lat }),
        );
        fields.insert("rating".to_string(), Value::Null);
        fields.insert("reviews_count".to_string(), Value::from(0));
        fields.insert("reviews_preview".to_string(), json!([]));
        fields.insert("category".to_string(), Value::from(config.category.as_str()));
        fields.insert("type".to_string(), Value::from(config.record_type.as_str()));
        fields.insert("description".to_string(), Value::from(""));
        fields.insert("contacts".to_string(), json!({}));
        fields.insert("working_hours".to_string(), Value::from(""));

        pois.push(Poi::from_fields(fields));
    }

    info!(
        "Converted {} parks to objects, skipped {}",
        pois.len(),
        skipped
    );
    ConvertedParks { pois, skipped }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::GeoPoint;

    fn assert_close(actual: GeoPoint, expected: GeoPoint) {
        assert!((actual.lon - expected.lon).abs() < 1e-9, "{:?}", actual);
        assert!((actual.lat - expected.lat).abs() < 1e-9, "{:?}", actual);
    }

    #[test]
    fn test_converts_with_sequential_ids() {
        let parks = vec![
            Park::new("Сквер", json!([[0, 0], [2, 0], [2, 2], [0, 2]])),
            Park::new("Сломанный", json!([[0, 0]])),
            serde_json::from_value(json!({
                "coordinates": [[[10, 10], [12, 10], [12, 12], [10, 12], [10, 10]]]
            }))
            .unwrap(),
        ];

        let converted = parks_to_pois(&parks, &ParkConfig::default());
        assert_eq!(converted.skipped, 1);
        assert_eq!(converted.pois.len(), 2);

        let first = &converted.pois[0];
        assert_eq!(first.id().as_deref(), Some("park_1"));
        assert_eq!(first.category(), Some("парки"));
        assert_close(first.point().unwrap(), GeoPoint::new(1.0, 1.0));
        assert_eq!(first.get("type"), Some(&json!("Парки")));

        let second = &converted.pois[1];
        assert_eq!(second.id().as_deref(), Some("park_2"));
        assert_eq!(second.name().as_deref(), Some("Парк"));
        assert_close(second.point().unwrap(), GeoPoint::new(11.0, 11.0));
    }

    #[test]
    fn test_serialized_shape() {
        let parks = vec![Park::new("Сквер", json!([[0, 0], [2, 0], [2, 2], [0, 2]]))];
        let converted = parks_to_pois(&parks, &ParkConfig::default());
        let value = serde_json::to_value(&converted.pois[0]).unwrap();

        assert_eq!(value["reviews_count"], 0);
        assert_eq!(value["rating"], Value::Null);
        assert_eq!(value["district"], Value::Null);
        assert_eq!(value["contacts"], json!({}));
        assert_eq!(value["reviews_preview"], json!([]));
        assert!(value["coordinates"]["lon"].is_f64());

        let keys: Vec<_> = value.as_object().unwrap().keys().cloned().collect();
        assert_eq!(
            keys,
            vec![
                "id", "name", "address", "district", "coordinates", "rating", "reviews_count",
                "reviews_preview", "category", "type", "description", "contacts",
                "working_hours",
            ]
        );
    }

    #[test]
    fn test_park_name_kept_as_received() {
        let parks: Vec<Park> = serde_json::from_value(json!([
            {"name": 42, "address": {"street": "Тверская"}, "coordinates": [[0, 0], [2, 0], [2, 2]]}
        ]))
        .unwrap();
        let converted = parks_to_pois(&parks, &ParkConfig::default());
        let poi = &converted.pois[0];
        assert_eq!(poi.get("name"), Some(&json!(42)));
        assert_eq!(poi.get("address"), Some(&json!({"street": "Тверская"})));
        assert_eq!(poi.label(), "42 (park_1)");
    }
}
