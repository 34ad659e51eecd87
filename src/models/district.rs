//! Per-district aggregates: category counts, ratings, and unassigned features.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

use super::poi::GeoPoint;

/// Category label -> number of features
pub type CategoryCounts = BTreeMap<String, u64>;

/// District name -> rounded score
pub type DistrictRating = BTreeMap<String, f64>;

/// District name -> category counts.
///
/// Built by the district assigner; read-only for everyone else.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DistrictStatistics(BTreeMap<String, CategoryCounts>);

impl DistrictStatistics {
    pub(crate) fn increment(&mut self, district: &str, category: &str) {
        *self
            .0
            .entry(district.to_string())
            .or_default()
            .entry(category.to_string())
            .or_default() += 1;
    }

    pub fn get(&self, district: &str) -> Option<&CategoryCounts> {
        self.0.get(district)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &CategoryCounts)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Sorted union of every category seen in any district
    pub fn categories(&self) -> BTreeSet<&str> {
        self.0
            .values()
            .flat_map(|counts| counts.keys().map(String::as_str))
            .collect()
    }

    /// Read statistics from a loosely typed document.
    ///
    /// Accepts both `{"district_statistics": {...}}` and the bare mapping.
    /// Values that are not non-negative whole numbers (labels such as
    /// `"название"`) are dropped here, so every stored count is numeric.
    pub fn from_json_value(value: &Value) -> Self {
        let districts = value
            .get("district_statistics")
            .unwrap_or(value)
            .as_object();

        let mut stats = BTreeMap::new();
        for (district, categories) in districts.into_iter().flatten() {
            let mut counts = CategoryCounts::new();
            for (category, count) in categories.as_object().into_iter().flatten() {
                match numeric_count(count) {
                    Some(n) => {
                        counts.insert(category.clone(), n);
                    }
                    None => debug!(
                        "Dropping non-numeric value for {} / {}: {}",
                        district, category, count
                    ),
                }
            }
            stats.insert(district.clone(), counts);
        }

        Self(stats)
    }
}

impl FromIterator<(String, CategoryCounts)> for DistrictStatistics {
    fn from_iter<I: IntoIterator<Item = (String, CategoryCounts)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

fn numeric_count(value: &Value) -> Option<u64> {
    if let Some(n) = value.as_u64() {
        return Some(n);
    }
    let f = value.as_f64()?;
    (f >= 0.0 && f.fract() == 0.0 && f <= u64::MAX as f64).then_some(f as u64)
}

/// On-disk shape of the statistics output
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatisticsDocument {
    pub district_statistics: DistrictStatistics,
}

/// Kind of feature that went through district assignment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureKind {
    Poi,
    Park,
}

/// Why a feature did not contribute to any district count
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnassignedReason {
    /// Missing or non-numeric lon/lat
    InvalidCoordinates,
    /// Outline could not produce a centroid
    InvalidGeometry,
    /// Valid location outside every district polygon
    NoContainingDistrict,
}

/// A feature left out of the district counts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnassignedRecord {
    pub id: String,
    pub name: String,
    pub category: String,
    pub kind: FeatureKind,
    pub reason: UnassignedReason,

    /// Raw coordinates as received
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coordinates: Option<Value>,

    /// Derived park centroid, when one exists
    #[serde(skip_serializing_if = "Option::is_none")]
    pub centroid: Option<GeoPoint>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_increment_and_categories() {
        let mut stats = DistrictStatistics::default();
        stats.increment("Митино", "школы");
        stats.increment("Митино", "школы");
        stats.increment("Щукино", "парки");

        assert_eq!(stats.get("Митино").unwrap()["школы"], 2);
        assert_eq!(stats.len(), 2);
        let categories: Vec<&str> = stats.categories().into_iter().collect();
        assert_eq!(categories, vec!["парки", "школы"]);
    }

    #[test]
    fn test_from_json_value_wrapped_and_bare() {
        let wrapped = json!({"district_statistics": {"Митино": {"школы": 3}}});
        let bare = json!({"Митино": {"школы": 3}});
        assert_eq!(
            DistrictStatistics::from_json_value(&wrapped),
            DistrictStatistics::from_json_value(&bare)
        );
    }

    #[test]
    fn test_from_json_value_drops_non_numeric() {
        let doc = json!({
            "Куркино": {"название": "Куркино", "школы": 4, "парки": 2.0, "лес": -1, "сады": 1.5}
        });
        let stats = DistrictStatistics::from_json_value(&doc);
        let counts = stats.get("Куркино").unwrap();
        assert_eq!(counts.len(), 2);
        assert_eq!(counts["школы"], 4);
        assert_eq!(counts["парки"], 2);
    }

    #[test]
    fn test_document_shape() {
        let mut stats = DistrictStatistics::default();
        stats.increment("Строгино", "школы");
        let doc = StatisticsDocument {
            district_statistics: stats,
        };
        assert_eq!(
            serde_json::to_value(&doc).unwrap(),
            json!({"district_statistics": {"Строгино": {"школы": 1}}})
        );
    }
}
