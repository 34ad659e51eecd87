//! Run configuration: category tables, rating policy, district source.

use hashbrown::HashSet;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::{Error, Result};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub nearest: NearestConfig,
    pub rating: RatingConfig,
    pub districts: DistrictSourceConfig,
    pub parks: ParkConfig,
}

/// One row of the category -> output field table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryField {
    pub category: String,
    pub field: String,
}

impl CategoryField {
    pub fn new(category: &str, field: &str) -> Self {
        Self {
            category: category.to_string(),
            field: field.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NearestConfig {
    /// POIs kept per category
    pub limit: usize,
    pub categories: Vec<CategoryField>,
}

impl Default for NearestConfig {
    fn default() -> Self {
        Self {
            limit: 5,
            categories: vec![
                CategoryField::new("детские сады", "nearest_kindergartens"),
                CategoryField::new("больницы", "nearest_hospitals"),
                CategoryField::new("парки", "nearest_parks"),
                CategoryField::new("школы", "nearest_schools"),
                CategoryField::new("поликлиники", "nearest_clinics"),
                CategoryField::new("детские больницы", "nearest_child_hospitals"),
                CategoryField::new("детские поликлиники", "nearest_child_clinics"),
                CategoryField::new("музыкальные школы", "nearest_music_schools"),
            ],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RatingConfig {
    /// Thresholds below this use the fixed child-focused universe
    pub policy_cutoff: f64,
    pub child_categories: Vec<String>,
    /// Thresholds rated in one run
    pub thresholds: Vec<f64>,
    /// Keys never admitted into the dynamic universe
    pub excluded_keys: Vec<String>,
}

impl Default for RatingConfig {
    fn default() -> Self {
        Self {
            policy_cutoff: 0.5,
            child_categories: vec![
                "детские сады".to_string(),
                "детские поликлиники".to_string(),
                "детские больницы".to_string(),
                "парки".to_string(),
            ],
            thresholds: vec![0.3, 0.8],
            excluded_keys: vec!["название".to_string()],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DistrictSourceConfig {
    /// GeoJSON feature property holding the district name
    pub name_property: String,
}

impl Default for DistrictSourceConfig {
    fn default() -> Self {
        Self {
            name_property: "NAME".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParkConfig {
    /// Category under which parks are counted and merged
    pub category: String,
    /// `type` written on park records merged into the POI list
    pub record_type: String,
}

impl Default for ParkConfig {
    fn default() -> Self {
        Self {
            category: "парки".to_string(),
            record_type: "Парки".to_string(),
        }
    }
}

impl Config {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `path` if given, otherwise use the built-in defaults
    pub fn load_or_default<P: AsRef<Path>>(path: Option<P>) -> Result<Self> {
        match path {
            Some(path) => Self::load_from_file(path),
            None => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.nearest.limit == 0 {
            return Err(Error::Config("nearest.limit must be at least 1".to_string()));
        }

        let mut categories = HashSet::new();
        let mut fields = HashSet::new();
        for row in &self.nearest.categories {
            if !categories.insert(row.category.as_str()) {
                return Err(Error::Config(format!(
                    "category '{}' is listed twice in nearest.categories",
                    row.category
                )));
            }
            if !fields.insert(row.field.as_str()) {
                return Err(Error::Config(format!(
                    "output field '{}' is used by more than one category",
                    row.field
                )));
            }
        }

        if self.rating.thresholds.iter().any(|t| !t.is_finite()) {
            return Err(Error::Config(
                "rating.thresholds must be finite numbers".to_string(),
            ));
        }

        Ok(())
    }
}
