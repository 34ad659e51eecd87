//! JSON and GeoJSON file access.
//!
//! Every write goes through a temporary file in the target directory that
//! is renamed over the destination, so a failed run never leaves a
//! half-written output behind.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::{info, warn};

use geojson::{FeatureCollection, GeoJson};

use crate::error::{Error, Result};
use crate::models::DistrictStatistics;
use crate::pip::{extract_districts, DistrictSource};

/// Read and deserialize a JSON document.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let file = fs::File::open(path).map_err(|e| Error::io(path, e))?;
    serde_json::from_reader(BufReader::new(file)).map_err(|e| Error::json(path, e))
}

/// Serialize `value` as pretty-printed UTF-8 JSON and atomically replace `path`.
pub fn write_json_atomic<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let tmp = NamedTempFile::new_in(dir).map_err(|e| Error::io(dir, e))?;
    {
        let mut writer = BufWriter::new(tmp.as_file());
        serde_json::to_writer_pretty(&mut writer, value).map_err(|e| Error::json(path, e))?;
        writer.write_all(b"\n").map_err(|e| Error::io(path, e))?;
        writer.flush().map_err(|e| Error::io(path, e))?;
    }

    tmp.persist(path).map_err(|e| Error::Persist {
        path: path.to_path_buf(),
        source: e,
    })?;
    info!("Saved {}", path.display());
    Ok(())
}

/// Load district boundaries from a GeoJSON FeatureCollection.
pub fn load_districts(path: &Path, name_property: &str) -> Result<DistrictSource> {
    let content = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
    let geojson: GeoJson = content.parse()?;
    let collection = FeatureCollection::try_from(geojson)?;

    let source = extract_districts(&collection, name_property);
    info!(
        "Loaded {} districts from {} ({} features skipped)",
        source.districts.len(),
        path.display(),
        source.skipped
    );
    if source.districts.is_empty() {
        warn!("No usable district polygons in {}", path.display());
    }
    Ok(source)
}

/// Load district statistics, wrapped or bare, keeping numeric counts only.
pub fn load_statistics(path: &Path) -> Result<DistrictStatistics> {
    let value: serde_json::Value = read_json(path)?;
    let stats = DistrictStatistics::from_json_value(&value);
    info!("Loaded statistics for {} districts", stats.len());
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Poi, StatisticsDocument};
    use serde_json::json;

    #[test]
    fn test_write_then_read_keeps_cyrillic() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("objects.json");
        let pois = vec![Poi::new(
            "Школа №1",
            "школы",
            crate::models::GeoPoint::new(37.4, 55.8),
        )];

        write_json_atomic(&path, &pois).unwrap();
        let raw = fs::read_to_string(&path).unwrap();
        assert!(raw.contains("Школа №1"));

        let back: Vec<Poi> = read_json(&path).unwrap();
        assert_eq!(back, pois);
    }

    #[test]
    fn test_malformed_json_is_reported_with_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        fs::write(&path, "[{").unwrap();

        let err = read_json::<Vec<Poi>>(&path).unwrap_err();
        match err {
            Error::Json { path: reported, .. } => assert_eq!(reported, path),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_missing_file() {
        let err = read_json::<Vec<Poi>>(Path::new("/no/such/objects.json")).unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
    }

    #[test]
    fn test_failed_write_leaves_target_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing_dir").join("out.json");
        assert!(write_json_atomic(&path, &json!({})).is_err());
        assert!(!path.exists());
    }

    #[test]
    fn test_load_districts() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("districts.geojson");
        fs::write(
            &path,
            json!({
                "type": "FeatureCollection",
                "features": [{
                    "type": "Feature",
                    "properties": {"NAME": "Митино"},
                    "geometry": {
                        "type": "Polygon",
                        "coordinates": [[[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0], [0.0, 0.0]]]
                    }
                }]
            })
            .to_string(),
        )
        .unwrap();

        let source = load_districts(&path, "NAME").unwrap();
        assert_eq!(source.districts.len(), 1);
        assert_eq!(source.districts[0].name, "Митино");
    }

    #[test]
    fn test_statistics_document_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("district_statistics.json");

        let stats = DistrictStatistics::from_json_value(&json!({"Митино": {"школы": 3}}));
        write_json_atomic(
            &path,
            &StatisticsDocument {
                district_statistics: stats.clone(),
            },
        )
        .unwrap();

        let raw: serde_json::Value = read_json(&path).unwrap();
        assert_eq!(raw["district_statistics"]["Митино"]["школы"], 3);
        assert_eq!(load_statistics(&path).unwrap(), stats);
    }
}
