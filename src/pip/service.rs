//! District assignment for POIs and parks.

use serde::Serialize;
use std::borrow::Cow;
use tracing::{debug, info, warn};

use super::DistrictIndex;
use crate::models::{
    DistrictStatistics, FeatureKind, Park, Poi, UnassignedReason, UnassignedRecord,
};

/// Counters reported alongside the statistics
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AssignmentCounters {
    pub pois_total: usize,
    pub pois_valid: usize,
    pub pois_assigned: usize,
    /// Valid coordinate, but outside every district
    pub pois_unassigned: usize,
    pub pois_invalid: usize,
    pub parks_total: usize,
    pub parks_assigned: usize,
    /// Centroid outside every district
    pub parks_unassigned: usize,
    pub parks_failed_geometry: usize,
}

/// Everything one assignment run produces
#[derive(Debug, Clone, Default)]
pub struct AssignmentReport {
    pub statistics: DistrictStatistics,
    pub unassigned: Vec<UnassignedRecord>,
    pub counters: AssignmentCounters,
}

impl AssignmentReport {
    /// Features with a valid location that matched no district
    pub fn without_district(&self) -> impl Iterator<Item = &UnassignedRecord> {
        self.unassigned
            .iter()
            .filter(|r| r.reason == UnassignedReason::NoContainingDistrict)
    }

    /// Features that never reached the containment test
    pub fn invalid(&self) -> impl Iterator<Item = &UnassignedRecord> {
        self.unassigned
            .iter()
            .filter(|r| r.reason != UnassignedReason::NoContainingDistrict)
    }
}

/// Maps POIs and park centroids to the first containing district
pub struct DistrictAssigner {
    index: DistrictIndex,
    park_category: String,
}

impl DistrictAssigner {
    pub fn new(index: DistrictIndex, park_category: &str) -> Self {
        Self {
            index,
            park_category: park_category.to_string(),
        }
    }

    pub fn index(&self) -> &DistrictIndex {
        &self.index
    }

    /// Count every POI and park in its district.
    ///
    /// Each call starts from empty statistics and counters.
    pub fn assign(&self, pois: &[Poi], parks: &[Park]) -> AssignmentReport {
        let mut report = AssignmentReport::default();

        info!("Assigning {} objects to districts...", pois.len());
        for (i, poi) in pois.iter().enumerate() {
            if i % 1000 == 0 {
                info!("Processed objects: {}/{}", i, pois.len());
            }
            self.assign_poi(poi, &mut report);
        }

        info!("Assigning {} parks to districts...", parks.len());
        for (i, park) in parks.iter().enumerate() {
            if i % 100 == 0 {
                info!("Processed parks: {}/{}", i, parks.len());
            }
            self.assign_park(i, park, &mut report);
        }

        let counters = &report.counters;
        info!(
            "Parks done. Assigned: {}, without district: {}, invalid geometry: {}",
            counters.parks_assigned, counters.parks_unassigned, counters.parks_failed_geometry
        );
        info!(
            "Records with invalid coordinates: {}",
            report.invalid().count()
        );

        report
    }

    fn assign_poi(&self, poi: &Poi, report: &mut AssignmentReport) {
        report.counters.pois_total += 1;
        let category = poi.category_or_default();

        let Some(point) = poi.point() else {
            report.counters.pois_invalid += 1;
            report.unassigned.push(UnassignedRecord {
                id: poi_id(poi),
                name: poi_name(poi),
                category: category.to_string(),
                kind: FeatureKind::Poi,
                reason: UnassignedReason::InvalidCoordinates,
                coordinates: poi.coordinates().cloned(),
                centroid: None,
            });
            return;
        };
        report.counters.pois_valid += 1;

        match self.index.lookup(point) {
            Some(district) => {
                report.statistics.increment(&district.name, &category);
                report.counters.pois_assigned += 1;
            }
            None => {
                debug!("No district for {} ({})", poi.label(), category);
                report.counters.pois_unassigned += 1;
                report.unassigned.push(UnassignedRecord {
                    id: poi_id(poi),
                    name: poi_name(poi),
                    category: category.to_string(),
                    kind: FeatureKind::Poi,
                    reason: UnassignedReason::NoContainingDistrict,
                    coordinates: poi.coordinates().cloned(),
                    centroid: None,
                });
            }
        }
    }

    fn assign_park(&self, index: usize, park: &Park, report: &mut AssignmentReport) {
        report.counters.parks_total += 1;
        let name = park.display_name(index);
        let id = format!("park_{}", index);

        let centroid = match park.centroid() {
            Ok(centroid) => centroid,
            Err(e) => {
                warn!("Park {} has invalid geometry: {}", name, e);
                report.counters.parks_failed_geometry += 1;
                report.unassigned.push(UnassignedRecord {
                    id,
                    name,
                    category: self.park_category.clone(),
                    kind: FeatureKind::Park,
                    reason: UnassignedReason::InvalidGeometry,
                    coordinates: park.coordinates().cloned(),
                    centroid: None,
                });
                return;
            }
        };

        match self.index.lookup(centroid) {
            Some(district) => {
                report.statistics.increment(&district.name, &self.park_category);
                report.counters.parks_assigned += 1;
            }
            None => {
                debug!(
                    "No district for park {} at ({}, {})",
                    name, centroid.lon, centroid.lat
                );
                report.counters.parks_unassigned += 1;
                report.unassigned.push(UnassignedRecord {
                    id,
                    name,
                    category: self.park_category.clone(),
                    kind: FeatureKind::Park,
                    reason: UnassignedReason::NoContainingDistrict,
                    coordinates: None,
                    centroid: Some(centroid),
                });
            }
        }
    }
}

fn poi_id(poi: &Poi) -> String {
    poi.id()
        .map(Cow::into_owned)
        .unwrap_or_else(|| "Неизвестно".to_string())
}

fn poi_name(poi: &Poi) -> String {
    poi.name()
        .map(Cow::into_owned)
        .unwrap_or_else(|| "Без названия".to_string())
}
