//! Batch stages wired together, without any file access.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::config::Config;
use crate::dedup::{deduplicate, Deduplicated};
use crate::models::{DistrictRating, Park, Poi};
use crate::pip::{
    AssignmentCounters, AssignmentReport, DistrictAssigner, DistrictIndex, DistrictSource,
};
use crate::rating::rate_thresholds;

/// Output of the district aggregation stages
#[derive(Debug, Clone)]
pub struct DistrictRun {
    pub deduplicated: Deduplicated,
    pub assignment: AssignmentReport,
    pub ratings: BTreeMap<String, DistrictRating>,
    pub districts_skipped: usize,
}

/// Deduplicate, assign to districts, and rate every configured threshold.
pub fn run_districts(
    pois: Vec<Poi>,
    parks: &[Park],
    districts: DistrictSource,
    config: &Config,
) -> DistrictRun {
    let deduplicated = deduplicate(pois);

    let assigner = DistrictAssigner::new(
        DistrictIndex::build(districts.districts),
        &config.parks.category,
    );
    let assignment = assigner.assign(&deduplicated.pois, parks);
    let ratings = rate_thresholds(&assignment.statistics, &config.rating);

    DistrictRun {
        deduplicated,
        assignment,
        ratings,
        districts_skipped: districts.skipped,
    }
}

/// Machine-readable summary of a `districts` run
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub generated_at: DateTime<Utc>,
    pub duplicates_removed: usize,
    pub invalid_coordinates_kept: usize,
    pub districts_skipped: usize,
    pub counters: AssignmentCounters,
}

impl RunSummary {
    pub fn new(run: &DistrictRun) -> Self {
        Self {
            generated_at: Utc::now(),
            duplicates_removed: run.deduplicated.duplicates_removed,
            invalid_coordinates_kept: run.deduplicated.invalid_kept,
            districts_skipped: run.districts_skipped,
            counters: run.assignment.counters.clone(),
        }
    }
}
