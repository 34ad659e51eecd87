//! Duplicate removal by exact coordinate.

use hashbrown::HashSet;
use tracing::{debug, info};

use crate::models::Poi;

/// Result of a deduplication pass
#[derive(Debug, Clone, PartialEq)]
pub struct Deduplicated {
    pub pois: Vec<Poi>,
    pub duplicates_removed: usize,
    /// Records kept because their coordinate is unusable
    pub invalid_kept: usize,
}

/// Drop every POI whose `(lon, lat)` was already seen, keeping the first.
///
/// Keys compare bit-for-bit after numeric conversion, so `"55.1"` and
/// `55.1` collide. Records without a usable coordinate never collide and
/// are always kept. Input order is preserved.
pub fn deduplicate(pois: Vec<Poi>) -> Deduplicated {
    info!("Removing duplicate objects by coordinates...");

    let mut seen = HashSet::with_capacity(pois.len());
    let mut kept = Vec::with_capacity(pois.len());
    let mut duplicates_removed = 0;
    let mut invalid_kept = 0;

    for poi in pois {
        let Some(point) = poi.point() else {
            invalid_kept += 1;
            kept.push(poi);
            continue;
        };

        if seen.insert(point.bits()) {
            kept.push(poi);
        } else {
            duplicates_removed += 1;
            debug!(
                "Duplicate by coordinates: {} - ({}, {})",
                poi.label(),
                point.lon,
                point.lat
            );
        }
    }

    info!("Removed {} duplicates by coordinates", duplicates_removed);
    info!("{} unique objects remain", kept.len());

    Deduplicated {
        pois: kept,
        duplicates_removed,
        invalid_kept,
    }
}
