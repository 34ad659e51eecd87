//! Nearest POIs per category for target locations.

use hashbrown::HashMap;
use std::borrow::Cow;
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

use crate::config::NearestConfig;
use crate::geometry::{distance, round_tenth};
use crate::models::{GeoPoint, Listing, NearestObject, NearestObjects, Poi};

struct Candidate<'a> {
    poi: &'a Poi,
    point: GeoPoint,
}

/// Counts from one enrichment pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EnrichStats {
    pub enriched: usize,
    /// Listings without a usable latitude/longitude
    pub skipped: usize,
}

/// Finds the K closest POIs per configured category.
///
/// POIs are grouped by category once, keeping input order inside each
/// group, so equal distances resolve to the earlier POI.
pub struct NearestFinder<'a> {
    /// (output field, candidates) in configuration order
    groups: Vec<(String, Vec<Candidate<'a>>)>,
    limit: usize,
}

impl<'a> NearestFinder<'a> {
    pub fn new(pois: &'a [Poi], config: &NearestConfig) -> Self {
        let mut by_category: HashMap<&str, Vec<Candidate<'a>>> = config
            .categories
            .iter()
            .map(|row| (row.category.as_str(), Vec::new()))
            .collect();

        for poi in pois {
            let Some(category) = poi.category() else {
                continue;
            };
            let Some(group) = by_category.get_mut(category) else {
                continue;
            };
            if let Some(point) = poi.point() {
                group.push(Candidate { poi, point });
            }
        }

        let groups: Vec<_> = config
            .categories
            .iter()
            .map(|row| {
                let candidates = by_category.remove(row.category.as_str()).unwrap_or_default();
                debug!("{}: {} candidates", row.category, candidates.len());
                (row.field.clone(), candidates)
            })
            .collect();

        Self {
            groups,
            limit: config.limit,
        }
    }

    /// Nearest POIs for one target. Every configured field is present.
    pub fn find(&self, target: GeoPoint) -> NearestObjects {
        let mut by_field = BTreeMap::new();

        for (field, candidates) in &self.groups {
            let mut ranked: Vec<(f64, &Candidate)> = candidates
                .iter()
                .map(|c| (distance(Some(target), Some(c.point)), c))
                .filter(|(d, _)| d.is_finite())
                .collect();
            // stable: ties keep input order
            ranked.sort_by(|a, b| a.0.total_cmp(&b.0));

            let nearest = ranked
                .into_iter()
                .take(self.limit)
                .map(|(d, c)| NearestObject {
                    name: c.poi.name().map(Cow::into_owned).unwrap_or_default(),
                    address: c.poi.address().map(Cow::into_owned).unwrap_or_default(),
                    coordinates: [[c.point.lon, c.point.lat]],
                    distance: round_tenth(d),
                })
                .collect();
            by_field.insert(field.clone(), nearest);
        }

        NearestObjects {
            coordinates: target,
            by_field,
        }
    }

    /// Attach `nearest_objects` to every listing with a usable location.
    ///
    /// Listings without one are left untouched.
    pub fn enrich(&self, listings: &mut [Listing]) -> EnrichStats {
        let mut stats = EnrichStats::default();
        for listing in listings.iter_mut() {
            self.enrich_one(listing, &mut stats);
        }
        info!(
            "Enriched {} listings, skipped {} without coordinates",
            stats.enriched, stats.skipped
        );
        stats
    }

    /// Enrich a single listing, updating `stats`
    pub fn enrich_one(&self, listing: &mut Listing, stats: &mut EnrichStats) {
        let Some(point) = listing.point() else {
            debug!(
                "Listing {} has no usable coordinates",
                listing.id().unwrap_or_default()
            );
            stats.skipped += 1;
            return;
        };

        match listing.set_nearest_objects(&self.find(point)) {
            Ok(()) => stats.enriched += 1,
            Err(e) => {
                warn!(
                    "Listing {}: cannot attach nearest objects: {}",
                    listing.id().unwrap_or_default(),
                    e
                );
                stats.skipped += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CategoryField;
    use crate::geometry::haversine;

    fn config(limit: usize) -> NearestConfig {
        NearestConfig {
            limit,
            categories: vec![
                CategoryField::new("школы", "nearest_schools"),
                CategoryField::new("парки", "nearest_parks"),
            ],
        }
    }

    fn school(name: &str, lon: f64, lat: f64) -> Poi {
        Poi::new(name, "школы", GeoPoint::new(lon, lat))
    }

    #[test]
    fn test_sorted_and_limited() {
        let pois = vec![
            school("far", 37.7, 55.8),
            school("near", 37.41, 55.8),
            school("mid", 37.5, 55.8),
            school("farther", 37.9, 55.8),
        ];
        let finder = NearestFinder::new(&pois, &config(3));
        let result = finder.find(GeoPoint::new(37.4, 55.8));

        let schools = &result.by_field["nearest_schools"];
        let names: Vec<_> = schools.iter().map(|o| o.name.as_str()).collect();
        assert_eq!(names, vec!["near", "mid", "far"]);
        assert!(schools.windows(2).all(|w| w[0].distance <= w[1].distance));
    }

    #[test]
    fn test_length_is_min_of_limit_and_candidates() {
        let pois = vec![school("a", 37.5, 55.8), school("b", 37.6, 55.8)];
        let finder = NearestFinder::new(&pois, &config(5));
        let result = finder.find(GeoPoint::new(37.4, 55.8));
        assert_eq!(result.by_field["nearest_schools"].len(), 2);
    }

    #[test]
    fn test_ties_keep_input_order() {
        let pois = vec![
            school("east", 37.5, 55.0),
            school("west", 36.5, 55.0),
            school("east again", 37.5, 55.0),
        ];
        let finder = NearestFinder::new(&pois, &config(5));
        let result = finder.find(GeoPoint::new(37.0, 55.0));

        let names: Vec<_> = result.by_field["nearest_schools"]
            .iter()
            .map(|o| o.name.as_str())
            .collect();
        assert_eq!(names, vec!["east", "west", "east again"]);
    }

    #[test]
    fn test_absent_category_yields_empty_list() {
        let pois = vec![school("a", 37.5, 55.8)];
        let finder = NearestFinder::new(&pois, &config(5));
        let result = finder.find(GeoPoint::new(37.4, 55.8));
        assert_eq!(result.by_field["nearest_parks"], vec![]);
        assert_eq!(result.by_field.len(), 2);
    }

    #[test]
    fn test_invalid_coordinates_are_skipped() {
        let mut broken = school("broken", 0.0, 0.0);
        broken.set("coordinates", serde_json::json!({"lon": "abc", "lat": 55.0}));
        let pois = vec![broken, school("ok", 37.5, 55.8)];

        let finder = NearestFinder::new(&pois, &config(5));
        let result = finder.find(GeoPoint::new(37.4, 55.8));
        assert_eq!(result.by_field["nearest_schools"].len(), 1);
    }

    #[test]
    fn test_recorded_distance_matches() {
        let pois = vec![school("a", 37.55, 55.76)];
        let target = GeoPoint::new(37.6, 55.75);
        let finder = NearestFinder::new(&pois, &config(5));
        let result = finder.find(target);

        let object = &result.by_field["nearest_schools"][0];
        let [[lon, lat]] = object.coordinates;
        let expected = haversine(target, GeoPoint::new(lon, lat));
        assert!((object.distance - expected).abs() <= 0.05);
        assert_eq!(object.address, "");
    }

    #[test]
    fn test_enrich_skips_listings_without_coordinates() {
        let pois = vec![school("a", 37.5, 55.8)];
        let finder = NearestFinder::new(&pois, &config(5));

        let mut missing = Listing::new(2, GeoPoint::new(0.0, 0.0));
        missing.set("latitude", serde_json::Value::Null);
        let mut listings = vec![Listing::new(1, GeoPoint::new(37.4, 55.8)), missing];

        let stats = finder.enrich(&mut listings);
        assert_eq!(stats, EnrichStats { enriched: 1, skipped: 1 });
        assert!(listings[0].nearest_objects().is_some());
        assert!(listings[1].nearest_objects().is_none());
    }
}
