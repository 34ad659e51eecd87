//! District ratings from per-category counts.

use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info};

use crate::config::RatingConfig;
use crate::geometry::round_tenth;
use crate::models::{DistrictRating, DistrictStatistics};

/// Set of categories a rating averages over
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CategoryUniverse {
    /// Child-focused categories, used below the policy cutoff
    Fixed(BTreeSet<String>),
    /// Every numeric category of a reference district
    Dynamic(BTreeSet<String>),
}

impl CategoryUniverse {
    /// Pick the universe for `threshold`.
    ///
    /// The dynamic universe is read from the first district by name and
    /// then applied to every district.
    pub fn select(stats: &DistrictStatistics, threshold: f64, config: &RatingConfig) -> Self {
        if threshold < config.policy_cutoff {
            return CategoryUniverse::Fixed(config.child_categories.iter().cloned().collect());
        }

        let categories = stats
            .iter()
            .next()
            .map(|(district, counts)| {
                debug!("Reference district for the category universe: {}", district);
                counts
                    .keys()
                    .filter(|key| !config.excluded_keys.contains(*key))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        CategoryUniverse::Dynamic(categories)
    }

    pub fn categories(&self) -> &BTreeSet<String> {
        match self {
            CategoryUniverse::Fixed(c) | CategoryUniverse::Dynamic(c) => c,
        }
    }
}

/// Mean count over the universe categories present in each district.
///
/// Absent categories are left out of the denominator. A district with
/// none of them scores 0.0.
pub fn rate_districts(
    stats: &DistrictStatistics,
    threshold: f64,
    config: &RatingConfig,
) -> DistrictRating {
    let universe = CategoryUniverse::select(stats, threshold, config);
    let categories = universe.categories();

    stats
        .iter()
        .map(|(district, counts)| {
            let present: Vec<u64> = categories
                .iter()
                .filter_map(|category| counts.get(category).copied())
                .collect();

            let score = if present.is_empty() {
                0.0
            } else {
                let sum: u64 = present.iter().sum();
                round_tenth(sum as f64 / present.len() as f64)
            };
            (district.clone(), score)
        })
        .collect()
}

/// Label under which a threshold's ratings are stored
pub fn threshold_label(threshold: f64) -> String {
    format!("rating_for_{:?}", threshold)
}

/// Ratings for every configured threshold, keyed by label
pub fn rate_thresholds(
    stats: &DistrictStatistics,
    config: &RatingConfig,
) -> BTreeMap<String, DistrictRating> {
    config
        .thresholds
        .iter()
        .map(|&threshold| {
            let ratings = rate_districts(stats, threshold, config);
            info!(
                "Rated {} districts for threshold {}",
                ratings.len(),
                threshold
            );
            (threshold_label(threshold), ratings)
        })
        .collect()
}
