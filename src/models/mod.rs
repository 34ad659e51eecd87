//! Core data models for the enrichment pipeline.

pub mod district;
pub mod listing;
pub mod park;
pub mod poi;

pub use district::{
    CategoryCounts, DistrictRating, DistrictStatistics, FeatureKind, StatisticsDocument,
    UnassignedReason, UnassignedRecord,
};
pub use listing::{Listing, NearestObject, NearestObjects};
pub use park::Park;
pub use poi::{GeoPoint, Poi};
