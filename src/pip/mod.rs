//! Point-in-Polygon (PIP) district lookup.
//!
//! Loads district boundaries and assigns POIs and park centroids to the
//! first containing district using an R-tree spatial index.

mod boundary;
mod index;
mod service;

pub use boundary::{extract_districts, District, DistrictSource};
pub use index::DistrictIndex;
pub use service::{AssignmentCounters, AssignmentReport, DistrictAssigner};
