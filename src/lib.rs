//! Kvartal - district statistics and nearest-POI enrichment for rental listings
//!
//! This library provides shared types and stages for the `districts` and
//! `nearest` binaries.

pub mod config;
pub mod dedup;
pub mod error;
pub mod geometry;
pub mod io;
pub mod models;
pub mod neighbors;
pub mod parks;
pub mod pip;
pub mod pipeline;
pub mod rating;
pub mod report;

pub use config::Config;
pub use error::{Error, Result};
pub use models::{DistrictStatistics, GeoPoint, Listing, Park, Poi};
