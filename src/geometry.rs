//! Geometry primitives shared by district lookup and nearest search.
//!
//! Longitude/latitude are treated as planar coordinates for centroid and
//! containment, which is accurate enough at city scale. Distances use the
//! haversine formula on a spherical Earth.

use geo::{Area, Centroid};
use geo_types::{Coord, LineString, Polygon};
use hashbrown::HashSet;
use serde_json::Value;
use thiserror::Error;

use crate::models::poi::{coordinate_value, GeoPoint};

/// Mean Earth radius in meters
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Why a park outline could not be turned into a ring
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeometryError {
    #[error("coordinates are not a list of [lon, lat] pairs")]
    Unrecognized,

    #[error("vertex {0} is not numeric")]
    NonNumeric(usize),

    #[error("polygon needs at least 3 distinct vertices, got {0}")]
    TooFewVertices(usize),

    #[error("polygon has zero area")]
    Degenerate,
}

/// Great-circle distance in meters between two valid points.
pub fn haversine(from: GeoPoint, to: GeoPoint) -> f64 {
    let lat1 = from.lat.to_radians();
    let lat2 = to.lat.to_radians();
    let delta_lat = (to.lat - from.lat).to_radians();
    let delta_lon = (to.lon - from.lon).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1.cos() * lat2.cos() * (delta_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_M * c
}

/// Distance in meters, or `f64::INFINITY` when either side is missing.
///
/// Callers filter out the infinite sentinel before ranking.
pub fn distance(from: Option<GeoPoint>, to: Option<GeoPoint>) -> f64 {
    match (from, to) {
        (Some(from), Some(to)) => {
            let d = haversine(from, to);
            if d.is_finite() {
                d
            } else {
                f64::INFINITY
            }
        }
        _ => f64::INFINITY,
    }
}

/// Round to one decimal place.
///
/// Rounds the exact decimal value of `value`, like Python's `round(x, 1)`:
/// `0.15` is stored just below the tie and becomes `0.1`, while exact ties
/// such as `0.25` go to even.
pub fn round_tenth(value: f64) -> f64 {
    if !value.is_finite() {
        return value;
    }
    format!("{:.1}", value).parse().unwrap_or(value)
}

/// Nesting of a raw outline as found in the park source.
#[derive(Debug, Clone, Copy)]
pub enum RingShape<'a> {
    /// `[[[lon, lat], ...], ...]`: the first ring is the outline
    Nested(&'a [Value]),
    /// `[[lon, lat], ...]`: the list itself is the outline
    Flat(&'a [Value]),
}

impl<'a> RingShape<'a> {
    /// Detect nesting depth from the first element.
    pub fn classify(value: &'a Value) -> Result<Self, GeometryError> {
        let outer = value.as_array().ok_or(GeometryError::Unrecognized)?;
        let first = outer
            .first()
            .and_then(Value::as_array)
            .ok_or(GeometryError::Unrecognized)?;

        match first.first() {
            Some(Value::Array(_)) => Ok(RingShape::Nested(first)),
            Some(_) => Ok(RingShape::Flat(outer)),
            None => Err(GeometryError::Unrecognized),
        }
    }

    fn points(&self) -> &'a [Value] {
        match self {
            RingShape::Nested(points) | RingShape::Flat(points) => points,
        }
    }
}

/// An open polygon ring: vertices in order, closing vertex not repeated.
#[derive(Debug, Clone, PartialEq)]
pub struct Ring {
    vertices: Vec<Coord<f64>>,
}

impl Ring {
    /// Build a ring, dropping an explicit closing vertex.
    pub fn from_coords(mut vertices: Vec<Coord<f64>>) -> Result<Self, GeometryError> {
        if vertices.len() > 1 && vertices.first() == vertices.last() {
            vertices.pop();
        }

        let distinct: HashSet<(u64, u64)> = vertices
            .iter()
            .map(|c| (c.x.to_bits(), c.y.to_bits()))
            .collect();
        if distinct.len() < 3 {
            return Err(GeometryError::TooFewVertices(distinct.len()));
        }

        Ok(Self { vertices })
    }

    /// Normalize a park outline of either nesting into a ring.
    ///
    /// Entries that are not two-element lists are skipped; a two-element list
    /// with a non-numeric component rejects the whole outline.
    pub fn from_value(value: &Value) -> Result<Self, GeometryError> {
        let shape = RingShape::classify(value)?;

        let mut vertices = Vec::new();
        for (index, point) in shape.points().iter().enumerate() {
            let pair = match point.as_array() {
                Some(pair) if pair.len() == 2 => pair,
                _ => continue,
            };
            let x = coordinate_value(&pair[0]).ok_or(GeometryError::NonNumeric(index))?;
            let y = coordinate_value(&pair[1]).ok_or(GeometryError::NonNumeric(index))?;
            vertices.push(Coord { x, y });
        }

        Self::from_coords(vertices)
    }

    pub fn vertices(&self) -> &[Coord<f64>] {
        &self.vertices
    }

    pub fn to_polygon(&self) -> Polygon<f64> {
        Polygon::new(LineString::new(self.vertices.clone()), vec![])
    }

    /// Area-weighted planar centroid.
    pub fn centroid(&self) -> Result<GeoPoint, GeometryError> {
        let polygon = self.to_polygon();
        if !(polygon.unsigned_area() > 0.0) {
            return Err(GeometryError::Degenerate);
        }

        let center = polygon.centroid().ok_or(GeometryError::Degenerate)?;
        if !(center.x().is_finite() && center.y().is_finite()) {
            return Err(GeometryError::Degenerate);
        }

        Ok(GeoPoint::new(center.x(), center.y()))
    }
}

/// Centroid of a raw park outline.
pub fn polygon_centroid(value: &Value) -> Result<GeoPoint, GeometryError> {
    Ring::from_value(value)?.centroid()
}

/// Even-odd ray casting test.
///
/// Points lying exactly on an edge or vertex are NOT contained, so a POI on
/// a shared border is never counted in either district.
pub fn point_in_polygon(point: GeoPoint, ring: &Ring) -> bool {
    let (x, y) = (point.lon, point.lat);
    let vertices = ring.vertices();

    let mut inside = false;
    let mut j = vertices.len() - 1;
    for i in 0..vertices.len() {
        let a = vertices[i];
        let b = vertices[j];

        if on_segment(x, y, a, b) {
            return false;
        }

        if (a.y > y) != (b.y > y) {
            let x_cross = (b.x - a.x) * (y - a.y) / (b.y - a.y) + a.x;
            if x < x_cross {
                inside = !inside;
            }
        }
        j = i;
    }

    inside
}

fn on_segment(x: f64, y: f64, a: Coord<f64>, b: Coord<f64>) -> bool {
    let cross = (b.x - a.x) * (y - a.y) - (b.y - a.y) * (x - a.x);
    if cross != 0.0 {
        return false;
    }
    x >= a.x.min(b.x) && x <= a.x.max(b.x) && y >= a.y.min(b.y) && y <= a.y.max(b.y)
}
