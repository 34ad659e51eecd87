//! Spatial index for fast district lookups.

use rstar::{RTree, RTreeObject, AABB};
use tracing::info;

use super::District;
use crate::models::GeoPoint;

/// R-tree entry pointing back at a district by its source position
#[derive(Debug, Clone)]
struct IndexedDistrict {
    order: usize,
    envelope: AABB<[f64; 2]>,
}

impl RTreeObject for IndexedDistrict {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

/// Spatial index over districts that keeps first-match-in-source-order semantics
pub struct DistrictIndex {
    districts: Vec<District>,
    tree: RTree<IndexedDistrict>,
}

impl DistrictIndex {
    /// Build spatial index from districts, in the order they should be tried
    pub fn build(districts: Vec<District>) -> Self {
        info!("Building spatial index for {} districts...", districts.len());

        let indexed: Vec<IndexedDistrict> = districts
            .iter()
            .enumerate()
            .filter_map(|(order, district)| {
                let (min_x, min_y, max_x, max_y) = district.bbox()?;
                Some(IndexedDistrict {
                    order,
                    envelope: AABB::from_corners([min_x, min_y], [max_x, max_y]),
                })
            })
            .collect();

        let tree = RTree::bulk_load(indexed);
        info!("Spatial index built with {} entries", tree.size());

        Self { districts, tree }
    }

    /// The first district (in source order) whose boundary contains the point.
    ///
    /// The R-tree only narrows candidates; among all containing districts the
    /// one that appears earliest in the source wins, exactly as a linear scan.
    pub fn lookup(&self, point: GeoPoint) -> Option<&District> {
        let query_envelope = AABB::from_point([point.lon, point.lat]);

        self.tree
            .locate_in_envelope_intersecting(&query_envelope)
            .map(|entry| entry.order)
            .filter(|&order| self.districts[order].contains(point))
            .min()
            .map(|order| &self.districts[order])
    }

    pub fn districts(&self) -> &[District] {
        &self.districts
    }

    pub fn len(&self) -> usize {
        self.districts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.districts.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Ring;
    use geo::Coord;

    fn rect(name: &str, min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> District {
        let ring = Ring::from_coords(vec![
            Coord { x: min_x, y: min_y },
            Coord { x: max_x, y: min_y },
            Coord { x: max_x, y: max_y },
            Coord { x: min_x, y: max_y },
        ])
        .unwrap();
        District::new(name, ring)
    }

    #[test]
    fn test_empty_index() {
        let index = DistrictIndex::build(vec![]);
        assert!(index.is_empty());
        assert!(index.lookup(GeoPoint::new(37.4, 55.8)).is_none());
    }

    #[test]
    fn test_lookup_inside_and_outside() {
        let index = DistrictIndex::build(vec![
            rect("A", 0.0, 0.0, 1.0, 1.0),
            rect("B", 1.0, 0.0, 2.0, 1.0),
        ]);
        assert_eq!(index.lookup(GeoPoint::new(0.5, 0.5)).unwrap().name, "A");
        assert_eq!(index.lookup(GeoPoint::new(1.5, 0.5)).unwrap().name, "B");
        assert!(index.lookup(GeoPoint::new(5.0, 5.0)).is_none());
        // Shared border belongs to neither
        assert!(index.lookup(GeoPoint::new(1.0, 0.5)).is_none());
    }

    #[test]
    fn test_first_match_wins_on_overlap() {
        let index = DistrictIndex::build(vec![
            rect("outer", 0.0, 0.0, 10.0, 10.0),
            rect("inner", 4.0, 4.0, 6.0, 6.0),
        ]);
        assert_eq!(index.lookup(GeoPoint::new(5.0, 5.0)).unwrap().name, "outer");

        let reversed = DistrictIndex::build(vec![
            rect("inner", 4.0, 4.0, 6.0, 6.0),
            rect("outer", 0.0, 0.0, 10.0, 10.0),
        ]);
        assert_eq!(reversed.lookup(GeoPoint::new(5.0, 5.0)).unwrap().name, "inner");
    }

    #[test]
    fn test_containing_district_found_regardless_of_order() {
        let districts = vec![
            rect("A", 0.0, 0.0, 1.0, 1.0),
            rect("B", 2.0, 0.0, 3.0, 1.0),
            rect("C", 4.0, 0.0, 5.0, 1.0),
        ];
        let point = GeoPoint::new(2.5, 0.5);

        for shift in 0..districts.len() {
            let mut rotated = districts.clone();
            rotated.rotate_left(shift);
            let index = DistrictIndex::build(rotated);
            assert_eq!(index.lookup(point).unwrap().name, "B");
        }
    }
}
