//! Spatial index for fast candidate lookups over one feature layer.

use geo::Point;
use rstar::{PointDistance, RTree, RTreeObject, AABB};
use std::sync::Arc;
use tracing::{info, warn};

use crate::models::{CollectionKind, Feature, FeatureCollection};

/// Wrapper for R-tree indexing of features
#[derive(Clone)]
pub struct IndexedFeature {
    pub feature: Arc<Feature>,
    envelope: AABB<[f64; 2]>,
}

impl RTreeObject for IndexedFeature {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

// Distance to the bounding box, not to the geometry. Nearest-neighbour
// iteration therefore yields features ordered by this lower bound.
impl PointDistance for IndexedFeature {
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        self.envelope.distance_2(point)
    }
}

impl IndexedFeature {
    pub fn new(feature: Feature) -> Option<Self> {
        let rect = feature.bbox()?;
        Some(Self {
            feature: Arc::new(feature),
            envelope: AABB::from_corners([rect.min().x, rect.min().y], [rect.max().x, rect.max().y]),
        })
    }
}

/// A candidate returned by [`SpatialIndex::candidates_near`]
#[derive(Clone, Copy)]
pub struct Candidate<'a> {
    pub feature: &'a Feature,
    /// Squared planar distance from the query to the feature's bounding box
    pub bbox_distance_2: f64,
}

/// Spatial index over one immutable feature layer using an R-tree
pub struct SpatialIndex {
    kind: CollectionKind,
    tree: RTree<IndexedFeature>,
}

impl SpatialIndex {
    /// Build spatial index from a feature collection
    pub fn build(collection: FeatureCollection) -> Self {
        let kind = collection.kind();
        let total = collection.len();
        info!("Building spatial index for {} {}...", total, kind);

        let indexed: Vec<IndexedFeature> = collection
            .into_features()
            .into_iter()
            .filter_map(IndexedFeature::new)
            .collect();

        if indexed.len() < total {
            warn!(
                "{} {} features have empty geometry and were not indexed",
                total - indexed.len(),
                kind
            );
        }

        let tree = RTree::bulk_load(indexed);
        info!("Spatial index for {} built with {} entries", kind, tree.size());

        Self { kind, tree }
    }

    pub fn kind(&self) -> CollectionKind {
        self.kind
    }

    /// Features ordered by ascending bounding-box distance to `point`.
    ///
    /// Lazy: callers stop pulling once the lower bound exceeds what they need.
    pub fn candidates_near(&self, point: Point<f64>) -> impl Iterator<Item = Candidate<'_>> + '_ {
        self.tree
            .nearest_neighbor_iter_with_distance_2(&[point.x(), point.y()])
            .map(|(indexed, bbox_distance_2)| Candidate {
                feature: indexed.feature.as_ref(),
                bbox_distance_2,
            })
    }

    /// First `limit` features by ascending bounding-box distance
    pub fn candidates_near_limit(&self, point: Point<f64>, limit: usize) -> Vec<&Feature> {
        self.candidates_near(point)
            .take(limit)
            .map(|candidate| candidate.feature)
            .collect()
    }

    /// Features whose bounding box covers `point` (boundary inclusive), in
    /// source order
    pub fn candidates_containing(&self, point: Point<f64>) -> Vec<&Feature> {
        let query_envelope = AABB::from_point([point.x(), point.y()]);

        let mut found: Vec<&Feature> = self
            .tree
            .locate_in_envelope_intersecting(&query_envelope)
            .map(|indexed| indexed.feature.as_ref())
            .collect();
        found.sort_by_key(|feature| feature.position());
        found
    }

    /// Get total number of indexed features
    pub fn len(&self) -> usize {
        self.tree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }

    /// Iterate over all indexed features, in no particular order
    pub fn features(&self) -> impl Iterator<Item = &Feature> {
        self.tree.iter().map(|indexed| indexed.feature.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Properties;
    use geo::{line_string, point, polygon, Geometry};

    fn collection(geometries: Vec<Geometry<f64>>) -> FeatureCollection {
        let features = geometries
            .into_iter()
            .enumerate()
            .map(|(i, g)| Feature::new(i, g, Properties::new()))
            .collect();
        FeatureCollection::new(CollectionKind::Routes, features)
    }

    #[test]
    fn test_empty_index() {
        let index = SpatialIndex::build(FeatureCollection::empty(CollectionKind::Routes));
        let origin = Point::new(0.0, 0.0);

        assert!(index.is_empty());
        assert_eq!(index.candidates_near(origin).count(), 0);
        assert!(index.candidates_near_limit(origin, 5).is_empty());
        assert!(index.candidates_containing(origin).is_empty());
    }

    #[test]
    fn test_candidates_near_ordered_by_bbox() {
        let index = SpatialIndex::build(collection(vec![
            point!(x: 5.0, y: 0.0).into(),
            point!(x: 1.0, y: 0.0).into(),
            line_string![(x: 3.0, y: -1.0), (x: 3.0, y: 1.0)].into(),
        ]));

        let near = index.candidates_near_limit(Point::new(0.0, 0.0), 10);
        let positions: Vec<usize> = near.iter().map(|f| f.position()).collect();
        assert_eq!(positions, vec![1, 2, 0]);

        let bounds: Vec<f64> = index
            .candidates_near(Point::new(0.0, 0.0))
            .map(|c| c.bbox_distance_2)
            .collect();
        assert_eq!(bounds, vec![1.0, 9.0, 25.0]);
    }

    #[test]
    fn test_candidates_near_limit() {
        let index = SpatialIndex::build(collection(vec![
            point!(x: 1.0, y: 0.0).into(),
            point!(x: 2.0, y: 0.0).into(),
            point!(x: 3.0, y: 0.0).into(),
        ]));
        assert_eq!(index.candidates_near_limit(Point::new(0.0, 0.0), 2).len(), 2);
    }

    #[test]
    fn test_candidates_containing() {
        let square = polygon![
            (x: 0.0, y: 0.0),
            (x: 2.0, y: 0.0),
            (x: 2.0, y: 2.0),
            (x: 0.0, y: 2.0)
        ];
        let far = polygon![
            (x: 10.0, y: 10.0),
            (x: 11.0, y: 10.0),
            (x: 11.0, y: 11.0)
        ];
        let index = SpatialIndex::build(collection(vec![far.into(), square.clone().into(), square.into()]));

        let hits = index.candidates_containing(Point::new(1.0, 1.0));
        let positions: Vec<usize> = hits.iter().map(|f| f.position()).collect();
        assert_eq!(positions, vec![1, 2]);

        // Bounding box edge counts
        assert_eq!(index.candidates_containing(Point::new(2.0, 1.0)).len(), 2);
        assert!(index.candidates_containing(Point::new(5.0, 5.0)).is_empty());
    }
}
