//! Point-in-polygon membership for hazard zones.
//!
//! Boundary policy: a point lying exactly on an exterior or hole ring counts
//! as contained. Points strictly inside a hole are not contained.

use geo::coordinate_position::{CoordPos, CoordinatePosition};
use geo::{Geometry, Point, Polygon};

use super::SpatialIndex;
use crate::error::QueryError;
use crate::models::Feature;

/// Test whether `point` falls inside (or on the boundary of) the feature.
///
/// Only Polygon and MultiPolygon features can contain anything; every other
/// geometry kind answers `false`. An invalid polygon (self-intersecting or
/// degenerate ring) is a geometry error rather than a guess.
pub fn contains(feature: &Feature, point: Point<f64>) -> Result<bool, QueryError> {
    let polygons: &[Polygon<f64>] = match feature.geometry() {
        Geometry::Polygon(polygon) => std::slice::from_ref(polygon),
        Geometry::MultiPolygon(multi) => &multi.0,
        _ => return Ok(false),
    };

    if let Some(reason) = feature.defect() {
        return Err(QueryError::Geometry {
            position: feature.position(),
            reason: reason.to_string(),
        });
    }

    for polygon in polygons {
        match polygon.coordinate_position(&point.0) {
            CoordPos::Inside | CoordPos::OnBoundary => return Ok(true),
            CoordPos::Outside => {}
        }
    }

    Ok(false)
}

/// All features of `index` containing `point`, in source order
pub fn containing_features(
    index: &SpatialIndex,
    point: Point<f64>,
) -> Result<Vec<&Feature>, QueryError> {
    let mut hits = Vec::new();
    for feature in index.candidates_containing(point) {
        if contains(feature, point)? {
            hits.push(feature);
        }
    }
    Ok(hits)
}
