//! Nearest-feature search over a [`SpatialIndex`].
//!
//! Distances are planar, in degrees, and converted to meters with a fixed
//! factor. This is not a geodesic calculation: longitude degrees shrink with
//! latitude, so the figure is only trustworthy near the latitude band the
//! deployment targets.

use geo::{Closest, ClosestPoint, Geometry, Point};
use tracing::debug;

use super::SpatialIndex;
use crate::error::QueryError;
use crate::models::{CollectionKind, Destination, Feature, NearestFeatureInfo};

/// Meters per degree of arc used for the planar approximation
pub const METERS_PER_DEGREE: f64 = 111_139.0;

/// Property keys tried, in order, for a feature's display name
pub const NAME_KEYS: &[&str] = &["nom_com", "nombre", "Name"];

/// Display name used when none of [`NAME_KEYS`] is present
pub const UNKNOWN_NAME: &str = "Unknown";

/// Winning feature of a nearest search
#[derive(Debug, Clone, Copy)]
pub struct NearestMatch<'a> {
    pub feature: &'a Feature,
    /// Closest point on the feature's geometry, (lon, lat)
    pub closest: Point<f64>,
    distance_2: f64,
}

impl<'a> NearestMatch<'a> {
    /// Planar distance in degrees
    pub fn distance_degrees(&self) -> f64 {
        self.distance_2.sqrt()
    }

    pub fn distance_meters(&self) -> f64 {
        degrees_to_meters(self.distance_degrees())
    }

    /// Build the report entry for this match
    pub fn to_info(&self, kind: CollectionKind, description: &str) -> NearestFeatureInfo {
        NearestFeatureInfo {
            distance_meters: round_centimeters(self.distance_meters()),
            name: format!("{} in {}", kind.label(), display_name(self.feature)),
            description: description.to_string(),
            geometry: geojson::Geometry::new(geojson::Value::from(self.feature.geometry())),
            destination: Destination::from(self.closest),
        }
    }

    fn beats(&self, other: &NearestMatch<'_>) -> bool {
        self.distance_2 < other.distance_2
            || (self.distance_2 == other.distance_2
                && self.feature.position() < other.feature.position())
    }
}

/// Find the globally nearest feature of `index` to `point`.
///
/// Candidates arrive ordered by bounding-box distance, a lower bound on the
/// true distance. The scan stops once that bound exceeds the best true
/// distance; equal bounds are still examined so that ties resolve to the
/// earliest feature in source order.
pub fn nearest(index: &SpatialIndex, point: Point<f64>) -> Result<Option<NearestMatch<'_>>, QueryError> {
    let mut best: Option<NearestMatch<'_>> = None;
    let mut examined = 0usize;

    for candidate in index.candidates_near(point) {
        if let Some(current) = &best {
            if current.distance_2 < candidate.bbox_distance_2 {
                break;
            }
        }
        examined += 1;

        let closest = closest_point(candidate.feature, point)?;
        let found = NearestMatch {
            feature: candidate.feature,
            closest,
            distance_2: distance_2(point, closest),
        };
        if !found.distance_2.is_finite() {
            return Err(QueryError::Geometry {
                position: candidate.feature.position(),
                reason: "distance is not finite".to_string(),
            });
        }

        if best.as_ref().map_or(true, |current| found.beats(current)) {
            best = Some(found);
        }
    }

    debug!(
        "Nearest {} search examined {} of {} candidates",
        index.kind(),
        examined,
        index.len()
    );

    Ok(best)
}

/// Closest point to `point` lying on the feature's geometry.
///
/// A Point feature answers with its own coordinates. For areal features a
/// query inside the polygon is its own closest point.
pub fn closest_point(feature: &Feature, point: Point<f64>) -> Result<Point<f64>, QueryError> {
    if let Geometry::Point(own) = feature.geometry() {
        return Ok(*own);
    }

    match feature.geometry().closest_point(&point) {
        Closest::Intersection(p) | Closest::SinglePoint(p) => Ok(p),
        Closest::Indeterminate => Err(QueryError::Geometry {
            position: feature.position(),
            reason: format!("no closest point on {}", feature.geometry_type()),
        }),
    }
}

/// Planar distance between two (lon, lat) points, in degrees
pub fn distance_degrees(a: Point<f64>, b: Point<f64>) -> f64 {
    distance_2(a, b).sqrt()
}

fn distance_2(a: Point<f64>, b: Point<f64>) -> f64 {
    let dx = b.x() - a.x();
    let dy = b.y() - a.y();
    dx * dx + dy * dy
}

pub fn degrees_to_meters(degrees: f64) -> f64 {
    degrees * METERS_PER_DEGREE
}

/// Round to two decimal places, the precision reported to callers
pub fn round_centimeters(meters: f64) -> f64 {
    (meters * 100.0).round() / 100.0
}

/// Display name from [`NAME_KEYS`], or [`UNKNOWN_NAME`]
pub fn display_name(feature: &Feature) -> String {
    feature
        .first_property(NAME_KEYS)
        .unwrap_or_else(|| UNKNOWN_NAME.to_string())
}
