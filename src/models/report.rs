//! Query input and the derived hazard report returned to callers.

use geo::Point;
use serde::{Deserialize, Serialize};

use crate::error::QueryError;

/// Query location as supplied by callers: (lat, lon) in degrees.
///
/// Geometry code works in (lon, lat); use [`QueryPoint::to_point`] to cross
/// over rather than building a `Point` by hand.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QueryPoint {
    pub lat: f64,
    pub lon: f64,
}

impl QueryPoint {
    /// Validate and build a query point. Out-of-range values are rejected,
    /// never clamped.
    pub fn new(lat: f64, lon: f64) -> Result<Self, QueryError> {
        let point = Self { lat, lon };
        point.validate()?;
        Ok(point)
    }

    pub fn validate(&self) -> Result<(), QueryError> {
        check_range("lat", self.lat, 90.0)?;
        check_range("lon", self.lon, 180.0)
    }

    /// Planar point with x = longitude, y = latitude
    pub fn to_point(&self) -> Point<f64> {
        Point::new(self.lon, self.lat)
    }
}

fn check_range(field: &'static str, value: f64, limit: f64) -> Result<(), QueryError> {
    if value.is_finite() && (-limit..=limit).contains(&value) {
        Ok(())
    } else {
        Err(QueryError::InvalidInput {
            field,
            value,
            min: -limit,
            max: limit,
        })
    }
}

/// Geographic point (lat/lon)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Destination {
    pub lat: f64,
    pub lon: f64,
}

impl From<Point<f64>> for Destination {
    fn from(point: Point<f64>) -> Self {
        Self {
            lat: point.y(),
            lon: point.x(),
        }
    }
}

/// Nearest feature of a layer relative to the query point
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NearestFeatureInfo {
    /// Planar approximation, rounded to centimetres
    pub distance_meters: f64,
    pub name: String,
    pub description: String,
    /// GeoJSON geometry of the matched feature
    pub geometry: geojson::Geometry,
    /// Closest point on the matched geometry
    pub destination: Destination,
}

/// Final verdict for one query
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HazardCheckResult {
    pub safe: bool,
    /// Matching zone labels, deduplicated, in first-seen order
    pub hazards: Vec<String>,
    pub nearest_route: Option<NearestFeatureInfo>,
    pub nearest_meeting_point: Option<NearestFeatureInfo>,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_point_axis_order() {
        let query = QueryPoint::new(-33.0472, -71.6127).unwrap();
        let point = query.to_point();
        assert_eq!(point.x(), -71.6127);
        assert_eq!(point.y(), -33.0472);
    }

    #[test]
    fn test_query_point_range() {
        assert!(QueryPoint::new(90.0, 180.0).is_ok());
        assert!(QueryPoint::new(-90.0, -180.0).is_ok());

        let err = QueryPoint::new(90.5, 0.0).unwrap_err();
        assert!(err.is_client_error());
        assert!(err.to_string().contains("lat"));

        let err = QueryPoint::new(0.0, -180.01).unwrap_err();
        assert!(err.to_string().contains("lon"));

        assert!(QueryPoint::new(f64::NAN, 0.0).is_err());
    }

    #[test]
    fn test_result_serializes_camel_case() {
        let result = HazardCheckResult {
            safe: true,
            hazards: vec![],
            nearest_route: Some(NearestFeatureInfo {
                distance_meters: 12.5,
                name: "Route in Unknown".to_string(),
                description: "Follow marked evacuation signs.".to_string(),
                geometry: geojson::Geometry::new(geojson::Value::Point(vec![1.0, 2.0])),
                destination: Destination { lat: 2.0, lon: 1.0 },
            }),
            nearest_meeting_point: None,
            message: "ok".to_string(),
        };

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["nearestRoute"]["distanceMeters"], 12.5);
        assert_eq!(json["nearestRoute"]["geometry"]["type"], "Point");
        assert_eq!(json["nearestRoute"]["destination"]["lon"], 1.0);
        assert!(json["nearestMeetingPoint"].is_null());
    }
}
