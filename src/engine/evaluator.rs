//! Hazard verdict for a single query point.

use tracing::{debug, info};

use crate::config::{Config, MessageConfig, QueryConfig};
use crate::error::QueryError;
use crate::models::{CollectionKind, FeatureCollection, HazardCheckResult, QueryPoint};
use crate::spatial::{containing_features, nearest, SpatialIndex};
use crate::store;

/// Property keys tried, in order, for a hazard zone's label
pub const HAZARD_LABEL_KEYS: &[&str] = &["hazard", "label", "tipo"];

/// Immutable engine over the three indexed layers.
///
/// Built once, then shared by reference; `evaluate` never mutates it, so
/// concurrent queries need no locking.
pub struct HazardEvaluator {
    hazard_zones: SpatialIndex,
    routes: SpatialIndex,
    meeting_points: SpatialIndex,
    messages: MessageConfig,
    proximity_threshold_m: f64,
}

impl HazardEvaluator {
    /// Build the engine from already loaded layers
    pub fn new(
        hazard_zones: FeatureCollection,
        routes: FeatureCollection,
        meeting_points: FeatureCollection,
        messages: MessageConfig,
        query: &QueryConfig,
    ) -> Self {
        Self {
            hazard_zones: SpatialIndex::build(hazard_zones),
            routes: SpatialIndex::build(routes),
            meeting_points: SpatialIndex::build(meeting_points),
            messages,
            proximity_threshold_m: query.proximity_threshold_m,
        }
    }

    /// Build the engine with default messages and thresholds
    pub fn with_defaults(
        hazard_zones: FeatureCollection,
        routes: FeatureCollection,
        meeting_points: FeatureCollection,
    ) -> Self {
        Self::new(
            hazard_zones,
            routes,
            meeting_points,
            MessageConfig::default(),
            &QueryConfig::default(),
        )
    }

    /// Load every layer named in `config` and index it. Blocking.
    ///
    /// Missing or broken layers come up empty; this never fails.
    pub fn from_config(config: &Config) -> Self {
        info!("Initializing hazard engine...");

        let [hazard_zones, routes, meeting_points] = [
            CollectionKind::HazardZones,
            CollectionKind::Routes,
            CollectionKind::MeetingPoints,
        ]
        .map(|kind| store::load(config.data.path_for(kind), kind));

        let engine = Self::new(
            hazard_zones,
            routes,
            meeting_points,
            config.messages.clone(),
            &config.query,
        );

        info!(
            "Hazard engine ready: {} hazard zones, {} routes, {} meeting points",
            engine.hazard_zones.len(),
            engine.routes.len(),
            engine.meeting_points.len()
        );

        engine
    }

    /// Evaluate a raw (lat, lon) pair, validating its range first
    pub fn evaluate_lat_lon(&self, lat: f64, lon: f64) -> Result<HazardCheckResult, QueryError> {
        self.evaluate(QueryPoint::new(lat, lon)?)
    }

    /// Containment against hazard zones plus nearest route and meeting point
    pub fn evaluate(&self, query: QueryPoint) -> Result<HazardCheckResult, QueryError> {
        query.validate()?;
        let point = query.to_point();

        let mut hazards: Vec<String> = Vec::new();
        for zone in containing_features(&self.hazard_zones, point)? {
            let label = zone
                .first_property(HAZARD_LABEL_KEYS)
                .unwrap_or_else(|| self.messages.hazard_label.clone());
            if !hazards.contains(&label) {
                hazards.push(label);
            }
        }

        let nearest_route = nearest(&self.routes, point)?
            .map(|found| found.to_info(CollectionKind::Routes, &self.messages.description));
        let nearest_meeting_point = nearest(&self.meeting_points, point)?
            .map(|found| found.to_info(CollectionKind::MeetingPoints, &self.messages.description));

        let safe = hazards.is_empty();

        let message = if !safe {
            &self.messages.alert
        } else if nearest_route
            .as_ref()
            .is_some_and(|route| route.distance_meters < self.proximity_threshold_m)
        {
            &self.messages.proximity
        } else {
            &self.messages.safe
        };

        debug!(
            "Hazard check at ({}, {}): safe={}, {} hazards",
            query.lat,
            query.lon,
            safe,
            hazards.len()
        );

        Ok(HazardCheckResult {
            safe,
            hazards,
            nearest_route,
            nearest_meeting_point,
            message: message.clone(),
        })
    }

    pub fn hazard_zones(&self) -> &SpatialIndex {
        &self.hazard_zones
    }

    pub fn routes(&self) -> &SpatialIndex {
        &self.routes
    }

    pub fn meeting_points(&self) -> &SpatialIndex {
        &self.meeting_points
    }
}
