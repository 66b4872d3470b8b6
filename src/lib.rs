//! Vigia - tsunami hazard lookup over in-memory GeoJSON layers.
//!
//! This library holds the hazard-evaluation engine shared by the `serve` and
//! `inspect` binaries: feature loading, R-tree indexing, point-in-polygon
//! checks and nearest evacuation route / meeting point search.

pub mod config;
pub mod engine;
pub mod error;
pub mod models;
pub mod spatial;
pub mod store;

pub use engine::{EngineGate, HazardEvaluator};
pub use error::{LoadError, QueryError};
pub use models::{CollectionKind, Feature, FeatureCollection, HazardCheckResult, QueryPoint};
