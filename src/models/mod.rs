//! Core data models for the hazard engine.

pub mod feature;
pub mod report;

pub use feature::{CollectionKind, Feature, FeatureCollection, Properties, PropertyValue};
pub use report::{Destination, HazardCheckResult, NearestFeatureInfo, QueryPoint};
