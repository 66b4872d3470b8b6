//! Error types for loading feature layers and answering queries.

use std::path::PathBuf;

use thiserror::Error;

/// Failure to read or parse a feature collection.
///
/// Never fatal for the engine: [`crate::store::load`] turns it into an empty
/// collection and a warning.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid GeoJSON: {0}")]
    Json(#[from] geojson::Error),

    #[error("expected a FeatureCollection, found {0}")]
    NotFeatureCollection(&'static str),
}

/// Request-scoped failure. Never affects shared engine state.
#[derive(Debug, Error)]
pub enum QueryError {
    /// Latitude/longitude outside the valid range or not finite.
    #[error("invalid {field}: {value} (expected {min}..={max})")]
    InvalidInput {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    /// A stored geometry cannot answer containment or distance questions.
    #[error("invalid geometry in feature {position}: {reason}")]
    Geometry { position: usize, reason: String },
}

impl QueryError {
    /// Whether the caller, rather than the loaded data, is at fault.
    pub fn is_client_error(&self) -> bool {
        matches!(self, QueryError::InvalidInput { .. })
    }
}
