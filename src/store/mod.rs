//! Feature layer loading from GeoJSON files.
//!
//! Layers are expected in EPSG:4326 with (lon, lat) coordinates already;
//! nothing here reprojects. A missing or broken file never aborts engine
//! construction: [`load`] degrades to an empty collection and logs a warning.

use std::fs;
use std::path::Path;

use geo::BoundingRect;
use geo_types::Geometry;
use geojson::GeoJson;
use tracing::{debug, info, warn};

use crate::error::LoadError;
use crate::models::{CollectionKind, Feature, FeatureCollection, Properties, PropertyValue};

/// Load a layer, falling back to an empty collection on any failure
pub fn load<P: AsRef<Path>>(path: P, kind: CollectionKind) -> FeatureCollection {
    let path = path.as_ref();

    if !path.exists() {
        warn!("{} not found at {}, layer disabled", kind, path.display());
        return FeatureCollection::empty(kind);
    }

    info!("Loading {} from {}...", kind, path.display());
    match read_collection(path, kind) {
        Ok(collection) => {
            info!("Loaded {} {}", collection.len(), kind);
            collection
        }
        Err(e) => {
            warn!("Error loading {} from {}: {}", kind, path.display(), e);
            FeatureCollection::empty(kind)
        }
    }
}

/// Read and parse a layer, reporting failures to the caller
pub fn read_collection<P: AsRef<Path>>(
    path: P,
    kind: CollectionKind,
) -> Result<FeatureCollection, LoadError> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_collection(&content, kind)
}

/// Parse a GeoJSON FeatureCollection into typed features.
///
/// Features without a geometry, with an empty geometry or with a
/// GeometryCollection are skipped; the remaining ones keep their relative
/// source order.
pub fn parse_collection(content: &str, kind: CollectionKind) -> Result<FeatureCollection, LoadError> {
    let geojson: GeoJson = content.parse()?;

    let source = match geojson {
        GeoJson::FeatureCollection(fc) => fc,
        GeoJson::Feature(_) => return Err(LoadError::NotFeatureCollection("Feature")),
        GeoJson::Geometry(_) => return Err(LoadError::NotFeatureCollection("Geometry")),
    };

    let total = source.features.len();
    let mut features = Vec::with_capacity(total);

    for (source_idx, feature) in source.features.into_iter().enumerate() {
        let Some(geometry) = feature.geometry else {
            debug!("Skipping {} feature {}: no geometry", kind, source_idx);
            continue;
        };

        let geometry = match Geometry::<f64>::try_from(geometry.value) {
            Ok(Geometry::GeometryCollection(_)) => {
                debug!("Skipping {} feature {}: GeometryCollection", kind, source_idx);
                continue;
            }
            Ok(g) if g.bounding_rect().is_none() => {
                debug!("Skipping {} feature {}: empty geometry", kind, source_idx);
                continue;
            }
            Ok(g) => g,
            Err(e) => {
                debug!("Skipping {} feature {}: {}", kind, source_idx, e);
                continue;
            }
        };

        let properties: Properties = feature
            .properties
            .iter()
            .flatten()
            .filter_map(|(key, value)| PropertyValue::from_json(value).map(|v| (key.clone(), v)))
            .collect();

        features.push(Feature::new(features.len(), geometry, properties));
    }

    if features.len() < total {
        warn!(
            "Skipped {} of {} {} features with unusable geometry",
            total - features.len(),
            total,
            kind
        );
    }

    Ok(FeatureCollection::new(kind, features))
}
