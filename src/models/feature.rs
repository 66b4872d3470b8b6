//! Immutable feature records loaded from GeoJSON layers.

use geo::{BoundingRect, Geometry, Polygon, Rect, Validation};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Which of the three layers a collection was loaded as
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollectionKind {
    /// Tsunami inundation / evacuation areas (polygons)
    HazardZones,
    /// Evacuation routes (lines)
    Routes,
    /// Meeting points (points)
    MeetingPoints,
}

impl CollectionKind {
    /// Prefix used when naming a matched feature, e.g. "Route in Valparaíso"
    pub fn label(&self) -> &'static str {
        match self {
            CollectionKind::HazardZones => "Hazard Zone",
            CollectionKind::Routes => "Route",
            CollectionKind::MeetingPoints => "Meeting Point",
        }
    }
}

impl std::fmt::Display for CollectionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CollectionKind::HazardZones => write!(f, "hazard zones"),
            CollectionKind::Routes => write!(f, "routes"),
            CollectionKind::MeetingPoints => write!(f, "meeting points"),
        }
    }
}

/// A single property value. Source schemas differ per layer, so only the
/// scalar shape is fixed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Text(String),
    Number(f64),
    Bool(bool),
}

impl PropertyValue {
    /// Convert a GeoJSON property. `null` has no value; nested arrays and
    /// objects are kept as their JSON text.
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::Null => None,
            serde_json::Value::Bool(b) => Some(PropertyValue::Bool(*b)),
            serde_json::Value::Number(n) => n.as_f64().map(PropertyValue::Number),
            serde_json::Value::String(s) => Some(PropertyValue::Text(s.clone())),
            other => Some(PropertyValue::Text(other.to_string())),
        }
    }
}

impl std::fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PropertyValue::Text(s) => write!(f, "{}", s),
            PropertyValue::Number(n) => write!(f, "{}", n),
            PropertyValue::Bool(b) => write!(f, "{}", b),
        }
    }
}

/// Property mapping in source order
pub type Properties = IndexMap<String, PropertyValue>;

/// One geometric record. Coordinates are (lon, lat) degrees.
#[derive(Debug, Clone)]
pub struct Feature {
    /// Position within the source collection, used for stable tie-breaking
    position: usize,
    geometry: Geometry<f64>,
    properties: Properties,
    /// Why an areal geometry cannot answer containment, checked once on
    /// construction
    defect: Option<String>,
}

impl Feature {
    pub fn new(position: usize, geometry: Geometry<f64>, properties: Properties) -> Self {
        let defect = areal_defect(&geometry);
        Self {
            position,
            geometry,
            properties,
            defect,
        }
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn geometry(&self) -> &Geometry<f64> {
        &self.geometry
    }

    pub fn properties(&self) -> &Properties {
        &self.properties
    }

    /// Get the bounding box of this feature, `None` for empty geometries
    pub fn bbox(&self) -> Option<Rect<f64>> {
        self.geometry.bounding_rect()
    }

    /// First property present among `keys`, rendered as text.
    ///
    /// Empty strings count as absent.
    pub fn first_property(&self, keys: &[&str]) -> Option<String> {
        keys.iter()
            .filter_map(|key| self.properties.get(*key))
            .map(|value| value.to_string())
            .find(|value| !value.trim().is_empty())
    }

    /// GeoJSON geometry type name
    pub fn geometry_type(&self) -> &'static str {
        geometry_type_name(&self.geometry)
    }

    /// Validation failure of a polygon ring (too few points, self-intersection,
    /// non-finite coordinates, misplaced holes). `None` for valid polygons and
    /// for non-areal geometries.
    pub fn defect(&self) -> Option<&str> {
        self.defect.as_deref()
    }
}

// Parts of a MultiPolygon are validated one by one. Overlapping parts still
// answer containment correctly, so they are not a defect here.
fn areal_defect(geometry: &Geometry<f64>) -> Option<String> {
    let polygons: &[Polygon<f64>] = match geometry {
        Geometry::Polygon(polygon) => std::slice::from_ref(polygon),
        Geometry::MultiPolygon(multi) => &multi.0,
        _ => return None,
    };

    polygons.iter().enumerate().find_map(|(i, polygon)| {
        polygon.check_validation().err().map(|e| {
            if polygons.len() > 1 {
                format!("part {}: {}", i, e)
            } else {
                e.to_string()
            }
        })
    })
}

pub fn geometry_type_name(geometry: &Geometry<f64>) -> &'static str {
    match geometry {
        Geometry::Point(_) => "Point",
        Geometry::Line(_) => "Line",
        Geometry::LineString(_) => "LineString",
        Geometry::Polygon(_) => "Polygon",
        Geometry::MultiPoint(_) => "MultiPoint",
        Geometry::MultiLineString(_) => "MultiLineString",
        Geometry::MultiPolygon(_) => "MultiPolygon",
        Geometry::GeometryCollection(_) => "GeometryCollection",
        Geometry::Rect(_) => "Rect",
        Geometry::Triangle(_) => "Triangle",
    }
}

/// An ordered, read-only sequence of features loaded from one source.
///
/// An empty collection means "no data available", not an error.
#[derive(Debug, Clone)]
pub struct FeatureCollection {
    kind: CollectionKind,
    features: Vec<Feature>,
}

impl FeatureCollection {
    pub fn new(kind: CollectionKind, features: Vec<Feature>) -> Self {
        Self { kind, features }
    }

    pub fn empty(kind: CollectionKind) -> Self {
        Self::new(kind, Vec::new())
    }

    pub fn kind(&self) -> CollectionKind {
        self.kind
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Feature> {
        self.features.iter()
    }

    pub fn features(&self) -> &[Feature] {
        &self.features
    }

    pub fn into_features(self) -> Vec<Feature> {
        self.features
    }

    /// Union of all feature bounding boxes
    pub fn bounds(&self) -> Option<Rect<f64>> {
        self.features
            .iter()
            .filter_map(Feature::bbox)
            .reduce(|acc, rect| {
                Rect::new(
                    (acc.min().x.min(rect.min().x), acc.min().y.min(rect.min().y)),
                    (acc.max().x.max(rect.max().x), acc.max().y.max(rect.max().y)),
                )
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{line_string, point, polygon, MultiPolygon};

    fn props(pairs: &[(&str, PropertyValue)]) -> Properties {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_first_property_priority() {
        let feature = Feature::new(
            0,
            point!(x: -71.6, y: -33.0).into(),
            props(&[
                ("Name", PropertyValue::Text("fallback".into())),
                ("nombre", PropertyValue::Text("Valparaíso".into())),
            ]),
        );

        assert_eq!(
            feature.first_property(&["nom_com", "nombre", "Name"]),
            Some("Valparaíso".to_string())
        );
        assert_eq!(feature.first_property(&["missing"]), None);
    }

    #[test]
    fn test_first_property_skips_blank() {
        let feature = Feature::new(
            0,
            point!(x: 0.0, y: 0.0).into(),
            props(&[
                ("nom_com", PropertyValue::Text("  ".into())),
                ("Name", PropertyValue::Number(7.0)),
            ]),
        );
        assert_eq!(
            feature.first_property(&["nom_com", "Name"]),
            Some("7".to_string())
        );
    }

    #[test]
    fn test_property_value_from_json() {
        assert_eq!(PropertyValue::from_json(&serde_json::Value::Null), None);
        assert_eq!(
            PropertyValue::from_json(&serde_json::json!(3.5)),
            Some(PropertyValue::Number(3.5))
        );
        assert_eq!(
            PropertyValue::from_json(&serde_json::json!([1, 2])),
            Some(PropertyValue::Text("[1,2]".to_string()))
        );
    }

    #[test]
    fn test_collection_bounds() {
        let features = vec![
            Feature::new(0, point!(x: 1.0, y: 2.0).into(), Properties::new()),
            Feature::new(
                1,
                line_string![(x: -3.0, y: 0.0), (x: 0.0, y: 5.0)].into(),
                Properties::new(),
            ),
        ];
        let collection = FeatureCollection::new(CollectionKind::Routes, features);
        let bounds = collection.bounds().unwrap();

        assert_eq!(bounds.min().x, -3.0);
        assert_eq!(bounds.min().y, 0.0);
        assert_eq!(bounds.max().x, 1.0);
        assert_eq!(bounds.max().y, 5.0);
        assert!(FeatureCollection::empty(CollectionKind::Routes)
            .bounds()
            .is_none());
    }

    #[test]
    fn test_polygon_defect() {
        let square = polygon![(x: 0.0, y: 0.0), (x: 1.0, y: 0.0), (x: 1.0, y: 1.0), (x: 0.0, y: 1.0)];
        let bowtie = polygon![(x: 0.0, y: 0.0), (x: 2.0, y: 2.0), (x: 2.0, y: 0.0), (x: 0.0, y: 2.0)];

        assert!(Feature::new(0, square.clone().into(), Properties::new()).defect().is_none());
        assert!(Feature::new(0, bowtie.clone().into(), Properties::new()).defect().is_some());

        let multi = Feature::new(0, MultiPolygon::new(vec![square, bowtie]).into(), Properties::new());
        assert!(multi.defect().unwrap().starts_with("part 1"));

        let line = line_string![(x: 0.0, y: 0.0), (x: 1.0, y: 1.0), (x: 1.0, y: 0.0), (x: 0.0, y: 1.0)];
        assert!(Feature::new(0, line.into(), Properties::new()).defect().is_none());
    }
}
