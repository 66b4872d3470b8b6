use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::models::CollectionKind;

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub data: DataConfig,
    pub messages: MessageConfig,
    pub query: QueryConfig,
}

/// Locations of the three GeoJSON layers
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct DataConfig {
    pub hazard_zones: PathBuf,
    pub routes: PathBuf,
    pub meeting_points: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct MessageConfig {
    pub alert: String,
    pub proximity: String,
    pub safe: String,
    /// Description attached to every nearest-feature entry
    pub description: String,
    /// Hazard label for zones without their own label property
    pub hazard_label: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct QueryConfig {
    /// Below this distance to a route the proximity message is chosen
    pub proximity_threshold_m: f64,
    pub timeout_ms: u64,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self::in_dir("data")
    }
}

impl DataConfig {
    /// Default file names inside `dir`
    pub fn in_dir<P: AsRef<Path>>(dir: P) -> Self {
        let dir = dir.as_ref();
        Self {
            hazard_zones: dir.join("areas_evacuacion.geojson"),
            routes: dir.join("vias_evacuacion.geojson"),
            meeting_points: dir.join("puntos_encuentro.geojson"),
        }
    }

    pub fn path_for(&self, kind: CollectionKind) -> &Path {
        match kind {
            CollectionKind::HazardZones => &self.hazard_zones,
            CollectionKind::Routes => &self.routes,
            CollectionKind::MeetingPoints => &self.meeting_points,
        }
    }
}

impl Default for MessageConfig {
    fn default() -> Self {
        Self {
            alert: "¡ALERTA! Estás en una zona de riesgo de Tsunami.".to_string(),
            proximity: "Estás cerca de una vía de evacuación.".to_string(),
            safe: "Estás en una zona segura.".to_string(),
            description: "Follow marked evacuation signs.".to_string(),
            hazard_label: "Zona de Inundación por Tsunami".to_string(),
        }
    }
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            proximity_threshold_m: 500.0,
            timeout_ms: 2000,
        }
    }
}

impl Config {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path).context("Failed to read config file")?;
        let config: Config = toml::from_str(&content).context("Failed to parse config file")?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.query.proximity_threshold_m, 500.0);
        assert_eq!(
            config.data.path_for(CollectionKind::Routes),
            Path::new("data/vias_evacuacion.geojson")
        );
        assert_eq!(config.messages.hazard_label, "Zona de Inundación por Tsunami");
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[data]
routes = "/srv/layers/routes.geojson"

[query]
proximity_threshold_m = 250.0
"#
        )
        .unwrap();

        let config = Config::load_from_file(file.path()).unwrap();
        assert_eq!(config.data.routes, PathBuf::from("/srv/layers/routes.geojson"));
        assert_eq!(
            config.data.hazard_zones,
            PathBuf::from("data/areas_evacuacion.geojson")
        );
        assert_eq!(config.query.proximity_threshold_m, 250.0);
        assert_eq!(config.query.timeout_ms, 2000);
        assert_eq!(config.messages.safe, "Estás en una zona segura.");
    }

    #[test]
    fn test_invalid_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[query\nproximity_threshold_m = ").unwrap();
        assert!(Config::load_from_file(file.path()).is_err());
    }
}
