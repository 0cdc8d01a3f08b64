//! Configuration loading: engine parameters and grid geometry from a TOML
//! file.

use std::path::Path;

use elevmap_core::{EngineParams, GridSize};
use serde::Deserialize;

use crate::error::EnvError;

/// On-disk representation of `EngineParams` plus the grid geometry
/// `set_geometry` needs; loaded once at startup.
#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    pub rows: usize,
    pub cols: usize,
    pub resolution: f32,
    pub center_x: f32,
    pub center_y: f32,
    pub min_variance: f32,
    pub max_variance: f32,
    pub min_horizontal_variance: f32,
    pub max_horizontal_variance: f32,
    pub mahalanobis_threshold: f32,
    pub multi_height_noise: f32,
    pub frame_id: String,
}

impl EngineConfig {
    pub fn grid_size(&self) -> GridSize {
        (self.rows, self.cols)
    }

    pub fn params(&self) -> EngineParams {
        EngineParams {
            min_variance: self.min_variance,
            max_variance: self.max_variance,
            min_horizontal_variance: self.min_horizontal_variance,
            max_horizontal_variance: self.max_horizontal_variance,
            mahalanobis_threshold: self.mahalanobis_threshold,
            multi_height_noise: self.multi_height_noise,
            frame_id: self.frame_id.clone(),
        }
    }
}

/// Loads engine configuration from an external source.
pub trait ConfigSource {
    fn load(&self) -> Result<EngineConfig, EnvError>;
}

/// Reads `EngineConfig` from a TOML file on disk.
pub struct TomlFileConfig {
    path: std::path::PathBuf,
}

impl TomlFileConfig {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self { path: path.as_ref().to_path_buf() }
    }
}

impl ConfigSource for TomlFileConfig {
    fn load(&self) -> Result<EngineConfig, EnvError> {
        let text = std::fs::read_to_string(&self.path)
            .map_err(|e| EnvError::Config(format!("{}: {e}", self.path.display())))?;
        toml::from_str(&text).map_err(|e| EnvError::Config(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_well_formed_toml() {
        let toml = r#"
            rows = 100
            cols = 100
            resolution = 0.1
            center_x = 0.0
            center_y = 0.0
            min_variance = 0.0001
            max_variance = 10.0
            min_horizontal_variance = 0.0001
            max_horizontal_variance = 0.5
            mahalanobis_threshold = 2.0
            multi_height_noise = 0.0015
            frame_id = "map"
        "#;
        let cfg: EngineConfig = toml::from_str(toml).unwrap();
        assert_eq!(cfg.grid_size(), (100, 100));
        assert_eq!(cfg.params().frame_id, "map");
    }

    #[test]
    fn missing_file_is_a_config_error() {
        let source = TomlFileConfig::new("/nonexistent/path/elevmap.toml");
        assert!(matches!(source.load(), Err(EnvError::Config(_))));
    }
}
