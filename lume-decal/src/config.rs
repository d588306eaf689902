use std::path::{Path, PathBuf};

use log::info;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Malformed config {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("Invalid config {path}: {reason}")]
    Invalid { path: PathBuf, reason: String },
}

/// Bounds of one adjustable parameter. Holding a key sweeps the full range in
/// `sweep_seconds`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ParamRange {
    pub min: f32,
    pub init: f32,
    pub max: f32,
    #[serde(default = "default_sweep_seconds")]
    pub sweep_seconds: f32,
}

fn default_sweep_seconds() -> f32 {
    5.0
}

impl ParamRange {
    pub const fn new(min: f32, init: f32, max: f32) -> Self {
        Self { min, init, max, sweep_seconds: 5.0 }
    }

    fn validate(&self, name: &str) -> Result<(), String> {
        if ![self.min, self.init, self.max, self.sweep_seconds].iter().all(|v| v.is_finite()) {
            return Err(format!("{} has a non-finite bound", name));
        }
        if self.min > self.max {
            return Err(format!("{} has min {} above max {}", name, self.min, self.max));
        }
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub position: [f32; 3],
    pub yaw: f32,
    pub pitch: f32,
    pub fov: f32,
    pub near: f32,
    pub far: f32,
    pub speed: f32,
    pub sensitivity: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            position: [0.0, 1.5, 6.0],
            yaw: -90.0,
            pitch: 0.0,
            fov: 45.0,
            near: 0.1,
            far: 35.0,
            speed: 2.5,
            sensitivity: 0.1,
        }
    }
}

impl CameraConfig {
    fn validate(&self) -> Result<(), String> {
        if !(self.near > 0.0 && self.near.is_finite()) {
            return Err(format!("camera near plane {} must be positive", self.near));
        }
        if !(self.far > self.near && self.far.is_finite()) {
            return Err(format!("camera far plane {} must lie beyond the near plane {}", self.far, self.near));
        }
        if !(self.fov > 0.0 && self.fov < 180.0) {
            return Err(format!("camera fov {} must be inside (0, 180) degrees", self.fov));
        }
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecalConfig {
    pub width: ParamRange,
    pub height: ParamRange,
    pub thickness: ParamRange,
    /// Radians.
    pub rotation: ParamRange,
    pub angle_fade: ParamRange,
    pub intensity: ParamRange,
    pub albedo: ParamRange,
    pub kind_count: u32,
    pub decals_per_kind: u32,
    pub near_slab_thickness: f32,
    pub camera: CameraConfig,
}

impl Default for DecalConfig {
    fn default() -> Self {
        Self {
            width: ParamRange::new(0.05, 0.5, 2.0),
            height: ParamRange::new(0.05, 0.5, 2.0),
            thickness: ParamRange::new(0.05, 0.5, 2.0),
            rotation: ParamRange::new(-std::f32::consts::PI, 0.0, std::f32::consts::PI),
            angle_fade: ParamRange::new(0.0, 0.5, 1.0),
            intensity: ParamRange::new(0.0, 1.0, 1.0),
            albedo: ParamRange::new(0.0, 1.0, 1.0),
            kind_count: 4,
            decals_per_kind: 8,
            near_slab_thickness: 0.01,
            camera: CameraConfig::default(),
        }
    }
}

impl DecalConfig {
    /// Rejects values that would panic or degenerate further down: inverted
    /// parameter ranges, empty decal sets, a non-positive slab and a broken
    /// camera frustum.
    pub fn validate(&self) -> Result<(), String> {
        let ranges = [
            ("width", &self.width),
            ("height", &self.height),
            ("thickness", &self.thickness),
            ("rotation", &self.rotation),
            ("angle_fade", &self.angle_fade),
            ("intensity", &self.intensity),
            ("albedo", &self.albedo),
        ];
        for (name, range) in ranges {
            range.validate(name)?;
        }
        if self.kind_count == 0 || self.decals_per_kind == 0 {
            return Err("kind_count and decals_per_kind must be at least 1".to_string());
        }
        if !(self.near_slab_thickness > 0.0 && self.near_slab_thickness.is_finite()) {
            return Err(format!("near_slab_thickness {} must be positive", self.near_slab_thickness));
        }
        self.camera.validate()
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub validation: bool,
    /// OBJ file to paint on instead of the built-in room.
    pub scene: Option<PathBuf>,
    pub decals: DecalConfig,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            title: "Lume Decals".to_string(),
            width: 1280,
            height: 720,
            validation: cfg!(debug_assertions),
            scene: None,
            decals: DecalConfig::default(),
        }
    }
}

impl ViewerConfig {
    pub const DEFAULT_PATH: &'static str = "lume-decals.json";

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io { path: path.to_path_buf(), source })?;
        let config: Self =
            serde_json::from_str(&text).map_err(|source| ConfigError::Json { path: path.to_path_buf(), source })?;
        config.validate().map_err(|reason| ConfigError::Invalid { path: path.to_path_buf(), reason })?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.width == 0 || self.height == 0 {
            return Err(format!("window size {}x{} has no area", self.width, self.height));
        }
        self.decals.validate()
    }

    /// An explicit path must exist. Without one, `lume-decals.json` in the working
    /// directory is used when present, defaults otherwise.
    pub fn resolve(explicit: Option<PathBuf>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            info!("Loading config from {}", path.display());
            return Self::load(&path);
        }

        let fallback = Path::new(Self::DEFAULT_PATH);
        if fallback.exists() {
            info!("Loading config from {}", fallback.display());
            Self::load(fallback)
        } else {
            info!("No config file found, using defaults");
            Ok(Self::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config: ViewerConfig = serde_json::from_str(r#"{ "width": 800, "decals": { "kind_count": 2 } }"#).unwrap();
        assert_eq!(config.width, 800);
        assert_eq!(config.height, 720);
        assert_eq!(config.decals.kind_count, 2);
        assert_eq!(config.decals.decals_per_kind, 8);
        assert_eq!(config.decals.near_slab_thickness, 0.01);
    }

    #[test]
    fn test_param_range_sweep_defaults_to_five_seconds() {
        let range: ParamRange = serde_json::from_str(r#"{ "min": 0.0, "init": 1.0, "max": 2.0 }"#).unwrap();
        assert_eq!(range.sweep_seconds, 5.0);
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let path = std::env::temp_dir().join(format!("lume-decals-bad-{}.json", std::process::id()));
        std::fs::write(&path, "{ width: ").unwrap();
        let result = ViewerConfig::load(&path);
        std::fs::remove_file(&path).ok();
        assert!(matches!(result, Err(ConfigError::Json { .. })));
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let result = ViewerConfig::resolve(Some(PathBuf::from("/nonexistent/lume-decals.json")));
        assert!(matches!(result, Err(ConfigError::Io { .. })));
    }

    fn rejection(json: &str) -> String {
        let config: ViewerConfig = serde_json::from_str(json).unwrap();
        config.validate().unwrap_err()
    }

    #[test]
    fn test_defaults_are_valid() {
        assert_eq!(ViewerConfig::default().validate(), Ok(()));
    }

    #[test]
    fn test_inverted_range_is_rejected() {
        let reason = rejection(r#"{ "decals": { "width": { "min": 2.0, "init": 1.0, "max": 0.5 } } }"#);
        assert!(reason.contains("width"), "{}", reason);
        assert!(rejection(r#"{ "decals": { "albedo": { "min": 1.0, "init": 1.0, "max": 0.0 } } }"#).contains("albedo"));
    }

    #[test]
    fn test_broken_frustum_is_rejected() {
        assert!(rejection(r#"{ "decals": { "camera": { "near": 0.0 } } }"#).contains("near"));
        assert!(rejection(r#"{ "decals": { "camera": { "near": -1.0 } } }"#).contains("near"));
        assert!(rejection(r#"{ "decals": { "camera": { "near": 5.0, "far": 5.0 } } }"#).contains("far"));
        assert!(rejection(r#"{ "decals": { "camera": { "fov": 180.0 } } }"#).contains("fov"));
    }

    #[test]
    fn test_empty_decal_set_and_slab_are_rejected() {
        assert!(rejection(r#"{ "decals": { "kind_count": 0 } }"#).contains("kind_count"));
        assert!(rejection(r#"{ "decals": { "decals_per_kind": 0 } }"#).contains("decals_per_kind"));
        assert!(rejection(r#"{ "decals": { "near_slab_thickness": 0.0 } }"#).contains("near_slab_thickness"));
        assert!(rejection(r#"{ "height": 0 }"#).contains("no area"));
    }

    #[test]
    fn test_load_reports_invalid_values() {
        let path = std::env::temp_dir().join(format!("lume-decals-invalid-{}.json", std::process::id()));
        std::fs::write(&path, r#"{ "decals": { "width": { "min": 2.0, "init": 1.0, "max": 0.5 } } }"#).unwrap();
        let result = ViewerConfig::load(&path);
        std::fs::remove_file(&path).ok();
        assert!(matches!(result, Err(ConfigError::Invalid { .. })));
    }

    #[test]
    fn test_round_trip_through_json() {
        let config = ViewerConfig::default();
        let text = serde_json::to_string_pretty(&config).unwrap();
        let back: ViewerConfig = serde_json::from_str(&text).unwrap();
        assert_eq!(back, config);
    }
}
