//! Configuration system
//!
//! Tolerances and limits used by the loader and the query engine. Hosts
//! usually keep a `collision.toml` (or `.ron`) next to their other engine
//! settings and load it through [`Config::load_from_file`].

pub use serde::{Serialize, Deserialize};

/// Configuration trait
pub trait Config: Serialize + for<'de> Deserialize<'de> + Default {
    /// Load configuration from file
    fn load_from_file(path: &str) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(ConfigError::Io)?;

        // Try different formats
        if path.ends_with(".toml") {
            toml::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))
        } else if path.ends_with(".ron") {
            ron::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))
        } else {
            Err(ConfigError::UnsupportedFormat(path.to_string()))
        }
    }

    /// Save configuration to file
    fn save_to_file(&self, path: &str) -> Result<(), ConfigError> {
        let contents = if path.ends_with(".toml") {
            toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))?
        } else if path.ends_with(".ron") {
            ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
                .map_err(|e| ConfigError::Serialize(e.to_string()))?
        } else {
            return Err(ConfigError::UnsupportedFormat(path.to_string()));
        };

        std::fs::write(path, contents).map_err(ConfigError::Io)
    }
}

/// Configuration errors
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Parse error
    #[error("Parse error: {0}")]
    Parse(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialize(String),

    /// Unsupported format
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// A value is out of its valid range
    #[error("Invalid value for {field}: {value}")]
    InvalidValue {
        /// Name of the offending field
        field: &'static str,
        /// The rejected value
        value: f32,
    },
}

/// Tolerances and limits for collision model building and queries
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollisionConfig {
    /// Absolute tolerance (world units) for plane side tests and contacts
    pub plane_epsilon: f32,

    /// Maximum normal component difference for two planes to merge
    pub normal_epsilon: f32,

    /// Maximum distance difference for two planes to merge
    pub dist_epsilon: f32,

    /// Half size of base windings; also bounds unbounded polytopes
    pub max_world_coord: f32,

    /// Depth of the slab built behind each patch polygon
    pub patch_thickness: f32,

    /// Add axial bevel planes to polytopes for tighter box sweeps
    pub axial_bevels: bool,
}

impl Default for CollisionConfig {
    fn default() -> Self {
        Self {
            plane_epsilon: 1e-3,
            normal_epsilon: 1e-4,
            dist_epsilon: 1e-2,
            max_world_coord: 128.0 * 1024.0,
            patch_thickness: 0.25,
            axial_bevels: true,
        }
    }
}

impl Config for CollisionConfig {}

impl CollisionConfig {
    /// Check that every tolerance and limit is usable
    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("plane_epsilon", self.plane_epsilon),
            ("normal_epsilon", self.normal_epsilon),
            ("dist_epsilon", self.dist_epsilon),
            ("max_world_coord", self.max_world_coord),
            ("patch_thickness", self.patch_thickness),
        ];
        for (field, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::InvalidValue { field, value });
            }
        }
        Ok(())
    }
}
