//! Serialized collision map records
//!
//! Collision maps are stored as RON documents produced by the map
//! compiler. Records hold raw numbers only; validation happens when the
//! loader turns them into models.

use serde::{Deserialize, Serialize};

use super::LoadError;

/// Format version written and accepted by this crate
pub const COLLISION_FILE_VERSION: u32 = 3;

/// A whole collision map
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollisionMapFile {
    /// Format version
    pub version: u32,
    /// Checksum of the map revision the models were built from
    pub map_checksum: u32,
    /// Models in file order; the first is usually the world model
    pub models: Vec<ModelRecord>,
}

/// One named model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelRecord {
    /// Unique model name
    pub name: String,
    /// Convex brushes
    #[serde(default)]
    pub brushes: Vec<BrushRecord>,
    /// Curved surfaces already tessellated into polygons
    #[serde(default)]
    pub patches: Vec<PatchRecord>,
}

/// A convex brush given by its bounding planes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrushRecord {
    /// Raw content bits
    pub contents: u32,
    /// Outward facing planes
    pub planes: Vec<PlaneRecord>,
}

/// A plane `normal · p = dist`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlaneRecord {
    /// Unit normal
    pub normal: [f32; 3],
    /// Distance from the origin
    pub dist: f32,
}

/// A tessellated patch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatchRecord {
    /// Raw content bits
    pub contents: u32,
    /// Convex polygons, counter-clockwise seen from the solid side's front
    pub polygons: Vec<Vec<[f32; 3]>>,
}

impl CollisionMapFile {
    /// Empty map at the current version
    pub fn new(map_checksum: u32) -> Self {
        Self {
            version: COLLISION_FILE_VERSION,
            map_checksum,
            models: Vec::new(),
        }
    }

    /// Parse a RON document, checking the version
    pub fn from_ron_str(text: &str) -> Result<Self, LoadError> {
        let file: Self = ron::from_str(text).map_err(|e| LoadError::Parse(e.to_string()))?;
        if file.version != COLLISION_FILE_VERSION {
            return Err(LoadError::UnsupportedVersion {
                found: file.version,
                expected: COLLISION_FILE_VERSION,
            });
        }
        Ok(file)
    }

    /// Write as a pretty RON document
    pub fn to_ron_string(&self) -> Result<String, LoadError> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(|e| LoadError::Serialize(e.to_string()))
    }
}
