//! Collision models and their loader
//!
//! A [`CollisionModel`] is the static, precomputed collision form of a
//! piece of geometry: every brush or patch polygon reduced to a convex
//! [`Polytope`], with faces linked to the polytopes on their far side.
//! Models are built once at load time and shared read-only afterwards.
//!
//! # Module Organization
//!
//! - [`polytope`] - convex solids and face winding construction
//! - [`collision_model`] - the model, its builder and adjacency linking
//! - [`tree`] - bounds hierarchy used to seed and prune queries
//! - [`format`] - serialized map records
//! - [`loader`] - map sources and the loader with per-model isolation

pub mod collision_model;
pub mod format;
pub mod loader;
pub mod polytope;
pub mod tree;

pub use collision_model::{CollisionModel, CollisionModelBuilder, Island};
pub use format::{
    BrushRecord, CollisionMapFile, ModelRecord, PatchRecord, PlaneRecord, COLLISION_FILE_VERSION,
};
pub use loader::{
    write_collision_map, CollisionModelLoader, FailedModel, FileSystemSource, LoadReport, MapSource,
    MapStream, MemorySource,
};
pub use polytope::{Face, Polytope};
pub use tree::BoundsTree;

use crate::geometry::GeometryError;

/// Failure to load or build collision models
#[derive(thiserror::Error, Debug)]
pub enum LoadError {
    /// The map source could not be read
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The collision file is not valid
    #[error("Parse error: {0}")]
    Parse(String),

    /// The collision file could not be written
    #[error("Serialization error: {0}")]
    Serialize(String),

    /// The collision file was written by another format version
    #[error("Unsupported collision file version {found} (expected {expected})")]
    UnsupportedVersion {
        /// Version found in the file
        found: u32,
        /// Version this loader reads
        expected: u32,
    },

    /// The collision file was built from another revision of the map
    #[error("Collision data for map {map} is stale: checksum {found:#010x}, map is {expected:#010x}")]
    ChecksumMismatch {
        /// Map name
        map: String,
        /// Checksum of the current map
        expected: u32,
        /// Checksum stored in the collision file
        found: u32,
    },

    /// Malformed primitive in a model
    #[error("Model {model}: {source}")]
    Geometry {
        /// Model name
        model: String,
        /// Underlying geometry error
        source: GeometryError,
    },

    /// A brush whose planes enclose no volume
    #[error("Model {model}: brush {brush} has a degenerate plane set")]
    DegeneratePlaneSet {
        /// Model name
        model: String,
        /// Index of the brush within the model
        brush: usize,
    },

    /// A patch polygon that is not convex and planar
    #[error("Model {model}: patch {patch} polygon {polygon} is not convex")]
    NonConvexPatch {
        /// Model name
        model: String,
        /// Index of the patch within the model
        patch: usize,
        /// Index of the polygon within the patch
        polygon: usize,
    },

    /// A model with no brushes or patches
    #[error("Model {0} has no collision geometry")]
    EmptyModel(String),

    /// A second model with an already used name
    #[error("Duplicate model name {0}")]
    DuplicateModel(String),
}
