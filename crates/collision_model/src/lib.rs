//! # Collision Model
//!
//! Static collision geometry and swept trace queries for a real-time 3D
//! engine.
//!
//! ## Features
//!
//! - **Convex Polytopes**: brushes and patches reduced to convex solids
//!   with face adjacency, built once at load time
//! - **Trace Models**: point, box, sphere, capsule and convex hull shapes
//! - **Collision World**: generational entity handles, placement
//!   transforms, content masks and batched mutation
//! - **Queries**: swept traces, line of sight, contents tests and
//!   parallel trace batches
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use collision_model::prelude::*;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = CollisionConfig::default();
//!     let loader = CollisionModelLoader::new(config.clone());
//!     let report = loader.load(&FileSystemSource::new("maps"), "arena")?;
//!
//!     let mut world = CollisionWorld::new(config);
//!     for model in &report.models {
//!         let model_ref = world.register_model(model.clone());
//!         world.add_entity(model_ref, Transform::identity(), ContentFlags::all())?;
//!     }
//!
//!     let player = TraceModel::cuboid(Vec3::new(16.0, 16.0, 36.0))?;
//!     let result = world.trace(
//!         &player,
//!         Vec3::new(0.0, 0.0, 100.0),
//!         Vec3::new(0.0, 0.0, -100.0),
//!         ContentFlags::MASK_PLAYER_SOLID,
//!     );
//!     println!("stopped at {}", result.fraction);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]

pub mod foundation;
pub mod config;
pub mod contents;
pub mod geometry;
pub mod trace_model;
pub mod model;
pub mod query;
pub mod world;

/// Common imports for collision users
pub mod prelude {
    pub use crate::{
        config::{CollisionConfig, Config, ConfigError},
        contents::ContentFlags,
        foundation::math::{Quat, Transform, Vec3},
        geometry::{Bounds, GeometryError, Plane, PlaneSide, Winding},
        model::{
            CollisionModel, CollisionModelBuilder, CollisionModelLoader, FileSystemSource, LoadError,
            LoadReport, MapSource, MemorySource,
        },
        query::{Contact, TraceRequest, TraceResult},
        trace_model::{InvalidShapeError, TraceModel, TraceShape},
        world::{ChangeSet, CollisionWorld, EntityHandle, ModelRef, WorldError},
    };
}
