//! Placed collision entities

use std::fmt;
use std::sync::{Arc, OnceLock};

use crate::contents::ContentFlags;
use crate::foundation::math::Transform;
use crate::geometry::Bounds;
use crate::model::CollisionModel;

slotmap::new_key_type! {
    /// Generational handle to a placed entity.
    ///
    /// Removing an entity invalidates every copy of its handle, even if
    /// the slot is later reused.
    pub struct EntityHandle;
}

/// Reference to a model registered with a world
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModelRef(pub(crate) u32);

impl ModelRef {
    /// Registration index
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for ModelRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "model#{}", self.0)
    }
}

/// One placement of a model
#[derive(Debug)]
pub(crate) struct CollisionEntity {
    pub model: Arc<CollisionModel>,
    pub model_ref: ModelRef,
    pub transform: Transform,
    pub contents: ContentFlags,
    world_bounds: OnceLock<Bounds>,
}

impl CollisionEntity {
    pub fn new(model: Arc<CollisionModel>, model_ref: ModelRef, transform: Transform, contents: ContentFlags) -> Self {
        Self {
            model,
            model_ref,
            transform,
            contents,
            world_bounds: OnceLock::new(),
        }
    }

    pub fn set_transform(&mut self, transform: Transform) {
        self.transform = transform;
        self.world_bounds = OnceLock::new();
    }

    /// World bounds, computed on first use after a move
    pub fn world_bounds(&self) -> Bounds {
        *self
            .world_bounds
            .get_or_init(|| self.model.bounds().transformed(&self.transform))
    }
}
