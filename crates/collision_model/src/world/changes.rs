//! Batched world mutations
//!
//! Gameplay code records additions, removals and moves while the world is
//! being queried, then applies them all at the step boundary.

use crate::contents::ContentFlags;
use crate::foundation::math::Transform;

use super::{EntityHandle, ModelRef};

/// One recorded mutation
#[derive(Debug, Clone, PartialEq)]
pub enum Change {
    /// Place a model
    Add {
        /// Registered model
        model: ModelRef,
        /// Placement
        transform: Transform,
        /// Category mask of the new entity
        contents: ContentFlags,
    },
    /// Remove an entity
    Remove(EntityHandle),
    /// Move an entity
    Move {
        /// Entity to move
        entity: EntityHandle,
        /// New placement
        transform: Transform,
    },
}

/// Ordered list of mutations applied together
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChangeSet {
    changes: Vec<Change>,
}

impl ChangeSet {
    /// Empty change set
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a placement
    pub fn add(&mut self, model: ModelRef, transform: Transform, contents: ContentFlags) -> &mut Self {
        self.changes.push(Change::Add {
            model,
            transform,
            contents,
        });
        self
    }

    /// Record a removal
    pub fn remove(&mut self, entity: EntityHandle) -> &mut Self {
        self.changes.push(Change::Remove(entity));
        self
    }

    /// Record a move
    pub fn move_entity(&mut self, entity: EntityHandle, transform: Transform) -> &mut Self {
        self.changes.push(Change::Move { entity, transform });
        self
    }

    /// Recorded mutations in order
    pub fn changes(&self) -> &[Change] {
        &self.changes
    }

    /// Number of recorded mutations
    pub fn len(&self) -> usize {
        self.changes.len()
    }

    /// Whether nothing was recorded
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }
}

impl IntoIterator for ChangeSet {
    type Item = Change;
    type IntoIter = std::vec::IntoIter<Change>;

    fn into_iter(self) -> Self::IntoIter {
        self.changes.into_iter()
    }
}
