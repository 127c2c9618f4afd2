//! The collision world
//!
//! Holds registered models and their placements, and answers trace and
//! contents queries against all of them. Queries borrow the world
//! immutably and may run on any number of threads at once; mutation
//! needs exclusive access, so queries and edits never interleave.

mod changes;
mod entity;

pub use changes::{Change, ChangeSet};
pub use entity::{EntityHandle, ModelRef};

use std::collections::HashMap;
use std::sync::Arc;

use crate::foundation::logging::{debug, info, warn};
use rayon::prelude::*;
use slotmap::SlotMap;

use crate::config::CollisionConfig;
use crate::contents::ContentFlags;
use crate::foundation::math::{Transform, Vec3};
use crate::geometry::Bounds;
use crate::model::CollisionModel;
use crate::query::{merge_results, Placement, TraceRequest, TraceResult};
use crate::trace_model::TraceModel;

use entity::CollisionEntity;

/// World errors
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum WorldError {
    /// The model reference was not issued by this world
    #[error("Unknown model {0}")]
    UnknownModel(ModelRef),
}

/// Registered models and placed entities
#[derive(Debug)]
pub struct CollisionWorld {
    config: CollisionConfig,
    models: Vec<Arc<CollisionModel>>,
    model_names: HashMap<String, ModelRef>,
    entities: SlotMap<EntityHandle, CollisionEntity>,
    point: TraceModel,
    frame: u64,
}

impl CollisionWorld {
    /// Empty world using the given tolerances
    pub fn new(config: CollisionConfig) -> Self {
        Self {
            config,
            models: Vec::new(),
            model_names: HashMap::new(),
            entities: SlotMap::with_key(),
            point: TraceModel::point(),
            frame: 0,
        }
    }

    /// Tolerances in use
    pub fn config(&self) -> &CollisionConfig {
        &self.config
    }

    /// Register a model for placement.
    ///
    /// A later model with the same name takes over name lookups.
    pub fn register_model(&mut self, model: Arc<CollisionModel>) -> ModelRef {
        #[allow(clippy::cast_possible_truncation)]
        let model_ref = ModelRef(self.models.len() as u32);
        if let Some(previous) = self.model_names.insert(model.name().to_string(), model_ref) {
            warn!("Model {} registered again, {} now shadows {}", model.name(), model_ref, previous);
        }
        debug!("Registered collision model {} as {}", model.name(), model_ref);
        self.models.push(model);
        model_ref
    }

    /// Registered model
    pub fn model(&self, model_ref: ModelRef) -> Option<&Arc<CollisionModel>> {
        self.models.get(model_ref.index())
    }

    /// Registered model by name
    pub fn model_by_name(&self, name: &str) -> Option<ModelRef> {
        self.model_names.get(name).copied()
    }

    /// Number of registered models
    pub fn model_count(&self) -> usize {
        self.models.len()
    }

    /// Place a registered model
    pub fn add_entity(
        &mut self,
        model_ref: ModelRef,
        transform: Transform,
        contents: ContentFlags,
    ) -> Result<EntityHandle, WorldError> {
        let model = self.model(model_ref).ok_or(WorldError::UnknownModel(model_ref))?.clone();
        Ok(self
            .entities
            .insert(CollisionEntity::new(model, model_ref, transform, contents)))
    }

    /// Remove an entity; stale handles are ignored
    pub fn remove_entity(&mut self, handle: EntityHandle) -> bool {
        if self.entities.remove(handle).is_some() {
            true
        } else {
            warn!("Ignoring removal of stale collision entity {:?}", handle);
            false
        }
    }

    /// Move an entity; stale handles are ignored
    pub fn update_transform(&mut self, handle: EntityHandle, transform: Transform) -> bool {
        match self.entities.get_mut(handle) {
            Some(entity) => {
                entity.set_transform(transform);
                true
            }
            None => {
                debug!("Ignoring move of stale collision entity {:?}", handle);
                false
            }
        }
    }

    /// Whether the handle refers to a live entity
    pub fn contains(&self, handle: EntityHandle) -> bool {
        self.entities.contains_key(handle)
    }

    /// Number of live entities
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Model placed by an entity
    pub fn entity_model(&self, handle: EntityHandle) -> Option<ModelRef> {
        self.entities.get(handle).map(|e| e.model_ref)
    }

    /// Placement of an entity
    pub fn entity_transform(&self, handle: EntityHandle) -> Option<Transform> {
        self.entities.get(handle).map(|e| e.transform)
    }

    /// Category mask of an entity
    pub fn entity_contents(&self, handle: EntityHandle) -> Option<ContentFlags> {
        self.entities.get(handle).map(|e| e.contents)
    }

    /// World bounds of an entity
    pub fn entity_bounds(&self, handle: EntityHandle) -> Option<Bounds> {
        self.entities.get(handle).map(CollisionEntity::world_bounds)
    }

    /// Number of change sets applied so far
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Apply a batch of mutations in order and advance the frame.
    ///
    /// Every added model is checked first; if one is unknown nothing is
    /// applied. Returns the handles of the added entities in order.
    pub fn apply(&mut self, changes: ChangeSet) -> Result<Vec<EntityHandle>, WorldError> {
        if let Some(&Change::Add { model, .. }) = changes
            .changes()
            .iter()
            .find(|c| matches!(c, Change::Add { model, .. } if self.model(*model).is_none()))
        {
            return Err(WorldError::UnknownModel(model));
        }

        let count = changes.len();
        let mut added = Vec::new();
        for change in changes {
            match change {
                Change::Add {
                    model,
                    transform,
                    contents,
                } => added.push(self.add_entity(model, transform, contents)?),
                Change::Remove(handle) => {
                    self.remove_entity(handle);
                }
                Change::Move { entity, transform } => {
                    self.update_transform(entity, transform);
                }
            }
        }

        self.frame += 1;
        debug!("Applied {} collision changes for frame {}", count, self.frame);
        Ok(added)
    }

    fn placements<'a>(
        &'a self,
        region: Bounds,
        mask: ContentFlags,
    ) -> impl Iterator<Item = Placement<'a>> + 'a {
        self.entities
            .iter()
            .filter(move |(_, e)| e.contents.matches(mask) && e.world_bounds().intersects(&region))
            .map(|(handle, e)| Placement {
                model: &e.model,
                transform: &e.transform,
                contents: e.contents,
                entity: handle,
            })
    }

    fn swept_bounds(&self, trace_model: &TraceModel, start: Vec3, end: Vec3) -> Bounds {
        let local = trace_model.local_bounds();
        local
            .translated(start)
            .union(&local.translated(end))
            .expanded(self.config.plane_epsilon * 2.0)
    }

    /// Entities whose volume strictly contains `point`
    pub fn point_contents(&self, point: Vec3, mask: ContentFlags) -> Vec<EntityHandle> {
        self.contents(&self.point, point, mask)
    }

    /// Entities overlapping `trace_model` placed at `origin`
    pub fn contents(&self, trace_model: &TraceModel, origin: Vec3, mask: ContentFlags) -> Vec<EntityHandle> {
        let region = self.swept_bounds(trace_model, origin, origin);
        self.placements(region, mask)
            .filter(|p| p.overlaps(trace_model, origin, mask, self.config.plane_epsilon))
            .map(|p| p.entity)
            .collect()
    }

    /// Sweep `trace_model` from `start` to `end` against every entity
    pub fn trace(&self, trace_model: &TraceModel, start: Vec3, end: Vec3, mask: ContentFlags) -> TraceResult {
        let request = TraceRequest::new(trace_model, start, end, mask);
        self.run(&request)
    }

    /// Sweep against one entity only; a stale handle never hits
    pub fn trace_entity(
        &self,
        handle: EntityHandle,
        trace_model: &TraceModel,
        start: Vec3,
        end: Vec3,
        mask: ContentFlags,
    ) -> TraceResult {
        let Some(entity) = self.entities.get(handle) else {
            debug!("Trace against stale collision entity {:?}", handle);
            return TraceResult::clear(end);
        };
        if !entity.contents.matches(mask) {
            return TraceResult::clear(end);
        }
        let placement = Placement {
            model: &entity.model,
            transform: &entity.transform,
            contents: entity.contents,
            entity: handle,
        };
        placement.trace(&TraceRequest::new(trace_model, start, end, mask), self.config.plane_epsilon)
    }

    /// Line of sight: trace a point
    pub fn trace_line(&self, start: Vec3, end: Vec3, mask: ContentFlags) -> TraceResult {
        self.trace(&self.point, start, end, mask)
    }

    /// Run independent traces in parallel; results follow request order
    pub fn trace_batch(&self, requests: &[TraceRequest<'_>]) -> Vec<TraceResult> {
        requests.par_iter().map(|request| self.run(request)).collect()
    }

    fn run(&self, request: &TraceRequest<'_>) -> TraceResult {
        let epsilon = self.config.plane_epsilon;
        let direction = request.end - request.start;
        let length = direction.norm();
        let fraction_epsilon = if length > f32::EPSILON { epsilon / length } else { 0.0 };

        let region = self.swept_bounds(request.trace_model, request.start, request.end);
        let mut best = TraceResult::clear(request.end);
        for placement in self.placements(region, request.mask) {
            let result = placement.trace(request, epsilon);
            best = merge_results(best, result, direction, fraction_epsilon);
            if best.all_solid {
                break;
            }
        }
        best
    }

    /// Log a one-line summary of the world
    pub fn log_summary(&self) {
        info!(
            "Collision world: {} models, {} entities, frame {}",
            self.models.len(),
            self.entities.len(),
            self.frame
        );
    }
}

impl Default for CollisionWorld {
    fn default() -> Self {
        Self::new(CollisionConfig::default())
    }
}
