//! Collision model construction and adjacency

use std::collections::HashMap;

use crate::foundation::logging::debug;

use super::format::{BrushRecord, ModelRecord, PlaneRecord};
use super::polytope::{build_windings, Face, Polytope};
use super::tree::BoundsTree;
use super::LoadError;
use crate::config::CollisionConfig;
use crate::contents::ContentFlags;
use crate::foundation::math::Vec3;
use crate::geometry::{Bounds, Plane, PlaneSet, Winding};
use crate::trace_model::{TraceModel, TraceShape};

/// Connected group of polytopes linked through shared faces
#[derive(Debug, Clone)]
pub struct Island {
    pub(crate) members: Vec<usize>,
    pub(crate) bounds: Bounds,
    pub(crate) tree: BoundsTree,
}

impl Island {
    /// Polytope indices in this island
    pub fn members(&self) -> &[usize] {
        &self.members
    }

    /// Union of the member bounds
    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    /// Bounds hierarchy over the members
    pub fn tree(&self) -> &BoundsTree {
        &self.tree
    }
}

/// Immutable collision representation of one piece of geometry
#[derive(Debug, Clone)]
pub struct CollisionModel {
    name: String,
    planes: PlaneSet,
    polytopes: Vec<Polytope>,
    islands: Vec<Island>,
    bounds: Bounds,
    contents: ContentFlags,
}

impl CollisionModel {
    /// Model name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Shared plane pool referenced by the polytopes
    pub fn planes(&self) -> &PlaneSet {
        &self.planes
    }

    /// Plane at `index`
    #[inline]
    pub fn plane(&self, index: usize) -> &Plane {
        self.planes.get(index)
    }

    /// All polytopes
    pub fn polytopes(&self) -> &[Polytope] {
        &self.polytopes
    }

    /// Connected components of the adjacency graph
    pub fn islands(&self) -> &[Island] {
        &self.islands
    }

    /// Model-space bounds
    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    /// Union of the polytope contents
    pub fn contents(&self) -> ContentFlags {
        self.contents
    }

    /// Build a placeable model from a trace model shape.
    ///
    /// Boxes and hulls are reproduced exactly. Spheres and capsules become
    /// the enclosing polytope of 18 planes (axes and edge diagonals).
    pub fn from_trace_model(
        name: &str,
        trace_model: &TraceModel,
        contents: ContentFlags,
        config: &CollisionConfig,
    ) -> Result<Self, LoadError> {
        let planes: Vec<Plane> = match trace_model.shape() {
            TraceShape::Point => Vec::new(),
            TraceShape::Hull { .. } => trace_model.hull_planes().to_vec(),
            TraceShape::Box { .. } => enclosing_planes(trace_model, &axis_directions()),
            TraceShape::Sphere { .. } | TraceShape::Capsule { .. } => {
                let mut directions = axis_directions();
                directions.extend(diagonal_directions());
                enclosing_planes(trace_model, &directions)
            }
        };

        let mut builder = CollisionModelBuilder::new(name, config.clone());
        if !planes.is_empty() {
            builder.add_brush(contents, &planes)?;
        }
        builder.build()
    }

    /// Serializable record of this model; patches come back as brushes
    pub fn to_record(&self) -> ModelRecord {
        let brushes = self
            .polytopes
            .iter()
            .map(|polytope| BrushRecord {
                contents: polytope.contents.bits(),
                planes: polytope
                    .faces
                    .iter()
                    .map(|face| {
                        let plane = self.planes.get(face.plane);
                        let n = plane.normal();
                        PlaneRecord {
                            normal: [n.x, n.y, n.z],
                            dist: plane.dist(),
                        }
                    })
                    .collect(),
            })
            .collect();

        ModelRecord {
            name: self.name.clone(),
            brushes,
            patches: Vec::new(),
        }
    }
}

fn axis_directions() -> Vec<Vec3> {
    vec![Vec3::x(), -Vec3::x(), Vec3::y(), -Vec3::y(), Vec3::z(), -Vec3::z()]
}

fn diagonal_directions() -> Vec<Vec3> {
    let mut directions = Vec::with_capacity(12);
    for (a, b) in [(0, 1), (0, 2), (1, 2)] {
        for sa in [1.0_f32, -1.0] {
            for sb in [1.0_f32, -1.0] {
                let mut d = Vec3::zeros();
                d[a] = sa;
                d[b] = sb;
                directions.push(d.normalize());
            }
        }
    }
    directions
}

fn enclosing_planes(trace_model: &TraceModel, directions: &[Vec3]) -> Vec<Plane> {
    directions
        .iter()
        .filter_map(|&d| Plane::new(d, trace_model.extent_along(d)).ok())
        .collect()
}

/// Incremental builder turning brushes and patches into a model
#[derive(Debug)]
pub struct CollisionModelBuilder {
    name: String,
    config: CollisionConfig,
    planes: PlaneSet,
    polytopes: Vec<Polytope>,
    brush_count: usize,
    patch_count: usize,
}

impl CollisionModelBuilder {
    /// Start an empty model
    pub fn new(name: &str, config: CollisionConfig) -> Self {
        let planes = PlaneSet::new(config.normal_epsilon, config.dist_epsilon);
        Self {
            name: name.to_string(),
            config,
            planes,
            polytopes: Vec::new(),
            brush_count: 0,
            patch_count: 0,
        }
    }

    /// Add a brush: the solid behind every plane (normals face out)
    pub fn add_brush(&mut self, contents: ContentFlags, planes: &[Plane]) -> Result<usize, LoadError> {
        let brush = self.brush_count;
        self.brush_count += 1;

        // merge duplicates through the shared plane pool
        let mut indices: Vec<usize> = Vec::with_capacity(planes.len());
        for plane in planes {
            let index = self.planes.find_or_insert(*plane);
            if indices.contains(&index) {
                debug!("Model {}: brush {brush} repeats a plane, merged", self.name);
            } else {
                indices.push(index);
            }
        }

        let merged: Vec<Plane> = indices.iter().map(|&i| *self.planes.get(i)).collect();
        let (windings, bounds, vertices) =
            build_windings(&merged, self.config.max_world_coord, self.config.plane_epsilon);

        let faces: Vec<Face> = indices
            .iter()
            .zip(windings)
            .filter_map(|(&plane, winding)| {
                if winding.is_none() {
                    debug!("Model {}: brush {brush} plane {plane} is redundant", self.name);
                }
                winding.map(|winding| Face {
                    plane,
                    winding,
                    neighbors: Vec::new(),
                    sealed: false,
                })
            })
            .collect();

        if faces.is_empty() || bounds.is_empty() {
            return Err(LoadError::DegeneratePlaneSet {
                model: self.name.clone(),
                brush,
            });
        }

        let bevels = if self.config.axial_bevels {
            self.axial_bevels(&faces, &bounds)
        } else {
            Vec::new()
        };

        self.polytopes.push(Polytope {
            faces,
            bevels,
            vertices,
            bounds,
            contents,
        });
        Ok(self.polytopes.len() - 1)
    }

    /// Add a patch: each convex polygon becomes a thin slab behind it
    pub fn add_patch(&mut self, contents: ContentFlags, polygons: &[Vec<Vec3>]) -> Result<(), LoadError> {
        let patch = self.patch_count;
        self.patch_count += 1;

        for (polygon, points) in polygons.iter().enumerate() {
            let winding = Winding::new(points.clone()).map_err(|source| LoadError::Geometry {
                model: self.name.clone(),
                source,
            })?;
            if !winding.is_convex(self.config.plane_epsilon) {
                return Err(LoadError::NonConvexPatch {
                    model: self.name.clone(),
                    patch,
                    polygon,
                });
            }
            let front = winding.plane().map_err(|source| LoadError::Geometry {
                model: self.name.clone(),
                source,
            })?;

            let mut planes = vec![front, front.flipped().translated_along_normal(self.config.patch_thickness)];
            for (a, b) in winding.edges() {
                let edge = Plane::from_point_normal(a, (b - a).cross(&front.normal())).map_err(|source| {
                    LoadError::Geometry {
                        model: self.name.clone(),
                        source,
                    }
                })?;
                planes.push(edge);
            }
            self.add_brush(contents, &planes)?;
        }
        Ok(())
    }

    fn axial_bevels(&mut self, faces: &[Face], bounds: &Bounds) -> Vec<usize> {
        let mut bevels = Vec::new();
        for axis in 0..3 {
            for sign in [1.0_f32, -1.0] {
                let mut normal = Vec3::zeros();
                normal[axis] = sign;
                let covered = faces
                    .iter()
                    .any(|f| (self.planes.get(f.plane).normal() - normal).norm() <= self.config.normal_epsilon);
                if covered {
                    continue;
                }
                let dist = if sign > 0.0 { bounds.max[axis] } else { -bounds.min[axis] };
                if let Ok(plane) = Plane::new(normal, dist) {
                    bevels.push(self.planes.find_or_insert(plane));
                }
            }
        }
        bevels
    }

    /// Link faces to neighbors, group islands and freeze the model
    pub fn build(mut self) -> Result<CollisionModel, LoadError> {
        if self.polytopes.is_empty() {
            return Err(LoadError::EmptyModel(self.name));
        }

        self.link_neighbors();
        let islands = self.find_islands();

        let bounds = self
            .polytopes
            .iter()
            .fold(Bounds::EMPTY, |bounds, p| bounds.union(&p.bounds));
        let contents = self
            .polytopes
            .iter()
            .fold(ContentFlags::empty(), |contents, p| contents | p.contents);

        debug!(
            "Model {}: {} polytopes, {} planes, {} islands",
            self.name,
            self.polytopes.len(),
            self.planes.len(),
            islands.len()
        );

        Ok(CollisionModel {
            name: self.name,
            planes: self.planes,
            polytopes: self.polytopes,
            islands,
            bounds,
            contents,
        })
    }

    /// Faces on opposite planes whose windings overlap become neighbors.
    fn link_neighbors(&mut self) {
        let epsilon = self.config.plane_epsilon;

        let mut by_plane: HashMap<usize, Vec<(usize, usize)>> = HashMap::new();
        for (p, polytope) in self.polytopes.iter().enumerate() {
            for (f, face) in polytope.faces.iter().enumerate() {
                by_plane.entry(face.plane).or_default().push((p, f));
            }
        }

        let mut links: Vec<(usize, usize, usize, bool)> = Vec::new();
        for (a, polytope) in self.polytopes.iter().enumerate() {
            for (fa, face) in polytope.faces.iter().enumerate() {
                let Some(candidates) = by_plane.get(&PlaneSet::opposite(face.plane)) else {
                    continue;
                };
                for &(b, fb) in candidates {
                    if b == a {
                        continue;
                    }
                    let other = &self.polytopes[b];

                    // the part of our face that lies inside the other polytope's face
                    let overlap = other
                        .faces
                        .iter()
                        .enumerate()
                        .filter(|&(g, _)| g != fb)
                        .try_fold(face.winding.clone(), |winding, (_, g)| {
                            winding.clip(&self.planes.get(g.plane).flipped(), epsilon)
                        });
                    let Some(overlap) = overlap else {
                        continue;
                    };
                    if overlap.area() <= epsilon * epsilon {
                        continue;
                    }

                    // the neighbor must block everything this polytope blocks
                    let sealed = other.contents.contains(polytope.contents)
                        && face.winding.points().iter().all(|&point| {
                            other
                                .faces
                                .iter()
                                .all(|g| self.planes.get(g.plane).distance(point) <= epsilon)
                        });
                    links.push((a, fa, b, sealed));
                }
            }
        }

        for (a, fa, b, sealed) in links {
            let face = &mut self.polytopes[a].faces[fa];
            face.neighbors.push(b);
            face.sealed |= sealed;
        }
    }

    fn find_islands(&self) -> Vec<Island> {
        let count = self.polytopes.len();
        let mut assigned = vec![false; count];
        let mut islands = Vec::new();

        for seed in 0..count {
            if assigned[seed] {
                continue;
            }
            assigned[seed] = true;
            let mut members = Vec::new();
            let mut work = vec![seed];
            while let Some(index) = work.pop() {
                members.push(index);
                for face in &self.polytopes[index].faces {
                    for &neighbor in &face.neighbors {
                        if !assigned[neighbor] {
                            assigned[neighbor] = true;
                            work.push(neighbor);
                        }
                    }
                }
            }
            members.sort_unstable();
            let bounds = members
                .iter()
                .fold(Bounds::EMPTY, |bounds, &i| bounds.union(&self.polytopes[i].bounds));
            let tree = BoundsTree::build(&members, |i| self.polytopes[i].bounds);
            islands.push(Island { members, bounds, tree });
        }
        islands
    }
}
