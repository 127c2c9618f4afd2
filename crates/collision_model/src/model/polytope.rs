//! Convex polytopes: the atomic unit of a collision model

use crate::contents::ContentFlags;
use crate::foundation::math::Vec3;
use crate::geometry::{Bounds, Plane, PlaneSet, Winding};

/// One boundary face of a polytope
#[derive(Debug, Clone)]
pub struct Face {
    pub(crate) plane: usize,
    pub(crate) winding: Winding,
    pub(crate) neighbors: Vec<usize>,
    pub(crate) sealed: bool,
}

impl Face {
    /// Index of the face plane in the owning model's plane set
    pub fn plane(&self) -> usize {
        self.plane
    }

    /// Face polygon in model space
    pub fn winding(&self) -> &Winding {
        &self.winding
    }

    /// Polytopes on the other side of this face
    pub fn neighbors(&self) -> &[usize] {
        &self.neighbors
    }

    /// Whether a single neighbor covers the whole face
    pub fn is_sealed(&self) -> bool {
        self.sealed
    }
}

/// A convex solid: the region behind every face plane
#[derive(Debug, Clone)]
pub struct Polytope {
    pub(crate) faces: Vec<Face>,
    pub(crate) bevels: Vec<usize>,
    pub(crate) vertices: Vec<Vec3>,
    pub(crate) bounds: Bounds,
    pub(crate) contents: ContentFlags,
}

impl Polytope {
    /// Boundary faces
    pub fn faces(&self) -> &[Face] {
        &self.faces
    }

    /// Plane indices of the axial bevels
    pub fn bevels(&self) -> &[usize] {
        &self.bevels
    }

    /// Model-space bounds
    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    /// Contents of the source brush
    pub fn contents(&self) -> ContentFlags {
        self.contents
    }

    /// Every plane bounding the solid: faces first, then bevels
    pub fn clip_planes(&self) -> impl Iterator<Item = usize> + '_ {
        self.faces.iter().map(|f| f.plane).chain(self.bevels.iter().copied())
    }

    /// Corner points of the solid, including corners cut by the world
    /// limits for solids that are open on some side
    pub fn vertices(&self) -> &[Vec3] {
        &self.vertices
    }

    /// Whether `point` is inside by more than `epsilon` on every plane
    pub fn contains_point(&self, planes: &PlaneSet, point: Vec3, epsilon: f32) -> bool {
        self.clip_planes().all(|index| planes.get(index).distance(point) < -epsilon)
    }
}

/// Windings of the face planes, clipped to the solid they bound.
///
/// `None` marks a plane that contributes no face (redundant). The extra
/// `bounding` planes only limit the windings; they never become faces.
pub(crate) fn clip_face_windings(
    planes: &[Plane],
    bounding: &[Plane],
    half_size: f32,
    epsilon: f32,
) -> Vec<Option<Winding>> {
    let all: Vec<&Plane> = planes.iter().chain(bounding.iter()).collect();
    (0..all.len())
        .map(|i| {
            let mut winding = Winding::base_for_plane(all[i], half_size);
            for (j, other) in all.iter().enumerate() {
                if j == i {
                    continue;
                }
                winding = winding.clip(&other.flipped(), epsilon)?;
            }
            Some(winding)
        })
        .collect()
}

/// Planes of the box `[-extent, extent]^3`, facing out
pub(crate) fn world_box_planes(extent: f32) -> Vec<Plane> {
    let mut planes = Vec::with_capacity(6);
    for axis in 0..3 {
        for sign in [1.0_f32, -1.0] {
            let mut normal = Vec3::zeros();
            normal[axis] = sign;
            if let Ok(plane) = Plane::new(normal, extent) {
                planes.push(plane);
            }
        }
    }
    planes
}

/// Face windings, total bounds and corners of the solid behind `planes`.
///
/// A first pass clips base windings sized to the whole world. When the
/// solid turns out to be bounded well inside the world, a second pass
/// uses base windings sized to the solid so the split points keep
/// precision.
pub(crate) fn build_windings(
    planes: &[Plane],
    max_world_coord: f32,
    epsilon: f32,
) -> (Vec<Option<Winding>>, Bounds, Vec<Vec3>) {
    let world = world_box_planes(max_world_coord);
    let collect_bounds = |windings: &[Option<Winding>]| {
        windings
            .iter()
            .flatten()
            .fold(Bounds::EMPTY, |bounds, w| bounds.union(&w.bounds()))
    };

    let mut windings = clip_face_windings(planes, &world, max_world_coord * 2.0, epsilon);
    let mut bounds = collect_bounds(&windings);

    let radius = bounds.radius();
    if !bounds.is_empty() && radius < max_world_coord * 0.5 {
        windings = clip_face_windings(planes, &world, radius * 2.0 + 1.0, epsilon);
        bounds = collect_bounds(&windings);
    }

    let mut vertices: Vec<Vec3> = Vec::new();
    for &point in windings.iter().flatten().flat_map(Winding::points) {
        if !vertices.iter().any(|v| (v - point).norm() <= epsilon) {
            vertices.push(point);
        }
    }

    windings.truncate(planes.len());
    (windings, bounds, vertices)
}
