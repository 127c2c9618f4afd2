//! Bounding volume tree over the polytopes of an island
//!
//! Nodes are stored flat. Each branch splits its polytopes at the median
//! center along the longest axis of its bounds, so depth stays
//! logarithmic in the member count.

use crate::foundation::math::Vec3;
use crate::geometry::Bounds;

/// Leaves hold at most this many polytopes
const MAX_LEAF_SIZE: usize = 4;

#[derive(Debug, Clone)]
enum NodeKind {
    Leaf { first: usize, count: usize },
    Branch { left: usize, right: usize },
}

#[derive(Debug, Clone)]
struct Node {
    bounds: Bounds,
    kind: NodeKind,
}

/// Hierarchy of polytope bounds
#[derive(Debug, Clone, Default)]
pub struct BoundsTree {
    nodes: Vec<Node>,
    /// Polytope indices with their bounds, grouped by leaf
    items: Vec<(usize, Bounds)>,
}

impl BoundsTree {
    /// Build over `members`, looking their bounds up through `bounds_of`
    pub(crate) fn build(members: &[usize], bounds_of: impl Fn(usize) -> Bounds) -> Self {
        let mut tree = Self {
            nodes: Vec::new(),
            items: members.iter().map(|&i| (i, bounds_of(i))).collect(),
        };
        if !tree.items.is_empty() {
            tree.build_node(0, tree.items.len());
        }
        tree
    }

    fn build_node(&mut self, first: usize, count: usize) -> usize {
        let items = &mut self.items[first..first + count];
        let bounds = items
            .iter()
            .fold(Bounds::EMPTY, |bounds, (_, b)| bounds.union(b));

        let index = self.nodes.len();
        self.nodes.push(Node {
            bounds,
            kind: NodeKind::Leaf { first, count },
        });
        if count <= MAX_LEAF_SIZE {
            return index;
        }

        let size = bounds.max - bounds.min;
        let axis = (0..3).fold(0, |best, axis| if size[axis] > size[best] { axis } else { best });
        let half = count / 2;
        items.select_nth_unstable_by(half, |(_, a), (_, b)| a.center()[axis].total_cmp(&b.center()[axis]));

        let left = self.build_node(first, half);
        let right = self.build_node(first + half, count - half);
        self.nodes[index].kind = NodeKind::Branch { left, right };
        index
    }

    /// Number of polytopes in the tree
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the tree holds no polytopes
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Number of nodes, leaves included
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Cursor over the polytopes whose bounds meet a query box
    pub(crate) fn overlapping(&self) -> Overlaps<'_> {
        Overlaps {
            tree: self,
            stack: if self.nodes.is_empty() { Vec::new() } else { vec![0] },
            leaf: 0..0,
        }
    }

    /// Polytope whose bounds are closest to `point`.
    ///
    /// A polytope whose bounds contain the point and for which `inside`
    /// holds is returned as soon as it is found.
    pub(crate) fn nearest(&self, point: Vec3, inside: impl Fn(usize) -> bool) -> Option<usize> {
        let root = self.nodes.first()?;
        let mut best: Option<(f32, usize)> = None;
        let mut stack = vec![(root.bounds.distance_to_point(point), 0)];

        while let Some((distance, index)) = stack.pop() {
            if best.is_some_and(|(d, _)| distance > d) {
                continue;
            }
            match self.nodes[index].kind {
                NodeKind::Leaf { first, count } => {
                    for &(item, bounds) in &self.items[first..first + count] {
                        let d = bounds.distance_to_point(point);
                        if d <= 0.0 && inside(item) {
                            return Some(item);
                        }
                        if best.map_or(true, |(b, _)| d < b) {
                            best = Some((d, item));
                        }
                    }
                }
                NodeKind::Branch { left, right } => {
                    let dl = self.nodes[left].bounds.distance_to_point(point);
                    let dr = self.nodes[right].bounds.distance_to_point(point);
                    // nearer child on top
                    if dl <= dr {
                        stack.push((dr, right));
                        stack.push((dl, left));
                    } else {
                        stack.push((dl, left));
                        stack.push((dr, right));
                    }
                }
            }
        }
        best.map(|(_, item)| item)
    }
}

/// Walks the tree against a query box that may shrink between calls
pub(crate) struct Overlaps<'a> {
    tree: &'a BoundsTree,
    stack: Vec<usize>,
    leaf: std::ops::Range<usize>,
}

impl Overlaps<'_> {
    /// Next polytope whose bounds meet `query`
    pub fn next(&mut self, query: &Bounds) -> Option<usize> {
        loop {
            for slot in self.leaf.by_ref() {
                let (item, bounds) = &self.tree.items[slot];
                if bounds.intersects(query) {
                    return Some(*item);
                }
            }

            let index = self.stack.pop()?;
            let node = &self.tree.nodes[index];
            if !node.bounds.intersects(query) {
                continue;
            }
            match node.kind {
                NodeKind::Leaf { first, count } => self.leaf = first..first + count,
                NodeKind::Branch { left, right } => {
                    self.stack.push(right);
                    self.stack.push(left);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Unit cubes in a row along x, starting at the origin
    fn row(count: usize) -> Vec<Bounds> {
        (0..count)
            .map(|i| {
                let min = Vec3::new(i as f32, 0.0, 0.0);
                Bounds::new(min, min + Vec3::repeat(1.0)).unwrap()
            })
            .collect()
    }

    fn collect(tree: &BoundsTree, query: Bounds) -> Vec<usize> {
        let mut cursor = tree.overlapping();
        let mut found = Vec::new();
        while let Some(item) = cursor.next(&query) {
            found.push(item);
        }
        found.sort_unstable();
        found
    }

    #[test]
    fn test_overlap_query_returns_only_touched_members() {
        let cubes = row(20);
        let members: Vec<usize> = (0..20).collect();
        let tree = BoundsTree::build(&members, |i| cubes[i]);
        assert_eq!(tree.len(), 20);
        assert!(tree.node_count() > 1);

        let query = Bounds::new(Vec3::new(5.2, 0.2, 0.2), Vec3::new(6.5, 0.8, 0.8)).unwrap();
        assert_eq!(collect(&tree, query), vec![5, 6]);

        let far = Bounds::new(Vec3::new(40.0, 0.0, 0.0), Vec3::new(41.0, 1.0, 1.0)).unwrap();
        assert!(collect(&tree, far).is_empty());
    }

    #[test]
    fn test_query_can_shrink_between_steps() {
        let cubes = row(20);
        let members: Vec<usize> = (0..20).collect();
        let tree = BoundsTree::build(&members, |i| cubes[i]);

        let mut query = Bounds::new(Vec3::new(0.2, 0.2, 0.2), Vec3::new(19.5, 0.8, 0.8)).unwrap();
        let mut cursor = tree.overlapping();
        let first = cursor.next(&query).unwrap();
        assert!(first < 2);

        // only the first cube is left in range
        query = Bounds::new(Vec3::new(0.2, 0.2, 0.2), Vec3::new(0.5, 0.8, 0.8)).unwrap();
        let mut rest = Vec::new();
        while let Some(item) = cursor.next(&query) {
            rest.push(item);
        }
        if first == 0 {
            assert!(rest.is_empty());
        } else {
            assert_eq!(rest, vec![0]);
        }
    }

    #[test]
    fn test_nearest_prefers_containing_member() {
        let cubes = row(12);
        let members: Vec<usize> = (0..12).collect();
        let tree = BoundsTree::build(&members, |i| cubes[i]);

        assert_eq!(tree.nearest(Vec3::new(7.5, 0.5, 0.5), |i| i == 7), Some(7));
        assert_eq!(tree.nearest(Vec3::new(30.0, 0.5, 0.5), |_| true), Some(11));
        assert_eq!(tree.nearest(Vec3::new(3.5, 0.5, 10.0), |_| true), Some(3));
    }

    #[test]
    fn test_empty_tree() {
        let tree = BoundsTree::build(&[], |_| Bounds::EMPTY);
        assert!(tree.is_empty());
        assert_eq!(tree.nearest(Vec3::zeros(), |_| true), None);
        assert_eq!(tree.overlapping().next(&Bounds::from_center_extents(Vec3::zeros(), Vec3::repeat(1.0))), None);
    }
}
