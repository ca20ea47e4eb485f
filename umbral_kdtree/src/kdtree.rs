// Copyright 2025 the Umbral Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! KD-tree over a triangle mesh.
//!
//! The tree never moves triangle or vertex data. Triangles live in one flat list in
//! enumeration order; the build only permutes a parallel array of triangle indices, and
//! each leaf refers to a contiguous range of that permutation.
//!
//! Split axes follow a per-depth schedule computed once from the root box: at every level
//! the longest remaining extent is chosen and then halved. All nodes at one depth split on
//! the same axis, at the spatial midpoint of their box.

use alloc::sync::Arc;
use alloc::vec::Vec;
use core::fmt::Debug;
use glam::Vec3;
use umbral_geom::BoundingBox;

use crate::geometry::{Geometry, VertexArray, VertexKind, collect_triangles};

/// Tuning for [`KdTree::build`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct KdTreeOptions {
    /// Leaves holding more triangles than this are split further.
    pub target_triangles_per_leaf: usize,
    /// Length of the axis schedule, and so the maximum tree depth.
    ///
    /// Clamped to [`MAX_SCHEDULE_LEVELS`].
    pub max_levels: usize,
}

impl Default for KdTreeOptions {
    fn default() -> Self {
        Self {
            target_triangles_per_leaf: 4,
            max_levels: 32,
        }
    }
}

/// Why a geometry did not get a tree.
///
/// None of these are fatal: callers skip the geometry and carry on without acceleration.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum KdTreeError {
    /// The geometry has no vertex array, or an empty one.
    #[error("geometry has no vertices")]
    MissingVertices,
    /// The vertex array is not made of `Vec3` positions.
    #[error("vertex array holds {0:?} elements, expected Vec3")]
    UnsupportedVertexArray(VertexKind),
    /// A primitive set references a vertex past the end of the array.
    #[error("vertex index {index} is out of range for {vertex_count} vertices")]
    IndexOutOfRange {
        /// Offending index.
        index: u32,
        /// Length of the vertex array.
        vertex_count: usize,
    },
    /// No non-degenerate triangles were enumerated.
    #[error("geometry has no triangles")]
    NoTriangles,
    /// The mesh already fits in a single leaf, so a tree would not help.
    #[error("{count} triangles do not exceed the leaf target of {target}")]
    TooFewTriangles {
        /// Number of triangles enumerated.
        count: usize,
        /// Configured leaf target.
        target: usize,
    },
}

/// Reference to a child: an internal node or a leaf.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum NodeRef {
    /// Index into [`KdTree::nodes`].
    Internal(usize),
    /// Index into [`KdTree::leaves`].
    Leaf(usize),
}

/// Internal node with two children.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct KdNode {
    /// Child on the low side of the split.
    pub left: NodeRef,
    /// Child on the high side of the split.
    pub right: NodeRef,
    /// Union of the children's bounds.
    pub bound: BoundingBox,
}

/// Leaf: a range of the permuted triangle index array.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct KdLeaf {
    /// First position in the permuted index array.
    pub first: usize,
    /// Number of triangles.
    pub count: usize,
    /// Box around the leaf's triangles, padded by a small epsilon.
    pub bound: BoundingBox,
}

/// A segment/triangle intersection.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct LineSegmentHit {
    /// Position along the segment: `0` at the start, `1` at the end.
    pub ratio: f32,
    /// Triangle index in enumeration order (degenerate triangles excluded).
    pub triangle: usize,
    /// Vertex indices of the triangle.
    pub vertex_indices: [u32; 3],
    /// Intersection point.
    pub point: Vec3,
    /// Unit normal following the triangle's winding.
    pub normal: Vec3,
}

/// Acceleration structure over one geometry's triangles.
///
/// Immutable once built; share it with [`Arc`] across threads.
pub struct KdTree {
    vertices: Arc<[Vec3]>,
    triangles: Vec<[u32; 3]>,
    bounding_boxes: Vec<BoundingBox>,
    centers: Vec<Vec3>,
    primitive_indices: Vec<usize>,
    nodes: Vec<KdNode>,
    leaves: Vec<KdLeaf>,
    axis_stack: Vec<usize>,
    root: NodeRef,
    bound: BoundingBox,
}

impl Debug for KdTree {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("KdTree")
            .field("vertices", &self.vertices.len())
            .field("triangles", &self.triangles.len())
            .field("nodes", &self.nodes.len())
            .field("leaves", &self.leaves.len())
            .field("root", &self.root)
            .field("bound", &self.bound)
            .finish_non_exhaustive()
    }
}

impl KdTree {
    /// Build a tree over `geometry`'s triangles.
    ///
    /// Fails without side effects when the geometry has no usable `Vec3` vertex array, has
    /// out-of-range indices, or already fits into one leaf.
    pub fn build(options: &KdTreeOptions, geometry: &Geometry) -> Result<Self, KdTreeError> {
        let vertices = match geometry.vertex_array() {
            None => return Err(KdTreeError::MissingVertices),
            Some(VertexArray::Vec3(v)) => Arc::clone(v),
            Some(other) => return Err(KdTreeError::UnsupportedVertexArray(other.kind())),
        };
        if vertices.is_empty() {
            return Err(KdTreeError::MissingVertices);
        }

        let triangles = collect_triangles(geometry, &vertices)?;
        if triangles.is_empty() {
            return Err(KdTreeError::NoTriangles);
        }
        if triangles.len() <= options.target_triangles_per_leaf {
            return Err(KdTreeError::TooFewTriangles {
                count: triangles.len(),
                target: options.target_triangles_per_leaf,
            });
        }

        let bound = BoundingBox::from_points(&vertices);
        let (bounding_boxes, centers): (Vec<_>, Vec<_>) = triangles
            .iter()
            .map(|tri| {
                let corners = tri.map(|i| vertices[i as usize]);
                let bb = BoundingBox::from_points(&corners);
                let center = (corners[0] + corners[1] + corners[2]) / 3.0;
                (bb, center)
            })
            .unzip();

        let count = triangles.len();
        let mut tree = Self {
            vertices,
            triangles,
            bounding_boxes,
            centers,
            primitive_indices: (0..count).collect(),
            nodes: Vec::new(),
            leaves: Vec::new(),
            axis_stack: compute_axis_schedule(&bound, options.max_levels),
            root: NodeRef::Leaf(0),
            bound,
        };
        tree.leaves.push(KdLeaf {
            first: 0,
            count,
            bound: BoundingBox::empty(),
        });
        tree.root = tree.divide(options.target_triangles_per_leaf, bound, 0, 0);

        log::debug!(
            "built kd-tree: {} triangles, {} nodes, {} leaves",
            tree.triangles.len(),
            tree.nodes.len(),
            tree.leaves.len()
        );
        Ok(tree)
    }

    /// Split leaf `leaf` (covering `bb`) at depth `level`, returning the subtree root.
    ///
    /// When every centroid falls on one side, the leaf is not split; it is retried one level
    /// deeper with the halved box, so no internal node with an empty child is ever created.
    fn divide(
        &mut self,
        target: usize,
        mut bb: BoundingBox,
        leaf: usize,
        mut level: usize,
    ) -> NodeRef {
        let KdLeaf { first, count, .. } = self.leaves[leaf];
        loop {
            if level >= self.axis_stack.len() || count <= target {
                self.finish_leaf(leaf);
                return NodeRef::Leaf(leaf);
            }

            let axis = self.axis_stack[level];
            let mid = (bb.min[axis] + bb.max[axis]) * 0.5;
            let split = self.partition(first, count, axis, mid);

            let mut left_bb = bb;
            left_bb.max[axis] = mid;
            let mut right_bb = bb;
            right_bb.min[axis] = mid;
            level += 1;

            if split == 0 {
                bb = right_bb;
                continue;
            }
            if split == count {
                bb = left_bb;
                continue;
            }

            self.leaves[leaf].count = split;
            let right_leaf = self.leaves.len();
            self.leaves.push(KdLeaf {
                first: first + split,
                count: count - split,
                bound: BoundingBox::empty(),
            });

            let left = self.divide(target, left_bb, leaf, level);
            let right = self.divide(target, right_bb, right_leaf, level);

            let mut bound = self.bound_of(left);
            bound.expand_by_box(&self.bound_of(right));
            self.nodes.push(KdNode { left, right, bound });
            return NodeRef::Internal(self.nodes.len() - 1);
        }
    }

    /// Hoare partition of `primitive_indices[first..first + count]` around `mid`.
    ///
    /// Centroids at or below `mid` end up first. Returns how many that is.
    fn partition(&mut self, first: usize, count: usize, axis: usize, mid: f32) -> usize {
        let centers = &self.centers;
        let indices = &mut self.primitive_indices;
        let mut left = first;
        let mut right = first + count;
        while left < right {
            while left < right && centers[indices[left]][axis] <= mid {
                left += 1;
            }
            while left < right && centers[indices[right - 1]][axis] > mid {
                right -= 1;
            }
            if left < right {
                indices.swap(left, right - 1);
                left += 1;
                right -= 1;
            }
        }
        left - first
    }

    fn finish_leaf(&mut self, leaf: usize) {
        let KdLeaf { first, count, .. } = self.leaves[leaf];
        let mut bound = BoundingBox::empty();
        for &tri in &self.primitive_indices[first..first + count] {
            bound.expand_by_box(&self.bounding_boxes[tri]);
        }
        bound.inflate(LEAF_EPSILON * (1.0 + bound.radius()));
        self.leaves[leaf].bound = bound;
    }

    fn bound_of(&self, node: NodeRef) -> BoundingBox {
        match node {
            NodeRef::Internal(i) => self.nodes[i].bound,
            NodeRef::Leaf(i) => self.leaves[i].bound,
        }
    }

    /// The root of the tree.
    pub fn root(&self) -> NodeRef {
        self.root
    }

    /// Internal nodes.
    pub fn nodes(&self) -> &[KdNode] {
        &self.nodes
    }

    /// Leaves.
    pub fn leaves(&self) -> &[KdLeaf] {
        &self.leaves
    }

    /// Triangle indices stored in `leaf`.
    pub fn leaf_triangles(&self, leaf: &KdLeaf) -> &[usize] {
        &self.primitive_indices[leaf.first..leaf.first + leaf.count]
    }

    /// The shared vertex array.
    pub fn vertices(&self) -> &Arc<[Vec3]> {
        &self.vertices
    }

    /// Triangles in enumeration order.
    pub fn triangles(&self) -> &[[u32; 3]] {
        &self.triangles
    }

    /// Number of triangles.
    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    /// Box around every vertex.
    pub fn bound(&self) -> BoundingBox {
        self.bound
    }

    /// Split axis per depth (`0` = x, `1` = y, `2` = z).
    pub fn axis_schedule(&self) -> &[usize] {
        &self.axis_stack
    }

    /// Intersect the segment `start..end` with the mesh, nearest hit first.
    pub fn intersect(&self, start: Vec3, end: Vec3) -> Vec<LineSegmentHit> {
        let mut hits = Vec::new();
        let mut stack = alloc::vec![self.root];
        while let Some(node) = stack.pop() {
            if !segment_overlaps_box(&self.bound_of(node), start, end) {
                continue;
            }
            match node {
                NodeRef::Internal(i) => {
                    stack.push(self.nodes[i].right);
                    stack.push(self.nodes[i].left);
                }
                NodeRef::Leaf(i) => {
                    for &tri in self.leaf_triangles(&self.leaves[i]) {
                        if !segment_overlaps_box(&self.bounding_boxes[tri], start, end) {
                            continue;
                        }
                        if let Some(hit) =
                            intersect_triangle(&self.vertices, tri, self.triangles[tri], start, end)
                        {
                            hits.push(hit);
                        }
                    }
                }
            }
        }
        hits.sort_by(|a, b| a.ratio.total_cmp(&b.ratio));
        hits
    }
}

const LEAF_EPSILON: f32 = 1e-6;

/// Longest axis schedule a tree is built with.
///
/// Each split halves one extent of an `f32` box, and after a few hundred halvings per axis
/// the midpoint can no longer separate two centroids, so deeper levels never split.
pub const MAX_SCHEDULE_LEVELS: usize = 1024;

/// Per-depth split axes: repeatedly take the longest extent, then halve it.
fn compute_axis_schedule(bound: &BoundingBox, max_levels: usize) -> Vec<usize> {
    let levels = max_levels.min(MAX_SCHEDULE_LEVELS);
    let mut dimensions = bound.extents();
    let mut axes = Vec::with_capacity(levels);
    for _ in 0..levels {
        let axis = if dimensions.x >= dimensions.y {
            if dimensions.x >= dimensions.z { 0 } else { 2 }
        } else if dimensions.y >= dimensions.z {
            1
        } else {
            2
        };
        axes.push(axis);
        dimensions[axis] /= 2.0;
    }
    axes
}

/// Slab test: does any part of the segment lie inside the box?
fn segment_overlaps_box(bb: &BoundingBox, start: Vec3, end: Vec3) -> bool {
    if !bb.valid() {
        return false;
    }
    let d = end - start;
    let mut t0 = 0.0_f32;
    let mut t1 = 1.0_f32;
    for axis in 0..3 {
        let (lo, hi, s) = (bb.min[axis], bb.max[axis], start[axis]);
        if d[axis] == 0.0 {
            if s < lo || s > hi {
                return false;
            }
            continue;
        }
        let inv = 1.0 / d[axis];
        let (mut ta, mut tb) = ((lo - s) * inv, (hi - s) * inv);
        if ta > tb {
            core::mem::swap(&mut ta, &mut tb);
        }
        t0 = t0.max(ta);
        t1 = t1.min(tb);
        if t0 > t1 {
            return false;
        }
    }
    true
}

/// Möller–Trumbore segment/triangle test, accepting both faces.
pub(crate) fn intersect_triangle(
    vertices: &[Vec3],
    triangle: usize,
    indices: [u32; 3],
    start: Vec3,
    end: Vec3,
) -> Option<LineSegmentHit> {
    let [v0, v1, v2] = indices.map(|i| vertices[i as usize]);
    let d = end - start;
    let e1 = v1 - v0;
    let e2 = v2 - v0;
    let p = d.cross(e2);
    let det = e1.dot(p);
    if det == 0.0 {
        return None;
    }
    let inv = 1.0 / det;
    let t_vec = start - v0;
    let u = t_vec.dot(p) * inv;
    if !(0.0..=1.0).contains(&u) {
        return None;
    }
    let q = t_vec.cross(e1);
    let v = d.dot(q) * inv;
    if v < 0.0 || u + v > 1.0 {
        return None;
    }
    let ratio = e2.dot(q) * inv;
    if !(0.0..=1.0).contains(&ratio) {
        return None;
    }
    Some(LineSegmentHit {
        ratio,
        triangle,
        vertex_indices: indices,
        point: start + d * ratio,
        normal: e1.cross(e2).normalize_or_zero(),
    })
}
