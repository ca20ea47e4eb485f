// Copyright 2025 the Umbral Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Mesh records: vertex arrays, primitive sets, triangle enumeration, and the shape slot.

use alloc::sync::Arc;
use alloc::vec::Vec;
use glam::{Vec2, Vec3, Vec4};
use umbral_geom::{BoundingBox, BoundingSphere};

use crate::kdtree::{KdTree, KdTreeError, LineSegmentHit, intersect_triangle};

/// Element type of a [`VertexArray`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum VertexKind {
    /// Two components per vertex.
    Vec2,
    /// Three components per vertex.
    Vec3,
    /// Four (homogeneous) components per vertex.
    Vec4,
}

/// Vertex positions, shared with anything that indexes them.
#[derive(Clone, Debug, PartialEq)]
pub enum VertexArray {
    /// 2D positions (`z = 0`).
    Vec2(Arc<[Vec2]>),
    /// 3D positions.
    Vec3(Arc<[Vec3]>),
    /// Homogeneous positions.
    Vec4(Arc<[Vec4]>),
}

impl VertexArray {
    /// The element type.
    pub fn kind(&self) -> VertexKind {
        match self {
            Self::Vec2(_) => VertexKind::Vec2,
            Self::Vec3(_) => VertexKind::Vec3,
            Self::Vec4(_) => VertexKind::Vec4,
        }
    }

    /// Number of vertices.
    pub fn len(&self) -> usize {
        match self {
            Self::Vec2(v) => v.len(),
            Self::Vec3(v) => v.len(),
            Self::Vec4(v) => v.len(),
        }
    }

    /// True if there are no vertices.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The positions if this is a `Vec3` array.
    pub fn as_vec3(&self) -> Option<&Arc<[Vec3]>> {
        match self {
            Self::Vec3(v) => Some(v),
            _ => None,
        }
    }

    /// Box around every position. Homogeneous positions with `w = 0` are skipped.
    pub fn bound(&self) -> BoundingBox {
        let mut bb = BoundingBox::empty();
        match self {
            Self::Vec2(v) => v.iter().for_each(|p| bb.expand_by_point(p.extend(0.0))),
            Self::Vec3(v) => v.iter().for_each(|p| bb.expand_by_point(*p)),
            Self::Vec4(v) => v
                .iter()
                .filter(|p| p.w != 0.0)
                .for_each(|p| bb.expand_by_point(p.truncate() / p.w)),
        }
        bb
    }
}

impl From<Vec<Vec3>> for VertexArray {
    fn from(v: Vec<Vec3>) -> Self {
        Self::Vec3(v.into())
    }
}

/// How a run of indices is assembled into primitives.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum PrimitiveMode {
    /// Independent points.
    Points,
    /// Independent line segments.
    Lines,
    /// Connected line segments.
    LineStrip,
    /// Closed line loop.
    LineLoop,
    /// Independent triangles.
    Triangles,
    /// Triangle strip.
    TriangleStrip,
    /// Triangle fan around the first vertex.
    TriangleFan,
    /// Independent quads.
    Quads,
    /// Quad strip.
    QuadStrip,
    /// Convex polygon, triangulated as a fan.
    Polygon,
}

/// A run of primitives over a geometry's vertex array.
#[derive(Clone, Debug, PartialEq)]
pub enum PrimitiveSet {
    /// `count` consecutive vertices starting at `first`.
    DrawArrays {
        /// Assembly mode.
        mode: PrimitiveMode,
        /// First vertex.
        first: u32,
        /// Number of vertices.
        count: u32,
    },
    /// Explicit vertex indices.
    DrawElements {
        /// Assembly mode.
        mode: PrimitiveMode,
        /// Vertex indices.
        indices: Vec<u32>,
    },
}

impl PrimitiveSet {
    /// The assembly mode.
    pub fn mode(&self) -> PrimitiveMode {
        match self {
            Self::DrawArrays { mode, .. } | Self::DrawElements { mode, .. } => *mode,
        }
    }

    /// Number of indices in the run.
    pub fn index_count(&self) -> usize {
        match self {
            Self::DrawArrays { count, .. } => *count as usize,
            Self::DrawElements { indices, .. } => indices.len(),
        }
    }

    /// The `i`th vertex index of the run.
    ///
    /// `None` past the end of the run, or where a `DrawArrays` run passes `u32::MAX`.
    pub fn index(&self, i: usize) -> Option<u32> {
        match self {
            Self::DrawArrays { first, count, .. } => u32::try_from(i)
                .ok()
                .filter(|&i| i < *count)
                .and_then(|i| first.checked_add(i)),
            Self::DrawElements { indices, .. } => indices.get(i).copied(),
        }
    }

    /// True if a `DrawArrays` run reaches past `u32::MAX`.
    pub fn index_overflows(&self) -> bool {
        match self {
            Self::DrawArrays { first, count, .. } => {
                *count > 0 && first.checked_add(count - 1).is_none()
            }
            Self::DrawElements { .. } => false,
        }
    }

    /// Call `emit` with the vertex indices of every triangle the run produces.
    ///
    /// Point and line modes produce none. Odd strip triangles swap their last two indices
    /// to keep a consistent winding. Triangles with an index past `u32::MAX` are skipped;
    /// see [`PrimitiveSet::index_overflows`].
    pub fn for_each_triangle(&self, mut emit: impl FnMut(u32, u32, u32)) {
        let n = self.index_count();
        let at = |i: usize| self.index(i);
        let mut f = |a: Option<u32>, b: Option<u32>, c: Option<u32>| {
            if let (Some(a), Some(b), Some(c)) = (a, b, c) {
                emit(a, b, c);
            }
        };
        match self.mode() {
            PrimitiveMode::Points
            | PrimitiveMode::Lines
            | PrimitiveMode::LineStrip
            | PrimitiveMode::LineLoop => {}
            PrimitiveMode::Triangles => {
                for i in (0..n / 3).map(|t| t * 3) {
                    f(at(i), at(i + 1), at(i + 2));
                }
            }
            PrimitiveMode::TriangleStrip => {
                for i in 2..n {
                    if i % 2 == 1 {
                        f(at(i - 2), at(i), at(i - 1));
                    } else {
                        f(at(i - 2), at(i - 1), at(i));
                    }
                }
            }
            PrimitiveMode::TriangleFan | PrimitiveMode::Polygon => {
                for i in 2..n {
                    f(at(0), at(i - 1), at(i));
                }
            }
            PrimitiveMode::Quads => {
                for i in (0..n / 4).map(|q| q * 4) {
                    f(at(i), at(i + 1), at(i + 2));
                    f(at(i), at(i + 2), at(i + 3));
                }
            }
            PrimitiveMode::QuadStrip => {
                for i in (3..n).step_by(2) {
                    f(at(i - 3), at(i - 2), at(i - 1));
                    f(at(i - 2), at(i), at(i - 1));
                }
            }
        }
    }
}

/// Attachment in a geometry's shape slot.
#[derive(Clone, Debug)]
pub enum Shape {
    /// Analytic sphere.
    Sphere(BoundingSphere),
    /// Analytic box.
    Box(BoundingBox),
    /// Triangle acceleration structure built over the owning geometry.
    KdTree(Arc<KdTree>),
}

/// A mesh: vertex positions, primitive sets, and an optional shape attachment.
#[derive(Clone, Debug, Default)]
pub struct Geometry {
    vertices: Option<VertexArray>,
    primitives: Vec<PrimitiveSet>,
    shape: Option<Shape>,
}

impl Geometry {
    /// Create an empty geometry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a triangle-list geometry from positions and index triples.
    pub fn from_triangles(vertices: Vec<Vec3>, triangles: &[[u32; 3]]) -> Self {
        let indices = triangles.iter().flatten().copied().collect();
        Self {
            vertices: Some(vertices.into()),
            primitives: alloc::vec![PrimitiveSet::DrawElements {
                mode: PrimitiveMode::Triangles,
                indices,
            }],
            shape: None,
        }
    }

    /// Set the vertex array, dropping any attached shape built over the old one.
    pub fn set_vertex_array(&mut self, vertices: VertexArray) {
        self.vertices = Some(vertices);
        self.shape = None;
    }

    /// The vertex array, if any.
    pub fn vertex_array(&self) -> Option<&VertexArray> {
        self.vertices.as_ref()
    }

    /// Append a primitive set.
    pub fn add_primitive_set(&mut self, primitives: PrimitiveSet) {
        self.primitives.push(primitives);
    }

    /// The primitive sets in draw order.
    pub fn primitive_sets(&self) -> &[PrimitiveSet] {
        &self.primitives
    }

    /// The shape slot.
    pub fn shape(&self) -> Option<&Shape> {
        self.shape.as_ref()
    }

    /// Fill the shape slot, replacing whatever was there.
    pub fn set_shape(&mut self, shape: Shape) {
        self.shape = Some(shape);
    }

    /// Empty the shape slot.
    pub fn clear_shape(&mut self) -> Option<Shape> {
        self.shape.take()
    }

    /// The attached KD-tree, if the shape slot holds one.
    pub fn kd_tree(&self) -> Option<&Arc<KdTree>> {
        match &self.shape {
            Some(Shape::KdTree(tree)) => Some(tree),
            _ => None,
        }
    }

    /// Call `f` with the vertex indices of every triangle, in primitive-set order.
    pub fn for_each_triangle(&self, mut f: impl FnMut(u32, u32, u32)) {
        for set in &self.primitives {
            set.for_each_triangle(&mut f);
        }
    }

    /// Box around every vertex position. Empty without vertices.
    pub fn bound(&self) -> BoundingBox {
        self.vertices
            .as_ref()
            .map(VertexArray::bound)
            .unwrap_or_default()
    }

    /// Intersect the segment `start..end` with the geometry's triangles, nearest first.
    ///
    /// Uses the attached KD-tree when present and otherwise tests every triangle. Both paths
    /// number triangles the same way, so hits are interchangeable. Geometry that a tree could
    /// not be built for (no `Vec3` vertices, bad indices) yields no hits.
    pub fn intersect_segment(&self, start: Vec3, end: Vec3) -> Vec<LineSegmentHit> {
        if let Some(tree) = self.kd_tree() {
            return tree.intersect(start, end);
        }
        let Some(vertices) = self.vertices.as_ref().and_then(VertexArray::as_vec3) else {
            return Vec::new();
        };
        let Ok(triangles) = collect_triangles(self, vertices) else {
            return Vec::new();
        };
        let mut hits: Vec<_> = triangles
            .iter()
            .enumerate()
            .filter_map(|(i, tri)| intersect_triangle(vertices, i, *tri, start, end))
            .collect();
        hits.sort_by(|a, b| a.ratio.total_cmp(&b.ratio));
        hits
    }
}

/// Enumerate a geometry's triangles against `vertices`, dropping degenerate ones.
///
/// A triangle is degenerate when two of its corners share a position.
pub(crate) fn collect_triangles(
    geometry: &Geometry,
    vertices: &[Vec3],
) -> Result<Vec<[u32; 3]>, KdTreeError> {
    if geometry
        .primitive_sets()
        .iter()
        .any(PrimitiveSet::index_overflows)
    {
        return Err(KdTreeError::IndexOutOfRange {
            index: u32::MAX,
            vertex_count: vertices.len(),
        });
    }
    let mut triangles = Vec::new();
    let mut bad_index = None;
    geometry.for_each_triangle(|a, b, c| {
        if bad_index.is_some() {
            return;
        }
        let fetch = |i: u32| vertices.get(i as usize).copied();
        match (fetch(a), fetch(b), fetch(c)) {
            (Some(va), Some(vb), Some(vc)) => {
                if va != vb && vb != vc && va != vc {
                    triangles.push([a, b, c]);
                }
            }
            _ => {
                bad_index = [a, b, c]
                    .into_iter()
                    .find(|&i| i as usize >= vertices.len());
            }
        }
    });
    if let Some(index) = bad_index {
        return Err(KdTreeError::IndexOutOfRange {
            index,
            vertex_count: vertices.len(),
        });
    }
    Ok(triangles)
}
