// Copyright 2025 the Umbral Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Minimal scene model: groups, transforms and geodes holding drawables.

use alloc::vec::Vec;
use glam::{Mat3, Mat4, Vec3};

use crate::geometry::{Geometry, Shape};
use crate::kdtree::LineSegmentHit;

/// A scene node.
#[derive(Clone, Debug)]
pub enum Node {
    /// Plain container.
    Group(Group),
    /// Container whose children are placed by a matrix.
    Transform(Transform),
    /// Leaf node holding drawables.
    Geode(Geode),
}

/// Plain container node.
#[derive(Clone, Debug, Default)]
pub struct Group {
    /// Child nodes.
    pub children: Vec<Node>,
}

/// Container whose children live in the frame given by `matrix`.
#[derive(Clone, Debug)]
pub struct Transform {
    /// Child-to-parent transform.
    pub matrix: Mat4,
    /// Child nodes.
    pub children: Vec<Node>,
}

/// Leaf node holding drawables.
#[derive(Clone, Debug, Default)]
pub struct Geode {
    /// Drawables in draw order.
    pub drawables: Vec<Drawable>,
}

/// Something a geode draws.
#[derive(Clone, Debug)]
pub enum Drawable {
    /// Triangle mesh.
    Geometry(Geometry),
    /// Standalone shape.
    Shape(Shape),
}

impl Drawable {
    /// The mesh, if this drawable is one.
    pub fn as_geometry(&self) -> Option<&Geometry> {
        match self {
            Self::Geometry(g) => Some(g),
            Self::Shape(_) => None,
        }
    }
}

/// A segment hit somewhere below a node.
#[derive(Clone, Debug, PartialEq)]
pub struct SceneHit {
    /// Child indices from the queried node down to the geode.
    pub path: Vec<usize>,
    /// Drawable index within the geode.
    pub drawable: usize,
    /// Hit in the drawable's local frame.
    pub local: LineSegmentHit,
    /// Intersection point in the queried node's frame.
    pub point: Vec3,
    /// Unit normal in the queried node's frame.
    pub normal: Vec3,
}

impl SceneHit {
    /// Position along the queried segment.
    pub fn ratio(&self) -> f32 {
        self.local.ratio
    }
}

impl From<Group> for Node {
    fn from(group: Group) -> Self {
        Self::Group(group)
    }
}

impl From<Transform> for Node {
    fn from(transform: Transform) -> Self {
        Self::Transform(transform)
    }
}

impl From<Geode> for Node {
    fn from(geode: Geode) -> Self {
        Self::Geode(geode)
    }
}

impl Node {
    /// Child nodes; geodes have none.
    pub fn children(&self) -> &[Node] {
        match self {
            Self::Group(g) => &g.children,
            Self::Transform(t) => &t.children,
            Self::Geode(_) => &[],
        }
    }

    /// Intersect the segment `start..end`, given in this node's frame, with every mesh below.
    ///
    /// Transforms are applied on the way down; hits come back nearest first with points
    /// and normals in this node's frame. Analytic shapes are not intersected, and subtrees
    /// under a singular transform are skipped.
    pub fn intersect_segment(&self, start: Vec3, end: Vec3) -> Vec<SceneHit> {
        let mut hits = Vec::new();
        let mut path = Vec::new();
        self.collect_hits(Mat4::IDENTITY, start, end, &mut path, &mut hits);
        hits.sort_by(|a, b| a.ratio().total_cmp(&b.ratio()));
        hits
    }

    fn collect_hits(
        &self,
        to_root: Mat4,
        start: Vec3,
        end: Vec3,
        path: &mut Vec<usize>,
        hits: &mut Vec<SceneHit>,
    ) {
        match self {
            Self::Group(group) => {
                visit_children(&group.children, to_root, start, end, path, hits);
            }
            Self::Transform(transform) => {
                if transform.matrix.determinant() == 0.0 {
                    log::trace!("skipping subtree under a singular transform");
                    return;
                }
                let inverse = transform.matrix.inverse();
                visit_children(
                    &transform.children,
                    to_root * transform.matrix,
                    inverse.transform_point3(start),
                    inverse.transform_point3(end),
                    path,
                    hits,
                );
            }
            Self::Geode(geode) => {
                let normal_matrix = Mat3::from_mat4(to_root).inverse().transpose();
                for (i, drawable) in geode.drawables.iter().enumerate() {
                    let local_hits = match drawable {
                        Drawable::Geometry(g) => g.intersect_segment(start, end),
                        Drawable::Shape(Shape::KdTree(tree)) => tree.intersect(start, end),
                        Drawable::Shape(Shape::Sphere(_) | Shape::Box(_)) => continue,
                    };
                    hits.extend(local_hits.into_iter().map(|local| SceneHit {
                        path: path.clone(),
                        drawable: i,
                        local,
                        point: to_root.transform_point3(local.point),
                        normal: (normal_matrix * local.normal).normalize_or_zero(),
                    }));
                }
            }
        }
    }
}

fn visit_children(
    children: &[Node],
    to_root: Mat4,
    start: Vec3,
    end: Vec3,
    path: &mut Vec<usize>,
    hits: &mut Vec<SceneHit>,
) {
    for (i, child) in children.iter().enumerate() {
        path.push(i);
        child.collect_hits(to_root, start, end, path, hits);
        path.pop();
    }
}
