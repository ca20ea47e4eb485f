// Copyright 2025 the Umbral Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Scene pass that attaches a KD-tree to every mesh that benefits from one.

use alloc::sync::Arc;

use crate::geometry::{Geometry, Shape};
use crate::kdtree::{KdTree, KdTreeOptions};
use crate::scene::{Drawable, Node};

/// Counters from one [`KdTreeBuilder::apply`] pass.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct BuildStats {
    /// Meshes reached by the traversal.
    pub geometries_visited: usize,
    /// Trees built and attached.
    pub trees_built: usize,
    /// Meshes whose shape slot was already filled.
    pub skipped_existing: usize,
    /// Meshes a tree could not or need not be built for.
    pub skipped_failed: usize,
    /// Vertices behind the trees that were built.
    pub vertices_processed: usize,
}

/// Walks a scene and fills the shape slot of each mesh with a [`KdTree`].
///
/// Meshes that already carry a shape are left alone, so running the pass twice changes
/// nothing the second time. Meshes whose build fails (too few triangles, unsupported
/// vertices) are skipped and stay without a shape.
#[derive(Clone, Debug, Default)]
pub struct KdTreeBuilder {
    options: KdTreeOptions,
}

impl KdTreeBuilder {
    /// Create a builder with the given tree options.
    pub fn new(options: KdTreeOptions) -> Self {
        Self { options }
    }

    /// The options every tree is built with.
    pub fn options(&self) -> &KdTreeOptions {
        &self.options
    }

    /// Visit `node` and everything below it.
    pub fn apply(&self, node: &mut Node) -> BuildStats {
        let mut stats = BuildStats::default();
        self.visit(node, &mut stats);
        log::debug!(
            "kd-tree pass: {} meshes, {} built, {} already shaped, {} skipped",
            stats.geometries_visited,
            stats.trees_built,
            stats.skipped_existing,
            stats.skipped_failed
        );
        stats
    }

    fn visit(&self, node: &mut Node, stats: &mut BuildStats) {
        match node {
            Node::Group(group) => {
                for child in &mut group.children {
                    self.visit(child, stats);
                }
            }
            Node::Transform(transform) => {
                for child in &mut transform.children {
                    self.visit(child, stats);
                }
            }
            Node::Geode(geode) => {
                for drawable in &mut geode.drawables {
                    match drawable {
                        Drawable::Geometry(geometry) => self.apply_geometry(geometry, stats),
                        Drawable::Shape(_) => {}
                    }
                }
            }
        }
    }

    /// Build and attach a tree for one mesh, recording the outcome in `stats`.
    pub fn apply_geometry(&self, geometry: &mut Geometry, stats: &mut BuildStats) {
        stats.geometries_visited += 1;
        if geometry.shape().is_some() {
            stats.skipped_existing += 1;
            return;
        }
        match KdTree::build(&self.options, geometry) {
            Ok(tree) => {
                log::debug!(
                    "attached kd-tree over {} triangles ({} leaves)",
                    tree.triangle_count(),
                    tree.leaves().len()
                );
                stats.trees_built += 1;
                stats.vertices_processed += tree.vertices().len();
                geometry.set_shape(Shape::KdTree(Arc::new(tree)));
            }
            Err(err) => {
                log::debug!("no kd-tree for mesh: {err}");
                stats.skipped_failed += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::VertexArray;
    use crate::scene::{Geode, Group, Transform};
    use alloc::vec;
    use alloc::vec::Vec;
    use glam::{Mat4, Vec2, Vec3};
    use umbral_geom::BoundingSphere;

    /// A strip of `n` quads along x, two triangles each.
    fn ribbon(n: u32) -> Geometry {
        let mut vertices = Vec::new();
        for i in 0..=n {
            vertices.push(Vec3::new(i as f32, 0.0, 0.0));
            vertices.push(Vec3::new(i as f32, 1.0, 0.0));
        }
        let mut tris = Vec::new();
        for i in 0..n {
            let (a, b, c, d) = (2 * i, 2 * i + 1, 2 * i + 2, 2 * i + 3);
            tris.push([a, c, d]);
            tris.push([a, d, b]);
        }
        Geometry::from_triangles(vertices, &tris)
    }

    fn scene() -> Node {
        let mut shaped = ribbon(8);
        shaped.set_shape(Shape::Sphere(BoundingSphere::new(Vec3::ZERO, 2.0)));
        let mut flat = Geometry::new();
        flat.set_vertex_array(VertexArray::Vec2(vec![Vec2::ZERO; 3].into()));

        Group {
            children: vec![
                Geode {
                    drawables: vec![
                        Drawable::Geometry(ribbon(8)),
                        Drawable::Geometry(ribbon(1)),
                        Drawable::Geometry(shaped),
                    ],
                }
                .into(),
                Transform {
                    matrix: Mat4::from_translation(Vec3::Z),
                    children: vec![
                        Geode {
                            drawables: vec![Drawable::Geometry(ribbon(5)), Drawable::Geometry(flat)],
                        }
                        .into(),
                    ],
                }
                .into(),
            ],
        }
        .into()
    }

    fn geometry_at(node: &Node, path: &[usize], drawable: usize) -> Geometry {
        let mut node = node;
        for &i in path {
            node = &node.children()[i];
        }
        match node {
            Node::Geode(geode) => geode.drawables[drawable]
                .as_geometry()
                .cloned()
                .expect("drawable is a mesh"),
            _ => panic!("path does not end at a geode"),
        }
    }

    #[test]
    fn builds_where_useful_and_skips_the_rest() {
        let mut root = scene();
        let stats = KdTreeBuilder::default().apply(&mut root);
        assert_eq!(
            stats,
            BuildStats {
                geometries_visited: 5,
                trees_built: 2,
                skipped_existing: 1,
                skipped_failed: 2,
                vertices_processed: 18 + 12,
            }
        );
        assert!(geometry_at(&root, &[0], 0).kd_tree().is_some());
        assert!(geometry_at(&root, &[0], 1).shape().is_none(), "two triangles need no tree");
        assert!(
            matches!(geometry_at(&root, &[0], 2).shape(), Some(Shape::Sphere(_))),
            "existing shape is kept"
        );
        assert!(geometry_at(&root, &[1, 0], 0).kd_tree().is_some());
        assert!(geometry_at(&root, &[1, 0], 1).shape().is_none());
    }

    #[test]
    fn second_pass_is_a_no_op() {
        let mut root = scene();
        let builder = KdTreeBuilder::new(KdTreeOptions::default());
        builder.apply(&mut root);
        let first = geometry_at(&root, &[0], 0).kd_tree().cloned().unwrap();

        let stats = builder.apply(&mut root);
        assert_eq!(stats.trees_built, 0);
        assert_eq!(stats.skipped_existing, 3);
        assert_eq!(stats.skipped_failed, 2, "failures are retried and fail again");
        let again = geometry_at(&root, &[0], 0).kd_tree().cloned().unwrap();
        assert!(Arc::ptr_eq(&first, &again), "the attached tree is not rebuilt");
    }

    #[test]
    fn attached_tree_serves_scene_queries() {
        let mut root = scene();
        let before = root.intersect_segment(Vec3::new(3.5, 0.25, 2.0), Vec3::new(3.5, 0.25, -1.0));
        KdTreeBuilder::default().apply(&mut root);
        let after = root.intersect_segment(Vec3::new(3.5, 0.25, 2.0), Vec3::new(3.5, 0.25, -1.0));
        assert_eq!(before, after);
        assert_eq!(after.len(), 3, "two ribbons at z = 0 and one at z = 1");
        assert_eq!(after[0].path, vec![1, 0]);
    }
}
