// Copyright 2025 the Umbral Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! KD-tree basics.
//!
//! Build a small scene, attach trees with the builder pass, and pick with a segment.
//!
//! Run:
//! - `cargo run -p umbral_demos --example kdtree_basics`

use glam::{Mat4, Vec3};
use umbral_kdtree::{
    Drawable, Geode, Geometry, Group, KdTreeBuilder, KdTreeOptions, Node, NodeRef, Transform,
};

/// An `n × n` grid of unit quads in the z = 0 plane.
fn floor(n: u32) -> Geometry {
    let mut vertices = Vec::new();
    for y in 0..=n {
        for x in 0..=n {
            vertices.push(Vec3::new(x as f32, y as f32, 0.0));
        }
    }
    let at = |x: u32, y: u32| y * (n + 1) + x;
    let mut triangles = Vec::new();
    for y in 0..n {
        for x in 0..n {
            triangles.push([at(x, y), at(x + 1, y), at(x + 1, y + 1)]);
            triangles.push([at(x, y), at(x + 1, y + 1), at(x, y + 1)]);
        }
    }
    Geometry::from_triangles(vertices, &triangles)
}

fn main() {
    // Two floors: one at z = 0 and a raised copy at z = 2.
    let mut scene: Node = Group {
        children: vec![
            Geode {
                drawables: vec![Drawable::Geometry(floor(8))],
            }
            .into(),
            Transform {
                matrix: Mat4::from_translation(Vec3::new(0.0, 0.0, 2.0)),
                children: vec![
                    Geode {
                        drawables: vec![Drawable::Geometry(floor(2))],
                    }
                    .into(),
                ],
            }
            .into(),
        ],
    }
    .into();

    let builder = KdTreeBuilder::new(KdTreeOptions::default());
    let stats = builder.apply(&mut scene);
    println!("first pass: {stats:?}");
    let again = builder.apply(&mut scene);
    println!("second pass: {again:?}");
    assert_eq!(again.trees_built, 0, "the pass is idempotent");

    // Inspect the tree attached to the big floor.
    if let Node::Group(group) = &scene {
        if let Node::Geode(geode) = &group.children[0] {
            if let Some(tree) = geode.drawables[0].as_geometry().and_then(|g| g.kd_tree()) {
                println!(
                    "big floor: {} triangles, {} leaves, axes {:?}",
                    tree.triangle_count(),
                    tree.leaves().len(),
                    &tree.axis_schedule()[..6]
                );
                if let NodeRef::Internal(root) = tree.root() {
                    println!("root bound: {:?}", tree.nodes()[root].bound);
                }
            }
        }
    }

    // Pick straight down through both floors.
    let hits = scene.intersect_segment(Vec3::new(1.5, 1.25, 5.0), Vec3::new(1.5, 1.25, -5.0));
    for hit in &hits {
        println!(
            "hit path {:?} drawable {} at {:?} (ratio {:.2})",
            hit.path,
            hit.drawable,
            hit.point,
            hit.ratio()
        );
    }
    assert_eq!(hits.len(), 2);
    assert_eq!(hits[0].path, vec![1, 0], "the raised floor is hit first");
}
