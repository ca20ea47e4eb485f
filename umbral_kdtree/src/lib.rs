// Copyright 2025 the Umbral Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Umbral KD-Tree: a triangle KD-tree, the mesh records it indexes, and a scene pass
//! that attaches one to every mesh worth accelerating.
//!
//! - [`Geometry`]: vertex array, primitive sets and an optional [`Shape`] slot.
//! - [`KdTree`]: built once per mesh, immutable afterwards, shared through [`Arc`].
//!   Supports line-segment intersection with hits sorted along the segment.
//! - [`KdTreeBuilder`]: walks a [`Node`] hierarchy and fills empty shape slots.
//!
//! Build failures are ordinary outcomes: a mesh with few triangles simply gets no tree,
//! and [`Geometry::intersect_segment`] falls back to testing every triangle.
//!
//! # Example
//!
//! ```rust
//! use glam::Vec3;
//! use umbral_kdtree::{Drawable, Geode, Geometry, KdTreeBuilder, Node};
//!
//! // A fan of eight triangles around the origin, in the z = 0 plane.
//! let mut vertices = vec![Vec3::ZERO];
//! for i in 0..8 {
//!     let a = i as f32 * std::f32::consts::FRAC_PI_4;
//!     vertices.push(Vec3::new(a.cos(), a.sin(), 0.0));
//! }
//! let triangles: Vec<[u32; 3]> = (0..8).map(|i| [0, 1 + i, 1 + (i + 1) % 8]).collect();
//! let mesh = Geometry::from_triangles(vertices, &triangles);
//!
//! let mut scene: Node = Geode { drawables: vec![Drawable::Geometry(mesh)] }.into();
//! let stats = KdTreeBuilder::default().apply(&mut scene);
//! assert_eq!(stats.trees_built, 1);
//!
//! let hits = scene.intersect_segment(Vec3::new(0.1, 0.2, 1.0), Vec3::new(0.1, 0.2, -1.0));
//! assert_eq!(hits.len(), 1);
//! assert!((hits[0].ratio() - 0.5).abs() < 1e-6);
//! ```
//!
//! This crate is `no_std` and uses `alloc`.
//!
//! [`Arc`]: alloc::sync::Arc

#![no_std]

extern crate alloc;

pub mod builder;
pub mod geometry;
pub mod kdtree;
pub mod scene;

pub use builder::{BuildStats, KdTreeBuilder};
pub use geometry::{Geometry, PrimitiveMode, PrimitiveSet, Shape, VertexArray, VertexKind};
pub use kdtree::{
    KdLeaf, KdNode, KdTree, KdTreeError, KdTreeOptions, LineSegmentHit, MAX_SCHEDULE_LEVELS, NodeRef,
};
pub use scene::{Drawable, Geode, Group, Node, SceneHit, Transform};
