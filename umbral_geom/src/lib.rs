// Copyright 2025 the Umbral Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Umbral Geom: planes, bounds, convex polytopes, and a mask-tracking polygon clipper.
//!
//! Umbral Geom is the shared vocabulary of the Umbral culling crates.
//!
//! - [`Plane`]: oriented plane with signed distance and sphere/box/point-set classification.
//! - [`BoundingBox`] and [`BoundingSphere`]: grown by expansion, used for early rejects.
//! - [`Polytope`]: a convex region as a list of up to [`MAX_PLANES`] planes, with
//!   "intersects" and "wholly contains" queries.
//! - [`MaskStack`]: caller-owned frame-coherence state. It remembers which planes a parent
//!   bound was already inside so that children skip them.
//! - [`clip`]: Sutherland–Hodgman clipping of a convex polygon against a plane list, tagging
//!   each synthesized vertex with the [`PlaneMask`] of the planes that produced it.
//!
//! Polytopes are immutable during queries; all mutable coherence state lives in
//! the [`MaskStack`] you pass in, so several threads can query one polytope at once
//! as long as each owns its own stack.
//!
//! # Example
//!
//! ```rust
//! use glam::{Mat4, Vec3};
//! use umbral_geom::{BoundingSphere, Polytope, clip};
//!
//! // A 90° frustum looking down -z, near 1, far 100.
//! let proj = Mat4::perspective_rh_gl(std::f32::consts::FRAC_PI_2, 1.0, 1.0, 100.0);
//! let frustum = Polytope::from_view_projection(&proj);
//!
//! let mut masks = frustum.mask_stack();
//! assert!(frustum.contains_sphere(&BoundingSphere::new(Vec3::new(0.0, 0.0, -10.0), 1.0), &mut masks));
//! assert!(!frustum.contains_sphere(&BoundingSphere::new(Vec3::new(0.0, 0.0, 10.0), 1.0), &mut masks));
//!
//! // Clip a quad that pokes out of the right side of the frustum.
//! let quad = [
//!     Vec3::new(0.0, -1.0, -5.0),
//!     Vec3::new(20.0, -1.0, -5.0),
//!     Vec3::new(20.0, 1.0, -5.0),
//!     Vec3::new(0.0, 1.0, -5.0),
//! ];
//! let clipped = clip::clip(frustum.planes(), &quad).unwrap();
//! assert_eq!(clipped.len(), 4);
//! assert!(clipped.iter().all(|p| p.position.x <= 5.0 + 1e-4));
//! ```
//!
//! ## Conventions
//!
//! - The positive side of a plane is inside.
//! - Frustums use OpenGL clip space (`z` in `[-1, 1]`).
//! - Plane masks are 32 bits wide; lists with more than [`MAX_PLANES`] planes are rejected
//!   with [`TooManyPlanes`] rather than silently ignoring the excess planes.
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

pub mod bounds;
pub mod clip;
pub mod plane;
pub mod polytope;

pub use bounds::{BoundingBox, BoundingSphere};
pub use clip::ClipPoint;
pub use plane::{Plane, Side};
pub use polytope::{MAX_PLANES, MaskStack, PlaneMask, Polytope, TooManyPlanes};
