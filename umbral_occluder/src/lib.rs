// Copyright 2025 the Umbral Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Umbral Occluder: shadow-volume occlusion culling.
//!
//! A [`ConvexPlanarOccluder`] is a convex polygon, optionally with holes, placed in some
//! object's local frame. Given a [`CullView`] for that frame, [`ShadowVolumeOccluder::compute`]
//! builds the eye-space prism the polygon hides: the polygon clipped to the view frustum and
//! swept back to the far plane. Bounds wholly inside that prism, and not visible through a
//! hole, can be skipped by a cull traversal.
//!
//! [`OccluderSet`] ranks a frame's occluders by the fraction of the frustum they hide and
//! drops the ones that are themselves hidden.
//!
//! The containment tests are conservative: anything touching a silhouette or a hole is
//! reported visible.
//!
//! # Example
//!
//! ```rust
//! use glam::{Mat4, Vec3};
//! use umbral_geom::BoundingSphere;
//! use umbral_occluder::{ConvexPlanarOccluder, CullView, OccluderSet, ShadowVolumeOccluder};
//!
//! let projection = Mat4::perspective_rh_gl(std::f32::consts::FRAC_PI_2, 1.0, 1.0, 100.0);
//! let view = CullView::new(Mat4::IDENTITY, projection).unwrap();
//!
//! // A 4 × 4 wall five units in front of the eye.
//! let wall = ConvexPlanarOccluder::new(vec![
//!     Vec3::new(-2.0, -2.0, -5.0),
//!     Vec3::new(2.0, -2.0, -5.0),
//!     Vec3::new(2.0, 2.0, -5.0),
//!     Vec3::new(-2.0, 2.0, -5.0),
//! ]);
//! let occluder = ShadowVolumeOccluder::compute(vec![0], &wall, &view).unwrap();
//!
//! let mut set = OccluderSet::default();
//! assert!(set.insert(occluder));
//! set.finalize();
//!
//! assert!(set.is_occluded_sphere(&BoundingSphere::new(Vec3::new(0.0, 0.0, -20.0), 1.0)));
//! assert!(!set.is_occluded_sphere(&BoundingSphere::new(Vec3::new(0.0, 0.0, -4.0), 0.5)));
//! ```
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

pub mod occluder_set;
pub mod polygon;
pub mod shadow_volume;
pub mod view;

pub use occluder_set::{OccluderSet, OccluderSetOptions};
pub use polygon::{ConvexPlanarOccluder, ConvexPlanarPolygon};
pub use shadow_volume::{OccluderCullState, OccluderError, ShadowVolumeOccluder};
pub use view::{CullView, frustum_volume};
