// Copyright 2025 the Umbral Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Convex polytopes as plane lists, plane masks, and the mask stack used for
//! frame-coherent culling.

use alloc::vec::Vec;
use glam::{Mat4, Vec3};

use crate::bounds::{BoundingBox, BoundingSphere};
use crate::plane::{Plane, Side};

/// Maximum number of planes addressable by a [`PlaneMask`].
pub const MAX_PLANES: usize = 32;

bitflags::bitflags! {
    /// One bit per plane of a polytope or clip plane list; bit `i` is plane `i`.
    ///
    /// Masks are 32 bits wide, so a polytope holds at most [`MAX_PLANES`] planes.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct PlaneMask: u32 {
        const _ = !0;
    }
}

impl Default for PlaneMask {
    fn default() -> Self {
        Self::empty()
    }
}

impl PlaneMask {
    /// The mask selecting only plane `index`. Indices past [`MAX_PLANES`] select nothing.
    pub const fn plane(index: usize) -> Self {
        if index < MAX_PLANES {
            Self::from_bits_retain(1 << index)
        } else {
            Self::empty()
        }
    }

    /// The mask selecting planes `0..count`.
    pub const fn first(count: usize) -> Self {
        if count >= MAX_PLANES {
            Self::all()
        } else {
            Self::from_bits_retain((1 << count) - 1)
        }
    }
}

/// Error returned when a plane list outgrows the 32-bit [`PlaneMask`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("{count} planes exceed the 32-plane mask limit")]
pub struct TooManyPlanes {
    /// Number of planes that were requested.
    pub count: usize,
}

/// Caller-owned coherence state for repeated queries against one [`Polytope`].
///
/// The top of the stack selects which planes still need testing. After a query, the
/// result mask holds the planes the tested bound was *not* wholly inside. Pushing that
/// result before visiting children lets them skip planes their parent already cleared;
/// popping restores the parent's mask.
///
/// Masks are intersected with the polytope's own planes on every query, so a stack
/// built for a polytope with more planes never selects planes that do not exist.
#[derive(Clone, Debug)]
pub struct MaskStack {
    stack: Vec<PlaneMask>,
    result: PlaneMask,
}

impl MaskStack {
    /// Create a stack whose base mask is `mask`.
    pub fn new(mask: PlaneMask) -> Self {
        let mut stack = Vec::with_capacity(8);
        stack.push(mask);
        Self {
            stack,
            result: mask,
        }
    }

    /// Mask consulted by the next query.
    pub fn current(&self) -> PlaneMask {
        self.stack.last().copied().unwrap_or_default()
    }

    /// Mask left by the last query.
    pub fn result(&self) -> PlaneMask {
        self.result
    }

    /// Number of entries, including the base mask.
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Push the last query's result as the current mask.
    pub fn push_current_mask(&mut self) {
        self.stack.push(self.result);
    }

    /// Restore the previous mask. The base mask is never popped.
    pub fn pop_current_mask(&mut self) {
        if self.stack.len() > 1 {
            self.stack.pop();
        }
        self.result = self.current();
    }

    /// Drop everything and start over from `mask`.
    pub fn reset(&mut self, mask: PlaneMask) {
        self.stack.clear();
        self.stack.push(mask);
        self.result = mask;
    }
}

/// A convex region: the intersection of the positive half-spaces of its planes.
///
/// A polytope also carries a reference vertex list, typically the front face of an
/// occluder, used later to test whether the polytope's source is itself hidden.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Polytope {
    planes: Vec<Plane>,
    reference_vertices: Vec<Vec3>,
}

impl Polytope {
    /// Create an empty polytope (contains everything).
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a polytope from planes.
    pub fn from_planes(planes: Vec<Plane>) -> Result<Self, TooManyPlanes> {
        if planes.len() > MAX_PLANES {
            return Err(TooManyPlanes {
                count: planes.len(),
            });
        }
        Ok(Self {
            planes,
            reference_vertices: Vec::new(),
        })
    }

    /// The clip-space cube `[-1, 1]³`, optionally without its near (`z = -1`) or far (`z = 1`) side.
    ///
    /// Plane order is left, right, bottom, top, near, far.
    pub fn unit_frustum(with_near: bool, with_far: bool) -> Self {
        let mut planes = Vec::with_capacity(6);
        planes.push(Plane::new(1.0, 0.0, 0.0, 1.0));
        planes.push(Plane::new(-1.0, 0.0, 0.0, 1.0));
        planes.push(Plane::new(0.0, 1.0, 0.0, 1.0));
        planes.push(Plane::new(0.0, -1.0, 0.0, 1.0));
        if with_near {
            planes.push(Plane::new(0.0, 0.0, 1.0, 1.0));
        }
        if with_far {
            planes.push(Plane::new(0.0, 0.0, -1.0, 1.0));
        }
        Self {
            planes,
            reference_vertices: Vec::new(),
        }
    }

    /// The view frustum, in the space `view_projection` maps from.
    ///
    /// Expects OpenGL-style clip space (`z` in `[-1, 1]`), as produced by
    /// [`Mat4::perspective_rh_gl`].
    pub fn from_view_projection(view_projection: &Mat4) -> Self {
        let mut frustum = Self::unit_frustum(true, true);
        frustum.transform_provide_inverse(view_projection);
        frustum
    }

    /// The six faces of a box, facing inward.
    pub fn from_bounding_box(bb: &BoundingBox) -> Self {
        let planes = alloc::vec![
            Plane::new(1.0, 0.0, 0.0, -bb.min.x),
            Plane::new(-1.0, 0.0, 0.0, bb.max.x),
            Plane::new(0.0, 1.0, 0.0, -bb.min.y),
            Plane::new(0.0, -1.0, 0.0, bb.max.y),
            Plane::new(0.0, 0.0, 1.0, -bb.min.z),
            Plane::new(0.0, 0.0, -1.0, bb.max.z),
        ];
        Self {
            planes,
            reference_vertices: Vec::new(),
        }
    }

    /// Append a plane.
    pub fn add(&mut self, plane: Plane) -> Result<(), TooManyPlanes> {
        if self.planes.len() >= MAX_PLANES {
            return Err(TooManyPlanes {
                count: self.planes.len() + 1,
            });
        }
        self.planes.push(plane);
        Ok(())
    }

    /// The planes in insertion order.
    pub fn planes(&self) -> &[Plane] {
        &self.planes
    }

    /// Number of planes.
    pub fn len(&self) -> usize {
        self.planes.len()
    }

    /// True if there are no planes.
    pub fn is_empty(&self) -> bool {
        self.planes.is_empty()
    }

    /// Vertices recorded for whole-source containment tests.
    pub fn reference_vertices(&self) -> &[Vec3] {
        &self.reference_vertices
    }

    /// Replace the reference vertices.
    pub fn set_reference_vertices(&mut self, vertices: Vec<Vec3>) {
        self.reference_vertices = vertices;
    }

    /// Mask with one bit set per plane.
    pub fn full_mask(&self) -> PlaneMask {
        PlaneMask::first(self.planes.len())
    }

    /// A fresh coherence stack selecting every plane.
    pub fn mask_stack(&self) -> MaskStack {
        MaskStack::new(self.full_mask())
    }

    /// Reverse every plane, swapping inside and outside.
    pub fn flip(&mut self) {
        for plane in &mut self.planes {
            plane.flip();
        }
    }

    /// Move the planes along with points transformed by `M`, given `M⁻¹`.
    ///
    /// Reference vertices stay in the frame they were recorded in.
    pub fn transform_provide_inverse(&mut self, inverse: &Mat4) {
        for plane in &mut self.planes {
            plane.transform_provide_inverse(inverse);
        }
    }

    /// True if the point is on the positive side of (or on) every plane.
    pub fn contains_point(&self, point: Vec3) -> bool {
        self.planes.iter().all(|p| p.distance(point) >= 0.0)
    }

    /// True unless the sphere is entirely outside some selected plane.
    ///
    /// Planes the sphere is wholly inside are cleared from the result mask.
    pub fn contains_sphere(&self, sphere: &BoundingSphere, masks: &mut MaskStack) -> bool {
        self.contains_by(masks, |p| p.side_of_sphere(sphere))
    }

    /// True unless the box is entirely outside some selected plane.
    ///
    /// Planes the box is wholly inside are cleared from the result mask.
    pub fn contains_box(&self, bb: &BoundingBox, masks: &mut MaskStack) -> bool {
        self.contains_by(masks, |p| p.side_of_box(bb))
    }

    /// True if, for every selected plane, no point is below it and at least one is above it.
    pub fn contains_all_of_points(&self, points: &[Vec3], masks: &mut MaskStack) -> bool {
        self.contains_all_by(masks, |p| p.side_of_points(points))
    }

    /// True if the sphere is entirely inside every selected plane.
    pub fn contains_all_of_sphere(&self, sphere: &BoundingSphere, masks: &mut MaskStack) -> bool {
        self.contains_all_by(masks, |p| p.side_of_sphere(sphere))
    }

    /// True if the box is entirely inside every selected plane.
    pub fn contains_all_of_box(&self, bb: &BoundingBox, masks: &mut MaskStack) -> bool {
        self.contains_all_by(masks, |p| p.side_of_box(bb))
    }

    fn contains_by(&self, masks: &mut MaskStack, side: impl Fn(&Plane) -> Side) -> bool {
        let current = masks.current() & self.full_mask();
        masks.result = current;
        for (i, plane) in self.planes.iter().enumerate() {
            let bit = PlaneMask::plane(i);
            if !current.contains(bit) {
                continue;
            }
            match side(plane) {
                Side::Below => return false,
                Side::Above => masks.result.remove(bit),
                Side::Straddles => {}
            }
        }
        true
    }

    fn contains_all_by(&self, masks: &mut MaskStack, side: impl Fn(&Plane) -> Side) -> bool {
        let current = masks.current() & self.full_mask();
        masks.result = current;
        for (i, plane) in self.planes.iter().enumerate() {
            let bit = PlaneMask::plane(i);
            if !current.contains(bit) {
                continue;
            }
            if side(plane) != Side::Above {
                return false;
            }
            masks.result.remove(bit);
        }
        true
    }
}
