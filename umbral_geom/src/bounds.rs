// Copyright 2025 the Umbral Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Axis-aligned boxes and spheres grown by expansion.

use glam::Vec3;

/// Axis-aligned bounding box in 3D.
///
/// A freshly created box is empty (inverted) until expanded; see [`BoundingBox::valid`].
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct BoundingBox {
    /// Minimum corner.
    pub min: Vec3,
    /// Maximum corner.
    pub max: Vec3,
}

impl Default for BoundingBox {
    fn default() -> Self {
        Self::empty()
    }
}

impl BoundingBox {
    /// Create a box from its corners.
    pub const fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// An empty box that any expansion replaces.
    pub const fn empty() -> Self {
        Self {
            min: Vec3::splat(f32::MAX),
            max: Vec3::splat(-f32::MAX),
        }
    }

    /// Smallest box containing every point. Empty if `points` is empty.
    pub fn from_points(points: &[Vec3]) -> Self {
        let mut bb = Self::empty();
        for &p in points {
            bb.expand_by_point(p);
        }
        bb
    }

    /// True once the box has been expanded by at least one point.
    pub fn valid(&self) -> bool {
        self.max.x >= self.min.x && self.max.y >= self.min.y && self.max.z >= self.min.z
    }

    /// Reset to empty.
    pub fn init(&mut self) {
        *self = Self::empty();
    }

    /// Grow to contain `point`.
    pub fn expand_by_point(&mut self, point: Vec3) {
        self.min = self.min.min(point);
        self.max = self.max.max(point);
    }

    /// Grow to contain `other`. Empty boxes are ignored.
    pub fn expand_by_box(&mut self, other: &Self) {
        if other.valid() {
            self.min = self.min.min(other.min);
            self.max = self.max.max(other.max);
        }
    }

    /// Grow to contain `sphere`. Invalid spheres are ignored.
    pub fn expand_by_sphere(&mut self, sphere: &BoundingSphere) {
        if sphere.valid() {
            self.min = self.min.min(sphere.center - Vec3::splat(sphere.radius));
            self.max = self.max.max(sphere.center + Vec3::splat(sphere.radius));
        }
    }

    /// Grow every face outward by `amount`.
    pub fn inflate(&mut self, amount: f32) {
        if self.valid() {
            self.min -= Vec3::splat(amount);
            self.max += Vec3::splat(amount);
        }
    }

    /// Center point.
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Edge lengths along each axis.
    pub fn extents(&self) -> Vec3 {
        self.max - self.min
    }

    /// Half the diagonal length.
    pub fn radius(&self) -> f32 {
        self.extents().length() * 0.5
    }

    /// One of the eight corners: bit 0 selects max x, bit 1 max y, bit 2 max z.
    pub fn corner(&self, index: usize) -> Vec3 {
        Vec3::new(
            if index & 1 != 0 { self.max.x } else { self.min.x },
            if index & 2 != 0 { self.max.y } else { self.min.y },
            if index & 4 != 0 { self.max.z } else { self.min.z },
        )
    }

    /// Whether the point lies inside or on the box.
    pub fn contains(&self, point: Vec3) -> bool {
        self.valid() && point.cmpge(self.min).all() && point.cmple(self.max).all()
    }

    /// Whether the two boxes overlap (touching counts).
    pub fn intersects(&self, other: &Self) -> bool {
        self.valid()
            && other.valid()
            && self.min.cmple(other.max).all()
            && other.min.cmple(self.max).all()
    }
}

/// Bounding sphere. A negative radius marks an invalid (empty) sphere.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct BoundingSphere {
    /// Center point.
    pub center: Vec3,
    /// Radius; negative when empty.
    pub radius: f32,
}

impl Default for BoundingSphere {
    fn default() -> Self {
        Self::empty()
    }
}

impl BoundingSphere {
    /// Create a sphere from center and radius.
    pub const fn new(center: Vec3, radius: f32) -> Self {
        Self { center, radius }
    }

    /// An empty sphere that any expansion replaces.
    pub const fn empty() -> Self {
        Self {
            center: Vec3::ZERO,
            radius: -1.0,
        }
    }

    /// Sphere circumscribing a box. Empty if the box is empty.
    pub fn from_box(bb: &BoundingBox) -> Self {
        if bb.valid() {
            Self::new(bb.center(), bb.radius())
        } else {
            Self::empty()
        }
    }

    /// True if the radius is non-negative.
    pub fn valid(&self) -> bool {
        self.radius >= 0.0
    }

    /// Grow to contain `point`, moving the center toward it by half the overshoot.
    pub fn expand_by_point(&mut self, point: Vec3) {
        if !self.valid() {
            self.center = point;
            self.radius = 0.0;
            return;
        }
        let dv = point - self.center;
        let r = dv.length();
        if r > self.radius {
            let grow = (r - self.radius) * 0.5;
            self.center += dv * (grow / r);
            self.radius += grow;
        }
    }

    /// Grow to the smallest sphere containing both spheres.
    pub fn expand_by_sphere(&mut self, other: &Self) {
        if !other.valid() {
            return;
        }
        if !self.valid() {
            *self = *other;
            return;
        }
        let d = (other.center - self.center).length();
        if d + other.radius <= self.radius {
            return;
        }
        if d + self.radius <= other.radius {
            *self = *other;
            return;
        }
        let new_radius = (self.radius + d + other.radius) * 0.5;
        let ratio = (new_radius - self.radius) / d;
        self.center += (other.center - self.center) * ratio;
        self.radius = new_radius;
    }

    /// Whether the point lies inside or on the sphere.
    pub fn contains(&self, point: Vec3) -> bool {
        self.valid() && (point - self.center).length_squared() <= self.radius * self.radius
    }
}
