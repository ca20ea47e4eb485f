// Copyright 2025 the Umbral Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Oriented planes and half-space classification.

use glam::{Mat4, Vec3, Vec4};

use crate::bounds::{BoundingBox, BoundingSphere};

/// Where a bound lies relative to a plane.
///
/// `Above` is the positive half-space (`distance > 0`), which polytopes treat as inside.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Side {
    /// Entirely on the negative side.
    Below,
    /// Touches or crosses the plane.
    Straddles,
    /// Entirely on the positive side.
    Above,
}

/// A plane `ax + by + cz + d = 0` stored as `(a, b, c, d)`.
///
/// Planes built by [`Plane::from_points`] and [`Plane::transform_provide_inverse`]
/// keep a unit-length normal so that [`Plane::distance`] is a Euclidean signed distance.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Plane {
    coefficients: Vec4,
    // Corner indices (see `BoundingBox::corner`) nearest and farthest along the normal.
    lower_corner: u8,
    upper_corner: u8,
}

impl Default for Plane {
    fn default() -> Self {
        Self::new(0.0, 0.0, 1.0, 0.0)
    }
}

impl Plane {
    /// Create a plane from its four coefficients.
    pub fn new(a: f32, b: f32, c: f32, d: f32) -> Self {
        Self::from_vec4(Vec4::new(a, b, c, d))
    }

    /// Create a plane from packed `(a, b, c, d)` coefficients.
    pub fn from_vec4(coefficients: Vec4) -> Self {
        let mut plane = Self {
            coefficients,
            lower_corner: 0,
            upper_corner: 0,
        };
        plane.update_corners();
        plane
    }

    /// Create a plane through `point` with the given normal.
    pub fn from_normal_and_point(normal: Vec3, point: Vec3) -> Self {
        Self::from_vec4(normal.extend(-normal.dot(point)))
    }

    /// Create a plane through three points.
    ///
    /// The normal is `(v2 - v1) × (v3 - v2)`, so counter-clockwise points (seen from the
    /// positive side) give a normal pointing toward the viewer. Collinear points leave a
    /// zero normal, which [`Plane::is_valid`] reports.
    pub fn from_points(v1: Vec3, v2: Vec3, v3: Vec3) -> Self {
        let normal = (v2 - v1).cross(v3 - v2);
        let length = normal.length();
        let normal = if length > 0.0 { normal / length } else { normal };
        Self::from_vec4(normal.extend(-v1.dot(normal)))
    }

    /// The `(a, b, c, d)` coefficients.
    pub fn as_vec4(&self) -> Vec4 {
        self.coefficients
    }

    /// The `(a, b, c)` part.
    pub fn normal(&self) -> Vec3 {
        self.coefficients.truncate()
    }

    /// The `d` coefficient: the signed distance of the origin from the plane.
    pub fn d(&self) -> f32 {
        self.coefficients.w
    }

    /// True if the normal is non-zero and every coefficient is finite.
    pub fn is_valid(&self) -> bool {
        self.coefficients.is_finite() && self.normal().length_squared() > 0.0
    }

    /// Signed distance of `point` from the plane.
    #[inline]
    pub fn distance(&self, point: Vec3) -> f32 {
        self.normal().dot(point) + self.coefficients.w
    }

    /// Reverse the plane's orientation in place.
    pub fn flip(&mut self) {
        self.coefficients = -self.coefficients;
        self.update_corners();
    }

    /// A copy with reversed orientation.
    #[must_use]
    pub fn flipped(mut self) -> Self {
        self.flip();
        self
    }

    /// Rescale so the normal has unit length. Zero normals are left as is.
    pub fn normalize(&mut self) {
        let length = self.normal().length();
        if length > 0.0 {
            self.coefficients /= length;
        }
    }

    /// Move the plane along with points transformed by some matrix `M`, given `M⁻¹`.
    ///
    /// Points map as `p' = M p`; the plane maps as `(M⁻¹)ᵀ plane`, then is renormalized.
    pub fn transform_provide_inverse(&mut self, inverse: &Mat4) {
        self.coefficients = inverse.transpose() * self.coefficients;
        self.normalize();
        self.update_corners();
    }

    /// Classify a sphere against the plane.
    pub fn side_of_sphere(&self, sphere: &BoundingSphere) -> Side {
        let d = self.distance(sphere.center);
        if d > sphere.radius {
            Side::Above
        } else if d < -sphere.radius {
            Side::Below
        } else {
            Side::Straddles
        }
    }

    /// Classify a box against the plane using its corners nearest and farthest along the normal.
    pub fn side_of_box(&self, bb: &BoundingBox) -> Side {
        if self.distance(bb.corner(self.lower_corner.into())) > 0.0 {
            Side::Above
        } else if self.distance(bb.corner(self.upper_corner.into())) < 0.0 {
            Side::Below
        } else {
            Side::Straddles
        }
    }

    /// Classify a point set against the plane.
    ///
    /// Points lying exactly on the plane do not count as above, so a set with no point
    /// strictly above is `Below`. An empty set is `Below`.
    pub fn side_of_points(&self, points: &[Vec3]) -> Side {
        let mut above = 0_usize;
        let mut below = 0_usize;
        for &p in points {
            let d = self.distance(p);
            if d > 0.0 {
                above += 1;
            } else if d < 0.0 {
                below += 1;
            }
        }
        match (above > 0, below > 0) {
            (true, true) => Side::Straddles,
            (true, false) => Side::Above,
            _ => Side::Below,
        }
    }

    fn update_corners(&mut self) {
        let n = self.normal();
        let upper = u8::from(n.x >= 0.0) | (u8::from(n.y >= 0.0) << 1) | (u8::from(n.z >= 0.0) << 2);
        self.upper_corner = upper;
        self.lower_corner = (!upper) & 0b111;
    }
}
