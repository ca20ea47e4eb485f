// Copyright 2025 the Umbral Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The camera state an occluder is computed against.

use glam::{Mat4, Vec3};
use umbral_geom::Polytope;

use crate::shadow_volume::{OccluderError, tetrahedron_volume6};

/// Frustum, matrices and frustum volume for one occluder's local frame.
#[derive(Clone, Debug)]
pub struct CullView {
    frustum: Polytope,
    model_view: Mat4,
    projection: Mat4,
    inverse_projection: Mat4,
    frustum_volume: f32,
}

impl CullView {
    /// Set up a view from the occluder's model-view and the camera projection.
    ///
    /// The frustum is extracted from `projection * model_view` and so is expressed in the
    /// occluder's local frame.
    pub fn new(model_view: Mat4, projection: Mat4) -> Result<Self, OccluderError> {
        let frustum_volume = frustum_volume(&projection)?;
        Ok(Self {
            frustum: Polytope::from_view_projection(&(projection * model_view)),
            model_view,
            projection,
            inverse_projection: projection.inverse(),
            frustum_volume,
        })
    }

    /// Replace the frustum, e.g. with one carrying extra culling planes.
    ///
    /// The planes must be in the occluder's local frame.
    pub fn with_frustum(mut self, frustum: Polytope) -> Self {
        self.frustum = frustum;
        self
    }

    /// Frustum planes in the occluder's local frame.
    pub fn frustum(&self) -> &Polytope {
        &self.frustum
    }

    /// Local-to-eye transform.
    pub fn model_view(&self) -> &Mat4 {
        &self.model_view
    }

    /// Eye-to-clip transform.
    pub fn projection(&self) -> &Mat4 {
        &self.projection
    }

    /// Clip-to-eye transform.
    pub fn inverse_projection(&self) -> &Mat4 {
        &self.inverse_projection
    }

    /// Volume measure of the view frustum, in the same units as occluder volumes.
    pub fn frustum_volume(&self) -> f32 {
        self.frustum_volume
    }
}

/// Volume measure of the frustum described by `projection`.
///
/// The clip-space cube is taken back to eye space and split into two triangular prisms.
/// Like occluder volumes the result is six times the true volume; only ratios matter.
pub fn frustum_volume(projection: &Mat4) -> Result<f32, OccluderError> {
    if projection.determinant() == 0.0 {
        return Err(OccluderError::SingularProjection);
    }
    let inverse = projection.inverse();
    let corner = |x: f32, y: f32, z: f32| inverse.project_point3(Vec3::new(x, y, z));
    let f1 = corner(-1.0, -1.0, -1.0);
    let f2 = corner(-1.0, 1.0, -1.0);
    let f3 = corner(1.0, 1.0, -1.0);
    let f4 = corner(1.0, -1.0, -1.0);
    let f5 = corner(-1.0, -1.0, 1.0);
    let f6 = corner(-1.0, 1.0, 1.0);
    let f7 = corner(1.0, 1.0, 1.0);
    let f8 = corner(1.0, -1.0, 1.0);
    let volume =
        prism_volume6([f1, f2, f3], [f5, f6, f7]) + prism_volume6([f1, f3, f4], [f5, f7, f8]);
    if volume.is_finite() && volume > 0.0 {
        Ok(volume)
    } else {
        Err(OccluderError::SingularProjection)
    }
}

/// Volume measure of a triangular prism from its front and back triangles.
pub(crate) fn prism_volume6(front: [Vec3; 3], back: [Vec3; 3]) -> f32 {
    let [f1, f2, f3] = front;
    let [b1, b2, b3] = back;
    tetrahedron_volume6(f1, f2, f3, b1)
        + tetrahedron_volume6(b1, b2, b3, f2)
        + tetrahedron_volume6(b1, b3, f2, f3)
}
