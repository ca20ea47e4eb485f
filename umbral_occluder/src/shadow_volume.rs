// Copyright 2025 the Umbral Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Shadow-volume occluders.
//!
//! An occluder polygon is clipped to the view frustum and then swept away from the eye
//! to the far plane. The resulting prism is bounded by a front plane through the polygon
//! and one side plane per original polygon edge; edges introduced by frustum clipping
//! get no side plane, since the frustum already bounds them. Everything strictly inside
//! the prism is hidden.
//!
//! All planes are built in eye space. Use [`ShadowVolumeOccluder::transform_provide_inverse`]
//! to move an occluder into the frame of the bounds being tested.

use alloc::vec::Vec;
use glam::{Mat4, Vec3};
use umbral_geom::clip::{self, ClipPoint};
use umbral_geom::{BoundingBox, BoundingSphere, MaskStack, Plane, Polytope, TooManyPlanes};

use crate::polygon::ConvexPlanarOccluder;
use crate::view::{CullView, prism_volume6};

/// Why an occluder could not be computed.
#[derive(Copy, Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum OccluderError {
    /// The occluder outline has fewer than three vertices or no well-defined plane.
    #[error("occluder polygon is degenerate")]
    DegeneratePolygon,
    /// Nothing of the occluder survives clipping to the view frustum.
    #[error("occluder lies outside the view frustum")]
    OutsideFrustum,
    /// The frustum or the shadow volume needs more planes than a mask can address.
    #[error(transparent)]
    TooManyPlanes(#[from] TooManyPlanes),
    /// The projection matrix has no inverse, or describes an empty frustum.
    #[error("projection matrix is singular")]
    SingularProjection,
}

/// Six times the volume of the tetrahedron `a b c d`.
pub(crate) fn tetrahedron_volume6(a: Vec3, b: Vec3, c: Vec3, d: Vec3) -> f32 {
    (b - c).cross(a - b).dot(d - b).abs()
}

/// A polygon clipped to the frustum, with its eye-space copies on the polygon plane and
/// on the far plane.
struct Shadow {
    masks: Vec<ClipPoint>,
    near: Vec<Vec3>,
    far: Vec<Vec3>,
}

impl Shadow {
    /// Clip and project `vertices`. `None` when the clip leaves fewer than three vertices.
    fn cast(vertices: &[Vec3], view: &CullView) -> Result<Option<Self>, TooManyPlanes> {
        let clipped = clip::clip(view.frustum().planes(), vertices)?;
        if clipped.len() < 3 {
            return Ok(None);
        }
        let model_view = view.model_view();
        let to_clip = *view.projection() * *model_view;
        let far = clipped
            .iter()
            .map(|p| {
                let mut ndc = to_clip.project_point3(p.position);
                ndc.z = 1.0;
                view.inverse_projection().project_point3(ndc)
            })
            .collect();
        let near = clipped
            .iter()
            .map(|p| model_view.transform_point3(p.position))
            .collect();
        Ok(Some(Self {
            masks: clipped,
            near,
            far,
        }))
    }

    fn front_plane(&self) -> Plane {
        Plane::from_points(self.near[2], self.near[1], self.near[0])
    }

    /// Add a side plane for every edge not introduced by the frustum clip.
    fn add_side_planes(&self, polytope: &mut Polytope) -> Result<(), TooManyPlanes> {
        let n = self.near.len();
        for i in 0..n {
            let j = (i + 1) % n;
            if (self.masks[i].mask & self.masks[j].mask).is_empty() {
                polytope.add(Plane::from_points(self.near[i], self.near[j], self.far[i]))?;
            }
        }
        Ok(())
    }

    /// Volume measure of the prism between the near and far polygons.
    fn volume(&self) -> f32 {
        let (near, far) = (&self.near, &self.far);
        (1..near.len() - 1)
            .map(|i| {
                prism_volume6(
                    [near[0], near[i], near[i + 1]],
                    [far[0], far[i], far[i + 1]],
                )
            })
            .sum()
    }
}

/// Per-traversal coherence state for one [`ShadowVolumeOccluder`].
///
/// Holds one [`MaskStack`] for the occluder volume and one per hole. Push before
/// descending into children and pop on the way back up.
#[derive(Clone, Debug)]
pub struct OccluderCullState {
    volume: MaskStack,
    holes: Vec<MaskStack>,
}

impl OccluderCullState {
    /// Push the last query's results on every stack.
    pub fn push_current_mask(&mut self) {
        self.volume.push_current_mask();
        self.holes.iter_mut().for_each(MaskStack::push_current_mask);
    }

    /// Pop every stack.
    pub fn pop_current_mask(&mut self) {
        self.volume.pop_current_mask();
        self.holes.iter_mut().for_each(MaskStack::pop_current_mask);
    }

    /// The occluder volume's stack.
    pub fn volume_masks(&self) -> &MaskStack {
        &self.volume
    }
}

/// A computed shadow volume with its holes.
#[derive(Clone, Debug, PartialEq)]
pub struct ShadowVolumeOccluder {
    node_path: Vec<usize>,
    projection: Mat4,
    volume: f32,
    occluder_volume: Polytope,
    holes: Vec<Polytope>,
}

impl ShadowVolumeOccluder {
    /// Build the shadow volume of `occluder` for `view`.
    ///
    /// `node_path` identifies the occluder's position in the caller's scene and is kept
    /// only for bookkeeping. Holes that fall entirely outside the frustum are dropped.
    pub fn compute(
        node_path: Vec<usize>,
        occluder: &ConvexPlanarOccluder,
        view: &CullView,
    ) -> Result<Self, OccluderError> {
        let outline = occluder.occluder().vertices();
        if outline.len() < 3 {
            return Err(OccluderError::DegeneratePolygon);
        }
        let Some(shadow) = Shadow::cast(outline, view)? else {
            log::trace!("occluder {node_path:?} is outside the frustum");
            return Err(OccluderError::OutsideFrustum);
        };

        let front = shadow.front_plane();
        if !front.is_valid() {
            return Err(OccluderError::DegeneratePolygon);
        }
        let mut occluder_volume = Polytope::new();
        occluder_volume.add(front)?;
        shadow.add_side_planes(&mut occluder_volume)?;
        // The eye must be on the outside of the front plane.
        if front.d() > 0.0 {
            occluder_volume.flip();
        }
        let mut volume = shadow.volume() / view.frustum_volume();

        let mut holes = Vec::with_capacity(occluder.holes().len());
        for hole in occluder.holes() {
            if hole.len() < 3 {
                log::trace!("skipping hole with {} vertices", hole.len());
                continue;
            }
            let Some(hole_shadow) = Shadow::cast(hole.vertices(), view)? else {
                log::trace!("hole of occluder {node_path:?} is outside the frustum");
                continue;
            };
            let mut polytope = Polytope::new();
            hole_shadow.add_side_planes(&mut polytope)?;
            if hole_shadow.front_plane().d() > 0.0 {
                polytope.flip();
            }
            volume -= hole_shadow.volume() / view.frustum_volume();
            polytope.set_reference_vertices(hole_shadow.near);
            holes.push(polytope);
        }

        occluder_volume.set_reference_vertices(shadow.near);
        Ok(Self {
            node_path,
            projection: *view.projection(),
            volume,
            occluder_volume,
            holes,
        })
    }

    /// Scene path of the occluder this volume was built from.
    pub fn node_path(&self) -> &[usize] {
        &self.node_path
    }

    /// Fraction of the view frustum hidden by the occluder, less its holes.
    pub fn volume(&self) -> f32 {
        self.volume
    }

    /// The prism behind the occluder.
    pub fn occluder_volume(&self) -> &Polytope {
        &self.occluder_volume
    }

    /// The see-through prisms behind each hole.
    pub fn holes(&self) -> &[Polytope] {
        &self.holes
    }

    /// Keep only the holes `keep` accepts, returning how many were dropped.
    pub(crate) fn retain_holes(&mut self, mut keep: impl FnMut(&Polytope) -> bool) -> usize {
        let before = self.holes.len();
        self.holes.retain(|hole| keep(hole));
        before - self.holes.len()
    }

    /// Projection the volume was computed with.
    pub fn projection(&self) -> &Mat4 {
        &self.projection
    }

    /// True if the volume was computed with `projection`.
    pub fn matches_projection(&self, projection: &Mat4) -> bool {
        self.projection == *projection
    }

    /// Move the volume and holes into another frame, given the inverse of the point transform.
    ///
    /// To test bounds given in an object's local frame, pass that object's model-view.
    pub fn transform_provide_inverse(&mut self, inverse: &Mat4) {
        self.occluder_volume.transform_provide_inverse(inverse);
        for hole in &mut self.holes {
            hole.transform_provide_inverse(inverse);
        }
    }

    /// Fresh coherence state selecting every plane.
    pub fn cull_state(&self) -> OccluderCullState {
        OccluderCullState {
            volume: self.occluder_volume.mask_stack(),
            holes: self.holes.iter().map(Polytope::mask_stack).collect(),
        }
    }

    /// True if every point is hidden.
    ///
    /// The points are also treated as a polygon: if any of it shows through a hole,
    /// they are not hidden.
    pub fn contains_points(&self, points: &[Vec3]) -> bool {
        self.contains_points_with(points, &mut self.cull_state())
    }

    /// [`Self::contains_points`] using and updating `state`.
    pub fn contains_points_with(&self, points: &[Vec3], state: &mut OccluderCullState) -> bool {
        if !self
            .occluder_volume
            .contains_all_of_points(points, &mut state.volume)
        {
            return false;
        }
        for hole in &self.holes {
            if points.iter().any(|&p| hole.contains_point(p)) {
                return false;
            }
            if points.len() >= 3
                && clip::clip(hole.planes(), points).map_or(true, |seen| seen.len() >= 3)
            {
                return false;
            }
        }
        true
    }

    /// True if the sphere is hidden.
    ///
    /// A sphere touching any hole counts as visible.
    pub fn contains_sphere(&self, sphere: &BoundingSphere) -> bool {
        self.contains_sphere_with(sphere, &mut self.cull_state())
    }

    /// [`Self::contains_sphere`] using and updating `state`.
    pub fn contains_sphere_with(
        &self,
        sphere: &BoundingSphere,
        state: &mut OccluderCullState,
    ) -> bool {
        if !self
            .occluder_volume
            .contains_all_of_sphere(sphere, &mut state.volume)
        {
            return false;
        }
        self.visible_through_no_hole(state, |hole, masks| hole.contains_sphere(sphere, masks))
    }

    /// True if the box is hidden.
    ///
    /// A box touching any hole counts as visible.
    pub fn contains_box(&self, bb: &BoundingBox) -> bool {
        self.contains_box_with(bb, &mut self.cull_state())
    }

    /// [`Self::contains_box`] using and updating `state`.
    pub fn contains_box_with(&self, bb: &BoundingBox, state: &mut OccluderCullState) -> bool {
        if !self
            .occluder_volume
            .contains_all_of_box(bb, &mut state.volume)
        {
            return false;
        }
        self.visible_through_no_hole(state, |hole, masks| hole.contains_box(bb, masks))
    }

    fn visible_through_no_hole(
        &self,
        state: &mut OccluderCullState,
        touches: impl Fn(&Polytope, &mut MaskStack) -> bool,
    ) -> bool {
        if state.holes.len() < self.holes.len() {
            state
                .holes
                .extend(self.holes[state.holes.len()..].iter().map(Polytope::mask_stack));
        }
        !self
            .holes
            .iter()
            .zip(&mut state.holes)
            .any(|(hole, masks)| touches(hole, masks))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;
    use core::f32::consts::FRAC_PI_2;

    fn view() -> CullView {
        let proj = Mat4::perspective_rh_gl(FRAC_PI_2, 1.0, 1.0, 100.0);
        CullView::new(Mat4::IDENTITY, proj).unwrap()
    }

    fn square(half: f32, z: f32) -> Vec<Vec3> {
        vec![
            Vec3::new(-half, -half, z),
            Vec3::new(half, -half, z),
            Vec3::new(half, half, z),
            Vec3::new(-half, half, z),
        ]
    }

    fn reversed(mut v: Vec<Vec3>) -> Vec<Vec3> {
        v.reverse();
        v
    }

    #[test]
    fn front_plane_faces_the_eye_for_either_winding() {
        for outline in [square(1.0, -5.0), reversed(square(1.0, -5.0))] {
            let occ = ShadowVolumeOccluder::compute(
                vec![7],
                &ConvexPlanarOccluder::new(outline),
                &view(),
            )
            .unwrap();
            let planes = occ.occluder_volume().planes();
            assert_eq!(planes.len(), 5, "front plus four sides");
            assert!(planes[0].d() <= 0.0, "eye is outside the front plane");
            assert!(
                planes.iter().all(|p| p.distance(Vec3::new(0.0, 0.0, -10.0)) > 0.0),
                "the point straight behind the occluder is inside every plane"
            );
            assert_eq!(occ.node_path(), &[7]);
            assert_eq!(occ.occluder_volume().reference_vertices().len(), 4);
        }
    }

    #[test]
    fn silhouette_is_conservative() {
        let occ = ShadowVolumeOccluder::compute(
            Vec::new(),
            &ConvexPlanarOccluder::new(square(1.0, -5.0)),
            &view(),
        )
        .unwrap();
        // At twice the distance the shadow spans [-2, 2].
        assert!(occ.contains_points(&[Vec3::new(1.9, 0.0, -10.0)]));
        assert!(!occ.contains_points(&[Vec3::new(2.1, 0.0, -10.0)]));
        assert!(!occ.contains_points(&[Vec3::new(0.0, 0.0, -3.0)]), "in front of it");
        assert!(occ.contains_sphere(&BoundingSphere::new(Vec3::new(0.0, 0.0, -10.0), 0.5)));
        assert!(!occ.contains_sphere(&BoundingSphere::new(Vec3::new(1.9, 0.0, -10.0), 0.5)));
        assert!(occ.contains_box(&BoundingBox::new(
            Vec3::new(-1.0, -1.0, -12.0),
            Vec3::new(1.0, 1.0, -10.0),
        )));
        assert!(!occ.contains_box(&BoundingBox::new(
            Vec3::new(-1.0, -1.0, -6.0),
            Vec3::new(1.0, 1.0, -4.0),
        )));
    }

    #[test]
    fn volume_is_the_hidden_fraction_of_the_frustum() {
        let occ = ShadowVolumeOccluder::compute(
            Vec::new(),
            &ConvexPlanarOccluder::new(square(1.0, -5.0)),
            &view(),
        )
        .unwrap();
        // Truncated pyramids: 95/3 (4 + 1600 + 80) over 99/3 (4 + 40000 + 400).
        assert!((occ.volume() - 0.04).abs() < 1e-3, "got {}", occ.volume());
        assert!(occ.matches_projection(view().projection()));
    }

    #[test]
    fn holes_subtract_volume_and_let_things_through() {
        let solid = ShadowVolumeOccluder::compute(
            Vec::new(),
            &ConvexPlanarOccluder::new(square(1.0, -5.0)),
            &view(),
        )
        .unwrap();
        let holed = ShadowVolumeOccluder::compute(
            Vec::new(),
            &ConvexPlanarOccluder::new(square(1.0, -5.0)).with_hole(square(0.5, -5.0)),
            &view(),
        )
        .unwrap();
        assert_eq!(holed.holes().len(), 1);
        assert_eq!(holed.holes()[0].len(), 4, "a hole has side planes only");
        let ratio = holed.volume() / solid.volume();
        assert!((ratio - 0.75).abs() < 1e-3, "hole covers a quarter: {ratio}");

        let behind_hole = Vec3::new(0.0, 0.0, -10.0);
        let behind_solid = Vec3::new(1.5, 0.0, -10.0);
        assert!(solid.contains_points(&[behind_hole]));
        assert!(!holed.contains_points(&[behind_hole]));
        assert!(holed.contains_points(&[behind_solid]));

        // A triangle straddling the hole's shadow with no vertex inside it.
        let straddling = [
            Vec3::new(-1.5, -0.2, -10.0),
            Vec3::new(1.5, -0.2, -10.0),
            Vec3::new(0.0, 1.8, -10.0),
        ];
        assert!(solid.contains_points(&straddling));
        assert!(!holed.contains_points(&straddling));

        assert!(!holed.contains_sphere(&BoundingSphere::new(behind_hole, 0.1)));
        assert!(holed.contains_sphere(&BoundingSphere::new(behind_solid, 0.1)));
    }

    #[test]
    fn off_screen_occluder_is_rejected() {
        let result = ShadowVolumeOccluder::compute(
            Vec::new(),
            &ConvexPlanarOccluder::new(square(1.0, 5.0)),
            &view(),
        );
        assert_eq!(result, Err(OccluderError::OutsideFrustum));

        let sliver = ConvexPlanarOccluder::new(vec![Vec3::ZERO, Vec3::X]);
        assert_eq!(
            ShadowVolumeOccluder::compute(Vec::new(), &sliver, &view()),
            Err(OccluderError::DegeneratePolygon)
        );
    }

    #[test]
    fn screen_filling_occluder_drops_off_screen_hole() {
        let wall = ConvexPlanarOccluder::new(square(20.0, -5.0)).with_hole(vec![
            Vec3::new(10.0, 10.0, -5.0),
            Vec3::new(12.0, 10.0, -5.0),
            Vec3::new(12.0, 12.0, -5.0),
            Vec3::new(10.0, 12.0, -5.0),
        ]);
        let occ = ShadowVolumeOccluder::compute(Vec::new(), &wall, &view()).unwrap();
        assert!(occ.holes().is_empty());
        assert_eq!(
            occ.occluder_volume().len(),
            1,
            "every edge of the clipped wall lies in a frustum plane"
        );
        assert!(occ.volume() > 0.99, "nearly the whole frustum: {}", occ.volume());
        assert!(occ.contains_points(&[Vec3::new(3.0, -2.0, -50.0)]));
    }

    #[test]
    fn moved_into_an_object_frame() {
        let mut occ = ShadowVolumeOccluder::compute(
            Vec::new(),
            &ConvexPlanarOccluder::new(square(1.0, -5.0)),
            &view(),
        )
        .unwrap();
        let model_view = Mat4::from_translation(Vec3::new(0.0, 0.0, -10.0));
        occ.transform_provide_inverse(&model_view);
        assert!(occ.contains_points(&[Vec3::ZERO]), "local origin is eye-space (0, 0, -10)");
        assert!(!occ.contains_points(&[Vec3::new(0.0, 0.0, 7.0)]));
    }

    #[test]
    fn cull_state_skips_planes_cleared_by_a_parent() {
        let occ = ShadowVolumeOccluder::compute(
            Vec::new(),
            &ConvexPlanarOccluder::new(square(1.0, -5.0)).with_hole(square(0.25, -5.0)),
            &view(),
        )
        .unwrap();
        let mut state = occ.cull_state();
        let parent = BoundingSphere::new(Vec3::new(2.0, 2.0, -20.0), 0.5);
        assert!(occ.contains_sphere_with(&parent, &mut state));
        assert!(state.volume_masks().result().is_empty(), "parent is inside every plane");

        state.push_current_mask();
        // Coherence trusts the caller: a child is assumed to lie within its parent.
        let child = BoundingSphere::new(Vec3::new(2.2, 2.1, -20.0), 0.1);
        assert!(occ.contains_sphere_with(&child, &mut state));
        state.pop_current_mask();
        assert_eq!(state.volume_masks().depth(), 1);
    }
}
