// Copyright 2025 the Umbral Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Convex polygon clipping against plane lists, tracking which planes produced each vertex.
//!
//! Each pass is Sutherland–Hodgman over a closed loop. Clip plane `i` owns bit `i` of a
//! [`PlaneMask`]. Input vertices carry an empty mask; a vertex synthesized on an edge takes
//! the bits its two parents share plus the current plane's bit. An edge whose endpoints share
//! a bit therefore lies in that clip plane, which lets callers tell edges introduced by
//! clipping apart from edges of the original polygon.

use alloc::vec::Vec;
use glam::Vec3;

use crate::plane::Plane;
use crate::polytope::{MAX_PLANES, PlaneMask, TooManyPlanes};

/// A polygon vertex tagged with the clip planes that created it.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ClipPoint {
    /// Clip planes whose intersection produced this vertex; empty for input vertices.
    pub mask: PlaneMask,
    /// Vertex position.
    pub position: Vec3,
}

impl ClipPoint {
    /// An input vertex with an empty mask.
    pub fn new(position: Vec3) -> Self {
        Self {
            mask: PlaneMask::empty(),
            position,
        }
    }
}

/// Wrap plain vertices as untagged clip points.
pub fn points_from_vertices(vertices: &[Vec3]) -> Vec<ClipPoint> {
    vertices.iter().copied().map(ClipPoint::new).collect()
}

/// Strip the masks from clip points.
pub fn vertices_from_points(points: &[ClipPoint]) -> Vec<Vec3> {
    points.iter().map(|p| p.position).collect()
}

/// Clip a closed loop to the positive half-space of `plane`, writing the result to `out`.
///
/// Vertices at distance `>= 0` are kept, so vertices lying on the plane are not duplicated.
/// Returns the number of output vertices.
pub fn clip_to_plane(
    plane: &Plane,
    input: &[ClipPoint],
    plane_bit: PlaneMask,
    out: &mut Vec<ClipPoint>,
) -> usize {
    out.clear();
    let n = input.len();
    if n == 0 {
        return 0;
    }
    let distances: Vec<f32> = input.iter().map(|p| plane.distance(p.position)).collect();
    for i in 0..n {
        let j = (i + 1) % n;
        let (di, dj) = (distances[i], distances[j]);
        if di >= 0.0 {
            out.push(input[i]);
            if dj < 0.0 {
                out.push(crossing(&input[i], &input[j], di, dj, plane_bit));
            }
        } else if dj > 0.0 {
            out.push(crossing(&input[i], &input[j], di, dj, plane_bit));
        }
    }
    out.len()
}

/// Clip a polygon to the convex region bounded by `planes`.
///
/// Plane `i` tags synthesized vertices with bit `i`. Clipping stops as soon as a pass
/// leaves fewer than three vertices; callers treat such a result as fully clipped.
pub fn clip(planes: &[Plane], vertices: &[Vec3]) -> Result<Vec<ClipPoint>, TooManyPlanes> {
    clip_points(planes, points_from_vertices(vertices))
}

/// Like [`clip`], but starts from already-tagged points so masks from an earlier clip survive.
pub fn clip_points(
    planes: &[Plane],
    mut points: Vec<ClipPoint>,
) -> Result<Vec<ClipPoint>, TooManyPlanes> {
    if planes.len() > MAX_PLANES {
        return Err(TooManyPlanes {
            count: planes.len(),
        });
    }
    let mut scratch = Vec::with_capacity(points.len() + planes.len());
    for (i, plane) in planes.iter().enumerate() {
        if clip_to_plane(plane, &points, PlaneMask::plane(i), &mut scratch) < 3 {
            return Ok(scratch);
        }
        core::mem::swap(&mut points, &mut scratch);
    }
    Ok(points)
}

fn crossing(a: &ClipPoint, b: &ClipPoint, da: f32, db: f32, plane_bit: PlaneMask) -> ClipPoint {
    let r = db / (db - da);
    ClipPoint {
        mask: (a.mask & b.mask) | plane_bit,
        position: a.position * r + b.position * (1.0 - r),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bounds::BoundingBox;
    use crate::polytope::Polytope;
    use alloc::vec;

    fn square(half: f32, z: f32) -> Vec<Vec3> {
        vec![
            Vec3::new(-half, -half, z),
            Vec3::new(half, -half, z),
            Vec3::new(half, half, z),
            Vec3::new(-half, half, z),
        ]
    }

    fn area(points: &[ClipPoint]) -> f32 {
        // Shoelace in the xy plane.
        let n = points.len();
        let mut twice = 0.0;
        for i in 0..n {
            let a = points[i].position;
            let b = points[(i + 1) % n].position;
            twice += a.x * b.y - b.x * a.y;
        }
        twice.abs() * 0.5
    }

    fn unit_box_planes() -> Vec<Plane> {
        Polytope::from_bounding_box(&BoundingBox::new(Vec3::splat(-1.0), Vec3::splat(1.0)))
            .planes()
            .to_vec()
    }

    #[test]
    fn inside_polygon_is_unchanged() {
        let poly = square(0.5, 0.0);
        let out = clip(&unit_box_planes(), &poly).unwrap();
        assert_eq!(vertices_from_points(&out), poly);
        assert!(out.iter().all(|p| p.mask.is_empty()), "no vertex was synthesized");
    }

    #[test]
    fn vertices_on_the_plane_are_kept_once() {
        let poly = square(1.0, 0.0);
        let out = clip(&unit_box_planes(), &poly).unwrap();
        assert_eq!(out.len(), 4);
        assert_eq!(vertices_from_points(&out), poly);
    }

    #[test]
    fn half_plane_clip_tags_new_vertices() {
        let poly = square(1.0, 0.0);
        let plane = Plane::new(1.0, 0.0, 0.0, 0.0); // keep x >= 0
        let mut out = Vec::new();
        let n = clip_to_plane(&plane, &points_from_vertices(&poly), PlaneMask::plane(3), &mut out);
        assert_eq!(n, 4);
        let tagged: Vec<_> = out.iter().filter(|p| !p.mask.is_empty()).collect();
        assert_eq!(tagged.len(), 2);
        for p in tagged {
            assert_eq!(p.mask, PlaneMask::plane(3));
            assert!(p.position.x.abs() < 1e-6, "new vertex lies on the clip plane");
        }
        assert!((area(&out) - 2.0).abs() < 1e-5);
    }

    #[test]
    fn corner_vertex_shares_both_plane_bits_with_neighbours() {
        // Clip a large square to the unit box: every output vertex is synthesized.
        let poly = square(3.0, 0.0);
        let out = clip(&unit_box_planes(), &poly).unwrap();
        assert_eq!(out.len(), 4);
        assert!((area(&out) - 4.0).abs() < 1e-4);
        for i in 0..out.len() {
            let a = out[i].mask;
            let b = out[(i + 1) % out.len()].mask;
            assert!(!(a & b).is_empty(), "each output edge lies in one clip plane");
        }
    }

    #[test]
    fn fully_outside_polygon_stops_early() {
        let poly = square(0.5, 5.0);
        let out = clip(&unit_box_planes(), &poly).unwrap();
        assert!(out.len() < 3);
    }

    #[test]
    fn clip_is_idempotent_and_shrinks() {
        let poly = vec![
            Vec3::new(-2.0, -0.5, 0.0),
            Vec3::new(0.5, -2.5, 0.0),
            Vec3::new(2.5, 0.5, 0.0),
            Vec3::new(0.0, 1.8, 0.0),
        ];
        let planes = unit_box_planes();
        let once = clip(&planes, &poly).unwrap();
        let twice = clip_points(&planes, once.clone()).unwrap();
        assert!(area(&once) <= area(&points_from_vertices(&poly)));
        // Re-clipping may split a vertex sitting a rounding error outside a plane into two
        // coincident ones, but never moves the outline.
        for b in &twice {
            assert!(
                once.iter().any(|a| (a.position - b.position).length() < 1e-4),
                "re-clipped vertex {b:?} is not on the first outline"
            );
        }
        for a in &once {
            assert!(twice.iter().any(|b| (a.position - b.position).length() < 1e-4));
        }
        assert!((area(&once) - area(&twice)).abs() < 1e-4);
    }

    #[test]
    fn too_many_planes_is_rejected() {
        let planes = vec![Plane::new(1.0, 0.0, 0.0, 1.0); MAX_PLANES + 1];
        assert_eq!(
            clip(&planes, &square(0.5, 0.0)),
            Err(TooManyPlanes { count: 33 })
        );
    }
}
