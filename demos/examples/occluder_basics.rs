// Copyright 2025 the Umbral Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Occluder basics.
//!
//! Compute shadow volumes for a wall with a window and a smaller wall behind it, rank them,
//! and cull a few spheres.
//!
//! Run:
//! - `cargo run -p umbral_demos --example occluder_basics`

use glam::{Mat4, Vec3};
use umbral_geom::BoundingSphere;
use umbral_occluder::{ConvexPlanarOccluder, CullView, OccluderSet, ShadowVolumeOccluder};

fn quad(center: Vec3, half: f32) -> Vec<Vec3> {
    vec![
        center + Vec3::new(-half, -half, 0.0),
        center + Vec3::new(half, -half, 0.0),
        center + Vec3::new(half, half, 0.0),
        center + Vec3::new(-half, half, 0.0),
    ]
}

fn main() {
    let projection = Mat4::perspective_rh_gl(std::f32::consts::FRAC_PI_2, 1.0, 1.0, 100.0);
    // The walls are modelled around their own origin, 5 units in front of the eye.
    let model_view = Mat4::from_translation(Vec3::new(0.0, 0.0, -5.0));
    let view = CullView::new(model_view, projection).expect("invertible projection");

    let wall = ConvexPlanarOccluder::new(quad(Vec3::ZERO, 2.0)).with_hole(quad(Vec3::ZERO, 0.5));
    let hidden_wall = ConvexPlanarOccluder::new(quad(Vec3::new(2.5, 2.5, -5.0), 1.0));

    let mut set = OccluderSet::default();
    for (id, occluder) in [wall, hidden_wall].iter().enumerate() {
        match ShadowVolumeOccluder::compute(vec![id], occluder, &view) {
            Ok(occ) => {
                println!(
                    "occluder {id}: volume {:.4}, {} planes, {} holes",
                    occ.volume(),
                    occ.occluder_volume().len(),
                    occ.holes().len()
                );
                set.insert(occ);
            }
            Err(err) => println!("occluder {id}: {err}"),
        }
    }
    set.finalize();
    println!("{} occluder(s) active after ranking", set.len());

    // Eye-space spheres.
    let spheres = [
        ("behind the wall", BoundingSphere::new(Vec3::new(5.0, 5.0, -20.0), 0.5)),
        ("behind the window", BoundingSphere::new(Vec3::new(0.0, 0.0, -20.0), 0.5)),
        ("in front of the wall", BoundingSphere::new(Vec3::new(0.0, 0.0, -3.0), 0.5)),
        ("off to the side", BoundingSphere::new(Vec3::new(12.0, 0.0, -20.0), 0.5)),
    ];
    for (name, sphere) in &spheres {
        let verdict = if set.is_occluded_sphere(sphere) {
            "culled"
        } else {
            "drawn"
        };
        println!("{name}: {verdict}");
    }
}
