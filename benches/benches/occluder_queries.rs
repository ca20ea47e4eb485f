// Copyright 2025 the Umbral Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use criterion::{Criterion, Throughput, black_box, criterion_group, criterion_main};
use glam::{Mat4, Vec3};
use umbral_geom::BoundingSphere;
use umbral_occluder::{
    ConvexPlanarOccluder, CullView, OccluderSet, ShadowVolumeOccluder,
};

#[derive(Clone)]
struct Rng(u64);

impl Rng {
    fn new(seed: u64) -> Self {
        Self(seed)
    }
    fn next_u64(&mut self) -> u64 {
        let mut x = self.0;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.0 = x;
        x
    }
    fn next_f32(&mut self) -> f32 {
        let v = self.next_u64() >> 40;
        v as f32 / (1u64 << 24) as f32
    }
}

fn view() -> CullView {
    let projection = Mat4::perspective_rh_gl(std::f32::consts::FRAC_PI_2, 1.0, 1.0, 100.0);
    CullView::new(Mat4::IDENTITY, projection).unwrap()
}

/// A row of walls at increasing depth, each with a window.
fn gen_walls(count: usize) -> Vec<ConvexPlanarOccluder> {
    (0..count)
        .map(|i| {
            let z = -5.0 - i as f32 * 3.0;
            let x = (i as f32 - count as f32 * 0.5) * 2.5;
            let quad = |cx: f32, half: f32| {
                vec![
                    Vec3::new(cx - half, -half, z),
                    Vec3::new(cx + half, -half, z),
                    Vec3::new(cx + half, half, z),
                    Vec3::new(cx - half, half, z),
                ]
            };
            ConvexPlanarOccluder::new(quad(x, 2.0)).with_hole(quad(x, 0.5))
        })
        .collect()
}

fn gen_spheres(count: usize) -> Vec<BoundingSphere> {
    let mut rng = Rng::new(0xC1A5_7E55_9999_ABCD);
    (0..count)
        .map(|_| {
            let center = Vec3::new(
                (rng.next_f32() - 0.5) * 60.0,
                (rng.next_f32() - 0.5) * 60.0,
                -20.0 - rng.next_f32() * 70.0,
            );
            BoundingSphere::new(center, 0.5 + rng.next_f32())
        })
        .collect()
}

fn bench_compute(c: &mut Criterion) {
    let view = view();
    let walls = gen_walls(16);
    let mut group = c.benchmark_group("occluder_compute");
    group.throughput(Throughput::Elements(walls.len() as u64));
    group.bench_function("walls_with_holes", |b| {
        b.iter(|| {
            let mut set = OccluderSet::default();
            for (i, wall) in walls.iter().enumerate() {
                if let Ok(occ) = ShadowVolumeOccluder::compute(vec![i], wall, &view) {
                    set.insert(occ);
                }
            }
            set.finalize();
            black_box(set.len());
        })
    });
    group.finish();
}

fn bench_queries(c: &mut Criterion) {
    let view = view();
    let mut set = OccluderSet::default();
    for (i, wall) in gen_walls(16).iter().enumerate() {
        if let Ok(occ) = ShadowVolumeOccluder::compute(vec![i], wall, &view) {
            set.insert(occ);
        }
    }
    set.finalize();
    let spheres = gen_spheres(4096);

    let mut group = c.benchmark_group("occluder_queries");
    group.throughput(Throughput::Elements(spheres.len() as u64));
    group.bench_function("is_occluded_sphere", |b| {
        b.iter(|| {
            let hidden = spheres.iter().filter(|s| set.is_occluded_sphere(s)).count();
            black_box(hidden);
        })
    });
    group.finish();
}

criterion_group!(benches, bench_compute, bench_queries);
criterion_main!(benches);
