// Copyright 2025 the Umbral Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use criterion::{BatchSize, Criterion, Throughput, black_box, criterion_group, criterion_main};
use glam::Vec3;
use umbral_kdtree::{Geometry, KdTree, KdTreeOptions};

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

/// An `n × n` height field over `[0, n]²`, two triangles per cell.
fn gen_terrain(n: u32) -> Geometry {
    let mut rng = Rng::new(0xCAFE_F00D_DEAD_BEEF);
    let mut vertices = Vec::with_capacity(((n + 1) * (n + 1)) as usize);
    for y in 0..=n {
        for x in 0..=n {
            vertices.push(Vec3::new(x as f32, y as f32, rng.next_f32() * 4.0));
        }
    }
    let at = |x: u32, y: u32| y * (n + 1) + x;
    let mut triangles = Vec::with_capacity((2 * n * n) as usize);
    for y in 0..n {
        for x in 0..n {
            triangles.push([at(x, y), at(x + 1, y), at(x + 1, y + 1)]);
            triangles.push([at(x, y), at(x + 1, y + 1), at(x, y + 1)]);
        }
    }
    Geometry::from_triangles(vertices, &triangles)
}

/// Vertical probe segments scattered over the terrain.
fn gen_probes(n: u32, count: usize) -> Vec<(Vec3, Vec3)> {
    let mut rng = Rng::new(0xBADC_F00D_1234_5678);
    (0..count)
        .map(|_| {
            let x = rng.next_f32() * n as f32;
            let y = rng.next_f32() * n as f32;
            (Vec3::new(x, y, 10.0), Vec3::new(x, y, -10.0))
        })
        .collect()
}

fn bench_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("kdtree_build");
    for &n in &[32u32, 64, 128] {
        let terrain = gen_terrain(n);
        group.throughput(Throughput::Elements(u64::from(2 * n * n)));
        group.bench_function(format!("terrain_n{}", n), |b| {
            b.iter_batched(
                KdTreeOptions::default,
                |options| {
                    let tree = KdTree::build(&options, &terrain).unwrap();
                    black_box(tree.leaves().len());
                },
                BatchSize::SmallInput,
            )
        });
    }
    group.finish();
}

fn bench_intersect(c: &mut Criterion) {
    let mut group = c.benchmark_group("segment_intersect");
    let n = 64;
    let mut terrain = gen_terrain(n);
    let probes = gen_probes(n, 1024);
    group.throughput(Throughput::Elements(probes.len() as u64));

    group.bench_function("brute_force", |b| {
        b.iter(|| {
            let hits: usize = probes
                .iter()
                .map(|&(s, e)| terrain.intersect_segment(s, e).len())
                .sum();
            black_box(hits);
        })
    });

    let tree = KdTree::build(&KdTreeOptions::default(), &terrain).unwrap();
    terrain.set_shape(umbral_kdtree::Shape::KdTree(tree.into()));
    group.bench_function("kdtree", |b| {
        b.iter(|| {
            let hits: usize = probes
                .iter()
                .map(|&(s, e)| terrain.intersect_segment(s, e).len())
                .sum();
            black_box(hits);
        })
    });
    group.finish();
}

criterion_group!(benches, bench_build, bench_intersect);
criterion_main!(benches);
