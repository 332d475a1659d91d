//! Broadphase benchmarks (criterion - wall-clock time).
//!
//! Run all:    cargo bench --bench bvh_bench
//! Filter:     cargo bench --bench bvh_bench -- rebuild

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use fixed_physics2d::bvh::BvhTree;
use fixed_physics2d::collide::ColliderId;
use fixed_physics2d::fixed::FixedNum;
use fixed_physics2d::geom::{Aabb, Vec2};

/// Deterministic xorshift32, so every bench run lays out the same tree.
struct Rng(u32);

impl Rng {
    fn next(&mut self) -> u32 {
        self.0 ^= self.0 << 13;
        self.0 ^= self.0 >> 17;
        self.0 ^= self.0 << 5;
        self.0
    }
}

fn scattered_bounds(rng: &mut Rng, extent: i32) -> Aabb {
    let x = FixedNum::from_int((rng.next() % (extent as u32 * 2)) as i32 - extent);
    let y = FixedNum::from_int((rng.next() % (extent as u32 * 2)) as i32 - extent);
    let half = FixedNum::ONE;
    Aabb::from_points(Vec2::new(x - half, y - half), Vec2::new(x + half, y + half))
}

fn build_tree(n: u32) -> (BvhTree, Vec<ColliderId>) {
    let mut tree = BvhTree::new(FixedNum::from_f64(0.1));
    let mut rng = Rng(0x2545F491);
    let mut ids = Vec::with_capacity(n as usize);
    for i in 0..n {
        let id = ColliderId(i + 1);
        tree.add_collider(id, scattered_bounds(&mut rng, 1000));
        ids.push(id);
    }
    (tree, ids)
}

fn bench_insertion(c: &mut Criterion) {
    let mut group = c.benchmark_group("bvh/incremental_insert");
    for &n in &[100, 500, 1000, 5000] {
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, &n| {
            b.iter(|| black_box(build_tree(n)));
        });
    }
    group.finish();
}

fn bench_rebuild(c: &mut Criterion) {
    let mut group = c.benchmark_group("bvh/rebuild");
    for &n in &[100, 500, 1000, 5000] {
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, &n| {
            b.iter_batched(
                || build_tree(n).0,
                |mut tree| tree.rebuild(),
                criterion::BatchSize::LargeInput,
            );
        });
    }
    group.finish();
}

fn bench_query_box(c: &mut Criterion) {
    let mut group = c.benchmark_group("bvh/query_box");
    for &n in &[100, 500, 1000, 5000] {
        let (mut tree, _ids) = build_tree(n);
        tree.rebuild();
        let query = Aabb::from_points(Vec2::new(FixedNum::from_int(-50), FixedNum::from_int(-50)), Vec2::new(FixedNum::from_int(50), FixedNum::from_int(50)));
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, _| {
            b.iter(|| {
                let mut hits = 0u32;
                tree.query_box(query, |id| {
                    black_box(id);
                    hits += 1;
                    false
                });
                hits
            });
        });
    }
    group.finish();
}

fn bench_query_ray(c: &mut Criterion) {
    let mut group = c.benchmark_group("bvh/query_ray");
    for &n in &[100, 500, 1000, 5000] {
        let (mut tree, _ids) = build_tree(n);
        tree.rebuild();
        let start = Vec2::new(FixedNum::from_int(-1000), FixedNum::ZERO);
        let end = Vec2::new(FixedNum::from_int(1000), FixedNum::ZERO);
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, _| {
            b.iter(|| {
                tree.query_ray(start, end, |id| {
                    black_box(id);
                    FixedNum::MAX
                });
            });
        });
    }
    group.finish();
}

fn bench_update_collider(c: &mut Criterion) {
    let mut group = c.benchmark_group("bvh/update_collider");
    for &n in &[100, 1000, 5000] {
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, &n| {
            b.iter_batched(
                || build_tree(n),
                |(mut tree, ids)| {
                    for id in &ids {
                        let bounds = Aabb::from_points(Vec2::new(FixedNum::from_int(2), FixedNum::from_int(2)), Vec2::new(FixedNum::from_int(4), FixedNum::from_int(4)));
                        tree.update_collider(*id, bounds);
                    }
                },
                criterion::BatchSize::LargeInput,
            );
        });
    }
    group.finish();
}

criterion_group!(benches, bench_insertion, bench_rebuild, bench_query_box, bench_query_ray, bench_update_collider);
criterion_main!(benches);
