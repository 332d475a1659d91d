//! Narrow-phase benchmarks (criterion - wall-clock time).
//!
//! Run all:    cargo bench --bench gjk_bench
//! Filter:     cargo bench --bench gjk_bench -- polygon

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use fixed_physics2d::collide::circle::CircleShape;
use fixed_physics2d::collide::gjk;
use fixed_physics2d::collide::polygon::PolygonShape;
use fixed_physics2d::fixed::FixedNum;
use fixed_physics2d::geom::{Mat2D, Vec2, Vec3};

fn polygon_at(half_extent: i32, offset_x: i32) -> PolygonShape {
    let mut shape = PolygonShape::rectangle(FixedNum::from_int(half_extent * 2), FixedNum::from_int(half_extent * 2));
    let transform = Mat2D::from_pose(Vec2::new(FixedNum::from_int(offset_x), FixedNum::ZERO), FixedNum::ZERO, FixedNum::ONE);
    shape.update_transform(transform);
    shape
}

fn circle_at(radius: i32, offset_x: i32) -> CircleShape {
    let mut shape = CircleShape::new(FixedNum::from_int(radius), Vec3::ZERO);
    let transform = Mat2D::from_pose(Vec2::new(FixedNum::from_int(offset_x), FixedNum::ZERO), FixedNum::ZERO, FixedNum::ONE);
    shape.update_transform(transform);
    shape
}

fn bench_polygon_vs_polygon(c: &mut Criterion) {
    let mut group = c.benchmark_group("gjk/polygon_polygon");

    let a = fixed_physics2d::collide::ColliderShape::Polygon(polygon_at(1, 0));
    let b_hit = fixed_physics2d::collide::ColliderShape::Polygon(polygon_at(1, 1));
    group.bench_function("overlapping", |b| {
        b.iter(|| black_box(gjk::query_collision(&a, &b_hit)));
    });

    let b_miss = fixed_physics2d::collide::ColliderShape::Polygon(polygon_at(1, 10));
    group.bench_function("separated", |b| {
        b.iter(|| black_box(gjk::query_collision(&a, &b_miss)));
    });

    group.finish();
}

fn bench_polygon_vertex_count(c: &mut Criterion) {
    let mut group = c.benchmark_group("gjk/vertex_count");
    for &half_extent in &[1, 4, 16, 64] {
        let a = fixed_physics2d::collide::ColliderShape::Polygon(polygon_at(half_extent, 0));
        let b = fixed_physics2d::collide::ColliderShape::Polygon(polygon_at(half_extent, half_extent));
        group.bench_with_input(BenchmarkId::from_parameter(half_extent), &half_extent, |bencher, _| {
            bencher.iter(|| black_box(gjk::query_collision(&a, &b)));
        });
    }
    group.finish();
}

fn bench_closest_points(c: &mut Criterion) {
    let mut group = c.benchmark_group("gjk/closest_points");
    let a = fixed_physics2d::collide::ColliderShape::Polygon(polygon_at(1, 0));
    let b = fixed_physics2d::collide::ColliderShape::Polygon(polygon_at(1, 5));
    group.bench_function("disjoint_polygons", |bencher| {
        bencher.iter(|| black_box(gjk::closest_points(&a, &b)));
    });
    group.finish();
}

fn bench_batch(c: &mut Criterion) {
    let mut group = c.benchmark_group("gjk/batch");
    for &n in &[100, 500, 1000] {
        let pairs: Vec<_> = (0..n)
            .map(|i| {
                let x = i * 3;
                (
                    fixed_physics2d::collide::ColliderShape::Circle(circle_at(1, x)),
                    fixed_physics2d::collide::ColliderShape::Circle(circle_at(1, x + 1)),
                )
            })
            .collect();
        group.bench_with_input(BenchmarkId::from_parameter(n), &pairs, |bencher, pairs| {
            bencher.iter(|| {
                for (a, b) in pairs {
                    black_box(gjk::query_collision(a, b));
                }
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_polygon_vs_polygon, bench_polygon_vertex_count, bench_closest_points, bench_batch);
criterion_main!(benches);
