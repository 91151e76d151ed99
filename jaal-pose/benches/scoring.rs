//! Benchmark likelihood scoring.

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use jaal_pose::{Circle, OccupancyMap, Rectangle, Shape, SpiderPose, VisitedMask};

fn disc_map(size: usize) -> OccupancyMap {
    let c = size as f64 / 2.0;
    let r = size as f64 / 3.0;
    OccupancyMap::from_fn(size, size, |i, j| {
        let dx = i as f64 - c;
        let dy = j as f64 - c;
        dx * dx + dy * dy <= r * r
    }).unwrap()
}

fn bench_shapes(c: &mut Criterion) {
    let map = disc_map(200);
    let circle = Shape::Circle(Circle::new(100.0, 100.0, 12.0));
    let rect = Shape::Rectangle(Rectangle::new(100.0, 100.0, 0.7, 30.0, 8.0));

    let mut group = c.benchmark_group("shape_likelihood");
    group.bench_function("circle", |b| b.iter(|| black_box(circle.likelihood(&map))));
    group.bench_function("rectangle", |b| b.iter(|| black_box(rect.likelihood(&map))));
    group.finish();
}

fn bench_pose(c: &mut Criterion) {
    let mut group = c.benchmark_group("pose_log_likelihood");
    for size in [100usize, 200, 400] {
        let map = disc_map(size);
        let mid = size as f64 / 2.0;
        let pose = SpiderPose::new(mid, mid, 10.0, 27.0, 8.0, [0.1; 8]);
        let mut visited = VisitedMask::for_map(&map);

        group.bench_with_input(BenchmarkId::new("shared", size), &size, |b, _| {
            b.iter(|| black_box(pose.log_likelihood(&map)))
        });
        group.bench_with_input(BenchmarkId::new("exclusive", size), &size, |b, _| {
            b.iter(|| black_box(pose.log_likelihood_exclusive(&map, &mut visited)))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_shapes, bench_pose);
criterion_main!(benches);
