use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use treescan_core::PointCloud;
use treescan_morphology::{estimate_path_length, extract_trunk, TrunkParams};

/// A noisy vertical cylinder with a flared canopy above `split_height`,
/// roughly the shape the trunk extractor sees in practice.
fn synthetic_tree(n: usize, seed: u64) -> PointCloud {
    let mut rng = StdRng::seed_from_u64(seed);
    let split_height = 2.0f32;
    let mut x = Vec::with_capacity(n);
    let mut y = Vec::with_capacity(n);
    let mut z = Vec::with_capacity(n);
    for _ in 0..n {
        let h = rng.gen_range(0.0f32..3.0);
        let radius = if h < split_height {
            0.1
        } else {
            0.1 + (h - split_height) * 1.5
        };
        let angle = rng.gen_range(0.0f32..std::f32::consts::TAU);
        x.push(radius * angle.cos());
        y.push(radius * angle.sin());
        z.push(h);
    }
    PointCloud::from_xyz(x, y, z)
}

fn bench_extract_trunk(c: &mut Criterion) {
    let mut group = c.benchmark_group("extract_trunk");
    for size in [10_000, 100_000] {
        let cloud = synthetic_tree(size, 42);
        group.bench_with_input(BenchmarkId::from_parameter(size), &cloud, |b, cloud| {
            b.iter(|| extract_trunk(cloud, &TrunkParams::default()))
        });
    }
    group.finish();
}

fn bench_path_length(c: &mut Criterion) {
    let mut group = c.benchmark_group("estimate_path_length");
    for size in [500, 2_000] {
        let mut rng = StdRng::seed_from_u64(7);
        let points: Vec<[f32; 3]> = (0..size)
            .map(|_| {
                [
                    rng.gen_range(0.0f32..1.0),
                    rng.gen_range(0.0f32..1.0),
                    rng.gen_range(0.0f32..5.0),
                ]
            })
            .collect();
        group.bench_with_input(BenchmarkId::from_parameter(size), &points, |b, points| {
            b.iter(|| estimate_path_length(points.clone()))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_extract_trunk, bench_path_length);
criterion_main!(benches);
