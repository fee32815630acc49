use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use treescan_core::PointCloud;
use treescan_filters::{extract_new_growth, statistical_outlier_removal, voxel_downsample};

fn random_cloud(n: usize, seed: u64) -> PointCloud {
    let mut rng = StdRng::seed_from_u64(seed);
    let x: Vec<f32> = (0..n).map(|_| rng.gen_range(0.0f32..10.0)).collect();
    let y: Vec<f32> = (0..n).map(|_| rng.gen_range(0.0f32..10.0)).collect();
    let z: Vec<f32> = (0..n).map(|_| rng.gen_range(0.0f32..10.0)).collect();
    PointCloud::from_xyz(x, y, z)
}

fn bench_voxel_downsample(c: &mut Criterion) {
    let mut group = c.benchmark_group("voxel_downsample");
    for size in [10_000, 100_000] {
        let cloud = random_cloud(size, 42);
        group.bench_with_input(BenchmarkId::from_parameter(size), &cloud, |b, cloud| {
            b.iter(|| voxel_downsample(cloud, 0.1))
        });
    }
    group.finish();
}

fn bench_statistical_outlier(c: &mut Criterion) {
    let mut group = c.benchmark_group("statistical_outlier_removal");
    for size in [10_000, 50_000] {
        let cloud = random_cloud(size, 7);
        group.bench_with_input(BenchmarkId::from_parameter(size), &cloud, |b, cloud| {
            b.iter(|| statistical_outlier_removal(cloud, 20, 2.0))
        });
    }
    group.finish();
}

fn bench_growth_filter(c: &mut Criterion) {
    let mut group = c.benchmark_group("extract_new_growth");
    for size in [10_000, 50_000] {
        let reference = random_cloud(size, 1);
        let later = random_cloud(size, 2);
        group.bench_with_input(
            BenchmarkId::from_parameter(size),
            &(reference, later),
            |b, (reference, later)| b.iter(|| extract_new_growth(reference, later, 4, 0.018)),
        );
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_voxel_downsample,
    bench_statistical_outlier,
    bench_growth_filter
);
criterion_main!(benches);
