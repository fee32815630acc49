use hashbrown::HashMap;
use treescan_core::PointCloud;

#[derive(Default, Clone, Copy)]
struct VoxelAccum {
    sx: f32,
    sy: f32,
    sz: f32,
    n: usize,
}

/// Downsample a cloud by averaging all points falling into the same cubic
/// voxel of edge length `voxel_size`.
///
/// Dense terrestrial scans are reduced before trunk extraction and growth
/// filtering; the slicing result is unchanged but much cheaper to compute.
/// Output points are sorted by voxel key for deterministic ordering. Any
/// label column is dropped, since averaged points no longer correspond to
/// input rows.
///
/// # Panics
///
/// Panics if `voxel_size` is not finite and positive.
pub fn voxel_downsample(cloud: &PointCloud, voxel_size: f32) -> PointCloud {
    assert!(
        voxel_size.is_finite() && voxel_size > 0.0,
        "voxel_size must be > 0 and finite"
    );

    if cloud.is_empty() {
        return PointCloud::new();
    }

    let mut bins: HashMap<(i32, i32, i32), VoxelAccum> = HashMap::new();

    for p in cloud.iter_points() {
        if !p.iter().all(|v| v.is_finite()) {
            continue;
        }

        let key = (
            (p[0] / voxel_size).floor() as i32,
            (p[1] / voxel_size).floor() as i32,
            (p[2] / voxel_size).floor() as i32,
        );

        let entry = bins.entry(key).or_default();
        entry.sx += p[0];
        entry.sy += p[1];
        entry.sz += p[2];
        entry.n += 1;
    }

    if bins.is_empty() {
        return PointCloud::new();
    }

    let mut keys: Vec<(i32, i32, i32)> = bins.keys().copied().collect();
    keys.sort_unstable();

    let mut x = Vec::with_capacity(keys.len());
    let mut y = Vec::with_capacity(keys.len());
    let mut z = Vec::with_capacity(keys.len());

    for key in keys {
        let a = bins.get(&key).expect("bin key should exist");
        let denom = a.n as f32;
        x.push(a.sx / denom);
        y.push(a.sy / denom);
        z.push(a.sz / denom);
    }

    PointCloud::from_xyz(x, y, z)
}
