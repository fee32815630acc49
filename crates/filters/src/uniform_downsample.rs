use treescan_core::PointCloud;

/// Keep every `every_k`-th point, starting with the first.
///
/// Cheaper than voxel binning when only the point count matters and the scan
/// is already evenly sampled. `every_k = 1` returns the cloud unchanged.
/// A label column is carried through.
///
/// # Panics
///
/// Panics if `every_k == 0`.
pub fn uniform_downsample(cloud: &PointCloud, every_k: usize) -> PointCloud {
    assert!(every_k > 0, "every_k must be at least 1");

    if cloud.is_empty() || every_k == 1 {
        return cloud.clone();
    }

    let keep: Vec<usize> = (0..cloud.len()).step_by(every_k).collect();
    cloud.select(&keep)
}
