use nalgebra::{Matrix3, Vector3};
use rayon::prelude::*;
use treescan_core::PointCloud;

use crate::path_length::estimate_path_length;

/// Per-cluster shape measurements for a labeled branch cloud.
#[derive(Debug, Clone, PartialEq)]
pub struct BranchMetrics {
    pub label: i32,
    pub point_count: usize,
    /// Extent of the cluster along its principal axis, in the cloud's units.
    pub principal_length: f32,
    /// Angle between the principal axis and the horizontal plane, in
    /// degrees, in `[0, 90]`.
    pub inclination_degrees: f32,
    /// Greedy traversal length of the cluster, see
    /// [`estimate_path_length`].
    pub path_length: f32,
}

/// Measure every labeled cluster in `cloud` with at least `min_points`
/// members. Noise points are ignored, as are clouds without labels.
///
/// Clusters are processed in parallel; the returned vector is ordered by
/// ascending label regardless of scheduling.
pub fn measure_branches(cloud: &PointCloud, min_points: usize) -> Vec<BranchMetrics> {
    let labels = cloud.cluster_labels();
    if labels.is_empty() {
        return Vec::new();
    }

    labels
        .par_iter()
        .filter_map(|&label| {
            let indices = cloud.indices_with_label(label);
            if indices.len() < min_points {
                return None;
            }
            Some(measure_cluster(cloud, label, &indices))
        })
        .collect()
}

fn measure_cluster(cloud: &PointCloud, label: i32, indices: &[usize]) -> BranchMetrics {
    let points: Vec<[f32; 3]> = indices.iter().map(|&i| cloud.point(i)).collect();
    let axis = principal_axis(&points);

    let mut min_proj = f32::INFINITY;
    let mut max_proj = f32::NEG_INFINITY;
    for p in &points {
        let proj = axis.dot(&Vector3::new(p[0], p[1], p[2]));
        min_proj = min_proj.min(proj);
        max_proj = max_proj.max(proj);
    }
    let principal_length = if max_proj >= min_proj {
        max_proj - min_proj
    } else {
        0.0
    };

    BranchMetrics {
        label,
        point_count: points.len(),
        principal_length,
        inclination_degrees: inclination_from_horizontal(&axis),
        path_length: estimate_path_length(points),
    }
}

/// Unit eigenvector of the covariance matrix with the largest eigenvalue.
fn principal_axis(points: &[[f32; 3]]) -> Vector3<f32> {
    let n = points.len() as f32;
    let mut centroid = Vector3::zeros();
    for p in points {
        centroid += Vector3::new(p[0], p[1], p[2]);
    }
    centroid /= n;

    let mut cov = Matrix3::zeros();
    for p in points {
        let d = Vector3::new(p[0], p[1], p[2]) - centroid;
        cov += d * d.transpose();
    }
    cov /= n;

    let eigen = cov.symmetric_eigen();
    let mut largest = 0;
    for i in 1..3 {
        if eigen.eigenvalues[i] > eigen.eigenvalues[largest] {
            largest = i;
        }
    }
    let axis = eigen.eigenvectors.column(largest).into_owned();
    let norm = axis.norm();
    if norm > 0.0 {
        axis / norm
    } else {
        Vector3::z()
    }
}

/// Angle in degrees between `axis` and its projection onto the xy plane.
/// A horizontal axis measures 0, a vertical one 90.
fn inclination_from_horizontal(axis: &Vector3<f32>) -> f32 {
    let horizontal = (axis.x * axis.x + axis.y * axis.y).sqrt();
    axis.z.abs().atan2(horizontal).to_degrees()
}
