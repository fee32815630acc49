use nalgebra::{Matrix3, Vector3, SVD};
use treescan_core::PointCloud;
use treescan_spatial::KdTree;

use crate::correspondence::{find_correspondences, Correspondence};

/// A rigid-body transform: rotation (row-major 3×3) followed by translation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RigidTransform {
    pub rotation: [[f32; 3]; 3],
    pub translation: [f32; 3],
}

impl RigidTransform {
    pub fn identity() -> Self {
        Self {
            rotation: [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]],
            translation: [0.0, 0.0, 0.0],
        }
    }

    /// A pure translation.
    ///
    /// The alignment pipeline seeds ICP with the offset between the two
    /// trunks' reference corners expressed this way.
    pub fn from_translation(t: [f32; 3]) -> Self {
        Self {
            rotation: [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]],
            translation: t,
        }
    }

    pub fn is_identity(&self, eps: f32) -> bool {
        let id = Self::identity();
        for r in 0..3 {
            for c in 0..3 {
                if (self.rotation[r][c] - id.rotation[r][c]).abs() > eps {
                    return false;
                }
            }
        }
        self.translation.iter().all(|t| t.abs() <= eps)
    }

    /// Apply the transform to a single point: `R * p + t`.
    pub fn apply_to_point(&self, p: &[f32; 3]) -> [f32; 3] {
        let r = &self.rotation;
        let t = &self.translation;
        [
            r[0][0] * p[0] + r[0][1] * p[1] + r[0][2] * p[2] + t[0],
            r[1][0] * p[0] + r[1][1] * p[1] + r[1][2] * p[2] + t[1],
            r[2][0] * p[0] + r[2][1] * p[1] + r[2][2] * p[2] + t[2],
        ]
    }

    /// Compose two transforms: apply `self` first, then `other`.
    ///
    /// `R_new = other.R * self.R`, `t_new = other.R * self.t + other.t`.
    pub fn compose(&self, other: &RigidTransform) -> RigidTransform {
        let r_self = mat3_from_arrays(&self.rotation);
        let r_other = mat3_from_arrays(&other.rotation);
        let t_self = Vector3::from(self.translation);
        let t_other = Vector3::from(other.translation);

        let r_new = r_other * r_self;
        let t_new = r_other * t_self + t_other;

        RigidTransform {
            rotation: mat3_to_arrays(&r_new),
            translation: [t_new[0], t_new[1], t_new[2]],
        }
    }
}

/// Apply a rigid transform to every point of a cloud, returning a new cloud.
///
/// A label column is carried through unchanged.
pub fn apply_transform(cloud: &PointCloud, transform: &RigidTransform) -> PointCloud {
    let n = cloud.len();
    let mut x = Vec::with_capacity(n);
    let mut y = Vec::with_capacity(n);
    let mut z = Vec::with_capacity(n);

    for p in cloud.iter_points() {
        let tp = transform.apply_to_point(&p);
        x.push(tp[0]);
        y.push(tp[1]);
        z.push(tp[2]);
    }

    let mut out = PointCloud::from_xyz(x, y, z);
    out.labels = cloud.labels.clone();
    out
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IcpParams {
    pub max_iterations: usize,
    pub tolerance: f32,
    pub max_correspondence_distance: f32,
}

impl Default for IcpParams {
    fn default() -> Self {
        Self {
            max_iterations: 100,
            tolerance: 1e-3,
            max_correspondence_distance: f32::INFINITY,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IcpResult {
    pub transform: RigidTransform,
    pub fitness: f32,
    pub rmse: f32,
    pub converged: bool,
    pub num_iterations: usize,
}

/// Point-to-point ICP via SVD of the correspondence cross-covariance.
///
/// Aligns `source` to `target` by alternating nearest-neighbor
/// correspondence search with the closed-form optimal rigid transform.
/// ICP is a local optimizer: callers are expected to pre-align the clouds,
/// e.g. by the translation between trunk reference corners, before refining
/// here.
pub fn icp_point_to_point(
    source: &PointCloud,
    target: &PointCloud,
    params: &IcpParams,
) -> IcpResult {
    if source.is_empty() || target.is_empty() {
        return IcpResult {
            transform: RigidTransform::identity(),
            fitness: 0.0,
            rmse: 0.0,
            converged: source.is_empty() && target.is_empty(),
            num_iterations: 0,
        };
    }

    let target_tree = KdTree::build(target);

    // Working copy of the source, re-transformed each iteration
    let mut current = apply_transform(source, &RigidTransform::identity());
    let mut cumulative = RigidTransform::identity();

    let mut prev_rmse = f32::INFINITY;
    let mut converged = false;
    let mut num_iterations = 0;
    let mut last_rmse = f32::INFINITY;
    let mut last_fitness = 0.0_f32;

    for iter in 0..params.max_iterations {
        num_iterations = iter + 1;

        let correspondences =
            find_correspondences(&current, &target_tree, params.max_correspondence_distance);

        if correspondences.is_empty() {
            break;
        }

        let rmse = compute_rmse(&correspondences);
        last_rmse = rmse;
        last_fitness = correspondences.len() as f32 / source.len() as f32;

        if (prev_rmse - rmse).abs() < params.tolerance {
            converged = true;
            break;
        }
        prev_rmse = rmse;

        let incremental = compute_rigid_transform_svd(&current, target, &correspondences);

        cumulative = cumulative.compose(&incremental);
        current = apply_transform(&current, &incremental);
    }

    // No iterations ran (max_iterations == 0): still report final metrics
    if num_iterations == 0 {
        let correspondences =
            find_correspondences(&current, &target_tree, params.max_correspondence_distance);
        if !correspondences.is_empty() {
            last_rmse = compute_rmse(&correspondences);
            last_fitness = correspondences.len() as f32 / source.len() as f32;
        }
    }

    IcpResult {
        transform: cumulative,
        fitness: last_fitness,
        rmse: last_rmse,
        converged,
        num_iterations,
    }
}

/// Closed-form optimal rigid transform for a fixed correspondence set,
/// via SVD of the cross-covariance matrix.
fn compute_rigid_transform_svd(
    source: &PointCloud,
    target: &PointCloud,
    correspondences: &[Correspondence],
) -> RigidTransform {
    let n = correspondences.len();
    if n == 0 {
        return RigidTransform::identity();
    }

    let mut src_centroid = Vector3::new(0.0_f32, 0.0, 0.0);
    let mut tgt_centroid = Vector3::new(0.0_f32, 0.0, 0.0);

    for c in correspondences {
        src_centroid += Vector3::from(source.point(c.source_index));
        tgt_centroid += Vector3::from(target.point(c.target_index));
    }

    let n_f = n as f32;
    src_centroid /= n_f;
    tgt_centroid /= n_f;

    // Cross-covariance H = sum (src_i - src_c)(tgt_i - tgt_c)^T
    let mut h = Matrix3::<f32>::zeros();
    for c in correspondences {
        let src_pt = Vector3::from(source.point(c.source_index)) - src_centroid;
        let tgt_pt = Vector3::from(target.point(c.target_index)) - tgt_centroid;
        h += src_pt * tgt_pt.transpose();
    }

    let svd = SVD::new(h, true, true);
    let u = svd.u.expect("SVD should produce U matrix");
    let mut v_t = svd.v_t.expect("SVD should produce V^T matrix");

    // Guard against reflections: if det(V * U^T) < 0, flip the last row of V^T
    let v = v_t.transpose();
    let det = (v * u.transpose()).determinant();
    if det < 0.0 {
        v_t[(2, 0)] = -v_t[(2, 0)];
        v_t[(2, 1)] = -v_t[(2, 1)];
        v_t[(2, 2)] = -v_t[(2, 2)];
    }

    let rotation = v_t.transpose() * u.transpose();
    let translation = tgt_centroid - rotation * src_centroid;

    RigidTransform {
        rotation: mat3_to_arrays(&rotation),
        translation: [translation[0], translation[1], translation[2]],
    }
}

pub(crate) fn compute_rmse(correspondences: &[Correspondence]) -> f32 {
    if correspondences.is_empty() {
        return 0.0;
    }
    let sum_sq: f32 = correspondences.iter().map(|c| c.distance * c.distance).sum();
    (sum_sq / correspondences.len() as f32).sqrt()
}

fn mat3_to_arrays(m: &Matrix3<f32>) -> [[f32; 3]; 3] {
    [
        [m[(0, 0)], m[(0, 1)], m[(0, 2)]],
        [m[(1, 0)], m[(1, 1)], m[(1, 2)]],
        [m[(2, 0)], m[(2, 1)], m[(2, 2)]],
    ]
}

fn mat3_from_arrays(a: &[[f32; 3]; 3]) -> Matrix3<f32> {
    Matrix3::new(
        a[0][0], a[0][1], a[0][2], a[1][0], a[1][1], a[1][2], a[2][0], a[2][1], a[2][2],
    )
}
