use treescan_core::PointCloud;

/// Minimum z-spread a cloud must have to be sliceable.
const Z_EPSILON: f32 = 1e-6;

/// Parameters for [`extract_trunk`].
///
/// The cloud is cut into horizontal bands of `slice_thickness`, advanced by
/// `slice_thickness * (1 - overlap_ratio)` per step, so consecutive slices
/// share most of their points and the branching transition is detected
/// smoothly rather than at an arbitrary slice boundary.
///
/// `(min_expansion, max_expansion)` is the footprint-growth band (relative
/// to the bottom slice) that is read as "entering the crown": growth below
/// `min_expansion` is measurement noise, growth at or above `max_expansion`
/// is a stray outlier rather than the branching onset. Both ends are
/// dataset-dependent (species, prune history) and exposed to the caller.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrunkParams {
    pub slice_thickness: f32,
    pub overlap_ratio: f32,
    pub min_expansion: f32,
    pub max_expansion: f32,
}

impl TrunkParams {
    /// Vertical advance between consecutive slice starts.
    pub fn step(&self) -> f32 {
        self.slice_thickness * (1.0 - self.overlap_ratio)
    }
}

impl Default for TrunkParams {
    fn default() -> Self {
        Self {
            slice_thickness: 0.05,
            overlap_ratio: 0.8,
            min_expansion: 0.03,
            max_expansion: 0.2,
        }
    }
}

/// Error type for trunk extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrunkError {
    /// The input cloud holds no points.
    EmptyInput,
    /// The z-spread of the cloud is below [`Z_EPSILON`]; a flat cloud
    /// cannot be sliced.
    DegenerateZRange,
    /// Every candidate slice came up empty (e.g. all-NaN z coordinates).
    NoValidSlices,
}

impl std::fmt::Display for TrunkError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TrunkError::EmptyInput => write!(f, "input point cloud is empty"),
            TrunkError::DegenerateZRange => {
                write!(f, "z-range is too small to slice (< {})", Z_EPSILON)
            }
            TrunkError::NoValidSlices => write!(f, "all candidate slices are empty"),
        }
    }
}

impl std::error::Error for TrunkError {}

/// Result of [`extract_trunk`].
#[derive(Debug, Clone, PartialEq)]
pub struct TrunkResult {
    /// `(max_x, max_y, min_z)` of the bottom slice; the alignment pipeline
    /// seeds its pre-ICP translation from the difference of two scans'
    /// corners.
    pub reference_corner: [f32; 3],
    /// All input points at or below the detected trunk top.
    pub trunk: PointCloud,
}

/// Separate the trunk of a tree scan from its crown.
///
/// The cloud is sliced into overlapping horizontal bands from the ground up.
/// The bottom band's horizontal footprint is the reference; the walk stops
/// at the first band whose footprint growth on either axis falls strictly
/// inside `(min_expansion, max_expansion)`, taken as the onset of
/// branching. Everything up to one slice above the last accepted band is
/// returned as trunk. If even the first band triggers the stop, the trunk
/// degenerates to the bottom band's points.
///
/// This is a cross-section heuristic: it needs no skeleton or mesh, only
/// that the trunk's footprint stays near-constant while the crown's grows.
///
/// # Panics
///
/// Panics if `slice_thickness` is not positive or `overlap_ratio` is
/// outside `[0, 1)`.
pub fn extract_trunk(cloud: &PointCloud, params: &TrunkParams) -> Result<TrunkResult, TrunkError> {
    assert!(
        params.slice_thickness > 0.0 && params.slice_thickness.is_finite(),
        "slice_thickness must be positive and finite"
    );
    assert!(
        (0.0..1.0).contains(&params.overlap_ratio),
        "overlap_ratio must be in [0, 1)"
    );

    if cloud.is_empty() {
        return Err(TrunkError::EmptyInput);
    }

    let z_min = cloud.z.iter().copied().fold(f32::INFINITY, f32::min);
    let z_max = cloud.z.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    if !(z_max - z_min >= Z_EPSILON) {
        return Err(TrunkError::DegenerateZRange);
    }

    let step = params.step();
    let thickness = params.slice_thickness;

    // Slice starts from z_min to z_max (epsilon-padded), overlapping by
    // overlap_ratio. Starts are derived by index to avoid accumulating
    // float error over many steps.
    let num_slices = ((z_max + Z_EPSILON - z_min) / step).ceil().max(1.0) as usize;

    let mut slices: Vec<Vec<usize>> = Vec::new();
    for s in 0..num_slices {
        let start = z_min + s as f32 * step;
        let end = start + thickness;
        let indices: Vec<usize> = (0..cloud.len())
            .filter(|&i| cloud.z[i] >= start && cloud.z[i] < end)
            .collect();
        if !indices.is_empty() {
            slices.push(indices);
        }
    }

    let bottom = match slices.first() {
        Some(b) => b,
        None => return Err(TrunkError::NoValidSlices),
    };

    let (bottom_x_range, bottom_y_range) = footprint(cloud, bottom);
    let reference_corner = [
        fold_axis(&cloud.x, bottom, f32::max, f32::NEG_INFINITY),
        fold_axis(&cloud.y, bottom, f32::max, f32::NEG_INFINITY),
        fold_axis(&cloud.z, bottom, f32::min, f32::INFINITY),
    ];

    // Walk bands bottom-up until either axis's footprint growth lands
    // strictly inside the expansion band.
    let mut trunk_top: Option<f32> = None;
    for slice in &slices {
        let (x_range, y_range) = footprint(cloud, slice);
        let dx = x_range - bottom_x_range;
        let dy = y_range - bottom_y_range;

        if (dx > params.min_expansion && dx < params.max_expansion)
            || (dy > params.min_expansion && dy < params.max_expansion)
        {
            break;
        }

        trunk_top = Some(fold_axis(&cloud.z, slice, f32::max, f32::NEG_INFINITY));
    }

    let trunk = match trunk_top {
        // Trunk shorter than one band: keep just the bottom slice.
        None => cloud.select(bottom),
        Some(top) => {
            let keep: Vec<usize> = (0..cloud.len())
                .filter(|&i| cloud.z[i] <= top + thickness)
                .collect();
            cloud.select(&keep)
        }
    };

    Ok(TrunkResult {
        reference_corner,
        trunk,
    })
}

/// Horizontal extent (max − min on x and y) of the given point subset.
fn footprint(cloud: &PointCloud, indices: &[usize]) -> (f32, f32) {
    let x_max = fold_axis(&cloud.x, indices, f32::max, f32::NEG_INFINITY);
    let x_min = fold_axis(&cloud.x, indices, f32::min, f32::INFINITY);
    let y_max = fold_axis(&cloud.y, indices, f32::max, f32::NEG_INFINITY);
    let y_min = fold_axis(&cloud.y, indices, f32::min, f32::INFINITY);
    (x_max - x_min, y_max - y_min)
}

fn fold_axis(values: &[f32], indices: &[usize], f: fn(f32, f32) -> f32, init: f32) -> f32 {
    indices.iter().map(|&i| values[i]).fold(init, f)
}

#[cfg(test)]
mod tests {
    use super::{extract_trunk, TrunkError, TrunkParams};
    use approx::assert_relative_eq;
    use proptest::prelude::*;
    use treescan_core::PointCloud;

    /// Four points per height level at (±r, 0) and (0, ±r): footprint is
    /// exactly (2r, 2r) at every level.
    fn cylinder(radius: f32, z_levels: &[f32]) -> PointCloud {
        let mut x = Vec::new();
        let mut y = Vec::new();
        let mut z = Vec::new();
        for &h in z_levels {
            for (px, py) in [(radius, 0.0), (-radius, 0.0), (0.0, radius), (0.0, -radius)] {
                x.push(px);
                y.push(py);
                z.push(h);
            }
        }
        PointCloud::from_xyz(x, y, z)
    }

    fn levels(from: f32, to: f32, step: f32) -> Vec<f32> {
        let n = ((to - from) / step).round() as usize;
        (0..=n).map(|i| from + i as f32 * step).collect()
    }

    #[test]
    fn perfect_cylinder_keeps_every_point() {
        let cloud = cylinder(0.1, &levels(0.0, 1.0, 0.01));
        let result = extract_trunk(&cloud, &TrunkParams::default()).unwrap();
        // Constant footprint: the expansion condition never fires, the walk
        // exhausts all slices, and the full input is retained.
        assert_eq!(result.trunk.len(), cloud.len());
    }

    #[test]
    fn reference_corner_is_bottom_slice_corner() {
        let cloud = cylinder(0.1, &levels(0.0, 1.0, 0.01));
        let result = extract_trunk(&cloud, &TrunkParams::default()).unwrap();
        let c = result.reference_corner;
        assert_relative_eq!(c[0], 0.1, epsilon = 1e-6);
        assert_relative_eq!(c[1], 0.1, epsilon = 1e-6);
        assert_relative_eq!(c[2], 0.0, epsilon = 1e-6);
    }

    #[test]
    fn footprint_jump_halts_the_walk() {
        let params = TrunkParams::default();
        let step = params.step();
        let jump_height = 0.5;

        // Cylinder below the jump; above it the x footprint grows by a value
        // strictly inside the expansion band.
        let grow = params.min_expansion + 0.01;
        let mut cloud = cylinder(0.1, &levels(0.0, jump_height - step, step));
        let crown = cylinder(0.1 + grow / 2.0, &levels(jump_height, 1.0, step));
        cloud.x.extend(crown.x);
        cloud.y.extend(crown.y);
        cloud.z.extend(crown.z);

        let result = extract_trunk(&cloud, &params).unwrap();

        // The last accepted slice tops out one step below the jump; the
        // returned trunk carries one slice of padding above it.
        let cutoff = jump_height - step + params.slice_thickness;
        let max_z = result
            .trunk
            .z
            .iter()
            .copied()
            .fold(f32::NEG_INFINITY, f32::max);
        assert!(
            max_z <= cutoff + 1e-5,
            "trunk reaches {} above cutoff {}",
            max_z,
            cutoff
        );
        assert!(result.trunk.len() < cloud.len());
        assert!(!result.trunk.is_empty());
    }

    #[test]
    fn growth_outside_the_band_never_halts() {
        let params = TrunkParams::default();
        let step = params.step();

        // Growth well below min_expansion is noise: must not halt.
        let grow = params.min_expansion / 2.0;
        let mut below_min = cylinder(0.1, &levels(0.0, 1.0, step));
        below_min.x.push(0.1 + grow / 2.0);
        below_min.x.push(-0.1 - grow / 2.0);
        below_min.y.extend([0.0, 0.0]);
        below_min.z.extend([0.5, 0.5]);
        let result = extract_trunk(&below_min, &params).unwrap();
        assert_eq!(result.trunk.len(), below_min.len());

        // Growth beyond max_expansion is a stray outlier: must not halt
        // either (the band is open at both ends).
        let grow = params.max_expansion + 0.05;
        let mut above_max = cylinder(0.1, &levels(0.0, 1.0, step));
        above_max.x.push(0.1 + grow / 2.0);
        above_max.x.push(-0.1 - grow / 2.0);
        above_max.y.extend([0.0, 0.0]);
        above_max.z.extend([0.5, 0.5]);
        let result = extract_trunk(&above_max, &params).unwrap();
        assert_eq!(result.trunk.len(), above_max.len());
    }

    #[test]
    fn immediate_halt_keeps_bottom_slice_only() {
        // min_expansion below zero makes the very first slice (growth 0)
        // land inside the band, so the trunk degenerates to the bottom
        // slice.
        let params = TrunkParams {
            min_expansion: -1.0,
            max_expansion: 1.0,
            ..TrunkParams::default()
        };
        let cloud = cylinder(0.1, &levels(0.0, 1.0, 0.01));
        let result = extract_trunk(&cloud, &params).unwrap();

        let max_z = result
            .trunk
            .z
            .iter()
            .copied()
            .fold(f32::NEG_INFINITY, f32::max);
        assert!(max_z < params.slice_thickness);
        assert!(!result.trunk.is_empty());
    }

    #[test]
    fn empty_input_fails() {
        let err = extract_trunk(&PointCloud::new(), &TrunkParams::default()).unwrap_err();
        assert_eq!(err, TrunkError::EmptyInput);
    }

    #[test]
    fn flat_cloud_fails() {
        let cloud = PointCloud::from_xyz(vec![0.0, 1.0, 2.0], vec![0.0; 3], vec![5.0; 3]);
        let err = extract_trunk(&cloud, &TrunkParams::default()).unwrap_err();
        assert_eq!(err, TrunkError::DegenerateZRange);
    }

    #[test]
    fn nan_z_cloud_reports_no_valid_slices() {
        let cloud = PointCloud::from_xyz(
            vec![0.0, 1.0],
            vec![0.0, 0.0],
            vec![f32::NAN, f32::NAN],
        );
        let err = extract_trunk(&cloud, &TrunkParams::default()).unwrap_err();
        // NaN z defeats the range check but produces only empty slices.
        assert!(matches!(
            err,
            TrunkError::NoValidSlices | TrunkError::DegenerateZRange
        ));
    }

    proptest! {
        #[test]
        fn trunk_is_a_subset_containing_the_bottom_slice(
            pts in prop::collection::vec(
                (-1.0f32..1.0f32, -1.0f32..1.0f32, 0.0f32..3.0f32),
                2..300
            ),
        ) {
            let cloud = PointCloud::from_xyz(
                pts.iter().map(|p| p.0).collect(),
                pts.iter().map(|p| p.1).collect(),
                pts.iter().map(|p| p.2).collect(),
            );
            let params = TrunkParams::default();
            let result = match extract_trunk(&cloud, &params) {
                Ok(r) => r,
                // Degenerate draws (all z equal) are legitimately rejected.
                Err(_) => return Ok(()),
            };

            prop_assert!(result.trunk.len() <= cloud.len());

            // No fabricated points: every trunk point exists in the input.
            let input: Vec<[f32; 3]> = cloud.iter_points().collect();
            for p in result.trunk.iter_points() {
                prop_assert!(input.contains(&p));
            }

            // Bottom-slice points are always retained.
            let z_min = cloud.z.iter().copied().fold(f32::INFINITY, f32::min);
            for p in cloud.iter_points() {
                if p[2] < z_min + params.slice_thickness {
                    prop_assert!(result.trunk.iter_points().any(|q| q == p));
                }
            }
        }
    }
}
