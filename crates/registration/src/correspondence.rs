use treescan_core::PointCloud;
use treescan_spatial::KdTree;

/// A nearest-neighbor pairing between one source point and one target point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Correspondence {
    pub source_index: usize,
    pub target_index: usize,
    pub distance: f32,
}

/// Pair each source point with its nearest point in the target cloud
/// (represented by its kd-tree), keeping only pairs within `max_distance`.
pub fn find_correspondences(
    source: &PointCloud,
    target_tree: &KdTree,
    max_distance: f32,
) -> Vec<Correspondence> {
    let mut correspondences = Vec::with_capacity(source.len());

    for i in 0..source.len() {
        if let Some((target_idx, dist)) = target_tree.nearest(&source.point(i)) {
            if dist <= max_distance {
                correspondences.push(Correspondence {
                    source_index: i,
                    target_index: target_idx,
                    distance: dist,
                });
            }
        }
    }

    correspondences
}
