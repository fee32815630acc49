#![forbid(unsafe_code)]

pub mod kdtree;
pub mod spacing;

pub use kdtree::KdTree;
pub use spacing::mean_nearest_neighbor_distance;
