#![forbid(unsafe_code)]

pub mod correspondence;
pub mod icp;

pub use correspondence::{find_correspondences, Correspondence};
pub use icp::{apply_transform, icp_point_to_point, IcpParams, IcpResult, RigidTransform};
