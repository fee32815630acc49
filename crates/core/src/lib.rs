#![forbid(unsafe_code)]

pub mod bbox;
pub mod cloud;

pub use bbox::Aabb;
pub use cloud::{PointCloud, NOISE_LABEL};
