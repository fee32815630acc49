#![forbid(unsafe_code)]

pub mod dbscan;

pub use dbscan::dbscan;
