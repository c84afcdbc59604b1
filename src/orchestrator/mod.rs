//! Scheduling of clustering and transition building against a live map
pub mod camera;
pub mod clusterer;

#[cfg(test)]
mod camera_test;

pub use camera::{CameraChangeGuard, CameraMove};
pub use clusterer::{Clusterer, State};
