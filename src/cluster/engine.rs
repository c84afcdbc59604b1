//! First-fit screen-space clustering over a kd-tree

use bitvec::prelude::*;
use log::trace;

use super::kdtree::KDTree;
use super::point::{ClusterPoint, ClusterSet, InputPoint, PixelPoint};
use super::projection::Projection;
use crate::error::ConfigError;
use crate::task::CancelToken;

/// How many points are visited between two cancellation checks
pub const CANCEL_CHECK_INTERVAL: usize = 64;

/// Default minimum pixel distance between two distinct clusters
pub const DEFAULT_PIXEL_DISTANCE: f64 = 100.0;

/// Clustering parameters shipped to background tasks
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClusterConfig {
    pixel_distance_to_join_cluster: f64,
    viewport_filter: Option<f64>,
}

impl ClusterConfig {
    /// * `pixel_distance_to_join_cluster` - points closer than this (in screen
    ///   pixels) to a cluster's centroid are absorbed into it
    /// * `viewport_filter` - when set, only points inside the visible region grown
    ///   by this factor of its span on every side are clustered
    pub fn new(
        pixel_distance_to_join_cluster: f64,
        viewport_filter: Option<f64>,
    ) -> Result<Self, ConfigError> {
        if !pixel_distance_to_join_cluster.is_finite() || pixel_distance_to_join_cluster < 0.0 {
            return Err(ConfigError::InvalidClusterDistance(
                pixel_distance_to_join_cluster,
            ));
        }
        if let Some(factor) = viewport_filter {
            if !factor.is_finite() || factor < 0.0 {
                return Err(ConfigError::InvalidViewportFilter(factor));
            }
        }
        Ok(Self {
            pixel_distance_to_join_cluster,
            viewport_filter,
        })
    }

    pub fn pixel_distance_to_join_cluster(&self) -> f64 {
        self.pixel_distance_to_join_cluster
    }

    pub fn viewport_filter(&self) -> Option<f64> {
        self.viewport_filter
    }
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            pixel_distance_to_join_cluster: DEFAULT_PIXEL_DISTANCE,
            viewport_filter: None,
        }
    }
}

/// Partitions input points into clusters for one projection
#[derive(Debug, Clone, Default)]
pub struct ClusteringEngine {
    config: ClusterConfig,
}

impl ClusteringEngine {
    pub fn new(config: ClusterConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ClusterConfig {
        &self.config
    }

    /// Clusters `points` against `projection`
    ///
    /// Points are visited in slice order. Each point not yet assigned seeds a
    /// cluster, which then absorbs every later unassigned point lying within the
    /// join distance of its current centroid, again in slice order, updating the
    /// centroid after each absorption (first fit, not nearest seed).
    ///
    /// Returns `None` if `cancel` fires before the pass completes.
    pub fn cluster(
        &self,
        points: &[InputPoint],
        projection: &dyn Projection,
        cancel: &CancelToken,
    ) -> Option<ClusterSet> {
        let candidates: Vec<&InputPoint> = match self.config.viewport_filter {
            Some(factor) => {
                let region = projection.visible_region().expanded(factor);
                points.iter().filter(|p| region.contains(p.position)).collect()
            }
            None => points.iter().collect(),
        };

        let pixels: Vec<PixelPoint> = candidates
            .iter()
            .map(|p| projection.to_screen_location(p.position))
            .collect();
        let tree = KDTree::new(pixels.clone());
        let radius = self.config.pixel_distance_to_join_cluster;

        let mut assigned = bitvec![0; candidates.len()];
        let mut clusters = Vec::new();
        let mut neighbours = Vec::new();
        let mut visited = 0usize;

        for seed in 0..candidates.len() {
            if assigned[seed] {
                continue;
            }
            assigned.set(seed, true);

            let mut members = vec![seed];
            let mut centroid = pixels[seed];
            // Every index in (seed, cursor] was either absorbed or out of range
            // of the centroid at the time the linear scan would have reached it.
            let mut cursor = seed;

            loop {
                visited += 1;
                if visited % CANCEL_CHECK_INTERVAL == 0 && cancel.is_cancelled() {
                    trace!("clustering cancelled after {} steps", visited);
                    return None;
                }

                neighbours.clear();
                neighbours = tree.in_range(&centroid, radius, neighbours);
                let next = neighbours
                    .iter()
                    .copied()
                    .filter(|&j| j > cursor && !assigned[j])
                    .min();
                let Some(j) = next else { break };

                assigned.set(j, true);
                members.push(j);
                let n = members.len() as f64;
                centroid = PixelPoint([
                    centroid.0[0] + (pixels[j].0[0] - centroid.0[0]) / n,
                    centroid.0[1] + (pixels[j].0[1] - centroid.0[1]) / n,
                ]);
                cursor = j;
            }

            let map_position = projection.from_screen_location(centroid);
            let owned = members.iter().map(|&i| candidates[i].clone()).collect();
            clusters.push(ClusterPoint::new(owned, centroid, map_position));
        }

        if cancel.is_cancelled() {
            return None;
        }
        Some(ClusterSet::new(clusters))
    }
}
