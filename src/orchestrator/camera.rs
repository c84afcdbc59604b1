//! Bookkeeping for camera changes the orchestrator caused itself

use std::time::Instant;

use crate::cluster::LatLngBounds;

/// Camera animation the orchestrator itself started
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CameraMove {
    /// Zoom changes; recluster once it lands
    Zoom,
    /// Pan to open an info window; keep the current markers
    Recenter,
}

/// Decides whether a camera change should trigger reclustering
///
/// Changes are suppressed while the guard is dirty, and ignored when the
/// visible region equals the one last clustered against.
#[derive(Debug, Default)]
pub struct CameraChangeGuard {
    dirty_until: Option<Instant>,
    last_region: Option<LatLngBounds>,
}

impl CameraChangeGuard {
    pub fn set_dirty_until(&mut self, until: Instant) {
        self.dirty_until = Some(until);
    }

    pub fn clear_dirty(&mut self) {
        self.dirty_until = None;
    }

    pub fn is_dirty(&self, now: Instant) -> bool {
        self.dirty_until.is_some_and(|until| now < until)
    }

    /// Records the region clustering last ran against
    pub fn remember(&mut self, region: LatLngBounds) {
        self.last_region = Some(region);
    }

    pub fn forget(&mut self) {
        self.last_region = None;
    }

    pub fn has_moved(&self, region: &LatLngBounds) -> bool {
        self.last_region.as_ref() != Some(region)
    }
}
