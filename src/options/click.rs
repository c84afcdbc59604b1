//! Click handling policy for markers and info windows

use crate::error::ConfigError;

/// What the user clicked
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClickEvent {
    Marker,
    InfoWindow,
}

/// Default reaction to a click
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClickBehavior {
    ZoomToBounds,
    ShowInfoWindow,
    HideInfoWindow,
    NoOp,
}

/// Click reactions keyed by event kind and cluster size
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClickPolicy {
    pub cluster_marker: ClickBehavior,
    pub single_marker: ClickBehavior,
    pub cluster_info_window: ClickBehavior,
    pub single_info_window: ClickBehavior,
}

impl Default for ClickPolicy {
    fn default() -> Self {
        Self {
            cluster_marker: ClickBehavior::ZoomToBounds,
            single_marker: ClickBehavior::ShowInfoWindow,
            cluster_info_window: ClickBehavior::ZoomToBounds,
            single_info_window: ClickBehavior::HideInfoWindow,
        }
    }
}

impl ClickPolicy {
    pub fn behavior(&self, event: ClickEvent, multi_point: bool) -> ClickBehavior {
        match (event, multi_point) {
            (ClickEvent::Marker, true) => self.cluster_marker,
            (ClickEvent::Marker, false) => self.single_marker,
            (ClickEvent::InfoWindow, true) => self.cluster_info_window,
            (ClickEvent::InfoWindow, false) => self.single_info_window,
        }
    }

    pub fn with(mut self, event: ClickEvent, multi_point: bool, behavior: ClickBehavior) -> Self {
        let slot = match (event, multi_point) {
            (ClickEvent::Marker, true) => &mut self.cluster_marker,
            (ClickEvent::Marker, false) => &mut self.single_marker,
            (ClickEvent::InfoWindow, true) => &mut self.cluster_info_window,
            (ClickEvent::InfoWindow, false) => &mut self.single_info_window,
        };
        *slot = behavior;
        self
    }

    /// Rejects reactions that make no sense for their slot
    ///
    /// A marker click cannot hide an info window, an info window click cannot
    /// show one, and a single point has no bounds to zoom to.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for event in [ClickEvent::Marker, ClickEvent::InfoWindow] {
            for multi_point in [true, false] {
                let behavior = self.behavior(event, multi_point);
                let allowed = match (event, behavior) {
                    (_, ClickBehavior::NoOp) => true,
                    (_, ClickBehavior::ZoomToBounds) => multi_point,
                    (ClickEvent::Marker, ClickBehavior::ShowInfoWindow) => true,
                    (ClickEvent::InfoWindow, ClickBehavior::HideInfoWindow) => true,
                    _ => false,
                };
                if !allowed {
                    return Err(ConfigError::UnsupportedClickBehavior {
                        event,
                        multi_point,
                        behavior,
                    });
                }
            }
        }
        Ok(())
    }
}
