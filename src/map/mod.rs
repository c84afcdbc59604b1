//! Interface to the host map widget
//!
//! The widget itself (rendering, camera, event dispatch) lives outside this
//! crate. Everything here is called from the UI thread only.

use std::sync::Arc;
use std::time::Duration;

use crate::cluster::{ClusterPoint, LatLng, LatLngBounds, Projection};

/// Host-assigned handle of a rendered marker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MarkerId(pub u64);

/// Visual configuration of a marker about to be added
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerOptions {
    pub position: LatLng,
    /// Opacity in `[0, 1]`
    pub alpha: f32,
    pub title: Option<String>,
    pub snippet: Option<String>,
    /// Host-defined icon key
    pub icon: Option<String>,
    /// Anchor within the icon, `(0.5, 1.0)` is bottom centre
    pub anchor: (f32, f32),
}

impl MarkerOptions {
    pub fn at(position: LatLng) -> Self {
        Self {
            position,
            alpha: 1.0,
            title: None,
            snippet: None,
            icon: None,
            anchor: (0.5, 1.0),
        }
    }
}

/// Camera moves the orchestrator asks the host to animate
#[derive(Debug, Clone, PartialEq)]
pub enum CameraUpdate {
    /// Fit `bounds` on screen leaving `padding` pixels on each side
    FitBounds { bounds: LatLngBounds, padding: f64 },
    /// Pan without changing zoom
    CenterOn(LatLng),
    CenterAndZoom { center: LatLng, zoom: f64 },
}

/// Primitives consumed from the host map widget
///
/// When a camera animation started with [`MapHost::animate_camera`] ends, the
/// host reports it back through `Clusterer::on_camera_animation_finished` or
/// `Clusterer::on_camera_animation_cancelled`.
pub trait MapHost {
    /// Snapshot of the current geographic <-> screen transform
    fn projection(&self) -> Arc<dyn Projection>;

    fn add_marker(&mut self, options: MarkerOptions) -> MarkerId;

    fn remove_marker(&mut self, marker: MarkerId);

    fn set_marker_position(&mut self, marker: MarkerId, position: LatLng);

    fn set_marker_alpha(&mut self, marker: MarkerId, alpha: f32);

    fn marker_position(&self, marker: MarkerId) -> Option<LatLng>;

    fn show_info_window(&mut self, marker: MarkerId);

    fn hide_info_window(&mut self, marker: MarkerId);

    fn animate_camera(&mut self, update: CameraUpdate, duration: Duration);
}

/// Picks the look of the marker representing a cluster point
pub trait MarkerOptionsChooser {
    fn choose(&self, options: &mut MarkerOptions, cluster: &ClusterPoint);
}

/// Builds the options for `cluster`'s marker, letting `chooser` customise them
pub fn marker_options_for(
    cluster: &ClusterPoint,
    position: LatLng,
    alpha: f32,
    chooser: Option<&dyn MarkerOptionsChooser>,
) -> MarkerOptions {
    let mut options = MarkerOptions::at(position);
    if let Some(chooser) = chooser {
        chooser.choose(&mut options, cluster);
    }
    // The chooser decides looks, not placement.
    options.position = position;
    options.alpha = alpha;
    options
}
