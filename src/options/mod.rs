//! Caller-facing configuration of a [`crate::orchestrator::Clusterer`]
pub mod click;


use std::time::Duration;

use crate::cluster::projection::MAX_ZOOM;
use crate::cluster::{ClusterConfig, ClusterPoint};
use crate::error::ConfigError;
use crate::map::{MarkerId, MarkerOptionsChooser};
use crate::transition::Easing;

pub use click::{ClickBehavior, ClickEvent, ClickPolicy};

/// Consulted before the default marker click behavior; return `true` to claim
/// the click
pub trait MarkerClickListener {
    fn on_marker_click(&mut self, marker: MarkerId, cluster: Option<&ClusterPoint>) -> bool;
}

/// Consulted before the default info window click behavior; return `true` to
/// claim the click
pub trait InfoWindowClickListener {
    fn on_info_window_click(&mut self, marker: MarkerId, cluster: Option<&ClusterPoint>) -> bool;
}

/// Brackets each background clustering cycle; calls are always paired
pub trait ProcessingListener {
    fn on_processing_started(&mut self);

    fn on_processing_finished(&mut self);
}

/// Validated orchestrator configuration, see [`OptionsBuilder`]
pub struct Options {
    pub(crate) cluster: ClusterConfig,
    pub(crate) transition_duration: Duration,
    pub(crate) transition_easing: Easing,
    pub(crate) zoom_to_bounds_animation_duration: Duration,
    pub(crate) zoom_to_bounds_padding: f64,
    pub(crate) show_info_window_animation_duration: Duration,
    pub(crate) zoom_to_point_zoom: f64,
    pub(crate) click_policy: ClickPolicy,
    pub(crate) marker_options_chooser: Option<Box<dyn MarkerOptionsChooser>>,
    pub(crate) marker_click_listener: Option<Box<dyn MarkerClickListener>>,
    pub(crate) info_window_click_listener: Option<Box<dyn InfoWindowClickListener>>,
    pub(crate) processing_listener: Option<Box<dyn ProcessingListener>>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            cluster: ClusterConfig::default(),
            transition_duration: Duration::from_millis(500),
            transition_easing: Easing::default(),
            zoom_to_bounds_animation_duration: Duration::from_millis(500),
            zoom_to_bounds_padding: 50.0,
            show_info_window_animation_duration: Duration::from_millis(500),
            zoom_to_point_zoom: 16.0,
            click_policy: ClickPolicy::default(),
            marker_options_chooser: None,
            marker_click_listener: None,
            info_window_click_listener: None,
            processing_listener: None,
        }
    }
}

impl Options {
    pub fn builder() -> OptionsBuilder {
        OptionsBuilder::default()
    }

    pub fn cluster(&self) -> &ClusterConfig {
        &self.cluster
    }

    pub fn transition_duration(&self) -> Duration {
        self.transition_duration
    }

    pub fn transition_easing(&self) -> Easing {
        self.transition_easing
    }

    pub fn zoom_to_bounds_animation_duration(&self) -> Duration {
        self.zoom_to_bounds_animation_duration
    }

    pub fn zoom_to_bounds_padding(&self) -> f64 {
        self.zoom_to_bounds_padding
    }

    pub fn show_info_window_animation_duration(&self) -> Duration {
        self.show_info_window_animation_duration
    }

    pub fn zoom_to_point_zoom(&self) -> f64 {
        self.zoom_to_point_zoom
    }

    pub fn click_policy(&self) -> &ClickPolicy {
        &self.click_policy
    }
}

/// Collects options; nothing is checked until [`OptionsBuilder::build`]
#[derive(Default)]
pub struct OptionsBuilder {
    options: Options,
    pixel_distance_to_join_cluster: Option<f64>,
    viewport_filter: Option<f64>,
}

impl OptionsBuilder {
    pub fn pixel_distance_to_join_cluster(mut self, pixels: f64) -> Self {
        self.pixel_distance_to_join_cluster = Some(pixels);
        self
    }

    /// Only cluster points within the visible region grown by `factor`
    pub fn viewport_filter(mut self, factor: f64) -> Self {
        self.viewport_filter = Some(factor);
        self
    }

    pub fn transition_duration(mut self, duration: Duration) -> Self {
        self.options.transition_duration = duration;
        self
    }

    pub fn transition_easing(mut self, easing: Easing) -> Self {
        self.options.transition_easing = easing;
        self
    }

    pub fn zoom_to_bounds_animation_duration(mut self, duration: Duration) -> Self {
        self.options.zoom_to_bounds_animation_duration = duration;
        self
    }

    pub fn zoom_to_bounds_padding(mut self, pixels: f64) -> Self {
        self.options.zoom_to_bounds_padding = pixels;
        self
    }

    pub fn show_info_window_animation_duration(mut self, duration: Duration) -> Self {
        self.options.show_info_window_animation_duration = duration;
        self
    }

    pub fn zoom_to_point_zoom(mut self, zoom: f64) -> Self {
        self.options.zoom_to_point_zoom = zoom;
        self
    }

    pub fn click_policy(mut self, policy: ClickPolicy) -> Self {
        self.options.click_policy = policy;
        self
    }

    pub fn marker_options_chooser(mut self, chooser: impl MarkerOptionsChooser + 'static) -> Self {
        self.options.marker_options_chooser = Some(Box::new(chooser));
        self
    }

    pub fn marker_click_listener(mut self, listener: impl MarkerClickListener + 'static) -> Self {
        self.options.marker_click_listener = Some(Box::new(listener));
        self
    }

    pub fn info_window_click_listener(
        mut self,
        listener: impl InfoWindowClickListener + 'static,
    ) -> Self {
        self.options.info_window_click_listener = Some(Box::new(listener));
        self
    }

    pub fn processing_listener(mut self, listener: impl ProcessingListener + 'static) -> Self {
        self.options.processing_listener = Some(Box::new(listener));
        self
    }

    pub fn build(self) -> Result<Options, ConfigError> {
        let mut options = self.options;
        let defaults = ClusterConfig::default();
        options.cluster = ClusterConfig::new(
            self.pixel_distance_to_join_cluster
                .unwrap_or(defaults.pixel_distance_to_join_cluster()),
            self.viewport_filter,
        )?;
        if !options.zoom_to_bounds_padding.is_finite() || options.zoom_to_bounds_padding < 0.0 {
            return Err(ConfigError::InvalidPadding(options.zoom_to_bounds_padding));
        }
        if !(0.0..=MAX_ZOOM).contains(&options.zoom_to_point_zoom) {
            return Err(ConfigError::ZoomOutOfRange(options.zoom_to_point_zoom));
        }
        options.click_policy.validate()?;
        Ok(options)
    }
}
