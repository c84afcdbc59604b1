//! Geo point clustering for interactive maps
//!
//! Points are merged into cluster markers in screen space for the current
//! viewport. When the viewport or the point collection changes, the new
//! clustering is matched against the one on screen and the difference is
//! animated (merges converge, splits fan out, new clusters fade in, vanished
//! ones fade out).
//!
//! The map widget is abstracted by [`map::MapHost`]; [`orchestrator::Clusterer`]
//! drives everything from the host's UI thread while the heavy lifting runs on
//! a [`task::Executor`].

pub mod cluster;
pub mod error;
pub mod map;
pub mod options;
pub mod orchestrator;
pub mod task;
pub mod transition;

#[cfg(test)]
pub(crate) mod testing;

pub use cluster::{
    ClusterConfig, ClusterPoint, ClusterSet, ClusteringEngine, InputPoint, LatLng, LatLngBounds,
    MercatorProjection, PixelPoint, PointId, Projection,
};
pub use error::ConfigError;
pub use map::{CameraUpdate, MapHost, MarkerId, MarkerOptions, MarkerOptionsChooser};
pub use options::{
    ClickBehavior, ClickEvent, ClickPolicy, InfoWindowClickListener, MarkerClickListener, Options,
    OptionsBuilder, ProcessingListener,
};
pub use orchestrator::{Clusterer, State};
pub use task::{CancelToken, Executor, InlineExecutor, ThreadPoolExecutor};
pub use transition::{Easing, Transition, TransitionKind, TransitionPlan, TransitionPlayer, diff};
