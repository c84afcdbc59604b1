use thiserror::Error;

use crate::options::click::{ClickBehavior, ClickEvent};

/// Rejected configuration, reported when options or projections are built
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("pixel distance to join cluster must be finite and >= 0, got {0}")]
    InvalidClusterDistance(f64),
    #[error("viewport filter factor must be finite and >= 0, got {0}")]
    InvalidViewportFilter(f64),
    #[error("zoom {0} outside the supported range")]
    ZoomOutOfRange(f64),
    #[error("viewport must have a positive size, got {width}x{height}")]
    EmptyViewport { width: f64, height: f64 },
    #[error("zoom to bounds padding must be finite and >= 0, got {0}")]
    InvalidPadding(f64),
    #[error("{behavior:?} is not a valid reaction to {event:?} (multi point: {multi_point})")]
    UnsupportedClickBehavior {
        event: ClickEvent,
        multi_point: bool,
        behavior: ClickBehavior,
    },
}
