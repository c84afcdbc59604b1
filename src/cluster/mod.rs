//! Package cluster implements screen-space clustering of geo points
pub mod engine;
pub mod kdtree;
pub mod point;
pub mod projection;


pub use engine::{CANCEL_CHECK_INTERVAL, ClusterConfig, ClusteringEngine};
pub use kdtree::KDTree;
pub use point::{ClusterPoint, ClusterSet, InputPoint, LatLng, LatLngBounds, PixelPoint, PointId, Tag};
pub use projection::{MercatorProjection, Projection};
