//! Geographic and screen-space point types shared by the clustering engine,
//! the differ and the orchestrator

use std::any::Any;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Geographic coordinate in degrees
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    pub fn is_finite(&self) -> bool {
        self.lat.is_finite() && self.lng.is_finite()
    }
}

/// Axis-aligned geographic rectangle
///
/// Does not handle bounds crossing the antimeridian.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LatLngBounds {
    pub southwest: LatLng,
    pub northeast: LatLng,
}

impl LatLngBounds {
    /// Degenerate bounds covering a single position
    pub fn from_point(p: LatLng) -> Self {
        Self {
            southwest: p,
            northeast: p,
        }
    }

    /// Smallest bounds covering all given positions, `None` for an empty iterator
    pub fn covering<I: IntoIterator<Item = LatLng>>(positions: I) -> Option<Self> {
        let mut iter = positions.into_iter();
        let first = iter.next()?;
        Some(iter.fold(Self::from_point(first), |b, p| b.including(p)))
    }

    /// Returns bounds extended to include `p`
    pub fn including(&self, p: LatLng) -> Self {
        Self {
            southwest: LatLng::new(self.southwest.lat.min(p.lat), self.southwest.lng.min(p.lng)),
            northeast: LatLng::new(self.northeast.lat.max(p.lat), self.northeast.lng.max(p.lng)),
        }
    }

    pub fn contains(&self, p: LatLng) -> bool {
        p.lat >= self.southwest.lat
            && p.lat <= self.northeast.lat
            && p.lng >= self.southwest.lng
            && p.lng <= self.northeast.lng
    }

    pub fn center(&self) -> LatLng {
        LatLng::new(
            (self.southwest.lat + self.northeast.lat) / 2.0,
            (self.southwest.lng + self.northeast.lng) / 2.0,
        )
    }

    /// Grows the bounds by `factor` of their span on every side
    pub fn expanded(&self, factor: f64) -> Self {
        let dlat = (self.northeast.lat - self.southwest.lat) * factor;
        let dlng = (self.northeast.lng - self.southwest.lng) * factor;
        Self {
            southwest: LatLng::new(self.southwest.lat - dlat, self.southwest.lng - dlng),
            northeast: LatLng::new(self.northeast.lat + dlat, self.northeast.lng + dlng),
        }
    }
}

/// Screen position in pixels, stored as `[x, y]`
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PixelPoint(pub [f64; 2]);

impl PixelPoint {
    /// Returns squared planar distance between two points
    pub fn sq_dist(&self, b: &PixelPoint) -> f64 {
        let dx = self.0[0] - b.0[0];
        let dy = self.0[1] - b.0[1];
        dx * dx + dy * dy
    }

    /// Linear interpolation towards `b`, `t` in `[0, 1]`
    pub fn lerp(&self, b: &PixelPoint, t: f64) -> PixelPoint {
        PixelPoint([
            self.0[0] + (b.0[0] - self.0[0]) * t,
            self.0[1] + (b.0[1] - self.0[1]) * t,
        ])
    }
}

/// Caller-assigned identity of an input point
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PointId(pub u64);

/// Opaque user payload carried along with an input point
pub type Tag = Arc<dyn Any + Send + Sync>;

/// A single caller-supplied location to be clustered
///
/// Equality and hashing only look at the id.
#[derive(Clone)]
pub struct InputPoint {
    pub id: PointId,
    pub position: LatLng,
    pub tag: Option<Tag>,
}

impl InputPoint {
    pub fn new(id: u64, position: LatLng) -> Self {
        Self {
            id: PointId(id),
            position,
            tag: None,
        }
    }

    pub fn with_tag(mut self, tag: Tag) -> Self {
        self.tag = Some(tag);
        self
    }
}

impl fmt::Debug for InputPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InputPoint")
            .field("id", &self.id)
            .field("position", &self.position)
            .field("tagged", &self.tag.is_some())
            .finish()
    }
}

impl PartialEq for InputPoint {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for InputPoint {}

impl Hash for InputPoint {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

/// Aggregate marker representing one or more input points
#[derive(Debug, Clone)]
pub struct ClusterPoint {
    points: Vec<InputPoint>,
    pixel_position: PixelPoint,
    map_position: LatLng,
    bounds: LatLngBounds,
}

impl ClusterPoint {
    /// Builds a cluster from its members and their pixel centroid
    ///
    /// `map_position` is the single member's own position for a cluster of one,
    /// otherwise the unprojected centroid.
    ///
    /// # Panics
    ///
    /// Panics if `points` is empty
    pub fn new(points: Vec<InputPoint>, pixel_position: PixelPoint, map_position: LatLng) -> Self {
        let bounds = LatLngBounds::covering(points.iter().map(|p| p.position)).expect("empty cluster");
        let map_position = if points.len() == 1 {
            points[0].position
        } else {
            map_position
        };
        Self {
            points,
            pixel_position,
            map_position,
            bounds,
        }
    }

    pub fn points(&self) -> &[InputPoint] {
        &self.points
    }

    pub fn size(&self) -> usize {
        self.points.len()
    }

    /// Centroid of the members in the projection this cluster was built with
    pub fn pixel_position(&self) -> PixelPoint {
        self.pixel_position
    }

    pub fn map_position(&self) -> LatLng {
        self.map_position
    }

    /// Bounding box of all member input points
    pub fn bounds(&self) -> LatLngBounds {
        self.bounds
    }

    pub fn contains(&self, id: PointId) -> bool {
        self.points.iter().any(|p| p.id == id)
    }
}

/// Partition of the considered input points produced by one clustering pass
#[derive(Debug, Clone, Default)]
pub struct ClusterSet {
    clusters: Vec<ClusterPoint>,
}

impl ClusterSet {
    pub fn new(clusters: Vec<ClusterPoint>) -> Self {
        Self { clusters }
    }

    pub fn clusters(&self) -> &[ClusterPoint] {
        &self.clusters
    }

    pub fn get(&self, index: usize) -> Option<&ClusterPoint> {
        self.clusters.get(index)
    }

    pub fn len(&self) -> usize {
        self.clusters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clusters.is_empty()
    }

    /// Total number of input points across all clusters
    pub fn point_count(&self) -> usize {
        self.clusters.iter().map(ClusterPoint::size).sum()
    }
}
