//! Map projections from geographic to viewport pixel coordinates

use std::f64::consts::PI;

use super::point::{LatLng, LatLngBounds, PixelPoint};
use crate::error::ConfigError;

/// Coefficient to translate from degrees to radians
pub const DEGREE_RAD: f64 = PI / 180.0;

/// Latitude where the square Web Mercator world ends
pub const MAX_LATITUDE: f64 = 85.051_128_779_8;

/// Size in pixels of the whole world at zoom 0
pub const TILE_SIZE: f64 = 256.0;

/// Zoom levels accepted by [`MercatorProjection`]
pub const MAX_ZOOM: f64 = 30.0;

/// Snapshot of the host map's geographic <-> screen transform
///
/// Implementations must be immutable snapshots: background clustering holds
/// them while the live map keeps moving.
pub trait Projection: Send + Sync {
    fn to_screen_location(&self, position: LatLng) -> PixelPoint;

    fn from_screen_location(&self, pixel: PixelPoint) -> LatLng;

    /// Geographic region currently visible on screen
    fn visible_region(&self) -> LatLngBounds;
}

/// Spherical (Web) Mercator viewport of `width` x `height` pixels centred on
/// `center` at a fractional `zoom`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MercatorProjection {
    center: LatLng,
    zoom: f64,
    width: f64,
    height: f64,
    /// World pixel position of the screen's top-left corner
    origin: PixelPoint,
}

impl MercatorProjection {
    pub fn new(center: LatLng, zoom: f64, width: f64, height: f64) -> Result<Self, ConfigError> {
        if !(0.0..=MAX_ZOOM).contains(&zoom) {
            return Err(ConfigError::ZoomOutOfRange(zoom));
        }
        if !(width > 0.0 && height > 0.0) || !width.is_finite() || !height.is_finite() {
            return Err(ConfigError::EmptyViewport { width, height });
        }
        let world_center = project_to_world(center, zoom);
        let origin = PixelPoint([
            world_center.0[0] - width / 2.0,
            world_center.0[1] - height / 2.0,
        ]);
        Ok(Self {
            center,
            zoom,
            width,
            height,
            origin,
        })
    }

    pub fn center(&self) -> LatLng {
        self.center
    }

    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    /// Same viewport at another zoom level
    pub fn with_zoom(&self, zoom: f64) -> Result<Self, ConfigError> {
        Self::new(self.center, zoom, self.width, self.height)
    }

    /// Same viewport panned to another center
    pub fn with_center(&self, center: LatLng) -> Result<Self, ConfigError> {
        Self::new(center, self.zoom, self.width, self.height)
    }
}

impl Projection for MercatorProjection {
    fn to_screen_location(&self, position: LatLng) -> PixelPoint {
        let world = project_to_world(position, self.zoom);
        PixelPoint([world.0[0] - self.origin.0[0], world.0[1] - self.origin.0[1]])
    }

    fn from_screen_location(&self, pixel: PixelPoint) -> LatLng {
        let world = PixelPoint([pixel.0[0] + self.origin.0[0], pixel.0[1] + self.origin.0[1]]);
        unproject_from_world(world, self.zoom)
    }

    fn visible_region(&self) -> LatLngBounds {
        let nw = self.from_screen_location(PixelPoint([0.0, 0.0]));
        let se = self.from_screen_location(PixelPoint([self.width, self.height]));
        LatLngBounds {
            southwest: LatLng::new(se.lat, nw.lng),
            northeast: LatLng::new(nw.lat, se.lng),
        }
    }
}

fn world_size(zoom: f64) -> f64 {
    TILE_SIZE * 2f64.powf(zoom)
}

/// Projects to absolute world pixels at `zoom` (y grows southwards)
pub fn project_to_world(position: LatLng, zoom: f64) -> PixelPoint {
    let size = world_size(zoom);
    let lat = position.lat.clamp(-MAX_LATITUDE, MAX_LATITUDE);
    let sin_lat = (lat * DEGREE_RAD).sin();
    let x = (position.lng + 180.0) / 360.0 * size;
    let y = (0.5 - ((1.0 + sin_lat) / (1.0 - sin_lat)).ln() / (4.0 * PI)) * size;
    PixelPoint([x, y])
}

/// Inverse of [`project_to_world`]
pub fn unproject_from_world(world: PixelPoint, zoom: f64) -> LatLng {
    let size = world_size(zoom);
    let lng = world.0[0] / size * 360.0 - 180.0;
    let n = PI - 2.0 * PI * world.0[1] / size;
    let lat = n.sinh().atan() / DEGREE_RAD;
    LatLng::new(lat, lng)
}
