//! Test doubles shared by the unit tests

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::mem;
use std::rc::Rc;
use std::sync::Arc;
use std::time::Duration;

use crate::cluster::{InputPoint, LatLng, LatLngBounds, MercatorProjection, PixelPoint, Projection};
use crate::map::{CameraUpdate, MapHost, MarkerId, MarkerOptions};
use crate::task::{Executor, Job};

pub(crate) fn point(id: u64, lat: f64, lng: f64) -> InputPoint {
    InputPoint::new(id, LatLng::new(lat, lng))
}

/// Maps `lng` to x and `lat` to y, both multiplied by `scale`
#[derive(Debug, Clone, Copy)]
pub(crate) struct PlanarProjection {
    pub scale: f64,
    pub visible: LatLngBounds,
}

impl PlanarProjection {
    pub fn new(scale: f64) -> Self {
        Self {
            scale,
            visible: LatLngBounds {
                southwest: LatLng::new(-90.0, -180.0),
                northeast: LatLng::new(90.0, 180.0),
            },
        }
    }
}

impl Projection for PlanarProjection {
    fn to_screen_location(&self, position: LatLng) -> PixelPoint {
        PixelPoint([position.lng * self.scale, position.lat * self.scale])
    }

    fn from_screen_location(&self, pixel: PixelPoint) -> LatLng {
        LatLng::new(pixel.0[1] / self.scale, pixel.0[0] / self.scale)
    }

    fn visible_region(&self) -> LatLngBounds {
        self.visible
    }
}

#[derive(Debug, Clone)]
pub(crate) struct FakeMarker {
    pub options: MarkerOptions,
    pub position: LatLng,
    pub alpha: f32,
}

/// In-memory map recording every call
pub(crate) struct FakeMap {
    pub projection: MercatorProjection,
    pub markers: BTreeMap<MarkerId, FakeMarker>,
    pub added: usize,
    pub camera_moves: Vec<(CameraUpdate, Duration)>,
    pub info_windows: Vec<MarkerId>,
    pub hidden_info_windows: Vec<MarkerId>,
    next_id: u64,
}

impl FakeMap {
    pub fn new(center: LatLng, zoom: f64) -> Self {
        Self {
            projection: MercatorProjection::new(center, zoom, 512.0, 512.0)
                .expect("valid test viewport"),
            markers: BTreeMap::new(),
            added: 0,
            camera_moves: Vec::new(),
            info_windows: Vec::new(),
            hidden_info_windows: Vec::new(),
            next_id: 0,
        }
    }

    pub fn shared(center: LatLng, zoom: f64) -> Rc<RefCell<Self>> {
        Rc::new(RefCell::new(Self::new(center, zoom)))
    }

    pub fn set_zoom(&mut self, zoom: f64) {
        self.projection = self.projection.with_zoom(zoom).expect("valid test zoom");
    }

    pub fn set_center(&mut self, center: LatLng) {
        self.projection = self.projection.with_center(center).expect("valid test center");
    }
}

impl MapHost for FakeMap {
    fn projection(&self) -> Arc<dyn Projection> {
        Arc::new(self.projection)
    }

    fn add_marker(&mut self, options: MarkerOptions) -> MarkerId {
        let id = MarkerId(self.next_id);
        self.next_id += 1;
        self.added += 1;
        self.markers.insert(
            id,
            FakeMarker {
                position: options.position,
                alpha: options.alpha,
                options,
            },
        );
        id
    }

    fn remove_marker(&mut self, marker: MarkerId) {
        assert!(
            self.markers.remove(&marker).is_some(),
            "marker {:?} removed twice",
            marker
        );
    }

    fn set_marker_position(&mut self, marker: MarkerId, position: LatLng) {
        self.markers
            .get_mut(&marker)
            .expect("moving a removed marker")
            .position = position;
    }

    fn set_marker_alpha(&mut self, marker: MarkerId, alpha: f32) {
        self.markers
            .get_mut(&marker)
            .expect("fading a removed marker")
            .alpha = alpha;
    }

    fn marker_position(&self, marker: MarkerId) -> Option<LatLng> {
        self.markers.get(&marker).map(|m| m.position)
    }

    fn show_info_window(&mut self, marker: MarkerId) {
        self.info_windows.push(marker);
    }

    fn hide_info_window(&mut self, marker: MarkerId) {
        self.hidden_info_windows.push(marker);
    }

    fn animate_camera(&mut self, update: CameraUpdate, duration: Duration) {
        self.camera_moves.push((update, duration));
    }
}

/// Holds jobs until the test runs them
#[derive(Default)]
pub(crate) struct ManualExecutor {
    jobs: RefCell<Vec<Job>>,
}

impl ManualExecutor {
    pub fn pending(&self) -> usize {
        self.jobs.borrow().len()
    }

    pub fn run_all(&self) {
        let jobs = mem::take(&mut *self.jobs.borrow_mut());
        for job in jobs {
            job();
        }
    }
}

impl Executor for ManualExecutor {
    fn execute(&self, job: Job) {
        self.jobs.borrow_mut().push(job);
    }
}
