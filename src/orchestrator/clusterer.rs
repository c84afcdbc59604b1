//! Orchestrator keeping a map's cluster markers in sync with its points

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::mem;
use std::rc::{Rc, Weak};
use std::sync::Arc;
use std::time::Instant;

use log::{debug, info, trace, warn};

use super::camera::{CameraChangeGuard, CameraMove};
use crate::cluster::{ClusterPoint, ClusterSet, ClusteringEngine, InputPoint, PointId, Projection};
use crate::map::{CameraUpdate, MapHost, MarkerId, marker_options_for};
use crate::options::{ClickBehavior, ClickEvent, Options};
use crate::task::{Executor, TaskHandle, TaskPoll};
use crate::transition::{PlayerEvent, TransitionKind, TransitionPlan, TransitionPlayer, diff};

/// Externally visible phase of the orchestrator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Idle,
    Clustering,
    TransitionBuilding,
    Transitioning,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Purpose {
    /// Draw the result directly, no animation
    ShowAll,
    /// Diff against what is on screen and animate
    Transition,
}

enum Phase {
    Idle,
    Clustering {
        task: TaskHandle<ClusterSet>,
        purpose: Purpose,
        projection: Arc<dyn Projection>,
    },
    BuildingTransitions {
        clusters: Arc<ClusterSet>,
        task: TaskHandle<TransitionPlan>,
    },
    Transitioning {
        clusters: Arc<ClusterSet>,
    },
}

/// Markers currently on the map for an authoritative cluster set
struct Shown {
    clusters: Arc<ClusterSet>,
    markers: Vec<MarkerId>,
    cluster_by_marker: HashMap<MarkerId, usize>,
    marker_by_point: HashMap<PointId, MarkerId>,
}

/// Keeps a map's cluster markers in sync with a point collection and viewport
///
/// All methods must be called on the UI thread. Clustering and transition
/// building run on the executor; their results are picked up by
/// [`Clusterer::poll`], which the host calls once per rendered frame.
///
/// When the map has been dropped every operation is a no-op.
pub struct Clusterer<M: MapHost> {
    map: Weak<RefCell<M>>,
    options: Options,
    engine: ClusteringEngine,
    executor: Rc<dyn Executor>,
    points: Arc<Vec<InputPoint>>,
    phase: Phase,
    shown: Option<Shown>,
    player: TransitionPlayer,
    camera: CameraChangeGuard,
    camera_move: Option<CameraMove>,
    pending_info_window: Option<PointId>,
    processing: bool,
    generation: u64,
}

impl<M: MapHost> Clusterer<M> {
    /// Takes over `map` and starts clustering `points` right away
    pub fn new(
        map: &Rc<RefCell<M>>,
        options: Options,
        executor: Rc<dyn Executor>,
        points: Vec<InputPoint>,
    ) -> Self {
        let player = TransitionPlayer::new(options.transition_duration, options.transition_easing);
        let engine = ClusteringEngine::new(options.cluster);
        let mut clusterer = Self {
            map: Rc::downgrade(map),
            options,
            engine,
            executor,
            points: Arc::new(Vec::new()),
            phase: Phase::Idle,
            shown: None,
            player,
            camera: CameraChangeGuard::default(),
            camera_move: None,
            pending_info_window: None,
            processing: false,
            generation: 0,
        };
        upsert_points(Arc::make_mut(&mut clusterer.points), points);
        clusterer.show_all();
        clusterer
    }

    pub fn state(&self) -> State {
        match self.phase {
            Phase::Idle => State::Idle,
            Phase::Clustering { .. } => State::Clustering,
            Phase::BuildingTransitions { .. } => State::TransitionBuilding,
            Phase::Transitioning { .. } => State::Transitioning,
        }
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    pub fn points(&self) -> &[InputPoint] {
        &self.points
    }

    /// Cluster set whose markers are on the map, if any
    pub fn cluster_set(&self) -> Option<&Arc<ClusterSet>> {
        self.shown.as_ref().map(|s| &s.clusters)
    }

    /// Authoritative markers currently on the map
    pub fn markers(&self) -> &[MarkerId] {
        self.shown
            .as_ref()
            .map(|s| s.markers.as_slice())
            .unwrap_or_default()
    }

    pub fn cluster_for_marker(&self, marker: MarkerId) -> Option<&ClusterPoint> {
        let shown = self.shown.as_ref()?;
        let &index = shown.cluster_by_marker.get(&marker)?;
        shown.clusters.get(index)
    }

    /// Marker currently representing the input point `id`
    pub fn marker_for_point(&self, id: PointId) -> Option<MarkerId> {
        self.shown.as_ref()?.marker_by_point.get(&id).copied()
    }

    pub fn is_processing(&self) -> bool {
        self.processing
    }

    /// Plan of the transition being played, if any
    pub fn transition_plan(&self) -> Option<&TransitionPlan> {
        self.player.plan()
    }

    /// Adds `point`, replacing a point already known under the same id
    pub fn add(&mut self, point: InputPoint) {
        self.add_all(vec![point]);
    }

    /// Adds `points`; ids already known are replaced in place, and of two
    /// incoming points sharing an id the later one wins
    pub fn add_all(&mut self, points: Vec<InputPoint>) {
        if points.is_empty() {
            return;
        }
        if upsert_points(Arc::make_mut(&mut self.points), points) == 0 {
            return;
        }
        self.update_clusters_and_transition();
    }

    /// Removes every input point whose id is listed
    pub fn remove_all(&mut self, ids: &[PointId]) {
        if ids.is_empty() {
            return;
        }
        let ids: HashSet<PointId> = ids.iter().copied().collect();
        let before = self.points.len();
        Arc::make_mut(&mut self.points).retain(|p| !ids.contains(&p.id));
        if self.points.len() == before {
            return;
        }
        self.update_clusters_and_transition();
    }

    /// Drops every point and marker, then clusters `points` from scratch
    pub fn replace(&mut self, points: Vec<InputPoint>) {
        self.clear();
        self.add_all(points);
    }

    /// Cancels all work and removes every managed marker and point
    ///
    /// Markers the host added on its own are left alone.
    pub fn clear(&mut self) {
        match mem::replace(&mut self.phase, Phase::Idle) {
            Phase::Clustering { task, .. } => self.release_task(task.generation()),
            Phase::BuildingTransitions { task, .. } => self.release_task(task.generation()),
            _ => {}
        }
        if let Some(map) = self.map.upgrade() {
            let mut map = map.borrow_mut();
            self.player.cancel(&mut *map);
            self.remove_shown(&mut map);
        }
        self.shown = None;
        self.points = Arc::new(Vec::new());
        self.pending_info_window = None;
        self.camera.forget();
    }

    /// Reclusters and draws the result without a transition
    pub fn show_all(&mut self) {
        self.start_clustering(Purpose::ShowAll);
    }

    fn update_clusters_and_transition(&mut self) {
        self.start_clustering(Purpose::Transition);
    }

    /// Picks up finished background work and advances the running transition
    pub fn poll(&mut self, now: Instant) {
        let Some(map) = self.map.upgrade() else {
            return;
        };
        while self.poll_tasks(&map, now) {}

        if let Phase::Transitioning { .. } = self.phase {
            let events = self.player.on_frame(now, &mut *map.borrow_mut());
            for event in events {
                self.on_player_event(&map, event);
            }
        }
    }

    /// Host callback: the viewport settled after a camera change
    pub fn on_camera_change(&mut self, now: Instant) {
        let Some(map) = self.map.upgrade() else {
            return;
        };
        if self.camera.is_dirty(now) {
            trace!("camera change suppressed during own camera animation");
            return;
        }
        let region = map.borrow().projection().visible_region();
        if !self.camera.has_moved(&region) {
            trace!("camera change without movement ignored");
            return;
        }
        self.update_clusters_and_transition();
    }

    /// Host callback: a camera animation started by this clusterer completed
    pub fn on_camera_animation_finished(&mut self, now: Instant) {
        self.camera.clear_dirty();
        let Some(map) = self.map.upgrade() else {
            return;
        };
        match self.camera_move.take() {
            Some(CameraMove::Zoom) => {
                let region = map.borrow().projection().visible_region();
                if self.camera.has_moved(&region) {
                    self.update_clusters_and_transition();
                } else if let Phase::Idle = self.phase {
                    self.open_pending_info_window(&mut map.borrow_mut());
                }
                // Otherwise the cycle in flight opens it once its markers are drawn.
            }
            Some(CameraMove::Recenter) => {
                let region = map.borrow().projection().visible_region();
                self.camera.remember(region);
            }
            None => self.on_camera_change(now),
        }
    }

    /// Host callback: a camera animation started by this clusterer was interrupted
    pub fn on_camera_animation_cancelled(&mut self) {
        self.camera.clear_dirty();
        self.camera_move = None;
    }

    /// Animates the camera so every input point of `cluster` is in view
    pub fn zoom_to_bounds(&mut self, cluster: &ClusterPoint, now: Instant) {
        let Some(map) = self.map.upgrade() else {
            return;
        };
        let duration = self.options.zoom_to_bounds_animation_duration;
        self.camera.set_dirty_until(now + duration);
        self.camera_move = Some(CameraMove::Zoom);
        let update = CameraUpdate::FitBounds {
            bounds: cluster.bounds(),
            padding: self.options.zoom_to_bounds_padding,
        };
        map.borrow_mut().animate_camera(update, duration);
    }

    /// Animates the camera onto input point `id`; false if it is unknown
    pub fn zoom_to_point(&mut self, id: PointId, now: Instant) -> bool {
        let Some(map) = self.map.upgrade() else {
            return false;
        };
        let Some(position) = self.points.iter().find(|p| p.id == id).map(|p| p.position) else {
            return false;
        };
        let duration = self.options.zoom_to_bounds_animation_duration;
        self.camera.set_dirty_until(now + duration);
        self.camera_move = Some(CameraMove::Zoom);
        let update = CameraUpdate::CenterAndZoom {
            center: position,
            zoom: self.options.zoom_to_point_zoom,
        };
        map.borrow_mut().animate_camera(update, duration);
        true
    }

    /// Recentres on `marker` and opens its info window
    pub fn show_info_window(&mut self, marker: MarkerId, now: Instant) {
        let Some(map) = self.map.upgrade() else {
            return;
        };
        let Some(position) = map.borrow().marker_position(marker) else {
            return;
        };
        let duration = self.options.show_info_window_animation_duration;
        self.camera.set_dirty_until(now + duration);
        self.camera_move = Some(CameraMove::Recenter);
        let mut map = map.borrow_mut();
        map.animate_camera(CameraUpdate::CenterOn(position), duration);
        map.show_info_window(marker);
    }

    /// Zooms onto input point `id`, then opens the info window of whichever
    /// marker represents it once the markers have been redrawn
    pub fn show_info_window_for_point(&mut self, id: PointId, now: Instant) {
        if self.zoom_to_point(id, now) {
            self.pending_info_window = Some(id);
        }
    }

    /// Host callback for marker clicks; returns true when the click was consumed
    pub fn on_marker_click(&mut self, marker: MarkerId, now: Instant) -> bool {
        if self.map.upgrade().is_none() {
            return false;
        }
        let cluster = match self.shown_cluster(marker) {
            Some(found) => Some(found),
            None if self.player.is_animated(marker) => {
                trace!("click on animated marker {:?} ignored", marker);
                return true;
            }
            None => self.player.stationary_cluster(marker),
        };

        let claimed = match self.options.marker_click_listener.as_mut() {
            Some(listener) => {
                listener.on_marker_click(marker, cluster.as_ref().map(|(set, i)| &set.clusters()[*i]))
            }
            None => false,
        };
        if claimed {
            return true;
        }

        let Some((set, index)) = cluster else {
            return false;
        };
        let cluster = &set.clusters()[index];
        match self.options.click_policy.behavior(ClickEvent::Marker, cluster.size() > 1) {
            ClickBehavior::ZoomToBounds => {
                self.zoom_to_bounds(cluster, now);
                true
            }
            ClickBehavior::ShowInfoWindow => {
                self.show_info_window(marker, now);
                true
            }
            ClickBehavior::HideInfoWindow => {
                self.hide_info_window(marker);
                true
            }
            ClickBehavior::NoOp => false,
        }
    }

    /// Host callback for info window clicks
    pub fn on_info_window_click(&mut self, marker: MarkerId, now: Instant) {
        if self.map.upgrade().is_none() {
            return;
        }
        let cluster = self.shown_cluster(marker);
        let claimed = match self.options.info_window_click_listener.as_mut() {
            Some(listener) => listener
                .on_info_window_click(marker, cluster.as_ref().map(|(set, i)| &set.clusters()[*i])),
            None => false,
        };
        if claimed {
            return;
        }

        let Some((set, index)) = cluster else {
            return;
        };
        let cluster = &set.clusters()[index];
        match self.options.click_policy.behavior(ClickEvent::InfoWindow, cluster.size() > 1) {
            ClickBehavior::ZoomToBounds => self.zoom_to_bounds(cluster, now),
            ClickBehavior::HideInfoWindow => self.hide_info_window(marker),
            ClickBehavior::ShowInfoWindow => self.show_info_window(marker, now),
            ClickBehavior::NoOp => {}
        }
    }

    fn hide_info_window(&mut self, marker: MarkerId) {
        if let Some(map) = self.map.upgrade() {
            map.borrow_mut().hide_info_window(marker);
        }
    }

    fn shown_cluster(&self, marker: MarkerId) -> Option<(Arc<ClusterSet>, usize)> {
        let shown = self.shown.as_ref()?;
        let &index = shown.cluster_by_marker.get(&marker)?;
        Some((Arc::clone(&shown.clusters), index))
    }

    fn start_clustering(&mut self, purpose: Purpose) {
        let Some(map) = self.map.upgrade() else {
            trace!("map released, clustering skipped");
            return;
        };
        let projection = {
            let mut map = map.borrow_mut();
            self.supersede(&mut map);
            map.projection()
        };
        self.camera.remember(projection.visible_region());
        self.begin_processing();

        self.generation += 1;
        debug!(
            "dispatching clustering task #{} over {} points ({:?})",
            self.generation,
            self.points.len(),
            purpose
        );
        let points = Arc::clone(&self.points);
        let engine = self.engine.clone();
        let snapshot = Arc::clone(&projection);
        let task = TaskHandle::spawn(self.executor.as_ref(), self.generation, move |cancel| {
            engine.cluster(&points, snapshot.as_ref(), cancel)
        });
        self.phase = Phase::Clustering {
            task,
            purpose,
            projection,
        };
    }

    /// Stops whatever the previous cycle was doing before a new one starts
    ///
    /// Background tasks are cancelled and their results discarded. A running
    /// transition snaps to its end state so the map shows a consistent set.
    fn supersede(&mut self, map: &mut M) {
        match mem::replace(&mut self.phase, Phase::Idle) {
            Phase::Idle => {}
            Phase::Clustering { task, .. } => self.release_task(task.generation()),
            Phase::BuildingTransitions { task, .. } => self.release_task(task.generation()),
            Phase::Transitioning { clusters } => {
                self.player.cancel(&mut *map);
                self.draw(map, clusters);
            }
        }
    }

    fn release_task(&mut self, generation: u64) {
        debug!("task #{} superseded", generation);
        self.end_processing();
    }

    /// Returns true when the phase advanced
    fn poll_tasks(&mut self, map: &Rc<RefCell<M>>, now: Instant) -> bool {
        match mem::replace(&mut self.phase, Phase::Idle) {
            Phase::Clustering {
                task,
                purpose,
                projection,
            } => match task.try_take() {
                TaskPoll::Pending => {
                    self.phase = Phase::Clustering {
                        task,
                        purpose,
                        projection,
                    };
                    false
                }
                TaskPoll::Ready(clusters) => {
                    debug!(
                        "clustering task #{} produced {} clusters",
                        task.generation(),
                        clusters.len()
                    );
                    self.on_clusters_ready(map, Arc::new(clusters), purpose, projection);
                    true
                }
                TaskPoll::Abandoned => {
                    debug!("clustering task #{} abandoned", task.generation());
                    self.end_processing();
                    true
                }
            },
            Phase::BuildingTransitions { clusters, task } => match task.try_take() {
                TaskPoll::Pending => {
                    self.phase = Phase::BuildingTransitions { clusters, task };
                    false
                }
                TaskPoll::Ready(plan) => {
                    self.on_plan_ready(map, plan, now);
                    true
                }
                TaskPoll::Abandoned => {
                    debug!("transition task #{} abandoned, drawing directly", task.generation());
                    self.end_processing();
                    self.draw(&mut map.borrow_mut(), clusters);
                    true
                }
            },
            other => {
                self.phase = other;
                false
            }
        }
    }

    fn on_clusters_ready(
        &mut self,
        map: &Rc<RefCell<M>>,
        clusters: Arc<ClusterSet>,
        purpose: Purpose,
        projection: Arc<dyn Projection>,
    ) {
        match purpose {
            Purpose::ShowAll => {
                self.end_processing();
                let mut map = map.borrow_mut();
                self.draw(&mut map, clusters);
                self.open_pending_info_window(&mut map);
            }
            Purpose::Transition => {
                let previous = self.shown.as_ref().map(|s| Arc::clone(&s.clusters));
                let current = Arc::clone(&clusters);
                self.generation += 1;
                debug!("dispatching transition task #{}", self.generation);
                let task = TaskHandle::spawn(self.executor.as_ref(), self.generation, move |cancel| {
                    diff(previous, current, projection, cancel)
                });
                self.phase = Phase::BuildingTransitions { clusters, task };
            }
        }
    }

    fn on_plan_ready(&mut self, map: &Rc<RefCell<M>>, plan: TransitionPlan, now: Instant) {
        self.end_processing();
        info!(
            "transitioning to {} clusters: {} created, {} persisted, {} merged, {} split, {} destroyed",
            plan.current().len(),
            plan.count(TransitionKind::Created),
            plan.count(TransitionKind::Persisted),
            plan.count(TransitionKind::Merged),
            plan.count(TransitionKind::Split),
            plan.destroyed().len()
        );
        let clusters = Arc::clone(plan.current());
        let chooser = self.options.marker_options_chooser.as_deref();
        let event = self.player.animate(plan, now, &mut *map.borrow_mut(), chooser);
        self.phase = Phase::Transitioning { clusters };
        self.on_player_event(map, event);
    }

    fn on_player_event(&mut self, map: &Rc<RefCell<M>>, event: PlayerEvent) {
        match event {
            PlayerEvent::Starting => trace!("transition starting"),
            // The first frame is on screen, stale markers can go without a blink.
            PlayerEvent::Started => self.remove_shown(&mut map.borrow_mut()),
            PlayerEvent::Finished => {
                if let Phase::Transitioning { clusters } = mem::replace(&mut self.phase, Phase::Idle) {
                    let mut map = map.borrow_mut();
                    self.draw(&mut map, clusters);
                    self.player.on_host_plotted_destinations(&mut *map);
                    self.open_pending_info_window(&mut map);
                }
            }
        }
    }

    /// Replaces the markers on the map with one per cluster of `clusters`
    fn draw(&mut self, map: &mut M, clusters: Arc<ClusterSet>) {
        self.remove_shown(map);
        let chooser = self.options.marker_options_chooser.as_deref();
        let mut shown = Shown {
            markers: Vec::with_capacity(clusters.len()),
            cluster_by_marker: HashMap::with_capacity(clusters.len()),
            marker_by_point: HashMap::with_capacity(clusters.point_count()),
            clusters,
        };
        for (index, cluster) in shown.clusters.clusters().iter().enumerate() {
            let options = marker_options_for(cluster, cluster.map_position(), 1.0, chooser);
            let marker = map.add_marker(options);
            shown.markers.push(marker);
            shown.cluster_by_marker.insert(marker, index);
            for point in cluster.points() {
                shown.marker_by_point.insert(point.id, marker);
            }
        }
        debug!("drew {} markers", shown.markers.len());
        self.shown = Some(shown);
    }

    fn remove_shown(&mut self, map: &mut M) {
        if let Some(shown) = self.shown.take() {
            for marker in shown.markers {
                map.remove_marker(marker);
            }
        }
    }

    fn open_pending_info_window(&mut self, map: &mut M) {
        if let Some(id) = self.pending_info_window.take() {
            match self.marker_for_point(id) {
                Some(marker) => map.show_info_window(marker),
                None => debug!("no marker represents point {:?}", id),
            }
        }
    }

    fn begin_processing(&mut self) {
        if !self.processing {
            self.processing = true;
            if let Some(listener) = self.options.processing_listener.as_mut() {
                listener.on_processing_started();
            }
        }
    }

    fn end_processing(&mut self) {
        if self.processing {
            self.processing = false;
            if let Some(listener) = self.options.processing_listener.as_mut() {
                listener.on_processing_finished();
            }
        }
    }
}

/// Merges `incoming` into `points` keeping ids unique; returns how many were
/// taken
fn upsert_points(points: &mut Vec<InputPoint>, incoming: Vec<InputPoint>) -> usize {
    let mut taken = 0;
    let mut index: HashMap<PointId, usize> =
        points.iter().enumerate().map(|(i, p)| (p.id, i)).collect();
    for point in incoming {
        if !point.position.is_finite() {
            warn!("point {:?} has no finite position, skipped", point.id);
            continue;
        }
        taken += 1;
        match index.get(&point.id) {
            Some(&i) => {
                trace!("point {:?} replaced", point.id);
                points[i] = point;
            }
            None => {
                index.insert(point.id, points.len());
                points.push(point);
            }
        }
    }
    taken
}
