//! Frame-driven playback of a transition plan on the map

use std::sync::Arc;
use std::time::{Duration, Instant};

use log::debug;

use super::differ::{TransitionKind, TransitionPlan};
use super::easing::Easing;
use crate::cluster::{ClusterSet, PixelPoint};
use crate::map::{MapHost, MarkerId, MarkerOptionsChooser, marker_options_for};

/// Lifecycle notifications reported to the player's host
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerEvent {
    /// Transition markers were added, nothing drawn yet
    Starting,
    /// The first frame has been drawn; stale markers can go
    Started,
    /// Every animation reached its end; authoritative markers can be drawn
    Finished,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Fade {
    None,
    In,
    Out,
}

struct AnimatedMarker {
    marker: MarkerId,
    from: PixelPoint,
    to: PixelPoint,
    fade: Fade,
}

struct Playback {
    plan: TransitionPlan,
    started_at: Instant,
    frames: u32,
    finished: bool,
    animated: Vec<AnimatedMarker>,
    /// Markers that sit still on their destination cluster, by cluster index
    stationary: Vec<(MarkerId, usize)>,
}

/// Plays a [`TransitionPlan`] against the host map, one frame per `on_frame`
pub struct TransitionPlayer {
    duration: Duration,
    easing: Easing,
    playback: Option<Playback>,
}

impl TransitionPlayer {
    pub fn new(duration: Duration, easing: Easing) -> Self {
        Self {
            duration,
            easing,
            playback: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.playback.as_ref().is_some_and(|p| !p.finished)
    }

    pub fn plan(&self) -> Option<&TransitionPlan> {
        self.playback.as_ref().map(|p| &p.plan)
    }

    /// Adds every transition marker at its starting state
    ///
    /// Any playback still in flight is cancelled first.
    pub fn animate(
        &mut self,
        plan: TransitionPlan,
        now: Instant,
        map: &mut dyn MapHost,
        chooser: Option<&dyn MarkerOptionsChooser>,
    ) -> PlayerEvent {
        self.cancel(map);

        let projection = Arc::clone(plan.projection());
        let current = Arc::clone(plan.current());
        let previous = plan.previous().cloned().unwrap_or_default();

        let mut animated = Vec::new();
        let mut stationary = Vec::new();

        for transition in plan.transitions() {
            let cluster = &current.clusters()[transition.destination];
            let to = projection.to_screen_location(transition.destination_position);

            if transition.kind == TransitionKind::Created {
                let options =
                    marker_options_for(cluster, transition.destination_position, 0.0, chooser);
                animated.push(AnimatedMarker {
                    marker: map.add_marker(options),
                    from: to,
                    to,
                    fade: Fade::In,
                });
            } else if transition.is_stationary(projection.as_ref()) {
                let options =
                    marker_options_for(cluster, transition.destination_position, 1.0, chooser);
                stationary.push((map.add_marker(options), transition.destination));
            } else {
                for &source in &transition.source_positions {
                    let options = marker_options_for(cluster, source, 1.0, chooser);
                    animated.push(AnimatedMarker {
                        marker: map.add_marker(options),
                        from: projection.to_screen_location(source),
                        to,
                        fade: Fade::None,
                    });
                }
            }
        }

        for &index in plan.destroyed() {
            let cluster = &previous.clusters()[index];
            let at = cluster.map_position();
            let pixel = projection.to_screen_location(at);
            animated.push(AnimatedMarker {
                marker: map.add_marker(marker_options_for(cluster, at, 1.0, chooser)),
                from: pixel,
                to: pixel,
                fade: Fade::Out,
            });
        }

        debug!(
            "transition starting: {} animated, {} stationary markers",
            animated.len(),
            stationary.len()
        );
        self.playback = Some(Playback {
            plan,
            started_at: now,
            frames: 0,
            finished: false,
            animated,
            stationary,
        });
        PlayerEvent::Starting
    }

    /// Advances the animation to `now`
    ///
    /// `Started` is reported once the first frame has been on screen, i.e. on
    /// the second call; `Finished` once progress reaches the end.
    pub fn on_frame(&mut self, now: Instant, map: &mut dyn MapHost) -> Vec<PlayerEvent> {
        let mut events = Vec::new();
        let Some(playback) = self.playback.as_mut() else {
            return events;
        };
        if playback.finished {
            return events;
        }

        let elapsed = now.saturating_duration_since(playback.started_at);
        let progress = if self.duration.is_zero() {
            1.0
        } else {
            (elapsed.as_secs_f64() / self.duration.as_secs_f64()).min(1.0)
        };
        let eased = self.easing.apply(progress);
        let projection = Arc::clone(playback.plan.projection());

        for a in &playback.animated {
            match a.fade {
                Fade::None => {
                    let position = projection.from_screen_location(a.from.lerp(&a.to, eased));
                    map.set_marker_position(a.marker, position);
                }
                Fade::In => map.set_marker_alpha(a.marker, eased as f32),
                Fade::Out => map.set_marker_alpha(a.marker, (1.0 - eased) as f32),
            }
        }

        if playback.frames == 1 {
            events.push(PlayerEvent::Started);
        }
        playback.frames = playback.frames.saturating_add(1);

        if progress >= 1.0 {
            if playback.frames == 1 {
                // Ended on its first frame; the host still needs both events.
                events.push(PlayerEvent::Started);
            }
            playback.finished = true;
            debug!("transition finished after {} frames", playback.frames);
            events.push(PlayerEvent::Finished);
        }
        events
    }

    /// Releases transition markers once the host drew the destination markers
    pub fn on_host_plotted_destinations(&mut self, map: &mut dyn MapHost) {
        self.release(map);
    }

    /// Aborts playback, removing every transition marker immediately
    pub fn cancel(&mut self, map: &mut dyn MapHost) {
        if self.is_running() {
            debug!("transition cancelled");
        }
        self.release(map);
    }

    fn release(&mut self, map: &mut dyn MapHost) {
        if let Some(playback) = self.playback.take() {
            for a in &playback.animated {
                map.remove_marker(a.marker);
            }
            for &(marker, _) in &playback.stationary {
                map.remove_marker(marker);
            }
        }
    }

    /// True if `marker` is one of the moving or fading transition markers
    pub fn is_animated(&self, marker: MarkerId) -> bool {
        self.playback
            .as_ref()
            .is_some_and(|p| p.animated.iter().any(|a| a.marker == marker))
    }

    /// Destination cluster of a stationary transition marker
    pub fn stationary_cluster(&self, marker: MarkerId) -> Option<(Arc<ClusterSet>, usize)> {
        let playback = self.playback.as_ref()?;
        playback
            .stationary
            .iter()
            .find(|(m, _)| *m == marker)
            .map(|&(_, index)| (Arc::clone(playback.plan.current()), index))
    }
}
