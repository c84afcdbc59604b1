//! Matching of a new cluster set against the one on screen

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use bitvec::prelude::*;
use log::trace;

use crate::cluster::{CANCEL_CHECK_INTERVAL, ClusterSet, LatLng, PointId, Projection};
use crate::task::CancelToken;

/// Markers closer than this many pixels to their destination do not move
pub const STATIONARY_PIXEL_TOLERANCE: f64 = 0.5;

/// How a new cluster point relates to the previous cluster set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransitionKind {
    /// None of its members were shown before
    Created,
    /// Every surviving member of exactly one previous cluster, and nothing else
    /// that was shown, ended up here
    Persisted,
    /// Members come from several previous clusters
    Merged,
    /// One fragment of a previous cluster whose members spread out
    Split,
}

impl TransitionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransitionKind::Created => "created",
            TransitionKind::Persisted => "persisted",
            TransitionKind::Merged => "merged",
            TransitionKind::Split => "split",
        }
    }
}

impl fmt::Display for TransitionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Movement of previous cluster points onto one new cluster point
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub kind: TransitionKind,
    /// Indices into the previous cluster set, in first-seen member order
    pub sources: Vec<usize>,
    /// Index into the new cluster set
    pub destination: usize,
    pub source_positions: Vec<LatLng>,
    pub destination_position: LatLng,
}

impl Transition {
    /// True when no source has to travel to reach the destination
    pub fn is_stationary(&self, projection: &dyn Projection) -> bool {
        let to = projection.to_screen_location(self.destination_position);
        let tolerance = STATIONARY_PIXEL_TOLERANCE * STATIONARY_PIXEL_TOLERANCE;
        self.source_positions
            .iter()
            .all(|&from| projection.to_screen_location(from).sq_dist(&to) <= tolerance)
    }
}

/// Transitions from one cluster set to the next
pub struct TransitionPlan {
    previous: Option<Arc<ClusterSet>>,
    current: Arc<ClusterSet>,
    projection: Arc<dyn Projection>,
    transitions: Vec<Transition>,
    destroyed: Vec<usize>,
}

impl TransitionPlan {
    pub fn previous(&self) -> Option<&Arc<ClusterSet>> {
        self.previous.as_ref()
    }

    pub fn current(&self) -> &Arc<ClusterSet> {
        &self.current
    }

    pub fn projection(&self) -> &Arc<dyn Projection> {
        &self.projection
    }

    /// One entry per new cluster point, ordered by destination index
    pub fn transitions(&self) -> &[Transition] {
        &self.transitions
    }

    /// Previous cluster indices with no member left in the new set
    pub fn destroyed(&self) -> &[usize] {
        &self.destroyed
    }

    pub fn count(&self, kind: TransitionKind) -> usize {
        self.transitions.iter().filter(|t| t.kind == kind).count()
    }
}

impl fmt::Debug for TransitionPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransitionPlan")
            .field("transitions", &self.transitions)
            .field("destroyed", &self.destroyed)
            .finish()
    }
}

/// Matches `current` against `previous`
///
/// Runs one pass over the new cluster points using an index from input point
/// to previous cluster. Point ids must be unique within each set. Returns
/// `None` if `cancel` fires first.
pub fn diff(
    previous: Option<Arc<ClusterSet>>,
    current: Arc<ClusterSet>,
    projection: Arc<dyn Projection>,
    cancel: &CancelToken,
) -> Option<TransitionPlan> {
    let empty = ClusterSet::default();
    let prev: &ClusterSet = previous.as_deref().unwrap_or(&empty);

    let mut owner: HashMap<PointId, usize> = HashMap::with_capacity(prev.point_count());
    for (i, cluster) in prev.clusters().iter().enumerate() {
        for p in cluster.points() {
            let duplicate = owner.insert(p.id, i).is_some();
            debug_assert!(!duplicate, "point {:?} appears twice in a cluster set", p.id);
        }
    }

    // How many members of each previous cluster survive anywhere in the new set
    let mut surviving = vec![0usize; prev.len()];
    for cluster in current.clusters() {
        for p in cluster.points() {
            if let Some(&o) = owner.get(&p.id) {
                surviving[o] += 1;
            }
        }
    }

    let mut touched = bitvec![0; prev.len()];
    let mut transitions = Vec::with_capacity(current.len());
    let mut contributed: HashMap<usize, usize> = HashMap::new();

    for (destination, cluster) in current.clusters().iter().enumerate() {
        if destination % CANCEL_CHECK_INTERVAL == 0 && cancel.is_cancelled() {
            trace!("transition building cancelled at {}", destination);
            return None;
        }

        contributed.clear();
        let mut sources = Vec::new();
        for p in cluster.points() {
            if let Some(&o) = owner.get(&p.id) {
                let count = contributed.entry(o).or_insert(0);
                if *count == 0 {
                    sources.push(o);
                    touched.set(o, true);
                }
                *count += 1;
            }
        }

        let kind = match sources.as_slice() {
            [] => TransitionKind::Created,
            [only] if contributed[only] == surviving[*only] => TransitionKind::Persisted,
            [_] => TransitionKind::Split,
            _ => TransitionKind::Merged,
        };

        let source_positions = sources
            .iter()
            .map(|&s| prev.clusters()[s].map_position())
            .collect();
        transitions.push(Transition {
            kind,
            sources,
            destination,
            source_positions,
            destination_position: cluster.map_position(),
        });
    }

    let destroyed = (0..prev.len()).filter(|&i| !touched[i]).collect();

    Some(TransitionPlan {
        previous,
        current,
        projection,
        transitions,
        destroyed,
    })
}
