//! Matching of consecutive cluster sets and animated playback of the result
pub mod differ;
pub mod easing;
pub mod player;

#[cfg(test)]
mod differ_test;

pub use differ::{Transition, TransitionKind, TransitionPlan, diff};
pub use easing::Easing;
pub use player::{PlayerEvent, TransitionPlayer};
