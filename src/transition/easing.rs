//! Timing curves for transition progress

use std::f64::consts::PI;

/// Timing curve applied to transition progress
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Easing {
    Linear,
    Accelerate,
    Decelerate,
    /// Slow start and end, fastest in the middle
    #[default]
    AccelerateDecelerate,
}

impl Easing {
    /// Maps linear progress in `[0, 1]` to eased progress in `[0, 1]`
    pub fn apply(&self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Easing::Linear => t,
            Easing::Accelerate => t * t,
            Easing::Decelerate => 1.0 - (1.0 - t) * (1.0 - t),
            Easing::AccelerateDecelerate => ((t + 1.0) * PI).cos() / 2.0 + 0.5,
        }
    }
}
