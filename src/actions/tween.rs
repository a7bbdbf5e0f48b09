//! Easing curves and per-tick interpolation progress.
//!
//! Gradual effects are plain state advanced by `Action::tick`; there is no
//! hidden suspension. A [`TweenClock`] tracks elapsed time against a
//! duration and reports eased progress for each tick.

use serde::{Deserialize, Serialize};

use crate::core::clock::reached;

/// Interpolation curve mapping linear progress to eased progress.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Easing {
    #[default]
    Linear,
    EaseIn,
    EaseOut,
    EaseInOut,
    SmoothStep,
}

impl Easing {
    /// Apply the curve to `t`, clamped to `[0, 1]`.
    #[must_use]
    pub fn apply(self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Self::Linear => t,
            Self::EaseIn => t * t,
            Self::EaseOut => 1.0 - (1.0 - t) * (1.0 - t),
            Self::EaseInOut => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(2) / 2.0
                }
            }
            Self::SmoothStep => t * t * (3.0 - 2.0 * t),
        }
    }
}

/// Elapsed-time bookkeeping for one interpolation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct TweenClock {
    elapsed: f32,
    duration: f32,
    easing: Easing,
}

impl TweenClock {
    pub(crate) fn new(duration: f32, easing: Easing) -> Self {
        Self {
            elapsed: 0.0,
            duration,
            easing,
        }
    }

    /// Advance by `dt`. Returns eased progress and whether the tween is done.
    pub(crate) fn advance(&mut self, dt: f32) -> (f32, bool) {
        self.elapsed += dt.max(0.0);
        if self.duration <= 0.0 || reached(self.elapsed, self.duration) {
            return (1.0, true);
        }
        (self.easing.apply(self.elapsed / self.duration), false)
    }
}
