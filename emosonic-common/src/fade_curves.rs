//! Fade curve implementations for voice envelopes
//!
//! A fade moves a voice's gain from one level to another over a fixed
//! duration. The curve decides the shape of that motion:
//! - Linear: constant rate of change (used for fade-in)
//! - Exponential: constant ratio per unit time, like an audio-graph
//!   exponential ramp (used for fade-out toward a near-zero floor)
//! - SCurve: smooth acceleration and deceleration
//! - EqualPower: quarter-sine shape

use serde::{Deserialize, Serialize};
use std::f32::consts::{FRAC_PI_2, PI};

/// Fade curve types for gain ramps
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FadeCurve {
    /// v(t) = from + (to - from) × t
    Linear,

    /// v(t) = from × (to / from)^t
    ///
    /// Both endpoints are clamped to the floor first; an exponential ramp
    /// cannot start or end at zero.
    Exponential,

    /// v(t) = from + (to - from) × 0.5 × (1 - cos(π × t))
    SCurve,

    /// v(t) = from + (to - from) × sin(t × π/2)
    EqualPower,
}

impl FadeCurve {
    /// Normalized shape of the curve (0.0 at start, 1.0 at end)
    ///
    /// Exponential uses a squared law here since a ratio ramp is undefined
    /// at zero; it only appears through [`FadeCurve::interpolate`].
    fn shape(&self, position: f32) -> f32 {
        let t = position.clamp(0.0, 1.0);

        match self {
            FadeCurve::Linear => t,
            FadeCurve::Exponential => t * t,
            FadeCurve::SCurve => 0.5 * (1.0 - (PI * t).cos()),
            FadeCurve::EqualPower => (t * FRAC_PI_2).sin(),
        }
    }

    /// Gain at `position` (0.0..=1.0) of a ramp from `from` to `to`
    ///
    /// `floor` is the smallest gain an exponential ramp may touch.
    pub fn interpolate(&self, from: f32, to: f32, position: f32, floor: f32) -> f32 {
        let t = position.clamp(0.0, 1.0);

        match self {
            FadeCurve::Exponential => {
                let floor = floor.max(f32::MIN_POSITIVE);
                let start = from.max(floor);
                let end = to.max(floor);
                if t >= 1.0 {
                    end
                } else {
                    start * (end / start).powf(t)
                }
            }
            _ => {
                if t >= 1.0 {
                    to
                } else {
                    from + (to - from) * self.shape(t)
                }
            }
        }
    }
}
