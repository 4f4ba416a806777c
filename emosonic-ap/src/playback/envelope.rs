//! Time-based gain ramps

use emosonic_common::FadeCurve;
use std::time::Duration;

/// A gain ramp between two levels over a fixed span of session time
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GainEnvelope {
    pub start_at: Duration,
    pub duration: Duration,
    pub from: f32,
    pub to: f32,
    pub curve: FadeCurve,
    /// Smallest gain an exponential ramp may touch
    pub floor: f32,
}

impl GainEnvelope {
    pub fn new(
        start_at: Duration,
        duration: Duration,
        from: f32,
        to: f32,
        curve: FadeCurve,
        floor: f32,
    ) -> Self {
        Self {
            start_at,
            duration,
            from,
            to,
            curve,
            floor,
        }
    }

    /// Gain at session time `now`
    ///
    /// Holds `from` before the start and the curve's end value afterwards.
    pub fn gain_at(&self, now: Duration) -> f32 {
        if now < self.start_at {
            return self.from;
        }
        let position = if self.duration.is_zero() {
            1.0
        } else {
            ((now - self.start_at).as_secs_f64() / self.duration.as_secs_f64()) as f32
        };
        self.curve.interpolate(self.from, self.to, position, self.floor)
    }

    pub fn end(&self) -> Duration {
        self.start_at + self.duration
    }

    pub fn is_complete(&self, now: Duration) -> bool {
        now >= self.end()
    }
}
