//! Canvas opacity fade

use std::time::Duration;

/// Linear fade of the UI layer's opacity between two values
#[derive(Debug, Clone, PartialEq)]
pub struct CanvasFade {
    from: f32,
    to: f32,
    duration: Duration,
    elapsed: Duration,
}

impl CanvasFade {
    pub fn new(from: f32, to: f32, duration: Duration) -> Self {
        Self {
            from: from.clamp(0.0, 1.0),
            to: to.clamp(0.0, 1.0),
            duration,
            elapsed: Duration::ZERO,
        }
    }

    /// Advance by one frame of unscaled time and return the new opacity
    pub fn advance(&mut self, unscaled_delta: Duration) -> f32 {
        self.elapsed = (self.elapsed + unscaled_delta).min(self.duration);
        self.value()
    }

    pub fn value(&self) -> f32 {
        if self.is_finished() {
            return self.to;
        }
        let t = self.elapsed.as_secs_f32() / self.duration.as_secs_f32();
        self.from + (self.to - self.from) * t
    }

    pub fn is_finished(&self) -> bool {
        self.elapsed >= self.duration
    }
}
