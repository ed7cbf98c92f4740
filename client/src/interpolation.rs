//! Time-window interpolation for remotely controlled entities.
//!
//! Each authoritative update becomes the new target and whatever is currently
//! on screen becomes the start. Rendering then blends linearly from start to
//! target over a fixed window.

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InterpolationConfig {
    pub window_ms: u64,
}

impl Default for InterpolationConfig {
    fn default() -> Self {
        Self { window_ms: 30 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Interpolated {
    start: (f32, f32),
    target: (f32, f32),
    current: (f32, f32),
    updated_at: u64,
}

impl Interpolated {
    pub fn new(x: f32, y: f32, now_ms: u64) -> Self {
        Self {
            start: (x, y),
            target: (x, y),
            current: (x, y),
            updated_at: now_ms,
        }
    }

    pub fn retarget(&mut self, x: f32, y: f32, now_ms: u64) {
        self.start = self.current;
        self.target = (x, y);
        self.updated_at = now_ms;
    }

    /// Jumps straight to a position with no blending.
    pub fn snap(&mut self, x: f32, y: f32, now_ms: u64) {
        self.start = (x, y);
        self.target = (x, y);
        self.current = (x, y);
        self.updated_at = now_ms;
    }

    /// Advances the blend to `now_ms` and returns the position to draw.
    pub fn sample(&mut self, now_ms: u64, window_ms: u64) -> (f32, f32) {
        let t = if window_ms == 0 {
            1.0
        } else {
            (now_ms.saturating_sub(self.updated_at) as f32 / window_ms as f32).min(1.0)
        };
        self.current = (
            self.start.0 + (self.target.0 - self.start.0) * t,
            self.start.1 + (self.target.1 - self.start.1) * t,
        );
        self.current
    }

    pub fn current(&self) -> (f32, f32) {
        self.current
    }

    pub fn target(&self) -> (f32, f32) {
        self.target
    }
}
