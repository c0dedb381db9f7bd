//! Frame timing.

use instant::{Duration, Instant};

/// Time bookkeeping for the main loop.
#[derive(Debug, Clone)]
pub struct FrameTime {
    last: Instant,
    frame_delta: f32,
    elapsed: f64,
    frame_index: u64,
}

impl FrameTime {
    pub fn new() -> Self {
        Self {
            last: Instant::now(),
            frame_delta: 0.0,
            elapsed: 0.0,
            frame_index: 0,
        }
    }

    /// Start a new frame, measuring the wall-clock time since the previous one.
    pub fn tick(&mut self) {
        let now = Instant::now();
        let dt = now - self.last;
        self.last = now;
        self.advance(dt);
    }

    /// Start a new frame that lasted `dt`.
    pub fn advance(&mut self, dt: Duration) {
        self.frame_delta = dt.as_secs_f32();
        self.elapsed += dt.as_secs_f64();
        self.frame_index += 1;
    }

    /// Seconds the previous frame took.
    pub fn frame_delta(&self) -> f32 {
        self.frame_delta
    }

    /// Seconds since start-up.
    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    pub fn frame_index(&self) -> u64 {
        self.frame_index
    }
}

impl Default for FrameTime {
    fn default() -> Self {
        Self::new()
    }
}
