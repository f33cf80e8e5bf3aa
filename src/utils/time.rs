use std::time::{Duration, Instant};

/// Frame clock for driving the review loop.
///
/// Call [`tick`](Self::tick) once per frame and feed
/// [`dt_seconds`](Self::dt_seconds) into the session update.
pub struct Timer {
    last_update: Instant,
    /// Time between the two most recent ticks.
    pub delta: Duration,
    /// Total time accumulated over all ticks.
    pub elapsed: Duration,
    /// Number of ticks so far.
    pub frame_count: u64,
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}

impl Timer {
    #[must_use]
    pub fn new() -> Self {
        Self {
            last_update: Instant::now(),
            delta: Duration::ZERO,
            elapsed: Duration::ZERO,
            frame_count: 0,
        }
    }

    /// Advances the clock to now.
    pub fn tick(&mut self) {
        let now = Instant::now();
        self.delta = now - self.last_update;
        self.elapsed += self.delta;
        self.last_update = now;
        self.frame_count += 1;
    }

    #[must_use]
    pub fn dt_seconds(&self) -> f32 {
        self.delta.as_secs_f32()
    }

    #[must_use]
    pub fn elapsed_seconds(&self) -> f32 {
        self.elapsed.as_secs_f32()
    }
}
