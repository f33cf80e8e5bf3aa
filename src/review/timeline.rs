/// Whether the timeline is auto-advancing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Playback {
    #[default]
    Stopped,
    Playing,
}

/// Default per-tick increment. A full pass over the animation takes 2000
/// ticks, 20 seconds at the default cadence.
pub const DEFAULT_STEP: f32 = 0.0005;

/// Default seconds between auto-advance ticks.
pub const DEFAULT_TICK_INTERVAL: f32 = 0.01;

/// Owns the review position in [0, 1] and its playback state.
///
/// The scrubber and the auto-play timer both mutate the position through
/// this one owner; every other component reads it as input for the frame.
#[derive(Debug, Clone)]
pub struct Timeline {
    position: f32,
    state: Playback,
    step: f32,
    tick_interval: f32,
    accumulator: f32,
}

impl Default for Timeline {
    fn default() -> Self {
        Self::new()
    }
}

impl Timeline {
    #[must_use]
    pub fn new() -> Self {
        Self {
            position: 0.0,
            state: Playback::Stopped,
            step: DEFAULT_STEP,
            tick_interval: DEFAULT_TICK_INTERVAL,
            accumulator: 0.0,
        }
    }

    /// Overrides the per-tick increment. Non-finite or non-positive values
    /// are ignored and keep the default.
    #[must_use]
    pub fn with_step(mut self, step: f32) -> Self {
        if step.is_finite() && step > 0.0 {
            self.step = step;
        } else {
            log::warn!("ignoring invalid timeline step {step}");
        }
        self
    }

    /// Overrides the tick cadence in seconds. Non-finite or non-positive
    /// values are ignored and keep the default.
    #[must_use]
    pub fn with_tick_interval(mut self, seconds: f32) -> Self {
        if seconds.is_finite() && seconds > 0.0 {
            self.tick_interval = seconds;
        } else {
            log::warn!("ignoring invalid timeline tick interval {seconds}");
        }
        self
    }

    #[inline]
    #[must_use]
    pub fn position(&self) -> f32 {
        self.position
    }

    #[inline]
    #[must_use]
    pub fn state(&self) -> Playback {
        self.state
    }

    #[inline]
    #[must_use]
    pub fn is_playing(&self) -> bool {
        self.state == Playback::Playing
    }

    #[inline]
    #[must_use]
    pub fn step(&self) -> f32 {
        self.step
    }

    /// Jumps to `value`, clamped into [0, 1]. Out-of-range and non-finite
    /// input is repaired silently; scrubber jitter is not an error. The
    /// playback state is left alone.
    pub fn seek(&mut self, value: f32) {
        self.position = if value.is_finite() {
            value.clamp(0.0, 1.0)
        } else {
            0.0
        };
    }

    /// Starts auto-advance from the current position. A no-op while already
    /// playing; never rewinds.
    pub fn play(&mut self) {
        if self.state == Playback::Playing {
            return;
        }
        self.state = Playback::Playing;
        self.accumulator = 0.0;
    }

    /// Stops auto-advance. The position is retained.
    pub fn pause(&mut self) {
        self.state = Playback::Stopped;
        self.accumulator = 0.0;
    }

    /// One auto-advance step. Reaching the end clamps to exactly 1.0 and
    /// stops playback; the timeline never wraps around.
    pub fn tick(&mut self) {
        if self.state != Playback::Playing {
            return;
        }

        let next = self.position + self.step;
        if next >= 1.0 {
            self.position = 1.0;
            self.state = Playback::Stopped;
        } else {
            self.position = next;
        }
    }

    /// Converts elapsed wall time into whole ticks, carrying the remainder,
    /// so the effective cadence does not depend on caller frame timing.
    pub fn advance(&mut self, dt: f32) {
        if self.state != Playback::Playing || !dt.is_finite() || dt <= 0.0 {
            return;
        }

        self.accumulator += dt;
        while self.accumulator >= self.tick_interval && self.state == Playback::Playing {
            self.accumulator -= self.tick_interval;
            self.tick();
        }
    }
}
