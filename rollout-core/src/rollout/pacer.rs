use std::{
    thread,
    time::{Duration, Instant},
};

/// Blocks until `interval` has passed since `last_render` and returns the time
/// right after the wait.
///
/// Returns immediately if the interval has already passed.
pub fn pace(last_render: Instant, interval: Duration) -> Instant {
    let elapsed = last_render.elapsed();
    if let Some(wait) = interval.checked_sub(elapsed) {
        if !wait.is_zero() {
            thread::sleep(wait);
        }
    }
    Instant::now()
}

/// Keeps the interval between rendered frames at or above `1 / fps`.
///
/// Only the wall-clock cadence of rendering is affected; the number of
/// environment steps and the rewards are not.
#[derive(Debug, Clone)]
pub struct RenderPacer {
    enabled: bool,
    interval: Duration,
    last_render: Instant,
}

impl RenderPacer {
    /// A pacer targeting the given frame rate.
    ///
    /// A non-positive or non-finite `fps` gives a pacer that never waits.
    pub fn new(fps: f32) -> Self {
        let interval = Duration::try_from_secs_f64(1.0 / fps as f64).unwrap_or(Duration::ZERO);
        Self {
            enabled: true,
            interval,
            last_render: Instant::now(),
        }
    }

    /// A pacer for runs without rendering.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            interval: Duration::ZERO,
            last_render: Instant::now(),
        }
    }

    /// Returns `true` if rendering is enabled.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Minimum interval between rendered frames.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Waits until the next frame may be rendered and returns the new render timestamp.
    ///
    /// Does nothing and returns the previous timestamp when rendering is disabled.
    pub fn maybe_wait(&mut self) -> Instant {
        if self.enabled {
            self.last_render = pace(self.last_render, self.interval);
        }
        self.last_render
    }
}
