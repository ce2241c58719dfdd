//! Elapsed-time tracking for a play session.

use std::time::{Duration, Instant};

/// Monotonic stopwatch driven by the caller's tick loop.
///
/// The service never spawns anything. It records the start instant and
/// updates its elapsed reading whenever [`TimerService::tick_at`] runs,
/// so a stopped timer keeps the last reading frozen.
#[derive(Debug, Default)]
pub struct TimerService {
    started_at: Option<Instant>,
    elapsed: Duration,
}

impl TimerService {
    /// Create a stopped timer at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start counting from now. A running timer is left untouched.
    pub fn start(&mut self) {
        self.start_at(Instant::now());
    }

    /// Start counting from the given instant. A running timer is left
    /// untouched.
    pub fn start_at(&mut self, now: Instant) {
        if self.started_at.is_none() {
            self.started_at = Some(now);
            self.elapsed = Duration::ZERO;
        }
    }

    /// Refresh the elapsed reading.
    pub fn tick(&mut self) {
        self.tick_at(Instant::now());
    }

    /// Refresh the elapsed reading against the given instant.
    pub fn tick_at(&mut self, now: Instant) {
        if let Some(started) = self.started_at {
            self.elapsed = now.saturating_duration_since(started);
        }
    }

    /// Stop counting, freezing the elapsed reading.
    pub fn stop(&mut self) {
        self.stop_at(Instant::now());
    }

    /// Stop counting at the given instant, freezing the elapsed reading.
    pub fn stop_at(&mut self, now: Instant) {
        self.tick_at(now);
        self.started_at = None;
    }

    /// Stop and reset the reading to zero.
    pub fn reset(&mut self) {
        self.started_at = None;
        self.elapsed = Duration::ZERO;
    }

    /// Elapsed time as of the last tick.
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Whether the timer is currently counting.
    pub fn is_running(&self) -> bool {
        self.started_at.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ticks_accumulate_from_the_start_instant() {
        let origin = Instant::now();
        let mut timer = TimerService::new();
        timer.start_at(origin);
        timer.tick_at(origin + Duration::from_millis(250));
        assert_eq!(timer.elapsed(), Duration::from_millis(250));
        timer.tick_at(origin + Duration::from_secs(3));
        assert_eq!(timer.elapsed(), Duration::from_secs(3));
    }

    #[test]
    fn starting_twice_keeps_the_original_origin() {
        let origin = Instant::now();
        let mut timer = TimerService::new();
        timer.start_at(origin);
        timer.start_at(origin + Duration::from_secs(10));
        timer.tick_at(origin + Duration::from_secs(12));
        assert_eq!(timer.elapsed(), Duration::from_secs(12));
    }

    #[test]
    fn stop_freezes_the_reading() {
        let origin = Instant::now();
        let mut timer = TimerService::new();
        timer.start_at(origin);
        timer.stop_at(origin + Duration::from_secs(5));
        assert!(!timer.is_running());
        timer.tick_at(origin + Duration::from_secs(60));
        assert_eq!(timer.elapsed(), Duration::from_secs(5));
    }

    #[test]
    fn reset_returns_to_zero() {
        let origin = Instant::now();
        let mut timer = TimerService::new();
        timer.start_at(origin);
        timer.tick_at(origin + Duration::from_secs(4));
        timer.reset();
        assert_eq!(timer.elapsed(), Duration::ZERO);
        assert!(!timer.is_running());
    }

    #[test]
    fn tick_before_start_is_a_no_op() {
        let mut timer = TimerService::new();
        timer.tick_at(Instant::now() + Duration::from_secs(9));
        assert_eq!(timer.elapsed(), Duration::ZERO);
    }
}
