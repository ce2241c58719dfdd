//! Opponent clip playback model.
//!
//! The terminal cannot decode the promotional clip, so the opponent is a
//! wall-clock simulation of it. Position advances in real time while the
//! clip plays and clamps at its duration.

use std::time::Instant;

use serde::{Deserialize, Serialize};

/// Playhead reading taken from the opponent clip.
///
/// Both fields are optional so a clip with unknown timing degrades to a
/// fail-safe loss downstream rather than a phantom win.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct VideoCue {
    /// Current playhead position in seconds.
    pub position: Option<f64>,
    /// Total clip duration in seconds.
    pub duration: Option<f64>,
}

/// Simulated clip driven by the caller's clock.
#[derive(Debug)]
pub struct ClockVideo {
    duration: Option<f64>,
    playing_since: Option<Instant>,
    position: f64,
}

impl ClockVideo {
    /// Create a paused clip of the given length at position zero.
    pub fn new(duration_secs: f64) -> Self {
        Self {
            duration: Some(duration_secs),
            playing_since: None,
            position: 0.0,
        }
    }

    /// Create a clip with no timing metadata.
    pub fn unavailable() -> Self {
        Self {
            duration: None,
            playing_since: None,
            position: 0.0,
        }
    }

    /// Begin playback from the current position. Already playing is a
    /// no-op.
    pub fn play(&mut self) {
        self.play_at(Instant::now());
    }

    /// Begin playback as of the given instant.
    pub fn play_at(&mut self, now: Instant) {
        if self.playing_since.is_none() {
            self.playing_since = Some(now);
        }
    }

    /// Pause playback, keeping the playhead where it is.
    pub fn pause_at(&mut self, now: Instant) {
        self.position = self.position_at(now);
        self.playing_since = None;
    }

    /// Stop playback and move the playhead back to zero.
    pub fn rewind(&mut self) {
        self.position = 0.0;
        self.playing_since = None;
    }

    /// Playhead position in seconds, clamped to the clip duration.
    pub fn position_at(&self, now: Instant) -> f64 {
        let mut position = self.position;
        if let Some(since) = self.playing_since {
            position += now.saturating_duration_since(since).as_secs_f64();
        }
        if let Some(duration) = self.duration {
            position = position.min(duration);
        }
        position
    }

    /// Snapshot of the playhead for outcome classification.
    pub fn cue_at(&self, now: Instant) -> VideoCue {
        VideoCue {
            position: self.duration.map(|_| self.position_at(now)),
            duration: self.duration,
        }
    }

    /// Whether the playhead has reached the end of the clip.
    ///
    /// A clip without timing metadata never ends on its own.
    pub fn has_ended_at(&self, now: Instant) -> bool {
        match self.duration {
            Some(duration) => self.position_at(now) >= duration,
            None => false,
        }
    }

    /// Whether the clip is currently playing.
    pub fn is_playing(&self) -> bool {
        self.playing_since.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn playhead_advances_while_playing() {
        let origin = Instant::now();
        let mut video = ClockVideo::new(90.0);
        video.play_at(origin);
        let position = video.position_at(origin + Duration::from_secs(12));
        assert!((position - 12.0).abs() < 1e-9);
    }

    #[test]
    fn playhead_clamps_at_the_duration() {
        let origin = Instant::now();
        let mut video = ClockVideo::new(10.0);
        video.play_at(origin);
        let later = origin + Duration::from_secs(25);
        assert!((video.position_at(later) - 10.0).abs() < 1e-9);
        assert!(video.has_ended_at(later));
    }

    #[test]
    fn pause_freezes_the_playhead() {
        let origin = Instant::now();
        let mut video = ClockVideo::new(90.0);
        video.play_at(origin);
        video.pause_at(origin + Duration::from_secs(5));
        assert!(!video.is_playing());
        let position = video.position_at(origin + Duration::from_secs(50));
        assert!((position - 5.0).abs() < 1e-9);
    }

    #[test]
    fn rewind_returns_to_zero_and_stops() {
        let origin = Instant::now();
        let mut video = ClockVideo::new(90.0);
        video.play_at(origin);
        video.rewind();
        assert!(!video.is_playing());
        assert_eq!(video.position_at(origin + Duration::from_secs(30)), 0.0);
    }

    #[test]
    fn playing_twice_keeps_the_original_origin() {
        let origin = Instant::now();
        let mut video = ClockVideo::new(90.0);
        video.play_at(origin);
        video.play_at(origin + Duration::from_secs(40));
        let position = video.position_at(origin + Duration::from_secs(41));
        assert!((position - 41.0).abs() < 1e-9);
    }

    #[test]
    fn unavailable_clip_reports_no_timing() {
        let origin = Instant::now();
        let mut video = ClockVideo::unavailable();
        video.play_at(origin);
        let cue = video.cue_at(origin + Duration::from_secs(10));
        assert_eq!(cue.position, None);
        assert_eq!(cue.duration, None);
        assert!(!video.has_ended_at(origin + Duration::from_secs(1000)));
    }
}
