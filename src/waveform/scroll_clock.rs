//! Scroll offset and fade-out state machine, driven by display frames.
//!
//! The clock runs on render ticks, never on sample arrival, so the conveyor
//! moves at a constant speed however irregular the producer is.
//!
//! ```text
//! Idle --start--> Recording --stop--> Decaying --buffer empty--> Idle
//!                     ^                   |
//!                     +------start--------+
//! ```

use serde::{Deserialize, Serialize};

use super::buffer::RollingWindowBuffer;

/// Phase of the scroll/fade animation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScrollPhase {
    #[default]
    Idle,
    Recording,
    Decaying,
}

impl std::fmt::Display for ScrollPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Recording => write!(f, "recording"),
            Self::Decaying => write!(f, "decaying"),
        }
    }
}

/// What a call to [`ScrollClock::start`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    /// Idle to Recording
    Started,
    /// Decaying to Recording; the partially faded state must be discarded
    Restarted,
    /// Already recording, nothing changed
    AlreadyRecording,
}

/// Constant-rate scroll driver with a decay sequence on stop.
#[derive(Debug, Clone)]
pub struct ScrollClock {
    phase: ScrollPhase,
    offset: f32,
    display_width: f32,
    period_ms: f64,
    origin_ms: f64,
    attenuation: f32,
    visibility_threshold: f32,
}

impl ScrollClock {
    pub fn new(
        display_width: f32,
        period_ms: f64,
        attenuation: f32,
        visibility_threshold: f32,
    ) -> Self {
        Self {
            phase: ScrollPhase::Idle,
            offset: 0.0,
            display_width,
            period_ms,
            origin_ms: 0.0,
            attenuation,
            visibility_threshold,
        }
    }

    pub fn phase(&self) -> ScrollPhase {
        self.phase
    }

    pub fn offset(&self) -> f32 {
        self.offset
    }

    pub fn set_display_width(&mut self, display_width: f32) {
        self.display_width = display_width;
    }

    /// Enters `Recording`, restarting the conveyor at offset 0.
    pub fn start(&mut self, now_ms: f64) -> StartOutcome {
        let outcome = match self.phase {
            ScrollPhase::Recording => return StartOutcome::AlreadyRecording,
            ScrollPhase::Idle => StartOutcome::Started,
            ScrollPhase::Decaying => StartOutcome::Restarted,
        };
        tracing::debug!("Scroll clock: {} -> recording", self.phase);
        self.phase = ScrollPhase::Recording;
        self.origin_ms = now_ms;
        self.offset = 0.0;
        outcome
    }

    /// Enters `Decaying` from `Recording`. Safe to call in any phase.
    ///
    /// Returns true if the phase changed.
    pub fn stop(&mut self) -> bool {
        if self.phase != ScrollPhase::Recording {
            return false;
        }
        tracing::debug!("Scroll clock: recording -> decaying");
        self.phase = ScrollPhase::Decaying;
        true
    }

    /// Advances one display frame and returns the scroll offset.
    ///
    /// While decaying, runs one attenuation step on `buffer` and drops to
    /// `Idle` once it is empty.
    pub fn advance(&mut self, now_ms: f64, buffer: &mut RollingWindowBuffer) -> f32 {
        match self.phase {
            ScrollPhase::Idle => {
                self.offset = 0.0;
            }
            ScrollPhase::Recording => {
                self.offset = self.conveyor_offset(now_ms);
            }
            ScrollPhase::Decaying => {
                self.offset = self.conveyor_offset(now_ms);
                decay_step(buffer, self.attenuation, self.visibility_threshold);
                if buffer.is_empty() {
                    tracing::debug!("Scroll clock: decaying -> idle");
                    buffer.clear();
                    self.phase = ScrollPhase::Idle;
                    self.offset = 0.0;
                }
            }
        }
        self.offset
    }

    fn conveyor_offset(&self, now_ms: f64) -> f32 {
        let elapsed = (now_ms - self.origin_ms).max(0.0);
        let progress = (elapsed % self.period_ms) / self.period_ms;
        progress as f32 * self.display_width
    }
}

/// One fade-out step: attenuate all levels, drop the ones no longer visible.
///
/// Returns the number of dropped samples.
pub fn decay_step(buffer: &mut RollingWindowBuffer, attenuation: f32, visibility_floor: f32) -> usize {
    buffer.attenuate(attenuation, visibility_floor)
}

/// Number of decay steps after which a sample at `max_level` is gone:
/// `ceil(ln(floor / max) / ln(attenuation))`.
pub fn decay_steps_to_silence(max_level: f32, attenuation: f32, visibility_floor: f32) -> u32 {
    if max_level < visibility_floor {
        return 0;
    }
    let ratio = (visibility_floor as f64 / max_level as f64).ln() / (attenuation as f64).ln();
    ratio.ceil().max(1.0) as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::waveform::buffer::Sample;
    use approx::assert_relative_eq;

    fn clock() -> ScrollClock {
        ScrollClock::new(100.0, 2000.0, 0.95, 0.02)
    }

    #[test]
    fn test_idle_offset_is_pinned() {
        let mut clock = clock();
        let mut buffer = RollingWindowBuffer::new(1000.0, 10);
        assert_eq!(clock.advance(5000.0, &mut buffer), 0.0);
        assert_eq!(clock.phase(), ScrollPhase::Idle);
    }

    #[test]
    fn test_recording_offset_wraps_each_period() {
        let mut clock = clock();
        let mut buffer = RollingWindowBuffer::new(1000.0, 10);
        assert_eq!(clock.start(1000.0), StartOutcome::Started);

        assert_relative_eq!(clock.advance(1000.0, &mut buffer), 0.0);
        assert_relative_eq!(clock.advance(1500.0, &mut buffer), 25.0);
        assert_relative_eq!(clock.advance(2999.0, &mut buffer), 99.95, epsilon = 1e-3);
        assert_relative_eq!(clock.advance(3000.0, &mut buffer), 0.0);
        assert_relative_eq!(clock.advance(4000.0, &mut buffer), 50.0);
    }

    #[test]
    fn test_stop_is_idempotent() {
        let mut clock = clock();
        assert!(!clock.stop(), "stop while idle is a no-op");

        clock.start(0.0);
        assert!(clock.stop());
        assert!(!clock.stop());
        assert_eq!(clock.phase(), ScrollPhase::Decaying);
    }

    #[test]
    fn test_decay_runs_to_idle() {
        let mut clock = clock();
        let mut buffer = RollingWindowBuffer::new(10_000.0, 10);
        buffer.push(Sample::new(0.5, 0.0), 0.0);
        buffer.push(Sample::new(0.9, 40.0), 40.0);

        clock.start(0.0);
        clock.stop();

        let steps = decay_steps_to_silence(buffer.max_level(), 0.95, 0.02);
        for frame in 0..steps - 1 {
            clock.advance(100.0 + frame as f64 * 16.0, &mut buffer);
            assert_eq!(clock.phase(), ScrollPhase::Decaying);
        }
        clock.advance(10_000.0, &mut buffer);

        assert_eq!(clock.phase(), ScrollPhase::Idle);
        assert!(buffer.is_empty());
        assert_eq!(clock.offset(), 0.0);
    }

    #[test]
    fn test_restart_during_decay() {
        let mut clock = clock();
        clock.start(0.0);
        clock.stop();
        assert_eq!(clock.start(500.0), StartOutcome::Restarted);
        assert_eq!(clock.phase(), ScrollPhase::Recording);
        assert_eq!(clock.start(600.0), StartOutcome::AlreadyRecording);
    }

    #[test]
    fn test_decay_steps_formula() {
        // ln(0.02 / 0.9) / ln(0.95) = 74.2...
        assert_eq!(decay_steps_to_silence(0.9, 0.95, 0.02), 75);
        assert_eq!(decay_steps_to_silence(0.01, 0.95, 0.02), 0);
    }
}
