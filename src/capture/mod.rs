//! Capture sources feeding the waveform pipeline.
//!
//! Each source turns raw audio (or a synthetic envelope) into [`SampleInput`]
//! payloads stamped with a [`SessionClock`] time and hands them to a
//! [`SharedPipeline`](crate::waveform::SharedPipeline).
//!
//! [`SampleInput`]: crate::waveform::SampleInput

pub mod analysis;
pub mod microphone;
pub mod synthetic;

pub use analysis::{pcm_level, to_mono, BandAnalyzer, ChunkAnalyzer};
pub use microphone::{list_input_devices, InputDeviceInfo, MicrophoneCapture};
pub use synthetic::{SyntheticCapture, SyntheticShape, SyntheticVoice};

use std::time::Instant;

/// Monotonic millisecond clock shared by producers and the render loop.
#[derive(Debug, Clone, Copy)]
pub struct SessionClock {
    epoch: Instant,
}

impl SessionClock {
    pub fn new() -> Self {
        Self {
            epoch: Instant::now(),
        }
    }

    /// Milliseconds since the clock was created.
    pub fn now_ms(&self) -> f64 {
        self.epoch.elapsed().as_secs_f64() * 1000.0
    }
}

impl Default for SessionClock {
    fn default() -> Self {
        Self::new()
    }
}
