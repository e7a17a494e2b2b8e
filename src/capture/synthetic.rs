//! Deterministic speech-like producer for demos and tests.
//!
//! Generates phrases of syllable bursts separated by pauses, delivered at an
//! irregular cadence around the configured rate, the way a real capture
//! driver would.

use std::f64::consts::{PI, TAU};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use super::SessionClock;
use crate::waveform::{SampleInput, SharedPipeline};

const PHRASE_MS: f64 = 2600.0;
const PAUSE_MS: f64 = 900.0;
const SYLLABLES_PER_SECOND: f64 = 4.3;
const NOISE_FLOOR: f32 = 0.03;

/// Relative spectral weight per band for voiced sound.
const FORMANT_SHAPE: [f32; 7] = [0.7, 1.0, 0.85, 0.6, 0.45, 0.3, 0.2];

/// Payload shape the synthetic producer emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyntheticShape {
    /// One scalar level per event (web-like sources)
    Level,
    /// A band vector of the given width (native analysers)
    Bands(usize),
}

/// Speech-like level envelope as a pure function of time.
#[derive(Debug, Clone)]
pub struct SyntheticVoice {
    shape: SyntheticShape,
    seed: u64,
}

impl SyntheticVoice {
    pub fn new(shape: SyntheticShape, seed: u64) -> Self {
        Self { shape, seed }
    }

    /// Overall level at `t_ms`, in `[0, 1]`.
    pub fn level_at(&self, t_ms: f64) -> f32 {
        let cycle = t_ms.rem_euclid(PHRASE_MS + PAUSE_MS);
        let noise = self.noise(t_ms) * 0.02;
        if cycle >= PHRASE_MS {
            return NOISE_FLOOR + noise;
        }

        let syllable = (PI * cycle * SYLLABLES_PER_SECOND / 1000.0).sin().abs();
        let emphasis = 0.6 + 0.4 * (TAU * t_ms / 1700.0).sin();
        let voiced = 0.1 + 0.55 * syllable * emphasis;
        (voiced as f32 + noise).clamp(0.0, 1.0)
    }

    /// Producer payload at `t_ms`.
    pub fn sample(&self, t_ms: f64) -> SampleInput {
        let level = self.level_at(t_ms);
        match self.shape {
            SyntheticShape::Level => SampleInput::Level(level),
            SyntheticShape::Bands(width) => SampleInput::Bands(
                (0..width)
                    .map(|i| {
                        let weight = FORMANT_SHAPE[i * FORMANT_SHAPE.len() / width.max(1)];
                        (level * weight).clamp(0.0, 1.0)
                    })
                    .collect(),
            ),
        }
    }

    /// Delay before the next event, within 20% of `period_ms`.
    pub fn next_delay_ms(&self, t_ms: f64, period_ms: f64) -> f64 {
        period_ms * (1.0 + 0.2 * (self.noise(t_ms + 17.0) as f64 * 2.0 - 1.0))
    }

    /// Hash-based value in `[0, 1)` for a 10ms time slot.
    fn noise(&self, t_ms: f64) -> f32 {
        let slot = (t_ms / 10.0).floor() as i64 as u64;
        let mut x = slot ^ self.seed.wrapping_mul(0x9E37_79B9_7F4A_7C15);
        x ^= x >> 33;
        x = x.wrapping_mul(0xFF51_AFD7_ED55_8CCD);
        x ^= x >> 33;
        (x >> 40) as f32 / (1u64 << 24) as f32
    }
}

/// Background thread pushing a [`SyntheticVoice`] into a pipeline.
pub struct SyntheticCapture {
    running: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl SyntheticCapture {
    /// Starts producing at roughly `rate_hz` events per second.
    pub fn spawn(
        voice: SyntheticVoice,
        rate_hz: u32,
        pipeline: SharedPipeline,
        clock: SessionClock,
    ) -> Self {
        let running = Arc::new(AtomicBool::new(true));
        let flag = Arc::clone(&running);
        let period_ms = 1000.0 / rate_hz.max(1) as f64;

        tracing::debug!("Synthetic producer started at ~{}Hz", rate_hz);
        let handle = thread::spawn(move || {
            while flag.load(Ordering::Relaxed) {
                let now = clock.now_ms();
                let input = voice.sample(now);
                {
                    let mut pipeline = pipeline.lock().unwrap_or_else(PoisonError::into_inner);
                    pipeline.on_sample(input, now);
                }
                let delay = voice.next_delay_ms(now, period_ms);
                thread::sleep(Duration::from_secs_f64(delay.max(1.0) / 1000.0));
            }
        });

        Self {
            running,
            handle: Some(handle),
        }
    }

    /// Stops the producer thread and waits for it to exit.
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                tracing::error!("Synthetic producer thread panicked");
            }
        }
    }
}

impl Drop for SyntheticCapture {
    fn drop(&mut self) {
        self.stop();
    }
}
