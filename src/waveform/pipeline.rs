//! Orchestration of normalization, smoothing, buffering, projection and scroll.

use std::sync::{Arc, Mutex};

use serde::Serialize;

use super::buffer::{RollingWindowBuffer, Sample};
use super::config::{validate_display_width, WaveformConfig};
use super::error::ConfigError;
use super::normalizer::{SampleInput, SampleNormalizer};
use super::projector::{project_bands, BarProjector};
use super::scaler::ScalingProfile;
use super::scroll_clock::{ScrollClock, ScrollPhase, StartOutcome};
use super::smoothing::BandSmoother;

/// A pipeline shared between a capture thread and a render thread.
///
/// Hold the lock only for a single `on_sample` or `on_render_tick` call.
pub type SharedPipeline = Arc<Mutex<WaveformPipeline>>;

/// Everything the render surface needs for one display refresh.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderFrame {
    /// Scaled amplitudes, one per display slot, oldest first
    pub bars: Vec<f32>,
    /// Horizontal conveyor offset in `[0, display_width)`
    pub scroll_offset: f32,
    pub phase: ScrollPhase,
    /// Scaled band vector of the newest sample, when bands are retained
    pub spectrum: Option<Vec<f32>>,
}

impl RenderFrame {
    pub fn is_idle(&self) -> bool {
        self.phase == ScrollPhase::Idle
    }
}

/// Why a sample did not make it into the buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    /// Arrived sooner than the minimum inter-sample interval
    Overrun,
    /// Capture is not active
    NotRecording,
}

/// Result of [`WaveformPipeline::on_sample`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ingest {
    Accepted,
    Dropped(DropReason),
}

/// Per-session ingestion counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PipelineStats {
    pub accepted: u64,
    pub dropped_overrun: u64,
    pub dropped_idle: u64,
    /// Samples whose level or timestamp had to be repaired
    pub malformed: u64,
}

/// One visualization surface's complete level pipeline.
///
/// Owns its buffer, per-band filters and scroll clock exclusively.
#[derive(Debug)]
pub struct WaveformPipeline {
    config: WaveformConfig,
    profile: ScalingProfile,
    normalizer: SampleNormalizer,
    smoother: BandSmoother,
    buffer: RollingWindowBuffer,
    projector: BarProjector,
    clock: ScrollClock,
    min_interval_ms: f64,
    last_accepted_ms: Option<f64>,
    /// Latest time seen from `start` or a render tick
    latest_tick_ms: f64,
    stats: PipelineStats,
}

impl WaveformPipeline {
    /// Builds a pipeline in the `Idle` phase.
    ///
    /// # Errors
    /// - If the configuration breaks any construction-time rule
    pub fn new(config: WaveformConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let profile = config.resolve_profile()?;

        tracing::debug!(
            "Waveform pipeline: {} slots, {} bands, {}ms window (capacity {}), profile {}",
            config.slot_count,
            config.band_count,
            config.window_duration_ms,
            config.capacity(),
            if config.custom_profile.is_some() {
                "custom".to_string()
            } else {
                config.scaling_profile.to_string()
            }
        );

        Ok(Self {
            profile,
            normalizer: SampleNormalizer::new(
                config.band_count,
                config.min_level_floor,
                config.scalar_jitter,
            ),
            smoother: BandSmoother::new(config.band_count, config.smoothing_window),
            buffer: RollingWindowBuffer::new(config.window_duration_ms as f64, config.capacity()),
            projector: BarProjector::new(config.slot_count, config.baseline_level),
            clock: ScrollClock::new(
                config.display_width,
                config.scroll_period_ms as f64,
                config.decay_attenuation,
                config.visibility_threshold,
            ),
            min_interval_ms: config.min_sample_interval_ms as f64,
            last_accepted_ms: None,
            latest_tick_ms: 0.0,
            stats: PipelineStats::default(),
            config,
        })
    }

    /// Wraps the pipeline for use from capture and render threads.
    pub fn into_shared(self) -> SharedPipeline {
        Arc::new(Mutex::new(self))
    }

    /// Ingests one producer payload: normalize, smooth, append.
    ///
    /// Never fails. Samples are dropped while not recording or when they
    /// arrive faster than the configured minimum interval. NaN/negative
    /// timestamps are replaced by the later of the last accepted timestamp
    /// and the latest render tick, and are rate limited like any other.
    pub fn on_sample(&mut self, input: SampleInput, timestamp_ms: f64) -> Ingest {
        if self.clock.phase() != ScrollPhase::Recording {
            self.stats.dropped_idle += 1;
            return Ingest::Dropped(DropReason::NotRecording);
        }

        let mut malformed = false;
        let timestamp_ms = if timestamp_ms.is_finite() && timestamp_ms >= 0.0 {
            timestamp_ms
        } else {
            malformed = true;
            let substitute = self
                .last_accepted_ms
                .unwrap_or(0.0)
                .max(self.latest_tick_ms);
            tracing::warn!(
                "Invalid sample timestamp {}; using {:.1}ms",
                timestamp_ms,
                substitute
            );
            substitute
        };

        if let Some(last) = self.last_accepted_ms {
            let gap = timestamp_ms - last;
            if gap >= 0.0 && gap < self.min_interval_ms {
                self.stats.dropped_overrun += 1;
                tracing::debug!("Dropping sample {:.1}ms after the previous one", gap);
                return Ingest::Dropped(DropReason::Overrun);
            }
        }

        let normalized = self.normalizer.normalize(&input, timestamp_ms);
        if normalized.repaired {
            malformed = true;
            tracing::warn!("Malformed sample payload replaced with floor level");
        }
        if malformed {
            self.stats.malformed += 1;
        }

        let smoothed = self.smoother.smooth(&normalized.bands);
        let mut sample = Sample::new(smoothed.mean(), timestamp_ms);
        if self.config.retain_bands {
            sample = sample.with_bands(smoothed);
        }

        self.buffer.push(sample, timestamp_ms);
        self.last_accepted_ms = Some(timestamp_ms);
        self.stats.accepted += 1;
        Ingest::Accepted
    }

    /// Produces the frame for one display refresh.
    ///
    /// Reads the buffer, except while fading out, when one decay step runs.
    pub fn on_render_tick(&mut self, now_ms: f64) -> RenderFrame {
        if now_ms.is_finite() {
            self.latest_tick_ms = self.latest_tick_ms.max(now_ms);
        }
        let was_decaying = self.clock.phase() == ScrollPhase::Decaying;
        let scroll_offset = self.clock.advance(now_ms, &mut self.buffer);
        if was_decaying && self.clock.phase() == ScrollPhase::Idle {
            self.finish_session();
        }

        let snapshot = self.buffer.snapshot();
        let bars = self.projector.project(&snapshot, &self.profile);
        let spectrum = if self.config.retain_bands {
            project_bands(&snapshot, &self.profile)
        } else {
            None
        };

        RenderFrame {
            bars,
            scroll_offset,
            phase: self.clock.phase(),
            spectrum,
        }
    }

    /// Begins (or resumes) capture.
    ///
    /// Starting from `Idle` or in the middle of a fade-out discards all
    /// history so nothing from the previous session leaks in.
    pub fn start(&mut self, now_ms: f64) {
        match self.clock.start(now_ms) {
            StartOutcome::AlreadyRecording => {}
            outcome => {
                if outcome == StartOutcome::Restarted {
                    tracing::debug!("Capture restarted during fade-out; discarding faded history");
                }
                self.buffer.clear();
                self.smoother.reset();
                self.last_accepted_ms = None;
                if now_ms.is_finite() && now_ms >= 0.0 {
                    self.latest_tick_ms = now_ms;
                }
                self.stats = PipelineStats::default();
                tracing::info!("Waveform capture started");
            }
        }
    }

    /// Stops capture and begins the fade-out. Idempotent.
    pub fn stop(&mut self) {
        if self.clock.stop() {
            tracing::info!(
                "Waveform capture stopped: {} accepted, {} overrun, {} malformed",
                self.stats.accepted,
                self.stats.dropped_overrun,
                self.stats.malformed
            );
        }
    }

    /// Changes the display geometry without touching history.
    ///
    /// # Errors
    /// - If `slot_count` is zero or `display_width` is not positive
    pub fn resize_display(&mut self, slot_count: usize, display_width: f32) -> Result<(), ConfigError> {
        if slot_count == 0 {
            return Err(ConfigError::ZeroSlots);
        }
        validate_display_width(display_width)?;
        self.projector.set_slot_count(slot_count);
        self.clock.set_display_width(display_width);
        self.config.slot_count = slot_count;
        self.config.display_width = display_width;
        Ok(())
    }

    fn finish_session(&mut self) {
        self.smoother.reset();
        self.last_accepted_ms = None;
        tracing::debug!("Fade-out complete; pipeline idle");
    }

    pub fn phase(&self) -> ScrollPhase {
        self.clock.phase()
    }

    pub fn buffer(&self) -> &RollingWindowBuffer {
        &self.buffer
    }

    pub fn config(&self) -> &WaveformConfig {
        &self.config
    }

    pub fn profile(&self) -> &ScalingProfile {
        &self.profile
    }

    pub fn stats(&self) -> PipelineStats {
        self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pipeline() -> WaveformPipeline {
        WaveformPipeline::new(WaveformConfig {
            slot_count: 10,
            scalar_jitter: 0.0,
            ..WaveformConfig::default()
        })
        .expect("valid config")
    }

    #[test]
    fn test_new_rejects_bad_config() {
        let result = WaveformPipeline::new(WaveformConfig {
            slot_count: 0,
            ..WaveformConfig::default()
        });
        assert!(matches!(result, Err(ConfigError::ZeroSlots)));
    }

    #[test]
    fn test_samples_dropped_while_idle() {
        let mut pipeline = pipeline();
        let result = pipeline.on_sample(SampleInput::Level(0.5), 0.0);
        assert_eq!(result, Ingest::Dropped(DropReason::NotRecording));
        assert!(pipeline.buffer().is_empty());
    }

    #[test]
    fn test_render_before_start_is_baseline() {
        let mut pipeline = pipeline();
        let frame = pipeline.on_render_tick(100.0);
        assert!(frame.is_idle());
        assert_eq!(frame.scroll_offset, 0.0);
        assert_eq!(frame.bars.iter().filter(|&&b| b > 0.0).count(), 2);
    }

    #[test]
    fn test_overrun_is_dropped() {
        let mut pipeline = pipeline();
        pipeline.start(0.0);
        assert_eq!(pipeline.on_sample(SampleInput::Level(0.5), 0.0), Ingest::Accepted);
        assert_eq!(
            pipeline.on_sample(SampleInput::Level(0.5), 10.0),
            Ingest::Dropped(DropReason::Overrun)
        );
        assert_eq!(pipeline.on_sample(SampleInput::Level(0.5), 40.0), Ingest::Accepted);
        assert_eq!(pipeline.stats().dropped_overrun, 1);
        assert_eq!(pipeline.buffer().len(), 2);
    }

    #[test]
    fn test_smoothing_applies_before_buffering() {
        let mut pipeline = pipeline();
        pipeline.start(0.0);
        pipeline.on_sample(SampleInput::Level(0.2), 0.0);
        pipeline.on_sample(SampleInput::Level(0.8), 40.0);

        let levels = pipeline.buffer().snapshot().levels();
        assert!((levels[0] - 0.2).abs() < 1e-6);
        assert!((levels[1] - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_malformed_sample_is_repaired() {
        let mut pipeline = pipeline();
        pipeline.start(0.0);
        pipeline.on_sample(SampleInput::Level(0.5), 100.0);
        pipeline.on_render_tick(180.0);
        let result = pipeline.on_sample(SampleInput::Level(f32::NAN), f64::NAN);

        assert_eq!(result, Ingest::Accepted);
        assert_eq!(pipeline.stats().malformed, 1);
        let newest = pipeline.buffer().snapshot().newest().cloned();
        assert_eq!(newest.map(|s| s.timestamp_ms), Some(180.0));
    }

    #[test]
    fn test_negative_timestamp_is_substituted() {
        let mut pipeline = pipeline();
        pipeline.start(0.0);
        pipeline.on_sample(SampleInput::Level(0.4), 100.0);
        pipeline.on_render_tick(300.0);

        assert_eq!(pipeline.on_sample(SampleInput::Level(0.6), -5.0), Ingest::Accepted);
        assert_eq!(pipeline.stats().malformed, 1);
        let timestamps: Vec<f64> = pipeline
            .buffer()
            .snapshot()
            .iter()
            .map(|s| s.timestamp_ms)
            .collect();
        assert_eq!(timestamps, vec![100.0, 300.0]);
    }

    #[test]
    fn test_broken_clock_is_still_rate_limited() {
        let mut pipeline = pipeline();
        pipeline.start(0.0);
        pipeline.on_sample(SampleInput::Level(0.5), 100.0);
        for _ in 0..500 {
            pipeline.on_sample(SampleInput::Level(0.5), f64::NAN);
        }

        let stats = pipeline.stats();
        assert_eq!(stats.accepted, 1);
        assert_eq!(stats.dropped_overrun, 500);
        assert_eq!(pipeline.buffer().len(), 1);

        // Render ticks advance the substitute, one sample per interval.
        for frame in 1..=10 {
            pipeline.on_render_tick(100.0 + frame as f64 * 20.0);
            pipeline.on_sample(SampleInput::Level(0.5), f64::NAN);
            pipeline.on_sample(SampleInput::Level(0.5), f64::INFINITY);
        }
        assert_eq!(pipeline.stats().accepted, 6);
    }

    #[test]
    fn test_restart_discards_faded_state() {
        let mut pipeline = pipeline();
        pipeline.start(0.0);
        pipeline.on_sample(SampleInput::Level(0.9), 0.0);
        pipeline.stop();
        pipeline.on_render_tick(16.0);
        assert_eq!(pipeline.phase(), ScrollPhase::Decaying);

        pipeline.start(32.0);
        assert_eq!(pipeline.phase(), ScrollPhase::Recording);
        assert!(pipeline.buffer().is_empty());

        pipeline.on_sample(SampleInput::Level(0.3), 40.0);
        let levels = pipeline.buffer().snapshot().levels();
        assert!((levels[0] - 0.3).abs() < 1e-6, "filter history must not leak");
    }

    #[test]
    fn test_retained_bands_reach_frame() {
        let mut pipeline = WaveformPipeline::new(WaveformConfig {
            retain_bands: true,
            band_count: 3,
            ..WaveformConfig::default()
        })
        .expect("valid config");
        pipeline.start(0.0);
        pipeline.on_sample(SampleInput::Bands(vec![0.1, 0.5, 0.9]), 0.0);

        let frame = pipeline.on_render_tick(10.0);
        let spectrum = frame.spectrum.expect("spectrum present");
        assert_eq!(spectrum.len(), 3);
        assert!(spectrum[0] < spectrum[2]);
    }

    #[test]
    fn test_resize_display_keeps_history() {
        let mut pipeline = pipeline();
        pipeline.start(0.0);
        pipeline.on_sample(SampleInput::Level(0.5), 0.0);
        pipeline.resize_display(20, 80.0).expect("valid geometry");

        let frame = pipeline.on_render_tick(500.0);
        assert_eq!(frame.bars.len(), 20);
        assert_eq!(pipeline.buffer().len(), 1);
        assert!((frame.scroll_offset - 20.0).abs() < 1e-3);
        assert!(pipeline.resize_display(0, 80.0).is_err());
    }
}
