//! Waveform driven by the synthetic voice, for terminals without a microphone.

use crate::capture::{SessionClock, SyntheticCapture, SyntheticShape, SyntheticVoice};
use crate::commands::session::run_session;
use crate::config::AppConfig;
use crate::waveform::{ScalingProfileId, WaveformPipeline};

/// Options for [`handle_simulate`].
#[derive(Debug, Clone, Default)]
pub struct SimulateOptions {
    /// Emit band vectors of this width instead of scalar levels
    pub bands: Option<usize>,
    /// Producer rate override
    pub rate_hz: Option<u32>,
    /// Scaling profile override
    pub profile: Option<ScalingProfileId>,
    pub seed: u64,
}

/// Runs an interactive session fed by [`SyntheticCapture`].
///
/// # Errors
/// - If the configuration cannot be loaded or is invalid
/// - If the terminal cannot be driven
pub fn handle_simulate(options: SimulateOptions) -> anyhow::Result<()> {
    let mut config = AppConfig::load()?;
    if let Some(profile) = options.profile {
        config.waveform.scaling_profile = profile;
        config.waveform.custom_profile = None;
    }

    let shape = match options.bands {
        Some(width) if width > 0 => SyntheticShape::Bands(width),
        _ => SyntheticShape::Level,
    };
    let rate_hz = options.rate_hz.unwrap_or(config.capture.synthetic_rate_hz);
    tracing::info!(
        "=== wavetide simulation started: {:?} at {}Hz, profile {} ===",
        shape,
        rate_hz,
        config.waveform.scaling_profile
    );

    let pipeline = WaveformPipeline::new(config.waveform.clone())?.into_shared();
    let clock = SessionClock::new();
    let mut producer = SyntheticCapture::spawn(
        SyntheticVoice::new(shape, options.seed),
        rate_hz,
        pipeline.clone(),
        clock,
    );

    let label = format!("synthetic {rate_hz}Hz");
    let result = run_session(&pipeline, clock, &config.display, &label);
    producer.stop();

    tracing::info!("=== wavetide simulation ended ===");
    result
}
