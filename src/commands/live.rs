//! Live microphone waveform.

use crate::capture::{MicrophoneCapture, SessionClock};
use crate::commands::session::run_session;
use crate::config::AppConfig;
use crate::ui::show_error;
use crate::waveform::WaveformPipeline;

/// Shows the scrolling waveform of the configured input device.
///
/// Space starts and stops capture, Escape/q leaves.
///
/// # Errors
/// - If the configuration cannot be loaded or is invalid
/// - If the audio device cannot be opened
/// - If the terminal cannot be driven
pub fn handle_live() -> anyhow::Result<()> {
    tracing::info!("=== wavetide live session started ===");

    let config = match AppConfig::load() {
        Ok(config) => config,
        Err(err) => {
            tracing::error!("Failed to load configuration: {err:#}");
            show_error(
                "Configuration error",
                &format!("{err:#}\n\nCheck ~/.config/wavetide/wavetide.toml and try again."),
            )?;
            return Err(err);
        }
    };

    tracing::info!(
        "Configuration loaded: device={}, reference_level={}dBFS, chunk={}ms, profile={}",
        config.capture.device,
        config.capture.reference_level_db,
        config.capture.chunk_ms,
        config.waveform.scaling_profile
    );

    let pipeline = WaveformPipeline::new(config.waveform.clone())?.into_shared();
    let clock = SessionClock::new();

    let mut microphone = MicrophoneCapture::new(&config.capture, config.waveform.band_count);
    if let Err(err) = microphone.start(pipeline.clone(), clock) {
        tracing::error!("Failed to open audio input: {err:#}");
        show_error(
            "Audio input error",
            &format!("{err:#}\n\nRun 'wavetide list-devices' to pick another device."),
        )?;
        return Err(err);
    }

    let label = format!("mic {}Hz", microphone.sample_rate());
    let result = run_session(&pipeline, clock, &config.display, &label);
    microphone.stop();

    tracing::info!("=== wavetide live session ended ===");
    result
}
