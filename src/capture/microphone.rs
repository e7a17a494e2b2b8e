//! Microphone capture source.
//!
//! Opens an input device with cpal, mixes it down to mono, cuts the stream
//! into short chunks and pushes one level/band payload per chunk into the
//! waveform pipeline from the audio callback thread.

use anyhow::{anyhow, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use std::sync::PoisonError;

use super::analysis::{to_mono, ChunkAnalyzer};
use super::SessionClock;
use crate::config::CaptureConfig;
use crate::waveform::SharedPipeline;

#[cfg(target_os = "linux")]
use std::fs::OpenOptions;
#[cfg(target_os = "linux")]
use std::os::unix::io::AsRawFd;

/// Live microphone producer for a [`SharedPipeline`].
///
/// The stream stays open until [`stop`](Self::stop) or drop; whether samples
/// are kept is decided by the pipeline's phase.
pub struct MicrophoneCapture {
    /// Device name, numeric index, or "default"
    device_name: String,
    chunk_ms: u64,
    reference_level_db: i8,
    band_count: usize,
    /// Actual sample rate reported by the device
    sample_rate: u32,
    /// Active input stream (kept alive while capturing)
    stream: Option<cpal::Stream>,
}

impl MicrophoneCapture {
    pub fn new(config: &CaptureConfig, band_count: usize) -> Self {
        Self {
            device_name: config.device.clone(),
            chunk_ms: config.chunk_ms,
            reference_level_db: config.reference_level_db,
            band_count,
            sample_rate: 0,
            stream: None,
        }
    }

    /// Opens the configured device and starts feeding `pipeline`.
    ///
    /// # Errors
    /// - If the device is not available
    /// - If the device reports an unsupported sample format
    /// - If the audio stream cannot be built or started
    pub fn start(&mut self, pipeline: SharedPipeline, clock: SessionClock) -> Result<()> {
        let device = suppress_alsa_warnings(|| {
            let host = cpal::default_host();
            if self.device_name == "default" {
                host.default_input_device()
                    .ok_or_else(|| anyhow!("No audio input device available"))
            } else {
                find_device_by_name(&host, &self.device_name)
            }
        })?;

        let device_name = device
            .name()
            .unwrap_or_else(|_| "Unknown device".to_string());
        tracing::info!("Capture device: {}", device_name);

        let device_config = device.default_input_config()?;
        self.sample_rate = device_config.sample_rate().0;
        let channels = device_config.channels() as usize;
        let sample_format = device_config.sample_format();

        tracing::debug!(
            "Device configuration: {}Hz, {} channels, {:?}",
            self.sample_rate,
            channels,
            sample_format
        );

        let mut sink = CaptureSink {
            channels,
            analyzer: ChunkAnalyzer::new(
                self.sample_rate,
                self.chunk_ms,
                self.band_count,
                self.reference_level_db,
            ),
            pipeline,
            clock,
        };

        let stream_config: cpal::StreamConfig = device_config.into();
        let stream = match sample_format {
            cpal::SampleFormat::I16 => device.build_input_stream(
                &stream_config,
                move |data: &[i16], _: &cpal::InputCallbackInfo| sink.push_interleaved(data),
                stream_error,
                None,
            )?,
            cpal::SampleFormat::F32 => device.build_input_stream(
                &stream_config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    let converted: Vec<i16> = data
                        .iter()
                        .map(|&s| (s.clamp(-1.0, 1.0) * i16::MAX as f32) as i16)
                        .collect();
                    sink.push_interleaved(&converted);
                },
                stream_error,
                None,
            )?,
            other => return Err(anyhow!("Unsupported input sample format: {other:?}")),
        };

        stream.play()?;
        self.stream = Some(stream);

        tracing::debug!("Audio stream started");
        Ok(())
    }

    /// Closes the input stream.
    pub fn stop(&mut self) {
        if self.stream.take().is_some() {
            tracing::debug!("Audio stream stopped");
        }
    }

    /// Returns the device sample rate (0 before `start`).
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }
}

/// State moved into the audio callback.
struct CaptureSink {
    channels: usize,
    analyzer: ChunkAnalyzer,
    pipeline: SharedPipeline,
    clock: SessionClock,
}

impl CaptureSink {
    fn push_interleaved(&mut self, data: &[i16]) {
        let mono = to_mono(data, self.channels);
        let Self {
            analyzer,
            pipeline,
            clock,
            ..
        } = self;
        analyzer.feed(&mono, |input| {
            let mut pipeline = pipeline.lock().unwrap_or_else(PoisonError::into_inner);
            pipeline.on_sample(input, clock.now_ms());
        });
    }
}

fn stream_error(err: cpal::StreamError) {
    tracing::error!("Audio stream error: {}", err);
}

/// One entry of [`list_input_devices`].
#[derive(Debug, Clone)]
pub struct InputDeviceInfo {
    pub index: usize,
    pub name: String,
    pub is_default: bool,
    /// `(sample_rate, channels)` of the default input config, if queryable
    pub config: Option<(u32, u16)>,
}

/// Enumerates input devices in the order `find_device_by_name` indexes them.
///
/// # Errors
/// - If the audio host cannot enumerate devices
pub fn list_input_devices() -> Result<Vec<InputDeviceInfo>> {
    let (host, devices) = suppress_alsa_warnings(|| {
        let host = cpal::default_host();
        let devices: Vec<cpal::Device> = host
            .input_devices()
            .map_err(|e| anyhow!("Failed to enumerate audio devices: {e}"))?
            .filter(|d| d.name().is_ok())
            .collect();
        Ok((host, devices))
    })?;

    let default_name = host.default_input_device().and_then(|d| d.name().ok());

    Ok(devices
        .iter()
        .enumerate()
        .map(|(index, device)| {
            let name = device.name().unwrap_or_else(|_| "Unknown".to_string());
            let config = device
                .default_input_config()
                .ok()
                .map(|c| (c.sample_rate().0, c.channels()));
            InputDeviceInfo {
                index,
                is_default: default_name.as_ref() == Some(&name),
                name,
                config,
            }
        })
        .collect())
}

/// Finds an audio input device by name or numeric index.
///
/// # Errors
/// - If no device with the specified name/index is found
fn find_device_by_name(host: &cpal::Host, device_spec: &str) -> Result<cpal::Device> {
    let mut devices = host
        .input_devices()
        .map_err(|e| anyhow!("Failed to enumerate devices: {e}"))?;

    if let Ok(index) = device_spec.parse::<usize>() {
        let devices: Vec<_> = devices.filter(|d| d.name().is_ok()).collect();
        let count = devices.len();
        return devices.into_iter().nth(index).ok_or_else(|| {
            anyhow!(
                "Device index {} is out of range (0-{})",
                index,
                count.saturating_sub(1)
            )
        });
    }

    devices
        .find(|device| device.name().is_ok_and(|name| name == device_spec))
        .ok_or_else(|| {
            anyhow!(
                "Audio input device '{device_spec}' not found. Use 'wavetide list-devices' to see available devices."
            )
        })
}

/// Temporarily redirects stderr to /dev/null to suppress ALSA library warnings on Linux.
#[cfg(target_os = "linux")]
fn suppress_alsa_warnings<F, T>(f: F) -> Result<T>
where
    F: FnOnce() -> Result<T>,
{
    let dev_null = OpenOptions::new()
        .write(true)
        .open("/dev/null")
        .map_err(|e| anyhow!("Failed to open /dev/null: {e}"))?;

    let dev_null_fd = dev_null.as_raw_fd();

    let old_stderr = unsafe { libc::dup(libc::STDERR_FILENO) };
    if old_stderr == -1 {
        return Err(anyhow!("Failed to duplicate stderr"));
    }

    let redirect_result = unsafe { libc::dup2(dev_null_fd, libc::STDERR_FILENO) };
    if redirect_result == -1 {
        unsafe { libc::close(old_stderr) };
        return Err(anyhow!("Failed to redirect stderr"));
    }

    let result = f();

    unsafe {
        libc::dup2(old_stderr, libc::STDERR_FILENO);
        libc::close(old_stderr);
    }

    result
}

/// On non-Linux platforms there is no ALSA to silence.
#[cfg(not(target_os = "linux"))]
fn suppress_alsa_warnings<F, T>(f: F) -> Result<T>
where
    F: FnOnce() -> Result<T>,
{
    f()
}
