//! Configuration management for wavetide.
//!
//! Loads and saves the application configuration from a TOML file in the
//! user's config directory. The waveform section maps one-to-one onto
//! [`WaveformConfig`](crate::waveform::WaveformConfig).

pub mod file;

pub use file::{config_path, AppConfig, CaptureConfig, DisplayConfig};
