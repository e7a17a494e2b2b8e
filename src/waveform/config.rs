//! Pipeline configuration, fixed at construction.

use serde::{Deserialize, Serialize};

use super::error::{ConfigError, ProfileError};
use super::scaler::{Breakpoint, ScalingProfile, ScalingProfileId};

/// Settings for one [`WaveformPipeline`](super::WaveformPipeline).
///
/// Every field has a default, so a config file only needs the keys it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaveformConfig {
    /// Trailing time span kept in the rolling window
    #[serde(default = "default_window_duration_ms")]
    pub window_duration_ms: u64,
    /// Expected producer rate, used to bound the buffer length
    #[serde(default = "default_samples_per_second")]
    pub samples_per_second: u32,
    /// Width `B` of every normalized band vector
    #[serde(default = "default_band_count")]
    pub band_count: usize,
    /// Number `N` of display slots
    #[serde(default = "default_slot_count")]
    pub slot_count: usize,
    /// Built-in scaling profile: "web" or "native"
    #[serde(default)]
    pub scaling_profile: ScalingProfileId,
    /// Breakpoints overriding the built-in profile
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_profile: Option<Vec<Breakpoint>>,
    /// Moving-average length `K` per band
    #[serde(default = "default_smoothing_window")]
    pub smoothing_window: usize,
    /// Minimum band level, never literal zero
    #[serde(default = "default_min_level_floor")]
    pub min_level_floor: f32,
    /// Samples closer together than this are dropped
    #[serde(default = "default_min_sample_interval_ms")]
    pub min_sample_interval_ms: u64,
    /// Time for the scroll offset to cross the display once
    #[serde(default = "default_scroll_period_ms")]
    pub scroll_period_ms: u64,
    /// Width the scroll offset is expressed in (1.0 = fraction of the surface)
    #[serde(default = "default_display_width")]
    pub display_width: f32,
    /// Per-frame level multiplier while fading out
    #[serde(default = "default_decay_attenuation")]
    pub decay_attenuation: f32,
    /// Levels below this are dropped during fade-out
    #[serde(default = "default_visibility_threshold")]
    pub visibility_threshold: f32,
    /// Amplitude of the sparse idle frame, below the visibility threshold
    #[serde(default = "default_baseline_level")]
    pub baseline_level: f32,
    /// Relative ripple applied across bands when only a scalar level arrives
    #[serde(default = "default_scalar_jitter")]
    pub scalar_jitter: f32,
    /// Keep the smoothed band vector with each sample (circular displays)
    #[serde(default)]
    pub retain_bands: bool,
}

fn default_window_duration_ms() -> u64 {
    6000
}

fn default_samples_per_second() -> u32 {
    25
}

fn default_band_count() -> usize {
    7
}

fn default_slot_count() -> usize {
    48
}

fn default_smoothing_window() -> usize {
    3
}

fn default_min_level_floor() -> f32 {
    0.05
}

fn default_min_sample_interval_ms() -> u64 {
    40
}

fn default_scroll_period_ms() -> u64 {
    2000
}

fn default_display_width() -> f32 {
    1.0
}

fn default_decay_attenuation() -> f32 {
    0.95
}

fn default_visibility_threshold() -> f32 {
    0.02
}

fn default_baseline_level() -> f32 {
    0.015
}

fn default_scalar_jitter() -> f32 {
    0.12
}

impl Default for WaveformConfig {
    fn default() -> Self {
        Self {
            window_duration_ms: default_window_duration_ms(),
            samples_per_second: default_samples_per_second(),
            band_count: default_band_count(),
            slot_count: default_slot_count(),
            scaling_profile: ScalingProfileId::default(),
            custom_profile: None,
            smoothing_window: default_smoothing_window(),
            min_level_floor: default_min_level_floor(),
            min_sample_interval_ms: default_min_sample_interval_ms(),
            scroll_period_ms: default_scroll_period_ms(),
            display_width: default_display_width(),
            decay_attenuation: default_decay_attenuation(),
            visibility_threshold: default_visibility_threshold(),
            baseline_level: default_baseline_level(),
            scalar_jitter: default_scalar_jitter(),
            retain_bands: false,
        }
    }
}

impl WaveformConfig {
    /// Maximum buffer length: `ceil(window / 1000 * samples_per_second)`.
    pub fn capacity(&self) -> usize {
        let seconds = self.window_duration_ms as f64 / 1000.0;
        (seconds * self.samples_per_second as f64).ceil() as usize
    }

    /// Resolves the scaling profile, preferring custom breakpoints.
    ///
    /// # Errors
    /// - If the custom breakpoints are not a valid profile
    pub fn resolve_profile(&self) -> Result<ScalingProfile, ProfileError> {
        match &self.custom_profile {
            Some(breakpoints) => ScalingProfile::new(breakpoints.clone()),
            None => Ok(ScalingProfile::builtin(self.scaling_profile)),
        }
    }

    /// Checks every construction-time rule.
    ///
    /// # Errors
    /// - On the first rule that is violated
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.slot_count == 0 {
            return Err(ConfigError::ZeroSlots);
        }
        if self.band_count == 0 {
            return Err(ConfigError::ZeroBands);
        }
        if self.window_duration_ms == 0 {
            return Err(ConfigError::ZeroWindow);
        }
        if self.samples_per_second == 0 {
            return Err(ConfigError::ZeroSampleRate);
        }
        if self.smoothing_window == 0 {
            return Err(ConfigError::ZeroSmoothingWindow);
        }
        if self.scroll_period_ms == 0 {
            return Err(ConfigError::ZeroScrollPeriod);
        }
        validate_display_width(self.display_width)?;
        unit_open("min_level_floor", self.min_level_floor)?;
        unit_open("decay_attenuation", self.decay_attenuation)?;
        unit_open("visibility_threshold", self.visibility_threshold)?;
        if !(0.0..1.0).contains(&self.scalar_jitter) {
            return Err(ConfigError::InvalidJitter(self.scalar_jitter));
        }
        if !(self.baseline_level >= 0.0 && self.baseline_level < self.visibility_threshold) {
            return Err(ConfigError::BaselineTooHigh {
                baseline: self.baseline_level,
                threshold: self.visibility_threshold,
            });
        }
        self.resolve_profile()?;
        Ok(())
    }
}

pub(crate) fn validate_display_width(width: f32) -> Result<(), ConfigError> {
    if width.is_finite() && width > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidDisplayWidth(width))
    }
}

fn unit_open(name: &'static str, value: f32) -> Result<(), ConfigError> {
    if value > 0.0 && value < 1.0 {
        Ok(())
    } else {
        Err(ConfigError::OutOfUnitRange { name, value })
    }
}
