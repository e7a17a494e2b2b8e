//! Construction-time errors for the waveform pipeline.
//!
//! Runtime data problems (bad levels, bad timestamps, overrun) are absorbed by
//! the pipeline and never reach these types. Only misconfiguration does.

use thiserror::Error;

/// A scaling profile whose breakpoints do not form a valid piecewise mapping.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProfileError {
    #[error("scaling profile has no breakpoints")]
    Empty,
    #[error("first breakpoint must start at 0.0, found {0}")]
    BadStart(f32),
    #[error("last breakpoint must end at 1.0, found {0}")]
    BadEnd(f32),
    #[error("breakpoint {index} contains a non-finite value")]
    NonFinite { index: usize },
    #[error("breakpoint {index} is empty or inverted")]
    Inverted { index: usize },
    #[error("breakpoint {index} does not start where its predecessor ends")]
    Gap { index: usize },
    #[error("breakpoint {index} has negative slope {slope}")]
    NegativeSlope { index: usize, slope: f32 },
    #[error("breakpoint {index} starts below the value reached by its predecessor")]
    NotMonotonic { index: usize },
}

/// Invalid pipeline configuration. These are programmer errors and fail fast.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("slot_count must be greater than zero")]
    ZeroSlots,
    #[error("band_count must be greater than zero")]
    ZeroBands,
    #[error("window_duration_ms must be greater than zero")]
    ZeroWindow,
    #[error("samples_per_second must be greater than zero")]
    ZeroSampleRate,
    #[error("smoothing_window must be greater than zero")]
    ZeroSmoothingWindow,
    #[error("scroll_period_ms must be greater than zero")]
    ZeroScrollPeriod,
    #[error("display_width must be positive and finite, got {0}")]
    InvalidDisplayWidth(f32),
    #[error("{name} must lie strictly between 0 and 1, got {value}")]
    OutOfUnitRange { name: &'static str, value: f32 },
    #[error("scalar_jitter must lie in [0, 1), got {0}")]
    InvalidJitter(f32),
    #[error("baseline_level ({baseline}) must be below visibility_threshold ({threshold})")]
    BaselineTooHigh { baseline: f32, threshold: f32 },
    #[error("invalid scaling profile: {0}")]
    Profile(#[from] ProfileError),
}
