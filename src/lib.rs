//! wavetide
//!
//! Turns a live, irregular stream of microphone levels into a continuously
//! scrolling waveform.
//!
//! # Features
//!
//! - Rolling time window with count bound and per-band moving-average smoothing
//! - Per-source piecewise scaling profiles ("web" and "native" capture)
//! - Tail/stretch projection onto a fixed number of display slots
//! - Frame-driven scroll clock with fade-out on stop
//! - Microphone capture via cpal and a terminal surface via ratatui

pub mod app;
pub mod capture;
pub mod commands;
pub mod config;
pub mod logging;
pub mod ui;
pub mod waveform;

pub use waveform::{
    RenderFrame, SampleInput, ScalingProfile, ScalingProfileId, ScrollPhase, SharedPipeline,
    WaveformConfig, WaveformPipeline,
};
