//! Real-time level visualization pipeline.
//!
//! A capture source pushes irregular level or band payloads through
//! [`WaveformPipeline::on_sample`]; the render surface pulls one
//! [`RenderFrame`] per display refresh through
//! [`WaveformPipeline::on_render_tick`].
//!
//! ```text
//! producer -> SampleNormalizer -> BandSmoother -> RollingWindowBuffer
//!                                                      |
//! display tick -> ScrollClock (+ decay) -> BarProjector + ScalingProfile -> RenderFrame
//! ```

pub mod buffer;
pub mod config;
pub mod error;
pub mod normalizer;
pub mod pipeline;
pub mod projector;
pub mod scaler;
pub mod scroll_clock;
pub mod smoothing;

pub use buffer::{RollingWindowBuffer, Sample, Snapshot};
pub use config::WaveformConfig;
pub use error::{ConfigError, ProfileError};
pub use normalizer::{BandVector, SampleInput, SampleNormalizer};
pub use pipeline::{
    DropReason, Ingest, PipelineStats, RenderFrame, SharedPipeline, WaveformPipeline,
};
pub use projector::BarProjector;
pub use scaler::{scale, Breakpoint, ScalingProfile, ScalingProfileId};
pub use scroll_clock::{decay_step, decay_steps_to_silence, ScrollClock, ScrollPhase};
pub use smoothing::{BandSmoother, SmoothingFilter};
