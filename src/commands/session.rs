//! Render loop shared by every capture source.
//!
//! Ticks the pipeline at the configured frame rate, draws each frame, and
//! turns key presses into start/stop calls. Sources run on their own threads
//! and only ever touch the pipeline through its mutex.

use std::sync::{MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use crate::capture::SessionClock;
use crate::config::DisplayConfig;
use crate::ui::{SurfaceCommand, WaveformSurface};
use crate::waveform::{ScrollPhase, SharedPipeline, WaveformPipeline};

/// Runs an interactive session until the user quits.
///
/// Capture starts immediately; Space toggles it.
///
/// # Errors
/// - If the terminal cannot be driven
/// - If the surface reports an unusable width
pub fn run_session(
    pipeline: &SharedPipeline,
    clock: SessionClock,
    display: &DisplayConfig,
    source_label: &str,
) -> anyhow::Result<()> {
    let mut surface = WaveformSurface::new(display.full_scale, source_label)?;
    let result = drive(&mut surface, pipeline, clock, display.frame_rate);
    lock(pipeline).stop();
    surface.cleanup()?;
    result
}

fn drive(
    surface: &mut WaveformSurface,
    pipeline: &SharedPipeline,
    clock: SessionClock,
    frame_rate: u32,
) -> anyhow::Result<()> {
    let frame_interval = Duration::from_secs_f64(1.0 / frame_rate.max(1) as f64);
    lock(pipeline).start(clock.now_ms());

    let mut frames = 0u64;
    loop {
        let frame_start = Instant::now();

        if let Some(width) = surface.width_changed()?.filter(|&w| w > 0) {
            lock(pipeline).resize_display(width as usize, width as f32)?;
        }

        let (frame, stats) = {
            let mut pipeline = lock(pipeline);
            (pipeline.on_render_tick(clock.now_ms()), pipeline.stats())
        };
        surface.render(&frame, &stats)?;

        frames += 1;
        if frames.is_multiple_of(frame_rate.max(1) as u64 * 5) {
            tracing::debug!(
                "Session: phase {}, {} accepted, {} overrun",
                frame.phase,
                stats.accepted,
                stats.dropped_overrun
            );
        }

        match surface.handle_input(frame_interval.saturating_sub(frame_start.elapsed()))? {
            SurfaceCommand::Continue => {}
            SurfaceCommand::ToggleCapture => {
                let mut pipeline = lock(pipeline);
                if pipeline.phase() == ScrollPhase::Recording {
                    pipeline.stop();
                } else {
                    pipeline.start(clock.now_ms());
                }
            }
            SurfaceCommand::Quit => return Ok(()),
        }
    }
}

/// Locks the pipeline, recovering from a producer that panicked mid-call.
pub(crate) fn lock(pipeline: &SharedPipeline) -> MutexGuard<'_, WaveformPipeline> {
    pipeline.lock().unwrap_or_else(PoisonError::into_inner)
}
