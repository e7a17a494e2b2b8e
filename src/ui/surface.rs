//! Terminal surface for the scrolling waveform.
//!
//! Draws each [`RenderFrame`] as a mirrored bar display with a conveyor guide
//! that moves with the scroll offset, plus a one-line status footer.

use crossterm::{
    event::{self, Event, KeyCode, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    prelude::*,
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Paragraph, Sparkline},
};
use std::io::{stdout, Stdout};
use std::time::{Duration, Instant};

use crate::waveform::{PipelineStats, RenderFrame, ScrollPhase};

const SPECTRUM_GLYPHS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

/// User input during a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceCommand {
    /// No key or an unbound key
    Continue,
    /// Start or stop capture (Space)
    ToggleCapture,
    /// Leave the session (Escape, 'q' or Ctrl+C)
    Quit,
}

/// Full-screen waveform display.
pub struct WaveformSurface {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    full_scale: u64,
    source_label: String,
    width: u16,
    recording_since: Option<Instant>,
    last_elapsed: Duration,
}

impl WaveformSurface {
    /// Creates the surface and enters alternate screen mode.
    ///
    /// # Errors
    /// - If terminal cannot be initialized
    /// - If raw mode cannot be enabled
    /// - If alternate screen cannot be entered
    pub fn new(full_scale: u64, source_label: impl Into<String>) -> anyhow::Result<Self> {
        enable_raw_mode()?;
        let mut stdout = stdout();
        execute!(stdout, EnterAlternateScreen)?;

        let backend = CrosstermBackend::new(stdout);
        let terminal = Terminal::new(backend)?;

        Ok(WaveformSurface {
            terminal,
            full_scale: full_scale.clamp(1, 100),
            source_label: source_label.into(),
            width: 0,
            recording_since: None,
            last_elapsed: Duration::ZERO,
        })
    }

    /// Returns the new terminal width when it changed since the last call.
    ///
    /// # Errors
    /// - If the terminal size cannot be queried
    pub fn width_changed(&mut self) -> anyhow::Result<Option<u16>> {
        let width = self.terminal.size()?.width;
        if width == self.width {
            return Ok(None);
        }
        tracing::debug!("Surface width {} -> {}", self.width, width);
        self.width = width;
        Ok(Some(width))
    }

    /// Draws one frame.
    ///
    /// # Errors
    /// - If terminal rendering fails
    pub fn render(&mut self, frame: &RenderFrame, stats: &PipelineStats) -> anyhow::Result<()> {
        self.track_elapsed(frame.phase);

        let levels: Vec<u64> = frame
            .bars
            .iter()
            .map(|&bar| (bar.clamp(0.0, 1.0) * 100.0).round() as u64)
            .collect();
        let inverted: Vec<u64> = levels.iter().map(|&v| 100_u64.saturating_sub(v)).collect();
        let full_scale = self.full_scale;
        let guide = guide_line(self.width, frame.scroll_offset);
        let footer = footer_line(
            frame,
            stats,
            &self.source_label,
            self.last_elapsed,
        );

        self.terminal.draw(|f| {
            let area = f.area();
            let footer_height = 1;
            let guide_height = 1;

            let content_area = Rect {
                x: area.x,
                y: area.y,
                width: area.width,
                height: area.height.saturating_sub(footer_height + guide_height),
            };
            let top_height = content_area.height / 3 * 2;

            let top_area = Rect {
                height: top_height,
                ..content_area
            };
            let top = Sparkline::default().data(&levels).max(full_scale).style(
                Style::default()
                    .bg(Color::Rgb(0, 0, 0))
                    .fg(Color::Rgb(206, 224, 220)),
            );
            f.render_widget(top, top_area);

            let bottom_area = Rect {
                y: content_area.y + top_height,
                height: content_area.height.saturating_sub(top_height),
                ..content_area
            };
            let bottom = Sparkline::default().data(&inverted).max(full_scale).style(
                Style::default()
                    .bg(Color::Rgb(185, 207, 212))
                    .fg(Color::Rgb(0, 0, 0)),
            );
            f.render_widget(bottom, bottom_area);

            let guide_area = Rect {
                x: area.x,
                y: content_area.y + content_area.height,
                width: area.width,
                height: guide_height,
            };
            f.render_widget(
                Paragraph::new(guide).style(
                    Style::default()
                        .fg(Color::Rgb(90, 110, 115))
                        .bg(Color::Rgb(0, 0, 0)),
                ),
                guide_area,
            );

            let footer_area = Rect {
                x: area.x,
                y: area.y + area.height.saturating_sub(footer_height),
                width: area.width,
                height: footer_height,
            };
            f.render_widget(
                Paragraph::new(footer).style(
                    Style::default()
                        .fg(Color::Rgb(185, 207, 212))
                        .bg(Color::Rgb(0, 0, 0)),
                ),
                footer_area,
            );
        })?;

        Ok(())
    }

    /// Waits up to `timeout` for a key and maps it to a command.
    ///
    /// # Errors
    /// - If event polling fails
    pub fn handle_input(&mut self, timeout: Duration) -> anyhow::Result<SurfaceCommand> {
        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                return Ok(match key.code {
                    KeyCode::Char(' ') => {
                        tracing::debug!("Space pressed: toggling capture");
                        SurfaceCommand::ToggleCapture
                    }
                    KeyCode::Char('q') | KeyCode::Esc => {
                        tracing::debug!("Escape or 'q' pressed: leaving session");
                        SurfaceCommand::Quit
                    }
                    KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                        tracing::debug!("Ctrl+C pressed: leaving session");
                        SurfaceCommand::Quit
                    }
                    _ => SurfaceCommand::Continue,
                });
            }
        }
        Ok(SurfaceCommand::Continue)
    }

    /// Restores the terminal.
    ///
    /// # Errors
    /// - If terminal mode cannot be disabled
    /// - If cursor cannot be shown
    pub fn cleanup(&mut self) -> anyhow::Result<()> {
        disable_raw_mode()?;
        execute!(self.terminal.backend_mut(), LeaveAlternateScreen)?;
        self.terminal.show_cursor()?;
        Ok(())
    }

    /// Recording time freezes on stop and resets on the next start.
    fn track_elapsed(&mut self, phase: ScrollPhase) {
        match (phase, self.recording_since) {
            (ScrollPhase::Recording, None) => {
                self.recording_since = Some(Instant::now());
                self.last_elapsed = Duration::ZERO;
            }
            (ScrollPhase::Recording, Some(since)) => self.last_elapsed = since.elapsed(),
            (_, Some(_)) => self.recording_since = None,
            (_, None) => {}
        }
    }
}

/// A row of dots every eight columns, shifted left by the scroll offset.
fn guide_line(width: u16, scroll_offset: f32) -> String {
    let shift = scroll_offset.max(0.0) as usize;
    (0..width as usize)
        .map(|x| if (x + shift) % 8 == 0 { '·' } else { ' ' })
        .collect()
}

fn footer_line(
    frame: &RenderFrame,
    stats: &PipelineStats,
    source_label: &str,
    elapsed: Duration,
) -> Line<'static> {
    let indicator = match frame.phase {
        ScrollPhase::Recording => Span::styled("● ", Style::default().fg(Color::Red)),
        ScrollPhase::Decaying => Span::styled("◌ ", Style::default().fg(Color::Yellow)),
        ScrollPhase::Idle => Span::styled("○ ", Style::default().fg(Color::DarkGray)),
    };
    let secs = elapsed.as_secs();

    let mut spans = vec![
        indicator,
        Span::raw(format!("{}:{:02}", secs / 60, secs % 60)),
        Span::raw(format!(" / {source_label}")),
        Span::raw(format!(
            " / {} samples, {} dropped",
            stats.accepted, stats.dropped_overrun
        )),
    ];
    if stats.malformed > 0 {
        spans.push(Span::styled(
            format!(", {} repaired", stats.malformed),
            Style::default().fg(Color::Yellow),
        ));
    }
    if let Some(spectrum) = &frame.spectrum {
        spans.push(Span::raw(format!(" {}", spectrum_glyphs(spectrum))));
    }
    spans.push(Span::styled(
        "  space start/stop · q quit",
        Style::default().fg(Color::DarkGray),
    ));
    Line::from(spans)
}

fn spectrum_glyphs(spectrum: &[f32]) -> String {
    spectrum
        .iter()
        .map(|&v| {
            let index = (v.clamp(0.0, 1.0) * (SPECTRUM_GLYPHS.len() - 1) as f32).round() as usize;
            SPECTRUM_GLYPHS[index]
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guide_moves_with_offset() {
        let still = guide_line(16, 0.0);
        let moved = guide_line(16, 3.0);
        assert_eq!(still.chars().position(|c| c == '·'), Some(0));
        assert_eq!(moved.chars().position(|c| c == '·'), Some(5));
        assert_eq!(moved.chars().count(), 16);
    }

    #[test]
    fn test_spectrum_glyphs_span_range() {
        assert_eq!(spectrum_glyphs(&[0.0, 1.0, 2.0, -1.0]), "▁██▁");
    }

    #[test]
    fn test_footer_flags_repaired_samples() {
        let frame = RenderFrame {
            bars: vec![0.0; 4],
            scroll_offset: 0.0,
            phase: ScrollPhase::Recording,
            spectrum: None,
        };
        let stats = PipelineStats {
            malformed: 2,
            ..PipelineStats::default()
        };
        let text: String = footer_line(&frame, &stats, "mic", Duration::from_secs(75))
            .spans
            .iter()
            .map(|s| s.content.to_string())
            .collect();
        assert!(text.contains("1:15"));
        assert!(text.contains("2 repaired"));
    }
}
