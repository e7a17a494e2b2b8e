//! Full-screen failure notice shown when a session cannot start.

use crossterm::{
    event::{self, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    prelude::*,
    text::{Line, Span},
    widgets::{Paragraph, Wrap},
};
use std::io::{self, Stdout};
use std::time::Duration;

const ALERT_BG: Color = Color::Rgb(170, 30, 30);

/// Red notice screen that waits for a key before returning.
pub struct ErrorScreen {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    active: bool,
}

impl ErrorScreen {
    /// Enters alternate screen mode.
    ///
    /// # Errors
    /// - If the terminal cannot be initialized
    pub fn new() -> anyhow::Result<Self> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let terminal = Terminal::new(CrosstermBackend::new(stdout))?;
        Ok(Self {
            terminal,
            active: true,
        })
    }

    /// Shows `title` and `detail` until any key is pressed.
    ///
    /// # Errors
    /// - If terminal rendering or event polling fails
    pub fn show(&mut self, title: &str, detail: &str) -> anyhow::Result<()> {
        let text = vec![
            Line::from(Span::styled(title, Style::default().add_modifier(Modifier::BOLD))),
            Line::raw(""),
            Line::raw(detail),
            Line::raw(""),
            Line::from(Span::styled(
                "press any key",
                Style::default().add_modifier(Modifier::DIM),
            )),
        ];

        loop {
            self.terminal.draw(|frame| {
                let area = frame.area();
                let width = area.width * 4 / 5;
                let body = Rect {
                    x: area.x + (area.width - width) / 2,
                    y: area.y + area.height / 3,
                    width,
                    height: area.height - area.height / 3,
                };
                frame.render_widget(
                    Paragraph::new("").style(Style::default().bg(ALERT_BG)),
                    area,
                );
                frame.render_widget(
                    Paragraph::new(text.clone())
                        .alignment(Alignment::Center)
                        .wrap(Wrap { trim: true })
                        .style(Style::default().fg(Color::White).bg(ALERT_BG)),
                    body,
                );
            })?;

            if event::poll(Duration::from_millis(100))? {
                if let Event::Key(_) = event::read()? {
                    return Ok(());
                }
            }
        }
    }

    /// Restores the terminal. Safe to call twice.
    ///
    /// # Errors
    /// - If terminal mode cannot be disabled
    pub fn cleanup(&mut self) -> anyhow::Result<()> {
        if !self.active {
            return Ok(());
        }
        self.active = false;
        disable_raw_mode()?;
        execute!(self.terminal.backend_mut(), LeaveAlternateScreen)?;
        self.terminal.show_cursor()?;
        Ok(())
    }
}

impl Drop for ErrorScreen {
    fn drop(&mut self) {
        let _ = self.cleanup();
    }
}

/// Shows a notice screen and restores the terminal afterwards.
///
/// # Errors
/// - If the terminal cannot be driven
pub fn show_error(title: &str, detail: &str) -> anyhow::Result<()> {
    let mut screen = ErrorScreen::new()?;
    screen.show(title, detail)?;
    screen.cleanup()
}
