//! The interactive listen surface.
//!
//! One alternate-screen ratatui view: a sidebar with the two session
//! controls (recording duration, download toggle), a main panel with the
//! status feed of the current invocation, and a footer with key help. The
//! event loop polls input only while idle, so invocations never overlap.

use crossterm::{
    event::{self, Event, KeyCode, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Paragraph, Wrap},
};
use std::io::{stdout, Stdout};
use std::path::{Path, PathBuf};

use crate::workflow::{
    SessionSettings, StatusEvent, StatusLevel, MAX_DURATION_SECS, MIN_DURATION_SECS,
};

/// What the idle loop should do after one round of input handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScreenCommand {
    /// Nothing happened, keep polling
    Continue,
    /// Run one record → identify → download invocation
    Trigger,
    /// Play the most recent downloaded file
    Play,
    /// Leave the surface
    Quit,
}

/// Which sidebar control is selected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Control {
    Duration,
    Download,
}

/// The listen surface state and terminal handle.
pub struct ListenScreen {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    /// Current control values; snapshotted per invocation
    pub settings: SessionSettings,
    selected: Control,
    feed: Vec<StatusEvent>,
    last_download: Option<PathBuf>,
}

impl ListenScreen {
    /// Creates the surface and enters alternate screen mode.
    ///
    /// # Errors
    /// - If the terminal cannot be initialized or raw mode enabled
    pub fn new(settings: SessionSettings) -> anyhow::Result<Self> {
        enable_raw_mode()?;
        let mut stdout = stdout();
        execute!(stdout, EnterAlternateScreen)?;

        let backend = CrosstermBackend::new(stdout);
        let terminal = Terminal::new(backend)?;

        Ok(Self {
            terminal,
            settings,
            selected: Control::Duration,
            feed: Vec::new(),
            last_download: None,
        })
    }

    /// Appends a status line and repaints, so progress is visible while the
    /// workflow blocks between events.
    pub fn push_status(&mut self, event: StatusEvent) {
        self.feed.push(event);
        if let Err(e) = self.draw() {
            tracing::warn!("Render failed: {e}");
        }
    }

    /// Clears the feed for a fresh invocation.
    pub fn begin_invocation(&mut self) {
        self.feed.clear();
    }

    /// Records the most recent successful download for playback.
    pub fn set_last_download(&mut self, path: Option<PathBuf>) {
        if path.is_some() {
            self.last_download = path;
        }
    }

    pub fn last_download(&self) -> Option<&Path> {
        self.last_download.as_deref()
    }

    /// Repaints the whole surface.
    ///
    /// # Errors
    /// - If terminal rendering fails
    pub fn draw(&mut self) -> anyhow::Result<()> {
        let settings = self.settings;
        let selected = self.selected;
        let has_download = self.last_download.is_some();
        let feed = self.feed.clone();

        self.terminal.draw(|frame| {
            let area = frame.area();

            let rows = Layout::vertical([
                Constraint::Length(1),
                Constraint::Min(3),
                Constraint::Length(1),
            ])
            .split(area);

            let title = Paragraph::new(Line::from(vec![
                Span::styled("♪ trackdown", Style::default().fg(Color::Cyan).bold()),
                Span::raw(" — record a clip, identify the song, download it"),
            ]));
            frame.render_widget(title, rows[0]);

            let columns =
                Layout::horizontal([Constraint::Length(34), Constraint::Min(20)]).split(rows[1]);

            render_sidebar(frame, columns[0], &settings, selected);
            render_feed(frame, columns[1], &feed);

            let help = if has_download {
                " ↑/↓ select · ←/→ adjust · Enter record & identify · p play last download · q quit"
            } else {
                " ↑/↓ select · ←/→ adjust · Enter record & identify · q quit"
            };
            let footer = Paragraph::new(help).style(Style::default().fg(Color::DarkGray));
            frame.render_widget(footer, rows[2]);
        })?;

        Ok(())
    }

    /// Polls for input and maps it to a screen command.
    ///
    /// Sidebar adjustments are handled internally and report `Continue`.
    ///
    /// # Errors
    /// - If event polling fails
    pub fn handle_input(&mut self) -> anyhow::Result<ScreenCommand> {
        if event::poll(std::time::Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
                    return Ok(ScreenCommand::Quit);
                }

                return Ok(match key.code {
                    KeyCode::Enter | KeyCode::Char('r') => ScreenCommand::Trigger,
                    KeyCode::Char('q') | KeyCode::Esc => ScreenCommand::Quit,
                    KeyCode::Char('p') => ScreenCommand::Play,
                    KeyCode::Up | KeyCode::Down | KeyCode::Tab | KeyCode::BackTab => {
                        self.select_other();
                        self.draw()?;
                        ScreenCommand::Continue
                    }
                    KeyCode::Left | KeyCode::Char('h') => {
                        self.adjust_selected(-1);
                        self.draw()?;
                        ScreenCommand::Continue
                    }
                    KeyCode::Right | KeyCode::Char('l') => {
                        self.adjust_selected(1);
                        self.draw()?;
                        ScreenCommand::Continue
                    }
                    KeyCode::Char(' ') | KeyCode::Char('d') => {
                        self.settings.download_enabled = !self.settings.download_enabled;
                        self.draw()?;
                        ScreenCommand::Continue
                    }
                    _ => ScreenCommand::Continue,
                });
            }
        }
        Ok(ScreenCommand::Continue)
    }

    /// Moves the sidebar selection between the two controls.
    fn select_other(&mut self) {
        self.selected = match self.selected {
            Control::Duration => Control::Download,
            Control::Download => Control::Duration,
        };
    }

    /// Adjusts the selected control by one step.
    fn adjust_selected(&mut self, step: i16) {
        adjust_control(&mut self.settings, self.selected, step);
    }

    /// Restores the terminal state and leaves alternate screen mode.
    ///
    /// # Errors
    /// - If terminal mode cannot be restored
    pub fn cleanup(&mut self) -> anyhow::Result<()> {
        disable_raw_mode()?;
        execute!(self.terminal.backend_mut(), LeaveAlternateScreen)?;
        self.terminal.show_cursor()?;
        Ok(())
    }
}

impl Drop for ListenScreen {
    fn drop(&mut self) {
        let _ = self.cleanup();
    }
}

/// Steps a control value: the duration clamps to the slider range, the
/// download toggle flips regardless of direction.
fn adjust_control(settings: &mut SessionSettings, control: Control, step: i16) {
    match control {
        Control::Duration => {
            let next = settings.duration_secs as i16 + step;
            settings.duration_secs =
                next.clamp(MIN_DURATION_SECS as i16, MAX_DURATION_SECS as i16) as u16;
        }
        Control::Download => {
            settings.download_enabled = !settings.download_enabled;
        }
    }
}

/// Renders the Options sidebar with the two session controls.
fn render_sidebar(frame: &mut Frame, area: Rect, settings: &SessionSettings, selected: Control) {
    let block = Block::default().borders(Borders::ALL).title("Options");
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let row_style = |control: Control| {
        if control == selected {
            Style::default().fg(Color::Yellow).bold()
        } else {
            Style::default()
        }
    };

    // Duration slider: one cell per second in the 3-15 range
    let span = (MAX_DURATION_SECS - MIN_DURATION_SECS) as usize + 1;
    let filled = (settings.duration_secs - MIN_DURATION_SECS) as usize + 1;
    let slider: String = "▰".repeat(filled) + &"▱".repeat(span - filled);

    let checkbox = if settings.download_enabled {
        "[x]"
    } else {
        "[ ]"
    };

    let lines = vec![
        Line::from(Span::styled(
            format!("Recording duration: {:>2} s", settings.duration_secs),
            row_style(Control::Duration),
        )),
        Line::from(Span::styled(
            format!("  {slider}"),
            row_style(Control::Duration),
        )),
        Line::default(),
        Line::from(Span::styled(
            format!("{checkbox} Download from YouTube"),
            row_style(Control::Download),
        )),
    ];

    frame.render_widget(Paragraph::new(lines), inner);
}

/// Renders the status feed, newest lines kept visible.
fn render_feed(frame: &mut Frame, area: Rect, feed: &[StatusEvent]) {
    let block = Block::default().borders(Borders::ALL).title("Status");
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let visible = inner.height as usize;
    let start = feed.len().saturating_sub(visible);

    let lines: Vec<Line> = feed[start..]
        .iter()
        .map(|event| {
            let (prefix, style) = match event.level {
                StatusLevel::Info => ("· ", Style::default()),
                StatusLevel::Success => ("✔ ", Style::default().fg(Color::Green)),
                StatusLevel::Warning => ("! ", Style::default().fg(Color::Yellow)),
                StatusLevel::Error => ("✖ ", Style::default().fg(Color::Red)),
                StatusLevel::Progress => ("⠿ ", Style::default().fg(Color::Cyan)),
            };
            Line::from(Span::styled(format!("{prefix}{}", event.text), style))
        })
        .collect();

    let paragraph = Paragraph::new(lines).wrap(Wrap { trim: true });
    frame.render_widget(paragraph, inner);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duration_clamps_to_slider_range() {
        let mut settings = SessionSettings::default();
        assert_eq!(settings.duration_secs, 5);

        for _ in 0..20 {
            adjust_control(&mut settings, Control::Duration, -1);
        }
        assert_eq!(settings.duration_secs, MIN_DURATION_SECS);

        for _ in 0..40 {
            adjust_control(&mut settings, Control::Duration, 1);
        }
        assert_eq!(settings.duration_secs, MAX_DURATION_SECS);
    }

    #[test]
    fn download_toggle_flips_either_direction() {
        let mut settings = SessionSettings::default();
        assert!(settings.download_enabled);
        adjust_control(&mut settings, Control::Download, 1);
        assert!(!settings.download_enabled);
        adjust_control(&mut settings, Control::Download, -1);
        assert!(settings.download_enabled);
    }
}
