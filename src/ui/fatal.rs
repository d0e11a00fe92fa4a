//! Full-screen fatal error view for startup failures.
//!
//! Shown before the interactive surface exists (missing credential, broken
//! config). Dismissed by any key press.

use crossterm::{
    event::{self, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Paragraph, Wrap},
};
use std::io;

/// Displays a fatal error in a centered red panel and waits for a key press.
///
/// # Errors
/// - If the terminal cannot be initialized or rendering fails
pub fn show_fatal(message: &str) -> anyhow::Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run(&mut terminal, message);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn run(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    message: &str,
) -> anyhow::Result<()> {
    loop {
        terminal.draw(|frame| {
            let area = frame.area();

            let panel_width = (area.width * 8 / 10).max(20).min(area.width);
            let panel_height = (area.height / 2).max(7).min(area.height);
            let panel = Rect {
                x: area.x + (area.width - panel_width) / 2,
                y: area.y + (area.height - panel_height) / 2,
                width: panel_width,
                height: panel_height,
            };

            let block = Block::default()
                .borders(Borders::ALL)
                .title(" Startup error ")
                .border_style(Style::default().fg(Color::Red));
            let inner = block.inner(panel);
            frame.render_widget(block, panel);

            let body = format!("{message}\n\nPress any key to exit.");
            let paragraph = Paragraph::new(body)
                .style(Style::default().fg(Color::Red))
                .alignment(Alignment::Center)
                .wrap(Wrap { trim: true });
            frame.render_widget(paragraph, inner);
        })?;

        if event::poll(std::time::Duration::from_millis(100))? {
            if let Event::Key(_) = event::read()? {
                return Ok(());
            }
        }
    }
}
