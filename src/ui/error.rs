//! Full-screen notice for fatal startup errors.
//!
//! Once the chat window is running it owns the terminal and surfaces
//! problems as chat status lines; this screen exists for the errors that
//! happen before the window can open, such as an unparsable config file.

use anyhow::Result;
use crossterm::{
    event::{self, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    prelude::*,
    widgets::{Block, Paragraph, Wrap},
};
use std::io::{self, Stdout};
use std::time::Duration;

const NOTICE_BG: Color = Color::Rgb(255, 0, 0);
const NOTICE_FG: Color = Color::Rgb(255, 255, 255);

/// Shows `message` centered on a full red screen and waits for any key.
///
/// The terminal is restored before returning, even when drawing fails.
///
/// # Errors
/// - If the terminal cannot be initialized or restored
/// - If rendering or event polling fails
pub fn show_startup_error(message: &str) -> Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let shown = wait_for_dismiss(&mut terminal, message);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    shown
}

/// Redraws the notice until a key press dismisses it.
fn wait_for_dismiss(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    message: &str,
) -> Result<()> {
    loop {
        terminal.draw(|frame| {
            let area = frame.area();

            let backdrop = Block::default().style(Style::default().bg(NOTICE_BG));
            frame.render_widget(backdrop, area);

            // Center the message in the middle 80% of the screen width
            let rows = Layout::default()
                .direction(Direction::Vertical)
                .constraints([
                    Constraint::Percentage(40),
                    Constraint::Min(3),
                    Constraint::Percentage(40),
                ])
                .split(area);
            let columns = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([
                    Constraint::Percentage(10),
                    Constraint::Percentage(80),
                    Constraint::Percentage(10),
                ])
                .split(rows[1]);

            let notice = Paragraph::new(message)
                .style(Style::default().fg(NOTICE_FG).bg(NOTICE_BG))
                .alignment(Alignment::Center)
                .wrap(Wrap { trim: true });
            frame.render_widget(notice, columns[1]);
        })?;

        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(_) = event::read()? {
                return Ok(());
            }
        }
    }
}
