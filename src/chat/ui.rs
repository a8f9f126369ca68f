//! Terminal user interface for the chat window.
//!
//! Renders the scrollable chat log, the single-line message input, and the
//! three-action audio control row, and translates key and mouse events into
//! [`ChatCommand`]s for the controller loop.

use crate::chat::state::AppState;
use anyhow::Result;
use ratatui::crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyModifiers,
        MouseEventKind,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Paragraph, Wrap},
};
use std::io::{self, Stdout};
use std::time::Duration;
use tui_input::backend::crossterm::EventHandler;
use tui_input::Input;

/// Common colors/styles.
const FG: Color = Color::Rgb(255, 255, 255);
const HELP_FG: Color = Color::Rgb(100, 100, 100);
const DISABLED_FG: Color = Color::Rgb(70, 70, 70);

/// User action resolved from one input poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatCommand {
    /// Nothing actionable this tick
    Continue,
    /// Send the typed message (may be empty; the controller no-ops on empty)
    SendText(String),
    /// Start a recording session (Ctrl+R)
    StartRecording,
    /// Stop the recording session and save (Ctrl+S)
    StopRecording,
    /// Play the last recording (Ctrl+P)
    PlayLast,
    /// Exit the application (Escape or Ctrl+C)
    Quit,
}

/// Chat window over a raw-mode alternate-screen terminal.
pub struct ChatTui {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    /// Message input widget
    input: Input,
    /// Lines scrolled up from the bottom of the log; 0 follows new messages
    scroll_offset: usize,
    /// Whether cleanup has been performed
    cleaned_up: bool,
}

impl ChatTui {
    /// Creates the chat window and enters alternate screen mode.
    ///
    /// # Errors
    /// - If terminal cannot be initialized
    /// - If raw mode cannot be enabled
    pub fn new() -> Result<Self> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;

        let backend = CrosstermBackend::new(stdout);
        let terminal = Terminal::new(backend)?;

        Ok(Self {
            terminal,
            input: Input::default(),
            scroll_offset: 0,
            cleaned_up: false,
        })
    }

    /// Polls for input for up to 50ms and returns the resolved command.
    ///
    /// Typing keys are fed to the input widget; everything else maps to a
    /// [`ChatCommand`].
    ///
    /// # Errors
    /// - If event polling fails
    pub fn poll_command(&mut self) -> Result<ChatCommand> {
        if !event::poll(Duration::from_millis(50))? {
            return Ok(ChatCommand::Continue);
        }

        match event::read()? {
            Event::Key(key) => Ok(self.handle_key(key)),
            Event::Mouse(mouse) => {
                match mouse.kind {
                    MouseEventKind::ScrollUp => self.scroll_offset += 1,
                    MouseEventKind::ScrollDown => {
                        self.scroll_offset = self.scroll_offset.saturating_sub(1);
                    }
                    _ => {}
                }
                Ok(ChatCommand::Continue)
            }
            _ => Ok(ChatCommand::Continue),
        }
    }

    /// Maps one key event to a command, feeding unhandled keys to the input
    /// widget.
    fn handle_key(&mut self, key: KeyEvent) -> ChatCommand {
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            return match key.code {
                KeyCode::Char('c') => ChatCommand::Quit,
                KeyCode::Char('r') => ChatCommand::StartRecording,
                KeyCode::Char('s') => ChatCommand::StopRecording,
                KeyCode::Char('p') => ChatCommand::PlayLast,
                _ => ChatCommand::Continue,
            };
        }

        match key.code {
            KeyCode::Esc => ChatCommand::Quit,
            KeyCode::Enter => {
                let message = self.input.value().to_string();
                ChatCommand::SendText(message)
            }
            KeyCode::Up => {
                self.scroll_offset += 1;
                ChatCommand::Continue
            }
            KeyCode::Down => {
                self.scroll_offset = self.scroll_offset.saturating_sub(1);
                ChatCommand::Continue
            }
            KeyCode::PageUp => {
                self.scroll_offset += 10;
                ChatCommand::Continue
            }
            KeyCode::PageDown => {
                self.scroll_offset = self.scroll_offset.saturating_sub(10);
                ChatCommand::Continue
            }
            _ => {
                self.input.handle_event(&Event::Key(key));
                ChatCommand::Continue
            }
        }
    }

    /// Clears the message input after a successful send.
    pub fn clear_input(&mut self) {
        self.input = Input::default();
    }

    /// Renders the chat log, input field, control row, and help footer.
    ///
    /// # Errors
    /// - If terminal rendering fails
    pub fn render(&mut self, state: &AppState) -> Result<()> {
        let input_value = self.input.value().to_string();
        let visual_cursor = self.input.visual_cursor();
        let scroll_offset = &mut self.scroll_offset;

        self.terminal.draw(|frame| {
            let area = frame.area();

            let layout = Layout::default()
                .direction(Direction::Vertical)
                .constraints([
                    Constraint::Min(3),
                    Constraint::Length(3),
                    Constraint::Length(1),
                    Constraint::Length(1),
                ])
                .split(area);

            Self::draw_log(frame, layout[0], state.lines(), scroll_offset);
            Self::draw_input(frame, layout[1], &input_value, visual_cursor);
            Self::draw_controls(frame, layout[2], state);

            let help_text = "enter send, ^r record, ^s stop, ^p play, esc quit";
            let help = Paragraph::new(help_text)
                .alignment(Alignment::Center)
                .style(Style::default().fg(HELP_FG));
            frame.render_widget(help, layout[3]);
        })?;

        Ok(())
    }

    /// Draws the scrollable read-only chat log, following the newest line
    /// unless the user has scrolled up.
    fn draw_log(frame: &mut Frame, area: Rect, lines: &[String], scroll_offset: &mut usize) {
        let block = Block::default().title(" Chat ").borders(Borders::ALL);
        let inner = block.inner(area);

        // Wrapped height of the whole log, to anchor scrolling at the bottom
        let width = inner.width.max(1) as usize;
        let total_rows: usize = lines
            .iter()
            .map(|line| {
                let cells = line.chars().count();
                1 + cells.saturating_sub(1) / width
            })
            .sum();

        let scroll_y = log_scroll(total_rows, inner.height as usize, scroll_offset);

        let text: Vec<Line> = lines.iter().map(|l| Line::raw(l.as_str())).collect();
        let log = Paragraph::new(text)
            .block(block)
            .style(Style::default().fg(FG))
            .wrap(Wrap { trim: false })
            .scroll((scroll_y, 0));

        frame.render_widget(log, area);
    }

    /// Draws the single-line message input with the cursor placed at the
    /// edit position.
    fn draw_input(frame: &mut Frame, area: Rect, value: &str, visual_cursor: usize) {
        let block = Block::default().title(" Message ").borders(Borders::ALL);
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let width = inner.width.max(1) as usize;
        let scroll = visual_cursor.saturating_sub(width.saturating_sub(1));

        let input_widget = Paragraph::new(value)
            .style(Style::default().fg(FG))
            .scroll((0, scroll as u16));
        frame.render_widget(input_widget, inner);

        let cursor_x = inner.x + (visual_cursor - scroll) as u16;
        frame.set_cursor_position(Position::new(cursor_x, inner.y));
    }

    /// Draws the three-action control row with per-state enabled/disabled
    /// styling.
    fn draw_controls(frame: &mut Frame, area: Rect, state: &AppState) {
        let record = control_span("● Record ^R", state.can_record(), Color::Red);
        let stop = control_span("■ Stop ^S", state.can_stop(), Color::Yellow);
        let play = control_span("▶ Play Last ^P", state.can_play(), Color::Green);

        let row = Line::from(vec![
            Span::raw(" "),
            record,
            Span::raw("   "),
            stop,
            Span::raw("   "),
            play,
        ]);

        frame.render_widget(Paragraph::new(row), area);
    }

    /// Cleans up terminal state and exits alternate screen mode.
    ///
    /// # Errors
    /// - If terminal mode cannot be disabled
    /// - If cursor cannot be shown
    pub fn cleanup(&mut self) -> Result<()> {
        if self.cleaned_up {
            return Ok(());
        }

        self.cleaned_up = true;

        disable_raw_mode()?;
        execute!(
            self.terminal.backend_mut(),
            LeaveAlternateScreen,
            DisableMouseCapture
        )?;
        self.terminal.show_cursor()?;
        Ok(())
    }
}

impl Drop for ChatTui {
    fn drop(&mut self) {
        let _ = self.cleanup();
    }
}

/// One control label, dimmed when the action is unavailable in the current
/// state.
fn control_span(label: &str, enabled: bool, accent: Color) -> Span<'static> {
    let style = if enabled {
        Style::default().fg(accent)
    } else {
        Style::default().fg(DISABLED_FG)
    };
    Span::styled(format!("[ {label} ]"), style)
}

/// Converts the bottom-anchored scroll offset into a paragraph scroll row,
/// clamping the offset to the scrollable range. Logs taller than the u16
/// scroll range pin to the deepest reachable row instead of wrapping.
fn log_scroll(total_rows: usize, visible: usize, scroll_offset: &mut usize) -> u16 {
    let max_offset = total_rows.saturating_sub(visible);
    if *scroll_offset > max_offset {
        *scroll_offset = max_offset;
    }
    u16::try_from(max_offset - *scroll_offset).unwrap_or(u16::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_scroll_follows_the_bottom() {
        let mut offset = 0;
        assert_eq!(log_scroll(100, 20, &mut offset), 80);
        assert_eq!(offset, 0);
    }

    #[test]
    fn test_log_scroll_clamps_offset_to_scrollable_range() {
        let mut offset = 999;
        assert_eq!(log_scroll(100, 20, &mut offset), 0);
        assert_eq!(offset, 80);
    }

    #[test]
    fn test_log_scroll_short_log_never_scrolls() {
        let mut offset = 5;
        assert_eq!(log_scroll(10, 20, &mut offset), 0);
        assert_eq!(offset, 0);
    }

    #[test]
    fn test_log_scroll_saturates_on_very_long_logs() {
        let mut offset = 0;
        assert_eq!(log_scroll(70_020, 20, &mut offset), u16::MAX);
    }
}
