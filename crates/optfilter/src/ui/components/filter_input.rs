//! Filter input component.

use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};

/// Edit buffer behind the focused binding's filter input.
#[derive(Debug, Default, Clone)]
pub struct FilterInputState {
    input: String,
}

impl FilterInputState {
    /// Access the current input buffer.
    pub fn input(&self) -> &str {
        &self.input
    }

    /// Replace the current input contents.
    pub fn set_input<S: Into<String>>(&mut self, content: S) {
        self.input = content.into();
    }

    /// Append a character to the buffer.
    pub fn push_char(&mut self, ch: char) {
        self.input.push(ch);
    }

    /// Remove the most recently appended character. Returns `false` when the
    /// buffer was already empty.
    pub fn pop_char(&mut self) -> bool {
        self.input.pop().is_some()
    }

    /// Empty the buffer. Returns `false` when it was already empty.
    pub fn clear(&mut self) -> bool {
        if self.input.is_empty() {
            return false;
        }
        self.input.clear();
        true
    }
}

/// Renders the filter input box.
#[derive(Debug, Default)]
pub struct FilterInput;

impl FilterInput {
    pub fn render(
        &self,
        frame: &mut Frame<'_>,
        area: Rect,
        state: &FilterInputState,
        title: &str,
        has_focus: bool,
    ) {
        let block = Block::default()
            .title(title.to_owned())
            .borders(Borders::ALL)
            .border_style(Style::default().fg(if has_focus {
                Color::Cyan
            } else {
                Color::DarkGray
            }));

        let line = if state.input().is_empty() {
            Line::from(vec![
                Span::styled("⌕ ", Style::default().fg(Color::Gray)),
                Span::styled(
                    "type to filter",
                    Style::default()
                        .fg(Color::DarkGray)
                        .add_modifier(Modifier::ITALIC),
                ),
            ])
        } else {
            let mut text_style = Style::default().fg(Color::White);
            if has_focus {
                text_style = text_style.add_modifier(Modifier::BOLD);
            }
            Line::from(vec![
                Span::styled("⌕ ", Style::default().fg(Color::Gray)),
                Span::styled(state.input().to_owned(), text_style),
            ])
        };

        frame.render_widget(Paragraph::new(line).block(block), area);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    #[test]
    fn buffer_edits() {
        let mut state = FilterInputState::default();
        assert!(!state.pop_char());
        state.push_char('d');
        state.push_char('r');
        assert_eq!(state.input(), "dr");
        assert!(state.pop_char());
        assert_eq!(state.input(), "d");
        assert!(state.clear());
        assert!(!state.clear());
    }

    #[test]
    fn renders_current_text() {
        let backend = TestBackend::new(30, 3);
        let mut terminal = Terminal::new(backend).unwrap();
        let mut state = FilterInputState::default();
        state.set_input("metal");

        terminal
            .draw(|frame| {
                let area = frame.size();
                FilterInput.render(frame, area, &state, "genres", true);
            })
            .unwrap();

        let buffer = terminal.backend().buffer();
        let row: String = (0..30).map(|x| buffer.get(x, 1).symbol().to_string()).collect();
        assert!(row.contains("metal"));
    }
}
