//! Option list component and cursor state.

use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph};

use crate::domain::model::{FilterOutcome, OptionView};

/// Cursor over the rows an option list currently displays.
#[derive(Debug, Default, Clone)]
pub struct OptionListState {
    rows: Vec<usize>,
    selected: usize,
}

impl OptionListState {
    /// Recompute displayed rows from `options`, keeping the cursor in range.
    ///
    /// Rows index into `options`; hidden options are displayed only with
    /// `show_hidden`.
    pub fn refresh(&mut self, options: &[OptionView], show_hidden: bool) {
        self.rows = options
            .iter()
            .enumerate()
            .filter(|(_, option)| show_hidden || option.visible)
            .map(|(index, _)| index)
            .collect();
        if self.selected >= self.rows.len() {
            self.selected = self.rows.len().saturating_sub(1);
        }
    }

    /// Advance the cursor to the next row if possible.
    pub fn select_next(&mut self) {
        if self.selected + 1 < self.rows.len() {
            self.selected += 1;
        }
    }

    /// Move the cursor to the previous row if possible.
    pub fn select_previous(&mut self) {
        if self.selected > 0 {
            self.selected -= 1;
        }
    }

    /// Index into the option list of the row under the cursor.
    pub fn current_option(&self) -> Option<usize> {
        self.rows.get(self.selected).copied()
    }

    /// Position of the cursor among displayed rows.
    pub fn selected_row(&self) -> Option<usize> {
        if self.rows.is_empty() {
            None
        } else {
            Some(self.selected)
        }
    }

    pub fn rows(&self) -> &[usize] {
        &self.rows
    }
}

/// Renders the options of one binding.
#[derive(Debug, Default)]
pub struct OptionList;

impl OptionList {
    #[allow(clippy::too_many_arguments)]
    pub fn render(
        &self,
        frame: &mut Frame<'_>,
        area: Rect,
        state: &OptionListState,
        options: &[OptionView],
        outcome: FilterOutcome,
        show_counts: bool,
        has_focus: bool,
    ) {
        let title = if show_counts {
            format!("Options · {}/{} shown", outcome.shown, outcome.total())
        } else {
            "Options".to_owned()
        };
        let block = Block::default()
            .title(title)
            .borders(Borders::ALL)
            .border_style(Style::default().fg(if has_focus {
                Color::Cyan
            } else {
                Color::DarkGray
            }));
        let inner = block.inner(area);
        frame.render_widget(block, area);

        if state.rows().is_empty() {
            let text = if options.is_empty() {
                "List has no options"
            } else {
                "No options match filter"
            };
            let placeholder = Paragraph::new(text).style(
                Style::default()
                    .fg(Color::DarkGray)
                    .add_modifier(Modifier::ITALIC),
            );
            frame.render_widget(placeholder, inner);
            return;
        }

        let items: Vec<ListItem> = state
            .rows()
            .iter()
            .filter_map(|index| options.get(*index))
            .map(|option| {
                let check = if option.selected { "[x] " } else { "[ ] " };
                let mut label_style = Style::default();
                if option.selected {
                    label_style = label_style.fg(Color::Cyan).add_modifier(Modifier::BOLD);
                }
                if !option.visible {
                    label_style = label_style
                        .fg(Color::DarkGray)
                        .add_modifier(Modifier::CROSSED_OUT);
                }
                ListItem::new(Line::from(vec![
                    Span::styled(check, Style::default().fg(Color::Gray)),
                    Span::styled(option.label.clone(), label_style),
                ]))
            })
            .collect();

        let mut list_state = ListState::default();
        list_state.select(state.selected_row());

        let highlight_style = if has_focus {
            Style::default()
                .fg(Color::Black)
                .bg(Color::Cyan)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().add_modifier(Modifier::BOLD)
        };

        let list = List::new(items)
            .highlight_style(highlight_style)
            .highlight_symbol("▸ ");
        frame.render_stateful_widget(list, inner, &mut list_state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    fn option(label: &str, visible: bool) -> OptionView {
        OptionView {
            value: label.to_lowercase(),
            label: label.to_owned(),
            visible,
            selected: false,
        }
    }

    fn sample() -> Vec<OptionView> {
        vec![
            option("Rock", false),
            option("Death Metal", true),
            option("Thrash Metal", true),
        ]
    }

    #[test]
    fn cursor_walks_visible_rows_only() {
        let options = sample();
        let mut state = OptionListState::default();
        state.refresh(&options, false);
        assert_eq!(state.rows(), &[1, 2]);
        assert_eq!(state.current_option(), Some(1));

        state.select_next();
        state.select_next();
        assert_eq!(state.current_option(), Some(2));

        state.refresh(&options, true);
        assert_eq!(state.rows(), &[0, 1, 2]);
        state.select_previous();
        assert_eq!(state.current_option(), Some(0));
    }

    #[test]
    fn cursor_clamps_when_rows_shrink() {
        let mut options = sample();
        let mut state = OptionListState::default();
        state.refresh(&options, false);
        state.select_next();

        options[2].visible = false;
        state.refresh(&options, false);
        assert_eq!(state.current_option(), Some(1));

        options[1].visible = false;
        state.refresh(&options, false);
        assert_eq!(state.current_option(), None);
        assert_eq!(state.selected_row(), None);
    }

    #[test]
    fn renders_placeholder_when_nothing_matches() {
        let backend = TestBackend::new(40, 6);
        let mut terminal = Terminal::new(backend).unwrap();
        let options = vec![option("Rock", false)];
        let mut state = OptionListState::default();
        state.refresh(&options, false);

        terminal
            .draw(|frame| {
                let area = frame.size();
                OptionList.render(
                    frame,
                    area,
                    &state,
                    &options,
                    FilterOutcome { shown: 0, hidden: 1 },
                    true,
                    true,
                );
            })
            .unwrap();

        let buffer = terminal.backend().buffer();
        let row: String = (0..40).map(|x| buffer.get(x, 1).symbol().to_string()).collect();
        assert!(row.contains("No options match filter"));
    }
}
