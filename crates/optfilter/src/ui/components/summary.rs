//! Binding summary component.

use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, List, ListItem, Paragraph, Wrap};

use crate::domain::model::{FilterOutcome, UnresolvedTarget};

/// One bound filter as shown in the sidebar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindingRow {
    pub key: String,
    pub target: String,
    pub outcome: FilterOutcome,
    pub selected: usize,
}

/// Lists every binding with its counts, plus unresolved targets.
#[derive(Debug, Default)]
pub struct Summary {
    rows: Vec<BindingRow>,
    unresolved: Vec<UnresolvedTarget>,
}

impl Summary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the rows with fresh data from the page.
    pub fn update(&mut self, rows: Vec<BindingRow>, unresolved: Vec<UnresolvedTarget>) {
        self.rows = rows;
        self.unresolved = unresolved;
    }

    /// Render the summary inside the provided area.
    pub fn render(&self, frame: &mut Frame<'_>, area: Rect, focused: usize) {
        let block = Block::default().title("Filters").borders(Borders::ALL);
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let unresolved_height = if self.unresolved.is_empty() {
            0
        } else {
            self.unresolved.len() as u16 + 1
        };
        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(1), Constraint::Length(unresolved_height)])
            .split(inner);

        if self.rows.is_empty() {
            let placeholder = Paragraph::new("No filter inputs bound")
                .wrap(Wrap { trim: true })
                .style(Style::default().fg(Color::DarkGray));
            frame.render_widget(placeholder, layout[0]);
        } else {
            let items: Vec<ListItem> = self
                .rows
                .iter()
                .enumerate()
                .map(|(index, row)| binding_item(row, index == focused))
                .collect();
            frame.render_widget(List::new(items), layout[0]);
        }

        if !self.unresolved.is_empty() {
            let mut lines = vec![Line::styled(
                "Unresolved",
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
            )];
            lines.extend(self.unresolved.iter().map(|target| {
                Line::styled(
                    format!("! {}", target.target_label()),
                    Style::default().fg(Color::Yellow),
                )
            }));
            frame.render_widget(Paragraph::new(lines), layout[1]);
        }
    }
}

fn binding_item(row: &BindingRow, focused: bool) -> ListItem<'static> {
    let marker = if focused { "▸ " } else { "  " };
    let mut key_style = Style::default();
    if focused {
        key_style = key_style.fg(Color::Cyan).add_modifier(Modifier::BOLD);
    }
    let mut spans = vec![
        Span::styled(marker, Style::default().fg(Color::Cyan)),
        Span::styled(row.key.clone(), key_style),
        Span::styled(format!(" → {}", row.target), Style::default().fg(Color::Gray)),
        Span::raw(format!("  {}/{}", row.outcome.shown, row.outcome.total())),
    ];
    if row.selected > 0 {
        spans.push(Span::styled(
            format!(" · {} sel", row.selected),
            Style::default().fg(Color::Green),
        ));
    }
    ListItem::new(Line::from(spans))
}

#[cfg(test)]
mod tests {
    use super::*;

    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    use crate::domain::dom::Document;

    #[test]
    fn renders_bindings_and_unresolved_targets() {
        let backend = TestBackend::new(50, 10);
        let mut terminal = Terminal::new(backend).unwrap();

        let mut doc = Document::new();
        let root = doc.root();
        let input = doc.create_element(root, "input", Vec::new());

        let mut summary = Summary::new();
        summary.update(
            vec![BindingRow {
                key: "genre-search".into(),
                target: "genres".into(),
                outcome: FilterOutcome { shown: 3, hidden: 5 },
                selected: 1,
            }],
            vec![UnresolvedTarget {
                ordinal: 1,
                input,
                input_id: None,
                target: Some("parent-genres".into()),
            }],
        );

        terminal
            .draw(|frame| {
                let area = frame.size();
                summary.render(frame, area, 0);
            })
            .unwrap();

        let buffer = terminal.backend().buffer();
        let text: String = (0..10)
            .map(|y| {
                (0..50)
                    .map(|x| buffer.get(x, y).symbol().to_string())
                    .collect::<String>()
            })
            .collect::<Vec<_>>()
            .join("\n");
        assert!(text.contains("genre-search → genres  3/8 · 1 sel"));
        assert!(text.contains("! parent-genres"));
    }
}
