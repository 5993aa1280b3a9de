//! Application loop for the TUI.

use std::io;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};
use ratatui::{Frame, Terminal};

use crate::app::page::Page;
use crate::app::session::{SessionSnapshot, SessionStore};
use crate::infra::config::Config;
use crate::ui::components::filter_input::{FilterInput, FilterInputState};
use crate::ui::components::option_list::{OptionList, OptionListState};
use crate::ui::components::summary::{BindingRow, Summary};

const TICK_RATE: Duration = Duration::from_millis(120);

/// Interactive filtering of one markup page.
pub struct UiApp {
    config: Config,
    document_path: PathBuf,
    page: Option<Page>,
    focused: usize,
    focus: FocusTarget,
    filter_input: FilterInputState,
    filter_component: FilterInput,
    list: OptionListState,
    list_component: OptionList,
    summary: Summary,
    session_store: SessionStore,
    status: Option<StatusMessage>,
    should_quit: bool,
}

impl UiApp {
    pub fn new(config: Config, document_path: PathBuf) -> Self {
        Self {
            config,
            document_path,
            page: None,
            focused: 0,
            focus: FocusTarget::Filter,
            filter_input: FilterInputState::default(),
            filter_component: FilterInput,
            list: OptionListState::default(),
            list_component: OptionList,
            summary: Summary::new(),
            session_store: SessionStore::new(PathBuf::from(".")),
            status: None,
            should_quit: false,
        }
    }

    /// Launch the terminal UI and enter the event loop.
    pub fn run(&mut self) -> Result<()> {
        self.bootstrap()?;

        enable_raw_mode().context("failed to enable raw mode")?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen).context("failed to enter alternate screen")?;

        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend).context("failed to initialize terminal")?;
        terminal.hide_cursor().ok();

        let event_loop_result = self.event_loop(&mut terminal);

        disable_raw_mode().ok();
        let _ = execute!(terminal.backend_mut(), LeaveAlternateScreen);
        let _ = terminal.show_cursor();

        event_loop_result
    }

    fn bootstrap(&mut self) -> Result<()> {
        let root = std::env::current_dir().context("unable to determine working directory")?;
        self.session_store = SessionStore::new(&root);

        let page = Page::load(&self.document_path, self.config.discovery.clone())?;
        self.attach_page(page);

        match self.session_store.load() {
            Ok(Some(snapshot)) if snapshot.matches(&self.document_path) => {
                self.restore_session(snapshot);
            }
            Ok(_) => {}
            Err(err) => {
                tracing::warn!(error = %err, "ignoring unreadable session");
                self.set_status(StatusLevel::Warning, format!("Session not restored: {err}"));
            }
        }
        Ok(())
    }

    /// Install a ready page and reset focus to its first binding.
    fn attach_page(&mut self, page: Page) {
        if !page.unresolved().is_empty() {
            let targets: Vec<&str> = page
                .unresolved()
                .iter()
                .map(|target| target.target_label())
                .collect();
            self.set_status(
                StatusLevel::Warning,
                format!("Filter target not found: {}", targets.join(", ")),
            );
        }
        self.page = Some(page);
        self.focus_binding(0);
    }

    fn event_loop(&mut self, terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
        loop {
            terminal.draw(|frame| self.render(frame))?;
            self.tick();

            if self.should_quit {
                break;
            }

            if event::poll(TICK_RATE)? {
                let ev = event::read()?;
                self.handle_event(ev)?;
            }
        }
        Ok(())
    }

    fn render(&mut self, frame: &mut Frame<'_>) {
        let size = frame.size();
        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(5), Constraint::Length(2)])
            .split(size);

        let main_chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(40), Constraint::Min(30)])
            .split(layout[0]);

        let right_chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(3), Constraint::Min(3)])
            .split(main_chunks[1]);

        self.summary.render(frame, main_chunks[0], self.focused);

        match &self.page {
            Some(page) if !page.bindings().is_empty() => {
                let title = page
                    .bindings()
                    .get(self.focused)
                    .map(|binding| format!("Filter · {}", binding.target))
                    .unwrap_or_else(|| "Filter".to_owned());
                self.filter_component.render(
                    frame,
                    right_chunks[0],
                    &self.filter_input,
                    &title,
                    matches!(self.focus, FocusTarget::Filter),
                );

                let options = page.options(self.focused);
                self.list_component.render(
                    frame,
                    right_chunks[1],
                    &self.list,
                    &options,
                    page.outcome(self.focused),
                    self.config.display.show_counts(),
                    matches!(self.focus, FocusTarget::Options),
                );
            }
            _ => {
                let block = Block::default().title("Options").borders(Borders::ALL);
                let placeholder = Paragraph::new(format!(
                    "No input with class '{}' and a resolvable '{}' attribute",
                    self.config.discovery.marker_class(),
                    self.config.discovery.target_attribute()
                ))
                .block(block)
                .wrap(Wrap { trim: true })
                .style(Style::default().fg(Color::DarkGray));
                frame.render_widget(placeholder, main_chunks[1]);
            }
        }

        self.render_status(frame, layout[1]);
    }

    fn render_status(&mut self, frame: &mut Frame<'_>, area: Rect) {
        let block = Block::default().borders(Borders::TOP);
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let line = match &self.status {
            Some(status) => {
                let style = match status.level {
                    StatusLevel::Info => Style::default().fg(Color::Gray),
                    StatusLevel::Success => Style::default().fg(Color::Green),
                    StatusLevel::Warning => Style::default().fg(Color::Yellow),
                    StatusLevel::Error => Style::default().fg(Color::Red),
                };
                Line::styled(status.text.clone(), style)
            }
            None => Line::from(vec![
                Span::styled("tab", Style::default().fg(Color::Cyan)),
                Span::raw(" filter/options · "),
                Span::styled("ctrl+n/p", Style::default().fg(Color::Cyan)),
                Span::raw(" binding · "),
                Span::styled("space", Style::default().fg(Color::Cyan)),
                Span::raw(" toggle · "),
                Span::styled("ctrl+s", Style::default().fg(Color::Cyan)),
                Span::raw(" save · "),
                Span::styled("esc", Style::default().fg(Color::Cyan)),
                Span::raw(" quit"),
            ])
            .style(Style::default().fg(Color::Gray)),
        };
        frame.render_widget(Paragraph::new(line), inner);
    }

    fn tick(&mut self) {
        if self.status.as_ref().is_some_and(StatusMessage::is_expired) {
            self.status = None;
        }
    }

    fn handle_event(&mut self, event: Event) -> Result<()> {
        match event {
            Event::Key(key) => self.handle_key_event(key)?,
            Event::Paste(text) => {
                if matches!(self.focus, FocusTarget::Filter) {
                    for ch in text.chars().filter(|ch| !ch.is_control()) {
                        self.filter_input.push_char(ch);
                    }
                    self.apply_filter();
                }
            }
            Event::Resize(..) | Event::Mouse(_) | Event::FocusGained | Event::FocusLost => {}
        }
        Ok(())
    }

    fn handle_key_event(&mut self, key: KeyEvent) -> Result<()> {
        if key.kind != KeyEventKind::Press {
            return Ok(());
        }

        if key.modifiers.contains(KeyModifiers::CONTROL) {
            match key.code {
                KeyCode::Char('c') | KeyCode::Char('q') => {
                    self.should_quit = true;
                }
                KeyCode::Char('s') => self.save_session(),
                KeyCode::Char('n') => self.cycle_binding(1),
                KeyCode::Char('p') => self.cycle_binding(-1),
                KeyCode::Char('u') => {
                    if self.filter_input.clear() {
                        self.apply_filter();
                    }
                }
                _ => {}
            }
            return Ok(());
        }

        match self.focus {
            FocusTarget::Filter => self.handle_filter_key(key),
            FocusTarget::Options => self.handle_options_key(key),
        }
        Ok(())
    }

    fn handle_filter_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => {
                self.should_quit = true;
            }
            KeyCode::Tab | KeyCode::Enter | KeyCode::Down => {
                self.focus = FocusTarget::Options;
            }
            KeyCode::BackTab => self.cycle_binding(-1),
            KeyCode::Backspace => {
                if self.filter_input.pop_char() {
                    self.apply_filter();
                }
            }
            KeyCode::Char(ch) => {
                self.filter_input.push_char(ch);
                self.apply_filter();
            }
            _ => {}
        }
    }

    fn handle_options_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc | KeyCode::Tab | KeyCode::Char('/') => {
                self.focus = FocusTarget::Filter;
            }
            KeyCode::BackTab => self.cycle_binding(-1),
            KeyCode::Char('j') | KeyCode::Down => self.list.select_next(),
            KeyCode::Char('k') | KeyCode::Up => self.list.select_previous(),
            KeyCode::Char('l') | KeyCode::Right => self.cycle_binding(1),
            KeyCode::Char('h') | KeyCode::Left => self.cycle_binding(-1),
            KeyCode::Char(' ') | KeyCode::Enter => self.toggle_current_option(),
            KeyCode::Char('q') => {
                self.should_quit = true;
            }
            _ => {}
        }
    }

    /// Push the edit buffer into the focused input, firing its listener.
    fn apply_filter(&mut self) {
        let Some(page) = self.page.as_mut() else {
            return;
        };
        if page.bindings().is_empty() {
            return;
        }
        page.type_into(self.focused, self.filter_input.input());
        self.refresh_view();
    }

    fn toggle_current_option(&mut self) {
        let Some(option) = self.list.current_option() else {
            return;
        };
        let Some(page) = self.page.as_mut() else {
            return;
        };
        match page.toggle_selected(self.focused, option) {
            Ok(_) => self.refresh_view(),
            Err(err) => self.set_status(StatusLevel::Error, err.to_string()),
        }
    }

    fn cycle_binding(&mut self, delta: isize) {
        let count = self
            .page
            .as_ref()
            .map(|page| page.bindings().len())
            .unwrap_or(0);
        if count == 0 {
            return;
        }
        let next = (self.focused as isize + delta).rem_euclid(count as isize) as usize;
        self.focus_binding(next);
    }

    fn focus_binding(&mut self, index: usize) {
        self.focused = index;
        self.list = OptionListState::default();
        let text = self
            .page
            .as_ref()
            .map(|page| page.filter_text(index).to_owned())
            .unwrap_or_default();
        self.filter_input.set_input(text);
        self.refresh_view();
    }

    fn refresh_view(&mut self) {
        let Some(page) = self.page.as_ref() else {
            return;
        };
        let options = page.options(self.focused);
        self.list
            .refresh(&options, self.config.display.show_hidden());

        let rows = page
            .bindings()
            .iter()
            .enumerate()
            .map(|(index, binding)| BindingRow {
                key: binding.key(),
                target: binding.target.clone(),
                outcome: page.outcome(index),
                selected: page.selected_values(index).len(),
            })
            .collect();
        self.summary.update(rows, page.unresolved().to_vec());
    }

    /// Persist the session. Failures stay in the status line so the UI keeps
    /// running with its state intact.
    fn save_session(&mut self) {
        let Some(page) = self.page.as_ref() else {
            return;
        };
        let focused = page.bindings().get(self.focused).map(|binding| binding.key());
        let snapshot = SessionSnapshot::capture(&self.document_path, page, focused);
        match self.session_store.save(&snapshot) {
            Ok(()) => {
                let path = self.session_store.path().display().to_string();
                self.set_status(StatusLevel::Success, format!("Session saved to {path}"));
            }
            Err(err) => {
                tracing::warn!(error = %err, "failed to save session");
                self.set_status(StatusLevel::Error, format!("Failed to save session: {err:#}"));
            }
        }
    }

    fn restore_session(&mut self, snapshot: SessionSnapshot) {
        let Some(page) = self.page.as_mut() else {
            return;
        };
        let restored = snapshot.restore(page);
        let focused = snapshot
            .focused
            .as_deref()
            .and_then(|key| page.binding_index(key).ok())
            .unwrap_or(0);
        self.focus_binding(focused);
        if restored > 0 {
            self.set_status(
                StatusLevel::Info,
                format!("Restored {restored} filter(s) from last session"),
            );
        }
    }

    fn set_status<S: Into<String>>(&mut self, level: StatusLevel, message: S) {
        self.status = Some(StatusMessage::new(level, message.into()));
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FocusTarget {
    Filter,
    Options,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StatusLevel {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone)]
struct StatusMessage {
    level: StatusLevel,
    text: String,
    expires_at: Instant,
}

impl StatusMessage {
    fn new(level: StatusLevel, text: String) -> Self {
        Self {
            level,
            text,
            expires_at: Instant::now() + Duration::from_secs(4),
        }
    }

    fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use ratatui::backend::TestBackend;

    const PAGE: &str = r#"
<input id="genre-search" class="genre-filter" data-target="genres">
<select id="genres" multiple>
  <option value="rock">Rock</option>
  <option value="death-metal">Death Metal</option>
  <option value="thrash-metal">Thrash Metal</option>
</select>
<input id="band-search" class="genre-filter" data-target="bands">
<select id="bands" multiple><option>Pantera</option><option>Anthrax</option></select>
<input class="genre-filter" data-target="parent-genres">
"#;

    fn app() -> UiApp {
        let config = Config::default();
        let page = Page::from_markup(PAGE, config.discovery.clone()).unwrap();
        let mut app = UiApp::new(config, PathBuf::from("page.html"));
        app.attach_page(page);
        app
    }

    fn press(app: &mut UiApp, code: KeyCode) {
        app.handle_key_event(KeyEvent::new(code, KeyModifiers::NONE))
            .unwrap();
    }

    fn ctrl(app: &mut UiApp, ch: char) {
        app.handle_key_event(KeyEvent::new(KeyCode::Char(ch), KeyModifiers::CONTROL))
            .unwrap();
    }

    fn visible(app: &UiApp, index: usize) -> Vec<String> {
        app.page
            .as_ref()
            .unwrap()
            .options(index)
            .into_iter()
            .filter(|option| option.visible)
            .map(|option| option.label)
            .collect()
    }

    #[test]
    fn every_keystroke_refilters() {
        let mut app = app();
        for ch in "metal".chars() {
            press(&mut app, KeyCode::Char(ch));
        }
        assert_eq!(visible(&app, 0), vec!["Death Metal", "Thrash Metal"]);

        for ch in " th".chars() {
            press(&mut app, KeyCode::Char(ch));
        }
        assert!(visible(&app, 0).is_empty());

        press(&mut app, KeyCode::Backspace);
        press(&mut app, KeyCode::Backspace);
        press(&mut app, KeyCode::Backspace);
        assert_eq!(visible(&app, 0), vec!["Death Metal", "Thrash Metal"]);

        ctrl(&mut app, 'u');
        assert_eq!(visible(&app, 0).len(), 3);
    }

    #[test]
    fn toggles_selection_under_cursor() {
        let mut app = app();
        for ch in "thr".chars() {
            press(&mut app, KeyCode::Char(ch));
        }
        press(&mut app, KeyCode::Tab);
        press(&mut app, KeyCode::Char(' '));

        let page = app.page.as_ref().unwrap();
        assert_eq!(page.selected_values(0), vec!["thrash-metal"]);
    }

    #[test]
    fn switching_bindings_keeps_each_filter() {
        let mut app = app();
        press(&mut app, KeyCode::Char('r'));
        ctrl(&mut app, 'n');
        assert_eq!(app.focused, 1);
        assert_eq!(app.filter_input.input(), "");

        press(&mut app, KeyCode::Char('x'));
        assert_eq!(visible(&app, 1), vec!["Anthrax"]);
        assert_eq!(visible(&app, 0), vec!["Rock", "Thrash Metal"]);

        ctrl(&mut app, 'n');
        assert_eq!(app.focused, 0);
        assert_eq!(app.filter_input.input(), "r");
    }

    #[test]
    fn unresolved_targets_surface_in_status() {
        let app = app();
        let status = app.status.as_ref().expect("status set");
        assert_eq!(status.level, StatusLevel::Warning);
        assert_eq!(status.text, "Filter target not found: parent-genres");
    }

    #[test]
    fn escape_quits_from_filter() {
        let mut app = app();
        press(&mut app, KeyCode::Tab);
        press(&mut app, KeyCode::Esc);
        assert!(!app.should_quit);
        press(&mut app, KeyCode::Esc);
        assert!(app.should_quit);
    }

    #[test]
    fn renders_full_layout() {
        let backend = TestBackend::new(100, 20);
        let mut terminal = Terminal::new(backend).unwrap();
        let mut app = app();
        press(&mut app, KeyCode::Char('d'));

        terminal.draw(|frame| app.render(frame)).unwrap();

        let buffer = terminal.backend().buffer();
        let text: String = (0..20)
            .map(|y| {
                (0..100)
                    .map(|x| buffer.get(x, y).symbol().to_string())
                    .collect::<String>()
            })
            .collect::<Vec<_>>()
            .join("\n");
        assert!(text.contains("Filter · genres"));
        assert!(text.contains("Options · 1/3 shown"));
        assert!(text.contains("Death Metal"));
        assert!(!text.contains("Thrash Metal"));
    }

    #[test]
    fn session_round_trip_restores_focus_and_filters() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let mut app = app();
        app.session_store = SessionStore::new(temp.path());
        ctrl(&mut app, 'n');
        press(&mut app, KeyCode::Char('p'));
        ctrl(&mut app, 's');

        let snapshot = app.session_store.load()?.expect("saved");
        let mut restored = UiApp::new(Config::default(), PathBuf::from("page.html"));
        restored.attach_page(Page::from_markup(PAGE, Default::default()).unwrap());
        restored.restore_session(snapshot);

        assert_eq!(restored.focused, 1);
        assert_eq!(restored.filter_input.input(), "p");
        assert_eq!(visible(&restored, 1), vec!["Pantera"]);
        Ok(())
    }

    #[test]
    fn failed_save_keeps_the_ui_running() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let blocker = temp.path().join("not-a-dir");
        std::fs::write(&blocker, "")?;

        let mut app = app();
        app.session_store = SessionStore::new(&blocker);
        press(&mut app, KeyCode::Char('r'));
        ctrl(&mut app, 's');

        assert!(!app.should_quit);
        let status = app.status.as_ref().expect("status set");
        assert_eq!(status.level, StatusLevel::Error);
        assert!(status.text.starts_with("Failed to save session"));
        assert_eq!(app.filter_input.input(), "r");
        assert_eq!(visible(&app, 0), vec!["Rock", "Thrash Metal"]);
        Ok(())
    }
}
