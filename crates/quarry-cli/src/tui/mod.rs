//! Interactive TUI (Terminal User Interface) for Quarry.
//!
//! Provides a search-as-you-type interface with:
//! - Debounced search while typing
//! - Navigation through results
//! - Optional catalog monitoring with automatic rebuilds
//!
//! Enter exits and prints the record indices of the selected entry, so the
//! TUI can feed a player or playlist tool.

use crate::app::App;
use crate::debounce::Debouncer;
use crate::render::{summary, Detail, FieldStyle};
use crate::watcher::{CatalogWatcher, WatchHandle};
use crossbeam_channel::Receiver;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use quarry_core::{ChannelSourceListener, Config, SearchOutcome, SourceEvent, UpdateLevel};
use ratatui::{prelude::*, widgets::*};
use std::io;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::warn;

/// Catalog monitoring state, present when `library.monitor` is on.
struct Monitor {
    _handle: WatchHandle,
    events: Receiver<SourceEvent>,
    settle: Debouncer,
    pending: UpdateLevel,
}

/// TUI application state.
struct TuiApp {
    /// The main application
    app: App,

    /// Current search query string
    query_string: String,

    /// Current search results
    outcome: SearchOutcome,

    /// Selected result index
    selected: usize,

    /// Vertical scroll offset, in results
    scroll_offset: usize,

    /// Whether we should quit
    should_quit: bool,

    /// Record indices of the entry chosen with Enter
    chosen: Option<Vec<usize>>,

    /// Last search time
    last_search_time: Duration,

    /// Status message
    status_message: Option<String>,

    /// Delays the search until typing pauses
    typing: Debouncer,

    monitor: Option<Monitor>,
}

impl TuiApp {
    fn new(app: App) -> anyhow::Result<Self> {
        let monitor = if app.config.library.monitor {
            let (listener, events) = ChannelSourceListener::new();
            let handle = CatalogWatcher::new(app.catalog.path())
                .spawn(Arc::new(listener))?;
            Some(Monitor {
                _handle: handle,
                events,
                settle: Debouncer::new(app.config.settle()),
                pending: UpdateLevel::Selection,
            })
        } else {
            None
        };

        Ok(TuiApp {
            typing: Debouncer::new(app.config.debounce()),
            app,
            query_string: String::new(),
            outcome: SearchOutcome::default(),
            selected: 0,
            scroll_offset: 0,
            should_quit: false,
            chosen: None,
            last_search_time: Duration::ZERO,
            status_message: None,
            monitor,
        })
    }

    /// Perform a search with the current query.
    fn search(&mut self) {
        let start = Instant::now();
        self.outcome = self.app.library.search_text(&self.query_string);
        self.last_search_time = start.elapsed();

        // Reset selection
        self.selected = 0;
        self.scroll_offset = 0;
        self.status_message = None;
    }

    /// Handle input character.
    fn on_char(&mut self, c: char) {
        self.query_string.push(c);
        self.typing.trigger();
    }

    /// Handle backspace.
    fn on_backspace(&mut self) {
        if self.query_string.pop().is_some() {
            self.typing.trigger();
        }
    }

    /// Run timers: the typing debounce, catalog changes and stale results.
    fn tick(&mut self) {
        let now = Instant::now();

        if self.typing.ready(now) {
            self.search();
        }

        if let Some(level) = self.settled_change(now) {
            match self.app.reload(SourceEvent::Updated(level)) {
                Ok(_) => {}
                Err(e) => {
                    warn!(error = %e, "Catalog reload failed");
                    self.status_message = Some(format!("Reload failed: {}", e));
                }
            }
        }

        // results from before a rebuild may name nodes that no longer exist
        if !self.app.library.is_current(&self.outcome) && !self.typing.is_pending() {
            self.search();
        }
    }

    /// Drain catalog notifications; returns the accumulated update level
    /// once the catalog has been quiet for the settle period.
    fn settled_change(&mut self, now: Instant) -> Option<UpdateLevel> {
        let monitor = self.monitor.as_mut()?;
        while let Ok(event) = monitor.events.try_recv() {
            if let SourceEvent::Updated(level) = event {
                monitor.pending = monitor.pending.max(level);
                monitor.settle.trigger_at(now);
            }
        }

        if monitor.settle.ready(now) {
            Some(std::mem::replace(
                &mut monitor.pending,
                UpdateLevel::Selection,
            ))
        } else {
            None
        }
    }

    /// Move selection up.
    fn select_previous(&mut self) {
        if self.selected > 0 {
            self.selected -= 1;
            self.ensure_visible(10);
        }
    }

    /// Move selection down.
    fn select_next(&mut self) {
        if self.selected + 1 < self.outcome.results.len() {
            self.selected += 1;
            self.ensure_visible(10);
        }
    }

    /// Page up.
    fn page_up(&mut self, page_size: usize) {
        self.selected = self.selected.saturating_sub(page_size);
        self.ensure_visible(page_size);
    }

    /// Page down.
    fn page_down(&mut self, page_size: usize) {
        self.selected =
            (self.selected + page_size).min(self.outcome.results.len().saturating_sub(1));
        self.ensure_visible(page_size);
    }

    /// Ensure selected item is visible.
    fn ensure_visible(&mut self, visible_height: usize) {
        let visible_height = visible_height.max(1);
        if self.selected < self.scroll_offset {
            self.scroll_offset = self.selected;
        } else if self.selected >= self.scroll_offset + visible_height {
            self.scroll_offset = self.selected + 1 - visible_height;
        }
    }

    /// Choose the selected entry and quit.
    fn choose_selected(&mut self) {
        if let Some(result) = self.outcome.results.get(self.selected) {
            self.chosen = Some(result.matches.clone());
            self.should_quit = true;
        }
    }
}

/// Run the TUI application.
pub fn run(config: Config) -> anyhow::Result<()> {
    let app = App::new(config)?;
    let mut tui_app = TuiApp::new(app)?;

    // Initial search (empty = browse everything)
    tui_app.search();

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Main loop
    let result = run_loop(&mut terminal, &mut tui_app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result?;

    if let Some(records) = tui_app.chosen {
        for record in records {
            println!("{}", record);
        }
    }

    Ok(())
}

/// Main event loop.
fn run_loop<B: Backend>(terminal: &mut Terminal<B>, app: &mut TuiApp) -> anyhow::Result<()> {
    loop {
        terminal.draw(|f| ui::draw(f, app))?;

        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    match key.code {
                        KeyCode::Esc => {
                            app.should_quit = true;
                        }
                        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                            app.should_quit = true;
                        }
                        KeyCode::Char(c) => {
                            app.on_char(c);
                        }
                        KeyCode::Backspace => {
                            app.on_backspace();
                        }
                        KeyCode::Up => {
                            app.select_previous();
                        }
                        KeyCode::Down => {
                            app.select_next();
                        }
                        KeyCode::PageUp => {
                            app.page_up(10);
                        }
                        KeyCode::PageDown => {
                            app.page_down(10);
                        }
                        KeyCode::Home => {
                            app.selected = 0;
                            app.scroll_offset = 0;
                        }
                        KeyCode::End => {
                            if !app.outcome.results.is_empty() {
                                app.selected = app.outcome.results.len() - 1;
                                app.ensure_visible(10);
                            }
                        }
                        KeyCode::Enter => {
                            app.choose_selected();
                        }
                        _ => {}
                    }
                }
            }
        }

        app.tick();

        if app.should_quit {
            break;
        }
    }

    Ok(())
}

mod ui {
    use super::*;

    /// Lines per result: name and detail.
    const ITEM_HEIGHT: usize = 2;

    /// Draw the UI.
    pub fn draw(f: &mut Frame, app: &mut TuiApp) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .margin(1)
            .constraints([
                Constraint::Length(3), // Search box
                Constraint::Min(10),   // Results
                Constraint::Length(2), // Status bar
            ])
            .split(f.area());

        draw_search_box(f, app, chunks[0]);
        draw_results(f, app, chunks[1]);
        draw_status_bar(f, app, chunks[2]);
    }

    /// Draw the search input box.
    fn draw_search_box(f: &mut Frame, app: &TuiApp, area: Rect) {
        let input = Paragraph::new(app.query_string.as_str())
            .style(Style::default().fg(Color::Yellow))
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(" Search library "),
            );
        f.render_widget(input, area);

        // Show cursor
        f.set_cursor_position(Position::new(
            area.x + app.query_string.chars().count() as u16 + 1,
            area.y + 1,
        ));
    }

    /// Draw the results list.
    fn draw_results(f: &mut Frame, app: &mut TuiApp, area: Rect) {
        let visible_height = (area.height.saturating_sub(2) as usize / ITEM_HEIGHT).max(1);
        app.ensure_visible(visible_height);

        let items: Vec<ListItem> = app
            .outcome
            .results
            .iter()
            .skip(app.scroll_offset)
            .take(visible_height)
            .enumerate()
            .map(|(i, result)| {
                let base = if i + app.scroll_offset == app.selected {
                    Style::default().bg(Color::Blue).fg(Color::White)
                } else {
                    Style::default()
                };
                let detail_style = if i + app.scroll_offset == app.selected {
                    base
                } else {
                    base.fg(Color::DarkGray)
                };

                let name = FieldStyle::of(result.field).span(&result.name, base);
                let detail = Detail::of(result).line(detail_style);

                ListItem::new(vec![Line::from(name), detail]).style(base)
            })
            .collect();

        let searching = if app.typing.is_pending() { " ..." } else { "" };
        let title = format!(
            " Results ({:.1}ms){} ",
            app.last_search_time.as_secs_f64() * 1000.0,
            searching
        );

        let results = List::new(items).block(Block::default().borders(Borders::ALL).title(title));

        f.render_widget(results, area);
    }

    /// Draw the status bar.
    fn draw_status_bar(f: &mut Frame, app: &TuiApp, area: Rect) {
        let status = if let Some(ref msg) = app.status_message {
            msg.clone()
        } else if !app.app.library.is_valid() {
            "Library is updating...".to_string()
        } else {
            let monitoring = if app.monitor.is_some() { " | Monitoring" } else { "" };
            format!(
                "{}{} | Up/Down:Navigate Enter:Choose Esc:Quit",
                summary(&app.outcome),
                monitoring
            )
        };

        let status_bar = Paragraph::new(status).style(Style::default().fg(Color::Gray));

        f.render_widget(status_bar, area);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quarry_core::{Catalog, MediaRecord};
    use tempfile::TempDir;

    fn test_app(dir: &TempDir) -> TuiApp {
        let mut config = Config::default();
        config.general.catalog_path = Some(dir.path().join("library.json"));
        config.search.debounce_ms = 0;
        Catalog::write(
            &config.catalog_path().unwrap(),
            &[
                MediaRecord::new("Jazz", "Mingus", "Ah Um", "Fables"),
                MediaRecord::new("Jazz", "Mingus", "Ah Um", "Boogie"),
                MediaRecord::new("Jazz", "Monk", "Brilliant Corners", "Pannonica"),
            ],
        )
        .unwrap();
        TuiApp::new(App::new(config).unwrap()).unwrap()
    }

    #[test]
    fn test_typing_searches_after_debounce() {
        let temp_dir = TempDir::new().unwrap();
        let mut app = test_app(&temp_dir);
        app.search();

        for c in "fables".chars() {
            app.on_char(c);
        }
        assert!(app.typing.is_pending());

        app.tick();
        assert!(!app.typing.is_pending());
        assert_eq!(app.outcome.shown(), 1);
        assert_eq!(app.outcome.results[0].name, "Fables");
    }

    #[test]
    fn test_enter_chooses_selected_records() {
        let temp_dir = TempDir::new().unwrap();
        let mut app = test_app(&temp_dir);
        app.query_string = "ah um".to_string();
        app.search();

        app.choose_selected();
        assert!(app.should_quit);
        assert_eq!(app.chosen, Some(vec![0, 1]));
    }

    #[test]
    fn test_selection_stays_in_bounds() {
        let temp_dir = TempDir::new().unwrap();
        let mut app = test_app(&temp_dir);
        app.search();

        app.select_previous();
        assert_eq!(app.selected, 0);

        app.page_down(100);
        assert_eq!(app.selected, app.outcome.results.len() - 1);
        app.select_next();
        assert_eq!(app.selected, app.outcome.results.len() - 1);
    }

    #[test]
    fn test_stale_results_are_refreshed() {
        let temp_dir = TempDir::new().unwrap();
        let mut app = test_app(&temp_dir);
        app.search();
        let generation = app.outcome.generation;

        app.app.library.rebuild(&app.app.catalog);
        app.tick();
        assert_eq!(app.outcome.generation, generation + 1);
    }
}
