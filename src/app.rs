use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::time::{Duration, Instant};
use tokio::sync::oneshot;

use crate::config::AppConfig;
use crate::controller::{DisplaySurface, InventoryController, LoadState, ProductCard};
use crate::inventory::sheets::{SheetSource, SheetsClient};
use crate::inventory::{InventoryError, InventoryStats};

/// How long a status message stays in the info line
const STATUS_TIMEOUT: Duration = Duration::from_secs(3);

type RowsResult = Result<Vec<Vec<String>>, InventoryError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Search,
    Grid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Popup {
    None,
    Help,
    Detail,
}

/// Display state the controller writes and `ui::draw` reads
#[derive(Debug, Default)]
pub struct TerminalSurface {
    pub loading: bool,
    pub error: Option<String>,
    pub cards: Vec<ProductCard>,
    pub stats: InventoryStats,
}

impl DisplaySurface for TerminalSurface {
    fn set_loading(&mut self, loading: bool) {
        self.loading = loading;
    }

    fn set_error(&mut self, message: Option<String>) {
        self.error = message;
    }

    fn render_cards(&mut self, cards: &[ProductCard]) {
        self.cards = cards.to_vec();
    }

    fn set_stats(&mut self, stats: InventoryStats) {
        self.stats = stats;
    }
}

pub struct App {
    pub inventory: InventoryController<TerminalSurface>,
    pub focus: Focus,
    pub popup: Popup,

    // Search field contents
    pub input: String,

    // Card grid
    pub selected: usize,
    pub grid_columns: usize,     // Set from terminal width before each draw

    // Status message (auto-clears after timeout)
    pub status_message: Option<String>,
    pub status_message_time: Option<Instant>,

    pub spinner_frame: usize,
    pub should_quit: bool,

    pending_load: Option<oneshot::Receiver<RowsResult>>,
}

impl App {
    pub fn new(config: AppConfig, initial_search: Option<String>) -> Self {
        let mut inventory = InventoryController::new(config, TerminalSurface::default());
        let input = initial_search.unwrap_or_default();
        inventory.search(&input);

        Self {
            inventory,
            focus: Focus::Search,
            popup: Popup::None,
            input,
            selected: 0,
            grid_columns: 1,
            status_message: None,
            status_message_time: None,
            spinner_frame: 0,
            should_quit: false,
            pending_load: None,
        }
    }

    /// Kick off the one startup fetch on a background task
    pub fn start_load(&mut self) {
        self.inventory.begin_loading();

        let client = match SheetsClient::new(&self.inventory.config().sheet) {
            Ok(client) => client,
            Err(e) => {
                let _ = self.inventory.finish_loading(Err(e));
                return;
            }
        };

        let (tx, rx) = oneshot::channel();
        tokio::spawn(async move {
            let rows = client.fetch_rows().await;
            let _ = tx.send(rows);
        });
        self.pending_load = Some(rx);
    }

    /// Deliver a finished fetch to the controller. Used directly by tests.
    fn complete_load(&mut self, rows: RowsResult) {
        match self.inventory.finish_loading(rows) {
            Ok(()) => {
                let count = self.inventory.catalog().len();
                self.set_status(format!("Loaded {} products", count));
            }
            Err(e) => tracing::debug!("Load finished with error: {}", e),
        }
        self.clamp_selection();
    }

    pub fn is_loading(&self) -> bool {
        *self.inventory.state() == LoadState::Loading
    }

    pub fn cards(&self) -> &[ProductCard] {
        &self.inventory.surface().cards
    }

    pub fn selected_card(&self) -> Option<&ProductCard> {
        self.cards().get(self.selected)
    }

    /// Set a status message (auto-clears after 3 seconds)
    fn set_status(&mut self, msg: impl Into<String>) {
        self.status_message = Some(msg.into());
        self.status_message_time = Some(Instant::now());
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Result<()> {
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            self.should_quit = true;
            return Ok(());
        }

        if self.popup != Popup::None {
            self.handle_popup_key(key);
            return Ok(());
        }

        match self.focus {
            Focus::Search => self.handle_search_key(key),
            Focus::Grid => self.handle_grid_key(key),
        }
        Ok(())
    }

    fn handle_popup_key(&mut self, key: KeyEvent) {
        if matches!(
            key.code,
            KeyCode::Esc | KeyCode::Enter | KeyCode::Char('q') | KeyCode::Char('?')
        ) {
            self.popup = Popup::None;
        }
    }

    fn handle_search_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char(c) => {
                self.input.push(c);
                self.run_search();
            }
            KeyCode::Backspace => {
                if self.input.pop().is_some() {
                    self.run_search();
                }
            }
            // Enter searches too, then hands focus to the results
            KeyCode::Enter => {
                self.run_search();
                if !self.cards().is_empty() {
                    self.focus = Focus::Grid;
                }
            }
            KeyCode::Esc => {
                if !self.input.is_empty() {
                    self.input.clear();
                    self.run_search();
                }
            }
            KeyCode::Tab | KeyCode::Down => self.focus = Focus::Grid,
            _ => {}
        }
    }

    fn handle_grid_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Tab | KeyCode::BackTab | KeyCode::Char('/') | KeyCode::Esc => {
                self.focus = Focus::Search
            }
            KeyCode::Left | KeyCode::Char('h') => self.move_by(-1),
            KeyCode::Right | KeyCode::Char('l') => self.move_by(1),
            KeyCode::Up | KeyCode::Char('k') => {
                if self.selected < self.grid_columns {
                    self.focus = Focus::Search;
                } else {
                    self.move_by(-(self.grid_columns as isize));
                }
            }
            KeyCode::Down | KeyCode::Char('j') => self.move_by(self.grid_columns as isize),
            KeyCode::Home | KeyCode::Char('g') => self.selected = 0,
            KeyCode::End | KeyCode::Char('G') => {
                self.selected = self.cards().len().saturating_sub(1)
            }
            KeyCode::Enter | KeyCode::Char(' ') => {
                if self.selected_card().is_some() {
                    self.popup = Popup::Detail;
                }
            }
            KeyCode::Char('?') => self.popup = Popup::Help,
            _ => {}
        }
    }

    fn run_search(&mut self) {
        self.inventory.search(&self.input);
        self.selected = 0;
    }

    fn move_by(&mut self, delta: isize) {
        let len = self.cards().len();
        if len == 0 {
            return;
        }
        let target = self.selected as isize + delta;
        if (0..len as isize).contains(&target) {
            self.selected = target as usize;
        }
    }

    fn clamp_selection(&mut self) {
        let len = self.cards().len();
        if self.selected >= len {
            self.selected = len.saturating_sub(1);
        }
    }

    /// Periodic housekeeping: poll the fetch, advance the spinner, expire status
    pub fn tick(&mut self) {
        if let Some(rx) = self.pending_load.as_mut() {
            match rx.try_recv() {
                Ok(rows) => {
                    self.pending_load = None;
                    self.complete_load(rows);
                }
                Err(oneshot::error::TryRecvError::Empty) => {}
                Err(oneshot::error::TryRecvError::Closed) => {
                    self.pending_load = None;
                    self.complete_load(Err(InventoryError::Interrupted));
                }
            }
        }

        if self.is_loading() {
            self.spinner_frame = self.spinner_frame.wrapping_add(1);
        }

        if let Some(t) = self.status_message_time {
            if t.elapsed() >= STATUS_TIMEOUT {
                self.status_message = None;
                self.status_message_time = None;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn rows() -> RowsResult {
        let raw = [
            ["SKU", "Name", "URL", "Stock", "Image", "Incoming"],
            ["W-1", "Widget", "", "0", "", "4"],
            ["G-2", "Gadget", "", "12", "", "0"],
            ["W-3", "Small widget", "", "5", "", "1"],
            ["B-4", "Bolt", "", "40", "", "0"],
        ];
        Ok(raw
            .iter()
            .map(|r| r.iter().map(|c| c.to_string()).collect())
            .collect())
    }

    fn loaded_app() -> App {
        let mut app = App::new(AppConfig::default(), None);
        app.inventory.begin_loading();
        app.complete_load(rows());
        app
    }

    fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            app.handle_key(key(KeyCode::Char(c))).unwrap();
        }
    }

    #[test]
    fn test_typing_searches_every_keystroke() {
        let mut app = loaded_app();
        assert_eq!(app.cards().len(), 4);
        assert_eq!(app.status_message.as_deref(), Some("Loaded 4 products"));

        type_text(&mut app, "w");
        assert_eq!(app.cards().len(), 2);
        type_text(&mut app, "idg");
        assert_eq!(app.cards().len(), 2);
        type_text(&mut app, "et s");
        assert_eq!(app.cards().len(), 0);

        app.handle_key(key(KeyCode::Esc)).unwrap();
        assert!(app.input.is_empty());
        assert_eq!(app.cards().len(), 4);
    }

    #[test]
    fn test_enter_moves_focus_to_results() {
        let mut app = loaded_app();
        type_text(&mut app, "bolt");
        app.handle_key(key(KeyCode::Enter)).unwrap();

        assert_eq!(app.focus, Focus::Grid);
        assert_eq!(app.selected_card().map(|c| c.sku.as_str()), Some("B-4"));

        app.handle_key(key(KeyCode::Enter)).unwrap();
        assert_eq!(app.popup, Popup::Detail);
        app.handle_key(key(KeyCode::Esc)).unwrap();
        assert_eq!(app.popup, Popup::None);
    }

    #[test]
    fn test_grid_navigation() {
        let mut app = loaded_app();
        app.grid_columns = 2;
        app.handle_key(key(KeyCode::Tab)).unwrap();
        assert_eq!(app.focus, Focus::Grid);

        app.handle_key(key(KeyCode::Right)).unwrap();
        assert_eq!(app.selected, 1);
        app.handle_key(key(KeyCode::Down)).unwrap();
        assert_eq!(app.selected, 3);
        // Out of range moves are ignored
        app.handle_key(key(KeyCode::Down)).unwrap();
        assert_eq!(app.selected, 3);
        app.handle_key(key(KeyCode::Char('g'))).unwrap();
        assert_eq!(app.selected, 0);
        // Up from the first row goes back to the search field
        app.handle_key(key(KeyCode::Up)).unwrap();
        assert_eq!(app.focus, Focus::Search);
    }

    #[test]
    fn test_q_types_in_search_but_quits_in_grid() {
        let mut app = loaded_app();
        app.handle_key(key(KeyCode::Char('q'))).unwrap();
        assert!(!app.should_quit);
        assert_eq!(app.input, "q");

        app.handle_key(key(KeyCode::Tab)).unwrap();
        app.handle_key(key(KeyCode::Char('q'))).unwrap();
        assert!(app.should_quit);
    }

    #[test]
    fn test_failed_load_shows_error() {
        let mut app = App::new(AppConfig::default(), None);
        app.inventory.begin_loading();
        assert!(app.is_loading());

        app.complete_load(Err(InventoryError::EmptyData));
        assert!(!app.is_loading());
        assert!(app.inventory.surface().error.is_some());
        assert!(app.cards().is_empty());
        assert!(app.status_message.is_none());
    }

    #[test]
    fn test_dropped_fetch_task_ends_loading_with_error() {
        let mut app = App::new(AppConfig::default(), None);
        let (tx, rx) = oneshot::channel::<RowsResult>();
        drop(tx);
        app.inventory.begin_loading();
        app.pending_load = Some(rx);

        app.tick();
        assert!(app.pending_load.is_none());
        assert!(!app.is_loading());
        match app.inventory.state() {
            LoadState::Error(msg) => assert!(msg.contains("without a result")),
            other => panic!("expected error state, got {:?}", other),
        }
        assert!(app.inventory.surface().error.is_some());
    }

    #[tokio::test]
    async fn test_start_load_without_credentials_fails_fast() {
        let mut app = App::new(AppConfig::default(), None);
        app.start_load();

        assert!(matches!(app.inventory.state(), LoadState::Error(_)));
        assert!(app.pending_load.is_none());
    }

    #[test]
    fn test_initial_search_applies_after_load() {
        let mut app = App::new(AppConfig::default(), Some("gad".to_string()));
        app.inventory.begin_loading();
        app.complete_load(rows());

        assert_eq!(app.cards().len(), 1);
        assert_eq!(app.input, "gad");
    }
}
