//! Application state and orchestration
//!
//! Single source of truth for the TUI. Delegates the stream lifecycle to
//! `SessionDriver` and keeps only view state (scroll, prompt, status line).

mod commands;
pub mod state;

pub use state::{AppState, InputMode};

use crate::cloud::{CloudApi, HttpCloudApi};
use crate::constants::STATUS_MESSAGE_TIMEOUT_SECS;
use crate::input::{self, EditCommand};
use crate::logstream::{BoundedMessageBuffer, LogTypeRegistry};
use crate::session::SessionDriver;
use crate::transport::{Dialer, WebSocketDialer};
use crossterm::event::KeyEvent;
use std::time::Instant;

/// Driver wired to the real API and WebSocket transport
pub type LiveDriver = SessionDriver<HttpCloudApi, WebSocketDialer>;

/// Main application
pub struct App<A: CloudApi = HttpCloudApi, D: Dialer = WebSocketDialer> {
    pub(super) driver: SessionDriver<A, D>,

    // View state
    /// Lines scrolled away from the newest message (0 = following)
    pub(super) scroll: usize,
    pub(super) input_mode: InputMode,
    pub(super) show_utc: bool,
    /// Index into the numbered categories for Space to toggle
    pub(super) category_cursor: usize,

    // UI state
    status_message: Option<(String, Instant)>,
    should_quit: bool,
}

impl<A: CloudApi, D: Dialer> App<A, D> {
    pub fn new(mut driver: SessionDriver<A, D>, show_utc: bool) -> Self {
        driver.start();
        Self {
            driver,
            scroll: 0,
            input_mode: InputMode::Normal,
            show_utc,
            category_cursor: 0,
            status_message: None,
            should_quit: false,
        }
    }

    // =========================================================================
    // State access
    // =========================================================================

    pub fn state(&self) -> AppState<'_> {
        let session = self.driver.session();
        AppState {
            site: session.site(),
            environment: session.environment(),
            site_count: self.driver.sites().len(),
            environment_count: self.driver.environments().len(),
            session_state: session.state(),
            connect_action: session.connect_action(),
            has_credentials: self.driver.has_credentials(),
            only_mine: session.only_mine(),
            request_header: session.request_header(),
            filter: session.filter_text(),
            show_debug: session.show_debug(),
            retained: session.buffer().len(),
            max_retained: session.buffer().max_retained(),
            editing: match &self.input_mode {
                InputMode::EditFilter(text) => Some(text.as_str()),
                InputMode::Normal => None,
            },
            status_message: self.status_text(),
            show_utc: self.show_utc,
        }
    }

    pub fn messages(&self) -> &BoundedMessageBuffer {
        self.driver.session().buffer()
    }

    pub fn registry(&self) -> &LogTypeRegistry {
        self.driver.session().registry()
    }

    pub fn scroll_position(&self) -> usize {
        self.scroll
    }

    pub fn category_cursor(&self) -> usize {
        self.category_cursor
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    fn status_text(&self) -> Option<&str> {
        self.status_message
            .as_ref()
            .filter(|(_, at)| at.elapsed().as_secs() < STATUS_MESSAGE_TIMEOUT_SECS)
            .map(|(msg, _)| msg.as_str())
    }

    pub(super) fn set_status(&mut self, msg: impl Into<String>) {
        self.status_message = Some((msg.into(), Instant::now()));
    }

    // =========================================================================
    // Event loop hooks
    // =========================================================================

    /// Drain background work and flush new messages
    pub fn poll(&mut self) {
        let batch = self.driver.poll();
        // Keep the viewport steady while the user is scrolled back
        if self.scroll > 0 && !batch.is_empty() {
            self.scroll = (self.scroll + batch.len()).min(self.max_scroll());
        }
    }

    /// Handle a key press. Returns true if the app should quit.
    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        if let InputMode::EditFilter(text) = &mut self.input_mode {
            match input::translate_edit_key(key) {
                EditCommand::Insert(c) => text.push(c),
                EditCommand::Backspace => {
                    text.pop();
                }
                EditCommand::Submit => {
                    let text = std::mem::take(text);
                    self.input_mode = InputMode::Normal;
                    self.submit_filter(&text);
                }
                EditCommand::Cancel => self.input_mode = InputMode::Normal,
                EditCommand::None => {}
            }
            return false;
        }

        let cmd = input::translate_key(key);
        self.execute_command(cmd)
    }

    pub fn handle_scroll(&mut self, up: bool) {
        if up {
            self.scroll_up();
        } else {
            self.scroll_down();
        }
    }

    /// Stop background work before the terminal is restored
    pub fn quit(&mut self) {
        self.driver.shutdown();
        self.should_quit = true;
    }

    // =========================================================================
    // Operations
    // =========================================================================

    fn submit_filter(&mut self, text: &str) {
        if self.driver.set_filter(text) {
            if text.is_empty() {
                self.set_status("Filter cleared");
            } else {
                self.set_status(format!("Filter: /{}/", text));
            }
        } else {
            self.set_status("Invalid regex, previous filter kept");
        }
    }

    pub(super) fn max_scroll(&self) -> usize {
        self.messages().len().saturating_sub(1)
    }

    pub(super) fn scroll_up(&mut self) {
        self.scroll = self.scroll.saturating_sub(1);
    }

    pub(super) fn scroll_down(&mut self) {
        self.scroll = (self.scroll + 1).min(self.max_scroll());
    }
}
