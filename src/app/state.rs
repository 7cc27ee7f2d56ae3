//! Application state types
//!
//! Contains the state snapshot used for rendering.

use crate::session::{ConnectAction, SessionState};

/// What keyboard input currently edits
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    /// Filter prompt open with the text typed so far
    EditFilter(String),
}

/// Application state snapshot for rendering (zero-copy)
///
/// This is a borrowed view of the application state, designed for
/// efficient UI rendering without cloning data.
#[derive(Clone)]
pub struct AppState<'a> {
    // Selection
    pub site: &'a str,
    pub environment: &'a str,
    pub site_count: usize,
    pub environment_count: usize,

    // Connection
    pub session_state: SessionState,
    pub connect_action: ConnectAction,
    pub has_credentials: bool,

    // Filtering
    pub only_mine: bool,
    /// Header to attach to the user's own requests while `only_mine` is on
    pub request_header: Option<String>,
    pub filter: &'a str,
    pub show_debug: bool,

    // Buffer
    pub retained: usize,
    pub max_retained: usize,

    // UI state
    pub editing: Option<&'a str>,
    pub status_message: Option<&'a str>,
    pub show_utc: bool,
}
