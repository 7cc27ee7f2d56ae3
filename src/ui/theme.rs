//! UI theme constants - Minimalist dark theme

use crate::logstream::{LogMessage, Origin, Severity};
use crate::session::SessionState;
use ratatui::style::{Color, Modifier, Style};

// Base colors - muted grays
pub const COLOR_DIM: Color = Color::Rgb(80, 80, 80); // Very dim gray for borders, secondary
pub const COLOR_MUTED: Color = Color::Rgb(120, 120, 120); // Muted gray for labels
pub const COLOR_TEXT: Color = Color::Rgb(180, 180, 180); // Normal text
pub const COLOR_BRIGHT: Color = Color::Rgb(220, 220, 220); // Bright text for emphasis

// Accent colors - used sparingly
pub const COLOR_ACCENT: Color = Color::Rgb(100, 180, 220); // Cyan-ish for keys
pub const COLOR_SUCCESS: Color = Color::Rgb(100, 180, 100);
pub const COLOR_WARNING: Color = Color::Yellow;
pub const COLOR_ERROR: Color = Color::Red;

// Log colors
pub const COLOR_LOG_DEBUG: Color = COLOR_MUTED;

// Styles
pub const STYLE_BORDER: Style = Style::new().fg(COLOR_DIM);
pub const STYLE_DIM: Style = Style::new().fg(COLOR_DIM);
pub const STYLE_LABEL: Style = Style::new().fg(COLOR_MUTED);
pub const STYLE_MUTED: Style = Style::new().fg(COLOR_MUTED);
pub const STYLE_TEXT: Style = Style::new().fg(COLOR_TEXT);
pub const STYLE_BRIGHT: Style = Style::new().fg(COLOR_BRIGHT);
pub const STYLE_KEY: Style = Style::new().fg(COLOR_ACCENT);
pub const STYLE_ACTION: Style = Style::new().fg(COLOR_MUTED);
pub const STYLE_TITLE: Style = Style::new().fg(COLOR_BRIGHT).add_modifier(Modifier::BOLD);

// Status symbols
pub const SYMBOL_OPEN: &str = "●";
pub const SYMBOL_IDLE: &str = "○";
pub const SYMBOL_CONNECTING: &str = "◐";
pub const SYMBOL_ON: &str = "■";
pub const SYMBOL_OFF: &str = "□";
pub const SYMBOL_IN: &str = "←";
pub const SYMBOL_OUT: &str = "→";

/// Symbol and color for a session state
pub fn session_state_style(state: SessionState) -> (&'static str, Color) {
    match state {
        SessionState::Open => (SYMBOL_OPEN, COLOR_SUCCESS),
        SessionState::Connecting | SessionState::Closing => (SYMBOL_CONNECTING, COLOR_WARNING),
        SessionState::Idle | SessionState::Closed => (SYMBOL_IDLE, COLOR_MUTED),
    }
}

/// Text color for a message: severity first, then HTTP class
pub fn message_color(msg: &LogMessage) -> Color {
    if msg.severity == Severity::Error {
        return COLOR_ERROR;
    }
    match msg.http_status_class {
        Some(500..) => return COLOR_ERROR,
        Some(400..=499) => return COLOR_WARNING,
        _ => {}
    }
    match msg.origin {
        Origin::Debug(_) => COLOR_LOG_DEBUG,
        Origin::Info => COLOR_BRIGHT,
        _ => COLOR_TEXT,
    }
}

/// Color of the category column, stable per category key
pub fn category_color(key: &str) -> Color {
    const PALETTE: [Color; 6] = [
        Color::Rgb(100, 180, 220),
        Color::Rgb(180, 140, 220),
        Color::Rgb(220, 170, 100),
        Color::Rgb(100, 190, 160),
        Color::Rgb(210, 120, 140),
        Color::Rgb(160, 180, 100),
    ];
    let hash = key
        .bytes()
        .fold(0usize, |acc, b| acc.wrapping_mul(31).wrapping_add(b as usize));
    PALETTE[hash % PALETTE.len()]
}
