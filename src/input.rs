//! Input event handling
//!
//! Translates keyboard events into app commands.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// Command to execute on the App
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppCommand {
    Quit,

    // Connection
    ToggleConnection,
    RefreshSites,
    NextSite,
    PrevSite,
    NextEnvironment,
    PrevEnvironment,

    // Filtering
    ToggleOnlyMine,
    EditFilter,
    ToggleDebug,
    /// Toggle the n-th numbered category (0-based)
    ToggleCategory(usize),
    /// Move the category cursor
    NextCategory,
    PrevCategory,
    ToggleSelectedCategory,

    // Scrolling (newest first: "up" moves towards newer lines)
    ScrollUp,
    ScrollDown,
    ScrollPageUp,
    ScrollPageDown,
    ScrollToTop,
    ScrollToBottom,

    // Log actions
    ClearLogs,

    None,
}

/// Edits to the filter prompt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditCommand {
    Insert(char),
    Backspace,
    Submit,
    Cancel,
    None,
}

/// Translate a key press into an AppCommand
pub fn translate_key(key: KeyEvent) -> AppCommand {
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return match key.code {
            KeyCode::Char('c') => AppCommand::Quit,
            _ => AppCommand::None,
        };
    }

    match key.code {
        // Quit
        KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => AppCommand::Quit,

        // Connection
        KeyCode::Char('c') | KeyCode::Char('C') => AppCommand::ToggleConnection,
        KeyCode::Char('r') | KeyCode::Char('R') => AppCommand::RefreshSites,
        KeyCode::Char('s') => AppCommand::NextSite,
        KeyCode::Char('S') => AppCommand::PrevSite,
        KeyCode::Char('e') => AppCommand::NextEnvironment,
        KeyCode::Char('E') => AppCommand::PrevEnvironment,

        // Filtering
        KeyCode::Char('m') | KeyCode::Char('M') => AppCommand::ToggleOnlyMine,
        KeyCode::Char('/') => AppCommand::EditFilter,
        KeyCode::Char('d') | KeyCode::Char('D') => AppCommand::ToggleDebug,
        KeyCode::Char(c @ '1'..='9') => AppCommand::ToggleCategory(c as usize - '1' as usize),
        KeyCode::Char('t') | KeyCode::Tab => AppCommand::NextCategory,
        KeyCode::Char('T') | KeyCode::BackTab => AppCommand::PrevCategory,
        KeyCode::Char(' ') => AppCommand::ToggleSelectedCategory,

        // Scrolling
        KeyCode::Up | KeyCode::Char('k') | KeyCode::Char('K') => AppCommand::ScrollUp,
        KeyCode::Down | KeyCode::Char('j') | KeyCode::Char('J') => AppCommand::ScrollDown,
        KeyCode::PageUp => AppCommand::ScrollPageUp,
        KeyCode::PageDown => AppCommand::ScrollPageDown,
        KeyCode::Home => AppCommand::ScrollToTop,
        KeyCode::End => AppCommand::ScrollToBottom,

        // Log actions
        KeyCode::Char('x') | KeyCode::Char('X') | KeyCode::Backspace => AppCommand::ClearLogs,

        _ => AppCommand::None,
    }
}

/// Translate a key press while the filter prompt is open
pub fn translate_edit_key(key: KeyEvent) -> EditCommand {
    match key.code {
        KeyCode::Enter => EditCommand::Submit,
        KeyCode::Esc => EditCommand::Cancel,
        KeyCode::Backspace => EditCommand::Backspace,
        KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
            EditCommand::Insert(c)
        }
        _ => EditCommand::None,
    }
}
