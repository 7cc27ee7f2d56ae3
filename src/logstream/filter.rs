//! Line filtering
//!
//! A `line` frame passes through the category gate, the "only mine" matcher and
//! the user's content regex, in that order. The first failing stage decides the
//! verdict.

use super::category::LogTypeRegistry;
use regex::{Regex, RegexBuilder};

/// Outcome of running a line through the filter chain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Accepted,
    /// Category was never announced
    UnknownCategory,
    /// Category is hidden by the user
    CategoryDisabled,
    /// Line does not carry our correlation token
    NotMine,
    /// Content regex did not match
    FilteredOut,
}

/// Borrowed view over the session's filter state
pub struct MessageFilterChain<'a> {
    pub registry: &'a LogTypeRegistry,
    pub correlation: Option<&'a Regex>,
    pub content: Option<&'a Regex>,
}

impl MessageFilterChain<'_> {
    pub fn accept(&self, category: &str, text: &str) -> Verdict {
        let Some(entry) = self.registry.get(category) else {
            return Verdict::UnknownCategory;
        };
        if !entry.enabled {
            return Verdict::CategoryDisabled;
        }
        if let Some(mine) = self.correlation {
            if !mine.is_match(text) {
                return Verdict::NotMine;
            }
        }
        if let Some(content) = self.content {
            if !content.is_match(text) {
                return Verdict::FilteredOut;
            }
        }
        Verdict::Accepted
    }
}

// =============================================================================
// Content filter
// =============================================================================

/// Result of submitting new filter text
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterChange {
    /// Same text as before
    Unchanged,
    /// Empty text, filtering switched off
    Cleared,
    /// New pattern compiled and active
    Updated,
}

/// User-supplied regex applied to line text
#[derive(Debug, Clone, Default)]
pub struct ContentFilter {
    text: String,
    regex: Option<Regex>,
}

impl ContentFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compile and install a new pattern
    ///
    /// On a compile error the previous filter stays in place.
    pub fn set(&mut self, text: &str) -> Result<FilterChange, regex::Error> {
        if text == self.text {
            return Ok(FilterChange::Unchanged);
        }
        if text.is_empty() {
            self.text.clear();
            self.regex = None;
            return Ok(FilterChange::Cleared);
        }

        let regex = RegexBuilder::new(text).multi_line(true).build()?;
        self.text = text.to_string();
        self.regex = Some(regex);
        Ok(FilterChange::Updated)
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn regex(&self) -> Option<&Regex> {
        self.regex.as_ref()
    }

    pub fn is_active(&self) -> bool {
        self.regex.is_some()
    }
}
