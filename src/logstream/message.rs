//! Displayable log records
//!
//! A `LogMessage` is either a line streamed from the log servers or a local
//! notice produced by the session itself. Records are immutable once built.

use super::category::{DEBUG, INFO};
use chrono::{DateTime, NaiveDateTime, Utc};

/// Where a local debug message comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebugQualifier {
    /// Produced locally (connection closed, storage trouble)
    Here,
    /// Describes a frame or request we sent
    Sent,
    /// Describes a frame or response we received
    Received,
    /// Failure inside the tool itself
    ExtensionError,
}

impl DebugQualifier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Here => "here",
            Self::Sent => "sent",
            Self::Received => "received",
            Self::ExtensionError => "extension-error",
        }
    }
}

/// Provenance of a message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    /// A `line` frame from a log server
    Log,
    /// A notice about a request the client sent
    Sent,
    /// A notice about something the server sent back
    Received,
    /// A local informational notice
    Info,
    /// Protocol chatter, hidden unless the debug category is enabled
    Debug(DebugQualifier),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Debug,
    Info,
    Error,
}

/// An immutable log record ready for display
#[derive(Debug, Clone, PartialEq)]
pub struct LogMessage {
    /// Parsed time, `None` when the server time could not be parsed
    pub timestamp: Option<DateTime<Utc>>,
    /// Formatted time, or the raw server string when parsing failed
    pub display_time: String,
    pub category: String,
    pub text: String,
    pub http_status_class: Option<u16>,
    pub origin: Origin,
    pub severity: Severity,
}

impl LogMessage {
    /// Build a record for an accepted `line` frame
    pub fn line(
        category: &str,
        text: &str,
        disp_time: Option<&str>,
        http_status: Option<u16>,
    ) -> Self {
        let (timestamp, display_time) = match disp_time {
            Some(raw) if !raw.trim().is_empty() => match parse_display_time(raw) {
                Some(ts) => (Some(ts), format_time(&ts)),
                None => (None, raw.to_string()),
            },
            _ => {
                let now = Utc::now();
                (Some(now), format_time(&now))
            }
        };

        Self {
            timestamp,
            display_time,
            category: category.to_string(),
            text: text.to_string(),
            http_status_class: http_status.map(http_status_class),
            origin: Origin::Log,
            severity: Severity::Info,
        }
    }

    /// Build a local notice stamped with the current time
    ///
    /// Debug-origin messages land in the `debug` category, everything else in
    /// `info`. The severity is kept as given.
    pub fn local(origin: Origin, severity: Severity, text: impl Into<String>) -> Self {
        let now = Utc::now();
        let category = match origin {
            Origin::Debug(_) => DEBUG,
            _ => INFO,
        };
        Self {
            timestamp: Some(now),
            display_time: format_time(&now),
            category: category.to_string(),
            text: text.into(),
            http_status_class: None,
            origin,
            severity,
        }
    }

    pub fn info(text: impl Into<String>) -> Self {
        Self::local(Origin::Info, Severity::Info, text)
    }

    pub fn error(origin: Origin, text: impl Into<String>) -> Self {
        Self::local(origin, Severity::Error, text)
    }

    pub fn debug(qualifier: DebugQualifier, text: impl Into<String>) -> Self {
        Self::local(Origin::Debug(qualifier), Severity::Debug, text)
    }

    /// Display token for the HTTP status class, e.g. `http-status-500`
    pub fn http_status_token(&self) -> Option<String> {
        self.http_status_class
            .map(|class| format!("http-status-{}", class))
    }
}

/// Bucket an HTTP status: anything below 400 is `200`, the rest round down
/// to the hundred
pub fn http_status_class(status: u16) -> u16 {
    if status < 400 {
        200
    } else {
        100 * (status / 100)
    }
}

/// Parse a server display time
///
/// Servers stream UTC without an explicit zone, so zone-less values are taken
/// as UTC. Explicit offsets are honoured.
pub fn parse_display_time(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();

    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%d %H:%M:%S%.f %z", "%Y-%m-%d %H:%M:%S%.f%:z"] {
        if let Ok(ts) = DateTime::parse_from_str(raw, fmt) {
            return Some(ts.with_timezone(&Utc));
        }
    }
    if let Ok(ts) = DateTime::parse_from_rfc2822(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    for fmt in [
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%d/%b/%Y:%H:%M:%S",
    ] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(naive.and_utc());
        }
    }
    None
}

fn format_time(ts: &DateTime<Utc>) -> String {
    ts.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}
