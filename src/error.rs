//! Centralized error types for the log streamer
//!
//! All fallible operations outside the session core return `StreamError`.
//! Use `Result<T>` as shorthand for `std::result::Result<T, StreamError>`.

use std::fmt;
use std::path::PathBuf;

/// All log streamer errors
#[derive(Debug)]
pub enum StreamError {
    // === Configuration ===
    /// Failed to read or write the config file
    ConfigRead {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Invalid config value
    ConfigValidation { field: &'static str, reason: String },

    // === Settings ===
    /// Failed to read or write persisted settings
    Settings {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Persisted settings could not be (de)serialized
    SettingsFormat {
        path: PathBuf,
        source: serde_json::Error,
    },

    // === Cloud API ===
    /// HTTP client could not be built
    HttpClient { source: reqwest::Error },
    /// Request never produced a response (DNS, TLS, connect, timeout)
    HttpRequest {
        path: String,
        source: reqwest::Error,
    },
    /// Credentials are missing from the config
    MissingCredentials,

    // === Transport ===
    /// WebSocket handshake with the log server failed
    WebSocketConnect {
        url: String,
        source: Box<tokio_tungstenite::tungstenite::Error>,
    },

    // === Runtime ===
    /// Terminal or runtime setup failed
    Runtime { source: std::io::Error },
}

impl std::error::Error for StreamError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::ConfigRead { source, .. }
            | Self::Settings { source, .. }
            | Self::Runtime { source } => Some(source),
            Self::SettingsFormat { source, .. } => Some(source),
            Self::HttpClient { source } | Self::HttpRequest { source, .. } => Some(source),
            Self::WebSocketConnect { source, .. } => Some(source.as_ref()),
            Self::ConfigValidation { .. } | Self::MissingCredentials => None,
        }
    }
}

impl fmt::Display for StreamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConfigRead { path, .. } => write!(f, "Cannot access config: {}", path.display()),
            Self::ConfigValidation { field, reason } => {
                write!(f, "Invalid {}: {}", field, reason)
            }
            Self::Settings { path, .. } => {
                write!(f, "Cannot access settings: {}", path.display())
            }
            Self::SettingsFormat { path, source } => {
                write!(f, "Malformed settings {}: {}", path.display(), source)
            }
            Self::HttpClient { source } => write!(f, "Cannot build HTTP client: {}", source),
            Self::HttpRequest { path, source } => {
                write!(f, "Request for {} failed: {}", path, source)
            }
            Self::MissingCredentials => write!(f, "API username and password are not configured"),
            Self::WebSocketConnect { url, source } => {
                write!(f, "Cannot connect to {}: {}", url, source)
            }
            Self::Runtime { .. } => write!(f, "Failed to set up terminal"),
        }
    }
}

/// Alias for Result with StreamError
pub type Result<T> = std::result::Result<T, StreamError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_validation_display() {
        let err = StreamError::ConfigValidation {
            field: "max_entries",
            reason: "must be greater than zero".into(),
        };
        assert_eq!(
            err.to_string(),
            "Invalid max_entries: must be greater than zero"
        );
        assert!(err.source().is_none());
    }

    #[test]
    fn test_io_source_is_exposed() {
        let err = StreamError::ConfigRead {
            path: PathBuf::from("config.toml"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        };
        assert!(err.source().is_some());
        assert!(err.to_string().contains("config.toml"));
    }
}
