//! Application-wide constants
//!
//! Centralized constants to avoid duplication and ensure consistency.

// =============================================================================
// Cloud API
// =============================================================================

/// Default REST endpoint of the hosting provider
pub const DEFAULT_API_BASE_URL: &str = "https://cloudapi.acquia.com/v1";

/// Default REST request timeout (seconds)
pub const DEFAULT_API_TIMEOUT_SECS: u64 = 30;

/// HTTP statuses treated as success by the REST client
pub const API_SUCCESS_STATUSES: [u16; 3] = [200, 204, 304];

// =============================================================================
// Correlation
// =============================================================================

/// Header attached to outbound requests while "only mine" tracking is on
pub const REQUEST_ID_HEADER: &str = "X-Request-ID";

/// Prefix of every request identifier generated by this tool
pub const REQUEST_ID_PREFIX: &str = "ac-ls-ce-";

// =============================================================================
// Stream
// =============================================================================

/// Default number of messages retained for display
pub const DEFAULT_MAX_ENTRIES: usize = 1000;

/// Default buffer flush cadence (milliseconds, ~60 FPS)
pub const DEFAULT_FLUSH_INTERVAL_MS: u64 = 16;

/// Server prefix marking the aggregate log-stream endpoint in `connected` frames
pub const LOGSTREAM_SERVER_PREFIX: &str = "logstream-";

/// Channel capacity for async message passing
pub const CHANNEL_CAPACITY: usize = 256;

// =============================================================================
// UI
// =============================================================================

/// Frame duration for TUI loop (milliseconds)
pub const FRAME_DURATION_MS: u64 = 16;

/// Number of lines to scroll per page (PageUp/PageDown)
pub const PAGE_SCROLL_LINES: usize = 10;

/// Status message display timeout (seconds)
pub const STATUS_MESSAGE_TIMEOUT_SECS: u64 = 2;

/// Width threshold for wide/narrow layout switch
pub const WIDE_THRESHOLD: u16 = 100;

/// Width of category sidebar in wide mode
pub const SIDEBAR_WIDTH: u16 = 26;

// =============================================================================
// Environments
// =============================================================================

/// Environments listed first, in this order, when sorting environment names
pub const ENVIRONMENT_ORDER: [&str; 5] = ["dev", "test", "prod", "live01", "ra"];
