//! Log stream core
//!
//! Pure data structures shared by the session and the display:
//! - `category` - known log categories and their enabled flags
//! - `correlation` - "only mine" token and request ids
//! - `filter` - per-line filter chain and content regex
//! - `message` - displayable records
//! - `buffer` - pending batch + bounded newest-first store
//! - `protocol` - server frame parsing, client frame building

pub mod buffer;
pub mod category;
pub mod correlation;
pub mod filter;
pub mod message;
pub mod protocol;

pub use buffer::BoundedMessageBuffer;
pub use category::{LogCategory, LogTypeRegistry};
pub use correlation::{CorrelationTagger, RequestTagging};
pub use filter::{ContentFilter, FilterChange, MessageFilterChain, Verdict};
pub use message::{DebugQualifier, LogMessage, Origin, Severity};

/// Initialize internal tracing for developer diagnostics
///
/// Output goes to stderr so the TUI and the headless stream on stdout stay
/// clean. Call early in main() before any logging occurs.
pub fn init_tracing(verbose: bool) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let level = if verbose { "debug" } else { "warn" };

    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_file(false)
                .compact(),
        )
        .with(tracing_subscriber::EnvFilter::new(level))
        .try_init();
}
