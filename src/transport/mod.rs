//! Transport abstraction for the log stream connection
//!
//! Separates I/O concerns from protocol logic:
//! - **Transport**: how text frames flow (WebSocket today)
//! - **Session**: what the frames mean (handled separately)
//!
//! A transport runs on its own tokio task and reports everything that happens
//! to it as ordered `TransportEvent`s. The session never touches the socket.

pub mod websocket;

pub use websocket::{WebSocketDialer, WebSocketTransport};

use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::error::Result;

/// Something that happened on the connection, in the order it happened
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// Handshake completed, frames may be sent
    Opened,
    /// A text frame from the server
    Frame(String),
    /// Socket-level error; a `Closed` event may or may not follow
    Error(String),
    /// Connection is gone, no further events
    Closed,
}

/// Channels for bidirectional communication with a transport
///
/// The transport owns the underlying socket and communicates via these
/// channels. When the transport stops it emits `Closed` and drops its ends.
pub struct TransportChannels {
    /// Connection events, in arrival order
    pub rx: mpsc::Receiver<TransportEvent>,

    /// Text frames to write to the socket
    pub tx: mpsc::Sender<String>,
}

/// Trait for spawnable transports
///
/// # Lifecycle
///
/// 1. Create transport with its target
/// 2. Call `spawn()` to start I/O in background
/// 3. Use returned channels for communication
/// 4. Transport runs until:
///    - `shutdown` flag is set, OR
///    - the peer closes or a fatal error occurs
/// 5. Transport emits `Closed` and closes channels when stopping
pub trait Transport: Send + 'static {
    /// Spawn the transport in background
    ///
    /// Connection failures are reported as events, not as errors here.
    fn spawn(self, shutdown: Arc<AtomicBool>) -> Result<TransportChannels>;
}

/// Opens a transport to a URL handed out by the connection descriptor
pub trait Dialer: Send {
    fn dial(&self, url: &str, shutdown: Arc<AtomicBool>) -> Result<TransportChannels>;
}
