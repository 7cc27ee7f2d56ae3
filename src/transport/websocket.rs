//! WebSocket client transport
//!
//! Connects to the log server URL from the connection descriptor and relays
//! text frames in both directions.
//!
//! ```text
//! logstream ──wss──► log server ──► upstream web/db servers
//! ```

use super::{Dialer, Transport, TransportChannels, TransportEvent};
use crate::constants::CHANNEL_CAPACITY;
use crate::error::StreamError;
use futures_util::{SinkExt, StreamExt};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, info};

/// Poll interval for the shutdown flag
const SHUTDOWN_POLL: Duration = Duration::from_millis(100);

/// WebSocket client for one log stream connection
pub struct WebSocketTransport {
    url: String,
}

impl WebSocketTransport {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

impl Transport for WebSocketTransport {
    fn spawn(self, shutdown: Arc<AtomicBool>) -> crate::error::Result<TransportChannels> {
        let (event_tx, event_rx) = mpsc::channel::<TransportEvent>(CHANNEL_CAPACITY);
        let (out_tx, out_rx) = mpsc::channel::<String>(CHANNEL_CAPACITY);

        tokio::spawn(async move {
            run_client(self.url, event_tx, out_rx, shutdown).await;
        });

        Ok(TransportChannels {
            rx: event_rx,
            tx: out_tx,
        })
    }
}

/// Production dialer
#[derive(Debug, Default, Clone, Copy)]
pub struct WebSocketDialer;

impl Dialer for WebSocketDialer {
    fn dial(
        &self,
        url: &str,
        shutdown: Arc<AtomicBool>,
    ) -> crate::error::Result<TransportChannels> {
        WebSocketTransport::new(url).spawn(shutdown)
    }
}

/// Connect, relay frames, and report the outcome as events
async fn run_client(
    url: String,
    events: mpsc::Sender<TransportEvent>,
    mut out_rx: mpsc::Receiver<String>,
    shutdown: Arc<AtomicBool>,
) {
    let ws = match connect_async(url.as_str()).await {
        Ok((ws, _response)) => ws,
        Err(e) => {
            let err = StreamError::WebSocketConnect {
                url,
                source: Box::new(e),
            };
            debug!("{}", err);
            let _ = events.send(TransportEvent::Error(err.to_string())).await;
            let _ = events.send(TransportEvent::Closed).await;
            return;
        }
    };

    if shutdown.load(Ordering::Relaxed) {
        return;
    }
    info!("Log stream connected: {}", url);
    if events.send(TransportEvent::Opened).await.is_err() {
        return;
    }

    let (mut ws_sink, mut ws_stream) = ws.split();

    // RX task: WebSocket → events
    let rx_events = events.clone();
    let shutdown_rx = shutdown.clone();
    let rx_handle = tokio::spawn(async move {
        while !shutdown_rx.load(Ordering::Relaxed) {
            match tokio::time::timeout(SHUTDOWN_POLL, ws_stream.next()).await {
                Ok(Some(Ok(msg))) => {
                    let text = match msg {
                        Message::Text(text) => text.as_str().to_owned(),
                        Message::Binary(data) => String::from_utf8_lossy(&data).into_owned(),
                        Message::Close(_) => break,
                        _ => continue, // Ping/pong are handled by tungstenite
                    };
                    if rx_events.send(TransportEvent::Frame(text)).await.is_err() {
                        break; // Session went away
                    }
                }
                Ok(Some(Err(e))) => {
                    let _ = rx_events.send(TransportEvent::Error(e.to_string())).await;
                    break;
                }
                Ok(None) => break, // Connection closed
                Err(_) => {}       // Timeout, check shutdown flag
            }
        }
    });

    // TX task: session → WebSocket
    let tx_events = events.clone();
    let shutdown_tx = shutdown.clone();
    let tx_handle = tokio::spawn(async move {
        while !shutdown_tx.load(Ordering::Relaxed) {
            match tokio::time::timeout(SHUTDOWN_POLL, out_rx.recv()).await {
                Ok(Some(frame)) => {
                    if let Err(e) = ws_sink.send(Message::Text(frame.into())).await {
                        let _ = tx_events.send(TransportEvent::Error(e.to_string())).await;
                        break;
                    }
                }
                Ok(None) => break, // Session dropped its sender
                Err(_) => {}       // Timeout
            }
        }
        // Try to close gracefully
        let _ = ws_sink.close().await;
    });

    // Wait for either task to finish
    tokio::select! {
        _ = rx_handle => {}
        _ = tx_handle => {}
    }

    info!("Log stream disconnected: {}", url);
    let _ = events.send(TransportEvent::Closed).await;
}
