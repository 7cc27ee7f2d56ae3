//! Log stream session
//!
//! `StreamSession` is the synchronous state machine for one streaming
//! connection. It owns the category registry, the correlation tagger, the
//! content filter and the message buffer. All I/O happens elsewhere: the
//! `driver` feeds it descriptor results and transport events and forwards the
//! outbound frames it queues on the transport link.
//!
//! ```text
//! Idle/Closed ──begin_connect──► Connecting ──Opened──► Open
//!      ▲                              │                  │
//!      └──── descriptor failure ──────┘     disconnect / Closed
//!                                                        ▼
//!                                              Closing ─► Closed
//! ```

pub mod driver;

pub use driver::{DriverOptions, SessionDriver};

use crate::cloud::{ApiFailure, ConnectionDescriptor};
use crate::constants::LOGSTREAM_SERVER_PREFIX;
use crate::logstream::category::DEBUG;
use crate::logstream::protocol::{self, Ack, ServerFrame};
use crate::logstream::{
    BoundedMessageBuffer, ContentFilter, CorrelationTagger, DebugQualifier, FilterChange,
    LogMessage, LogTypeRegistry, MessageFilterChain, Origin, RequestTagging, Severity, Verdict,
};
use crate::settings::Settings;
use crate::transport::TransportEvent;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tracing::{debug, warn};

// =============================================================================
// State
// =============================================================================

/// Connection state of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Connecting,
    Open,
    Closing,
    Closed,
}

impl SessionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "Idle",
            Self::Connecting => "Connecting",
            Self::Open => "Open",
            Self::Closing => "Closing",
            Self::Closed => "Closed",
        }
    }

    /// Whether a transport is (or is about to be) attached
    pub fn is_live(&self) -> bool {
        matches!(self, Self::Connecting | Self::Open)
    }
}

/// Label of the connect/disconnect affordance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectAction {
    Connect,
    Disconnect,
    Reconnect,
}

impl ConnectAction {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Connect => "Connect",
            Self::Disconnect => "Disconnect",
            Self::Reconnect => "Reconnect",
        }
    }
}

/// Handed out by `begin_connect`; identifies the connection attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectTicket {
    pub generation: u64,
    pub site: String,
    pub environment: String,
}

// =============================================================================
// Session
// =============================================================================

pub struct StreamSession {
    state: SessionState,
    /// Bumped for every connection attempt and every teardown
    generation: u64,
    site: String,
    environment: String,
    registry: LogTypeRegistry,
    correlation: CorrelationTagger,
    content: ContentFilter,
    buffer: BoundedMessageBuffer,
    /// Outbound frames for the current transport
    link: Option<mpsc::Sender<String>>,
    pending_auth: Option<String>,
    idle_timeout: Option<Duration>,
    last_frame: Option<Instant>,
    idle_reported: bool,
}

impl StreamSession {
    pub fn new(max_entries: usize, idle_timeout: Option<Duration>) -> Self {
        Self {
            state: SessionState::Idle,
            generation: 0,
            site: String::new(),
            environment: String::new(),
            registry: LogTypeRegistry::new(),
            correlation: CorrelationTagger::new(),
            content: ContentFilter::new(),
            buffer: BoundedMessageBuffer::new(max_entries),
            link: None,
            pending_auth: None,
            idle_timeout,
            last_frame: None,
            idle_reported: false,
        }
    }

    // === Accessors ===

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn site(&self) -> &str {
        &self.site
    }

    pub fn environment(&self) -> &str {
        &self.environment
    }

    pub fn registry(&self) -> &LogTypeRegistry {
        &self.registry
    }

    pub fn buffer(&self) -> &BoundedMessageBuffer {
        &self.buffer
    }

    pub fn filter_text(&self) -> &str {
        self.content.text()
    }

    pub fn only_mine(&self) -> bool {
        self.correlation.is_active()
    }

    /// Shared handle the HTTP client uses to tag its requests
    /// Header line to attach to the user's own traffic while "only mine" is on
    pub fn request_header(&self) -> Option<String> {
        self.correlation.request_header()
    }

    pub fn request_tagging(&self) -> RequestTagging {
        self.correlation.handle()
    }

    pub fn connect_action(&self) -> ConnectAction {
        match self.state {
            SessionState::Idle => ConnectAction::Connect,
            SessionState::Connecting | SessionState::Open => ConnectAction::Disconnect,
            SessionState::Closing | SessionState::Closed => ConnectAction::Reconnect,
        }
    }

    // === Local messages ===

    /// Queue a local message, subject to the category gate
    pub fn report(&mut self, msg: LogMessage) {
        debug!("[{}] {}", msg.category, msg.text);
        if self.registry.is_enabled(&msg.category) {
            self.buffer.append(msg);
        }
    }

    fn report_debug(&mut self, qualifier: DebugQualifier, text: impl Into<String>) {
        self.report(LogMessage::debug(qualifier, text));
    }

    // === Connection lifecycle ===

    /// Start a connection attempt for `site`/`environment`
    ///
    /// Returns `None` (and reports why) if either is empty. Any current
    /// transport is torn down first.
    pub fn begin_connect(&mut self, site: &str, environment: &str) -> Option<ConnectTicket> {
        if site.trim().is_empty() || environment.trim().is_empty() {
            self.report(LogMessage::local(
                Origin::Info,
                Severity::Info,
                "Select a site and an environment before connecting",
            ));
            return None;
        }

        if self.state.is_live() {
            self.release_transport();
        }
        self.generation += 1;
        self.site = site.to_string();
        self.environment = environment.to_string();
        self.state = SessionState::Connecting;
        self.report(LogMessage::info(format!(
            "Connecting to {}.{}",
            self.site, self.environment
        )));

        Some(ConnectTicket {
            generation: self.generation,
            site: self.site.clone(),
            environment: self.environment.clone(),
        })
    }

    fn is_current(&self, generation: u64) -> bool {
        if generation != self.generation {
            debug!(
                "Ignoring event from connection {} (current {})",
                generation, self.generation
            );
            return false;
        }
        true
    }

    /// The connection descriptor could not be fetched
    pub fn descriptor_failed(&mut self, generation: u64, failure: &ApiFailure) {
        if !self.is_current(generation) || self.state != SessionState::Connecting {
            return;
        }
        self.state = SessionState::Idle;
        self.report(LogMessage::error(
            failure.origin(),
            format!(
                "Could not get connection details for {}.{}: {}",
                self.site, self.environment, failure
            ),
        ));
    }

    /// The connection descriptor arrived; returns the URL to dial
    pub fn descriptor_ready(
        &mut self,
        generation: u64,
        descriptor: ConnectionDescriptor,
    ) -> Option<String> {
        if !self.is_current(generation) || self.state != SessionState::Connecting {
            return None;
        }
        self.pending_auth = Some(descriptor.auth_message);
        Some(descriptor.url)
    }

    /// Attach the outbound side of the dialed transport
    pub fn attach_transport(&mut self, generation: u64, tx: mpsc::Sender<String>) {
        if self.is_current(generation) && self.state == SessionState::Connecting {
            self.link = Some(tx);
        }
    }

    /// Feed one event from the transport of connection `generation`
    pub fn handle_transport(&mut self, generation: u64, event: TransportEvent) {
        if !self.is_current(generation) {
            return;
        }
        match event {
            TransportEvent::Opened => self.on_open(),
            TransportEvent::Frame(raw) => {
                if self.state == SessionState::Open {
                    self.last_frame = Some(Instant::now());
                    self.idle_reported = false;
                    self.handle_frame(&raw);
                }
            }
            TransportEvent::Error(reason) => {
                if self.state.is_live() {
                    self.report(LogMessage::error(
                        Origin::Info,
                        format!("WebSocket error: {}", reason),
                    ));
                }
            }
            TransportEvent::Closed => {
                if self.state.is_live() {
                    self.close();
                }
            }
        }
    }

    fn on_open(&mut self) {
        if self.state != SessionState::Connecting {
            return;
        }
        self.state = SessionState::Open;
        self.last_frame = Some(Instant::now());
        self.idle_reported = false;
        if let Some(auth) = self.pending_auth.take() {
            self.send(auth);
        }
    }

    /// User-initiated disconnect
    pub fn disconnect(&mut self) {
        if self.state.is_live() {
            self.close();
        }
    }

    fn close(&mut self) {
        self.state = SessionState::Closing;
        self.release_transport();
        self.state = SessionState::Closed;
        self.report_debug(DebugQualifier::Here, "Connection closed");
    }

    fn release_transport(&mut self) {
        self.link = None;
        self.pending_auth = None;
        self.last_frame = None;
        // Late events from the released transport no longer match
        self.generation += 1;
    }

    fn send(&mut self, frame: String) {
        let Some(tx) = &self.link else {
            warn!("No transport attached, dropping frame");
            return;
        };
        if let Err(e) = tx.try_send(frame) {
            self.report(LogMessage::error(
                Origin::Info,
                format!("Failed to send frame: {}", e),
            ));
        }
    }

    // === Frame dispatch ===

    fn handle_frame(&mut self, raw: &str) {
        let frame = match protocol::parse_frame(raw) {
            Ok(frame) => frame,
            Err(e) => {
                self.report_debug(
                    DebugQualifier::ExtensionError,
                    format!("Failed to handle log event ({}): {}", e, raw),
                );
                return;
            }
        };

        match frame {
            ServerFrame::Connected { server } => {
                if server.starts_with(LOGSTREAM_SERVER_PREFIX) {
                    self.report(LogMessage::info("Connected"));
                } else {
                    self.report_debug(
                        DebugQualifier::Received,
                        format!("Connected to server {}", server),
                    );
                }
            }
            ServerFrame::Error => {
                self.report(LogMessage::error(
                    Origin::Received,
                    format!("Server-side trouble: {}", raw),
                ));
            }
            ServerFrame::Success { server, ack } => {
                let text = match ack {
                    Ack::Keepalive => "keepalive".to_string(),
                    Ack::Enable { log_type } => {
                        let name = self
                            .registry
                            .get(&log_type)
                            .map(|c| c.display_name.clone())
                            .unwrap_or(log_type);
                        format!("Enabled {} on {}", name, server)
                    }
                    Ack::Other => raw.to_string(),
                };
                self.report_debug(DebugQualifier::Received, text);
            }
            ServerFrame::Available {
                log_type,
                display_type,
                server,
            } => {
                self.report_debug(
                    DebugQualifier::Received,
                    format!("{} available on {}", display_type, server),
                );
                self.registry.upsert(&log_type, &display_type, &server);
                if self.registry.is_enabled(&log_type) {
                    self.send(protocol::enable_frame(&log_type, &server));
                    self.report_debug(
                        DebugQualifier::Sent,
                        format!("Requesting {} on {}", display_type, server),
                    );
                }
            }
            ServerFrame::Line(line) => {
                let mine = self.correlation.matcher();
                let verdict = MessageFilterChain {
                    registry: &self.registry,
                    correlation: mine.as_ref(),
                    content: self.content.regex(),
                }
                .accept(&line.log_type, &line.text);

                match verdict {
                    Verdict::Accepted => self.buffer.append(LogMessage::line(
                        &line.log_type,
                        &line.text,
                        line.disp_time.as_deref(),
                        line.http_status,
                    )),
                    Verdict::UnknownCategory => self.report_debug(
                        DebugQualifier::Received,
                        format!("Dropped line of unknown type {}", line.log_type),
                    ),
                    Verdict::CategoryDisabled | Verdict::NotMine | Verdict::FilteredOut => {}
                }
            }
            ServerFrame::Unknown => self.report_debug(DebugQualifier::Received, raw),
        }
    }

    // === Periodic work ===

    /// Flush the buffer and run the idle check; returns the flushed batch
    pub fn tick(&mut self, now: Instant) -> Vec<LogMessage> {
        self.check_idle(now);
        self.buffer.flush()
    }

    fn check_idle(&mut self, now: Instant) {
        let (Some(timeout), Some(last)) = (self.idle_timeout, self.last_frame) else {
            return;
        };
        if self.state != SessionState::Open || self.idle_reported {
            return;
        }
        if now.saturating_duration_since(last) >= timeout {
            self.idle_reported = true;
            self.report(LogMessage::info(format!(
                "No frames received for {}s, the connection may be dead",
                timeout.as_secs()
            )));
        }
    }

    // === User controls ===

    /// Switch "only mine" tracking
    pub fn set_only_mine(&mut self, on: bool) {
        if on == self.correlation.is_active() {
            return;
        }
        if on {
            let token = self.correlation.activate();
            self.report_debug(
                DebugQualifier::Here,
                format!("Tracking own requests with token {}", token),
            );
            if let Some(header) = self.correlation.request_header() {
                self.report(LogMessage::info(format!(
                    "Only mine: send \"{}\" with your requests",
                    header
                )));
            }
        } else {
            self.correlation.deactivate();
            self.report_debug(DebugQualifier::Here, "Stopped tracking own requests");
        }
    }

    /// Install a new content filter; invalid patterns keep the previous one
    pub fn set_filter(&mut self, text: &str) -> bool {
        match self.content.set(text) {
            Ok(FilterChange::Unchanged) => true,
            Ok(FilterChange::Cleared) => {
                self.report_debug(DebugQualifier::Here, "Filter cleared");
                true
            }
            Ok(FilterChange::Updated) => {
                self.report_debug(DebugQualifier::Here, format!("Filtering on /{}/", text));
                true
            }
            Err(e) => {
                self.report(LogMessage::error(
                    Origin::Info,
                    format!("Invalid filter /{}/: {}", text, e),
                ));
                false
            }
        }
    }

    /// Flip a togglable category; returns its new enabled flag
    pub fn toggle_category(&mut self, key: &str) -> Option<bool> {
        let enabled = self.registry.get(key).filter(|c| c.togglable)?.enabled;
        self.registry.set_enabled(key, !enabled);
        Some(!enabled)
    }

    pub fn set_category_enabled(&mut self, key: &str, enabled: bool) -> bool {
        self.registry.set_enabled(key, enabled)
    }

    pub fn show_debug(&self) -> bool {
        self.registry.is_enabled(DEBUG)
    }

    /// Drop all retained and pending messages
    pub fn clear(&mut self) {
        self.buffer.clear();
    }

    // === Persistence ===

    /// Restore user selections saved by a previous run
    pub fn restore(&mut self, settings: &Settings) {
        self.registry.apply_enabled(&settings.logtypes);
        self.registry.set_enabled(DEBUG, settings.show_debug);
        self.site = settings.sitename.clone();
        self.environment = settings.environment.clone();
        self.set_only_mine(settings.onlyme);
        if self.content.set(&settings.regex).is_err() {
            warn!("Ignoring saved filter /{}/", settings.regex);
        }
    }

    /// Copy current selections into `settings`
    pub fn store(&self, settings: &mut Settings) {
        settings.logtypes = self.registry.enabled_keys();
        settings.show_debug = self.show_debug();
        settings.onlyme = self.only_mine();
        settings.regex = self.content.text().to_string();
    }

    /// Change the selected target without connecting
    pub fn select(&mut self, site: &str, environment: &str) {
        self.site = site.to_string();
        self.environment = environment.to_string();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor() -> ConnectionDescriptor {
        ConnectionDescriptor {
            url: "wss://logstream.example.test/ws".into(),
            auth_message: r#"{"cmd":"auth","token":"t"}"#.into(),
        }
    }

    /// Session in `Open` state with debug messages visible
    fn open_session() -> (StreamSession, u64, mpsc::Receiver<String>) {
        let mut session = StreamSession::new(100, None);
        session.set_category_enabled(DEBUG, true);
        let ticket = session.begin_connect("acme", "prod").unwrap();
        let url = session.descriptor_ready(ticket.generation, descriptor()).unwrap();
        assert!(url.starts_with("wss://"));

        let (tx, rx) = mpsc::channel(16);
        session.attach_transport(ticket.generation, tx);
        session.handle_transport(ticket.generation, TransportEvent::Opened);
        session.tick(Instant::now());
        (session, ticket.generation, rx)
    }

    fn texts(batch: &[LogMessage]) -> Vec<&str> {
        batch.iter().map(|m| m.text.as_str()).collect()
    }

    #[test]
    fn test_empty_selection_is_rejected() {
        let mut session = StreamSession::new(10, None);
        assert!(session.begin_connect("", "prod").is_none());
        assert!(session.begin_connect("acme", " ").is_none());
        assert_eq!(session.state(), SessionState::Idle);

        let batch = session.tick(Instant::now());
        assert_eq!(batch.len(), 2);
        assert_eq!(batch[0].severity, Severity::Info);
    }

    #[test]
    fn test_open_sends_auth_first() {
        let (session, _, mut rx) = open_session();
        assert_eq!(session.state(), SessionState::Open);
        assert_eq!(session.connect_action(), ConnectAction::Disconnect);
        assert_eq!(rx.try_recv().unwrap(), r#"{"cmd":"auth","token":"t"}"#);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_descriptor_failure_returns_to_idle() {
        let mut session = StreamSession::new(10, None);
        let ticket = session.begin_connect("acme", "prod").unwrap();
        session.descriptor_failed(
            ticket.generation,
            &ApiFailure {
                status: Some(403),
                status_text: "Forbidden".into(),
                body: "nope".into(),
            },
        );

        assert_eq!(session.state(), SessionState::Idle);
        let batch = session.tick(Instant::now());
        let last = batch.last().unwrap();
        assert_eq!(last.severity, Severity::Error);
        assert_eq!(last.origin, Origin::Sent);
        assert!(last.text.contains("403 Forbidden: nope"));
    }

    #[test]
    fn test_available_subscribes_per_server() {
        let (mut session, generation, mut rx) = open_session();
        rx.try_recv().unwrap(); // auth

        for server in ["web-1", "web-2"] {
            session.handle_transport(
                generation,
                TransportEvent::Frame(format!(
                    r#"{{"cmd":"available","type":"php-error","display_type":"PHP error","server":"{}"}}"#,
                    server
                )),
            );
        }

        let first: serde_json::Value = serde_json::from_str(&rx.try_recv().unwrap()).unwrap();
        let second: serde_json::Value = serde_json::from_str(&rx.try_recv().unwrap()).unwrap();
        assert_eq!(first["server"], "web-1");
        assert_eq!(second["server"], "web-2");
        assert_eq!(second["cmd"], "enable");
        assert_eq!(
            session.registry().get("php-error").unwrap().servers,
            vec!["web-1", "web-2"]
        );
    }

    #[test]
    fn test_available_for_disabled_category_does_not_subscribe() {
        let (mut session, generation, mut rx) = open_session();
        rx.try_recv().unwrap();
        session.toggle_category("mysql-slow");

        session.handle_transport(
            generation,
            TransportEvent::Frame(
                r#"{"cmd":"available","type":"mysql-slow","display_type":"MySQL","server":"db-1"}"#
                    .into(),
            ),
        );
        assert!(rx.try_recv().is_err());
        assert!(session.registry().get("mysql-slow").unwrap().servers.contains(&"db-1".to_string()));
    }

    #[test]
    fn test_new_category_is_registered_enabled() {
        let (mut session, generation, mut rx) = open_session();
        rx.try_recv().unwrap();

        session.handle_transport(
            generation,
            TransportEvent::Frame(
                r#"{"cmd":"available","type":"nginx-access","display_type":"Nginx","server":"web-9"}"#
                    .into(),
            ),
        );
        assert!(session.registry().is_enabled("nginx-access"));
        assert!(rx.try_recv().is_ok());
    }

    #[test]
    fn test_accepted_line_is_buffered() {
        let (mut session, generation, _rx) = open_session();
        session.set_category_enabled(DEBUG, false);

        session.handle_transport(
            generation,
            TransportEvent::Frame(
                r#"{"cmd":"line","log_type":"varnish-request","text":"GET / 503","disp_time":"2014-03-05 12:00:00","http_status":503}"#
                    .into(),
            ),
        );
        let batch = session.tick(Instant::now());

        assert_eq!(texts(&batch), vec!["GET / 503"]);
        assert_eq!(batch[0].origin, Origin::Log);
        assert_eq!(batch[0].http_status_class, Some(500));
    }

    #[test]
    fn test_unknown_line_category_dropped_with_debug() {
        let (mut session, generation, _rx) = open_session();

        session.handle_transport(
            generation,
            TransportEvent::Frame(r#"{"cmd":"line","log_type":"mystery","text":"x"}"#.into()),
        );
        let batch = session.tick(Instant::now());

        assert_eq!(batch.len(), 1);
        assert_eq!(batch[0].origin, Origin::Debug(DebugQualifier::Received));
        assert!(batch[0].text.contains("mystery"));
    }

    #[test]
    fn test_malformed_frame_keeps_session_open() {
        let (mut session, generation, _rx) = open_session();

        session.handle_transport(generation, TransportEvent::Frame("{{garbage".into()));
        let batch = session.tick(Instant::now());

        assert_eq!(session.state(), SessionState::Open);
        assert_eq!(batch.len(), 1);
        assert_eq!(batch[0].severity, Severity::Debug);
        assert!(batch[0].text.contains("{{garbage"));
    }

    #[test]
    fn test_server_error_keeps_session_open() {
        let (mut session, generation, _rx) = open_session();

        session.handle_transport(
            generation,
            TransportEvent::Frame(r#"{"cmd":"error","reason":"overloaded"}"#.into()),
        );
        session.handle_transport(generation, TransportEvent::Error("reset".into()));
        let batch = session.tick(Instant::now());

        assert_eq!(session.state(), SessionState::Open);
        assert_eq!(batch.len(), 2);
        assert!(batch.iter().all(|m| m.severity == Severity::Error));
        assert!(batch[0].text.contains("overloaded"));
    }

    #[test]
    fn test_success_messages() {
        let (mut session, generation, _rx) = open_session();

        session.handle_transport(
            generation,
            TransportEvent::Frame(r#"{"cmd":"success","msg":{"cmd":"keepalive"}}"#.into()),
        );
        session.handle_transport(
            generation,
            TransportEvent::Frame(
                r#"{"cmd":"success","server":"web-1","msg":{"cmd":"enable","type":"php-error"}}"#
                    .into(),
            ),
        );
        let batch = session.tick(Instant::now());
        assert_eq!(texts(&batch), vec!["keepalive", "Enabled PHP error on web-1"]);
    }

    #[test]
    fn test_connected_messages() {
        let (mut session, generation, _rx) = open_session();

        session.handle_transport(
            generation,
            TransportEvent::Frame(r#"{"cmd":"connected","server":"logstream-3"}"#.into()),
        );
        session.handle_transport(
            generation,
            TransportEvent::Frame(r#"{"cmd":"connected","server":"web-1"}"#.into()),
        );
        let batch = session.tick(Instant::now());

        assert_eq!(batch[0].origin, Origin::Info);
        assert_eq!(batch[0].text, "Connected");
        assert_eq!(batch[1].text, "Connected to server web-1");
    }

    #[test]
    fn test_disconnect_and_stale_events() {
        let (mut session, generation, _rx) = open_session();

        session.disconnect();
        assert_eq!(session.state(), SessionState::Closed);
        assert_eq!(session.connect_action(), ConnectAction::Reconnect);

        // Late events from the old transport are ignored
        session.handle_transport(
            generation,
            TransportEvent::Frame(r#"{"cmd":"line","log_type":"php-error","text":"late"}"#.into()),
        );
        session.handle_transport(generation, TransportEvent::Closed);

        let batch = session.tick(Instant::now());
        assert_eq!(texts(&batch), vec!["Connection closed"]);
    }

    #[test]
    fn test_transport_close_event() {
        let (mut session, generation, _rx) = open_session();
        session.handle_transport(generation, TransportEvent::Closed);
        assert_eq!(session.state(), SessionState::Closed);
    }

    #[test]
    fn test_reconnect_supersedes_previous_transport() {
        let (mut session, old, _rx) = open_session();

        let ticket = session.begin_connect("acme", "dev").unwrap();
        assert_ne!(ticket.generation, old);
        assert_eq!(session.state(), SessionState::Connecting);

        session.handle_transport(old, TransportEvent::Opened);
        assert_eq!(session.state(), SessionState::Connecting);
    }

    #[test]
    fn test_idle_notice_once() {
        let mut session = StreamSession::new(10, Some(Duration::from_secs(30)));
        let ticket = session.begin_connect("acme", "prod").unwrap();
        session.descriptor_ready(ticket.generation, descriptor());
        let (tx, _rx) = mpsc::channel(4);
        session.attach_transport(ticket.generation, tx);
        session.handle_transport(ticket.generation, TransportEvent::Opened);
        session.tick(Instant::now());

        let later = Instant::now() + Duration::from_secs(31);
        let batch = session.tick(later);
        assert_eq!(batch.len(), 1);
        assert!(batch[0].text.starts_with("No frames received"));
        assert_eq!(session.state(), SessionState::Open);

        assert!(session.tick(later + Duration::from_secs(60)).is_empty());
    }

    #[test]
    fn test_invalid_filter_reports_error() {
        let mut session = StreamSession::new(10, None);
        assert!(session.set_filter("ok"));
        assert!(!session.set_filter("(unclosed"));
        assert_eq!(session.filter_text(), "ok");

        let batch = session.tick(Instant::now());
        assert_eq!(batch.last().unwrap().severity, Severity::Error);
    }

    #[test]
    fn test_restore_and_store_settings() {
        let mut settings = Settings {
            show_debug: true,
            onlyme: true,
            regex: "fatal".into(),
            sitename: "acme".into(),
            environment: "prod".into(),
            ..Default::default()
        };
        settings.logtypes.insert("php-error".into(), false);

        let mut session = StreamSession::new(10, None);
        session.restore(&settings);

        assert!(session.show_debug());
        assert!(session.only_mine());
        assert!(!session.registry().is_enabled("php-error"));
        assert_eq!(session.site(), "acme");

        let mut saved = Settings::default();
        session.store(&mut saved);
        assert_eq!(saved.regex, "fatal");
        assert_eq!(saved.logtypes.get("php-error"), Some(&false));
        assert!(saved.onlyme);
    }

    #[test]
    fn test_only_mine_announces_usable_header() {
        let mut session = StreamSession::new(10, None);
        assert!(session.request_header().is_none());

        session.set_only_mine(true);
        let header = session.request_header().unwrap();
        assert!(header.starts_with("X-Request-ID: ac-ls-ce-"));

        let batch = session.tick(Instant::now());
        let notice = batch
            .iter()
            .find(|m| m.category == crate::logstream::category::INFO)
            .unwrap();
        assert!(notice.text.contains(&header));

        session.set_only_mine(false);
        assert!(session.request_header().is_none());
    }
}
