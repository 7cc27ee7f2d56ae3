//! End-to-end session flow against an in-memory API and transport
//!
//! The mock dialer hands the test the far end of every transport it opens,
//! so frames can be injected and outbound frames inspected.

use cloud_logstream::cloud::{ApiFailure, CloudApi, ConnectionDescriptor};
use cloud_logstream::error::Result;
use cloud_logstream::logstream::{LogMessage, Severity};
use cloud_logstream::session::{
    ConnectAction, DriverOptions, SessionDriver, SessionState, StreamSession,
};
use cloud_logstream::settings::Settings;
use cloud_logstream::transport::{Dialer, TransportChannels, TransportEvent};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;

const AUTH: &str = r#"{"cmd":"stream-environment","site":"mysite","environment":"prod"}"#;
const WAIT: Duration = Duration::from_secs(2);

// =============================================================================
// Mocks
// =============================================================================

struct MockApi {
    descriptor: std::result::Result<ConnectionDescriptor, ApiFailure>,
    sites_failure: Option<ApiFailure>,
}

impl MockApi {
    fn ok() -> Self {
        Self {
            descriptor: Ok(ConnectionDescriptor {
                url: "wss://logstream.test/ah_websocket/logstream/v1".into(),
                auth_message: AUTH.into(),
            }),
            sites_failure: None,
        }
    }

    fn failing(status: u16, status_text: &str) -> Self {
        Self {
            descriptor: Err(ApiFailure {
                status: Some(status),
                status_text: status_text.into(),
                body: "denied".into(),
            }),
            sites_failure: None,
        }
    }

    fn sites_unavailable() -> Self {
        Self {
            sites_failure: Some(ApiFailure {
                status: Some(503),
                status_text: "Service Unavailable".into(),
                body: "maintenance".into(),
            }),
            ..Self::ok()
        }
    }
}

impl CloudApi for MockApi {
    async fn connection_descriptor(
        &self,
        _site: &str,
        _env: &str,
    ) -> std::result::Result<ConnectionDescriptor, ApiFailure> {
        self.descriptor.clone()
    }

    async fn list_sites(&self) -> std::result::Result<Vec<String>, ApiFailure> {
        match &self.sites_failure {
            Some(failure) => Err(failure.clone()),
            None => Ok(vec!["mysite".into()]),
        }
    }

    async fn list_environments(&self, _site: &str) -> std::result::Result<Vec<String>, ApiFailure> {
        Ok(vec!["dev".into(), "prod".into()])
    }

    async fn list_domains(
        &self,
        _site: &str,
        _env: &str,
    ) -> std::result::Result<Vec<String>, ApiFailure> {
        Ok(Vec::new())
    }
}

/// Far end of a dialed transport
struct RemoteEnd {
    events: mpsc::Sender<TransportEvent>,
    outbound: mpsc::Receiver<String>,
    shutdown: Arc<AtomicBool>,
}

#[derive(Clone, Default)]
struct MockDialer {
    remotes: Arc<Mutex<Vec<RemoteEnd>>>,
}

impl Dialer for MockDialer {
    fn dial(&self, _url: &str, shutdown: Arc<AtomicBool>) -> Result<TransportChannels> {
        let (event_tx, event_rx) = mpsc::channel(64);
        let (out_tx, out_rx) = mpsc::channel(64);
        self.remotes.lock().push(RemoteEnd {
            events: event_tx,
            outbound: out_rx,
            shutdown,
        });
        Ok(TransportChannels {
            rx: event_rx,
            tx: out_tx,
        })
    }
}

impl MockDialer {
    fn dialed(&self) -> usize {
        self.remotes.lock().len()
    }

    fn push(&self, index: usize, event: TransportEvent) {
        let _ = self.remotes.lock()[index].events.try_send(event);
    }

    fn frame(&self, index: usize, raw: &str) {
        self.push(index, TransportEvent::Frame(raw.to_string()));
    }

    fn sent(&self, index: usize) -> Vec<String> {
        let mut remotes = self.remotes.lock();
        let mut frames = Vec::new();
        while let Ok(frame) = remotes[index].outbound.try_recv() {
            frames.push(frame);
        }
        frames
    }

    fn is_shut_down(&self, index: usize) -> bool {
        self.remotes.lock()[index].shutdown.load(Ordering::Relaxed)
    }
}

// =============================================================================
// Harness
// =============================================================================

type Driver = SessionDriver<MockApi, MockDialer>;

fn settings(show_debug: bool) -> Settings {
    Settings {
        sitename: "mysite".into(),
        environment: "prod".into(),
        show_debug,
        ..Default::default()
    }
}

fn driver_with(api: MockApi, dialer: &MockDialer, max_entries: usize, settings: Settings) -> Driver {
    let options = DriverOptions {
        flush_interval: Duration::ZERO,
        ..Default::default()
    };
    SessionDriver::new(
        StreamSession::new(max_entries, None),
        Some(api),
        dialer.clone(),
        settings,
        options,
    )
}

/// Poll until the dialer has opened `count` transports
async fn wait_for_dial(driver: &mut Driver, dialer: &MockDialer, count: usize) {
    let deadline = Instant::now() + WAIT;
    while dialer.dialed() < count && Instant::now() < deadline {
        driver.poll();
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    assert_eq!(dialer.dialed(), count, "transport was not dialed");
}

/// Connect and complete the handshake on transport `index`
async fn open(driver: &mut Driver, dialer: &MockDialer, index: usize) {
    driver.connect();
    wait_for_dial(driver, dialer, index + 1).await;
    dialer.push(index, TransportEvent::Opened);
    assert!(driver.wait_for(SessionState::Open, WAIT).await);
}

/// Drain pending events and flush
fn settle(driver: &mut Driver) {
    driver.poll();
    driver.flush();
}

fn retained(driver: &Driver) -> Vec<&LogMessage> {
    driver.session().buffer().iter().collect()
}

fn texts(driver: &Driver) -> Vec<String> {
    retained(driver).iter().map(|m| m.text.clone()).collect()
}

fn line(log_type: &str, text: &str) -> String {
    serde_json::json!({"cmd": "line", "log_type": log_type, "text": text}).to_string()
}

// =============================================================================
// Connection lifecycle
// =============================================================================

#[tokio::test]
async fn test_auth_message_is_first_frame() {
    let dialer = MockDialer::default();
    let mut driver = driver_with(MockApi::ok(), &dialer, 100, settings(false));
    open(&mut driver, &dialer, 0).await;

    assert_eq!(dialer.sent(0), vec![AUTH.to_string()]);
    assert_eq!(driver.session().connect_action(), ConnectAction::Disconnect);
}

#[tokio::test]
async fn test_reconnect_leaves_one_live_transport() {
    let dialer = MockDialer::default();
    let mut driver = driver_with(MockApi::ok(), &dialer, 100, settings(false));
    open(&mut driver, &dialer, 0).await;

    open(&mut driver, &dialer, 1).await;
    assert!(dialer.is_shut_down(0));
    assert!(!dialer.is_shut_down(1));

    // Only the new transport feeds the session
    dialer.frame(0, &line("php-error", "from old"));
    dialer.frame(1, &line("php-error", "from new"));
    settle(&mut driver);

    let seen = texts(&driver);
    assert!(seen.contains(&"from new".to_string()));
    assert!(!seen.contains(&"from old".to_string()));
    assert_eq!(driver.session().state(), SessionState::Open);
}

#[tokio::test]
async fn test_transport_close_offers_reconnect() {
    let dialer = MockDialer::default();
    let mut driver = driver_with(MockApi::ok(), &dialer, 100, settings(false));
    open(&mut driver, &dialer, 0).await;

    dialer.push(0, TransportEvent::Error("reset by peer".into()));
    dialer.push(0, TransportEvent::Closed);
    settle(&mut driver);

    assert_eq!(driver.session().state(), SessionState::Closed);
    assert_eq!(driver.session().connect_action(), ConnectAction::Reconnect);
    assert!(retained(&driver)
        .iter()
        .any(|m| m.severity == Severity::Error && m.text.contains("reset by peer")));
}

#[tokio::test]
async fn test_user_disconnect_stops_transport() {
    let dialer = MockDialer::default();
    let mut driver = driver_with(MockApi::ok(), &dialer, 100, settings(false));
    open(&mut driver, &dialer, 0).await;

    driver.toggle_connection();
    assert_eq!(driver.session().state(), SessionState::Closed);
    assert!(dialer.is_shut_down(0));
}

#[tokio::test]
async fn test_descriptor_failure_returns_to_idle() {
    let dialer = MockDialer::default();
    let mut driver = driver_with(MockApi::failing(403, "Forbidden"), &dialer, 100, settings(false));
    driver.connect();
    assert_eq!(driver.session().state(), SessionState::Connecting);

    assert!(driver.wait_for(SessionState::Idle, WAIT).await);
    settle(&mut driver);

    assert_eq!(dialer.dialed(), 0);
    assert!(retained(&driver).iter().any(|m| m.severity == Severity::Error
        && m.text.contains("403 Forbidden")
        && m.text.contains("denied")));
}

#[tokio::test]
async fn test_connect_without_selection_is_rejected() {
    let dialer = MockDialer::default();
    let mut driver = driver_with(MockApi::ok(), &dialer, 100, Settings::default());
    driver.connect();
    settle(&mut driver);

    assert_eq!(driver.session().state(), SessionState::Idle);
    assert!(texts(&driver)
        .iter()
        .any(|t| t.contains("Select a site and an environment")));
}

// =============================================================================
// Category announcements
// =============================================================================

#[tokio::test]
async fn test_unseen_category_is_added_and_subscribed() {
    let dialer = MockDialer::default();
    let mut driver = driver_with(MockApi::ok(), &dialer, 100, settings(false));
    open(&mut driver, &dialer, 0).await;
    dialer.sent(0);
    let before = driver.session().registry().len();

    dialer.frame(
        0,
        r#"{"cmd":"available","type":"custom-log","display_type":"Custom log","server":"web-1"}"#,
    );
    settle(&mut driver);

    let registry = driver.session().registry();
    assert_eq!(registry.len(), before + 1);
    let custom = registry.get("custom-log").unwrap();
    assert!(custom.enabled);
    assert_eq!(custom.servers, vec!["web-1".to_string()]);

    let sent = dialer.sent(0);
    assert_eq!(sent.len(), 1);
    let frame: serde_json::Value = serde_json::from_str(&sent[0]).unwrap();
    assert_eq!(frame["cmd"], "enable");
    assert_eq!(frame["type"], "custom-log");
    assert_eq!(frame["server"], "web-1");
}

#[tokio::test]
async fn test_second_server_gets_its_own_subscription() {
    let dialer = MockDialer::default();
    let mut driver = driver_with(MockApi::ok(), &dialer, 100, settings(false));
    open(&mut driver, &dialer, 0).await;
    dialer.sent(0);
    let before = driver.session().registry().len();

    for server in ["web-1", "web-2"] {
        dialer.frame(
            0,
            &format!(
                r#"{{"cmd":"available","type":"custom-log","display_type":"Custom log","server":"{}"}}"#,
                server
            ),
        );
    }
    settle(&mut driver);

    assert_eq!(driver.session().registry().len(), before + 1);
    let sent = dialer.sent(0);
    assert_eq!(sent.len(), 2);
    assert!(sent[0].contains("web-1"));
    assert!(sent[1].contains("web-2"));
}

#[tokio::test]
async fn test_disabled_category_announcement_keeps_flag() {
    let dialer = MockDialer::default();
    let mut driver = driver_with(MockApi::ok(), &dialer, 100, settings(false));
    assert_eq!(driver.toggle_category("mysql-slow"), Some(false));
    open(&mut driver, &dialer, 0).await;
    dialer.sent(0);

    dialer.frame(
        0,
        r#"{"cmd":"available","type":"mysql-slow","display_type":"MySQL","server":"db-1"}"#,
    );
    settle(&mut driver);

    assert!(!driver.session().registry().get("mysql-slow").unwrap().enabled);
    assert!(dialer.sent(0).is_empty());
}

#[tokio::test]
async fn test_hidden_announced_category_stays_hidden_next_run() {
    let announce =
        r#"{"cmd":"available","type":"custom-log","display_type":"Custom log","server":"web-1"}"#;

    let dialer = MockDialer::default();
    let mut first = driver_with(MockApi::ok(), &dialer, 100, settings(false));
    open(&mut first, &dialer, 0).await;
    dialer.frame(0, announce);
    settle(&mut first);
    assert_eq!(first.toggle_category("custom-log"), Some(false));

    let mut saved = settings(false);
    first.session().store(&mut saved);
    first.shutdown();
    assert_eq!(saved.logtypes.get("custom-log"), Some(&false));

    // Next run: the flag waits for the announcement and no subscription is sent
    let dialer = MockDialer::default();
    let mut second = driver_with(MockApi::ok(), &dialer, 100, saved);
    open(&mut second, &dialer, 0).await;
    dialer.sent(0);
    dialer.frame(0, announce);
    settle(&mut second);

    assert!(!second.session().registry().is_enabled("custom-log"));
    assert!(dialer.sent(0).is_empty());
}

// =============================================================================
// Filtering
// =============================================================================

#[tokio::test]
async fn test_disabled_category_lines_are_dropped() {
    let dialer = MockDialer::default();
    let mut driver = driver_with(MockApi::ok(), &dialer, 100, settings(false));
    open(&mut driver, &dialer, 0).await;

    driver.toggle_category("php-error");
    // A matching content filter does not bring it back
    assert!(driver.set_filter("boom"));
    dialer.frame(0, &line("php-error", "boom hidden"));
    dialer.frame(0, &line("drupal-watchdog", "boom shown"));
    settle(&mut driver);

    let seen = texts(&driver);
    assert!(seen.contains(&"boom shown".to_string()));
    assert!(!seen.contains(&"boom hidden".to_string()));
}

#[tokio::test]
async fn test_only_mine_rejects_previous_token() {
    let dialer = MockDialer::default();
    let mut driver = driver_with(MockApi::ok(), &dialer, 100, settings(false));
    let tagging = driver.session().request_tagging();
    assert!(tagging.next_request_id().is_none());

    driver.set_only_mine(true);
    let old_id = tagging.next_request_id().unwrap();
    driver.set_only_mine(false);
    driver.set_only_mine(true);
    let new_id = tagging.next_request_id().unwrap();
    assert_ne!(old_id, new_id);

    open(&mut driver, &dialer, 0).await;
    dialer.frame(0, &line("drupal-request", &format!(r#"GET / request_id="{}""#, old_id)));
    dialer.frame(0, &line("drupal-request", &format!(r#"GET / request_id="{}""#, new_id)));
    dialer.frame(0, &line("drupal-request", "GET / someone else"));
    settle(&mut driver);

    let seen = texts(&driver);
    assert!(seen.iter().any(|t| t.contains(&new_id)));
    assert!(!seen.iter().any(|t| t.contains(&old_id)));
    assert!(!seen.iter().any(|t| t.contains("someone else")));
}

#[tokio::test]
async fn test_only_mine_accepts_lines_tagged_with_shown_header() {
    let dialer = MockDialer::default();
    let mut driver = driver_with(MockApi::ok(), &dialer, 100, settings(false));
    driver.set_only_mine(true);

    let header = driver.session().request_header().unwrap();
    let (name, id) = header.split_once(": ").unwrap();
    assert_eq!(name, "X-Request-ID");

    open(&mut driver, &dialer, 0).await;
    dialer.frame(0, &line("drupal-request", &format!(r#"GET /cart request_id="{}""#, id)));
    dialer.frame(0, &line("drupal-request", "GET /cart untagged"));
    settle(&mut driver);

    let seen = texts(&driver);
    assert!(seen.iter().any(|t| t.contains("GET /cart request_id=")));
    assert!(!seen.iter().any(|t| t.contains("untagged")));
    // The header is announced where the user can copy it
    assert!(seen.iter().any(|t| t.contains(&header)));
}

#[tokio::test]
async fn test_unknown_line_type_is_dropped_with_debug() {
    let dialer = MockDialer::default();
    let mut driver = driver_with(MockApi::ok(), &dialer, 100, settings(true));
    open(&mut driver, &dialer, 0).await;

    dialer.frame(0, &line("mystery", "who am i"));
    settle(&mut driver);

    let messages = retained(&driver);
    assert!(!messages.iter().any(|m| m.text == "who am i"));
    assert!(messages
        .iter()
        .any(|m| m.severity == Severity::Debug && m.text.contains("mystery")));
}

#[tokio::test]
async fn test_http_status_is_bucketed() {
    let dialer = MockDialer::default();
    let mut driver = driver_with(MockApi::ok(), &dialer, 100, settings(false));
    open(&mut driver, &dialer, 0).await;

    for (text, status) in [("missing", 404), ("early", 150), ("down", 503)] {
        let raw = serde_json::json!({
            "cmd": "line",
            "log_type": "varnish-request",
            "text": text,
            "http_status": status,
        });
        dialer.frame(0, &raw.to_string());
    }
    settle(&mut driver);

    let token = |text: &str| {
        retained(&driver)
            .iter()
            .find(|m| m.text == text)
            .and_then(|m| m.http_status_token())
    };
    assert_eq!(token("missing").as_deref(), Some("http-status-400"));
    assert_eq!(token("early").as_deref(), Some("http-status-200"));
    assert_eq!(token("down").as_deref(), Some("http-status-500"));
}

// =============================================================================
// Buffer and resilience
// =============================================================================

#[tokio::test]
async fn test_retained_lines_are_bounded_newest_first() {
    let dialer = MockDialer::default();
    let mut driver = driver_with(MockApi::ok(), &dialer, 5, settings(false));
    open(&mut driver, &dialer, 0).await;

    for i in 0..12 {
        dialer.frame(0, &line("php-error", &format!("line {}", i)));
        if i % 4 == 3 {
            settle(&mut driver);
        }
    }
    settle(&mut driver);

    assert_eq!(
        texts(&driver),
        vec!["line 11", "line 10", "line 9", "line 8", "line 7"]
    );
}

#[tokio::test]
async fn test_malformed_frame_keeps_session_open() {
    let dialer = MockDialer::default();
    let mut driver = driver_with(MockApi::ok(), &dialer, 100, settings(true));
    open(&mut driver, &dialer, 0).await;
    settle(&mut driver);
    let before = driver.session().buffer().len();

    dialer.frame(0, "this is not json");
    settle(&mut driver);

    assert_eq!(driver.session().state(), SessionState::Open);
    let messages = retained(&driver);
    assert_eq!(messages.len(), before + 1);
    assert_eq!(messages[0].severity, Severity::Debug);
    assert!(messages[0].text.contains("this is not json"));
}

#[tokio::test]
async fn test_settings_follow_user_controls() {
    let dialer = MockDialer::default();
    let path = std::env::temp_dir().join(format!(
        "logstream-flow-{}-settings.json",
        std::process::id()
    ));
    let options = DriverOptions {
        flush_interval: Duration::ZERO,
        settings_path: Some(path.clone()),
        domain: None,
    };
    let mut driver = SessionDriver::new(
        StreamSession::new(100, None),
        Some(MockApi::ok()),
        dialer.clone(),
        settings(false),
        options,
    );

    driver.set_only_mine(true);
    assert!(driver.set_filter("cron"));
    driver.toggle_category("bal-request");
    driver.shutdown();

    let saved = Settings::load_from(&path);
    assert!(saved.onlyme);
    assert_eq!(saved.regex, "cron");
    assert_eq!(saved.logtypes.get("bal-request"), Some(&false));
    let _ = std::fs::remove_file(&path);
}

#[tokio::test]
async fn test_api_failure_is_reported_as_error() {
    let dialer = MockDialer::default();
    let mut driver = driver_with(MockApi::sites_unavailable(), &dialer, 100, settings(true));
    driver.start();

    let deadline = Instant::now() + WAIT;
    let mut failure = None;
    while failure.is_none() && Instant::now() < deadline {
        failure = driver
            .poll()
            .into_iter()
            .find(|m| m.text.contains("Refreshing sites failed"));
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    let failure = failure.expect("site refresh failure was not reported");
    assert_eq!(failure.category, "debug");
    assert_eq!(failure.severity, Severity::Error);
    assert!(failure.text.contains("503 Service Unavailable"));
}
