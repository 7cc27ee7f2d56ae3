//! Async glue around `StreamSession`
//!
//! The driver owns the session plus everything that talks to the outside
//! world: the REST client, the transport dialer and the persisted settings.
//! Async work runs on tokio tasks and reports back through channels that
//! `poll()` drains each frame, so the session itself stays synchronous.

use super::{SessionState, StreamSession};
use crate::cloud::cache::{default_environment, default_site, sort_environments};
use crate::cloud::{ApiFailure, CloudApi, ConnectionDescriptor, SingleFlight};
use crate::constants::CHANNEL_CAPACITY;
use crate::logstream::category::DEBUG;
use crate::logstream::{DebugQualifier, LogMessage, Origin};
use crate::settings::Settings;
use crate::transport::{Dialer, TransportEvent};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Results of background REST calls
#[derive(Debug)]
enum Completion {
    Descriptor {
        generation: u64,
        result: Result<ConnectionDescriptor, ApiFailure>,
    },
    Sites(Result<Vec<String>, ApiFailure>),
    Environments {
        site: String,
        result: Result<Vec<String>, ApiFailure>,
    },
    Domains {
        site: String,
        environment: String,
        result: Result<Vec<String>, ApiFailure>,
    },
}

/// The live transport of the current connection
struct Link {
    generation: u64,
    rx: mpsc::Receiver<TransportEvent>,
    shutdown: Arc<AtomicBool>,
}

impl Link {
    fn stop(self) {
        self.shutdown.store(true, Ordering::Relaxed);
    }
}

/// Runtime options for the driver
#[derive(Debug, Clone)]
pub struct DriverOptions {
    pub flush_interval: Duration,
    /// Where settings are saved; `None` keeps them in memory only
    pub settings_path: Option<PathBuf>,
    /// Host name used to pick the initial site/environment
    pub domain: Option<String>,
}

impl Default for DriverOptions {
    fn default() -> Self {
        Self {
            flush_interval: Duration::from_millis(crate::constants::DEFAULT_FLUSH_INTERVAL_MS),
            settings_path: None,
            domain: None,
        }
    }
}

pub struct SessionDriver<A: CloudApi, D: Dialer> {
    session: StreamSession,
    /// `None` when no credentials are configured
    api: Option<Arc<A>>,
    dialer: D,
    settings: Settings,
    options: DriverOptions,

    completion_tx: mpsc::Sender<Completion>,
    completion_rx: mpsc::Receiver<Completion>,
    descriptor_flight: SingleFlight,
    sites_flight: SingleFlight,
    environments_flight: SingleFlight,
    domains_flight: SingleFlight,
    link: Option<Link>,

    sites: Vec<String>,
    environments: Vec<String>,
    last_flush: Instant,
}

impl<A: CloudApi, D: Dialer> SessionDriver<A, D> {
    pub fn new(
        mut session: StreamSession,
        api: Option<A>,
        dialer: D,
        settings: Settings,
        options: DriverOptions,
    ) -> Self {
        session.restore(&settings);
        let (completion_tx, completion_rx) = mpsc::channel(CHANNEL_CAPACITY);

        Self {
            session,
            api: api.map(Arc::new),
            dialer,
            settings,
            options,
            completion_tx,
            completion_rx,
            descriptor_flight: SingleFlight::new(),
            sites_flight: SingleFlight::new(),
            environments_flight: SingleFlight::new(),
            domains_flight: SingleFlight::new(),
            link: None,
            sites: Vec::new(),
            environments: Vec::new(),
            last_flush: Instant::now(),
        }
    }

    // === Accessors ===

    pub fn session(&self) -> &StreamSession {
        &self.session
    }

    pub fn sites(&self) -> &[String] {
        &self.sites
    }

    pub fn environments(&self) -> &[String] {
        &self.environments
    }

    pub fn has_credentials(&self) -> bool {
        self.api.is_some()
    }

    // === Startup ===

    /// Populate pickers from the cache, then refresh from the API
    pub fn start(&mut self) {
        if self.api.is_none() {
            self.session.report(LogMessage::info(
                "API credentials are not configured; set [api] username and password in config.toml",
            ));
        }

        let cached = self.settings.cache.site_names();
        if !cached.is_empty() {
            self.apply_site_list(cached);
        }
        self.refresh_sites();
    }

    fn domain_target(&self) -> Option<(String, String)> {
        let host = self.options.domain.as_deref()?;
        self.settings
            .cache
            .domain_match(host)
            .map(|t| (t.sitename.clone(), t.environment.clone()))
    }

    // === Connection ===

    /// Connect to the selected site/environment
    pub fn connect(&mut self) {
        let Some(api) = self.api.clone() else {
            self.session.report(LogMessage::info(
                "Cannot connect: API credentials are not configured",
            ));
            return;
        };

        let site = self.session.site().to_string();
        let environment = self.session.environment().to_string();
        let Some(ticket) = self.session.begin_connect(&site, &environment) else {
            return;
        };
        if let Some(link) = self.link.take() {
            link.stop();
        }

        let tx = self.completion_tx.clone();
        self.descriptor_flight.run(async move {
            let result = api
                .connection_descriptor(&ticket.site, &ticket.environment)
                .await;
            let _ = tx
                .send(Completion::Descriptor {
                    generation: ticket.generation,
                    result,
                })
                .await;
        });
    }

    pub fn disconnect(&mut self) {
        self.descriptor_flight.abort();
        self.session.disconnect();
        if let Some(link) = self.link.take() {
            link.stop();
        }
    }

    /// Connect when idle or closed, disconnect otherwise
    pub fn toggle_connection(&mut self) {
        if self.session.state().is_live() {
            self.disconnect();
        } else {
            self.connect();
        }
    }

    fn dial(&mut self, generation: u64, url: &str) {
        let shutdown = Arc::new(AtomicBool::new(false));
        match self.dialer.dial(url, shutdown.clone()) {
            Ok(channels) => {
                self.session.attach_transport(generation, channels.tx);
                self.link = Some(Link {
                    generation,
                    rx: channels.rx,
                    shutdown,
                });
            }
            Err(e) => {
                self.session
                    .handle_transport(generation, TransportEvent::Error(e.to_string()));
                self.session
                    .handle_transport(generation, TransportEvent::Closed);
            }
        }
    }

    // === Site / environment selection ===

    pub fn refresh_sites(&mut self) {
        let Some(api) = self.api.clone() else {
            return;
        };
        self.session
            .report(LogMessage::debug(DebugQualifier::Sent, "Refreshing site list"));
        let tx = self.completion_tx.clone();
        self.sites_flight.run(async move {
            let result = api.list_sites().await;
            let _ = tx.send(Completion::Sites(result)).await;
        });
    }

    fn refresh_environments(&mut self, site: &str) {
        let Some(api) = self.api.clone() else {
            return;
        };
        self.session.report(LogMessage::debug(
            DebugQualifier::Sent,
            format!("Refreshing environments of {}", site),
        ));
        let tx = self.completion_tx.clone();
        let site = site.to_string();
        self.environments_flight.run(async move {
            let result = api.list_environments(&site).await;
            let _ = tx.send(Completion::Environments { site, result }).await;
        });
    }

    fn refresh_domains(&mut self, site: &str, environment: &str) {
        let Some(api) = self.api.clone() else {
            return;
        };
        let tx = self.completion_tx.clone();
        let site = site.to_string();
        let environment = environment.to_string();
        self.domains_flight.run(async move {
            let result = api.list_domains(&site, &environment).await;
            let _ = tx
                .send(Completion::Domains {
                    site,
                    environment,
                    result,
                })
                .await;
        });
    }

    /// Select a site; its environments are loaded from cache and refreshed
    pub fn select_site(&mut self, site: &str) {
        if site.is_empty() {
            return;
        }
        let site_changed = site != self.session.site();
        // Environments belong to a site; the saved one is reapplied if it exists
        let environment = if site_changed {
            String::new()
        } else {
            self.session.environment().to_string()
        };
        self.session.select(site, &environment);
        self.settings.sitename = site.to_string();
        self.save_settings();

        if site_changed || self.environments.is_empty() {
            let cached = self.settings.cache.environment_names(site);
            self.apply_environment_list(cached);
        }
        self.refresh_environments(site);
    }

    /// Select an environment of the current site
    pub fn select_environment(&mut self, environment: &str) {
        let site = self.session.site().to_string();
        if site.is_empty() || environment.is_empty() {
            return;
        }
        self.session.select(&site, environment);
        self.settings.environment = environment.to_string();
        self.save_settings();
        self.refresh_domains(&site, environment);
    }

    pub fn cycle_site(&mut self, forward: bool) {
        if let Some(next) = cycle(&self.sites, self.session.site(), forward) {
            self.select_site(&next);
        }
    }

    pub fn cycle_environment(&mut self, forward: bool) {
        if let Some(next) = cycle(&self.environments, self.session.environment(), forward) {
            self.select_environment(&next);
        }
    }

    fn apply_site_list(&mut self, mut sites: Vec<String>) {
        sites.sort();
        let domain = self.domain_target();
        let current = self.session.site().to_string();
        let last = if current.is_empty() {
            self.settings.sitename.clone()
        } else {
            current
        };
        let choice = default_site(
            &sites,
            domain.as_ref().map(|(s, _)| s.as_str()),
            Some(last.as_str()),
        );
        self.sites = sites;
        if let Some(site) = choice {
            self.select_site(&site);
        }
    }

    fn apply_environment_list(&mut self, mut envs: Vec<String>) {
        if envs.is_empty() {
            return;
        }
        sort_environments(&mut envs);
        let site = self.session.site().to_string();
        let domain = self
            .domain_target()
            .filter(|(s, _)| *s == site)
            .map(|(_, e)| e);
        let current = self.session.environment().to_string();
        let last = if current.is_empty() {
            self.settings.environment.clone()
        } else {
            current
        };
        let choice = default_environment(&envs, domain.as_deref(), Some(last.as_str()));
        self.environments = envs;
        if let Some(env) = choice {
            self.select_environment(&env);
        }
    }

    // === User controls ===

    pub fn set_only_mine(&mut self, on: bool) {
        self.session.set_only_mine(on);
        self.save_settings();
    }

    pub fn toggle_only_mine(&mut self) {
        let on = !self.session.only_mine();
        self.set_only_mine(on);
    }

    pub fn set_filter(&mut self, text: &str) -> bool {
        let ok = self.session.set_filter(text);
        if ok {
            self.save_settings();
        }
        ok
    }

    pub fn toggle_category(&mut self, key: &str) -> Option<bool> {
        let enabled = self.session.toggle_category(key)?;
        self.save_settings();
        Some(enabled)
    }

    pub fn toggle_debug(&mut self) -> bool {
        self.toggle_category(DEBUG).unwrap_or(false)
    }

    pub fn clear(&mut self) {
        self.session.clear();
    }

    // === Polling ===

    /// Drain completions and transport events, flush on cadence
    ///
    /// Returns the flushed batch (empty between flush ticks).
    pub fn poll(&mut self) -> Vec<LogMessage> {
        while let Ok(completion) = self.completion_rx.try_recv() {
            self.handle_completion(completion);
        }
        self.drain_transport();

        let now = Instant::now();
        if now.duration_since(self.last_flush) < self.options.flush_interval {
            return Vec::new();
        }
        self.last_flush = now;
        self.session.tick(now)
    }

    /// Flush immediately, regardless of cadence
    pub fn flush(&mut self) -> Vec<LogMessage> {
        self.last_flush = Instant::now();
        self.session.tick(self.last_flush)
    }

    fn drain_transport(&mut self) {
        let Some(link) = self.link.as_mut() else {
            return;
        };
        let generation = link.generation;
        let mut events = Vec::new();
        let mut finished = false;
        loop {
            match link.rx.try_recv() {
                Ok(event) => {
                    finished |= event == TransportEvent::Closed;
                    events.push(event);
                }
                Err(mpsc::error::TryRecvError::Empty) => break,
                Err(mpsc::error::TryRecvError::Disconnected) => {
                    if !finished {
                        events.push(TransportEvent::Closed);
                    }
                    finished = true;
                    break;
                }
            }
        }

        for event in events {
            self.session.handle_transport(generation, event);
        }
        if finished {
            if let Some(link) = self.link.take() {
                link.stop();
            }
        }
    }

    fn handle_completion(&mut self, completion: Completion) {
        match completion {
            Completion::Descriptor { generation, result } => match result {
                Ok(descriptor) => {
                    if let Some(url) = self.session.descriptor_ready(generation, descriptor) {
                        debug!("Dialing {}", url);
                        self.dial(generation, &url);
                    }
                }
                Err(failure) => self.session.descriptor_failed(generation, &failure),
            },
            Completion::Sites(Ok(sites)) => {
                if sites.is_empty() {
                    self.session
                        .report(LogMessage::error(Origin::Info, "No sites are available"));
                    return;
                }
                self.settings.cache.record_sites(&sites, now_millis());
                self.session
                    .report(LogMessage::debug(DebugQualifier::Received, "Site list refreshed"));
                self.apply_site_list(sites);
                self.save_settings();
            }
            Completion::Sites(Err(failure)) => {
                self.report_failure("Refreshing sites failed", &failure);
            }
            Completion::Environments { site, result } => match result {
                Ok(envs) if envs.is_empty() => {
                    self.session.report(LogMessage::error(
                        Origin::Info,
                        format!("No environments are available for {}", site),
                    ));
                }
                Ok(envs) => {
                    self.settings
                        .cache
                        .record_environments(&site, &envs, now_millis());
                    self.session.report(LogMessage::debug(
                        DebugQualifier::Received,
                        "Environment list refreshed",
                    ));
                    if site == self.session.site() {
                        self.apply_environment_list(envs);
                    }
                    self.save_settings();
                }
                Err(failure) => {
                    self.report_failure(
                        &format!("Refreshing environments of {} failed", site),
                        &failure,
                    );
                }
            },
            Completion::Domains {
                site,
                environment,
                result,
            } => match result {
                Ok(domains) => {
                    self.settings
                        .cache
                        .record_domains(&site, &environment, &domains);
                    self.save_settings();
                }
                Err(failure) => self.report_failure("Fetching domains failed", &failure),
            },
        }
    }

    fn report_failure(&mut self, what: &str, failure: &ApiFailure) {
        let qualifier = match failure.origin() {
            Origin::Sent => DebugQualifier::Sent,
            _ => DebugQualifier::Received,
        };
        self.session.report(LogMessage::error(
            Origin::Debug(qualifier),
            format!("{}: {}", what, failure),
        ));
    }

    // === Persistence ===

    fn save_settings(&mut self) {
        self.session.store(&mut self.settings);
        let Some(path) = &self.options.settings_path else {
            return;
        };
        if let Err(e) = self.settings.save_to(path) {
            warn!("{}", e);
            self.session.report(LogMessage::debug(
                DebugQualifier::ExtensionError,
                format!("Saving settings failed: {}", e),
            ));
        }
    }

    /// Stop all background work and persist settings
    pub fn shutdown(&mut self) {
        self.descriptor_flight.abort();
        self.sites_flight.abort();
        self.environments_flight.abort();
        self.domains_flight.abort();
        if let Some(link) = self.link.take() {
            link.stop();
        }
        self.save_settings();
    }

    /// Wait until the session reaches `state` or `timeout` elapses
    ///
    /// Flushed batches are discarded; read the retained buffer afterwards.
    pub async fn wait_for(&mut self, state: SessionState, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        while Instant::now() < deadline {
            self.poll();
            if self.session.state() == state {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        false
    }
}

fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Next (or previous) entry after `current`, wrapping around
fn cycle(items: &[String], current: &str, forward: bool) -> Option<String> {
    if items.is_empty() {
        return None;
    }
    let len = items.len();
    let next = match items.iter().position(|i| i == current) {
        Some(i) if forward => (i + 1) % len,
        Some(i) => (i + len - 1) % len,
        None => 0,
    };
    items.get(next).cloned()
}
