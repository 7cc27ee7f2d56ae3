//! Cloud Logstream - live log viewer for cloud-hosted site environments
//!
//! Usage:
//!   logstream                         Run interactive TUI
//!   logstream --headless              Stream accepted lines to stdout
//!   logstream --site S --env E        Override the saved selection
//!   logstream sites                   List accessible sites
//!   logstream envs <SITE>             List environments of a site

use anyhow::{Context, Result};
use clap::Parser;
use cloud_logstream::app::{App, LiveDriver};
use cloud_logstream::cli::{Cli, Command};
use cloud_logstream::cloud::cache::sort_environments;
use cloud_logstream::cloud::{CloudApi, HttpCloudApi};
use cloud_logstream::config::{self, Config};
use cloud_logstream::logstream::{self, CorrelationTagger, LogMessage};
use cloud_logstream::session::{DriverOptions, SessionDriver, SessionState, StreamSession};
use cloud_logstream::settings::{self, Settings};
use cloud_logstream::transport::WebSocketDialer;
use cloud_logstream::ui;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::warn;

fn main() -> Result<()> {
    let cli = Cli::parse();
    logstream::init_tracing(cli.verbose);

    let mut config = config::load();
    if let Some(max) = cli.max_entries {
        config.stream.max_entries = max;
    }
    if let Some(filter) = &cli.filter {
        regex::Regex::new(filter).with_context(|| format!("Invalid --filter /{}/", filter))?;
    }

    // Create tokio runtime
    let rt = tokio::runtime::Runtime::new()?;

    match &cli.command {
        Some(command) => rt.block_on(run_query(&config, command)),
        None if cli.headless => rt.block_on(run_headless(&cli, &config)),
        None => rt.block_on(run_tui(&cli, &config)),
    }
}

// ============================================================================
// One-shot queries
// ============================================================================

async fn run_query(config: &Config, command: &Command) -> Result<()> {
    let api = HttpCloudApi::new(&config.api, CorrelationTagger::new().handle())?;
    match command {
        Command::Sites => {
            let mut sites = api.list_sites().await?;
            sites.sort();
            for site in sites {
                println!("{}", site);
            }
        }
        Command::Envs { site } => {
            let mut envs = api.list_environments(site).await?;
            sort_environments(&mut envs);
            for env in envs {
                println!("{}", env);
            }
        }
    }
    Ok(())
}

// ============================================================================
// Streaming
// ============================================================================

fn build_driver(cli: &Cli, config: &Config) -> LiveDriver {
    let session = StreamSession::new(config.stream.max_entries, config.stream.idle_timeout());

    let api = match HttpCloudApi::new(&config.api, session.request_tagging()) {
        Ok(api) => Some(api),
        Err(e) => {
            warn!("{}", e);
            None
        }
    };

    let settings_path = match settings::settings_path() {
        Ok(path) => Some(path),
        Err(e) => {
            warn!("Settings will not be saved: {}", e);
            None
        }
    };
    let mut saved = settings_path
        .as_deref()
        .map(Settings::load_from)
        .unwrap_or_default();
    if let Some(site) = &cli.site {
        if *site != saved.sitename {
            saved.environment.clear();
        }
        saved.sitename = site.clone();
    }
    if let Some(env) = &cli.environment {
        saved.environment = env.clone();
    }
    if cli.only_mine {
        saved.onlyme = true;
    }
    if let Some(filter) = &cli.filter {
        saved.regex = filter.clone();
    }

    let options = DriverOptions {
        flush_interval: config.stream.flush_interval(),
        settings_path,
        domain: cli.domain.clone(),
    };
    SessionDriver::new(session, api, WebSocketDialer, saved, options)
}

async fn run_tui(cli: &Cli, config: &Config) -> Result<()> {
    let driver = build_driver(cli, config);
    let mut app = App::new(driver, config.ui.show_timestamps_utc);
    ui::run(&mut app).await?;
    Ok(())
}

async fn run_headless(cli: &Cli, config: &Config) -> Result<()> {
    let mut driver = build_driver(cli, config);
    let utc = config.ui.show_timestamps_utc;

    // Setup shutdown handler
    let shutdown = Arc::new(AtomicBool::new(false));
    spawn_signal_handler(shutdown.clone());

    driver.start();

    // Wait for the site and environment lists to settle on a target
    let deadline = Instant::now() + config.api.timeout();
    while driver.has_credentials() && !has_target(&driver) && Instant::now() < deadline {
        if shutdown.load(Ordering::SeqCst) {
            driver.shutdown();
            return Ok(());
        }
        print_batch(driver.poll(), utc);
        tokio::time::sleep(Duration::from_millis(50)).await;
    }

    driver.connect();
    loop {
        print_batch(driver.poll(), utc);
        if shutdown.load(Ordering::SeqCst) {
            driver.disconnect();
            break;
        }
        if matches!(
            driver.session().state(),
            SessionState::Idle | SessionState::Closed
        ) {
            break;
        }
        tokio::time::sleep(config.stream.flush_interval()).await;
    }

    print_batch(driver.flush(), utc);
    driver.shutdown();
    Ok(())
}

fn has_target(driver: &LiveDriver) -> bool {
    let session = driver.session();
    !session.site().is_empty() && !session.environment().is_empty()
}

fn print_batch(batch: Vec<LogMessage>, utc: bool) {
    for msg in batch {
        println!("{}", ui::widgets::log::plain_line(&msg, utc));
    }
}

fn spawn_signal_handler(shutdown: Arc<AtomicBool>) {
    #[cfg(unix)]
    {
        tokio::spawn(async move {
            use tokio::signal::unix::{signal, SignalKind};

            let (mut sigterm, mut sigint) =
                match (signal(SignalKind::terminate()), signal(SignalKind::interrupt())) {
                    (Ok(term), Ok(int)) => (term, int),
                    (Err(e), _) | (_, Err(e)) => {
                        warn!("Cannot install signal handlers: {}", e);
                        return;
                    }
                };

            tokio::select! {
                _ = sigterm.recv() => {},
                _ = sigint.recv() => {},
            }
            shutdown.store(true, Ordering::SeqCst);
        });
    }

    #[cfg(not(unix))]
    {
        tokio::spawn(async move {
            let _ = tokio::signal::ctrl_c().await;
            shutdown.store(true, Ordering::SeqCst);
        });
    }
}
