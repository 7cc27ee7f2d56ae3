//! Terminal UI using ratatui
//!
//! Thin layer responsible only for terminal I/O. All business logic
//! is delegated to App via handle_key() and handle_scroll().

pub mod theme;
pub mod widgets;

use crate::app::App;
use crate::cloud::CloudApi;
use crate::constants::FRAME_DURATION_MS;
use crate::error::{Result, StreamError};
use crate::transport::Dialer;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyEventKind, MouseEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Layout},
    Frame, Terminal,
};
use std::io;
use std::time::Duration;
use widgets::{actions::ActionsWidget, log::LogWidget, status::StatusWidget};

/// Map io::Error to StreamError::Runtime
fn map_io_err(e: io::Error) -> StreamError {
    StreamError::Runtime { source: e }
}

/// Run the TUI event loop
pub async fn run<A: CloudApi, D: Dialer>(app: &mut App<A, D>) -> Result<()> {
    // Setup terminal
    enable_raw_mode().map_err(map_io_err)?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture).map_err(map_io_err)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).map_err(map_io_err)?;

    let result = event_loop(&mut terminal, app).await;

    // Restore terminal even when the loop failed
    app.quit();
    disable_raw_mode().map_err(map_io_err)?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )
    .map_err(map_io_err)?;
    terminal.show_cursor().map_err(map_io_err)?;

    result
}

async fn event_loop<A: CloudApi, D: Dialer>(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App<A, D>,
) -> Result<()> {
    loop {
        // Drain transport/API events and flush new messages
        app.poll();

        // Draw UI
        terminal.draw(|f| draw(f, app)).map_err(map_io_err)?;

        // Handle input with timeout
        if event::poll(Duration::from_millis(FRAME_DURATION_MS)).map_err(map_io_err)? {
            match event::read().map_err(map_io_err)? {
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    if app.handle_key(key) {
                        break;
                    }
                }
                Event::Mouse(mouse) => match mouse.kind {
                    MouseEventKind::ScrollUp => app.handle_scroll(true),
                    MouseEventKind::ScrollDown => app.handle_scroll(false),
                    _ => {}
                },
                _ => {}
            }
        }

        if app.should_quit() {
            break;
        }

        // Let spawned API and transport tasks make progress
        tokio::task::yield_now().await;
    }
    Ok(())
}

fn draw<A: CloudApi, D: Dialer>(frame: &mut Frame, app: &App<A, D>) {
    let chunks = Layout::vertical([
        Constraint::Length(7), // Status widget
        Constraint::Min(5),    // Log widget
        Constraint::Length(3), // Actions widget
    ])
    .split(frame.area());

    let state = app.state();

    frame.render_widget(StatusWidget::new(&state), chunks[0]);

    let log = LogWidget::new(
        app.messages(),
        app.registry(),
        app.scroll_position(),
        state.show_utc,
    )
    .selected_category(app.category_cursor());
    frame.render_widget(log, chunks[1]);

    frame.render_widget(ActionsWidget::new(&state), chunks[2]);
}
