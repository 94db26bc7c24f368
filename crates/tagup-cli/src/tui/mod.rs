//! tagup TUI
//!
//! Live terminal view of the daily tag-up board.
//!
//! ## Layout
//!
//! - Top: Updates list, newest first, refreshed on every remote change
//! - Middle: Post form (Name, Site, Update)
//! - Bottom: Status bar
//!
//! ## Keys
//!
//! - Tab / Shift+Tab: Cycle form fields
//! - Enter: Post the update
//! - ↑/↓, PgUp/PgDn: Scroll the list
//! - Ctrl+R: Reload the list
//! - F1: Help
//! - Esc / Ctrl+C: Quit

mod app;
mod ui;

use std::fs::{self, File};
use std::io::stdout;

use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    ExecutableCommand,
};
use ratatui::prelude::*;
use tagup_core::{connection, Config, Controller, FeedEvent, ListView, Subscription};
use tracing::info;
use tracing_subscriber::EnvFilter;

use app::{App, RealtimeIndicator};

/// Run the TUI application
pub async fn run(config: Config) -> Result<()> {
    // Initialize TUI logging (file-based, only if TAGUP_LOG is set)
    init_tui_logging(&config);

    let client = connection::connect(&config);
    let controller = Controller::new(client.clone(), Some(ListView::new()), config.table.clone());
    let mut app = App::new(controller, config.author.clone());

    // Setup terminal
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    if !client.is_configured() {
        app.set_status("Supabase URL or anon key not configured. Live data features will not work.");
    }

    // Start listening before the first read so no change slips between them
    let subscription = if config.realtime_enabled && client.is_configured() {
        app.realtime = RealtimeIndicator::Connecting;
        Some(app.controller.subscribe(client.as_ref(), &config.schema))
    } else {
        None
    };

    terminal.draw(|frame| ui::draw(frame, &app))?;
    app.load().await;

    let result = run_app(&mut terminal, &mut app, subscription).await;

    // Restore terminal
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    result
}

async fn run_app<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    mut subscription: Option<Subscription>,
) -> Result<()> {
    loop {
        app.check_status_timeout();

        terminal.draw(|frame| ui::draw(frame, app))?;

        tokio::select! {
            biased;

            // Change notifications, one re-fetch each, in arrival order
            feed_event = async {
                if let Some(ref mut sub) = subscription {
                    sub.recv().await
                } else {
                    std::future::pending::<Option<FeedEvent>>().await
                }
            } => {
                match feed_event {
                    Some(event) => app.handle_feed_event(event).await,
                    None => {
                        // Task stopped; keep running without live updates
                        subscription = None;
                        app.realtime = RealtimeIndicator::Disabled;
                    }
                }
            }

            // Poll for terminal events
            _ = tokio::time::sleep(std::time::Duration::from_millis(50)) => {
                if event::poll(std::time::Duration::from_millis(0))? {
                    if let Event::Key(key) = event::read()? {
                        if key.kind != KeyEventKind::Press {
                            continue;
                        }

                        // If the alert is showing, any key dismisses it
                        if app.has_alert() {
                            app.dismiss_alert();
                            continue;
                        }

                        // If help is showing, any key dismisses it
                        if app.show_help {
                            app.show_help = false;
                            continue;
                        }

                        handle_key(terminal, app, key).await?;
                    }
                }
            }
        }

        if app.should_quit {
            if let Some(sub) = subscription.take() {
                sub.shutdown().await;
            }
            break;
        }
    }

    Ok(())
}

/// Handle a key press
async fn handle_key<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    key: KeyEvent,
) -> Result<()> {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

    match key.code {
        KeyCode::Esc => app.should_quit = true,
        KeyCode::Char('c') if ctrl => app.should_quit = true,

        KeyCode::Char('r') if ctrl => {
            app.reload().await;
        }

        KeyCode::F(1) => app.toggle_help(),

        // The key is consumed here; nothing else sees the submit
        KeyCode::Enter => {
            app.status_message = None;
            app.is_posting = true;
            terminal.draw(|frame| ui::draw(frame, app))?;
            app.submit().await;
        }

        KeyCode::Tab => app.next_field(),
        KeyCode::BackTab => app.prev_field(),

        KeyCode::Up => app.move_up(),
        KeyCode::Down => app.move_down(),
        KeyCode::PageUp => {
            for _ in 0..10 {
                app.move_up();
            }
        }
        KeyCode::PageDown => {
            for _ in 0..10 {
                app.move_down();
            }
        }

        KeyCode::Left => app.cursor_left(),
        KeyCode::Right => app.cursor_right(),
        KeyCode::Backspace => app.delete_char(),
        KeyCode::Char(c) if !ctrl => app.insert_char(c),

        _ => {}
    }

    Ok(())
}

/// Initialize logging for TUI mode
///
/// Only initializes if TAGUP_LOG environment variable is set.
/// Logs to file (config.log_file or the default data dir log).
fn init_tui_logging(config: &Config) {
    let Ok(log_level) = std::env::var("TAGUP_LOG") else {
        return;
    };

    let log_path = config.log_path();
    if let Some(parent) = log_path.parent() {
        let _ = fs::create_dir_all(parent);
    }

    let log_file = match File::create(&log_path) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("Warning: Could not create log file {:?}: {}", log_path, e);
            return;
        }
    };

    let env_filter = EnvFilter::new(format!("tagup_core={},tagup={}", log_level, log_level));

    // Ignore error if already initialized
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_ansi(false)
        .with_writer(log_file)
        .try_init();

    info!("TUI logging initialized to {:?}", log_path);
}
