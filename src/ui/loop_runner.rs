//! Main event loop for the TUI.
//!
//! Multiplexes terminal input, background task events, the auto-refresh
//! timer and a periodic tick.

use crate::app::{App, AppEvent};
use crate::config::MAX_REFRESH_INTERVAL_MINUTES;
use anyhow::Result;
use crossterm::{
    event::Event,
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use futures::StreamExt;
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io::{self, Stdout};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{Instant, Interval, MissedTickBehavior};

#[cfg(unix)]
use tokio::signal::unix::{signal, SignalKind};

use super::events::handle_app_event;
use super::helpers::{spawn_initial_load, spawn_refresh};
use super::input::handle_input;
use super::render::render;

/// Result of handling a key press event.
pub enum Action {
    /// Continue the event loop and process more events.
    Continue,
    /// Exit the application and restore the terminal.
    Quit,
}

/// Timer for the server-wide refresh. `None` when the interval is 0.
/// Intervals longer than a week are capped to a week.
fn auto_refresh_timer(minutes: u64) -> Option<Interval> {
    if minutes == 0 {
        return None;
    }
    let period = Duration::from_secs(minutes.min(MAX_REFRESH_INTERVAL_MINUTES) * 60);
    // First tick one period from now, not immediately.
    let start = Instant::now().checked_add(period)?;
    let mut interval = tokio::time::interval_at(start, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    Some(interval)
}

async fn next_auto_refresh(timer: &mut Option<Interval>) {
    match timer {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending::<()>().await,
    }
}

/// Runs the TUI application event loop.
///
/// Starts the initial load, then serves until the user quits or a signal
/// arrives. A panic hook restores the terminal before unwinding.
pub async fn run(
    app: &mut App,
    event_tx: mpsc::Sender<AppEvent>,
    mut event_rx: mpsc::Receiver<AppEvent>,
) -> Result<()> {
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        original_hook(panic_info);
    }));

    let mut terminal = setup_terminal()?;
    let mut event_stream = crossterm::event::EventStream::new();

    let mut tick_interval = tokio::time::interval(Duration::from_millis(250));
    let refresh_minutes = app.prefs.refresh_interval();
    let mut refresh_timer = auto_refresh_timer(refresh_minutes);
    tracing::info!(refresh_minutes, "Starting event loop");

    #[cfg(unix)]
    let mut sigterm = signal(SignalKind::terminate())?;
    #[cfg(unix)]
    let mut sigint = signal(SignalKind::interrupt())?;

    spawn_initial_load(app, &event_tx);

    loop {
        if app.needs_redraw {
            terminal.draw(|f| render(f, app))?;
            app.needs_redraw = false;
        }

        if app.clear_expired_status() {
            app.needs_redraw = true;
        }

        // Drain pending background results before waiting on input so a
        // burst of typing cannot starve them.
        while let Ok(event) = event_rx.try_recv() {
            app.needs_redraw = true;
            handle_app_event(app, event, &event_tx);
        }

        #[cfg(unix)]
        let sigterm_fut = sigterm.recv();
        #[cfg(not(unix))]
        let sigterm_fut = std::future::pending::<Option<()>>();

        #[cfg(unix)]
        let sigint_fut = sigint.recv();
        #[cfg(not(unix))]
        let sigint_fut = std::future::pending::<Option<()>>();

        tokio::select! {
            biased;

            _ = sigterm_fut => {
                tracing::info!("Received SIGTERM, shutting down gracefully");
                break;
            }

            _ = sigint_fut => {
                tracing::info!("Received SIGINT, shutting down gracefully");
                break;
            }

            maybe_event = event_stream.next() => {
                match maybe_event {
                    Some(Ok(Event::Key(key))) => {
                        app.needs_redraw = true;
                        match handle_input(app, key.code, key.modifiers, &event_tx) {
                            Ok(Action::Quit) => break,
                            Ok(Action::Continue) => {}
                            Err(e) => app.set_status(format!("Error: {}", e)),
                        }
                    }
                    Some(Ok(Event::Resize(_, _))) => app.needs_redraw = true,
                    Some(Err(e)) => {
                        tracing::error!(error = %e, "Terminal event stream failed");
                        break;
                    }
                    None => break,
                    _ => {}
                }
            }

            Some(event) = event_rx.recv() => {
                app.needs_redraw = true;
                handle_app_event(app, event, &event_tx);
            }

            _ = next_auto_refresh(&mut refresh_timer) => {
                tracing::debug!("Auto refresh timer fired");
                app.needs_redraw = true;
                spawn_refresh(app, true, &event_tx);
            }

            _ = tick_interval.tick() => {}
        }
    }

    app.stop_playback();
    restore_terminal(terminal)?;
    Ok(())
}

/// Set up the terminal for TUI rendering.
fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend)?;
    Ok(terminal)
}

/// Restore terminal to normal state.
fn restore_terminal(mut terminal: Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_interval_disables_timer() {
        assert!(auto_refresh_timer(0).is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_huge_interval_is_capped() {
        let mut timer = auto_refresh_timer(u64::MAX / 60);
        assert!(timer.is_some());
        let week = Duration::from_secs(MAX_REFRESH_INTERVAL_MINUTES * 60);
        let fired = tokio::time::timeout(week + Duration::from_secs(1), next_auto_refresh(&mut timer)).await;
        assert!(fired.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_timer_waits_a_full_period() {
        let mut timer = auto_refresh_timer(1);
        let fired = tokio::time::timeout(Duration::from_secs(59), next_auto_refresh(&mut timer)).await;
        assert!(fired.is_err());
        let fired = tokio::time::timeout(Duration::from_secs(2), next_auto_refresh(&mut timer)).await;
        assert!(fired.is_ok());
    }
}
