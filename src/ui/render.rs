//! Render functions for the TUI.
//!
//! Draws the active screen, then whichever overlay is open on top.

use crate::app::{App, Screen};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    widgets::Paragraph,
    Frame,
};

use super::{articles, dialogs, help, reader, sidebar, status};

/// Minimum terminal dimensions required for normal operation.
pub(super) const MIN_WIDTH: u16 = 60;
pub(super) const MIN_HEIGHT: u16 = 10;

/// Main render dispatch function.
pub(super) fn render(f: &mut Frame, app: &mut App) {
    let area = f.area();

    // Nothing meaningful fits at zero size.
    if area.width < 1 || area.height < 1 {
        return;
    }

    if area.width < MIN_WIDTH || area.height < MIN_HEIGHT {
        let msg = if area.height < 3 || area.width < 20 {
            Paragraph::new("Too small")
        } else {
            Paragraph::new(format!(
                "Terminal too small\n\nMinimum: {}x{}\nCurrent: {}x{}",
                MIN_WIDTH, MIN_HEIGHT, area.width, area.height
            ))
            .alignment(Alignment::Center)
        };
        f.render_widget(msg, area);
        return;
    }

    match app.screen {
        Screen::Browse => render_browse(f, app),
        Screen::Reader => render_reader(f, app),
    }

    // Overlays, lowest first. Input routing gives the topmost one the keys.
    if let Some(dialog) = &app.assign {
        dialogs::render_assign(f, app, dialog);
    }
    if let Some(modal) = &app.edit_modal {
        dialogs::render_edit_modal(f, app, modal);
    }
    if let Some(form) = &app.add_form {
        dialogs::render_add_form(f, app, form);
    }
    if let Some(prompt) = &app.path_prompt {
        dialogs::render_path_prompt(f, prompt);
    }
    if let Some(mutation) = &app.pending_confirm {
        dialogs::render_confirm(f, mutation);
    }
    if app.show_help {
        help::render(f, app);
    }
}

/// Sidebar and article list over the status bar.
fn render_browse(f: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(1)])
        .split(f.area());

    render_main_panels(f, app, chunks[0]);
    status::render(f, app, chunks[1]);
}

fn render_main_panels(f: &mut Frame, app: &App, area: Rect) {
    let main_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(30), Constraint::Percentage(70)])
        .split(area);

    sidebar::render(f, app, main_chunks[0]);
    articles::render(f, app, main_chunks[1]);
}

/// Render the reader view (article content + status bar).
fn render_reader(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(1)])
        .split(f.area());

    reader::render(f, app, chunks[0]);
    status::render(f, app, chunks[1]);
}
