//! Modal dialogs drawn over the browse screen.
//!
//! Every dialog is a bordered paragraph centered on the frame with the
//! background cleared. Only one is open at a time; input routing in
//! `input.rs` decides which.

use crate::api::Mutation;
use crate::app::{
    AddForm, App, AssignDialog, AssignRow, EditModal, EditRow, EditTarget, PathAction, PathPrompt,
};
use crate::util::{single_line, truncate_to_width};
use ratatui::{
    layout::{Alignment, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use super::style::{style, Role};

/// Centered overlay no larger than `width` x `height`, leaving a margin.
/// `None` if the frame is too small to draw anything legible.
pub(super) fn overlay_rect(area: Rect, width: u16, height: u16) -> Option<Rect> {
    let width = width.min(area.width.saturating_sub(4));
    let height = height.min(area.height.saturating_sub(4));
    if width < 20 || height < 5 {
        return None;
    }
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    Some(Rect::new(x, y, width, height))
}

fn draw(f: &mut Frame, lines: Vec<Line<'_>>, title: String, width: u16, alignment: Alignment) {
    // +2 for borders
    let height = (lines.len() as u16).saturating_add(2);
    let Some(overlay) = overlay_rect(f.area(), width, height) else {
        return;
    };

    f.render_widget(Clear, overlay);
    let paragraph = Paragraph::new(lines)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(style(Role::PanelBorderFocused))
                .title(title),
        )
        .alignment(alignment)
        .wrap(Wrap { trim: false })
        .style(style(Role::ReaderBody));
    f.render_widget(paragraph, overlay);
}

fn error_line(error: &Option<String>) -> Option<Line<'static>> {
    error
        .as_ref()
        .map(|e| Line::from(Span::styled(e.clone(), style(Role::DialogError))))
}

fn hint(text: &'static str) -> Line<'static> {
    Line::from(Span::styled(text, style(Role::DialogHint)))
}

fn cursor_prefix(selected: bool) -> &'static str {
    if selected {
        "> "
    } else {
        "  "
    }
}

fn checkbox(checked: bool) -> &'static str {
    if checked {
        "[x]"
    } else {
        "[ ]"
    }
}

// ============================================================================
// Confirmation
// ============================================================================

pub(super) fn render_confirm(f: &mut Frame, mutation: &Mutation) {
    let prompt = mutation.confirm_prompt().unwrap_or("Are you sure?");
    let lines = vec![
        Line::from(prompt),
        Line::from(""),
        hint("(y) Confirm  (n/Esc) Cancel"),
    ];
    draw(f, lines, " Confirm ".to_string(), 50, Alignment::Center);
}

// ============================================================================
// Add feed / category / stream
// ============================================================================

pub(super) fn render_add_form(f: &mut Frame, app: &App, form: &AddForm) {
    let mut lines = Vec::new();
    if let Some(category) = form.category_id.and_then(|id| app.data.category(id)) {
        lines.push(Line::from(format!("Into category: {}", single_line(&category.name))));
        lines.push(Line::from(""));
    }

    if form.input.is_empty() && !form.submitting {
        lines.push(Line::from(vec![
            Span::raw("> "),
            Span::styled(form.kind.placeholder(), style(Role::DialogHint)),
        ]));
    } else {
        lines.push(Line::from(format!("> {}_", form.input)));
    }
    lines.push(Line::from(""));

    if let Some(line) = error_line(&form.error) {
        lines.push(line);
        lines.push(Line::from(""));
    }
    lines.push(if form.submitting {
        hint("Saving...")
    } else {
        hint("(Enter) Add  (Esc) Cancel")
    });

    draw(
        f,
        lines,
        format!(" {} ", form.kind.title()),
        60,
        Alignment::Left,
    );
}

// ============================================================================
// Edit settings
// ============================================================================

fn edit_row_line(app: &App, modal: &EditModal, row: EditRow, selected: bool) -> Line<'static> {
    let prefix = cursor_prefix(selected);
    let text = match row {
        EditRow::Name => {
            let cursor = if selected { "_" } else { "" };
            format!("{}Name:   {}{}", prefix, modal.name, cursor)
        }
        EditRow::Layout => format!("{}Layout: < {} >", prefix, modal.layout_style.as_str()),
        EditRow::ExcludeAll => {
            let label = match modal.target {
                EditTarget::Category(_) => "Exclude every feed from All",
                _ => "Exclude from All",
            };
            format!("{}{} {}", prefix, checkbox(modal.exclude_all), label)
        }
        EditRow::Feed(id) => {
            let title = app
                .data
                .feed(id)
                .map(|f| single_line(&f.title))
                .unwrap_or_else(|| format!("Feed {}", id));
            let excluded = modal.feed_states.get(&id).copied().unwrap_or(false);
            format!("{}  {} {}", prefix, checkbox(excluded), title)
        }
    };
    if selected {
        Line::from(Span::styled(text, style(Role::Selected)))
    } else {
        Line::from(text)
    }
}

pub(super) fn render_edit_modal(f: &mut Frame, app: &App, modal: &EditModal) {
    let area = f.area();
    let width = 64u16;
    let inner = width.min(area.width.saturating_sub(4)).saturating_sub(2) as usize;

    let mut lines = Vec::new();
    if let Some(url) = &modal.url {
        lines.push(Line::from(Span::styled(
            truncate_to_width(&format!("URL: {}", url), inner).into_owned(),
            style(Role::DialogHint),
        )));
        lines.push(Line::from(""));
    }

    let rows = modal.rows();
    // Long member lists scroll with the cursor.
    let room = (area.height.saturating_sub(14) as usize).max(3);
    let skip = modal.cursor.saturating_sub(room.saturating_sub(1));
    lines.extend(
        rows.iter()
            .enumerate()
            .skip(skip)
            .take(room)
            .map(|(i, row)| edit_row_line(app, modal, *row, i == modal.cursor)),
    );
    lines.push(Line::from(""));

    if let Some(line) = error_line(&modal.error) {
        lines.push(line);
        lines.push(Line::from(""));
    }
    lines.push(if modal.submitting {
        hint("Saving...")
    } else {
        hint("(Up/Down) Move  (Space) Toggle  (Enter) Save  (Esc) Cancel")
    });

    let title = match modal.target {
        EditTarget::Global(_) => format!(" View settings: {} ", modal.current_name),
        _ => format!(" Edit {} ", single_line(&modal.current_name)),
    };
    draw(f, lines, title, width, Alignment::Left);
}

// ============================================================================
// Bulk assign
// ============================================================================

pub(super) fn render_assign(f: &mut Frame, app: &App, dialog: &AssignDialog) {
    let rows = AssignDialog::rows(&app.data);

    let mut lines = vec![
        Line::from(format!(
            "Assign {} selected feed(s)",
            app.selected_feed_ids.len()
        )),
        Line::from(""),
    ];

    let mut streams_started = false;
    for (i, row) in rows.iter().enumerate() {
        let selected = i == dialog.cursor;
        let prefix = cursor_prefix(selected);
        let text = match row {
            AssignRow::NoCategory => format!(
                "{}({}) No category",
                prefix,
                if dialog.category_id.is_none() { "*" } else { " " }
            ),
            AssignRow::Category(id) => {
                let name = app
                    .data
                    .category(*id)
                    .map(|c| single_line(&c.name))
                    .unwrap_or_default();
                let mark = if dialog.category_id == Some(*id) { "*" } else { " " };
                format!("{}({}) {}", prefix, mark, name)
            }
            AssignRow::Stream(id) => {
                if !streams_started {
                    streams_started = true;
                    lines.push(Line::from(Span::styled(
                        "Streams",
                        style(Role::SidebarHeader),
                    )));
                }
                let name = app
                    .data
                    .stream(*id)
                    .map(|s| single_line(&s.name))
                    .unwrap_or_default();
                format!(
                    "{}{} {}",
                    prefix,
                    checkbox(dialog.stream_ids.contains(id)),
                    name
                )
            }
        };
        lines.push(if selected {
            Line::from(Span::styled(text, style(Role::Selected)))
        } else {
            Line::from(text)
        });
    }
    lines.push(Line::from(""));

    if let Some(line) = error_line(&dialog.error) {
        lines.push(line);
        lines.push(Line::from(""));
    }
    lines.push(hint("(Space) Pick  (Enter) Assign  (Esc) Cancel"));

    draw(f, lines, " Assign Feeds ".to_string(), 50, Alignment::Left);
}

// ============================================================================
// OPML path prompt
// ============================================================================

pub(super) fn render_path_prompt(f: &mut Frame, prompt: &PathPrompt) {
    let (title, label) = match prompt.action {
        PathAction::Import => (" Import OPML ", "File to import:"),
        PathAction::Export => (" Export OPML ", "Save to:"),
    };

    let mut lines = vec![
        Line::from(label),
        Line::from(""),
        Line::from(format!("> {}_", prompt.input)),
        Line::from(""),
    ];
    if let Some(line) = error_line(&prompt.error) {
        lines.push(line);
        lines.push(Line::from(""));
    }
    lines.push(hint("(Enter) Start  (Esc) Cancel"));

    draw(f, lines, title.to_string(), 60, Alignment::Left);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overlay_rect_centers_and_caps() {
        let area = Rect::new(0, 0, 100, 40);
        let rect = overlay_rect(area, 50, 10).unwrap();
        assert_eq!(rect, Rect::new(25, 15, 50, 10));

        let small = Rect::new(0, 0, 30, 12);
        let rect = overlay_rect(small, 60, 20).unwrap();
        assert_eq!((rect.width, rect.height), (26, 8));
    }

    #[test]
    fn test_overlay_rect_rejects_tiny_frames() {
        assert!(overlay_rect(Rect::new(0, 0, 20, 8), 50, 10).is_none());
    }
}
