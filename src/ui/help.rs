//! Key reference overlay.
//!
//! Screen keys come from the live registry, so config and preference
//! overrides show up here. Dialog keys are fixed and listed as-is.

use crate::app::App;
use crate::keybindings::{Action, Context, KeybindingRegistry};
use ratatui::{
    layout::Alignment,
    style::Modifier,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use super::dialogs::overlay_rect;
use super::style::{style, Role};

const KEY_COLUMN: usize = 16;
const WIDTH: u16 = 68;

const SECTIONS: [(Context, &str); 5] = [
    (Context::Global, "Everywhere"),
    (Context::Sidebar, "Sidebar"),
    (Context::ArticleList, "Articles"),
    (Context::Reader, "Reader"),
    (Context::Search, "Search"),
];

/// Keys handled directly by the dialog layer, not remappable.
const DIALOG_KEYS: [(&str, &[(&str, &str)]); 5] = [
    (
        "Confirm",
        &[("y / Enter", "Go ahead"), ("n / Esc", "Cancel")],
    ),
    (
        "Add form, file prompt",
        &[("Enter", "Submit"), ("Esc", "Cancel")],
    ),
    (
        "Edit settings",
        &[
            ("Tab / Down", "Next row"),
            ("S-Tab / Up", "Previous row"),
            ("Left / Right", "Change layout style"),
            ("Space", "Toggle checkbox"),
            ("Enter", "Save"),
            ("Esc", "Close without saving"),
        ],
    ),
    (
        "Assign feeds",
        &[
            ("j / k", "Move"),
            ("Space", "Pick destination"),
            ("Enter", "Assign"),
            ("Esc", "Cancel"),
        ],
    ),
    (
        "This overlay",
        &[("j / k", "Scroll"), ("? / q / Esc", "Close")],
    ),
];

fn heading(text: &str) -> Line<'static> {
    Line::from(Span::styled(
        text.to_string(),
        style(Role::SidebarHeader).add_modifier(Modifier::BOLD),
    ))
}

fn entry(keys: &str, label: &str) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("  {:<width$}", keys, width = KEY_COLUMN), style(Role::ReaderMeta)),
        Span::raw(label.to_string()),
    ])
}

/// One line per action and context, all keys bound to it joined with " / ".
fn context_entries(registry: &KeybindingRegistry, context: Context) -> Vec<(String, Action)> {
    let mut entries: Vec<(String, Action)> = Vec::new();
    for (ctx, key, action, _) in registry.all_bindings() {
        if ctx != context {
            continue;
        }
        match entries.iter_mut().find(|(_, a)| *a == action) {
            Some((keys, _)) => {
                keys.push_str(" / ");
                keys.push_str(&key);
            }
            None => entries.push((key, action)),
        }
    }
    entries
}

pub(super) fn help_lines(registry: &KeybindingRegistry) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    for (context, title) in SECTIONS {
        let entries = context_entries(registry, context);
        if entries.is_empty() {
            continue;
        }
        lines.push(heading(title));
        lines.extend(
            entries
                .iter()
                .map(|(keys, action)| entry(keys, action.describe())),
        );
        lines.push(Line::default());
    }
    for (title, keys) in DIALOG_KEYS {
        lines.push(heading(title));
        lines.extend(keys.iter().map(|(k, label)| entry(k, label)));
        lines.push(Line::default());
    }
    lines.pop();
    lines
}

pub fn render(f: &mut Frame, app: &App) {
    let area = f.area();
    let lines = help_lines(&app.keybindings);
    let wanted = (lines.len() as u16).saturating_add(2);
    let Some(overlay) = overlay_rect(area, WIDTH, wanted.min(area.height.saturating_sub(4))) else {
        return;
    };

    let visible = overlay.height.saturating_sub(2) as usize;
    let max_scroll = lines.len().saturating_sub(visible);
    let scroll = app.help_scroll_offset.min(max_scroll);
    let title = if max_scroll > 0 {
        format!(" Keys {}/{} ", scroll + 1, max_scroll + 1)
    } else {
        " Keys ".to_string()
    };

    f.render_widget(Clear, overlay);
    let paragraph = Paragraph::new(lines)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(style(Role::PanelBorderFocused))
                .title(title)
                .title_bottom(Line::from(" ? to close ").alignment(Alignment::Right)),
        )
        .scroll((scroll.min(u16::MAX as usize) as u16, 0));
    f.render_widget(paragraph, overlay);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn text(lines: &[Line]) -> Vec<String> {
        lines
            .iter()
            .map(|l| l.spans.iter().map(|s| s.content.as_ref()).collect::<String>())
            .collect()
    }

    #[test]
    fn test_keys_for_one_action_share_a_line() {
        let lines = text(&help_lines(&KeybindingRegistry::new()));
        let next = lines
            .iter()
            .find(|l| l.ends_with("Next article"))
            .unwrap();
        assert!(next.contains("n / Right"), "{}", next);
    }

    #[test]
    fn test_overrides_are_listed() {
        let mut registry = KeybindingRegistry::new();
        let overrides = HashMap::from([("refresh".to_string(), "F5".to_string())]);
        assert!(registry.apply_overrides(&overrides).is_empty());

        let lines = text(&help_lines(&registry));
        let refresh = lines
            .iter()
            .find(|l| l.ends_with("Refresh all feeds"))
            .unwrap();
        assert!(refresh.contains("F5"), "{}", refresh);
    }

    #[test]
    fn test_dialog_keys_follow_screen_sections() {
        let lines = text(&help_lines(&KeybindingRegistry::new()));
        let search = lines.iter().position(|l| l == "Search").unwrap();
        let edit = lines.iter().position(|l| l == "Edit settings").unwrap();
        assert!(search < edit);
        assert!(lines.iter().any(|l| l.contains("Left / Right") && l.ends_with("Change layout style")));
        assert_ne!(lines.last().map(String::as_str), Some(""));
    }
}
