use crate::app::{App, Focus, SidebarItem};
use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState},
    Frame,
};

use super::style::{border, style, Role};

fn disclosure(open: bool) -> &'static str {
    if open {
        "▾ "
    } else {
        "▸ "
    }
}

fn row<'a>(app: &App, item: &SidebarItem) -> Line<'a> {
    let indent = "  ".repeat(item.depth());
    let label = app.sidebar_label(item);

    let base = if app.sidebar_item_is_active(item) {
        style(Role::SidebarActive)
    } else {
        match item {
            SidebarItem::Header(_) => style(Role::SidebarHeader),
            SidebarItem::RemovedFeed(_) | SidebarItem::RemovedStream(_) => {
                style(Role::SidebarRemoved)
            }
            _ => style(Role::ReaderBody),
        }
    };

    let mut spans = vec![Span::raw(indent)];
    match item {
        SidebarItem::Header(section) => {
            let open = !app.collapsed_sections.contains(section);
            spans.push(Span::styled(disclosure(open), base));
        }
        SidebarItem::Category(id) => {
            spans.push(Span::styled(disclosure(app.open_categories.contains(id)), base));
        }
        SidebarItem::Stream(id) => {
            spans.push(Span::styled(disclosure(app.open_streams.contains(id)), base));
        }
        SidebarItem::Feed { feed_id, .. } => {
            let moving = app.move_mode.as_ref().is_some_and(|m| m.feed_id == *feed_id);
            if moving {
                spans.push(Span::styled("» ", style(Role::SidebarMarked)));
            } else if app.selected_feed_ids.contains(feed_id) {
                spans.push(Span::styled("✓ ", style(Role::SidebarMarked)));
            } else {
                spans.push(Span::raw("  "));
            }
        }
        _ => {}
    }
    spans.push(Span::styled(label, base));
    Line::from(spans)
}

/// Render the sidebar: top-level views, categories, streams, removed items.
pub fn render(f: &mut Frame, app: &App, area: Rect) {
    if area.width < 1 || area.height < 1 {
        return;
    }
    let is_focused = app.focus == Focus::Sidebar;

    let items = app.sidebar_items();
    let list_items: Vec<ListItem> = items
        .iter()
        .map(|item| ListItem::new(row(app, item)))
        .collect();

    let title = match (&app.move_mode, app.selected_feed_ids.len()) {
        (Some(state), _) => format!("Move \"{}\" to...", state.title),
        (None, 0) => "Feeds".to_string(),
        (None, n) => format!("Feeds ({} selected)", n),
    };

    let mut list = List::new(list_items).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(border(is_focused))
            .title(title),
    );
    if is_focused {
        list = list.highlight_style(style(Role::Selected));
    }

    let mut state = ListState::default().with_selected(Some(app.sidebar_selected));
    f.render_stateful_widget(list, area, &mut state);
}
