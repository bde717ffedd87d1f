use crate::api::Article;
use crate::app::{App, Focus};
use crate::content::{source_kind, SourceKind};
use crate::filter::empty_message;
use crate::util::{display_width, single_line, truncate_to_width};
use crate::view::LayoutStyle;
use chrono::{DateTime, Utc};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
    Frame,
};

use super::style::{border, style, Role};

/// Format timestamp as relative time
pub fn format_relative_time(timestamp: Option<DateTime<Utc>>) -> String {
    let Some(ts) = timestamp else {
        return String::new();
    };
    format_relative_time_from(ts, Utc::now())
}

fn format_relative_time_from(ts: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let diff = (now - ts).num_seconds();

    // Future dates (clock skew, bad feeds)
    if diff < 0 {
        return "now".to_string();
    }
    if diff < 3600 {
        return format!("{}m", diff / 60);
    }
    if diff < 86400 {
        return format!("{}h", diff / 3600);
    }
    if diff < 604800 {
        return format!("{}d", diff / 86400);
    }
    ts.format("%b %d").to_string()
}

/// Leading markers: favorite, read later, and what kind of source.
fn markers(article: &Article, layout: LayoutStyle, playing: bool) -> Vec<Span<'static>> {
    let mut spans = Vec::new();
    if playing {
        spans.push(Span::styled("♪ ", style(Role::ReaderMedia)));
    } else if layout == LayoutStyle::Videos || source_kind(&article.link) == SourceKind::Video {
        spans.push(Span::styled("▶ ", style(Role::ArticleSource)));
    }
    if article.is_favorite {
        spans.push(Span::styled("★ ", style(Role::ArticleFlag)));
    }
    if article.is_read_later {
        spans.push(Span::styled("◷ ", style(Role::ArticleFlag)));
    }
    spans
}

fn title_style(article: &Article) -> ratatui::style::Style {
    if article.is_read {
        style(Role::ArticleRead)
    } else {
        style(Role::ArticleUnread)
    }
}

/// Source line under the title: feed, author, age.
fn meta_text(article: &Article) -> String {
    let mut parts: Vec<String> = Vec::new();
    if let Some(feed) = article.feed_title.as_deref().filter(|s| !s.is_empty()) {
        parts.push(single_line(feed));
    }
    if let Some(author) = article.author.as_deref().filter(|s| !s.is_empty()) {
        parts.push(format!("by {}", single_line(author)));
    }
    let age = format_relative_time(article.published_at());
    if !age.is_empty() {
        parts.push(age);
    }
    parts.join(" · ")
}

fn article_item(app: &App, article: &Article, layout: LayoutStyle, width: usize) -> ListItem<'static> {
    let mut spans = markers(article, layout, app.playing == Some(article.id));
    let used: usize = spans.iter().map(|s| s.width()).sum();
    let title = single_line(&article.title);

    match layout {
        // Compact: one line, source and age trailing.
        LayoutStyle::Threads => {
            let age = format_relative_time(article.published_at());
            let source = article
                .feed_title
                .as_deref()
                .map(single_line)
                .unwrap_or_default();
            let trailer = format!("  {} {}", source, age);
            let max_title = width.saturating_sub(used + display_width(&trailer));
            spans.push(Span::styled(
                truncate_to_width(&title, max_title.max(10)).into_owned(),
                title_style(article),
            ));
            spans.push(Span::styled(trailer, style(Role::ArticleMeta)));
            ListItem::new(Line::from(spans))
        }
        LayoutStyle::Standard | LayoutStyle::Videos | LayoutStyle::Default => {
            spans.push(Span::styled(
                truncate_to_width(&title, width.saturating_sub(used)).into_owned(),
                title_style(article),
            ));
            let meta = truncate_to_width(&meta_text(article), width.saturating_sub(2)).into_owned();
            ListItem::new(vec![
                Line::from(spans),
                Line::from(Span::styled(format!("  {}", meta), style(Role::ArticleMeta))),
            ])
        }
    }
}

fn panel_title(app: &App) -> String {
    let mut title = app.view.display_title(&app.data);
    if app.unread_only {
        title.push_str(" [unread]");
    }
    if app.smart_cap {
        title.push_str(" [capped]");
    }
    format!("{} · {}", title, app.sort_order.label())
}

/// Render the article list panel
pub fn render(f: &mut Frame, app: &App, area: Rect) {
    if area.width < 1 || area.height < 1 {
        return;
    }
    let is_focused = app.focus == Focus::Articles;

    let show_search = app.search_mode || !app.search_query.is_empty();
    let (search_area, list_area) = if show_search {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(1), Constraint::Min(0)])
            .split(area);
        (Some(chunks[0]), chunks[1])
    } else {
        (None, area)
    };

    if let Some(search_area) = search_area {
        let cursor = if app.search_mode { "_" } else { "" };
        let bar = Paragraph::new(format!("Search: {}{}", app.search_query, cursor))
            .style(style(Role::StatusBar));
        f.render_widget(bar, search_area);
    }

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border(is_focused))
        .title(panel_title(app));

    let articles = app.filtered();
    if articles.is_empty() {
        let message = empty_message(
            app.is_loading_articles,
            &app.search_query,
            !app.data.feeds.is_empty(),
        );
        let placeholder = Paragraph::new(message)
            .style(style(Role::ArticleMeta))
            .block(block);
        f.render_widget(placeholder, list_area);
        return;
    }

    let layout = app.layout_mode();
    let width = list_area.width.saturating_sub(2) as usize;
    let mut items: Vec<ListItem> = articles
        .iter()
        .map(|article| article_item(app, article, layout, width))
        .collect();

    if app.has_next_page {
        let footer = if app.is_loading_articles {
            "Loading more..."
        } else {
            "More articles below"
        };
        items.push(ListItem::new(Span::styled(footer, style(Role::ArticleMeta))));
    }

    let mut list = List::new(items).block(block);
    if is_focused {
        list = list.highlight_style(style(Role::Selected));
    }

    let mut state = ListState::default().with_selected(Some(app.selected_article));
    f.render_stateful_widget(list, list_area, &mut state);
}
