use crate::app::{App, MAX_SCROLL};
use crate::util::{single_line, truncate_to_width};
use ratatui::{
    layout::Rect,
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use super::style::{style, Role};

pub fn render(f: &mut Frame, app: &mut App, area: Rect) {
    if area.width < 3 || area.height < 3 {
        return;
    }

    // Remember the viewport so scrolling can clamp against it.
    app.reader_visible_lines = area.height.saturating_sub(2) as usize;
    app.reader_viewport_width = area.width.saturating_sub(2) as usize;
    app.clamp_reader_scroll();

    let Some(reader) = app.reader.as_ref() else {
        let paragraph = Paragraph::new("No article selected")
            .block(Block::default().borders(Borders::ALL).title("Reader"));
        f.render_widget(paragraph, area);
        return;
    };
    let article = &reader.article;
    let width = app.reader_viewport_width;

    let mut meta: Vec<String> = Vec::new();
    if let Some(feed) = article.feed_title.as_deref().filter(|s| !s.is_empty()) {
        meta.push(single_line(feed));
    }
    if let Some(author) = article.author.as_deref().filter(|s| !s.is_empty()) {
        meta.push(format!("by {}", single_line(author)));
    }
    if let Some(published) = article.published_at() {
        meta.push(published.format("%Y-%m-%d %H:%M").to_string());
    }
    if article.is_favorite {
        meta.push("★".to_string());
    }
    if article.is_read_later {
        meta.push("read later".to_string());
    }

    // Header lines are truncated, never wrapped, so the header stays three rows.
    let title = single_line(&article.title);
    let header = vec![
        Line::from(Span::styled(
            truncate_to_width(&title, width).into_owned(),
            style(Role::ReaderTitle),
        )),
        Line::from(Span::styled(
            truncate_to_width(&meta.join(" · "), width).into_owned(),
            style(Role::ReaderMeta),
        )),
        Line::from(""),
    ];

    let body = reader
        .lines
        .iter()
        .map(|line| Line::from(Span::styled(line.clone(), style(Role::ReaderBody))));
    let text = Text::from_iter(header.into_iter().chain(body));

    let block_title = match (&reader.embed, app.playing == Some(article.id)) {
        (Some(embed), true) => format!(" Article · {} · playing ", embed.provider.name()),
        (Some(embed), false) => format!(" Article · {} ", embed.provider.name()),
        (None, _) => " Article ".to_string(),
    };

    let paragraph = Paragraph::new(text)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(Span::styled(block_title, style(Role::ReaderMedia))),
        )
        .wrap(Wrap { trim: false })
        .scroll((app.scroll_offset.min(MAX_SCROLL) as u16, 0));

    f.render_widget(paragraph, area);
}
