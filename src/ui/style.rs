//! Semantic style roles for the TUI.
//!
//! Widgets ask for a role instead of hardcoding colors so the palette
//! stays in one place.

use ratatui::style::{Color, Modifier, Style};

/// Every visual element that carries its own style.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Role {
    // -- Sidebar --
    SidebarHeader,
    SidebarActive,
    SidebarRemoved,
    SidebarMarked,

    // -- Article list --
    ArticleUnread,
    ArticleRead,
    ArticleMeta,
    ArticleFlag,
    ArticleSource,

    // -- Selection shared by every list --
    Selected,

    // -- Reader --
    ReaderTitle,
    ReaderMeta,
    ReaderBody,
    ReaderMedia,

    // -- Chrome --
    StatusBar,
    PanelBorder,
    PanelBorderFocused,
    DialogError,
    DialogHint,
}

pub(super) fn style(role: Role) -> Style {
    match role {
        Role::SidebarHeader => Style::default()
            .fg(Color::DarkGray)
            .add_modifier(Modifier::BOLD),
        Role::SidebarActive => Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD),
        Role::SidebarRemoved => Style::default()
            .fg(Color::DarkGray)
            .add_modifier(Modifier::CROSSED_OUT),
        Role::SidebarMarked => Style::default().fg(Color::Yellow),

        Role::ArticleUnread => Style::default().add_modifier(Modifier::BOLD),
        Role::ArticleRead => Style::default().fg(Color::Gray),
        Role::ArticleMeta => Style::default().fg(Color::DarkGray),
        Role::ArticleFlag => Style::default().fg(Color::Yellow),
        Role::ArticleSource => Style::default().fg(Color::Cyan),

        Role::Selected => Style::default().bg(Color::DarkGray).fg(Color::White),

        Role::ReaderTitle => Style::default().add_modifier(Modifier::BOLD),
        Role::ReaderMeta => Style::default().fg(Color::DarkGray),
        Role::ReaderBody => Style::default(),
        Role::ReaderMedia => Style::default().fg(Color::Blue),

        Role::StatusBar => Style::default().bg(Color::DarkGray).fg(Color::White),
        Role::PanelBorder => Style::default(),
        Role::PanelBorderFocused => Style::default().fg(Color::Cyan),
        Role::DialogError => Style::default().fg(Color::Red),
        Role::DialogHint => Style::default().fg(Color::DarkGray),
    }
}

pub(super) fn border(focused: bool) -> Style {
    if focused {
        style(Role::PanelBorderFocused)
    } else {
        style(Role::PanelBorder)
    }
}
