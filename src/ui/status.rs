use crate::app::{App, Screen};
use crate::keybindings::{Action, Context};
use ratatui::{layout::Rect, widgets::Paragraph, Frame};
use std::borrow::Cow;

use super::style::{style, Role};

/// `[key] label` pairs for the hint line, skipping unbound actions.
fn hints(app: &App, context: Context, pairs: &[(Action, &str)]) -> String {
    pairs
        .iter()
        .filter_map(|(action, label)| {
            app.keybindings
                .key_for(*action, context)
                .map(|key| format!("[{}] {}", key, label))
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Render the status bar
pub fn render(f: &mut Frame, app: &App, area: Rect) {
    if area.width < 1 || area.height < 1 {
        return;
    }

    let text: Cow<'_, str> = if let Some((msg, _)) = &app.status_message {
        Cow::Borrowed(msg.as_ref())
    } else if app.is_refreshing {
        Cow::Borrowed("Refreshing feeds...")
    } else if let Some(state) = &app.move_mode {
        Cow::Owned(format!(
            "Moving \"{}\": pick a category or stream, Enter to drop, Esc to cancel",
            state.title
        ))
    } else if app.search_mode {
        Cow::Borrowed("Type to search | ESC clear | ENTER keep")
    } else {
        match app.screen {
            Screen::Browse => {
                let mut line = hints(
                    app,
                    Context::Global,
                    &[
                        (Action::RefreshAll, "refresh"),
                        (Action::EnterSearch, "search"),
                        (Action::AddFeed, "add"),
                        (Action::ToggleUnreadOnly, "unread"),
                        (Action::CycleFocus, "switch"),
                        (Action::ShowHelp, "help"),
                        (Action::Quit, "quit"),
                    ],
                );
                if !app.selected_feed_ids.is_empty() {
                    line = format!("{} selected | {}", app.selected_feed_ids.len(), line);
                }
                Cow::Owned(line)
            }
            Screen::Reader => Cow::Owned(hints(
                app,
                Context::Reader,
                &[
                    (Action::ExitReader, "back"),
                    (Action::NextArticle, "next"),
                    (Action::PreviousArticle, "prev"),
                    (Action::ToggleFavorite, "fav"),
                    (Action::OpenInBrowser, "open"),
                    (Action::PlayMedia, "play"),
                ],
            )),
        }
    };

    let paragraph = Paragraph::new(text).style(style(Role::StatusBar));
    f.render_widget(paragraph, area);
}
