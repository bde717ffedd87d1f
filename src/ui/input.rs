//! Input handling for the TUI.
//!
//! Keys go to the topmost layer first: help, confirmation, path prompt, add
//! form, edit dialog, assign dialog, search bar, then the active screen.

use crate::api::Mutation;
use crate::app::{
    AddKind, App, AppEvent, AssignDialog, EditOutcome, EditRow, Focus, Opened, PathAction,
    PathPrompt, Screen, SidebarOutcome,
};
use crate::keybindings::{Action as KbAction, Context as KbContext};
use crate::transfer::expand_path;
use anyhow::Result;
use crossterm::event::{KeyCode, KeyModifiers};
use tokio::sync::mpsc;

use super::helpers::{
    copy_link, open_link, spawn_export, spawn_import, spawn_mutation, spawn_page_load,
    spawn_page_load_opt, spawn_playback, spawn_pref_save, spawn_refresh,
};
use super::Action;

/// Rows moved by PageUp/PageDown in lists.
const LIST_PAGE: usize = 10;

/// Longest text accepted in a dialog input.
const MAX_INPUT_LENGTH: usize = 2048;

fn focus_to_context(focus: Focus) -> KbContext {
    match focus {
        Focus::Sidebar => KbContext::Sidebar,
        Focus::Articles => KbContext::ArticleList,
    }
}

/// Main input dispatch function.
pub(super) fn handle_input(
    app: &mut App,
    code: KeyCode,
    modifiers: KeyModifiers,
    event_tx: &mpsc::Sender<AppEvent>,
) -> Result<Action> {
    if app.show_help {
        return Ok(handle_help_input(app, code));
    }
    if app.pending_confirm.is_some() {
        handle_confirm_input(app, code, event_tx);
        return Ok(Action::Continue);
    }
    if app.path_prompt.is_some() {
        handle_path_prompt_input(app, code, event_tx);
        return Ok(Action::Continue);
    }
    if app.add_form.is_some() {
        handle_add_form_input(app, code, modifiers, event_tx);
        return Ok(Action::Continue);
    }
    if app.edit_modal.is_some() {
        handle_edit_input(app, code, modifiers, event_tx);
        return Ok(Action::Continue);
    }
    if app.assign.is_some() {
        handle_assign_input(app, code, event_tx);
        return Ok(Action::Continue);
    }
    if app.search_mode {
        handle_search_input(app, code, modifiers);
        return Ok(Action::Continue);
    }

    match app.screen {
        Screen::Browse => handle_browse_input(app, code, modifiers, event_tx),
        Screen::Reader => handle_reader_input(app, code, modifiers, event_tx),
    }
}

/// Apply a plain text-editing key to `input`. Returns true if it changed.
fn edit_text(input: &mut String, code: KeyCode, modifiers: KeyModifiers) -> bool {
    match code {
        KeyCode::Char(c) if !modifiers.contains(KeyModifiers::CONTROL) => {
            if input.len() + c.len_utf8() > MAX_INPUT_LENGTH {
                return false;
            }
            input.push(c);
            true
        }
        KeyCode::Backspace => input.pop().is_some(),
        _ => false,
    }
}

/// Send a mutation now, or park it for confirmation if it is destructive.
fn send_mutation(app: &mut App, mutation: Mutation, event_tx: &mpsc::Sender<AppEvent>) {
    if let Some(mutation) = app.request_mutation(mutation) {
        spawn_mutation(app, mutation, event_tx);
    }
}

/// Start the side effects of opening an article.
fn handle_opened(app: &mut App, opened: Option<Opened>, event_tx: &mpsc::Sender<AppEvent>) {
    let Some(opened) = opened else {
        return;
    };
    if let Some(mutation) = opened.mark_read {
        spawn_mutation(app, mutation, event_tx);
    }
    if let Some(play) = opened.play {
        spawn_playback(app, play, event_tx);
    }
}

// ============================================================================
// Overlays
// ============================================================================

/// Captures all keys: j/k/Up/Down scroll, Esc/q/? dismiss.
fn handle_help_input(app: &mut App, code: KeyCode) -> Action {
    match code {
        KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('?') => {
            app.show_help = false;
            app.help_scroll_offset = 0;
        }
        KeyCode::Char('j') | KeyCode::Down => {
            app.help_scroll_offset = app.help_scroll_offset.saturating_add(1);
        }
        KeyCode::Char('k') | KeyCode::Up => {
            app.help_scroll_offset = app.help_scroll_offset.saturating_sub(1);
        }
        _ => {}
    }
    Action::Continue
}

/// y/Enter confirms, n/Esc cancels, everything else is ignored.
fn handle_confirm_input(app: &mut App, code: KeyCode, event_tx: &mpsc::Sender<AppEvent>) {
    match code {
        KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
            if let Some(mutation) = app.confirm_pending() {
                tracing::info!(path = %mutation.path(), "Confirmed destructive action");
                spawn_mutation(app, mutation, event_tx);
            }
        }
        KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => app.cancel_pending(),
        _ => {}
    }
}

fn handle_path_prompt_input(app: &mut App, code: KeyCode, event_tx: &mpsc::Sender<AppEvent>) {
    let Some(mut prompt) = app.path_prompt.take() else {
        return;
    };
    match code {
        KeyCode::Esc => return,
        KeyCode::Enter => {
            if prompt.input.trim().is_empty() {
                prompt.error = Some("Enter a file path".to_string());
            } else {
                let path = expand_path(&prompt.input);
                match prompt.action {
                    PathAction::Import => spawn_import(app, path, event_tx),
                    PathAction::Export => spawn_export(app, path, event_tx),
                }
                return;
            }
        }
        other => {
            if edit_text(&mut prompt.input, other, KeyModifiers::NONE) {
                prompt.error = None;
            }
        }
    }
    app.path_prompt = Some(prompt);
}

fn handle_add_form_input(
    app: &mut App,
    code: KeyCode,
    modifiers: KeyModifiers,
    event_tx: &mpsc::Sender<AppEvent>,
) {
    let Some(mut form) = app.add_form.take() else {
        return;
    };
    match code {
        KeyCode::Esc => return,
        KeyCode::Enter if !form.submitting => {
            if let Some(mutation) = form.submit() {
                tracing::debug!(path = %mutation.path(), "Submitting add form");
                spawn_mutation(app, mutation, event_tx);
            }
        }
        other if !form.submitting => {
            if edit_text(&mut form.input, other, modifiers) {
                form.error = None;
            }
        }
        _ => {}
    }
    app.add_form = Some(form);
}

fn handle_edit_input(
    app: &mut App,
    code: KeyCode,
    modifiers: KeyModifiers,
    event_tx: &mpsc::Sender<AppEvent>,
) {
    let Some(modal) = app.edit_modal.as_mut() else {
        return;
    };
    if modal.submitting {
        if code == KeyCode::Esc {
            app.edit_modal = None;
        }
        return;
    }

    match code {
        KeyCode::Esc => app.edit_modal = None,
        KeyCode::Down | KeyCode::Tab => modal.move_cursor(true),
        KeyCode::Up | KeyCode::BackTab => modal.move_cursor(false),
        KeyCode::Enter => match app.submit_edit() {
            Some(EditOutcome::Persist(key, value)) => spawn_pref_save(app, key, value, event_tx),
            Some(EditOutcome::Send(mutation)) => spawn_mutation(app, mutation, event_tx),
            None => {}
        },
        KeyCode::Left | KeyCode::Right if modal.current_row() == Some(EditRow::Layout) => {
            modal.layout_style = modal.layout_style.next();
        }
        other => {
            if modal.current_row() == Some(EditRow::Name) {
                if edit_text(&mut modal.name, other, modifiers) {
                    modal.error = None;
                }
            } else if other == KeyCode::Char(' ') {
                modal.toggle_current();
            }
        }
    }
}

fn handle_assign_input(app: &mut App, code: KeyCode, event_tx: &mpsc::Sender<AppEvent>) {
    let rows = AssignDialog::rows(&app.data);
    let Some(dialog) = app.assign.as_mut() else {
        return;
    };
    match code {
        KeyCode::Esc => app.assign = None,
        KeyCode::Char('j') | KeyCode::Down => {
            dialog.cursor = (dialog.cursor + 1).min(rows.len().saturating_sub(1));
        }
        KeyCode::Char('k') | KeyCode::Up => dialog.cursor = dialog.cursor.saturating_sub(1),
        KeyCode::Char(' ') => {
            if let Some(row) = rows.get(dialog.cursor) {
                dialog.toggle(*row);
                dialog.error = None;
            }
        }
        KeyCode::Enter => {
            if let Some(mutation) = app.submit_assign() {
                spawn_mutation(app, mutation, event_tx);
            }
        }
        _ => {}
    }
}

/// Typing goes to the query; Esc clears it, Enter keeps it.
fn handle_search_input(app: &mut App, code: KeyCode, modifiers: KeyModifiers) {
    match code {
        KeyCode::Char(c) if !modifiers.contains(KeyModifiers::CONTROL) => app.push_search_char(c),
        KeyCode::Backspace => app.pop_search_char(),
        _ => match app.keybindings.action_for_key(code, modifiers, KbContext::Search) {
            Some(KbAction::ExitSearch) => app.exit_search(),
            Some(KbAction::CommitSearch) => app.commit_search(),
            _ => {}
        },
    }
}

// ============================================================================
// Screens
// ============================================================================

/// Actions that behave the same on both screens. Returns false if `action`
/// is not one of them.
fn handle_shared_action(
    app: &mut App,
    action: KbAction,
    event_tx: &mpsc::Sender<AppEvent>,
) -> bool {
    match action {
        KbAction::RefreshAll => spawn_refresh(app, false, event_tx),
        KbAction::ShowHelp => {
            app.show_help = true;
            app.help_scroll_offset = 0;
        }
        KbAction::ToggleFavorite => {
            if let Some(mutation) = app.toggle_favorite_target() {
                send_mutation(app, mutation, event_tx);
            }
        }
        KbAction::ToggleReadLater => {
            if let Some(mutation) = app.toggle_read_later_target() {
                send_mutation(app, mutation, event_tx);
            }
        }
        KbAction::OpenInBrowser => {
            if let Some(link) = app.action_article().map(|a| a.link.clone()) {
                if link.trim().is_empty() {
                    app.set_status("Article has no link");
                } else {
                    open_link(app, &link);
                }
            }
        }
        KbAction::CopyLink => {
            if app.action_article().is_some() {
                match app.copy_link_target() {
                    Some(link) => copy_link(app, &link),
                    None => app.set_status("Article has no link"),
                }
            }
        }
        KbAction::PlayMedia => {
            if let Some(request) = app.play_current() {
                spawn_playback(app, request, event_tx);
            }
        }
        KbAction::ViewAuthor => match app.view_author() {
            Some(request) => spawn_page_load(app, request, event_tx),
            None => app.set_status("No author for this article"),
        },
        _ => return false,
    }
    true
}

fn handle_browse_input(
    app: &mut App,
    code: KeyCode,
    modifiers: KeyModifiers,
    event_tx: &mpsc::Sender<AppEvent>,
) -> Result<Action> {
    let context = focus_to_context(app.focus);
    let Some(action) = app.keybindings.action_for_key(code, modifiers, context) else {
        return Ok(Action::Continue);
    };
    if handle_shared_action(app, action, event_tx) {
        return Ok(Action::Continue);
    }

    match action {
        KbAction::Quit => return Ok(Action::Quit),
        KbAction::Back => {
            if app.move_mode.take().is_some() {
                app.set_status("Move cancelled");
            } else if !app.selected_feed_ids.is_empty() {
                app.selected_feed_ids.clear();
                app.set_status("Selection cleared");
            } else if !app.search_query.is_empty() {
                app.exit_search();
            }
        }
        KbAction::NavDown => {
            let request = app.nav_down();
            spawn_page_load_opt(app, request, event_tx);
        }
        KbAction::NavUp => app.nav_up(),
        KbAction::PageDown => {
            let request = app.page_down(LIST_PAGE);
            spawn_page_load_opt(app, request, event_tx);
        }
        KbAction::PageUp => app.page_up(LIST_PAGE),
        KbAction::CycleFocus => app.cycle_focus(),
        KbAction::Select => match app.focus {
            Focus::Sidebar => match app.activate_sidebar() {
                SidebarOutcome::Load(request) => spawn_page_load(app, request, event_tx),
                SidebarOutcome::Send(mutation) => send_mutation(app, mutation, event_tx),
                SidebarOutcome::None => {}
            },
            Focus::Articles => {
                let opened = app.open_article(app.selected_article);
                handle_opened(app, opened, event_tx);
            }
        },
        KbAction::EnterSearch => app.enter_search(),
        KbAction::ToggleSort => app.toggle_sort(),
        KbAction::ToggleUnreadOnly => {
            let request = app.toggle_unread_only();
            spawn_page_load(app, request, event_tx);
        }
        KbAction::ToggleSmartCap => {
            let (request, (key, value)) = app.toggle_smart_cap();
            spawn_page_load(app, request, event_tx);
            spawn_pref_save(app, key, value, event_tx);
        }
        KbAction::AddFeed => app.open_add_form(AddKind::Feed),
        KbAction::AddCategory => app.open_add_form(AddKind::Category),
        KbAction::AddStream => app.open_add_form(AddKind::Stream),
        KbAction::ImportOpml => {
            app.path_prompt = Some(PathPrompt {
                action: PathAction::Import,
                input: String::new(),
                error: None,
            });
        }
        KbAction::ExportOpml => {
            app.path_prompt = Some(PathPrompt {
                action: PathAction::Export,
                input: "volumeread-export.opml".to_string(),
                error: None,
            });
        }

        // Sidebar
        KbAction::ToggleCollapse => app.toggle_collapse(),
        KbAction::ToggleFeedSelection => app.toggle_feed_selection(),
        KbAction::AssignSelected => app.open_assign(),
        KbAction::MoveFeed => app.start_move(),
        KbAction::EditEntry => app.open_edit(),
        KbAction::DeleteEntry => {
            if let Some(mutation) = app.delete_target() {
                send_mutation(app, mutation, event_tx);
            }
        }
        KbAction::RestoreEntry => match app.restore_target() {
            Some(mutation) => send_mutation(app, mutation, event_tx),
            None => app.set_status("Nothing to restore here"),
        },

        // Article list
        KbAction::MarkAllRead => {
            let mutation = app.mark_all_read_target();
            send_mutation(app, mutation, event_tx);
        }
        KbAction::ViewSettings => app.open_view_settings(),

        _ => {}
    }
    Ok(Action::Continue)
}

fn handle_reader_input(
    app: &mut App,
    code: KeyCode,
    modifiers: KeyModifiers,
    event_tx: &mpsc::Sender<AppEvent>,
) -> Result<Action> {
    let Some(action) = app
        .keybindings
        .action_for_key(code, modifiers, KbContext::Reader)
    else {
        return Ok(Action::Continue);
    };
    if handle_shared_action(app, action, event_tx) {
        return Ok(Action::Continue);
    }

    let page = app.reader_visible_lines.saturating_sub(2).max(1);
    match action {
        KbAction::Quit => return Ok(Action::Quit),
        KbAction::ExitReader | KbAction::Back => {
            app.stop_playback();
            app.exit_reader();
        }
        KbAction::ScrollDown | KbAction::NavDown => app.scroll_down(1),
        KbAction::ScrollUp | KbAction::NavUp => app.scroll_up(1),
        KbAction::PageDown => app.scroll_down(page),
        KbAction::PageUp => app.scroll_up(page),
        KbAction::NextArticle => {
            let opened = app.next_article();
            if opened.is_none() {
                app.set_status("Last article");
            }
            handle_opened(app, opened, event_tx);
        }
        KbAction::PreviousArticle => {
            let opened = app.previous_article();
            if opened.is_none() {
                app.set_status("First article");
            }
            handle_opened(app, opened, event_tx);
        }
        _ => {}
    }
    app.clamp_reader_scroll();
    Ok(Action::Continue)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{ApiClient, AppData, Article, ArticlesPage, Feed};
    use crate::config::Config;
    use crate::keybindings::KeybindingRegistry;
    use crate::preferences::PreferenceManager;
    use crate::view::ViewKind;
    use std::time::Duration;

    fn test_app() -> App {
        let api = ApiClient::new("http://reader.test:5000", Duration::from_secs(5)).unwrap();
        App::new(
            api,
            None,
            PreferenceManager::from_config(&Config::default()),
            KeybindingRegistry::new(),
            None,
        )
    }

    fn press(app: &mut App, tx: &mpsc::Sender<AppEvent>, code: KeyCode) -> Action {
        handle_input(app, code, KeyModifiers::NONE, tx).unwrap()
    }

    #[tokio::test]
    async fn test_quit_from_browse() {
        let mut app = test_app();
        let (tx, _rx) = mpsc::channel(8);
        assert!(matches!(press(&mut app, &tx, KeyCode::Char('q')), Action::Quit));
    }

    #[tokio::test]
    async fn test_search_typing_does_not_trigger_actions() {
        let mut app = test_app();
        let (tx, _rx) = mpsc::channel(8);
        press(&mut app, &tx, KeyCode::Char('/'));
        assert!(app.search_mode);
        for c in "quit".chars() {
            assert!(matches!(press(&mut app, &tx, KeyCode::Char(c)), Action::Continue));
        }
        assert_eq!(app.search_query, "quit");

        press(&mut app, &tx, KeyCode::Enter);
        assert!(!app.search_mode);
        assert_eq!(app.search_query, "quit");

        // Esc in browse clears a committed query.
        press(&mut app, &tx, KeyCode::Esc);
        assert!(app.search_query.is_empty());
    }

    #[tokio::test]
    async fn test_mark_all_read_asks_first() {
        let mut app = test_app();
        let (tx, _rx) = mpsc::channel(8);
        app.focus = Focus::Articles;
        press(&mut app, &tx, KeyCode::Char('M'));
        assert!(matches!(
            app.pending_confirm,
            Some(Mutation::MarkAllRead {
                view_type: ViewKind::All,
                ..
            })
        ));

        // Other keys are swallowed while the prompt is up.
        press(&mut app, &tx, KeyCode::Char('q'));
        assert!(app.pending_confirm.is_some());

        press(&mut app, &tx, KeyCode::Esc);
        assert!(app.pending_confirm.is_none());
    }

    #[tokio::test]
    async fn test_add_form_typing_and_validation() {
        let mut app = test_app();
        let (tx, _rx) = mpsc::channel(8);
        press(&mut app, &tx, KeyCode::Char('c'));
        assert!(app.add_form.is_some());

        // 'q' is text here, not Quit.
        press(&mut app, &tx, KeyCode::Char('q'));
        press(&mut app, &tx, KeyCode::Backspace);
        press(&mut app, &tx, KeyCode::Enter);
        assert_eq!(
            app.add_form.as_ref().unwrap().error.as_deref(),
            Some("Name is required")
        );

        press(&mut app, &tx, KeyCode::Esc);
        assert!(app.add_form.is_none());
    }

    #[tokio::test]
    async fn test_edit_name_row_takes_space_as_text() {
        let mut app = test_app();
        let (tx, _rx) = mpsc::channel(8);
        app.apply_app_data(
            1,
            Ok(AppData {
                feeds: vec![Feed {
                    id: 4,
                    title: "Blog".into(),
                    ..Feed::default()
                }],
                ..AppData::default()
            }),
        );
        app.edit_modal = Some(crate::app::EditModal::for_feed(app.data.feed(4).unwrap()));

        press(&mut app, &tx, KeyCode::Char(' '));
        press(&mut app, &tx, KeyCode::Char('X'));
        assert_eq!(app.edit_modal.as_ref().unwrap().name, "Blog X");

        // Exclude row: Space toggles.
        press(&mut app, &tx, KeyCode::Down);
        press(&mut app, &tx, KeyCode::Down);
        press(&mut app, &tx, KeyCode::Char(' '));
        assert!(app.edit_modal.as_ref().unwrap().exclude_all);
    }

    #[tokio::test]
    async fn test_reader_navigation_keys() {
        let mut app = test_app();
        let (tx, _rx) = mpsc::channel(8);
        let request = app.set_view(ViewKind::All, None, None);
        let articles = vec![
            Article {
                id: 1,
                title: "first".into(),
                published: Some("2024-02-02T00:00:00".into()),
                is_read: true,
                ..Article::default()
            },
            Article {
                id: 2,
                title: "second".into(),
                published: Some("2024-02-01T00:00:00".into()),
                is_read: true,
                ..Article::default()
            },
        ];
        app.apply_articles_page(
            request.generation,
            1,
            Ok(ArticlesPage {
                articles,
                ..ArticlesPage::default()
            }),
        );
        app.focus = Focus::Articles;

        press(&mut app, &tx, KeyCode::Enter);
        assert_eq!(app.screen, Screen::Reader);
        press(&mut app, &tx, KeyCode::Char('n'));
        assert_eq!(app.reader.as_ref().unwrap().article.id, 2);
        press(&mut app, &tx, KeyCode::Char('p'));
        assert_eq!(app.reader.as_ref().unwrap().article.id, 1);
        press(&mut app, &tx, KeyCode::Esc);
        assert_eq!(app.screen, Screen::Browse);
    }
}
