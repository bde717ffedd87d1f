//! Background task event processing.

use crate::app::{App, AppEvent};
use tokio::sync::mpsc;

use super::helpers::{spawn_mutation, spawn_page_load_opt, spawn_playback, spawn_refresh};

/// Handle application events from background tasks.
///
/// Each handler re-checks the generation or sequence it carries before
/// touching state; the `App` methods drop anything stale.
pub(super) fn handle_app_event(app: &mut App, event: AppEvent, event_tx: &mpsc::Sender<AppEvent>) {
    match event {
        AppEvent::AppDataLoaded {
            seq,
            result,
            initial,
        } => {
            if initial {
                app.is_refreshing = false;
                if let Err(e) = &result {
                    tracing::error!(error = %e, "Initial load failed");
                    app.set_status(format!("Could not reach server: {}", e));
                }
            }
            app.apply_app_data(seq, result);
        }
        AppEvent::ArticlesLoaded {
            generation,
            page,
            result,
        } => {
            app.apply_articles_page(generation, page, result);
        }
        AppEvent::RefreshFinished {
            auto,
            summary,
            snapshot,
        } => {
            let reload = app.finish_refresh(auto, summary, snapshot);
            spawn_page_load_opt(app, reload, event_tx);
        }
        AppEvent::MutationFinished { mutation, result } => {
            let reload = app.apply_mutation_result(&mutation, result);
            spawn_page_load_opt(app, reload, event_tx);
        }
        AppEvent::ImportFinished(result) => match result {
            Ok(message) => {
                tracing::info!(message = %message, "OPML import complete");
                app.set_status(message);
                spawn_refresh(app, true, event_tx);
            }
            Err(error) => {
                tracing::error!(error = %error, "OPML import failed");
                app.set_status(error);
            }
        },
        AppEvent::ExportFinished(result) => match result {
            Ok(message) => app.set_status(message),
            Err(error) => {
                tracing::error!(error = %error, "OPML export failed");
                app.set_status(error);
            }
        },
        AppEvent::PlaybackFinished {
            article_id,
            generation,
            success,
        } => {
            tracing::debug!(article_id, generation, success, "Player exited");
            if let Some(opened) = app.on_playback_finished(article_id, generation, success) {
                if let Some(mutation) = opened.mark_read {
                    spawn_mutation(app, mutation, event_tx);
                }
                if let Some(play) = opened.play {
                    spawn_playback(app, play, event_tx);
                }
            }
        }
        AppEvent::PreferenceSaveFailed { key, error } => {
            tracing::warn!(key = %key, error = %error, "Preference not saved");
            app.set_status(format!("Could not save setting: {}", error));
        }
        AppEvent::TaskPanicked { task, error } => {
            tracing::error!(task, error, "Background task panicked");
            app.release_task_guards(task);
            app.set_status(format!("Internal error in {} task", task));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{ApiClient, ApiError, AppData, ArticlesPage, Mutation, Resynced};
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

    #[tokio::test]
    async fn test_initial_load_failure_sets_status() {
        let mut app = test_app();
        let (tx, _rx) = mpsc::channel(8);
        app.is_refreshing = true;
        handle_app_event(
            &mut app,
            AppEvent::AppDataLoaded {
                seq: 1,
                result: Err(ApiError::Decode("not json".into())),
                initial: true,
            },
            &tx,
        );
        assert!(!app.is_refreshing);
        let status = app.status_message.as_ref().map(|(m, _)| m.to_string());
        assert!(status.unwrap().starts_with("Could not reach server"));
    }

    #[tokio::test]
    async fn test_articles_loaded_routes_to_pagination() {
        let mut app = test_app();
        let (tx, _rx) = mpsc::channel(8);
        let request = app.set_view(ViewKind::All, None, None);
        handle_app_event(
            &mut app,
            AppEvent::ArticlesLoaded {
                generation: request.generation,
                page: 1,
                result: Ok(ArticlesPage {
                    has_next: true,
                    ..ArticlesPage::default()
                }),
            },
            &tx,
        );
        assert_eq!(app.current_page, 2);
        assert!(app.has_next_page);
    }

    #[tokio::test]
    async fn test_mark_all_read_success_spawns_reload() {
        let mut app = test_app();
        let (tx, _rx) = mpsc::channel(8);
        let mutation = app.mark_all_read_target();
        let before = app.page_generation;
        handle_app_event(
            &mut app,
            AppEvent::MutationFinished {
                mutation,
                result: Ok(Resynced {
                    response: serde_json::json!({"success": true}),
                    seq: 1,
                    snapshot: Ok(AppData::default()),
                }),
            },
            &tx,
        );
        assert_eq!(app.page_generation, before + 1);
        assert!(app.is_loading_articles);
    }

    #[tokio::test]
    async fn test_panicked_refresh_releases_guard() {
        let mut app = test_app();
        let (tx, _rx) = mpsc::channel(8);
        assert!(app.begin_refresh(false));
        handle_app_event(
            &mut app,
            AppEvent::TaskPanicked {
                task: "refresh",
                error: "boom".into(),
            },
            &tx,
        );
        assert!(!app.is_refreshing);
        assert!(app.begin_refresh(true));
    }

    #[tokio::test]
    async fn test_panicked_page_load_allows_next_load() {
        let mut app = test_app();
        let (tx, _rx) = mpsc::channel(8);
        app.set_view(ViewKind::All, None, None);
        assert!(app.is_loading_articles);
        handle_app_event(
            &mut app,
            AppEvent::TaskPanicked {
                task: "page_load",
                error: "boom".into(),
            },
            &tx,
        );
        assert!(!app.is_loading_articles);
        let status = app.status_message.as_ref().map(|(m, _)| m.to_string());
        assert_eq!(status.as_deref(), Some("Internal error in page_load task"));
    }

    #[tokio::test]
    async fn test_mark_read_failure_is_silent() {
        let mut app = test_app();
        let (tx, _rx) = mpsc::channel(8);
        handle_app_event(
            &mut app,
            AppEvent::MutationFinished {
                mutation: Mutation::MarkRead(3),
                result: Err(ApiError::Domain("gone".into())),
            },
            &tx,
        );
        assert!(app.status_message.is_none());
    }
}
