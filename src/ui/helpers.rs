//! Background task spawning shared by input and event handling.
//!
//! Every network or file operation runs in a spawned task that reports
//! back through an [`AppEvent`]. The event loop is the only place `App` is
//! mutated.

use crate::api::{ApiError, Mutation};
use crate::app::{App, AppEvent, PageRequest, PlayRequest};
use crate::transfer;
use crate::util::validate_url_for_open;
use anyhow::{anyhow, Result};
use copypasta::{ClipboardContext, ClipboardProvider};
use futures::FutureExt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::sync::mpsc;

/// Wraps a future to catch panics and convert them to errors.
///
/// A panic inside a spawned task would otherwise vanish into the runtime.
/// Here it becomes `Err(message)` so the UI can report it.
///
/// # Returns
///
/// - `Ok(result)` if the future completes normally
/// - `Err(panic_message)` if the future panics
pub(super) async fn catch_task_panic<F, T>(future: F) -> Result<T, String>
where
    F: Future<Output = T>,
{
    AssertUnwindSafe(future)
        .catch_unwind()
        .await
        .map_err(|panic| {
            if let Some(s) = panic.downcast_ref::<&'static str>() {
                s.to_string()
            } else if let Some(s) = panic.downcast_ref::<String>() {
                s.clone()
            } else if let Some(e) = panic.downcast_ref::<Box<dyn std::error::Error + Send>>() {
                e.to_string()
            } else {
                format!("Unknown panic: {:?}", (*panic).type_id())
            }
        })
}

/// Spawn `work` and forward the event it produces. A panic is reported as
/// [`AppEvent::TaskPanicked`] instead.
fn spawn_reporting<F>(
    task: &'static str,
    tx: &mpsc::Sender<AppEvent>,
    work: F,
) -> tokio::task::JoinHandle<()>
where
    F: Future<Output = AppEvent> + Send + 'static,
{
    let tx = tx.clone();
    tokio::spawn(async move {
        let event = match catch_task_panic(work).await {
            Ok(event) => event,
            Err(panic_msg) => {
                tracing::error!(task, error = %panic_msg, "Background task panicked");
                AppEvent::TaskPanicked {
                    task,
                    error: panic_msg,
                }
            }
        };
        if let Err(e) = tx.send(event).await {
            tracing::warn!(error = %e, task, "Channel send failed (receiver dropped)");
        }
    })
}

/// Fetch one page of articles.
pub(super) fn spawn_page_load(app: &App, request: PageRequest, tx: &mpsc::Sender<AppEvent>) {
    let api = app.api.clone();
    spawn_reporting("page_load", tx, async move {
        let result = api.fetch_articles(&request.query).await;
        AppEvent::ArticlesLoaded {
            generation: request.generation,
            page: request.query.page,
            result,
        }
    });
}

/// Same as [`spawn_page_load`] for call sites holding an optional request.
pub(super) fn spawn_page_load_opt(
    app: &App,
    request: Option<PageRequest>,
    tx: &mpsc::Sender<AppEvent>,
) {
    if let Some(request) = request {
        spawn_page_load(app, request, tx);
    }
}

/// Startup: pull the snapshot and page 1 of "All".
pub(super) fn spawn_initial_load(app: &mut App, tx: &mpsc::Sender<AppEvent>) {
    app.is_refreshing = true;
    let api = app.api.clone();
    let seq = app.data_seq.next();
    spawn_reporting("initial_load", tx, async move {
        AppEvent::AppDataLoaded {
            seq,
            result: api.fetch_app_data().await,
            initial: true,
        }
    });
    let request = app.reload_first_page();
    spawn_page_load(app, request, tx);
}

/// Refresh all feeds on the server, then resync. Dropped if one is running.
pub(super) fn spawn_refresh(app: &mut App, auto: bool, tx: &mpsc::Sender<AppEvent>) {
    if !app.begin_refresh(auto) {
        return;
    }
    let api = app.api.clone();
    let data_seq = app.data_seq.clone();
    tracing::info!(auto, "Refreshing all feeds");
    spawn_reporting("refresh", tx, async move {
        let summary = api.refresh_all_feeds().await;
        let snapshot = match &summary {
            Err(ApiError::Network(_)) => None,
            _ => {
                let seq = data_seq.next();
                Some((seq, api.fetch_app_data().await))
            }
        };
        AppEvent::RefreshFinished {
            auto,
            summary,
            snapshot,
        }
    });
}

/// Send a mutation and resync the snapshot once on success.
pub(super) fn spawn_mutation(app: &App, mutation: Mutation, tx: &mpsc::Sender<AppEvent>) {
    let api = app.api.clone();
    let data_seq = app.data_seq.clone();
    spawn_reporting("mutation", tx, async move {
        let result = api.mutate_then_resync(&mutation, &data_seq).await;
        AppEvent::MutationFinished { mutation, result }
    });
}

/// Persist a local preference. The in-memory map was already updated.
pub(super) fn spawn_pref_save(
    app: &App,
    key: String,
    value: String,
    tx: &mpsc::Sender<AppEvent>,
) {
    let Some(db) = app.db.clone() else {
        tracing::debug!(key = %key, "No preference store, keeping value in memory");
        return;
    };
    let tx = tx.clone();
    tokio::spawn(async move {
        if let Err(e) = db.set_preference(&key, &value).await {
            tracing::warn!(key = %key, error = %e, "Failed to save preference");
            if let Err(e) = tx
                .send(AppEvent::PreferenceSaveFailed {
                    key,
                    error: e.to_string(),
                })
                .await
            {
                tracing::warn!(error = %e, event = "PreferenceSaveFailed", "Channel send failed (receiver dropped)");
            }
        }
    });
}

pub(super) fn spawn_import(app: &mut App, path: PathBuf, tx: &mpsc::Sender<AppEvent>) {
    let api = app.api.clone();
    app.set_status("Importing OPML...");
    spawn_reporting("import", tx, async move {
        let result = transfer::import_file(&api, &path)
            .await
            .map_err(|e| format!("Import failed: {:#}", e));
        AppEvent::ImportFinished(result)
    });
}

pub(super) fn spawn_export(app: &mut App, path: PathBuf, tx: &mpsc::Sender<AppEvent>) {
    let api = app.api.clone();
    app.set_status("Exporting OPML...");
    spawn_reporting("export", tx, async move {
        let result = transfer::export_file(&api, &path)
            .await
            .map(|bytes| format!("Exported {} bytes to {}", bytes, path.display()))
            .map_err(|e| format!("Export failed: {:#}", e));
        AppEvent::ExportFinished(result)
    });
}

/// Launch the external player on `request.url`, replacing any running one.
/// The child is killed when the task is aborted.
pub(super) fn spawn_playback(app: &mut App, request: PlayRequest, tx: &mpsc::Sender<AppEvent>) {
    let Some(argv) = app.player.clone().filter(|argv| !argv.is_empty()) else {
        return;
    };
    if let Some(handle) = app.playback_handle.take() {
        handle.abort();
        tracing::debug!("Aborted previous playback task");
    }

    tracing::info!(article_id = request.article_id, url = %request.url, "Starting playback");
    let PlayRequest {
        article_id,
        generation,
        url,
    } = request;
    app.playback_handle = Some(spawn_reporting("playback", tx, async move {
        let status = tokio::process::Command::new(&argv[0])
            .args(&argv[1..])
            .arg(&url)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .status()
            .await;
        let success = match status {
            Ok(status) => status.success(),
            Err(e) => {
                tracing::warn!(error = %e, program = %argv[0], "Failed to run player");
                false
            }
        };
        AppEvent::PlaybackFinished {
            article_id,
            generation,
            success,
        }
    }));
}

/// Open `link` in the system browser after checking its shape.
fn set_clipboard(text: &str) -> Result<()> {
    let mut clipboard =
        ClipboardContext::new().map_err(|err| anyhow!("create clipboard context: {}", err))?;
    clipboard
        .set_contents(text.to_string())
        .map_err(|err| anyhow!("copy link: {}", err))?;
    Ok(())
}

pub(super) fn copy_link(app: &mut App, link: &str) {
    match set_clipboard(link) {
        Ok(()) => app.set_status("Link copied to clipboard"),
        Err(e) => {
            tracing::warn!(error = %e, "Clipboard unavailable");
            app.set_status(format!("Could not copy link: {}", e));
        }
    }
}

pub(super) fn open_link(app: &mut App, link: &str) {
    match validate_url_for_open(link) {
        Err(e) => app.set_status(e.to_string()),
        Ok(url) => {
            if let Err(e) = open::that(url.as_str()) {
                app.set_status(format!("Failed to open browser: {}", e));
            } else {
                app.set_status("Opened in browser");
            }
        }
    }
}
