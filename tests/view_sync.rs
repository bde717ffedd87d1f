//! Integration tests for the view controller against a mock backend.
//!
//! Each test drives `App` the way the event loop does: take the request it
//! hands out, run it through `ApiClient` against wiremock, feed the result
//! back. No terminal involved.

use pretty_assertions::assert_eq;
use serde_json::json;
use std::time::Duration;
use volumeread::api::{ApiClient, Article, Mutation};
use volumeread::app::{AddKind, App};
use volumeread::config::Config;
use volumeread::keybindings::KeybindingRegistry;
use volumeread::preferences::PreferenceManager;
use volumeread::view::ViewKind;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn app_for(server: &MockServer) -> App {
    let api = ApiClient::new(&server.uri(), Duration::from_secs(5)).unwrap();
    App::new(
        api,
        None,
        PreferenceManager::from_config(&Config::default()),
        KeybindingRegistry::new(),
        None,
    )
}

fn article(id: i64, title: &str) -> Article {
    Article {
        id,
        title: title.to_string(),
        link: format!("https://example.com/{}", id),
        ..Article::default()
    }
}

async fn mount_snapshot(server: &MockServer, expected_calls: u64) {
    Mock::given(method("GET"))
        .and(path("/api/data"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "categories": [],
            "feeds": [{"id": 42, "title": "Example Feed", "url": "https://example.com/feed"}]
        })))
        .expect(expected_calls)
        .mount(server)
        .await;
}

// ============================================================================
// Pagination
// ============================================================================

#[tokio::test]
async fn test_feed_view_first_page() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/articles"))
        .and(query_param("page", "1"))
        .and(query_param("view_type", "feed"))
        .and(query_param("view_id", "42"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "articles": [
                {"id": 1, "title": "One"},
                {"id": 2, "title": "Two"},
                {"id": 3, "title": "Three"}
            ],
            "total_pages": 2,
            "has_next": true
        })))
        .expect(1)
        .mount(&server)
        .await;

    let mut app = app_for(&server);
    let request = app.set_view(ViewKind::Feed, Some(42), Some("Example Feed".into()));
    assert!(app.articles.is_empty());
    assert_eq!(app.current_page, 1);

    let result = app.api.fetch_articles(&request.query).await;
    assert!(app.apply_articles_page(request.generation, request.query.page, result));

    assert_eq!(app.current_page, 2);
    assert!(app.has_next_page);
    assert_eq!(app.total_pages, 2);
    assert_eq!(app.articles.len(), 3);
}

#[tokio::test]
async fn test_response_for_previous_view_is_dropped() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/articles"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "articles": [{"id": 9, "title": "Old view"}],
            "has_next": false
        })))
        .mount(&server)
        .await;

    let mut app = app_for(&server);
    let stale = app.set_view(ViewKind::Favorites, None, None);
    let current = app.set_view(ViewKind::All, None, None);

    let result = app.api.fetch_articles(&stale.query).await;
    assert!(!app.apply_articles_page(stale.generation, stale.query.page, result));
    assert!(app.articles.is_empty());
    assert!(app.is_loading_articles);

    let result = app.api.fetch_articles(&current.query).await;
    assert!(app.apply_articles_page(current.generation, current.query.page, result));
    assert_eq!(app.articles.len(), 1);
    assert!(app.load_more().is_none());
}

// ============================================================================
// Mutations
// ============================================================================

#[tokio::test]
async fn test_favorite_in_favorites_view_reloads() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/article/7/favorite"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"success": true, "is_favorite": true})),
        )
        .expect(1)
        .mount(&server)
        .await;
    mount_snapshot(&server, 1).await;

    let mut app = app_for(&server);
    app.set_view(ViewKind::Favorites, None, None);
    app.is_loading_articles = false;
    app.articles = vec![article(7, "Seven")];
    let generation = app.page_generation;

    let mutation = app.toggle_favorite_target().unwrap();
    assert_eq!(mutation, Mutation::ToggleFavorite(7));
    let result = app.api.mutate_then_resync(&mutation, &app.data_seq).await;
    let reload = app.apply_mutation_result(&mutation, result);

    assert_eq!(app.data.feeds.len(), 1);
    let reload = reload.expect("favorites view refetches");
    assert_eq!(reload.generation, generation + 1);
    assert_eq!(reload.query.page, 1);
}

#[tokio::test]
async fn test_favorite_in_all_view_updates_in_place() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/article/7/favorite"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"success": true, "is_favorite": true})),
        )
        .expect(1)
        .mount(&server)
        .await;
    mount_snapshot(&server, 1).await;

    let mut app = app_for(&server);
    app.articles = vec![article(7, "Seven")];

    let mutation = Mutation::ToggleFavorite(7);
    let result = app.api.mutate_then_resync(&mutation, &app.data_seq).await;
    let reload = app.apply_mutation_result(&mutation, result);

    assert!(reload.is_none());
    assert!(app.articles[0].is_favorite);
}

#[tokio::test]
async fn test_error_body_keeps_form_open_without_resync() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/add_category"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"error": "Category already exists"})),
        )
        .expect(1)
        .mount(&server)
        .await;
    mount_snapshot(&server, 0).await;

    let mut app = app_for(&server);
    app.open_add_form(AddKind::Category);
    let form = app.add_form.as_mut().unwrap();
    form.input = "News".into();
    let mutation = form.submit().unwrap();

    let result = app.api.mutate_then_resync(&mutation, &app.data_seq).await;
    assert!(app.apply_mutation_result(&mutation, result).is_none());

    let form = app.add_form.as_ref().expect("form stays open");
    assert!(!form.submitting);
    assert_eq!(form.error.as_deref(), Some("Category already exists"));
    assert_eq!(app.applied_seq, 0);
}

#[tokio::test]
async fn test_mark_all_read_reloads_first_page() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/mark_all_read"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
        .expect(1)
        .mount(&server)
        .await;
    mount_snapshot(&server, 1).await;

    let mut app = app_for(&server);
    app.set_view(ViewKind::Feed, Some(42), None);
    app.is_loading_articles = false;
    app.articles = vec![article(1, "One"), article(2, "Two")];

    let mutation = app.mark_all_read_target();
    let result = app.api.mutate_then_resync(&mutation, &app.data_seq).await;
    let reload = app.apply_mutation_result(&mutation, result).unwrap();

    assert!(app.articles.is_empty());
    assert_eq!(reload.query.view_id, Some(42));
    assert_eq!(reload.query.view_type, ViewKind::Feed);
}
