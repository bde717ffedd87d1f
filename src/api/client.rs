use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use url::Url;

use super::error::ApiError;
use super::types::{AppData, ArticleQuery, ArticlesPage};
use crate::view::{LayoutStyle, ViewKind};

const MAX_RESPONSE_SIZE: usize = 10 * 1024 * 1024; // 10MB
const MAX_OPML_SIZE: usize = 5 * 1024 * 1024; // 5MB

// ============================================================================
// Snapshot sequencing
// ============================================================================

/// Monotonic sequence handed to every `GET /api/data` request.
///
/// Snapshots can be requested concurrently (mutation resyncs, refresh,
/// initial load). The controller applies a snapshot only if its sequence is
/// newer than the last one applied, so a slow response cannot overwrite a
/// fresher one.
#[derive(Debug, Clone, Default)]
pub struct DataSequence(Arc<AtomicU64>);

impl DataSequence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the next sequence number (starts at 1).
    pub fn next(&self) -> u64 {
        self.0.fetch_add(1, Ordering::Relaxed) + 1
    }
}

// ============================================================================
// Mutations
// ============================================================================

/// Every create/update/delete the client can send.
#[derive(Debug, Clone, PartialEq)]
pub enum Mutation {
    AddFeed {
        url: String,
        category_id: Option<i64>,
    },
    AddCategory {
        name: String,
    },
    AddCustomStream {
        name: String,
    },
    MoveFeed {
        feed_id: i64,
        new_category_id: i64,
    },
    AddFeedToStream {
        custom_stream_id: i64,
        feed_id: i64,
    },
    AssignFeedsBulk {
        feed_ids: Vec<i64>,
        category_id: Option<i64>,
        stream_ids: Vec<i64>,
    },
    ToggleFavorite(i64),
    ToggleBookmark(i64),
    MarkRead(i64),
    MarkAllRead {
        view_type: ViewKind,
        view_id: Option<i64>,
        author_name: Option<String>,
    },
    UpdateFeed {
        id: i64,
        name: String,
        layout_style: LayoutStyle,
        exclude_from_all: bool,
    },
    UpdateCategory {
        id: i64,
        name: String,
        layout_style: LayoutStyle,
        feed_exclusion_states: BTreeMap<i64, bool>,
    },
    UpdateCustomStream {
        id: i64,
        name: String,
        layout_style: LayoutStyle,
    },
    RemoveFeed(i64),
    DeleteFeedPermanently(i64),
    RestoreFeed(i64),
    DeleteCategory(i64),
    RemoveCustomStream(i64),
    DeleteCustomStreamPermanently(i64),
    RestoreCustomStream(i64),
    RemoveFeedFromStream {
        custom_stream_id: i64,
        feed_id: i64,
    },
}

impl Mutation {
    pub fn method(&self) -> Method {
        match self {
            Self::UpdateFeed { .. } | Self::UpdateCategory { .. } | Self::UpdateCustomStream { .. } => {
                Method::PUT
            }
            Self::RemoveFeed(_)
            | Self::DeleteFeedPermanently(_)
            | Self::DeleteCategory(_)
            | Self::RemoveCustomStream(_)
            | Self::DeleteCustomStreamPermanently(_)
            | Self::RemoveFeedFromStream { .. } => Method::DELETE,
            _ => Method::POST,
        }
    }

    /// Path relative to the server root.
    pub fn path(&self) -> String {
        match self {
            Self::AddFeed { .. } => "api/add_feed".to_string(),
            Self::AddCategory { .. } => "api/add_category".to_string(),
            Self::AddCustomStream { .. } => "api/add_custom_stream".to_string(),
            Self::MoveFeed { .. } => "api/move_feed".to_string(),
            Self::AddFeedToStream { .. } => "api/custom_stream/add_feed".to_string(),
            Self::AssignFeedsBulk { .. } => "api/assign_feeds_bulk".to_string(),
            Self::ToggleFavorite(id) => format!("api/article/{}/favorite", id),
            Self::ToggleBookmark(id) => format!("api/article/{}/bookmark", id),
            Self::MarkRead(id) => format!("api/article/{}/mark_read", id),
            Self::MarkAllRead { .. } => "api/mark_all_read".to_string(),
            Self::UpdateFeed { id, .. } | Self::RemoveFeed(id) => format!("api/feed/{}", id),
            Self::DeleteFeedPermanently(id) => format!("api/feed/{}/permanent", id),
            Self::RestoreFeed(id) => format!("api/feed/{}/restore", id),
            Self::UpdateCategory { id, .. } | Self::DeleteCategory(id) => {
                format!("api/category/{}", id)
            }
            Self::UpdateCustomStream { id, .. } | Self::RemoveCustomStream(id) => {
                format!("api/custom_stream/{}", id)
            }
            Self::DeleteCustomStreamPermanently(id) => {
                format!("api/custom_stream/{}/permanent", id)
            }
            Self::RestoreCustomStream(id) => format!("api/custom_stream/{}/restore", id),
            Self::RemoveFeedFromStream {
                custom_stream_id,
                feed_id,
            } => format!("api/custom_stream/{}/feed/{}", custom_stream_id, feed_id),
        }
    }

    /// JSON body, if the endpoint takes one.
    pub fn body(&self) -> Option<Value> {
        let body = match self {
            Self::AddFeed { url, category_id } => match category_id {
                Some(id) => json!({ "url": url, "category_id": id }),
                None => json!({ "url": url }),
            },
            Self::AddCategory { name } | Self::AddCustomStream { name } => json!({ "name": name }),
            Self::MoveFeed {
                feed_id,
                new_category_id,
            } => json!({ "feed_id": feed_id, "new_category_id": new_category_id }),
            Self::AddFeedToStream {
                custom_stream_id,
                feed_id,
            } => json!({ "custom_stream_id": custom_stream_id, "feed_id": feed_id }),
            Self::AssignFeedsBulk {
                feed_ids,
                category_id,
                stream_ids,
            } => json!({
                "feed_ids": feed_ids,
                "category_id": category_id,
                "stream_ids": stream_ids,
            }),
            Self::MarkAllRead {
                view_type,
                view_id,
                author_name,
            } => {
                let mut body = json!({ "view_type": view_type.as_str() });
                if let Some(id) = view_id {
                    body["view_id"] = json!(id);
                }
                if *view_type == ViewKind::Author {
                    if let Some(name) = author_name {
                        body["author_name"] = json!(name);
                    }
                }
                body
            }
            Self::UpdateFeed {
                name,
                layout_style,
                exclude_from_all,
                ..
            } => json!({
                "name": name,
                "layout_style": layout_style,
                "exclude_from_all": exclude_from_all,
            }),
            Self::UpdateCategory {
                name,
                layout_style,
                feed_exclusion_states,
                ..
            } => json!({
                "name": name,
                "layout_style": layout_style,
                "feed_exclusion_states": feed_exclusion_states,
            }),
            Self::UpdateCustomStream {
                name, layout_style, ..
            } => json!({ "name": name, "layout_style": layout_style }),
            _ => return None,
        };
        Some(body)
    }

    /// Confirmation text for destructive mutations; `None` sends immediately.
    pub fn confirm_prompt(&self) -> Option<&'static str> {
        match self {
            Self::RemoveFeed(_) => Some("Are you sure you want to remove this feed?"),
            Self::DeleteFeedPermanently(_) | Self::DeleteCustomStreamPermanently(_) => {
                Some("PERMANENTLY DELETE? This cannot be undone.")
            }
            Self::DeleteCategory(_) => {
                Some("Delete this category? Feeds will be moved to Uncategorized.")
            }
            Self::RemoveCustomStream(_) => Some("Are you sure you want to remove this stream?"),
            Self::MarkAllRead { .. } => Some("Mark all articles in this view as read?"),
            _ => None,
        }
    }

    pub fn is_destructive(&self) -> bool {
        self.confirm_prompt().is_some()
    }

    /// Status-bar text after a successful send.
    pub fn success_message(&self) -> &'static str {
        match self {
            Self::AddFeed { .. } => "Feed added",
            Self::AddCategory { .. } => "Category added",
            Self::AddCustomStream { .. } => "Stream added",
            Self::MoveFeed { .. } => "Feed moved",
            Self::AddFeedToStream { .. } => "Feed added to stream",
            Self::AssignFeedsBulk { .. } => "Feeds assigned",
            Self::ToggleFavorite(_) | Self::ToggleBookmark(_) | Self::MarkRead(_) => "Saved",
            Self::MarkAllRead { .. } => "Marked all as read",
            Self::UpdateFeed { .. } | Self::UpdateCategory { .. } | Self::UpdateCustomStream { .. } => {
                "Changes saved"
            }
            Self::RemoveFeed(_) => "Feed removed",
            Self::DeleteFeedPermanently(_) => "Feed permanently deleted",
            Self::RestoreFeed(_) => "Feed restored",
            Self::DeleteCategory(_) => "Category deleted",
            Self::RemoveCustomStream(_) => "Stream removed",
            Self::DeleteCustomStreamPermanently(_) => "Stream permanently deleted",
            Self::RestoreCustomStream(_) => "Stream restored",
            Self::RemoveFeedFromStream { .. } => "Feed removed from stream",
        }
    }
}

/// Outcome of a successful mutation plus the snapshot pulled after it.
#[derive(Debug)]
pub struct Resynced {
    /// Parsed response body (`Value::Null` for empty or non-JSON bodies).
    pub response: Value,
    /// Sequence claimed for the resync request.
    pub seq: u64,
    /// The resync itself may fail without undoing the mutation.
    pub snapshot: Result<AppData, ApiError>,
}

/// Body of `POST /api/refresh_all_feeds`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RefreshSummary {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub added_count: Option<u64>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub errors: Vec<String>,
}

// ============================================================================
// Client
// ============================================================================

/// Handle to the backend. Cheap to clone; clones share the connection pool.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base: Url,
}

impl ApiClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let mut base =
            Url::parse(base_url.trim()).map_err(|e| ApiError::InvalidUrl(e.to_string()))?;
        if !matches!(base.scheme(), "http" | "https") {
            return Err(ApiError::InvalidUrl(format!(
                "unsupported scheme '{}'",
                base.scheme()
            )));
        }
        if base.host_str().is_none() {
            return Err(ApiError::InvalidUrl("missing host".to_string()));
        }
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("volumeread/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { http, base })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// Host name of the server, used as the Twitch embed `parent`.
    pub fn host(&self) -> &str {
        self.base.host_str().unwrap_or("localhost")
    }

    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        self.base
            .join(path.trim_start_matches('/'))
            .map_err(|e| ApiError::InvalidUrl(e.to_string()))
    }

    /// Send a request and apply the uniform outcome rules:
    /// non-2xx is an error (server `error` message or `Error: <status>`),
    /// 204 and non-JSON 2xx bodies are success with `Value::Null`, and a 2xx
    /// JSON body carrying `error` is a domain error.
    async fn send(&self, request: RequestBuilder) -> Result<Value, ApiError> {
        let response = request.send().await?;
        let status = response.status();
        let is_json = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.contains("application/json"));

        let body = read_limited_bytes(response, MAX_RESPONSE_SIZE).await?;

        if !status.is_success() {
            return Err(ApiError::from_status(status.as_u16(), &body));
        }
        if status == StatusCode::NO_CONTENT || !is_json || body.is_empty() {
            return Ok(Value::Null);
        }

        let value: Value =
            serde_json::from_slice(&body).map_err(|e| ApiError::Decode(e.to_string()))?;
        if let Some(message) = value
            .get("error")
            .and_then(Value::as_str)
            .filter(|m| !m.is_empty())
        {
            return Err(ApiError::Domain(message.to_string()));
        }
        Ok(value)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, ApiError> {
        let value = self
            .send(self.http.get(url).header("Accept", "application/json"))
            .await?;
        if value.is_null() {
            return Err(ApiError::Decode("expected a JSON body".to_string()));
        }
        serde_json::from_value(value).map_err(|e| ApiError::Decode(e.to_string()))
    }

    /// `GET /api/data`.
    pub async fn fetch_app_data(&self) -> Result<AppData, ApiError> {
        let url = self.endpoint("api/data")?;
        self.get_json(url).await
    }

    /// `GET /api/articles` for one page of the given query.
    pub async fn fetch_articles(&self, query: &ArticleQuery) -> Result<ArticlesPage, ApiError> {
        let mut url = self.endpoint("api/articles")?;
        url.query_pairs_mut()
            .extend_pairs(query.pairs().iter().map(|(k, v)| (*k, v.as_str())));
        tracing::debug!(
            page = query.page,
            view_type = query.view_type.as_str(),
            view_id = ?query.view_id,
            "Fetching articles"
        );
        self.get_json(url).await
    }

    /// `POST /api/refresh_all_feeds`.
    ///
    /// The server answers 500 when every feed failed and nothing was added;
    /// that body is still a summary and is returned as `Ok` with
    /// `success == false`.
    pub async fn refresh_all_feeds(&self) -> Result<RefreshSummary, ApiError> {
        let url = self.endpoint("api/refresh_all_feeds")?;
        let response = self
            .http
            .post(url)
            .header("Accept", "application/json")
            .send()
            .await?;
        let status = response.status();
        let body = read_limited_bytes(response, MAX_RESPONSE_SIZE).await?;

        if body.is_empty() {
            return if status.is_success() {
                Ok(RefreshSummary {
                    success: true,
                    ..RefreshSummary::default()
                })
            } else {
                Err(ApiError::from_status(status.as_u16(), &body))
            };
        }

        match serde_json::from_slice::<RefreshSummary>(&body) {
            Ok(summary) if status.is_success() => Ok(summary),
            Ok(summary) if !summary.errors.is_empty() => Ok(RefreshSummary {
                success: false,
                ..summary
            }),
            Ok(_) => Err(ApiError::from_status(status.as_u16(), &body)),
            Err(_) if !status.is_success() => Err(ApiError::from_status(status.as_u16(), &body)),
            Err(e) => Err(ApiError::Decode(e.to_string())),
        }
    }

    /// Send a mutation without resyncing.
    pub async fn mutate(&self, mutation: &Mutation) -> Result<Value, ApiError> {
        let url = self.endpoint(&mutation.path())?;
        let mut request = self
            .http
            .request(mutation.method(), url)
            .header("Accept", "application/json");
        if let Some(body) = mutation.body() {
            request = request.json(&body);
        }
        tracing::debug!(method = %mutation.method(), path = %mutation.path(), "Sending mutation");
        self.send(request).await
    }

    /// Send a mutation and, only if it succeeded, pull the full snapshot once.
    pub async fn mutate_then_resync(
        &self,
        mutation: &Mutation,
        sequence: &DataSequence,
    ) -> Result<Resynced, ApiError> {
        let response = self.mutate(mutation).await?;
        let seq = sequence.next();
        let snapshot = self.fetch_app_data().await;
        if let Err(ref e) = snapshot {
            tracing::warn!(error = %e, seq, "Resync after mutation failed");
        }
        Ok(Resynced {
            response,
            seq,
            snapshot,
        })
    }

    /// `POST /api/import_opml` as multipart field `file`. Returns the
    /// server's summary message.
    pub async fn import_opml(&self, file_name: &str, bytes: Vec<u8>) -> Result<String, ApiError> {
        let url = self.endpoint("api/import_opml")?;
        let part = reqwest::multipart::Part::bytes(bytes)
            .file_name(file_name.to_string())
            .mime_str("text/x-opml")?;
        let form = reqwest::multipart::Form::new().part("file", part);

        let value = self
            .send(self.http.post(url).multipart(form))
            .await
            .map_err(|e| match e {
                ApiError::HttpStatus { status, message } if message.starts_with("Error: ") => {
                    ApiError::HttpStatus {
                        status,
                        message: "Import failed".to_string(),
                    }
                }
                other => other,
            })?;

        Ok(value
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("Import complete")
            .to_string())
    }

    /// `GET /api/export_opml`. Returns the raw document bytes.
    pub async fn export_opml(&self) -> Result<Vec<u8>, ApiError> {
        let url = self.endpoint("api/export_opml")?;
        let response = self.http.get(url).send().await?;
        let status = response.status();
        let body = read_limited_bytes(response, MAX_OPML_SIZE).await?;
        if !status.is_success() {
            return Err(ApiError::from_status(status.as_u16(), &body));
        }
        Ok(body)
    }
}

/// Read a response body, failing once it grows past `limit`.
async fn read_limited_bytes(
    response: reqwest::Response,
    limit: usize,
) -> Result<Vec<u8>, ApiError> {
    // Fast path: check Content-Length header
    if let Some(len) = response.content_length() {
        if len as usize > limit {
            return Err(ApiError::ResponseTooLarge(limit));
        }
    }

    let mut bytes = Vec::new();
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        if bytes.len().saturating_add(chunk.len()) > limit {
            return Err(ApiError::ResponseTooLarge(limit));
        }
        bytes.extend_from_slice(&chunk);
    }

    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use wiremock::matchers::{body_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> ApiClient {
        ApiClient::new(&server.uri(), Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_new_rejects_bad_base_urls() {
        assert!(ApiClient::new("not a url", Duration::from_secs(1)).is_err());
        assert!(ApiClient::new("ftp://example.com", Duration::from_secs(1)).is_err());
    }

    #[test]
    fn test_base_url_gets_trailing_slash() {
        let c = ApiClient::new("http://127.0.0.1:5000/reader", Duration::from_secs(1)).unwrap();
        assert_eq!(c.base_url().as_str(), "http://127.0.0.1:5000/reader/");
        assert_eq!(c.host(), "127.0.0.1");
        assert_eq!(
            c.endpoint("api/data").unwrap().as_str(),
            "http://127.0.0.1:5000/reader/api/data"
        );
    }

    #[test]
    fn test_data_sequence_is_monotonic_across_clones() {
        let seq = DataSequence::new();
        let other = seq.clone();
        assert_eq!(seq.next(), 1);
        assert_eq!(other.next(), 2);
        assert_eq!(seq.next(), 3);
    }

    #[test]
    fn test_mutation_routes() {
        assert_eq!(Mutation::ToggleFavorite(7).path(), "api/article/7/favorite");
        assert_eq!(Mutation::ToggleFavorite(7).method(), Method::POST);
        assert_eq!(Mutation::DeleteFeedPermanently(3).path(), "api/feed/3/permanent");
        assert_eq!(Mutation::DeleteFeedPermanently(3).method(), Method::DELETE);
        assert_eq!(
            Mutation::RemoveFeedFromStream {
                custom_stream_id: 2,
                feed_id: 5
            }
            .path(),
            "api/custom_stream/2/feed/5"
        );
        let update = Mutation::UpdateCustomStream {
            id: 4,
            name: "x".into(),
            layout_style: LayoutStyle::Default,
        };
        assert_eq!(update.method(), Method::PUT);
        assert_eq!(update.path(), "api/custom_stream/4");
    }

    #[test]
    fn test_mutation_bodies() {
        let bulk = Mutation::AssignFeedsBulk {
            feed_ids: vec![1, 2],
            category_id: None,
            stream_ids: vec![9],
        };
        assert_eq!(
            bulk.body(),
            Some(json!({"feed_ids": [1, 2], "category_id": null, "stream_ids": [9]}))
        );

        let mut states = BTreeMap::new();
        states.insert(10, true);
        states.insert(11, false);
        let cat = Mutation::UpdateCategory {
            id: 1,
            name: "Tech".into(),
            layout_style: LayoutStyle::Videos,
            feed_exclusion_states: states,
        };
        assert_eq!(
            cat.body(),
            Some(json!({
                "name": "Tech",
                "layout_style": "videos",
                "feed_exclusion_states": {"10": true, "11": false}
            }))
        );

        let mark = Mutation::MarkAllRead {
            view_type: ViewKind::Feed,
            view_id: Some(42),
            author_name: Some("ignored".into()),
        };
        assert_eq!(mark.body(), Some(json!({"view_type": "feed", "view_id": 42})));
        assert_eq!(Mutation::RestoreFeed(1).body(), None);
    }

    #[test]
    fn test_destructive_mutations_need_confirmation() {
        assert!(Mutation::RemoveFeed(1).is_destructive());
        assert!(Mutation::DeleteCategory(1).is_destructive());
        assert!(Mutation::DeleteCustomStreamPermanently(1).is_destructive());
        assert!(!Mutation::RestoreFeed(1).is_destructive());
        assert!(!Mutation::ToggleFavorite(1).is_destructive());
        assert_eq!(
            Mutation::DeleteFeedPermanently(1).confirm_prompt(),
            Some("PERMANENTLY DELETE? This cannot be undone.")
        );
    }

    #[tokio::test]
    async fn test_fetch_articles_sends_query() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/articles"))
            .and(query_param("page", "1"))
            .and(query_param("view_type", "feed"))
            .and(query_param("view_id", "42"))
            .and(query_param("unread_only", "true"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "articles": [{"id": 1, "title": "One"}],
                "total_pages": 2,
                "has_next": true
            })))
            .expect(1)
            .mount(&server)
            .await;

        let query = ArticleQuery {
            page: 1,
            view_type: ViewKind::Feed,
            view_id: Some(42),
            author_name: None,
            unread_only: true,
            smart_cap: false,
        };
        let page = client(&server).fetch_articles(&query).await.unwrap();
        assert_eq!(page.articles.len(), 1);
        assert!(page.has_next);
        assert_eq!(page.total_pages, 2);
    }

    #[tokio::test]
    async fn test_successful_mutation_resyncs_once() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/add_category"))
            .and(body_json(json!({"name": "News"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/data"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "categories": [{"id": 1, "name": "News"}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let seq = DataSequence::new();
        let out = client(&server)
            .mutate_then_resync(
                &Mutation::AddCategory {
                    name: "News".into(),
                },
                &seq,
            )
            .await
            .unwrap();
        assert_eq!(out.seq, 1);
        assert_eq!(out.snapshot.unwrap().categories[0].name, "News");
    }

    #[tokio::test]
    async fn test_error_body_skips_resync() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/add_category"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "error": "Category with this name already exists"
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/data"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .expect(0)
            .mount(&server)
            .await;

        let err = client(&server)
            .mutate_then_resync(
                &Mutation::AddCategory {
                    name: "News".into(),
                },
                &DataSequence::new(),
            )
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Category with this name already exists");
    }

    #[tokio::test]
    async fn test_non_2xx_skips_resync_and_uses_server_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/add_feed"))
            .respond_with(
                ResponseTemplate::new(400).set_body_json(json!({"error": "Invalid feed URL"})),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/data"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .expect(0)
            .mount(&server)
            .await;

        let err = client(&server)
            .mutate_then_resync(
                &Mutation::AddFeed {
                    url: "nope".into(),
                    category_id: None,
                },
                &DataSequence::new(),
            )
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Invalid feed URL");
        assert_eq!(err.status(), Some(400));
    }

    #[tokio::test]
    async fn test_no_content_and_non_json_are_success() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/api/feed/3"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/feed/3/restore"))
            .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
            .mount(&server)
            .await;

        let c = client(&server);
        assert_eq!(c.mutate(&Mutation::RemoveFeed(3)).await.unwrap(), Value::Null);
        assert_eq!(c.mutate(&Mutation::RestoreFeed(3)).await.unwrap(), Value::Null);
    }

    #[tokio::test]
    async fn test_favorite_returns_flag() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/article/7/favorite"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"is_favorite": true})))
            .expect(1)
            .mount(&server)
            .await;

        let value = client(&server)
            .mutate(&Mutation::ToggleFavorite(7))
            .await
            .unwrap();
        assert_eq!(value["is_favorite"], json!(true));
    }

    #[tokio::test]
    async fn test_refresh_summary_on_partial_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/refresh_all_feeds"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "message": "Refreshed feeds, added 4 articles.",
                "errors": ["Error fetching Broken: Status 404"]
            })))
            .mount(&server)
            .await;

        let summary = client(&server).refresh_all_feeds().await.unwrap();
        assert!(summary.success);
        assert_eq!(summary.errors.len(), 1);
        assert_eq!(
            summary.message.as_deref(),
            Some("Refreshed feeds, added 4 articles.")
        );
    }

    #[tokio::test]
    async fn test_refresh_summary_when_every_feed_failed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/refresh_all_feeds"))
            .respond_with(ResponseTemplate::new(500).set_body_json(json!({
                "success": false,
                "message": "Refreshed feeds, added 0 articles.",
                "errors": ["Error fetching A: Status 404", "Error fetching B: Status 500"]
            })))
            .mount(&server)
            .await;

        let summary = client(&server).refresh_all_feeds().await.unwrap();
        assert!(!summary.success);
        assert_eq!(summary.errors.len(), 2);
    }

    #[tokio::test]
    async fn test_refresh_plain_server_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/refresh_all_feeds"))
            .respond_with(ResponseTemplate::new(502).set_body_string("Bad Gateway"))
            .mount(&server)
            .await;

        let err = client(&server).refresh_all_feeds().await.unwrap_err();
        assert_eq!(err.to_string(), "Error: 502");
    }

    #[tokio::test]
    async fn test_export_returns_raw_bytes() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/export_opml"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_raw("<opml version=\"2.0\"/>", "application/xml"),
            )
            .mount(&server)
            .await;

        let bytes = client(&server).export_opml().await.unwrap();
        assert_eq!(bytes, b"<opml version=\"2.0\"/>".to_vec());
    }

    #[tokio::test]
    async fn test_import_messages() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/import_opml"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"message": "Imported 3 feeds"})),
            )
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/import_opml"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let c = client(&server);
        let msg = c.import_opml("feeds.opml", b"<opml/>".to_vec()).await.unwrap();
        assert_eq!(msg, "Imported 3 feeds");

        let err = c
            .import_opml("feeds.opml", b"<opml/>".to_vec())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Import failed");
    }

    #[tokio::test]
    async fn test_oversized_response_rejected() {
        let server = MockServer::start().await;
        let big = "x".repeat(MAX_OPML_SIZE + 1);
        Mock::given(method("GET"))
            .and(path("/api/export_opml"))
            .respond_with(ResponseTemplate::new(200).set_body_string(big))
            .mount(&server)
            .await;

        let err = client(&server).export_opml().await.unwrap_err();
        assert!(matches!(err, ApiError::ResponseTooLarge(_)));
    }
}
