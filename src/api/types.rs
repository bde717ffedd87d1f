use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::view::{LayoutStyle, ViewKind};

/// Treat an explicit JSON `null` the same as a missing key.
fn nullable<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

// ============================================================================
// Snapshot (`GET /api/data`)
// ============================================================================

/// Full sidebar snapshot. Replaced wholesale on every successful fetch.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppData {
    #[serde(default, deserialize_with = "nullable")]
    pub categories: Vec<Category>,
    #[serde(default, deserialize_with = "nullable")]
    pub feeds: Vec<Feed>,
    #[serde(default, deserialize_with = "nullable")]
    pub custom_streams: Vec<CustomStream>,
    #[serde(default, deserialize_with = "nullable")]
    pub removed_feeds: Vec<RemovedFeed>,
    #[serde(default, deserialize_with = "nullable")]
    pub removed_streams: Vec<RemovedStream>,
    #[serde(default, deserialize_with = "nullable")]
    pub custom_stream_feed_links: Vec<CustomStreamFeedLink>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Feed {
    pub id: i64,
    #[serde(default, deserialize_with = "nullable")]
    pub title: String,
    #[serde(default, deserialize_with = "nullable")]
    pub url: String,
    #[serde(default)]
    pub category_id: Option<i64>,
    #[serde(default, deserialize_with = "nullable")]
    pub exclude_from_all: bool,
    #[serde(default, deserialize_with = "nullable")]
    pub layout_style: LayoutStyle,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Category {
    pub id: i64,
    #[serde(default, deserialize_with = "nullable")]
    pub name: String,
    #[serde(default, deserialize_with = "nullable")]
    pub layout_style: LayoutStyle,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct CustomStream {
    pub id: i64,
    #[serde(default, deserialize_with = "nullable")]
    pub name: String,
    #[serde(default, deserialize_with = "nullable")]
    pub layout_style: LayoutStyle,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RemovedFeed {
    pub id: i64,
    #[serde(default, deserialize_with = "nullable")]
    pub title: String,
    #[serde(default)]
    pub deleted_at: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RemovedStream {
    pub id: i64,
    #[serde(default, deserialize_with = "nullable")]
    pub name: String,
    #[serde(default)]
    pub deleted_at: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct CustomStreamFeedLink {
    pub custom_stream_id: i64,
    pub feed_id: i64,
}

impl AppData {
    pub fn feed(&self, id: i64) -> Option<&Feed> {
        self.feeds.iter().find(|f| f.id == id)
    }

    pub fn category(&self, id: i64) -> Option<&Category> {
        self.categories.iter().find(|c| c.id == id)
    }

    pub fn stream(&self, id: i64) -> Option<&CustomStream> {
        self.custom_streams.iter().find(|s| s.id == id)
    }

    /// Feeds whose `category_id` is `category_id`, in snapshot order.
    pub fn feeds_in_category(&self, category_id: i64) -> Vec<&Feed> {
        self.feeds
            .iter()
            .filter(|f| f.category_id == Some(category_id))
            .collect()
    }

    /// Active feeds linked to a custom stream. Links pointing at feeds that
    /// are not in the snapshot (removed feeds) are skipped.
    pub fn feeds_in_stream(&self, stream_id: i64) -> Vec<&Feed> {
        self.custom_stream_feed_links
            .iter()
            .filter(|link| link.custom_stream_id == stream_id)
            .filter_map(|link| self.feed(link.feed_id))
            .collect()
    }

    /// Streams a feed is currently linked to.
    pub fn streams_for_feed(&self, feed_id: i64) -> Vec<i64> {
        self.custom_stream_feed_links
            .iter()
            .filter(|link| link.feed_id == feed_id)
            .map(|link| link.custom_stream_id)
            .collect()
    }
}

// ============================================================================
// Articles (`GET /api/articles`)
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Article {
    pub id: i64,
    #[serde(default, deserialize_with = "nullable")]
    pub title: String,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub full_content: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub link: String,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub feed_id: Option<i64>,
    #[serde(default)]
    pub feed_title: Option<String>,
    /// ISO-8601, possibly without an offset.
    #[serde(default)]
    pub published: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub is_favorite: bool,
    #[serde(default, deserialize_with = "nullable")]
    pub is_read_later: bool,
    #[serde(default, deserialize_with = "nullable")]
    pub is_read: bool,
    #[serde(default)]
    pub image_url: Option<String>,
}

impl Article {
    /// Parsed publish time. Offset-less timestamps are taken as UTC.
    pub fn published_at(&self) -> Option<DateTime<Utc>> {
        parse_timestamp(self.published.as_deref()?)
    }

    /// `full_content`, falling back to `summary`, falling back to empty.
    pub fn body(&self) -> &str {
        self.full_content
            .as_deref()
            .filter(|c| !c.is_empty())
            .or(self.summary.as_deref())
            .unwrap_or("")
    }
}

pub(crate) fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}

/// One page of articles for the active view.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ArticlesPage {
    #[serde(default, deserialize_with = "nullable")]
    pub articles: Vec<Article>,
    #[serde(default, deserialize_with = "nullable")]
    pub total_pages: u32,
    #[serde(default, deserialize_with = "nullable")]
    pub has_next: bool,
    #[serde(default, deserialize_with = "nullable")]
    pub is_reddit_source: bool,
}

/// Query for `GET /api/articles`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArticleQuery {
    pub page: u32,
    pub view_type: ViewKind,
    pub view_id: Option<i64>,
    pub author_name: Option<String>,
    pub unread_only: bool,
    pub smart_cap: bool,
}

impl ArticleQuery {
    /// Query-string pairs in wire order.
    ///
    /// `view_id` is sent only when present, `author_name` only for author
    /// views, and the boolean filters only when enabled.
    pub fn pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            ("page", self.page.to_string()),
            ("view_type", self.view_type.as_str().to_string()),
        ];
        if let Some(id) = self.view_id {
            pairs.push(("view_id", id.to_string()));
        }
        if self.view_type == ViewKind::Author {
            if let Some(name) = &self.author_name {
                pairs.push(("author_name", name.clone()));
            }
        }
        if self.unread_only {
            pairs.push(("unread_only", "true".to_string()));
        }
        if self.smart_cap {
            pairs.push(("smart_cap", "true".to_string()));
        }
        pairs
    }
}
