//! Derived article list: search filter plus date sort.
//!
//! Nothing here is cached. The list is recomputed from the buffer every time
//! it is needed, so it can never disagree with the underlying articles.
use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::api::Article;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Newest,
    Oldest,
}

impl SortOrder {
    pub fn toggle(self) -> Self {
        match self {
            Self::Newest => Self::Oldest,
            Self::Oldest => Self::Newest,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Newest => "newest",
            Self::Oldest => "oldest",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Newest => "Newest first",
            Self::Oldest => "Oldest first",
        }
    }
}

/// True if `needle` (already lower-cased) appears in the title,
/// summary, feed title or author.
fn matches(article: &Article, needle: &str) -> bool {
    let hit = |field: Option<&str>| field.is_some_and(|s| s.to_lowercase().contains(needle));
    hit(Some(&article.title))
        || hit(article.summary.as_deref())
        || hit(article.feed_title.as_deref())
        || hit(article.author.as_deref())
}

/// Missing and unparseable publish times sort as the oldest instant.
fn sort_key(article: &Article) -> DateTime<Utc> {
    article.published_at().unwrap_or(DateTime::<Utc>::MIN_UTC)
}

/// Filter by `query` and sort by publish time.
///
/// A blank query keeps every article. The sort is stable, so articles with
/// equal timestamps keep their buffer order.
pub fn filtered_articles<'a>(
    articles: &'a [Article],
    query: &str,
    order: SortOrder,
) -> Vec<&'a Article> {
    // Whitespace-only queries keep everything; otherwise match the query as typed.
    let mut out: Vec<&Article> = if query.trim().is_empty() {
        articles.iter().collect()
    } else {
        let needle = query.to_lowercase();
        articles.iter().filter(|a| matches(a, &needle)).collect()
    };

    out.sort_by(|a, b| {
        let ord: Ordering = sort_key(a).cmp(&sort_key(b));
        match order {
            SortOrder::Newest => ord.reverse(),
            SortOrder::Oldest => ord,
        }
    });
    out
}

/// Placeholder shown when the filtered list is empty.
pub fn empty_message(is_loading: bool, query: &str, has_feeds: bool) -> &'static str {
    if is_loading {
        "Loading articles..."
    } else if !query.trim().is_empty() {
        "No articles match your search."
    } else if !has_feeds {
        "Add a feed to get started."
    } else {
        "No articles found for this view."
    }
}
