//! The active content scope and how it is presented.
//!
//! A [`View`] is the discriminated union the sidebar selects from: the six
//! top-level views plus single feed, category, custom stream, and author
//! scopes. Exactly one is active at a time; it drives the articles query and
//! the sidebar highlight.
use serde::{Deserialize, Serialize};

use crate::api::AppData;

// ============================================================================
// View Kind
// ============================================================================

/// Wire names match the backend's `view_type` query parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ViewKind {
    #[serde(rename = "all")]
    All,
    #[serde(rename = "favorites")]
    Favorites,
    #[serde(rename = "readLater")]
    ReadLater,
    #[serde(rename = "videos")]
    Videos,
    #[serde(rename = "threads")]
    Threads,
    #[serde(rename = "sites")]
    Sites,
    #[serde(rename = "feed")]
    Feed,
    #[serde(rename = "category")]
    Category,
    #[serde(rename = "custom_stream")]
    CustomStream,
    #[serde(rename = "author")]
    Author,
}

impl ViewKind {
    /// Views that are not backed by a server entity. Their display
    /// preferences live in the local store only.
    pub const TOP_LEVEL: [ViewKind; 6] = [
        ViewKind::All,
        ViewKind::Favorites,
        ViewKind::ReadLater,
        ViewKind::Videos,
        ViewKind::Threads,
        ViewKind::Sites,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Favorites => "favorites",
            Self::ReadLater => "readLater",
            Self::Videos => "videos",
            Self::Threads => "threads",
            Self::Sites => "sites",
            Self::Feed => "feed",
            Self::Category => "category",
            Self::CustomStream => "custom_stream",
            Self::Author => "author",
        }
    }

    pub fn from_str_name(s: &str) -> Option<Self> {
        match s {
            "all" => Some(Self::All),
            "favorites" => Some(Self::Favorites),
            "readLater" => Some(Self::ReadLater),
            "videos" => Some(Self::Videos),
            "threads" => Some(Self::Threads),
            "sites" => Some(Self::Sites),
            "feed" => Some(Self::Feed),
            "category" => Some(Self::Category),
            "custom_stream" => Some(Self::CustomStream),
            "author" => Some(Self::Author),
            _ => None,
        }
    }

    /// True for the top-level views whose settings are client-side only.
    pub fn is_global(self) -> bool {
        Self::TOP_LEVEL.contains(&self)
    }

    /// Fallback title used when the view's entity cannot be found.
    pub fn default_title(self) -> &'static str {
        match self {
            Self::All => "All Feeds",
            Self::Favorites => "Favorites",
            Self::ReadLater => "Read Later",
            Self::Videos => "Videos",
            Self::Threads => "Threads",
            Self::Sites => "Sites",
            Self::Feed => "Feed",
            Self::Category => "Category",
            Self::CustomStream => "Stream",
            Self::Author => "Author",
        }
    }
}

// ============================================================================
// Layout Style
// ============================================================================

/// Display style for an article list.
///
/// `Default` means "no preference": resolution falls through to the next
/// source. Unknown names from the server deserialize as `Default`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayoutStyle {
    Standard,
    Threads,
    Videos,
    #[default]
    #[serde(other)]
    Default,
}

impl LayoutStyle {
    pub const ALL: [LayoutStyle; 4] = [
        LayoutStyle::Default,
        LayoutStyle::Standard,
        LayoutStyle::Threads,
        LayoutStyle::Videos,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Standard => "standard",
            Self::Threads => "threads",
            Self::Videos => "videos",
        }
    }

    pub fn from_str_name(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "default" => Some(Self::Default),
            "standard" => Some(Self::Standard),
            "threads" => Some(Self::Threads),
            "videos" => Some(Self::Videos),
            _ => None,
        }
    }

    /// Cycle to the next style (wraps around), for the edit dialog.
    pub fn next(self) -> Self {
        match self {
            Self::Default => Self::Standard,
            Self::Standard => Self::Threads,
            Self::Threads => Self::Videos,
            Self::Videos => Self::Default,
        }
    }

    fn explicit(self) -> Option<Self> {
        (self != Self::Default).then_some(self)
    }
}

// ============================================================================
// View
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct View {
    pub kind: ViewKind,
    /// Entity id for feed/category/custom_stream views.
    pub id: Option<i64>,
    /// Caller-supplied title; for author views this is the author name.
    pub title: Option<String>,
    /// Set for `threads`, and by the server when a page comes from reddit.
    pub is_reddit_source: bool,
    /// Layout stored on the backing entity at the time the view was entered.
    pub assigned_style: Option<LayoutStyle>,
}

impl Default for View {
    fn default() -> Self {
        Self::all()
    }
}

impl View {
    pub fn all() -> Self {
        Self {
            kind: ViewKind::All,
            id: None,
            title: Some(ViewKind::All.default_title().to_string()),
            is_reddit_source: false,
            assigned_style: None,
        }
    }

    /// Build a view, looking up the entity's stored layout style in `data`.
    pub fn new(kind: ViewKind, id: Option<i64>, title: Option<String>, data: &AppData) -> Self {
        let assigned_style = match (kind, id) {
            (ViewKind::Feed, Some(id)) => data.feed(id).map(|f| f.layout_style),
            (ViewKind::Category, Some(id)) => data.category(id).map(|c| c.layout_style),
            (ViewKind::CustomStream, Some(id)) => data.stream(id).map(|s| s.layout_style),
            _ => None,
        };

        Self {
            kind,
            id,
            title,
            is_reddit_source: kind == ViewKind::Threads,
            assigned_style,
        }
    }

    pub fn is(&self, kind: ViewKind, id: Option<i64>) -> bool {
        self.kind == kind && self.id == id
    }

    /// Title shown above the article list.
    ///
    /// Entity views use the current name from `data` so renames show up
    /// without re-entering the view.
    pub fn display_title(&self, data: &AppData) -> String {
        let lookup = match (self.kind, self.id) {
            (ViewKind::Feed, Some(id)) => data.feed(id).map(|f| f.title.clone()),
            (ViewKind::Category, Some(id)) => data.category(id).map(|c| c.name.clone()),
            (ViewKind::CustomStream, Some(id)) => data.stream(id).map(|s| s.name.clone()),
            (ViewKind::Author, _) => self.title.clone().filter(|t| !t.is_empty()),
            _ => None,
        };
        lookup.unwrap_or_else(|| self.kind.default_title().to_string())
    }

    /// Resolve the effective layout.
    ///
    /// Precedence: the entity's stored style, then the local preference for
    /// top-level views, then the built-in default for the view kind.
    /// Never returns [`LayoutStyle::Default`].
    pub fn layout_mode(&self, local_style: Option<LayoutStyle>) -> LayoutStyle {
        if let Some(style) = self.assigned_style.and_then(LayoutStyle::explicit) {
            return style;
        }

        if self.kind.is_global() {
            if let Some(style) = local_style.and_then(LayoutStyle::explicit) {
                return style;
            }
        }

        if self.kind == ViewKind::Threads || self.is_reddit_source {
            return LayoutStyle::Threads;
        }
        if self.kind == ViewKind::Videos {
            return LayoutStyle::Videos;
        }
        LayoutStyle::Standard
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{Category, CustomStream, Feed};

    fn data() -> AppData {
        AppData {
            categories: vec![Category {
                id: 1,
                name: "Tech".to_string(),
                layout_style: LayoutStyle::Videos,
            }],
            feeds: vec![Feed {
                id: 42,
                title: "Example Feed".to_string(),
                url: "https://example.com/rss".to_string(),
                category_id: Some(1),
                exclude_from_all: false,
                layout_style: LayoutStyle::Default,
            }],
            custom_streams: vec![CustomStream {
                id: 9,
                name: "Morning".to_string(),
                layout_style: LayoutStyle::Threads,
            }],
            ..AppData::default()
        }
    }

    #[test]
    fn test_view_kind_wire_names_round_trip() {
        for kind in [
            ViewKind::All,
            ViewKind::ReadLater,
            ViewKind::CustomStream,
            ViewKind::Author,
        ] {
            assert_eq!(ViewKind::from_str_name(kind.as_str()), Some(kind));
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{}\"", kind.as_str()));
        }
    }

    #[test]
    fn test_new_view_picks_up_assigned_style() {
        let d = data();
        let view = View::new(ViewKind::Category, Some(1), None, &d);
        assert_eq!(view.assigned_style, Some(LayoutStyle::Videos));

        let missing = View::new(ViewKind::Feed, Some(999), None, &d);
        assert_eq!(missing.assigned_style, None);
    }

    #[test]
    fn test_threads_view_is_reddit_source() {
        let view = View::new(ViewKind::Threads, None, None, &AppData::default());
        assert!(view.is_reddit_source);
        let view = View::new(ViewKind::Sites, None, None, &AppData::default());
        assert!(!view.is_reddit_source);
    }

    #[test]
    fn test_layout_assigned_style_wins() {
        let view = View::new(ViewKind::CustomStream, Some(9), None, &data());
        assert_eq!(view.layout_mode(Some(LayoutStyle::Videos)), LayoutStyle::Threads);
    }

    #[test]
    fn test_layout_local_preference_only_for_global_views() {
        let all = View::all();
        assert_eq!(all.layout_mode(Some(LayoutStyle::Videos)), LayoutStyle::Videos);

        let feed = View::new(ViewKind::Feed, Some(42), None, &data());
        assert_eq!(feed.layout_mode(Some(LayoutStyle::Videos)), LayoutStyle::Standard);
    }

    #[test]
    fn test_layout_system_defaults() {
        let d = AppData::default();
        assert_eq!(
            View::new(ViewKind::Threads, None, None, &d).layout_mode(None),
            LayoutStyle::Threads
        );
        assert_eq!(
            View::new(ViewKind::Videos, None, None, &d).layout_mode(Some(LayoutStyle::Default)),
            LayoutStyle::Videos
        );
        let mut feed = View::new(ViewKind::Feed, Some(1), None, &d);
        feed.is_reddit_source = true;
        assert_eq!(feed.layout_mode(None), LayoutStyle::Threads);
        assert_eq!(View::all().layout_mode(None), LayoutStyle::Standard);
    }

    #[test]
    fn test_display_title_lookup_and_fallback() {
        let d = data();
        assert_eq!(View::all().display_title(&d), "All Feeds");
        assert_eq!(
            View::new(ViewKind::Feed, Some(42), Some("stale".into()), &d).display_title(&d),
            "Example Feed"
        );
        assert_eq!(
            View::new(ViewKind::Feed, Some(7), None, &d).display_title(&d),
            "Feed"
        );
        assert_eq!(
            View::new(ViewKind::Author, None, Some("Jane Doe".into()), &d).display_title(&d),
            "Jane Doe"
        );
        assert_eq!(
            View::new(ViewKind::Author, None, None, &d).display_title(&d),
            "Author"
        );
    }

    #[test]
    fn test_unknown_layout_style_deserializes_as_default() {
        let style: LayoutStyle = serde_json::from_str("\"magazine\"").unwrap();
        assert_eq!(style, LayoutStyle::Default);
        let style: LayoutStyle = serde_json::from_str("\"videos\"").unwrap();
        assert_eq!(style, LayoutStyle::Videos);
    }
}
