use std::borrow::Cow;
use std::collections::{BTreeMap, BTreeSet, HashSet};

use tokio::time::Instant;

use crate::api::{
    ApiClient, ApiError, AppData, Article, ArticleQuery, ArticlesPage, Category, CustomStream,
    DataSequence, Feed, Mutation, RefreshSummary, Resynced,
};
use crate::content::{detect_embed, html_to_text, render_article_content, Embed};
use crate::filter::{filtered_articles, SortOrder};
use crate::keybindings::KeybindingRegistry;
use crate::preferences::PreferenceManager;
use crate::storage::Database;
use crate::util::{display_width, validate_url, MAX_SEARCH_QUERY_LENGTH};
use crate::view::{LayoutStyle, View, ViewKind};

/// Maximum scroll offset for the reader view (ratatui u16 limit).
pub const MAX_SCROLL: usize = u16::MAX as usize;

/// Load the next page once the cursor is this close to the end of the list.
const LOAD_MORE_THRESHOLD: usize = 3;

/// Lines above the body in the reader: title, meta line, blank.
const READER_HEADER_LINES: usize = 3;

// ============================================================================
// Screen and Focus
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Browse, // Sidebar + article list
    Reader, // Full-screen article
}

/// Which panel has focus on the browse screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Sidebar,
    Articles,
}

// ============================================================================
// Sidebar
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Section {
    Categories,
    Streams,
    Removed,
}

impl Section {
    pub fn label(self) -> &'static str {
        match self {
            Self::Categories => "Categories",
            Self::Streams => "Streams",
            Self::Removed => "Removed",
        }
    }
}

/// Where a feed row sits in the sidebar tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedParent {
    Category(i64),
    Stream(i64),
    Uncategorized,
}

/// One row of the flattened sidebar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SidebarItem {
    View(ViewKind),
    Header(Section),
    Category(i64),
    Stream(i64),
    Feed { feed_id: i64, parent: FeedParent },
    RemovedFeed(i64),
    RemovedStream(i64),
}

impl SidebarItem {
    /// Nesting depth used for indentation.
    pub fn depth(&self) -> usize {
        match self {
            Self::View(_) | Self::Header(_) => 0,
            Self::Feed {
                parent: FeedParent::Uncategorized,
                ..
            } => 1,
            Self::Feed { .. } => 2,
            _ => 1,
        }
    }
}

// ============================================================================
// Dialog State
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddKind {
    Feed,
    Category,
    Stream,
}

impl AddKind {
    pub fn title(self) -> &'static str {
        match self {
            Self::Feed => "Add Feed",
            Self::Category => "Add Category",
            Self::Stream => "Add Stream",
        }
    }

    pub fn placeholder(self) -> &'static str {
        match self {
            Self::Feed => "Feed, YouTube channel, or subreddit URL",
            Self::Category => "Category name",
            Self::Stream => "Stream name",
        }
    }
}

/// Single-line add form for feeds, categories and streams.
#[derive(Debug, Clone, PartialEq)]
pub struct AddForm {
    pub kind: AddKind,
    pub input: String,
    /// Category the new feed lands in (the category under the cursor).
    pub category_id: Option<i64>,
    pub error: Option<String>,
    pub submitting: bool,
}

impl AddForm {
    pub fn new(kind: AddKind, category_id: Option<i64>) -> Self {
        Self {
            kind,
            input: String::new(),
            category_id,
            error: None,
            submitting: false,
        }
    }

    /// Validate the input and build the mutation to send.
    pub fn submit(&mut self) -> Option<Mutation> {
        let value = self.input.trim();
        let mutation = match self.kind {
            AddKind::Feed => match validate_url(value) {
                Ok(url) => Mutation::AddFeed {
                    url: url.to_string(),
                    category_id: self.category_id,
                },
                Err(e) => {
                    self.error = Some(e.to_string());
                    return None;
                }
            },
            AddKind::Category | AddKind::Stream if value.is_empty() => {
                self.error = Some("Name is required".to_string());
                return None;
            }
            AddKind::Category => Mutation::AddCategory {
                name: value.to_string(),
            },
            AddKind::Stream => Mutation::AddCustomStream {
                name: value.to_string(),
            },
        };
        self.error = None;
        self.submitting = true;
        Some(mutation)
    }
}

/// What an edit dialog is editing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditTarget {
    Feed(i64),
    Category(i64),
    Stream(i64),
    /// A top-level view. Only the layout style is editable and it is stored
    /// locally.
    Global(ViewKind),
}

/// Selectable rows of the edit dialog, top to bottom.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditRow {
    Name,
    Layout,
    ExcludeAll,
    Feed(i64),
}

/// Result of submitting the edit dialog.
#[derive(Debug, Clone, PartialEq)]
pub enum EditSubmit {
    /// Layout style of a top-level view, kept in the local store.
    Local { kind: ViewKind, style: LayoutStyle },
    Remote(Mutation),
}

/// Draft state of the edit dialog.
#[derive(Debug, Clone, PartialEq)]
pub struct EditModal {
    pub target: EditTarget,
    /// Name at the time the dialog opened, shown in the title.
    pub current_name: String,
    pub name: String,
    pub url: Option<String>,
    pub layout_style: LayoutStyle,
    /// Exclude-from-"All" flag per feed id. One entry for a feed, one per
    /// member feed for a category, empty otherwise.
    pub feed_states: BTreeMap<i64, bool>,
    pub exclude_all: bool,
    pub cursor: usize,
    pub error: Option<String>,
    pub submitting: bool,
}

impl EditModal {
    fn base(target: EditTarget, name: &str, layout_style: LayoutStyle) -> Self {
        Self {
            target,
            current_name: name.to_string(),
            name: name.to_string(),
            url: None,
            layout_style,
            feed_states: BTreeMap::new(),
            exclude_all: false,
            cursor: 0,
            error: None,
            submitting: false,
        }
    }

    pub fn for_feed(feed: &Feed) -> Self {
        let mut modal = Self::base(EditTarget::Feed(feed.id), &feed.title, feed.layout_style);
        modal.url = Some(feed.url.clone());
        modal.feed_states.insert(feed.id, feed.exclude_from_all);
        modal.exclude_all = feed.exclude_from_all;
        modal
    }

    pub fn for_category(category: &Category, data: &AppData) -> Self {
        let mut modal = Self::base(
            EditTarget::Category(category.id),
            &category.name,
            category.layout_style,
        );
        modal.feed_states = data
            .feeds_in_category(category.id)
            .into_iter()
            .map(|f| (f.id, f.exclude_from_all))
            .collect();
        modal.update_exclude_all_state();
        modal
    }

    pub fn for_stream(stream: &CustomStream) -> Self {
        Self::base(
            EditTarget::Stream(stream.id),
            &stream.name,
            stream.layout_style,
        )
    }

    pub fn for_global(kind: ViewKind, local_style: Option<LayoutStyle>) -> Self {
        Self::base(
            EditTarget::Global(kind),
            kind.default_title(),
            local_style.unwrap_or_default(),
        )
    }

    pub fn rows(&self) -> Vec<EditRow> {
        match self.target {
            EditTarget::Global(_) => vec![EditRow::Layout],
            EditTarget::Stream(_) => vec![EditRow::Name, EditRow::Layout],
            EditTarget::Feed(_) => vec![EditRow::Name, EditRow::Layout, EditRow::ExcludeAll],
            EditTarget::Category(_) => {
                let mut rows = vec![EditRow::Name, EditRow::Layout];
                if !self.feed_states.is_empty() {
                    rows.push(EditRow::ExcludeAll);
                    rows.extend(self.feed_states.keys().map(|id| EditRow::Feed(*id)));
                }
                rows
            }
        }
    }

    pub fn current_row(&self) -> Option<EditRow> {
        self.rows().get(self.cursor).copied()
    }

    pub fn move_cursor(&mut self, down: bool) {
        let last = self.rows().len().saturating_sub(1);
        self.cursor = if down {
            (self.cursor + 1).min(last)
        } else {
            self.cursor.saturating_sub(1)
        };
    }

    /// Set every feed's exclusion flag at once.
    pub fn toggle_exclude_all(&mut self, value: bool) {
        self.exclude_all = value;
        for state in self.feed_states.values_mut() {
            *state = value;
        }
    }

    /// Recompute the aggregate flag after a single feed changed.
    pub fn update_exclude_all_state(&mut self) {
        self.exclude_all =
            !self.feed_states.is_empty() && self.feed_states.values().all(|excluded| *excluded);
    }

    pub fn toggle_feed(&mut self, feed_id: i64) {
        if let Some(state) = self.feed_states.get_mut(&feed_id) {
            *state = !*state;
        }
        self.update_exclude_all_state();
    }

    /// Activate the row under the cursor (Space).
    pub fn toggle_current(&mut self) {
        match self.current_row() {
            Some(EditRow::Layout) => self.layout_style = self.layout_style.next(),
            Some(EditRow::ExcludeAll) => self.toggle_exclude_all(!self.exclude_all),
            Some(EditRow::Feed(id)) => self.toggle_feed(id),
            Some(EditRow::Name) | None => {}
        }
    }

    pub fn submit(&mut self) -> Result<EditSubmit, String> {
        let name = self.name.trim().to_string();
        if name.is_empty() && !matches!(self.target, EditTarget::Global(_)) {
            self.error = Some("Name cannot be empty".to_string());
            return Err("Name cannot be empty".to_string());
        }

        let submit = match self.target {
            EditTarget::Global(kind) => EditSubmit::Local {
                kind,
                style: self.layout_style,
            },
            EditTarget::Feed(id) => EditSubmit::Remote(Mutation::UpdateFeed {
                id,
                name,
                layout_style: self.layout_style,
                exclude_from_all: self
                    .feed_states
                    .get(&id)
                    .copied()
                    .unwrap_or(self.exclude_all),
            }),
            EditTarget::Category(id) => EditSubmit::Remote(Mutation::UpdateCategory {
                id,
                name,
                layout_style: self.layout_style,
                feed_exclusion_states: self.feed_states.clone(),
            }),
            EditTarget::Stream(id) => EditSubmit::Remote(Mutation::UpdateCustomStream {
                id,
                name,
                layout_style: self.layout_style,
            }),
        };
        self.error = None;
        self.submitting = matches!(submit, EditSubmit::Remote(_));
        Ok(submit)
    }
}

/// Rows of the bulk-assign dialog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignRow {
    NoCategory,
    Category(i64),
    Stream(i64),
}

/// Bulk assignment of the selected feeds to a category and streams.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AssignDialog {
    pub category_id: Option<i64>,
    pub stream_ids: BTreeSet<i64>,
    pub cursor: usize,
    pub error: Option<String>,
}

impl AssignDialog {
    pub fn rows(data: &AppData) -> Vec<AssignRow> {
        let mut rows = vec![AssignRow::NoCategory];
        rows.extend(data.categories.iter().map(|c| AssignRow::Category(c.id)));
        rows.extend(data.custom_streams.iter().map(|s| AssignRow::Stream(s.id)));
        rows
    }

    pub fn toggle(&mut self, row: AssignRow) {
        match row {
            AssignRow::NoCategory => self.category_id = None,
            AssignRow::Category(id) => self.category_id = Some(id),
            AssignRow::Stream(id) => {
                if !self.stream_ids.remove(&id) {
                    self.stream_ids.insert(id);
                }
            }
        }
    }
}

/// A feed picked up for moving; the next selected category or stream is
/// the drop target.
#[derive(Debug, Clone, PartialEq)]
pub struct MoveState {
    pub feed_id: i64,
    pub title: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathAction {
    Import,
    Export,
}

/// File path prompt for OPML import/export.
#[derive(Debug, Clone, PartialEq)]
pub struct PathPrompt {
    pub action: PathAction,
    pub input: String,
    pub error: Option<String>,
}

// ============================================================================
// Reader and Playback
// ============================================================================

/// The article open in the reader with its rendered body.
#[derive(Debug, Clone)]
pub struct ReaderState {
    pub article: Article,
    pub embed: Option<Embed>,
    pub lines: Vec<String>,
}

/// Side effects requested by opening an article.
#[derive(Debug, Clone, PartialEq)]
pub struct Opened {
    pub mark_read: Option<Mutation>,
    /// Start the external player on this URL.
    pub play: Option<PlayRequest>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayRequest {
    pub article_id: i64,
    pub generation: u64,
    pub url: String,
}

// ============================================================================
// Requests handed to the event loop
// ============================================================================

/// A page fetch to spawn. The generation ties the response to the view and
/// filter combination that asked for it.
#[derive(Debug, Clone, PartialEq)]
pub struct PageRequest {
    pub generation: u64,
    pub query: ArticleQuery,
}

/// Events from background tasks
pub enum AppEvent {
    /// Snapshot fetched outside a mutation (initial load, import).
    AppDataLoaded {
        seq: u64,
        result: Result<AppData, ApiError>,
        initial: bool,
    },
    /// One page of articles for `generation`.
    ArticlesLoaded {
        generation: u64,
        page: u32,
        result: Result<ArticlesPage, ApiError>,
    },
    /// `POST /api/refresh_all_feeds` finished. `snapshot` is absent when the
    /// server could not be reached at all.
    RefreshFinished {
        auto: bool,
        summary: Result<RefreshSummary, ApiError>,
        snapshot: Option<(u64, Result<AppData, ApiError>)>,
    },
    MutationFinished {
        mutation: Mutation,
        result: Result<Resynced, ApiError>,
    },
    ImportFinished(Result<String, String>),
    ExportFinished(Result<String, String>),
    /// The external player exited.
    PlaybackFinished {
        article_id: i64,
        generation: u64,
        success: bool,
    },
    PreferenceSaveFailed {
        key: String,
        error: String,
    },
    /// A background task panicked.
    ///
    /// Fields:
    /// - `task`: Name of the task that panicked (e.g., "refresh", "page_load")
    /// - `error`: The panic message extracted from the panic payload
    TaskPanicked {
        task: &'static str,
        error: String,
    },
}

// ============================================================================
// Application State
// ============================================================================

/// Central application state. Only the event loop mutates it; background
/// tasks report back through [`AppEvent`].
pub struct App {
    pub api: ApiClient,
    /// Local preference store. `None` when it could not be opened.
    pub db: Option<Database>,
    pub prefs: PreferenceManager,
    pub keybindings: KeybindingRegistry,
    /// External player command line, if configured.
    pub player: Option<Vec<String>>,

    // Snapshot
    pub data: AppData,
    pub data_seq: DataSequence,
    /// Sequence of the last snapshot applied.
    pub applied_seq: u64,

    // Article buffer and pagination
    pub view: View,
    pub articles: Vec<Article>,
    /// Next page to request.
    pub current_page: u32,
    pub total_pages: u32,
    pub has_next_page: bool,
    pub page_generation: u64,
    pub is_loading_articles: bool,
    pub is_refreshing: bool,

    // Filters
    pub search_mode: bool,
    pub search_query: String,
    pub sort_order: SortOrder,
    pub unread_only: bool,
    pub smart_cap: bool,

    // UI State
    pub screen: Screen,
    pub focus: Focus,
    pub sidebar_selected: usize,
    /// Index into the filtered article list.
    pub selected_article: usize,
    pub open_categories: HashSet<i64>,
    pub open_streams: HashSet<i64>,
    pub collapsed_sections: HashSet<Section>,

    // Dialogs
    pub add_form: Option<AddForm>,
    pub edit_modal: Option<EditModal>,
    pub selected_feed_ids: BTreeSet<i64>,
    pub assign: Option<AssignDialog>,
    pub move_mode: Option<MoveState>,
    /// Destructive mutation waiting for confirmation.
    pub pending_confirm: Option<Mutation>,
    pub path_prompt: Option<PathPrompt>,

    // Reader
    pub reader: Option<ReaderState>,
    /// Filtered article ids at the time the reader was opened.
    pub nav_order: Vec<i64>,
    pub scroll_offset: usize,
    /// Last known reader viewport height, excluding borders.
    pub reader_visible_lines: usize,
    /// Last known reader viewport width, excluding borders.
    pub reader_viewport_width: usize,

    // Playback
    /// Article whose media is playing in the external player.
    pub playing: Option<i64>,
    pub playback_generation: u64,
    pub playback_handle: Option<tokio::task::JoinHandle<()>>,

    // Status message with expiry. Cow avoids allocation for static literals.
    pub status_message: Option<(Cow<'static, str>, Instant)>,

    /// Dirty flag to skip unnecessary frame renders
    pub needs_redraw: bool,

    /// Whether the help overlay is currently displayed.
    pub show_help: bool,
    /// Scroll offset in the help screen for long keybinding lists.
    pub help_scroll_offset: usize,
}

impl App {
    pub fn new(
        api: ApiClient,
        db: Option<Database>,
        prefs: PreferenceManager,
        keybindings: KeybindingRegistry,
        player: Option<Vec<String>>,
    ) -> Self {
        let sort_order = prefs.default_sort();
        let smart_cap = prefs.smart_cap();
        Self {
            api,
            db,
            prefs,
            keybindings,
            player,
            data: AppData::default(),
            data_seq: DataSequence::new(),
            applied_seq: 0,
            view: View::all(),
            articles: Vec::new(),
            current_page: 1,
            total_pages: 0,
            has_next_page: false,
            page_generation: 0,
            is_loading_articles: false,
            is_refreshing: false,
            search_mode: false,
            search_query: String::new(),
            sort_order,
            unread_only: false,
            smart_cap,
            screen: Screen::Browse,
            focus: Focus::Sidebar,
            sidebar_selected: 0,
            selected_article: 0,
            open_categories: HashSet::new(),
            open_streams: HashSet::new(),
            collapsed_sections: HashSet::from([Section::Removed]),
            add_form: None,
            edit_modal: None,
            selected_feed_ids: BTreeSet::new(),
            assign: None,
            move_mode: None,
            pending_confirm: None,
            path_prompt: None,
            reader: None,
            nav_order: Vec::new(),
            scroll_offset: 0,
            reader_visible_lines: 0,
            reader_viewport_width: 0,
            playing: None,
            playback_generation: 0,
            playback_handle: None,
            status_message: None,
            needs_redraw: true,
            show_help: false,
            help_scroll_offset: 0,
        }
    }

    // ========================================================================
    // Views and pagination
    // ========================================================================

    fn query_for(&self, page: u32) -> ArticleQuery {
        ArticleQuery {
            page,
            view_type: self.view.kind,
            view_id: self.view.id,
            author_name: (self.view.kind == ViewKind::Author)
                .then(|| self.view.title.clone())
                .flatten(),
            unread_only: self.unread_only,
            smart_cap: self.smart_cap,
        }
    }

    /// Switch the active view. Clears the search query and the buffer and
    /// returns the page-1 fetch to spawn.
    pub fn set_view(&mut self, kind: ViewKind, id: Option<i64>, title: Option<String>) -> PageRequest {
        self.view = View::new(kind, id, title, &self.data);
        self.search_query.clear();
        self.search_mode = false;
        tracing::debug!(view = kind.as_str(), id = ?id, "Switching view");
        self.reload_first_page()
    }

    /// Reset pagination for the current view and filters.
    pub fn reload_first_page(&mut self) -> PageRequest {
        self.articles.clear();
        self.selected_article = 0;
        self.current_page = 1;
        self.total_pages = 0;
        self.has_next_page = false;
        self.page_generation += 1;
        self.is_loading_articles = true;
        PageRequest {
            generation: self.page_generation,
            query: self.query_for(1),
        }
    }

    /// Next page of the current view, unless one is in flight or there is
    /// nothing more.
    pub fn load_more(&mut self) -> Option<PageRequest> {
        if self.is_loading_articles || !self.has_next_page {
            return None;
        }
        self.is_loading_articles = true;
        Some(PageRequest {
            generation: self.page_generation,
            query: self.query_for(self.current_page),
        })
    }

    /// Apply a page response. Stale responses (older generation or a page
    /// other than the one expected) are dropped. Returns whether it applied.
    pub fn apply_articles_page(
        &mut self,
        generation: u64,
        page: u32,
        result: Result<ArticlesPage, ApiError>,
    ) -> bool {
        if generation != self.page_generation || page != self.current_page {
            tracing::debug!(
                generation,
                page,
                current_generation = self.page_generation,
                current_page = self.current_page,
                "Dropping stale articles page"
            );
            return false;
        }
        self.is_loading_articles = false;

        match result {
            Ok(page_data) => {
                tracing::debug!(
                    page,
                    count = page_data.articles.len(),
                    has_next = page_data.has_next,
                    "Articles page loaded"
                );
                self.articles.extend(page_data.articles);
                self.has_next_page = page_data.has_next;
                self.total_pages = page_data.total_pages;
                if page_data.is_reddit_source {
                    self.view.is_reddit_source = true;
                }
                self.current_page += 1;
                self.clamp_selections();
                true
            }
            Err(e) => {
                tracing::warn!(error = %e, page, "Failed to load articles");
                false
            }
        }
    }

    /// Apply a snapshot if it is newer than the last one applied.
    pub fn apply_app_data(&mut self, seq: u64, result: Result<AppData, ApiError>) -> bool {
        if seq <= self.applied_seq {
            tracing::debug!(seq, applied = self.applied_seq, "Dropping stale snapshot");
            return false;
        }
        match result {
            Ok(data) => {
                self.applied_seq = seq;
                self.data = data;
                let feeds: HashSet<i64> = self.data.feeds.iter().map(|f| f.id).collect();
                self.selected_feed_ids.retain(|id| feeds.contains(id));
                self.clamp_selections();
                true
            }
            Err(e) => {
                tracing::warn!(error = %e, seq, "Failed to load app data");
                false
            }
        }
    }

    pub fn toggle_unread_only(&mut self) -> PageRequest {
        self.unread_only = !self.unread_only;
        self.set_status(if self.unread_only {
            "Showing unread only"
        } else {
            "Showing all articles"
        });
        self.reload_first_page()
    }

    /// Flip smart cap. Returns the fetch plus the preference to persist.
    pub fn toggle_smart_cap(&mut self) -> (PageRequest, (String, String)) {
        self.smart_cap = !self.smart_cap;
        let pref = self.prefs.set_smart_cap(self.smart_cap);
        self.set_status(if self.smart_cap {
            "Smart cap on"
        } else {
            "Smart cap off"
        });
        (self.reload_first_page(), pref)
    }

    pub fn toggle_sort(&mut self) {
        self.sort_order = self.sort_order.toggle();
        self.selected_article = 0;
        self.set_status(self.sort_order.label());
    }

    /// Effective layout of the current view.
    pub fn layout_mode(&self) -> LayoutStyle {
        self.view.layout_mode(self.prefs.view_style(self.view.kind))
    }

    // ========================================================================
    // Refresh
    // ========================================================================

    /// Claim the refresh guard. A refresh already in flight drops this one.
    pub fn begin_refresh(&mut self, auto: bool) -> bool {
        if self.is_refreshing {
            tracing::debug!(auto, "Refresh already running, skipping");
            return false;
        }
        self.is_refreshing = true;
        if !auto {
            self.set_status("Refreshing feeds...");
        }
        true
    }

    /// Clear the in-flight flag owned by a background task that died
    /// without reporting its result.
    pub fn release_task_guards(&mut self, task: &str) {
        match task {
            "refresh" | "initial_load" => self.is_refreshing = false,
            "page_load" => self.is_loading_articles = false,
            "playback" => self.playing = None,
            "mutation" => {
                if let Some(form) = self.add_form.as_mut() {
                    form.submitting = false;
                }
                if let Some(modal) = self.edit_modal.as_mut() {
                    modal.submitting = false;
                }
            }
            _ => {}
        }
    }

    /// Finish a refresh. Returns the page-1 reload unless the server was
    /// unreachable.
    pub fn finish_refresh(
        &mut self,
        auto: bool,
        summary: Result<RefreshSummary, ApiError>,
        snapshot: Option<(u64, Result<AppData, ApiError>)>,
    ) -> Option<PageRequest> {
        self.is_refreshing = false;
        if let Some((seq, result)) = snapshot {
            self.apply_app_data(seq, result);
        }

        let message = match &summary {
            Ok(s) if s.success => match (&s.message, s.added_count) {
                (Some(m), _) if !m.is_empty() => m.clone(),
                (_, Some(n)) => format!("Refreshed, {} new articles", n),
                _ => "Feeds refreshed".to_string(),
            },
            Ok(s) => match s.errors.first() {
                Some(first) => format!("Refresh failed: {}", first),
                None => "Refresh failed".to_string(),
            },
            Err(e) => format!("Refresh failed: {}", e),
        };

        if auto {
            tracing::info!(message = %message, "Auto-refresh finished");
        } else {
            self.set_status(message);
        }

        match summary {
            Err(ApiError::Network(_)) => None,
            _ => Some(self.reload_first_page()),
        }
    }

    // ========================================================================
    // Mutations
    // ========================================================================

    /// Route a mutation: destructive ones wait for confirmation, the rest
    /// are returned to be sent now.
    pub fn request_mutation(&mut self, mutation: Mutation) -> Option<Mutation> {
        if mutation.is_destructive() {
            self.pending_confirm = Some(mutation);
            None
        } else {
            Some(mutation)
        }
    }

    pub fn confirm_pending(&mut self) -> Option<Mutation> {
        self.pending_confirm.take()
    }

    pub fn cancel_pending(&mut self) {
        if self.pending_confirm.take().is_some() {
            self.set_status("Cancelled");
        }
    }

    /// Apply a finished mutation: the resynced snapshot first, then the
    /// per-mutation follow-up. Returns a page fetch when the buffer must be
    /// reloaded.
    pub fn apply_mutation_result(
        &mut self,
        mutation: &Mutation,
        result: Result<Resynced, ApiError>,
    ) -> Option<PageRequest> {
        let resynced = match result {
            Ok(resynced) => resynced,
            Err(e) => {
                self.show_mutation_error(mutation, &e);
                return None;
            }
        };
        self.apply_app_data(resynced.seq, resynced.snapshot);

        match mutation {
            Mutation::AddFeed { .. } => {
                self.add_form = None;
                self.set_status(mutation.success_message());
                Some(self.reload_first_page())
            }
            Mutation::AddCategory { .. } | Mutation::AddCustomStream { .. } => {
                self.add_form = None;
                self.set_status(mutation.success_message());
                None
            }
            Mutation::UpdateFeed { id, name, .. } => self.finish_edit(ViewKind::Feed, *id, name),
            Mutation::UpdateCategory { id, name, .. } => {
                self.finish_edit(ViewKind::Category, *id, name)
            }
            Mutation::UpdateCustomStream { id, name, .. } => {
                self.finish_edit(ViewKind::CustomStream, *id, name)
            }
            Mutation::AssignFeedsBulk { .. } => {
                self.assign = None;
                self.selected_feed_ids.clear();
                self.set_status(mutation.success_message());
                None
            }
            Mutation::ToggleFavorite(id) => {
                let flag = resynced.response.get("is_favorite").and_then(|v| v.as_bool());
                self.apply_article_flag(*id, flag, |a, v| a.is_favorite = v);
                (self.view.kind == ViewKind::Favorites).then(|| self.reload_first_page())
            }
            Mutation::ToggleBookmark(id) => {
                let flag = resynced
                    .response
                    .get("is_read_later")
                    .and_then(|v| v.as_bool());
                self.apply_article_flag(*id, flag, |a, v| a.is_read_later = v);
                (self.view.kind == ViewKind::ReadLater).then(|| self.reload_first_page())
            }
            Mutation::MarkRead(_) => None,
            Mutation::MarkAllRead { .. } => {
                self.set_status(mutation.success_message());
                Some(self.reload_first_page())
            }
            Mutation::MoveFeed { .. } | Mutation::AddFeedToStream { .. } => {
                self.move_mode = None;
                self.set_status(mutation.success_message());
                None
            }
            Mutation::RemoveFeed(id) | Mutation::DeleteFeedPermanently(id) => {
                self.set_status(mutation.success_message());
                self.leave_deleted_view(ViewKind::Feed, *id)
            }
            Mutation::DeleteCategory(id) => {
                self.set_status(mutation.success_message());
                self.leave_deleted_view(ViewKind::Category, *id)
            }
            Mutation::RemoveCustomStream(id) | Mutation::DeleteCustomStreamPermanently(id) => {
                self.set_status(mutation.success_message());
                self.leave_deleted_view(ViewKind::CustomStream, *id)
            }
            Mutation::RestoreFeed(_)
            | Mutation::RestoreCustomStream(_)
            | Mutation::RemoveFeedFromStream { .. } => {
                self.set_status(mutation.success_message());
                None
            }
        }
    }

    fn show_mutation_error(&mut self, mutation: &Mutation, error: &ApiError) {
        tracing::warn!(error = %error, path = %mutation.path(), "Mutation failed");
        let message = error.to_string();
        match mutation {
            Mutation::AddFeed { .. } | Mutation::AddCategory { .. } | Mutation::AddCustomStream { .. } => {
                match self.add_form.as_mut() {
                    Some(form) => {
                        form.submitting = false;
                        form.error = Some(message);
                    }
                    None => self.set_status(message),
                }
            }
            Mutation::UpdateFeed { .. }
            | Mutation::UpdateCategory { .. }
            | Mutation::UpdateCustomStream { .. } => match self.edit_modal.as_mut() {
                Some(modal) => {
                    modal.submitting = false;
                    modal.error = Some(message);
                }
                None => self.set_status(message),
            },
            Mutation::AssignFeedsBulk { .. } => {
                let message = format!("Error assigning feeds: {}", message);
                match self.assign.as_mut() {
                    Some(dialog) => dialog.error = Some(message),
                    None => self.set_status(message),
                }
            }
            // Fire-and-forget: the optimistic flag stays.
            Mutation::MarkRead(_) => {}
            _ => self.set_status(message),
        }
    }

    fn finish_edit(&mut self, kind: ViewKind, id: i64, name: &str) -> Option<PageRequest> {
        self.edit_modal = None;
        self.set_status("Changes saved");
        self.view
            .is(kind, Some(id))
            .then(|| self.set_view(kind, Some(id), Some(name.to_string())))
    }

    /// Fall back to "All" when the active view's entity was deleted.
    fn leave_deleted_view(&mut self, kind: ViewKind, id: i64) -> Option<PageRequest> {
        self.view
            .is(kind, Some(id))
            .then(|| self.set_view(ViewKind::All, None, None))
    }

    /// Apply a server-returned article flag to every in-memory copy.
    fn apply_article_flag(&mut self, id: i64, flag: Option<bool>, set: impl Fn(&mut Article, bool)) {
        let Some(value) = flag else {
            tracing::warn!(article_id = id, "Toggle response carried no flag");
            return;
        };
        for article in self.articles.iter_mut().filter(|a| a.id == id) {
            set(article, value);
        }
        if let Some(reader) = self.reader.as_mut().filter(|r| r.article.id == id) {
            set(&mut reader.article, value);
        }
    }

    // ========================================================================
    // Derived lists
    // ========================================================================

    /// The article list as displayed: search-filtered and sorted.
    pub fn filtered(&self) -> Vec<&Article> {
        filtered_articles(&self.articles, &self.search_query, self.sort_order)
    }

    pub fn selected_article(&self) -> Option<&Article> {
        self.filtered().get(self.selected_article).copied()
    }

    /// Flatten the sidebar tree. Recomputed on demand from the snapshot.
    pub fn sidebar_items(&self) -> Vec<SidebarItem> {
        let mut items: Vec<SidebarItem> =
            ViewKind::TOP_LEVEL.iter().map(|k| SidebarItem::View(*k)).collect();

        items.push(SidebarItem::Header(Section::Categories));
        if !self.collapsed_sections.contains(&Section::Categories) {
            for category in &self.data.categories {
                items.push(SidebarItem::Category(category.id));
                if self.open_categories.contains(&category.id) {
                    items.extend(self.data.feeds_in_category(category.id).iter().map(|f| {
                        SidebarItem::Feed {
                            feed_id: f.id,
                            parent: FeedParent::Category(category.id),
                        }
                    }));
                }
            }
            // Feeds whose category is missing from the snapshot count as uncategorized.
            let known: HashSet<i64> = self.data.categories.iter().map(|c| c.id).collect();
            items.extend(
                self.data
                    .feeds
                    .iter()
                    .filter(|f| f.category_id.map_or(true, |id| !known.contains(&id)))
                    .map(|f| SidebarItem::Feed {
                        feed_id: f.id,
                        parent: FeedParent::Uncategorized,
                    }),
            );
        }

        items.push(SidebarItem::Header(Section::Streams));
        if !self.collapsed_sections.contains(&Section::Streams) {
            for stream in &self.data.custom_streams {
                items.push(SidebarItem::Stream(stream.id));
                if self.open_streams.contains(&stream.id) {
                    items.extend(self.data.feeds_in_stream(stream.id).iter().map(|f| {
                        SidebarItem::Feed {
                            feed_id: f.id,
                            parent: FeedParent::Stream(stream.id),
                        }
                    }));
                }
            }
        }

        if !self.data.removed_feeds.is_empty() || !self.data.removed_streams.is_empty() {
            items.push(SidebarItem::Header(Section::Removed));
            if !self.collapsed_sections.contains(&Section::Removed) {
                items.extend(self.data.removed_feeds.iter().map(|f| SidebarItem::RemovedFeed(f.id)));
                items.extend(
                    self.data
                        .removed_streams
                        .iter()
                        .map(|s| SidebarItem::RemovedStream(s.id)),
                );
            }
        }
        items
    }

    pub fn selected_sidebar_item(&self) -> Option<SidebarItem> {
        self.sidebar_items().get(self.sidebar_selected).copied()
    }

    /// Display label for a sidebar row.
    pub fn sidebar_label(&self, item: &SidebarItem) -> String {
        match item {
            SidebarItem::View(kind) => kind.default_title().to_string(),
            SidebarItem::Header(section) => section.label().to_string(),
            SidebarItem::Category(id) => self
                .data
                .category(*id)
                .map(|c| c.name.clone())
                .unwrap_or_default(),
            SidebarItem::Stream(id) => self
                .data
                .stream(*id)
                .map(|s| s.name.clone())
                .unwrap_or_default(),
            SidebarItem::Feed { feed_id, .. } => self
                .data
                .feed(*feed_id)
                .map(|f| f.title.clone())
                .unwrap_or_default(),
            SidebarItem::RemovedFeed(id) => self
                .data
                .removed_feeds
                .iter()
                .find(|f| f.id == *id)
                .map(|f| f.title.clone())
                .unwrap_or_default(),
            SidebarItem::RemovedStream(id) => self
                .data
                .removed_streams
                .iter()
                .find(|s| s.id == *id)
                .map(|s| s.name.clone())
                .unwrap_or_default(),
        }
    }

    /// Whether a sidebar row is the active view.
    pub fn sidebar_item_is_active(&self, item: &SidebarItem) -> bool {
        match item {
            SidebarItem::View(kind) => self.view.is(*kind, None),
            SidebarItem::Category(id) => self.view.is(ViewKind::Category, Some(*id)),
            SidebarItem::Stream(id) => self.view.is(ViewKind::CustomStream, Some(*id)),
            SidebarItem::Feed { feed_id, .. } => self.view.is(ViewKind::Feed, Some(*feed_id)),
            _ => false,
        }
    }

    /// Category under the sidebar cursor, used as the add-feed target.
    fn cursor_category(&self) -> Option<i64> {
        match self.selected_sidebar_item()? {
            SidebarItem::Category(id) => Some(id),
            SidebarItem::Feed {
                parent: FeedParent::Category(id),
                ..
            } => Some(id),
            _ => None,
        }
    }

    // ========================================================================
    // Sidebar actions
    // ========================================================================

    /// Enter on a sidebar row. In move mode the row is the drop target.
    pub fn activate_sidebar(&mut self) -> SidebarOutcome {
        let Some(item) = self.selected_sidebar_item() else {
            return SidebarOutcome::None;
        };

        if let Some(moving) = self.move_mode.clone() {
            return match item {
                SidebarItem::Category(id) => SidebarOutcome::Send(Mutation::MoveFeed {
                    feed_id: moving.feed_id,
                    new_category_id: id,
                }),
                SidebarItem::Stream(id) => SidebarOutcome::Send(Mutation::AddFeedToStream {
                    custom_stream_id: id,
                    feed_id: moving.feed_id,
                }),
                _ => {
                    self.set_status("Drop onto a category or stream (Esc cancels)");
                    SidebarOutcome::None
                }
            };
        }

        let label = self.sidebar_label(&item);
        match item {
            SidebarItem::View(kind) => SidebarOutcome::Load(self.set_view(kind, None, None)),
            SidebarItem::Header(section) => {
                self.toggle_section(section);
                SidebarOutcome::None
            }
            SidebarItem::Category(id) => {
                SidebarOutcome::Load(self.set_view(ViewKind::Category, Some(id), Some(label)))
            }
            SidebarItem::Stream(id) => {
                SidebarOutcome::Load(self.set_view(ViewKind::CustomStream, Some(id), Some(label)))
            }
            SidebarItem::Feed { feed_id, .. } => {
                SidebarOutcome::Load(self.set_view(ViewKind::Feed, Some(feed_id), Some(label)))
            }
            SidebarItem::RemovedFeed(_) | SidebarItem::RemovedStream(_) => {
                self.set_status("Removed. Press u to restore");
                SidebarOutcome::None
            }
        }
    }

    fn toggle_section(&mut self, section: Section) {
        if !self.collapsed_sections.remove(&section) {
            self.collapsed_sections.insert(section);
        }
        self.clamp_selections();
    }

    /// Expand or collapse the category, stream or section under the cursor.
    pub fn toggle_collapse(&mut self) {
        match self.selected_sidebar_item() {
            Some(SidebarItem::Category(id)) => {
                if !self.open_categories.remove(&id) {
                    self.open_categories.insert(id);
                }
            }
            Some(SidebarItem::Stream(id)) => {
                if !self.open_streams.remove(&id) {
                    self.open_streams.insert(id);
                }
            }
            Some(SidebarItem::Header(section)) => self.toggle_section(section),
            _ => {}
        }
        self.clamp_selections();
    }

    /// Mutation for `d` on the row under the cursor.
    pub fn delete_target(&self) -> Option<Mutation> {
        match self.selected_sidebar_item()? {
            SidebarItem::Feed {
                feed_id,
                parent: FeedParent::Stream(stream_id),
            } => Some(Mutation::RemoveFeedFromStream {
                custom_stream_id: stream_id,
                feed_id,
            }),
            SidebarItem::Feed { feed_id, .. } => Some(Mutation::RemoveFeed(feed_id)),
            SidebarItem::Category(id) => Some(Mutation::DeleteCategory(id)),
            SidebarItem::Stream(id) => Some(Mutation::RemoveCustomStream(id)),
            SidebarItem::RemovedFeed(id) => Some(Mutation::DeleteFeedPermanently(id)),
            SidebarItem::RemovedStream(id) => Some(Mutation::DeleteCustomStreamPermanently(id)),
            SidebarItem::View(_) | SidebarItem::Header(_) => None,
        }
    }

    /// Mutation for `u` on the row under the cursor.
    pub fn restore_target(&self) -> Option<Mutation> {
        match self.selected_sidebar_item()? {
            SidebarItem::RemovedFeed(id) => Some(Mutation::RestoreFeed(id)),
            SidebarItem::RemovedStream(id) => Some(Mutation::RestoreCustomStream(id)),
            _ => None,
        }
    }

    pub fn toggle_feed_selection(&mut self) {
        if let Some(SidebarItem::Feed { feed_id, .. }) = self.selected_sidebar_item() {
            if !self.selected_feed_ids.remove(&feed_id) {
                self.selected_feed_ids.insert(feed_id);
            }
            self.set_status(format!("{} feeds selected", self.selected_feed_ids.len()));
        }
    }

    pub fn open_assign(&mut self) {
        if self.selected_feed_ids.is_empty() {
            self.set_status("Select feeds with x first");
            return;
        }
        self.assign = Some(AssignDialog::default());
    }

    /// Build the bulk-assign mutation from the open dialog.
    pub fn submit_assign(&mut self) -> Option<Mutation> {
        let dialog = self.assign.as_ref()?;
        Some(Mutation::AssignFeedsBulk {
            feed_ids: self.selected_feed_ids.iter().copied().collect(),
            category_id: dialog.category_id,
            stream_ids: dialog.stream_ids.iter().copied().collect(),
        })
    }

    pub fn start_move(&mut self) {
        if let Some(SidebarItem::Feed { feed_id, .. }) = self.selected_sidebar_item() {
            let title = self.data.feed(feed_id).map(|f| f.title.clone()).unwrap_or_default();
            self.set_status(format!("Moving \"{}\": pick a category or stream", title));
            self.move_mode = Some(MoveState { feed_id, title });
        }
    }

    pub fn open_add_form(&mut self, kind: AddKind) {
        let category_id = match kind {
            AddKind::Feed => self.cursor_category(),
            _ => None,
        };
        self.add_form = Some(AddForm::new(kind, category_id));
    }

    /// Open the edit dialog for the sidebar row under the cursor.
    pub fn open_edit(&mut self) {
        let modal = match self.selected_sidebar_item() {
            Some(SidebarItem::Feed { feed_id, .. }) => self.data.feed(feed_id).map(EditModal::for_feed),
            Some(SidebarItem::Category(id)) => self
                .data
                .category(id)
                .map(|c| EditModal::for_category(c, &self.data)),
            Some(SidebarItem::Stream(id)) => self.data.stream(id).map(EditModal::for_stream),
            Some(SidebarItem::View(kind)) => {
                Some(EditModal::for_global(kind, self.prefs.view_style(kind)))
            }
            _ => None,
        };
        if modal.is_some() {
            self.edit_modal = modal;
        }
    }

    /// Open the settings of the current view. Top-level views open in
    /// global mode.
    pub fn open_view_settings(&mut self) {
        let modal = match (self.view.kind, self.view.id) {
            (kind, _) if kind.is_global() => {
                Some(EditModal::for_global(kind, self.prefs.view_style(kind)))
            }
            (ViewKind::Feed, Some(id)) => self.data.feed(id).map(EditModal::for_feed),
            (ViewKind::Category, Some(id)) => self
                .data
                .category(id)
                .map(|c| EditModal::for_category(c, &self.data)),
            (ViewKind::CustomStream, Some(id)) => self.data.stream(id).map(EditModal::for_stream),
            _ => None,
        };
        match modal {
            Some(modal) => self.edit_modal = Some(modal),
            None => self.set_status("This view has no settings"),
        }
    }

    /// Submit the edit dialog. Global edits are applied to the preference
    /// map here; the caller persists the returned pair.
    pub fn submit_edit(&mut self) -> Option<EditOutcome> {
        let submit = self.edit_modal.as_mut()?.submit().ok()?;
        match submit {
            EditSubmit::Local { kind, style } => {
                let pref = self.prefs.set_view_style(kind, style);
                self.edit_modal = None;
                self.set_status("Layout saved");
                Some(EditOutcome::Persist(pref.0, pref.1))
            }
            EditSubmit::Remote(mutation) => Some(EditOutcome::Send(mutation)),
        }
    }

    // ========================================================================
    // Article actions
    // ========================================================================

    pub fn toggle_favorite_target(&self) -> Option<Mutation> {
        self.action_article().map(|a| Mutation::ToggleFavorite(a.id))
    }

    pub fn toggle_read_later_target(&self) -> Option<Mutation> {
        self.action_article().map(|a| Mutation::ToggleBookmark(a.id))
    }

    pub fn mark_all_read_target(&self) -> Mutation {
        Mutation::MarkAllRead {
            view_type: self.view.kind,
            view_id: self.view.id,
            author_name: (self.view.kind == ViewKind::Author)
                .then(|| self.view.title.clone())
                .flatten(),
        }
    }

    /// The article actions apply to: the open one in the reader, otherwise
    /// the selected row.
    pub fn action_article(&self) -> Option<&Article> {
        match self.screen {
            Screen::Reader => self.reader.as_ref().map(|r| &r.article),
            Screen::Browse => self.selected_article(),
        }
    }

    /// Link of the article under the cursor, or `None` when there is no
    /// article or it has no link.
    pub fn copy_link_target(&self) -> Option<String> {
        let link = self.action_article()?.link.trim();
        (!link.is_empty()).then(|| link.to_string())
    }

    pub fn view_author(&mut self) -> Option<PageRequest> {
        let author = self
            .action_article()?
            .author
            .clone()
            .filter(|a| !a.trim().is_empty())?;
        self.exit_reader();
        self.focus = Focus::Articles;
        Some(self.set_view(ViewKind::Author, None, Some(author)))
    }

    // ========================================================================
    // Reader
    // ========================================================================

    /// Open the `index`-th article of the filtered list in the reader.
    pub fn open_article(&mut self, index: usize) -> Option<Opened> {
        let order: Vec<i64> = self.filtered().iter().map(|a| a.id).collect();
        let id = *order.get(index)?;
        self.nav_order = order;
        self.open_article_by_id(id)
    }

    fn open_article_by_id(&mut self, id: i64) -> Option<Opened> {
        let position = self.articles.iter().position(|a| a.id == id)?;
        let was_read = self.articles[position].is_read;
        self.articles[position].is_read = true;

        let article = self.articles[position].clone();
        let embed = detect_embed(&article, self.api.host());
        let lines = html_to_text(&render_article_content(&article, embed.as_ref()));

        if let Some(filtered_index) = self.nav_order.iter().position(|i| *i == id) {
            self.selected_article = filtered_index;
        }
        self.screen = Screen::Reader;
        self.scroll_offset = 0;

        let play = embed
            .as_ref()
            .filter(|e| self.player.is_some() && e.is_completion_detectable())
            .map(|e| e.playback_url())
            .map(|url| self.next_play_request(id, url));

        tracing::debug!(article_id = id, embed = ?embed.as_ref().map(|e| e.provider), "Opened article");
        self.reader = Some(ReaderState {
            article,
            embed,
            lines,
        });

        Some(Opened {
            mark_read: (!was_read).then_some(Mutation::MarkRead(id)),
            play,
        })
    }

    fn next_play_request(&mut self, article_id: i64, url: String) -> PlayRequest {
        self.playback_generation += 1;
        self.playing = Some(article_id);
        PlayRequest {
            article_id,
            generation: self.playback_generation,
            url,
        }
    }

    fn reader_position(&self) -> Option<usize> {
        let id = self.reader.as_ref()?.article.id;
        self.nav_order.iter().position(|i| *i == id)
    }

    pub fn next_article(&mut self) -> Option<Opened> {
        let next = self.reader_position()? + 1;
        let id = *self.nav_order.get(next)?;
        self.open_article_by_id(id)
    }

    pub fn previous_article(&mut self) -> Option<Opened> {
        let prev = self.reader_position()?.checked_sub(1)?;
        let id = *self.nav_order.get(prev)?;
        self.open_article_by_id(id)
    }

    /// Play the embed of the action article on demand.
    pub fn play_current(&mut self) -> Option<PlayRequest> {
        if self.player.is_none() {
            self.set_status("No player_command configured");
            return None;
        }
        let article = self.action_article()?.clone();
        let Some(embed) = detect_embed(&article, self.api.host()) else {
            self.set_status("No playable media in this article");
            return None;
        };
        Some(self.next_play_request(article.id, embed.playback_url()))
    }

    /// The player exited. On a clean exit, advance to the next entry whose
    /// media can be played to completion; stop at the end of the list.
    pub fn on_playback_finished(
        &mut self,
        article_id: i64,
        generation: u64,
        success: bool,
    ) -> Option<Opened> {
        if generation != self.playback_generation {
            return None;
        }
        self.playing = None;
        self.playback_handle = None;

        if !success {
            self.set_status("Player exited with an error");
            return None;
        }
        if self.screen != Screen::Reader
            || self.reader.as_ref().map(|r| r.article.id) != Some(article_id)
        {
            return None;
        }

        let start = self.reader_position()? + 1;
        let next = self.nav_order[start.min(self.nav_order.len())..]
            .iter()
            .copied()
            .find(|id| {
                self.articles
                    .iter()
                    .find(|a| a.id == *id)
                    .and_then(|a| detect_embed(a, self.api.host()))
                    .is_some_and(|e| e.is_completion_detectable())
            });

        match next {
            Some(id) => self.open_article_by_id(id),
            None => {
                self.set_status("End of list");
                None
            }
        }
    }

    pub fn stop_playback(&mut self) {
        if let Some(handle) = self.playback_handle.take() {
            handle.abort();
            tracing::debug!("Stopped playback task");
        }
        self.playing = None;
        self.playback_generation += 1;
    }

    /// Exit reader view back to browse
    pub fn exit_reader(&mut self) {
        self.screen = Screen::Browse;
        self.reader = None;
        self.scroll_offset = 0;
        self.clamp_selections();
    }

    // ========================================================================
    // Navigation
    // ========================================================================

    /// Move the cursor up in the focused panel.
    pub fn nav_up(&mut self) {
        match self.focus {
            Focus::Sidebar => self.sidebar_selected = self.sidebar_selected.saturating_sub(1),
            Focus::Articles => self.selected_article = self.selected_article.saturating_sub(1),
        }
    }

    /// Move the cursor down. Nearing the end of the article list requests
    /// the next page.
    pub fn nav_down(&mut self) -> Option<PageRequest> {
        match self.focus {
            Focus::Sidebar => {
                let max = self.sidebar_items().len().saturating_sub(1);
                self.sidebar_selected = (self.sidebar_selected + 1).min(max);
                None
            }
            Focus::Articles => {
                let len = self.filtered().len();
                if len == 0 {
                    return None;
                }
                self.selected_article = (self.selected_article + 1).min(len - 1);
                if self.selected_article + LOAD_MORE_THRESHOLD >= len {
                    self.load_more()
                } else {
                    None
                }
            }
        }
    }

    pub fn page_down(&mut self, lines: usize) -> Option<PageRequest> {
        let mut request = None;
        for _ in 0..lines.max(1) {
            request = request.or(self.nav_down());
        }
        request
    }

    pub fn page_up(&mut self, lines: usize) {
        for _ in 0..lines.max(1) {
            self.nav_up();
        }
    }

    pub fn cycle_focus(&mut self) {
        self.focus = match self.focus {
            Focus::Sidebar => Focus::Articles,
            Focus::Articles => Focus::Sidebar,
        };
    }

    // ========================================================================
    // Search
    // ========================================================================

    pub fn enter_search(&mut self) {
        self.search_mode = true;
        self.focus = Focus::Articles;
    }

    pub fn push_search_char(&mut self, c: char) {
        if self.search_query.chars().count() < MAX_SEARCH_QUERY_LENGTH {
            self.search_query.push(c);
            self.selected_article = 0;
        }
    }

    pub fn pop_search_char(&mut self) {
        self.search_query.pop();
        self.selected_article = 0;
    }

    /// Leave search mode and drop the query.
    pub fn exit_search(&mut self) {
        self.search_mode = false;
        self.search_query.clear();
        self.selected_article = 0;
    }

    /// Leave search mode, keeping the filter applied.
    pub fn commit_search(&mut self) {
        self.search_mode = false;
    }

    // ========================================================================
    // Reader scrolling
    // ========================================================================

    /// Scroll up in reader view
    pub fn scroll_up(&mut self, lines: usize) {
        self.scroll_offset = self.scroll_offset.saturating_sub(lines);
    }

    /// Scroll down in reader view
    pub fn scroll_down(&mut self, lines: usize) {
        self.scroll_offset = self.scroll_offset.saturating_add(lines);
    }

    /// Clamp scroll offset to valid range based on content and viewport size.
    pub fn clamp_scroll(&mut self, content_lines: usize, visible_lines: usize) {
        let max_scroll = content_lines.saturating_sub(visible_lines);
        self.scroll_offset = self.scroll_offset.min(max_scroll).min(MAX_SCROLL);
    }

    /// Display lines of the reader after soft wrapping, header included.
    pub fn reader_content_lines(&self) -> usize {
        let width = self.reader_viewport_width.max(1);
        let body: usize = self.reader.as_ref().map_or(1, |r| {
            r.lines
                .iter()
                .map(|line| display_width(line).max(1).div_ceil(width))
                .sum()
        });
        READER_HEADER_LINES + body
    }

    /// Clamp scroll offset using the viewport size from the last render.
    pub fn clamp_reader_scroll(&mut self) {
        let content_lines = self.reader_content_lines();
        self.clamp_scroll(content_lines, self.reader_visible_lines);
    }

    // ========================================================================
    // Status and bookkeeping
    // ========================================================================

    /// Set status message (will auto-expire after 3 seconds)
    pub fn set_status(&mut self, msg: impl Into<Cow<'static, str>>) {
        self.status_message = Some((msg.into(), Instant::now()));
    }

    /// Clear status message if expired (older than 3 seconds)
    /// Returns true if a message was actually cleared
    pub fn clear_expired_status(&mut self) -> bool {
        if let Some((_, time)) = &self.status_message {
            if time.elapsed().as_secs() >= 3 {
                self.status_message = None;
                return true;
            }
        }
        false
    }

    /// Clamp selection indices to valid ranges.
    ///
    /// Call after anything that may shrink a list: snapshot applied, page
    /// reset, section collapsed, search query changed.
    pub fn clamp_selections(&mut self) {
        let sidebar_len = self.sidebar_items().len();
        self.sidebar_selected = self.sidebar_selected.min(sidebar_len.saturating_sub(1));

        let article_len = self.filtered().len();
        self.selected_article = self.selected_article.min(article_len.saturating_sub(1));

        debug_assert!(
            sidebar_len == 0 || self.sidebar_selected < sidebar_len,
            "sidebar_selected {} out of bounds for len {}",
            self.sidebar_selected,
            sidebar_len
        );
        debug_assert!(
            article_len == 0 || self.selected_article < article_len,
            "selected_article {} out of bounds for len {}",
            self.selected_article,
            article_len
        );
    }
}

/// What activating a sidebar row asks the event loop to do.
#[derive(Debug, Clone, PartialEq)]
pub enum SidebarOutcome {
    None,
    Load(PageRequest),
    Send(Mutation),
}

/// What submitting the edit dialog asks the event loop to do.
#[derive(Debug, Clone, PartialEq)]
pub enum EditOutcome {
    Persist(String, String),
    Send(Mutation),
}

// ============================================================================
// Resource Cleanup
// ============================================================================

/// Abort the player task when the app goes away so no child process
/// outlives the terminal session.
impl Drop for App {
    fn drop(&mut self) {
        if let Some(handle) = self.playback_handle.take() {
            handle.abort();
            tracing::debug!("Aborted playback task on App drop");
        }
    }
}
