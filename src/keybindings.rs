//! Keybinding registry: maps actions to key events with config overrides.
//!
//! Bindings are data, not match arms, so users can remap any action from
//! `config.toml` (`[keybindings]`) or the preference store (`keybind.*`).
use crossterm::event::{KeyCode, KeyModifiers};
use std::collections::HashMap;

// ============================================================================
// Action Enum
// ============================================================================

/// All user-facing actions that can be triggered by keybindings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Quit,
    NavDown,
    NavUp,
    PageDown,
    PageUp,
    CycleFocus,
    Back,
    Select,
    RefreshAll,
    EnterSearch,
    ExitSearch,
    CommitSearch,
    ToggleSort,
    ToggleUnreadOnly,
    ToggleSmartCap,
    AddFeed,
    AddCategory,
    AddStream,
    ImportOpml,
    ExportOpml,
    ShowHelp,
    ToggleCollapse,
    ToggleFeedSelection,
    AssignSelected,
    MoveFeed,
    EditEntry,
    DeleteEntry,
    RestoreEntry,
    ToggleFavorite,
    ToggleReadLater,
    OpenInBrowser,
    CopyLink,
    MarkAllRead,
    ViewSettings,
    PlayMedia,
    ViewAuthor,
    ScrollDown,
    ScrollUp,
    NextArticle,
    PreviousArticle,
    ExitReader,
}

impl Action {
    /// Human-readable description for the help screen.
    pub fn describe(self) -> &'static str {
        match self {
            Self::Quit => "Quit application",
            Self::NavDown => "Navigate down",
            Self::NavUp => "Navigate up",
            Self::PageDown => "Page down",
            Self::PageUp => "Page up",
            Self::CycleFocus => "Switch between sidebar and articles",
            Self::Back => "Cancel / clear search / clear selection",
            Self::Select => "Open view or article",
            Self::RefreshAll => "Refresh all feeds",
            Self::EnterSearch => "Search loaded articles",
            Self::ExitSearch => "Clear search",
            Self::CommitSearch => "Keep search and return to list",
            Self::ToggleSort => "Toggle newest/oldest first",
            Self::ToggleUnreadOnly => "Toggle unread only",
            Self::ToggleSmartCap => "Toggle smart cap",
            Self::AddFeed => "Add feed",
            Self::AddCategory => "Add category",
            Self::AddStream => "Add custom stream",
            Self::ImportOpml => "Import feeds from OPML",
            Self::ExportOpml => "Export feeds to OPML",
            Self::ShowHelp => "Show help",
            Self::ToggleCollapse => "Expand / collapse",
            Self::ToggleFeedSelection => "Select feed for bulk assign",
            Self::AssignSelected => "Assign selected feeds",
            Self::MoveFeed => "Move feed to category or stream",
            Self::EditEntry => "Edit entry settings",
            Self::DeleteEntry => "Remove / delete entry",
            Self::RestoreEntry => "Restore removed entry",
            Self::ToggleFavorite => "Toggle favorite",
            Self::ToggleReadLater => "Toggle read later",
            Self::OpenInBrowser => "Open in browser",
            Self::CopyLink => "Copy article link",
            Self::MarkAllRead => "Mark all in view as read",
            Self::ViewSettings => "Current view settings",
            Self::PlayMedia => "Play media in external player",
            Self::ViewAuthor => "Show articles by this author",
            Self::ScrollDown => "Scroll down one line",
            Self::ScrollUp => "Scroll up one line",
            Self::NextArticle => "Next article",
            Self::PreviousArticle => "Previous article",
            Self::ExitReader => "Close reader",
        }
    }
}

// ============================================================================
// Context Enum
// ============================================================================

/// Dispatch context: determines which bindings are active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Context {
    Global,
    Sidebar,
    ArticleList,
    Reader,
    Search,
}

// ============================================================================
// Key Specification
// ============================================================================

/// A key event: code + modifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeySpec {
    pub code: KeyCode,
    pub modifiers: KeyModifiers,
}

impl KeySpec {
    pub const fn new(code: KeyCode, modifiers: KeyModifiers) -> Self {
        Self { code, modifiers }
    }

    pub const fn plain(code: KeyCode) -> Self {
        Self::new(code, KeyModifiers::NONE)
    }

    pub const fn ch(c: char) -> Self {
        Self::plain(KeyCode::Char(c))
    }

    pub const fn ctrl(c: char) -> Self {
        Self::new(KeyCode::Char(c), KeyModifiers::CONTROL)
    }
}

/// Parse a key string from config into a KeySpec.
///
/// Supported formats:
/// - Single char: "q", "j", "/"
/// - Named keys: "Enter", "Esc", "Tab", "Up", "Down", "Backspace", "Space"
/// - Modifier combos: "Ctrl+d", "Ctrl+u"
/// - Function keys: "F1" through "F12"
fn parse_key_string(s: &str) -> Option<KeySpec> {
    let s = s.trim();

    if let Some(rest) = s.strip_prefix("Ctrl+") {
        let mut chars = rest.trim().chars();
        return match (chars.next(), chars.next()) {
            (Some(c), None) => Some(KeySpec::ctrl(c)),
            _ => None,
        };
    }

    match s.to_lowercase().as_str() {
        "enter" | "return" => return Some(KeySpec::plain(KeyCode::Enter)),
        "esc" | "escape" => return Some(KeySpec::plain(KeyCode::Esc)),
        "tab" => return Some(KeySpec::plain(KeyCode::Tab)),
        "up" => return Some(KeySpec::plain(KeyCode::Up)),
        "down" => return Some(KeySpec::plain(KeyCode::Down)),
        "left" => return Some(KeySpec::plain(KeyCode::Left)),
        "right" => return Some(KeySpec::plain(KeyCode::Right)),
        "pageup" => return Some(KeySpec::plain(KeyCode::PageUp)),
        "pagedown" => return Some(KeySpec::plain(KeyCode::PageDown)),
        "backspace" => return Some(KeySpec::plain(KeyCode::Backspace)),
        "space" => return Some(KeySpec::ch(' ')),
        _ => {}
    }

    if let Some(n) = s
        .strip_prefix(['F', 'f'])
        .and_then(|rest| rest.parse::<u8>().ok())
    {
        return (1..=12).contains(&n).then_some(KeySpec::plain(KeyCode::F(n)));
    }

    let mut chars = s.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Some(KeySpec::ch(c)),
        _ => None,
    }
}

/// Format a KeySpec as a human-readable string for the help screen.
fn format_key(key: &KeySpec) -> String {
    let modifier = if key.modifiers.contains(KeyModifiers::CONTROL) {
        "Ctrl+"
    } else {
        ""
    };

    let key_name = match key.code {
        KeyCode::Char(' ') => "Space".to_string(),
        KeyCode::Char(c) => c.to_string(),
        KeyCode::Enter => "Enter".to_string(),
        KeyCode::Esc => "Esc".to_string(),
        KeyCode::Tab => "Tab".to_string(),
        KeyCode::Up => "Up".to_string(),
        KeyCode::Down => "Down".to_string(),
        KeyCode::Left => "Left".to_string(),
        KeyCode::Right => "Right".to_string(),
        KeyCode::PageUp => "PageUp".to_string(),
        KeyCode::PageDown => "PageDown".to_string(),
        KeyCode::Backspace => "Backspace".to_string(),
        KeyCode::F(n) => format!("F{}", n),
        _ => "?".to_string(),
    };

    format!("{}{}", modifier, key_name)
}

// ============================================================================
// Keybinding Registry
// ============================================================================

/// Default bindings, in help-screen order.
const DEFAULTS: &[(Context, KeySpec, Action)] = &[
    // Global
    (Context::Global, KeySpec::ch('q'), Action::Quit),
    (Context::Global, KeySpec::ch('j'), Action::NavDown),
    (Context::Global, KeySpec::plain(KeyCode::Down), Action::NavDown),
    (Context::Global, KeySpec::ch('k'), Action::NavUp),
    (Context::Global, KeySpec::plain(KeyCode::Up), Action::NavUp),
    (Context::Global, KeySpec::ctrl('d'), Action::PageDown),
    (Context::Global, KeySpec::plain(KeyCode::PageDown), Action::PageDown),
    (Context::Global, KeySpec::ctrl('u'), Action::PageUp),
    (Context::Global, KeySpec::plain(KeyCode::PageUp), Action::PageUp),
    (Context::Global, KeySpec::plain(KeyCode::Tab), Action::CycleFocus),
    (Context::Global, KeySpec::plain(KeyCode::Esc), Action::Back),
    (Context::Global, KeySpec::plain(KeyCode::Enter), Action::Select),
    (Context::Global, KeySpec::ch('r'), Action::RefreshAll),
    (Context::Global, KeySpec::ch('/'), Action::EnterSearch),
    (Context::Global, KeySpec::ch('s'), Action::ToggleSort),
    (Context::Global, KeySpec::ch('U'), Action::ToggleUnreadOnly),
    (Context::Global, KeySpec::ch('C'), Action::ToggleSmartCap),
    (Context::Global, KeySpec::ch('a'), Action::AddFeed),
    (Context::Global, KeySpec::ch('c'), Action::AddCategory),
    (Context::Global, KeySpec::ch('n'), Action::AddStream),
    (Context::Global, KeySpec::ch('I'), Action::ImportOpml),
    (Context::Global, KeySpec::ch('X'), Action::ExportOpml),
    (Context::Global, KeySpec::ch('?'), Action::ShowHelp),
    // Sidebar
    (Context::Sidebar, KeySpec::ch(' '), Action::ToggleCollapse),
    (Context::Sidebar, KeySpec::ch('x'), Action::ToggleFeedSelection),
    (Context::Sidebar, KeySpec::ch('A'), Action::AssignSelected),
    (Context::Sidebar, KeySpec::ch('m'), Action::MoveFeed),
    (Context::Sidebar, KeySpec::ch('e'), Action::EditEntry),
    (Context::Sidebar, KeySpec::ch('d'), Action::DeleteEntry),
    (Context::Sidebar, KeySpec::ch('u'), Action::RestoreEntry),
    // Article list
    (Context::ArticleList, KeySpec::ch('f'), Action::ToggleFavorite),
    (Context::ArticleList, KeySpec::ch('b'), Action::ToggleReadLater),
    (Context::ArticleList, KeySpec::ch('o'), Action::OpenInBrowser),
    (Context::ArticleList, KeySpec::ch('y'), Action::CopyLink),
    (Context::ArticleList, KeySpec::ch('M'), Action::MarkAllRead),
    (Context::ArticleList, KeySpec::ch('e'), Action::ViewSettings),
    (Context::ArticleList, KeySpec::ch('w'), Action::PlayMedia),
    (Context::ArticleList, KeySpec::ch('v'), Action::ViewAuthor),
    // Reader
    (Context::Reader, KeySpec::ch('j'), Action::ScrollDown),
    (Context::Reader, KeySpec::plain(KeyCode::Down), Action::ScrollDown),
    (Context::Reader, KeySpec::ch('k'), Action::ScrollUp),
    (Context::Reader, KeySpec::plain(KeyCode::Up), Action::ScrollUp),
    (Context::Reader, KeySpec::ch('n'), Action::NextArticle),
    (Context::Reader, KeySpec::plain(KeyCode::Right), Action::NextArticle),
    (Context::Reader, KeySpec::ch('p'), Action::PreviousArticle),
    (Context::Reader, KeySpec::plain(KeyCode::Left), Action::PreviousArticle),
    (Context::Reader, KeySpec::plain(KeyCode::Esc), Action::ExitReader),
    (Context::Reader, KeySpec::plain(KeyCode::Backspace), Action::ExitReader),
    (Context::Reader, KeySpec::ch('f'), Action::ToggleFavorite),
    (Context::Reader, KeySpec::ch('b'), Action::ToggleReadLater),
    (Context::Reader, KeySpec::ch('o'), Action::OpenInBrowser),
    (Context::Reader, KeySpec::ch('y'), Action::CopyLink),
    (Context::Reader, KeySpec::ch('P'), Action::PlayMedia),
    (Context::Reader, KeySpec::ch('v'), Action::ViewAuthor),
    // Search
    (Context::Search, KeySpec::plain(KeyCode::Esc), Action::ExitSearch),
    (Context::Search, KeySpec::plain(KeyCode::Enter), Action::CommitSearch),
];

/// Registry of keybindings, supporting default bindings and config overrides.
///
/// The same key can map to different actions in different contexts; lookups
/// fall back to `Global` when the specific context has no binding.
pub struct KeybindingRegistry {
    lookup: HashMap<(Context, KeySpec), Action>,
    bindings: Vec<(Context, KeySpec, Action)>,
}

impl KeybindingRegistry {
    pub fn new() -> Self {
        let mut registry = Self {
            lookup: HashMap::with_capacity(DEFAULTS.len()),
            bindings: Vec::with_capacity(DEFAULTS.len()),
        };
        for &(context, key, action) in DEFAULTS {
            registry.bind(context, key, action);
        }
        registry
    }

    fn bind(&mut self, context: Context, key: KeySpec, action: Action) {
        self.lookup.insert((context, key), action);
        self.bindings.push((context, key, action));
    }

    /// Apply user overrides keyed by action name.
    ///
    /// Keys in the map are action names (e.g., "quit", "nav_down").
    /// Values are key strings (e.g., "q", "Ctrl+d", "F5").
    ///
    /// Returns a list of warnings for unrecognized action names or unparseable keys.
    pub fn apply_overrides(&mut self, overrides: &HashMap<String, String>) -> Vec<String> {
        let mut warnings = Vec::new();

        for (action_name, key_str) in overrides {
            let Some(action) = parse_action_name(action_name) else {
                warnings.push(format!("Unknown action '{}', ignoring", action_name));
                continue;
            };

            let Some(key) = parse_key_string(key_str) else {
                warnings.push(format!(
                    "Cannot parse key '{}' for action '{}', ignoring",
                    key_str, action_name
                ));
                continue;
            };

            let mut contexts: Vec<Context> = self
                .bindings
                .iter()
                .filter(|(_, _, a)| *a == action)
                .map(|(c, _, _)| *c)
                .collect();
            contexts.dedup();

            self.lookup.retain(|_, a| *a != action);
            self.bindings.retain(|(_, _, a)| *a != action);

            for ctx in contexts {
                self.bind(ctx, key, action);
            }

            tracing::info!(
                action = %action_name,
                key = %key_str,
                "Applied keybinding override"
            );
        }

        warnings
    }

    /// Look up the action for a key, trying `context` first, then `Global`.
    pub fn action_for_key(
        &self,
        code: KeyCode,
        modifiers: KeyModifiers,
        context: Context,
    ) -> Option<Action> {
        // Shifted letters arrive with SHIFT set on some terminals.
        let modifiers = match code {
            KeyCode::Char(_) => modifiers.difference(KeyModifiers::SHIFT),
            _ => modifiers,
        };
        let key = KeySpec::new(code, modifiers);

        if let Some(&action) = self.lookup.get(&(context, key)) {
            return Some(action);
        }

        if context != Context::Global {
            if let Some(&action) = self.lookup.get(&(Context::Global, key)) {
                return Some(action);
            }
        }

        None
    }

    /// First key bound to `action` in `context`, for status-bar hints.
    pub fn key_for(&self, action: Action, context: Context) -> Option<String> {
        self.bindings
            .iter()
            .find(|(c, _, a)| *a == action && (*c == context || *c == Context::Global))
            .map(|(_, key, _)| format_key(key))
    }

    /// All bindings as (context, key display, action, description), for the help screen.
    pub fn all_bindings(&self) -> Vec<(Context, String, Action, &'static str)> {
        self.bindings
            .iter()
            .map(|(ctx, key, action)| (*ctx, format_key(key), *action, action.describe()))
            .collect()
    }
}

impl Default for KeybindingRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse an action name from config into an Action.
fn parse_action_name(name: &str) -> Option<Action> {
    let action = match name.to_lowercase().replace('-', "_").as_str() {
        "quit" => Action::Quit,
        "nav_down" | "down" => Action::NavDown,
        "nav_up" | "up" => Action::NavUp,
        "page_down" => Action::PageDown,
        "page_up" => Action::PageUp,
        "cycle_focus" | "tab" => Action::CycleFocus,
        "back" => Action::Back,
        "select" | "enter" => Action::Select,
        "refresh_all" | "refresh" => Action::RefreshAll,
        "enter_search" | "search" => Action::EnterSearch,
        "exit_search" => Action::ExitSearch,
        "commit_search" => Action::CommitSearch,
        "toggle_sort" | "sort" => Action::ToggleSort,
        "toggle_unread_only" | "unread_only" => Action::ToggleUnreadOnly,
        "toggle_smart_cap" | "smart_cap" => Action::ToggleSmartCap,
        "add_feed" => Action::AddFeed,
        "add_category" => Action::AddCategory,
        "add_stream" | "add_custom_stream" => Action::AddStream,
        "import_opml" | "import" => Action::ImportOpml,
        "export_opml" | "export" => Action::ExportOpml,
        "show_help" | "help" => Action::ShowHelp,
        "toggle_collapse" | "collapse" => Action::ToggleCollapse,
        "toggle_feed_selection" | "select_feed" => Action::ToggleFeedSelection,
        "assign_selected" | "assign" => Action::AssignSelected,
        "move_feed" | "move" => Action::MoveFeed,
        "edit_entry" | "edit" => Action::EditEntry,
        "delete_entry" | "delete" => Action::DeleteEntry,
        "restore_entry" | "restore" => Action::RestoreEntry,
        "toggle_favorite" | "favorite" => Action::ToggleFavorite,
        "toggle_read_later" | "read_later" | "bookmark" => Action::ToggleReadLater,
        "open_in_browser" | "open" => Action::OpenInBrowser,
        "copy_link" | "copy" => Action::CopyLink,
        "mark_all_read" => Action::MarkAllRead,
        "view_settings" | "settings" => Action::ViewSettings,
        "play_media" | "play" => Action::PlayMedia,
        "view_author" | "author" => Action::ViewAuthor,
        "scroll_down" => Action::ScrollDown,
        "scroll_up" => Action::ScrollUp,
        "next_article" | "next" => Action::NextArticle,
        "previous_article" | "prev" | "previous" => Action::PreviousArticle,
        "exit_reader" => Action::ExitReader,
        _ => return None,
    };
    Some(action)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup(reg: &KeybindingRegistry, key: KeySpec, ctx: Context) -> Option<Action> {
        reg.action_for_key(key.code, key.modifiers, ctx)
    }

    #[test]
    fn test_default_registry_has_quit() {
        let reg = KeybindingRegistry::new();
        assert_eq!(lookup(&reg, KeySpec::ch('q'), Context::Global), Some(Action::Quit));
    }

    #[test]
    fn test_default_nav_keys() {
        let reg = KeybindingRegistry::new();
        assert_eq!(lookup(&reg, KeySpec::ch('j'), Context::Sidebar), Some(Action::NavDown));
        assert_eq!(
            lookup(&reg, KeySpec::plain(KeyCode::Down), Context::ArticleList),
            Some(Action::NavDown)
        );
        assert_eq!(lookup(&reg, KeySpec::ch('k'), Context::Sidebar), Some(Action::NavUp));
    }

    #[test]
    fn test_reader_context_overrides_global() {
        let reg = KeybindingRegistry::new();
        assert_eq!(lookup(&reg, KeySpec::ch('j'), Context::Reader), Some(Action::ScrollDown));
        assert_eq!(lookup(&reg, KeySpec::ch('n'), Context::Reader), Some(Action::NextArticle));
        assert_eq!(lookup(&reg, KeySpec::ch('n'), Context::Sidebar), Some(Action::AddStream));
        assert_eq!(
            lookup(&reg, KeySpec::plain(KeyCode::Esc), Context::Reader),
            Some(Action::ExitReader)
        );
    }

    #[test]
    fn test_copy_link_bound_in_list_and_reader() {
        let reg = KeybindingRegistry::new();
        assert_eq!(lookup(&reg, KeySpec::ch('y'), Context::ArticleList), Some(Action::CopyLink));
        assert_eq!(lookup(&reg, KeySpec::ch('y'), Context::Reader), Some(Action::CopyLink));
        assert_eq!(lookup(&reg, KeySpec::ch('y'), Context::Sidebar), None);
    }

    #[test]
    fn test_reader_falls_back_to_global() {
        let reg = KeybindingRegistry::new();
        assert_eq!(lookup(&reg, KeySpec::ch('q'), Context::Reader), Some(Action::Quit));
        assert_eq!(lookup(&reg, KeySpec::ch('?'), Context::Reader), Some(Action::ShowHelp));
    }

    #[test]
    fn test_same_key_different_contexts() {
        let reg = KeybindingRegistry::new();
        assert_eq!(lookup(&reg, KeySpec::ch('e'), Context::Sidebar), Some(Action::EditEntry));
        assert_eq!(
            lookup(&reg, KeySpec::ch('e'), Context::ArticleList),
            Some(Action::ViewSettings)
        );
        assert_eq!(lookup(&reg, KeySpec::ch('e'), Context::Global), None);
        assert_eq!(lookup(&reg, KeySpec::ch('f'), Context::Sidebar), None);
    }

    #[test]
    fn test_shift_modifier_ignored_for_chars() {
        let reg = KeybindingRegistry::new();
        assert_eq!(
            reg.action_for_key(KeyCode::Char('M'), KeyModifiers::SHIFT, Context::ArticleList),
            Some(Action::MarkAllRead)
        );
    }

    #[test]
    fn test_ctrl_modifiers() {
        let reg = KeybindingRegistry::new();
        assert_eq!(lookup(&reg, KeySpec::ctrl('d'), Context::Reader), Some(Action::PageDown));
        assert_eq!(lookup(&reg, KeySpec::ctrl('u'), Context::Sidebar), Some(Action::PageUp));
    }

    #[test]
    fn test_search_context() {
        let reg = KeybindingRegistry::new();
        assert_eq!(
            lookup(&reg, KeySpec::plain(KeyCode::Esc), Context::Search),
            Some(Action::ExitSearch)
        );
        assert_eq!(
            lookup(&reg, KeySpec::plain(KeyCode::Enter), Context::Search),
            Some(Action::CommitSearch)
        );
    }

    #[test]
    fn test_unknown_key_returns_none() {
        let reg = KeybindingRegistry::new();
        assert_eq!(lookup(&reg, KeySpec::plain(KeyCode::F(12)), Context::Global), None);
    }

    #[test]
    fn test_apply_overrides_valid() {
        let mut reg = KeybindingRegistry::new();
        let overrides = HashMap::from([("quit".to_string(), "Ctrl+q".to_string())]);

        assert!(reg.apply_overrides(&overrides).is_empty());
        assert_eq!(lookup(&reg, KeySpec::ch('q'), Context::Global), None);
        assert_eq!(lookup(&reg, KeySpec::ctrl('q'), Context::Global), Some(Action::Quit));
    }

    #[test]
    fn test_apply_overrides_warnings() {
        let mut reg = KeybindingRegistry::new();
        let overrides = HashMap::from([("nonexistent_action".to_string(), "q".to_string())]);
        let warnings = reg.apply_overrides(&overrides);
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("Unknown action"));

        let overrides = HashMap::from([("quit".to_string(), "Ctrl+Alt+Q".to_string())]);
        let warnings = reg.apply_overrides(&overrides);
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("Cannot parse key"));
    }

    #[test]
    fn test_override_preserves_contexts() {
        let mut reg = KeybindingRegistry::new();
        let overrides = HashMap::from([("favorite".to_string(), "*".to_string())]);
        assert!(reg.apply_overrides(&overrides).is_empty());

        assert_eq!(
            lookup(&reg, KeySpec::ch('*'), Context::ArticleList),
            Some(Action::ToggleFavorite)
        );
        assert_eq!(lookup(&reg, KeySpec::ch('*'), Context::Reader), Some(Action::ToggleFavorite));
        assert_eq!(lookup(&reg, KeySpec::ch('f'), Context::ArticleList), None);
    }

    #[test]
    fn test_parse_key_string_formats() {
        assert_eq!(parse_key_string("Enter"), Some(KeySpec::plain(KeyCode::Enter)));
        assert_eq!(parse_key_string("esc"), Some(KeySpec::plain(KeyCode::Esc)));
        assert_eq!(parse_key_string("space"), Some(KeySpec::ch(' ')));
        assert_eq!(parse_key_string("F5"), Some(KeySpec::plain(KeyCode::F(5))));
        assert_eq!(parse_key_string("F13"), None);
        assert_eq!(parse_key_string("Ctrl+d"), Some(KeySpec::ctrl('d')));
        assert_eq!(parse_key_string("/"), Some(KeySpec::ch('/')));
        assert_eq!(parse_key_string("F"), Some(KeySpec::ch('F')));
        assert_eq!(parse_key_string("xyz"), None);
    }

    #[test]
    fn test_format_key_display() {
        assert_eq!(format_key(&KeySpec::ch('q')), "q");
        assert_eq!(format_key(&KeySpec::ch(' ')), "Space");
        assert_eq!(format_key(&KeySpec::ctrl('d')), "Ctrl+d");
        assert_eq!(format_key(&KeySpec::plain(KeyCode::F(5))), "F5");
    }

    #[test]
    fn test_key_for_hint() {
        let reg = KeybindingRegistry::new();
        assert_eq!(reg.key_for(Action::RefreshAll, Context::Sidebar).as_deref(), Some("r"));
        assert_eq!(reg.key_for(Action::PlayMedia, Context::Reader).as_deref(), Some("P"));
    }

    #[test]
    fn test_all_bindings_described() {
        let reg = KeybindingRegistry::new();
        for (_, _, action, description) in reg.all_bindings() {
            assert!(!description.is_empty(), "{:?} has no description", action);
        }
        assert!(reg.all_bindings().len() >= 40);
    }
}
