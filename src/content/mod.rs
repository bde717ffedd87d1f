//! Article body handling for the reader.
//!
//! - `embed` - picks the rich-media embed for an article, first match wins
//! - `format` - pure HTML string transforms and the terminal text renderer

/// Compile-once regex static. Patterns are literals, so compilation cannot
/// fail at runtime.
macro_rules! pattern {
    ($name:ident, $re:expr) => {
        static $name: LazyLock<Regex> = LazyLock::new(|| Regex::new($re).expect("valid regex"));
    };
}

pub mod embed;
pub mod format;

pub use embed::{detect_embed, Embed, Provider, RenderDirective};
pub use format::{html_to_text, render_article_content, source_kind, timestamps, SourceKind};
