//! Article body formatting.
//!
//! Every function here is a pure `&str -> String` transform. The reader runs
//! [`render_article_content`] once per opened article and then turns the
//! resulting HTML into terminal lines with [`html_to_text`].
use std::borrow::Cow;
use std::sync::LazyLock;

use regex::{Captures, Regex};

use super::embed::Embed;
use crate::api::Article;

pattern!(BLOCK_TAG, r"(?i)<br|<p|<div");
pattern!(URL, r#"https?://[^\s<"]+"#);
pattern!(TRAILING_PUNCT, r"[.,;!)]+$");
pattern!(TIMESTAMP, r"\b(?:(\d{1,2}):)?(\d{1,2}):(\d{2})\b");
pattern!(PARAGRAPH_BREAK, r"\n\s*\n");
pattern!(FIGURE, r"(?is)<figure\b.*?</figure\s*>");
pattern!(IMG, r"(?i)<img\b[^>]*>");
pattern!(IMG_SRC, r#"(?i)\bsrc\s*=\s*(?:"([^"]*)"|'([^']*)')"#);
pattern!(TIKTOK_TEXT, r"(?i)(^|>)\s*(?:tik tok|tiktok)\s*(<|$)");
pattern!(SEEK_MARKER, r#"<button data-seek="(\d+)">([^<]*)</button>"#);
pattern!(ANCHOR_HREF, r#"(?i)<a\b[^>]*\bhref\s*=\s*"([^"]+)""#);

pattern!(SCRIPT, r"(?is)<script\b.*?</script\s*>");
pattern!(STYLE, r"(?is)<style\b.*?</style\s*>");
pattern!(WHITESPACE, r"\s+");
pattern!(BR, r"(?i)<br\s*/?>");
pattern!(LI, r"(?i)<li\b[^>]*>");
pattern!(
    BLOCK,
    r"(?i)</?(?:p|div|h[1-6]|blockquote|ul|ol|figure|figcaption|pre|table|tr|section|article)\b[^>]*>"
);
pattern!(ANY_TAG, r"(?s)<[^>]*>");

// ============================================================================
// Reader pipeline
// ============================================================================

/// Produce the HTML shown in the reader for `article`.
///
/// With an embed the body is treated as a media description: images and
/// figures go (the embed replaces them), stray "TikTok" labels go, and a
/// plain-text description gets links, seek markers and paragraphs. Without
/// an embed only the inline copy of the header image is removed.
pub fn render_article_content(article: &Article, embed: Option<&Embed>) -> String {
    let mut content = article.body().to_string();
    if content.is_empty() {
        return content;
    }

    if embed.is_some() {
        content = strip_embedded_media(&content);
        if !BLOCK_TAG.is_match(&content) {
            content = linkify_urls(&content);
            content = linkify_timestamps(&content);
            content = paragraphize(&content);
        }
    } else if let Some(image_url) = article.image_url.as_deref().filter(|u| !u.is_empty()) {
        content = remove_duplicate_image(&content, image_url).into_owned();
    }

    content
}

/// Remove `<img>` and `<figure>` elements and text nodes reading
/// "tik tok"/"tiktok".
pub fn strip_embedded_media(html: &str) -> String {
    let out = FIGURE.replace_all(html, "");
    let out = IMG.replace_all(&out, "");
    TIKTOK_TEXT.replace_all(&out, "$1$2").into_owned()
}

/// Wrap bare `http(s)://` URLs in anchors. Trailing `.,;!)` stays outside
/// the link.
pub fn linkify_urls(text: &str) -> String {
    URL.replace_all(text, |caps: &Captures<'_>| {
        let url = &caps[0];
        let (clean, suffix) = match TRAILING_PUNCT.find(url) {
            Some(m) => (&url[..m.start()], m.as_str()),
            None => (url, ""),
        };
        format!(r#"<a href="{0}">{0}</a>{1}"#, clean, suffix)
    })
    .into_owned()
}

/// Turn `H:MM:SS` / `M:SS` timestamps into seek markers carrying seconds.
pub fn linkify_timestamps(text: &str) -> String {
    TIMESTAMP
        .replace_all(text, |caps: &Captures<'_>| {
            let num = |i: usize| {
                caps.get(i)
                    .and_then(|m| m.as_str().parse::<u32>().ok())
                    .unwrap_or(0)
            };
            let seconds = num(1) * 3600 + num(2) * 60 + num(3);
            format!(r#"<button data-seek="{}">{}</button>"#, seconds, &caps[0])
        })
        .into_owned()
}

/// Blank-line-separated blocks become `<p>`, single newlines become `<br>`.
/// Text without newlines is wrapped in one `<p>`.
pub fn paragraphize(text: &str) -> String {
    if !text.contains('\n') {
        return format!("<p>{}</p>", text);
    }
    PARAGRAPH_BREAK
        .split(text)
        .map(|block| format!("<p>{}</p>", block.replace('\n', "<br>")))
        .collect()
}

/// Remove the first `<img>` whose `src` equals `image_url`.
pub fn remove_duplicate_image<'a>(html: &'a str, image_url: &str) -> Cow<'a, str> {
    let target = IMG.find_iter(html).find(|tag| {
        IMG_SRC
            .captures(tag.as_str())
            .and_then(|c| c.get(1).or_else(|| c.get(2)))
            .is_some_and(|src| html_escape::decode_html_entities(src.as_str()) == image_url)
    });

    match target {
        Some(m) => Cow::Owned(format!("{}{}", &html[..m.start()], &html[m.end()..])),
        None => Cow::Borrowed(html),
    }
}

/// Seek markers in formatted content as `(label, seconds)`.
pub fn timestamps(html: &str) -> Vec<(String, u32)> {
    SEEK_MARKER
        .captures_iter(html)
        .filter_map(|c| Some((c[2].to_string(), c[1].parse().ok()?)))
        .collect()
}

/// Anchor targets in order of appearance, deduplicated.
pub fn links(html: &str) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for caps in ANCHOR_HREF.captures_iter(html) {
        let href = html_escape::decode_html_entities(&caps[1]).into_owned();
        if !out.contains(&href) {
            out.push(href);
        }
    }
    out
}

// ============================================================================
// Source kind
// ============================================================================

/// Coarse origin of an article, used for the author pill colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Video,
    Thread,
    Default,
}

pub fn source_kind(link: &str) -> SourceKind {
    let link = link.to_lowercase();
    const VIDEO: [&str; 5] = ["youtube.com", "youtu.be", "vimeo", "dailymotion", "tiktok"];
    const THREAD: [&str; 2] = ["reddit.com", "lemmy"];

    if VIDEO.iter().any(|d| link.contains(d)) {
        SourceKind::Video
    } else if THREAD.iter().any(|d| link.contains(d)) {
        SourceKind::Thread
    } else {
        SourceKind::Default
    }
}

// ============================================================================
// Terminal rendering
// ============================================================================

/// Flatten HTML into plain-text lines for the terminal.
///
/// Block elements become blank-line-separated paragraphs, `<br>` a line
/// break, list items get a bullet, images a `[Image: src]` placeholder and
/// seek markers a bracketed label. Entities are decoded. Runs of blank lines
/// collapse to one; the widget does the soft wrapping.
pub fn html_to_text(html: &str) -> Vec<String> {
    let text = SCRIPT.replace_all(html, "");
    let text = STYLE.replace_all(&text, "");
    let text = WHITESPACE.replace_all(&text, " ");
    let text = BR.replace_all(&text, "\n");
    let text = LI.replace_all(&text, "\n\u{2022} ");
    let text = BLOCK.replace_all(&text, "\n\n");
    let text = SEEK_MARKER.replace_all(&text, "[$2]");
    let text = IMG.replace_all(&text, |caps: &Captures<'_>| {
        match IMG_SRC
            .captures(&caps[0])
            .and_then(|c| c.get(1).or_else(|| c.get(2)))
        {
            Some(src) => format!("[Image: {}]", src.as_str()),
            None => "[Image]".to_string(),
        }
    });
    let text = ANY_TAG.replace_all(&text, "");
    let text = html_escape::decode_html_entities(&text);

    let mut lines: Vec<String> = Vec::new();
    for line in text.split('\n') {
        let line = line.trim();
        if line.is_empty() && !lines.last().is_some_and(|l| !l.is_empty()) {
            continue;
        }
        lines.push(line.to_string());
    }
    while lines.last().is_some_and(|l| l.is_empty()) {
        lines.pop();
    }
    lines
}
