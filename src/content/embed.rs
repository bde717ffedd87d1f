//! Rich-media embed detection.
//!
//! Matchers run in a fixed order and the first hit wins. The first four look
//! at the article link; the rest scan the article's full HTML content for an
//! `href` to a known host.
use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::api::Article;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    YouTube,
    TikTok,
    Vimeo,
    Dailymotion,
    Redgifs,
    Imgur,
    Streamable,
    Gfycat,
    TwitchClip,
    Gif,
}

impl Provider {
    pub fn name(self) -> &'static str {
        match self {
            Self::YouTube => "YouTube",
            Self::TikTok => "TikTok",
            Self::Vimeo => "Vimeo",
            Self::Dailymotion => "Dailymotion",
            Self::Redgifs => "Redgifs",
            Self::Imgur => "Imgur",
            Self::Streamable => "Streamable",
            Self::Gfycat => "Gfycat",
            Self::TwitchClip => "Twitch clip",
            Self::Gif => "GIF",
        }
    }
}

/// How the embed would be presented.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderDirective {
    Iframe { src: String },
    Video { src: String },
    Image { src: String },
}

impl RenderDirective {
    pub fn src(&self) -> &str {
        match self {
            Self::Iframe { src } | Self::Video { src } | Self::Image { src } => src,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Embed {
    pub provider: Provider,
    /// Provider-specific id (video id, clip slug, or the GIF URL itself).
    pub id: String,
    pub render: RenderDirective,
}

impl Embed {
    /// True if an external player can play this to a natural end, which
    /// drives auto-advance.
    pub fn is_completion_detectable(&self) -> bool {
        matches!(
            self.provider,
            Provider::YouTube
                | Provider::Vimeo
                | Provider::Dailymotion
                | Provider::Imgur
                | Provider::Streamable
        )
    }

    /// URL handed to the external player.
    ///
    /// Watch pages are used where a player understands them better than the
    /// embed iframe.
    pub fn playback_url(&self) -> String {
        match self.provider {
            Provider::YouTube => format!("https://www.youtube.com/watch?v={}", self.id),
            Provider::Vimeo => format!("https://vimeo.com/{}", self.id),
            Provider::Dailymotion => format!("https://www.dailymotion.com/video/{}", self.id),
            Provider::Streamable => format!("https://streamable.com/{}", self.id),
            Provider::TikTok => format!("https://www.tiktok.com/embed/v2/{}", self.id),
            _ => self.render.src().to_string(),
        }
    }
}

// ============================================================================
// Matchers
// ============================================================================

#[derive(Clone, Copy)]
enum Field {
    Link,
    Content,
}

struct Matcher {
    provider: Provider,
    field: Field,
    pattern: &'static LazyLock<Regex>,
}

pattern!(
    YOUTUBE,
    r"(?:https?://)?(?:www\.)?youtube\.com/(?:watch\?v=|shorts/)([a-zA-Z0-9_-]{11})"
);
pattern!(TIKTOK, r"tiktok\.com/@[\w.]+/video/(\d+)");
pattern!(VIMEO, r"vimeo\.com/(?:.*/)?(\d+)");
pattern!(DAILYMOTION, r"dailymotion\.com/video/([a-zA-Z0-9]+)");
pattern!(
    REDGIFS,
    r#"href="(?:https?://)?(?:www\.)?redgifs\.com/(?:watch|ifr)/([a-zA-Z0-9_-]+)""#
);
pattern!(
    IMGUR,
    r#"href="(https?://i\.imgur\.com/([a-zA-Z0-9]+)\.(mp4|gifv))""#
);
pattern!(
    STREAMABLE,
    r#"href="(?:https?://)?(?:www\.)?streamable\.com/([a-zA-Z0-9]+)""#
);
pattern!(GFYCAT, r#"href="(?:https?://)?gfycat\.com/([a-zA-Z0-9]+)""#);
pattern!(
    TWITCH,
    r#"href="(?:https?://)?(?:www\.)?clips\.twitch\.tv/([a-zA-Z0-9_-]+)""#
);
pattern!(GIF, r#"href="([^"]+\.gif)""#);

static MATCHERS: [Matcher; 10] = [
    Matcher {
        provider: Provider::YouTube,
        field: Field::Link,
        pattern: &YOUTUBE,
    },
    Matcher {
        provider: Provider::TikTok,
        field: Field::Link,
        pattern: &TIKTOK,
    },
    Matcher {
        provider: Provider::Vimeo,
        field: Field::Link,
        pattern: &VIMEO,
    },
    Matcher {
        provider: Provider::Dailymotion,
        field: Field::Link,
        pattern: &DAILYMOTION,
    },
    Matcher {
        provider: Provider::Redgifs,
        field: Field::Content,
        pattern: &REDGIFS,
    },
    Matcher {
        provider: Provider::Imgur,
        field: Field::Content,
        pattern: &IMGUR,
    },
    Matcher {
        provider: Provider::Streamable,
        field: Field::Content,
        pattern: &STREAMABLE,
    },
    Matcher {
        provider: Provider::Gfycat,
        field: Field::Content,
        pattern: &GFYCAT,
    },
    Matcher {
        provider: Provider::TwitchClip,
        field: Field::Content,
        pattern: &TWITCH,
    },
    Matcher {
        provider: Provider::Gif,
        field: Field::Content,
        pattern: &GIF,
    },
];

impl Matcher {
    fn build(&self, caps: &Captures<'_>, twitch_parent: &str) -> Embed {
        let group = |i: usize| caps.get(i).map_or("", |m| m.as_str()).to_string();
        let (id, render) = match self.provider {
            Provider::YouTube => {
                let id = group(1);
                let src = format!("https://www.youtube.com/embed/{}?enablejsapi=1&autoplay=1", id);
                (id, RenderDirective::Iframe { src })
            }
            Provider::TikTok => {
                let id = group(1);
                let src = format!("https://www.tiktok.com/embed/v2/{}", id);
                (id, RenderDirective::Iframe { src })
            }
            Provider::Vimeo => {
                let id = group(1);
                let src = format!("https://player.vimeo.com/video/{}?autoplay=1", id);
                (id, RenderDirective::Iframe { src })
            }
            Provider::Dailymotion => {
                let id = group(1);
                let src = format!("https://www.dailymotion.com/embed/video/{}?autoplay=1", id);
                (id, RenderDirective::Iframe { src })
            }
            Provider::Redgifs => {
                let id = group(1);
                let src = format!("https://www.redgifs.com/ifr/{}", id);
                (id, RenderDirective::Iframe { src })
            }
            Provider::Imgur => {
                let src = group(1).replace(".gifv", ".mp4");
                (group(2), RenderDirective::Video { src })
            }
            Provider::Streamable => {
                let id = group(1);
                let src = format!("https://streamable.com/e/{}", id);
                (id, RenderDirective::Iframe { src })
            }
            Provider::Gfycat => {
                let id = group(1);
                let src = format!("https://gfycat.com/ifr/{}", id);
                (id, RenderDirective::Iframe { src })
            }
            Provider::TwitchClip => {
                let id = group(1);
                let src = format!(
                    "https://clips.twitch.tv/embed?clip={}&parent={}",
                    id, twitch_parent
                );
                (id, RenderDirective::Iframe { src })
            }
            Provider::Gif => {
                let src = group(1);
                (src.clone(), RenderDirective::Image { src })
            }
        };
        Embed {
            provider: self.provider,
            id,
            render,
        }
    }
}

/// Find the embed for `article`, if any.
///
/// `twitch_parent` is the host Twitch requires in clip embeds; pass the
/// configured server host.
pub fn detect_embed(article: &Article, twitch_parent: &str) -> Option<Embed> {
    let link = article.link.as_str();
    let content = article.full_content.as_deref().unwrap_or("");

    MATCHERS.iter().find_map(|matcher| {
        let haystack = match matcher.field {
            Field::Link => link,
            Field::Content => content,
        };
        if haystack.is_empty() {
            return None;
        }
        matcher
            .pattern
            .captures(haystack)
            .map(|caps| matcher.build(&caps, twitch_parent))
    })
}
