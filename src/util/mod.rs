//! Small shared helpers.
//!
//! - **URL validation**: shape checks for feed URLs and links opened in the browser
//! - **Text processing**: width-aware truncation and terminal sanitizing
//!
//! # Examples
//!
//! ```
//! use volumeread::util::{display_width, truncate_to_width, validate_url};
//!
//! let url = validate_url("example.com/feed.xml").unwrap();
//! assert_eq!(url.scheme(), "https");
//!
//! assert_eq!(display_width("Hello 世界"), 10);
//! assert_eq!(truncate_to_width("Long article title", 10), "Long ar...");
//! ```

mod text;
mod url_validator;

pub use text::{display_width, pad_to_width, single_line, strip_control_chars, truncate_to_width};
pub use url_validator::{validate_url, validate_url_for_open, UrlValidationError};

/// Longest search query the search bar accepts.
pub const MAX_SEARCH_QUERY_LENGTH: usize = 256;
