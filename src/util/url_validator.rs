//! URL checks for user-entered feed URLs and links handed to the browser.
//!
//! The server fetches feeds itself and may legitimately live on a LAN, so
//! private and loopback hosts are allowed. Only the shape is checked here.
use thiserror::Error;
use url::Url;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum UrlValidationError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Only http and https URLs are supported (got {0})")]
    UnsupportedScheme(String),

    #[error("URL has no host")]
    MissingHost,
}

/// Parse `input` and require an http(s) scheme and a host.
///
/// A bare host such as `example.com/feed` is retried with `https://` in
/// front, matching what people usually paste into the add-feed form.
pub fn validate_url(input: &str) -> Result<Url, UrlValidationError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(UrlValidationError::InvalidUrl("empty".to_string()));
    }

    let url = match Url::parse(trimmed) {
        Ok(url) => url,
        Err(url::ParseError::RelativeUrlWithoutBase) => {
            Url::parse(&format!("https://{}", trimmed))
                .map_err(|e| UrlValidationError::InvalidUrl(e.to_string()))?
        }
        Err(e) => return Err(UrlValidationError::InvalidUrl(e.to_string())),
    };

    match url.scheme() {
        "http" | "https" => {}
        other => return Err(UrlValidationError::UnsupportedScheme(other.to_string())),
    }

    if url.host_str().map_or(true, str::is_empty) {
        return Err(UrlValidationError::MissingHost);
    }

    Ok(url)
}

/// Check a link before passing it to the system opener. No bare-host
/// fallback: article links are expected to be absolute.
pub fn validate_url_for_open(input: &str) -> Result<Url, UrlValidationError> {
    let url =
        Url::parse(input.trim()).map_err(|e| UrlValidationError::InvalidUrl(e.to_string()))?;
    match url.scheme() {
        "http" | "https" => {}
        other => return Err(UrlValidationError::UnsupportedScheme(other.to_string())),
    }
    if url.host_str().map_or(true, str::is_empty) {
        return Err(UrlValidationError::MissingHost);
    }
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_urls() {
        assert!(validate_url("https://example.com/feed.xml").is_ok());
        assert!(validate_url("http://news.example.org").is_ok());
        assert!(validate_url("https://www.youtube.com/@channel").is_ok());
    }

    #[test]
    fn test_bare_host_gets_https() {
        let url = validate_url("example.com/rss").unwrap();
        assert_eq!(url.as_str(), "https://example.com/rss");
    }

    #[test]
    fn test_surrounding_whitespace_trimmed() {
        assert!(validate_url("  https://example.com/feed  ").is_ok());
    }

    #[test]
    fn test_lan_hosts_allowed() {
        assert!(validate_url("http://192.168.1.10:8080/feed").is_ok());
        assert!(validate_url("http://localhost:5000/rss").is_ok());
    }

    #[test]
    fn test_unsupported_schemes() {
        assert_eq!(
            validate_url("file:///etc/passwd"),
            Err(UrlValidationError::UnsupportedScheme("file".to_string()))
        );
        assert!(validate_url("ftp://example.com").is_err());
        assert!(validate_url("javascript:alert(1)").is_err());
    }

    #[test]
    fn test_empty_rejected() {
        assert!(matches!(
            validate_url("   "),
            Err(UrlValidationError::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_open_requires_absolute() {
        assert!(validate_url_for_open("https://example.com/a").is_ok());
        assert!(validate_url_for_open("example.com/a").is_err());
        assert!(validate_url_for_open("mailto:someone@example.com").is_err());
    }
}
