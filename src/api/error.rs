use thiserror::Error;

/// Failure outcome of any backend request.
///
/// `Display` is the message shown inline to the user (status bar, form error
/// line, dialog), so variants carrying a server message render it verbatim.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Non-2xx response. `message` is the body's `error` field when present,
    /// otherwise `Error: <status>`.
    #[error("{message}")]
    HttpStatus { status: u16, message: String },

    /// 2xx response whose JSON body carries an `error` field.
    #[error("{0}")]
    Domain(String),

    #[error("Invalid response from server: {0}")]
    Decode(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Response too large (exceeds {0} bytes)")]
    ResponseTooLarge(usize),
}

impl ApiError {
    /// Build the error for a non-2xx response from its raw body.
    pub(crate) fn from_status(status: u16, body: &[u8]) -> Self {
        let message = serde_json::from_slice::<serde_json::Value>(body)
            .ok()
            .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(str::to_owned))
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| format!("Error: {}", status));
        Self::HttpStatus { status, message }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            Self::HttpStatus { status, .. } => Some(*status),
            Self::Network(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}
