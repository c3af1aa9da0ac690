use serde::Serialize;
use thiserror::Error;

/// Message carried by a request that was cancelled before it settled.
pub const ERROR_ABORT: &str = "The user aborted a request";

/// Status reported by [`handle_error`] when a failure carries no HTTP response.
const FALLBACK_STATUS: u16 = 500;

/// Message reported by [`handle_error`] when a failure has nothing to say.
const FALLBACK_MESSAGE: &str = "fetch";

/// Top-level error type for the `catalogo-api` crate.
///
/// Request failures are propagated raw; callers that want the uniform
/// [`ErrorShape`] run them through [`handle_error`].
#[derive(Debug, Error)]
pub enum Error {
    // ── HTTP ────────────────────────────────────────────────────────
    /// The backend answered with a non-2xx status. `data` is the parsed
    /// response body when it was JSON.
    #[error("[{method}] \"{url}\": {status} {reason}")]
    Http {
        method: String,
        url: String,
        status: u16,
        reason: String,
        data: Option<serde_json::Value>,
    },

    // ── Cancellation ────────────────────────────────────────────────
    /// The request's cancellation token fired before the call settled.
    #[error("The user aborted a request")]
    Cancelled { url: String },

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, timeout, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// A relative URL was issued but no base URL is configured for its origin.
    #[error("No base URL configured for relative request to {path}")]
    MissingBaseUrl { path: String },

    /// A header name or value could not be encoded.
    #[error("Invalid header: {0}")]
    InvalidHeader(String),

    /// TLS setup failed while building the HTTP client.
    #[error("TLS error: {0}")]
    Tls(String),

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// Returns `true` if the request was cancelled rather than failed.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }

    /// HTTP status carried by this failure, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            Self::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// The `message` field of the backend's JSON error body, if present.
    pub fn data_message(&self) -> Option<&str> {
        match self {
            Self::Http { data: Some(data), .. } => data.get("message")?.as_str(),
            _ => None,
        }
    }
}

// ── Uniform error shape ─────────────────────────────────────────────

/// Normalized failure returned to UI consumers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorShape {
    pub success: bool,
    pub message: String,
    pub status_code: u16,
}

/// Classify any failure into an [`ErrorShape`].
///
/// Total over its input: the backend's `data.message` wins, then the
/// failure's own message, with the first letter capitalised. A failure with
/// neither gets the bare `"fetch"`. Status comes from the HTTP response
/// when there was one, otherwise 500.
pub fn handle_error(error: &(dyn std::error::Error + 'static)) -> ErrorShape {
    let api_error = error.downcast_ref::<Error>();

    let nested = api_error.and_then(Error::data_message).map(str::to_owned);
    let own = Some(error.to_string()).filter(|m| !m.is_empty());
    let message = nested
        .or(own)
        .map_or_else(|| FALLBACK_MESSAGE.to_owned(), |m| capitalize_first_letter(&m));

    ErrorShape {
        success: false,
        message,
        status_code: api_error
            .and_then(Error::status)
            .unwrap_or(FALLBACK_STATUS),
    }
}

impl From<&Error> for ErrorShape {
    fn from(err: &Error) -> Self {
        handle_error(err)
    }
}

fn capitalize_first_letter(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
