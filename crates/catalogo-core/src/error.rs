// ── Core error types ──
//
// Errors surfaced by the session layer. Transport failures from
// `catalogo-api` pass through untouched so callers can still tell a
// cancelled request from a failed one; login failures are flattened.

use thiserror::Error;

/// Fixed user-facing message for any login failure.
pub const INVALID_CREDENTIALS: &str = "Credenciales inválidas";

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Authentication ───────────────────────────────────────────────
    /// Login failed for any reason; the backend's detail is discarded.
    #[error("Credenciales inválidas")]
    InvalidCredentials,

    // ── Session store ────────────────────────────────────────────────
    #[error("Session store error: {message}")]
    SessionStore { message: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Requests ─────────────────────────────────────────────────────
    #[error(transparent)]
    Api(#[from] catalogo_api::Error),
}

impl CoreError {
    /// Returns `true` if the underlying request was cancelled.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Api(e) if e.is_cancelled())
    }
}

impl From<std::io::Error> for CoreError {
    fn from(err: std::io::Error) -> Self {
        Self::SessionStore {
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for CoreError {
    fn from(err: serde_json::Error) -> Self {
        Self::SessionStore {
            message: format!("corrupt session payload: {err}"),
        }
    }
}
