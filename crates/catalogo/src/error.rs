//! CLI error types with miette diagnostics.
//!
//! Maps core, config and request failures into user-facing errors with
//! actionable help text and stable exit codes.

use miette::Diagnostic;
use thiserror::Error;

use catalogo_api::{Error as ApiError, handle_error};
use catalogo_config::ConfigError;
use catalogo_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const PERMISSION: i32 = 5;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not connect to {url}")]
    #[diagnostic(
        code(catalogo::connection_failed),
        help(
            "Check that the server is running and reachable.\n\
             Configure back_base_url / app_base_url or set CATALOGO_BACK_BASE_URL."
        )
    )]
    ConnectionFailed {
        url: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Request timed out")]
    #[diagnostic(
        code(catalogo::timeout),
        help("Increase `timeout` in the config file or check the server's responsiveness.")
    )]
    Timeout,

    #[error("Request was cancelled")]
    #[diagnostic(code(catalogo::cancelled))]
    Cancelled,

    // ── Authentication ───────────────────────────────────────────────
    #[error("Credenciales inválidas")]
    #[diagnostic(
        code(catalogo::auth_failed),
        help("Check the user name and password. Run: catalogo login --user <USER>")
    )]
    InvalidCredentials,

    #[error("No password available for user '{user}'")]
    #[diagnostic(
        code(catalogo::no_credentials),
        help(
            "Set CATALOGO_PASSWORD, store one with: catalogo login --save,\n\
             or run interactively to be prompted."
        )
    )]
    NoCredentials { user: String },

    #[error("No active session")]
    #[diagnostic(code(catalogo::not_authenticated), help("Run: catalogo login"))]
    NotAuthenticated,

    // ── Navigation ───────────────────────────────────────────────────
    #[error("Navigation to {from} redirected to {to}")]
    #[diagnostic(code(catalogo::redirected))]
    Redirected { from: String, to: String },

    // ── API ──────────────────────────────────────────────────────────
    #[error("API error ({status}): {message}")]
    #[diagnostic(code(catalogo::api_error))]
    Api { status: u16, message: String },

    // ── Validation / configuration ───────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(catalogo::validation))]
    Validation { field: String, reason: String },

    #[error("Configuration error: {message}")]
    #[diagnostic(
        code(catalogo::config),
        help("Check the config file (see --config) and CATALOGO_* environment variables.")
    )]
    Config { message: String },

    #[error("Session store error: {message}")]
    #[diagnostic(code(catalogo::session_store))]
    SessionStore { message: String },

    // ── IO / Serialization ───────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Invalid JSON: {0}")]
    #[diagnostic(code(catalogo::json))]
    Json(#[from] serde_json::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::Timeout => exit_code::TIMEOUT,
            Self::InvalidCredentials | Self::NoCredentials { .. } | Self::NotAuthenticated => {
                exit_code::AUTH
            }
            Self::Redirected { .. } => exit_code::PERMISSION,
            Self::Api { status, .. } => match status {
                401 => exit_code::AUTH,
                403 => exit_code::PERMISSION,
                404 => exit_code::NOT_FOUND,
                _ => exit_code::GENERAL,
            },
            Self::Validation { .. } | Self::Config { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

// ── ApiError → CliError mapping ──────────────────────────────────────

impl From<ApiError> for CliError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::Cancelled { .. } => Self::Cancelled,
            ApiError::Transport(e) if e.is_timeout() => Self::Timeout,
            ApiError::Transport(e) if e.is_connect() => Self::ConnectionFailed {
                url: e.url().map_or_else(|| "(unknown)".into(), ToString::to_string),
                source: Box::new(e),
            },
            ApiError::MissingBaseUrl { path } => Self::Validation {
                field: "back_base_url".into(),
                reason: format!("no base URL configured for {path}"),
            },
            ApiError::InvalidUrl(e) => Self::Validation {
                field: "url".into(),
                reason: e.to_string(),
            },
            ApiError::Tls(message) => Self::Config { message },
            other => {
                let shape = handle_error(&other);
                Self::Api {
                    status: shape.status_code,
                    message: shape.message,
                }
            }
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::InvalidCredentials => Self::InvalidCredentials,
            CoreError::SessionStore { message } => Self::SessionStore { message },
            CoreError::Config { message } => Self::Config { message },
            CoreError::Api(e) => e.into(),
        }
    }
}

// ── ConfigError → CliError mapping ───────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => Self::Validation { field, reason },
            ConfigError::NoCredentials { user } => Self::NoCredentials { user },
            ConfigError::NoUsername => Self::Validation {
                field: "user".into(),
                reason: "pass --user or set `username` in the config file".into(),
            },
            ConfigError::Io(e) => Self::Io(e),
            other => Self::Config {
                message: other.to_string(),
            },
        }
    }
}
