//! Configuration for the catalogo CLI.
//!
//! TOML file + `CATALOGO_` environment overrides, credential resolution
//! (env + keyring + plaintext), and translation to the core's
//! `ClientConfig`, `RouteTable` and `FileSessionStore`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use catalogo_core::{
    ClientConfig, DEFAULT_SESSION_EXPIRY, FileSessionStore, Route, RouteMeta, RouteTable, UserType,
};

/// Keyring service name passwords are stored under.
pub const KEYRING_SERVICE: &str = "catalogo";
/// Environment variable consulted first for the login password.
pub const PASSWORD_ENV: &str = "CATALOGO_PASSWORD";
const ENV_PREFIX: &str = "CATALOGO_";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no credentials configured for user '{user}'")]
    NoCredentials { user: String },

    #[error("no username configured")]
    NoUsername,

    #[error("keyring error: {0}")]
    Keyring(#[from] keyring::Error),

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Config {
    /// Backend API base URL (e.g. "https://api.example.cl/api-back/").
    pub back_base_url: Option<String>,

    /// Application origin serving the login and session routes.
    pub app_base_url: Option<String>,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// Path to a custom CA certificate.
    pub ca_cert: Option<PathBuf>,

    /// Default login user.
    pub username: Option<String>,

    /// Password (plaintext; prefer keyring or env var).
    pub password: Option<String>,

    #[serde(default)]
    pub session: SessionSettings,

    /// Route metadata checked by the navigation guard.
    #[serde(default = "default_routes")]
    pub routes: Vec<Route>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            back_base_url: None,
            app_base_url: None,
            timeout: default_timeout(),
            ca_cert: None,
            username: None,
            password: None,
            session: SessionSettings::default(),
            routes: default_routes(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct SessionSettings {
    /// Lifetime of a persisted session.
    #[serde(default = "default_expiry")]
    pub expiry_in_seconds: u64,

    /// Session file; defaults to the platform data dir.
    pub path: Option<PathBuf>,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            expiry_in_seconds: default_expiry(),
            path: None,
        }
    }
}

fn default_timeout() -> u64 {
    30
}
fn default_expiry() -> u64 {
    DEFAULT_SESSION_EXPIRY.as_secs()
}

fn default_routes() -> Vec<Route> {
    vec![
        Route {
            path: "/login".into(),
            meta: RouteMeta::public(),
        },
        Route {
            path: "/solicitudes".into(),
            meta: RouteMeta::with_roles([UserType::User, UserType::Admin]),
        },
        Route {
            path: "/admin".into(),
            meta: RouteMeta::with_roles([UserType::Admin]),
        },
    ]
}

fn parse_url(field: &str, raw: Option<&str>) -> Result<Option<Url>, ConfigError> {
    raw.map(|raw| {
        raw.parse().map_err(|_| ConfigError::Validation {
            field: field.into(),
            reason: format!("invalid URL: {raw}"),
        })
    })
    .transpose()
}

impl Config {
    /// Connection settings for the core.
    pub fn client_config(&self) -> Result<ClientConfig, ConfigError> {
        let back_base_url = parse_url("back_base_url", self.back_base_url.as_deref())?;
        let app_base_url = parse_url("app_base_url", self.app_base_url.as_deref())?;
        if back_base_url.is_none() && app_base_url.is_none() {
            return Err(ConfigError::Validation {
                field: "back_base_url".into(),
                reason: "set back_base_url or app_base_url".into(),
            });
        }

        Ok(ClientConfig {
            back_base_url,
            app_base_url,
            timeout: Duration::from_secs(self.timeout),
            ca_cert: self.ca_cert.clone(),
            ..ClientConfig::default()
        })
    }

    pub fn route_table(&self) -> RouteTable {
        self.routes.iter().cloned().collect()
    }

    pub fn session_path(&self) -> PathBuf {
        self.session.path.clone().unwrap_or_else(session_path)
    }

    pub fn session_store(&self) -> FileSessionStore {
        FileSessionStore::new(self.session_path())
            .with_expiry(Duration::from_secs(self.session.expiry_in_seconds))
    }
}

// ── Paths ───────────────────────────────────────────────────────────

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("cl", "usach", "catalogo")
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("catalogo");
    p
}

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    project_dirs().map_or_else(
        || dirs_fallback().join("config.toml"),
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

/// Default location of the persisted session.
pub fn session_path() -> PathBuf {
    project_dirs().map_or_else(
        || dirs_fallback().join("session.json"),
        |dirs| dirs.data_dir().join("session.json"),
    )
}

// ── Loading / saving ────────────────────────────────────────────────

/// Load the config from `path` (or the canonical path) plus environment.
///
/// A missing file is not an error. Nested keys use a double underscore
/// in the environment: `CATALOGO_SESSION__EXPIRY_IN_SECONDS`. The password
/// and config-path variables are read elsewhere, not merged here.
pub fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    let path = path.map_or_else(config_path, Path::to_path_buf);

    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(&path))
        .merge(Env::prefixed(ENV_PREFIX).ignore(&["PASSWORD", "CONFIG"]).split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Serialize config to TOML and write it to `path`.
pub fn save_config(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Credential resolution ───────────────────────────────────────────

/// Pick the login user: explicit flag, then config.
pub fn resolve_username(config: &Config, flag: Option<&str>) -> Result<String, ConfigError> {
    flag.map(str::to_owned)
        .or_else(|| config.username.clone())
        .ok_or(ConfigError::NoUsername)
}

/// Resolve the password for `user` without prompting.
///
/// Order: `CATALOGO_PASSWORD`, system keyring, plaintext config.
pub fn resolve_password(config: &Config, user: &str) -> Result<SecretString, ConfigError> {
    // 1. Env var
    if let Ok(pw) = std::env::var(PASSWORD_ENV) {
        return Ok(SecretString::from(pw));
    }

    // 2. Keyring
    if let Ok(entry) = keyring::Entry::new(KEYRING_SERVICE, user) {
        if let Ok(pw) = entry.get_password() {
            return Ok(SecretString::from(pw));
        }
    }

    // 3. Plaintext in config
    if let Some(ref pw) = config.password {
        return Ok(SecretString::from(pw.clone()));
    }

    Err(ConfigError::NoCredentials { user: user.into() })
}

/// Store `password` for `user` in the system keyring.
pub fn store_password(user: &str, password: &SecretString) -> Result<(), ConfigError> {
    use secrecy::ExposeSecret;

    let entry = keyring::Entry::new(KEYRING_SERVICE, user)?;
    entry.set_password(password.expose_secret())?;
    Ok(())
}

/// Remove any stored password for `user`. Nothing stored is not an error.
pub fn forget_password(user: &str) -> Result<(), ConfigError> {
    let entry = keyring::Entry::new(KEYRING_SERVICE, user)?;
    match entry.delete_credential() {
        Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
        Err(e) => Err(e.into()),
    }
}
