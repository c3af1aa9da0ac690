// ── Session persistence ──
//
// The auth store mirrors every login into a `SessionStore` so a later
// process (or page load) can restore it. Two implementations ship here:
// an in-memory store and a JSON file with an expiry window.

use std::future::Future;
use std::path::PathBuf;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::error::CoreError;
use crate::model::AuthData;

/// Default lifetime of a persisted session.
pub const DEFAULT_SESSION_EXPIRY: Duration = Duration::from_secs(3600);

/// External session collaborator: overwrite, remove, read current.
pub trait SessionStore: Send + Sync {
    /// Replace the persisted session with `data`.
    fn overwrite(&self, data: &AuthData) -> impl Future<Output = Result<(), CoreError>> + Send;

    /// Drop the persisted session. Removing nothing is not an error.
    fn remove(&self) -> impl Future<Output = Result<(), CoreError>> + Send;

    /// The persisted session, if one exists and is still live.
    fn current(&self) -> impl Future<Output = Result<Option<AuthData>, CoreError>> + Send;
}

// ── In-memory ────────────────────────────────────────────────────────

/// Process-local session store.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    session: RwLock<Option<AuthData>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemorySessionStore {
    async fn overwrite(&self, data: &AuthData) -> Result<(), CoreError> {
        *self.session.write().await = Some(data.clone());
        Ok(())
    }

    async fn remove(&self) -> Result<(), CoreError> {
        *self.session.write().await = None;
        Ok(())
    }

    async fn current(&self) -> Result<Option<AuthData>, CoreError> {
        Ok(self.session.read().await.clone())
    }
}

// ── File-backed ──────────────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
struct StoredSession {
    stored_at: DateTime<Utc>,
    session: AuthData,
}

/// Session persisted as JSON on disk; entries older than `expiry` read as
/// absent.
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    path: PathBuf,
    expiry: Duration,
}

impl FileSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            expiry: DEFAULT_SESSION_EXPIRY,
        }
    }

    pub fn with_expiry(mut self, expiry: Duration) -> Self {
        self.expiry = expiry;
        self
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }

    fn is_stale(&self, stored_at: DateTime<Utc>) -> bool {
        let age = Utc::now().signed_duration_since(stored_at);
        age.to_std().is_ok_and(|age| age >= self.expiry)
    }
}

impl SessionStore for FileSessionStore {
    async fn overwrite(&self, data: &AuthData) -> Result<(), CoreError> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let stored = StoredSession {
            stored_at: Utc::now(),
            session: data.clone(),
        };
        let json = serde_json::to_vec_pretty(&stored)?;
        tokio::fs::write(&self.path, json).await?;
        debug!(path = %self.path.display(), "session persisted");
        Ok(())
    }

    async fn remove(&self) -> Result<(), CoreError> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => {
                debug!(path = %self.path.display(), "session removed");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn current(&self) -> Result<Option<AuthData>, CoreError> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let stored: StoredSession = match serde_json::from_slice(&bytes) {
            Ok(stored) => stored,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "ignoring unreadable session file");
                return Ok(None);
            }
        };
        if self.is_stale(stored.stored_at) {
            debug!(path = %self.path.display(), "persisted session expired");
            return Ok(None);
        }
        Ok(Some(stored.session))
    }
}
