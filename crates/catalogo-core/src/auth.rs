// ── Session / auth state ──
//
// Anonymous <-> Authenticated state machine. Every transition into
// Authenticated first writes the session store, so the local state never
// claims a session the store does not hold.

use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use catalogo_api::{FetchModule, Origin, RequestConfig};

use crate::error::CoreError;
use crate::model::{AuthData, User};
use crate::session_store::SessionStore;

/// Same-origin login route.
pub const LOGIN_PATH: &str = "/auth/login";
/// Same-origin route exposing the server-side session.
pub const SESSION_PATH: &str = "/api/session";

/// Observable authentication state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum AuthState {
    #[default]
    Anonymous,
    Authenticated(AuthData),
}

#[derive(Serialize)]
struct LoginForm<'a> {
    user: &'a str,
    password: &'a str,
}

/// `/api/session` answers with whatever the server session holds, which
/// may be nothing.
#[derive(Debug, Default, Deserialize)]
struct SessionPayload {
    token: Option<String>,
    expire: Option<DateTime<Utc>>,
    user: Option<User>,
}

impl SessionPayload {
    fn into_auth_data(self) -> Option<AuthData> {
        let token = self.token.filter(|t| !t.is_empty())?;
        Some(AuthData {
            token,
            expire: self.expire?,
            user: self.user?,
        })
    }
}

/// Holds the current principal and mirrors it into a [`SessionStore`].
pub struct AuthStore<S> {
    fetch: Arc<FetchModule>,
    store: S,
    state: RwLock<AuthState>,
}

impl<S: SessionStore> AuthStore<S> {
    pub fn new(fetch: Arc<FetchModule>, store: S) -> Self {
        Self {
            fetch,
            store,
            state: RwLock::new(AuthState::Anonymous),
        }
    }

    pub fn session_store(&self) -> &S {
        &self.store
    }

    pub fn fetch(&self) -> &Arc<FetchModule> {
        &self.fetch
    }

    // ── Getters ──────────────────────────────────────────────────────

    pub fn state(&self) -> AuthState {
        self.state.read().expect("auth state lock poisoned").clone()
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(
            *self.state.read().expect("auth state lock poisoned"),
            AuthState::Authenticated(_)
        )
    }

    /// Current session, if authenticated.
    pub fn auth_data(&self) -> Option<AuthData> {
        match self.state() {
            AuthState::Authenticated(data) => Some(data),
            AuthState::Anonymous => None,
        }
    }

    fn with_user<T>(&self, f: impl FnOnce(&AuthData) -> T) -> Option<T> {
        match *self.state.read().expect("auth state lock poisoned") {
            AuthState::Authenticated(ref data) => Some(f(data)),
            AuthState::Anonymous => None,
        }
    }

    pub fn token(&self) -> Option<SecretString> {
        self.with_user(|d| SecretString::from(d.token.clone()))
    }

    pub fn roles(&self) -> Option<Vec<String>> {
        self.with_user(|d| d.user.roles.clone())
    }

    pub fn username(&self) -> Option<String> {
        self.with_user(|d| d.user.username.clone())
    }

    pub fn user_id(&self) -> Option<String> {
        self.with_user(|d| d.user.id.clone())
    }

    pub fn national_id(&self) -> Option<String> {
        self.with_user(|d| d.user.national_id.clone())
    }

    pub fn email(&self) -> Option<String> {
        self.with_user(|d| d.user.email.clone())
    }

    /// Cost centres of the current user; empty when anonymous.
    pub fn cost_centres(&self) -> Vec<String> {
        self.with_user(|d| d.user.cost_centres.clone())
            .unwrap_or_default()
    }

    // ── Role checks ──────────────────────────────────────────────────

    /// True if the user holds any of `candidates`; false when anonymous.
    pub fn has_any_role<R: AsRef<str>>(&self, candidates: &[R]) -> bool {
        self.with_user(|d| {
            d.user
                .roles
                .iter()
                .any(|role| candidates.iter().any(|c| c.as_ref() == role))
        })
        .unwrap_or(false)
    }

    /// True if the user holds none of `candidates`; true when anonymous.
    pub fn lacks_roles<R: AsRef<str>>(&self, candidates: &[R]) -> bool {
        !self.has_any_role(candidates)
    }

    // ── Transitions ──────────────────────────────────────────────────

    /// Authenticate against the application's login route.
    ///
    /// Any failure of the call is reported as
    /// [`CoreError::InvalidCredentials`].
    pub async fn login(&self, user: &str, password: &SecretString) -> Result<AuthData, CoreError> {
        let form = LoginForm {
            user,
            password: password.expose_secret(),
        };
        let body = serde_json::to_value(&form)?;
        let config = RequestConfig::post(LOGIN_PATH, body).origin(Origin::App);

        let data = match self.fetch.fetch_data::<AuthData>(config).await {
            Ok(envelope) => envelope.into_inner(),
            Err(e) => {
                debug!(user, error = %e, "login request failed");
                return Err(CoreError::InvalidCredentials);
            }
        };

        self.set_auth(data.clone()).await?;
        info!(user = %data.user.username, "logged in");
        Ok(data)
    }

    /// Persist `data` into the session store, then adopt it.
    pub async fn set_auth(&self, data: AuthData) -> Result<(), CoreError> {
        self.store.overwrite(&data).await?;
        *self.state.write().expect("auth state lock poisoned") = AuthState::Authenticated(data);
        Ok(())
    }

    /// Clear local state and the persisted session.
    pub async fn logout(&self) -> Result<(), CoreError> {
        *self.state.write().expect("auth state lock poisoned") = AuthState::Anonymous;
        self.store.remove().await?;
        info!("logged out");
        Ok(())
    }

    /// Adopt the server-side session, if any, without re-entering
    /// credentials. `cookie` is forwarded as the request's `Cookie` header.
    ///
    /// Returns whether a session was adopted; failures are logged and leave
    /// the state anonymous.
    pub async fn restore(&self, cookie: Option<&str>) -> bool {
        let mut config = RequestConfig::get(SESSION_PATH).origin(Origin::App);
        if let Some(cookie) = cookie {
            config = config.header("cookie", cookie);
        }

        let value = match self.fetch.fetch_body(config).await {
            Ok(body) => body.into_json().unwrap_or_default(),
            Err(e) => {
                warn!(error = %e, "error fetching session");
                return false;
            }
        };
        if value.is_null() {
            debug!("no server-side session");
            return false;
        }

        let payload: SessionPayload = match serde_json::from_value(value) {
            Ok(payload) => payload,
            Err(e) => {
                warn!(error = %e, "unreadable session payload");
                return false;
            }
        };
        let Some(data) = payload.into_auth_data() else {
            debug!("server-side session has no token");
            return false;
        };
        if data.is_expired_at(Utc::now()) {
            debug!(expire = %data.expire, "server-side session already expired");
            return false;
        }

        match self.set_auth(data).await {
            Ok(()) => {
                debug!("session restored");
                true
            }
            Err(e) => {
                warn!(error = %e, "failed to persist restored session");
                false
            }
        }
    }

    /// Re-sync the local state from the session store.
    ///
    /// Adopts the stored session when it carries an unexpired token,
    /// otherwise drops to anonymous. Returns the resulting `is_authenticated`.
    pub async fn is_user_authenticated(&self) -> Result<bool, CoreError> {
        let now = Utc::now();
        let stored = self
            .store
            .current()
            .await?
            .filter(|data| !data.token.is_empty() && !data.is_expired_at(now));
        let authenticated = stored.is_some();
        *self.state.write().expect("auth state lock poisoned") = match stored {
            Some(data) => AuthState::Authenticated(data),
            None => AuthState::Anonymous,
        };
        Ok(authenticated)
    }
}
