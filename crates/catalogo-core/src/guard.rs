// ── Route guard ──
//
// Runs before every navigation: adopt a server-side session when the local
// state is anonymous, then check the target route's metadata against it.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::auth::AuthStore;
use crate::error::CoreError;
use crate::model::{ROLE_ADMIN, ROLE_USER, UserType};
use crate::notifier::Notifier;
use crate::session_store::SessionStore;

pub const LOGIN_ROUTE: &str = "/login";
pub const HOME_ROUTE: &str = "/solicitudes";

/// Per-route access requirements.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteMeta {
    /// Whether the route needs a session. `None` means required.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth: Option<bool>,
    /// Role keys allowed on the route; empty means any authenticated user.
    #[serde(default, alias = "userType")]
    pub user_type: Vec<UserType>,
}

impl RouteMeta {
    pub fn public() -> Self {
        Self {
            auth: Some(false),
            user_type: Vec::new(),
        }
    }

    pub fn with_roles(roles: impl IntoIterator<Item = UserType>) -> Self {
        Self {
            auth: None,
            user_type: roles.into_iter().collect(),
        }
    }

    pub fn requires_auth(&self) -> bool {
        self.auth.unwrap_or(true)
    }

    fn role_names(&self) -> Vec<&'static str> {
        self.user_type.iter().map(|t| t.role_name()).collect()
    }
}

/// A path with its metadata, as loaded from configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Route {
    pub path: String,
    #[serde(flatten)]
    pub meta: RouteMeta,
}

/// Exact-path lookup; unknown paths get the default metadata.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    routes: HashMap<String, RouteMeta>,
    fallback: RouteMeta,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_route(mut self, path: impl Into<String>, meta: RouteMeta) -> Self {
        self.insert(path, meta);
        self
    }

    pub fn insert(&mut self, path: impl Into<String>, meta: RouteMeta) {
        self.routes.insert(path.into(), meta);
    }

    pub fn meta(&self, path: &str) -> &RouteMeta {
        self.routes.get(path).unwrap_or(&self.fallback)
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

impl FromIterator<Route> for RouteTable {
    fn from_iter<I: IntoIterator<Item = Route>>(iter: I) -> Self {
        let mut table = Self::new();
        for route in iter {
            table.insert(route.path, route.meta);
        }
        table
    }
}

/// Outcome of a guard check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Navigation {
    Proceed,
    /// Full top-level redirect to the given path.
    Redirect(String),
}

impl Navigation {
    fn redirect(path: &str) -> Self {
        Self::Redirect(path.to_owned())
    }
}

pub struct RouteGuard<S> {
    auth: Arc<AuthStore<S>>,
    routes: RouteTable,
    notifier: Notifier,
}

impl<S: SessionStore> RouteGuard<S> {
    pub fn new(auth: Arc<AuthStore<S>>, routes: RouteTable, notifier: Notifier) -> Self {
        Self {
            auth,
            routes,
            notifier,
        }
    }

    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    /// Decide whether navigation to `path` may proceed.
    ///
    /// `cookie` is forwarded to the session restore call when the local
    /// state is anonymous.
    pub async fn before_each(&self, path: &str, cookie: Option<&str>) -> Result<Navigation, CoreError> {
        if !self.auth.is_authenticated() {
            self.auth.restore(cookie).await;
        }

        let meta = self.routes.meta(path);
        if meta.requires_auth() && !self.auth.is_authenticated() {
            debug!(path, "unauthenticated, redirecting to login");
            return Ok(Navigation::redirect(LOGIN_ROUTE));
        }

        if meta.user_type.is_empty() || path == LOGIN_ROUTE {
            return Ok(Navigation::Proceed);
        }

        let required = meta.role_names();
        if self.auth.has_any_role(&required) {
            return Ok(Navigation::Proceed);
        }

        let home = if self.auth.has_any_role(&[ROLE_USER, ROLE_ADMIN]) {
            HOME_ROUTE
        } else {
            self.auth.logout().await?;
            LOGIN_ROUTE
        };
        debug!(path, ?required, home, "missing role for route");

        if path == home {
            return Ok(Navigation::Proceed);
        }
        self.notifier
            .info(format!("No tienes permisos para acceder a {path}"));
        Ok(Navigation::redirect(home))
    }
}
