// ── Application facade ──
//
// Wires the fetch module, auth store, route guard, service base and
// notifier together. One `App` per client session.

use std::sync::Arc;

use secrecy::SecretString;
use tracing::debug;

use catalogo_api::{BusyTracker, FetchModule};

use crate::auth::AuthStore;
use crate::config::ClientConfig;
use crate::error::CoreError;
use crate::guard::{Navigation, RouteGuard, RouteTable};
use crate::model::AuthData;
use crate::notifier::Notifier;
use crate::service::Service;
use crate::session_store::SessionStore;

pub struct App<S> {
    fetch: Arc<FetchModule>,
    auth: Arc<AuthStore<S>>,
    guard: RouteGuard<S>,
    service: Service<S>,
    notifier: Notifier,
}

impl<S: SessionStore> App<S> {
    pub fn new(fetch: Arc<FetchModule>, store: S, routes: RouteTable) -> Self {
        let notifier = Notifier::new();
        let auth = Arc::new(AuthStore::new(Arc::clone(&fetch), store));
        let guard = RouteGuard::new(Arc::clone(&auth), routes, notifier.clone());
        let service = Service::new(Arc::clone(&fetch), Arc::clone(&auth));
        Self {
            fetch,
            auth,
            guard,
            service,
            notifier,
        }
    }

    /// Build the fetch module from `config` and wire the rest around it.
    pub fn from_config(config: &ClientConfig, store: S, routes: RouteTable) -> Result<Self, CoreError> {
        let busy = Arc::new(BusyTracker::new());
        let fetch = Arc::new(config.build_fetch(busy)?);
        Ok(Self::new(fetch, store, routes))
    }

    pub fn fetch(&self) -> &Arc<FetchModule> {
        &self.fetch
    }

    pub fn auth(&self) -> &Arc<AuthStore<S>> {
        &self.auth
    }

    pub fn guard(&self) -> &RouteGuard<S> {
        &self.guard
    }

    pub fn service(&self) -> &Service<S> {
        &self.service
    }

    pub fn notifier(&self) -> &Notifier {
        &self.notifier
    }

    pub fn busy(&self) -> &Arc<BusyTracker> {
        self.fetch.busy()
    }

    /// Navigate to `path`: cancel requests bound to the previous page, then
    /// run the route guard.
    pub async fn navigate(&self, path: &str) -> Result<Navigation, CoreError> {
        self.navigate_with_cookie(path, None).await
    }

    /// As [`navigate`](Self::navigate), forwarding `cookie` to the session
    /// restore call.
    pub async fn navigate_with_cookie(
        &self,
        path: &str,
        cookie: Option<&str>,
    ) -> Result<Navigation, CoreError> {
        let cancelled = self.fetch.on_navigate(path);
        if cancelled > 0 {
            debug!(path, cancelled, "cancelled requests bound to previous route");
        }
        self.guard.before_each(path, cookie).await
    }

    /// Log in and announce the outcome on the notification bus.
    pub async fn login(&self, user: &str, password: &SecretString) -> Result<AuthData, CoreError> {
        match self.auth.login(user, password).await {
            Ok(data) => {
                self.notifier
                    .success(format!("Bienvenido, {}", data.user.username));
                Ok(data)
            }
            Err(e) => {
                self.notifier.error(e.to_string());
                Err(e)
            }
        }
    }

    pub async fn logout(&self) -> Result<(), CoreError> {
        self.auth.logout().await?;
        self.notifier.info("Sesión cerrada");
        Ok(())
    }
}
