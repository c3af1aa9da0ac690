// ── Resource service base ──
//
// Backend resource services go through here so every call carries the
// current bearer token unless the caller opts out.

use std::sync::Arc;

use serde::de::DeserializeOwned;

use catalogo_api::{Envelope, ErrorShape, FetchModule, RequestConfig, ResponseBody};

use crate::auth::AuthStore;
use crate::error::CoreError;
use crate::session_store::SessionStore;

pub struct Service<S> {
    fetch: Arc<FetchModule>,
    auth: Arc<AuthStore<S>>,
}

impl<S> Clone for Service<S> {
    fn clone(&self) -> Self {
        Self {
            fetch: Arc::clone(&self.fetch),
            auth: Arc::clone(&self.auth),
        }
    }
}

impl<S: SessionStore> Service<S> {
    pub fn new(fetch: Arc<FetchModule>, auth: Arc<AuthStore<S>>) -> Self {
        Self { fetch, auth }
    }

    fn authorize(&self, config: RequestConfig, omit_token: bool) -> RequestConfig {
        let token = if omit_token { None } else { self.auth.token() };
        config.bearer(token)
    }

    /// JSON call with the session token attached.
    pub async fn fetch<T: DeserializeOwned>(
        &self,
        config: RequestConfig,
        omit_token: bool,
    ) -> Result<Envelope<T>, CoreError> {
        let config = self.authorize(config, omit_token);
        Ok(self.fetch.fetch_data(config).await?)
    }

    /// Raw-body variant for text, blob and stream responses.
    pub async fn fetch_body(
        &self,
        config: RequestConfig,
        omit_token: bool,
    ) -> Result<ResponseBody, CoreError> {
        let config = self.authorize(config, omit_token);
        Ok(self.fetch.fetch_body(config).await?)
    }

    pub fn handle_error(&self, error: &(dyn std::error::Error + 'static)) -> ErrorShape {
        match error.downcast_ref::<CoreError>() {
            Some(CoreError::Api(inner)) => self.fetch.handle_error(inner),
            _ => self.fetch.handle_error(error),
        }
    }
}
