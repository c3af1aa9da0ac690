// HTTP execution wrapper
//
// Issues one call per `RequestConfig`: registers it in the request
// registry, drives the busy tracker, races the call against its
// cancellation token, and always cleans up through a drop guard so
// success, failure, cancellation and a dropped future all settle the
// same way.

use std::fmt;
use std::ops::Deref;
use std::sync::{Arc, RwLock};

use bytes::Bytes;
use futures_util::stream::{BoxStream, StreamExt};
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderName, HeaderValue};
use secrecy::ExposeSecret;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};
use url::Url;

use crate::busy::{BusyKind, BusyTracker, DEFAULT_SCOPE};
use crate::error::{Error, ErrorShape, handle_error};
use crate::registry::{PendingRequest, RequestRegistry};
use crate::request::{Origin, RequestBody, RequestConfig, ResponseKind};
use crate::transport::TransportConfig;

// ── Response types ───────────────────────────────────────────────────

/// A parsed JSON response merged with the `{success, message?}` envelope
/// every backend answer may carry.
///
/// `T` must not declare its own `success` or `message` fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope<T> {
    #[serde(default = "default_success")]
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(flatten)]
    pub data: T,
}

fn default_success() -> bool {
    true
}

impl<T> Deref for Envelope<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.data
    }
}

impl<T> Envelope<T> {
    pub fn into_inner(self) -> T {
        self.data
    }
}

/// Response body, read according to the request's [`ResponseKind`].
pub enum ResponseBody {
    /// `json`; an empty body reads as `null`.
    Json(serde_json::Value),
    Text(String),
    /// `blob` and `arrayBuffer`.
    Bytes(Bytes),
    Stream(BoxStream<'static, Result<Bytes, reqwest::Error>>),
}

impl fmt::Debug for ResponseBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Json(v) => f.debug_tuple("Json").field(v).finish(),
            Self::Text(t) => f.debug_tuple("Text").field(t).finish(),
            Self::Bytes(b) => f.debug_tuple("Bytes").field(&b.len()).finish(),
            Self::Stream(_) => f.write_str("Stream(..)"),
        }
    }
}

impl ResponseBody {
    pub fn into_json(self) -> Option<serde_json::Value> {
        match self {
            Self::Json(v) => Some(v),
            _ => None,
        }
    }

    pub fn into_text(self) -> Option<String> {
        match self {
            Self::Text(t) => Some(t),
            _ => None,
        }
    }

    pub fn into_bytes(self) -> Option<Bytes> {
        match self {
            Self::Bytes(b) => Some(b),
            _ => None,
        }
    }
}

// ── Fetch module ─────────────────────────────────────────────────────

/// Request lifecycle manager shared by every service.
///
/// Owns the request registry and the current navigation path; the busy
/// tracker is injected so UI consumers can hold their own handle to it.
pub struct FetchModule {
    http: reqwest::Client,
    backend_base: Option<Url>,
    app_base: Option<Url>,
    registry: RequestRegistry,
    busy: Arc<BusyTracker>,
    current_path: RwLock<String>,
}

impl FetchModule {
    /// Wrap a pre-built `reqwest::Client`.
    ///
    /// `backend_base` prefixes requests with [`Origin::Backend`],
    /// `app_base` those with [`Origin::App`].
    pub fn new(
        http: reqwest::Client,
        backend_base: Option<Url>,
        app_base: Option<Url>,
        busy: Arc<BusyTracker>,
    ) -> Self {
        Self {
            http,
            backend_base,
            app_base,
            registry: RequestRegistry::new(),
            busy,
            current_path: RwLock::new("/".into()),
        }
    }

    /// Build the HTTP client from a `TransportConfig`.
    pub fn from_transport(
        transport: &TransportConfig,
        backend_base: Option<Url>,
        app_base: Option<Url>,
        busy: Arc<BusyTracker>,
    ) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self::new(http, backend_base, app_base, busy))
    }

    pub fn registry(&self) -> &RequestRegistry {
        &self.registry
    }

    pub fn busy(&self) -> &Arc<BusyTracker> {
        &self.busy
    }

    pub fn backend_base(&self) -> Option<&Url> {
        self.backend_base.as_ref()
    }

    pub fn app_base(&self) -> Option<&Url> {
        self.app_base.as_ref()
    }

    /// Navigation path new requests are attributed to.
    pub fn current_path(&self) -> String {
        self.current_path.read().expect("path lock poisoned").clone()
    }

    /// Record a navigation and cancel requests that asked to die with the
    /// page they were issued on. Returns how many were signalled.
    pub fn on_navigate(&self, path: &str) -> usize {
        *self.current_path.write().expect("path lock poisoned") = path.to_owned();
        self.registry.on_navigate(path)
    }

    /// Classify a failure into the uniform [`ErrorShape`].
    pub fn handle_error(&self, error: &(dyn std::error::Error + 'static)) -> ErrorShape {
        handle_error(error)
    }

    // ── Request execution ────────────────────────────────────────────

    /// Issue a JSON request and decode the body merged with its envelope.
    pub async fn fetch_data<T: DeserializeOwned>(
        &self,
        config: RequestConfig,
    ) -> Result<Envelope<T>, Error> {
        let config = config.response_kind(ResponseKind::Json);
        let value = self
            .fetch_body(config)
            .await?
            .into_json()
            .unwrap_or_default();
        serde_json::from_value(value.clone()).map_err(|e| Error::Deserialization {
            message: e.to_string(),
            body: value.to_string(),
        })
    }

    /// Issue a request and read the body per its `response_kind`.
    pub async fn fetch_body(&self, config: RequestConfig) -> Result<ResponseBody, Error> {
        let config = Arc::new(config);
        let key = config.canonical_key().to_owned();

        let url = self.resolve_url(&config)?;
        let request = self.build_request(&config, &url)?;

        // Only a request that is about to go out may supersede its
        // predecessors.
        if let Some(abort_key) = config.abort_key() {
            if self.registry.contains(abort_key) {
                self.registry.cancel_all_for(abort_key);
            }
        }

        let pending = PendingRequest::new(self.current_path(), Arc::clone(&config));
        let cancel = pending.cancel.clone();
        let id = pending.id.clone();
        self.registry.register(&key, pending);
        let _in_flight = InFlight::start(self, key, id, &config);

        debug!(method = %config.method, %url, "fetch");

        tokio::select! {
            biased;
            () = cancel.cancelled() => {
                debug!(method = %config.method, %url, "fetch cancelled");
                Err(Error::Cancelled { url: url.to_string() })
            }
            result = self.send(request, &config, &url) => result,
        }
    }

    /// Final URL: query params appended, then joined onto the base URL for
    /// the request's origin. Absolute URLs are used as given.
    fn resolve_url(&self, config: &RequestConfig) -> Result<Url, Error> {
        let path = config.resolved_path();
        if let Ok(url) = Url::parse(&path) {
            return Ok(url);
        }

        let base = match config.origin {
            Origin::Backend => self.backend_base.as_ref(),
            Origin::App => self.app_base.as_ref(),
        }
        .ok_or_else(|| Error::MissingBaseUrl { path: path.clone() })?;

        let joined = format!(
            "{}/{}",
            base.as_str().trim_end_matches('/'),
            path.trim_start_matches('/')
        );
        Ok(Url::parse(&joined)?)
    }

    fn build_request(
        &self,
        config: &RequestConfig,
        url: &Url,
    ) -> Result<reqwest::RequestBuilder, Error> {
        let mut headers = HeaderMap::new();

        // Authorization first; caller headers are merged over it.
        if let Some(ref token) = config.bearer_token {
            let mut value = HeaderValue::from_str(&format!("Bearer {}", token.expose_secret()))
                .map_err(|e| Error::InvalidHeader(format!("authorization: {e}")))?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }
        for (name, value) in &config.headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| Error::InvalidHeader(format!("{name}: {e}")))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| Error::InvalidHeader(format!("{name}: {e}")))?;
            headers.insert(name, value);
        }

        let builder = self
            .http
            .request(config.method.as_reqwest(), url.clone())
            .headers(headers);

        Ok(match config.body {
            Some(RequestBody::Json(ref value)) => builder.json(value),
            Some(RequestBody::Text(ref text)) => builder.body(text.clone()),
            Some(RequestBody::Bytes(ref bytes)) => builder.body(bytes.clone()),
            None => builder,
        })
    }

    async fn send(
        &self,
        request: reqwest::RequestBuilder,
        config: &RequestConfig,
        url: &Url,
    ) -> Result<ResponseBody, Error> {
        let resp = request.send().await.map_err(|e| {
            error!(method = %config.method, %url, error = %e, "fetch request error");
            Error::Transport(e)
        })?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            error!(method = %config.method, %url, %status, body = %body, "fetch response error");
            return Err(Error::Http {
                method: config.method.to_string(),
                url: url.to_string(),
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or_default().to_owned(),
                data: serde_json::from_str(&body).ok(),
            });
        }

        read_body(resp, config.response_kind).await
    }
}

async fn read_body(resp: reqwest::Response, kind: ResponseKind) -> Result<ResponseBody, Error> {
    match kind {
        ResponseKind::Json => {
            let bytes = resp.bytes().await?;
            if bytes.is_empty() {
                return Ok(ResponseBody::Json(serde_json::Value::Null));
            }
            serde_json::from_slice(&bytes)
                .map(ResponseBody::Json)
                .map_err(|e| Error::Deserialization {
                    message: e.to_string(),
                    body: String::from_utf8_lossy(&bytes).into_owned(),
                })
        }
        ResponseKind::Text => Ok(ResponseBody::Text(resp.text().await?)),
        ResponseKind::Blob | ResponseKind::ArrayBuffer => Ok(ResponseBody::Bytes(resp.bytes().await?)),
        ResponseKind::Stream => Ok(ResponseBody::Stream(resp.bytes_stream().boxed())),
    }
}

// ── In-flight bookkeeping ────────────────────────────────────────────

/// Busy marks and registry entry for one request; released on drop.
struct InFlight<'a> {
    fetch: &'a FetchModule,
    key: String,
    id: String,
    scope: String,
    mutating: bool,
    read: bool,
}

impl<'a> InFlight<'a> {
    fn start(fetch: &'a FetchModule, key: String, id: String, config: &RequestConfig) -> Self {
        let scope = config
            .scope
            .clone()
            .unwrap_or_else(|| DEFAULT_SCOPE.to_owned());
        let mutating = config.counts_as_mutating();
        let read = config.counts_as_read();

        fetch.busy.mark_scope_busy(&scope);
        if mutating {
            fetch.busy.increment(BusyKind::Mutating);
        }
        if read {
            fetch.busy.increment(BusyKind::Read);
        }

        Self {
            fetch,
            key,
            id,
            scope,
            mutating,
            read,
        }
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        let busy = &self.fetch.busy;
        if self.read {
            busy.decrement(BusyKind::Read);
        }
        if self.mutating {
            busy.decrement(BusyKind::Mutating);
        }
        self.fetch.registry.deregister(&self.key, &self.id);
        busy.clear_scope(&self.scope);
    }
}
