// Declarative request description consumed by `FetchModule`.

use std::fmt;

use bytes::Bytes;
use indexmap::IndexMap;
use secrecy::SecretString;

/// Sentinel abort target meaning "this request's own canonical URL".
pub const ABORT_SAME: &str = "same";

/// HTTP methods the backend exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Method {
    #[default]
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    /// Whether the method changes server state (drives the mutating spinner).
    pub fn is_mutating(self) -> bool {
        !matches!(self, Self::Get)
    }

    pub(crate) fn as_reqwest(self) -> reqwest::Method {
        match self {
            Self::Get => reqwest::Method::GET,
            Self::Post => reqwest::Method::POST,
            Self::Put => reqwest::Method::PUT,
            Self::Delete => reqwest::Method::DELETE,
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        })
    }
}

/// How the response body is read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResponseKind {
    Blob,
    Text,
    #[default]
    Json,
    Stream,
    ArrayBuffer,
}

/// Which base URL a relative request is resolved against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Origin {
    /// The remote backend API (`back_base_url`).
    #[default]
    Backend,
    /// The application's own origin, for same-origin routes such as
    /// `/auth/login` and `/api/session`.
    App,
}

/// Which registry key a new request cancels before it is issued.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AbortTarget {
    /// The new request's own canonical URL.
    Same,
    /// An explicit canonical URL.
    Url(String),
}

impl From<&str> for AbortTarget {
    fn from(value: &str) -> Self {
        if value == ABORT_SAME {
            Self::Same
        } else {
            Self::Url(value.to_owned())
        }
    }
}

impl AbortTarget {
    /// Resolve against the canonical URL of the request being issued.
    pub fn resolve<'a>(&'a self, own_key: &'a str) -> &'a str {
        match self {
            Self::Same => own_key,
            Self::Url(url) => url,
        }
    }
}

/// Per-request cancellation policy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AbortPolicy {
    pub target: Option<AbortTarget>,
    pub cancel_on_route_change: bool,
}

/// Request payload.
#[derive(Debug, Clone)]
pub enum RequestBody {
    Json(serde_json::Value),
    Text(String),
    Bytes(Bytes),
}

/// Everything needed to issue one HTTP call.
#[derive(Debug, Clone, Default)]
pub struct RequestConfig {
    pub method: Method,
    pub url: String,
    pub body: Option<RequestBody>,
    pub headers: IndexMap<String, String>,
    pub bearer_token: Option<SecretString>,
    pub abort: Option<AbortPolicy>,
    /// Query parameters; `None` values are left out of the URL.
    pub params: IndexMap<String, Option<String>>,
    pub response_kind: ResponseKind,
    /// Named busy scope; `"default"` when unset.
    pub scope: Option<String>,
    /// Drive the mutating spinner even for GET requests.
    pub force_spinner: bool,
    pub origin: Origin,
}

impl RequestConfig {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            ..Self::default()
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::Get, url)
    }

    pub fn post(url: impl Into<String>, body: serde_json::Value) -> Self {
        Self::new(Method::Post, url).json(body)
    }

    pub fn put(url: impl Into<String>, body: serde_json::Value) -> Self {
        Self::new(Method::Put, url).json(body)
    }

    pub fn delete(url: impl Into<String>) -> Self {
        Self::new(Method::Delete, url)
    }

    // ── Builders ─────────────────────────────────────────────────────

    pub fn json(mut self, body: serde_json::Value) -> Self {
        self.body = Some(RequestBody::Json(body));
        self
    }

    pub fn body(mut self, body: RequestBody) -> Self {
        self.body = Some(body);
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn bearer(mut self, token: Option<SecretString>) -> Self {
        self.bearer_token = token;
        self
    }

    pub fn param(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.params.insert(key.into(), Some(value.to_string()));
        self
    }

    pub fn param_opt<V: ToString>(mut self, key: impl Into<String>, value: Option<V>) -> Self {
        self.params
            .insert(key.into(), value.map(|v| v.to_string()));
        self
    }

    /// Cancel every pending request under `target` (or `"same"`) first.
    pub fn abort_previous(mut self, target: impl Into<AbortTarget>) -> Self {
        self.abort.get_or_insert_with(AbortPolicy::default).target = Some(target.into());
        self
    }

    /// Cancel this request when the user navigates away from the page
    /// that issued it.
    pub fn cancel_on_route_change(mut self) -> Self {
        self.abort
            .get_or_insert_with(AbortPolicy::default)
            .cancel_on_route_change = true;
        self
    }

    pub fn response_kind(mut self, kind: ResponseKind) -> Self {
        self.response_kind = kind;
        self
    }

    pub fn scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = Some(scope.into());
        self
    }

    pub fn force_spinner(mut self) -> Self {
        self.force_spinner = true;
        self
    }

    pub fn origin(mut self, origin: Origin) -> Self {
        self.origin = origin;
        self
    }

    // ── Derived values ───────────────────────────────────────────────

    /// Registry key: the URL as configured, query string stripped.
    pub fn canonical_key(&self) -> &str {
        self.url.split('?').next().unwrap_or_default()
    }

    /// The URL with query parameters appended as `key=value` pairs.
    pub fn resolved_path(&self) -> String {
        let mut url = self.url.clone();
        let mut has_query = url.contains('?');
        for (key, value) in &self.params {
            let Some(value) = value else { continue };
            url.push(if has_query { '&' } else { '?' });
            url.push_str(key);
            url.push('=');
            url.push_str(value);
            has_query = true;
        }
        url
    }

    /// Abort target resolved against this request's canonical URL.
    pub fn abort_key(&self) -> Option<&str> {
        let target = self.abort.as_ref()?.target.as_ref()?;
        Some(target.resolve(self.canonical_key()))
    }

    /// Whether a navigation away from the issuing page cancels this request.
    pub fn cancels_on_route_change(&self) -> bool {
        self.abort
            .as_ref()
            .is_some_and(|policy| policy.cancel_on_route_change)
    }

    /// Whether this request holds the mutating spinner.
    pub fn counts_as_mutating(&self) -> bool {
        self.method.is_mutating() || self.force_spinner
    }

    /// Whether this request holds the read spinner.
    pub fn counts_as_read(&self) -> bool {
        !self.method.is_mutating()
    }
}
