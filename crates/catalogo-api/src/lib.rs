// catalogo-api: request layer for the catalogo backend
//
// Issues HTTP calls from declarative `RequestConfig`s, tracks every in-flight
// request in a registry keyed by canonical URL, drives the global busy flags,
// and cancels stale requests when the user navigates away.

pub mod busy;
pub mod error;
pub mod fetch;
pub mod registry;
pub mod request;
pub mod transport;

pub use busy::{BusyKind, BusyTracker, Counter, DEFAULT_SCOPE};
pub use error::{ERROR_ABORT, Error, ErrorShape, handle_error};
pub use fetch::{Envelope, FetchModule, ResponseBody};
pub use registry::{PendingRequest, RequestRegistry};
pub use request::{AbortPolicy, AbortTarget, Method, Origin, RequestBody, RequestConfig, ResponseKind};
pub use transport::TransportConfig;
