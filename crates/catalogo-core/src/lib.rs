//! Session layer between `catalogo-api` and UI consumers (CLI).
//!
//! - **[`AuthStore`]**: anonymous/authenticated state machine. Logs in
//!   against the application origin, restores server-side sessions, and
//!   mirrors every transition into a [`SessionStore`].
//!
//! - **[`RouteGuard`]**: runs before each navigation; restores a session
//!   when needed and enforces the target route's [`RouteMeta`] (auth
//!   requirement and allowed [`UserType`]s), answering with a
//!   [`Navigation`].
//!
//! - **[`Service`]**: base for backend resource calls, attaching the
//!   current bearer token.
//!
//! - **[`Notifier`]**: broadcast bus for user-facing messages.
//!
//! - **[`App`]**: facade wiring all of the above around one shared
//!   [`FetchModule`](catalogo_api::FetchModule).

pub mod app;
pub mod auth;
pub mod config;
pub mod error;
pub mod guard;
pub mod model;
pub mod notifier;
pub mod service;
pub mod session_store;

// ── Primary re-exports ──────────────────────────────────────────────
pub use app::App;
pub use auth::{AuthState, AuthStore, LOGIN_PATH, SESSION_PATH};
pub use config::ClientConfig;
pub use error::{CoreError, INVALID_CREDENTIALS};
pub use guard::{HOME_ROUTE, LOGIN_ROUTE, Navigation, Route, RouteGuard, RouteMeta, RouteTable};
pub use model::{AuthData, ROLE_ADMIN, ROLE_USER, User, UserType};
pub use notifier::{Notification, Notifier, Severity};
pub use service::Service;
pub use session_store::{DEFAULT_SESSION_EXPIRY, FileSessionStore, MemorySessionStore, SessionStore};
