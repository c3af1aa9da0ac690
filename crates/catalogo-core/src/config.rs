// ── Runtime client configuration ──
//
// Where the backend and the application origin live, plus transport
// tuning. Built by the CLI from the config crate; core never reads files.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use url::Url;

use catalogo_api::{BusyTracker, FetchModule, TransportConfig};

use crate::error::CoreError;

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Backend API base, e.g. `https://api.example.cl/api-back/`.
    pub back_base_url: Option<Url>,
    /// Application origin serving `/auth/login` and `/api/session`.
    pub app_base_url: Option<Url>,
    pub timeout: Duration,
    /// Extra CA certificate (PEM).
    pub ca_cert: Option<PathBuf>,
    /// Keep a cookie jar so the session cookie set at login is replayed on
    /// restore.
    pub cookies: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            back_base_url: None,
            app_base_url: None,
            timeout: Duration::from_secs(30),
            ca_cert: None,
            cookies: true,
        }
    }
}

impl ClientConfig {
    pub fn transport(&self) -> TransportConfig {
        let transport = TransportConfig {
            ca_cert: self.ca_cert.clone(),
            timeout: self.timeout,
            cookie_jar: None,
        };
        if self.cookies {
            transport.with_cookie_jar()
        } else {
            transport
        }
    }

    /// Build the shared fetch module around `busy`.
    pub fn build_fetch(&self, busy: Arc<BusyTracker>) -> Result<FetchModule, CoreError> {
        if self.back_base_url.is_none() && self.app_base_url.is_none() {
            return Err(CoreError::Config {
                message: "neither back_base_url nor app_base_url is set".into(),
            });
        }
        Ok(FetchModule::from_transport(
            &self.transport(),
            self.back_base_url.clone(),
            self.app_base_url.clone(),
            busy,
        )?)
    }
}
