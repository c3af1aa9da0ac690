// ── In-flight request registry ──
//
// Pending requests grouped by canonical URL. Entries are only ever
// removed by `deregister` (when the call settles) or `cancel_all_for`;
// navigation merely signals cancellation.

use std::sync::Arc;

use dashmap::DashMap;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use crate::request::RequestConfig;

/// One in-flight request.
#[derive(Debug, Clone)]
pub struct PendingRequest {
    pub id: String,
    pub cancel: CancellationToken,
    /// Navigation path that was current when the request was issued.
    pub origin_path: String,
    pub config: Arc<RequestConfig>,
}

impl PendingRequest {
    pub fn new(origin_path: impl Into<String>, config: Arc<RequestConfig>) -> Self {
        Self {
            id: generate_fetch_id(),
            cancel: CancellationToken::new(),
            origin_path: origin_path.into(),
            config,
        }
    }
}

fn generate_fetch_id() -> String {
    format!("fetch_id_{}", uuid::Uuid::new_v4())
}

/// Canonical URL -> ordered list of pending requests.
#[derive(Debug, Default)]
pub struct RequestRegistry {
    pending: DashMap<String, Vec<PendingRequest>>,
}

impl RequestRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a pending request under `url`.
    pub fn register(&self, url: &str, request: PendingRequest) {
        trace!(url, id = %request.id, "registering request");
        self.pending
            .entry(url.to_owned())
            .or_default()
            .push(request);
    }

    /// Remove the request with `id` from `url`. Idempotent.
    pub fn deregister(&self, url: &str, id: &str) {
        if let Some(mut list) = self.pending.get_mut(url) {
            list.retain(|p| p.id != id);
        }
        // The `get_mut` guard must be dropped before `remove_if` locks the shard.
        self.pending.remove_if(url, |_, list| list.is_empty());
    }

    /// Cancel and drop every pending request under `url`.
    ///
    /// Returns the number of requests that were cancelled.
    pub fn cancel_all_for(&self, url: &str) -> usize {
        let Some((_, list)) = self.pending.remove(url) else {
            return 0;
        };
        for request in &list {
            request.cancel.cancel();
        }
        debug!(url, cancelled = list.len(), "cancelled previous requests");
        list.len()
    }

    /// Signal cancellation for requests issued on another page that asked to
    /// be cancelled on route change. Entries stay registered until their
    /// calls settle.
    pub fn on_navigate(&self, new_path: &str) -> usize {
        let mut cancelled = 0;
        for entry in self.pending.iter() {
            for request in entry.value() {
                if request.origin_path != new_path
                    && request.config.cancels_on_route_change()
                    && !request.cancel.is_cancelled()
                {
                    request.cancel.cancel();
                    cancelled += 1;
                }
            }
        }
        if cancelled > 0 {
            debug!(path = new_path, cancelled, "cancelled requests on navigation");
        }
        cancelled
    }

    /// Whether anything is pending under `url`.
    pub fn contains(&self, url: &str) -> bool {
        self.pending.contains_key(url)
    }

    /// Snapshot of the requests pending under `url`.
    pub fn pending_for(&self, url: &str) -> Vec<PendingRequest> {
        self.pending
            .get(url)
            .map(|list| list.value().clone())
            .unwrap_or_default()
    }

    /// Total number of pending requests across every URL.
    pub fn len(&self) -> usize {
        self.pending.iter().map(|entry| entry.value().len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
