// ── Busy-state tracking ──
//
// Two counters (mutating / read requests) each backing a boolean busy
// flag, plus a set of named scopes for localized loading indicators.
// Flags are `watch` channels so UI consumers can await changes.

use std::collections::HashSet;

use tokio::sync::watch;

/// Scope used when a request does not name one.
pub const DEFAULT_SCOPE: &str = "default";

/// Which global spinner a request drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusyKind {
    /// POST / PUT / DELETE, or any request with `force_spinner`.
    Mutating,
    /// GET requests.
    Read,
}

/// Snapshot of one spinner: in-flight count and the flag it drives.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Counter {
    pub count: usize,
    pub busy: bool,
}

/// Injected busy tracker shared by everything that issues requests.
#[derive(Debug)]
pub struct BusyTracker {
    mutating: watch::Sender<Counter>,
    read: watch::Sender<Counter>,
    scopes: watch::Sender<HashSet<String>>,
}

impl Default for BusyTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl BusyTracker {
    pub fn new() -> Self {
        let (mutating, _) = watch::channel(Counter::default());
        let (read, _) = watch::channel(Counter::default());
        let (scopes, _) = watch::channel(HashSet::new());
        Self {
            mutating,
            read,
            scopes,
        }
    }

    fn counter(&self, kind: BusyKind) -> &watch::Sender<Counter> {
        match kind {
            BusyKind::Mutating => &self.mutating,
            BusyKind::Read => &self.read,
        }
    }

    /// Raise the flag and bump the count.
    pub fn increment(&self, kind: BusyKind) {
        self.counter(kind).send_modify(|c| {
            c.busy = true;
            c.count += 1;
        });
    }

    /// Drop the count; the flag clears when it reaches zero.
    pub fn decrement(&self, kind: BusyKind) {
        self.counter(kind).send_modify(|c| {
            c.count = c.count.saturating_sub(1);
            if c.count == 0 {
                c.busy = false;
            }
        });
    }

    pub fn is_busy(&self, kind: BusyKind) -> bool {
        self.counter(kind).borrow().busy
    }

    pub fn count(&self, kind: BusyKind) -> usize {
        self.counter(kind).borrow().count
    }

    /// Receiver over the counter for `kind`, updated on every start/settle.
    pub fn subscribe(&self, kind: BusyKind) -> watch::Receiver<Counter> {
        self.counter(kind).subscribe()
    }

    // ── Scopes ───────────────────────────────────────────────────────

    pub fn mark_scope_busy(&self, scope: &str) {
        self.scopes.send_if_modified(|set| set.insert(scope.to_owned()));
    }

    pub fn clear_scope(&self, scope: &str) {
        self.scopes.send_if_modified(|set| set.remove(scope));
    }

    pub fn is_scope_busy(&self, scope: &str) -> bool {
        self.scopes.borrow().contains(scope)
    }

    /// Receiver over the set of busy scopes.
    pub fn subscribe_scopes(&self) -> watch::Receiver<HashSet<String>> {
        self.scopes.subscribe()
    }
}
