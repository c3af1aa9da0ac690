// ── Notification bus ──
//
// User-facing messages (toasts / snackbars) published by the session
// layer. Consumers subscribe; publishing with nobody listening is fine.

use serde::Serialize;
use strum::{Display, EnumString};
use tokio::sync::broadcast;

const NOTIFY_CHANNEL_SIZE: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    #[default]
    Info,
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub message: String,
    pub severity: Severity,
}

/// Cheaply cloneable publisher handle.
#[derive(Debug, Clone)]
pub struct Notifier {
    tx: broadcast::Sender<Notification>,
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new()
    }
}

impl Notifier {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(NOTIFY_CHANNEL_SIZE);
        Self { tx }
    }

    pub fn publish(&self, message: impl Into<String>, severity: Severity) {
        // No receivers is not an error.
        let _ = self.tx.send(Notification {
            message: message.into(),
            severity,
        });
    }

    pub fn info(&self, message: impl Into<String>) {
        self.publish(message, Severity::Info);
    }

    pub fn success(&self, message: impl Into<String>) {
        self.publish(message, Severity::Success);
    }

    pub fn error(&self, message: impl Into<String>) {
        self.publish(message, Severity::Error);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.tx.subscribe()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn publish_without_subscribers_is_silent() {
        Notifier::new().info("nadie escucha");
    }

    #[tokio::test]
    async fn subscribers_receive_in_order() {
        let notifier = Notifier::new();
        let mut rx = notifier.subscribe();

        notifier.success("Sesión iniciada");
        notifier.error("Credenciales inválidas");

        let first = rx.recv().await.unwrap();
        assert_eq!(first.severity, Severity::Success);
        assert_eq!(first.message, "Sesión iniciada");
        assert_eq!(rx.recv().await.unwrap().severity, Severity::Error);
    }

    #[test]
    fn severity_parses_lowercase() {
        assert_eq!("error".parse::<Severity>().unwrap(), Severity::Error);
        assert_eq!(Severity::Info.to_string(), "info");
    }
}
